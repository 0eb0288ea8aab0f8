//! BucketApi trait definition
//!
//! This trait is the transport seam: it executes single requests against the
//! dashboard storage API using already-encoded keys. The listing, upload and
//! object operations in this crate are written against it, so they can be
//! exercised with a mock and stay independent of any HTTP client.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::key::Key;

/// HTTP metadata stored with an object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_disposition: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<String>,
}

/// Object record as returned by the storage API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    /// Raw (decoded) object key
    pub key: String,

    /// Size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Entity tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Upload timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded: Option<jiff::Timestamp>,

    /// Version identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_metadata: Option<HttpMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_metadata: Option<HashMap<String, String>>,
}

impl ObjectRecord {
    /// Create a bare record for a key
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    /// Human-readable size
    pub fn size_human(&self) -> Option<String> {
        self.size
            .map(|size| humansize::format_size(size, humansize::BINARY))
    }
}

/// One page of the delimiter-grouped listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    #[serde(default)]
    pub objects: Vec<ObjectRecord>,

    #[serde(default)]
    pub delimited_prefixes: Vec<String>,

    #[serde(default)]
    pub truncated: bool,

    /// Cursor for the next page, absent on the last one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Parameters of a single listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    /// Encoded effective prefix
    pub prefix: Key,
    /// Cursor from the previous page (absent on the first page)
    pub cursor: Option<String>,
}

/// Progress of a single transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    /// Bytes moved so far
    pub transferred: u64,
    /// Total bytes, when known
    pub total: Option<u64>,
}

impl TransferProgress {
    /// Completed share in `0.0..=1.0`, when the total is known
    pub fn fraction(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(1.0),
            Some(total) => Some((self.transferred as f64 / total as f64).min(1.0)),
            None => None,
        }
    }
}

/// Callback receiving transfer progress
pub type ProgressCallback = Arc<dyn Fn(TransferProgress) + Send + Sync>;

/// Representation requested for a download body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Text,
    Binary,
}

/// A downloaded body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadBody {
    Text(String),
    Binary(Bytes),
}

impl DownloadBody {
    pub fn len(&self) -> usize {
        match self {
            DownloadBody::Text(text) => text.len(),
            DownloadBody::Binary(bytes) => bytes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw bytes of the body
    pub fn into_bytes(self) -> Bytes {
        match self {
            DownloadBody::Text(text) => Bytes::from(text),
            DownloadBody::Binary(bytes) => bytes,
        }
    }
}

/// A local file about to be uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// Object name, without folder
    pub name: String,
    /// MIME type stored as the object's content type
    pub content_type: String,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
        }
    }

    /// Guess the content type from the name's extension
    pub fn guess(name: impl Into<String>) -> Self {
        let name = name.into();
        let content_type = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self { name, content_type }
    }

    /// Encoded `{"contentType": ...}` descriptor sent with uploads
    pub fn http_metadata(&self) -> Key {
        let descriptor = serde_json::json!({ "contentType": self.content_type });
        crate::key::encode_str(&descriptor.to_string())
    }
}

/// Single-shot upload request
#[derive(Clone)]
pub struct UploadRequest {
    pub key: Key,
    /// Encoded JSON `{"contentType": ...}`
    pub http_metadata: Key,
    pub body: Bytes,
    pub progress: Option<ProgressCallback>,
}

/// Download request
#[derive(Clone)]
pub struct DownloadRequest {
    pub key: Key,
    pub response: ResponseKind,
    pub progress: Option<ProgressCallback>,
    pub cancel: Option<CancellationToken>,
}

/// Server reply to a multipart create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUpload {
    pub upload_id: String,
    #[serde(default)]
    pub key: Option<String>,
}

/// Descriptor of an acknowledged part
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedPart {
    pub part_number: u32,
    pub etag: String,
}

/// One part of a multipart upload
#[derive(Clone)]
pub struct PartRequest {
    pub upload_id: String,
    pub part_number: u32,
    pub key: Key,
    pub chunk: Bytes,
    pub progress: Option<ProgressCallback>,
}

/// Body of a multipart complete call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub key: Key,
    pub upload_id: String,
    pub parts: Vec<UploadedPart>,
}

/// Transport for the dashboard storage API
///
/// Every method issues exactly one request and surfaces failures unmodified.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BucketApi: Send + Sync {
    /// Fetch one listing page
    async fn list_page(&self, bucket: &str, request: ListRequest) -> Result<ListPage>;

    /// Create a folder placeholder
    async fn create_folder(&self, bucket: &str, key: &Key) -> Result<()>;

    /// Delete an object
    async fn delete_object(&self, bucket: &str, key: &Key) -> Result<()>;

    /// Move an object to a new key
    async fn move_object(&self, bucket: &str, old_key: &Key, new_key: &Key) -> Result<()>;

    /// Replace the custom metadata of an object
    async fn put_metadata(
        &self,
        bucket: &str,
        key: &Key,
        metadata: HashMap<String, String>,
    ) -> Result<ObjectRecord>;

    /// Upload an object in one request
    async fn put_object(&self, bucket: &str, request: UploadRequest) -> Result<ObjectRecord>;

    /// Download an object
    async fn get_object(&self, bucket: &str, request: DownloadRequest) -> Result<DownloadBody>;

    /// Open a multipart session
    async fn create_multipart(
        &self,
        bucket: &str,
        key: &Key,
        http_metadata: &Key,
    ) -> Result<CreatedUpload>;

    /// Upload one part of a multipart session
    async fn upload_part(&self, bucket: &str, request: PartRequest) -> Result<UploadedPart>;

    /// Complete a multipart session
    async fn complete_multipart(
        &self,
        bucket: &str,
        request: CompleteRequest,
    ) -> Result<ObjectRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_page_deserializes_wire_format() {
        let json = r#"{
            "objects": [
                {
                    "key": "docs/readme.txt",
                    "size": 12,
                    "etag": "abc",
                    "uploaded": "2024-03-01T10:00:00.000Z",
                    "httpMetadata": {"contentType": "text/plain"},
                    "customMetadata": {"owner": "ana"}
                }
            ],
            "delimitedPrefixes": ["docs/sub/"],
            "truncated": true,
            "cursor": "next"
        }"#;

        let page: ListPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.objects.len(), 1);
        let object = &page.objects[0];
        assert_eq!(object.key, "docs/readme.txt");
        assert_eq!(object.size, Some(12));
        assert!(object.uploaded.is_some());
        assert_eq!(
            object.http_metadata.as_ref().unwrap().content_type.as_deref(),
            Some("text/plain")
        );
        assert_eq!(object.custom_metadata.as_ref().unwrap()["owner"], "ana");
        assert_eq!(page.delimited_prefixes, vec!["docs/sub/"]);
        assert!(page.truncated);
        assert_eq!(page.cursor.as_deref(), Some("next"));
    }

    #[test]
    fn test_list_page_missing_fields_default() {
        let page: ListPage = serde_json::from_str(r#"{"truncated": false}"#).unwrap();
        assert!(page.objects.is_empty());
        assert!(page.delimited_prefixes.is_empty());
        assert!(page.cursor.is_none());
    }

    #[test]
    fn test_transfer_progress_fraction() {
        let half = TransferProgress {
            transferred: 50,
            total: Some(100),
        };
        assert_eq!(half.fraction(), Some(0.5));

        let empty = TransferProgress {
            transferred: 0,
            total: Some(0),
        };
        assert_eq!(empty.fraction(), Some(1.0));

        let unknown = TransferProgress {
            transferred: 10,
            total: None,
        };
        assert_eq!(unknown.fraction(), None);
    }

    #[test]
    fn test_complete_request_body() {
        let body = CompleteRequest {
            key: crate::key::encode_str("a.bin"),
            upload_id: "u-1".into(),
            parts: vec![UploadedPart {
                part_number: 1,
                etag: "e1".into(),
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["key"], "YS5iaW4=");
        assert_eq!(json["uploadId"], "u-1");
        assert_eq!(json["parts"][0]["partNumber"], 1);
        assert_eq!(json["parts"][0]["etag"], "e1");
    }

    #[test]
    fn test_upload_file_http_metadata() {
        let file = UploadFile::new("a.txt", "text/plain");
        let decoded = file.http_metadata().decode().unwrap();
        assert_eq!(decoded, r#"{"contentType":"text/plain"}"#);
    }

    #[test]
    fn test_upload_file_guess() {
        assert_eq!(UploadFile::guess("photo.png").content_type, "image/png");
        assert_eq!(
            UploadFile::guess("blob").content_type,
            "application/octet-stream"
        );
    }

    #[test]
    fn test_download_body_bytes() {
        let body = DownloadBody::Text("hi".into());
        assert_eq!(body.len(), 2);
        assert_eq!(body.into_bytes(), Bytes::from_static(b"hi"));
    }
}
