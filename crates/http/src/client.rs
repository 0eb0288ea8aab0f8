//! Dashboard API client
//!
//! Implements the BucketApi trait from bx-core on top of reqwest.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{StreamExt, stream};
use reqwest::{Client, RequestBuilder, Response, header};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use bx_core::traits::{
    CompleteRequest, CreatedUpload, DownloadRequest, ListPage, ListRequest, PartRequest,
    UploadRequest, UploadedPart,
};
use bx_core::{
    Alias, AliasAuth, BucketApi, DownloadBody, Error, Key, ObjectRecord, ProgressCallback,
    ResponseKind, Result, TransferProgress,
};

/// Size of the slices an upload body is streamed in
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Longest server message kept in an error
const MAX_ERROR_BODY: usize = 512;

/// Most a download buffer reserves up front; it grows past this as data arrives
const MAX_PREALLOCATION: u64 = 8 * 1024 * 1024;

/// HTTP client for the dashboard storage API
pub struct HttpClient {
    http: Client,
    endpoint: Url,
    auth: Option<AliasAuth>,
}

impl HttpClient {
    /// Create a new client from an alias configuration
    pub fn new(alias: &Alias) -> Result<Self> {
        let endpoint = Url::parse(&alias.endpoint)?;
        if endpoint.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "Endpoint cannot carry a path: {}",
                alias.endpoint
            )));
        }

        let timeout = alias.timeout_config();
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(concat!("bx/", env!("CARGO_PKG_VERSION"))),
        );

        let http = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_millis(timeout.connect_ms))
            .read_timeout(Duration::from_millis(timeout.read_ms))
            .danger_accept_invalid_certs(alias.insecure)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint,
            auth: alias.auth.clone(),
        })
    }

    /// URL of `/api/buckets/{bucket}/{segments...}`
    ///
    /// Segments are percent-encoded, so a `/` inside an encoded key stays in
    /// one path segment.
    fn bucket_url(&self, bucket: &str, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("Invalid endpoint: {}", self.endpoint)))?
            .pop_if_empty()
            .extend(["api", "buckets", bucket])
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(AliasAuth::Bearer { token }) => request.bearer_auth(token),
            Some(AliasAuth::Basic { username, password }) => {
                request.basic_auth(username, Some(password))
            }
            None => request,
        }
    }

    /// Send a request and turn non-success statuses into errors
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.authorize(request).send().await.map_err(transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = error_message(status, &text);
        debug!(status = status.as_u16(), %message, "Request failed");
        Err(Error::from_status(status.as_u16(), message))
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let body = response.bytes().await.map_err(transport)?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Parse an object record, falling back to a bare record for empty replies
    async fn record(&self, request: RequestBuilder, key: &Key) -> Result<ObjectRecord> {
        let response = self.send(request).await?;
        let body = response.bytes().await.map_err(transport)?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(ObjectRecord::new(key.decode()?));
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn fetch(&self, url: Url, progress: Option<ProgressCallback>) -> Result<Bytes> {
        let response = self.send(self.http.get(url)).await?;
        let total = response.content_length();

        let mut buffer = BytesMut::with_capacity(initial_capacity(total));
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(transport)?;
            buffer.extend_from_slice(&chunk);
            if let Some(cb) = &progress {
                cb(TransferProgress {
                    transferred: buffer.len() as u64,
                    total,
                });
            }
        }

        Ok(buffer.freeze())
    }
}

/// Buffer reservation for a body announcing `content_length` bytes
fn initial_capacity(content_length: Option<u64>) -> usize {
    content_length.unwrap_or(0).min(MAX_PREALLOCATION) as usize
}

#[async_trait]
impl BucketApi for HttpClient {
    #[instrument(skip(self, request), fields(prefix = %request.prefix))]
    async fn list_page(&self, bucket: &str, request: ListRequest) -> Result<ListPage> {
        let mut url = self.bucket_url(bucket, &[])?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("include", "customMetadata")
                .append_pair("include", "httpMetadata")
                .append_pair("delimiter", "/")
                .append_pair("prefix", request.prefix.as_str());
            if let Some(cursor) = &request.cursor {
                query.append_pair("cursor", cursor);
            }
        }

        self.json(self.http.get(url)).await
    }

    #[instrument(skip(self))]
    async fn create_folder(&self, bucket: &str, key: &Key) -> Result<()> {
        let url = self.bucket_url(bucket, &["folder"])?;
        self.send(self.http.post(url).json(&serde_json::json!({ "key": key })))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_object(&self, bucket: &str, key: &Key) -> Result<()> {
        let url = self.bucket_url(bucket, &["delete"])?;
        self.send(self.http.post(url).json(&serde_json::json!({ "key": key })))
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn move_object(&self, bucket: &str, old_key: &Key, new_key: &Key) -> Result<()> {
        let url = self.bucket_url(bucket, &["move"])?;
        let body = serde_json::json!({ "oldKey": old_key, "newKey": new_key });
        self.send(self.http.post(url).json(&body)).await?;
        Ok(())
    }

    #[instrument(skip(self, metadata))]
    async fn put_metadata(
        &self,
        bucket: &str,
        key: &Key,
        metadata: HashMap<String, String>,
    ) -> Result<ObjectRecord> {
        let url = self.bucket_url(bucket, &[key.as_str()])?;
        let body = serde_json::json!({ "customMetadata": metadata });
        self.record(self.http.post(url).json(&body), key).await
    }

    #[instrument(skip(self, request), fields(key = %request.key, size = request.body.len()))]
    async fn put_object(&self, bucket: &str, request: UploadRequest) -> Result<ObjectRecord> {
        let mut url = self.bucket_url(bucket, &["upload"])?;
        url.query_pairs_mut()
            .append_pair("key", request.key.as_str())
            .append_pair("httpMetadata", request.http_metadata.as_str());

        let builder = raw_body(self.http.post(url), request.body, request.progress);
        self.record(builder, &request.key).await
    }

    #[instrument(skip(self, request), fields(key = %request.key))]
    async fn get_object(&self, bucket: &str, request: DownloadRequest) -> Result<DownloadBody> {
        let url = self.bucket_url(bucket, &[request.key.as_str()])?;
        let fetch = self.fetch(url, request.progress);

        let bytes = match request.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!("Download cancelled");
                        return Err(Error::Transport("Download cancelled".into()));
                    }
                    result = fetch => result?,
                }
            }
            None => fetch.await?,
        };

        Ok(match request.response {
            ResponseKind::Binary => DownloadBody::Binary(bytes),
            ResponseKind::Text => DownloadBody::Text(String::from_utf8_lossy(&bytes).into_owned()),
        })
    }

    #[instrument(skip(self))]
    async fn create_multipart(
        &self,
        bucket: &str,
        key: &Key,
        http_metadata: &Key,
    ) -> Result<CreatedUpload> {
        let mut url = self.bucket_url(bucket, &["multipart", "create"])?;
        url.query_pairs_mut()
            .append_pair("key", key.as_str())
            .append_pair("httpMetadata", http_metadata.as_str());

        self.json(self.http.post(url)).await
    }

    #[instrument(
        skip(self, request),
        fields(upload_id = %request.upload_id, part = request.part_number, size = request.chunk.len())
    )]
    async fn upload_part(&self, bucket: &str, request: PartRequest) -> Result<UploadedPart> {
        let mut url = self.bucket_url(bucket, &["multipart", "upload"])?;
        url.query_pairs_mut()
            .append_pair("key", request.key.as_str())
            .append_pair("uploadId", &request.upload_id)
            .append_pair("partNumber", &request.part_number.to_string());

        let builder = raw_body(self.http.post(url), request.chunk, request.progress);
        self.json(builder).await
    }

    #[instrument(skip(self, request), fields(upload_id = %request.upload_id, parts = request.parts.len()))]
    async fn complete_multipart(
        &self,
        bucket: &str,
        request: CompleteRequest,
    ) -> Result<ObjectRecord> {
        let url = self.bucket_url(bucket, &["multipart", "complete"])?;
        let builder = self.http.post(url).json(&request);
        self.record(builder, &request.key).await
    }
}

/// Attach a raw body, streaming it in slices when progress is wanted
fn raw_body(
    builder: RequestBuilder,
    body: Bytes,
    progress: Option<ProgressCallback>,
) -> RequestBuilder {
    let builder = builder.header(header::CONTENT_TYPE, "application/octet-stream");

    let Some(progress) = progress else {
        return builder.body(body);
    };

    let total = body.len() as u64;
    let slices: Vec<(u64, Bytes)> = (0..body.len())
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| {
            let end = (start + UPLOAD_CHUNK_SIZE).min(body.len());
            (end as u64, body.slice(start..end))
        })
        .collect();

    let stream = stream::iter(slices).map(move |(sent, slice)| {
        progress(TransferProgress {
            transferred: sent,
            total: Some(total),
        });
        Ok::<_, std::io::Error>(slice)
    });
    builder
        .header(header::CONTENT_LENGTH, body.len())
        .body(reqwest::Body::wrap_stream(stream))
}

fn transport(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Transport(format!("Request timed out: {e}"))
    } else {
        Error::Transport(e.to_string())
    }
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        return status.to_string();
    }
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{status}: {}...", &body[..cut]),
        None => format!("{status}: {body}"),
    }
}
