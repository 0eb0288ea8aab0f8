//! Single-shot object operations
//!
//! Each operation derives its keys from the selection context and issues one
//! request through the [`BucketApi`]. Failures are returned unmodified.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::context::SelectionContext;
use crate::error::Result;
use crate::key::{self, Key};
use crate::listing::FileItem;
use crate::path::{DELIMITER, validate_name};
use crate::traits::{
    BucketApi, DownloadBody, DownloadRequest, ObjectRecord, ProgressCallback, ResponseKind,
    UploadFile, UploadRequest,
};

/// Request builders for everything except listing and multipart uploads
pub struct ObjectOperations<A: ?Sized> {
    api: Arc<A>,
}

impl<A: BucketApi + ?Sized> ObjectOperations<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Create `name` as a subfolder of the current folder
    pub async fn create_folder(&self, ctx: &SelectionContext, name: &str) -> Result<Key> {
        validate_name(name)?;
        let key = key::encode_str(&format!("{}{name}{DELIMITER}", ctx.current_folder));
        self.api.create_folder(&ctx.bucket, &key).await?;
        debug!(bucket = %ctx.bucket, folder = %ctx.current_folder, name, "Created folder");
        Ok(key)
    }

    /// Delete the object `name` under `path`
    pub async fn delete_object(&self, ctx: &SelectionContext, path: &str, name: &str) -> Result<()> {
        let key = key::encode(name, Some(path));
        self.api.delete_object(&ctx.bucket, &key).await?;
        debug!(bucket = %ctx.bucket, path, name, "Deleted object");
        Ok(())
    }

    /// Rename an object inside the current folder
    ///
    /// The move is a single request; on failure the object keeps its old key.
    pub async fn rename_object(
        &self,
        ctx: &SelectionContext,
        old_name: &str,
        new_name: &str,
    ) -> Result<()> {
        validate_name(new_name)?;
        let folder = Some(ctx.current_folder.as_str());
        let old_key = key::encode(old_name, folder);
        let new_key = key::encode(new_name, folder);
        self.api.move_object(&ctx.bucket, &old_key, &new_key).await?;
        debug!(bucket = %ctx.bucket, old_name, new_name, "Renamed object");
        Ok(())
    }

    /// Replace the custom metadata of a file
    ///
    /// The server stores `metadata` as given; keys not present are dropped.
    pub async fn update_metadata(
        &self,
        ctx: &SelectionContext,
        name: &str,
        metadata: HashMap<String, String>,
    ) -> Result<ObjectRecord> {
        let key = key::encode(name, Some(&ctx.effective_folder()));
        self.api.put_metadata(&ctx.bucket, &key, metadata).await
    }

    /// Download a listed file
    ///
    /// The body is kept binary when the file's viewer renders raw bytes.
    pub async fn download_file(
        &self,
        ctx: &SelectionContext,
        file: &FileItem,
        on_progress: Option<ProgressCallback>,
        cancel: Option<CancellationToken>,
    ) -> Result<DownloadBody> {
        let response = match file.preview {
            Some(preview) if preview.download_type.is_binary() => ResponseKind::Binary,
            _ => ResponseKind::Text,
        };
        self.download_object(ctx, &file.name, response, on_progress, cancel)
            .await
    }

    /// Download an object of the current folder by name
    pub async fn download_object(
        &self,
        ctx: &SelectionContext,
        name: &str,
        response: ResponseKind,
        on_progress: Option<ProgressCallback>,
        cancel: Option<CancellationToken>,
    ) -> Result<DownloadBody> {
        let request = DownloadRequest {
            key: key::encode(name, Some(&ctx.effective_folder())),
            response,
            progress: on_progress,
            cancel,
        };
        self.api.get_object(&ctx.bucket, request).await
    }

    /// Upload a file in one request
    ///
    /// `folder` defaults to the current folder.
    pub async fn upload_objects(
        &self,
        ctx: &SelectionContext,
        file: &UploadFile,
        body: Bytes,
        folder: Option<&str>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<ObjectRecord> {
        validate_name(&file.name)?;
        let folder = folder.unwrap_or(&ctx.current_folder);
        let size = body.len();
        let request = UploadRequest {
            key: key::encode(&file.name, Some(folder)),
            http_metadata: file.http_metadata(),
            body,
            progress: on_progress,
        };

        let record = self.api.put_object(&ctx.bucket, request).await?;
        debug!(bucket = %ctx.bucket, folder, name = %file.name, size, "Uploaded object");
        Ok(record)
    }
}
