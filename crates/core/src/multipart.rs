//! Multipart upload support
//!
//! Sequences the three-phase protocol: create a session, upload numbered
//! parts, complete the session. Parts are independent requests; the caller
//! may retry or run them concurrently. Nothing is retried or rolled back
//! here, and an abandoned session is left to the server.

use std::collections::BTreeMap;
use std::future::Future;
use std::io::SeekFrom;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt, future, stream};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::key;
use crate::traits::{
    BucketApi, CompleteRequest, ObjectRecord, PartRequest, ProgressCallback, TransferProgress,
    UploadFile, UploadedPart,
};

/// Default part size: 64 MiB
pub const DEFAULT_PART_SIZE: u64 = 64 * 1024 * 1024;

/// Minimum part size: 5 MiB
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Maximum part size: 5 GiB
pub const MAX_PART_SIZE: u64 = 5 * 1024 * 1024 * 1024;

/// Maximum number of parts per session
pub const MAX_PARTS: usize = 10_000;

/// Multipart upload configuration
#[derive(Debug, Clone)]
pub struct MultipartConfig {
    /// Part size in bytes
    pub part_size: u64,

    /// Number of concurrent part uploads
    pub concurrency: usize,
}

impl Default for MultipartConfig {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
            concurrency: 4,
        }
    }
}

impl MultipartConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn part_size(mut self, size: u64) -> Self {
        self.part_size = size.clamp(MIN_PART_SIZE, MAX_PART_SIZE);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Calculate appropriate part size for a file
    pub fn calculate_part_size(&self, file_size: u64) -> u64 {
        if file_size <= MIN_PART_SIZE {
            return MIN_PART_SIZE;
        }

        let parts = file_size.div_ceil(self.part_size);

        if parts <= MAX_PARTS as u64 {
            self.part_size
        } else {
            let required_size = file_size.div_ceil(MAX_PARTS as u64);
            required_size.clamp(MIN_PART_SIZE, MAX_PART_SIZE)
        }
    }
}

/// Calculate number of parts for a file (at least one)
pub fn calculate_parts(file_size: u64, part_size: u64) -> usize {
    (file_size.div_ceil(part_size) as usize).max(1)
}

/// Get byte range for a part (part numbers start at 1)
pub fn part_byte_range(part_number: u32, part_size: u64, total_size: u64) -> (u64, u64) {
    let start = ((part_number as u64 - 1) * part_size).min(total_size);
    let end = (start + part_size).min(total_size);
    (start, end)
}

/// Lifecycle of a multipart session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The server issued an upload id, no part acknowledged yet
    Created,
    /// At least one part acknowledged
    Uploading,
    /// The server reassembled the object
    Completed,
    /// A phase failed; the session must not be used again
    Failed,
}

impl SessionState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Failed)
    }
}

/// Client-side record of an open multipart upload
#[derive(Debug, Clone)]
pub struct MultipartSession {
    /// Upload id issued by the server
    pub upload_id: String,

    /// File being uploaded
    pub file: UploadFile,

    /// Target folder, delimiter-terminated
    pub folder: String,

    /// Acknowledged parts, keyed by part number
    parts: BTreeMap<u32, UploadedPart>,

    state: SessionState,
}

impl MultipartSession {
    pub fn new(upload_id: impl Into<String>, file: UploadFile, folder: impl Into<String>) -> Self {
        Self {
            upload_id: upload_id.into(),
            file,
            folder: folder.into(),
            parts: BTreeMap::new(),
            state: SessionState::Created,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Logical target path (folder + name), as sent with each part
    pub fn path(&self) -> String {
        format!("{}{}", self.folder, self.file.name)
    }

    /// Record an acknowledged part
    pub fn add_completed_part(&mut self, part: UploadedPart) -> Result<()> {
        if self.state.is_terminal() {
            return Err(Error::Validation(format!(
                "Upload {} is no longer accepting parts",
                self.upload_id
            )));
        }
        if part.part_number == 0 {
            return Err(Error::Validation("Part numbers start at 1".into()));
        }
        if self.parts.contains_key(&part.part_number) {
            return Err(Error::Validation(format!(
                "Part {} was already uploaded in {}",
                part.part_number, self.upload_id
            )));
        }

        self.parts.insert(part.part_number, part);
        self.state = SessionState::Uploading;
        Ok(())
    }

    /// Mark the session as failed
    pub fn mark_failed(&mut self) {
        self.state = SessionState::Failed;
    }

    fn mark_completed(&mut self) {
        self.state = SessionState::Completed;
    }

    /// Acknowledged parts in ascending part order
    pub fn completed_parts(&self) -> Vec<UploadedPart> {
        self.parts.values().cloned().collect()
    }
}

/// Runs the multipart protocol against a [`BucketApi`]
pub struct MultipartCoordinator<A: ?Sized> {
    api: Arc<A>,
}

impl<A: BucketApi + ?Sized> MultipartCoordinator<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Open a session for `file` under `folder`
    pub async fn create(
        &self,
        bucket: &str,
        file: &UploadFile,
        folder: &str,
    ) -> Result<MultipartSession> {
        let key = key::encode(&file.name, Some(folder));
        let created = self
            .api
            .create_multipart(bucket, &key, &file.http_metadata())
            .await?;

        debug!(upload_id = %created.upload_id, name = %file.name, "Created multipart upload");
        Ok(MultipartSession::new(
            created.upload_id,
            file.clone(),
            folder,
        ))
    }

    /// Upload one numbered chunk
    ///
    /// `path` is the logical target path (folder + name). The returned part
    /// descriptor must be kept for [`complete`](Self::complete).
    ///
    /// This works on a bare upload id and does not consult any
    /// [`MultipartSession`]; record the result with
    /// [`MultipartSession::add_completed_part`], which rejects parts once
    /// the session is terminal.
    pub async fn upload_part(
        &self,
        bucket: &str,
        upload_id: &str,
        part_number: u32,
        path: &str,
        chunk: Bytes,
        on_progress: Option<ProgressCallback>,
    ) -> Result<UploadedPart> {
        if part_number == 0 {
            return Err(Error::Validation("Part numbers start at 1".into()));
        }

        let size = chunk.len();
        let part = self
            .api
            .upload_part(
                bucket,
                PartRequest {
                    upload_id: upload_id.to_string(),
                    part_number,
                    key: key::encode_str(path),
                    chunk,
                    progress: on_progress,
                },
            )
            .await?;

        debug!(upload_id, part_number, size, "Uploaded part");
        Ok(part)
    }

    /// Submit the part list and let the server reassemble the object
    ///
    /// Parts are sent in ascending part order. No minimum part count is
    /// enforced here, and no session state is touched; tracked uploads go
    /// through [`complete_session`](Self::complete_session).
    pub async fn complete(
        &self,
        bucket: &str,
        file: &UploadFile,
        folder: &str,
        parts: Vec<UploadedPart>,
        upload_id: &str,
    ) -> Result<ObjectRecord> {
        let mut parts = parts;
        parts.sort_by_key(|p| p.part_number);

        let request = CompleteRequest {
            key: key::encode(&file.name, Some(folder)),
            upload_id: upload_id.to_string(),
            parts,
        };
        self.api.complete_multipart(bucket, request).await
    }

    /// Complete a tracked session
    ///
    /// The session ends `Completed` on success and `Failed` on error. A
    /// terminal session or one without parts is rejected without a request.
    pub async fn complete_session(
        &self,
        bucket: &str,
        session: &mut MultipartSession,
    ) -> Result<ObjectRecord> {
        if session.state.is_terminal() {
            return Err(Error::Validation(format!(
                "Upload {} can no longer be completed",
                session.upload_id
            )));
        }
        if session.parts.is_empty() {
            return Err(Error::Validation(format!(
                "Upload {} has no parts to complete",
                session.upload_id
            )));
        }

        let result = self
            .complete(
                bucket,
                &session.file,
                &session.folder,
                session.completed_parts(),
                &session.upload_id,
            )
            .await;

        match &result {
            Ok(_) => session.mark_completed(),
            Err(e) => {
                warn!(upload_id = %session.upload_id, error = %e, "Completing multipart upload failed");
                session.mark_failed();
            }
        }
        result
    }

    /// Upload `data` through all three phases
    ///
    /// Up to `config.concurrency` parts are in flight at once. On the first
    /// failed part the remaining uploads are dropped and the error is
    /// returned; the server-side session is not aborted.
    pub async fn upload(
        &self,
        bucket: &str,
        file: &UploadFile,
        folder: &str,
        data: Bytes,
        config: &MultipartConfig,
        on_progress: Option<ProgressCallback>,
    ) -> Result<ObjectRecord> {
        let total_size = data.len() as u64;
        self.upload_parts(bucket, file, folder, total_size, config, on_progress, |start, end| {
            future::ready(Ok(data.slice(start as usize..end as usize)))
        })
        .await
    }

    /// Upload the local file at `source` through all three phases
    ///
    /// Each part is read from disk just before it is sent, so at most
    /// `config.concurrency` parts are held in memory.
    pub async fn upload_file(
        &self,
        bucket: &str,
        file: &UploadFile,
        folder: &str,
        source: &Path,
        config: &MultipartConfig,
        on_progress: Option<ProgressCallback>,
    ) -> Result<ObjectRecord> {
        let total_size = tokio::fs::metadata(source).await?.len();
        self.upload_parts(bucket, file, folder, total_size, config, on_progress, |start, end| {
            read_range(source, start, end)
        })
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn upload_parts<F, Fut>(
        &self,
        bucket: &str,
        file: &UploadFile,
        folder: &str,
        total_size: u64,
        config: &MultipartConfig,
        on_progress: Option<ProgressCallback>,
        read_part: F,
    ) -> Result<ObjectRecord>
    where
        F: Fn(u64, u64) -> Fut,
        Fut: Future<Output = Result<Bytes>>,
    {
        let part_size = config.calculate_part_size(total_size);
        let part_count = calculate_parts(total_size, part_size);

        let mut session = self.create(bucket, file, folder).await?;
        let path = session.path();
        let upload_id = session.upload_id.clone();

        let sent: Arc<Vec<AtomicU64>> =
            Arc::new((0..part_count).map(|_| AtomicU64::new(0)).collect());

        let uploads = stream::iter(1..=part_count as u32)
            .map(|part_number| {
                let (start, end) = part_byte_range(part_number, part_size, total_size);
                let chunk = read_part(start, end);
                let callback = on_progress.as_ref().map(|cb| {
                    part_progress(Arc::clone(cb), Arc::clone(&sent), part_number, total_size)
                });
                let (upload_id, path) = (upload_id.as_str(), path.as_str());
                async move {
                    let chunk = chunk.await?;
                    self.upload_part(bucket, upload_id, part_number, path, chunk, callback)
                        .await
                }
            })
            .buffer_unordered(config.concurrency.max(1))
            .try_collect::<Vec<_>>()
            .await;

        let parts = match uploads {
            Ok(parts) => parts,
            Err(e) => {
                warn!(upload_id = %upload_id, error = %e, "Multipart upload failed");
                return Err(e);
            }
        };

        for part in parts {
            session.add_completed_part(part)?;
        }

        self.complete_session(bucket, &mut session).await
    }
}

/// Read bytes `start..end` of a local file
async fn read_range(source: &Path, start: u64, end: u64) -> Result<Bytes> {
    let mut reader = tokio::fs::File::open(source).await?;
    reader.seek(SeekFrom::Start(start)).await?;
    let mut chunk = vec![0u8; (end - start) as usize];
    reader.read_exact(&mut chunk).await?;
    Ok(Bytes::from(chunk))
}

/// Folds one part's progress into whole-file progress
fn part_progress(
    callback: ProgressCallback,
    sent: Arc<Vec<AtomicU64>>,
    part_number: u32,
    total_size: u64,
) -> ProgressCallback {
    Arc::new(move |progress: TransferProgress| {
        sent[part_number as usize - 1].store(progress.transferred, Ordering::Relaxed);
        let transferred = sent.iter().map(|s| s.load(Ordering::Relaxed)).sum();
        callback(TransferProgress {
            transferred,
            total: Some(total_size),
        });
    })
}
