//! cp command - Upload and download files
//!
//! Copies a single file between the local filesystem and a bucket. Files at
//! or above the configured multipart threshold are uploaded in parts, read
//! from disk one part at a time; smaller files are sent in one request.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use clap::Args;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use bx_core::{
    Error, MultipartCoordinator, ObjectOperations, ObjectRecord, ParsedPath, RemotePath,
    ResponseKind, UploadFile, parse_path,
};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

use super::{Session, connect, fail};

/// Upload or download a file
#[derive(Args, Debug)]
pub struct CpArgs {
    /// Source path (local path or alias/bucket/[folder/]name)
    pub source: String,

    /// Destination path (local path or alias/bucket/[folder/][name])
    pub target: String,

    /// Content type for uploaded files (guessed from the name by default)
    #[arg(long)]
    pub content_type: Option<String>,

    /// Only show what would be copied (dry run)
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
struct CpOutput {
    status: &'static str,
    source: String,
    target: String,
    size_bytes: u64,
    size_human: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    multipart: bool,
}

impl CpOutput {
    fn new(source: String, target: String, size_bytes: u64, multipart: bool) -> Self {
        Self {
            status: "success",
            source,
            target,
            size_bytes,
            size_human: humansize::format_size(size_bytes, humansize::BINARY),
            multipart,
        }
    }
}

/// Execute the cp command
pub async fn execute(args: CpArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let source = match parse_path(&args.source) {
        Ok(p) => p,
        Err(e) => {
            formatter.error(&format!("Invalid source path: {e}"));
            return ExitCode::UsageError;
        }
    };
    let target = match parse_path(&args.target) {
        Ok(p) => p,
        Err(e) => {
            formatter.error(&format!("Invalid target path: {e}"));
            return ExitCode::UsageError;
        }
    };

    match (&source, &target) {
        (ParsedPath::Local(src), ParsedPath::Remote(dst)) => {
            upload(src, dst, &args, output_config).await
        }
        (ParsedPath::Remote(src), ParsedPath::Local(dst)) => {
            download(src, dst, &args, output_config).await
        }
        (ParsedPath::Remote(_), ParsedPath::Remote(_)) => {
            formatter.error("Copying between remote paths is not supported. Use mv to rename.");
            ExitCode::UsageError
        }
        (ParsedPath::Local(_), ParsedPath::Local(_)) => {
            formatter.error("Cannot copy between two local paths. Use system cp command.");
            ExitCode::UsageError
        }
    }
}

/// Remote destination for an upload of `src`
///
/// A folder destination keeps the local file name.
fn upload_target(src: &Path, dst: &RemotePath) -> Option<RemotePath> {
    if !dst.is_dir {
        return Some(dst.clone());
    }
    let file_name = src.file_name()?.to_string_lossy();
    Some(dst.join(&file_name))
}

/// Local destination for a download of `src`
fn download_target(src: &RemotePath, dst: &Path) -> PathBuf {
    if dst.is_dir() {
        dst.join(src.name())
    } else {
        dst.to_path_buf()
    }
}

async fn upload(src: &Path, dst: &RemotePath, args: &CpArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());
    let src_display = src.display().to_string();

    if !src.exists() {
        formatter.error(&format!("Source not found: {src_display}"));
        return ExitCode::NotFound;
    }
    if src.is_dir() {
        formatter.error("Source is a directory. Only single files can be copied.");
        return ExitCode::UsageError;
    }
    let Some(target) = upload_target(src, dst) else {
        formatter.error(&format!("Cannot derive a file name from {src_display}"));
        return ExitCode::UsageError;
    };

    if args.dry_run {
        formatter.println(&format!("Would copy: {src_display} -> {target}"));
        return ExitCode::Success;
    }

    let size = match tokio::fs::metadata(src).await {
        Ok(meta) => meta.len(),
        Err(e) => return fail(&formatter, &format!("Failed to read {src_display}"), &Error::Io(e)),
    };

    let session = match connect(&target, output_config) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let formatter = &session.formatter;

    let file = match &args.content_type {
        Some(content_type) => UploadFile::new(target.name(), content_type.as_str()),
        None => UploadFile::guess(target.name()),
    };

    let multipart = size >= session.config.defaults.multipart_threshold();
    let progress = ProgressBar::new(formatter.config(), size, target.name());
    let result = send_file(&session, src, &target, &file, multipart, &progress).await;

    match result {
        Ok(_) => {
            progress.finish_and_clear();
            if formatter.is_json() {
                formatter.json(&CpOutput::new(src_display, target.to_full_path(), size, multipart));
            } else {
                formatter.println(&format!(
                    "{src_display} -> {target} ({})",
                    humansize::format_size(size, humansize::BINARY)
                ));
            }
            ExitCode::Success
        }
        Err(e) => {
            progress.abandon();
            fail(formatter, &format!("Failed to upload {src_display}"), &e)
        }
    }
}

async fn send_file(
    session: &Session,
    src: &Path,
    target: &RemotePath,
    file: &UploadFile,
    multipart: bool,
    progress: &ProgressBar,
) -> bx_core::Result<ObjectRecord> {
    let ctx = session.context(target);
    if multipart {
        let coordinator = MultipartCoordinator::new(session.api.clone());
        let config = session.config.defaults.multipart_config();
        tracing::debug!(part_size = config.part_size, "Using multipart upload");
        coordinator
            .upload_file(
                &ctx.bucket,
                file,
                &ctx.current_folder,
                src,
                &config,
                progress.callback(),
            )
            .await
    } else {
        let data = Bytes::from(tokio::fs::read(src).await?);
        let ops = ObjectOperations::new(session.api.clone());
        ops.upload_objects(&ctx, file, data, None, progress.callback())
            .await
    }
}

async fn download(
    src: &RemotePath,
    dst: &Path,
    args: &CpArgs,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());
    if src.is_dir {
        formatter.error("Only objects can be downloaded. Give the full path of an object.");
        return ExitCode::UsageError;
    }

    let target = download_target(src, dst);
    let dst_display = target.display().to_string();

    if args.dry_run {
        formatter.println(&format!("Would copy: {src} -> {dst_display}"));
        return ExitCode::Success;
    }

    let session = match connect(src, output_config) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let formatter = &session.formatter;
    let ctx = session.context(src);

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });

    let progress = ProgressBar::new(formatter.config(), 0, src.name());
    let ops = ObjectOperations::new(session.api.clone());
    let result = ops
        .download_object(
            &ctx,
            src.name(),
            ResponseKind::Binary,
            progress.callback(),
            Some(cancel.clone()),
        )
        .await;
    watcher.abort();

    let body = match result {
        Ok(body) => body,
        Err(e) => {
            progress.abandon();
            if cancel.is_cancelled() {
                formatter.error(&format!("Download of {src} cancelled"));
                return ExitCode::Interrupted;
            }
            return fail(formatter, &format!("Failed to download {src}"), &e);
        }
    };
    progress.finish_and_clear();

    let data = body.into_bytes();
    let size = data.len() as u64;
    if let Err(e) = tokio::fs::write(&target, &data).await {
        return fail(formatter, &format!("Failed to write {dst_display}"), &Error::Io(e));
    }

    if formatter.is_json() {
        formatter.json(&CpOutput::new(src.to_full_path(), dst_display, size, false));
    } else {
        formatter.println(&format!(
            "{src} -> {dst_display} ({})",
            humansize::format_size(size, humansize::BINARY)
        ));
    }
    ExitCode::Success
}
