//! cat command - Display object contents
//!
//! Outputs the entire content of an object to stdout. Objects whose viewer
//! renders text are decoded as UTF-8; everything else is written verbatim.

use std::io::{self, Write};

use clap::Args;

use bx_core::{
    DownloadType, Error, ExtensionClassifier, ObjectOperations, PreviewClassifier, ResponseKind,
    View,
};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{connect, fail, remote_arg};

/// Display object contents
#[derive(Args, Debug)]
pub struct CatArgs {
    /// Object path (alias/bucket/[folder/]name)
    pub path: String,

    /// The object is an email in the email view
    #[arg(long)]
    pub email: bool,
}

/// Response kind for an object name
fn response_kind(name: &str) -> ResponseKind {
    match ExtensionClassifier.classify(name) {
        Some(preview) if preview.download_type == DownloadType::Text => ResponseKind::Text,
        _ => ResponseKind::Binary,
    }
}

/// Execute the cat command
pub async fn execute(args: CatArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let path = match remote_arg(&formatter, &args.path) {
        Ok(p) => p,
        Err(code) => return code,
    };
    if path.is_dir {
        formatter.error("Object key cannot be empty. Give the full path of an object.");
        return ExitCode::UsageError;
    }

    let session = match connect(&path, output_config) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let formatter = &session.formatter;
    let mut ctx = session.context(&path);
    if args.email {
        ctx = ctx.with_view(View::Email);
    }

    let ops = ObjectOperations::new(session.api.clone());
    let body = match ops
        .download_object(&ctx, path.name(), response_kind(path.name()), None, None)
        .await
    {
        Ok(body) => body,
        Err(e) => return fail(formatter, &format!("Failed to get {path}"), &e),
    };

    // Bypass the formatter to keep binary data intact
    let mut stdout = io::stdout().lock();
    if let Err(e) = stdout.write_all(&body.into_bytes()).and_then(|()| stdout.flush()) {
        return fail(formatter, "Failed to write to stdout", &Error::Io(e));
    }
    ExitCode::Success
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_kind() {
        assert_eq!(response_kind("notes.txt"), ResponseKind::Text);
        assert_eq!(response_kind("photo.png"), ResponseKind::Binary);
        assert_eq!(response_kind("README"), ResponseKind::Binary);
    }

    #[tokio::test]
    async fn test_folder_path_is_usage_error() {
        let args = CatArgs {
            path: "r2/b/docs/".to_string(),
            email: false,
        };
        let config = OutputConfig {
            quiet: true,
            ..Default::default()
        };
        assert_eq!(execute(args, config).await, ExitCode::UsageError);
    }
}
