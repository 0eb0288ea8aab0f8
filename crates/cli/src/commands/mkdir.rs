//! mkdir command - Create a folder
//!
//! Creates a folder placeholder inside a bucket.

use clap::Args;
use serde::Serialize;

use bx_core::{Error, ObjectOperations, RemotePath};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{connect, fail, remote_arg};

/// Create a folder
#[derive(Args, Debug)]
pub struct MkdirArgs {
    /// Folder to create (alias/bucket/[parent/]name)
    pub target: String,

    /// Ignore error if the folder already exists
    #[arg(short = 'p', long)]
    pub ignore_existing: bool,
}

#[derive(Debug, Serialize)]
struct MkdirOutput {
    status: &'static str,
    bucket: String,
    folder: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Split `alias/bucket/parent/name[/]` into its parent path and folder name
fn split_target(path: &RemotePath) -> Option<(RemotePath, String)> {
    let key = path.key.trim_end_matches('/');
    if key.is_empty() {
        return None;
    }
    let target = RemotePath::new(&path.alias, &path.bucket, key);
    let name = target.name().to_string();
    let parent = RemotePath::new(&path.alias, &path.bucket, target.folder());
    Some((parent, name))
}

/// Execute the mkdir command
pub async fn execute(args: MkdirArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let path = match remote_arg(&formatter, &args.target) {
        Ok(p) => p,
        Err(code) => return code,
    };
    let Some((parent, name)) = split_target(&path) else {
        formatter.error("Folder name cannot be empty. Use format: alias/bucket/folder");
        return ExitCode::UsageError;
    };

    let session = match connect(&path, output_config) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let formatter = &session.formatter;
    let ctx = session.context(&parent);
    let display = format!("{}/{}/{}{name}/", path.alias, path.bucket, parent.key);

    let ops = ObjectOperations::new(session.api.clone());
    let message = match ops.create_folder(&ctx, &name).await {
        Ok(_) => None,
        Err(Error::Conflict(_)) if args.ignore_existing => {
            Some("Folder already exists".to_string())
        }
        Err(e) => return fail(formatter, &format!("Failed to create {display}"), &e),
    };

    if formatter.is_json() {
        formatter.json(&MkdirOutput {
            status: "success",
            bucket: ctx.bucket.clone(),
            folder: format!("{}{name}/", ctx.current_folder),
            message,
        });
    } else if message.is_some() {
        formatter.success(&format!("Folder '{display}' already exists."));
    } else {
        formatter.success(&format!("Folder '{display}' created successfully."));
    }

    ExitCode::Success
}
