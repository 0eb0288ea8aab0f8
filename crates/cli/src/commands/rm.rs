//! rm command - Remove objects
//!
//! Removes one or more objects from a bucket. Each path is deleted with its
//! own request; a failure does not stop the remaining paths.

use clap::Args;
use serde::Serialize;

use bx_core::ObjectOperations;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{connect, fail, remote_arg};

/// Remove objects
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Object path(s) to remove (alias/bucket/[folder/]name)
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Only show what would be deleted (dry run)
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    status: &'static str,
    deleted: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failed: Vec<String>,
    total: usize,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let mut deleted = Vec::new();
    let mut failed = Vec::new();
    let mut worst = ExitCode::Success;

    for path_str in &args.paths {
        match remove_one(path_str, &args, &output_config).await {
            Ok(path) => deleted.push(path),
            Err(code) => {
                failed.push(path_str.clone());
                // Usage and auth errors affect every remaining path too
                if matches!(code, ExitCode::UsageError | ExitCode::AuthError) {
                    return code;
                }
                worst = code;
            }
        }
    }

    if formatter.is_json() {
        formatter.json(&RmOutput {
            status: if failed.is_empty() { "success" } else { "partial" },
            total: deleted.len(),
            deleted,
            failed,
        });
    } else if !args.dry_run && !deleted.is_empty() {
        formatter.success(&format!("Removed {} object(s).", deleted.len()));
    }

    worst
}

async fn remove_one(
    path_str: &str,
    args: &RmArgs,
    output_config: &OutputConfig,
) -> Result<String, ExitCode> {
    let formatter = Formatter::new(output_config.clone());
    let path = remote_arg(&formatter, path_str)?;
    if path.is_dir {
        formatter.error(&format!(
            "'{path}' is a folder. Give the full path of an object."
        ));
        return Err(ExitCode::UsageError);
    }

    if args.dry_run {
        formatter.println(&format!("Would remove: {path}"));
        return Ok(path.to_full_path());
    }

    let session = connect(&path, output_config.clone())?;
    let ctx = session.context(&path);
    let ops = ObjectOperations::new(session.api.clone());

    match ops.delete_object(&ctx, path.folder(), path.name()).await {
        Ok(()) => {
            if !session.formatter.is_json() {
                session.formatter.println(&format!("Removed: {path}"));
            }
            Ok(path.to_full_path())
        }
        Err(e) => Err(fail(
            &session.formatter,
            &format!("Failed to remove {path}"),
            &e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> OutputConfig {
        OutputConfig {
            quiet: true,
            ..Default::default()
        }
    }

    fn dry_run(paths: &[&str]) -> RmArgs {
        RmArgs {
            paths: paths.iter().map(|p| p.to_string()).collect(),
            dry_run: true,
        }
    }

    #[tokio::test]
    async fn test_dry_run_reports_object() {
        let args = dry_run(&["r2/b/docs/a.txt"]);
        let removed = remove_one(&args.paths[0], &args, &quiet()).await.unwrap();
        assert_eq!(removed, "r2/b/docs/a.txt");
    }

    #[tokio::test]
    async fn test_folders_are_rejected() {
        let args = dry_run(&["r2/b/docs/"]);
        let code = remove_one(&args.paths[0], &args, &quiet()).await.unwrap_err();
        assert_eq!(code, ExitCode::UsageError);
    }

    #[tokio::test]
    async fn test_execute_stops_on_usage_error() {
        let code = execute(dry_run(&["r2/b/a.txt", "r2/b/"]), quiet()).await;
        assert_eq!(code, ExitCode::UsageError);
    }
}
