//! mv command - Rename objects
//!
//! Renames an object inside its folder with a single server-side move.

use clap::Args;
use serde::Serialize;

use bx_core::ObjectOperations;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{connect, fail, remote_arg};

/// Rename an object within its folder
#[derive(Args, Debug)]
pub struct MvArgs {
    /// Object to rename (alias/bucket/[folder/]name)
    pub source: String,

    /// New name, in the same folder
    pub new_name: String,
}

#[derive(Debug, Serialize)]
struct MvOutput {
    status: &'static str,
    source: String,
    target: String,
}

/// Execute the mv command
pub async fn execute(args: MvArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let source = match remote_arg(&formatter, &args.source) {
        Ok(p) => p,
        Err(code) => return code,
    };
    if source.is_dir {
        formatter.error("Only objects can be renamed. Give the full path of an object.");
        return ExitCode::UsageError;
    }

    let session = match connect(&source, output_config) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let formatter = &session.formatter;
    let ctx = session.context(&source);
    let target = source.join(&args.new_name);

    let ops = ObjectOperations::new(session.api.clone());
    if let Err(e) = ops
        .rename_object(&ctx, source.name(), &args.new_name)
        .await
    {
        return fail(formatter, &format!("Failed to rename {source}"), &e);
    }

    if formatter.is_json() {
        formatter.json(&MvOutput {
            status: "success",
            source: source.to_full_path(),
            target: target.to_full_path(),
        });
    } else {
        formatter.println(&format!("{source} -> {target}"));
    }

    ExitCode::Success
}
