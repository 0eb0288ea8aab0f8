//! meta command - Replace custom metadata
//!
//! The given pairs become the object's entire custom metadata. Keys that
//! are not repeated on the command line are removed.

use std::collections::HashMap;

use clap::Args;
use serde::Serialize;

use bx_core::{ObjectOperations, View};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{connect, fail, remote_arg};

/// Replace the custom metadata of an object
#[derive(Args, Debug)]
pub struct MetaArgs {
    /// Object path (alias/bucket/[folder/]name)
    pub path: String,

    /// Metadata entry as KEY=VALUE (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_pair)]
    pub entries: Vec<(String, String)>,

    /// Remove all custom metadata
    #[arg(long, conflicts_with = "entries")]
    pub clear: bool,

    /// The object is an email in the email view
    #[arg(long)]
    pub email: bool,
}

#[derive(Debug, Serialize)]
struct MetaOutput {
    status: &'static str,
    path: String,
    custom_metadata: HashMap<String, String>,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

/// Execute the meta command
pub async fn execute(args: MetaArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    if args.entries.is_empty() && !args.clear {
        formatter.error("Nothing to set. Pass --set KEY=VALUE or --clear.");
        return ExitCode::UsageError;
    }

    let path = match remote_arg(&formatter, &args.path) {
        Ok(p) => p,
        Err(code) => return code,
    };
    if path.is_dir {
        formatter.error("Metadata belongs to objects. Give the full path of an object.");
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

    let metadata: HashMap<String, String> = args.entries.into_iter().collect();
    let ops = ObjectOperations::new(session.api.clone());
    let record = match ops.update_metadata(&ctx, path.name(), metadata.clone()).await {
        Ok(record) => record,
        Err(e) => return fail(formatter, &format!("Failed to update {path}"), &e),
    };

    let stored = record.custom_metadata.unwrap_or(metadata);
    if formatter.is_json() {
        formatter.json(&MetaOutput {
            status: "success",
            path: path.to_full_path(),
            custom_metadata: stored,
        });
    } else {
        formatter.success(&format!("Metadata of {path} replaced."));
        let mut keys: Vec<_> = stored.keys().collect();
        keys.sort();
        for key in keys {
            formatter.println(&format!("  {key}: {}", stored[key]));
        }
    }

    ExitCode::Success
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair("owner=ana").unwrap(),
            ("owner".to_string(), "ana".to_string())
        );
        assert_eq!(
            parse_pair("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_pair("empty=").unwrap().1, "");
        assert!(parse_pair("novalue").is_err());
        assert!(parse_pair("=x").is_err());
    }

    #[tokio::test]
    async fn test_requires_entries_or_clear() {
        let args = MetaArgs {
            path: "r2/b/a.txt".to_string(),
            entries: Vec::new(),
            clear: false,
            email: false,
        };
        let config = OutputConfig {
            quiet: true,
            ..Default::default()
        };
        assert_eq!(execute(args, config).await, ExitCode::UsageError);
    }
}
