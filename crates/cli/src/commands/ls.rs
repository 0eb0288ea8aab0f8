//! ls command - List files and folders
//!
//! Lists the folders and files directly under a folder of a bucket.

use clap::Args;
use serde::Serialize;

use bx_core::{FileItem, Listing, ListingAggregator, View};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::{connect, fail, remote_arg};

/// List files and folders
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Remote folder (alias/bucket[/folder])
    pub path: String,

    /// Treat the folder as a mailbox of the email view
    #[arg(long)]
    pub email: bool,

    /// Include entries whose name starts with '.'
    #[arg(short, long)]
    pub all: bool,

    /// Summarize output (show totals only)
    #[arg(long)]
    pub summarize: bool,
}

/// Output structure for ls command (JSON format)
#[derive(Debug, Serialize)]
struct LsOutput {
    #[serde(flatten)]
    listing: Listing,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<Summary>,
}

#[derive(Debug, Serialize)]
struct Summary {
    total_files: usize,
    total_folders: usize,
    total_size_bytes: u64,
    total_size_human: String,
}

impl Summary {
    fn of(listing: &Listing) -> Self {
        let total_size_bytes = listing.files.iter().filter_map(|f| f.object.size).sum();
        Self {
            total_files: listing.files.len(),
            total_folders: listing.folders.len(),
            total_size_bytes,
            total_size_human: humansize::format_size(total_size_bytes, humansize::BINARY),
        }
    }
}

/// Execute the ls command
pub async fn execute(args: LsArgs, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    // A bare alias/bucket is the bucket root
    let mut path = match remote_arg(&formatter, &args.path) {
        Ok(p) => p,
        Err(code) => return code,
    };
    if !path.is_dir {
        path = bx_core::RemotePath::new(&path.alias, &path.bucket, format!("{}/", path.key));
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
    if args.all {
        ctx = ctx.with_hidden_files(true);
    }

    let aggregator = ListingAggregator::new(session.api.clone())
        .with_max_pages(session.config.defaults.max_list_pages);

    let listing = match aggregator.list(&ctx).await {
        Ok(listing) => listing,
        Err(e) => return fail(formatter, &format!("Failed to list {path}"), &e),
    };

    if formatter.is_json() {
        let summary = args.summarize.then(|| Summary::of(&listing));
        formatter.json(&LsOutput { listing, summary });
    } else {
        for folder in &listing.folders {
            formatter.println(&format!(
                "{} {:>10} {}",
                formatter.dim(&format!("[{:19}]", "")),
                "0B",
                formatter.folder(&folder.name)
            ));
        }
        for file in &listing.files {
            formatter.println(&file_line(formatter, file));
        }

        if args.summarize {
            let summary = Summary::of(&listing);
            formatter.println(&format!(
                "\nTotal: {} files, {} folders, {}",
                summary.total_files, summary.total_folders, summary.total_size_human
            ));
        }
    }

    ExitCode::Success
}

fn file_line(formatter: &Formatter, file: &FileItem) -> String {
    let date = file
        .object
        .uploaded
        .map(|d| d.strftime("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();
    let size = file.object.size_human().unwrap_or_else(|| "-".to_string());
    format!(
        "{} {:>10} {}",
        formatter.dim(&format!("[{date:19}]")),
        size,
        file.name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bx_core::ObjectRecord;
    use bx_core::key;

    fn formatter() -> Formatter {
        Formatter::new(OutputConfig {
            no_color: true,
            ..Default::default()
        })
    }

    fn file(name: &str, size: Option<u64>) -> FileItem {
        let mut object = ObjectRecord::new(name);
        object.size = size;
        FileItem {
            object,
            name: name.to_string(),
            path: String::new(),
            extension: String::new(),
            preview: None,
            is_file: true,
            hash: key::encode_str(name),
        }
    }

    #[test]
    fn test_file_line() {
        let line = file_line(&formatter(), &file("a.txt", Some(2048)));
        assert!(line.ends_with(" a.txt"));
        assert!(line.contains("2 KiB"));

        let line = file_line(&formatter(), &file("b.txt", None));
        assert!(line.contains(" - "));
    }

    #[test]
    fn test_summary() {
        let listing = Listing {
            files: vec![file("a", Some(1024)), file("b", Some(1024)), file("c", None)],
            folders: Vec::new(),
        };
        let summary = Summary::of(&listing);
        assert_eq!(summary.total_files, 3);
        assert_eq!(summary.total_size_bytes, 2048);
        assert_eq!(summary.total_size_human, "2 KiB");
    }
}
