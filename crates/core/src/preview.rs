//! Preview classification
//!
//! Tags listed files with the viewer a UI would use for them and decides
//! which body representation a download needs.

use serde::{Deserialize, Serialize};

use crate::path::extension;

/// Viewer family for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewKind {
    Text,
    Markdown,
    Code,
    Image,
    Pdf,
    Audio,
    Video,
    Email,
}

/// How a download body must be represented for the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DownloadType {
    /// Decoded as text
    Text,
    /// Raw bytes rendered through an object URL
    ObjectUrl,
    /// Raw bytes handed to a parser
    Blob,
}

impl DownloadType {
    /// Whether the viewer needs byte-level access to the body
    pub const fn is_binary(self) -> bool {
        matches!(self, DownloadType::ObjectUrl | DownloadType::Blob)
    }
}

/// Classification attached to each listed file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewDescriptor {
    #[serde(rename = "type")]
    pub kind: PreviewKind,
    pub download_type: DownloadType,
}

impl PreviewDescriptor {
    pub const fn new(kind: PreviewKind, download_type: DownloadType) -> Self {
        Self {
            kind,
            download_type,
        }
    }
}

/// Maps a file name to a preview descriptor
pub trait PreviewClassifier: Send + Sync {
    /// `None` means the file has no inline preview
    fn classify(&self, name: &str) -> Option<PreviewDescriptor>;
}

/// Default classifier keyed on the file extension
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionClassifier;

const TEXT_EXTENSIONS: &[&str] = &["txt", "log", "csv", "tsv", "ini", "conf", "env"];
const CODE_EXTENSIONS: &[&str] = &[
    "json", "yaml", "yml", "toml", "xml", "html", "htm", "css", "js", "ts", "py", "rs", "go",
    "sh", "sql",
];

impl PreviewClassifier for ExtensionClassifier {
    fn classify(&self, name: &str) -> Option<PreviewDescriptor> {
        let ext = extension(name).to_ascii_lowercase();

        let by_extension = match ext.as_str() {
            "md" | "markdown" => Some(PreviewKind::Markdown),
            "pdf" => Some(PreviewKind::Pdf),
            "eml" => Some(PreviewKind::Email),
            e if TEXT_EXTENSIONS.contains(&e) => Some(PreviewKind::Text),
            e if CODE_EXTENSIONS.contains(&e) => Some(PreviewKind::Code),
            _ => None,
        };

        let kind = by_extension.or_else(|| {
            let mime = mime_guess::from_ext(&ext).first()?;
            match mime.type_().as_str() {
                "image" => Some(PreviewKind::Image),
                "audio" => Some(PreviewKind::Audio),
                "video" => Some(PreviewKind::Video),
                "text" => Some(PreviewKind::Text),
                _ => None,
            }
        })?;

        let download_type = match kind {
            PreviewKind::Text | PreviewKind::Markdown | PreviewKind::Code => DownloadType::Text,
            PreviewKind::Image | PreviewKind::Pdf | PreviewKind::Audio | PreviewKind::Video => {
                DownloadType::ObjectUrl
            }
            PreviewKind::Email => DownloadType::Blob,
        };

        Some(PreviewDescriptor::new(kind, download_type))
    }
}
