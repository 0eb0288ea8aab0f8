//! bx-core: Core library for the bucket-explorer client
//!
//! This crate provides the core functionality for the bx CLI, including:
//! - Key encoding for the dashboard storage API
//! - Listing aggregation into files and folders
//! - Multipart upload coordination
//! - Single-shot object operations
//! - Configuration and alias management
//!
//! Everything that talks to the network goes through the [`BucketApi`]
//! trait, so the crate stays independent of any HTTP client.

pub mod alias;
pub mod config;
pub mod context;
pub mod error;
pub mod key;
pub mod listing;
pub mod multipart;
pub mod ops;
pub mod path;
pub mod preview;
pub mod traits;

pub use alias::{Alias, AliasAuth, AliasManager, TimeoutConfig};
pub use config::{Config, ConfigManager, Defaults};
pub use context::{SelectionContext, View};
pub use error::{Error, Result};
pub use key::Key;
pub use listing::{FileItem, FolderItem, Listing, ListingAggregator};
pub use multipart::{MultipartConfig, MultipartCoordinator, MultipartSession, SessionState};
pub use ops::ObjectOperations;
pub use path::{ParsedPath, RemotePath, parse_path, parse_remote};
pub use preview::{DownloadType, ExtensionClassifier, PreviewClassifier, PreviewDescriptor};
pub use traits::{
    BucketApi, DownloadBody, ObjectRecord, ProgressCallback, ResponseKind, TransferProgress,
    UploadFile,
};
