//! Path parsing and folder helpers
//!
//! Remote paths use the format `alias/bucket[/folder/][name]`. Local paths
//! are passed through as-is. Folder paths inside a bucket are sequences of
//! segments each terminated by the `/` delimiter; the empty path is the root.

use crate::error::{Error, Result};

/// The hierarchy separator used by the storage API
pub const DELIMITER: char = '/';

/// A parsed remote path pointing into a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath {
    /// Alias name
    pub alias: String,
    /// Bucket name
    pub bucket: String,
    /// Logical key inside the bucket (empty for bucket root)
    pub key: String,
    /// Whether the path ends with a slash (folder semantics)
    pub is_dir: bool,
}

impl RemotePath {
    /// Create a new RemotePath
    pub fn new(
        alias: impl Into<String>,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        let key = key.into();
        let is_dir = key.ends_with(DELIMITER) || key.is_empty();
        Self {
            alias: alias.into(),
            bucket: bucket.into(),
            key,
            is_dir,
        }
    }

    /// Get the full path as a string (alias/bucket/key)
    pub fn to_full_path(&self) -> String {
        if self.key.is_empty() {
            format!("{}/{}", self.alias, self.bucket)
        } else {
            format!("{}/{}/{}", self.alias, self.bucket, self.key)
        }
    }

    /// The folder part of the key, delimiter-terminated (empty at the root)
    pub fn folder(&self) -> &str {
        if self.is_dir {
            return &self.key;
        }
        match self.key.rfind(DELIMITER) {
            Some(pos) => &self.key[..=pos],
            None => "",
        }
    }

    /// The object name after the last delimiter (empty for folders)
    pub fn name(&self) -> &str {
        if self.is_dir {
            return "";
        }
        &self.key[self.folder().len()..]
    }

    /// Join a child component under this path's folder
    pub fn join(&self, child: &str) -> Self {
        Self::new(
            self.alias.clone(),
            self.bucket.clone(),
            format!("{}{child}", self.folder()),
        )
    }
}

impl std::fmt::Display for RemotePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_full_path())
    }
}

/// Parsed path that can be either local or remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedPath {
    /// Local filesystem path
    Local(std::path::PathBuf),
    /// Remote bucket path
    Remote(RemotePath),
}

impl ParsedPath {
    /// Check if this is a remote path
    pub fn is_remote(&self) -> bool {
        matches!(self, ParsedPath::Remote(_))
    }

    /// Check if this is a local path
    pub fn is_local(&self) -> bool {
        matches!(self, ParsedPath::Local(_))
    }

    /// Get the remote path if this is a remote path
    pub fn as_remote(&self) -> Option<&RemotePath> {
        match self {
            ParsedPath::Remote(p) => Some(p),
            ParsedPath::Local(_) => None,
        }
    }

    /// Get the local path if this is a local path
    pub fn as_local(&self) -> Option<&std::path::PathBuf> {
        match self {
            ParsedPath::Local(p) => Some(p),
            ParsedPath::Remote(_) => None,
        }
    }
}

/// Parse a path string into a ParsedPath
///
/// Anything starting with `/`, `./` or `../`, a bare file name with a dot,
/// or a path whose first segment is not a valid alias name is local.
pub fn parse_path(path: &str) -> Result<ParsedPath> {
    if path.is_empty() {
        return Err(Error::InvalidPath("Path cannot be empty".into()));
    }

    if path.starts_with('/') || path.starts_with("./") || path.starts_with("../") {
        return Ok(ParsedPath::Local(std::path::PathBuf::from(path)));
    }

    #[cfg(windows)]
    if path.len() >= 2 && path.chars().nth(1) == Some(':') {
        return Ok(ParsedPath::Local(std::path::PathBuf::from(path)));
    }

    let parts: Vec<&str> = path.splitn(3, DELIMITER).collect();

    match parts.as_slice() {
        [single] => {
            if single.contains('.') || single.contains('\\') {
                Ok(ParsedPath::Local(std::path::PathBuf::from(path)))
            } else {
                Err(Error::InvalidPath(format!(
                    "Path '{path}' is incomplete. Use format: alias/bucket[/key]"
                )))
            }
        }
        [alias, bucket, rest @ ..] => {
            if !is_valid_alias_name(alias) {
                return Ok(ParsedPath::Local(std::path::PathBuf::from(path)));
            }
            if bucket.is_empty() {
                return Err(Error::InvalidPath("Bucket name cannot be empty".into()));
            }
            let key = rest.first().copied().unwrap_or_default();
            Ok(ParsedPath::Remote(RemotePath::new(*alias, *bucket, key)))
        }
        [] => Err(Error::InvalidPath("Path cannot be empty".into())),
    }
}

/// Parse a path that must be remote
pub fn parse_remote(path: &str) -> Result<RemotePath> {
    match parse_path(path)? {
        ParsedPath::Remote(remote) => Ok(remote),
        ParsedPath::Local(_) => Err(Error::InvalidPath(format!(
            "'{path}' is not a remote path. Use format: alias/bucket[/key]"
        ))),
    }
}

/// Check if a string is a valid alias name
pub fn is_valid_alias_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Ensure a folder path is delimiter-terminated (the root stays empty)
pub fn normalize_folder(folder: &str) -> String {
    if folder.is_empty() || folder.ends_with(DELIMITER) {
        folder.to_string()
    } else {
        format!("{folder}{DELIMITER}")
    }
}

/// Reject names that cannot address a single object or folder
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Validation("Name cannot be empty".into()));
    }
    if name.contains(DELIMITER) {
        return Err(Error::Validation(format!(
            "Name '{name}' must not contain '{DELIMITER}'"
        )));
    }
    if name == "." || name == ".." {
        return Err(Error::Validation(format!("Name '{name}' is reserved")));
    }
    Ok(())
}

/// Text after the final `.` of a name, or empty when there is none
pub fn extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) => &name[pos + 1..],
        None => "",
    }
}

/// Display name of a delimited prefix such as `a/b/`
///
/// Prefixes end with the delimiter, so the last split segment is empty and
/// the name is the second-to-last one.
pub fn folder_name(prefix: &str) -> &str {
    let segments: Vec<&str> = prefix.split(DELIMITER).collect();
    if segments.len() >= 2 {
        segments[segments.len() - 2]
    } else {
        segments[0]
    }
}
