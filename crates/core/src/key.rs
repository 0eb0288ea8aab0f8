//! Key encoding
//!
//! The dashboard API addresses every object by a base64 rendition of its
//! UTF-8 path. Encoding is total and deterministic, which is why the same
//! value also serves as the stable `hash` identifier of listed items.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// An encoded storage key, ready to be placed on the wire
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    /// Borrow the encoded form
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recover the logical path this key was encoded from
    pub fn decode(&self) -> Result<String> {
        decode(&self.0)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Encode `name`, optionally placed under `path`
///
/// A `None` or empty path encodes the name alone. The path is expected to
/// already end with the `/` delimiter; no separator is inserted.
pub fn encode(name: &str, path: Option<&str>) -> Key {
    match path {
        Some(path) if !path.is_empty() => encode_str(&format!("{path}{name}")),
        _ => encode_str(name),
    }
}

/// Encode a complete logical path
pub fn encode_str(value: &str) -> Key {
    Key(STANDARD.encode(value.as_bytes()))
}

/// Decode an encoded key back into its logical path
pub fn decode(encoded: &str) -> Result<String> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| Error::Validation(format!("Key '{encoded}' is not valid base64: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| Error::Validation(format!("Key '{encoded}' is not valid UTF-8: {e}")))
}
