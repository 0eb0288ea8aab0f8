//! Selection context
//!
//! The bucket, folder and view a caller is looking at, plus the read-only
//! display settings. Every operation receives it explicitly.

use serde::{Deserialize, Serialize};

use crate::path::{DELIMITER, normalize_folder};

/// Namespace that hosts the email view inside a bucket
pub const DEFAULT_EMAIL_NAMESPACE: &str = "r2-explorer";

/// Which logical view of the bucket is active
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Plain file browser over the bucket
    #[default]
    Files,
    /// Email folders stored under the hidden namespace
    Email,
}

/// Explicit replacement for the dashboard's shared UI store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionContext {
    /// Active bucket
    pub bucket: String,
    /// Current folder, delimiter-terminated (empty for the root)
    pub current_folder: String,
    /// Active view
    pub view: View,
    /// Keep entries whose name starts with `.`
    pub show_hidden_files: bool,
    /// Namespace used by the email view
    pub email_namespace: String,
}

impl SelectionContext {
    /// Create a context at the root of a bucket
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            current_folder: String::new(),
            view: View::Files,
            show_hidden_files: false,
            email_namespace: DEFAULT_EMAIL_NAMESPACE.to_string(),
        }
    }

    pub fn with_folder(mut self, folder: &str) -> Self {
        self.current_folder = normalize_folder(folder);
        self
    }

    pub fn with_view(mut self, view: View) -> Self {
        self.view = view;
        self
    }

    pub fn with_hidden_files(mut self, show: bool) -> Self {
        self.show_hidden_files = show;
        self
    }

    pub fn with_email_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.email_namespace = namespace.into();
        self
    }

    /// The prefix objects of the current folder live under
    ///
    /// The email view maps the folder into `.<namespace>/emails/<folder>/`.
    pub fn effective_folder(&self) -> String {
        match self.view {
            View::Files => self.current_folder.clone(),
            View::Email => format!(
                ".{}/emails/{}/",
                self.email_namespace,
                self.current_folder.trim_end_matches(DELIMITER)
            ),
        }
    }

    /// Whether an item with this display name is shown
    pub fn is_visible(&self, name: &str) -> bool {
        self.show_hidden_files || !name.starts_with('.')
    }
}
