//! Output formatting utilities
//!
//! This module provides formatters for CLI output in both human-readable
//! and JSON formats. It also handles progress bars and colored output.

mod formatter;
mod progress;

pub use formatter::Formatter;
pub use progress::ProgressBar;

use bx_core::Defaults;

/// Output configuration derived from CLI flags
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Use JSON output format
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Disable progress bar
    pub no_progress: bool,
    /// Suppress non-error output
    pub quiet: bool,
}

impl OutputConfig {
    /// Fill in settings the flags left at their defaults from the config file
    pub fn with_defaults(mut self, defaults: &Defaults) -> Self {
        self.json |= defaults.output == "json";
        self.no_color |= defaults.color == "never";
        self.no_progress |= !defaults.progress;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_defaults_only_tightens() {
        let mut defaults = Defaults::default();
        defaults.output = "json".into();
        defaults.progress = false;

        let config = OutputConfig::default().with_defaults(&defaults);
        assert!(config.json);
        assert!(config.no_progress);
        assert!(!config.no_color);

        let config = OutputConfig {
            no_color: true,
            ..Default::default()
        }
        .with_defaults(&Defaults::default());
        assert!(config.no_color);
        assert!(!config.json);
    }
}
