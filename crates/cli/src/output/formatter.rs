//! Output formatter for human-readable and JSON output
//!
//! Ensures consistent output formatting across all commands.

use console::{Style, style};
use serde::Serialize;

use super::OutputConfig;

/// Formatter for CLI output
///
/// Handles both human-readable and JSON output formats based on configuration.
/// When JSON mode is enabled, all output is strict JSON without colors or progress.
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
}

impl Formatter {
    /// Create a new formatter with the given configuration
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Check if JSON output mode is enabled
    pub fn is_json(&self) -> bool {
        self.config.json
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.config.quiet
    }

    /// Check if colors are enabled
    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// The output configuration this formatter was built from
    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    fn paint(&self, style: Style) -> Style {
        style.force_styling(self.colors_enabled())
    }

    /// Output a success message
    pub fn success(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        let mark = self.paint(Style::new().green()).apply_to("✓");
        println!("{mark} {message}");
    }

    /// Output an error message
    ///
    /// Errors are always printed, even in quiet mode.
    pub fn error(&self, message: &str) {
        if self.config.json {
            let error = serde_json::json!({ "error": message });
            eprintln!("{error}");
        } else {
            let mark = self.paint(Style::new().red()).apply_to("✗");
            eprintln!("{mark} {message}");
        }
    }

    /// Output a warning message
    pub fn warning(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        let mark = self.paint(Style::new().yellow()).apply_to("⚠");
        eprintln!("{mark} {message}");
    }

    /// Output JSON directly
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("Error serializing output: {e}"),
        }
    }

    /// Print a line of text (respects quiet mode)
    pub fn println(&self, message: &str) {
        if self.config.quiet {
            return;
        }
        println!("{message}");
    }

    /// Render a folder name for listings
    pub fn folder(&self, name: &str) -> String {
        style(format!("{name}/"))
            .blue()
            .bold()
            .force_styling(self.colors_enabled())
            .to_string()
    }

    /// Render dimmed secondary text
    pub fn dim(&self, text: &str) -> String {
        style(text)
            .dim()
            .force_styling(self.colors_enabled())
            .to_string()
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatter_default() {
        let formatter = Formatter::default();
        assert!(!formatter.is_json());
        assert!(!formatter.is_quiet());
        assert!(formatter.colors_enabled());
    }

    #[test]
    fn test_formatter_json_mode() {
        let config = OutputConfig {
            json: true,
            ..Default::default()
        };
        let formatter = Formatter::new(config);
        assert!(formatter.is_json());
        assert!(!formatter.colors_enabled());
    }

    #[test]
    fn test_formatter_no_color() {
        let config = OutputConfig {
            no_color: true,
            ..Default::default()
        };
        let formatter = Formatter::new(config);
        assert!(!formatter.colors_enabled());
        assert_eq!(formatter.folder("docs"), "docs/");
        assert_eq!(formatter.dim("-"), "-");
    }

    #[test]
    fn test_formatter_colored_folder() {
        let formatter = Formatter::default();
        let rendered = formatter.folder("docs");
        assert!(rendered.contains("docs/"));
        assert!(rendered.contains("\u{1b}["));
    }
}
