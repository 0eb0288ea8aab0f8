//! Progress bar utilities for transfer operations
//!
//! Provides consistent progress indication for uploads and downloads.

use std::sync::Arc;

use bx_core::{ProgressCallback, TransferProgress};

use super::OutputConfig;

const BAR_TEMPLATE: &str =
    "{spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})";

/// Progress bar wrapper
///
/// Handles progress display based on output configuration.
/// In quiet or JSON mode, progress is suppressed.
#[derive(Debug, Clone)]
pub struct ProgressBar {
    bar: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    /// Create a new progress bar with the given total size
    pub fn new(config: &OutputConfig, total: u64, message: &str) -> Self {
        let bar = if config.quiet || config.json || config.no_progress {
            None
        } else {
            let style = indicatif::ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
                .progress_chars("#>-");
            let bar = indicatif::ProgressBar::new(total);
            bar.set_style(style);
            bar.set_message(message.to_string());
            Some(bar)
        };

        Self { bar }
    }

    /// Callback feeding transfer progress into the bar
    ///
    /// A total reported by the transfer replaces the initial length.
    pub fn callback(&self) -> Option<ProgressCallback> {
        let bar = self.bar.clone()?;
        Some(Arc::new(move |progress: TransferProgress| {
            if let Some(total) = progress.total {
                bar.set_length(total);
            }
            bar.set_position(progress.transferred);
        }))
    }

    /// Finish and clear the progress bar
    pub fn finish_and_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }

    /// Leave the bar where it stopped
    pub fn abandon(&self) {
        if let Some(bar) = &self.bar {
            bar.abandon();
        }
    }

    /// Check if progress bar is visible
    pub fn is_visible(&self) -> bool {
        self.bar.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_quiet_mode() {
        let config = OutputConfig {
            quiet: true,
            ..Default::default()
        };
        let bar = ProgressBar::new(&config, 100, "a.txt");
        assert!(!bar.is_visible());
        assert!(bar.callback().is_none());
    }

    #[test]
    fn test_progress_bar_json_mode() {
        let config = OutputConfig {
            json: true,
            ..Default::default()
        };
        assert!(!ProgressBar::new(&config, 100, "a.txt").is_visible());
    }

    #[test]
    fn test_progress_bar_no_progress() {
        let config = OutputConfig {
            no_progress: true,
            ..Default::default()
        };
        assert!(!ProgressBar::new(&config, 100, "a.txt").is_visible());
    }

    #[test]
    fn test_progress_callback_moves_bar() {
        let bar = ProgressBar::new(&OutputConfig::default(), 100, "a.txt");
        assert!(bar.is_visible());

        let callback = bar.callback().unwrap();
        callback(TransferProgress {
            transferred: 40,
            total: Some(200),
        });

        let inner = bar.bar.as_ref().unwrap();
        assert_eq!(inner.position(), 40);
        assert_eq!(inner.length(), Some(200));
        bar.finish_and_clear();
    }
}
