//! Configuration management
//!
//! This module handles loading, saving, and migrating the bx configuration file.
//! The configuration file is stored in TOML format at ~/.config/bx/config.toml,
//! or under `$BX_CONFIG_DIR` when that variable is set.
//!
//! Changes to schema_version require migration support.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::alias::Alias;
use crate::context::{DEFAULT_EMAIL_NAMESPACE, SelectionContext};
use crate::error::{Error, Result};
use crate::listing::DEFAULT_MAX_PAGES;
use crate::multipart::{DEFAULT_PART_SIZE, MultipartConfig};

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "BX_CONFIG_DIR";

const MIB: u64 = 1024 * 1024;

/// Default output format
const DEFAULT_OUTPUT: &str = "human";

/// Default color setting
const DEFAULT_COLOR: &str = "auto";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Default settings
    #[serde(default)]
    pub defaults: Defaults,

    /// Configured aliases
    #[serde(default)]
    pub aliases: Vec<Alias>,
}

/// Default settings for CLI behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Output format: "human" or "json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Color mode: "auto", "always", or "never"
    #[serde(default = "default_color")]
    pub color: String,

    /// Show progress bars
    #[serde(default = "default_true")]
    pub progress: bool,

    /// List entries whose name starts with `.`
    #[serde(default)]
    pub show_hidden_files: bool,

    /// Namespace hosting the email view
    #[serde(default = "default_email_namespace")]
    pub email_namespace: String,

    /// Page bound for a single listing call
    #[serde(default = "default_max_list_pages")]
    pub max_list_pages: usize,

    /// Uploads at or above this size use the multipart protocol
    #[serde(default = "default_multipart_threshold")]
    pub multipart_threshold_mib: u64,

    /// Multipart part size
    #[serde(default = "default_part_size")]
    pub part_size_mib: u64,

    /// Parts uploaded concurrently
    #[serde(default = "default_part_concurrency")]
    pub part_concurrency: usize,
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_true() -> bool {
    true
}

fn default_email_namespace() -> String {
    DEFAULT_EMAIL_NAMESPACE.to_string()
}

fn default_max_list_pages() -> usize {
    DEFAULT_MAX_PAGES
}

fn default_multipart_threshold() -> u64 {
    100
}

fn default_part_size() -> u64 {
    DEFAULT_PART_SIZE / MIB
}

fn default_part_concurrency() -> usize {
    4
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            progress: true,
            show_hidden_files: false,
            email_namespace: default_email_namespace(),
            max_list_pages: default_max_list_pages(),
            multipart_threshold_mib: default_multipart_threshold(),
            part_size_mib: default_part_size(),
            part_concurrency: default_part_concurrency(),
        }
    }
}

impl Defaults {
    /// Multipart threshold in bytes
    pub fn multipart_threshold(&self) -> u64 {
        self.multipart_threshold_mib.saturating_mul(MIB)
    }

    /// Multipart settings derived from the defaults
    pub fn multipart_config(&self) -> MultipartConfig {
        MultipartConfig::new()
            .part_size(self.part_size_mib.saturating_mul(MIB))
            .concurrency(self.part_concurrency)
    }

    /// Apply the display settings to a selection context
    pub fn apply(&self, ctx: SelectionContext) -> SelectionContext {
        ctx.with_hidden_files(self.show_hidden_files)
            .with_email_namespace(self.email_namespace.clone())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            aliases: Vec::new(),
        }
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("bx"),
        };
        Ok(Self {
            config_path: config_dir.join("config.toml"),
        })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    /// If the schema version doesn't match, attempts migration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        if config.schema_version < SCHEMA_VERSION {
            config = self.migrate(config)?;
        } else if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade bx.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(config)
    }

    /// Save configuration to disk
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 600 (owner read/write only).
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        Ok(())
    }

    /// Migrate configuration from older schema version
    fn migrate(&self, mut config: Config) -> Result<Config> {
        // Version 0 files predate the schema field; their layout is unchanged.
        config.schema_version = SCHEMA_VERSION;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let manager = ConfigManager::with_path(config_path);
        (manager, temp_dir)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.defaults.output, "human");
        assert_eq!(config.defaults.color, "auto");
        assert!(config.defaults.progress);
        assert!(!config.defaults.show_hidden_files);
        assert_eq!(config.defaults.email_namespace, "r2-explorer");
        assert_eq!(config.defaults.max_list_pages, DEFAULT_MAX_PAGES);
        assert_eq!(config.defaults.part_size_mib, 64);
        assert!(config.aliases.is_empty());
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let (manager, _temp_dir) = temp_config_manager();
        let config = manager.load().unwrap();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_save_and_load() {
        let (manager, _temp_dir) = temp_config_manager();

        let mut config = Config::default();
        config.defaults.show_hidden_files = true;
        config
            .aliases
            .push(Alias::new("test", "http://localhost:8787").with_token("secret"));

        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();

        assert!(loaded.defaults.show_hidden_files);
        assert_eq!(loaded.aliases.len(), 1);
        assert_eq!(loaded.aliases[0].name, "test");
    }

    #[cfg(unix)]
    #[test]
    fn test_save_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (manager, _temp_dir) = temp_config_manager();
        manager.save(&Config::default()).unwrap();

        let mode = std::fs::metadata(manager.config_path())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_partial_defaults_are_filled() {
        let (manager, _temp_dir) = temp_config_manager();
        std::fs::write(
            manager.config_path(),
            "schema_version = 1\n[defaults]\npart_size_mib = 8\n",
        )
        .unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.defaults.part_size_mib, 8);
        assert_eq!(config.defaults.output, "human");
        assert_eq!(config.defaults.multipart_config().part_size, 8 * MIB);
    }

    #[test]
    fn test_old_schema_is_migrated() {
        let (manager, _temp_dir) = temp_config_manager();
        std::fs::write(manager.config_path(), "schema_version = 0\n").unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_schema_version_too_new() {
        let (manager, _temp_dir) = temp_config_manager();

        let content = format!("schema_version = {}\n", SCHEMA_VERSION + 1);
        std::fs::write(manager.config_path(), content).unwrap();

        let result = manager.load();
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("newer than supported")
        );
    }

    #[test]
    fn test_defaults_apply_to_context() {
        let mut defaults = Defaults::default();
        defaults.show_hidden_files = true;
        defaults.email_namespace = "mailbox".into();

        let ctx = defaults.apply(SelectionContext::new("b"));
        assert!(ctx.show_hidden_files);
        assert_eq!(ctx.email_namespace, "mailbox");
    }
}
