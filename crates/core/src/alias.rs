//! Alias management
//!
//! Aliases are named references to dashboard API endpoints,
//! including connection details and credentials.

use serde::{Deserialize, Serialize};

use crate::config::ConfigManager;
use crate::error::{Error, Result};
use crate::path::is_valid_alias_name;

/// Timeout configuration for an alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_ms: u64,

    /// Read timeout in milliseconds
    #[serde(default = "default_read_timeout")]
    pub read_ms: u64,
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_read_timeout() -> u64 {
    30000
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: default_connect_timeout(),
            read_ms: default_read_timeout(),
        }
    }
}

/// Credentials sent with every request
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AliasAuth {
    /// `Authorization: Bearer <token>`
    Bearer { token: String },
    /// HTTP basic authentication
    Basic { username: String, password: String },
}

impl std::fmt::Debug for AliasAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AliasAuth::Bearer { .. } => f.write_str("Bearer(***)"),
            AliasAuth::Basic { username, .. } => write!(f, "Basic({username}, ***)"),
        }
    }
}

/// An alias represents a named dashboard API endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    /// Unique name for this alias
    pub name: String,

    /// Base URL of the dashboard API
    pub endpoint: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AliasAuth>,

    /// Allow insecure TLS connections
    #[serde(default)]
    pub insecure: bool,

    /// Timeout configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<TimeoutConfig>,
}

impl Alias {
    /// Create a new alias without credentials
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            auth: None,
            insecure: false,
            timeout: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth = Some(AliasAuth::Bearer {
            token: token.into(),
        });
        self
    }

    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.auth = Some(AliasAuth::Basic {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    /// Get the effective timeout configuration
    pub fn timeout_config(&self) -> TimeoutConfig {
        self.timeout.clone().unwrap_or_default()
    }

    /// Check the name and endpoint before the alias is stored
    pub fn validate(&self) -> Result<()> {
        if !is_valid_alias_name(&self.name) {
            return Err(Error::Config(format!(
                "Invalid alias name '{}': use letters, digits, '-' or '_'",
                self.name
            )));
        }

        let url = url::Url::parse(&self.endpoint)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Endpoint must use http or https: {}",
                self.endpoint
            )));
        }
        Ok(())
    }
}

/// Manager for alias operations
pub struct AliasManager {
    config_manager: ConfigManager,
}

impl AliasManager {
    /// Create a new AliasManager with a specific ConfigManager
    pub fn with_config_manager(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    /// Create a new AliasManager using the default config location
    pub fn new() -> Result<Self> {
        let config_manager = ConfigManager::new()?;
        Ok(Self { config_manager })
    }

    /// List all configured aliases
    pub fn list(&self) -> Result<Vec<Alias>> {
        let config = self.config_manager.load()?;
        Ok(config.aliases)
    }

    /// Get an alias by name
    pub fn get(&self, name: &str) -> Result<Alias> {
        let config = self.config_manager.load()?;
        config
            .aliases
            .into_iter()
            .find(|a| a.name == name)
            .ok_or_else(|| Error::AliasNotFound(name.to_string()))
    }

    /// Add or update an alias
    pub fn set(&self, alias: Alias) -> Result<()> {
        alias.validate()?;
        let mut config = self.config_manager.load()?;

        config.aliases.retain(|a| a.name != alias.name);
        config.aliases.push(alias);

        self.config_manager.save(&config)
    }

    /// Add an alias, failing if the name is taken
    pub fn add(&self, alias: Alias) -> Result<()> {
        if self.exists(&alias.name)? {
            return Err(Error::AliasExists(alias.name));
        }
        self.set(alias)
    }

    /// Remove an alias
    pub fn remove(&self, name: &str) -> Result<()> {
        let mut config = self.config_manager.load()?;
        let original_len = config.aliases.len();

        config.aliases.retain(|a| a.name != name);

        if config.aliases.len() == original_len {
            return Err(Error::AliasNotFound(name.to_string()));
        }

        self.config_manager.save(&config)
    }

    /// Check if an alias exists
    pub fn exists(&self, name: &str) -> Result<bool> {
        let config = self.config_manager.load()?;
        Ok(config.aliases.iter().any(|a| a.name == name))
    }
}
