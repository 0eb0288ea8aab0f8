//! Alias management commands
//!
//! Aliases are named references to dashboard API endpoints,
//! including connection details and credentials.

use clap::Subcommand;
use serde::Serialize;

use bx_core::{Alias, AliasAuth, AliasManager, TimeoutConfig};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

use super::fail;

/// Alias subcommands for managing dashboard connections
#[derive(Subcommand, Debug)]
pub enum AliasCommands {
    /// Add or update an alias
    Set(SetArgs),

    /// List all configured aliases
    List(ListArgs),

    /// Remove an alias
    Remove(RemoveArgs),
}

/// Arguments for the `alias set` command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Alias name (e.g., "local", "r2")
    pub name: String,

    /// Dashboard URL (e.g., "http://localhost:8787")
    pub endpoint: String,

    /// Bearer token sent with every request
    #[arg(long, env = "BX_TOKEN", conflicts_with = "username")]
    pub token: Option<String>,

    /// Username for basic authentication
    #[arg(long, requires = "password")]
    pub username: Option<String>,

    /// Password for basic authentication
    #[arg(long, env = "BX_PASSWORD", requires = "username")]
    pub password: Option<String>,

    /// Allow insecure TLS connections
    #[arg(long, default_value = "false")]
    pub insecure: bool,

    /// Connection timeout in milliseconds
    #[arg(long)]
    pub connect_timeout_ms: Option<u64>,

    /// Read timeout in milliseconds
    #[arg(long)]
    pub read_timeout_ms: Option<u64>,
}

/// Arguments for the `alias list` command
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show full details including authentication type
    #[arg(short, long)]
    pub long: bool,
}

/// Arguments for the `alias remove` command
#[derive(clap::Args, Debug)]
pub struct RemoveArgs {
    /// Name of the alias to remove
    pub name: String,
}

/// JSON output for alias list
#[derive(Serialize)]
struct AliasListOutput {
    aliases: Vec<AliasInfo>,
}

/// Alias information for JSON output (without sensitive data)
#[derive(Serialize)]
struct AliasInfo {
    name: String,
    endpoint: String,
    auth: &'static str,
    insecure: bool,
}

impl From<&Alias> for AliasInfo {
    fn from(alias: &Alias) -> Self {
        Self {
            name: alias.name.clone(),
            endpoint: alias.endpoint.clone(),
            auth: match alias.auth {
                Some(AliasAuth::Bearer { .. }) => "bearer",
                Some(AliasAuth::Basic { .. }) => "basic",
                None => "none",
            },
            insecure: alias.insecure,
        }
    }
}

/// JSON output for alias set/remove operations
#[derive(Serialize)]
struct AliasOperationOutput {
    success: bool,
    alias: String,
    message: String,
}

/// Execute an alias subcommand
pub async fn execute(cmd: AliasCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let alias_manager = match AliasManager::new() {
        Ok(am) => am,
        Err(e) => return fail(&formatter, "Failed to load aliases", &e),
    };

    match cmd {
        AliasCommands::Set(args) => execute_set(args, &alias_manager, &formatter),
        AliasCommands::List(args) => execute_list(args, &alias_manager, &formatter),
        AliasCommands::Remove(args) => execute_remove(args, &alias_manager, &formatter),
    }
}

fn build_alias(args: SetArgs) -> Alias {
    let mut alias = Alias::new(args.name, args.endpoint);
    alias.insecure = args.insecure;

    if let Some(token) = args.token {
        alias = alias.with_token(token);
    } else if let (Some(username), Some(password)) = (args.username, args.password) {
        alias = alias.with_basic_auth(username, password);
    }

    if args.connect_timeout_ms.is_some() || args.read_timeout_ms.is_some() {
        let defaults = TimeoutConfig::default();
        alias.timeout = Some(TimeoutConfig {
            connect_ms: args.connect_timeout_ms.unwrap_or(defaults.connect_ms),
            read_ms: args.read_timeout_ms.unwrap_or(defaults.read_ms),
        });
    }
    alias
}

fn execute_set(args: SetArgs, manager: &AliasManager, formatter: &Formatter) -> ExitCode {
    let alias = build_alias(args);
    let name = alias.name.clone();
    if alias.insecure {
        formatter.warning(&format!("TLS certificate checks are disabled for '{name}'"));
    }

    match manager.set(alias) {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&AliasOperationOutput {
                    success: true,
                    alias: name.clone(),
                    message: format!("Alias '{name}' configured successfully"),
                });
            } else {
                formatter.success(&format!("Alias '{name}' configured successfully."));
            }
            ExitCode::Success
        }
        Err(e) => fail(formatter, "Failed to save alias", &e),
    }
}

fn execute_list(args: ListArgs, manager: &AliasManager, formatter: &Formatter) -> ExitCode {
    match manager.list() {
        Ok(aliases) => {
            if formatter.is_json() {
                formatter.json(&AliasListOutput {
                    aliases: aliases.iter().map(AliasInfo::from).collect(),
                });
            } else if aliases.is_empty() {
                formatter.println("No aliases configured.");
            } else {
                for alias in aliases.iter().map(AliasInfo::from) {
                    if args.long {
                        let tls = if alias.insecure { ", insecure" } else { "" };
                        formatter.println(&format!(
                            "{:<12} {} (auth: {}{tls})",
                            alias.name, alias.endpoint, alias.auth
                        ));
                    } else {
                        formatter.println(&format!("{:<12} {}", alias.name, alias.endpoint));
                    }
                }
            }
            ExitCode::Success
        }
        Err(e) => fail(formatter, "Failed to list aliases", &e),
    }
}

fn execute_remove(args: RemoveArgs, manager: &AliasManager, formatter: &Formatter) -> ExitCode {
    match manager.remove(&args.name) {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&AliasOperationOutput {
                    success: true,
                    alias: args.name.clone(),
                    message: format!("Alias '{}' removed successfully", args.name),
                });
            } else {
                formatter.success(&format!("Alias '{}' removed successfully.", args.name));
            }
            ExitCode::Success
        }
        Err(e) => fail(formatter, "Failed to remove alias", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_args(name: &str) -> SetArgs {
        SetArgs {
            name: name.to_string(),
            endpoint: "http://localhost:8787".to_string(),
            token: None,
            username: None,
            password: None,
            insecure: false,
            connect_timeout_ms: None,
            read_timeout_ms: None,
        }
    }

    #[test]
    fn test_build_alias_without_auth() {
        let alias = build_alias(set_args("local"));
        assert_eq!(alias.name, "local");
        assert!(alias.auth.is_none());
        assert!(alias.timeout.is_none());
    }

    #[test]
    fn test_build_alias_with_basic_auth_and_timeout() {
        let mut args = set_args("r2");
        args.username = Some("ana".into());
        args.password = Some("pw".into());
        args.read_timeout_ms = Some(1000);

        let alias = build_alias(args);
        assert!(matches!(alias.auth, Some(AliasAuth::Basic { .. })));
        let timeout = alias.timeout.unwrap();
        assert_eq!(timeout.read_ms, 1000);
        assert_eq!(timeout.connect_ms, TimeoutConfig::default().connect_ms);
    }

    #[test]
    fn test_alias_info_hides_credentials() {
        let alias = Alias::new("r2", "https://dash.example.com").with_token("s3cr3t");
        let info = AliasInfo::from(&alias);
        assert_eq!(info.auth, "bearer");

        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("s3cr3t"));
    }
}
