//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations.
//! Every remote command resolves its alias through [`connect`] and maps
//! core errors to exit codes through [`fail`].

use std::sync::Arc;

use clap::{Parser, Subcommand};

use bx_core::{Config, ConfigManager, Error, RemotePath, SelectionContext};
use bx_http::HttpClient;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod alias;
mod cat;
mod cp;
mod ls;
mod meta;
mod mkdir;
mod mv;
mod rm;

/// bx - bucket explorer client
///
/// Browse and manage buckets exposed through a dashboard storage API.
#[derive(Parser, Debug)]
#[command(name = "bx")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage dashboard aliases
    #[command(subcommand)]
    Alias(alias::AliasCommands),

    /// List files and folders
    Ls(ls::LsArgs),

    /// Create a folder
    Mkdir(mkdir::MkdirArgs),

    /// Remove an object
    Rm(rm::RmArgs),

    /// Rename an object within its folder
    Mv(mv::MvArgs),

    /// Replace the custom metadata of an object
    Meta(meta::MetaArgs),

    /// Upload or download a file
    Cp(cp::CpArgs),

    /// Display object contents
    Cat(cat::CatArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Alias(cmd) => alias::execute(cmd, output_config).await,
        Commands::Ls(args) => ls::execute(args, output_config).await,
        Commands::Mkdir(args) => mkdir::execute(args, output_config).await,
        Commands::Rm(args) => rm::execute(args, output_config).await,
        Commands::Mv(args) => mv::execute(args, output_config).await,
        Commands::Meta(args) => meta::execute(args, output_config).await,
        Commands::Cp(args) => cp::execute(args, output_config).await,
        Commands::Cat(args) => cat::execute(args, output_config).await,
    }
}

/// A resolved alias ready to talk to its dashboard
pub(crate) struct Session {
    pub api: Arc<HttpClient>,
    pub config: Config,
    pub formatter: Formatter,
}

impl Session {
    /// Selection context for the folder of `path`
    pub fn context(&self, path: &RemotePath) -> SelectionContext {
        self.config
            .defaults
            .apply(SelectionContext::new(&path.bucket).with_folder(path.folder()))
    }
}

/// Load the configuration and build a client for the alias of `path`
///
/// Settings the flags leave open are taken from the configuration file.
pub(crate) fn connect(path: &RemotePath, output_config: OutputConfig) -> Result<Session, ExitCode> {
    let formatter = Formatter::new(output_config.clone());

    let config = match ConfigManager::new().and_then(|manager| manager.load()) {
        Ok(config) => config,
        Err(e) => return Err(fail(&formatter, "Failed to load configuration", &e)),
    };
    let formatter = Formatter::new(output_config.with_defaults(&config.defaults));

    let Some(alias) = config.aliases.iter().find(|a| a.name == path.alias) else {
        formatter.error(&format!("Alias '{}' not found", path.alias));
        return Err(ExitCode::NotFound);
    };

    let api = match HttpClient::new(alias) {
        Ok(client) => Arc::new(client),
        Err(e) => return Err(fail(&formatter, "Failed to create client", &e)),
    };

    Ok(Session {
        api,
        config,
        formatter,
    })
}

/// Parse a remote path argument, reporting usage errors
pub(crate) fn remote_arg(formatter: &Formatter, path: &str) -> Result<RemotePath, ExitCode> {
    bx_core::parse_remote(path).map_err(|e| {
        formatter.error(&e.to_string());
        ExitCode::UsageError
    })
}

/// Report an error and pick the matching exit code
pub(crate) fn fail(formatter: &Formatter, context: &str, error: &Error) -> ExitCode {
    formatter.error(&format!("{context}: {error}"));
    ExitCode::from(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["bx", "ls", "r2/photos", "--json", "-q"]).unwrap();
        assert!(cli.json);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Ls(_)));
    }

    #[test]
    fn test_remote_arg_rejects_local_paths() {
        let formatter = Formatter::new(OutputConfig {
            quiet: true,
            ..Default::default()
        });
        assert_eq!(
            remote_arg(&formatter, "./notes.txt").unwrap_err(),
            ExitCode::UsageError
        );
        let path = remote_arg(&formatter, "r2/photos/docs/a.txt").unwrap();
        assert_eq!(path.folder(), "docs/");
        assert_eq!(path.name(), "a.txt");
    }
}
