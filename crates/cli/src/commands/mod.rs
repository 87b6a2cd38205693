//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations.
//! Every command that touches a bucket takes a `profile[/path]` location
//! and runs against a [`Session`] built for that profile.

use clap::{Parser, Subcommand};
use serde::Serialize;

use shelf_core::{Config, ConfigManager, Error, Location};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};
use crate::session::Session;

mod link;
mod ls;
mod mkdir;
mod mv;
mod profile;
mod put;
mod rename;
mod rm;
mod share;

/// shelf - folder-shaped media browser for S3-compatible buckets
///
/// Emulates folders over a flat bucket and merges the bucket's files with
/// externally hosted media recorded in a catalog.
#[derive(Parser, Debug)]
#[command(name = "shelf")]
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
    /// Manage bucket profiles
    #[command(subcommand)]
    Profile(profile::ProfileCommands),

    /// List a folder, merging bucket files and catalog media
    Ls(ls::LsArgs),

    /// Create a folder
    Mkdir(mkdir::MkdirArgs),

    /// Upload local files into a folder
    Put(put::PutArgs),

    /// Record externally hosted media in a folder
    Link(link::LinkArgs),

    /// Rename a file, folder or catalog entry
    Rename(rename::RenameArgs),

    /// Move a file, folder or catalog entry into another folder
    Mv(mv::MvArgs),

    /// Remove a file, folder or catalog entry
    Rm(rm::RmArgs),

    /// Issue a time-limited share link for a file
    Share(share::ShareArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let flags = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    let config = match ConfigManager::new().and_then(|manager| manager.load()) {
        Ok(config) => config,
        Err(e) => {
            Formatter::new(flags).error(&format!("Failed to load configuration: {e}"));
            return ExitCode::from(&e);
        }
    };

    let output_config = flags.with_defaults(&config.defaults);
    if output_config.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    } else if config.defaults.color == "always" {
        console::set_colors_enabled(true);
        console::set_colors_enabled_stderr(true);
    }

    match cli.command {
        Commands::Profile(cmd) => profile::execute(cmd, output_config),
        Commands::Ls(args) => ls::execute(args, &config, output_config).await,
        Commands::Mkdir(args) => mkdir::execute(args, &config, output_config).await,
        Commands::Put(args) => put::execute(args, &config, output_config).await,
        Commands::Link(args) => link::execute(args, &config, output_config).await,
        Commands::Rename(args) => rename::execute(args, &config, output_config).await,
        Commands::Mv(args) => mv::execute(args, &config, output_config).await,
        Commands::Rm(args) => rm::execute(args, &config, output_config).await,
        Commands::Share(args) => share::execute(args, &config, output_config).await,
    }
}

/// JSON output for commands that change one entry
#[derive(Debug, Serialize)]
struct OperationOutput {
    success: bool,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
}

impl OperationOutput {
    fn new(path: impl Into<String>, target: Option<String>) -> Self {
        Self {
            success: true,
            path: path.into(),
            target,
        }
    }
}

/// Parse a `profile[/path]` argument
fn parse_location(raw: &str, formatter: &Formatter) -> Result<Location, ExitCode> {
    Location::parse(raw).map_err(|e| report(formatter, "Invalid path", &e))
}

/// Build the session for the location's profile
async fn open_session(
    location: &Location,
    config: &Config,
    formatter: &Formatter,
) -> Result<Session, ExitCode> {
    Session::open(config, &location.profile)
        .await
        .map_err(|e| match e {
            Error::ProfileNotFound(name) => {
                formatter.error(&format!("Profile '{name}' not found"));
                ExitCode::NotFound
            }
            e => report(formatter, "Failed to connect", &e),
        })
}

/// Print an error and pick the matching exit code
fn report(formatter: &Formatter, context: &str, err: &Error) -> ExitCode {
    match err {
        Error::PartiallyCompleted(failure) => formatter.partial(context, failure),
        e => formatter.error(&format!("{context}: {e}")),
    }
    ExitCode::from(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_subcommands() {
        let cli = Cli::command();
        let names: Vec<&str> = cli.get_subcommands().map(|c| c.get_name()).collect();
        assert_eq!(
            names,
            vec!["profile", "ls", "mkdir", "put", "link", "rename", "mv", "rm", "share"]
        );
        assert!(Cli::try_parse_from(["shelf", "completions", "bash"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["shelf", "ls", "media/photos", "--json", "-q"]).unwrap();
        assert!(cli.json);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Ls(_)));
    }

    #[test]
    fn test_parse_location_rejects_bad_profile() {
        let formatter = Formatter::new(OutputConfig {
            quiet: true,
            ..Default::default()
        });
        assert_eq!(
            parse_location("../etc", &formatter).unwrap_err(),
            ExitCode::UsageError
        );
        let location = parse_location("media/a/b", &formatter).unwrap();
        assert_eq!(location.profile, "media");
        assert_eq!(location.path.as_str(), "a/b");
    }

    #[test]
    fn test_report_partial_failure_exit_code() {
        let formatter = Formatter::new(OutputConfig {
            quiet: true,
            ..Default::default()
        });
        let err = Error::PartiallyCompleted(Box::new(shelf_core::PartialFailure {
            operation: "move folder".into(),
            completed: vec!["b/x.png".into()],
            pending: vec!["a/y.png".into()],
            cause: "boom".into(),
        }));
        assert_eq!(report(&formatter, "Move failed", &err), ExitCode::PartiallyCompleted);
    }
}
