//! Command-line interface for allergyshield.
//!
//! This module provides the CLI structure and output rendering for the
//! `allergyshield` binary.

mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ConfigCommand, DeleteCommand, DuplicateArg, EditCommand, ExportCommand,
    ExportFormat, ImportCommand, ListCommand, OutputFormat, SearchCommand, ShowCommand,
    StatusCommand,
};

/// allergyshield - Keep track of food allergies
///
/// Stores allergens with a danger level, symptoms and the ingredients to
/// watch for, in a local `SQLite` database.
#[derive(Debug, Parser)]
#[command(name = "allergyshield")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the database file (overrides configuration)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub database: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add an allergy
    Add(AddCommand),

    /// List allergies, most dangerous first
    List(ListCommand),

    /// Search allergen names and ingredients
    Search(SearchCommand),

    /// Show one allergy in full
    Show(ShowCommand),

    /// Change an allergy
    Edit(EditCommand),

    /// Delete an allergy
    Delete(DeleteCommand),

    /// Import allergies from a CSV file
    Import(ImportCommand),

    /// Export all allergies to a file
    Export(ExportCommand),

    /// Add a set of common allergens
    Seed,

    /// Show database status
    Status(StatusCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "allergyshield");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_flags() {
        use crate::logging::Verbosity;

        assert_eq!(parse(&["allergyshield", "seed"]).verbosity(), Verbosity::Normal);
        assert_eq!(
            parse(&["allergyshield", "-v", "seed"]).verbosity(),
            Verbosity::Verbose
        );
        assert_eq!(
            parse(&["allergyshield", "-vv", "seed"]).verbosity(),
            Verbosity::Trace
        );
        assert_eq!(
            parse(&["allergyshield", "-q", "-v", "seed"]).verbosity(),
            Verbosity::Quiet
        );
    }

    #[test]
    fn test_parse_add() {
        let cli = parse(&[
            "allergyshield",
            "add",
            "Peanuts",
            "--level",
            "4",
            "-i",
            "peanut oil",
        ]);
        match cli.command {
            Command::Add(cmd) => {
                assert_eq!(cmd.name, "Peanuts");
                assert_eq!(cmd.level, 4);
                assert_eq!(cmd.ingredients.as_deref(), Some("peanut oil"));
                assert!(cmd.notes.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_add_requires_level() {
        assert!(Cli::try_parse_from(["allergyshield", "add", "Peanuts"]).is_err());
    }

    #[test]
    fn test_parse_list_with_level_and_format() {
        let cli = parse(&["allergyshield", "list", "--level", "3", "--format", "table"]);
        match cli.command {
            Command::List(cmd) => {
                assert_eq!(cmd.level, Some(3));
                assert_eq!(cmd.format, OutputFormat::Table);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_search() {
        let cli = parse(&["allergyshield", "search", "whey"]);
        match cli.command {
            Command::Search(cmd) => {
                assert_eq!(cmd.query, "whey");
                assert_eq!(cmd.level, None);
                assert_eq!(cmd.format, OutputFormat::Plain);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_delete() {
        let cli = parse(&["allergyshield", "delete", "12", "--yes"]);
        assert!(matches!(
            cli.command,
            Command::Delete(DeleteCommand { id: 12, yes: true })
        ));
    }

    #[test]
    fn test_parse_import_duplicate_policy() {
        let cli = parse(&[
            "allergyshield",
            "import",
            "allergies.csv",
            "--on-duplicate",
            "update",
        ]);
        match cli.command {
            Command::Import(cmd) => {
                assert_eq!(cmd.file, PathBuf::from("allergies.csv"));
                assert_eq!(cmd.on_duplicate, Some(DuplicateArg::Update));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_export_json() {
        let cli = parse(&["allergyshield", "export", "out.json", "-f", "json"]);
        match cli.command {
            Command::Export(cmd) => assert_eq!(cmd.format, ExportFormat::Json),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_global_paths() {
        let cli = parse(&[
            "allergyshield",
            "status",
            "-c",
            "/custom/config.toml",
            "-d",
            "/tmp/test.db",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/test.db")));
        assert!(matches!(cli.command, Command::Status(_)));
    }

    #[test]
    fn test_parse_config_validate() {
        let cli = parse(&["allergyshield", "config", "validate", "-f", "x.toml"]);
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }
}
