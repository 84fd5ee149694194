//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::config::DuplicatePolicy;
use crate::record::{AllergyRecord, NewAllergy};

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Allergen name (must not already be stored)
    pub name: String,

    /// Danger level within the configured scale
    #[arg(short, long)]
    pub level: i64,

    /// Reactions this allergen causes
    #[arg(short, long)]
    pub symptoms: Option<String>,

    /// Ingredients that contain the allergen
    #[arg(short, long)]
    pub ingredients: Option<String>,

    /// Where the information came from
    #[arg(long)]
    pub source: Option<String>,

    /// Free-form notes
    #[arg(short, long)]
    pub notes: Option<String>,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only show entries at this danger level
    #[arg(short, long)]
    pub level: Option<i64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// Text to look for in allergen names and ingredients
    pub query: String,

    /// Only show entries at this danger level
    #[arg(short, long)]
    pub level: Option<i64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Entry id
    pub id: i64,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Edit command arguments.
///
/// Options left out keep their stored value; an empty string clears an
/// optional field.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Entry id
    pub id: i64,

    /// New allergen name
    #[arg(long)]
    pub name: Option<String>,

    /// New danger level
    #[arg(short, long)]
    pub level: Option<i64>,

    /// New symptoms
    #[arg(short, long)]
    pub symptoms: Option<String>,

    /// New ingredients
    #[arg(short, long)]
    pub ingredients: Option<String>,

    /// New source
    #[arg(long)]
    pub source: Option<String>,

    /// New notes
    #[arg(short, long)]
    pub notes: Option<String>,
}

/// Delete command arguments.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Entry id
    pub id: i64,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// CSV file to read
    pub file: PathBuf,

    /// What to do with allergens that are already stored
    /// (defaults to the configured policy)
    #[arg(long, value_enum)]
    pub on_duplicate: Option<DuplicateArg>,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// File to write
    pub file: PathBuf,

    /// File format
    #[arg(short, long, value_enum, default_value = "csv")]
    pub format: ExportFormat,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Duplicate handling argument for imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DuplicateArg {
    /// Keep the stored entry
    Skip,
    /// Overwrite the stored entry
    Update,
}

impl From<DuplicateArg> for DuplicatePolicy {
    fn from(arg: DuplicateArg) -> Self {
        match arg {
            DuplicateArg::Skip => Self::Skip,
            DuplicateArg::Update => Self::Update,
        }
    }
}

/// Output format for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text, laid out for the configured display
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    /// Comma-separated values
    #[default]
    Csv,
    /// JSON array
    Json,
}

impl AddCommand {
    /// Build the entry to insert.
    #[must_use]
    pub fn to_input(&self) -> NewAllergy {
        NewAllergy {
            allergen_name: self.name.clone(),
            danger_level: self.level,
            symptoms: self.symptoms.clone(),
            ingredients: self.ingredients.clone(),
            source: self.source.clone(),
            notes: self.notes.clone(),
        }
    }
}

impl EditCommand {
    /// Merge the given options over a stored entry.
    #[must_use]
    pub fn apply_to(&self, current: &AllergyRecord) -> NewAllergy {
        let merge = |given: &Option<String>, stored: &Option<String>| {
            given.clone().or_else(|| stored.clone())
        };

        NewAllergy {
            allergen_name: self
                .name
                .clone()
                .unwrap_or_else(|| current.allergen_name.clone()),
            danger_level: self.level.unwrap_or(current.danger_level),
            symptoms: merge(&self.symptoms, &current.symptoms),
            ingredients: merge(&self.ingredients, &current.ingredients),
            source: merge(&self.source, &current.source),
            notes: merge(&self.notes, &current.notes),
        }
    }

    /// Whether any field was given.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.level.is_some()
            || self.symptoms.is_some()
            || self.ingredients.is_some()
            || self.source.is_some()
            || self.notes.is_some()
    }
}
