//! CLI argument definitions using clap
//!
//! Commands:
//! - rollbook create <NAME>
//! - rollbook add --id <ID> --name <NAME> --email <EMAIL> --course <COURSE> --grade <GRADE>
//! - rollbook list
//! - rollbook search <ID>
//! - rollbook update <ID> --name ... --grade ...
//! - rollbook delete <ID>
//! - rollbook info
//! - rollbook menu

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::store::RecordFields;

/// rollbook - fixed-width student record files
#[derive(Parser, Debug)]
#[command(name = "rollbook")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to an optional JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Store file selection shared by record commands
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArg {
    /// Store file (defaults to `store_path` from the config)
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,
}

/// Values for every mutable record field
#[derive(Args, Debug, Clone)]
pub struct FieldArgs {
    /// Student name
    #[arg(long)]
    pub name: String,

    /// Student email
    #[arg(long)]
    pub email: String,

    /// Course identifier
    #[arg(long)]
    pub course: String,

    /// Grade (GPA)
    #[arg(long, allow_negative_numbers = true)]
    pub grade: f32,
}

impl FieldArgs {
    pub fn to_fields(&self) -> RecordFields {
        RecordFields::new(
            self.name.as_str(),
            self.email.as_str(),
            self.course.as_str(),
            self.grade,
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create (or truncate) a store file, adding the default extension if missing
    Create {
        /// File name, with or without extension
        name: String,
    },

    /// Add a student record
    Add {
        #[command(flatten)]
        store: StoreArg,

        /// Unique student ID
        #[arg(long)]
        id: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Display all records in file order
    List {
        #[command(flatten)]
        store: StoreArg,
    },

    /// Search for a record by ID
    Search {
        #[command(flatten)]
        store: StoreArg,

        /// Student ID
        id: String,
    },

    /// Replace every field but the ID of a record
    Update {
        #[command(flatten)]
        store: StoreArg,

        /// Student ID
        id: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Delete a record by ID
    Delete {
        #[command(flatten)]
        store: StoreArg,

        /// Student ID
        id: String,
    },

    /// Show record count and file size
    Info {
        #[command(flatten)]
        store: StoreArg,
    },

    /// Interactive numbered menu
    Menu,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from([
            "rollbook", "add", "--file", "class.bin", "--id", "S1", "--name", "Alice",
            "--email", "a@x.com", "--course", "CS1", "--grade", "3.5",
        ])
        .unwrap();

        match cli.command {
            Command::Add { store, id, fields } => {
                assert_eq!(store.file, Some(PathBuf::from("class.bin")));
                assert_eq!(id, "S1");
                assert_eq!(fields.grade, 3.5);
                assert_eq!(fields.to_fields().name, "Alice");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["rollbook", "list", "--config", "rb.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("rb.json")));
        assert!(matches!(cli.command, Command::List { .. }));
    }

    #[test]
    fn test_update_requires_all_fields() {
        let result = Cli::try_parse_from(["rollbook", "update", "S1", "--name", "Alicia"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_grade_must_be_numeric() {
        let result = Cli::try_parse_from([
            "rollbook", "add", "--id", "S1", "--name", "A", "--email", "e", "--course", "c",
            "--grade", "high",
        ]);
        assert!(result.is_err());
    }
}
