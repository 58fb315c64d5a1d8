//! CLI module for rollbook
//!
//! Provides the command-line interface:
//! - create: new or truncated store file
//! - add / list / search / update / delete: one record operation, JSON out
//! - info: record count and file size
//! - menu: the interactive numbered menu

mod args;
mod commands;
mod config;
mod errors;
mod io;
mod menu;

pub use args::{Cli, Command, FieldArgs, StoreArg};
pub use commands::{add, create, delete, info, list, run, run_command, run_with, search, update};
pub use config::Config;
pub use errors::{CliError, CliResult};
pub use io::{write_error, write_response};
pub use menu::MenuSession;
