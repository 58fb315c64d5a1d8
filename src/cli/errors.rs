//! CLI-specific error types

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::store::StoreError;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    /// Record store operation failed
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Configuration file missing, unreadable or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// `create` was given a blank file name
    #[error("File name must not be empty")]
    EmptyFileName,

    /// No store path given and none configured
    #[error("No store file given. Pass --file or set store_path in the config.")]
    NoStorePath,

    /// Store path does not name an existing file
    #[error("No binary file found at {}. Create one first.", .0.display())]
    NoStore(PathBuf),

    /// I/O error on stdin/stdout
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Store(e) => e.code().code(),
            Self::Config(_) => "ROLLBOOK_CLI_CONFIG_ERROR",
            Self::EmptyFileName => "ROLLBOOK_CLI_EMPTY_FILE_NAME",
            Self::NoStorePath => "ROLLBOOK_CLI_NO_STORE_PATH",
            Self::NoStore(_) => "ROLLBOOK_CLI_NO_STORE",
            Self::Io(_) => "ROLLBOOK_CLI_IO_ERROR",
            Self::Json(_) => "ROLLBOOK_CLI_JSON_ERROR",
        }
    }

    /// Message without the code prefix
    pub fn message(&self) -> String {
        match self {
            Self::Store(e) => e.message().to_string(),
            other => other.to_string(),
        }
    }

    /// Extra context, such as the byte offset of corruption
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Store(e) => e.details(),
            _ => None,
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
