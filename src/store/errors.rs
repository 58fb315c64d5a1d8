//! Record store error types
//!
//! Error codes:
//! - ROLLBOOK_STORAGE_UNAVAILABLE (ERROR severity)
//! - ROLLBOOK_TEMP_STORAGE_UNAVAILABLE (ERROR severity)
//! - ROLLBOOK_DUPLICATE_KEY (ERROR severity)
//! - ROLLBOOK_NOT_FOUND (ERROR severity)
//! - ROLLBOOK_UPDATE_FAILED (ERROR severity)
//! - ROLLBOOK_INVALID_RECORD (ERROR severity)
//! - ROLLBOOK_CORRUPT_STORE (FATAL severity)

use std::fmt;
use std::io;

/// Severity levels for store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, the session continues
    Error,
    /// The store file cannot be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Distinguishable failure kinds reported by every store operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// Store file cannot be opened, created, read or written
    StorageUnavailable,
    /// Replacement file for delete cannot be created or written
    TempStorageUnavailable,
    /// Append with an id already present in the store
    DuplicateKey,
    /// No record carries the requested id
    NotFound,
    /// In-place write-back during update did not complete
    UpdateFailed,
    /// Record rejected before touching the file
    InvalidRecord,
    /// File size or field framing does not match the record layout
    CorruptStore,
}

impl StoreErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::StorageUnavailable => "ROLLBOOK_STORAGE_UNAVAILABLE",
            StoreErrorCode::TempStorageUnavailable => "ROLLBOOK_TEMP_STORAGE_UNAVAILABLE",
            StoreErrorCode::DuplicateKey => "ROLLBOOK_DUPLICATE_KEY",
            StoreErrorCode::NotFound => "ROLLBOOK_NOT_FOUND",
            StoreErrorCode::UpdateFailed => "ROLLBOOK_UPDATE_FAILED",
            StoreErrorCode::InvalidRecord => "ROLLBOOK_INVALID_RECORD",
            StoreErrorCode::CorruptStore => "ROLLBOOK_CORRUPT_STORE",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StoreErrorCode::CorruptStore => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Store error with full context
#[derive(Debug)]
pub struct StoreError {
    /// Error code
    code: StoreErrorCode,
    /// Human-readable message
    message: String,
    /// Optional details about the error context
    details: Option<String>,
    /// Underlying IO error if applicable
    source: Option<io::Error>,
}

impl StoreError {
    fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    fn with_source(mut self, source: io::Error) -> Self {
        self.source = Some(source);
        self
    }

    fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Store file cannot be opened, created or written
    pub fn storage_unavailable(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(StoreErrorCode::StorageUnavailable, message).with_source(source)
    }

    /// Replacement file used by delete cannot be created or written
    pub fn temp_storage_unavailable(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(StoreErrorCode::TempStorageUnavailable, message).with_source(source)
    }

    /// An existing record already carries `id`
    pub fn duplicate_key(id: &str) -> Self {
        Self::new(
            StoreErrorCode::DuplicateKey,
            format!("Student ID {} already exists", id),
        )
        .with_details(format!("id: {}", id))
    }

    /// No record carries `id`
    pub fn not_found(id: &str) -> Self {
        Self::new(
            StoreErrorCode::NotFound,
            format!("No student record with ID {} exists", id),
        )
        .with_details(format!("id: {}", id))
    }

    /// Write-back at `offset` failed
    pub fn update_failed(offset: u64, source: io::Error) -> Self {
        Self::new(StoreErrorCode::UpdateFailed, "Error updating student record")
            .with_details(format!("byte_offset: {}", offset))
            .with_source(source)
    }

    /// Record rejected before any I/O
    pub fn invalid_record(reason: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::InvalidRecord, reason)
    }

    /// Store contents do not follow the fixed-width layout
    pub fn corrupt_store(reason: impl Into<String>) -> Self {
        Self::new(StoreErrorCode::CorruptStore, reason)
    }

    /// Corruption located at a byte offset
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self::corrupt_store(reason).with_details(format!("byte_offset: {}", offset))
    }

    /// Returns the error code
    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns whether the store should no longer be trusted
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// Shorthand used by callers that branch on a missing id
    pub fn is_not_found(&self) -> bool {
        self.code == StoreErrorCode::NotFound
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
