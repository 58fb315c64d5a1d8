//! Observable events emitted by the record store and its driver.
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Configuration loaded
    ConfigLoaded,
    /// Store created or truncated to zero records
    StoreInitialized,
    /// Record appended at end of file
    RecordAppended,
    /// Append refused because the id is taken
    DuplicateRejected,
    /// Record rewritten in place
    RecordUpdated,
    /// Record removed and file compacted
    RecordDeleted,
    /// Lookup by id found nothing
    RecordNotFound,
    /// Store size or framing is invalid
    StoreCorruption,
    /// Interactive session started
    SessionStart,
    /// Interactive session ended
    SessionEnd,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::StoreInitialized => "STORE_INITIALIZED",
            Event::RecordAppended => "RECORD_APPENDED",
            Event::DuplicateRejected => "DUPLICATE_REJECTED",
            Event::RecordUpdated => "RECORD_UPDATED",
            Event::RecordDeleted => "RECORD_DELETED",
            Event::RecordNotFound => "RECORD_NOT_FOUND",
            Event::StoreCorruption => "STORE_CORRUPTION",
            Event::SessionStart => "SESSION_START",
            Event::SessionEnd => "SESSION_END",
        }
    }

    /// Severity an event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::DuplicateRejected | Event::RecordNotFound => Severity::Warn,
            Event::StoreCorruption => Severity::Fatal,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
