//! Student record store
//!
//! Persists fixed-width student records in a flat binary file and supports
//! initialize, append, list, find, update and delete by id.
//!
//! # Design Principles
//!
//! - One file, records back to back, no header or index
//! - Every operation re-reads the file; no in-memory state between calls
//! - Ids are unique, enforced by a full scan at append time
//! - Update rewrites one record at its original offset
//! - Delete builds a replacement file and renames it over the store
//!
//! # Invariants Enforced
//!
//! - File size is always a multiple of `RECORD_WIDTH`
//! - A failed update or delete leaves the store unchanged

mod errors;
mod reader;
mod record;
mod record_store;
mod replace;

pub use errors::{Severity, StoreError, StoreErrorCode, StoreResult};
pub use reader::RecordReader;
pub use record::{
    FieldText, RecordFields, StudentRecord, FIELD_CAPACITY, FIELD_WIDTH, GRADE_OFFSET,
    RECORD_WIDTH,
};
pub use record_store::{RecordStore, StoreOptions, StoreStats};
