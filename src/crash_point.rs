//! Crash point injection for durability testing
//!
//! When `ROLLBOOK_CRASH_POINT` names a point that the running code reaches,
//! the process terminates immediately via `std::process::abort()`: no
//! cleanup, no unwinding, no temp-file removal.
//!
//! ```bash
//! ROLLBOOK_CRASH_POINT=delete_before_rename rollbook delete S2 --file class.bin
//! ```
//!
//! After such a crash the original store must still be intact.

use std::sync::OnceLock;

/// Environment variable naming the active crash point
pub const CRASH_POINT_ENV: &str = "ROLLBOOK_CRASH_POINT";

static CRASH_POINT: OnceLock<Option<String>> = OnceLock::new();

#[inline]
fn get_crash_point() -> Option<&'static str> {
    CRASH_POINT
        .get_or_init(|| std::env::var(CRASH_POINT_ENV).ok())
        .as_deref()
}

/// Returns true if `ROLLBOOK_CRASH_POINT` equals `name`
#[inline]
pub fn crash_point_enabled(name: &str) -> bool {
    get_crash_point().map(|p| p == name).unwrap_or(false)
}

/// Abort the process if the named crash point is enabled.
///
/// No-op when the variable is unset or names another point.
#[inline]
pub fn maybe_crash(name: &str) {
    if crash_point_enabled(name) {
        eprintln!("[CRASH] Triggering crash at point: {}", name);
        std::process::abort();
    }
}

/// All defined crash point names
pub mod points {
    pub const INITIALIZE_BEFORE_RENAME: &str = "initialize_before_rename";
    pub const APPEND_BEFORE_WRITE: &str = "append_before_write";
    pub const UPDATE_BEFORE_WRITE: &str = "update_before_write";
    pub const DELETE_BEFORE_RENAME: &str = "delete_before_rename";

    /// Get all crash point names
    pub fn all() -> &'static [&'static str] {
        &[
            INITIALIZE_BEFORE_RENAME,
            APPEND_BEFORE_WRITE,
            UPDATE_BEFORE_WRITE,
            DELETE_BEFORE_RENAME,
        ]
    }
}
