//! Domain model for accounts, notes and profile images.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep field validation next to the types it protects.
//!
//! # Invariants
//! - Every stored object is identified by a stable UUID.
//! - Timestamps are integer milliseconds since the Unix epoch.

pub mod account;
pub mod image;
pub mod note;

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns wall-clock time in Unix epoch milliseconds.
///
/// Clocks set before 1970 collapse to `0` instead of panicking.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
