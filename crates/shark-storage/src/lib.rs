//! # shark-storage
//!
//! SQLite persistence layer for `shark`: connection management, schema
//! migrations, and the transactional repository functions the sync engine
//! and validator call against a single open connection.

pub mod connection;
pub mod error;
pub mod migrations;
pub mod repositories;

pub use connection::Storage;
pub use error::{Result, StorageError};

use chrono::{DateTime, Utc};

/// Parse an RFC 3339 timestamp written by this crate. Panics on malformed
/// input — every timestamp stored here was produced by `to_rfc3339()`, so a
/// parse failure means on-disk corruption rather than a recoverable error.
pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .unwrap_or_else(|e| panic!("malformed timestamp '{raw}' in database: {e}"))
        .with_timezone(&Utc)
}
