//! Storage-layer errors: one `thiserror` enum for the whole crate,
//! SQLite-specific variants distinguished from generic ones.

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed at version {version}: {message}")]
    MigrationFailed { version: u32, message: String },

    #[error("database schema version {found} is newer than the {supported} this build understands")]
    UnrecognizedSchemaVersion { found: u32, supported: u32 },

    #[error("parent {parent_kind} '{parent_key}' does not exist for {child_kind} '{child_key}'")]
    MissingParent {
        parent_kind: &'static str,
        parent_key: String,
        child_kind: &'static str,
        child_key: String,
    },

    #[error("{entity_kind} '{key}' not found")]
    NotFound { entity_kind: &'static str, key: String },

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;
