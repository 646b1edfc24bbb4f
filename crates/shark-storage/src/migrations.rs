//! Schema migration via `PRAGMA user_version`, with idempotent
//! `CREATE TABLE IF NOT EXISTS` statements per step.

use rusqlite::Connection;

use crate::error::{Result, StorageError};

/// The newest schema version this build understands. Opening a database
/// with a higher `user_version` is a configuration error.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS epics (
    key TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'backlog',
    priority TEXT,
    business_value TEXT,
    file_path TEXT,
    slug TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
) STRICT;

CREATE TABLE IF NOT EXISTS features (
    key TEXT PRIMARY KEY,
    epic_key TEXT NOT NULL REFERENCES epics(key),
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'backlog',
    priority TEXT,
    file_path TEXT,
    slug TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_features_epic ON features(epic_key);

CREATE TABLE IF NOT EXISTS tasks (
    key TEXT PRIMARY KEY,
    feature_key TEXT NOT NULL REFERENCES features(key),
    title TEXT NOT NULL,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'backlog',
    priority INTEGER NOT NULL DEFAULT 5,
    assigned_agent TEXT NOT NULL DEFAULT '',
    depends_on TEXT NOT NULL DEFAULT '[]',
    estimated_time TEXT,
    file_path TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
) STRICT;

CREATE INDEX IF NOT EXISTS idx_tasks_feature ON tasks(feature_key);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);

CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    file_path TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(title, file_path)
) STRICT;

CREATE TABLE IF NOT EXISTS epic_documents (
    epic_key TEXT NOT NULL REFERENCES epics(key),
    document_id INTEGER NOT NULL REFERENCES documents(id),
    PRIMARY KEY (epic_key, document_id)
) STRICT;

CREATE TABLE IF NOT EXISTS feature_documents (
    feature_key TEXT NOT NULL REFERENCES features(key),
    document_id INTEGER NOT NULL REFERENCES documents(id),
    PRIMARY KEY (feature_key, document_id)
) STRICT;

CREATE TABLE IF NOT EXISTS task_documents (
    task_key TEXT NOT NULL REFERENCES tasks(key),
    document_id INTEGER NOT NULL REFERENCES documents(id),
    PRIMARY KEY (task_key, document_id)
) STRICT;
"#;

/// Apply pragmas and run every migration up to [`CURRENT_SCHEMA_VERSION`].
/// Idempotent: safe to call on every open.
pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )?;

    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if found > CURRENT_SCHEMA_VERSION {
        return Err(StorageError::UnrecognizedSchemaVersion {
            found,
            supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if found < 1 {
        conn.execute_batch(SCHEMA_V1).map_err(|e| StorageError::MigrationFailed {
            version: 1,
            message: e.to_string(),
        })?;
        conn.pragma_update(None, "user_version", 1)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_creates_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();

        for expected in [
            "epics",
            "features",
            "tasks",
            "documents",
            "epic_documents",
            "feature_documents",
            "task_documents",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing table {expected}");
        }
    }

    #[test]
    fn initialize_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        initialize(&conn).unwrap();
        let version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0)).unwrap();
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn rejects_newer_schema_version() {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn.pragma_update(None, "user_version", 999).unwrap();
        let err = initialize(&conn).unwrap_err();
        assert!(matches!(err, StorageError::UnrecognizedSchemaVersion { .. }));
    }
}
