//! The single connection `shark` holds open for the lifetime of one CLI
//! invocation. The apply phase runs on one logical thread of control, so
//! there is no separate reader pool or batch-writer thread here (see
//! DESIGN.md).

use std::path::{Path, PathBuf};

use rusqlite::{Connection, Transaction};

use crate::error::Result;
use crate::migrations;

pub struct Storage {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Storage {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(path)?;
        migrations::initialize(&conn)?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::initialize(&conn)?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read-only (or implicit-per-call-transaction) access, for the
    /// Validator and for dry-run syncs where no explicit transaction is
    /// open.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Begin the single transaction that spans discovery through the apply
    /// phase. Dropped without `commit()` rolls back.
    pub fn begin(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_in_memory_runs_migrations() {
        let storage = Storage::open_in_memory().unwrap();
        let version: u32 = storage
            .connection()
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, migrations::CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested").join("shark.db");
        let storage = Storage::open(&db_path).unwrap();
        assert!(db_path.exists());
        assert_eq!(storage.path(), Some(db_path.as_path()));
    }
}
