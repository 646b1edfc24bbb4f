//! Document repository: the `documents` table plus its three link tables.
//! Linking is idempotent (`INSERT OR IGNORE`) and unlinking is idempotent
//! too — unlinking something that was never linked is success, not an
//! error, matching the `unlink` semantics decided in DESIGN.md.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use shark_core::entities::Document;
use shark_core::keys::{EpicKey, FeatureKey, TaskKey};

use crate::error::Result;

pub fn get_or_create(conn: &Connection, title: &str, file_path: &std::path::Path) -> Result<Document> {
    let path_str = file_path.display().to_string();
    if let Some(doc) = get_by_title_and_path(conn, title, &path_str)? {
        return Ok(doc);
    }
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO documents (title, file_path, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?3)
         ON CONFLICT(title, file_path) DO NOTHING",
        params![title, path_str, now],
    )?;
    get_by_title_and_path(conn, title, &path_str)?
        .ok_or_else(|| crate::error::StorageError::NotFound {
            entity_kind: "document",
            key: format!("{title} @ {path_str}"),
        })
}

fn get_by_title_and_path(conn: &Connection, title: &str, path_str: &str) -> Result<Option<Document>> {
    conn.query_row(
        "SELECT id, title, file_path, created_at, updated_at
         FROM documents WHERE title = ?1 AND file_path = ?2",
        params![title, path_str],
        row_to_document,
    )
    .optional()
    .map_err(Into::into)
}

macro_rules! link_table {
    ($link_fn:ident, $unlink_fn:ident, $list_fn:ident, $table:literal, $key_col:literal, $key_ty:ty) => {
        pub fn $link_fn(conn: &Connection, key: &$key_ty, document_id: i64) -> Result<()> {
            conn.execute(
                concat!(
                    "INSERT OR IGNORE INTO ",
                    $table,
                    " (",
                    $key_col,
                    ", document_id) VALUES (?1, ?2)"
                ),
                params![key.as_str(), document_id],
            )?;
            Ok(())
        }

        pub fn $unlink_fn(conn: &Connection, key: &$key_ty, document_id: i64) -> Result<()> {
            conn.execute(
                concat!("DELETE FROM ", $table, " WHERE ", $key_col, " = ?1 AND document_id = ?2"),
                params![key.as_str(), document_id],
            )?;
            Ok(())
        }

        pub fn $list_fn(conn: &Connection, key: &$key_ty) -> Result<Vec<Document>> {
            let mut stmt = conn.prepare(concat!(
                "SELECT d.id, d.title, d.file_path, d.created_at, d.updated_at FROM documents d
                 JOIN ",
                $table,
                " l ON l.document_id = d.id WHERE l.",
                $key_col,
                " = ?1 ORDER BY d.id"
            ))?;
            let rows = stmt.query_map(params![key.as_str()], row_to_document)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
        }
    };
}

link_table!(link_to_epic, unlink_from_epic, list_for_epic, "epic_documents", "epic_key", EpicKey);
link_table!(
    link_to_feature,
    unlink_from_feature,
    list_for_feature,
    "feature_documents",
    "feature_key",
    FeatureKey
);
link_table!(link_to_task, unlink_from_task, list_for_task, "task_documents", "task_key", TaskKey);

/// All `(parent_key, document_id)` pairs across a link table, for the
/// Validator's broken-document-link sweep.
pub fn all_epic_links(conn: &Connection) -> Result<Vec<(String, i64)>> {
    all_links(conn, "epic_documents", "epic_key")
}

pub fn all_feature_links(conn: &Connection) -> Result<Vec<(String, i64)>> {
    all_links(conn, "feature_documents", "feature_key")
}

pub fn all_task_links(conn: &Connection) -> Result<Vec<(String, i64)>> {
    all_links(conn, "task_documents", "task_key")
}

fn all_links(conn: &Connection, table: &str, key_col: &str) -> Result<Vec<(String, i64)>> {
    let sql = format!("SELECT {key_col}, document_id FROM {table} ORDER BY {key_col}");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
}

fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<Document> {
    let created_at: String = row.get(3)?;
    let updated_at: String = row.get(4)?;
    Ok(Document {
        id: row.get(0)?,
        title: row.get(1)?,
        file_path: std::path::PathBuf::from(row.get::<_, String>(2)?),
        created_at: crate::parse_timestamp(&created_at),
        updated_at: crate::parse_timestamp(&updated_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Storage;
    use crate::repositories::epic;
    use shark_core::slug::slugify;

    fn seed_epic(conn: &Connection) -> EpicKey {
        let now = Utc::now();
        let key = EpicKey::parse("E01").unwrap();
        epic::create(
            conn,
            &shark_core::entities::Epic {
                key: key.clone(),
                title: "Epic".to_string(),
                description: None,
                status: "backlog".to_string(),
                priority: None,
                business_value: None,
                file_path: None,
                slug: slugify("Epic"),
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();
        key
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let storage = Storage::open_in_memory().unwrap();
        let conn = storage.connection();
        let path = std::path::Path::new("docs/plan/adr-001.md");
        let a = get_or_create(conn, "ADR 001", path).unwrap();
        let b = get_or_create(conn, "ADR 001", path).unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn link_unlink_round_trip() {
        let storage = Storage::open_in_memory().unwrap();
        let conn = storage.connection();
        let epic_key = seed_epic(conn);
        let doc = get_or_create(conn, "ADR 001", std::path::Path::new("docs/adr-001.md")).unwrap();

        link_to_epic(conn, &epic_key, doc.id).unwrap();
        link_to_epic(conn, &epic_key, doc.id).unwrap();
        assert_eq!(list_for_epic(conn, &epic_key).unwrap().len(), 1);

        unlink_from_epic(conn, &epic_key, doc.id).unwrap();
        assert!(list_for_epic(conn, &epic_key).unwrap().is_empty());
        // Unlinking again is still success.
        unlink_from_epic(conn, &epic_key, doc.id).unwrap();
    }
}
