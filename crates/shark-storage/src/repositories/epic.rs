//! Epic repository: transactional CRUD over the `epics` table, using a
//! free-function-over-`&Connection` idiom.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use shark_core::entities::Epic;
use shark_core::keys::EpicKey;

use crate::error::Result;

pub fn exists(conn: &Connection, key: &EpicKey) -> Result<bool> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM epics WHERE key = ?1",
            params![key.as_str()],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

pub fn get_by_key(conn: &Connection, key: &EpicKey) -> Result<Option<Epic>> {
    conn.query_row(
        "SELECT key, title, description, status, priority, business_value,
                file_path, slug, created_at, updated_at
         FROM epics WHERE key = ?1",
        params![key.as_str()],
        row_to_epic,
    )
    .optional()
    .map_err(Into::into)
}

pub fn list(conn: &Connection) -> Result<Vec<Epic>> {
    let mut stmt = conn.prepare(
        "SELECT key, title, description, status, priority, business_value,
                file_path, slug, created_at, updated_at
         FROM epics ORDER BY key",
    )?;
    let rows = stmt.query_map([], row_to_epic)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
}

pub fn create(conn: &Connection, epic: &Epic) -> Result<()> {
    conn.execute(
        "INSERT INTO epics
            (key, title, description, status, priority, business_value,
             file_path, slug, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            epic.key.as_str(),
            epic.title,
            epic.description,
            epic.status,
            epic.priority,
            epic.business_value,
            epic.file_path.as_ref().map(|p| p.display().to_string()),
            epic.slug,
            epic.created_at.to_rfc3339(),
            epic.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Update the tracked fields plus `file_path`; `created_at` is preserved,
/// `updated_at` is stamped with the current time.
pub fn update(conn: &Connection, epic: &Epic) -> Result<()> {
    conn.execute(
        "UPDATE epics SET title = ?2, description = ?3, status = ?4, priority = ?5,
                business_value = ?6, file_path = ?7, slug = ?8, updated_at = ?9
         WHERE key = ?1",
        params![
            epic.key.as_str(),
            epic.title,
            epic.description,
            epic.status,
            epic.priority,
            epic.business_value,
            epic.file_path.as_ref().map(|p| p.display().to_string()),
            epic.slug,
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn row_to_epic(row: &rusqlite::Row) -> rusqlite::Result<Epic> {
    let file_path: Option<String> = row.get(6)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;
    Ok(Epic {
        key: EpicKey::parse(&row.get::<_, String>(0)?)
            .expect("key stored in the database is always valid"),
        title: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        priority: row.get(4)?,
        business_value: row.get(5)?,
        file_path: file_path.map(std::path::PathBuf::from),
        slug: row.get(7)?,
        created_at: crate::parse_timestamp(&created_at),
        updated_at: crate::parse_timestamp(&updated_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Storage;
    use shark_core::slug::slugify;

    fn sample(key: &str, title: &str) -> Epic {
        let now = Utc::now();
        Epic {
            key: EpicKey::parse(key).unwrap(),
            title: title.to_string(),
            description: None,
            status: "backlog".to_string(),
            priority: None,
            business_value: None,
            file_path: None,
            slug: slugify(title),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn create_then_get_round_trips() {
        let storage = Storage::open_in_memory().unwrap();
        let conn = storage.connection();
        let epic = sample("E01", "Authentication");
        create(conn, &epic).unwrap();
        let fetched = get_by_key(conn, &epic.key).unwrap().unwrap();
        assert_eq!(fetched.title, "Authentication");
        assert!(exists(conn, &epic.key).unwrap());
        assert!(!exists(conn, &EpicKey::parse("E02").unwrap()).unwrap());
    }

    #[test]
    fn update_changes_tracked_fields_and_preserves_created_at() {
        let storage = Storage::open_in_memory().unwrap();
        let conn = storage.connection();
        let mut epic = sample("E01", "Authentication");
        create(conn, &epic).unwrap();
        epic.title = "Auth & SSO".to_string();
        update(conn, &epic).unwrap();
        let fetched = get_by_key(conn, &epic.key).unwrap().unwrap();
        assert_eq!(fetched.title, "Auth & SSO");
        assert_eq!(fetched.created_at.timestamp(), epic.created_at.timestamp());
    }

    #[test]
    fn list_is_key_sorted() {
        let storage = Storage::open_in_memory().unwrap();
        let conn = storage.connection();
        create(conn, &sample("E02", "Second")).unwrap();
        create(conn, &sample("E01", "First")).unwrap();
        let all = list(conn).unwrap();
        let keys: Vec<_> = all.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["E01", "E02"]);
    }
}
