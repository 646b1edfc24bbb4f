//! Feature repository: CRUD over the `features` table, plus the explicit
//! parent-existence check that turns a raw foreign-key violation into a
//! structured [`StorageError::MissingParent`] the sync engine can report as
//! a `missing_parent` event.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use shark_core::entities::Feature;
use shark_core::keys::FeatureKey;

use crate::error::{Result, StorageError};
use crate::repositories::epic;

pub fn exists(conn: &Connection, key: &FeatureKey) -> Result<bool> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM features WHERE key = ?1",
            params![key.as_str()],
            |_| Ok(()),
        )
        .optional()?
        .is_some())
}

pub fn get_by_key(conn: &Connection, key: &FeatureKey) -> Result<Option<Feature>> {
    conn.query_row(
        "SELECT key, epic_key, title, description, status, priority,
                file_path, slug, created_at, updated_at
         FROM features WHERE key = ?1",
        params![key.as_str()],
        row_to_feature,
    )
    .optional()
    .map_err(Into::into)
}

pub fn list(conn: &Connection) -> Result<Vec<Feature>> {
    let mut stmt = conn.prepare(
        "SELECT key, epic_key, title, description, status, priority,
                file_path, slug, created_at, updated_at
         FROM features ORDER BY key",
    )?;
    let rows = stmt.query_map([], row_to_feature)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
}

pub fn list_for_epic(conn: &Connection, epic_key: &shark_core::keys::EpicKey) -> Result<Vec<Feature>> {
    let mut stmt = conn.prepare(
        "SELECT key, epic_key, title, description, status, priority,
                file_path, slug, created_at, updated_at
         FROM features WHERE epic_key = ?1 ORDER BY key",
    )?;
    let rows = stmt.query_map(params![epic_key.as_str()], row_to_feature)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
}

pub fn create(conn: &Connection, feature: &Feature) -> Result<()> {
    if !epic::exists(conn, &feature.epic_key)? {
        return Err(StorageError::MissingParent {
            parent_kind: "epic",
            parent_key: feature.epic_key.as_str().to_string(),
            child_kind: "feature",
            child_key: feature.key.as_str().to_string(),
        });
    }
    conn.execute(
        "INSERT INTO features
            (key, epic_key, title, description, status, priority,
             file_path, slug, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            feature.key.as_str(),
            feature.epic_key.as_str(),
            feature.title,
            feature.description,
            feature.status,
            feature.priority,
            feature.file_path.as_ref().map(|p| p.display().to_string()),
            feature.slug,
            feature.created_at.to_rfc3339(),
            feature.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn update(conn: &Connection, feature: &Feature) -> Result<()> {
    conn.execute(
        "UPDATE features SET title = ?2, description = ?3, status = ?4, priority = ?5,
                file_path = ?6, slug = ?7, updated_at = ?8
         WHERE key = ?1",
        params![
            feature.key.as_str(),
            feature.title,
            feature.description,
            feature.status,
            feature.priority,
            feature.file_path.as_ref().map(|p| p.display().to_string()),
            feature.slug,
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn row_to_feature(row: &rusqlite::Row) -> rusqlite::Result<Feature> {
    let file_path: Option<String> = row.get(6)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;
    Ok(Feature {
        key: FeatureKey::parse(&row.get::<_, String>(0)?)
            .expect("key stored in the database is always valid"),
        epic_key: shark_core::keys::EpicKey::parse(&row.get::<_, String>(1)?)
            .expect("key stored in the database is always valid"),
        title: row.get(2)?,
        description: row.get(3)?,
        status: row.get(4)?,
        priority: row.get(5)?,
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
    use shark_core::keys::EpicKey;
    use shark_core::slug::slugify;

    fn sample_epic(key: &str) -> shark_core::entities::Epic {
        let now = Utc::now();
        shark_core::entities::Epic {
            key: EpicKey::parse(key).unwrap(),
            title: "Epic".to_string(),
            description: None,
            status: "backlog".to_string(),
            priority: None,
            business_value: None,
            file_path: None,
            slug: slugify("Epic"),
            created_at: now,
            updated_at: now,
        }
    }

    fn sample_feature(key: &str, epic_key: &str, title: &str) -> Feature {
        let now = Utc::now();
        Feature {
            key: FeatureKey::parse(key).unwrap(),
            epic_key: EpicKey::parse(epic_key).unwrap(),
            title: title.to_string(),
            description: None,
            status: "backlog".to_string(),
            priority: None,
            file_path: None,
            slug: slugify(title),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn create_without_epic_fails_with_missing_parent() {
        let storage = Storage::open_in_memory().unwrap();
        let conn = storage.connection();
        let feature = sample_feature("E01-F01", "E01", "Login");
        let err = create(conn, &feature).unwrap_err();
        assert!(matches!(err, StorageError::MissingParent { .. }));
    }

    #[test]
    fn create_with_epic_succeeds() {
        let storage = Storage::open_in_memory().unwrap();
        let conn = storage.connection();
        epic::create(conn, &sample_epic("E01")).unwrap();
        let feature = sample_feature("E01-F01", "E01", "Login");
        create(conn, &feature).unwrap();
        assert!(exists(conn, &feature.key).unwrap());
        assert_eq!(list_for_epic(conn, &feature.epic_key).unwrap().len(), 1);
    }
}
