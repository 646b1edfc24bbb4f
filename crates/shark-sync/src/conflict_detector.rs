//! ConflictDetector: compares [`ParsedRecord`]s against a database snapshot
//! and classifies each as noop / insert / update / conflict.

use rusqlite::Connection;
use shark_core::entities::{EntityKind, TrackedField};
use shark_storage::repositories::{epic, feature, task};

use crate::types::{ChangeAction, ParsedRecord, PendingChange};

pub fn detect(conn: &Connection, record: ParsedRecord) -> shark_storage::Result<PendingChange> {
    let action = match record.entity_kind {
        EntityKind::Epic => detect_epic(conn, &record)?,
        EntityKind::Feature => detect_feature(conn, &record)?,
        EntityKind::Task => detect_task(conn, &record)?,
    };
    Ok(PendingChange { entity_kind: record.entity_kind, key: record.key.clone(), action, record })
}

fn detect_epic(conn: &Connection, record: &ParsedRecord) -> shark_storage::Result<ChangeAction> {
    let key = shark_core::keys::EpicKey::parse(&record.key).expect("classified by PatternMatcher");
    match epic::get_by_key(conn, &key)? {
        None => Ok(ChangeAction::Insert),
        Some(existing) => {
            let mut changed = Vec::new();
            if existing.title != record.title {
                changed.push(TrackedField::Title);
            }
            if existing.description != record.description {
                changed.push(TrackedField::Description);
            }
            if let Some(status) = &record.status {
                if &existing.status != status {
                    changed.push(TrackedField::Status);
                }
            }
            if existing.priority != record.priority {
                changed.push(TrackedField::Priority);
            }
            if existing.file_path.as_deref() != Some(record.source_path.as_path()) {
                changed.push(TrackedField::FilePath);
            }
            Ok(classify_existing(changed, &existing.updated_at, record.source_mtime))
        }
    }
}

fn detect_feature(conn: &Connection, record: &ParsedRecord) -> shark_storage::Result<ChangeAction> {
    let key = shark_core::keys::FeatureKey::parse(&record.key).expect("classified by PatternMatcher");
    let epic_key = key.epic_key();
    if !epic::exists(conn, &epic_key)? {
        return Ok(ChangeAction::MissingParent { parent_kind: EntityKind::Epic, parent_key: epic_key.as_str().to_string() });
    }
    match feature::get_by_key(conn, &key)? {
        None => Ok(ChangeAction::Insert),
        Some(existing) => {
            let mut changed = Vec::new();
            if existing.title != record.title {
                changed.push(TrackedField::Title);
            }
            if existing.description != record.description {
                changed.push(TrackedField::Description);
            }
            if let Some(status) = &record.status {
                if &existing.status != status {
                    changed.push(TrackedField::Status);
                }
            }
            if existing.priority != record.priority {
                changed.push(TrackedField::Priority);
            }
            if existing.file_path.as_deref() != Some(record.source_path.as_path()) {
                changed.push(TrackedField::FilePath);
            }
            Ok(classify_existing(changed, &existing.updated_at, record.source_mtime))
        }
    }
}

fn detect_task(conn: &Connection, record: &ParsedRecord) -> shark_storage::Result<ChangeAction> {
    let key = shark_core::keys::TaskKey::parse(&record.key).expect("classified by PatternMatcher");
    let feature_key = key.feature_key();
    if !feature::exists(conn, &feature_key)? {
        return Ok(ChangeAction::MissingParent { parent_kind: EntityKind::Feature, parent_key: feature_key.as_str().to_string() });
    }
    match task::get_by_key(conn, &key)? {
        None => Ok(ChangeAction::Insert),
        Some(existing) => {
            let mut changed = Vec::new();
            if existing.title != record.title {
                changed.push(TrackedField::Title);
            }
            if existing.description != record.description {
                changed.push(TrackedField::Description);
            }
            if let Some(status) = &record.status {
                if &existing.status != status {
                    changed.push(TrackedField::Status);
                }
            }
            if let Some(agent) = &record.assigned_agent {
                if &existing.assigned_agent != agent {
                    changed.push(TrackedField::AssignedAgent);
                }
            }
            if existing.file_path.as_deref() != Some(record.source_path.as_path()) {
                changed.push(TrackedField::FilePath);
            }
            Ok(classify_existing(changed, &existing.updated_at, record.source_mtime))
        }
    }
}

/// A row with no differing tracked field is a `noop`. Otherwise, it is a
/// `conflict` only if the database side was updated more recently than the
/// file was last modified — i.e. both sides moved since the last sync.
fn classify_existing(
    changed: Vec<TrackedField>,
    db_updated_at: &chrono::DateTime<chrono::Utc>,
    file_mtime: chrono::DateTime<chrono::Utc>,
) -> ChangeAction {
    if changed.is_empty() {
        return ChangeAction::Noop;
    }
    if *db_updated_at > file_mtime {
        ChangeAction::Conflict { changed_fields: changed }
    } else {
        ChangeAction::Update { changed_fields: changed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shark_core::entities::EntityKind;
    use shark_storage::connection::Storage;

    fn base_record(key: &str, kind: EntityKind, title: &str) -> ParsedRecord {
        ParsedRecord {
            entity_kind: kind,
            key: key.to_string(),
            parent_key: None,
            title: title.to_string(),
            description: None,
            status: None,
            priority: None,
            assigned_agent: None,
            depends_on: Vec::new(),
            estimated_time: None,
            business_value: None,
            related_documents: Vec::new(),
            source_path: std::path::PathBuf::from("epic.md"),
            source_mtime: Utc::now(),
        }
    }

    #[test]
    fn new_epic_is_insert() {
        let storage = Storage::open_in_memory().unwrap();
        let record = base_record("E01", EntityKind::Epic, "Auth");
        let change = detect(storage.connection(), record).unwrap();
        assert_eq!(change.action, ChangeAction::Insert);
    }

    #[test]
    fn feature_without_epic_is_missing_parent() {
        let storage = Storage::open_in_memory().unwrap();
        let record = base_record("E01-F01", EntityKind::Feature, "Login");
        let change = detect(storage.connection(), record).unwrap();
        assert!(matches!(change.action, ChangeAction::MissingParent { .. }));
    }

    #[test]
    fn unchanged_epic_is_noop() {
        let storage = Storage::open_in_memory().unwrap();
        let conn = storage.connection();
        let now = Utc::now();
        let key = shark_core::keys::EpicKey::parse("E01").unwrap();
        epic::create(
            conn,
            &shark_core::entities::Epic {
                key: key.clone(),
                title: "Auth".to_string(),
                description: None,
                status: "backlog".to_string(),
                priority: None,
                business_value: None,
                file_path: Some(std::path::PathBuf::from("epic.md")),
                slug: shark_core::slug::slugify("Auth"),
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();
        let record = base_record("E01", EntityKind::Epic, "Auth");
        let change = detect(conn, record).unwrap();
        assert_eq!(change.action, ChangeAction::Noop);
    }

    #[test]
    fn moved_epic_is_update_with_only_file_path_changed() {
        let storage = Storage::open_in_memory().unwrap();
        let conn = storage.connection();
        let now = Utc::now();
        let key = shark_core::keys::EpicKey::parse("E01").unwrap();
        epic::create(
            conn,
            &shark_core::entities::Epic {
                key: key.clone(),
                title: "Auth".to_string(),
                description: None,
                status: "backlog".to_string(),
                priority: None,
                business_value: None,
                file_path: Some(std::path::PathBuf::from("old/epic.md")),
                slug: shark_core::slug::slugify("Auth"),
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();
        let mut record = base_record("E01", EntityKind::Epic, "Auth");
        record.source_path = std::path::PathBuf::from("new/epic.md");
        let change = detect(conn, record).unwrap();
        assert_eq!(change.action, ChangeAction::Update { changed_fields: vec![TrackedField::FilePath] });
    }
}
