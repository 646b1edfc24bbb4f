//! Validator: three ordered, read-only integrity checks over the current
//! database state. Never mutates; any transaction it opens is rolled back,
//! and in practice it just reads off the default connection.

use rusqlite::{Connection, OptionalExtension};
use shark_core::entities::EntityKind;
use shark_core::errors::{ErrorDetail, ErrorKind, Severity};
use shark_storage::repositories::{document, epic, feature, task};

/// One integrity problem found by a validation pass, surfaced in
/// `ValidationReport`.
#[derive(Debug, Clone)]
pub struct ValidationFinding {
    pub entity_kind: EntityKind,
    pub key: String,
    pub detail: ErrorDetail,
}

pub struct ValidationOutcome {
    pub findings: Vec<ValidationFinding>,
}

impl ValidationOutcome {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Runs, in order: file-path existence, relationship integrity, then
/// document-link integrity. Each check is independent — a failure in one
/// does not short-circuit the others, so a single pass surfaces the full
/// picture of a corrupted database.
pub fn validate(conn: &Connection) -> shark_storage::Result<ValidationOutcome> {
    let mut findings = Vec::new();
    findings.extend(check_file_paths(conn)?);
    findings.extend(check_relationships(conn)?);
    findings.extend(check_document_links(conn)?);
    Ok(ValidationOutcome { findings })
}

fn check_file_paths(conn: &Connection) -> shark_storage::Result<Vec<ValidationFinding>> {
    let mut findings = Vec::new();
    for e in epic::list(conn)? {
        if let Some(path) = &e.file_path {
            if !path.exists() {
                findings.push(broken_file_path(EntityKind::Epic, e.key.as_str(), path));
            }
        }
    }
    for f in feature::list(conn)? {
        if let Some(path) = &f.file_path {
            if !path.exists() {
                findings.push(broken_file_path(EntityKind::Feature, f.key.as_str(), path));
            }
        }
    }
    for t in task::list(conn)? {
        if let Some(path) = &t.file_path {
            if !path.exists() {
                findings.push(broken_file_path(EntityKind::Task, t.key.as_str(), path));
            }
        }
    }
    Ok(findings)
}

fn broken_file_path(entity_kind: EntityKind, key: &str, path: &std::path::Path) -> ValidationFinding {
    ValidationFinding {
        entity_kind,
        key: key.to_string(),
        detail: ErrorDetail::new(
            Severity::Error,
            ErrorKind::BrokenFilePath,
            path,
            format!("{entity_kind} '{key}' points at a file that no longer exists"),
            "re-run sync after restoring the file, or delete the row".to_string(),
        ),
    }
}

/// Every feature must have a live epic and every task a live feature — the
/// foreign-key constraints already prevent this at insert time, so an
/// orphan here means the parent row was deleted out from under its
/// children by something other than `shark`.
fn check_relationships(conn: &Connection) -> shark_storage::Result<Vec<ValidationFinding>> {
    let mut findings = Vec::new();
    for f in feature::list(conn)? {
        if !epic::exists(conn, &f.epic_key)? {
            findings.push(ValidationFinding {
                entity_kind: EntityKind::Feature,
                key: f.key.as_str().to_string(),
                detail: ErrorDetail::global(
                    Severity::Error,
                    ErrorKind::OrphanedFeature,
                    format!("feature '{}' references missing epic '{}'", f.key, f.epic_key),
                    "restore the epic row or delete the orphaned feature".to_string(),
                ),
            });
        }
    }
    for t in task::list(conn)? {
        if !feature::exists(conn, &t.feature_key)? {
            findings.push(ValidationFinding {
                entity_kind: EntityKind::Task,
                key: t.key.as_str().to_string(),
                detail: ErrorDetail::global(
                    Severity::Error,
                    ErrorKind::OrphanedTask,
                    format!("task '{}' references missing feature '{}'", t.key, t.feature_key),
                    "restore the feature row or delete the orphaned task".to_string(),
                ),
            });
        }
    }
    Ok(findings)
}

/// Every row in a `*_documents` join table must reference a document that
/// still exists in the `documents` table.
fn check_document_links(conn: &Connection) -> shark_storage::Result<Vec<ValidationFinding>> {
    let mut findings = Vec::new();
    for (key, document_id) in document::all_epic_links(conn)? {
        if !document_exists(conn, document_id)? {
            findings.push(broken_document_link(EntityKind::Epic, &key, document_id));
        }
    }
    for (key, document_id) in document::all_feature_links(conn)? {
        if !document_exists(conn, document_id)? {
            findings.push(broken_document_link(EntityKind::Feature, &key, document_id));
        }
    }
    for (key, document_id) in document::all_task_links(conn)? {
        if !document_exists(conn, document_id)? {
            findings.push(broken_document_link(EntityKind::Task, &key, document_id));
        }
    }
    Ok(findings)
}

fn document_exists(conn: &Connection, document_id: i64) -> shark_storage::Result<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM documents WHERE id = ?1", [document_id], |_| Ok(()))
        .optional()?
        .is_some())
}

fn broken_document_link(entity_kind: EntityKind, key: &str, document_id: i64) -> ValidationFinding {
    ValidationFinding {
        entity_kind,
        key: key.to_string(),
        detail: ErrorDetail::global(
            Severity::Error,
            ErrorKind::BrokenDocumentLink,
            format!("{entity_kind} '{key}' links to document id {document_id} which no longer exists"),
            "remove the dangling link or restore the document row".to_string(),
        ),
    }
}
