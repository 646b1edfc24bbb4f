//! MetadataParser: reads a [`MatchedFile`] and extracts a [`ParsedRecord`]
//! or a structured [`ParseError`].
//!
//! Frontmatter parsing itself is delegated to `gray_matter`'s YAML engine,
//! grounded on the `extract_document_id` usage in the reference sync
//! module; unterminated-fence detection happens first by hand, since
//! `gray_matter` silently treats a file with no closing `---` as having no
//! frontmatter at all rather than surfacing an error.

use std::path::Path;

use chrono::{DateTime, Utc};
use gray_matter::engine::YAML;
use gray_matter::{Matter, Pod};
use shark_core::entities::{EntityKind, RelatedDocument};
use shark_core::errors::{ErrorDetail, ErrorKind, Severity};
use shark_core::keys::{FeatureKey, TaskKey};

use crate::types::{MatchedFile, ParseError, ParsedRecord};

#[derive(Debug)]
pub struct ParseOutcome {
    pub record: ParsedRecord,
    /// INFO/WARNING notices that are not fatal to the file (title fallback,
    /// missing optional-but-recommended fields, out-of-workflow status).
    pub notices: Vec<ErrorDetail>,
}

pub fn parse(matched: &MatchedFile) -> Result<ParseOutcome, ParseError> {
    let raw = std::fs::read_to_string(&matched.path).map_err(|e| ParseError {
        path: matched.path.clone(),
        line: None,
        kind: ErrorKind::FileAccessError,
        message: format!("failed to read file: {e}"),
        suggested_fix: "check file permissions and encoding".to_string(),
    })?;

    if let Err(err) = check_fence_terminated(&matched.path, &raw) {
        return Err(err);
    }

    let parsed = Matter::<YAML>::new().parse(&raw);
    let fields = parsed.data.as_ref().and_then(pod_as_map);

    let mut notices = Vec::new();

    let title = match fields.as_ref().and_then(|m| get_string(m, "title")) {
        Some(t) => t,
        None => match first_heading(&parsed.content) {
            Some(h) => {
                notices.push(ErrorDetail::new(
                    Severity::Info,
                    ErrorKind::ValidationWarning,
                    matched.path.clone(),
                    "title missing from frontmatter, fell back to first heading".to_string(),
                    "add an explicit `title:` field to frontmatter".to_string(),
                ));
                h
            }
            None => {
                notices.push(ErrorDetail::new(
                    Severity::Warning,
                    ErrorKind::ValidationWarning,
                    matched.path.clone(),
                    "missing required field: title".to_string(),
                    "add a `title:` field to frontmatter or a `#` heading".to_string(),
                ));
                matched.extracted_key.clone()
            }
        },
    };

    if let Some(map) = &fields {
        if let Some(frontmatter_key) = get_string(map, "key") {
            if frontmatter_key != matched.extracted_key {
                return Err(ParseError {
                    path: matched.path.clone(),
                    line: None,
                    kind: ErrorKind::KeyMismatch,
                    message: format!(
                        "frontmatter key '{frontmatter_key}' does not match filesystem-derived key '{}'",
                        matched.extracted_key
                    ),
                    suggested_fix: "fix the frontmatter `key:` field or move the file".to_string(),
                });
            }
        }
    }

    let assigned_agent = fields.as_ref().and_then(|m| get_string(m, "assigned_agent"));
    if matched.entity_kind == EntityKind::Task && assigned_agent.is_none() {
        notices.push(ErrorDetail::new(
            Severity::Warning,
            ErrorKind::ValidationWarning,
            matched.path.clone(),
            "missing required field: assigned_agent".to_string(),
            "add an `assigned_agent:` field to frontmatter".to_string(),
        ));
    }

    let parent_key = parent_key_for(matched);

    let depends_on = fields
        .as_ref()
        .and_then(|m| m.get("depends_on"))
        .and_then(pod_as_array)
        .map(|items| items.iter().filter_map(pod_as_string).collect())
        .unwrap_or_default();

    let related_documents = fields
        .as_ref()
        .and_then(|m| m.get("related_documents"))
        .and_then(pod_as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let map = pod_as_map(item)?;
                    let title = get_string(&map, "title")?;
                    let path = get_string(&map, "path")?;
                    Some(RelatedDocument { title, path: std::path::PathBuf::from(path) })
                })
                .collect()
        })
        .unwrap_or_default();

    let mtime = std::fs::metadata(&matched.path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    Ok(ParseOutcome {
        record: ParsedRecord {
            entity_kind: matched.entity_kind,
            key: matched.extracted_key.clone(),
            parent_key,
            title,
            description: fields.as_ref().and_then(|m| get_string(m, "description")),
            status: fields.as_ref().and_then(|m| get_string(m, "status")),
            priority: fields.as_ref().and_then(|m| get_string(m, "priority")),
            assigned_agent,
            depends_on,
            estimated_time: fields.as_ref().and_then(|m| get_string(m, "estimated_time")),
            business_value: fields.as_ref().and_then(|m| get_string(m, "business_value")),
            related_documents,
            source_path: matched.path.clone(),
            source_mtime: mtime,
        },
        notices,
    })
}

fn parent_key_for(matched: &MatchedFile) -> Option<String> {
    match matched.entity_kind {
        EntityKind::Epic => None,
        EntityKind::Feature => FeatureKey::parse(&matched.extracted_key).ok().map(|k| k.epic_key().as_str().to_string()),
        EntityKind::Task => TaskKey::parse(&matched.extracted_key).ok().map(|k| k.feature_key().as_str().to_string()),
    }
}

/// Rejects a file whose frontmatter opens with `---` but never closes it,
/// pinpointing the opening-fence line.
fn check_fence_terminated(path: &Path, raw: &str) -> Result<(), ParseError> {
    let mut lines = raw.lines().enumerate();
    let Some((_, first)) = lines.next() else { return Ok(()) };
    if first.trim_end() != "---" {
        return Ok(());
    }
    for (idx, line) in lines {
        if line.trim_end() == "---" {
            return Ok(());
        }
        let _ = idx;
    }
    Err(ParseError {
        path: path.to_path_buf(),
        line: Some(1),
        kind: ErrorKind::FrontmatterUnterminated,
        message: "frontmatter block opened with '---' but was never closed".to_string(),
        suggested_fix: "add '---' to close the frontmatter block".to_string(),
    })
}

fn first_heading(body: &str) -> Option<String> {
    body.lines().find_map(|line| line.trim().strip_prefix("# ").map(|h| h.trim().to_string()))
}

fn pod_as_map(pod: &Pod) -> Option<std::collections::HashMap<String, Pod>> {
    match pod {
        Pod::Hash(map) => Some(map.clone()),
        _ => None,
    }
}

fn pod_as_array(pod: &Pod) -> Option<Vec<Pod>> {
    match pod {
        Pod::Array(items) => Some(items.clone()),
        _ => None,
    }
}

fn pod_as_string(pod: &Pod) -> Option<String> {
    match pod {
        Pod::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn get_string(map: &std::collections::HashMap<String, Pod>, key: &str) -> Option<String> {
    map.get(key).and_then(pod_as_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchReason;
    use std::path::PathBuf;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn parses_task_frontmatter() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "T-E01-F01-001.md",
            "---\ntitle: Implement login\nassigned_agent: alice\nstatus: in_progress\n---\n\n# Implement login\n",
        );
        let matched = MatchedFile {
            path,
            entity_kind: EntityKind::Task,
            extracted_key: "T-E01-F01-001".to_string(),
            match_reason: MatchReason::FilenamePattern,
        };
        let outcome = parse(&matched).unwrap();
        assert_eq!(outcome.record.title, "Implement login");
        assert_eq!(outcome.record.assigned_agent.as_deref(), Some("alice"));
        assert_eq!(outcome.record.parent_key.as_deref(), Some("E01-F01"));
        assert!(outcome.notices.is_empty());
    }

    #[test]
    fn unterminated_fence_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "epic.md", "---\ntitle: Auth\n\n# Auth\n");
        let matched = MatchedFile {
            path,
            entity_kind: EntityKind::Epic,
            extracted_key: "E01".to_string(),
            match_reason: MatchReason::EpicDirectory,
        };
        let err = parse(&matched).unwrap_err();
        assert_eq!(err.kind, ErrorKind::FrontmatterUnterminated);
        assert_eq!(err.line, Some(1));
    }

    #[test]
    fn missing_frontmatter_falls_back_to_heading() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "epic.md", "# Authentication\n\nSome body text.\n");
        let matched = MatchedFile {
            path,
            entity_kind: EntityKind::Epic,
            extracted_key: "E01".to_string(),
            match_reason: MatchReason::EpicDirectory,
        };
        let outcome = parse(&matched).unwrap();
        assert_eq!(outcome.record.title, "Authentication");
        assert_eq!(outcome.notices.len(), 1);
    }

    #[test]
    fn key_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "T-E01-F01-001.md", "---\ntitle: X\nkey: T-E01-F01-002\n---\n");
        let matched = MatchedFile {
            path,
            entity_kind: EntityKind::Task,
            extracted_key: "T-E01-F01-001".to_string(),
            match_reason: MatchReason::FilenamePattern,
        };
        let err = parse(&matched).unwrap_err();
        assert_eq!(err.kind, ErrorKind::KeyMismatch);
    }
}
