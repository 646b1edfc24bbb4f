//! PatternMatcher: classifies a [`CandidateFile`] into an entity kind using
//! three layered, top-down rules.

use shark_core::entities::EntityKind;
use shark_core::keys::{epic_key_from_dirname, feature_key_from_dirname, task_key_from_filename};

use crate::types::{CandidateFile, MatchReason, MatchedFile, SkipReason};

const EPIC_FILENAMES: &[&str] = &["epic.md", "epic-prd.md"];
const FEATURE_FILENAMES: &[&str] = &["feature.md", "prd.md"];

pub fn classify(candidate: &CandidateFile) -> Result<MatchedFile, SkipReason> {
    if let Some(hint) = &candidate.skip_hint {
        return Err(hint.clone());
    }

    let path = &candidate.absolute_path;
    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();

    // Rule 1: filename against the task pattern.
    if let Some(task_key) = task_key_from_filename(filename) {
        if let Some(feature_dir) = path.parent().and_then(|p| p.parent()) {
            // tasks/ is the immediate parent; the feature directory is one above it.
            if let Some(dirname) = feature_dir.file_name().and_then(|n| n.to_str()) {
                if let Some(dir_feature_key) = feature_key_from_dirname(dirname) {
                    if dir_feature_key != task_key.feature_key() {
                        return Err(SkipReason::KeyHierarchyMismatch {
                            expected: dir_feature_key.as_str().to_string(),
                            found: task_key.feature_key().as_str().to_string(),
                        });
                    }
                }
            }
        }
        return Ok(MatchedFile {
            path: path.clone(),
            entity_kind: EntityKind::Task,
            extracted_key: task_key.as_str().to_string(),
            match_reason: MatchReason::FilenamePattern,
        });
    }

    // Rule 2: containing directory against the feature pattern.
    if let Some(parent) = path.parent() {
        if let Some(dirname) = parent.file_name().and_then(|n| n.to_str()) {
            if let Some(feature_key) = feature_key_from_dirname(dirname) {
                let slug = dirname.strip_prefix(&format!("{}-", feature_key.as_str())).unwrap_or("");
                if FEATURE_FILENAMES.contains(&filename) || filename == format!("{slug}.md") {
                    return Ok(MatchedFile {
                        path: path.clone(),
                        entity_kind: EntityKind::Feature,
                        extracted_key: feature_key.as_str().to_string(),
                        match_reason: MatchReason::FeatureDirectory,
                    });
                }
            }

            // Rule 3: containing directory against the epic pattern.
            if let Some(epic_key) = epic_key_from_dirname(dirname) {
                let slug = dirname
                    .strip_prefix(&format!("{}-", epic_key.as_str()))
                    .unwrap_or(dirname);
                if EPIC_FILENAMES.contains(&filename) || filename == format!("{slug}.md") {
                    return Ok(MatchedFile {
                        path: path.clone(),
                        entity_kind: EntityKind::Epic,
                        extracted_key: epic_key.as_str().to_string(),
                        match_reason: MatchReason::EpicDirectory,
                    });
                }
            }
        }
    }

    Err(SkipReason::PatternMismatch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn candidate(path: &str) -> CandidateFile {
        CandidateFile {
            absolute_path: PathBuf::from(path),
            kind_hint: None,
            depth: path.matches('/').count(),
            size_bytes: 10,
            skip_hint: None,
        }
    }

    #[test]
    fn matches_task_by_filename() {
        let c = candidate("/docs/plan/E01-auth/E01-F01-login/tasks/T-E01-F01-001.md");
        let matched = classify(&c).unwrap();
        assert_eq!(matched.entity_kind, EntityKind::Task);
        assert_eq!(matched.extracted_key, "T-E01-F01-001");
    }

    #[test]
    fn task_under_wrong_feature_directory_is_hierarchy_mismatch() {
        let c = candidate("/docs/plan/E01-auth/E01-F02-other/tasks/T-E01-F01-001.md");
        let err = classify(&c).unwrap_err();
        assert!(matches!(err, SkipReason::KeyHierarchyMismatch { .. }));
    }

    #[test]
    fn matches_feature_by_canonical_filename() {
        let c = candidate("/docs/plan/E01-auth/E01-F01-login/feature.md");
        let matched = classify(&c).unwrap();
        assert_eq!(matched.entity_kind, EntityKind::Feature);
        assert_eq!(matched.extracted_key, "E01-F01");
    }

    #[test]
    fn matches_epic_by_canonical_filename() {
        let c = candidate("/docs/plan/E01-auth/epic.md");
        let matched = classify(&c).unwrap();
        assert_eq!(matched.entity_kind, EntityKind::Epic);
        assert_eq!(matched.extracted_key, "E01");
    }

    #[test]
    fn unrecognized_file_is_pattern_mismatch() {
        let c = candidate("/docs/plan/notes.md");
        assert_eq!(classify(&c).unwrap_err(), SkipReason::PatternMismatch);
    }
}
