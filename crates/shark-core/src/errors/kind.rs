use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The closed error taxonomy used by both the JSON schema and internal
/// control flow. Adding a variant is a schema change and must bump
/// `schema_version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    PatternMismatch,
    ParseError,
    FrontmatterUnterminated,
    KeyMismatch,
    MissingParent,
    FileAccessError,
    ConflictDetected,
    ConflictResolved,
    FileTooLarge,
    FileChangedDuringScan,
    ValidationWarning,
    BrokenFilePath,
    OrphanedFeature,
    OrphanedTask,
    BrokenDocumentLink,
    UnexpectedInternalError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::PatternMismatch => "pattern_mismatch",
            ErrorKind::ParseError => "parse_error",
            ErrorKind::FrontmatterUnterminated => "frontmatter_unterminated",
            ErrorKind::KeyMismatch => "key_mismatch",
            ErrorKind::MissingParent => "missing_parent",
            ErrorKind::FileAccessError => "file_access_error",
            ErrorKind::ConflictDetected => "conflict_detected",
            ErrorKind::ConflictResolved => "conflict_resolved",
            ErrorKind::FileTooLarge => "file_too_large",
            ErrorKind::FileChangedDuringScan => "file_changed_during_scan",
            ErrorKind::ValidationWarning => "validation_warning",
            ErrorKind::BrokenFilePath => "broken_file_path",
            ErrorKind::OrphanedFeature => "orphaned_feature",
            ErrorKind::OrphanedTask => "orphaned_task",
            ErrorKind::BrokenDocumentLink => "broken_document_link",
            ErrorKind::UnexpectedInternalError => "unexpected_internal_error",
        }
    }

    /// Per-file errors are recorded as events and the loop continues; only
    /// `UnexpectedInternalError` (and `ConflictDetected` under the `abort`
    /// strategy, handled separately by the engine) halts the whole run.
    pub fn is_per_run(&self) -> bool {
        matches!(self, ErrorKind::UnexpectedInternalError)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// One structured record in the `errors`/`warnings` arrays of the JSON
/// schema. `file_path` is a `String` (not `PathBuf`) because it may be
/// empty for global events (`ScanStarted`-class events have no file).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub severity: Severity,
    pub error_type: ErrorKind,
    pub file_path: String,
    pub line_number: Option<u32>,
    pub message: String,
    pub suggested_fix: String,
}

impl ErrorDetail {
    pub fn new(
        severity: Severity,
        error_type: ErrorKind,
        file_path: impl Into<PathBuf>,
        message: impl Into<String>,
        suggested_fix: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            error_type,
            file_path: file_path.into().display().to_string(),
            line_number: None,
            message: message.into(),
            suggested_fix: suggested_fix.into(),
        }
    }

    pub fn global(
        severity: Severity,
        error_type: ErrorKind,
        message: impl Into<String>,
        suggested_fix: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            error_type,
            file_path: String::new(),
            line_number: None,
            message: message.into(),
            suggested_fix: suggested_fix.into(),
        }
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line_number = Some(line);
        self
    }
}
