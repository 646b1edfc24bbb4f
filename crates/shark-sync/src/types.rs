//! Transient values that live for exactly one sync invocation.
//! None of these are persisted; they flow Scanner -> PatternMatcher ->
//! MetadataParser -> ConflictDetector -> SyncEngine and are discarded.

use std::path::PathBuf;

use shark_core::entities::EntityKind;
use shark_core::errors::{ErrorDetail, ErrorKind, Severity};

/// A filesystem entry the Scanner chose to consider, not yet classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub absolute_path: PathBuf,
    /// A cheap filename-based hint, refined into a certain classification
    /// by the PatternMatcher; `None` when the filename alone tells us
    /// nothing.
    pub kind_hint: Option<EntityKind>,
    pub depth: usize,
    pub size_bytes: u64,
    /// Set by the Scanner itself when it already knows the file cannot be
    /// processed (currently only the size cap); `None` otherwise and left
    /// for the PatternMatcher to decide.
    pub skip_hint: Option<SkipReason>,
}

/// Why a candidate or matched file never produced a [`ParsedRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    PatternMismatch,
    KeyHierarchyMismatch { expected: String, found: String },
    FileTooLarge { size_bytes: u64, max_bytes: u64 },
    FileAccessError { message: String },
}

impl SkipReason {
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            SkipReason::PatternMismatch => ErrorKind::PatternMismatch,
            SkipReason::KeyHierarchyMismatch { .. } => ErrorKind::KeyMismatch,
            SkipReason::FileTooLarge { .. } => ErrorKind::FileTooLarge,
            SkipReason::FileAccessError { .. } => ErrorKind::FileAccessError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            SkipReason::PatternMismatch => {
                "file name and location do not match any known entity pattern".to_string()
            }
            SkipReason::KeyHierarchyMismatch { expected, found } => {
                format!("key '{found}' does not belong under directory for '{expected}'")
            }
            SkipReason::FileTooLarge { size_bytes, max_bytes } => {
                format!("file is {size_bytes} bytes, exceeding the {max_bytes} byte limit")
            }
            SkipReason::FileAccessError { message } => message.clone(),
        }
    }

    pub fn suggested_fix(&self) -> String {
        match self {
            SkipReason::PatternMismatch => {
                "rename to match T-E##-F##-###.md, or place under a recognized epic/feature directory".to_string()
            }
            SkipReason::KeyHierarchyMismatch { .. } => {
                "move the file under the directory matching its frontmatter key, or fix the key".to_string()
            }
            SkipReason::FileTooLarge { max_bytes, .. } => {
                format!("split the file or raise scanner.max_file_size above {max_bytes}")
            }
            SkipReason::FileAccessError { .. } => "check file permissions and retry".to_string(),
        }
    }

    pub fn to_detail(&self, path: &std::path::Path) -> ErrorDetail {
        ErrorDetail::new(Severity::Warning, self.error_kind(), path, self.message(), self.suggested_fix())
    }
}

/// A CandidateFile that the PatternMatcher classified with certainty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedFile {
    pub path: PathBuf,
    pub entity_kind: EntityKind,
    /// The key fragment(s) recoverable purely from filesystem structure
    /// (filename stem, directory name) before the file is even opened.
    pub extracted_key: String,
    pub match_reason: MatchReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReason {
    FilenamePattern,
    FeatureDirectory,
    EpicDirectory,
}

/// The typed outcome of parsing one [`MatchedFile`]'s frontmatter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub entity_kind: EntityKind,
    pub key: String,
    pub parent_key: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assigned_agent: Option<String>,
    pub depends_on: Vec<String>,
    pub estimated_time: Option<String>,
    pub business_value: Option<String>,
    pub related_documents: Vec<shark_core::entities::RelatedDocument>,
    pub source_path: PathBuf,
    pub source_mtime: chrono::DateTime<chrono::Utc>,
}

/// A structured parse failure; always a per-file error, never unwinds the
/// run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub path: PathBuf,
    pub line: Option<u32>,
    pub kind: ErrorKind,
    pub message: String,
    pub suggested_fix: String,
}

impl ParseError {
    pub fn to_detail(&self) -> ErrorDetail {
        let mut detail = ErrorDetail::new(
            Severity::Error,
            self.kind,
            self.path.clone(),
            self.message.clone(),
            self.suggested_fix.clone(),
        );
        if let Some(line) = self.line {
            detail = detail.with_line(line);
        }
        detail
    }
}

/// One planned database mutation derived from a [`ParsedRecord`].
#[derive(Debug, Clone)]
pub struct PendingChange {
    pub entity_kind: EntityKind,
    pub key: String,
    pub action: ChangeAction,
    pub record: ParsedRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeAction {
    Noop,
    Insert,
    Update { changed_fields: Vec<shark_core::entities::TrackedField> },
    Conflict { changed_fields: Vec<shark_core::entities::TrackedField> },
    MissingParent { parent_kind: EntityKind, parent_key: String },
}
