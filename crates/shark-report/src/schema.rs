//! The versioned wire schema for `ScanReport` and `ValidationReport`.
//! Every field is serialized in the order callers expect; unknown fields on
//! deserialize are ignored by default (`serde`'s normal behavior), keeping
//! older readers forward-compatible with newer writers.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use shark_core::config::ConflictStrategy;
use shark_core::errors::ErrorDetail;
use shark_core::RunStatus;

pub const SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Success,
    Failure,
    Cancelled,
}

impl From<RunStatus> for ReportStatus {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Success => Self::Success,
            RunStatus::Failure => Self::Failure,
            RunStatus::Cancelled => Self::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternSet {
    pub epic: String,
    pub feature: String,
    pub task: String,
}

impl Default for PatternSet {
    fn default() -> Self {
        Self {
            epic: shark_core::keys::EPIC_PATTERN_SRC.to_string(),
            feature: shark_core::keys::FEATURE_PATTERN_SRC.to_string(),
            task: shark_core::keys::TASK_PATTERN_SRC.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanMetadata {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub duration_seconds: f64,
    pub documentation_root: PathBuf,
    pub patterns: PatternSet,
    pub conflict_strategy: ConflictStrategy,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScanCounts {
    pub scanned: u64,
    pub matched: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EntityCounts {
    pub matched: u64,
    pub skipped: u64,
    pub imported: u64,
    pub updated: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RelatedDocCounts {
    pub linked: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityBreakdown {
    pub epics: EntityCounts,
    pub features: EntityCounts,
    pub tasks: EntityCounts,
    pub related_docs: RelatedDocCounts,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScanSummary {
    pub imported: u64,
    pub updated: u64,
    pub errors: u64,
    pub warnings: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub schema_version: String,
    pub status: ReportStatus,
    pub dry_run: bool,
    pub metadata: ScanMetadata,
    pub counts: ScanCounts,
    pub entities: EntityBreakdown,
    pub errors: Vec<ErrorDetail>,
    pub warnings: Vec<ErrorDetail>,
    pub summary: ScanSummary,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ValidationChecks {
    pub file_path_existence: u64,
    pub relationship_integrity: u64,
    pub document_link_integrity: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationMetadata {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub schema_version: String,
    pub status: ReportStatus,
    pub metadata: ValidationMetadata,
    pub validation_checks: ValidationChecks,
    pub failures: Vec<ErrorDetail>,
    pub summary: ScanSummary,
}
