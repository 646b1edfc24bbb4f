//! Persistent entity types: Epic, Feature, Task, Document.
//!
//! Optional fields are modelled as `Option<T>` directly rather than as
//! pointers to primitives threaded through a separate "is set" flag — the
//! distinction between "absent" and "set to the zero value" stays visible
//! all the way to the JSON wire schema and the SQLite columns.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::keys::{EpicKey, FeatureKey, TaskKey};

/// The three levels of the work hierarchy. Documents are a fourth entity
/// kind but are never classified by the PatternMatcher as a hierarchy level,
/// so they are represented separately (see `related-doc` in `MatchKind`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Epic,
    Feature,
    Task,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Epic => "epic",
            EntityKind::Feature => "feature",
            EntityKind::Task => "task",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Epic {
    pub key: EpicKey,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: Option<String>,
    pub business_value: Option<String>,
    pub file_path: Option<PathBuf>,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub key: FeatureKey,
    pub epic_key: EpicKey,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: Option<String>,
    pub file_path: Option<PathBuf>,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub key: TaskKey,
    pub feature_key: FeatureKey,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    /// 1 (lowest) through 10 (highest); validated at the repository boundary.
    pub priority: u8,
    pub assigned_agent: String,
    pub depends_on: Vec<TaskKey>,
    pub estimated_time: Option<String>,
    pub file_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub file_path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A document reference as it appears in task/feature/epic frontmatter
/// (`related_documents: [{title, path}]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedDocument {
    pub title: String,
    pub path: PathBuf,
}

/// The closed set of fields ConflictDetector compares. Computed
/// fields (progress, auto-derived slug, status-override sentinels) are
/// deliberately excluded and never appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedField {
    Title,
    Description,
    Status,
    Priority,
    /// Tasks only.
    AssignedAgent,
    FilePath,
}

impl TrackedField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackedField::Title => "title",
            TrackedField::Description => "description",
            TrackedField::Status => "status",
            TrackedField::Priority => "priority",
            TrackedField::AssignedAgent => "assigned_agent",
            TrackedField::FilePath => "file_path",
        }
    }
}
