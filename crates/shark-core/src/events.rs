//! The structured events a sync run emits to the Reporter.
//!
//! Modelled as a sum type (`EventKind`) rather than conflating "advanced
//! successfully" / "recorded a problem and continued" / "failed the whole
//! run" into one return value: a `match` on `EventKind` forces callers to
//! handle every arm.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::EntityKind;
use crate::errors::ErrorDetail;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
}

impl Event {
    pub fn new(timestamp: DateTime<Utc>, kind: EventKind) -> Self {
        Self { timestamp, kind }
    }

    /// The `ErrorDetail` carried by this event, if it is an error- or
    /// warning-class event destined for the report's `errors`/`warnings`
    /// arrays. Discovery/progress events return `None`.
    pub fn error_detail(&self) -> Option<&ErrorDetail> {
        match &self.kind {
            EventKind::FileSkipped { detail, .. } => Some(detail),
            EventKind::ConflictDetected { detail, .. } => Some(detail),
            EventKind::ConflictResolved { detail, .. } => Some(detail),
            EventKind::ValidationWarning { detail } => Some(detail),
            EventKind::RunFailed { detail } => Some(detail),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    ScanStarted { root: PathBuf },
    FileDiscovered { path: PathBuf },
    FileMatched { path: PathBuf, entity_kind: EntityKind, key: String },
    FileSkipped { path: PathBuf, entity_kind: Option<EntityKind>, detail: ErrorDetail },
    EntityParsed { entity_kind: EntityKind, key: String },
    EntityImported { entity_kind: EntityKind, key: String },
    EntityUpdated { entity_kind: EntityKind, key: String },
    DocumentLinked { entity_kind: EntityKind, key: String, document_path: PathBuf },
    ConflictDetected { entity_kind: EntityKind, key: String, detail: ErrorDetail },
    ConflictResolved { entity_kind: EntityKind, key: String, detail: ErrorDetail },
    ValidationWarning { detail: ErrorDetail },
    RunFailed { detail: ErrorDetail },
    ScanCompleted { duration_seconds: f64 },
    DryRunCompleted { duration_seconds: f64 },
}
