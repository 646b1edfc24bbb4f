//! The Reporter: an append-only accumulator over a sync run's event feed,
//! grouping by error kind and maintaining per-entity counters in one pass.
//! `generate_report` is pure and idempotent — call it as many times as you
//! like over the same accumulated state.

use std::collections::HashMap;

use shark_core::entities::EntityKind;
use shark_core::errors::{ErrorDetail, ErrorKind};
use shark_core::events::{Event, EventKind};
use shark_sync::SyncOutcome;

use crate::schema::{EntityBreakdown, EntityCounts, PatternSet, ScanCounts, ScanMetadata, ScanReport, ScanSummary};

/// Accumulates a sync run's events. Construction is the only mutation point
/// (`new`/`from_events`) — once built, a `Reporter` is read-only, matching
/// the "single-writer" contract: there is exactly one pass over the feed.
pub struct Reporter {
    events: Vec<Event>,
    by_kind: HashMap<ErrorKind, Vec<ErrorDetail>>,
}

impl Reporter {
    pub fn new() -> Self {
        Self { events: Vec::new(), by_kind: HashMap::new() }
    }

    pub fn from_events(events: Vec<Event>) -> Self {
        let mut reporter = Self::new();
        for event in events {
            reporter.record(event);
        }
        reporter
    }

    /// Appends one event, filing its `ErrorDetail` (if any) under its kind
    /// in insertion order. Never fails: reporting must not be a second
    /// source of run failure.
    pub fn record(&mut self, event: Event) {
        if let Some(detail) = event.error_detail() {
            self.by_kind.entry(detail.error_type).or_default().push(detail.clone());
        }
        self.events.push(event);
    }

    /// Builds the final `ScanReport`. Idempotent: calling this twice over
    /// the same accumulated events yields identical output (up to nothing —
    /// there is no hidden mutable state left to diverge).
    pub fn generate_report(&self, outcome: &SyncOutcome) -> ScanReport {
        let mut counts = ScanCounts::default();
        let mut entities = EntityBreakdown::default();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        for event in &self.events {
            match &event.kind {
                EventKind::FileDiscovered { .. } => counts.scanned += 1,
                EventKind::FileMatched { entity_kind, .. } => {
                    counts.matched += 1;
                    entity_counts_mut(&mut entities, *entity_kind).matched += 1;
                }
                EventKind::FileSkipped { entity_kind, detail, .. } => {
                    counts.skipped += 1;
                    if let Some(kind) = entity_kind {
                        entity_counts_mut(&mut entities, *kind).skipped += 1;
                    }
                    file(detail, &mut errors, &mut warnings);
                }
                EventKind::EntityImported { entity_kind, .. } => {
                    entity_counts_mut(&mut entities, *entity_kind).imported += 1;
                }
                EventKind::EntityUpdated { entity_kind, .. } => {
                    entity_counts_mut(&mut entities, *entity_kind).updated += 1;
                }
                EventKind::DocumentLinked { .. } => {
                    entities.related_docs.linked += 1;
                }
                EventKind::ConflictDetected { detail, .. } | EventKind::ConflictResolved { detail, .. } => {
                    file(detail, &mut errors, &mut warnings);
                }
                EventKind::ValidationWarning { detail } | EventKind::RunFailed { detail } => {
                    file(detail, &mut errors, &mut warnings);
                }
                EventKind::ScanStarted { .. } | EventKind::EntityParsed { .. } => {}
                EventKind::ScanCompleted { .. } | EventKind::DryRunCompleted { .. } => {}
            }
        }

        let summary = ScanSummary {
            imported: entities.epics.imported + entities.features.imported + entities.tasks.imported,
            updated: entities.epics.updated + entities.features.updated + entities.tasks.updated,
            errors: errors.len() as u64,
            warnings: warnings.len() as u64,
        };

        ScanReport {
            schema_version: crate::schema::SCHEMA_VERSION.to_string(),
            status: outcome.status.into(),
            dry_run: outcome.dry_run,
            metadata: ScanMetadata {
                timestamp: self.events.first().map(|e| e.timestamp).unwrap_or_else(chrono::Utc::now),
                duration_seconds: outcome.duration_seconds,
                documentation_root: outcome.documentation_root.clone(),
                patterns: PatternSet::default(),
                conflict_strategy: outcome.conflict_strategy,
            },
            counts,
            entities,
            errors,
            warnings,
            summary,
        }
    }

    /// Events grouped by `ErrorKind`, insertion order preserved within each
    /// group — exposed for callers (the CLI formatter) that need the
    /// "errors grouped by kind" section order directly, without re-deriving
    /// it from `ScanReport::errors`.
    pub fn by_kind(&self) -> &HashMap<ErrorKind, Vec<ErrorDetail>> {
        &self.by_kind
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

fn entity_counts_mut(entities: &mut EntityBreakdown, kind: EntityKind) -> &mut EntityCounts {
    match kind {
        EntityKind::Epic => &mut entities.epics,
        EntityKind::Feature => &mut entities.features,
        EntityKind::Task => &mut entities.tasks,
    }
}

fn file(detail: &ErrorDetail, errors: &mut Vec<ErrorDetail>, warnings: &mut Vec<ErrorDetail>) {
    match detail.severity {
        shark_core::errors::Severity::Error => errors.push(detail.clone()),
        shark_core::errors::Severity::Warning | shark_core::errors::Severity::Info => {
            warnings.push(detail.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shark_core::entities::EntityKind;
    use shark_core::errors::{ErrorDetail, ErrorKind, Severity};
    use shark_core::RunStatus;
    use std::path::PathBuf;

    fn outcome() -> SyncOutcome {
        SyncOutcome {
            events: Vec::new(),
            status: RunStatus::Success,
            dry_run: false,
            documentation_root: PathBuf::from("/docs/plan"),
            conflict_strategy: shark_core::config::ConflictStrategy::Abort,
            duration_seconds: 1.5,
        }
    }

    #[test]
    fn counts_matched_and_imported_entities() {
        let mut reporter = Reporter::new();
        reporter.record(Event::new(
            Utc::now(),
            EventKind::FileMatched { path: PathBuf::from("e.md"), entity_kind: EntityKind::Epic, key: "E01".into() },
        ));
        reporter.record(Event::new(
            Utc::now(),
            EventKind::EntityImported { entity_kind: EntityKind::Epic, key: "E01".into() },
        ));
        let report = reporter.generate_report(&outcome());
        assert_eq!(report.entities.epics.matched, 1);
        assert_eq!(report.entities.epics.imported, 1);
        assert_eq!(report.summary.imported, 1);
    }

    #[test]
    fn skipped_file_without_entity_kind_only_bumps_global_count() {
        let mut reporter = Reporter::new();
        reporter.record(Event::new(
            Utc::now(),
            EventKind::FileSkipped {
                path: PathBuf::from("README.md"),
                entity_kind: None,
                detail: ErrorDetail::new(
                    Severity::Warning,
                    ErrorKind::PatternMismatch,
                    "README.md",
                    "does not match any known pattern",
                    "move it outside the documentation root",
                ),
            },
        ));
        let report = reporter.generate_report(&outcome());
        assert_eq!(report.counts.skipped, 1);
        assert_eq!(report.entities.epics.skipped, 0);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn generate_report_is_idempotent() {
        let mut reporter = Reporter::new();
        reporter.record(Event::new(
            Utc::now(),
            EventKind::EntityImported { entity_kind: EntityKind::Task, key: "T-E01-F01-001".into() },
        ));
        let first = reporter.generate_report(&outcome());
        let second = reporter.generate_report(&outcome());
        assert_eq!(first.summary.imported, second.summary.imported);
        assert_eq!(first.entities.tasks.imported, second.entities.tasks.imported);
    }
}
