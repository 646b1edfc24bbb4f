//! SyncEngine: the orchestrator. Its single externally visible operation is
//! `run()`, implementing the scan/match/parse/detect/apply/reconcile/commit
//! phase sequence.

use std::path::PathBuf;

use chrono::Utc;
use rusqlite::Connection;
use shark_core::config::{Config, ConflictStrategy};
use shark_core::entities::{Document, Epic, EntityKind, Feature, Task};
use shark_core::errors::{ErrorDetail, ErrorKind, Severity};
use shark_core::events::{Event, EventKind};
use shark_core::keys::{EpicKey, FeatureKey, TaskKey};
use shark_core::run_status::RunStatus;
use shark_storage::repositories::{document, epic, feature, task};
use shark_storage::Storage;

use crate::pattern_matcher;
use crate::types::{ChangeAction, MatchedFile, ParsedRecord, PendingChange};
use crate::{metadata_parser, scanner::Scanner};

enum ConnHandle<'a> {
    Tx(rusqlite::Transaction<'a>),
    Direct(&'a Connection),
}

/// Options accepted by `shark sync`.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub folder: Option<PathBuf>,
    pub dry_run: bool,
    pub conflict_strategy: Option<ConflictStrategy>,
    pub create_missing: bool,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub max_file_size: Option<u64>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            folder: None,
            dry_run: false,
            conflict_strategy: None,
            create_missing: false,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            max_file_size: None,
        }
    }
}

/// Everything the Reporter needs to render a `ScanReport`, beyond the raw
/// event stream itself.
pub struct SyncOutcome {
    pub events: Vec<Event>,
    pub status: RunStatus,
    pub dry_run: bool,
    pub documentation_root: PathBuf,
    pub conflict_strategy: ConflictStrategy,
    pub duration_seconds: f64,
}

pub fn run(storage: &mut Storage, config: &Config, options: &SyncOptions) -> SyncOutcome {
    let started = Utc::now();
    let root = options.folder.clone().unwrap_or_else(|| config.documentation_root.clone());
    let conflict_strategy = options.conflict_strategy.unwrap_or(config.default_conflict_strategy);

    let mut events = Vec::new();
    let mut emit = |kind: EventKind| events.push(Event::new(Utc::now(), kind));

    emit(EventKind::ScanStarted { root: root.clone() });

    let mut scanner_config = config.scanner.clone();
    scanner_config.include.extend(options.include_patterns.iter().cloned());
    scanner_config.exclude.extend(options.exclude_patterns.iter().cloned());
    if let Some(max) = options.max_file_size {
        scanner_config.max_file_size = max;
    }

    let candidates = Scanner::new(scanner_config).scan(&root);
    for candidate in &candidates {
        emit(EventKind::FileDiscovered { path: candidate.absolute_path.clone() });
    }

    let mut matched_files = Vec::new();
    for candidate in &candidates {
        match pattern_matcher::classify(candidate) {
            Ok(matched) => {
                emit(EventKind::FileMatched {
                    path: matched.path.clone(),
                    entity_kind: matched.entity_kind,
                    key: matched.extracted_key.clone(),
                });
                matched_files.push(matched);
            }
            Err(reason) => {
                emit(EventKind::FileSkipped {
                    path: candidate.absolute_path.clone(),
                    entity_kind: None,
                    detail: reason.to_detail(&candidate.absolute_path),
                });
            }
        }
    }

    let parsed_records = parse_phase(&matched_files, config, &mut emit);

    let txn: ConnHandle = if options.dry_run {
        ConnHandle::Direct(storage.connection())
    } else {
        match storage.begin() {
            Ok(t) => ConnHandle::Tx(t),
            Err(e) => {
                emit(EventKind::RunFailed {
                    detail: ErrorDetail::global(
                        Severity::Error,
                        ErrorKind::UnexpectedInternalError,
                        format!("failed to open transaction: {e}"),
                        "check database file permissions and disk space".to_string(),
                    ),
                });
                return SyncOutcome {
                    events,
                    status: RunStatus::Failure,
                    dry_run: options.dry_run,
                    documentation_root: root,
                    conflict_strategy,
                    duration_seconds: (Utc::now() - started).num_milliseconds() as f64 / 1000.0,
                };
            }
        }
    };
    let conn: &Connection = match &txn {
        ConnHandle::Tx(t) => t,
        ConnHandle::Direct(c) => c,
    };

    let mut pending = Vec::new();
    for record in parsed_records {
        match crate::conflict_detector::detect(conn, record) {
            Ok(change) => pending.push(change),
            Err(e) => emit(EventKind::RunFailed {
                detail: ErrorDetail::global(
                    Severity::Error,
                    ErrorKind::UnexpectedInternalError,
                    format!("conflict detection failed: {e}"),
                    "re-run after checking database integrity".to_string(),
                ),
            }),
        }
    }
    pending.sort_by(|a, b| (kind_rank(a.entity_kind), &a.key).cmp(&(kind_rank(b.entity_kind), &b.key)));

    let mut aborted = false;
    let mut unexpected_failure = false;
    let mut linkable: Vec<PendingChange> = Vec::new();

    for change in pending {
        let apply = !options.dry_run;
        match &change.action {
            ChangeAction::Noop => {}
            ChangeAction::Insert => {
                if apply {
                    if let Err(e) = apply_insert(conn, &change) {
                        unexpected_failure = true;
                        emit(EventKind::RunFailed { detail: global_error(e) });
                        continue;
                    }
                }
                emit(EventKind::EntityImported { entity_kind: change.entity_kind, key: change.key.clone() });
                linkable.push(change);
            }
            ChangeAction::Update { .. } => {
                if apply {
                    if let Err(e) = apply_update(conn, &change) {
                        unexpected_failure = true;
                        emit(EventKind::RunFailed { detail: global_error(e) });
                        continue;
                    }
                }
                emit(EventKind::EntityUpdated { entity_kind: change.entity_kind, key: change.key.clone() });
                linkable.push(change);
            }
            ChangeAction::Conflict { changed_fields } => match conflict_strategy {
                ConflictStrategy::PreferFile => {
                    if apply {
                        if let Err(e) = apply_update(conn, &change) {
                            unexpected_failure = true;
                            emit(EventKind::RunFailed { detail: global_error(e) });
                            continue;
                        }
                    }
                    emit(EventKind::ConflictResolved {
                        entity_kind: change.entity_kind,
                        key: change.key.clone(),
                        detail: conflict_detail(&change, changed_fields, "file value applied (prefer_file)"),
                    });
                    linkable.push(change);
                }
                ConflictStrategy::PreferDb => {
                    emit(EventKind::ConflictResolved {
                        entity_kind: change.entity_kind,
                        key: change.key.clone(),
                        detail: conflict_detail(&change, changed_fields, "database value kept (prefer_db)"),
                    });
                }
                ConflictStrategy::Abort => {
                    aborted = true;
                    emit(EventKind::ConflictDetected {
                        entity_kind: change.entity_kind,
                        key: change.key.clone(),
                        detail: conflict_detail(&change, changed_fields, "run aborted (conflict_strategy=abort)"),
                    });
                }
            },
            ChangeAction::MissingParent { parent_kind, parent_key } => {
                if options.create_missing && apply {
                    if let Err(e) = synthesize_ancestors(conn, *parent_kind, parent_key) {
                        unexpected_failure = true;
                        emit(EventKind::RunFailed { detail: global_error(e) });
                        continue;
                    }
                    if let Err(e) = apply_insert(conn, &change) {
                        unexpected_failure = true;
                        emit(EventKind::RunFailed { detail: global_error(e) });
                        continue;
                    }
                    emit(EventKind::EntityImported { entity_kind: change.entity_kind, key: change.key.clone() });
                    linkable.push(change);
                } else if options.create_missing {
                    // dry-run: nothing is actually created, but the report
                    // must reflect what would have happened.
                    emit(EventKind::EntityImported { entity_kind: change.entity_kind, key: change.key.clone() });
                    linkable.push(change);
                } else {
                    emit(EventKind::FileSkipped {
                        path: change.record.source_path.clone(),
                        entity_kind: Some(change.entity_kind),
                        detail: ErrorDetail::new(
                            Severity::Error,
                            ErrorKind::MissingParent,
                            change.record.source_path.clone(),
                            format!(
                                "{} '{}' references {} '{}' which does not exist",
                                change.entity_kind, change.key, parent_kind, parent_key
                            ),
                            "run with --create-missing, or create the parent file first".to_string(),
                        ),
                    });
                }
            }
        }
    }

    if !options.dry_run {
        for change in &linkable {
            match reconcile_documents(conn, change) {
                Ok(linked) => {
                    for document_path in linked {
                        emit(EventKind::DocumentLinked {
                            entity_kind: change.entity_kind,
                            key: change.key.clone(),
                            document_path,
                        });
                    }
                }
                Err(e) => {
                    unexpected_failure = true;
                    emit(EventKind::RunFailed { detail: global_error(e) });
                }
            }
        }
    }

    let status = if aborted || unexpected_failure { RunStatus::Failure } else { RunStatus::Success };

    if let ConnHandle::Tx(t) = txn {
        if status == RunStatus::Failure {
            let _ = t.rollback();
        } else {
            if let Err(e) = t.commit() {
                emit(EventKind::RunFailed { detail: global_error(e.into()) });
            }
        }
    }

    let duration_seconds = (Utc::now() - started).num_milliseconds() as f64 / 1000.0;
    emit(if options.dry_run {
        EventKind::DryRunCompleted { duration_seconds }
    } else {
        EventKind::ScanCompleted { duration_seconds }
    });

    SyncOutcome { events, status, dry_run: options.dry_run, documentation_root: root, conflict_strategy, duration_seconds }
}

fn parse_phase(
    matched_files: &[MatchedFile],
    config: &Config,
    emit: &mut impl FnMut(EventKind),
) -> Vec<ParsedRecord> {
    let mut records = Vec::new();
    for matched in matched_files {
        match metadata_parser::parse(matched) {
            Ok(outcome) => {
                emit(EventKind::EntityParsed { entity_kind: matched.entity_kind, key: matched.extracted_key.clone() });
                for notice in outcome.notices {
                    emit(EventKind::ValidationWarning { detail: notice });
                }
                let mut record = outcome.record;
                if let Some(status) = &record.status {
                    if !config.workflow.is_legal_status(status) {
                        emit(EventKind::ValidationWarning {
                            detail: ErrorDetail::new(
                                Severity::Warning,
                                ErrorKind::ValidationWarning,
                                record.source_path.clone(),
                                format!("status '{status}' is not part of the configured workflow"),
                                "use one of the configured workflow statuses, or update shark.toml".to_string(),
                            ),
                        });
                        record.status = None;
                    }
                }
                records.push(record);
            }
            Err(err) => emit(EventKind::FileSkipped {
                path: err.path.clone(),
                entity_kind: Some(matched.entity_kind),
                detail: err.to_detail(),
            }),
        }
    }
    records
}

fn kind_rank(kind: EntityKind) -> u8 {
    match kind {
        EntityKind::Epic => 0,
        EntityKind::Feature => 1,
        EntityKind::Task => 2,
    }
}

fn global_error(e: shark_storage::StorageError) -> ErrorDetail {
    ErrorDetail::global(
        Severity::Error,
        ErrorKind::UnexpectedInternalError,
        e.to_string(),
        "inspect the database and retry".to_string(),
    )
}

fn conflict_detail(change: &PendingChange, changed_fields: &[shark_core::entities::TrackedField], note: &str) -> ErrorDetail {
    let fields: Vec<&str> = changed_fields.iter().map(|f| f.as_str()).collect();
    ErrorDetail::new(
        Severity::Warning,
        ErrorKind::ConflictResolved,
        change.record.source_path.clone(),
        format!("{} '{}' has diverging fields [{}]; {}", change.entity_kind, change.key, fields.join(", "), note),
        "review the file and database values and confirm the resolution".to_string(),
    )
}

fn apply_insert(conn: &Connection, change: &PendingChange) -> shark_storage::Result<()> {
    let now = Utc::now();
    match change.entity_kind {
        EntityKind::Epic => epic::create(conn, &record_as_epic(&change.record, now, None)),
        EntityKind::Feature => feature::create(conn, &record_as_feature(&change.record, now, None)),
        EntityKind::Task => task::create(conn, &record_as_task(&change.record, now, None)),
    }
}

/// `epic::update`/`feature::update`/`task::update` overwrite the whole row,
/// not a sparse field list, so a frontmatter `status: None` (leave the
/// database's status alone) has to be resolved against the row's current
/// status before the overwrite, not against a hard-coded default — otherwise
/// an update triggered by some other field changing would reset status back
/// to `backlog` on every entity whose frontmatter omits it.
fn apply_update(conn: &Connection, change: &PendingChange) -> shark_storage::Result<()> {
    let now = Utc::now();
    match change.entity_kind {
        EntityKind::Epic => {
            let key = EpicKey::parse(&change.key).expect("classified by PatternMatcher");
            let existing_status = epic::get_by_key(conn, &key)?.map(|e| e.status);
            epic::update(conn, &record_as_epic(&change.record, now, existing_status))
        }
        EntityKind::Feature => {
            let key = FeatureKey::parse(&change.key).expect("classified by PatternMatcher");
            let existing_status = feature::get_by_key(conn, &key)?.map(|f| f.status);
            feature::update(conn, &record_as_feature(&change.record, now, existing_status))
        }
        EntityKind::Task => {
            let key = TaskKey::parse(&change.key).expect("classified by PatternMatcher");
            let existing_status = task::get_by_key(conn, &key)?.map(|t| t.status);
            task::update(conn, &record_as_task(&change.record, now, existing_status))
        }
    }
}

fn record_as_epic(record: &ParsedRecord, now: chrono::DateTime<Utc>, existing_status: Option<String>) -> Epic {
    Epic {
        key: EpicKey::parse(&record.key).expect("classified by PatternMatcher"),
        title: record.title.clone(),
        description: record.description.clone(),
        status: record.status.clone().or(existing_status).unwrap_or_else(|| "backlog".to_string()),
        priority: record.priority.clone(),
        business_value: record.business_value.clone(),
        file_path: Some(record.source_path.clone()),
        slug: shark_core::slug::slugify(&record.title),
        created_at: now,
        updated_at: now,
    }
}

fn record_as_feature(
    record: &ParsedRecord,
    now: chrono::DateTime<Utc>,
    existing_status: Option<String>,
) -> Feature {
    let key = FeatureKey::parse(&record.key).expect("classified by PatternMatcher");
    Feature {
        epic_key: key.epic_key(),
        key,
        title: record.title.clone(),
        description: record.description.clone(),
        status: record.status.clone().or(existing_status).unwrap_or_else(|| "backlog".to_string()),
        priority: record.priority.clone(),
        file_path: Some(record.source_path.clone()),
        slug: shark_core::slug::slugify(&record.title),
        created_at: now,
        updated_at: now,
    }
}

const DEFAULT_TASK_PRIORITY: u8 = 5;

fn record_as_task(record: &ParsedRecord, now: chrono::DateTime<Utc>, existing_status: Option<String>) -> Task {
    let key = TaskKey::parse(&record.key).expect("classified by PatternMatcher");
    let depends_on = record.depends_on.iter().filter_map(|s| TaskKey::parse(s).ok()).collect();
    let priority = record
        .priority
        .as_deref()
        .and_then(|p| p.parse::<u8>().ok())
        .unwrap_or(DEFAULT_TASK_PRIORITY);
    Task {
        feature_key: key.feature_key(),
        key,
        title: record.title.clone(),
        description: record.description.clone(),
        status: record.status.clone().or(existing_status).unwrap_or_else(|| "backlog".to_string()),
        priority,
        assigned_agent: record.assigned_agent.clone().unwrap_or_default(),
        depends_on,
        estimated_time: record.estimated_time.clone(),
        file_path: Some(record.source_path.clone()),
        created_at: now,
        updated_at: now,
    }
}

/// Ensures `parent_kind`/`parent_key` exists, creating ancestors as needed
/// with a title derived from the key (the `create_missing` option). Does not
/// synthesize tasks referenced via `depends_on` — see DESIGN.md.
fn synthesize_ancestors(conn: &Connection, parent_kind: EntityKind, parent_key: &str) -> shark_storage::Result<()> {
    match parent_kind {
        EntityKind::Epic => {
            let key = EpicKey::parse(parent_key).expect("validated by caller");
            if !epic::exists(conn, &key)? {
                let now = Utc::now();
                epic::create(
                    conn,
                    &Epic {
                        key: key.clone(),
                        title: parent_key.to_string(),
                        description: None,
                        status: "backlog".to_string(),
                        priority: None,
                        business_value: None,
                        file_path: None,
                        slug: shark_core::slug::slugify(parent_key),
                        created_at: now,
                        updated_at: now,
                    },
                )?;
            }
        }
        EntityKind::Feature => {
            let key = FeatureKey::parse(parent_key).expect("validated by caller");
            let epic_key = key.epic_key();
            if !epic::exists(conn, &epic_key)? {
                synthesize_ancestors(conn, EntityKind::Epic, epic_key.as_str())?;
            }
            if !feature::exists(conn, &key)? {
                let now = Utc::now();
                feature::create(
                    conn,
                    &Feature {
                        key: key.clone(),
                        epic_key,
                        title: parent_key.to_string(),
                        description: None,
                        status: "backlog".to_string(),
                        priority: None,
                        file_path: None,
                        slug: shark_core::slug::slugify(parent_key),
                        created_at: now,
                        updated_at: now,
                    },
                )?;
            }
        }
        EntityKind::Task => {}
    }
    Ok(())
}

/// Reconciles `related_documents: [{title, path}]` from task/feature/epic
/// frontmatter, after all parent rows exist.
/// Links every `related_documents` entry to its owning entity, returning the
/// path of each document actually linked so the caller can emit one
/// `DocumentLinked` event per link.
fn reconcile_documents(conn: &Connection, change: &PendingChange) -> shark_storage::Result<Vec<PathBuf>> {
    let mut linked = Vec::new();
    for related in &change.record.related_documents {
        let doc: Document = document::get_or_create(conn, &related.title, &related.path)?;
        match change.entity_kind {
            EntityKind::Epic => {
                let key = EpicKey::parse(&change.key).expect("classified by PatternMatcher");
                document::link_to_epic(conn, &key, doc.id)?;
            }
            EntityKind::Feature => {
                let key = FeatureKey::parse(&change.key).expect("classified by PatternMatcher");
                document::link_to_feature(conn, &key, doc.id)?;
            }
            EntityKind::Task => {
                let key = TaskKey::parse(&change.key).expect("classified by PatternMatcher");
                document::link_to_task(conn, &key, doc.id)?;
            }
        }
        linked.push(doc.file_path);
    }
    Ok(linked)
}
