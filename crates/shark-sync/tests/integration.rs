//! End-to-end sync runs against a real temp directory tree and an
//! in-memory database.

use std::fs;
use std::path::Path;

use shark_core::config::{Config, ConflictStrategy};
use shark_core::entities::Epic;
use shark_core::events::EventKind;
use shark_core::keys::EpicKey;
use shark_core::run_status::RunStatus;
use shark_storage::repositories::{epic, feature, task};
use shark_storage::Storage;
use shark_sync::{run, SyncOptions};

fn write_happy_path(root: &Path) {
    fs::create_dir_all(root.join("E01-auth/E01-F01-login/tasks")).unwrap();
    fs::write(root.join("E01-auth/epic.md"), "---\ntitle: Authentication\n---\n# Authentication\n").unwrap();
    fs::write(root.join("E01-auth/E01-F01-login/feature.md"), "---\ntitle: Login\n---\n# Login\n").unwrap();
    fs::write(
        root.join("E01-auth/E01-F01-login/tasks/T-E01-F01-001.md"),
        "---\ntitle: Build form\nassigned_agent: alice\n---\n# Build form\n",
    )
    .unwrap();
    fs::write(
        root.join("E01-auth/E01-F01-login/tasks/T-E01-F01-002.md"),
        "---\ntitle: Wire API\nassigned_agent: bob\n---\n# Wire API\n",
    )
    .unwrap();
}

#[test]
fn happy_path_imports_four_entities() {
    let dir = tempfile::tempdir().unwrap();
    write_happy_path(dir.path());
    let mut storage = Storage::open_in_memory().unwrap();
    let config = Config::default();
    let options = SyncOptions { folder: Some(dir.path().to_path_buf()), ..Default::default() };

    let outcome = run(&mut storage, &config, &options);
    assert_eq!(outcome.status, RunStatus::Success);

    let imported =
        outcome.events.iter().filter(|e| matches!(e.kind, EventKind::EntityImported { .. })).count();
    assert_eq!(imported, 4);
    assert_eq!(epic::list(storage.connection()).unwrap().len(), 1);
    assert_eq!(task::list(storage.connection()).unwrap().len(), 2);
}

#[test]
fn dry_run_leaves_database_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    write_happy_path(dir.path());
    let mut storage = Storage::open_in_memory().unwrap();
    let config = Config::default();
    let options = SyncOptions { folder: Some(dir.path().to_path_buf()), dry_run: true, ..Default::default() };

    let outcome = run(&mut storage, &config, &options);
    assert_eq!(outcome.status, RunStatus::Success);
    assert!(outcome.dry_run);
    assert!(epic::list(storage.connection()).unwrap().is_empty());
}

#[test]
fn missing_parent_without_create_missing_skips_child() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("E01-auth/E01-F01-login/tasks")).unwrap();
    fs::write(
        dir.path().join("E01-auth/E01-F01-login/tasks/T-E01-F01-001.md"),
        "---\ntitle: Build form\nassigned_agent: alice\n---\n# Build form\n",
    )
    .unwrap();
    let mut storage = Storage::open_in_memory().unwrap();
    let config = Config::default();
    let options = SyncOptions { folder: Some(dir.path().to_path_buf()), ..Default::default() };

    let outcome = run(&mut storage, &config, &options);
    assert_eq!(outcome.status, RunStatus::Success);
    assert!(task::list(storage.connection()).unwrap().is_empty());
}

#[test]
fn create_missing_synthesizes_ancestors() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("E01-auth/E01-F01-login/tasks")).unwrap();
    fs::write(
        dir.path().join("E01-auth/E01-F01-login/tasks/T-E01-F01-001.md"),
        "---\ntitle: Build form\nassigned_agent: alice\n---\n# Build form\n",
    )
    .unwrap();
    let mut storage = Storage::open_in_memory().unwrap();
    let config = Config::default();
    let options =
        SyncOptions { folder: Some(dir.path().to_path_buf()), create_missing: true, ..Default::default() };

    let outcome = run(&mut storage, &config, &options);
    assert_eq!(outcome.status, RunStatus::Success);
    assert_eq!(epic::list(storage.connection()).unwrap().len(), 1);
    assert_eq!(feature::list(storage.connection()).unwrap().len(), 1);
    assert_eq!(task::list(storage.connection()).unwrap().len(), 1);
}

#[test]
fn conflict_abort_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    write_happy_path(dir.path());
    let mut storage = Storage::open_in_memory().unwrap();
    {
        let conn = storage.connection();
        let past = chrono::Utc::now() - chrono::Duration::days(1);
        let future = chrono::Utc::now() + chrono::Duration::days(1);
        epic::create(
            conn,
            &Epic {
                key: EpicKey::parse("E01").unwrap(),
                title: "Old Title".to_string(),
                description: None,
                status: "backlog".to_string(),
                priority: None,
                business_value: None,
                file_path: None,
                slug: "old-title".to_string(),
                created_at: past,
                updated_at: future,
            },
        )
        .unwrap();
    }
    let config = Config::default();
    let options = SyncOptions {
        folder: Some(dir.path().to_path_buf()),
        conflict_strategy: Some(ConflictStrategy::Abort),
        ..Default::default()
    };

    let outcome = run(&mut storage, &config, &options);
    assert_eq!(outcome.status, RunStatus::Failure);
    let epic = epic::get_by_key(storage.connection(), &EpicKey::parse("E01").unwrap()).unwrap().unwrap();
    assert_eq!(epic.title, "Old Title");
}

#[test]
fn update_preserves_status_when_frontmatter_omits_it() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("E01-auth")).unwrap();
    fs::write(dir.path().join("E01-auth/epic.md"), "---\ntitle: Authentication Rework\n---\n# Authentication Rework\n")
        .unwrap();
    let mut storage = Storage::open_in_memory().unwrap();
    {
        let conn = storage.connection();
        let past = chrono::Utc::now() - chrono::Duration::days(1);
        epic::create(
            conn,
            &Epic {
                key: EpicKey::parse("E01").unwrap(),
                title: "Authentication".to_string(),
                description: None,
                status: "done".to_string(),
                priority: None,
                business_value: None,
                file_path: None,
                slug: "authentication".to_string(),
                created_at: past,
                updated_at: past,
            },
        )
        .unwrap();
    }
    let config = Config::default();
    let options = SyncOptions { folder: Some(dir.path().to_path_buf()), ..Default::default() };

    let outcome = run(&mut storage, &config, &options);
    assert_eq!(outcome.status, RunStatus::Success);
    let epic = epic::get_by_key(storage.connection(), &EpicKey::parse("E01").unwrap()).unwrap().unwrap();
    assert_eq!(epic.title, "Authentication Rework");
    assert_eq!(epic.status, "done");
}
