//! Task repository: CRUD over the `tasks` table plus `next()`, the query
//! behind `shark task next` that an external worker polls for unblocked
//! work — queue semantics beyond that poll are explicitly out of scope.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use shark_core::entities::Task;
use shark_core::keys::{FeatureKey, TaskKey};

use crate::error::{Result, StorageError};
use crate::repositories::feature;

/// The workflow status a dependency must reach before it no longer blocks
/// its dependents. Matches the last entry of the default workflow's
/// `statuses` list, which ends in `done`; a project with a differently
/// named terminal status should not rely on `next()` until that lands as a
/// configurable setting (see DESIGN.md).
const TERMINAL_STATUS: &str = "done";

pub fn exists(conn: &Connection, key: &TaskKey) -> Result<bool> {
    Ok(conn
        .query_row("SELECT 1 FROM tasks WHERE key = ?1", params![key.as_str()], |_| Ok(()))
        .optional()?
        .is_some())
}

pub fn get_by_key(conn: &Connection, key: &TaskKey) -> Result<Option<Task>> {
    conn.query_row(
        "SELECT key, feature_key, title, description, status, priority,
                assigned_agent, depends_on, estimated_time, file_path,
                created_at, updated_at
         FROM tasks WHERE key = ?1",
        params![key.as_str()],
        row_to_task,
    )
    .optional()
    .map_err(Into::into)
}

pub fn list(conn: &Connection) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(
        "SELECT key, feature_key, title, description, status, priority,
                assigned_agent, depends_on, estimated_time, file_path,
                created_at, updated_at
         FROM tasks ORDER BY key",
    )?;
    let rows = stmt.query_map([], row_to_task)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
}

pub fn list_for_feature(conn: &Connection, feature_key: &FeatureKey) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(
        "SELECT key, feature_key, title, description, status, priority,
                assigned_agent, depends_on, estimated_time, file_path,
                created_at, updated_at
         FROM tasks WHERE feature_key = ?1 ORDER BY key",
    )?;
    let rows = stmt.query_map(params![feature_key.as_str()], row_to_task)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
}

pub fn create(conn: &Connection, task: &Task) -> Result<()> {
    if !feature::exists(conn, &task.feature_key)? {
        return Err(StorageError::MissingParent {
            parent_kind: "feature",
            parent_key: task.feature_key.as_str().to_string(),
            child_kind: "task",
            child_key: task.key.as_str().to_string(),
        });
    }
    conn.execute(
        "INSERT INTO tasks
            (key, feature_key, title, description, status, priority,
             assigned_agent, depends_on, estimated_time, file_path,
             created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            task.key.as_str(),
            task.feature_key.as_str(),
            task.title,
            task.description,
            task.status,
            task.priority,
            task.assigned_agent,
            encode_depends_on(&task.depends_on)?,
            task.estimated_time,
            task.file_path.as_ref().map(|p| p.display().to_string()),
            task.created_at.to_rfc3339(),
            task.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn update(conn: &Connection, task: &Task) -> Result<()> {
    conn.execute(
        "UPDATE tasks SET title = ?2, description = ?3, status = ?4, priority = ?5,
                assigned_agent = ?6, depends_on = ?7, estimated_time = ?8,
                file_path = ?9, updated_at = ?10
         WHERE key = ?1",
        params![
            task.key.as_str(),
            task.title,
            task.description,
            task.status,
            task.priority,
            task.assigned_agent,
            encode_depends_on(&task.depends_on)?,
            task.estimated_time,
            task.file_path.as_ref().map(|p| p.display().to_string()),
            Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// The highest-priority task in `status` whose dependencies have all
/// reached [`TERMINAL_STATUS`], breaking ties by key for determinism.
pub fn next(conn: &Connection, status: &str) -> Result<Option<Task>> {
    let mut stmt = conn.prepare(
        "SELECT key, feature_key, title, description, status, priority,
                assigned_agent, depends_on, estimated_time, file_path,
                created_at, updated_at
         FROM tasks WHERE status = ?1 ORDER BY priority DESC, key ASC",
    )?;
    let candidates = stmt
        .query_map(params![status], row_to_task)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for candidate in candidates {
        if is_unblocked(conn, &candidate)? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

fn is_unblocked(conn: &Connection, task: &Task) -> Result<bool> {
    for dep in &task.depends_on {
        match get_by_key(conn, dep)? {
            Some(dep_task) if dep_task.status == TERMINAL_STATUS => continue,
            _ => return Ok(false),
        }
    }
    Ok(true)
}

fn encode_depends_on(depends_on: &[TaskKey]) -> Result<String> {
    let raw: Vec<&str> = depends_on.iter().map(|k| k.as_str()).collect();
    Ok(serde_json::to_string(&raw)?)
}

fn decode_depends_on(raw: &str) -> rusqlite::Result<Vec<TaskKey>> {
    let raw: Vec<String> = serde_json::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(raw
        .into_iter()
        .filter_map(|s| TaskKey::parse(&s).ok())
        .collect())
}

fn row_to_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    let depends_on: String = row.get(7)?;
    let file_path: Option<String> = row.get(9)?;
    let created_at: String = row.get(10)?;
    let updated_at: String = row.get(11)?;
    Ok(Task {
        key: TaskKey::parse(&row.get::<_, String>(0)?)
            .expect("key stored in the database is always valid"),
        feature_key: FeatureKey::parse(&row.get::<_, String>(1)?)
            .expect("key stored in the database is always valid"),
        title: row.get(2)?,
        description: row.get(3)?,
        status: row.get(4)?,
        priority: row.get(5)?,
        assigned_agent: row.get(6)?,
        depends_on: decode_depends_on(&depends_on)?,
        estimated_time: row.get(8)?,
        file_path: file_path.map(std::path::PathBuf::from),
        created_at: crate::parse_timestamp(&created_at),
        updated_at: crate::parse_timestamp(&updated_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Storage;
    use crate::repositories::epic;
    use shark_core::keys::EpicKey;
    use shark_core::slug::slugify;

    fn seed(conn: &Connection) -> FeatureKey {
        let now = Utc::now();
        epic::create(
            conn,
            &shark_core::entities::Epic {
                key: EpicKey::parse("E01").unwrap(),
                title: "Epic".to_string(),
                description: None,
                status: "backlog".to_string(),
                priority: None,
                business_value: None,
                file_path: None,
                slug: slugify("Epic"),
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();
        let feature_key = FeatureKey::parse("E01-F01").unwrap();
        feature::create(
            conn,
            &shark_core::entities::Feature {
                key: feature_key.clone(),
                epic_key: EpicKey::parse("E01").unwrap(),
                title: "Feature".to_string(),
                description: None,
                status: "backlog".to_string(),
                priority: None,
                file_path: None,
                slug: slugify("Feature"),
                created_at: now,
                updated_at: now,
            },
        )
        .unwrap();
        feature_key
    }

    fn sample_task(key: &str, feature_key: &FeatureKey, priority: u8, depends_on: Vec<&str>) -> Task {
        let now = Utc::now();
        Task {
            key: TaskKey::parse(key).unwrap(),
            feature_key: feature_key.clone(),
            title: key.to_string(),
            description: None,
            status: "backlog".to_string(),
            priority,
            assigned_agent: String::new(),
            depends_on: depends_on.into_iter().map(|k| TaskKey::parse(k).unwrap()).collect(),
            estimated_time: None,
            file_path: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn next_skips_blocked_tasks() {
        let storage = Storage::open_in_memory().unwrap();
        let conn = storage.connection();
        let feature_key = seed(conn);

        let blocker = sample_task("T-E01-F01-001", &feature_key, 5, vec![]);
        create(conn, &blocker).unwrap();
        let blocked = sample_task("T-E01-F01-002", &feature_key, 9, vec!["T-E01-F01-001"]);
        create(conn, &blocked).unwrap();

        let picked = next(conn, "backlog").unwrap().unwrap();
        assert_eq!(picked.key.as_str(), "T-E01-F01-001");
    }

    #[test]
    fn next_prefers_higher_priority_among_unblocked() {
        let storage = Storage::open_in_memory().unwrap();
        let conn = storage.connection();
        let feature_key = seed(conn);

        create(conn, &sample_task("T-E01-F01-001", &feature_key, 3, vec![])).unwrap();
        create(conn, &sample_task("T-E01-F01-002", &feature_key, 8, vec![])).unwrap();

        let picked = next(conn, "backlog").unwrap().unwrap();
        assert_eq!(picked.key.as_str(), "T-E01-F01-002");
    }

    #[test]
    fn next_unblocks_once_dependency_is_done() {
        let storage = Storage::open_in_memory().unwrap();
        let conn = storage.connection();
        let feature_key = seed(conn);

        let mut blocker = sample_task("T-E01-F01-001", &feature_key, 5, vec![]);
        blocker.status = "done".to_string();
        create(conn, &blocker).unwrap();
        create(
            conn,
            &sample_task("T-E01-F01-002", &feature_key, 5, vec!["T-E01-F01-001"]),
        )
        .unwrap();

        let picked = next(conn, "backlog").unwrap().unwrap();
        assert_eq!(picked.key.as_str(), "T-E01-F01-002");
    }
}
