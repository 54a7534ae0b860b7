use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, OptionalExtension, Result, Row};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::domain::task::{TaskRecord, TaskStatus};

pub const CURRENT_SCHEMA_VERSION: i64 = 2;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 2] = [
    Migration {
        version: 1,
        name: "baseline_tasks_v1",
        sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    list_name TEXT NOT NULL,
    due_time TEXT,
    notes TEXT,
    status TEXT NOT NULL
);
"#,
    },
    Migration {
        version: 2,
        name: "task_indexes_v1",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_tasks_list_name ON tasks(list_name);
CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
CREATE INDEX IF NOT EXISTS idx_tasks_due_time ON tasks(due_time);
"#,
    },
];

pub fn open_connection(path: &str) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    configure_for_speed(&conn)?;
    apply_migrations(&mut conn)?;
    Ok(conn)
}

fn configure_for_speed(conn: &Connection) -> Result<()> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "foreign_keys", "ON")?;
    conn.pragma_update(None::<DatabaseName>, "temp_store", "MEMORY")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, now_utc_rfc3339()],
        )?;
    }

    tx.execute(
        r#"
INSERT INTO meta (key, value)
VALUES ('schema_version', ?1)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    tx.commit()
}

pub fn now_utc_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .expect("RFC3339 formatting for UTC timestamp should never fail")
}

const UPSERT_TASK_SQL: &str = r#"
INSERT INTO tasks (id, title, list_name, due_time, notes, status)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
ON CONFLICT(id) DO UPDATE SET
    title = excluded.title,
    list_name = excluded.list_name,
    due_time = excluded.due_time,
    notes = excluded.notes,
    status = excluded.status
"#;

fn task_from_row(row: &Row<'_>) -> Result<TaskRecord> {
    let raw_status: String = row.get(5)?;
    let status = raw_status.parse::<TaskStatus>().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(err))
    })?;
    Ok(TaskRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        list_name: row.get(2)?,
        due_time: row.get(3)?,
        notes: row.get(4)?,
        status,
    })
}

pub fn upsert_task(conn: &Connection, task: &TaskRecord) -> Result<()> {
    conn.execute(
        UPSERT_TASK_SQL,
        params![
            task.id,
            task.title,
            task.list_name,
            task.due_time,
            task.notes,
            task.status.as_str()
        ],
    )?;
    Ok(())
}

pub fn get_task(conn: &Connection, id: &str) -> Result<Option<TaskRecord>> {
    conn.query_row(
        r#"
SELECT id, title, list_name, due_time, notes, status
FROM tasks
WHERE id = ?1
"#,
        params![id],
        task_from_row,
    )
    .optional()
}

pub fn list_tasks(conn: &Connection) -> Result<Vec<TaskRecord>> {
    let mut stmt = conn.prepare(
        r#"
SELECT id, title, list_name, due_time, notes, status
FROM tasks
ORDER BY list_name ASC, due_time IS NULL, due_time ASC, title ASC, id ASC
"#,
    )?;

    let mut rows = stmt.query([])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(task_from_row(row)?);
    }

    Ok(result)
}

/// Returns `true` when a row was removed.
pub fn delete_task(conn: &Connection, id: &str) -> Result<bool> {
    let removed = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
    Ok(removed > 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOutcome {
    Swapped,
    MissingOriginal,
}

/// Replaces the row `old_id` with `replacement` inside one transaction.
/// Nothing is written unless the original row exists and both statements
/// succeed.
pub fn swap_task_identity(
    conn: &Connection,
    old_id: &str,
    replacement: &TaskRecord,
) -> Result<SwapOutcome> {
    let tx = conn.unchecked_transaction()?;
    let removed = tx.execute("DELETE FROM tasks WHERE id = ?1", params![old_id])?;
    if removed == 0 {
        tx.rollback()?;
        return Ok(SwapOutcome::MissingOriginal);
    }
    tx.execute(
        UPSERT_TASK_SQL,
        params![
            replacement.id,
            replacement.title,
            replacement.list_name,
            replacement.due_time,
            replacement.notes,
            replacement.status.as_str()
        ],
    )?;
    tx.commit()?;
    Ok(SwapOutcome::Swapped)
}

pub fn distinct_list_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT list_name FROM tasks ORDER BY list_name ASC")?;
    let mut rows = stmt.query([])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        result.push(row.get(0)?);
    }
    Ok(result)
}

pub fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM meta WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_meta(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        r#"
INSERT INTO meta (key, value)
VALUES (?1, ?2)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![key, value],
    )?;
    Ok(())
}
