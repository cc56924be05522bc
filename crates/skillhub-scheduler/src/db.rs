use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{types::Type, Connection, OptionalExtension};
use tracing::{debug, instrument};

use crate::error::{Result, SchedulerError};
use crate::store::TaskStore;
use crate::types::ScheduledTask;

/// Initialise the scheduler schema in `conn`.
///
/// Creates the `scheduled_tasks` table (idempotent) and an index on
/// `next_run` for due-task polling.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS scheduled_tasks (
            id               TEXT    NOT NULL PRIMARY KEY,
            skill_id         TEXT    NOT NULL,
            skill_name       TEXT    NOT NULL,
            cron_expression  TEXT    NOT NULL,
            parameters       TEXT,               -- opaque payload or NULL
            enabled          INTEGER NOT NULL DEFAULT 1,   -- 0/1
            next_run         TEXT,               -- RFC 3339 or NULL
            last_run         TEXT,               -- RFC 3339 or NULL
            run_count        INTEGER NOT NULL DEFAULT 0,
            created_by       TEXT,
            created_at       TEXT    NOT NULL,
            updated_at       TEXT    NOT NULL
        ) STRICT;

        CREATE INDEX IF NOT EXISTS idx_scheduled_tasks_next_run
            ON scheduled_tasks (enabled, next_run);
        ",
    )?;
    Ok(())
}

const SELECT_COLUMNS: &str = "SELECT id, skill_id, skill_name, cron_expression, parameters,
        enabled, next_run, last_run, run_count, created_by, created_at, updated_at
     FROM scheduled_tasks";

/// SQLite-backed [`TaskStore`].
///
/// Wraps a single connection in a `Mutex`; enough for the human-paced
/// dashboard traffic this store serves.
pub struct SqliteTaskStore {
    db: Mutex<Connection>,
}

impl SqliteTaskStore {
    /// Wrap `conn`, creating the schema if needed.
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Fresh in-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|_| SchedulerError::Storage("task store lock poisoned".to_string()))
    }
}

impl TaskStore for SqliteTaskStore {
    #[instrument(skip(self, task), fields(id = %task.id))]
    fn insert(&self, task: &ScheduledTask) -> Result<()> {
        let db = self.conn()?;
        db.execute(
            "INSERT INTO scheduled_tasks
             (id, skill_id, skill_name, cron_expression, parameters, enabled,
              next_run, last_run, run_count, created_by, created_at, updated_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12)",
            rusqlite::params![
                task.id,
                task.skill_id,
                task.skill_name,
                task.cron_expression,
                task.parameters,
                task.enabled,
                task.next_run.map(to_text),
                task.last_run.map(to_text),
                task.run_count,
                task.created_by.as_ref().map(|u| u.as_str()),
                to_text(task.created_at),
                to_text(task.updated_at),
            ],
        )?;
        debug!("task row inserted");
        Ok(())
    }

    #[instrument(skip(self))]
    fn get(&self, id: &str) -> Result<Option<ScheduledTask>> {
        let db = self.conn()?;
        let task = db
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                [id],
                row_to_task,
            )
            .optional()?;
        Ok(task)
    }

    #[instrument(skip(self, task), fields(id = %task.id))]
    fn update(&self, task: &ScheduledTask) -> Result<()> {
        let db = self.conn()?;
        let n = db.execute(
            "UPDATE scheduled_tasks
             SET skill_id = ?1, skill_name = ?2, cron_expression = ?3,
                 parameters = ?4, enabled = ?5, next_run = ?6, last_run = ?7,
                 run_count = ?8, created_by = ?9, updated_at = ?10
             WHERE id = ?11",
            rusqlite::params![
                task.skill_id,
                task.skill_name,
                task.cron_expression,
                task.parameters,
                task.enabled,
                task.next_run.map(to_text),
                task.last_run.map(to_text),
                task.run_count,
                task.created_by.as_ref().map(|u| u.as_str()),
                to_text(task.updated_at),
                task.id,
            ],
        )?;
        if n == 0 {
            return Err(SchedulerError::NotFound {
                id: task.id.clone(),
            });
        }
        Ok(())
    }

    #[instrument(skip(self))]
    fn delete(&self, id: &str) -> Result<()> {
        let db = self.conn()?;
        let n = db.execute("DELETE FROM scheduled_tasks WHERE id = ?1", [id])?;
        if n == 0 {
            return Err(SchedulerError::NotFound { id: id.to_string() });
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<ScheduledTask>> {
        let db = self.conn()?;
        let mut stmt = db.prepare(&format!("{SELECT_COLUMNS} ORDER BY created_at, id"))?;
        let tasks = stmt
            .query_map([], row_to_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }
}

/// RFC 3339 with only as many fractional digits as needed, so values read
/// back compare equal to what was written.
fn to_text(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_time(idx: usize, text: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_opt_time(idx: usize, text: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    text.map(|t| parse_time(idx, &t)).transpose()
}

/// Map a SQLite row to a `ScheduledTask`.
fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScheduledTask> {
    Ok(ScheduledTask {
        id: row.get(0)?,
        skill_id: row.get(1)?,
        skill_name: row.get(2)?,
        cron_expression: row.get(3)?,
        parameters: row.get(4)?,
        enabled: row.get(5)?,
        next_run: parse_opt_time(6, row.get(6)?)?,
        last_run: parse_opt_time(7, row.get(7)?)?,
        run_count: row.get(8)?,
        created_by: row.get::<_, Option<String>>(9)?.map(Into::into),
        created_at: parse_time(10, &row.get::<_, String>(10)?)?,
        updated_at: parse_time(11, &row.get::<_, String>(11)?)?,
    })
}
