use crate::entities::{Model, SCHEMAS};
use crate::error::{ImportError, Result};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::path::Path;

// ============================================================================
// SETUP
// ============================================================================

/// Open (or create) the database file and make sure every table exists.
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // NetBlock rows cascade with their Location
    conn.pragma_update(None, "foreign_keys", true)?;

    // ==========================================================================
    // Dataset tables
    // ==========================================================================
    for schema in SCHEMAS {
        conn.execute(schema, [])?;
    }

    // ==========================================================================
    // Import run log (one row per command invocation)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS import_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            run_id TEXT UNIQUE NOT NULL,
            dataset TEXT NOT NULL,
            started_at TEXT NOT NULL,
            finished_at TEXT,
            status TEXT NOT NULL,
            imported INTEGER NOT NULL DEFAULT 0,
            wiped INTEGER NOT NULL DEFAULT 0,
            error TEXT,
            details TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Advisory locks (one row per dataset being loaded)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS import_locks (
            dataset TEXT PRIMARY KEY,
            holder TEXT NOT NULL,
            acquired_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_runs_dataset ON import_runs(dataset, started_at)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_net_blocks_location ON net_blocks(location_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_net_blocks_start ON net_blocks(start_num)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// ENTITY STORE
// ============================================================================

/// EntityStore - the bulk persistence capability importers write through
pub trait EntityStore<E> {
    /// Rows currently stored
    fn count(&mut self) -> Result<i64>;

    /// Delete every row, returning how many went
    fn wipe(&mut self) -> Result<usize>;

    /// Insert a batch in one round trip, all or nothing
    fn insert_batch(&mut self, batch: &[E]) -> Result<usize>;
}

/// SQLite table for entity `E`.
pub struct SqliteStore<'c, E> {
    conn: &'c Connection,
    insert_sql: String,
    _entity: PhantomData<E>,
}

impl<'c, E: Model> SqliteStore<'c, E> {
    pub fn new(conn: &'c Connection) -> Self {
        let placeholders: Vec<String> = (1..=E::COLUMNS.len()).map(|i| format!("?{}", i)).collect();
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            E::TABLE,
            E::COLUMNS.join(", "),
            placeholders.join(", ")
        );

        SqliteStore {
            conn,
            insert_sql,
            _entity: PhantomData,
        }
    }
}

impl<E: Model> EntityStore<E> for SqliteStore<'_, E> {
    fn count(&mut self) -> Result<i64> {
        verify_count(self.conn, E::TABLE)
    }

    fn wipe(&mut self) -> Result<usize> {
        let deleted = self.conn.execute(&format!("DELETE FROM {}", E::TABLE), [])?;
        Ok(deleted)
    }

    fn insert_batch(&mut self, batch: &[E]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(&self.insert_sql)?;
            for entity in batch {
                stmt.execute(params_from_iter(entity.to_row()))?;
            }
        }
        tx.commit()?;

        debug!("Inserted batch of {} into {}", batch.len(), E::TABLE);
        Ok(batch.len())
    }
}

pub fn verify_count(conn: &Connection, table: &str) -> Result<i64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;

    Ok(count)
}

/// Rows of `E` in default order, at most `limit` of them.
pub fn fetch_all<E: Model>(conn: &Connection, limit: Option<usize>) -> Result<Vec<E>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {} ORDER BY {} LIMIT ?1",
        E::COLUMNS.join(", "),
        E::TABLE,
        E::ORDER_BY
    ))?;

    let limit = limit.map(|n| n as i64).unwrap_or(-1);
    let rows = stmt
        .query_map([limit], |row| E::from_row(row))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(rows)
}

// ============================================================================
// IMPORT RUN LOG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<RunStatus> {
        match raw {
            "running" => Some(RunStatus::Running),
            "succeeded" => Some(RunStatus::Succeeded),
            "failed" => Some(RunStatus::Failed),
            _ => None,
        }
    }
}

/// One command invocation, as recorded in import_runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRun {
    pub run_id: String,
    pub dataset: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub imported: i64,
    pub wiped: i64,
    pub error: Option<String>,
    pub details: serde_json::Value,
}

impl ImportRun {
    pub fn new(dataset: &str, details: serde_json::Value) -> Self {
        ImportRun {
            run_id: uuid::Uuid::new_v4().to_string(),
            dataset: dataset.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            status: RunStatus::Running,
            imported: 0,
            wiped: 0,
            error: None,
            details,
        }
    }
}

/// Record a run as started.
pub fn insert_run(conn: &Connection, run: &ImportRun) -> Result<()> {
    let details_json = serde_json::to_string(&run.details)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    conn.execute(
        "INSERT INTO import_runs (
            run_id, dataset, started_at, status, details
        ) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            run.run_id,
            run.dataset,
            run.started_at.to_rfc3339(),
            run.status.as_str(),
            details_json,
        ],
    )?;

    Ok(())
}

/// Mark a run succeeded with its counts.
pub fn complete_run(conn: &Connection, run: &mut ImportRun, imported: usize, wiped: usize) -> Result<()> {
    run.status = RunStatus::Succeeded;
    run.imported = imported as i64;
    run.wiped = wiped as i64;
    run.finished_at = Some(Utc::now());
    update_run(conn, run)
}

/// Mark a run failed with the error that stopped it.
pub fn fail_run(conn: &Connection, run: &mut ImportRun, error: &ImportError) -> Result<()> {
    run.status = RunStatus::Failed;
    run.error = Some(format!("[{}] {}", error.kind(), error));
    run.finished_at = Some(Utc::now());
    update_run(conn, run)
}

fn update_run(conn: &Connection, run: &ImportRun) -> Result<()> {
    conn.execute(
        "UPDATE import_runs
         SET finished_at = ?1, status = ?2, imported = ?3, wiped = ?4, error = ?5
         WHERE run_id = ?6",
        params![
            run.finished_at.map(|dt| dt.to_rfc3339()),
            run.status.as_str(),
            run.imported,
            run.wiped,
            run.error,
            run.run_id,
        ],
    )?;

    Ok(())
}

/// Most recent runs first.
pub fn get_runs(conn: &Connection, limit: usize) -> Result<Vec<ImportRun>> {
    let mut stmt = conn.prepare(
        "SELECT run_id, dataset, started_at, finished_at, status, imported, wiped, error, details
         FROM import_runs
         ORDER BY id DESC
         LIMIT ?1",
    )?;

    let runs = stmt
        .query_map([limit as i64], |row| {
            let started_at: String = row.get(2)?;
            let finished_at: Option<String> = row.get(3)?;
            let status: String = row.get(4)?;
            let details_json: String = row.get(8)?;

            Ok(ImportRun {
                run_id: row.get(0)?,
                dataset: row.get(1)?,
                started_at: DateTime::parse_from_rfc3339(&started_at)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?
                    .with_timezone(&Utc),
                finished_at: finished_at
                    .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                    .map(|dt| dt.with_timezone(&Utc)),
                status: RunStatus::parse(&status).ok_or(rusqlite::Error::InvalidQuery)?,
                imported: row.get(5)?,
                wiped: row.get(6)?,
                error: row.get(7)?,
                details: serde_json::from_str(&details_json).unwrap_or_default(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(runs)
}

// ============================================================================
// ADVISORY LOCK
// ============================================================================

/// Held while a dataset is being loaded; released on drop.
#[derive(Debug)]
pub struct DatasetLock<'c> {
    conn: &'c Connection,
    dataset: String,
    holder: String,
}

impl<'c> DatasetLock<'c> {
    pub fn acquire(conn: &'c Connection, dataset: &str, holder: &str) -> Result<Self> {
        let result = conn.execute(
            "INSERT INTO import_locks (dataset, holder, acquired_at) VALUES (?1, ?2, ?3)",
            params![dataset, holder, Utc::now().to_rfc3339()],
        );

        match result {
            Ok(_) => Ok(DatasetLock {
                conn,
                dataset: dataset.to_string(),
                holder: holder.to_string(),
            }),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                let (holder, since) = conn
                    .query_row(
                        "SELECT holder, acquired_at FROM import_locks WHERE dataset = ?1",
                        [dataset],
                        |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
                    )
                    .optional()?
                    .unwrap_or_default();

                Err(ImportError::Locked {
                    dataset: dataset.to_string(),
                    holder,
                    since,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }
}

impl Drop for DatasetLock<'_> {
    fn drop(&mut self) {
        let released = self.conn.execute(
            "DELETE FROM import_locks WHERE dataset = ?1 AND holder = ?2",
            params![self.dataset, self.holder],
        );
        if let Err(e) = released {
            warn!("Could not release lock on {}: {}", self.dataset, e);
        }
    }
}

/// Clear a lock left behind by a crashed run.
pub fn force_unlock(conn: &Connection, dataset: &str) -> Result<bool> {
    let removed = conn.execute("DELETE FROM import_locks WHERE dataset = ?1", [dataset])?;
    Ok(removed > 0)
}
