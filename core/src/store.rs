//! SQLite run archive.
//!
//! RULE: Only store.rs talks to the database.
//! The engine calls store methods; it never executes SQL directly.

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::{
    error::SimResult,
    event::EventLogEntry,
    result::AnnualResult,
    types::{RunId, Year},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running   => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed    => "failed",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "completed" => RunStatus::Completed,
            "failed"    => RunStatus::Failed,
            _           => RunStatus::Running,
        }
    }
}

/// An archived run header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id:      RunId,
    pub seed:        Option<u64>,
    pub years:       u32,
    /// JSON of the `SimulationParameters` the run used.
    pub parameters:  String,
    pub version:     String,
    pub status:      RunStatus,
    pub started_at:  String,
    pub finished_at: Option<String>,
}

pub struct SimStore {
    conn: Connection,
}

impl SimStore {
    /// Open (or create) the archive database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        // WAL only matters for real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_foundation.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id: &str,
        seed: Option<u64>,
        years: u32,
        parameters_json: &str,
    ) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, years, parameters, version, status, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run_id,
                seed.map(|s| s as i64),
                years,
                parameters_json,
                env!("CARGO_PKG_VERSION"),
                RunStatus::Running.as_str(),
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn finish_run(&self, run_id: &str, status: RunStatus) -> SimResult<()> {
        self.conn.execute(
            "UPDATE run SET status = ?2, finished_at = ?3 WHERE run_id = ?1",
            params![run_id, status.as_str(), chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn run(&self, run_id: &str) -> SimResult<Option<RunRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT run_id, seed, years, parameters, version, status, started_at, finished_at
                 FROM run WHERE run_id = ?1",
                params![run_id],
                row_to_run,
            )
            .optional()?;
        Ok(record)
    }

    /// Every archived run, oldest first.
    pub fn runs(&self) -> SimResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, seed, years, parameters, version, status, started_at, finished_at
             FROM run ORDER BY started_at ASC, rowid ASC",
        )?;
        let runs = stmt
            .query_map([], row_to_run)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    pub fn run_count(&self) -> SimResult<i64> {
        let n = self
            .conn
            .query_row("SELECT COUNT(*) FROM run", [], |row| row.get(0))?;
        Ok(n)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (run_id, year, event_type, payload)
             VALUES (?1, ?2, ?3, ?4)",
            params![entry.run_id, entry.year, entry.event_type, entry.payload],
        )?;
        Ok(())
    }

    pub fn events_for_run(&self, run_id: &str) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, year, event_type, payload
             FROM event_log WHERE run_id = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id], row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn events_for_year(&self, run_id: &str, year: Year) -> SimResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, year, event_type, payload
             FROM event_log WHERE run_id = ?1 AND year = ?2
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id, year], row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // ── Results ────────────────────────────────────────────────

    /// Store a run's yearly results in one transaction.
    pub fn save_results(&self, run_id: &str, results: &[AnnualResult]) -> SimResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO annual_result (run_id, year, payload) VALUES (?1, ?2, ?3)",
            )?;
            for result in results {
                stmt.execute(params![run_id, result.ano, serde_json::to_string(result)?])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn results_for_run(&self, run_id: &str) -> SimResult<Vec<AnnualResult>> {
        let mut stmt = self.conn.prepare(
            "SELECT payload FROM annual_result WHERE run_id = ?1 ORDER BY year ASC",
        )?;
        let payloads = stmt
            .query_map(params![run_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        let mut results = Vec::with_capacity(payloads.len());
        for payload in payloads {
            results.push(serde_json::from_str(&payload)?);
        }
        Ok(results)
    }
}

fn row_to_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        run_id:      row.get(0)?,
        seed:        row.get::<_, Option<i64>>(1)?.map(|s| s as u64),
        years:       row.get(2)?,
        parameters:  row.get(3)?,
        version:     row.get(4)?,
        status:      RunStatus::parse(&row.get::<_, String>(5)?),
        started_at:  row.get(6)?,
        finished_at: row.get(7)?,
    })
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventLogEntry> {
    Ok(EventLogEntry {
        id:         Some(row.get(0)?),
        run_id:     row.get(1)?,
        year:       row.get(2)?,
        event_type: row.get(3)?,
        payload:    row.get(4)?,
    })
}

/// A fresh archive key.
pub fn new_run_id() -> RunId {
    uuid::Uuid::new_v4().to_string()
}
