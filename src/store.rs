//! Durable sample store
//!
//! Append-only SQLite time series. Opening the store backs up any existing
//! database file first (one generation, overwritten on every start) and then
//! ensures the schema, so a crash-looping process can never lose more than the
//! current run and repeated starts are harmless. Rows are inserted atomically
//! with a strictly increasing id and are never updated or deleted.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing::info;

use crate::sample::{Sample, UNKNOWN};

const SCHEMA_SQL: &str = "\
CREATE TABLE IF NOT EXISTS samples (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    time TEXT NOT NULL,
    router_ip TEXT NOT NULL,
    router_mac TEXT NOT NULL,
    interface TEXT NOT NULL,
    latency REAL,
    jitter REAL NOT NULL,
    packet_loss REAL NOT NULL,
    signal_strength TEXT NOT NULL,
    download_speed REAL,
    upload_speed REAL,
    isp_name TEXT NOT NULL,
    gw_reach TEXT NOT NULL,
    interface_ip TEXT NOT NULL
)";

/// Store failures are typed so the collection loop can treat a failed write as
/// fatal for the cycle without conflating it with lookup degradation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to back up store to {path}: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open store: {0}")]
    Open(#[source] rusqlite::Error),
    #[error("store write failed: {0}")]
    Write(#[source] rusqlite::Error),
    #[error("store read failed: {0}")]
    Read(#[source] rusqlite::Error),
}

/// A row as persisted, id included.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSample {
    pub id: i64,
    pub date: String,
    pub time: String,
    pub router_ip: String,
    pub router_mac: String,
    pub interface: String,
    pub latency: Option<f64>,
    pub jitter: f64,
    pub packet_loss: f64,
    pub signal_strength: String,
    pub download_speed: Option<f64>,
    pub upload_speed: Option<f64>,
    pub isp_name: String,
    pub gw_reach: String,
    pub interface_ip: String,
}

/// Append-only time-series store for [`Sample`]s.
pub struct SampleStore {
    conn: Mutex<Connection>,
}

impl SampleStore {
    /// Open the store, backing up an existing database file first and ensuring
    /// the schema. Safe to call on every process start.
    pub fn open(db_path: &Path, backup_path: &Path) -> Result<Self, StoreError> {
        if db_path.exists() {
            fs::copy(db_path, backup_path).map_err(|source| StoreError::Backup {
                path: backup_path.to_path_buf(),
                source,
            })?;
            info!(backup = %backup_path.display(), "backed up existing store");
        }

        let conn = Connection::open(db_path).map_err(StoreError::Open)?;
        conn.execute_batch(SCHEMA_SQL).map_err(StoreError::Open)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store for tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(StoreError::Open)?;
        conn.execute_batch(SCHEMA_SQL).map_err(StoreError::Open)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert one sample as a new row and return its id. Single atomic INSERT;
    /// existing rows are never touched.
    pub fn append(&self, sample: &Sample) -> Result<i64, StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO samples \
             (date, time, router_ip, router_mac, interface, latency, jitter, packet_loss, \
              signal_strength, download_speed, upload_speed, isp_name, gw_reach, interface_ip) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                sample.date,
                sample.time,
                sample.router_ip,
                sample.router_mac,
                sample.interface,
                sample.latency_ms,
                sample.jitter_ms,
                sample.packet_loss_pct,
                sample.signal_strength.as_deref().unwrap_or(UNKNOWN),
                sample.download_mbps,
                sample.upload_mbps,
                sample.isp_name.as_deref().unwrap_or(UNKNOWN),
                sample.gateway_reachability.as_deref().unwrap_or(UNKNOWN),
                sample.interface_ip,
            ],
        )
        .map_err(StoreError::Write)?;
        Ok(conn.last_insert_rowid())
    }

    /// The most recently appended row, if any.
    pub fn latest(&self) -> Result<Option<StoredSample>, StoreError> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT id, date, time, router_ip, router_mac, interface, latency, jitter, \
                    packet_loss, signal_strength, download_speed, upload_speed, isp_name, \
                    gw_reach, interface_ip \
             FROM samples ORDER BY id DESC LIMIT 1",
            [],
            Self::row_to_sample,
        )
        .optional()
        .map_err(StoreError::Read)
    }

    /// Number of rows currently stored.
    pub fn len(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM samples", [], |row| row.get(0))
            .map_err(StoreError::Read)?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn row_to_sample(row: &rusqlite::Row) -> rusqlite::Result<StoredSample> {
        Ok(StoredSample {
            id: row.get(0)?,
            date: row.get(1)?,
            time: row.get(2)?,
            router_ip: row.get(3)?,
            router_mac: row.get(4)?,
            interface: row.get(5)?,
            latency: row.get(6)?,
            jitter: row.get(7)?,
            packet_loss: row.get(8)?,
            signal_strength: row.get(9)?,
            download_speed: row.get(10)?,
            upload_speed: row.get(11)?,
            isp_name: row.get(12)?,
            gw_reach: row.get(13)?,
            interface_ip: row.get(14)?,
        })
    }
}
