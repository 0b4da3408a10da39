//! Incremental CSV mirror
//!
//! A flat-file copy of the store for external analysis. One row is appended per
//! successful cycle (always `store.latest()`, never a history re-scan), so the
//! mirror grows in lock-step with the store. The header is written exactly once,
//! when the file is first created.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::store::{SampleStore, StoredSample};

const HEADER: [&str; 15] = [
    "ID",
    "Date",
    "Time",
    "Router IP",
    "Router MAC",
    "Interface",
    "Latency",
    "Jitter",
    "Packet Loss",
    "Signal Strength",
    "Download Speed",
    "Upload Speed",
    "ISP Name",
    "Gateway Reachability",
    "Interface IP",
];

/// Append-only CSV exporter.
pub struct CsvExporter {
    path: PathBuf,
}

impl CsvExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the store's most recent row to the mirror.
    pub fn export_latest(&self, store: &SampleStore) -> anyhow::Result<()> {
        let Some(row) = store.latest()? else {
            anyhow::bail!("store is empty, nothing to export");
        };

        let write_header = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open export file {}", self.path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if write_header {
            writer.write_record(HEADER)?;
        }
        writer.write_record(record_fields(&row))?;
        writer.flush()?;

        debug!(id = row.id, path = %self.path.display(), "exported latest sample");
        Ok(())
    }
}

fn record_fields(row: &StoredSample) -> Vec<String> {
    vec![
        row.id.to_string(),
        row.date.clone(),
        row.time.clone(),
        row.router_ip.clone(),
        row.router_mac.clone(),
        row.interface.clone(),
        row.latency.map(|v| v.to_string()).unwrap_or_default(),
        row.jitter.to_string(),
        row.packet_loss.to_string(),
        row.signal_strength.clone(),
        row.download_speed.map(|v| v.to_string()).unwrap_or_default(),
        row.upload_speed.map(|v| v.to_string()).unwrap_or_default(),
        row.isp_name.clone(),
        row.gw_reach.clone(),
        row.interface_ip.clone(),
    ]
}
