//! Collector configuration

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the collection loop and its collaborators.
///
/// Every field has a default matching unattended operation; a TOML file can
/// override any subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// SQLite database path
    pub db_path: PathBuf,
    /// Backup path the database is copied to on every start
    pub backup_path: PathBuf,
    /// CSV export mirror path
    pub export_path: PathBuf,
    /// Echo requests per probe batch
    pub probe_count: u32,
    /// Seconds between successful cycles
    pub interval_secs: u64,
    /// Backoff seconds after a skipped cycle
    pub failure_backoff_secs: u64,
    /// Per-probe timeout budget in seconds
    pub probe_timeout_secs: u64,
    /// Timeout for the bandwidth measurement in seconds
    pub external_timeout_secs: u64,
    /// ISP lookup endpoint and timeout
    pub isp_endpoint: String,
    pub isp_timeout_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data.db"),
            backup_path: PathBuf::from("data_backup.db"),
            export_path: PathBuf::from("samples.csv"),
            probe_count: 10,
            interval_secs: 300,
            failure_backoff_secs: 50,
            probe_timeout_secs: 2,
            external_timeout_secs: 60,
            isp_endpoint: "https://ipinfo.io/json".into(),
            isp_timeout_secs: 10,
        }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn failure_backoff(&self) -> Duration {
        Duration::from_secs(self.failure_backoff_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn external_timeout(&self) -> Duration {
        Duration::from_secs(self.external_timeout_secs)
    }

    pub fn isp_timeout(&self) -> Duration {
        Duration::from_secs(self.isp_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_unattended_operation() {
        let config = MonitorConfig::default();
        assert_eq!(config.probe_count, 10);
        assert_eq!(config.interval(), Duration::from_secs(300));
        assert_eq!(config.failure_backoff(), Duration::from_secs(50));
    }

    #[test]
    fn partial_toml_overrides_defaults() {
        let config: MonitorConfig = toml::from_str(
            r#"
            db_path = "/var/lib/netpulse/data.db"
            interval_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/var/lib/netpulse/data.db"));
        assert_eq!(config.interval_secs, 60);
        assert_eq!(config.probe_count, 10);
        assert_eq!(config.export_path, PathBuf::from("samples.csv"));
    }
}
