//! Bandwidth measurement via the speedtest CLI.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;

/// Measures download/upload throughput in Mbps.
#[async_trait]
pub trait BandwidthTester: Send + Sync {
    /// `(download_mbps, upload_mbps)`. Single attempt; errors propagate so the
    /// caller can record the fields as absent.
    async fn measure(&self) -> anyhow::Result<(f64, f64)>;
}

/// Delegates to `speedtest-cli --json` and converts bits/sec to Mbps.
pub struct SpeedtestCliTester {
    timeout: Duration,
}

impl SpeedtestCliTester {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[derive(Debug, Deserialize)]
struct SpeedtestReport {
    download: f64,
    upload: f64,
}

#[async_trait]
impl BandwidthTester for SpeedtestCliTester {
    async fn measure(&self) -> anyhow::Result<(f64, f64)> {
        let output = timeout(
            self.timeout,
            Command::new("speedtest-cli")
                .arg("--json")
                .stdin(Stdio::null())
                .output(),
        )
        .await
        .map_err(|_| anyhow::anyhow!("speedtest timed out after {:?}", self.timeout))??;

        if !output.status.success() {
            anyhow::bail!("speedtest-cli exited with {}", output.status);
        }

        let report: SpeedtestReport = serde_json::from_slice(&output.stdout)?;
        Ok((mbps(report.download), mbps(report.upload)))
    }
}

fn mbps(bits_per_sec: f64) -> f64 {
    (bits_per_sec / 1_000_000.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_report_to_mbps() {
        let json = r#"{"download": 94230000.0, "upload": 11790000.0, "ping": 12.3}"#;
        let report: SpeedtestReport = serde_json::from_str(json).unwrap();
        assert_eq!(mbps(report.download), 94.23);
        assert_eq!(mbps(report.upload), 11.79);
    }

    #[test]
    fn malformed_report_is_an_error() {
        assert!(serde_json::from_str::<SpeedtestReport>(r#"{"ping": 1}"#).is_err());
    }
}
