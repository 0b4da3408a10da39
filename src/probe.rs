//! ICMP probing
//!
//! Uses the system `ping` command (requires no raw-socket capability) the same
//! way the platform does: one batched invocation per cycle, reply RTTs parsed
//! from the command output. A probe batch that fails to execute or gets zero
//! replies is observable only through `latency_ms` being absent; probing never
//! fails the cycle by itself.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::sample::UNKNOWN;

/// Statistics derived from one probe batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeStats {
    /// Mean RTT over successful probes, rounded to 2 decimals; absent when the
    /// reply series is empty.
    pub latency_ms: Option<f64>,
    /// Sample standard deviation of RTTs, rounded to 2 decimals; 0.0 (not
    /// absent) below 2 replies.
    pub jitter_ms: f64,
    /// `100 * (count - replies) / count`, always in [0, 100].
    pub packet_loss_pct: f64,
}

impl ProbeStats {
    /// The all-timeout / failed-execution case.
    pub fn empty(count: u32) -> Self {
        Self::from_times(&[], count)
    }

    /// Derive statistics from a series of reply times.
    pub fn from_times(times: &[f64], count: u32) -> Self {
        let count = count.max(1);
        let replies = times.len().min(count as usize);

        let latency_ms = if times.is_empty() {
            None
        } else {
            Some(round2(times.iter().sum::<f64>() / times.len() as f64))
        };

        Self {
            latency_ms,
            jitter_ms: round2(sample_stdev(times)),
            packet_loss_pct: 100.0 * (count as usize - replies) as f64 / count as f64,
        }
    }
}

/// Batched echo-request probing against one target.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Latency statistics over one batch of `count` probes.
    async fn probe(&self, target: &str, count: u32) -> ProbeStats;

    /// Replies received out of `count`, or `None` when the batch could not run.
    async fn reply_count(&self, target: &str, count: u32) -> Option<usize>;
}

/// Sends batched ICMP echo requests via the system `ping` command and derives
/// latency statistics.
#[derive(Debug, Clone)]
pub struct PingProber {
    timeout_per_probe: Duration,
}

impl Default for PingProber {
    fn default() -> Self {
        Self {
            timeout_per_probe: Duration::from_secs(2),
        }
    }
}

impl PingProber {
    pub fn new(timeout_per_probe: Duration) -> Self {
        Self { timeout_per_probe }
    }

    async fn run_batch(&self, target: &str, count: u32) -> anyhow::Result<String> {
        let count_flag = if cfg!(windows) { "-n" } else { "-c" };

        // The batch itself takes up to one timeout per probe; give the process
        // that long plus headroom before giving up on it.
        let deadline = self.timeout_per_probe * count + Duration::from_secs(5);

        let output = timeout(
            deadline,
            Command::new("ping")
                .args([count_flag, &count.to_string(), target])
                .stdin(Stdio::null())
                .output(),
        )
        .await
        .map_err(|_| anyhow::anyhow!("ping timed out after {deadline:?}"))??;

        // Non-zero exit still carries partial replies (e.g. some packets lost),
        // so the stdout is parsed either way.
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Prober for PingProber {
    /// Any execution error (missing binary, unresolvable target, timeout)
    /// degrades to the empty-series statistics.
    async fn probe(&self, target: &str, count: u32) -> ProbeStats {
        if target == UNKNOWN || target.is_empty() {
            return ProbeStats::empty(count);
        }

        match self.run_batch(target, count).await {
            Ok(output) => {
                let times = parse_reply_times(&output);
                debug!(target, count, replies = times.len(), "probe batch complete");
                ProbeStats::from_times(&times, count)
            }
            Err(e) => {
                warn!(target, "probe batch failed: {e:#}");
                ProbeStats::empty(count)
            }
        }
    }

    async fn reply_count(&self, target: &str, count: u32) -> Option<usize> {
        if target == UNKNOWN || target.is_empty() {
            return None;
        }
        match self.run_batch(target, count).await {
            Ok(output) => Some(parse_reply_times(&output).len()),
            Err(e) => {
                warn!(target, "reachability batch failed: {e:#}");
                None
            }
        }
    }
}

/// Runs an independently-counted probe batch against the gateway and reports
/// reachability as a coarse up/down percentage, decoupled from latency quality.
#[derive(Clone)]
pub struct ReachabilityChecker {
    prober: Arc<dyn Prober>,
}

impl Default for ReachabilityChecker {
    fn default() -> Self {
        Self::new(Arc::new(PingProber::default()))
    }
}

impl ReachabilityChecker {
    pub fn new(prober: Arc<dyn Prober>) -> Self {
        Self { prober }
    }

    /// `received / count * 100`, rounded to an integer, as a percentage string.
    /// `None` when the target is unknown or the batch failed entirely.
    pub async fn check(&self, target: &str, count: u32) -> Option<String> {
        let count = count.max(1);
        let received = self.prober.reply_count(target, count).await?;
        let pct = (received as f64 / count as f64 * 100.0).round() as u32;
        Some(format!("{pct}%"))
    }
}

/// Parse reply RTTs from ping output.
///
/// Linux/macOS print `time=12.3 ms`; Windows prints `time=23ms` and `time<1ms`
/// for sub-millisecond replies. Every `time=`/`time<` token is taken as one
/// successful reply.
pub fn parse_reply_times(output: &str) -> Vec<f64> {
    let mut times = Vec::new();
    for line in output.lines() {
        let Some(idx) = line.find("time") else {
            continue;
        };
        let rest = &line[idx + 4..];
        let Some(rest) = rest.strip_prefix('=').or_else(|| rest.strip_prefix('<')) else {
            continue;
        };
        let number: String = rest
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if let Ok(ms) = number.parse::<f64>() {
            times.push(ms);
        }
    }
    times
}

fn sample_stdev(times: &[f64]) -> f64 {
    if times.len() < 2 {
        return 0.0;
    }
    let mean = times.iter().sum::<f64>() / times.len() as f64;
    let variance =
        times.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / (times.len() - 1) as f64;
    variance.sqrt()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
