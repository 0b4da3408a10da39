//! Measurement records
//!
//! One [`Sample`] is produced per collection cycle and is immutable once built.
//! Assembly is pure: the builder does no I/O and owns no error handling. Callers
//! hand it whatever their lookups produced, and absent inputs pass through as
//! `None` or the "unknown" sentinel.

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Sentinel for non-fatal resolution/lookup failures, distinct from a numeric
/// field simply being absent.
pub const UNKNOWN: &str = "unknown";

/// One persisted measurement record for a single collection cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    /// Wall-clock date at cycle start (%Y-%m-%d)
    pub date: String,
    /// Wall-clock time at cycle start (%H:%M:%S)
    pub time: String,
    /// Gateway/router IP, or "unknown"
    pub router_ip: String,
    /// Router hardware address, or "unknown"
    pub router_mac: String,
    /// Local interface carrying the default route, or "unknown"
    pub interface: String,
    /// Mean RTT over successful probes; absent when no probe replied
    pub latency_ms: Option<f64>,
    /// Sample standard deviation of RTTs; 0.0 below 2 successful probes
    pub jitter_ms: f64,
    /// Unanswered probes as a percentage, always in [0, 100]
    pub packet_loss_pct: f64,
    /// Link signal as a percentage string, or "unknown"
    pub signal_strength: Option<String>,
    pub download_mbps: Option<f64>,
    pub upload_mbps: Option<f64>,
    pub isp_name: Option<String>,
    /// Gateway reachability as a percentage string, or "unknown"
    pub gateway_reachability: Option<String>,
    pub interface_ip: String,
}

/// Pure assembly of a [`Sample`] from the per-cycle lookup results.
#[derive(Debug, Default)]
pub struct SampleBuilder {
    date: String,
    time: String,
    router_ip: Option<String>,
    router_mac: Option<String>,
    interface: Option<String>,
    latency_ms: Option<f64>,
    jitter_ms: f64,
    packet_loss_pct: f64,
    signal_strength: Option<String>,
    download_mbps: Option<f64>,
    upload_mbps: Option<f64>,
    isp_name: Option<String>,
    gateway_reachability: Option<String>,
    interface_ip: Option<String>,
}

impl SampleBuilder {
    /// Start a record stamped with the current local wall-clock.
    pub fn now() -> Self {
        let now = Local::now();
        Self {
            date: now.format("%Y-%m-%d").to_string(),
            time: now.format("%H:%M:%S").to_string(),
            ..Default::default()
        }
    }

    /// Start a record with an explicit timestamp (tests).
    pub fn at(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
            ..Default::default()
        }
    }

    pub fn router_ip(mut self, ip: impl Into<String>) -> Self {
        self.router_ip = Some(ip.into());
        self
    }

    pub fn router_mac(mut self, mac: impl Into<String>) -> Self {
        self.router_mac = Some(mac.into());
        self
    }

    pub fn interface(mut self, name: impl Into<String>) -> Self {
        self.interface = Some(name.into());
        self
    }

    pub fn interface_ip(mut self, ip: impl Into<String>) -> Self {
        self.interface_ip = Some(ip.into());
        self
    }

    pub fn latency(mut self, latency_ms: Option<f64>, jitter_ms: f64, packet_loss_pct: f64) -> Self {
        self.latency_ms = latency_ms;
        self.jitter_ms = jitter_ms;
        self.packet_loss_pct = packet_loss_pct;
        self
    }

    pub fn signal_strength(mut self, signal: Option<String>) -> Self {
        self.signal_strength = signal;
        self
    }

    pub fn bandwidth(mut self, download_mbps: Option<f64>, upload_mbps: Option<f64>) -> Self {
        self.download_mbps = download_mbps;
        self.upload_mbps = upload_mbps;
        self
    }

    pub fn isp_name(mut self, isp: Option<String>) -> Self {
        self.isp_name = isp;
        self
    }

    pub fn gateway_reachability(mut self, reach: Option<String>) -> Self {
        self.gateway_reachability = reach;
        self
    }

    pub fn build(self) -> Sample {
        Sample {
            date: self.date,
            time: self.time,
            router_ip: self.router_ip.unwrap_or_else(|| UNKNOWN.into()),
            router_mac: self.router_mac.unwrap_or_else(|| UNKNOWN.into()),
            interface: self.interface.unwrap_or_else(|| UNKNOWN.into()),
            latency_ms: self.latency_ms,
            jitter_ms: self.jitter_ms,
            packet_loss_pct: self.packet_loss_pct,
            signal_strength: self.signal_strength,
            download_mbps: self.download_mbps,
            upload_mbps: self.upload_mbps,
            isp_name: self.isp_name,
            gateway_reachability: self.gateway_reachability,
            interface_ip: self.interface_ip.unwrap_or_else(|| UNKNOWN.into()),
        }
    }
}
