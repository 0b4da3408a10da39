//! Collection loop
//!
//! Drives the fixed-interval measurement cycle: resolve the gateway, probe it,
//! query the collaborators, then persist and export. A cycle whose probe
//! batch got no replies is skipped entirely. The loop runs one cycle at a
//! time and suspends only in its two waits (interval and failure backoff), both
//! of which race the cancellation token so shutdown is immediate and never
//! interrupts a write.

use std::sync::Arc;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::collectors::{BandwidthTester, IspLookup};
use crate::config::MonitorConfig;
use crate::export::CsvExporter;
use crate::netinfo::{InterfaceResolver, NeighborTableReader, RoutingTableReader, SignalReader};
use crate::probe::{Prober, ReachabilityChecker};
use crate::sample::{SampleBuilder, UNKNOWN};
use crate::store::SampleStore;

/// What one cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Sample persisted and mirrored under this id.
    Recorded(i64),
    /// Probe batch got zero replies; nothing was built or stored.
    Skipped,
    /// Sample was built but the store refused the write. Nothing was exported
    /// and no success is claimed; the loop retries next cycle.
    StoreFailed,
}

/// The measurement collaborators, one strategy each, selected at startup.
pub struct Collaborators {
    pub routing: Box<dyn RoutingTableReader>,
    pub neighbor: Box<dyn NeighborTableReader>,
    pub signal: Box<dyn SignalReader>,
    pub bandwidth: Box<dyn BandwidthTester>,
    pub isp: Box<dyn IspLookup>,
    pub interface: Box<dyn InterfaceResolver>,
}

/// Owns one full measurement pipeline and the loop driving it.
pub struct Monitor {
    config: MonitorConfig,
    prober: Arc<dyn Prober>,
    reachability: ReachabilityChecker,
    collaborators: Collaborators,
    store: SampleStore,
    exporter: CsvExporter,
    cancel: CancellationToken,
}

impl Monitor {
    pub fn new(
        config: MonitorConfig,
        prober: Arc<dyn Prober>,
        collaborators: Collaborators,
        store: SampleStore,
        exporter: CsvExporter,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            reachability: ReachabilityChecker::new(prober.clone()),
            config,
            prober,
            collaborators,
            store,
            exporter,
            cancel,
        }
    }

    /// Run cycles until cancelled. Persistence happens synchronously inside the
    /// cycle, so cancellation during a wait leaves no partial state behind.
    pub async fn run(&self) {
        info!(
            interval_secs = self.config.interval_secs,
            backoff_secs = self.config.failure_backoff_secs,
            "starting collection loop"
        );

        while !self.cancel.is_cancelled() {
            let outcome = self.run_cycle().await;

            let wait = match outcome {
                CycleOutcome::Skipped => self.config.failure_backoff(),
                _ => self.config.interval(),
            };

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = sleep(wait) => {}
            }
        }

        info!("collection loop stopped");
    }

    /// One full measurement cycle.
    pub async fn run_cycle(&self) -> CycleOutcome {
        info!("starting probe cycle");

        // The gateway is resolved once; the same address is the probe target,
        // the MAC lookup key and the reachability target.
        let gateway = self.collaborators.routing.default_gateway().await;
        let router_ip = gateway.clone().unwrap_or_else(|| UNKNOWN.to_string());
        if gateway.is_none() {
            warn!("default gateway resolution failed");
        }

        let router_mac = match &gateway {
            Some(ip) => self.collaborators.neighbor.lookup_mac(ip).await,
            None => None,
        };

        let stats = self
            .prober
            .probe(&router_ip, self.config.probe_count)
            .await;
        let reachability = self
            .reachability
            .check(&router_ip, self.config.probe_count)
            .await;

        let signal = self.collaborators.signal.read().await;
        let (download, upload) = match self.collaborators.bandwidth.measure().await {
            Ok((d, u)) => (Some(d), Some(u)),
            Err(e) => {
                warn!("bandwidth measurement failed: {e:#}");
                (None, None)
            }
        };
        let isp = self.collaborators.isp.lookup().await;

        let interface_ip = self.collaborators.interface.local_ip().await;
        let interface_name = match &interface_ip {
            Some(ip) => self.collaborators.interface.active_interface(ip).await,
            None => None,
        };

        let Some(latency) = stats.latency_ms else {
            warn!(%router_ip, "probe batch got no replies, skipping cycle");
            return CycleOutcome::Skipped;
        };

        let mut builder = SampleBuilder::now()
            .router_ip(&router_ip)
            .latency(stats.latency_ms, stats.jitter_ms, stats.packet_loss_pct)
            .signal_strength(signal)
            .bandwidth(download, upload)
            .isp_name(isp)
            .gateway_reachability(reachability);
        if let Some(mac) = router_mac {
            builder = builder.router_mac(mac);
        }
        if let Some(name) = interface_name {
            builder = builder.interface(name);
        }
        if let Some(ip) = interface_ip {
            builder = builder.interface_ip(ip);
        }
        let sample = builder.build();

        info!(
            router_ip = %sample.router_ip,
            router_mac = %sample.router_mac,
            interface = %sample.interface,
            interface_ip = %sample.interface_ip,
            latency_ms = latency,
            jitter_ms = sample.jitter_ms,
            packet_loss_pct = sample.packet_loss_pct,
            signal = sample.signal_strength.as_deref().unwrap_or(UNKNOWN),
            download_mbps = ?sample.download_mbps,
            upload_mbps = ?sample.upload_mbps,
            isp = sample.isp_name.as_deref().unwrap_or(UNKNOWN),
            gateway_reachability = sample.gateway_reachability.as_deref().unwrap_or(UNKNOWN),
            "cycle measurements"
        );

        let id = match self.store.append(&sample) {
            Ok(id) => id,
            Err(e) => {
                error!("sample not persisted: {e}");
                return CycleOutcome::StoreFailed;
            }
        };

        if let Err(e) = self.exporter.export_latest(&self.store) {
            // The row is durable either way; the mirror may trail the store
            // but must never run ahead of it.
            warn!("export failed for sample {id}: {e:#}");
        }

        info!(id, "sample recorded");
        CycleOutcome::Recorded(id)
    }
}
