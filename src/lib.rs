//! netpulse library
//!
//! A long-running local agent that measures the health of the host's network
//! path (gateway latency, jitter, loss, reachability, link signal, bandwidth,
//! ISP identity) and durably records each cycle as a time-series sample with an
//! incremental CSV export.

pub mod collectors;
pub mod config;
pub mod export;
pub mod monitor;
pub mod netinfo;
pub mod probe;
pub mod sample;
pub mod store;
