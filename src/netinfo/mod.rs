//! OS network state lookups
//!
//! Everything here shells out to platform tools (`ip route`, `arp`, `ipconfig`,
//! `netsh`) and parses their output. Each capability is a small trait with one
//! implementation selected per platform at startup, so the collection loop never
//! branches on the OS. Lookup failure is never fatal: every reader degrades to
//! `None` and the caller records the "unknown" sentinel.

mod interface;
mod neighbor;
mod routing;
mod signal;

pub use interface::{InterfaceResolver, SystemInterfaceResolver};
pub use neighbor::{ArpNeighborTable, NeighborTableReader};
pub use routing::{
    platform_routing_table, RoutingTableReader, UnixRoutingTable, WindowsRoutingTable,
};
pub use signal::{
    platform_signal_reader, LinuxSignalReader, SignalReader, UnsupportedSignalReader,
    WindowsSignalReader,
};

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

/// Bounded timeout applied to every lookup subprocess so one wedged tool cannot
/// stall the collection loop.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Run a lookup command and capture stdout. Errors bubble up; callers map them
/// to the unknown sentinel.
pub(crate) async fn run_command(program: &str, args: &[&str]) -> anyhow::Result<String> {
    let output = timeout(
        COMMAND_TIMEOUT,
        Command::new(program).args(args).stdin(Stdio::null()).output(),
    )
    .await
    .map_err(|_| anyhow::anyhow!("{program} timed out after {COMMAND_TIMEOUT:?}"))??;

    if !output.status.success() {
        anyhow::bail!("{program} exited with {}", output.status);
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
