//! Default gateway resolution via the OS routing table.

use std::net::Ipv4Addr;

use async_trait::async_trait;
use tracing::debug;

use super::run_command;

/// Resolves the default gateway's IP from the OS routing table.
#[async_trait]
pub trait RoutingTableReader: Send + Sync {
    /// `None` on any exec/parse failure; resolution failure is never fatal.
    async fn default_gateway(&self) -> Option<String>;
}

/// Select the routing table strategy for the build platform. Called once at
/// startup; the loop itself is platform-agnostic.
pub fn platform_routing_table() -> Box<dyn RoutingTableReader> {
    if cfg!(windows) {
        Box::new(WindowsRoutingTable)
    } else {
        Box::new(UnixRoutingTable)
    }
}

/// Linux/macOS: `ip route` (`default via <ip> ...`), falling back to
/// `route -n` (`0.0.0.0  <gateway>  ...`) on systems without iproute2.
pub struct UnixRoutingTable;

#[async_trait]
impl RoutingTableReader for UnixRoutingTable {
    async fn default_gateway(&self) -> Option<String> {
        match run_command("ip", &["route"]).await {
            Ok(output) => {
                if let Some(gw) = parse_ip_route(&output) {
                    return Some(gw);
                }
                debug!("no default route in `ip route` output");
            }
            Err(e) => debug!("`ip route` failed: {e:#}"),
        }

        match run_command("route", &["-n"]).await {
            Ok(output) => parse_route_n(&output),
            Err(e) => {
                debug!("`route -n` failed: {e:#}");
                None
            }
        }
    }
}

/// Windows: `ipconfig` (`Default Gateway . . . : <ip>`).
pub struct WindowsRoutingTable;

#[async_trait]
impl RoutingTableReader for WindowsRoutingTable {
    async fn default_gateway(&self) -> Option<String> {
        match run_command("ipconfig", &[]).await {
            Ok(output) => parse_ipconfig_gateway(&output),
            Err(e) => {
                debug!("`ipconfig` failed: {e:#}");
                None
            }
        }
    }
}

fn parse_ip_route(output: &str) -> Option<String> {
    for line in output.lines() {
        if let Some(rest) = line.trim_start().strip_prefix("default via ") {
            let candidate = rest.split_whitespace().next()?;
            if candidate.parse::<Ipv4Addr>().is_ok() {
                return Some(candidate.to_string());
            }
        }
    }
    None
}

fn parse_route_n(output: &str) -> Option<String> {
    for line in output.lines() {
        let mut fields = line.split_whitespace();
        if fields.next() == Some("0.0.0.0") {
            let candidate = fields.next()?;
            if candidate.parse::<Ipv4Addr>().is_ok() && candidate != "0.0.0.0" {
                return Some(candidate.to_string());
            }
        }
    }
    None
}

fn parse_ipconfig_gateway(output: &str) -> Option<String> {
    for line in output.lines() {
        if !line.contains("Default Gateway") {
            continue;
        }
        let Some((_, value)) = line.split_once(':') else {
            continue;
        };
        let candidate = value.trim();
        // IPv6 gateways come first on dual-stack hosts; only IPv4 is probed.
        if candidate.parse::<Ipv4Addr>().is_ok() {
            return Some(candidate.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ip_route_default() {
        let output = "\
default via 192.168.1.1 dev wlan0 proto dhcp metric 600
192.168.1.0/24 dev wlan0 proto kernel scope link src 192.168.1.42";
        assert_eq!(parse_ip_route(output), Some("192.168.1.1".into()));
    }

    #[test]
    fn ip_route_without_default_is_none() {
        let output = "192.168.1.0/24 dev wlan0 proto kernel scope link";
        assert_eq!(parse_ip_route(output), None);
    }

    #[test]
    fn parses_route_n_default() {
        let output = "\
Kernel IP routing table
Destination     Gateway         Genmask         Flags Metric Ref    Use Iface
0.0.0.0         10.0.0.1        0.0.0.0         UG    600    0        0 eth0
10.0.0.0        0.0.0.0         255.255.255.0   U     600    0        0 eth0";
        assert_eq!(parse_route_n(output), Some("10.0.0.1".into()));
    }

    #[test]
    fn parses_ipconfig_gateway() {
        let output = "\
Ethernet adapter Ethernet:

   Connection-specific DNS Suffix  . : home
   IPv4 Address. . . . . . . . . . . : 192.168.0.12
   Subnet Mask . . . . . . . . . . . : 255.255.255.0
   Default Gateway . . . . . . . . . : 192.168.0.1";
        assert_eq!(parse_ipconfig_gateway(output), Some("192.168.0.1".into()));
    }

    #[test]
    fn ipconfig_skips_empty_and_v6_gateways() {
        let output = "\
   Default Gateway . . . . . . . . . :
   Default Gateway . . . . . . . . . : fe80::1%12";
        assert_eq!(parse_ipconfig_gateway(output), None);
    }
}
