//! Local interface identification
//!
//! The interface carrying the default route is found indirectly: a connected
//! UDP socket to a public address reveals the local IP the OS would source
//! outbound traffic from (no packet is sent), and the interface list is then
//! searched for that address.

use std::net::UdpSocket;

use async_trait::async_trait;
use tracing::debug;

use super::run_command;

/// Maps the local IP bound for outbound traffic to an interface name.
#[async_trait]
pub trait InterfaceResolver: Send + Sync {
    /// The local IP the OS routes outbound traffic from.
    async fn local_ip(&self) -> Option<String>;

    /// The interface name carrying `local_ip`.
    async fn active_interface(&self, local_ip: &str) -> Option<String>;
}

/// OS-backed resolver: UDP-socket trick for the IP, `ip -o -4 addr show`
/// (Unix) or `ipconfig` (Windows) for the name.
pub struct SystemInterfaceResolver;

#[async_trait]
impl InterfaceResolver for SystemInterfaceResolver {
    async fn local_ip(&self) -> Option<String> {
        // connect() on a UDP socket only selects a route; nothing is sent.
        let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
        socket.connect("8.8.8.8:80").ok()?;
        Some(socket.local_addr().ok()?.ip().to_string())
    }

    async fn active_interface(&self, local_ip: &str) -> Option<String> {
        if cfg!(windows) {
            match run_command("ipconfig", &[]).await {
                Ok(output) => parse_ipconfig_interface(&output, local_ip),
                Err(e) => {
                    debug!("`ipconfig` failed: {e:#}");
                    None
                }
            }
        } else {
            match run_command("ip", &["-o", "-4", "addr", "show"]).await {
                Ok(output) => parse_ip_addr_show(&output, local_ip),
                Err(e) => {
                    debug!("`ip addr show` failed: {e:#}");
                    None
                }
            }
        }
    }
}

/// `2: wlan0    inet 192.168.1.42/24 brd 192.168.1.255 scope global ...`
fn parse_ip_addr_show(output: &str, local_ip: &str) -> Option<String> {
    for line in output.lines() {
        let mut fields = line.split_whitespace();
        let _index = fields.next()?;
        let name = fields.next()?;
        let rest: Vec<&str> = fields.collect();
        let addr_matches = rest
            .windows(2)
            .any(|w| w[0] == "inet" && w[1].split('/').next() == Some(local_ip));
        if addr_matches {
            return Some(name.to_string());
        }
    }
    None
}

/// Walk `ipconfig` sections; adapter headers are unindented and end with ':'.
fn parse_ipconfig_interface(output: &str, local_ip: &str) -> Option<String> {
    let mut current_adapter: Option<String> = None;
    for line in output.lines() {
        if !line.starts_with(' ') && line.trim_end().ends_with(':') {
            let header = line.trim_end().trim_end_matches(':');
            // "Ethernet adapter Ethernet" -> "Ethernet"
            current_adapter = Some(
                header
                    .split_once(" adapter ")
                    .map(|(_, name)| name.to_string())
                    .unwrap_or_else(|| header.to_string()),
            );
        } else if line.contains("IPv4 Address") {
            if let Some((_, value)) = line.split_once(':') {
                if value.trim().trim_end_matches("(Preferred)").trim() == local_ip {
                    return current_adapter;
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_ip_addr_show_line() {
        let output = "\
1: lo    inet 127.0.0.1/8 scope host lo\\       valid_lft forever
2: wlan0    inet 192.168.1.42/24 brd 192.168.1.255 scope global dynamic wlan0";
        assert_eq!(
            parse_ip_addr_show(output, "192.168.1.42"),
            Some("wlan0".into())
        );
        assert_eq!(parse_ip_addr_show(output, "192.168.1.4"), None);
    }

    #[test]
    fn matches_ipconfig_section() {
        let output = "\
Windows IP Configuration

Ethernet adapter Ethernet:

   IPv4 Address. . . . . . . . . . . : 192.168.0.12(Preferred)
   Default Gateway . . . . . . . . . : 192.168.0.1

Wireless LAN adapter Wi-Fi:

   IPv4 Address. . . . . . . . . . . : 192.168.0.20";
        assert_eq!(
            parse_ipconfig_interface(output, "192.168.0.20"),
            Some("Wi-Fi".into())
        );
        assert_eq!(
            parse_ipconfig_interface(output, "192.168.0.12"),
            Some("Ethernet".into())
        );
        assert_eq!(parse_ipconfig_interface(output, "10.0.0.1"), None);
    }
}
