//! Router hardware address lookup via the OS neighbor (ARP) table.

use async_trait::async_trait;
use tracing::debug;

use super::run_command;
use crate::probe::{PingProber, Prober};

/// Resolves a neighbor's hardware address from the OS ARP table.
#[async_trait]
pub trait NeighborTableReader: Send + Sync {
    /// `None` when the address is not in the table or the lookup failed.
    async fn lookup_mac(&self, ip: &str) -> Option<String>;
}

/// `arp -a` based lookup, preceded by a single echo request so the neighbor
/// entry is present in the cache. Works unchanged on Linux, macOS and Windows;
/// only the table formatting differs, which the parser absorbs.
pub struct ArpNeighborTable {
    prober: PingProber,
}

impl ArpNeighborTable {
    pub fn new(prober: PingProber) -> Self {
        Self { prober }
    }
}

#[async_trait]
impl NeighborTableReader for ArpNeighborTable {
    async fn lookup_mac(&self, ip: &str) -> Option<String> {
        // Warm the neighbor cache; the reply itself does not matter.
        let _ = self.prober.reply_count(ip, 1).await;

        match run_command("arp", &["-a"]).await {
            Ok(output) => parse_neighbor_mac(&output, ip),
            Err(e) => {
                debug!(ip, "`arp -a` failed: {e:#}");
                None
            }
        }
    }
}

/// Find the hardware address on the table line for `ip`.
///
/// Unix:    `gateway (192.168.1.1) at aa:bb:cc:dd:ee:ff [ether] on wlan0`
/// Windows: `  192.168.1.1           aa-bb-cc-dd-ee-ff     dynamic`
fn parse_neighbor_mac(output: &str, ip: &str) -> Option<String> {
    for line in output.lines() {
        let lower = line.to_lowercase();
        // Exact token match so 192.168.1.1 never matches 192.168.1.10.
        let has_ip = lower
            .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
            .any(|token| token == ip);
        if !has_ip {
            continue;
        }
        if let Some(mac) = lower.split_whitespace().find(|token| is_mac(token)) {
            return Some(mac.to_string());
        }
    }
    None
}

fn is_mac(token: &str) -> bool {
    let parts: Vec<&str> = if token.contains(':') {
        token.split(':').collect()
    } else if token.contains('-') {
        token.split('-').collect()
    } else {
        return false;
    };
    parts.len() == 6
        && parts
            .iter()
            .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unix_arp_line() {
        let output = "\
? (192.168.1.10) at 11:22:33:44:55:66 [ether] on wlan0
gateway (192.168.1.1) at AA:BB:CC:DD:EE:FF [ether] on wlan0";
        assert_eq!(
            parse_neighbor_mac(output, "192.168.1.1"),
            Some("aa:bb:cc:dd:ee:ff".into())
        );
    }

    #[test]
    fn parses_windows_arp_line() {
        let output = "\
Interface: 192.168.0.12 --- 0xb
  Internet Address      Physical Address      Type
  192.168.0.1           00-1a-2b-3c-4d-5e     dynamic
  192.168.0.255         ff-ff-ff-ff-ff-ff     static";
        assert_eq!(
            parse_neighbor_mac(output, "192.168.0.1"),
            Some("00-1a-2b-3c-4d-5e".into())
        );
    }

    #[test]
    fn prefix_ip_does_not_match() {
        let output = "? (192.168.1.10) at 11:22:33:44:55:66 [ether] on wlan0";
        assert_eq!(parse_neighbor_mac(output, "192.168.1.1"), None);
    }

    #[test]
    fn incomplete_entry_yields_none() {
        let output = "? (192.168.1.1) at <incomplete> on wlan0";
        assert_eq!(parse_neighbor_mac(output, "192.168.1.1"), None);
    }

    #[test]
    fn mac_token_recognition() {
        assert!(is_mac("aa:bb:cc:dd:ee:ff"));
        assert!(is_mac("00-1a-2b-3c-4d-5e"));
        assert!(!is_mac("192.168.1.1"));
        assert!(!is_mac("aa:bb:cc:dd:ee"));
        assert!(!is_mac("dynamic"));
    }
}
