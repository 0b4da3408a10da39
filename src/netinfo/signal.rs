//! Wi-Fi link signal strength.

use async_trait::async_trait;
use tracing::debug;

use super::run_command;

/// Reads the wireless link signal as a percentage string.
#[async_trait]
pub trait SignalReader: Send + Sync {
    /// `None` when there is no wireless link or the platform query failed.
    async fn read(&self) -> Option<String>;
}

/// Select the signal strategy for the build platform.
pub fn platform_signal_reader() -> Box<dyn SignalReader> {
    if cfg!(windows) {
        Box::new(WindowsSignalReader)
    } else if cfg!(target_os = "linux") {
        Box::new(LinuxSignalReader)
    } else {
        Box::new(UnsupportedSignalReader)
    }
}

/// Windows: `netsh wlan show interfaces`, `Signal : NN%`.
pub struct WindowsSignalReader;

#[async_trait]
impl SignalReader for WindowsSignalReader {
    async fn read(&self) -> Option<String> {
        match run_command("netsh", &["wlan", "show", "interfaces"]).await {
            Ok(output) => parse_netsh_signal(&output),
            Err(e) => {
                debug!("`netsh wlan` failed: {e:#}");
                None
            }
        }
    }
}

/// Linux: `/proc/net/wireless` link quality, scaled against the conventional
/// maximum of 70.
pub struct LinuxSignalReader;

#[async_trait]
impl SignalReader for LinuxSignalReader {
    async fn read(&self) -> Option<String> {
        match tokio::fs::read_to_string("/proc/net/wireless").await {
            Ok(content) => parse_proc_wireless(&content),
            Err(e) => {
                debug!("/proc/net/wireless unreadable: {e}");
                None
            }
        }
    }
}

/// Platforms without a supported wireless query.
pub struct UnsupportedSignalReader;

#[async_trait]
impl SignalReader for UnsupportedSignalReader {
    async fn read(&self) -> Option<String> {
        None
    }
}

fn parse_netsh_signal(output: &str) -> Option<String> {
    for line in output.lines() {
        let trimmed = line.trim_start();
        if !trimmed.starts_with("Signal") {
            continue;
        }
        let (_, value) = trimmed.split_once(':')?;
        let digits: String = value
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if let Ok(pct) = digits.parse::<u32>() {
            return Some(format!("{pct}%"));
        }
    }
    None
}

fn parse_proc_wireless(content: &str) -> Option<String> {
    // Two header lines, then one line per wireless interface:
    //   wlan0: 0000   54.  -56.  -256        0      0 ...
    for line in content.lines().skip(2) {
        let mut fields = line.split_whitespace();
        let iface = fields.next()?;
        if !iface.ends_with(':') {
            continue;
        }
        let _status = fields.next()?;
        let quality = fields.next()?.trim_end_matches('.');
        if let Ok(q) = quality.parse::<f64>() {
            let pct = (q / 70.0 * 100.0).round().clamp(0.0, 100.0) as u32;
            return Some(format!("{pct}%"));
        }
    }
    None
}
