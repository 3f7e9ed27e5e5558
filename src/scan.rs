//! WiFi network scanning.
//!
//! Uses NetworkManager's nmcli tool to trigger scans and retrieve
//! nearby-network information for the setup page:
//!
//! 1. Triggers a rescan on the interface using `nmcli device wifi rescan`
//! 2. Waits briefly for the scan to complete (500ms)
//! 3. Retrieves the results using `nmcli device wifi list`
//! 4. Parses, deduplicates, and sorts by signal strength (strongest first)

use anyhow::{Context, Result};
use serde::Serialize;
use std::process::Command;

use crate::error::ConfiguratorError;

/// A nearby network discovered by a scan, as exposed on the networks
/// endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Network {
    /// The SSID (network name). Hidden networks are filtered out.
    pub ssid: String,

    /// Signal strength as a percentage (0-100).
    pub signal: u8,

    /// Security type (e.g. "WPA2", "WPA3", ""). Empty means open.
    pub security: String,
}

/// The scan collaborator consumed by the HTTP surface.
///
/// Production uses [`NmcliScanner`]; tests substitute a fixed list.
pub trait NetworkScanner: Send + Sync {
    fn discover(&self) -> Result<Vec<Network>>;
}

/// Scanner backed by `nmcli` on a fixed interface.
pub struct NmcliScanner {
    interface: String,
}

impl NmcliScanner {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
        }
    }
}

impl NetworkScanner for NmcliScanner {
    fn discover(&self) -> Result<Vec<Network>> {
        scan_networks(&self.interface)
    }
}

/// Scans for WiFi networks visible to the specified interface.
///
/// Triggers a fresh scan, waits for completion, then retrieves and
/// parses the results. Duplicate SSIDs are filtered (keeping the first
/// occurrence) and results are sorted by signal, strongest first.
///
/// The rescan command may fail silently if the interface is busy or
/// doesn't support on-demand scanning; nmcli then serves cached results
/// from the last successful scan.
pub fn scan_networks(interface: &str) -> Result<Vec<Network>> {
    // Rescan result is ignored because rescan can fail if already scanning
    let _ = Command::new("nmcli")
        .args(["device", "wifi", "rescan", "ifname", interface])
        .output();

    std::thread::sleep(std::time::Duration::from_millis(500));

    let output = Command::new("nmcli")
        .args([
            "-t",
            "-f",
            "SSID,SIGNAL,SECURITY",
            "device",
            "wifi",
            "list",
            "ifname",
            interface,
        ])
        .output()
        .context("Failed to execute nmcli wifi list")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConfiguratorError::NmcliExecution(stderr.to_string()).into());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_scan_output(&stdout))
}

/// Parse terse `nmcli device wifi list` output (SSID:SIGNAL:SECURITY).
fn parse_scan_output(output: &str) -> Vec<Network> {
    let mut networks = Vec::new();
    let mut seen_ssids = std::collections::HashSet::new();

    for line in output.lines() {
        let parts: Vec<&str> = line.split(':').collect();

        if parts.len() >= 3 {
            let ssid = parts[0].to_string();

            // Skip hidden networks (empty SSID) and duplicates
            if ssid.is_empty() || seen_ssids.contains(&ssid) {
                continue;
            }
            seen_ssids.insert(ssid.clone());

            let signal: u8 = parts[1].parse().unwrap_or(0);

            // Security field might contain colons (e.g. "WPA1 WPA2:802.1X")
            let security = parts[2..].join(":");

            networks.push(Network {
                ssid,
                signal,
                security,
            });
        }
    }

    networks.sort_by(|a, b| b.signal.cmp(&a.signal));

    networks
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "HomeNet:82:WPA2\n\
                          :45:WPA2\n\
                          Cafe:45:\n\
                          HomeNet:31:WPA2\n\
                          Office:97:WPA1 WPA2:802.1X\n";

    #[test]
    fn filters_hidden_and_duplicate_ssids() {
        let networks = parse_scan_output(SAMPLE);

        let ssids: Vec<&str> = networks.iter().map(|n| n.ssid.as_str()).collect();
        assert_eq!(ssids, ["Office", "HomeNet", "Cafe"]);
    }

    #[test]
    fn sorts_by_signal_descending() {
        let networks = parse_scan_output(SAMPLE);

        let signals: Vec<u8> = networks.iter().map(|n| n.signal).collect();
        assert_eq!(signals, [97, 82, 45]);
    }

    #[test]
    fn keeps_colons_in_security_field() {
        let networks = parse_scan_output(SAMPLE);
        assert_eq!(networks[0].security, "WPA1 WPA2:802.1X");
    }

    #[test]
    fn serializes_for_the_networks_endpoint() {
        let json = serde_json::to_string(&parse_scan_output("HomeNet:82:WPA2\n")).unwrap();
        assert_eq!(
            json,
            r#"[{"ssid":"HomeNet","signal":82,"security":"WPA2"}]"#
        );
    }
}
