use anyhow::{Context, Result};
use std::fs;
use std::process::Command;

use crate::error::ConfiguratorError;

/// Hostname prefix broadcast as the setup network name.
pub const HOSTNAME_PREFIX: &str = "PT-";

#[derive(Debug, Clone)]
pub struct WifiInterface {
    pub name: String,
    pub state: String,
}

/// List all WiFi interfaces on the system
pub fn list_wifi_interfaces() -> Result<Vec<WifiInterface>> {
    let output = Command::new("nmcli")
        .args(["-t", "-f", "DEVICE,TYPE,STATE", "device"])
        .output()
        .context("Failed to execute nmcli")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConfiguratorError::NmcliExecution(stderr.to_string()).into());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_device_list(&stdout))
}

fn parse_device_list(output: &str) -> Vec<WifiInterface> {
    let mut interfaces = Vec::new();

    for line in output.lines() {
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() >= 3 && parts[1] == "wifi" {
            interfaces.push(WifiInterface {
                name: parts[0].to_string(),
                state: parts[2].to_string(),
            });
        }
    }

    interfaces
}

/// Get a specific interface by name, verifying it's a WiFi interface
pub fn get_interface(name: &str) -> Result<WifiInterface> {
    let interfaces = list_wifi_interfaces()?;

    interfaces
        .into_iter()
        .find(|i| i.name == name)
        .ok_or_else(|| ConfiguratorError::InterfaceNotFound(name.to_string()).into())
}

/// Resolve interface: use provided name or the first WiFi device
pub fn resolve_interface(interface: Option<&str>) -> Result<WifiInterface> {
    match interface {
        Some(name) => get_interface(name),
        None => list_wifi_interfaces()?
            .into_iter()
            .next()
            .ok_or_else(|| ConfiguratorError::NoWifiInterfaceFound.into()),
    }
}

/// Read the hardware (MAC) address of an interface from sysfs.
pub fn hardware_address(interface: &str) -> Result<String> {
    let path = format!("/sys/class/net/{}/address", interface);

    let address = fs::read_to_string(&path)
        .map_err(|_| ConfiguratorError::NoHardwareAddress(interface.to_string()))?;

    let address = address.trim();
    if address.is_empty() {
        return Err(ConfiguratorError::NoHardwareAddress(interface.to_string()).into());
    }

    Ok(address.to_string())
}

/// Derive the device hostname from a MAC address: `PT-` plus the last
/// three octets in upper-case hex, e.g. `aa:bb:cc:dd:ee:ff` -> `PT-DDEEFF`.
pub fn hostname_from_mac(mac: &str) -> Result<String> {
    let octets: Vec<&str> = mac.trim().split(':').collect();

    if octets.len() != 6 || octets.iter().any(|o| u8::from_str_radix(o, 16).is_err()) {
        return Err(ConfiguratorError::InvalidHardwareAddress(mac.trim().to_string()).into());
    }

    let suffix: String = octets[3..]
        .iter()
        .map(|o| o.to_ascii_uppercase())
        .collect();

    Ok(format!("{HOSTNAME_PREFIX}{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wifi_devices_only() {
        let output = "wlan0:wifi:disconnected\n\
                      eth0:ethernet:connected\n\
                      lo:loopback:unmanaged\n\
                      wlan1:wifi:connected\n";

        let interfaces = parse_device_list(output);
        assert_eq!(interfaces.len(), 2);
        assert_eq!(interfaces[0].name, "wlan0");
        assert_eq!(interfaces[0].state, "disconnected");
        assert_eq!(interfaces[1].name, "wlan1");
    }

    #[test]
    fn hostname_uses_last_three_octets_uppercased() {
        assert_eq!(
            hostname_from_mac("aa:bb:cc:dd:ee:ff").unwrap(),
            "PT-DDEEFF"
        );
        assert_eq!(
            hostname_from_mac("00:11:22:33:44:55\n").unwrap(),
            "PT-334455"
        );
    }

    #[test]
    fn hostname_rejects_malformed_mac() {
        assert!(hostname_from_mac("not-a-mac").is_err());
        assert!(hostname_from_mac("aa:bb:cc:dd:ee").is_err());
        assert!(hostname_from_mac("aa:bb:cc:dd:ee:zz").is_err());
    }
}
