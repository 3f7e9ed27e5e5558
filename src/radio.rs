//! Radio lifecycle management.
//!
//! Drives NetworkManager's `nmcli` tool to take the device out of any
//! existing association and into combined access-point + station mode,
//! with the derived device hostname as the AP's SSID. NetworkManager
//! keeps station-side scanning available while the hotspot is up, which
//! is what the setup flow relies on.
//!
//! # Requirements
//!
//! - NetworkManager must be installed and running
//! - The `nmcli` command must be available in PATH
//! - User must have permission to manage network connections

use anyhow::{Context, Result};
use std::process::Command;

use crate::error::ConfiguratorError;

/// Disconnects the specified interface from its current network.
///
/// # Command Executed
/// ```bash
/// nmcli device disconnect <interface>
/// ```
pub fn disconnect(interface: &str) -> Result<()> {
    let output = Command::new("nmcli")
        .args(["device", "disconnect", interface])
        .output()
        .context("Failed to execute nmcli disconnect")?;

    // A device that was never connected reports an error here; that is
    // the state we wanted anyway.
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::debug!("nmcli disconnect: {}", stderr.trim());
    }

    Ok(())
}

/// Assigns the device hostname.
///
/// # Command Executed
/// ```bash
/// nmcli general hostname <hostname>
/// ```
pub fn set_hostname(hostname: &str) -> Result<()> {
    let output = Command::new("nmcli")
        .args(["general", "hostname", hostname])
        .output()
        .context("Failed to execute nmcli hostname")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConfiguratorError::NmcliExecution(stderr.to_string()).into());
    }

    Ok(())
}

/// Starts an open access point whose SSID is the device hostname.
///
/// # Command Executed
/// ```bash
/// nmcli device wifi hotspot ifname <interface> ssid <ssid>
/// ```
pub fn start_access_point(interface: &str, ssid: &str) -> Result<()> {
    let output = Command::new("nmcli")
        .args(["device", "wifi", "hotspot", "ifname", interface, "ssid", ssid])
        .output()
        .context("Failed to execute nmcli hotspot")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let error_msg = if stderr.is_empty() {
            stdout.to_string()
        } else {
            stderr.to_string()
        };
        return Err(ConfiguratorError::AccessPointFailed(error_msg).into());
    }

    Ok(())
}

/// The IPv4 address currently assigned to the interface, without the
/// CIDR suffix. None if no address is assigned yet.
///
/// # Command Executed
/// ```bash
/// nmcli -t device show <interface>
/// ```
pub fn interface_address(interface: &str) -> Result<Option<String>> {
    let output = Command::new("nmcli")
        .args(["-t", "device", "show", interface])
        .output()
        .context("Failed to execute nmcli device show")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConfiguratorError::NmcliExecution(stderr.to_string()).into());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_interface_address(&stdout))
}

fn parse_interface_address(output: &str) -> Option<String> {
    for line in output.lines() {
        // Split on first colon only (values might contain colons)
        let parts: Vec<&str> = line.splitn(2, ':').collect();
        if parts.len() != 2 {
            continue;
        }

        if parts[0] == "IP4.ADDRESS[1]" {
            let value = parts[1].trim();
            if value.is_empty() || value == "--" {
                return None;
            }
            // "192.168.4.1/24" -> "192.168.4.1"
            let address = value.split('/').next().unwrap_or(value);
            return Some(address.to_string());
        }
    }

    None
}

/// The restart collaborator consumed by the config-write handler.
///
/// Production reboots the machine; tests count invocations instead.
pub trait DeviceControl: Send + Sync {
    fn restart(&self) -> Result<()>;
}

/// Restarts the device through systemd.
pub struct SystemControl;

impl DeviceControl for SystemControl {
    fn restart(&self) -> Result<()> {
        let output = Command::new("systemctl")
            .arg("reboot")
            .output()
            .context("Failed to execute systemctl reboot")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConfiguratorError::RestartFailed(stderr.to_string()).into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_interface_address_without_cidr() {
        let output = "GENERAL.DEVICE:wlan0\n\
                      GENERAL.STATE:100 (connected)\n\
                      IP4.ADDRESS[1]:192.168.4.1/24\n\
                      IP4.GATEWAY:192.168.4.1\n";

        assert_eq!(
            parse_interface_address(output),
            Some("192.168.4.1".to_string())
        );
    }

    #[test]
    fn missing_address_yields_none() {
        assert_eq!(parse_interface_address("GENERAL.DEVICE:wlan0\n"), None);
        assert_eq!(parse_interface_address("IP4.ADDRESS[1]:--\n"), None);
    }
}
