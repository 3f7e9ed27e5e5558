//! Local-network name responder.
//!
//! Announces `<hostname>.local` for the setup AP by holding an
//! `avahi-publish` child process for the life of the configurator.
//! Startup failure is reported to the caller, who logs and carries on;
//! the portal stays reachable by raw IP either way.

use anyhow::{Context, Result};
use std::process::{Child, Command, Stdio};

pub struct NameResponder {
    child: Child,
    fqdn: String,
}

impl NameResponder {
    pub fn start(hostname: &str, address: &str) -> Result<Self> {
        let fqdn = fqdn(hostname);

        let child = Command::new("avahi-publish")
            .args(["-a", &fqdn, address])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("Failed to spawn avahi-publish")?;

        log::info!("Name responder announcing {fqdn} -> {address}");

        Ok(Self { child, fqdn })
    }

    pub fn fqdn(&self) -> &str {
        &self.fqdn
    }
}

impl Drop for NameResponder {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Append `.local` to the hostname.
fn fqdn(hostname: &str) -> String {
    format!("{hostname}.local")
}
