//! Configurator startup and serve loop.
//!
//! Owns the access-point lifecycle: tears down any existing Wi-Fi
//! association, brings the radio up as an access point named after the
//! device, announces the hostname on the local network, and serves the
//! configuration portal until a stop signal fires. In production the
//! stop signal is Ctrl-C and the loop effectively never ends; the
//! normal way out is the device restart after a config write.

use anyhow::{Context, Result};
use std::future::Future;
use tokio::net::TcpListener;

use crate::responder::NameResponder;
use crate::server::{self, AppState};
use crate::{interface, radio};

pub struct Configurator {
    /// WiFi interface hosting the access point.
    pub interface: String,
    /// Portal listen port.
    pub port: u16,
    pub state: AppState,
}

impl Configurator {
    /// Bring up the access point and serve the portal until `shutdown`
    /// resolves.
    pub async fn run(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
        radio::disconnect(&self.interface)?;

        let mac = interface::hardware_address(&self.interface)?;
        let hostname = interface::hostname_from_mac(&mac)?;
        radio::set_hostname(&hostname)?;
        radio::start_access_point(&self.interface, &hostname)?;

        log::info!("Starting configurator");
        log::info!("SSID: {hostname}");

        let address = radio::interface_address(&self.interface)?;
        if let Some(ip) = &address {
            log::info!("IP address: {ip}");
        }

        // Responder failure only costs the .local name; the portal
        // stays reachable by IP.
        let _responder = match address.as_deref() {
            Some(ip) => match NameResponder::start(&hostname, ip) {
                Ok(responder) => Some(responder),
                Err(e) => {
                    log::warn!("Error setting up name responder: {e:#}");
                    None
                }
            },
            None => {
                log::warn!("No address on {} yet, skipping name responder", self.interface);
                None
            }
        };

        let listener = TcpListener::bind(("0.0.0.0", self.port))
            .await
            .with_context(|| format!("Failed to bind port {}", self.port))?;
        log::info!("Portal listening on port {}", self.port);

        // Prime the scan so the first page load has results waiting.
        let scanner = self.state.scanner.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = scanner.discover() {
                log::warn!("Initial network scan failed: {e:#}");
            }
        });

        serve(listener, self.state, shutdown).await
    }
}

/// Dispatch requests on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
}
