//! Captive WiFi configuration portal.
//!
//! Boots a device into combined access-point + station mode, serves a
//! small JSON API and static setup page over HTTP, and persists
//! submitted WiFi credentials before restarting the device into normal
//! operation.
//!
//! # Modules
//!
//! - [`config`] - Persisted device configuration and the shared config service
//! - [`configurator`] - Access-point lifecycle and the serve loop
//! - [`error`] - Custom error types for the library
//! - [`interface`] - WiFi interface discovery and hostname derivation
//! - [`radio`] - Radio mode control and the device-restart collaborator
//! - [`responder`] - Local-network name announcement for the setup AP
//! - [`scan`] - WiFi network scanning
//! - [`server`] - HTTP routes and handlers of the portal

/// Configuration module for the persisted device settings.
/// Handles the TOML config file and the cached current-config response.
pub mod config;

/// Configurator module owning the AP lifecycle and serve loop.
pub mod configurator;

/// Error module defining custom error types for the library.
/// Uses `thiserror` for ergonomic error handling.
pub mod error;

/// Interface module for WiFi adapter discovery and hostname derivation.
pub mod interface;

/// Radio module controlling association, hostname, and AP mode, plus
/// the device-restart collaborator.
pub mod radio;

/// Responder module announcing the device hostname on the local network.
pub mod responder;

/// Scan module for discovering available WiFi networks.
/// Triggers rescans and parses network information from nmcli output.
pub mod scan;

/// Server module with the portal's routes and handlers.
pub mod server;

// Re-export the pieces main assembles at startup
pub use config::{config_path, ConfigService, ConfigStore, DeviceConfig};
pub use configurator::Configurator;
pub use error::ConfiguratorError;
pub use interface::{list_wifi_interfaces, resolve_interface, WifiInterface};
pub use radio::{DeviceControl, SystemControl};
pub use scan::{scan_networks, Network, NetworkScanner, NmcliScanner};
pub use server::AppState;
