use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfiguratorError {
    #[error("No WiFi interface found")]
    NoWifiInterfaceFound,

    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    #[error("Failed to execute nmcli: {0}")]
    NmcliExecution(String),

    #[error("Failed to parse nmcli output: {0}")]
    NmcliParse(String),

    #[error("No hardware address for interface '{0}'")]
    NoHardwareAddress(String),

    #[error("Invalid hardware address: {0}")]
    InvalidHardwareAddress(String),

    #[error("Access point start failed: {0}")]
    AccessPointFailed(String),

    #[error("Device restart failed: {0}")]
    RestartFailed(String),
}
