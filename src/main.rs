use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use wifi_configurator::{
    config::{self, ConfigService},
    configurator::Configurator,
    interface,
    radio::SystemControl,
    scan::NmcliScanner,
    server::AppState,
};

#[derive(Parser)]
#[command(name = "wifi-configurator")]
#[command(about = "Host a setup access point and persist submitted WiFi credentials")]
#[command(version)]
struct Cli {
    /// WiFi interface to use (defaults to the first WiFi device)
    #[arg(short, long)]
    interface: Option<String>,

    /// Port the configuration portal listens on
    #[arg(short, long, default_value = "80")]
    port: u16,

    /// Directory the static setup page is served from
    #[arg(long, default_value = "www")]
    www_root: PathBuf,

    /// Config file location (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let iface = interface::resolve_interface(cli.interface.as_deref())?;

    let config_path = match cli.config {
        Some(path) => path,
        None => config::config_path()?,
    };
    log::debug!("Config file: {}", config_path.display());

    let state = AppState {
        config: Arc::new(ConfigService::open(&config_path)?),
        scanner: Arc::new(NmcliScanner::new(iface.name.clone())),
        control: Arc::new(SystemControl),
        www_root: cli.www_root,
        restart_delay: Duration::from_secs(1),
    };

    let configurator = Configurator {
        interface: iface.name,
        port: cli.port,
        state,
    };

    configurator
        .run(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}
