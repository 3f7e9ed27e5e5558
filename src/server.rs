//! HTTP surface of the configurator.
//!
//! Four named handlers over a shared [`AppState`]: network scan,
//! current-config read, config write, and a static-file fallback rooted
//! at the `www` directory. The config-write handler persists the
//! submitted credentials and schedules the device restart after the
//! response has gone out.

use axum::{
    body::Body,
    extract::{Form, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::io::ReaderStream;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ConfigService;
use crate::radio::DeviceControl;
use crate::scan::NetworkScanner;

/// Route paths, shared between the router and the setup page.
pub mod paths {
    pub const DATA_NETWORKS: &str = "/data/networks";
    pub const DATA_CURRENT: &str = "/data/current";
    pub const SET_CONFIG: &str = "/set-config";
}

/// Content types served by the portal.
pub mod content_types {
    pub const JSON: &str = "application/json";
    pub const HTML: &str = "text/html";
    pub const CSS: &str = "text/css";
    pub const JS: &str = "application/javascript";
    pub const ICO: &str = "image/x-icon";
    pub const PLAIN: &str = "text/plain";
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConfigService>,
    pub scanner: Arc<dyn NetworkScanner>,
    pub control: Arc<dyn DeviceControl>,
    pub www_root: PathBuf,
    /// Pause between the config-write response and the restart, so the
    /// response can flush. Tests shrink this.
    pub restart_delay: Duration,
}

/// Build the portal router over the given state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            paths::DATA_NETWORKS,
            get(get_networks).fallback(close_connection),
        )
        .route(
            paths::DATA_CURRENT,
            get(get_current).fallback(close_connection),
        )
        .route(
            paths::SET_CONFIG,
            post(set_config).fallback(close_connection),
        )
        .fallback(serve_static)
        .layer(cors)
        .with_state(state)
}

/// Wrong method on a known route: no body, drop the connection.
async fn close_connection() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::CONNECTION, "close")],
    )
}

async fn get_networks(State(state): State<AppState>) -> Response {
    let scanner = state.scanner.clone();
    let networks = tokio::task::spawn_blocking(move || scanner.discover()).await;

    match networks {
        Ok(Ok(networks)) => match serde_json::to_string(&networks) {
            Ok(json) => {
                ([(header::CONTENT_TYPE, content_types::JSON)], json).into_response()
            }
            Err(e) => {
                log::error!("Failed to serialize scan results: {e}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        },
        Ok(Err(e)) => {
            log::error!("Network scan failed: {e:#}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(e) => {
            log::error!("Scan task failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_current(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, content_types::JSON)],
        state.config.current_response(),
    )
}

#[derive(Debug, Deserialize)]
struct SetConfigForm {
    #[serde(default)]
    ssid: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    mode: String,
    #[serde(default)]
    static_ip: String,
    #[serde(default)]
    static_mask: String,
}

/// Persist the submitted configuration and schedule the restart.
///
/// Fields are persisted as submitted; each save stands alone, so a
/// failed address save after a successful credential save leaves a
/// partial update behind.
async fn set_config(State(state): State<AppState>, Form(form): Form<SetConfigForm>) -> Response {
    if let Err(e) = state.config.set_auth(&form.ssid, &form.password) {
        log::error!("Failed to save credentials: {e:#}");
    }

    let dhcp = form.mode == "dhcp";
    if let Err(e) = state
        .config
        .set_ip_mode(dhcp, &form.static_ip, &form.static_mask)
    {
        log::error!("Failed to save address mode: {e:#}");
    }

    state.config.invalidate();

    log::info!("Configuration saved, restarting shortly");

    let control = state.control.clone();
    let delay = state.restart_delay;
    tokio::spawn(async move {
        // Let the 200 response flush before the device goes away.
        tokio::time::sleep(delay).await;
        if let Err(e) = control.restart() {
            log::error!("Device restart failed: {e:#}");
        }
    });

    StatusCode::OK.into_response()
}

/// Static-file fallback rooted at `www_root`.
async fn serve_static(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri.path();

    let mut relative = path.trim_start_matches('/').to_string();
    if relative.is_empty() || path.ends_with('/') {
        relative.push_str("index.html");
    }

    // Keep requests inside the www root.
    if relative.split('/').any(|part| part == "..") {
        return not_found();
    }

    let file_path = state.www_root.join(&relative);

    match tokio::fs::metadata(&file_path).await {
        Ok(meta) if meta.is_file() => {}
        _ => return not_found(),
    }

    match tokio::fs::File::open(&file_path).await {
        Ok(file) => {
            let stream = ReaderStream::new(file);
            (
                [(header::CONTENT_TYPE, content_type(&relative))],
                Body::from_stream(stream),
            )
                .into_response()
        }
        Err(e) => {
            log::warn!("Failed to open {}: {e}", file_path.display());
            not_found()
        }
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, content_types::PLAIN)],
        "404: Not Found",
    )
        .into_response()
}

fn content_type(path: &str) -> &'static str {
    if path.ends_with(".html") {
        content_types::HTML
    } else if path.ends_with(".css") {
        content_types::CSS
    } else if path.ends_with(".js") {
        content_types::JS
    } else if path.ends_with(".ico") {
        content_types::ICO
    } else {
        content_types::PLAIN
    }
}
