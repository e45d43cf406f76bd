//! Trade Console Server
//!
//! HTTP server for the trading backend's admin console. It mounts the
//! liveness monitor against the backend's health endpoint and exposes the
//! console API for the browser front end.
//!
//! # Endpoints
//!
//! ## Status
//! - `GET /health` - The console's own liveness
//! - `GET /api/status` - Backend liveness badge
//!
//! ## Views
//! - `GET /api/logs` - Recent operation logs, filterable
//! - `GET /api/cookies` - List stored cookies
//! - `POST /api/cookies` - Store a cookie
//! - `DELETE /api/cookies/{id}` - Delete a cookie
//! - `GET /api/profit` - Profit summary
//!
//! # Configuration
//!
//! The server reads configuration from:
//! 1. `CONSOLE_CONFIG` environment variable (path to TOML file)
//! 2. `./console.toml` in current directory
//! 3. Default configuration

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::signal;
use tracing::{error, info, warn};

use trade_console::backend::BackendClient;
use trade_console::monitor::{HttpHealthProbe, LivenessMonitor, LivenessStatus, ProbeConfig};
use trade_console::types::{LogCategory, LogFilter, LogOrigin, NewCookie};
use trade_console::{Error, MonitorConfig, Result};

// =============================================================================
// Server Configuration
// =============================================================================

/// Console configuration loaded from TOML or environment
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    /// HTTP server address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Trading backend base URL
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Health endpoint probed by the liveness monitor
    #[serde(default = "default_health_endpoint")]
    pub health_endpoint: String,

    /// Payload status value accepted as healthy
    #[serde(default = "default_healthy_sentinel")]
    pub healthy_sentinel: String,

    /// Seconds between probe cycles
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Seconds allowed per probe attempt
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Default page size for list endpoints
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_backend_url() -> String {
    "http://127.0.0.1:9000".to_string()
}

fn default_health_endpoint() -> String {
    "http://127.0.0.1:9000/api/health".to_string()
}

fn default_healthy_sentinel() -> String {
    "ok".to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_probe_timeout_secs() -> u64 {
    8
}

fn default_list_limit() -> usize {
    100
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            backend_url: default_backend_url(),
            health_endpoint: default_health_endpoint(),
            healthy_sentinel: default_healthy_sentinel(),
            poll_interval_secs: default_poll_interval_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            list_limit: default_list_limit(),
        }
    }
}

// =============================================================================
// Application State
// =============================================================================

/// Shared application state
struct AppState {
    monitor: LivenessMonitor,
    backend: BackendClient,
    config: ConsoleConfig,
}

// =============================================================================
// API Request/Response Types
// =============================================================================

/// Console's own health response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Backend liveness badge
#[derive(Debug, Serialize)]
struct StatusResponse {
    status: LivenessStatus,
    consecutive_failures: u32,
}

/// Query parameters for the log view
#[derive(Debug, Deserialize)]
struct LogParams {
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    category: Option<LogCategory>,
    #[serde(default)]
    origin: Option<LogOrigin>,
    #[serde(default)]
    failures_only: bool,
}

/// Query parameters for the cookie list
#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default)]
    limit: Option<usize>,
}

// =============================================================================
// API Handlers
// =============================================================================

/// The console's own health check
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Backend liveness badge
async fn backend_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: state.monitor.status(),
        consecutive_failures: state.monitor.consecutive_cycle_failures(),
    })
}

/// Recent operation logs, filtered server-side
async fn get_logs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LogParams>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(state.config.list_limit);
    let filter = LogFilter {
        category: params.category,
        origin: params.origin,
        failures_only: params.failures_only,
    };

    match state.backend.recent_logs(limit).await {
        Ok(logs) => {
            let filtered: Vec<_> = logs.into_iter().filter(|l| filter.matches(l)).collect();
            (
                StatusCode::OK,
                Json(serde_json::json!({ "success": true, "logs": filtered })),
            )
        }
        Err(e) => {
            error!(error = %e, "Log fetch failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "success": false, "error": e.to_string() })),
            )
        }
    }
}

/// List stored cookies
async fn list_cookies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(state.config.list_limit);

    match state.backend.list_cookies(limit).await {
        Ok(cookies) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "cookies": cookies })),
        ),
        Err(e) => {
            error!(error = %e, "Cookie list failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "success": false, "error": e.to_string() })),
            )
        }
    }
}

/// Store a new cookie
async fn create_cookie(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewCookie>,
) -> impl IntoResponse {
    if new.account.is_empty() || new.value.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "success": false,
                "error": "account and value must not be empty"
            })),
        );
    }

    match state.backend.create_cookie(&new).await {
        Ok(record) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "cookie": record })),
        ),
        Err(e) => {
            error!(error = %e, account = %new.account, "Cookie create failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "success": false, "error": e.to_string() })),
            )
        }
    }
}

/// Delete a cookie by id
async fn delete_cookie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    match state.backend.delete_cookie(id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "id": id })),
        ),
        Err(e) => {
            error!(error = %e, id, "Cookie delete failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "success": false, "error": e.to_string() })),
            )
        }
    }
}

/// Profit summary
async fn get_profit(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.backend.profit_summary().await {
        Ok(summary) => (
            StatusCode::OK,
            Json(serde_json::json!({ "success": true, "profit": summary })),
        ),
        Err(e) => {
            error!(error = %e, "Profit fetch failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "success": false, "error": e.to_string() })),
            )
        }
    }
}

// =============================================================================
// Server Initialization
// =============================================================================

/// Load configuration from file or environment
fn load_config() -> ConsoleConfig {
    if let Ok(path) = std::env::var("CONSOLE_CONFIG") {
        match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    info!(path = %path, "Loaded configuration from file");
                    return config;
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "Failed to parse config file, using defaults");
                }
            },
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to read config file, using defaults");
            }
        }
    }

    if let Ok(content) = std::fs::read_to_string("console.toml") {
        if let Ok(config) = toml::from_str(&content) {
            info!("Loaded configuration from console.toml");
            return config;
        }
    }

    info!("Using default configuration");
    ConsoleConfig::default()
}

/// Build the router with all endpoints
fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(backend_status))
        .route("/api/logs", get(get_logs))
        .route("/api/cookies", get(list_cookies).post(create_cookie))
        .route("/api/cookies/:id", axum::routing::delete(delete_cookie))
        .route("/api/profit", get(get_profit))
        .with_state(state)
}

fn parse_directive(directive: &str) -> Result<tracing_subscriber::filter::Directive> {
    directive
        .parse()
        .map_err(|e| Error::Configuration(format!("invalid log directive {directive:?}: {e}")))
}

/// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(parse_directive("trade_console=info")?)
                .add_directive(parse_directive("console=info")?),
        )
        .init();

    info!("Trade console starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = load_config();
    info!("Backend URL: {}", config.backend_url);
    info!("Health endpoint: {}", config.health_endpoint);
    info!("Listen address: {}", config.listen_addr);

    // Mount the liveness monitor
    let probe = Arc::new(HttpHealthProbe::new(ProbeConfig {
        endpoint: config.health_endpoint.clone(),
        timeout: Duration::from_secs(config.probe_timeout_secs),
        healthy_sentinel: config.healthy_sentinel.clone(),
    }));
    let monitor = LivenessMonitor::new(MonitorConfig::default(), probe);
    monitor.start(Duration::from_secs(config.poll_interval_secs))?;

    let backend = BackendClient::new(config.backend_url.clone());

    let state = Arc::new(AppState {
        monitor: monitor.clone(),
        backend,
        config: config.clone(),
    });

    let app = build_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .map_err(|e| Error::Configuration(format!("invalid listen address {:?}: {e}", config.listen_addr)))?;
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    monitor.stop();
    info!("Console shutdown complete");
    Ok(())
}
