//! Health Probe
//!
//! A probe is one attempt to decide whether the backend is healthy. The
//! production probe issues an HTTP GET against the backend's health endpoint
//! and compares the payload's status field against the healthy sentinel.
//! The trait seam exists so the monitor can be driven by scripted outcomes
//! in tests.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ProbeError;

/// Default deadline for a single probe attempt
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(8);

/// Payload value that indicates a healthy backend
pub const HEALTHY_SENTINEL: &str = "ok";

/// Configuration for the HTTP health probe
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Health endpoint URL
    pub endpoint: String,

    /// Deadline for a single attempt; exceeding it counts as a failure
    pub timeout: Duration,

    /// Payload status value accepted as healthy
    pub healthy_sentinel: String,
}

impl ProbeConfig {
    /// Create a config for an endpoint with default timeout and sentinel
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: DEFAULT_PROBE_TIMEOUT,
            healthy_sentinel: HEALTHY_SENTINEL.to_string(),
        }
    }
}

/// A single health-check attempt
///
/// `Ok(())` means the backend answered and reported itself healthy. Every
/// other outcome is a [`ProbeError`]; the monitor treats all variants as one
/// failed attempt.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Perform one probe attempt
    async fn check(&self) -> Result<(), ProbeError>;
}

/// Expected shape of the health endpoint's response body
#[derive(Debug, Deserialize)]
struct HealthPayload {
    status: String,
}

/// HTTP implementation of [`HealthProbe`]
pub struct HttpHealthProbe {
    config: ProbeConfig,
    client: reqwest::Client,
}

impl HttpHealthProbe {
    /// Create a probe for the configured endpoint
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    async fn request(&self) -> Result<(), ProbeError> {
        let response = self
            .client
            .get(&self.config.endpoint)
            .send()
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::HttpStatus(status.as_u16()));
        }

        let payload: HealthPayload = response
            .json()
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;

        if payload.status == self.config.healthy_sentinel {
            Ok(())
        } else {
            // A well-formed but non-healthy payload is a failed attempt,
            // not a parse error
            Err(ProbeError::UnhealthyPayload(payload.status))
        }
    }
}

#[async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn check(&self) -> Result<(), ProbeError> {
        match tokio::time::timeout(self.config.timeout, self.request()).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(self.config.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::net::SocketAddr;

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn probe_for(addr: SocketAddr, timeout: Duration) -> HttpHealthProbe {
        HttpHealthProbe::new(ProbeConfig {
            endpoint: format!("http://{addr}/health"),
            timeout,
            healthy_sentinel: HEALTHY_SENTINEL.to_string(),
        })
    }

    #[test]
    fn test_config_defaults() {
        let config = ProbeConfig::new("http://localhost:9000/health");
        assert_eq!(config.timeout, Duration::from_secs(8));
        assert_eq!(config.healthy_sentinel, "ok");
    }

    #[tokio::test]
    async fn test_healthy_payload() {
        let router = Router::new().route(
            "/health",
            get(|| async { Json(serde_json::json!({ "status": "ok" })) }),
        );
        let addr = serve(router).await;

        let probe = probe_for(addr, Duration::from_secs(1));
        assert!(probe.check().await.is_ok());
    }

    #[tokio::test]
    async fn test_degraded_payload_is_unhealthy() {
        let router = Router::new().route(
            "/health",
            get(|| async { Json(serde_json::json!({ "status": "degraded" })) }),
        );
        let addr = serve(router).await;

        let probe = probe_for(addr, Duration::from_secs(1));
        match probe.check().await {
            Err(ProbeError::UnhealthyPayload(value)) => assert_eq!(value, "degraded"),
            other => panic!("expected UnhealthyPayload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let router = Router::new().route(
            "/health",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let addr = serve(router).await;

        let probe = probe_for(addr, Duration::from_secs(1));
        match probe.check().await {
            Err(ProbeError::HttpStatus(code)) => assert_eq!(code, 500),
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_endpoint_times_out() {
        let router = Router::new().route(
            "/health",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Json(serde_json::json!({ "status": "ok" }))
            }),
        );
        let addr = serve(router).await;

        let probe = probe_for(addr, Duration::from_millis(50));
        match probe.check().await {
            Err(ProbeError::Timeout(deadline)) => {
                assert_eq!(deadline, Duration::from_millis(50));
            }
            other => panic!("expected Timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_failure() {
        // Bind and immediately drop to get a port nothing is listening on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = probe_for(addr, Duration::from_secs(1));
        match probe.check().await {
            Err(ProbeError::Transport(_)) => {}
            other => panic!("expected Transport, got {other:?}"),
        }
    }
}
