//! Backend REST Client
//!
//! Typed client for the trading backend endpoints the console consumes:
//! the cookie-management CRUD resource, the operation-log feed, and the
//! profit summary. Calls are direct request/response with no retry; a
//! failure surfaces as a [`BackendError`] for the handler layer to report.
//!
//! The liveness monitor does not go through this client; it owns its own
//! probe.

use serde::Deserialize;

use crate::error::BackendError;
use crate::types::{CookieRecord, NewCookie, OperationLog, ProfitSummary};

/// Client for the trading backend's REST API
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ListCookiesResponse {
    cookies: Vec<CookieRecord>,
}

#[derive(Debug, Deserialize)]
struct LogsResponse {
    logs: Vec<OperationLog>,
}

impl BackendClient {
    /// Create a client for a backend base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Base URL this client targets
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn check_status(response: &reqwest::Response) -> Result<(), BackendError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(BackendError::Status(status.as_u16()))
        }
    }

    /// List stored cookies, newest first, up to `limit`
    pub async fn list_cookies(&self, limit: usize) -> Result<Vec<CookieRecord>, BackendError> {
        let response = self
            .client
            .get(self.url("/api/cookies"))
            .query(&[("limit", limit)])
            .send()
            .await?;
        Self::check_status(&response)?;

        let body: ListCookiesResponse = response.json().await?;
        Ok(body.cookies)
    }

    /// Store a new cookie record
    pub async fn create_cookie(&self, cookie: &NewCookie) -> Result<CookieRecord, BackendError> {
        let response = self
            .client
            .post(self.url("/api/cookies"))
            .json(cookie)
            .send()
            .await?;
        Self::check_status(&response)?;

        Ok(response.json().await?)
    }

    /// Delete a cookie record by id
    pub async fn delete_cookie(&self, id: u64) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(self.url(&format!("/api/cookies/{id}")))
            .send()
            .await?;
        Self::check_status(&response)
    }

    /// Fetch the most recent operation logs, up to `limit`
    pub async fn recent_logs(&self, limit: usize) -> Result<Vec<OperationLog>, BackendError> {
        let response = self
            .client
            .get(self.url("/api/logs"))
            .query(&[("limit", limit)])
            .send()
            .await?;
        Self::check_status(&response)?;

        let body: LogsResponse = response.json().await?;
        Ok(body.logs)
    }

    /// Fetch the aggregate profit figures
    pub async fn profit_summary(&self) -> Result<ProfitSummary, BackendError> {
        let response = self.client.get(self.url("/api/profit")).send().await?;
        Self::check_status(&response)?;

        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LogCategory, LogOrigin};
    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use axum::routing::{delete, get};
    use axum::{Json, Router};
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::Arc;

    /// In-memory stand-in for the trading backend
    #[derive(Default)]
    struct FakeBackend {
        cookies: Mutex<Vec<CookieRecord>>,
        next_id: Mutex<u64>,
    }

    async fn list_cookies(
        State(backend): State<Arc<FakeBackend>>,
        Query(params): Query<HashMap<String, usize>>,
    ) -> Json<serde_json::Value> {
        let limit = params.get("limit").copied().unwrap_or(usize::MAX);
        let cookies: Vec<_> = backend.cookies.lock().iter().take(limit).cloned().collect();
        Json(serde_json::json!({ "cookies": cookies }))
    }

    async fn create_cookie(
        State(backend): State<Arc<FakeBackend>>,
        Json(new): Json<NewCookie>,
    ) -> Json<CookieRecord> {
        let mut next_id = backend.next_id.lock();
        *next_id += 1;
        let record = CookieRecord {
            id: *next_id,
            account: new.account,
            value: new.value,
            created_at_ms: 1_700_000_000_000,
        };
        backend.cookies.lock().push(record.clone());
        Json(record)
    }

    async fn delete_cookie(
        State(backend): State<Arc<FakeBackend>>,
        Path(id): Path<u64>,
    ) -> StatusCode {
        let mut cookies = backend.cookies.lock();
        let before = cookies.len();
        cookies.retain(|c| c.id != id);
        if cookies.len() < before {
            StatusCode::NO_CONTENT
        } else {
            StatusCode::NOT_FOUND
        }
    }

    async fn logs() -> Json<serde_json::Value> {
        let entries = vec![OperationLog {
            timestamp_ms: 1_700_000_000_000,
            category: LogCategory::Trade,
            success: true,
            message: "filled BTC-USD buy".to_string(),
            origin: LogOrigin::Automated,
        }];
        Json(serde_json::json!({ "logs": entries }))
    }

    async fn profit() -> Json<ProfitSummary> {
        Json(ProfitSummary {
            realized: 1250.5,
            unrealized: -42.0,
            trade_count: 18,
            win_rate: 0.61,
        })
    }

    async fn serve_fake_backend() -> SocketAddr {
        let backend = Arc::new(FakeBackend::default());
        let router = Router::new()
            .route("/api/cookies", get(list_cookies).post(create_cookie))
            .route("/api/cookies/:id", delete(delete_cookie))
            .route("/api/logs", get(logs))
            .route("/api/profit", get(profit))
            .with_state(backend);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = BackendClient::new("http://localhost:9000/");
        assert_eq!(client.base_url(), "http://localhost:9000");
        assert_eq!(client.url("/api/logs"), "http://localhost:9000/api/logs");
    }

    #[tokio::test]
    async fn test_cookie_crud_round_trip() {
        let addr = serve_fake_backend().await;
        let client = BackendClient::new(format!("http://{addr}"));

        assert!(client.list_cookies(10).await.unwrap().is_empty());

        let created = client
            .create_cookie(&NewCookie {
                account: "main".to_string(),
                value: "session=abc123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(created.account, "main");

        let listed = client.list_cookies(10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.id);

        client.delete_cookie(created.id).await.unwrap();
        assert!(client.list_cookies(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_cookie_surfaces_status() {
        let addr = serve_fake_backend().await;
        let client = BackendClient::new(format!("http://{addr}"));

        match client.delete_cookie(999).await {
            Err(BackendError::Status(code)) => assert_eq!(code, 404),
            other => panic!("expected Status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_recent_logs_and_profit() {
        let addr = serve_fake_backend().await;
        let client = BackendClient::new(format!("http://{addr}"));

        let logs = client.recent_logs(50).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].category, LogCategory::Trade);

        let profit = client.profit_summary().await.unwrap();
        assert_eq!(profit.trade_count, 18);
    }
}
