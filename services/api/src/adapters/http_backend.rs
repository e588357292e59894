//! services/api/src/adapters/http_backend.rs
//!
//! Adapter for an external LifeGuard collaborator reachable over HTTP. It serves
//! the wearable snapshots, the AI chat replies and the rendered PDF reports.

use async_trait::async_trait;
use lifeguard_core::{
    domain::{Message, ReportRequest},
    ports::{ChatService, HealthDataService, PortError, PortResult, ReportService},
    signals::{HealthSignals, HistoricalDashboard},
};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Implements the health-data, chat and report ports against `base_url`.
#[derive(Clone)]
pub struct HttpBackendAdapter {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackendAdapter {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> PortResult<T> {
        let url = self.url(path);
        debug!("GET {}", url);
        let resp = self.client.get(&url).send().await.map_err(map_request_error)?;
        let resp = check_response(resp).await?;
        resp.json::<T>().await.map_err(map_request_error)
    }
}

//=========================================================================================
// Response and Error Mapping
//=========================================================================================

/// Passes successful responses through; maps every other status to a `PortError`.
pub async fn check_response(resp: reqwest::Response) -> PortResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = format!("{} {}", status.as_u16(), body).trim().to_string();
    Err(match status.as_u16() {
        404 => PortError::NotFound(message),
        408 | 504 => PortError::Timeout,
        502 | 503 => PortError::Unavailable(message),
        _ => PortError::Unexpected(message),
    })
}

fn map_request_error(e: reqwest::Error) -> PortError {
    if e.is_timeout() {
        PortError::Timeout
    } else if e.is_connect() {
        PortError::Unavailable(e.to_string())
    } else {
        PortError::Unexpected(e.to_string())
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl HealthDataService for HttpBackendAdapter {
    async fn fetch_health_signals(&self) -> PortResult<HealthSignals> {
        self.get_json("/api/health-signals").await
    }

    async fn fetch_historical_dashboard(&self) -> PortResult<HistoricalDashboard> {
        self.get_json("/api/historical-dashboard").await
    }
}

#[async_trait]
impl ChatService for HttpBackendAdapter {
    async fn send_user_message(&self, message: &Message) -> PortResult<Message> {
        let resp = self
            .client
            .post(self.url("/lg/user-message"))
            .json(message)
            .send()
            .await
            .map_err(map_request_error)?;
        let resp = check_response(resp).await?;
        resp.json::<Message>().await.map_err(map_request_error)
    }
}

#[async_trait]
impl ReportService for HttpBackendAdapter {
    async fn generate_pdf(&self, request: &ReportRequest) -> PortResult<Vec<u8>> {
        let resp = self
            .client
            .post(self.url("/lg/generate-pdf"))
            .json(request)
            .send()
            .await
            .map_err(map_request_error)?;
        let resp = check_response(resp).await?;
        let bytes = resp.bytes().await.map_err(map_request_error)?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mock_response(status: u16, body: &str) -> reqwest::Response {
        reqwest::Response::from(
            ::http::Response::builder()
                .status(status)
                .body(body.to_string())
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn success_passes_through() {
        let resp = check_response(mock_response(200, "{}")).await.unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn not_found_keeps_the_body() {
        let err = check_response(mock_response(404, "no such route"))
            .await
            .unwrap_err();
        assert_eq!(err, PortError::NotFound("404 no such route".to_string()));
    }

    #[tokio::test]
    async fn gateway_statuses_map_to_availability_errors() {
        let err = check_response(mock_response(503, "")).await.unwrap_err();
        assert_eq!(err, PortError::Unavailable("503".to_string()));
        let err = check_response(mock_response(504, "")).await.unwrap_err();
        assert_eq!(err, PortError::Timeout);
    }

    #[tokio::test]
    async fn other_failures_are_unexpected() {
        let err = check_response(mock_response(500, "boom")).await.unwrap_err();
        assert!(matches!(err, PortError::Unexpected(m) if m.contains("boom")));
    }

    #[tokio::test]
    async fn health_signals_payload_decodes() {
        let body = r#"{
            "heartRate": [{"time": "00:00", "value": 71}],
            "activity": [{"time": "00:00", "value": 9}],
            "bloodPressure": [{"time": "00:00", "systolic": 121, "diastolic": 77}],
            "sleep": {"deep": 2.1, "light": 4.0, "rem": 1.5, "awake": 0.3, "total": 9.0},
            "riskScore": 12
        }"#;
        let resp = check_response(mock_response(200, body)).await.unwrap();
        let signals: HealthSignals = resp.json().await.unwrap();
        assert_eq!(signals.heart_rate[0].value, 71.0);
        assert_eq!(signals.blood_pressure[0].systolic, 121);
        assert_eq!(signals.risk_score, 12.0);
    }

    #[test]
    fn urls_join_onto_the_base() {
        let adapter =
            HttpBackendAdapter::with_client(reqwest::Client::new(), "http://localhost:8000");
        assert_eq!(
            adapter.url("/lg/user-message"),
            "http://localhost:8000/lg/user-message"
        );
    }
}
