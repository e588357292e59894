//! services/api/src/error.rs
//!
//! Defines the primary error type for the API service and how it is reported
//! to HTTP callers.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use lifeguard_core::ports::PortError;
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A collaborator behind one of the core ports failed.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Reading from or writing to a session's socket failed.
    #[error("WebSocket Error: {0}")]
    Websocket(#[from] axum::Error),

    /// Binding the listener or touching the survey-flag file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The outbound HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Port(PortError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Port(PortError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Port(PortError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        error!("Request failed with {}: {}", status, self);
        (status, self.to_string()).into_response()
    }
}
