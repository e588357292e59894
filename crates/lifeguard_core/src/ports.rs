//! crates/lifeguard_core/src/ports.rs
//!
//! Defines the service contracts (traits) through which the session reaches the
//! outside world: the wearable data feed, the AI chat assistant, the PDF renderer
//! and the survey-completion flag store. Adapters in the `api` service implement
//! these against HTTP collaborators, OpenAI, a simulated feed or local storage.

use async_trait::async_trait;

use crate::domain::{Message, ReportRequest};
use crate::signals::{HealthSignals, HistoricalDashboard};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., network, disk).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("The request timed out")]
    Timeout,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait HealthDataService: Send + Sync {
    /// Latest 24h snapshot backing the Health Signals view.
    async fn fetch_health_signals(&self) -> PortResult<HealthSignals>;

    /// Richer snapshot backing the Historical Dashboard view.
    async fn fetch_historical_dashboard(&self) -> PortResult<HistoricalDashboard>;
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Sends a user message and returns the assistant's reply.
    async fn send_user_message(&self, message: &Message) -> PortResult<Message>;
}

#[async_trait]
pub trait ReportService: Send + Sync {
    /// Renders a health report and returns the raw PDF bytes.
    async fn generate_pdf(&self, request: &ReportRequest) -> PortResult<Vec<u8>>;
}

/// Persistent record of which users finished onboarding, keyed `survey_{email}`.
#[async_trait]
pub trait SurveyFlagStore: Send + Sync {
    async fn mark_completed(&self, email: &str) -> PortResult<()>;
    /// For inspection only. `login` never consults the flag; a returning user
    /// always lands on the dashboard.
    async fn is_completed(&self, email: &str) -> PortResult<bool>;
}

/// The storage key for a user's survey-completion flag.
pub fn survey_flag_key(email: &str) -> String {
    format!("survey_{}", email)
}

/// The value stored under [`survey_flag_key`] once the survey is done.
pub const SURVEY_FLAG_VALUE: &str = "true";
