//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the collaborator REST endpoints and the master
//! definition for the OpenAPI specification. The handlers expose the server's own
//! ports, so a browser shell can use this service as its LifeGuard backend.

use crate::{error::ApiError, web::state::AppState};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use lifeguard_core::domain::{Message, MessageKind};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_signals_handler,
        historical_dashboard_handler,
        user_message_handler,
    ),
    tags(
        (name = "LifeGuard API", description = "Wearable snapshots and the AI health assistant.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Latest 24-hour wearable snapshot.
///
/// Heart rate, activity, blood pressure, last night's sleep and the composite risk score.
#[utoipa::path(
    get,
    path = "/api/health-signals",
    responses(
        (status = 200, description = "The current health signals"),
        (status = 502, description = "The wearable feed is unavailable"),
        (status = 504, description = "The wearable feed timed out")
    )
)]
pub async fn health_signals_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let signals = app_state.health.fetch_health_signals().await?;
    Ok(Json(signals))
}

/// Richer snapshot for the Historical Dashboard: SpO2, steps and stress included.
#[utoipa::path(
    get,
    path = "/api/historical-dashboard",
    responses(
        (status = 200, description = "The historical dashboard data"),
        (status = 502, description = "The wearable feed is unavailable"),
        (status = 504, description = "The wearable feed timed out")
    )
)]
pub async fn historical_dashboard_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let dashboard = app_state.health.fetch_historical_dashboard().await?;
    Ok(Json(dashboard))
}

/// Ask the AI health assistant a question.
///
/// The body is a chat message of type `user`; the reply is a message of type `ai`.
#[utoipa::path(
    post,
    path = "/lg/user-message",
    request_body(content_type = "application/json", description = "A `Message` with `type: user`."),
    responses(
        (status = 200, description = "The assistant's reply"),
        (status = 400, description = "The message is not a user message"),
        (status = 502, description = "The assistant is unavailable")
    )
)]
pub async fn user_message_handler(
    State(app_state): State<Arc<AppState>>,
    Json(message): Json<Message>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if message.kind != MessageKind::User {
        return Err((
            StatusCode::BAD_REQUEST,
            "Only messages of type 'user' can be answered".to_string(),
        ));
    }
    info!("Answering chat message {}", message.id);

    match app_state.chat.send_user_message(&message).await {
        Ok(reply) => Ok(Json(reply)),
        Err(e) => {
            error!("Failed to answer chat message {}: {:?}", message.id, e);
            let err = ApiError::from(e);
            Err((err.status_code(), "Failed to answer the message".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemorySurveyFlags, SimulatedHealthAdapter};
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use chrono::Utc;
    use lifeguard_core::loader::RetryPolicy;
    use lifeguard_core::ports::{ChatService, PortError, PortResult};
    use pretty_assertions::assert_eq;

    struct Canned(PortResult<&'static str>);

    #[async_trait]
    impl ChatService for Canned {
        async fn send_user_message(&self, _message: &Message) -> PortResult<Message> {
            self.0.clone().map(|text| Message::ai(text, Utc::now()))
        }
    }

    fn state(chat: Canned) -> Arc<AppState> {
        Arc::new(AppState {
            retry_policy: RetryPolicy::default(),
            health: Arc::new(SimulatedHealthAdapter::new()),
            chat: Arc::new(chat),
            reports: None,
            survey_flags: Arc::new(InMemorySurveyFlags::new()),
        })
    }

    #[tokio::test]
    async fn health_signals_are_served_as_camel_case_json() {
        let response = health_signals_handler(State(state(Canned(Ok("")))))
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["heartRate"].as_array().map(Vec::len), Some(24));
        assert!(json["riskScore"].is_number());
    }

    #[tokio::test]
    async fn user_messages_get_an_ai_reply() {
        let message = Message::user("Explain my risk", Utc::now());
        let app_state = state(Canned(Ok("Your risk is low")));
        let response = user_message_handler(State(app_state), Json(message))
            .await
            .unwrap()
            .into_response();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let reply: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(reply["type"], "ai");
        assert_eq!(reply["text"], "Your risk is low");
    }

    #[tokio::test]
    async fn ai_messages_are_rejected() {
        let message = Message::ai("hello", Utc::now());
        let err = user_message_handler(State(state(Canned(Ok("")))), Json(message))
            .await
            .map(|_| ())
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn assistant_outages_map_to_bad_gateway() {
        let message = Message::user("hi", Utc::now());
        let err = user_message_handler(
            State(state(Canned(Err(PortError::Unavailable("down".into()))))),
            Json(message),
        )
        .await
        .map(|_| ())
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_GATEWAY);
    }
}
