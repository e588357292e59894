//! services/api/src/adapters/chat_llm.rs
//!
//! The built-in AI analysis assistant. It implements the `ChatService` port
//! from the `core` crate with an OpenAI chat model.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use chrono::Utc;
use lifeguard_core::{
    domain::Message,
    ports::{ChatService, PortError, PortResult},
};
use std::time::Duration;
use tracing::info;

/// Primes the model as the LifeGuard explainer, with the current trend snapshot.
const EXPLAINER_PROMPT: &str = r#"You are an AI health explanation assistant for a system called LifeGuard.
You do NOT diagnose medical conditions.
Your job is to clearly explain health risk trends in simple language and suggest safe, general actions.

{
  "heartRateTrend": "gradually increasing over the last 4 hours",
  "hrvTrend": "decreasing, showing stress buildup",
  "sleepTrend": "sleep duration reduced for 2 days",
  "activityTrend": "lower than usual",
  "stressTrend": "moderate and fluctuating",
  "riskScore": 68,
  "state": "Pre-Anomaly"
}
Answer as a single plain-text paragraph."#;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct OpenAiChatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiChatAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds the OpenAI client over an HTTP client that gives up after
    /// `timeout`, so a hung upstream surfaces as `PortError::Timeout`.
    pub fn with_timeout(
        api_key: &str,
        model: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        let client = Client::with_config(OpenAIConfig::new().with_api_key(api_key))
            .with_http_client(http_client);
        Ok(Self::new(client, model))
    }
}

//=========================================================================================
// `ChatService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ChatService for OpenAiChatAdapter {
    async fn send_user_message(&self, message: &Message) -> PortResult<Message> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(EXPLAINER_PROMPT)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(message.text.as_str())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        info!("Asking {} about message {}", self.model, message.id);
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Chat LLM response contained no text content.".to_string())
            })?;

        Ok(Message::ai(text, Utc::now()))
    }
}

fn map_openai_error(e: OpenAIError) -> PortError {
    match e {
        OpenAIError::Reqwest(inner) if inner.is_timeout() => PortError::Timeout,
        OpenAIError::Reqwest(inner) => PortError::Unavailable(inner.to_string()),
        other => PortError::Unexpected(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_builds_with_a_request_timeout() {
        let adapter = OpenAiChatAdapter::with_timeout(
            "sk-test",
            "gpt-4o-mini".to_string(),
            Duration::from_secs(5),
        );
        assert!(adapter.is_ok());
    }

    #[test]
    fn non_transport_failures_are_unexpected() {
        let err = map_openai_error(OpenAIError::InvalidArgument("bad model".into()));
        assert!(matches!(err, PortError::Unexpected(msg) if msg.contains("bad model")));
    }
}
