//! services/api/src/web/state.rs
//!
//! Defines the application's shared state, the per-connection outbound queue and
//! the events background requests hand back to their connection.

use crate::web::protocol::ServerMessage;
use lifeguard_core::{
    domain::Message,
    loader::RetryPolicy,
    ports::{ChatService, HealthDataService, PortResult, ReportService, SurveyFlagStore},
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub health: Arc<dyn HealthDataService>,
    pub chat: Arc<dyn ChatService>,
    /// Absent when no PDF collaborator is configured.
    pub reports: Option<Arc<dyn ReportService>>,
    pub survey_flags: Arc<dyn SurveyFlagStore>,
    pub retry_policy: RetryPolicy,
}

//=========================================================================================
// Outbox (Specific to One WebSocket Connection)
//=========================================================================================

/// A frame queued for the socket writer.
#[derive(Debug, Clone)]
pub enum Outbound {
    Text(ServerMessage),
    Binary(Vec<u8>),
}

/// Cloneable handle for queueing frames. Background tasks (timers, chart loads)
/// hold one; the writer task owns the receiving end.
#[derive(Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl Outbox {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, message: ServerMessage) {
        if self.tx.send(Outbound::Text(message)).is_err() {
            debug!("Dropping outbound message; the socket writer is gone.");
        }
    }

    pub fn send_binary(&self, bytes: Vec<u8>) {
        if self.tx.send(Outbound::Binary(bytes)).is_err() {
            debug!("Dropping outbound binary frame; the socket writer is gone.");
        }
    }
}

//=========================================================================================
// Session Events (Background Results Folded Back Into the Session)
//=========================================================================================

/// A finished background request whose result changes session state. Carries
/// the token of the view that asked, so a stale result can be recognised.
#[derive(Debug)]
pub enum SessionEvent {
    ChatReply {
        view: CancellationToken,
        reply: PortResult<Message>,
    },
}
