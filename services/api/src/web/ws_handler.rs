//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket connection.
//! Each connection hosts one LifeGuard session; a writer task drains the outbox
//! onto the socket while the read loop feeds client messages and finished
//! background requests to the session.

use crate::error::ApiError;
use crate::web::{
    connection::Connection,
    protocol::{ClientMessage, ServerMessage},
    state::{AppState, Outbound, Outbox},
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info, warn};

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New WebSocket connection established.");

    let (sender, mut receiver) = socket.split();
    let (outbox, outbound) = Outbox::channel();
    let writer = tokio::spawn(write_outbound(sender, outbound));

    // --- 1. Mount the Auth screen ---
    let mut connection = Connection::new(app_state, outbox.clone());
    connection.start();

    // --- 2. Main Message Loop ---
    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    match serde_json::from_str::<ClientMessage>(text.as_str()) {
                        Ok(message) => connection.handle(message).await,
                        Err(e) => {
                            warn!("Failed to deserialize client message: {}", e);
                            outbox.send(ServerMessage::error(format!(
                                "Unrecognised message: {}",
                                e
                            )));
                        }
                    }
                }
                Some(Ok(Message::Close(_))) => {
                    info!("Client sent close message.");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("{}", ApiError::from(e));
                    break;
                }
                None => {
                    info!("Client disconnected.");
                    break;
                }
            },
            Some(event) = connection.next_event() => connection.apply(event),
        }
    }

    // --- 3. Cleanup ---
    connection.close();
    drop(connection);
    drop(outbox);
    writer.abort();
    info!("WebSocket connection closed.");
}

/// Serializes queued frames onto the socket until the queue closes or the
/// socket fails.
async fn write_outbound(
    mut sender: SplitSink<WebSocket, Message>,
    mut outbound: UnboundedReceiver<Outbound>,
) {
    while let Some(frame) = outbound.recv().await {
        let message = match frame {
            Outbound::Text(message) => match serde_json::to_string(&message) {
                Ok(json) => Message::Text(json.into()),
                Err(e) => {
                    error!("Failed to serialize server message: {}", e);
                    continue;
                }
            },
            Outbound::Binary(bytes) => Message::Binary(bytes.into()),
        };
        if let Err(e) = sender.send(message).await {
            error!("{}; stopping the writer.", ApiError::from(e));
            break;
        }
    }
}
