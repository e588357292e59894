//! services/api/src/web/chat_task.rs
//!
//! Posts a chat message to the assistant in the background. The reply comes back
//! to the connection as a `SessionEvent`; leaving the AI Analysis view or closing
//! the socket drops the request.

use crate::web::state::SessionEvent;
use lifeguard_core::{domain::Message, ports::ChatService};
use std::sync::Arc;
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub fn spawn_chat_reply(
    chat: Arc<dyn ChatService>,
    outgoing: Message,
    events: UnboundedSender<SessionEvent>,
    view: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            biased;
            _ = view.cancelled() => debug!("Chat message {} abandoned", outgoing.id),
            reply = chat.send_user_message(&outgoing) => {
                info!("Chat message {} answered", outgoing.id);
                if events.send(SessionEvent::ChatReply { view, reply }).is_err() {
                    debug!("Dropping chat reply; the connection is gone.");
                }
            }
        }
    })
}
