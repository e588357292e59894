//! crates/lifeguard_core/src/chat.rs
//!
//! The AI Analysis conversation: a local message list backed by the chat port.
//! The port call itself happens elsewhere; the session only records both sides.

use chrono::Utc;
use tracing::error;

use crate::domain::Message;
use crate::ports::PortResult;

pub const GREETING: &str =
    "Hello! I'm your AI Health Assistant. Ask me anything about your risk assessment.";

pub const FALLBACK_REPLY: &str = "Sorry, something went wrong while contacting the server.";

pub const QUICK_REPLIES: [&str; 4] = [
    "Explain my risk",
    "What should I do now?",
    "How serious is this?",
    "Show improvement tips",
];

#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<Message>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        let mut greeting = Message::ai(GREETING, Utc::now());
        greeting.id = "1".to_string();
        Self {
            messages: vec![greeting],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Starts an exchange: appends the user's message and returns it for the
    /// chat port. Blank input is ignored.
    pub fn submit(&mut self, text: &str) -> Option<Message> {
        if text.trim().is_empty() {
            return None;
        }
        let outgoing = Message::user(text, Utc::now());
        self.messages.push(outgoing.clone());
        Some(outgoing)
    }

    /// Completes an exchange with the port's answer. A failed call appends a
    /// canned apology instead of the reply.
    pub fn receive(&mut self, reply: PortResult<Message>) -> &Message {
        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => {
                error!("Chat message failed: {}", e);
                Message::ai(FALLBACK_REPLY, Utc::now())
            }
        };
        self.messages.push(reply);
        &self.messages[self.messages.len() - 1]
    }
}
