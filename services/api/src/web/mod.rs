pub mod chart_task;
pub mod chat_task;
pub mod connection;
pub mod protocol;
pub mod report_task;
pub mod rest;
pub mod state;
pub mod ws_handler;

// Re-export the handlers the server binary wires into its router.
pub use rest::{health_signals_handler, historical_dashboard_handler, user_message_handler};
pub use ws_handler::ws_handler;
