//! services/api/src/web/report_task.rs
//!
//! Renders the health report in the background and streams it to the client.
//! The request lives as long as the dashboard; logging out or closing the
//! socket abandons it.

use crate::web::{protocol::ServerMessage, state::Outbox};
use chrono::Utc;
use lifeguard_core::{
    domain::{report_file_name, ReportRequest},
    ports::ReportService,
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// The blocking message shown for any report failure.
pub const PDF_FAILURE: &str = "Failed to generate PDF";

pub fn spawn_report(
    reports: Arc<dyn ReportService>,
    request: ReportRequest,
    outbox: Outbox,
    lifecycle: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = tokio::select! {
            biased;
            _ = lifecycle.cancelled() => {
                debug!("Report for {} abandoned", request.email);
                return;
            }
            result = reports.generate_pdf(&request) => result,
        };

        match result {
            Ok(bytes) => {
                let file_name = report_file_name(Utc::now().date_naive());
                info!("Report {} generated ({} bytes)", file_name, bytes.len());
                outbox.send(ServerMessage::ReportReady {
                    file_name,
                    size: bytes.len(),
                });
                outbox.send_binary(bytes);
            }
            Err(e) => {
                error!("PDF generation failed: {}", e);
                outbox.send(ServerMessage::alert(PDF_FAILURE));
            }
        }
    })
}
