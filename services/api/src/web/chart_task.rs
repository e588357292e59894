//! services/api/src/web/chart_task.rs
//!
//! Background loading of the chart data behind the Health Signals and Historical
//! Dashboard views. A load is bound to the view's token: switching tabs or
//! closing the socket abandons it silently.

use crate::web::{
    protocol::ServerMessage,
    state::{AppState, Outbox},
};
use lifeguard_core::{
    dashboard::Tab,
    loader::{load_with_retry, ChartLoad},
};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Which chart set a view displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    HealthSignals,
    Historical,
}

impl ChartKind {
    pub fn for_tab(tab: Tab) -> Option<Self> {
        match tab {
            Tab::HealthSignals => Some(ChartKind::HealthSignals),
            Tab::Historical => Some(ChartKind::Historical),
            _ => None,
        }
    }
}

/// Announces `Loading` right away, then fetches in the background.
pub fn spawn_chart_load(
    kind: ChartKind,
    app_state: Arc<AppState>,
    outbox: Outbox,
    token: CancellationToken,
) -> JoinHandle<()> {
    outbox.send(match kind {
        ChartKind::HealthSignals => ServerMessage::health_signals(ChartLoad::Loading),
        ChartKind::Historical => ServerMessage::historical(ChartLoad::Loading),
    });

    tokio::spawn(async move {
        let policy = app_state.retry_policy;
        let health = &app_state.health;
        let message = match kind {
            ChartKind::HealthSignals => {
                load_with_retry("health signals", policy, &token, || {
                    health.fetch_health_signals()
                })
                .await
                .map(ServerMessage::health_signals)
            }
            ChartKind::Historical => {
                load_with_retry("historical dashboard", policy, &token, || {
                    health.fetch_historical_dashboard()
                })
                .await
                .map(ServerMessage::historical)
            }
        };

        match message {
            Some(message) => {
                info!("{:?} chart load finished", kind);
                outbox.send(message);
            }
            None => debug!("{:?} chart load abandoned", kind),
        }
    })
}
