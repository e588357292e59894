//! crates/lifeguard_core/src/sos.rs
//!
//! The emergency SOS sub-flow hosted by the dashboard:
//! `Idle -> Confirming -> { Idle (cancel), Sent (confirm) }`, with `Sent`
//! reverting to `Idle` on a fixed timer.
//!
//! The timer is bound to the flow's lifecycle token, so tearing the dashboard
//! down (or dropping the flow) cancels it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::{HealthModel, SosAlert, User};

pub const SOS_DISMISS_AFTER: Duration = Duration::from_secs(5);

/// What the confirmation modal shows: who is sending, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SosPrompt {
    pub name: String,
    pub email: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SosState {
    Idle,
    Confirming { prompt: SosPrompt },
    /// No manual dismiss exists; only the timer leaves this state.
    Sent,
}

pub struct SosFlow {
    state: Arc<watch::Sender<SosState>>,
    alerts: Vec<SosAlert>,
    dismissal: Option<CancellationToken>,
    lifecycle: CancellationToken,
}

impl SosFlow {
    pub fn new(lifecycle: CancellationToken) -> Self {
        let (state, _) = watch::channel(SosState::Idle);
        Self {
            state: Arc::new(state),
            alerts: Vec::new(),
            dismissal: None,
            lifecycle,
        }
    }

    pub fn state(&self) -> SosState {
        self.state.borrow().clone()
    }

    /// A receiver that observes every transition, including the timed revert.
    pub fn subscribe(&self) -> watch::Receiver<SosState> {
        self.state.subscribe()
    }

    /// Every alert confirmed during this flow's lifetime.
    pub fn alerts(&self) -> &[SosAlert] {
        &self.alerts
    }

    /// Opens the confirmation modal with a fresh timestamp.
    ///
    /// Ignored while already confirming. Pressing while `Sent` cancels the
    /// pending revert and opens a new confirmation.
    pub fn press(&mut self, user: &User) -> bool {
        if matches!(*self.state.borrow(), SosState::Confirming { .. }) {
            return false;
        }
        self.cancel_dismissal();
        let prompt = SosPrompt {
            name: user.name.clone(),
            email: user.email.clone(),
            timestamp: Utc::now(),
        };
        info!("SOS confirmation opened for {}", prompt.email);
        self.state.send_replace(SosState::Confirming { prompt });
        true
    }

    pub fn cancel(&mut self) -> bool {
        if !matches!(*self.state.borrow(), SosState::Confirming { .. }) {
            return false;
        }
        info!("SOS cancelled");
        self.state.send_replace(SosState::Idle);
        true
    }

    /// Records exactly one alert and moves to `Sent`. Returns `None` unless confirming.
    ///
    /// The alert is only logged locally; dispatching it anywhere is left to the caller.
    pub fn confirm(&mut self, health_model: Option<&HealthModel>) -> Option<SosAlert> {
        let prompt = match &*self.state.borrow() {
            SosState::Confirming { prompt } => prompt.clone(),
            _ => return None,
        };

        let alert = SosAlert {
            name: prompt.name,
            email: prompt.email,
            timestamp: Utc::now(),
            health_model: health_model.cloned(),
        };
        warn!(
            user = %alert.name,
            email = %alert.email,
            timestamp = %alert.timestamp,
            health_model = ?alert.health_model,
            "EMERGENCY ALERT SENT"
        );
        self.alerts.push(alert.clone());
        self.state.send_replace(SosState::Sent);
        self.schedule_dismissal();
        Some(alert)
    }

    /// Cancels the pending revert timer, if any.
    pub fn teardown(&mut self) {
        self.cancel_dismissal();
        self.lifecycle.cancel();
    }

    fn schedule_dismissal(&mut self) {
        self.cancel_dismissal();
        let token = self.lifecycle.child_token();
        self.dismissal = Some(token.clone());
        let state = self.state.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("SOS dismissal timer cancelled");
                }
                _ = tokio::time::sleep(SOS_DISMISS_AFTER) => {
                    state.send_if_modified(|s| {
                        if *s == SosState::Sent {
                            *s = SosState::Idle;
                            true
                        } else {
                            false
                        }
                    });
                    debug!("SOS notice dismissed");
                }
            }
        });
    }

    fn cancel_dismissal(&mut self) {
        if let Some(token) = self.dismissal.take() {
            token.cancel();
        }
    }
}

impl Drop for SosFlow {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Lifestyle, Sex};
    use pretty_assertions::assert_eq;

    fn jane() -> User {
        User::new("Jane Doe", "jane@x.com")
    }

    #[tokio::test]
    async fn press_opens_confirmation_with_user_details() {
        let mut flow = SosFlow::new(CancellationToken::new());
        assert!(flow.press(&jane()));
        match flow.state() {
            SosState::Confirming { prompt } => {
                assert_eq!(prompt.name, "Jane Doe");
                assert_eq!(prompt.email, "jane@x.com");
            }
            other => panic!("expected confirming, got {:?}", other),
        }
        assert!(!flow.press(&jane()));
    }

    #[tokio::test]
    async fn cancel_returns_to_idle_without_alert() {
        let mut flow = SosFlow::new(CancellationToken::new());
        flow.press(&jane());
        assert!(flow.cancel());
        assert_eq!(flow.state(), SosState::Idle);
        assert!(flow.alerts().is_empty());
        assert!(!flow.cancel());
    }

    #[tokio::test]
    async fn confirm_requires_confirmation() {
        let mut flow = SosFlow::new(CancellationToken::new());
        assert_eq!(flow.confirm(None), None);
        assert!(flow.alerts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn confirm_records_one_alert_and_reverts_after_five_seconds() {
        let mut flow = SosFlow::new(CancellationToken::new());
        let model = HealthModel {
            age: 30,
            sex: Sex::Female,
            condition: None,
            lifestyle: Lifestyle::Active,
        };
        flow.press(&jane());
        let alert = flow.confirm(Some(&model)).unwrap();
        assert_eq!(alert.name, "Jane Doe");
        assert_eq!(alert.email, "jane@x.com");
        assert_eq!(alert.health_model, Some(model));
        assert_eq!(flow.alerts().len(), 1);
        assert_eq!(flow.state(), SosState::Sent);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(flow.state(), SosState::Sent);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(flow.state(), SosState::Idle);
        assert_eq!(flow.alerts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_the_timed_revert() {
        let mut flow = SosFlow::new(CancellationToken::new());
        let mut rx = flow.subscribe();
        flow.press(&jane());
        flow.confirm(None);
        rx.borrow_and_update();

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), SosState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_cancels_the_timer() {
        let mut flow = SosFlow::new(CancellationToken::new());
        let rx = flow.subscribe();
        flow.press(&jane());
        flow.confirm(None);
        drop(flow);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(*rx.borrow(), SosState::Sent);
    }

    #[tokio::test(start_paused = true)]
    async fn pressing_while_sent_cancels_pending_revert() {
        let mut flow = SosFlow::new(CancellationToken::new());
        flow.press(&jane());
        flow.confirm(None);
        assert!(flow.press(&jane()));

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(matches!(flow.state(), SosState::Confirming { .. }));
    }
}
