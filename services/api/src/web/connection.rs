//! services/api/src/web/connection.rs
//!
//! One LifeGuard session hosted for one WebSocket connection. The connection owns
//! the Session Controller and whichever stage is currently mounted (the survey
//! wizard or the dashboard), applies each client message to it, and queues the
//! resulting server messages on the outbox. Port calls run as background tasks
//! so a slow collaborator never holds up the next client message.

use crate::web::{
    chart_task::{spawn_chart_load, ChartKind},
    chat_task::spawn_chat_reply,
    protocol::{ClientMessage, ServerMessage},
    report_task::{spawn_report, PDF_FAILURE},
    state::{AppState, Outbox, SessionEvent},
};
use lifeguard_core::{
    auth::{self, SubmitError},
    dashboard::{ActiveView, Dashboard, Tab},
    devices::DeviceScanner,
    domain::ReportRequest,
    reminders::{ReminderBoard, ReminderError, RECOMMENDATIONS},
    session::{SessionController, Stage},
    setup::HealthModelForm,
    survey::{Advance, SurveyWizard},
};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct Connection {
    app_state: Arc<AppState>,
    outbox: Outbox,
    session: SessionController,
    survey: Option<SurveyWizard>,
    dashboard: Option<Dashboard>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl Connection {
    pub fn new(app_state: Arc<AppState>, outbox: Outbox) -> Self {
        let session = SessionController::new(app_state.survey_flags.clone());
        let (events_tx, events) = mpsc::unbounded_channel();
        Self {
            app_state,
            outbox,
            session,
            survey: None,
            dashboard: None,
            events_tx,
            events,
        }
    }

    /// Announces the initial (Auth) screen.
    pub fn start(&mut self) {
        self.sync_stage();
    }

    /// Tears down the mounted stage. Every timer and in-flight load stops.
    pub fn close(&mut self) {
        if let Some(mut dashboard) = self.dashboard.take() {
            dashboard.teardown();
        }
        self.survey = None;
    }

    //=====================================================================================
    // Dispatch
    //=====================================================================================

    pub async fn handle(&mut self, message: ClientMessage) {
        debug!("Handling {:?}", message);
        match message {
            // --- Session ---
            ClientMessage::SubmitAuth(form) => match auth::submit(&form, &mut self.session) {
                Ok(()) => self.sync_stage(),
                Err(SubmitError::Invalid(e)) => self.outbox.send(ServerMessage::alert(e)),
                Err(SubmitError::Session(e)) => self.outbox.send(ServerMessage::error(e)),
            },
            ClientMessage::ToggleTheme => {
                self.session.toggle_theme();
                self.send_screen();
            }
            ClientMessage::Logout => match self.session.logout() {
                Ok(()) => self.sync_stage(),
                Err(e) => self.outbox.send(ServerMessage::error(e)),
            },

            // --- Onboarding survey ---
            ClientMessage::SelectFeeling { value } => {
                self.with_survey(|wizard| wizard.select_feeling(value))
            }
            ClientMessage::SelectSleepQuality { value } => {
                self.with_survey(|wizard| wizard.select_sleep_quality(value))
            }
            ClientMessage::SelectStressLevel { value } => {
                self.with_survey(|wizard| wizard.select_stress_level(value))
            }
            ClientMessage::SelectActivityLevel { value } => {
                self.with_survey(|wizard| wizard.select_activity_level(value))
            }
            ClientMessage::ToggleConcern { concern } => self.with_survey(|wizard| {
                wizard.toggle_concern(concern);
            }),
            ClientMessage::SetSymptoms { text } => {
                self.with_survey(|wizard| wizard.set_symptoms(text))
            }
            ClientMessage::SurveyBack => self.with_survey(|wizard| {
                wizard.back();
            }),
            ClientMessage::SurveyNext => self.survey_next().await,

            // --- Dashboard ---
            ClientMessage::SelectTab { tab } => self.select_tab(tab),
            ClientMessage::SosPress => {
                let Some(user) = self.session.state().user().cloned() else {
                    return self.not_mounted("sos_press");
                };
                match self.dashboard.as_mut() {
                    Some(dashboard) => {
                        dashboard.sos_mut().press(&user);
                    }
                    None => self.not_mounted("sos_press"),
                }
            }
            ClientMessage::SosCancel => match self.dashboard.as_mut() {
                Some(dashboard) => {
                    dashboard.sos_mut().cancel();
                }
                None => self.not_mounted("sos_cancel"),
            },
            ClientMessage::SosConfirm => {
                let health_model = self.session.state().health_model().cloned();
                match self.dashboard.as_mut() {
                    Some(dashboard) => {
                        dashboard.sos_mut().confirm(health_model.as_ref());
                    }
                    None => self.not_mounted("sos_confirm"),
                }
            }
            ClientMessage::SubmitHealthModel(form) => self.submit_health_model(form),
            ClientMessage::SendChat { text } => self.send_chat(&text),
            ClientMessage::ReloadChart => self.reload_chart(),
            ClientMessage::ToggleReminder { id } => {
                self.with_reminders(|board| board.toggle(&id).map(|_| ()))
            }
            ClientMessage::UpdateReminderFrequency { id, frequency } => {
                self.with_reminders(|board| board.update_frequency(&id, &frequency))
            }
            ClientMessage::AddReminder {
                title,
                time,
                frequency,
            } => self.with_reminders(|board| {
                board.add_custom(&title, &time, &frequency).map(|_| ())
            }),
            ClientMessage::RemoveReminder { id } => {
                self.with_reminders(|board| board.remove(&id).map(|_| ()))
            }
            ClientMessage::SaveReminders => self.with_reminders(|board| {
                board.save();
                Ok(())
            }),
            ClientMessage::OpenDevices => self.open_devices(),
            ClientMessage::CloseDevices => self.close_devices(),
            ClientMessage::ScanDevices => self.with_devices(|scanner| {
                scanner.start_scan();
            }),
            ClientMessage::ToggleDevice { id } => self.with_devices(|scanner| {
                if scanner.toggle(&id).is_none() {
                    warn!("No device with id {}", id);
                }
            }),
            ClientMessage::DownloadReport => self.download_report(),
        }
    }

    /// Waits for the next background result. Never yields `None` while the
    /// connection is alive, since it keeps a sender of its own.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Folds a background result into the session. Results for a view that has
    /// since been unmounted are dropped.
    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::ChatReply { view, reply } => {
                if view.is_cancelled() {
                    debug!("Discarding a chat reply for an unmounted view");
                    return;
                }
                let Some(chat) = self.dashboard.as_mut().and_then(|d| d.chat_mut()) else {
                    return;
                };
                chat.receive(reply);
                self.outbox.send(ServerMessage::chat(chat.messages()));
            }
        }
    }

    //=====================================================================================
    // Stage Mounting
    //=====================================================================================

    /// Mounts the stage the session now calls for, unmounts the others, and
    /// announces the screen.
    fn sync_stage(&mut self) {
        let stage = self.session.stage();

        if stage != Stage::Dashboard {
            if let Some(mut dashboard) = self.dashboard.take() {
                info!("Unmounting dashboard");
                dashboard.teardown();
            }
        }
        if stage != Stage::Survey {
            self.survey = None;
        }

        self.send_screen();

        match stage {
            Stage::Auth => {}
            Stage::Survey => {
                if self.survey.is_none() {
                    self.survey = Some(SurveyWizard::new());
                }
                self.send_survey_step();
            }
            Stage::Dashboard => {
                if self.dashboard.is_none() {
                    let dashboard = Dashboard::new();
                    forward_watch(
                        dashboard.sos().subscribe(),
                        dashboard.lifecycle_token(),
                        self.outbox.clone(),
                        |sos| ServerMessage::Sos { sos },
                    );
                    self.dashboard = Some(dashboard);
                    self.announce_tab();
                }
            }
        }
    }

    fn send_screen(&self) {
        self.outbox.send(ServerMessage::Screen {
            screen: self.session.active_screen(),
            dark_mode: self.session.state().dark_mode(),
        });
    }

    fn not_mounted(&self, operation: &str) {
        let stage = self.session.stage();
        warn!("{} ignored while the {} screen is mounted", operation, stage);
        self.outbox.send(ServerMessage::error(format!(
            "`{}` is not available on the {} screen",
            operation, stage
        )));
    }

    //=====================================================================================
    // Survey
    //=====================================================================================

    fn with_survey<F: FnOnce(&mut SurveyWizard)>(&mut self, apply: F) {
        match self.survey.as_mut() {
            Some(wizard) => {
                apply(wizard);
                self.send_survey_step();
            }
            None => self.not_mounted("survey"),
        }
    }

    fn send_survey_step(&self) {
        let (Some(wizard), Some(user)) = (self.survey.as_ref(), self.session.state().user()) else {
            return;
        };
        self.outbox.send(ServerMessage::SurveyStep {
            greeting: format!("Welcome, {}!", user.first_name()),
            step: wizard.step(),
            progress: wizard.progress(),
            can_proceed: wizard.can_proceed(),
            data: wizard.data().clone(),
        });
    }

    async fn survey_next(&mut self) {
        let Some(wizard) = self.survey.as_mut() else {
            return self.not_mounted("survey_next");
        };
        match wizard.next() {
            Advance::Moved(_) | Advance::Blocked(_) => self.send_survey_step(),
            Advance::Completed(data) => match self.session.complete_survey(&data).await {
                Ok(lifestyle) => {
                    info!("Survey complete; derived lifestyle {}", lifestyle);
                    self.sync_stage();
                }
                Err(e) => self.outbox.send(ServerMessage::error(e)),
            },
        }
    }

    //=====================================================================================
    // Dashboard Views
    //=====================================================================================

    fn select_tab(&mut self, tab: Tab) {
        let Some(dashboard) = self.dashboard.as_mut() else {
            return self.not_mounted("select_tab");
        };
        match dashboard.select_tab(tab) {
            Ok(true) => self.announce_tab(),
            Ok(false) => {}
            Err(e) => self.outbox.send(ServerMessage::error(e)),
        }
    }

    /// Tells the client which view is mounted and sends that view's initial data.
    fn announce_tab(&self) {
        let Some(dashboard) = self.dashboard.as_ref() else {
            return;
        };
        let tab = dashboard.active_tab();
        self.outbox.send(ServerMessage::TabChanged {
            tab,
            label: tab.label().to_string(),
        });

        match dashboard.view() {
            ActiveView::Setup(form) => {
                self.outbox.send(ServerMessage::SetupForm { form: form.clone() });
                if let Some(model) = self.session.state().health_model() {
                    self.outbox.send(ServerMessage::HealthModelSaved {
                        baseline: model.baseline(),
                    });
                }
            }
            ActiveView::AiAnalysis(chat) => {
                self.outbox.send(ServerMessage::chat(chat.messages()));
            }
            ActiveView::Recommendations(board) => {
                self.outbox.send(ServerMessage::Reminders {
                    reminders: board.reminders().to_vec(),
                    recommendations: RECOMMENDATIONS.to_vec(),
                });
            }
            ActiveView::HealthSignals | ActiveView::Historical => self.reload_chart(),
            ActiveView::Overview(_) | ActiveView::Alerts | ActiveView::Profile => {}
        }
    }

    fn reload_chart(&self) {
        let Some(dashboard) = self.dashboard.as_ref() else {
            return self.not_mounted("reload_chart");
        };
        match ChartKind::for_tab(dashboard.active_tab()) {
            Some(kind) => {
                spawn_chart_load(
                    kind,
                    self.app_state.clone(),
                    self.outbox.clone(),
                    dashboard.view_token(),
                );
            }
            None => self.outbox.send(ServerMessage::error("No chart is mounted")),
        }
    }

    fn submit_health_model(&mut self, submitted: HealthModelForm) {
        let Some(form) = self.dashboard.as_mut().and_then(|d| d.setup_form_mut()) else {
            return self.not_mounted("submit_health_model");
        };
        *form = submitted;
        match form.submit() {
            Ok(model) => {
                let baseline = model.baseline();
                match self.session.set_health_model(model) {
                    Ok(()) => {
                        self.send_screen();
                        self.outbox.send(ServerMessage::HealthModelSaved { baseline });
                    }
                    Err(e) => self.outbox.send(ServerMessage::error(e)),
                }
            }
            Err(e) => self.outbox.send(ServerMessage::alert(e)),
        }
    }

    fn send_chat(&mut self, text: &str) {
        let Some(dashboard) = self.dashboard.as_mut() else {
            return self.not_mounted("send_chat");
        };
        let view = dashboard.view_token();
        let Some(chat) = dashboard.chat_mut() else {
            return self.not_mounted("send_chat");
        };
        let Some(outgoing) = chat.submit(text) else {
            return;
        };
        self.outbox.send(ServerMessage::chat(chat.messages()));
        spawn_chat_reply(
            self.app_state.chat.clone(),
            outgoing,
            self.events_tx.clone(),
            view,
        );
    }

    fn with_reminders<F>(&mut self, apply: F)
    where
        F: FnOnce(&mut ReminderBoard) -> Result<(), ReminderError>,
    {
        let Some(board) = self.dashboard.as_mut().and_then(|d| d.reminders_mut()) else {
            return self.not_mounted("reminders");
        };
        if let Err(e) = apply(board) {
            warn!("Reminder update rejected: {}", e);
            self.outbox.send(ServerMessage::alert(e));
        }
        self.outbox.send(ServerMessage::Reminders {
            reminders: board.reminders().to_vec(),
            recommendations: RECOMMENDATIONS.to_vec(),
        });
    }

    fn open_devices(&mut self) {
        let Some(dashboard) = self.dashboard.as_mut() else {
            return self.not_mounted("open_devices");
        };
        let token = dashboard.view_token();
        let Some(overview) = dashboard.overview_mut() else {
            return self.not_mounted("open_devices");
        };
        let already_open = overview.devices().is_some();
        let scanner = overview.open_devices(&token);
        if !already_open {
            forward_watch(
                scanner.subscribe(),
                token,
                self.outbox.clone(),
                |scanning| ServerMessage::DeviceScan { scanning },
            );
        }
        self.outbox.send(devices_snapshot(scanner));
    }

    fn close_devices(&mut self) {
        let closed = self
            .dashboard
            .as_mut()
            .and_then(|d| d.overview_mut())
            .map(|overview| overview.close_devices());
        match closed {
            Some(_) => self.outbox.send(ServerMessage::DevicesClosed),
            None => self.not_mounted("close_devices"),
        }
    }

    fn with_devices<F: FnOnce(&mut DeviceScanner)>(&mut self, apply: F) {
        let Some(scanner) = self
            .dashboard
            .as_mut()
            .and_then(|d| d.overview_mut())
            .and_then(|overview| overview.devices_mut())
        else {
            return self.not_mounted("devices");
        };
        apply(scanner);
        self.outbox.send(devices_snapshot(scanner));
    }

    fn download_report(&mut self) {
        let Some(dashboard) = self.dashboard.as_ref() else {
            return self.not_mounted("download_report");
        };
        let Some(user) = self.session.state().user() else {
            return self.not_mounted("download_report");
        };
        let Some(reports) = self.app_state.reports.clone() else {
            warn!("PDF requested but no report collaborator is configured");
            return self.outbox.send(ServerMessage::alert(PDF_FAILURE));
        };
        spawn_report(
            reports,
            ReportRequest::for_user(user),
            self.outbox.clone(),
            dashboard.lifecycle_token(),
        );
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

fn devices_snapshot(scanner: &DeviceScanner) -> ServerMessage {
    ServerMessage::devices(scanner.devices(), scanner.is_scanning())
}

/// Relays every change of a watched value to the client until `token` is
/// cancelled or the value's owner goes away.
fn forward_watch<T, F>(
    mut rx: watch::Receiver<T>,
    token: CancellationToken,
    outbox: Outbox,
    to_message: F,
) where
    T: Clone + Send + Sync + 'static,
    F: Fn(T) -> ServerMessage + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let value = rx.borrow_and_update().clone();
                    outbox.send(to_message(value));
                }
            }
        }
    });
}
