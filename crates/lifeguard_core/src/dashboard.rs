//! crates/lifeguard_core/src/dashboard.rs
//!
//! The Dashboard Stage: a tab container that mounts exactly one view at a time
//! and hosts the SOS flow.
//!
//! Each mounted view gets its own cancellation token. Switching tabs cancels the
//! previous view's token, so timers and fetches started by that view stop with
//! it. Tearing the dashboard down cancels everything it started.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::chat::ChatSession;
use crate::devices::DeviceScanner;
use crate::reminders::ReminderBoard;
use crate::setup::HealthModelForm;
use crate::sos::SosFlow;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Tab {
    Overview,
    Setup,
    HealthSignals,
    Historical,
    Alerts,
    AiAnalysis,
    Recommendations,
    Profile,
    /// Not reachable from the navigation list; kept so the identifier parses.
    Replay,
    /// Not reachable from the navigation list; kept so the identifier parses.
    Summary,
}

/// The sidebar, in display order.
pub const NAVIGATION: [Tab; 8] = [
    Tab::Overview,
    Tab::Setup,
    Tab::HealthSignals,
    Tab::Historical,
    Tab::Alerts,
    Tab::AiAnalysis,
    Tab::Recommendations,
    Tab::Profile,
];

impl Tab {
    pub fn label(&self) -> &'static str {
        match self {
            Tab::Overview => "Home Page",
            Tab::Setup => "Digital Twin Setup",
            Tab::HealthSignals => "Health Signals",
            Tab::Historical => "Historical Dashboard",
            Tab::Alerts => "Early Warnings",
            Tab::AiAnalysis => "AI Analysis",
            Tab::Recommendations => "Health Recommendations",
            Tab::Profile => "Profile",
            Tab::Replay => "Replay",
            Tab::Summary => "Summary",
        }
    }

    pub fn is_navigable(&self) -> bool {
        NAVIGATION.contains(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DashboardError {
    #[error("The '{0}' view is not reachable from the navigation")]
    UnreachableTab(Tab),
}

/// Local state of the Overview view: the optional "Connect Devices" modal.
#[derive(Default)]
pub struct OverviewView {
    devices: Option<DeviceScanner>,
}

impl OverviewView {
    pub fn devices(&self) -> Option<&DeviceScanner> {
        self.devices.as_ref()
    }

    pub fn devices_mut(&mut self) -> Option<&mut DeviceScanner> {
        self.devices.as_mut()
    }

    /// Opens the modal (if closed) under the given view token.
    pub fn open_devices(&mut self, view_token: &CancellationToken) -> &mut DeviceScanner {
        self.devices
            .get_or_insert_with(|| DeviceScanner::new(view_token.child_token()))
    }

    /// Closes the modal, stopping any scan in progress.
    pub fn close_devices(&mut self) -> bool {
        self.devices.take().is_some()
    }
}

/// The mounted view and whatever state it owns. Rebuilt on every tab switch.
pub enum ActiveView {
    Overview(OverviewView),
    Setup(HealthModelForm),
    HealthSignals,
    Historical,
    Alerts,
    AiAnalysis(ChatSession),
    Recommendations(ReminderBoard),
    Profile,
}

impl ActiveView {
    fn mount(tab: Tab) -> Self {
        match tab {
            Tab::Setup => ActiveView::Setup(HealthModelForm::default()),
            Tab::HealthSignals => ActiveView::HealthSignals,
            Tab::Historical => ActiveView::Historical,
            Tab::Alerts => ActiveView::Alerts,
            Tab::AiAnalysis => ActiveView::AiAnalysis(ChatSession::new()),
            Tab::Recommendations => ActiveView::Recommendations(ReminderBoard::default()),
            Tab::Profile => ActiveView::Profile,
            Tab::Overview | Tab::Replay | Tab::Summary => {
                ActiveView::Overview(OverviewView::default())
            }
        }
    }
}

pub struct Dashboard {
    active_tab: Tab,
    view: ActiveView,
    view_token: CancellationToken,
    lifecycle: CancellationToken,
    sos: SosFlow,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        let lifecycle = CancellationToken::new();
        Self {
            active_tab: Tab::Overview,
            view: ActiveView::mount(Tab::Overview),
            view_token: lifecycle.child_token(),
            sos: SosFlow::new(lifecycle.child_token()),
            lifecycle,
        }
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn view(&self) -> &ActiveView {
        &self.view
    }

    /// Token cancelled when the current view is unmounted.
    pub fn view_token(&self) -> CancellationToken {
        self.view_token.clone()
    }

    /// Token cancelled when the dashboard itself is torn down.
    pub fn lifecycle_token(&self) -> CancellationToken {
        self.lifecycle.clone()
    }

    /// Mounts `tab`. Returns `Ok(false)` when it is already mounted.
    pub fn select_tab(&mut self, tab: Tab) -> Result<bool, DashboardError> {
        if !tab.is_navigable() {
            return Err(DashboardError::UnreachableTab(tab));
        }
        if tab == self.active_tab {
            return Ok(false);
        }
        info!("Dashboard tab {} -> {}", self.active_tab, tab);
        self.view_token.cancel();
        self.view_token = self.lifecycle.child_token();
        self.view = ActiveView::mount(tab);
        self.active_tab = tab;
        Ok(true)
    }

    pub fn sos(&self) -> &SosFlow {
        &self.sos
    }

    pub fn sos_mut(&mut self) -> &mut SosFlow {
        &mut self.sos
    }

    pub fn overview_mut(&mut self) -> Option<&mut OverviewView> {
        match &mut self.view {
            ActiveView::Overview(view) => Some(view),
            _ => None,
        }
    }

    pub fn setup_form_mut(&mut self) -> Option<&mut HealthModelForm> {
        match &mut self.view {
            ActiveView::Setup(form) => Some(form),
            _ => None,
        }
    }

    pub fn chat_mut(&mut self) -> Option<&mut ChatSession> {
        match &mut self.view {
            ActiveView::AiAnalysis(chat) => Some(chat),
            _ => None,
        }
    }

    pub fn reminders_mut(&mut self) -> Option<&mut ReminderBoard> {
        match &mut self.view {
            ActiveView::Recommendations(board) => Some(board),
            _ => None,
        }
    }

    pub fn teardown(&mut self) {
        self.lifecycle.cancel();
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::sos::SosState;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;
    use std::time::Duration;

    #[test]
    fn navigation_lists_eight_tabs() {
        let ids: Vec<String> = NAVIGATION.iter().map(|t| t.to_string()).collect();
        assert_eq!(
            ids,
            vec![
                "overview",
                "setup",
                "health-signals",
                "historical",
                "alerts",
                "ai-analysis",
                "recommendations",
                "profile"
            ]
        );
        assert!(!Tab::Replay.is_navigable());
        assert!(!Tab::Summary.is_navigable());
        assert_eq!(Tab::from_str("ai-analysis").unwrap(), Tab::AiAnalysis);
    }

    #[tokio::test]
    async fn starts_on_overview_and_switches() {
        let mut dashboard = Dashboard::new();
        assert_eq!(dashboard.active_tab(), Tab::Overview);
        assert_eq!(dashboard.select_tab(Tab::Overview), Ok(false));
        assert_eq!(dashboard.select_tab(Tab::AiAnalysis), Ok(true));
        assert!(dashboard.chat_mut().is_some());
        assert!(dashboard.reminders_mut().is_none());
    }

    #[tokio::test]
    async fn dead_tabs_are_rejected() {
        let mut dashboard = Dashboard::new();
        assert_eq!(
            dashboard.select_tab(Tab::Replay),
            Err(DashboardError::UnreachableTab(Tab::Replay))
        );
        assert_eq!(dashboard.active_tab(), Tab::Overview);
    }

    #[tokio::test]
    async fn switching_cancels_the_previous_view_token() {
        let mut dashboard = Dashboard::new();
        let first = dashboard.view_token();
        dashboard.select_tab(Tab::HealthSignals).unwrap();
        assert!(first.is_cancelled());
        assert!(!dashboard.view_token().is_cancelled());
    }

    #[tokio::test]
    async fn view_state_is_rebuilt_on_remount() {
        let mut dashboard = Dashboard::new();
        dashboard.select_tab(Tab::Recommendations).unwrap();
        dashboard.reminders_mut().unwrap().toggle("water").unwrap();
        dashboard.select_tab(Tab::Profile).unwrap();
        dashboard.select_tab(Tab::Recommendations).unwrap();
        assert!(!dashboard.reminders_mut().unwrap().reminders()[0].enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn leaving_overview_stops_a_device_scan() {
        let mut dashboard = Dashboard::new();
        let token = dashboard.view_token();
        let rx = {
            let scanner = dashboard.overview_mut().unwrap().open_devices(&token);
            scanner.start_scan();
            scanner.subscribe()
        };
        dashboard.select_tab(Tab::Alerts).unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(*rx.borrow());
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_cancels_sos_timer() {
        let mut dashboard = Dashboard::new();
        let user = User::new("Jane", "jane@x.com");
        dashboard.sos_mut().press(&user);
        dashboard.sos_mut().confirm(None);
        let rx = dashboard.sos().subscribe();
        let lifecycle = dashboard.lifecycle_token();
        drop(dashboard);
        assert!(lifecycle.is_cancelled());
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(*rx.borrow(), SosState::Sent);
    }
}
