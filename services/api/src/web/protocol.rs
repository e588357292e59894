//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser shell and the
//! server-hosted LifeGuard session.

use lifeguard_core::{
    auth::AuthForm,
    chat::QUICK_REPLIES,
    dashboard::Tab,
    devices::{BatteryLevel, Device, SignalStrength},
    domain::{Baseline, Message},
    loader::ChartLoad,
    reminders::{Recommendation, Reminder},
    session::ActiveScreen,
    setup::HealthModelForm,
    signals::{HealthSignals, HistoricalDashboard, SignalSummary},
    sos::SosState,
    survey::{
        ActivityLevel, Feeling, HealthConcern, Progress, SleepQuality, StressLevel, SurveyData,
    },
};
use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Every user action the shell can report. Each variant maps onto exactly one
/// session, survey or dashboard operation.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    // --- Session ---
    SubmitAuth(AuthForm),
    ToggleTheme,
    Logout,

    // --- Onboarding survey ---
    SelectFeeling { value: Feeling },
    SelectSleepQuality { value: SleepQuality },
    SelectStressLevel { value: StressLevel },
    SelectActivityLevel { value: ActivityLevel },
    ToggleConcern { concern: HealthConcern },
    SetSymptoms { text: String },
    SurveyBack,
    SurveyNext,

    // --- Dashboard ---
    SelectTab { tab: Tab },
    SosPress,
    SosCancel,
    SosConfirm,
    SubmitHealthModel(HealthModelForm),
    SendChat { text: String },
    ReloadChart,
    ToggleReminder { id: String },
    UpdateReminderFrequency { id: String, frequency: String },
    AddReminder { title: String, time: String, frequency: String },
    RemoveReminder { id: String },
    SaveReminders,
    OpenDevices,
    CloseDevices,
    ScanDevices,
    ToggleDevice { id: String },
    DownloadReport,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================
// NOTE: PDF reports are sent as a raw Binary frame right after `ReportReady`.
//=========================================================================================

#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The top-level screen to mount. Sent after every session transition.
    Screen { screen: ActiveScreen, dark_mode: bool },

    /// A blocking, user-facing message (form validation, PDF failure).
    Alert { message: String },

    /// The request could not be honoured in the current state.
    Error { message: String },

    SurveyStep {
        greeting: String,
        step: usize,
        progress: Progress,
        can_proceed: bool,
        data: SurveyData,
    },

    TabChanged { tab: Tab, label: String },

    Sos { sos: SosState },

    SetupForm { form: HealthModelForm },

    /// The Digital Twin was saved; the derived baseline to display.
    HealthModelSaved { baseline: Baseline },

    Chat { messages: Vec<Message>, quick_replies: Vec<String> },

    /// A chart load update. `summary` accompanies loaded data only.
    HealthSignals {
        load: ChartLoad<HealthSignals>,
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<SignalSummary>,
    },

    Historical {
        load: ChartLoad<HistoricalDashboard>,
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<SignalSummary>,
    },

    Reminders {
        reminders: Vec<Reminder>,
        recommendations: Vec<Recommendation>,
    },

    Devices {
        devices: Vec<DeviceSnapshot>,
        scanning: bool,
    },

    DeviceScan { scanning: bool },

    DevicesClosed,

    /// Announces the binary frame that follows.
    ReportReady { file_name: String, size: usize },
}

/// A device as the modal lists it, with its signal and battery bands.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    #[serde(flatten)]
    pub device: Device,
    pub signal_strength: SignalStrength,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<BatteryLevel>,
}

impl From<&Device> for DeviceSnapshot {
    fn from(device: &Device) -> Self {
        Self {
            signal_strength: device.signal_strength(),
            battery_level: device.battery_level(),
            device: device.clone(),
        }
    }
}

impl ServerMessage {
    pub fn health_signals(load: ChartLoad<HealthSignals>) -> Self {
        let summary = match &load {
            ChartLoad::Loaded(signals) => Some(signals.summary()),
            _ => None,
        };
        ServerMessage::HealthSignals { load, summary }
    }

    pub fn historical(load: ChartLoad<HistoricalDashboard>) -> Self {
        let summary = match &load {
            ChartLoad::Loaded(dashboard) => Some(dashboard.summary()),
            _ => None,
        };
        ServerMessage::Historical { load, summary }
    }

    pub fn devices(devices: &[Device], scanning: bool) -> Self {
        ServerMessage::Devices {
            devices: devices.iter().map(DeviceSnapshot::from).collect(),
            scanning,
        }
    }

    pub fn chat(messages: &[Message]) -> Self {
        ServerMessage::Chat {
            messages: messages.to_vec(),
            quick_replies: QUICK_REPLIES.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn error(message: impl ToString) -> Self {
        ServerMessage::Error {
            message: message.to_string(),
        }
    }

    pub fn alert(message: impl ToString) -> Self {
        ServerMessage::Alert {
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeguard_core::auth::AuthMode;
    use lifeguard_core::devices::DeviceScanner;
    use lifeguard_core::domain::{Lifestyle, User};
    use lifeguard_core::signals::{SeriesPoint, SleepSummary};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn auth_submission_parses_flat() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "submit_auth",
            "mode": "signup",
            "name": "Jane Doe",
            "email": "jane@x.com",
            "password": "pw"
        }))
        .unwrap();
        match msg {
            ClientMessage::SubmitAuth(form) => {
                assert_eq!(form.mode, AuthMode::Signup);
                assert_eq!(form.name, "Jane Doe");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn survey_answers_use_wire_values() {
        let msg: ClientMessage =
            serde_json::from_value(json!({"type": "select_activity_level", "value": "very-active"}))
                .unwrap();
        assert!(matches!(
            msg,
            ClientMessage::SelectActivityLevel { value: ActivityLevel::VeryActive }
        ));

        let msg: ClientMessage = serde_json::from_value(
            json!({"type": "toggle_concern", "concern": "Mental Health / Anxiety"}),
        )
        .unwrap();
        assert!(matches!(
            msg,
            ClientMessage::ToggleConcern { concern: HealthConcern::MentalHealth }
        ));
    }

    #[test]
    fn tabs_and_setup_forms_parse() {
        let msg: ClientMessage =
            serde_json::from_value(json!({"type": "select_tab", "tab": "health-signals"})).unwrap();
        assert!(matches!(msg, ClientMessage::SelectTab { tab: Tab::HealthSignals }));

        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "submit_health_model",
            "age": 52,
            "sex": "female",
            "condition": "sleep-apnea",
            "lifestyle": "active"
        }))
        .unwrap();
        match msg {
            ClientMessage::SubmitHealthModel(form) => {
                assert_eq!(form.age, 52);
                assert_eq!(form.lifestyle, Lifestyle::Active);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(serde_json::from_value::<ClientMessage>(json!({"type": "replay"})).is_err());
    }

    #[test]
    fn screen_message_nests_the_stage() {
        let msg = ServerMessage::Screen {
            screen: ActiveScreen::Survey {
                user: User::new("Jane Doe", "jane@x.com"),
            },
            dark_mode: false,
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "type": "screen",
                "screen": {"stage": "survey", "user": {"name": "Jane Doe", "email": "jane@x.com"}},
                "dark_mode": false
            })
        );
    }

    #[test]
    fn chart_loads_are_tagged_by_status() {
        let msg = ServerMessage::health_signals(ChartLoad::Failed(
            "Failed to load health signals: The request timed out".into(),
        ));
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "type": "health_signals",
                "load": {
                    "status": "failed",
                    "data": "Failed to load health signals: The request timed out"
                }
            })
        );
    }

    #[test]
    fn sos_states_serialize() {
        let msg = ServerMessage::Sos { sos: SosState::Sent };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"type": "sos", "sos": {"state": "sent"}})
        );
    }

    #[test]
    fn loaded_charts_carry_their_summary() {
        let signals = HealthSignals {
            heart_rate: vec![SeriesPoint { time: "00:00".into(), value: 72.0 }],
            activity: vec![],
            blood_pressure: vec![],
            sleep: SleepSummary { deep: 2.0, light: 4.0, rem: 1.5, awake: 0.3, total: 9.0 },
            risk_score: 18.0,
        };
        let value = serde_json::to_value(ServerMessage::health_signals(ChartLoad::Loaded(signals)))
            .unwrap();
        assert_eq!(value["load"]["status"], "loaded");
        assert_eq!(
            value["summary"],
            json!({"averageHeartRate": 72, "averageBloodPressure": null})
        );

        let loading = serde_json::to_value(ServerMessage::historical(ChartLoad::Loading)).unwrap();
        assert_eq!(loading, json!({"type": "historical", "load": {"status": "loading"}}));
    }

    #[test]
    fn devices_list_their_bands() {
        let scanner = DeviceScanner::new(CancellationToken::new());
        let value = serde_json::to_value(ServerMessage::devices(scanner.devices(), false)).unwrap();
        let watch = &value["devices"][0];
        assert_eq!(watch["name"], "Apple Watch Series 9");
        assert_eq!(watch["signal"], 95);
        assert_eq!(watch["signal_strength"], "strong");
        assert_eq!(watch["battery_level"], "high");

        let scale = &value["devices"][5];
        assert_eq!(scale["signal_strength"], "fair");
        assert!(scale.get("battery_level").is_none());
    }
}
