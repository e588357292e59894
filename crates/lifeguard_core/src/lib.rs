pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod devices;
pub mod domain;
pub mod loader;
pub mod ports;
pub mod reminders;
pub mod session;
pub mod setup;
pub mod signals;
pub mod sos;
pub mod survey;

pub use dashboard::{Dashboard, Tab};
pub use domain::{
    Condition, HealthModel, Lifestyle, Message, MessageKind, ReportRequest, Sex, SosAlert, User,
};
pub use ports::{
    ChatService, HealthDataService, PortError, PortResult, ReportService, SurveyFlagStore,
};
pub use session::{ActiveScreen, SessionController, SessionError, SessionState, Stage};
