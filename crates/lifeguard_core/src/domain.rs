//! crates/lifeguard_core/src/domain.rs
//!
//! Defines the core data structures shared by every stage of a LifeGuard session.
//! Types that cross the wire derive serde with the field names the browser and the
//! collaborator services already expect.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

//=========================================================================================
// User
//=========================================================================================

/// The person signed in for the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// First whitespace-separated word of the name, used for greetings.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }
}

//=========================================================================================
// HealthModel (the "Digital Twin" baseline)
//=========================================================================================

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Sex {
    #[default]
    Male,
    Female,
    Other,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Lifestyle {
    Sedentary,
    #[default]
    Moderate,
    Active,
}

/// Pre-existing conditions offered by the Digital Twin setup form.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Condition {
    Hypertension,
    Diabetes,
    SleepApnea,
    Arrhythmia,
}

impl Condition {
    pub fn label(&self) -> &'static str {
        match self {
            Condition::Hypertension => "Hypertension",
            Condition::Diabetes => "Diabetes",
            Condition::SleepApnea => "Sleep Apnea",
            Condition::Arrhythmia => "Arrhythmia",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthModel {
    pub age: u8,
    pub sex: Sex,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    pub lifestyle: Lifestyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum ActivityBand {
    High,
    Med,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum RiskFactor {
    Normal,
    Elevated,
}

/// The simulation baseline shown next to the setup form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    pub resting_heart_rate: u16,
    pub sleep_need_hours: u8,
    pub activity: ActivityBand,
    pub risk_factor: RiskFactor,
}

impl HealthModel {
    pub fn baseline(&self) -> Baseline {
        let resting_heart_rate = match self.lifestyle {
            Lifestyle::Active => 55,
            Lifestyle::Sedentary => 70,
            Lifestyle::Moderate => 60,
        };
        let activity = match self.lifestyle {
            Lifestyle::Active => ActivityBand::High,
            Lifestyle::Moderate => ActivityBand::Med,
            Lifestyle::Sedentary => ActivityBand::Low,
        };
        let older = self.age > 50;
        Baseline {
            resting_heart_rate,
            sleep_need_hours: if older { 8 } else { 7 },
            activity,
            risk_factor: if older {
                RiskFactor::Elevated
            } else {
                RiskFactor::Normal
            },
        }
    }
}

//=========================================================================================
// Chat Messages
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Ai,
}

/// A single chat bubble exchanged with the AI analysis collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub text: String,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Accepts RFC 3339 as well as the offset-less ISO-8601 that some collaborators
/// emit; the latter is taken to be UTC.
pub fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Ok(ts.with_timezone(&Utc)),
        Err(_) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|ts| ts.and_utc()),
    }
}

impl Message {
    /// A message typed by the user. The id is the millisecond timestamp.
    pub fn user(text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: now.timestamp_millis().to_string(),
            kind: MessageKind::User,
            text: text.into(),
            timestamp: now,
        }
    }

    /// An assistant message. The id is one past the millisecond timestamp so it
    /// never collides with the user message it answers.
    pub fn ai(text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: (now.timestamp_millis() + 1).to_string(),
            kind: MessageKind::Ai,
            text: text.into(),
            timestamp: now,
        }
    }
}

//=========================================================================================
// Reports and Alerts
//=========================================================================================

/// Body of a PDF report request. Every field is a preformatted display string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub name: String,
    pub email: String,
    pub heart_rate: String,
    pub sleep: String,
    pub activity: String,
    pub risk: String,
}

impl ReportRequest {
    /// Builds the request with the figures shown in the report preview.
    pub fn for_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            heart_rate: "72 bpm".to_string(),
            sleep: "78%".to_string(),
            activity: "65%".to_string(),
            risk: "18/100".to_string(),
        }
    }
}

pub fn report_file_name(date: NaiveDate) -> String {
    format!("LifeGuard_Health_Report_{}.pdf", date.format("%Y-%m-%d"))
}

/// The record produced when an SOS alert is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SosAlert {
    pub name: String,
    pub email: String,
    pub timestamp: DateTime<Utc>,
    pub health_model: Option<HealthModel>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    fn message_accepts_naive_timestamps() {
        let json = r#"{"id":"2","type":"ai","text":"hi","timestamp":"2025-01-02T03:04:05.678901"}"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.kind, MessageKind::Ai);
        assert_eq!(message.timestamp.to_rfc3339(), "2025-01-02T03:04:05.678901+00:00");

        let json = r#"{"id":"3","type":"user","text":"hi","timestamp":"2025-01-02T03:04:05Z"}"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.timestamp.timestamp(), 1735787045);
    }

    fn model(age: u8, lifestyle: Lifestyle) -> HealthModel {
        HealthModel {
            age,
            sex: Sex::Female,
            condition: None,
            lifestyle,
        }
    }

    #[test]
    fn first_name_takes_leading_word() {
        assert_eq!(User::new("Jane Doe", "jane@x.com").first_name(), "Jane");
        assert_eq!(User::new("jane", "jane@x.com").first_name(), "jane");
    }

    #[test]
    fn baseline_follows_lifestyle_and_age() {
        assert_eq!(
            model(35, Lifestyle::Active).baseline(),
            Baseline {
                resting_heart_rate: 55,
                sleep_need_hours: 7,
                activity: ActivityBand::High,
                risk_factor: RiskFactor::Normal,
            }
        );
        assert_eq!(
            model(51, Lifestyle::Sedentary).baseline(),
            Baseline {
                resting_heart_rate: 70,
                sleep_need_hours: 8,
                activity: ActivityBand::Low,
                risk_factor: RiskFactor::Elevated,
            }
        );
        assert_eq!(model(50, Lifestyle::Moderate).baseline().risk_factor, RiskFactor::Normal);
    }

    #[test]
    fn condition_uses_kebab_case_wire_values() {
        assert_eq!(Condition::from_str("sleep-apnea").unwrap(), Condition::SleepApnea);
        assert_eq!(Condition::SleepApnea.to_string(), "sleep-apnea");
        assert_eq!(Condition::SleepApnea.as_ref(), "sleep-apnea");
        assert_eq!(Condition::SleepApnea.label(), "Sleep Apnea");
    }

    #[test]
    fn message_ids_come_from_the_clock() {
        let now = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let user = Message::user("hi", now);
        let ai = Message::ai("hello", now);
        assert_eq!(user.id, now.timestamp_millis().to_string());
        assert_eq!(ai.id, (now.timestamp_millis() + 1).to_string());
        assert_eq!(ai.kind, MessageKind::Ai);
    }

    #[test]
    fn report_request_and_file_name() {
        let request = ReportRequest::for_user(&User::new("Jane", "jane@x.com"));
        assert_eq!(request.heart_rate, "72 bpm");
        assert_eq!(request.risk, "18/100");
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(report_file_name(date), "LifeGuard_Health_Report_2024-03-09.pdf");
    }
}
