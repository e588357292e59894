//! crates/lifeguard_core/src/reminders.rs
//!
//! Reminders and static recommendations for the Health Recommendations view.
//! The board is local to the view; nothing here touches the session.

use chrono::NaiveTime;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub title: String,
    pub enabled: bool,
    pub frequency: String,
    pub is_custom: bool,
}

impl Reminder {
    fn builtin(id: &str, title: &str, frequency: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            enabled: false,
            frequency: frequency.to_string(),
            is_custom: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Priority {
    Recommended,
    #[serde(rename = "High Priority")]
    HighPriority,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub title: &'static str,
    pub description: &'static str,
    pub priority: Priority,
}

pub const RECOMMENDATIONS: [Recommendation; 5] = [
    Recommendation {
        title: "Stay Hydrated",
        description: "Aim for 6–8 glasses of water today to maintain optimal hydration.",
        priority: Priority::Recommended,
    },
    Recommendation {
        title: "Improve Sleep Quality",
        description: "Try sleeping before 11 PM for better recovery and lower stress levels.",
        priority: Priority::HighPriority,
    },
    Recommendation {
        title: "Daily Activity Boost",
        description: "Target at least 30 minutes of light to moderate exercise.",
        priority: Priority::Recommended,
    },
    Recommendation {
        title: "Heart Health Tip",
        description: "Breathing exercises can help stabilize heart rate and stress.",
        priority: Priority::Optional,
    },
    Recommendation {
        title: "Stress Management",
        description: "Try 5 minutes of relaxation or meditation to reduce tension.",
        priority: Priority::Recommended,
    },
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReminderError {
    #[error("A reminder needs a title")]
    EmptyTitle,
    #[error("'{0}' is not a valid time (expected HH:MM)")]
    InvalidTime(String),
    #[error("No reminder with id '{0}'")]
    NotFound(String),
    #[error("Only custom reminders can be removed")]
    NotCustom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderBoard {
    reminders: Vec<Reminder>,
}

impl Default for ReminderBoard {
    fn default() -> Self {
        Self {
            reminders: vec![
                Reminder::builtin("water", "Remind me to Drink Water", "Every 2 hours"),
                Reminder::builtin("sleep", "Sleep Time Reminder", "Daily at 10 PM"),
                Reminder::builtin("activity", "Activity / Movement Reminder", "Daily at 2 PM"),
                Reminder::builtin(
                    "health-check",
                    "Medication / Health Check Reminder",
                    "Daily at 9 AM",
                ),
            ],
        }
    }
}

impl ReminderBoard {
    pub fn reminders(&self) -> &[Reminder] {
        &self.reminders
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Reminder, ReminderError> {
        self.reminders
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ReminderError::NotFound(id.to_string()))
    }

    pub fn toggle(&mut self, id: &str) -> Result<bool, ReminderError> {
        let reminder = self.find_mut(id)?;
        reminder.enabled = !reminder.enabled;
        Ok(reminder.enabled)
    }

    pub fn update_frequency(&mut self, id: &str, frequency: &str) -> Result<(), ReminderError> {
        self.find_mut(id)?.frequency = frequency.to_string();
        Ok(())
    }

    /// Adds an enabled custom reminder firing "<frequency> at <HH:MM>".
    pub fn add_custom(
        &mut self,
        title: &str,
        time: &str,
        frequency: &str,
    ) -> Result<&Reminder, ReminderError> {
        if title.trim().is_empty() {
            return Err(ReminderError::EmptyTitle);
        }
        let time = NaiveTime::parse_from_str(time, "%H:%M")
            .map_err(|_| ReminderError::InvalidTime(time.to_string()))?;

        self.reminders.push(Reminder {
            id: format!("custom-{}", Uuid::new_v4()),
            title: title.to_string(),
            enabled: true,
            frequency: format!("{} at {}", frequency, time.format("%H:%M")),
            is_custom: true,
        });
        Ok(&self.reminders[self.reminders.len() - 1])
    }

    pub fn remove(&mut self, id: &str) -> Result<Reminder, ReminderError> {
        let index = self
            .reminders
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ReminderError::NotFound(id.to_string()))?;
        if !self.reminders[index].is_custom {
            return Err(ReminderError::NotCustom);
        }
        Ok(self.reminders.remove(index))
    }

    /// Nothing is persisted; saving only records the current board.
    pub fn save(&self) -> &[Reminder] {
        info!("Saving reminders: {:?}", self.reminders);
        &self.reminders
    }
}
