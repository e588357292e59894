//! crates/lifeguard_core/src/survey.rs
//!
//! The onboarding survey: a strictly linear six-step wizard that collects
//! self-reported health attributes from new signups.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum::{AsRefStr, Display, EnumIter, EnumString};
use tracing::debug;

use crate::domain::Lifestyle;

pub const STEP_COUNT: usize = 6;
pub const LAST_STEP: usize = STEP_COUNT - 1;

//=========================================================================================
// Answer Vocabularies
//=========================================================================================

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
pub enum Feeling {
    Great,
    Good,
    Okay,
    Tired,
    Unwell,
}

impl Feeling {
    pub fn label(&self) -> &'static str {
        match self {
            Feeling::Great => "Great - Feeling energetic and positive",
            Feeling::Good => "Good - Doing well overall",
            Feeling::Okay => "Okay - Average day",
            Feeling::Tired => "Tired - Low energy",
            Feeling::Unwell => "Not well - Experiencing discomfort",
        }
    }
}

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
pub enum SleepQuality {
    Excellent,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl SleepQuality {
    pub fn label(&self) -> &'static str {
        match self {
            SleepQuality::Excellent => "Excellent - 7-9 hours, well-rested",
            SleepQuality::Good => "Good - Decent sleep, minor interruptions",
            SleepQuality::Fair => "Fair - Some difficulty sleeping",
            SleepQuality::Poor => "Poor - Frequent waking or insomnia",
            SleepQuality::VeryPoor => "Very Poor - Major sleep issues",
        }
    }
}

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
pub enum StressLevel {
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl StressLevel {
    pub fn label(&self) -> &'static str {
        match self {
            StressLevel::Low => "Low - Relaxed and calm",
            StressLevel::Moderate => "Moderate - Normal daily stress",
            StressLevel::High => "High - Feeling pressured",
            StressLevel::VeryHigh => "Very High - Overwhelmed",
            StressLevel::Extreme => "Extreme - Crisis level",
        }
    }
}

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
pub enum ActivityLevel {
    VeryActive,
    Active,
    Moderate,
    Sedentary,
    Inactive,
}

impl ActivityLevel {
    pub fn label(&self) -> &'static str {
        match self {
            ActivityLevel::VeryActive => "Very Active - Regular exercise, 5+ days/week",
            ActivityLevel::Active => "Active - Exercise 3-4 days/week",
            ActivityLevel::Moderate => "Moderate - Light activity, 1-2 days/week",
            ActivityLevel::Sedentary => "Sedentary - Mostly sitting, minimal activity",
            ActivityLevel::Inactive => "Inactive - No exercise routine",
        }
    }
}

/// Areas the user asks to have monitored. The wire value is the display label.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
pub enum HealthConcern {
    #[serde(rename = "Heart Health")]
    #[strum(serialize = "Heart Health")]
    HeartHealth,
    #[serde(rename = "Blood Pressure")]
    #[strum(serialize = "Blood Pressure")]
    BloodPressure,
    #[serde(rename = "Sleep Disorders")]
    #[strum(serialize = "Sleep Disorders")]
    SleepDisorders,
    #[serde(rename = "Mental Health / Anxiety")]
    #[strum(serialize = "Mental Health / Anxiety")]
    MentalHealth,
    #[serde(rename = "Chronic Pain")]
    #[strum(serialize = "Chronic Pain")]
    ChronicPain,
    #[serde(rename = "Diabetes")]
    #[strum(serialize = "Diabetes")]
    Diabetes,
    #[serde(rename = "Respiratory Issues")]
    #[strum(serialize = "Respiratory Issues")]
    RespiratoryIssues,
    #[serde(rename = "Digestive Issues")]
    #[strum(serialize = "Digestive Issues")]
    DigestiveIssues,
    #[serde(rename = "Weight Management")]
    #[strum(serialize = "Weight Management")]
    WeightManagement,
    /// Not mutually exclusive with the other concerns.
    #[serde(rename = "None at this time")]
    #[strum(serialize = "None at this time")]
    NoneAtThisTime,
}

//=========================================================================================
// SurveyData
//=========================================================================================

/// Answers collected so far. Steps 0..=3 are mandatory single choices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyData {
    pub feeling: Option<Feeling>,
    pub sleep_quality: Option<SleepQuality>,
    pub stress_level: Option<StressLevel>,
    pub activity_level: Option<ActivityLevel>,
    pub health_concerns: BTreeSet<HealthConcern>,
    pub current_symptoms: String,
}

/// Whether the answer for `step` allows moving forward. Out-of-range steps never do.
pub fn can_proceed(step: usize, data: &SurveyData) -> bool {
    match step {
        0 => data.feeling.is_some(),
        1 => data.sleep_quality.is_some(),
        2 => data.stress_level.is_some(),
        3 => data.activity_level.is_some(),
        4 | 5 => true,
        _ => false,
    }
}

/// Coarse lifestyle classification derived from the reported activity level.
pub fn derive_lifestyle(activity: Option<ActivityLevel>) -> Lifestyle {
    match activity {
        Some(ActivityLevel::VeryActive | ActivityLevel::Active) => Lifestyle::Active,
        Some(ActivityLevel::Sedentary | ActivityLevel::Inactive) => Lifestyle::Sedentary,
        Some(ActivityLevel::Moderate) | None => Lifestyle::Moderate,
    }
}

//=========================================================================================
// The Wizard
//=========================================================================================

/// Result of pressing "Continue" / "Complete Survey".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Moved(usize),
    Blocked(usize),
    Completed(SurveyData),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub step_number: usize,
    pub total: usize,
    pub percent: u8,
}

#[derive(Debug, Clone, Default)]
pub struct SurveyWizard {
    step: usize,
    data: SurveyData,
}

impl SurveyWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn data(&self) -> &SurveyData {
        &self.data
    }

    pub fn can_proceed(&self) -> bool {
        can_proceed(self.step, &self.data)
    }

    pub fn progress(&self) -> Progress {
        let step_number = self.step + 1;
        Progress {
            step_number,
            total: STEP_COUNT,
            percent: ((step_number as f64 / STEP_COUNT as f64) * 100.0).round() as u8,
        }
    }

    pub fn select_feeling(&mut self, feeling: Feeling) {
        self.data.feeling = Some(feeling);
    }

    pub fn select_sleep_quality(&mut self, quality: SleepQuality) {
        self.data.sleep_quality = Some(quality);
    }

    pub fn select_stress_level(&mut self, level: StressLevel) {
        self.data.stress_level = Some(level);
    }

    pub fn select_activity_level(&mut self, level: ActivityLevel) {
        self.data.activity_level = Some(level);
    }

    /// Adds the concern if absent, removes it if present. Returns whether it is now selected.
    pub fn toggle_concern(&mut self, concern: HealthConcern) -> bool {
        if self.data.health_concerns.remove(&concern) {
            false
        } else {
            self.data.health_concerns.insert(concern);
            true
        }
    }

    pub fn set_symptoms(&mut self, text: impl Into<String>) {
        self.data.current_symptoms = text.into();
    }

    /// Steps back one page. Answers are kept and no validity check applies.
    pub fn back(&mut self) -> usize {
        self.step = self.step.saturating_sub(1);
        self.step
    }

    /// Advances if the current step is answered; on the last step hands back the answers.
    pub fn next(&mut self) -> Advance {
        if self.step >= LAST_STEP {
            debug!("Survey completed");
            return Advance::Completed(self.data.clone());
        }
        if !self.can_proceed() {
            debug!("Survey step {} is not answered yet", self.step);
            return Advance::Blocked(self.step);
        }
        self.step += 1;
        Advance::Moved(self.step)
    }
}
