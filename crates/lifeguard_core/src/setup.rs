//! crates/lifeguard_core/src/setup.rs
//!
//! The Digital Twin setup form.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::domain::{Condition, HealthModel, Lifestyle, Sex};

pub const AGE_RANGE: RangeInclusive<u16> = 18..=100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("Age must be between 18 and 100, got {0}")]
    AgeOutOfRange(u16),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthModelForm {
    pub age: u16,
    pub sex: Sex,
    #[serde(default)]
    pub condition: Option<Condition>,
    pub lifestyle: Lifestyle,
}

impl Default for HealthModelForm {
    fn default() -> Self {
        Self {
            age: 35,
            sex: Sex::Male,
            condition: None,
            lifestyle: Lifestyle::Moderate,
        }
    }
}

impl HealthModelForm {
    pub fn submit(&self) -> Result<HealthModel, SetupError> {
        if !AGE_RANGE.contains(&self.age) {
            return Err(SetupError::AgeOutOfRange(self.age));
        }
        Ok(HealthModel {
            age: self.age as u8,
            sex: self.sex,
            condition: self.condition,
            lifestyle: self.lifestyle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_produce_a_moderate_35_year_old() {
        let model = HealthModelForm::default().submit().unwrap();
        assert_eq!(model.age, 35);
        assert_eq!(model.sex, Sex::Male);
        assert_eq!(model.condition, None);
        assert_eq!(model.lifestyle, Lifestyle::Moderate);
    }

    #[test]
    fn age_is_bounded() {
        let young = HealthModelForm { age: 17, ..Default::default() };
        assert_eq!(young.submit(), Err(SetupError::AgeOutOfRange(17)));
        let old = HealthModelForm { age: 101, ..Default::default() };
        assert!(old.submit().is_err());
        let edge = HealthModelForm { age: 100, ..Default::default() };
        assert_eq!(edge.submit().unwrap().age, 100);
    }

    #[test]
    fn condition_is_carried_over() {
        let form = HealthModelForm {
            condition: Some(Condition::Arrhythmia),
            ..Default::default()
        };
        assert_eq!(form.submit().unwrap().condition, Some(Condition::Arrhythmia));
    }
}
