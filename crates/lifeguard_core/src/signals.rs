//! crates/lifeguard_core/src/signals.rs
//!
//! Wearable health-signal payloads and the small amount of arithmetic the
//! dashboard performs on them (summaries and the composite risk score).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::parse_timestamp;

//=========================================================================================
// Series and Summaries
//=========================================================================================

/// One sample of an hourly series such as heart rate, activity, SpO2 or stress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub time: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodPressurePoint {
    pub time: String,
    pub systolic: u16,
    pub diastolic: u16,
}

/// Hours spent in each sleep stage during the last night.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSummary {
    pub deep: f64,
    pub light: f64,
    pub rem: f64,
    pub awake: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySteps {
    pub day: String,
    pub steps: u32,
}

//=========================================================================================
// Collaborator Payloads
//=========================================================================================

/// Payload of `GET /api/health-signals`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSignals {
    pub heart_rate: Vec<SeriesPoint>,
    pub activity: Vec<SeriesPoint>,
    pub blood_pressure: Vec<BloodPressurePoint>,
    pub sleep: SleepSummary,
    pub risk_score: f64,
}

/// Payload of `GET /api/historical-dashboard`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalDashboard {
    pub heart_rate: Vec<SeriesPoint>,
    pub spo2: Vec<SeriesPoint>,
    pub sleep: SleepSummary,
    pub steps: Vec<DailySteps>,
    pub blood_pressure: Vec<BloodPressurePoint>,
    pub stress: Vec<SeriesPoint>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_timestamp"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|raw| parse_timestamp(&raw).map_err(serde::de::Error::custom))
        .transpose()
}

//=========================================================================================
// Derived Figures
//=========================================================================================

/// Mean of a series, or `None` when it is empty.
pub fn average(points: &[SeriesPoint]) -> Option<f64> {
    if points.is_empty() {
        return None;
    }
    Some(points.iter().map(|p| p.value).sum::<f64>() / points.len() as f64)
}

/// Rounded mean heart rate in bpm.
pub fn average_heart_rate(points: &[SeriesPoint]) -> Option<u16> {
    average(points).map(|avg| avg.round() as u16)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BloodPressureAverage {
    pub systolic: u16,
    pub diastolic: u16,
}

/// Rounded mean systolic and diastolic pressure.
pub fn average_blood_pressure(points: &[BloodPressurePoint]) -> Option<BloodPressureAverage> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let systolic = points.iter().map(|p| f64::from(p.systolic)).sum::<f64>() / n;
    let diastolic = points.iter().map(|p| f64::from(p.diastolic)).sum::<f64>() / n;
    Some(BloodPressureAverage {
        systolic: systolic.round() as u16,
        diastolic: diastolic.round() as u16,
    })
}

pub fn total_steps(days: &[DailySteps]) -> u64 {
    days.iter().map(|d| u64::from(d.steps)).sum()
}

pub fn average_steps(days: &[DailySteps]) -> Option<u32> {
    if days.is_empty() {
        return None;
    }
    Some((total_steps(days) as f64 / days.len() as f64).round() as u32)
}

/// Weighted sleep quality normalised so that a typical good night scores ~100.
pub fn sleep_score(sleep: &SleepSummary) -> f64 {
    let weighted = sleep.deep * 1.5 + sleep.light + sleep.rem * 1.2;
    (weighted / 8.5 * 100.0).min(100.0)
}

/// The headline figures shown above a chart set. Step figures only exist for
/// the historical payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalSummary {
    pub average_heart_rate: Option<u16>,
    pub average_blood_pressure: Option<BloodPressureAverage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_steps: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_steps: Option<u32>,
}

impl HealthSignals {
    pub fn summary(&self) -> SignalSummary {
        SignalSummary {
            average_heart_rate: average_heart_rate(&self.heart_rate),
            average_blood_pressure: average_blood_pressure(&self.blood_pressure),
            total_steps: None,
            average_steps: None,
        }
    }
}

impl HistoricalDashboard {
    pub fn summary(&self) -> SignalSummary {
        SignalSummary {
            average_heart_rate: average_heart_rate(&self.heart_rate),
            average_blood_pressure: average_blood_pressure(&self.blood_pressure),
            total_steps: Some(total_steps(&self.steps)),
            average_steps: average_steps(&self.steps),
        }
    }
}

/// Composite 0..=100 risk score from heart rate and sleep.
///
/// Returns 0 for an empty heart-rate series.
pub fn risk_score(heart_rate: &[SeriesPoint], sleep: &SleepSummary) -> u8 {
    let Some(avg_hr) = average(heart_rate) else {
        return 0;
    };
    let risk = (avg_hr - 60.0) * 2.0 + (85.0 - sleep_score(sleep)) * 1.5;
    risk.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn series(values: &[f64]) -> Vec<SeriesPoint> {
        values
            .iter()
            .enumerate()
            .map(|(h, v)| SeriesPoint {
                time: format!("{:02}:00", h),
                value: *v,
            })
            .collect()
    }

    fn sleep(deep: f64, light: f64, rem: f64) -> SleepSummary {
        SleepSummary {
            deep,
            light,
            rem,
            awake: 0.4,
            total: 9.0,
        }
    }

    #[test]
    fn averages_round_to_whole_units() {
        assert_eq!(average_heart_rate(&series(&[70.0, 71.0])), Some(71));
        assert_eq!(average_heart_rate(&[]), None);
        let bp = vec![
            BloodPressurePoint { time: "00:00".into(), systolic: 120, diastolic: 80 },
            BloodPressurePoint { time: "02:00".into(), systolic: 125, diastolic: 77 },
        ];
        assert_eq!(
            average_blood_pressure(&bp),
            Some(BloodPressureAverage { systolic: 123, diastolic: 79 })
        );
    }

    #[test]
    fn step_totals() {
        let days = vec![
            DailySteps { day: "Mon".into(), steps: 7000 },
            DailySteps { day: "Tue".into(), steps: 8001 },
        ];
        assert_eq!(total_steps(&days), 15001);
        assert_eq!(average_steps(&days), Some(7501));
        assert_eq!(average_steps(&[]), None);
    }

    #[test]
    fn sleep_score_is_capped() {
        assert_eq!(sleep_score(&sleep(5.0, 5.0, 5.0)), 100.0);
        // 2*1.5 + 4 + 1.5*1.2 = 8.8 -> capped
        assert_eq!(sleep_score(&sleep(2.0, 4.0, 1.5)), 100.0);
        let score = sleep_score(&sleep(1.5, 3.5, 1.0));
        assert!((score - (6.95 / 8.5 * 100.0)).abs() < 1e-9);
    }

    #[test]
    fn risk_score_combines_heart_rate_and_sleep() {
        // avg 70 -> 20, full sleep score -> (85-100)*1.5 = -22.5 => -2.5 -> 0
        assert_eq!(risk_score(&series(&[70.0, 70.0]), &sleep(2.0, 4.0, 1.5)), 0);
        // avg 80 -> 40, sleep score 50 -> 52.5 => 92.5 -> 93
        let half = SleepSummary { deep: 0.0, light: 4.25, rem: 0.0, awake: 0.0, total: 9.0 };
        assert_eq!(risk_score(&series(&[80.0]), &half), 93);
        // saturates at 100
        assert_eq!(risk_score(&series(&[120.0]), &half), 100);
        assert_eq!(risk_score(&[], &half), 0);
    }

    #[test]
    fn historical_summary_includes_steps() {
        let dashboard = HistoricalDashboard {
            heart_rate: series(&[64.0, 75.0]),
            spo2: vec![],
            sleep: sleep(2.0, 4.0, 1.5),
            steps: vec![
                DailySteps { day: "Mon".into(), steps: 6500 },
                DailySteps { day: "Tue".into(), steps: 9000 },
            ],
            blood_pressure: vec![],
            stress: vec![],
            timestamp: None,
        };
        let summary = dashboard.summary();
        assert_eq!(summary.average_heart_rate, Some(70));
        assert_eq!(summary.average_blood_pressure, None);
        assert_eq!(summary.total_steps, Some(15500));
        assert_eq!(summary.average_steps, Some(7750));
        assert_eq!(
            serde_json::to_value(summary).unwrap(),
            serde_json::json!({
                "averageHeartRate": 70,
                "averageBloodPressure": null,
                "totalSteps": 15500,
                "averageSteps": 7750
            })
        );
    }

    #[test]
    fn health_signals_use_camel_case_fields() {
        let json = r#"{
            "heartRate": [{"time": "00:00", "value": 70}],
            "activity": [],
            "bloodPressure": [{"time": "00:00", "systolic": 120, "diastolic": 80}],
            "sleep": {"deep": 2.0, "light": 4.0, "rem": 1.5, "awake": 0.3, "total": 9.0},
            "riskScore": 12
        }"#;
        let signals: HealthSignals = serde_json::from_str(json).unwrap();
        assert_eq!(signals.heart_rate[0].value, 70.0);
        assert_eq!(signals.blood_pressure[0].systolic, 120);
        assert_eq!(signals.risk_score, 12.0);
        assert_eq!(signals.summary().average_heart_rate, Some(70));
        assert_eq!(signals.summary().total_steps, None);
    }
}
