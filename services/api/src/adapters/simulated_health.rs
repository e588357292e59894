//! services/api/src/adapters/simulated_health.rs
//!
//! A simulated wearable feed implementing `HealthDataService`. Each call draws a
//! fresh day of plausible readings around fixed daily curves.

use async_trait::async_trait;
use chrono::Utc;
use lifeguard_core::{
    ports::{HealthDataService, PortResult},
    signals::{
        risk_score, BloodPressurePoint, DailySteps, HealthSignals, HistoricalDashboard,
        SeriesPoint, SleepSummary,
    },
};
use rand::Rng;
use std::f64::consts::PI;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Clone, Default)]
pub struct SimulatedHealthAdapter;

impl SimulatedHealthAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HealthDataService for SimulatedHealthAdapter {
    async fn fetch_health_signals(&self) -> PortResult<HealthSignals> {
        Ok(realtime_snapshot(&mut rand::thread_rng()))
    }

    async fn fetch_historical_dashboard(&self) -> PortResult<HistoricalDashboard> {
        Ok(historical_snapshot(&mut rand::thread_rng()))
    }
}

//=========================================================================================
// Snapshots
//=========================================================================================

pub fn realtime_snapshot<R: Rng>(rng: &mut R) -> HealthSignals {
    let heart_rate = heart_rate_24h(rng);
    let sleep = sleep_summary(rng);
    HealthSignals {
        risk_score: f64::from(risk_score(&heart_rate, &sleep)),
        heart_rate,
        activity: activity_24h(rng),
        blood_pressure: blood_pressure_12h(rng),
        sleep,
    }
}

pub fn historical_snapshot<R: Rng>(rng: &mut R) -> HistoricalDashboard {
    HistoricalDashboard {
        heart_rate: heart_rate_24h(rng),
        spo2: spo2_24h(rng),
        sleep: sleep_summary(rng),
        steps: daily_steps(rng),
        blood_pressure: blood_pressure_12h(rng),
        stress: stress_24h(rng),
        timestamp: Some(Utc::now()),
    }
}

//=========================================================================================
// Series Generators
//=========================================================================================

fn hour_label(hour: u32) -> String {
    format!("{:02}:00", hour)
}

/// Position of `hour` on a one-day sine wave.
fn daily_wave(hour: u32) -> f64 {
    (f64::from(hour) / 24.0 * 2.0 * PI).sin()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn hourly<R, F>(rng: &mut R, mut value: F) -> Vec<SeriesPoint>
where
    R: Rng,
    F: FnMut(&mut R, u32) -> f64,
{
    (0..24)
        .map(|hour| SeriesPoint {
            time: hour_label(hour),
            value: value(rng, hour),
        })
        .collect()
}

fn heart_rate_24h<R: Rng>(rng: &mut R) -> Vec<SeriesPoint> {
    hourly(rng, |rng, h| {
        (70.0 + daily_wave(h) * 10.0 + rng.gen_range(-3.0..=3.0))
            .clamp(55.0, 95.0)
            .round()
    })
}

fn activity_24h<R: Rng>(rng: &mut R) -> Vec<SeriesPoint> {
    hourly(rng, |rng, h| {
        if (6..=22).contains(&h) {
            rng.gen_range(40.0..=80.0_f64).round()
        } else {
            rng.gen_range(5.0..=15.0_f64).round()
        }
    })
}

fn spo2_24h<R: Rng>(rng: &mut R) -> Vec<SeriesPoint> {
    hourly(rng, |rng, h| {
        round1((97.0 + daily_wave(h) * 2.0 + rng.gen_range(-0.5..=0.5)).clamp(93.0, 100.0))
    })
}

fn stress_24h<R: Rng>(rng: &mut R) -> Vec<SeriesPoint> {
    hourly(rng, |rng, h| {
        (40.0 + daily_wave(h) * 20.0 + rng.gen_range(-5.0..=5.0))
            .clamp(10.0, 90.0)
            .round()
    })
}

fn blood_pressure_12h<R: Rng>(rng: &mut R) -> Vec<BloodPressurePoint> {
    (0..24)
        .step_by(2)
        .map(|hour| BloodPressurePoint {
            time: hour_label(hour),
            systolic: (120.0 + rng.gen_range(-10.0..=10.0_f64)).clamp(100.0, 140.0).round() as u16,
            diastolic: (78.0 + rng.gen_range(-6.0..=6.0_f64)).clamp(65.0, 90.0).round() as u16,
        })
        .collect()
}

fn sleep_summary<R: Rng>(rng: &mut R) -> SleepSummary {
    SleepSummary {
        deep: round1(rng.gen_range(1.5..=2.5)),
        light: round1(rng.gen_range(3.5..=4.5)),
        rem: round1(rng.gen_range(1.0..=2.0)),
        awake: round1(rng.gen_range(0.2..=0.6)),
        total: 9.0,
    }
}

fn daily_steps<R: Rng>(rng: &mut R) -> Vec<DailySteps> {
    WEEKDAYS
        .iter()
        .map(|day| DailySteps {
            day: day.to_string(),
            steps: rng.gen_range(6500.0..=11500.0_f64).round() as u32,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};

    fn in_range(points: &[SeriesPoint], lo: f64, hi: f64) -> bool {
        points.iter().all(|p| p.value >= lo && p.value <= hi)
    }

    #[test]
    fn realtime_series_stay_in_band() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let s = realtime_snapshot(&mut rng);
            assert_eq!(s.heart_rate.len(), 24);
            assert_eq!(s.activity.len(), 24);
            assert_eq!(s.blood_pressure.len(), 12);
            assert!(in_range(&s.heart_rate, 55.0, 95.0));
            assert!(in_range(&s.activity[..6], 5.0, 15.0));
            assert!(in_range(&s.activity[6..23], 40.0, 80.0));
            assert!(s
                .blood_pressure
                .iter()
                .all(|bp| (100..=140).contains(&bp.systolic) && (65..=90).contains(&bp.diastolic)));
            assert!((0.0..=100.0).contains(&s.risk_score));
            assert_eq!(s.risk_score, f64::from(risk_score(&s.heart_rate, &s.sleep)));
        }
    }

    #[test]
    fn historical_series_stay_in_band() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let h = historical_snapshot(&mut rng);
            assert!(in_range(&h.spo2, 93.0, 100.0));
            assert!(in_range(&h.stress, 10.0, 90.0));
            assert_eq!(h.steps.len(), 7);
            assert_eq!(h.steps[0].day, "Mon");
            assert!(h.steps.iter().all(|d| (6500..=11500).contains(&d.steps)));
            assert!(h.timestamp.is_some());
        }
    }

    #[test]
    fn sleep_uses_one_decimal() {
        let mut rng = StdRng::seed_from_u64(3);
        let sleep = sleep_summary(&mut rng);
        assert!((1.5..=2.5).contains(&sleep.deep));
        assert_eq!((sleep.deep * 10.0).round() / 10.0, sleep.deep);
        assert_eq!(sleep.total, 9.0);
    }

    #[test]
    fn hours_are_zero_padded() {
        let mut rng = StdRng::seed_from_u64(1);
        let bp = blood_pressure_12h(&mut rng);
        assert_eq!(bp[0].time, "00:00");
        assert_eq!(bp[11].time, "22:00");
    }
}
