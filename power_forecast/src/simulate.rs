//! Synthetic turbine readings for demos and tests

use crate::data::{Observation, SensorDataset, SensorField};
use crate::error::{ForecastError, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

/// Wind speed below which the turbine produces nothing (m/s)
const CUT_IN_SPEED: f64 = 3.0;
/// Wind speed at which output reaches rated power (m/s)
const RATED_SPEED: f64 = 12.0;
/// Wind speed above which the turbine shuts down (m/s)
const CUT_OUT_SPEED: f64 = 25.0;
/// Rated output (kW)
const RATED_POWER: f64 = 1800.0;

/// Settings for [`generate`]
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub start: NaiveDateTime,
    pub days: usize,
    /// Minutes between readings
    pub interval_minutes: i64,
    /// Probability that any single field of a reading is missing
    pub missing_fraction: f64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        let start = NaiveDate::from_ymd_opt(2018, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self {
            start,
            days: 365,
            interval_minutes: 10,
            missing_fraction: 0.02,
            seed: 42,
        }
    }
}

/// Idealised power curve: cubic between cut-in and rated speed
pub fn power_curve(speed: f64) -> f64 {
    if speed < CUT_IN_SPEED || speed >= CUT_OUT_SPEED {
        0.0
    } else if speed < RATED_SPEED {
        RATED_POWER * ((speed - CUT_IN_SPEED) / (RATED_SPEED - CUT_IN_SPEED)).powi(3)
    } else {
        RATED_POWER
    }
}

fn normal(mean: f64, sd: f64) -> Result<Normal<f64>> {
    Normal::new(mean, sd).map_err(|e| ForecastError::InvalidParameter(e.to_string()))
}

/// Generate readings with an annual temperature cycle and persistent
/// day-to-day weather, so daily power is autocorrelated and driven by
/// wind speed.
pub fn generate(config: &SyntheticConfig) -> Result<SensorDataset> {
    if config.interval_minutes <= 0 || 1440 % config.interval_minutes != 0 {
        return Err(ForecastError::InvalidParameter(format!(
            "Reading interval must divide a day, got {} minutes",
            config.interval_minutes
        )));
    }
    if !(0.0..1.0).contains(&config.missing_fraction) {
        return Err(ForecastError::InvalidParameter(format!(
            "Missing fraction must be in [0, 1), got {}",
            config.missing_fraction
        )));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let weather_shock = normal(0.0, 1.5)?;
    let gust = normal(0.0, 1.0)?;
    let temperature_noise = normal(0.0, 1.5)?;
    let direction_noise = normal(0.0, 25.0)?;
    let power_noise = normal(0.0, 15.0)?;

    let per_day = (1440 / config.interval_minutes) as usize;
    let mut observations = Vec::with_capacity(config.days * per_day);
    let mut wind_level = 7.0;

    for day in 0..config.days {
        // AR(1) daily weather around 7 m/s
        wind_level = 7.0 + 0.7 * (wind_level - 7.0) + weather_shock.sample(&mut rng);
        let day_start = config.start + Duration::days(day as i64);
        let season = 2.0 * PI * day_start.ordinal0() as f64 / 365.0;

        for slot in 0..per_day {
            let timestamp = day_start + Duration::minutes(slot as i64 * config.interval_minutes);
            let hour = slot as f64 * config.interval_minutes as f64 / 60.0;

            let temperature = 14.0 - 10.0 * season.cos()
                + 3.0 * (2.0 * PI * (hour - 9.0) / 24.0).sin()
                + temperature_noise.sample(&mut rng);
            let speed = (wind_level + gust.sample(&mut rng)).max(0.0);
            let direction = (200.0 + 40.0 * season.sin() + direction_noise.sample(&mut rng)).rem_euclid(360.0);
            let power = match power_curve(speed) {
                p if p > 0.0 => (p + power_noise.sample(&mut rng)).max(0.0),
                _ => 0.0,
            };

            let mut observation = Observation::new(timestamp, power, temperature, direction, speed);
            for field in SensorField::ALL {
                if rng.gen_bool(config.missing_fraction) {
                    *observation.field_mut(field) = None;
                }
            }
            observations.push(observation);
        }
    }

    log::info!(
        "Generated {} synthetic readings over {} days (seed {})",
        observations.len(),
        config.days,
        config.seed
    );
    Ok(SensorDataset::new(observations))
}
