//! Daily aggregation of turbine observations

use crate::data::{SensorDataset, SensorField};
use crate::error::{ForecastError, Result};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// One calendar day of turbine activity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    /// Sum of the day's active power readings
    pub day_active_power: f64,
    /// Mean of the day's ambient temperature readings
    pub ambient_temperature: f64,
    /// Mean of the day's wind direction readings
    pub wind_direction: f64,
    /// Mean of the day's wind speed readings
    pub wind_speed: f64,
    /// Number of readings aggregated into this day
    pub observations: usize,
}

impl DailySummary {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    /// Aggregated value of a field: the daily sum for active power, the
    /// daily mean for the covariates.
    pub fn value(&self, field: SensorField) -> f64 {
        match field {
            SensorField::ActivePower => self.day_active_power,
            SensorField::AmbientTemperature => self.ambient_temperature,
            SensorField::WindDirection => self.wind_direction,
            SensorField::WindSpeed => self.wind_speed,
        }
    }
}

#[derive(Default)]
struct DayAccumulator {
    power: f64,
    temperature: f64,
    direction: f64,
    speed: f64,
    count: usize,
}

/// Group observations by calendar day.
///
/// Active power is summed and the covariates are averaged. Days falling in
/// `excluded_year` are dropped, days without readings are absent, and the
/// result is ordered by date. The dataset must not contain missing values.
pub fn aggregate_daily(dataset: &SensorDataset, excluded_year: Option<i32>) -> Result<Vec<DailySummary>> {
    if let Some(field) = SensorField::ALL
        .into_iter()
        .find(|&f| dataset.missing_count(f) > 0)
    {
        return Err(ForecastError::DataError(format!(
            "Field '{}' still has {} missing values; impute before aggregating",
            field,
            dataset.missing_count(field)
        )));
    }

    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
    let mut dropped = 0usize;

    for observation in dataset.observations() {
        if excluded_year == Some(observation.timestamp.year()) {
            dropped += 1;
            continue;
        }
        let acc = days.entry(observation.date()).or_default();
        acc.power += observation.active_power.unwrap_or_default();
        acc.temperature += observation.ambient_temperature.unwrap_or_default();
        acc.direction += observation.wind_direction.unwrap_or_default();
        acc.speed += observation.wind_speed.unwrap_or_default();
        acc.count += 1;
    }

    if dropped > 0 {
        log::info!(
            "Dropped {} observations from excluded year {}",
            dropped,
            excluded_year.unwrap_or_default()
        );
    }

    let summaries: Vec<DailySummary> = days
        .into_iter()
        .map(|(date, acc)| {
            let n = acc.count as f64;
            DailySummary {
                date,
                day_active_power: acc.power,
                ambient_temperature: acc.temperature / n,
                wind_direction: acc.direction / n,
                wind_speed: acc.speed / n,
                observations: acc.count,
            }
        })
        .collect();

    log::info!("Aggregated {} observations into {} days", dataset.len() - dropped, summaries.len());
    Ok(summaries)
}

/// Daily summaries as a DataFrame
pub fn daily_frame(summaries: &[DailySummary]) -> Result<DataFrame> {
    let dates: Vec<String> = summaries
        .iter()
        .map(|s| s.date.format("%Y-%m-%d").to_string())
        .collect();
    let column = |f: fn(&DailySummary) -> f64| summaries.iter().map(f).collect::<Vec<f64>>();

    let df = DataFrame::new(vec![
        Series::new("date", dates),
        Series::new("day_active_power", column(|s| s.day_active_power)),
        Series::new("ambient_temperature", column(|s| s.ambient_temperature)),
        Series::new("wind_direction", column(|s| s.wind_direction)),
        Series::new("wind_speed", column(|s| s.wind_speed)),
        Series::new(
            "observations",
            summaries.iter().map(|s| s.observations as u32).collect::<Vec<u32>>(),
        ),
    ])?;
    Ok(df)
}

/// Write daily summaries to a CSV file
pub fn write_daily_csv<P: AsRef<Path>>(summaries: &[DailySummary], path: P) -> Result<()> {
    let mut df = daily_frame(summaries)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).has_header(true).finish(&mut df)?;
    Ok(())
}
