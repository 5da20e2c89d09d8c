//! Point forecasts with prediction intervals

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::path::Path;

/// Coverage levels reported with every forecast
pub const DEFAULT_LEVELS: [f64; 2] = [0.80, 0.95];

/// Lower and upper bounds at one coverage level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionInterval {
    /// Coverage probability, e.g. 0.95
    pub level: f64,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Forecast result containing predicted values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    /// Name of the model that produced the forecast
    model: String,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
    intervals: Vec<PredictionInterval>,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(model: impl Into<String>, dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if values.len() != dates.len() {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match dates length ({})",
                values.len(),
                dates.len()
            )));
        }

        Ok(Self {
            model: model.into(),
            dates,
            values,
            intervals: Vec::new(),
        })
    }

    /// Attach an interval at `level`
    pub fn with_interval(mut self, level: f64, lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        if level <= 0.0 || level >= 1.0 {
            return Err(ForecastError::ValidationError(
                "Interval level must be between 0 and 1".to_string(),
            ));
        }
        if lower.len() != self.values.len() || upper.len() != self.values.len() {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match interval lengths ({}, {})",
                self.values.len(),
                lower.len(),
                upper.len()
            )));
        }

        self.intervals.push(PredictionInterval { level, lower, upper });
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Number of periods forecasted
    pub fn horizon(&self) -> usize {
        self.values.len()
    }

    pub fn intervals(&self) -> &[PredictionInterval] {
        &self.intervals
    }

    /// Interval at a given level, if computed
    pub fn interval(&self, level: f64) -> Option<&PredictionInterval> {
        self.intervals
            .iter()
            .find(|i| (i.level - level).abs() < 1e-9)
    }

    /// Calculate mean absolute error between forecast and actual values
    pub fn mean_absolute_error(&self, actual: &[f64]) -> Result<f64> {
        self.check_actual(actual)?;
        let sum: f64 = self
            .values
            .iter()
            .zip(actual.iter())
            .map(|(f, a)| (f - a).abs())
            .sum();

        Ok(sum / self.values.len() as f64)
    }

    /// Calculate mean squared error between forecast and actual values
    pub fn mean_squared_error(&self, actual: &[f64]) -> Result<f64> {
        self.check_actual(actual)?;
        let sum: f64 = self
            .values
            .iter()
            .zip(actual.iter())
            .map(|(f, a)| (f - a).powi(2))
            .sum();

        Ok(sum / self.values.len() as f64)
    }

    fn check_actual(&self, actual: &[f64]) -> Result<()> {
        if self.values.len() != actual.len() || actual.is_empty() {
            return Err(ForecastError::ValidationError(format!(
                "Forecast length ({}) doesn't match actual length ({})",
                self.values.len(),
                actual.len()
            )));
        }
        Ok(())
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the forecast table as CSV: date, point forecast, then a
    /// lower and upper column per interval level.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        let mut header = vec!["date".to_string(), "forecast".to_string()];
        for interval in &self.intervals {
            let pct = level_percent(interval.level);
            header.push(format!("lo_{}", pct));
            header.push(format!("hi_{}", pct));
        }
        writer.write_record(&header)?;

        for (i, (date, value)) in self.dates.iter().zip(&self.values).enumerate() {
            let mut record = vec![date.format("%Y-%m-%d").to_string(), value.to_string()];
            for interval in &self.intervals {
                record.push(interval.lower[i].to_string());
                record.push(interval.upper[i].to_string());
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn level_percent(level: f64) -> u32 {
    (level * 100.0).round() as u32
}

impl fmt::Display for ForecastResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Forecasts from {}:", self.model)?;
        write!(f, "{:<12} {:>16}", "Date", "Point Forecast")?;
        for interval in &self.intervals {
            let pct = level_percent(interval.level);
            write!(f, " {:>14} {:>14}", format!("Lo {}", pct), format!("Hi {}", pct))?;
        }
        writeln!(f)?;

        for (i, (date, value)) in self.dates.iter().zip(&self.values).enumerate() {
            write!(f, "{:<12} {:>16.4}", date.format("%Y-%m-%d"), value)?;
            for interval in &self.intervals {
                write!(f, " {:>14.4} {:>14.4}", interval.lower[i], interval.upper[i])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ForecastResult {
        let dates = vec![
            NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 3, 2).unwrap(),
        ];
        ForecastResult::new("ARIMA(0,0,0)", dates, vec![10.0, 12.0])
            .unwrap()
            .with_interval(0.95, vec![8.0, 9.0], vec![12.0, 15.0])
            .unwrap()
    }

    #[test]
    fn test_interval_lookup() {
        let forecast = sample();
        assert_eq!(forecast.horizon(), 2);
        assert!(forecast.interval(0.95).is_some());
        assert!(forecast.interval(0.80).is_none());
    }

    #[test]
    fn test_interval_length_checked() {
        let forecast = ForecastResult::new("m", vec![], vec![]).unwrap();
        assert!(forecast.with_interval(0.8, vec![1.0], vec![2.0]).is_err());
    }

    #[test]
    fn test_errors_against_actual() {
        let forecast = sample();
        assert_eq!(forecast.mean_absolute_error(&[11.0, 12.0]).unwrap(), 0.5);
        assert_eq!(forecast.mean_squared_error(&[11.0, 12.0]).unwrap(), 0.5);
        assert!(forecast.mean_absolute_error(&[1.0]).is_err());
    }

    #[test]
    fn test_display_has_interval_columns() {
        let table = sample().to_string();
        assert!(table.contains("Lo 95"));
        assert!(table.contains("2020-03-02"));
    }
}
