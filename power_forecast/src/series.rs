//! Regular daily series and aligned exogenous regressors

use crate::aggregation::DailySummary;
use crate::data::SensorField;
use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Seasonal period assumed for daily turbine data
pub const ANNUAL_FREQUENCY: usize = 365;

/// How to treat calendar days missing from the daily summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Refuse to build a series with missing days
    #[default]
    Reject,
    /// Treat consecutive rows as consecutive periods
    Ignore,
}

/// A stretch of missing days between two observed dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Gap {
    /// Last date before the gap
    pub after: NaiveDate,
    /// First date after the gap
    pub before: NaiveDate,
}

impl Gap {
    /// Number of absent days
    pub fn missing_days(&self) -> i64 {
        (self.before - self.after).num_days() - 1
    }
}

/// Daily active power indexed by date
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
    frequency: usize,
}

impl DailySeries {
    /// Create a series from dates and values.
    ///
    /// Dates must be strictly increasing; gaps are allowed here and can be
    /// inspected with [`DailySeries::gaps`].
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>, frequency: usize) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: dates.len(),
                got: values.len(),
            });
        }
        if frequency == 0 {
            return Err(ForecastError::InvalidParameter(
                "Series frequency must be positive".to_string(),
            ));
        }
        if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(ForecastError::ValidationError(format!(
                "Dates must be strictly increasing: {} is followed by {}",
                w[0], w[1]
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ValidationError(
                "Series contains non-finite values".to_string(),
            ));
        }

        Ok(Self {
            dates,
            values,
            frequency,
        })
    }

    /// Consecutive daily values starting at `start`
    pub fn from_values(start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        let dates = (0..values.len())
            .map(|i| start + Duration::days(i as i64))
            .collect();
        Self::new(dates, values, ANNUAL_FREQUENCY)
    }

    /// Build the daily power series from summaries.
    ///
    /// With [`GapPolicy::Reject`] any missing calendar day is an error.
    pub fn from_summaries(summaries: &[DailySummary], policy: GapPolicy) -> Result<Self> {
        let series = Self::new(
            summaries.iter().map(|s| s.date).collect(),
            summaries.iter().map(|s| s.day_active_power).collect(),
            ANNUAL_FREQUENCY,
        )?;

        let gaps = series.gaps();
        if let Some(first) = gaps.first() {
            let missing: i64 = gaps.iter().map(Gap::missing_days).sum();
            match policy {
                GapPolicy::Reject => {
                    return Err(ForecastError::ValidationError(format!(
                        "Daily series has {} gaps ({} missing days), first after {}",
                        gaps.len(),
                        missing,
                        first.after
                    )))
                }
                GapPolicy::Ignore => log::warn!(
                    "Ignoring {} gaps ({} missing days) in the daily series",
                    gaps.len(),
                    missing
                ),
            }
        }

        Ok(series)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn frequency(&self) -> usize {
        self.frequency
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn start(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Missing stretches between observed dates
    pub fn gaps(&self) -> Vec<Gap> {
        self.dates
            .windows(2)
            .filter(|w| (w[1] - w[0]).num_days() > 1)
            .map(|w| Gap {
                after: w[0],
                before: w[1],
            })
            .collect()
    }

    /// Whether every calendar day between start and end is present
    pub fn is_regular(&self) -> bool {
        self.gaps().is_empty()
    }

    /// The `horizon` calendar days following the last date
    pub fn next_dates(&self, horizon: usize) -> Vec<NaiveDate> {
        match self.end() {
            Some(end) => (1..=horizon)
                .map(|h| end + Duration::days(h as i64))
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Named exogenous regressors aligned row by row with a series
#[derive(Debug, Clone, PartialEq)]
pub struct Regressors {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl Regressors {
    /// Create regressors from named columns of equal length
    pub fn new(names: Vec<String>, columns: Vec<Vec<f64>>) -> Result<Self> {
        if names.len() != columns.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: names.len(),
                got: columns.len(),
            });
        }
        let mut seen = HashSet::new();
        if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
            return Err(ForecastError::InvalidParameter(format!(
                "Duplicate regressor name: {}",
                dup
            )));
        }
        if let Some(first) = columns.first() {
            if let Some(bad) = columns.iter().find(|c| c.len() != first.len()) {
                return Err(ForecastError::DimensionMismatch {
                    expected: first.len(),
                    got: bad.len(),
                });
            }
        }
        if columns.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ForecastError::ValidationError(
                "Regressors contain non-finite values".to_string(),
            ));
        }

        Ok(Self { names, columns })
    }

    /// Daily covariate columns taken from summaries
    pub fn from_summaries(summaries: &[DailySummary], fields: &[SensorField]) -> Result<Self> {
        let names = fields.iter().map(|f| f.name().to_string()).collect();
        let columns = fields
            .iter()
            .map(|&f| summaries.iter().map(|s| s.value(f)).collect())
            .collect();
        Self::new(names, columns)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    /// Column by name
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Number of rows (periods)
    pub fn nrows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Number of regressors
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Split off the last `rows` rows, e.g. as future values for a forecast
    pub fn split_tail(&self, rows: usize) -> Result<(Regressors, Regressors)> {
        let n = self.nrows();
        if rows == 0 || rows >= n {
            return Err(ForecastError::InvalidParameter(format!(
                "Cannot hold out {} of {} regressor rows",
                rows, n
            )));
        }
        let cut = n - rows;
        let head = self.columns.iter().map(|c| c[..cut].to_vec()).collect();
        let tail = self.columns.iter().map(|c| c[cut..].to_vec()).collect();
        Ok((
            Regressors {
                names: self.names.clone(),
                columns: head,
            },
            Regressors {
                names: self.names.clone(),
                columns: tail,
            },
        ))
    }
}

/// Split daily summaries into a fitting part and the last `horizon` days
/// whose covariates serve as future regressor values.
pub fn hold_out(summaries: &[DailySummary], horizon: usize) -> Result<(&[DailySummary], &[DailySummary])> {
    if horizon == 0 {
        return Err(ForecastError::InvalidParameter(
            "Forecast horizon must be positive".to_string(),
        ));
    }
    if summaries.len() <= horizon {
        return Err(ForecastError::InsufficientData {
            needed: horizon + 1,
            got: summaries.len(),
        });
    }
    Ok(summaries.split_at(summaries.len() - horizon))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_gap_detection() {
        let dates = vec![date(2019, 1, 1), date(2019, 1, 2), date(2019, 1, 5), date(2019, 1, 6)];
        let series = DailySeries::new(dates, vec![1.0, 2.0, 3.0, 4.0], ANNUAL_FREQUENCY).unwrap();
        let gaps = series.gaps();
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].after, date(2019, 1, 2));
        assert_eq!(gaps[0].missing_days(), 2);
        assert!(!series.is_regular());
    }

    #[test]
    fn test_next_dates_continue_daily() {
        let series = DailySeries::from_values(date(2019, 12, 30), vec![1.0, 2.0]).unwrap();
        assert_eq!(series.next_dates(2), vec![date(2020, 1, 1), date(2020, 1, 2)]);
    }

    #[test]
    fn test_unsorted_dates_rejected() {
        let dates = vec![date(2019, 1, 2), date(2019, 1, 1)];
        assert!(DailySeries::new(dates, vec![1.0, 2.0], ANNUAL_FREQUENCY).is_err());
    }

    #[test]
    fn test_regressor_validation() {
        assert!(Regressors::new(vec!["a".into()], vec![vec![1.0], vec![2.0]]).is_err());
        assert!(Regressors::new(vec!["a".into(), "a".into()], vec![vec![1.0], vec![2.0]]).is_err());
        assert!(Regressors::new(vec!["a".into(), "b".into()], vec![vec![1.0], vec![2.0, 3.0]]).is_err());

        let x = Regressors::new(vec!["a".into(), "b".into()], vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(x.nrows(), 2);
        assert_eq!(x.ncols(), 2);
        assert_eq!(x.column("b"), Some(&[3.0, 4.0][..]));
    }

    #[test]
    fn test_split_tail() {
        let x = Regressors::new(vec!["a".into()], vec![vec![1.0, 2.0, 3.0, 4.0]]).unwrap();
        let (train, future) = x.split_tail(1).unwrap();
        assert_eq!(train.column("a"), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(future.column("a"), Some(&[4.0][..]));
        assert_eq!(future.names(), x.names());
        assert!(x.split_tail(4).is_err());
        assert!(x.split_tail(0).is_err());
    }
}
