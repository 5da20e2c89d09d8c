//! Turbine sensor data loading

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;
use turbine_math::descriptive::{summarize, Summary};

/// Numeric sensor fields recorded by the turbine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorField {
    ActivePower,
    AmbientTemperature,
    WindDirection,
    WindSpeed,
}

impl SensorField {
    /// All numeric fields, in column order
    pub const ALL: [SensorField; 4] = [
        SensorField::ActivePower,
        SensorField::AmbientTemperature,
        SensorField::WindDirection,
        SensorField::WindSpeed,
    ];

    /// Fields that can serve as exogenous regressors for daily power
    pub const COVARIATES: [SensorField; 3] = [
        SensorField::AmbientTemperature,
        SensorField::WindDirection,
        SensorField::WindSpeed,
    ];

    /// Snake-case name used in reports, configs and exported columns
    pub fn name(&self) -> &'static str {
        match self {
            SensorField::ActivePower => "active_power",
            SensorField::AmbientTemperature => "ambient_temperature",
            SensorField::WindDirection => "wind_direction",
            SensorField::WindSpeed => "wind_speed",
        }
    }
}

impl fmt::Display for SensorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SensorField {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(&['-', ' '][..], "_");
        SensorField::ALL
            .into_iter()
            .find(|field| field.name() == normalized)
            .ok_or_else(|| ForecastError::InvalidParameter(format!("Unknown sensor field: {}", s)))
    }
}

/// One timestamped turbine reading; numeric fields may be missing
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub active_power: Option<f64>,
    pub ambient_temperature: Option<f64>,
    pub wind_direction: Option<f64>,
    pub wind_speed: Option<f64>,
}

impl Observation {
    /// Create an observation with every field present
    pub fn new(
        timestamp: NaiveDateTime,
        active_power: f64,
        ambient_temperature: f64,
        wind_direction: f64,
        wind_speed: f64,
    ) -> Self {
        Self {
            timestamp,
            active_power: Some(active_power),
            ambient_temperature: Some(ambient_temperature),
            wind_direction: Some(wind_direction),
            wind_speed: Some(wind_speed),
        }
    }

    /// Value of a field
    pub fn get(&self, field: SensorField) -> Option<f64> {
        match field {
            SensorField::ActivePower => self.active_power,
            SensorField::AmbientTemperature => self.ambient_temperature,
            SensorField::WindDirection => self.wind_direction,
            SensorField::WindSpeed => self.wind_speed,
        }
    }

    /// Mutable access to a field
    pub fn field_mut(&mut self, field: SensorField) -> &mut Option<f64> {
        match field {
            SensorField::ActivePower => &mut self.active_power,
            SensorField::AmbientTemperature => &mut self.ambient_temperature,
            SensorField::WindDirection => &mut self.wind_direction,
            SensorField::WindSpeed => &mut self.wind_speed,
        }
    }

    /// Calendar day of the reading
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Source column names of the tabular input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    /// Timestamp column; the first column is used when unset
    pub timestamp: Option<String>,
    pub active_power: String,
    pub ambient_temperature: String,
    pub wind_direction: String,
    pub wind_speed: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        // Header spelling of the public turbine dataset, typo included
        Self {
            timestamp: None,
            active_power: "ActivePower".to_string(),
            ambient_temperature: "AmbientTemperatue".to_string(),
            wind_direction: "WindDirection".to_string(),
            wind_speed: "WindSpeed".to_string(),
        }
    }
}

impl ColumnMapping {
    /// Source column holding a field
    pub fn column_for(&self, field: SensorField) -> &str {
        match field {
            SensorField::ActivePower => &self.active_power,
            SensorField::AmbientTemperature => &self.ambient_temperature,
            SensorField::WindDirection => &self.wind_direction,
            SensorField::WindSpeed => &self.wind_speed,
        }
    }
}

/// Console summary of one field, including its missing count
#[derive(Debug, Clone, Serialize)]
pub struct FieldSummary {
    pub field: SensorField,
    /// `None` when the field has no observed value at all
    pub summary: Option<Summary>,
    pub missing: usize,
}

impl fmt::Display for FieldSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<20}", self.field.name())?;
        match &self.summary {
            Some(summary) => write!(f, " {}", summary)?,
            None => write!(f, " (no observed values)")?,
        }
        if self.missing > 0 {
            write!(f, "  NA's: {}", self.missing)?;
        }
        Ok(())
    }
}

/// Ordered collection of turbine observations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorDataset {
    observations: Vec<Observation>,
}

impl SensorDataset {
    /// Create a dataset, ordering observations by timestamp
    pub fn new(mut observations: Vec<Observation>) -> Self {
        observations.sort_by_key(|o| o.timestamp);
        Self { observations }
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub(crate) fn observations_mut(&mut self) -> &mut [Observation] {
        &mut self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Raw values of a field, missing entries included
    pub fn values(&self, field: SensorField) -> Vec<Option<f64>> {
        self.observations.iter().map(|o| o.get(field)).collect()
    }

    /// Observed (non-missing) values of a field
    pub fn observed(&self, field: SensorField) -> Vec<f64> {
        self.observations.iter().filter_map(|o| o.get(field)).collect()
    }

    /// Number of missing values in a field
    pub fn missing_count(&self, field: SensorField) -> usize {
        self.observations
            .iter()
            .filter(|o| o.get(field).is_none())
            .count()
    }

    /// Whether any numeric field still has missing values
    pub fn has_missing(&self) -> bool {
        SensorField::ALL
            .iter()
            .any(|&field| self.missing_count(field) > 0)
    }

    /// Mean of the observed values of a field
    pub fn field_mean(&self, field: SensorField) -> Result<f64> {
        let observed = self.observed(field);
        if observed.is_empty() {
            return Err(ForecastError::DataError(format!(
                "Field '{}' has no observed values",
                field
            )));
        }
        Ok(observed.iter().sum::<f64>() / observed.len() as f64)
    }

    /// Summary of a field
    pub fn summary(&self, field: SensorField) -> Result<FieldSummary> {
        let observed = self.observed(field);
        let summary = if observed.is_empty() {
            None
        } else {
            Some(summarize(&observed)?)
        };

        Ok(FieldSummary {
            field,
            summary,
            missing: self.observations.len() - observed.len(),
        })
    }

    /// Summaries of every numeric field
    pub fn summaries(&self) -> Result<Vec<FieldSummary>> {
        SensorField::ALL.iter().map(|&f| self.summary(f)).collect()
    }

    /// Calendar years present in the data
    pub fn years(&self) -> BTreeSet<i32> {
        self.observations.iter().map(|o| o.timestamp.year()).collect()
    }
}

/// Data loader for turbine sensor files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV or Parquet file, chosen by extension
    pub fn from_path<P: AsRef<Path>>(path: P, mapping: &ColumnMapping) -> Result<SensorDataset> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("parquet") | Some("pq") => Self::from_parquet(path, mapping),
            _ => Self::from_csv(path, mapping),
        }
    }

    /// Load sensor data from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P, mapping: &ColumnMapping) -> Result<SensorDataset> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(&df, mapping)
    }

    /// Load sensor data from a Parquet file
    pub fn from_parquet<P: AsRef<Path>>(path: P, mapping: &ColumnMapping) -> Result<SensorDataset> {
        let file = File::open(path)?;
        let df = ParquetReader::new(file).finish()?;

        Self::from_dataframe(&df, mapping)
    }

    /// Extract observations from an existing DataFrame
    pub fn from_dataframe(df: &DataFrame, mapping: &ColumnMapping) -> Result<SensorDataset> {
        let time_column = match &mapping.timestamp {
            Some(name) => name.clone(),
            None => df
                .get_columns()
                .first()
                .map(|s| s.name().to_string())
                .ok_or_else(|| ForecastError::DataError("Input has no columns".to_string()))?,
        };

        let stamps = Self::column(df, &time_column)?.cast(&DataType::Utf8)?;
        let stamps: Vec<Option<String>> = stamps
            .utf8()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect();

        let mut columns = Vec::with_capacity(SensorField::ALL.len());
        for field in SensorField::ALL {
            let series = Self::column(df, mapping.column_for(field))?.cast(&DataType::Float64)?;
            let values: Vec<Option<f64>> = series
                .f64()?
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()))
                .collect();
            columns.push(values);
        }

        let mut observations = Vec::with_capacity(stamps.len());
        for (row, stamp) in stamps.iter().enumerate() {
            let stamp = stamp.as_deref().ok_or_else(|| {
                ForecastError::DataError(format!("Missing timestamp at row {}", row + 1))
            })?;
            observations.push(Observation {
                timestamp: parse_timestamp(stamp)?,
                active_power: columns[0][row],
                ambient_temperature: columns[1][row],
                wind_direction: columns[2][row],
                wind_speed: columns[3][row],
            });
        }

        log::info!(
            "Loaded {} observations ({} columns) with timestamp column '{}'",
            observations.len(),
            df.width(),
            time_column
        );

        Ok(SensorDataset::new(observations))
    }

    fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
        df.column(name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", name, e))
        })
    }
}

/// Parse the timestamp formats found in turbine exports.
///
/// Offsets are normalised to UTC; naive timestamps and plain dates are
/// taken as they are.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S%:z", "%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, format) {
            return Ok(dt.naive_utc());
        }
    }
    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }

    Err(ForecastError::DataError(format!(
        "Unrecognised timestamp: '{}'",
        raw
    )))
}
