//! Analysis configuration
//!
//! Every field has a default, so a JSON file only needs the values it
//! changes. The binary applies command-line overrides on top.

use crate::data::{ColumnMapping, SensorField};
use crate::error::{ForecastError, Result};
use crate::models::ArimaOrder;
use crate::series::GapPolicy;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// One model in the fitting progression
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModelStep {
    /// Label printed with the fit
    pub label: String,
    /// Fixed order, or `None` for automatic selection
    #[serde(default)]
    pub order: Option<ArimaOrder>,
    /// Exogenous regressors, in column order
    #[serde(default)]
    pub regressors: Vec<SensorField>,
}

impl ModelStep {
    pub fn fixed(label: &str, p: usize, d: usize, q: usize, regressors: &[SensorField]) -> Self {
        Self {
            label: label.to_string(),
            order: Some(ArimaOrder::new(p, d, q)),
            regressors: regressors.to_vec(),
        }
    }

    pub fn auto(label: &str, regressors: &[SensorField]) -> Self {
        Self {
            label: label.to_string(),
            order: None,
            regressors: regressors.to_vec(),
        }
    }
}

/// The default progression: white noise with all covariates, then AR and
/// ARMA errors, then wind direction dropped with an automatic and a
/// (2,0,2) order.
pub fn default_steps() -> Vec<ModelStep> {
    use SensorField::{AmbientTemperature, WindDirection, WindSpeed};
    let all = [AmbientTemperature, WindDirection, WindSpeed];
    let reduced = [AmbientTemperature, WindSpeed];
    vec![
        ModelStep::fixed("ARIMA(0,0,0) with all covariates", 0, 0, 0, &all),
        ModelStep::fixed("ARIMA(1,0,0) with all covariates", 1, 0, 0, &all),
        ModelStep::fixed("ARIMA(1,0,1) with all covariates", 1, 0, 1, &all),
        ModelStep::auto("Automatic order without wind direction", &reduced),
        ModelStep::fixed("ARIMA(2,0,2) without wind direction", 2, 0, 2, &reduced),
    ]
}

fn default_excluded_year() -> Option<i32> {
    Some(2017)
}

fn default_horizon() -> usize {
    5
}

fn default_ljung_box_lag() -> usize {
    10
}

fn default_adf_lags() -> usize {
    1
}

fn default_plots() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

/// Configuration for [`crate::pipeline::run_analysis`]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub columns: ColumnMapping,
    /// Year dropped before aggregation; `null` keeps every year
    #[serde(default = "default_excluded_year")]
    pub excluded_year: Option<i32>,
    #[serde(default)]
    pub gap_policy: GapPolicy,
    /// Days held out and forecast
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    #[serde(default = "default_ljung_box_lag")]
    pub ljung_box_lag: usize,
    /// Lagged differences in the unit-root regression
    #[serde(default = "default_adf_lags")]
    pub adf_lags: usize,
    /// Correlogram depth; defaults to 10 log10(n)
    #[serde(default)]
    pub correlogram_lags: Option<usize>,
    #[serde(default = "default_plots")]
    pub plots: bool,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_steps")]
    pub steps: Vec<ModelStep>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            columns: ColumnMapping::default(),
            excluded_year: default_excluded_year(),
            gap_policy: GapPolicy::default(),
            horizon: default_horizon(),
            ljung_box_lag: default_ljung_box_lag(),
            adf_lags: default_adf_lags(),
            correlogram_lags: None,
            plots: default_plots(),
            output_dir: default_output_dir(),
            steps: default_steps(),
        }
    }
}

impl AnalysisConfig {
    /// Load a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        log::info!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon must be positive".to_string(),
            ));
        }
        if self.ljung_box_lag == 0 {
            return Err(ForecastError::InvalidParameter(
                "ljung_box_lag must be positive".to_string(),
            ));
        }
        if self.correlogram_lags == Some(0) {
            return Err(ForecastError::InvalidParameter(
                "correlogram_lags must be positive".to_string(),
            ));
        }
        if self.steps.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "at least one model step is required".to_string(),
            ));
        }
        Ok(())
    }
}
