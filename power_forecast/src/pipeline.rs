//! End-to-end daily power analysis
//!
//! [`run_analysis`] performs every computation and returns an
//! [`AnalysisReport`]; [`write_outputs`] renders the report to files.

use crate::aggregation::{aggregate_daily, write_daily_csv, DailySummary};
use crate::config::{AnalysisConfig, ModelStep};
use crate::data::{FieldSummary, SensorDataset, SensorField};
use crate::diagnostics::{adf_drift, correlogram, default_max_lag, ljung_box, Correlogram, LjungBoxTest, UnitRootTest};
use crate::error::{ForecastError, Result};
use crate::forecast::ForecastResult;
use crate::imputation::{impute_means, ImputationReport};
use crate::metrics::AccuracyMeasures;
use crate::models::arima::ModelSummary;
use crate::models::auto_arima::CandidateScore;
use crate::models::{Arima, AutoArima, FittedArima, FittedForecastModel, ForecastModel};
use crate::plot;
use crate::series::{hold_out, DailySeries, Regressors, ANNUAL_FREQUENCY};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Days of history shown before the forecast in the forecast chart
const FORECAST_PLOT_TAIL: usize = 60;

/// One fitted step of the model progression
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub label: String,
    pub regressors: Vec<SensorField>,
    pub summary: ModelSummary,
    /// Candidates evaluated by an automatic step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<Vec<CandidateScore>>,
    /// Unit-root tests run by an automatic step while choosing d
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unit_root_tests: Vec<UnitRootTest>,
    #[serde(skip)]
    pub fitted: Option<FittedArima>,
    /// Human-readable coefficient table
    #[serde(skip)]
    pub text: String,
}

/// Everything computed by [`run_analysis`]
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub raw_summaries: Vec<FieldSummary>,
    pub imputation: ImputationReport,
    pub imputed_summaries: Vec<FieldSummary>,
    pub daily: Vec<DailySummary>,
    /// Days used for fitting
    pub training_days: usize,
    pub white_noise: LjungBoxTest,
    pub unit_root: UnitRootTest,
    pub correlogram: Correlogram,
    pub steps: Vec<StepReport>,
    pub forecast: ForecastResult,
    /// Power actually observed on the held-out days
    pub holdout_actual: Vec<f64>,
    pub holdout_accuracy: Option<AccuracyMeasures>,
}

impl AnalysisReport {
    /// The last model of the progression, used for the forecast
    pub fn final_step(&self) -> Option<&StepReport> {
        self.steps.last()
    }
}

fn regressors_for(summaries: &[DailySummary], fields: &[SensorField]) -> Result<Option<Regressors>> {
    if fields.is_empty() {
        return Ok(None);
    }
    Ok(Some(Regressors::from_summaries(summaries, fields)?))
}

fn fit_step(
    step: &ModelStep,
    series: &DailySeries,
    training: &[DailySummary],
    config: &AnalysisConfig,
) -> Result<StepReport> {
    let regressors = regressors_for(training, &step.regressors)?;
    log::info!("Fitting model step '{}'", step.label);

    let (fitted, search, unit_root_tests) = match step.order {
        Some(order) => (Arima::with_order(order).fit(series, regressors.as_ref())?, None, Vec::new()),
        None => {
            let result = AutoArima::new()
                .with_adf_lags(config.adf_lags)
                .search(series, regressors.as_ref())?;
            (result.fitted, Some(result.candidates), result.unit_root_tests)
        }
    };

    log::info!(
        "{}: {} (AICc {:.2})",
        step.label,
        fitted.name(),
        fitted.aicc()
    );
    if let Some(test) = fitted.residual_test() {
        if !test.is_white_noise(0.05) {
            log::warn!("{}: residuals are autocorrelated (p = {:.4})", step.label, test.p_value);
        }
    }

    Ok(StepReport {
        label: step.label.clone(),
        regressors: step.regressors.clone(),
        summary: fitted.summary(),
        search,
        unit_root_tests,
        text: fitted.to_string(),
        fitted: Some(fitted),
    })
}

/// Run the whole analysis on a loaded dataset.
///
/// Missing values are imputed, readings aggregated per day, the last
/// `horizon` days held out, the model progression fitted on the remaining
/// days, and the last model forecast over the held-out days using their
/// observed covariates.
pub fn run_analysis(mut dataset: SensorDataset, config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate()?;
    log::info!("Starting analysis of {} readings", dataset.len());

    let raw_summaries = dataset.summaries()?;
    let imputation = impute_means(&mut dataset)?;
    let imputed_summaries = dataset.summaries()?;

    let daily = aggregate_daily(&dataset, config.excluded_year)?;
    // The full daily range must satisfy the gap policy, held-out days included
    DailySeries::from_summaries(&daily, config.gap_policy)?;

    let (training, future) = hold_out(&daily, config.horizon)?;
    let series = DailySeries::new(
        training.iter().map(|s| s.date).collect(),
        training.iter().map(|s| s.day_active_power).collect(),
        ANNUAL_FREQUENCY,
    )?;
    log::info!(
        "Fitting on {} days, holding out {} days for the forecast",
        training.len(),
        future.len()
    );

    let values = series.values();
    let white_noise = ljung_box(values, config.ljung_box_lag, 0)?;
    let unit_root = adf_drift(values, config.adf_lags)?;
    let max_lag = config
        .correlogram_lags
        .unwrap_or_else(|| default_max_lag(values.len()))
        .min(values.len().saturating_sub(1));
    let correlogram = correlogram(values, max_lag)?;
    log::info!("{}", white_noise);
    log::info!("ADF tau2 = {:.4}, phi1 = {:.4}", unit_root.tau2, unit_root.phi1);

    let mut steps = Vec::with_capacity(config.steps.len());
    for step in &config.steps {
        steps.push(fit_step(step, &series, training, config)?);
    }

    let (last_regressors, last_fitted) = steps
        .last()
        .and_then(|s| s.fitted.as_ref().map(|f| (&s.regressors, f)))
        .ok_or_else(|| ForecastError::ModelError("No fitted model to forecast with".to_string()))?;
    let future_regressors = regressors_for(future, last_regressors)?;
    let forecast = last_fitted.forecast(config.horizon, future_regressors.as_ref())?;
    log::info!("Forecast {} days with {}", forecast.horizon(), last_fitted.name());

    let holdout_actual: Vec<f64> = future.iter().map(|s| s.day_active_power).collect();
    let holdout_accuracy = AccuracyMeasures::compute(&holdout_actual, forecast.values()).ok();

    Ok(AnalysisReport {
        raw_summaries,
        imputation,
        imputed_summaries,
        training_days: training.len(),
        daily,
        white_noise,
        unit_root,
        correlogram,
        steps,
        forecast,
        holdout_actual,
        holdout_accuracy,
    })
}

/// Write CSV, JSON and (when enabled) SVG outputs into the configured
/// directory; returns the paths written.
pub fn write_outputs(report: &AnalysisReport, config: &AnalysisConfig) -> Result<Vec<PathBuf>> {
    let dir = &config.output_dir;
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let path = dir.join("daily_summary.csv");
    write_daily_csv(&report.daily, &path)?;
    written.push(path);

    let path = dir.join("forecast.csv");
    report.forecast.write_csv(&path)?;
    written.push(path);

    let path = dir.join("report.json");
    fs::write(&path, serde_json::to_string_pretty(report)?)?;
    written.push(path);

    if config.plots {
        let daily_series = DailySeries::new(
            report.daily.iter().map(|s| s.date).collect(),
            report.daily.iter().map(|s| s.day_active_power).collect(),
            ANNUAL_FREQUENCY,
        )?;
        let training = DailySeries::new(
            daily_series.dates()[..report.training_days].to_vec(),
            daily_series.values()[..report.training_days].to_vec(),
            ANNUAL_FREQUENCY,
        )?;

        let path = dir.join("daily_power.svg");
        plot::plot_series(&path, "Daily active power", &daily_series)?;
        written.push(path);

        let path = dir.join("covariates.svg");
        plot::plot_covariates(&path, &report.daily)?;
        written.push(path);

        let path = dir.join("correlogram.svg");
        plot::plot_correlogram(&path, "Daily active power", &report.correlogram)?;
        written.push(path);

        if let Some(fitted) = report.final_step().and_then(|s| s.fitted.as_ref()) {
            let residuals = fitted.effective_residuals();
            let lags = default_max_lag(residuals.len());
            match correlogram(residuals, lags) {
                Ok(residual_acf) => {
                    let path = dir.join("residuals.svg");
                    plot::plot_residuals(&path, fitted, &residual_acf)?;
                    written.push(path);
                }
                Err(e) => log::warn!("Skipping residual plot: {}", e),
            }
        }

        let path = dir.join("forecast.svg");
        plot::plot_forecast(&path, &training, &report.forecast, FORECAST_PLOT_TAIL)?;
        written.push(path);
    }

    for path in &written {
        log::info!("Wrote {}", path.display());
    }
    Ok(written)
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== Raw data summary ==")?;
        for summary in &self.raw_summaries {
            writeln!(f, "{}", summary)?;
        }
        writeln!(f)?;
        write!(f, "{}", self.imputation)?;
        writeln!(f)?;
        writeln!(f, "== Imputed data summary ==")?;
        for summary in &self.imputed_summaries {
            writeln!(f, "{}", summary)?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "== Daily series: {} days ({} used for fitting) ==",
            self.daily.len(),
            self.training_days
        )?;
        if let (Some(first), Some(last)) = (self.daily.first(), self.daily.last()) {
            writeln!(f, "From {} to {}", first.date, last.date)?;
        }

        writeln!(f)?;
        writeln!(f, "== Diagnostics ==")?;
        writeln!(f, "{}", self.white_noise)?;
        writeln!(f, "{}", self.unit_root)?;
        let significant = self.correlogram.significant_acf_lags();
        writeln!(
            f,
            "ACF outside +/-{:.4} at lags {:?}",
            self.correlogram.bound, significant
        )?;

        for step in &self.steps {
            writeln!(f)?;
            writeln!(f, "== {} ==", step.label)?;
            if let Some(search) = &step.search {
                writeln!(f, "Automatic search evaluated {} candidates", search.len())?;
            }
            writeln!(f, "{}", step.text)?;
        }

        writeln!(f)?;
        writeln!(f, "== Forecast ==")?;
        write!(f, "{}", self.forecast)?;
        writeln!(f, "Held-out actual: {:?}", self.holdout_actual)?;
        if let Some(accuracy) = &self.holdout_accuracy {
            writeln!(f, "Held-out MAE {:.4}, RMSE {:.4}", accuracy.mae, accuracy.rmse)?;
        }
        Ok(())
    }
}
