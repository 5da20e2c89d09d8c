//! Forecasting models for the daily power series

use crate::error::{ForecastError, Result};
use crate::forecast::ForecastResult;
use crate::series::{DailySeries, Regressors};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// Orders of an ARIMA(p,d,q) model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArimaOrder {
    /// Autoregressive order
    pub p: usize,
    /// Differencing order
    pub d: usize,
    /// Moving-average order
    pub q: usize,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// One estimated coefficient with its normal-theory inference
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoefficientEstimate {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    /// `estimate / std_error`; NaN when the standard error is zero
    pub z_value: f64,
    /// Two-sided p-value of the z statistic
    pub p_value: f64,
}

impl CoefficientEstimate {
    /// Whether the coefficient differs from zero at significance `alpha`
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Trained forecast model
pub trait FittedForecastModel: Debug {
    /// Forecast `horizon` periods ahead.
    ///
    /// `future` must hold exactly `horizon` rows of the regressors the
    /// model was fitted with, or be `None` for a model without regressors.
    fn forecast(&self, horizon: usize, future: Option<&Regressors>) -> Result<ForecastResult>;

    /// In-sample residuals aligned with the training series
    fn residuals(&self) -> &[f64];

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be fitted to a daily series
pub trait ForecastModel: Debug + Clone {
    /// The type of fitted model produced
    type Fitted: FittedForecastModel;

    /// Fit the model, optionally with exogenous regressors aligned to the series
    fn fit(&self, series: &DailySeries, regressors: Option<&Regressors>) -> Result<Self::Fitted>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

/// Check that regressors line up with a series of `n` periods
pub(crate) fn check_regressors(n: usize, regressors: Option<&Regressors>) -> Result<()> {
    if let Some(x) = regressors {
        if !x.is_empty() && x.nrows() != n {
            return Err(ForecastError::DimensionMismatch {
                expected: n,
                got: x.nrows(),
            });
        }
    }
    Ok(())
}

pub mod arima;
pub mod auto_arima;

pub use arima::{Arima, FittedArima};
pub use auto_arima::AutoArima;
