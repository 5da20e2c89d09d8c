//! White-noise and unit-root diagnostics
//!
//! Both tests are decision aids: results are reported for a human to read,
//! nothing in the pipeline branches on them except automatic order
//! selection in [`crate::models::auto_arima`].

use crate::error::{ForecastError, Result};
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::fmt;
use turbine_math::correlation::{acf, pacf, white_noise_bound};
use turbine_math::linalg::ols;

/// Result of a Ljung-Box portmanteau test
#[derive(Debug, Clone, Serialize)]
pub struct LjungBoxTest {
    /// Q statistic
    pub statistic: f64,
    /// Number of autocorrelation lags included
    pub lag: usize,
    /// Degrees of freedom of the reference chi-square (lag minus fitted parameters)
    pub df: usize,
    pub p_value: f64,
    /// Number of values tested
    pub n: usize,
}

impl LjungBoxTest {
    /// Whether the white-noise hypothesis survives at significance `alpha`
    pub fn is_white_noise(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }
}

impl fmt::Display for LjungBoxTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Box-Ljung test: X-squared = {:.4}, df = {}, p-value = {:.4e}",
            self.statistic, self.df, self.p_value
        )
    }
}

/// Ljung-Box test for serial correlation up to `lag`.
///
/// `fitdf` is subtracted from the degrees of freedom; use 0 for a raw
/// series and p + q for ARMA residuals.
pub fn ljung_box(values: &[f64], lag: usize, fitdf: usize) -> Result<LjungBoxTest> {
    if lag == 0 {
        return Err(ForecastError::InvalidParameter(
            "Ljung-Box lag must be positive".to_string(),
        ));
    }
    if fitdf >= lag {
        return Err(ForecastError::InvalidParameter(format!(
            "Ljung-Box lag ({}) must exceed the fitted degrees of freedom ({})",
            lag, fitdf
        )));
    }
    let n = values.len();
    if n <= lag {
        return Err(ForecastError::InsufficientData {
            needed: lag + 1,
            got: n,
        });
    }

    let df = lag - fitdf;
    let mean = values.iter().sum::<f64>() / n as f64;
    let spread: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    if spread <= f64::EPSILON * mean.abs().max(1.0) {
        return Ok(LjungBoxTest {
            statistic: 0.0,
            lag,
            df,
            p_value: 1.0,
            n,
        });
    }

    let r = acf(values, lag)?;
    let nf = n as f64;
    let statistic = nf
        * (nf + 2.0)
        * (1..=lag)
            .map(|k| r[k] * r[k] / (nf - k as f64))
            .sum::<f64>();

    let chi = ChiSquared::new(df as f64).map_err(|e| ForecastError::ValidationError(e.to_string()))?;
    let p_value = (1.0 - chi.cdf(statistic)).clamp(0.0, 1.0);

    Ok(LjungBoxTest {
        statistic,
        lag,
        df,
        p_value,
        n,
    })
}

/// Lag used for residual checks: at least `fitdf + 3`, otherwise
/// `min(10, n / 5)`.
pub fn residual_check_lag(n: usize, fitdf: usize) -> usize {
    (n / 5).min(10).max(fitdf + 3)
}

/// Significance levels with tabulated critical values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignificanceLevel {
    OnePercent,
    FivePercent,
    TenPercent,
}

/// Critical values at 1%, 5% and 10%
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CriticalValues {
    pub pct1: f64,
    pub pct5: f64,
    pub pct10: f64,
}

impl CriticalValues {
    pub fn at(&self, level: SignificanceLevel) -> f64 {
        match level {
            SignificanceLevel::OnePercent => self.pct1,
            SignificanceLevel::FivePercent => self.pct5,
            SignificanceLevel::TenPercent => self.pct10,
        }
    }
}

// Dickey-Fuller tables for the drift regression, rows by sample size
// (< 25, < 50, < 100, < 250, < 500, larger).
const TAU2_TABLE: [[f64; 3]; 6] = [
    [-3.75, -3.00, -2.63],
    [-3.58, -2.93, -2.60],
    [-3.51, -2.89, -2.58],
    [-3.46, -2.88, -2.57],
    [-3.44, -2.87, -2.57],
    [-3.43, -2.86, -2.57],
];

const PHI1_TABLE: [[f64; 3]; 6] = [
    [7.88, 5.18, 4.12],
    [7.06, 4.86, 3.94],
    [6.70, 4.71, 3.86],
    [6.52, 4.63, 3.81],
    [6.47, 4.61, 3.79],
    [6.43, 4.59, 3.78],
];

fn table_row(n: usize) -> usize {
    match n {
        0..=24 => 0,
        25..=49 => 1,
        50..=99 => 2,
        100..=249 => 3,
        250..=499 => 4,
        _ => 5,
    }
}

fn critical_values(table: &[[f64; 3]; 6], n: usize) -> CriticalValues {
    let row = table[table_row(n)];
    CriticalValues {
        pct1: row[0],
        pct5: row[1],
        pct10: row[2],
    }
}

/// Augmented Dickey-Fuller test with drift
#[derive(Debug, Clone, Serialize)]
pub struct UnitRootTest {
    /// t statistic of the lagged level coefficient
    pub tau2: f64,
    /// F statistic for intercept and lagged level jointly zero
    pub phi1: f64,
    /// Estimated lagged level coefficient (γ)
    pub gamma: f64,
    pub intercept: f64,
    /// Number of lagged differences in the regression
    pub lags: usize,
    /// Observations used by the regression
    pub n_obs: usize,
    pub tau2_critical: CriticalValues,
    pub phi1_critical: CriticalValues,
}

impl UnitRootTest {
    /// Whether tau2 rejects the unit root at `level`
    pub fn rejects_unit_root(&self, level: SignificanceLevel) -> bool {
        self.tau2 < self.tau2_critical.at(level)
    }

    /// Whether phi1 rejects "unit root without drift" at `level`
    pub fn rejects_phi1(&self, level: SignificanceLevel) -> bool {
        self.phi1 > self.phi1_critical.at(level)
    }
}

impl fmt::Display for UnitRootTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Augmented Dickey-Fuller Test (drift, {} lagged differences, {} obs)", self.lags, self.n_obs)?;
        writeln!(f, "  gamma: {:.6}  intercept: {:.4}", self.gamma, self.intercept)?;
        writeln!(f, "  Value of test-statistic: tau2 {:.4}  phi1 {:.4}", self.tau2, self.phi1)?;
        writeln!(f, "  Critical values      1pct    5pct   10pct")?;
        writeln!(
            f,
            "    tau2            {:>7.2} {:>7.2} {:>7.2}",
            self.tau2_critical.pct1, self.tau2_critical.pct5, self.tau2_critical.pct10
        )?;
        write!(
            f,
            "    phi1            {:>7.2} {:>7.2} {:>7.2}",
            self.phi1_critical.pct1, self.phi1_critical.pct5, self.phi1_critical.pct10
        )
    }
}

/// Augmented Dickey-Fuller regression with an intercept:
///
/// Δyₜ = a + γ yₜ₋₁ + Σᵢ δᵢ Δyₜ₋ᵢ + eₜ, i = 1..=lags
pub fn adf_drift(values: &[f64], lags: usize) -> Result<UnitRootTest> {
    let diffs: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    let k_unrestricted = 2 + lags;
    let needed = lags + k_unrestricted + 2;
    if values.len() < needed {
        return Err(ForecastError::InsufficientData {
            needed,
            got: values.len(),
        });
    }

    let rows = lags..diffs.len();
    let n_obs = rows.len();
    let response: Vec<f64> = rows.clone().map(|t| diffs[t]).collect();
    let level: Vec<f64> = rows.clone().map(|t| values[t]).collect();
    let lagged: Vec<Vec<f64>> = (1..=lags)
        .map(|i| rows.clone().map(|t| diffs[t - i]).collect())
        .collect();

    let mut design = vec![vec![1.0; n_obs], level];
    design.extend(lagged.iter().cloned());
    let full = ols(&response, &design)?;

    let restricted_rss = if lagged.is_empty() {
        response.iter().map(|v| v * v).sum()
    } else {
        ols(&response, &lagged)?.rss
    };

    let tau2 = full.t_stat(1);
    let phi1 = ((restricted_rss - full.rss) / 2.0) / full.sigma2();

    Ok(UnitRootTest {
        tau2,
        phi1,
        gamma: full.coefficients[1],
        intercept: full.coefficients[0],
        lags,
        n_obs,
        tau2_critical: critical_values(&TAU2_TABLE, n_obs),
        phi1_critical: critical_values(&PHI1_TABLE, n_obs),
    })
}

/// Sample ACF and PACF with the approximate 95% white-noise band
#[derive(Debug, Clone, Serialize)]
pub struct Correlogram {
    /// Autocorrelations at lags 1..=max_lag
    pub acf: Vec<f64>,
    /// Partial autocorrelations at lags 1..=max_lag
    pub pacf: Vec<f64>,
    /// Half-width of the band
    pub bound: f64,
    pub n: usize,
}

impl Correlogram {
    /// Lags (1-based) whose autocorrelation lies outside the band
    pub fn significant_acf_lags(&self) -> Vec<usize> {
        self.acf
            .iter()
            .enumerate()
            .filter(|(_, r)| r.abs() > self.bound)
            .map(|(i, _)| i + 1)
            .collect()
    }
}

/// Default correlogram depth, `10 log10(n)` capped at `n - 1`
pub fn default_max_lag(n: usize) -> usize {
    if n < 2 {
        return 0;
    }
    ((10.0 * (n as f64).log10()).floor() as usize).clamp(1, n - 1)
}

/// Compute the correlogram of a series
pub fn correlogram(values: &[f64], max_lag: usize) -> Result<Correlogram> {
    let r = acf(values, max_lag)?;
    let partial = pacf(values, max_lag)?;

    Ok(Correlogram {
        acf: r[1..].to_vec(),
        pacf: partial,
        bound: white_noise_bound(values.len(), 1.96),
        n: values.len(),
    })
}
