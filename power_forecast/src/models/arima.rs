//! Regression with ARIMA errors
//!
//! yₜ = μ + β'xₜ + ηₜ where ηₜ follows an ARIMA(p,d,q) process. With
//! d > 0 the response and regressors are differenced d times and μ is
//! dropped. Parameters are estimated by conditional sum of squares: for
//! fixed ARMA coefficients the residuals are linear in the regression
//! coefficients, which are therefore solved by least squares, and only the
//! ARMA coefficients are searched with Nelder-Mead.

use crate::diagnostics::{ljung_box, residual_check_lag, LjungBoxTest};
use crate::error::{ForecastError, Result};
use crate::forecast::{ForecastResult, DEFAULT_LEVELS};
use crate::metrics::AccuracyMeasures;
use crate::models::{check_regressors, ArimaOrder, CoefficientEstimate, FittedForecastModel, ForecastModel};
use crate::series::{DailySeries, Regressors};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::PI;
use std::fmt;
use turbine_math::arma::{constrain_ar, constrain_ma, integrate_ar, psi_weights};
use turbine_math::differencing::{difference, integrate};
use turbine_math::linalg::least_squares;
use turbine_math::optimize::{nelder_mead, numerical_jacobian, NelderMeadConfig};

/// ARIMA model with optional exogenous regressors
#[derive(Debug, Clone)]
pub struct Arima {
    name: String,
    order: ArimaOrder,
    include_constant: bool,
    optimizer: NelderMeadConfig,
}

impl Arima {
    /// Create a new ARIMA model; a constant is estimated when d = 0
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self::with_order(ArimaOrder::new(p, d, q))
    }

    pub fn with_order(order: ArimaOrder) -> Self {
        Self {
            name: order.to_string(),
            order,
            include_constant: true,
            optimizer: NelderMeadConfig {
                max_iter: 5000,
                tolerance: 1e-12,
                ..NelderMeadConfig::default()
            },
        }
    }

    /// Estimate (or suppress) the constant. Ignored when d > 0.
    pub fn with_constant(mut self, include: bool) -> Self {
        self.include_constant = include;
        self
    }

    pub fn with_optimizer(mut self, config: NelderMeadConfig) -> Self {
        self.optimizer = config;
        self
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    /// Whether a constant term enters the model
    pub fn includes_constant(&self) -> bool {
        self.include_constant && self.order.d == 0
    }
}

/// ARMA filter started with zero innovations; returns eₜ for t ≥ p
fn arma_filter(z: &[f64], phi: &[f64], theta: &[f64]) -> Vec<f64> {
    let p = phi.len();
    let mut e = vec![0.0; z.len()];
    for t in p..z.len() {
        let mut v = z[t];
        for (i, c) in phi.iter().enumerate() {
            v -= c * z[t - 1 - i];
        }
        for (j, c) in theta.iter().enumerate() {
            if t > j {
                v -= c * e[t - 1 - j];
            }
        }
        e[t] = v;
    }
    e.split_off(p.min(z.len()))
}

/// Differenced data and design for one CSS estimation
struct CssProblem {
    w: Vec<f64>,
    design: Vec<Vec<f64>>,
    p: usize,
    q: usize,
}

impl CssProblem {
    fn n_eff(&self) -> usize {
        self.w.len() - self.p
    }

    fn split_raw(&self, raw: &[f64]) -> (Vec<f64>, Vec<f64>) {
        (constrain_ar(&raw[..self.p]), constrain_ma(&raw[self.p..]))
    }

    /// Regression coefficients and residuals for fixed ARMA coefficients
    fn profile(&self, phi: &[f64], theta: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
        let fw = arma_filter(&self.w, phi, theta);
        let fx: Vec<Vec<f64>> = self
            .design
            .iter()
            .map(|col| arma_filter(col, phi, theta))
            .collect();
        Ok(least_squares(&fw, &fx)?)
    }

    /// Residuals for the full parameter vector `[ar, ma, regression]`
    fn residuals(&self, params: &[f64]) -> Vec<f64> {
        let (phi, rest) = params.split_at(self.p);
        let (theta, beta) = rest.split_at(self.q);
        let u: Vec<f64> = (0..self.w.len())
            .map(|t| {
                self.w[t]
                    - beta
                        .iter()
                        .zip(&self.design)
                        .map(|(b, col)| b * col[t])
                        .sum::<f64>()
            })
            .collect();
        arma_filter(&u, phi, theta)
    }
}

fn describe(order: ArimaOrder, constant: bool, has_regressors: bool) -> String {
    if has_regressors {
        format!("Regression with {} errors", order)
    } else if constant {
        format!("{} with non-zero mean", order)
    } else {
        order.to_string()
    }
}

fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| ForecastError::ModelError(e.to_string()))
}

impl ForecastModel for Arima {
    type Fitted = FittedArima;

    fn fit(&self, series: &DailySeries, regressors: Option<&Regressors>) -> Result<FittedArima> {
        let ArimaOrder { p, d, q } = self.order;
        let y = series.values();
        let n = y.len();
        check_regressors(n, regressors)?;
        let regressors = regressors.filter(|x| !x.is_empty());

        let constant = self.includes_constant();
        let k = regressors.map_or(0, |x| x.ncols()) + usize::from(constant);
        let n_params = p + q + k;
        let needed = d + p + n_params.max(1);
        if n < needed {
            return Err(ForecastError::InsufficientData { needed, got: n });
        }

        let w = difference(y, d)?;
        let mut design = Vec::with_capacity(k);
        let mut design_names = Vec::with_capacity(k);
        if constant {
            design.push(vec![1.0; w.len()]);
            design_names.push("intercept".to_string());
        }
        if let Some(x) = regressors {
            for (name, column) in x.names().iter().zip(x.columns()) {
                design.push(difference(column, d)?);
                design_names.push(name.clone());
            }
        }

        let problem = CssProblem { w, design, p, q };
        let n_eff = problem.n_eff();

        let (phi, theta, converged) = if p + q == 0 {
            (Vec::new(), Vec::new(), true)
        } else {
            let objective = |raw: &[f64]| {
                let (phi, theta) = problem.split_raw(raw);
                match problem.profile(&phi, &theta) {
                    Ok((_, e)) => e.iter().map(|v| v * v).sum::<f64>() / n_eff as f64,
                    Err(_) => f64::INFINITY,
                }
            };
            let result = nelder_mead(objective, &vec![0.0; p + q], &self.optimizer)?;
            if !result.converged {
                log::warn!(
                    "{} did not converge after {} iterations",
                    self.name,
                    result.iterations
                );
            }
            let (phi, theta) = problem.split_raw(&result.optimal_point);
            (phi, theta, result.converged)
        };

        let (beta, effective) = problem.profile(&phi, &theta)?;
        let css: f64 = effective.iter().map(|e| e * e).sum();
        let sigma2 = css / n_eff as f64;

        let params: Vec<f64> = phi.iter().chain(&theta).chain(&beta).copied().collect();
        let std_errors = if params.is_empty() {
            Vec::new()
        } else {
            let jac = numerical_jacobian(|x| problem.residuals(x), &params)?;
            match jac.gram().inverse() {
                Ok(inv) => inv
                    .diagonal()
                    .into_iter()
                    .map(|v| (v.max(0.0) * sigma2).sqrt())
                    .collect(),
                Err(e) => {
                    log::warn!("{}: coefficient covariance unavailable: {}", self.name, e);
                    vec![f64::NAN; params.len()]
                }
            }
        };

        let names: Vec<String> = (1..=p)
            .map(|i| format!("ar{}", i))
            .chain((1..=q).map(|j| format!("ma{}", j)))
            .chain(design_names)
            .collect();
        let normal = standard_normal()?;
        let coefficients = names
            .into_iter()
            .zip(params.iter().zip(&std_errors))
            .map(|(name, (&estimate, &std_error))| {
                let z_value = if std_error > 0.0 {
                    estimate / std_error
                } else {
                    f64::NAN
                };
                let p_value = if z_value.is_nan() {
                    f64::NAN
                } else {
                    2.0 * (1.0 - normal.cdf(z_value.abs()))
                };
                CoefficientEstimate {
                    name,
                    estimate,
                    std_error,
                    z_value,
                    p_value,
                }
            })
            .collect();

        let npar = params.len() + 1;
        let nf = n_eff as f64;
        let log_likelihood = -0.5 * nf * ((2.0 * PI).ln() + sigma2.ln() + 1.0);
        let aic = -2.0 * log_likelihood + 2.0 * npar as f64;
        let aicc = if n_eff > npar + 1 {
            aic + 2.0 * (npar * (npar + 1)) as f64 / (n_eff - npar - 1) as f64
        } else {
            f64::INFINITY
        };
        let bic = aic + npar as f64 * (nf.ln() - 2.0);

        let offset = d + p;
        let mut residuals = vec![0.0; offset];
        residuals.extend_from_slice(&effective);
        let fitted: Vec<f64> = y.iter().zip(&residuals).map(|(v, e)| v - e).collect();
        let accuracy = AccuracyMeasures::from_errors(&y[offset..], &effective)?;

        let fitdf = p + q;
        let residual_test = match ljung_box(&effective, residual_check_lag(n_eff, fitdf), fitdf) {
            Ok(test) => Some(test),
            Err(e) => {
                log::debug!("{}: no residual Ljung-Box test: {}", self.name, e);
                None
            }
        };

        // Regression errors and innovations on the differenced scale
        let u: Vec<f64> = (0..problem.w.len())
            .map(|t| {
                problem.w[t]
                    - beta
                        .iter()
                        .zip(&problem.design)
                        .map(|(b, col)| b * col[t])
                        .sum::<f64>()
            })
            .collect();
        let mut innovations = vec![0.0; p];
        innovations.extend_from_slice(&effective);

        let name = describe(self.order, constant, regressors.is_some());
        log::debug!("Fitted {}: sigma^2 = {:.4}, AICc = {:.4}", name, sigma2, aicc);

        Ok(FittedArima {
            name,
            order: self.order,
            include_constant: constant,
            phi,
            theta,
            beta,
            regressor_names: regressors.map(|x| x.names().to_vec()).unwrap_or_default(),
            history_regressors: regressors.map(|x| x.columns().to_vec()).unwrap_or_default(),
            coefficients,
            sigma2,
            log_likelihood,
            aic,
            aicc,
            bic,
            n_eff,
            series: series.clone(),
            u,
            innovations,
            residuals,
            fitted,
            accuracy,
            residual_test,
            converged,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Fitted regression with ARIMA errors
#[derive(Debug, Clone)]
pub struct FittedArima {
    name: String,
    order: ArimaOrder,
    include_constant: bool,
    phi: Vec<f64>,
    theta: Vec<f64>,
    /// Regression coefficients, intercept first when present
    beta: Vec<f64>,
    regressor_names: Vec<String>,
    history_regressors: Vec<Vec<f64>>,
    coefficients: Vec<CoefficientEstimate>,
    sigma2: f64,
    log_likelihood: f64,
    aic: f64,
    aicc: f64,
    bic: f64,
    n_eff: usize,
    series: DailySeries,
    u: Vec<f64>,
    innovations: Vec<f64>,
    residuals: Vec<f64>,
    fitted: Vec<f64>,
    accuracy: AccuracyMeasures,
    residual_test: Option<LjungBoxTest>,
    converged: bool,
}

impl FittedArima {
    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn includes_constant(&self) -> bool {
        self.include_constant
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.phi
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.theta
    }

    /// Intercept (if any) followed by regressor coefficients
    pub fn regression_coefficients(&self) -> &[f64] {
        &self.beta
    }

    pub fn regressor_names(&self) -> &[String] {
        &self.regressor_names
    }

    pub fn coefficients(&self) -> &[CoefficientEstimate] {
        &self.coefficients
    }

    /// Coefficient by name (`ar1`, `ma2`, `intercept` or a regressor name)
    pub fn coefficient(&self, name: &str) -> Option<&CoefficientEstimate> {
        self.coefficients.iter().find(|c| c.name == name)
    }

    /// Innovation variance, CSS divided by the effective sample size
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    pub fn aic(&self) -> f64 {
        self.aic
    }

    pub fn aicc(&self) -> f64 {
        self.aicc
    }

    pub fn bic(&self) -> f64 {
        self.bic
    }

    /// Observations contributing to the sum of squares
    pub fn nobs(&self) -> usize {
        self.n_eff
    }

    /// Residuals after the conditioning observations
    pub fn effective_residuals(&self) -> &[f64] {
        &self.residuals[self.residuals.len() - self.n_eff..]
    }

    pub fn fitted_values(&self) -> &[f64] {
        &self.fitted
    }

    pub fn accuracy(&self) -> &AccuracyMeasures {
        &self.accuracy
    }

    /// Ljung-Box test of the residuals, when the sample allows one
    pub fn residual_test(&self) -> Option<&LjungBoxTest> {
        self.residual_test.as_ref()
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    /// The training series
    pub fn series(&self) -> &DailySeries {
        &self.series
    }

    /// Serializable digest of the fit
    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            model: self.name.clone(),
            order: self.order,
            coefficients: self.coefficients.clone(),
            sigma2: self.sigma2,
            log_likelihood: self.log_likelihood,
            aic: self.aic,
            aicc: self.aicc,
            bic: self.bic,
            nobs: self.n_eff,
            accuracy: self.accuracy,
            residual_test: self.residual_test.clone(),
        }
    }

    /// Future design columns on the differenced scale
    fn future_design(&self, horizon: usize, future: Option<&Regressors>) -> Result<Vec<Vec<f64>>> {
        let future = future.filter(|x| !x.is_empty());
        let mut design = Vec::with_capacity(self.beta.len());
        if self.include_constant {
            design.push(vec![1.0; horizon]);
        }

        match (self.regressor_names.is_empty(), future) {
            (true, None) => {}
            (true, Some(x)) => {
                return Err(ForecastError::ValidationError(format!(
                    "Model was fitted without regressors but future values for {:?} were supplied",
                    x.names()
                )))
            }
            (false, None) => {
                return Err(ForecastError::ValidationError(format!(
                    "Future values are required for regressors {:?}",
                    self.regressor_names
                )))
            }
            (false, Some(x)) => {
                if x.names() != self.regressor_names.as_slice() {
                    return Err(ForecastError::ValidationError(format!(
                        "Future regressors {:?} do not match fitted regressors {:?}",
                        x.names(),
                        self.regressor_names
                    )));
                }
                if x.nrows() != horizon {
                    return Err(ForecastError::DimensionMismatch {
                        expected: horizon,
                        got: x.nrows(),
                    });
                }
                let d = self.order.d;
                for (history, upcoming) in self.history_regressors.iter().zip(x.columns()) {
                    let combined: Vec<f64> = history.iter().chain(upcoming).copied().collect();
                    let diffed = difference(&combined, d)?;
                    design.push(diffed[diffed.len() - horizon..].to_vec());
                }
            }
        }

        Ok(design)
    }
}

impl FittedForecastModel for FittedArima {
    fn forecast(&self, horizon: usize, future: Option<&Regressors>) -> Result<ForecastResult> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forecast horizon must be positive".to_string(),
            ));
        }
        let design = self.future_design(horizon, future)?;

        let m = self.u.len();
        let mut u = self.u.clone();
        let mut e = self.innovations.clone();
        for step in 0..horizon {
            let t = m + step;
            let mut v = 0.0;
            for (i, c) in self.phi.iter().enumerate() {
                if t > i {
                    v += c * u[t - 1 - i];
                }
            }
            for (j, c) in self.theta.iter().enumerate() {
                if t > j {
                    v += c * e[t - 1 - j];
                }
            }
            u.push(v);
            e.push(0.0);
        }

        let w_hat: Vec<f64> = (0..horizon)
            .map(|h| {
                u[m + h]
                    + self
                        .beta
                        .iter()
                        .zip(&design)
                        .map(|(b, col)| b * col[h])
                        .sum::<f64>()
            })
            .collect();
        let values = integrate(&w_hat, self.series.values(), self.order.d)?;

        let psi = psi_weights(&integrate_ar(&self.phi, self.order.d), &self.theta, horizon);
        let mut cumulative = 0.0;
        let std_errors: Vec<f64> = psi
            .iter()
            .map(|w| {
                cumulative += w * w;
                (self.sigma2 * cumulative).sqrt()
            })
            .collect();

        let normal = standard_normal()?;
        let mut result = ForecastResult::new(self.name.clone(), self.series.next_dates(horizon), values)?;
        for level in DEFAULT_LEVELS {
            let z = normal.inverse_cdf(0.5 + level / 2.0);
            let lower = result
                .values()
                .iter()
                .zip(&std_errors)
                .map(|(v, s)| v - z * s)
                .collect();
            let upper = result
                .values()
                .iter()
                .zip(&std_errors)
                .map(|(v, s)| v + z * s)
                .collect();
            result = result.with_interval(level, lower, upper)?;
        }

        Ok(result)
    }

    fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Serializable digest of a fitted model
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub model: String,
    pub order: ArimaOrder,
    pub coefficients: Vec<CoefficientEstimate>,
    pub sigma2: f64,
    pub log_likelihood: f64,
    pub aic: f64,
    pub aicc: f64,
    pub bic: f64,
    pub nobs: usize,
    pub accuracy: AccuracyMeasures,
    pub residual_test: Option<LjungBoxTest>,
}

impl fmt::Display for FittedArima {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        if !self.coefficients.is_empty() {
            writeln!(f)?;
            writeln!(f, "Coefficients:")?;
            writeln!(
                f,
                "  {:<22} {:>14} {:>12} {:>9} {:>10}",
                "", "Estimate", "Std. Error", "z value", "Pr(>|z|)"
            )?;
            for c in &self.coefficients {
                writeln!(
                    f,
                    "  {:<22} {:>14.6} {:>12.6} {:>9.3} {:>10.4}",
                    c.name, c.estimate, c.std_error, c.z_value, c.p_value
                )?;
            }
        }
        writeln!(f)?;
        writeln!(
            f,
            "sigma^2 = {:.4}:  log likelihood = {:.2}",
            self.sigma2, self.log_likelihood
        )?;
        writeln!(f, "AIC = {:.2}   AICc = {:.2}   BIC = {:.2}", self.aic, self.aicc, self.bic)?;
        writeln!(f)?;
        writeln!(f, "{}", self.accuracy)?;
        match &self.residual_test {
            Some(test) => write!(f, "Residuals {}", test),
            None => write!(f, "Residuals Box-Ljung test: not enough observations"),
        }
    }
}
