//! Automatic ARIMA order selection
//!
//! The differencing order comes from repeated drift ADF tests; p, q and the
//! constant come from a stepwise AICc search around the best model so far.

use crate::diagnostics::{adf_drift, SignificanceLevel, UnitRootTest};
use crate::error::{ForecastError, Result};
use crate::models::arima::{Arima, FittedArima};
use crate::models::{check_regressors, ArimaOrder, ForecastModel};
use crate::series::{DailySeries, Regressors};
use serde::Serialize;
use std::collections::HashSet;
use turbine_math::differencing::difference;
use turbine_math::linalg::least_squares;

const STARTING_ORDERS: [(usize, usize); 4] = [(2, 2), (0, 0), (1, 0), (0, 1)];
const MAX_MODELS: usize = 94;

/// AICc of one evaluated candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateScore {
    pub order: ArimaOrder,
    pub constant: bool,
    /// AICc, or +inf when the fit failed
    pub aicc: f64,
}

/// Outcome of an automatic search
#[derive(Debug, Clone)]
pub struct AutoArimaResult {
    /// Best model found
    pub fitted: FittedArima,
    /// Unit-root tests run while choosing d, in order
    pub unit_root_tests: Vec<UnitRootTest>,
    /// Every candidate evaluated, in evaluation order
    pub candidates: Vec<CandidateScore>,
}

/// Stepwise ARIMA order search
#[derive(Debug, Clone)]
pub struct AutoArima {
    name: String,
    max_p: usize,
    max_d: usize,
    max_q: usize,
    adf_lags: usize,
    level: SignificanceLevel,
}

impl Default for AutoArima {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoArima {
    pub fn new() -> Self {
        Self {
            name: "AutoARIMA".to_string(),
            max_p: 5,
            max_d: 2,
            max_q: 5,
            adf_lags: 1,
            level: SignificanceLevel::FivePercent,
        }
    }

    pub fn with_max_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_d = max_d;
        self.max_q = max_q;
        self
    }

    /// Lagged differences in the unit-root regressions
    pub fn with_adf_lags(mut self, lags: usize) -> Self {
        self.adf_lags = lags;
        self
    }

    /// Significance level at which a unit root is rejected
    pub fn with_significance(mut self, level: SignificanceLevel) -> Self {
        self.level = level;
        self
    }

    /// Choose d by differencing until the drift ADF test rejects a unit root.
    ///
    /// With regressors the test runs on the residuals of a least squares
    /// regression of the series on them.
    pub fn select_differencing(
        &self,
        series: &DailySeries,
        regressors: Option<&Regressors>,
    ) -> Result<(usize, Vec<UnitRootTest>)> {
        let mut current = match regressors.filter(|x| !x.is_empty()) {
            Some(x) => {
                let mut columns = vec![vec![1.0; series.len()]];
                columns.extend(x.columns().iter().cloned());
                least_squares(series.values(), &columns)?.1
            }
            None => series.values().to_vec(),
        };

        let mut tests = Vec::new();
        let mut d = 0;
        while d < self.max_d {
            let test = match adf_drift(&current, self.adf_lags) {
                Ok(test) => test,
                Err(e) => {
                    log::debug!("Stopping differencing search at d = {}: {}", d, e);
                    break;
                }
            };
            let stationary = test.rejects_unit_root(self.level);
            log::debug!("d = {}: tau2 = {:.4}, stationary = {}", d, test.tau2, stationary);
            tests.push(test);
            if stationary {
                break;
            }
            d += 1;
            current = difference(&current, 1)?;
        }

        Ok((d, tests))
    }

    /// Run the full search and keep its trail
    pub fn search(&self, series: &DailySeries, regressors: Option<&Regressors>) -> Result<AutoArimaResult> {
        check_regressors(series.len(), regressors)?;
        let (d, unit_root_tests) = self.select_differencing(series, regressors)?;
        log::info!("Selected differencing order d = {}", d);

        let mut visited: HashSet<(usize, usize, bool)> = HashSet::new();
        let mut candidates = Vec::new();
        let mut best: Option<FittedArima> = None;

        let mut evaluate = |p: usize, q: usize, constant: bool, best: &mut Option<FittedArima>| -> bool {
            if p > self.max_p || q > self.max_q || candidates.len() >= MAX_MODELS {
                return false;
            }
            if !visited.insert((p, q, constant)) {
                return false;
            }

            let order = ArimaOrder::new(p, d, q);
            let model = Arima::with_order(order).with_constant(constant);
            let (aicc, fitted) = match model.fit(series, regressors) {
                Ok(fitted) if !fitted.aicc().is_nan() => (fitted.aicc(), Some(fitted)),
                Ok(_) => (f64::INFINITY, None),
                Err(e) => {
                    log::debug!("{} (constant = {}) failed: {}", order, constant, e);
                    (f64::INFINITY, None)
                }
            };
            log::debug!("{} (constant = {}): AICc = {:.4}", order, constant, aicc);
            candidates.push(CandidateScore {
                order,
                constant,
                aicc,
            });

            let improved = best.as_ref().map_or(true, |b| aicc < b.aicc());
            match fitted {
                Some(fitted) if improved => {
                    *best = Some(fitted);
                    true
                }
                _ => false,
            }
        };

        let allow_constant = d == 0;
        for (p, q) in STARTING_ORDERS {
            evaluate(p, q, allow_constant, &mut best);
        }

        loop {
            let Some(current) = best.as_ref() else {
                break;
            };
            let ArimaOrder { p, q, .. } = current.order();
            let constant = current.includes_constant();

            let mut neighbours: Vec<(usize, usize, bool)> = Vec::new();
            let steps: [(isize, isize); 8] = [(-1, 0), (1, 0), (0, -1), (0, 1), (-1, -1), (1, 1), (-1, 1), (1, -1)];
            for (dp, dq) in steps {
                let np = p as isize + dp;
                let nq = q as isize + dq;
                if np >= 0 && nq >= 0 {
                    neighbours.push((np as usize, nq as usize, constant));
                }
            }
            if allow_constant {
                neighbours.push((p, q, !constant));
            }

            let mut moved = false;
            for (np, nq, nc) in neighbours {
                if evaluate(np, nq, nc, &mut best) {
                    moved = true;
                    break;
                }
            }
            if !moved {
                break;
            }
        }

        let fitted = best.ok_or_else(|| {
            ForecastError::ModelError("No candidate ARIMA model could be fitted".to_string())
        })?;
        log::info!(
            "Selected {} after {} candidates (AICc {:.4})",
            fitted.order(),
            candidates.len(),
            fitted.aicc()
        );

        Ok(AutoArimaResult {
            fitted,
            unit_root_tests,
            candidates,
        })
    }
}

impl ForecastModel for AutoArima {
    type Fitted = FittedArima;

    fn fit(&self, series: &DailySeries, regressors: Option<&Regressors>) -> Result<FittedArima> {
        Ok(self.search(series, regressors)?.fitted)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
