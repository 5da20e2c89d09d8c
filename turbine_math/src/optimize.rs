//! Derivative-free minimisation and finite-difference derivatives

use crate::linalg::Matrix;
use crate::{MathError, Result};

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the spread of simplex values.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrinkage coefficient.
    pub sigma: f64,
    /// Initial simplex step size.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 2000,
            tolerance: 1e-10,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.1,
        }
    }
}

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    pub optimal_point: Vec<f64>,
    pub optimal_value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Minimise `objective` starting from `initial` with the Nelder-Mead
/// simplex method.
///
/// Non-finite objective values are treated as +infinity so that the
/// simplex walks away from infeasible regions.
pub fn nelder_mead<F>(objective: F, initial: &[f64], config: &NelderMeadConfig) -> Result<NelderMeadResult>
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return Err(MathError::InvalidInput(
            "Nelder-Mead needs at least one parameter".to_string(),
        ));
    }

    let eval = |x: &[f64]| {
        let v = objective(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(initial.to_vec());
    for i in 0..n {
        let mut vertex = initial.to_vec();
        let step = if vertex[i].abs() > 1e-8 {
            config.initial_step * vertex[i].abs()
        } else {
            config.initial_step
        };
        vertex[i] += step;
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        simplex = order.iter().map(|&i| simplex[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        let best = values[0];
        let worst = values[n];
        if worst.is_finite() && worst - best <= config.tolerance * (1.0 + best.abs()) {
            converged = true;
            break;
        }

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64)
            .collect();
        let towards = |coef: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(&simplex[n])
                .map(|(c, w)| c + coef * (w - c))
                .collect()
        };

        let reflected = towards(-config.alpha);
        let f_reflected = eval(&reflected);

        if f_reflected < values[0] {
            let expanded = towards(-config.alpha * config.gamma);
            let f_expanded = eval(&expanded);
            if f_expanded < f_reflected {
                simplex[n] = expanded;
                values[n] = f_expanded;
            } else {
                simplex[n] = reflected;
                values[n] = f_reflected;
            }
        } else if f_reflected < values[n - 1] {
            simplex[n] = reflected;
            values[n] = f_reflected;
        } else {
            let contracted = if f_reflected < values[n] {
                towards(-config.alpha * config.rho)
            } else {
                towards(config.rho)
            };
            let f_contracted = eval(&contracted);
            if f_contracted < values[n].min(f_reflected) {
                simplex[n] = contracted;
                values[n] = f_contracted;
            } else {
                let best_vertex = simplex[0].clone();
                for i in 1..=n {
                    for j in 0..n {
                        simplex[i][j] = best_vertex[j] + config.sigma * (simplex[i][j] - best_vertex[j]);
                    }
                    values[i] = eval(&simplex[i]);
                }
            }
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);

    Ok(NelderMeadResult {
        optimal_point: simplex[best].clone(),
        optimal_value: values[best],
        iterations,
        converged,
    })
}

/// Central-difference Jacobian of a vector-valued function.
///
/// Row `i` holds the derivatives of output `i`; the step for parameter `j`
/// is scaled to its magnitude.
pub fn numerical_jacobian<F>(f: F, x: &[f64]) -> Result<Matrix>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let base = f(x);
    let mut jac = Matrix::zeros(base.len(), x.len());

    for j in 0..x.len() {
        let h = 1e-6 * x[j].abs().max(1e-2);
        let mut forward = x.to_vec();
        let mut backward = x.to_vec();
        forward[j] += h;
        backward[j] -= h;

        let f_fwd = f(&forward);
        let f_bwd = f(&backward);
        if f_fwd.len() != base.len() || f_bwd.len() != base.len() {
            return Err(MathError::CalculationError(
                "Function output length changed during differentiation".to_string(),
            ));
        }
        for i in 0..base.len() {
            jac[(i, j)] = (f_fwd[i] - f_bwd[i]) / (2.0 * h);
        }
    }

    Ok(jac)
}
