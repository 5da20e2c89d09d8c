//! Sample autocorrelation and partial autocorrelation

use crate::descriptive::mean;
use crate::{MathError, Result};

/// Sample autocovariances for lags `0..=max_lag`, using the biased
/// (divide by n) estimator.
pub fn autocovariance(values: &[f64], max_lag: usize) -> Result<Vec<f64>> {
    let n = values.len();
    if n <= max_lag {
        return Err(MathError::InsufficientData(format!(
            "Autocovariance to lag {} needs more than {} values, got {}",
            max_lag, max_lag, n
        )));
    }

    let m = mean(values)?;
    let centered: Vec<f64> = values.iter().map(|v| v - m).collect();

    Ok((0..=max_lag)
        .map(|k| {
            centered
                .iter()
                .skip(k)
                .zip(centered.iter())
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / n as f64
        })
        .collect())
}

/// Sample autocorrelation function for lags `0..=max_lag`.
///
/// The first element is always 1. A constant series has no defined
/// autocorrelation and is rejected.
pub fn acf(values: &[f64], max_lag: usize) -> Result<Vec<f64>> {
    let gamma = autocovariance(values, max_lag)?;
    let c0 = gamma[0];
    if c0 <= f64::EPSILON * c0.abs().max(1.0) {
        return Err(MathError::CalculationError(
            "Autocorrelation of a constant series is undefined".to_string(),
        ));
    }

    Ok(gamma.iter().map(|g| g / c0).collect())
}

/// Sample partial autocorrelation function for lags `1..=max_lag`,
/// computed with the Durbin-Levinson recursion.
pub fn pacf(values: &[f64], max_lag: usize) -> Result<Vec<f64>> {
    if max_lag == 0 {
        return Ok(Vec::new());
    }
    let rho = acf(values, max_lag)?;

    let mut partials = Vec::with_capacity(max_lag);
    let mut phi: Vec<f64> = Vec::with_capacity(max_lag);

    for k in 1..=max_lag {
        let num = rho[k] - (1..k).map(|j| phi[j - 1] * rho[k - j]).sum::<f64>();
        let den = 1.0 - (1..k).map(|j| phi[j - 1] * rho[j]).sum::<f64>();
        if den.abs() < 1e-14 {
            return Err(MathError::CalculationError(format!(
                "Durbin-Levinson recursion degenerated at lag {}",
                k
            )));
        }
        let phi_kk = num / den;

        let mut next = Vec::with_capacity(k);
        for j in 1..k {
            next.push(phi[j - 1] - phi_kk * phi[k - j - 1]);
        }
        next.push(phi_kk);
        phi = next;
        partials.push(phi_kk);
    }

    Ok(partials)
}

/// Half-width of the approximate white-noise band for a correlogram
pub fn white_noise_bound(n: usize, z: f64) -> f64 {
    if n == 0 {
        return f64::INFINITY;
    }
    z / (n as f64).sqrt()
}
