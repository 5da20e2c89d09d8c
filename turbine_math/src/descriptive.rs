//! Descriptive statistics
//!
//! Means, variances, quantiles and the six-number summary printed for each
//! sensor field.

use crate::{MathError, Result};
use serde::Serialize;
use std::fmt;

/// Arithmetic mean of a slice
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute the mean of an empty slice".to_string(),
        ));
    }

    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (n - 1 denominator)
pub fn variance(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Err(MathError::InsufficientData(format!(
            "Sample variance needs at least 2 values, got {}",
            values.len()
        )));
    }

    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Ok(ss / (values.len() - 1) as f64)
}

/// Sample standard deviation
pub fn std_dev(values: &[f64]) -> Result<f64> {
    Ok(variance(values)?.sqrt())
}

/// Quantile of already sorted data, using linear interpolation between
/// order statistics (the "type 7" definition).
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Result<f64> {
    if sorted.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute a quantile of an empty slice".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(MathError::InvalidInput(format!(
            "Quantile probability must be within [0, 1], got {}",
            p
        )));
    }

    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    Ok(sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo]))
}

/// Six-number summary of a numeric field
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub mean: f64,
    pub q3: f64,
    pub max: f64,
    /// Number of values summarised
    pub count: usize,
}

/// Summarise a slice of values. NaN values are rejected.
pub fn summarize(values: &[f64]) -> Result<Summary> {
    if values.iter().any(|v| v.is_nan()) {
        return Err(MathError::InvalidInput(
            "Summary input contains NaN".to_string(),
        ));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    Ok(Summary {
        min: quantile_sorted(&sorted, 0.0)?,
        q1: quantile_sorted(&sorted, 0.25)?,
        median: quantile_sorted(&sorted, 0.5)?,
        mean: mean(&sorted)?,
        q3: quantile_sorted(&sorted, 0.75)?,
        max: quantile_sorted(&sorted, 1.0)?,
        count: sorted.len(),
    })
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Min: {:.3}  1st Qu.: {:.3}  Median: {:.3}  Mean: {:.3}  3rd Qu.: {:.3}  Max: {:.3}",
            self.min, self.q1, self.median, self.mean, self.q3, self.max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_and_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(mean(&values).unwrap(), 5.0);
        assert_relative_eq!(variance(&values).unwrap(), 32.0 / 7.0);
        assert!(mean(&[]).is_err());
        assert!(variance(&[1.0]).is_err());
    }

    #[test]
    fn test_quantiles_interpolate() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(quantile_sorted(&sorted, 0.5).unwrap(), 2.5);
        assert_relative_eq!(quantile_sorted(&sorted, 0.25).unwrap(), 1.75);
        assert!(quantile_sorted(&sorted, 1.5).is_err());
    }

    #[test]
    fn test_summary() {
        let summary = summarize(&[5.0, 1.0, 3.0, 2.0, 4.0]).unwrap();
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.median, 3.0);
        assert_eq!(summary.max, 5.0);
        assert_eq!(summary.count, 5);
        assert!(summarize(&[1.0, f64::NAN]).is_err());
    }
}
