//! Accuracy measures for fitted values and forecasts

use crate::error::{ForecastError, Result};
use serde::Serialize;
use std::fmt;

/// Error measures of predictions against actual values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccuracyMeasures {
    /// Mean Error
    pub me: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Percentage Error
    pub mpe: f64,
    /// Mean Absolute Percentage Error
    pub mape: f64,
}

impl AccuracyMeasures {
    /// Compare `predicted` with `actual`; errors are `actual - predicted`.
    ///
    /// Percentage errors skip points where the actual value is zero and are
    /// NaN when every actual value is zero.
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Result<Self> {
        if actual.len() != predicted.len() || actual.is_empty() {
            return Err(ForecastError::ValidationError(
                "Actual and predicted values must have the same non-zero length".to_string(),
            ));
        }

        let errors: Vec<f64> = actual.iter().zip(predicted).map(|(a, p)| a - p).collect();
        Self::from_errors(actual, &errors)
    }

    /// Measures from errors already computed against `actual`
    pub fn from_errors(actual: &[f64], errors: &[f64]) -> Result<Self> {
        if actual.len() != errors.len() || actual.is_empty() {
            return Err(ForecastError::ValidationError(
                "Actual values and errors must have the same non-zero length".to_string(),
            ));
        }

        let n = errors.len() as f64;
        let me = errors.iter().sum::<f64>() / n;
        let rmse = (errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt();
        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

        let pct: Vec<f64> = actual
            .iter()
            .zip(errors)
            .filter(|(&a, _)| a != 0.0)
            .map(|(&a, &e)| 100.0 * e / a)
            .collect();
        let (mpe, mape) = if pct.is_empty() {
            (f64::NAN, f64::NAN)
        } else {
            let m = pct.len() as f64;
            (
                pct.iter().sum::<f64>() / m,
                pct.iter().map(|p| p.abs()).sum::<f64>() / m,
            )
        };

        Ok(Self {
            me,
            rmse,
            mae,
            mpe,
            mape,
        })
    }
}

impl fmt::Display for AccuracyMeasures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Training set error measures:")?;
        writeln!(f, "  ME:    {:.4}", self.me)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  MPE:   {:.4}%", self.mpe)?;
        write!(f, "  MAPE:  {:.4}%", self.mape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_accuracy_measures() {
        let actual = [10.0, 20.0, 40.0];
        let predicted = [12.0, 18.0, 40.0];
        let m = AccuracyMeasures::compute(&actual, &predicted).unwrap();
        assert_relative_eq!(m.me, 0.0);
        assert_relative_eq!(m.mae, 4.0 / 3.0);
        assert_relative_eq!(m.rmse, (8.0f64 / 3.0).sqrt());
        assert_relative_eq!(m.mpe, (-20.0 + 10.0 + 0.0) / 3.0);
        assert_relative_eq!(m.mape, 10.0);
    }

    #[test]
    fn test_zero_actuals_give_nan_percentages() {
        let m = AccuracyMeasures::compute(&[0.0, 0.0], &[1.0, -1.0]).unwrap();
        assert!(m.mpe.is_nan());
        assert_relative_eq!(m.mae, 1.0);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(AccuracyMeasures::compute(&[1.0], &[1.0, 2.0]).is_err());
        assert!(AccuracyMeasures::compute(&[], &[]).is_err());
    }
}
