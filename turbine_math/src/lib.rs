//! # Turbine Math
//!
//! Numerical building blocks for the turbine power analysis.
//! This crate holds the pieces that do not know anything about sensors or
//! dates: descriptive statistics, autocorrelation, differencing, dense
//! least squares, simplex minimisation and ARMA polynomial helpers.

use thiserror::Error;

pub mod arma;
pub mod correlation;
pub mod descriptive;
pub mod differencing;
pub mod linalg;
pub mod optimize;

/// Errors that can occur in numerical calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Singular matrix: {0}")]
    SingularMatrix(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numerical operations
pub type Result<T> = std::result::Result<T, MathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MathError::SingularMatrix("pivot 2 is zero".to_string());
        assert_eq!(err.to_string(), "Singular matrix: pivot 2 is zero");

        let err = MathError::InsufficientData("need 3 values".to_string());
        assert!(err.to_string().starts_with("Insufficient data"));
    }
}
