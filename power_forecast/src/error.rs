//! Error types for the power_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;
use turbine_math::MathError;

/// Custom error types for the power_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to forecasting operations
    #[error("Forecasting error: {0}")]
    ForecastingError(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Two aligned collections disagree in length
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Not enough observations for the requested operation
    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Error raised while estimating a model
    #[error("Model error: {0}")]
    ModelError(String),

    /// Error while rendering a chart
    #[error("Plot error: {0}")]
    PlotError(String),

    /// Error from numerical routines
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from the CSV writer
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from JSON (de)serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}
