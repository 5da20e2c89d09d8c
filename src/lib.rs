//! # Turbine analysis
//!
//! Workspace facade over the two member crates:
//!
//! - [`turbine_math`]: descriptive statistics, correlation, differencing,
//!   least squares and the optimiser used by model fitting
//! - [`power_forecast`]: loading, imputation, daily aggregation,
//!   diagnostics, ARIMAX models, reports and charts
//!
//! ```
//! use turbine_analysis_workspace::math::descriptive::mean;
//!
//! assert_eq!(mean(&[1.0, 2.0, 3.0]).unwrap(), 2.0);
//! ```

pub use power_forecast as forecast;
pub use turbine_math as math;

pub use power_forecast::{AnalysisConfig, ForecastError, ForecastResult};
