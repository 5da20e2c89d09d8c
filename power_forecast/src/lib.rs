//! # Power Forecast
//!
//! Daily analysis and forecasting of wind turbine output.
//!
//! ## Features
//!
//! - Loading 10-minute turbine readings from CSV or Parquet
//! - Mean imputation of missing readings
//! - Daily aggregation (summed power, averaged covariates) with a year filter
//! - White-noise (Ljung-Box) and unit-root (drift ADF) diagnostics
//! - Regression with ARIMA errors, fixed-order or automatically selected
//! - Forecasts with 80% and 95% prediction intervals
//! - SVG charts, CSV and JSON reports
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use power_forecast::config::AnalysisConfig;
//! use power_forecast::data::DataLoader;
//! use power_forecast::pipeline::{run_analysis, write_outputs};
//!
//! let config = AnalysisConfig::default();
//! let dataset = DataLoader::from_path("Turbine_Data.csv", &config.columns)?;
//! let report = run_analysis(dataset, &config)?;
//! println!("{}", report);
//! write_outputs(&report, &config)?;
//! # Ok::<(), power_forecast::ForecastError>(())
//! ```
//!
//! Individual steps are usable on their own:
//!
//! ```rust
//! use chrono::NaiveDate;
//! use power_forecast::models::{Arima, FittedForecastModel, ForecastModel};
//! use power_forecast::series::DailySeries;
//!
//! let start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
//! let series = DailySeries::from_values(start, vec![4.0, 4.0]).unwrap();
//! let fitted = Arima::new(0, 0, 0).fit(&series, None).unwrap();
//! let forecast = fitted.forecast(5, None).unwrap();
//! assert_eq!(forecast.horizon(), 5);
//! ```

pub mod aggregation;
pub mod config;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod forecast;
pub mod imputation;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod plot;
pub mod series;
pub mod simulate;

// Re-export commonly used types
pub use crate::aggregation::DailySummary;
pub use crate::config::AnalysisConfig;
pub use crate::data::{DataLoader, SensorDataset, SensorField};
pub use crate::error::ForecastError;
pub use crate::forecast::ForecastResult;
pub use crate::models::{ArimaOrder, FittedForecastModel, ForecastModel};
pub use crate::series::{DailySeries, Regressors};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
