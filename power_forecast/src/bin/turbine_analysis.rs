use anyhow::{Context, Result};
use clap::Parser;
use power_forecast::config::AnalysisConfig;
use power_forecast::data::DataLoader;
use power_forecast::pipeline::{run_analysis, write_outputs};
use power_forecast::series::GapPolicy;
use power_forecast::simulate::{generate, SyntheticConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "turbine_analysis")]
#[command(version, about = "Daily wind turbine power analysis and ARIMAX forecast", long_about = None)]
struct Args {
    /// Turbine readings (CSV or Parquet); synthetic data is used when omitted
    #[arg(long, env = "TURBINE_DATA")]
    input: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for CSV, JSON and SVG outputs
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Number of held-out days to forecast
    #[arg(long)]
    horizon: Option<usize>,

    /// Year dropped before aggregation
    #[arg(long, conflicts_with = "keep_all_years")]
    excluded_year: Option<i32>,

    /// Keep every year
    #[arg(long)]
    keep_all_years: bool,

    /// Accept missing calendar days in the daily series
    #[arg(long)]
    allow_gaps: bool,

    /// Lag of the Ljung-Box white-noise test
    #[arg(long)]
    ljung_box_lag: Option<usize>,

    /// Lagged differences in the unit-root test
    #[arg(long)]
    adf_lags: Option<usize>,

    /// Skip SVG charts
    #[arg(long)]
    no_plots: bool,

    /// Days of synthetic data when no input is given
    #[arg(long, default_value = "730")]
    synthetic_days: usize,

    /// Seed for synthetic data
    #[arg(long, default_value = "42")]
    seed: u64,
}

impl Args {
    /// Command-line values override the configuration file
    fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(horizon) = self.horizon {
            config.horizon = horizon;
        }
        if self.keep_all_years {
            config.excluded_year = None;
        } else if let Some(year) = self.excluded_year {
            config.excluded_year = Some(year);
        }
        if self.allow_gaps {
            config.gap_policy = GapPolicy::Ignore;
        }
        if let Some(lag) = self.ljung_box_lag {
            config.ljung_box_lag = lag;
        }
        if let Some(lags) = self.adf_lags {
            config.adf_lags = lags;
        }
        if self.no_plots {
            config.plots = false;
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let dataset = match &args.input {
        Some(path) => DataLoader::from_path(path, &config.columns)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => {
            log::warn!("No input file given, generating {} days of synthetic data", args.synthetic_days);
            let synthetic = SyntheticConfig {
                days: args.synthetic_days,
                seed: args.seed,
                ..SyntheticConfig::default()
            };
            // Synthetic data starts in 2018, nothing to exclude
            config.excluded_year = None;
            generate(&synthetic).context("Failed to generate synthetic data")?
        }
    };

    let report = run_analysis(dataset, &config).context("Analysis failed")?;
    println!("{}", report);

    let written = write_outputs(&report, &config).context("Failed to write outputs")?;
    println!("Wrote {} files to {}", written.len(), config.output_dir.display());

    Ok(())
}
