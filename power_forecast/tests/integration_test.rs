use power_forecast::config::AnalysisConfig;
use power_forecast::data::{ColumnMapping, DataLoader, SensorDataset};
use power_forecast::pipeline::{run_analysis, write_outputs};
use power_forecast::simulate::{generate, SyntheticConfig};
use power_forecast::ForecastError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::tempdir;

fn synthetic(days: usize, seed: u64) -> SensorDataset {
    generate(&SyntheticConfig {
        days,
        seed,
        ..SyntheticConfig::default()
    })
    .unwrap()
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

// Write readings in the layout of the turbine export
fn write_turbine_csv(dataset: &SensorDataset, path: &Path) {
    let mut out = BufWriter::new(File::create(path).unwrap());
    writeln!(out, "Timestamp,ActivePower,AmbientTemperatue,WindDirection,WindSpeed").unwrap();
    for o in dataset.observations() {
        writeln!(
            out,
            "{}+00:00,{},{},{},{}",
            o.timestamp.format("%Y-%m-%d %H:%M:%S"),
            cell(o.active_power),
            cell(o.ambient_temperature),
            cell(o.wind_direction),
            cell(o.wind_speed)
        )
        .unwrap();
    }
}

#[test]
fn test_full_analysis_workflow() {
    let dir = tempdir().unwrap();
    let config = AnalysisConfig {
        excluded_year: None,
        output_dir: dir.path().join("out"),
        ..AnalysisConfig::default()
    };

    // 1. Synthetic readings with missing values
    let dataset = synthetic(240, 3);
    assert!(dataset.has_missing());

    // 2. Run the analysis
    let report = run_analysis(dataset, &config).unwrap();
    assert_eq!(report.daily.len(), 240);
    assert_eq!(report.training_days, 240 - config.horizon);
    assert!(report.imputation.total_replaced() > 0);
    assert!(report.imputed_summaries.iter().all(|s| s.missing == 0));

    // 3. Daily power is persistent, so it is not white noise
    assert!(!report.white_noise.is_white_noise(0.05));

    // 4. One fit per configured step, the automatic one with its search trail
    assert_eq!(report.steps.len(), config.steps.len());
    assert!(report.steps.iter().any(|s| s.search.is_some()));
    for step in &report.steps {
        assert!(step.summary.sigma2 > 0.0);
        assert!(step.text.contains("sigma^2"));
    }

    // 5. Forecast over the held-out days
    assert_eq!(report.forecast.horizon(), config.horizon);
    assert_eq!(report.holdout_actual.len(), config.horizon);
    assert_eq!(
        report.forecast.dates(),
        &report.daily[report.training_days..]
            .iter()
            .map(|s| s.date)
            .collect::<Vec<_>>()[..]
    );
    assert!(report.holdout_accuracy.is_some());

    // 6. Outputs
    let written = write_outputs(&report, &config).unwrap();
    for name in [
        "daily_summary.csv",
        "forecast.csv",
        "report.json",
        "daily_power.svg",
        "covariates.svg",
        "correlogram.svg",
        "residuals.svg",
        "forecast.svg",
    ] {
        let path = config.output_dir.join(name);
        assert!(written.contains(&path), "{} not written", name);
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(config.output_dir.join("report.json")).unwrap()).unwrap();
    assert_eq!(json["steps"].as_array().unwrap().len(), config.steps.len());

    let text = report.to_string();
    assert!(text.contains("== Forecast =="));
}

#[test]
fn test_analysis_from_csv_without_plots() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("turbine.csv");
    write_turbine_csv(&synthetic(120, 9), &csv);

    let dataset = DataLoader::from_path(&csv, &ColumnMapping::default()).unwrap();
    assert_eq!(dataset.len(), 120 * 144);

    let config = AnalysisConfig {
        excluded_year: None,
        plots: false,
        output_dir: dir.path().join("out"),
        ..AnalysisConfig::default()
    };
    let report = run_analysis(dataset, &config).unwrap();
    let written = write_outputs(&report, &config).unwrap();
    assert_eq!(written.len(), 3);
}

#[test]
fn test_excluding_every_year_fails() {
    let config = AnalysisConfig {
        excluded_year: Some(2018),
        plots: false,
        ..AnalysisConfig::default()
    };
    let result = run_analysis(synthetic(30, 1), &config);
    assert!(result.is_err());
}

#[test]
fn test_horizon_longer_than_history() {
    let config = AnalysisConfig {
        excluded_year: None,
        horizon: 40,
        plots: false,
        ..AnalysisConfig::default()
    };
    match run_analysis(synthetic(20, 1), &config) {
        Err(ForecastError::InsufficientData { needed, got }) => {
            assert_eq!(needed, 41);
            assert_eq!(got, 20);
        }
        other => panic!("expected InsufficientData, got {:?}", other.map(|r| r.training_days)),
    }
}
