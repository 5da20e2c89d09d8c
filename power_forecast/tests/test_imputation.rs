use approx::assert_relative_eq;
use chrono::NaiveDate;
use power_forecast::data::{Observation, SensorDataset, SensorField};
use power_forecast::imputation::impute_means;
use rstest::rstest;

fn reading(minute: u32, values: [Option<f64>; 4]) -> Observation {
    let timestamp = NaiveDate::from_ymd_opt(2019, 3, 1)
        .unwrap()
        .and_hms_opt(0, minute, 0)
        .unwrap();
    Observation {
        timestamp,
        active_power: values[0],
        ambient_temperature: values[1],
        wind_direction: values[2],
        wind_speed: values[3],
    }
}

fn gappy_dataset() -> SensorDataset {
    SensorDataset::new(vec![
        reading(0, [Some(100.0), None, Some(90.0), Some(5.0)]),
        reading(10, [None, Some(10.0), Some(180.0), None]),
        reading(20, [Some(300.0), Some(14.0), None, Some(7.0)]),
        reading(30, [Some(200.0), None, Some(270.0), Some(6.0)]),
    ])
}

#[rstest]
#[case(SensorField::ActivePower, 200.0)]
#[case(SensorField::AmbientTemperature, 12.0)]
#[case(SensorField::WindDirection, 180.0)]
#[case(SensorField::WindSpeed, 6.0)]
fn test_mean_is_preserved(#[case] field: SensorField, #[case] expected: f64) {
    let mut dataset = gappy_dataset();
    let before = dataset.field_mean(field).unwrap();
    assert_relative_eq!(before, expected);

    let report = impute_means(&mut dataset).unwrap();

    assert_eq!(dataset.missing_count(field), 0);
    assert_relative_eq!(dataset.field_mean(field).unwrap(), before, epsilon = 1e-12);
    assert_relative_eq!(report.field(field).unwrap().mean, before);
}

#[test]
fn test_report_counts_replacements() {
    let mut dataset = gappy_dataset();
    let report = impute_means(&mut dataset).unwrap();

    assert_eq!(report.total_replaced(), 5);
    assert_eq!(report.field(SensorField::AmbientTemperature).unwrap().replaced, 2);
    assert!(!dataset.has_missing());
    assert_eq!(
        dataset.observations()[1].active_power,
        Some(200.0),
    );
}

#[test]
fn test_complete_dataset_is_untouched() {
    let mut dataset = SensorDataset::new(vec![reading(0, [Some(1.0), Some(2.0), Some(3.0), Some(4.0)])]);
    let before = dataset.clone();
    let report = impute_means(&mut dataset).unwrap();
    assert_eq!(report.total_replaced(), 0);
    assert_eq!(dataset, before);
}

#[test]
fn test_field_without_observations_fails() {
    let mut dataset = SensorDataset::new(vec![
        reading(0, [Some(1.0), Some(2.0), Some(3.0), None]),
        reading(10, [Some(1.0), Some(2.0), Some(3.0), None]),
    ]);
    assert!(impute_means(&mut dataset).is_err());
    assert_eq!(dataset.missing_count(SensorField::WindSpeed), 2);
}
