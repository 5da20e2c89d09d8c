use power_forecast::data::{ColumnMapping, DataLoader, SensorField};
use std::io::Write;
use tempfile::NamedTempFile;

fn sample_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Timestamp,ActivePower,AmbientTemperatue,WindDirection,WindSpeed").unwrap();
    writeln!(file, "2018-01-01 00:10:00+00:00,310.5,12.0,180.0,6.5").unwrap();
    writeln!(file, "2018-01-01 00:00:00+00:00,300.0,,175.0,6.0").unwrap();
    writeln!(file, "2018-01-01 00:20:00+00:00,,12.5,185.0,").unwrap();
    writeln!(file, "2018-01-02 00:00:00+00:00,290.0,11.0,170.0,5.8").unwrap();
    file
}

#[test]
fn test_data_loader_from_csv() {
    let file = sample_csv();
    let dataset = DataLoader::from_csv(file.path(), &ColumnMapping::default()).unwrap();

    assert_eq!(dataset.len(), 4);
    assert_eq!(dataset.missing_count(SensorField::ActivePower), 1);
    assert_eq!(dataset.missing_count(SensorField::AmbientTemperature), 1);
    assert_eq!(dataset.missing_count(SensorField::WindDirection), 0);
    assert_eq!(dataset.missing_count(SensorField::WindSpeed), 1);
    assert!(dataset.has_missing());

    // Rows come back in time order
    let first = &dataset.observations()[0];
    assert_eq!(first.active_power, Some(300.0));
    assert_eq!(first.ambient_temperature, None);
}

#[test]
fn test_data_loader_from_path_uses_extension() {
    let file = sample_csv();
    let dataset = DataLoader::from_path(file.path(), &ColumnMapping::default()).unwrap();
    assert_eq!(dataset.len(), 4);
}

#[test]
fn test_custom_column_mapping() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "id,time,power,temp,dir,speed").unwrap();
    writeln!(file, "1,2019-06-01 12:00:00,100.0,20.0,90.0,4.0").unwrap();
    writeln!(file, "2,2019-06-01 12:10:00,110.0,21.0,95.0,4.2").unwrap();

    let mapping = ColumnMapping {
        timestamp: Some("time".to_string()),
        active_power: "power".to_string(),
        ambient_temperature: "temp".to_string(),
        wind_direction: "dir".to_string(),
        wind_speed: "speed".to_string(),
    };
    let dataset = DataLoader::from_csv(file.path(), &mapping).unwrap();
    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.observed(SensorField::WindSpeed), vec![4.0, 4.2]);
}

#[test]
fn test_field_summaries() {
    let file = sample_csv();
    let dataset = DataLoader::from_csv(file.path(), &ColumnMapping::default()).unwrap();
    let summary = dataset.summary(SensorField::ActivePower).unwrap();

    assert_eq!(summary.missing, 1);
    let stats = summary.summary.unwrap();
    assert_eq!(stats.min, 290.0);
    assert_eq!(stats.max, 310.5);
    assert_eq!(stats.count, 3);
    assert!(summary.to_string().contains("NA's: 1"));
}

#[test]
fn test_data_loader_error_handling() {
    let result = DataLoader::from_csv("nonexistent_file.csv", &ColumnMapping::default());
    assert!(result.is_err());

    // Missing sensor column
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Timestamp,ActivePower").unwrap();
    writeln!(file, "2018-01-01 00:00:00,1.0").unwrap();
    let result = DataLoader::from_csv(file.path(), &ColumnMapping::default());
    assert!(result.is_err());

    // Unparseable timestamp
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Timestamp,ActivePower,AmbientTemperatue,WindDirection,WindSpeed").unwrap();
    writeln!(file, "noon,1.0,2.0,3.0,4.0").unwrap();
    let result = DataLoader::from_csv(file.path(), &ColumnMapping::default());
    assert!(result.is_err());
}
