use approx::assert_relative_eq;
use chrono::{NaiveDate, NaiveDateTime};
use power_forecast::aggregation::{aggregate_daily, daily_frame, write_daily_csv};
use power_forecast::data::{Observation, SensorDataset};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
}

fn dataset() -> SensorDataset {
    SensorDataset::new(vec![
        Observation::new(at(2017, 12, 31, 23), 999.0, 1.0, 1.0, 1.0),
        Observation::new(at(2018, 1, 2, 6), 50.0, 8.0, 100.0, 3.0),
        Observation::new(at(2018, 1, 1, 0), 100.0, 10.0, 90.0, 5.0),
        Observation::new(at(2018, 1, 1, 12), 200.0, 14.0, 110.0, 7.0),
        Observation::new(at(2018, 1, 1, 18), 0.0, 12.0, 100.0, 3.0),
    ])
}

#[test]
fn test_daily_sums_and_means() {
    let days = aggregate_daily(&dataset(), None).unwrap();
    assert_eq!(days.len(), 3);

    let jan1 = &days[1];
    assert_eq!(jan1.date, NaiveDate::from_ymd_opt(2018, 1, 1).unwrap());
    assert_relative_eq!(jan1.day_active_power, 300.0);
    assert_relative_eq!(jan1.ambient_temperature, 12.0);
    assert_relative_eq!(jan1.wind_direction, 100.0);
    assert_relative_eq!(jan1.wind_speed, 5.0);
    assert_eq!(jan1.observations, 3);
}

#[test]
fn test_excluded_year_is_dropped() {
    let days = aggregate_daily(&dataset(), Some(2017)).unwrap();
    assert_eq!(days.len(), 2);
    assert!(days.iter().all(|d| d.year() != 2017));
}

#[test]
fn test_output_is_sorted_by_date() {
    let days = aggregate_daily(&dataset(), None).unwrap();
    let dates: Vec<NaiveDate> = days.iter().map(|d| d.date).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);
}

#[test]
fn test_missing_values_are_rejected() {
    let mut observation = Observation::new(at(2018, 1, 1, 0), 1.0, 1.0, 1.0, 1.0);
    observation.wind_speed = None;
    let result = aggregate_daily(&SensorDataset::new(vec![observation]), None);
    assert!(result.is_err());
}

#[test]
fn test_daily_frame_and_csv() {
    let days = aggregate_daily(&dataset(), Some(2017)).unwrap();
    let df = daily_frame(&days).unwrap();
    assert_eq!(df.height(), 2);
    assert_eq!(df.width(), 6);

    let dir = tempdir().unwrap();
    let path = dir.path().join("daily.csv");
    write_daily_csv(&days, &path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next().unwrap(),
        "date,day_active_power,ambient_temperature,wind_direction,wind_speed,observations"
    );
    assert!(lines.next().unwrap().starts_with("2018-01-01,300"));
}
