use approx::assert_relative_eq;
use chrono::NaiveDate;
use power_forecast::models::{Arima, ArimaOrder, AutoArima, FittedForecastModel, ForecastModel};
use power_forecast::series::{DailySeries, Regressors};
use power_forecast::ForecastError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use turbine_math::linalg::ols;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 1, 1).unwrap()
}

fn noise(n: usize, seed: u64, sd: f64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, sd).unwrap();
    (0..n).map(|_| normal.sample(&mut rng)).collect()
}

#[test]
fn test_ar1_coefficient_recovery() {
    let mut values = Vec::with_capacity(500);
    let mut prev = 0.0;
    for e in noise(500, 17, 1.0) {
        prev = 0.6 * prev + e;
        values.push(10.0 + prev);
    }
    let series = DailySeries::from_values(start(), values).unwrap();
    let fitted = Arima::new(1, 0, 0).fit(&series, None).unwrap();

    let ar1 = fitted.coefficient("ar1").unwrap();
    assert!((ar1.estimate - 0.6).abs() < 0.15, "ar1 = {}", ar1.estimate);
    assert!(ar1.std_error > 0.0 && ar1.std_error < 0.1);
    let intercept = fitted.coefficient("intercept").unwrap().estimate;
    assert!((intercept - 10.0).abs() < 0.5, "intercept = {}", intercept);
    assert!(fitted.converged());
    assert_eq!(fitted.nobs(), 499);
}

#[test]
fn test_regression_without_arma_terms_matches_ols() {
    let n = 200;
    let x: Vec<f64> = (0..n).map(|i| (i as f64 * 0.3).sin() * 5.0 + 10.0).collect();
    let e = noise(n, 5, 2.0);
    let y: Vec<f64> = x.iter().zip(&e).map(|(x, e)| 1.0 + 2.0 * x + e).collect();

    let series = DailySeries::from_values(start(), y.clone()).unwrap();
    let regressors = Regressors::new(vec!["wind_speed".to_string()], vec![x.clone()]).unwrap();
    let fitted = Arima::new(0, 0, 0).fit(&series, Some(&regressors)).unwrap();

    let reference = ols(&y, &[vec![1.0; n], x]).unwrap();
    let intercept = fitted.coefficient("intercept").unwrap();
    let slope = fitted.coefficient("wind_speed").unwrap();
    assert_relative_eq!(intercept.estimate, reference.coefficients[0], epsilon = 1e-8);
    assert_relative_eq!(slope.estimate, reference.coefficients[1], epsilon = 1e-8);

    // Standard errors use sigma^2 = RSS / n rather than RSS / (n - k)
    let scale = (reference.df_resid as f64 / n as f64).sqrt();
    assert_relative_eq!(slope.std_error, reference.std_errors[1] * scale, max_relative = 1e-4);
    assert_relative_eq!(fitted.sigma2(), reference.rss / n as f64, max_relative = 1e-10);
}

#[test]
fn test_differenced_regression_recovers_slope() {
    let n = 300;
    let x = noise(n, 8, 1.0);
    let mut level = 0.0;
    let y: Vec<f64> = x
        .iter()
        .zip(noise(n, 9, 1.0))
        .map(|(x, e)| {
            level += e;
            50.0 + 2.0 * x + level
        })
        .collect();

    let series = DailySeries::from_values(start(), y).unwrap();
    let regressors = Regressors::new(vec!["wind_speed".to_string()], vec![x]).unwrap();
    let fitted = Arima::new(0, 1, 0).fit(&series, Some(&regressors)).unwrap();

    assert!(!fitted.includes_constant());
    assert!(fitted.coefficient("intercept").is_none());
    let slope = fitted.coefficient("wind_speed").unwrap().estimate;
    assert!((slope - 2.0).abs() < 0.2, "slope = {}", slope);
}

#[test]
fn test_constant_two_point_series() {
    let series = DailySeries::from_values(start(), vec![4.0, 4.0]).unwrap();
    let fitted = Arima::new(0, 0, 0).fit(&series, None).unwrap();

    assert_relative_eq!(fitted.coefficient("intercept").unwrap().estimate, 4.0);
    let forecast = fitted.forecast(3, None).unwrap();
    for v in forecast.values() {
        assert_relative_eq!(*v, 4.0);
    }
}

#[test]
fn test_series_too_short_for_order() {
    let series = DailySeries::from_values(start(), vec![1.0, 2.0, 3.0]).unwrap();
    match Arima::new(2, 1, 2).fit(&series, None) {
        Err(ForecastError::InsufficientData { needed, got }) => {
            assert_eq!(got, 3);
            assert!(needed > 3);
        }
        other => panic!("expected InsufficientData, got {:?}", other),
    }
}

#[test]
fn test_information_criteria_relationships() {
    let values: Vec<f64> = noise(150, 4, 3.0).iter().map(|e| 20.0 + e).collect();
    let series = DailySeries::from_values(start(), values).unwrap();
    let fitted = Arima::new(1, 0, 1).fit(&series, None).unwrap();

    assert!(fitted.aicc() > fitted.aic());
    // npar = 3 coefficients + variance
    let n = fitted.nobs() as f64;
    assert_relative_eq!(fitted.bic() - fitted.aic(), 4.0 * (n.ln() - 2.0), epsilon = 1e-9);
    assert_relative_eq!(fitted.aic(), -2.0 * fitted.log_likelihood() + 8.0, epsilon = 1e-9);
}

#[test]
fn test_auto_arima_on_white_noise() {
    let values: Vec<f64> = noise(200, 12, 1.0).iter().map(|e| 5.0 + e).collect();
    let series = DailySeries::from_values(start(), values).unwrap();
    let result = AutoArima::new().search(&series, None).unwrap();

    assert_eq!(result.fitted.order().d, 0);
    assert!(!result.candidates.is_empty());
    assert!(!result.unit_root_tests.is_empty());
    let best = result
        .candidates
        .iter()
        .map(|c| c.aicc)
        .fold(f64::INFINITY, f64::min);
    assert_relative_eq!(result.fitted.aicc(), best);
}

#[test]
fn test_arima_order_display() {
    assert_eq!(ArimaOrder::new(2, 0, 2).to_string(), "ARIMA(2,0,2)");
    assert_eq!(Arima::new(1, 1, 0).order(), ArimaOrder::new(1, 1, 0));
}
