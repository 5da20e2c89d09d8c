use approx::assert_relative_eq;
use power_forecast::diagnostics::{adf_drift, correlogram, ljung_box, SignificanceLevel};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

fn white_noise(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    (0..n).map(|_| normal.sample(&mut rng)).collect()
}

fn ar1(phi: f64, n: usize, seed: u64) -> Vec<f64> {
    let shocks = white_noise(n, seed);
    let mut values = Vec::with_capacity(n);
    let mut prev = 0.0;
    for e in shocks {
        prev = phi * prev + e;
        values.push(prev);
    }
    values
}

#[test]
fn test_ljung_box_known_value() {
    // r1 = 0.4 for 1..=5, Q = n(n+2) r1^2 / (n-1) = 1.4
    let test = ljung_box(&[1.0, 2.0, 3.0, 4.0, 5.0], 1, 0).unwrap();
    assert_relative_eq!(test.statistic, 1.4, epsilon = 1e-10);
    assert_eq!(test.df, 1);
    assert!(test.p_value > 0.2 && test.p_value < 0.25);
}

#[test]
fn test_ljung_box_white_noise_vs_ar() {
    let noise = ljung_box(&white_noise(500, 7), 10, 0).unwrap();
    assert!(noise.p_value > 0.001);

    let persistent = ljung_box(&ar1(0.9, 500, 7), 10, 0).unwrap();
    assert!(persistent.p_value < 1e-6);
    assert!(!persistent.is_white_noise(0.05));
}

#[test]
fn test_ljung_box_rejects_bad_lags() {
    let values = white_noise(20, 1);
    assert!(ljung_box(&values, 0, 0).is_err());
    assert!(ljung_box(&values, 5, 5).is_err());
    assert!(ljung_box(&values, 25, 0).is_err());
}

#[test]
fn test_adf_stationary_series_rejects_unit_root() {
    let test = adf_drift(&ar1(0.5, 500, 11), 1).unwrap();
    assert!(test.tau2 < test.tau2_critical.pct1);
    assert!(test.rejects_unit_root(SignificanceLevel::OnePercent));
    assert!(test.gamma < 0.0);
    assert_eq!(test.lags, 1);
}

#[test]
fn test_adf_random_walk_keeps_unit_root() {
    let walk = ar1(1.0, 500, 23);
    let test = adf_drift(&walk, 1).unwrap();
    assert!(!test.rejects_unit_root(SignificanceLevel::OnePercent));
}

#[test]
fn test_critical_values_ordered() {
    let test = adf_drift(&ar1(0.5, 120, 3), 1).unwrap();
    let tau = test.tau2_critical;
    assert!(tau.pct1 < tau.pct5 && tau.pct5 < tau.pct10);
    let phi = test.phi1_critical;
    assert!(phi.pct1 > phi.pct5 && phi.pct5 > phi.pct10);
}

#[test]
fn test_correlogram_of_ar1() {
    let values = ar1(0.8, 400, 5);
    let result = correlogram(&values, 10).unwrap();

    assert_eq!(result.acf.len(), 10);
    assert_eq!(result.pacf.len(), 10);
    assert_relative_eq!(result.acf[0], result.pacf[0], epsilon = 1e-10);
    assert!(result.acf[0] > 0.6);
    assert!(result.pacf[1].abs() < 0.2);
    assert!(result.significant_acf_lags().contains(&1));
}
