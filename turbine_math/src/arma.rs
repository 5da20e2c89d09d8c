//! ARMA polynomial helpers
//!
//! Sign convention: the AR polynomial is `1 - φ₁B - … - φₚBᵖ` and the MA
//! polynomial is `1 + θ₁B + … + θ_qB^q`.

use crate::{MathError, Result};

/// Map partial autocorrelations (each in `(-1, 1)`) to the coefficients of
/// a stationary AR polynomial.
pub fn pacf_to_ar(partials: &[f64]) -> Vec<f64> {
    let mut phi: Vec<f64> = Vec::with_capacity(partials.len());
    for (k, &r) in partials.iter().enumerate() {
        let mut next = Vec::with_capacity(k + 1);
        for j in 0..k {
            next.push(phi[j] - r * phi[k - 1 - j]);
        }
        next.push(r);
        phi = next;
    }
    phi
}

/// Inverse of [`pacf_to_ar`]. Fails when the polynomial is not stationary.
pub fn ar_to_pacf(phi: &[f64]) -> Result<Vec<f64>> {
    let p = phi.len();
    let mut current = phi.to_vec();
    let mut partials = vec![0.0; p];

    for k in (0..p).rev() {
        let r = current[k];
        if r.abs() >= 1.0 {
            return Err(MathError::InvalidInput(format!(
                "AR polynomial is not stationary (partial autocorrelation {} at lag {})",
                r,
                k + 1
            )));
        }
        partials[k] = r;
        let denom = 1.0 - r * r;
        let prev: Vec<f64> = (0..k)
            .map(|j| (current[j] + r * current[k - 1 - j]) / denom)
            .collect();
        current = prev;
    }

    Ok(partials)
}

/// Unconstrained parameters to stationary AR coefficients
pub fn constrain_ar(raw: &[f64]) -> Vec<f64> {
    let partials: Vec<f64> = raw.iter().map(|v| v.tanh()).collect();
    pacf_to_ar(&partials)
}

/// Stationary AR coefficients to unconstrained parameters
pub fn unconstrain_ar(phi: &[f64]) -> Result<Vec<f64>> {
    Ok(ar_to_pacf(phi)?
        .into_iter()
        .map(|r| r.clamp(-0.999_999, 0.999_999).atanh())
        .collect())
}

/// Unconstrained parameters to invertible MA coefficients
pub fn constrain_ma(raw: &[f64]) -> Vec<f64> {
    constrain_ar(raw).into_iter().map(|v| -v).collect()
}

/// Invertible MA coefficients to unconstrained parameters
pub fn unconstrain_ma(theta: &[f64]) -> Result<Vec<f64>> {
    let as_ar: Vec<f64> = theta.iter().map(|v| -v).collect();
    unconstrain_ar(&as_ar)
}

/// Whether the AR polynomial has all roots outside the unit circle
pub fn is_stationary(phi: &[f64]) -> bool {
    ar_to_pacf(phi).is_ok()
}

/// Whether the MA polynomial has all roots outside the unit circle
pub fn is_invertible(theta: &[f64]) -> bool {
    let as_ar: Vec<f64> = theta.iter().map(|v| -v).collect();
    ar_to_pacf(&as_ar).is_ok()
}

/// Multiply the AR polynomial by `(1 - B)^d`, returning the coefficients of
/// the combined (non-stationary) AR operator in the same sign convention.
pub fn integrate_ar(phi: &[f64], d: usize) -> Vec<f64> {
    // Full polynomial coefficients, index 0 is the constant term
    let mut poly: Vec<f64> = std::iter::once(1.0).chain(phi.iter().map(|v| -v)).collect();
    for _ in 0..d {
        let mut next = vec![0.0; poly.len() + 1];
        for (i, c) in poly.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c;
        }
        poly = next;
    }
    poly.into_iter().skip(1).map(|c| -c).collect()
}

/// First `n` ψ-weights of the MA(∞) representation, starting with ψ₀ = 1.
pub fn psi_weights(phi: &[f64], theta: &[f64], n: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(n);
    for j in 0..n {
        if j == 0 {
            psi.push(1.0);
            continue;
        }
        let mut value = if j <= theta.len() { theta[j - 1] } else { 0.0 };
        for (i, coef) in phi.iter().enumerate().take(j) {
            value += coef * psi[j - 1 - i];
        }
        psi.push(value);
    }
    psi
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_round_trip() {
        let phi = vec![0.5, -0.3];
        let raw = unconstrain_ar(&phi).unwrap();
        let back = constrain_ar(&raw);
        for (a, b) in phi.iter().zip(&back) {
            assert_relative_eq!(*a, *b, epsilon = 1e-10);
        }

        let theta = vec![0.4];
        let raw = unconstrain_ma(&theta).unwrap();
        assert_relative_eq!(constrain_ma(&raw)[0], 0.4, epsilon = 1e-10);
    }

    #[test]
    fn test_constrained_values_are_stationary() {
        for raw in [[2.0, -1.5, 1.0], [-3.0, 3.0, 0.1], [0.0, 0.0, 0.0]] {
            assert!(is_stationary(&constrain_ar(&raw)));
            assert!(is_invertible(&constrain_ma(&raw)));
        }
        assert!(!is_stationary(&[1.2]));
        assert!(!is_stationary(&[0.5, 0.6]));
    }

    #[test]
    fn test_integrate_ar() {
        assert_eq!(integrate_ar(&[], 1), vec![1.0]);
        let combined = integrate_ar(&[0.5], 1);
        assert_relative_eq!(combined[0], 1.5);
        assert_relative_eq!(combined[1], -0.5);
        assert_eq!(integrate_ar(&[], 2), vec![2.0, -1.0]);
    }

    #[test]
    fn test_psi_weights() {
        let psi = psi_weights(&[0.5], &[], 4);
        assert_eq!(psi, vec![1.0, 0.5, 0.25, 0.125]);

        let psi = psi_weights(&[], &[0.3], 3);
        assert_eq!(psi, vec![1.0, 0.3, 0.0]);

        let random_walk = psi_weights(&integrate_ar(&[], 1), &[], 3);
        assert_eq!(random_walk, vec![1.0, 1.0, 1.0]);
    }
}
