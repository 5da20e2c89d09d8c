//! Differencing and its inverse

use crate::{MathError, Result};

/// Apply `d` lag-1 differences. The result has `values.len() - d` elements.
pub fn difference(values: &[f64], d: usize) -> Result<Vec<f64>> {
    if values.len() <= d {
        return Err(MathError::InsufficientData(format!(
            "Differencing {} times needs more than {} values, got {}",
            d,
            d,
            values.len()
        )));
    }

    let mut current = values.to_vec();
    for _ in 0..d {
        current = current.windows(2).map(|w| w[1] - w[0]).collect();
    }
    Ok(current)
}

/// Undo `d` differences for values that continue `history`.
///
/// `diffs` are values on the `d`-times differenced scale that follow the
/// end of `history`; the return value is on the original scale.
pub fn integrate(diffs: &[f64], history: &[f64], d: usize) -> Result<Vec<f64>> {
    if d == 0 {
        return Ok(diffs.to_vec());
    }
    if history.len() < d {
        return Err(MathError::InsufficientData(format!(
            "Integrating {} differences needs at least {} historical values, got {}",
            d,
            d,
            history.len()
        )));
    }

    // Last value of each differencing level 0..d-1
    let mut anchors = Vec::with_capacity(d);
    let mut level = history.to_vec();
    for _ in 0..d {
        anchors.push(*level.last().unwrap_or(&0.0));
        level = level.windows(2).map(|w| w[1] - w[0]).collect();
    }

    let mut current = diffs.to_vec();
    for anchor in anchors.into_iter().rev() {
        let mut last = anchor;
        for value in current.iter_mut() {
            last += *value;
            *value = last;
        }
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difference_orders() {
        let values = [1.0, 4.0, 9.0, 16.0, 25.0];
        assert_eq!(difference(&values, 0).unwrap(), values.to_vec());
        assert_eq!(difference(&values, 1).unwrap(), vec![3.0, 5.0, 7.0, 9.0]);
        assert_eq!(difference(&values, 2).unwrap(), vec![2.0, 2.0, 2.0]);
        assert!(difference(&values, 5).is_err());
    }

    #[test]
    fn test_integrate_inverts_difference() {
        let values = [1.0, 4.0, 9.0, 16.0, 25.0, 36.0, 49.0];
        let (history, future) = values.split_at(4);
        for d in 1..=2 {
            let all_diff = difference(&values, d).unwrap();
            let future_diff = &all_diff[all_diff.len() - future.len()..];
            let restored = integrate(future_diff, history, d).unwrap();
            assert_eq!(restored, future.to_vec());
        }
    }
}
