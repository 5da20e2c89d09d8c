//! Dense linear algebra and ordinary least squares
//!
//! The systems solved here are tiny (a handful of regressors), so a plain
//! row-major matrix with Gauss-Jordan elimination is all that is needed.

use crate::{MathError, Result};
use std::ops::{Index, IndexMut};

/// Row-major dense matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a zero matrix
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Create an identity matrix
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = 1.0;
        }
        m
    }

    /// Build a matrix whose columns are the given vectors
    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Self> {
        let cols = columns.len();
        let rows = columns.first().map(|c| c.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
            return Err(MathError::InvalidInput(format!(
                "Column lengths differ: expected {}, found {}",
                rows,
                bad.len()
            )));
        }

        let mut m = Self::zeros(rows, cols);
        for (j, column) in columns.iter().enumerate() {
            for (i, value) in column.iter().enumerate() {
                m[(i, j)] = *value;
            }
        }
        Ok(m)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Diagonal elements
    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.rows.min(self.cols)).map(|i| self[(i, i)]).collect()
    }

    pub fn transpose(&self) -> Self {
        let mut t = Self::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                t[(j, i)] = self[(i, j)];
            }
        }
        t
    }

    /// Matrix product `self * other`
    pub fn matmul(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(MathError::InvalidInput(format!(
                "Cannot multiply {}x{} by {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }

        let mut out = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self[(i, k)];
                if a == 0.0 {
                    continue;
                }
                for j in 0..other.cols {
                    out[(i, j)] += a * other[(k, j)];
                }
            }
        }
        Ok(out)
    }

    /// Matrix-vector product
    pub fn mul_vec(&self, v: &[f64]) -> Result<Vec<f64>> {
        if self.cols != v.len() {
            return Err(MathError::InvalidInput(format!(
                "Cannot multiply {}x{} by a vector of length {}",
                self.rows,
                self.cols,
                v.len()
            )));
        }

        Ok((0..self.rows)
            .map(|i| (0..self.cols).map(|j| self[(i, j)] * v[j]).sum())
            .collect())
    }

    /// Cross product `selfᵀ * self`
    pub fn gram(&self) -> Matrix {
        let mut g = Matrix::zeros(self.cols, self.cols);
        for r in 0..self.rows {
            for i in 0..self.cols {
                let a = self[(r, i)];
                for j in i..self.cols {
                    g[(i, j)] += a * self[(r, j)];
                }
            }
        }
        for i in 0..self.cols {
            for j in 0..i {
                g[(i, j)] = g[(j, i)];
            }
        }
        g
    }

    /// Inverse by Gauss-Jordan elimination with partial pivoting
    pub fn inverse(&self) -> Result<Matrix> {
        if self.rows != self.cols {
            return Err(MathError::InvalidInput(format!(
                "Only square matrices can be inverted, got {}x{}",
                self.rows, self.cols
            )));
        }

        let n = self.rows;
        let mut a = self.clone();
        let mut inv = Matrix::identity(n);
        let scale = self
            .data
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
            .max(f64::MIN_POSITIVE);

        for col in 0..n {
            let pivot_row = (col..n)
                .max_by(|&x, &y| a[(x, col)].abs().total_cmp(&a[(y, col)].abs()))
                .unwrap_or(col);
            let pivot = a[(pivot_row, col)];
            if pivot.abs() <= 1e-12 * scale {
                return Err(MathError::SingularMatrix(format!(
                    "pivot {} is numerically zero",
                    col
                )));
            }

            if pivot_row != col {
                a.swap_rows(pivot_row, col);
                inv.swap_rows(pivot_row, col);
            }

            for j in 0..n {
                a[(col, j)] /= pivot;
                inv[(col, j)] /= pivot;
            }

            for row in 0..n {
                if row == col {
                    continue;
                }
                let factor = a[(row, col)];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n {
                    a[(row, j)] -= factor * a[(col, j)];
                    inv[(row, j)] -= factor * inv[(col, j)];
                }
            }
        }

        Ok(inv)
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        for j in 0..self.cols {
            self.data.swap(a * self.cols + j, b * self.cols + j);
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.data[i * self.cols + j]
    }
}

/// Least squares coefficients and residuals for `y ~ columns`.
///
/// The design is given column by column; include a column of ones to fit an
/// intercept.
pub fn least_squares(y: &[f64], columns: &[Vec<f64>]) -> Result<(Vec<f64>, Vec<f64>)> {
    if columns.is_empty() {
        return Ok((Vec::new(), y.to_vec()));
    }
    if let Some(bad) = columns.iter().find(|c| c.len() != y.len()) {
        return Err(MathError::InvalidInput(format!(
            "Regressor length {} does not match response length {}",
            bad.len(),
            y.len()
        )));
    }
    if y.len() < columns.len() {
        return Err(MathError::InsufficientData(format!(
            "Least squares with {} regressors needs at least {} rows, got {}",
            columns.len(),
            columns.len(),
            y.len()
        )));
    }

    let k = columns.len();
    let mut xtx = Matrix::zeros(k, k);
    let mut xty = vec![0.0; k];
    for i in 0..k {
        xty[i] = columns[i].iter().zip(y).map(|(a, b)| a * b).sum();
        for j in i..k {
            let v: f64 = columns[i].iter().zip(&columns[j]).map(|(a, b)| a * b).sum();
            xtx[(i, j)] = v;
            xtx[(j, i)] = v;
        }
    }

    let coefficients = xtx.inverse()?.mul_vec(&xty)?;
    let residuals = (0..y.len())
        .map(|t| y[t] - (0..k).map(|j| coefficients[j] * columns[j][t]).sum::<f64>())
        .collect();

    Ok((coefficients, residuals))
}

/// Ordinary least squares fit with classical standard errors
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub coefficients: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub residuals: Vec<f64>,
    /// Residual sum of squares
    pub rss: f64,
    /// Residual degrees of freedom (rows minus regressors)
    pub df_resid: usize,
}

impl OlsFit {
    /// t statistic of coefficient `i`
    pub fn t_stat(&self, i: usize) -> f64 {
        self.coefficients[i] / self.std_errors[i]
    }

    /// Residual variance estimate `rss / df_resid`
    pub fn sigma2(&self) -> f64 {
        if self.df_resid == 0 {
            return f64::NAN;
        }
        self.rss / self.df_resid as f64
    }
}

/// Fit `y ~ columns` by OLS and compute coefficient standard errors
pub fn ols(y: &[f64], columns: &[Vec<f64>]) -> Result<OlsFit> {
    if y.len() <= columns.len() {
        return Err(MathError::InsufficientData(format!(
            "OLS with {} regressors needs more than {} rows, got {}",
            columns.len(),
            columns.len(),
            y.len()
        )));
    }

    let (coefficients, residuals) = least_squares(y, columns)?;
    let rss: f64 = residuals.iter().map(|r| r * r).sum();
    let df_resid = y.len() - columns.len();
    let sigma2 = rss / df_resid as f64;

    let std_errors = if columns.is_empty() {
        Vec::new()
    } else {
        let cov = Matrix::from_columns(columns)?.gram().inverse()?;
        cov.diagonal()
            .into_iter()
            .map(|v| (v.max(0.0) * sigma2).sqrt())
            .collect()
    };

    Ok(OlsFit {
        coefficients,
        std_errors,
        residuals,
        rss,
        df_resid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_inverse_round_trip() {
        let m = Matrix::from_columns(&[vec![4.0, 2.0, 0.0], vec![2.0, 5.0, 1.0], vec![0.0, 1.0, 3.0]])
            .unwrap();
        let inv = m.inverse().unwrap();
        let product = m.matmul(&inv).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(product[(i, j)], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_singular_matrix_detected() {
        let m = Matrix::from_columns(&[vec![1.0, 2.0], vec![2.0, 4.0]]).unwrap();
        assert!(matches!(m.inverse(), Err(MathError::SingularMatrix(_))));
    }

    #[test]
    fn test_ols_recovers_exact_line() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 3.0 + 2.0 * v).collect();
        let fit = ols(&y, &[vec![1.0; 10], x]).unwrap();
        assert_relative_eq!(fit.coefficients[0], 3.0, epsilon = 1e-9);
        assert_relative_eq!(fit.coefficients[1], 2.0, epsilon = 1e-9);
        assert!(fit.rss < 1e-18);
        assert_eq!(fit.df_resid, 8);
    }

    #[test]
    fn test_ols_standard_error_of_mean() {
        let y = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let fit = ols(&y, &[vec![1.0; 5]]).unwrap();
        assert_relative_eq!(fit.coefficients[0], 3.0, epsilon = 1e-12);
        // sd = sqrt(2.5), se = sd / sqrt(5)
        assert_relative_eq!(fit.std_errors[0], (2.5_f64 / 5.0).sqrt(), epsilon = 1e-12);
    }
}
