//! Least-squares regression on an explicit design matrix.
//!
//! Used by the mixed-frequency indicator models (plain OLS) and by the
//! regression-based forecast combiner (ridge without intercept).

use crate::error::{NowcastError, Result};

/// Relative pivot tolerance below which the normal equations are treated as singular.
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Fitted least-squares regression.
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquaresFit {
    /// One coefficient per design column.
    pub coefficients: Vec<f64>,
    /// In-sample fitted values.
    pub fitted: Vec<f64>,
    /// Residuals (y - fitted).
    pub residuals: Vec<f64>,
}

impl LeastSquaresFit {
    /// Sum of squared residuals.
    pub fn ssr(&self) -> f64 {
        self.residuals.iter().map(|r| r * r).sum()
    }

    /// Number of estimated parameters.
    pub fn num_params(&self) -> usize {
        self.coefficients.len()
    }

    /// Apply the coefficients to a new regressor row.
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.coefficients.len() {
            return Err(NowcastError::DimensionMismatch {
                expected: self.coefficients.len(),
                got: row.len(),
            });
        }
        Ok(dot(row, &self.coefficients))
    }
}

/// Fit `y = X @ beta` by solving `(X'X + ridge * I) beta = X'y`.
///
/// `rows` holds one design row per observation; include a column of ones
/// for an intercept. With `ridge == 0.0` this is ordinary least squares and
/// fails with [`NowcastError::SingularMatrix`] on collinear designs.
pub fn least_squares(rows: &[Vec<f64>], y: &[f64], ridge: f64) -> Result<LeastSquaresFit> {
    let n = rows.len();
    if n == 0 {
        return Err(NowcastError::InsufficientData { needed: 1, got: 0 });
    }
    if y.len() != n {
        return Err(NowcastError::DimensionMismatch {
            expected: n,
            got: y.len(),
        });
    }

    let k = rows[0].len();
    if k == 0 {
        return Err(NowcastError::InvalidParameter(
            "design matrix has no columns".into(),
        ));
    }
    if let Some(bad) = rows.iter().find(|r| r.len() != k) {
        return Err(NowcastError::DimensionMismatch {
            expected: k,
            got: bad.len(),
        });
    }

    // X'X and X'y
    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &y_obs) in rows.iter().zip(y.iter()) {
        for i in 0..k {
            xty[i] += row[i] * y_obs;
            for j in 0..=i {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            xtx[j][i] = xtx[i][j];
        }
        xtx[i][i] += ridge;
    }

    let coefficients = solve_symmetric(&xtx, &xty).ok_or(NowcastError::SingularMatrix)?;
    if coefficients.iter().any(|c| !c.is_finite()) {
        return Err(NowcastError::SingularMatrix);
    }

    let fitted: Vec<f64> = rows.iter().map(|r| dot(r, &coefficients)).collect();
    let residuals = y.iter().zip(fitted.iter()).map(|(a, f)| a - f).collect();

    Ok(LeastSquaresFit {
        coefficients,
        fitted,
        residuals,
    })
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Solve symmetric positive definite system using Cholesky decomposition.
///
/// Solves A @ x = b where A is symmetric positive definite.
fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    let scale = (0..n).map(|i| a[i][i].abs()).fold(0.0, f64::max);
    if scale == 0.0 || !scale.is_finite() {
        return None;
    }

    // Cholesky decomposition A = L @ L'
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                if sum <= PIVOT_TOLERANCE * scale {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // Forward substitution: L @ y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // Backward substitution: L' @ x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn with_intercept(x: &[f64]) -> Vec<Vec<f64>> {
        x.iter().map(|&v| vec![1.0, v]).collect()
    }

    #[test]
    fn ols_simple_linear() {
        // y = 2 + 3*x
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [5.0, 8.0, 11.0, 14.0, 17.0];

        let fit = least_squares(&with_intercept(&x), &y, 0.0).unwrap();

        assert_relative_eq!(fit.coefficients[0], 2.0, epsilon = 1e-8);
        assert_relative_eq!(fit.coefficients[1], 3.0, epsilon = 1e-8);
        assert!(fit.ssr() < 1e-12);
        assert_relative_eq!(fit.predict_row(&[1.0, 6.0]).unwrap(), 20.0, epsilon = 1e-8);
    }

    #[test]
    fn ols_multiple_regressors() {
        // y = 1 + 2*x1 + 3*x2
        let x1 = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let x2 = [0.5, 2.5, 1.0, 3.0, 1.5, 3.5, 2.0, 4.0];
        let rows: Vec<Vec<f64>> = x1.iter().zip(x2.iter()).map(|(a, b)| vec![1.0, *a, *b]).collect();
        let y: Vec<f64> = x1.iter().zip(x2.iter()).map(|(a, b)| 1.0 + 2.0 * a + 3.0 * b).collect();

        let fit = least_squares(&rows, &y, 0.0).unwrap();

        assert_relative_eq!(fit.coefficients[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(fit.coefficients[1], 2.0, epsilon = 1e-6);
        assert_relative_eq!(fit.coefficients[2], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn residuals_sum_to_zero_with_intercept() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [5.1, 7.9, 11.2, 13.8, 17.0];
        let fit = least_squares(&with_intercept(&x), &y, 0.0).unwrap();
        assert_eq!(fit.residuals.len(), 5);
        assert!(fit.residuals.iter().sum::<f64>().abs() < 1e-8);
    }

    #[test]
    fn collinear_design_is_singular() {
        // constant regressor duplicates the intercept
        let rows: Vec<Vec<f64>> = (0..6).map(|_| vec![1.0, 4.0]).collect();
        let y = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert!(matches!(
            least_squares(&rows, &y, 0.0),
            Err(NowcastError::SingularMatrix)
        ));
    }

    #[test]
    fn ridge_regularizes_collinear_design() {
        let rows: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64, i as f64]).collect();
        let y: Vec<f64> = (0..6).map(|i| 2.0 * i as f64).collect();
        let fit = least_squares(&rows, &y, 1.0).unwrap();
        // ridge splits the weight evenly between identical columns
        assert_relative_eq!(fit.coefficients[0], fit.coefficients[1], epsilon = 1e-10);
        assert!(fit.coefficients[0] > 0.9 && fit.coefficients[0] < 1.0);
    }

    #[test]
    fn dimension_checks() {
        assert!(least_squares(&[], &[], 0.0).is_err());
        assert!(least_squares(&with_intercept(&[1.0, 2.0]), &[1.0], 0.0).is_err());
        let ragged = vec![vec![1.0, 2.0], vec![1.0]];
        assert!(least_squares(&ragged, &[1.0, 2.0], 0.0).is_err());
    }
}
