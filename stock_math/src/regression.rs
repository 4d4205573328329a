//! Ordinary least squares regression
//!
//! Solves the normal equations with Gauss-Jordan elimination and keeps the
//! inverse of `X'X` so coefficient standard errors come for free.

use crate::{MathError, Result};

/// Fitted ordinary least squares regression
#[derive(Debug, Clone)]
pub struct OlsFit {
    /// Estimated coefficients, one per design column
    pub coefficients: Vec<f64>,
    /// Standard errors of the coefficients
    pub std_errors: Vec<f64>,
    /// Sum of squared residuals
    pub ssr: f64,
    /// Number of observations used
    pub nobs: usize,
}

impl OlsFit {
    /// t statistic of coefficient `index`
    pub fn t_stat(&self, index: usize) -> f64 {
        self.coefficients[index] / self.std_errors[index]
    }

    /// Gaussian log-likelihood of the regression
    pub fn log_likelihood(&self) -> f64 {
        let n = self.nobs as f64;
        let sigma2 = (self.ssr / n).max(f64::MIN_POSITIVE);
        -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + sigma2.ln() + 1.0)
    }

    /// Akaike information criterion
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood() + 2.0 * self.coefficients.len() as f64
    }
}

/// Regress `response` on the columns of `design` (one row per observation)
pub fn ols(design: &[Vec<f64>], response: &[f64]) -> Result<OlsFit> {
    let nobs = design.len();
    if nobs != response.len() {
        return Err(MathError::InvalidInput(format!(
            "Design has {} rows but response has {} values",
            nobs,
            response.len()
        )));
    }
    let k = design.first().map(Vec::len).unwrap_or(0);
    if k == 0 {
        return Err(MathError::InvalidInput(
            "Design matrix has no columns".to_string(),
        ));
    }
    if nobs <= k {
        return Err(MathError::InsufficientData(format!(
            "Regression with {} regressors needs more than {} observations, have {}",
            k, k, nobs
        )));
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &y) in design.iter().zip(response) {
        if row.len() != k {
            return Err(MathError::InvalidInput(
                "Design matrix rows have different lengths".to_string(),
            ));
        }
        for i in 0..k {
            xty[i] += row[i] * y;
            for j in 0..k {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }

    let inverse = invert(&xtx)?;
    let coefficients: Vec<f64> = (0..k)
        .map(|i| (0..k).map(|j| inverse[i][j] * xty[j]).sum())
        .collect();

    let ssr = design
        .iter()
        .zip(response)
        .map(|(row, &y)| {
            let fitted: f64 = row.iter().zip(&coefficients).map(|(x, b)| x * b).sum();
            (y - fitted).powi(2)
        })
        .sum::<f64>();

    let sigma2 = ssr / (nobs - k) as f64;
    let std_errors = (0..k)
        .map(|i| (sigma2 * inverse[i][i]).max(0.0).sqrt())
        .collect();

    Ok(OlsFit {
        coefficients,
        std_errors,
        ssr,
        nobs,
    })
}

/// Invert a square matrix with partially pivoted Gauss-Jordan elimination
fn invert(matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    let n = matrix.len();
    let scale = (0..n).map(|i| matrix[i][i].abs()).fold(0.0, f64::max);
    let tolerance = 1e-12 * scale.max(1.0);

    let mut a: Vec<Vec<f64>> = matrix.to_vec();
    let mut inv: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))
            .unwrap_or(col);
        if a[pivot_row][col].abs() <= tolerance {
            return Err(MathError::CalculationError(
                "Design matrix is singular".to_string(),
            ));
        }
        a.swap(col, pivot_row);
        inv.swap(col, pivot_row);

        let pivot = a[col][col];
        for j in 0..n {
            a[col][j] /= pivot;
            inv[col][j] /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n {
                a[row][j] -= factor * a[col][j];
                inv[row][j] -= factor * inv[col][j];
            }
        }
    }

    Ok(inv)
}
