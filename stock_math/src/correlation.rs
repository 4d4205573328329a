//! Autocorrelation estimates
//!
//! Contains:
//! - Sample autocorrelation function (biased estimator)
//! - Partial autocorrelation function via the Durbin-Levinson recursion
//! - The large-sample 95% significance bound

use crate::{MathError, Result};

/// Sample autocorrelations for lags `0..=nlags`
///
/// Uses the biased estimator (denominator `n` at every lag). A series with
/// no variance has zero autocorrelation beyond lag 0.
pub fn acf(values: &[f64], nlags: usize) -> Result<Vec<f64>> {
    let n = values.len();
    if nlags >= n {
        return Err(MathError::InsufficientData(format!(
            "ACF up to lag {} needs more than {} observations, have {}",
            nlags, nlags, n
        )));
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = values.iter().map(|v| v - mean).collect();
    let c0 = centered.iter().map(|v| v * v).sum::<f64>();

    let mut out = Vec::with_capacity(nlags + 1);
    out.push(1.0);
    for lag in 1..=nlags {
        if c0 == 0.0 {
            out.push(0.0);
            continue;
        }
        let ck = centered[lag..]
            .iter()
            .zip(centered.iter())
            .map(|(a, b)| a * b)
            .sum::<f64>();
        out.push(ck / c0);
    }

    Ok(out)
}

/// Partial autocorrelations for lags `0..=nlags`
pub fn pacf(values: &[f64], nlags: usize) -> Result<Vec<f64>> {
    let rho = acf(values, nlags)?;
    Ok(durbin_levinson(&rho))
}

/// Durbin-Levinson recursion turning autocorrelations into partial autocorrelations
fn durbin_levinson(rho: &[f64]) -> Vec<f64> {
    let nlags = rho.len().saturating_sub(1);
    let mut out = Vec::with_capacity(nlags + 1);
    out.push(1.0);

    let mut phi: Vec<f64> = Vec::with_capacity(nlags);
    let mut sigma: f64 = 1.0;

    for k in 1..=nlags {
        let num = rho[k] - (0..k - 1).map(|j| phi[j] * rho[k - 1 - j]).sum::<f64>();
        let phi_kk = if sigma.abs() < 1e-12 { 0.0 } else { num / sigma };

        let mut next = Vec::with_capacity(k);
        for j in 0..k - 1 {
            next.push(phi[j] - phi_kk * phi[k - 2 - j]);
        }
        next.push(phi_kk);
        phi = next;

        sigma *= 1.0 - phi_kk * phi_kk;
        out.push(phi_kk);
    }

    out
}

/// Bound beyond which a correlation estimate is significant at the 5% level
pub fn significance_bound(n: usize) -> f64 {
    1.96 / (n as f64).sqrt()
}

/// Number of lags (excluding lag 0) whose magnitude exceeds `bound`
pub fn count_significant(correlations: &[f64], bound: f64) -> usize {
    correlations
        .iter()
        .skip(1)
        .filter(|c| c.abs() > bound)
        .count()
}
