//! Descriptive statistics over slices of observations
//!
//! Contains:
//! - Mean
//! - Variance and standard deviation with an explicit degrees-of-freedom correction

use crate::{MathError, Result};

/// Degrees-of-freedom correction applied to variance estimates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ddof {
    /// Divide by `n` (population estimate)
    Population,
    /// Divide by `n - 1` (sample estimate)
    Sample,
}

impl Ddof {
    fn offset(self) -> usize {
        match self {
            Ddof::Population => 0,
            Ddof::Sample => 1,
        }
    }
}

/// Arithmetic mean of the values
pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathError::InsufficientData(
            "Cannot compute the mean of an empty series".to_string(),
        ));
    }

    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Variance of the values around their mean
pub fn variance(values: &[f64], ddof: Ddof) -> Result<f64> {
    let n = values.len();
    if n <= ddof.offset() {
        return Err(MathError::InsufficientData(format!(
            "Variance needs more than {} values, have {}",
            ddof.offset(),
            n
        )));
    }

    let m = mean(values)?;
    let sum_sq = values.iter().map(|v| (v - m).powi(2)).sum::<f64>();

    Ok(sum_sq / (n - ddof.offset()) as f64)
}

/// Standard deviation of the values
pub fn std_dev(values: &[f64], ddof: Ddof) -> Result<f64> {
    variance(values, ddof).map(f64::sqrt)
}

/// Population standard deviation, the convention used for demand statistics
pub fn population_std(values: &[f64]) -> Result<f64> {
    std_dev(values, Ddof::Population)
}

/// Returns true when every value equals the first one
pub fn is_constant(values: &[f64]) -> bool {
    match values.first() {
        Some(first) => values.iter().all(|v| (v - first).abs() <= f64::EPSILON * first.abs().max(1.0)),
        None => true,
    }
}
