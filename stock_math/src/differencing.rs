//! Differencing and integration of time series

use crate::{MathError, Result};

/// First-order difference: `x[t] - x[t-1]`
pub fn difference_once(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Apply first-order differencing `d` times
pub fn difference(values: &[f64], d: usize) -> Vec<f64> {
    let mut out = values.to_vec();
    for _ in 0..d {
        out = difference_once(&out);
    }
    out
}

/// Undo `d` rounds of differencing for values that continue `history`
///
/// `diffs` are values on the `d`-times differenced scale that follow the
/// end of `history`; the result is the same continuation on the original scale.
pub fn integrate(diffs: &[f64], history: &[f64], d: usize) -> Result<Vec<f64>> {
    if d == 0 {
        return Ok(diffs.to_vec());
    }
    if history.len() < d {
        return Err(MathError::InsufficientData(format!(
            "Integrating {} differences needs at least {} historical values, have {}",
            d,
            d,
            history.len()
        )));
    }

    // levels[k] holds the k-times differenced history
    let mut levels = Vec::with_capacity(d);
    levels.push(history.to_vec());
    for k in 1..d {
        let next = difference_once(&levels[k - 1]);
        levels.push(next);
    }

    let mut current = diffs.to_vec();
    for level in levels.iter().rev() {
        let mut last = match level.last() {
            Some(v) => *v,
            None => {
                return Err(MathError::InsufficientData(
                    "Differenced history is empty".to_string(),
                ))
            }
        };
        current = current
            .iter()
            .map(|v| {
                last += v;
                last
            })
            .collect();
    }

    Ok(current)
}
