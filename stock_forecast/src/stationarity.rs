//! Stationarity testing and enforcement
//!
//! The Augmented Dickey-Fuller test regresses the first difference on the
//! lagged level, a constant and lagged differences. The lag length is chosen
//! by AIC on a common sample and the p-value comes from MacKinnon's
//! response-surface approximation.

use statrs::distribution::{ContinuousCDF, Normal};
use stock_math::descriptive::is_constant;
use stock_math::differencing::difference_once;
use stock_math::regression::ols;
use stock_math::MathError;
use tracing::debug;

use crate::error::{ForecastError, Result};
use crate::models::MAX_DIFFERENCING;

/// Significance level below which a unit root is rejected
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Shortest series the test accepts
pub const MIN_OBSERVATIONS: usize = 6;

// MacKinnon (2010) approximate p-value surface, constant-only regression, one series
const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.83;
const TAU_STAR: f64 = -1.61;
const TAU_SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

/// Result of an Augmented Dickey-Fuller test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdfResult {
    /// t statistic of the lagged level coefficient
    pub statistic: f64,
    /// Approximate p-value of the statistic
    pub p_value: f64,
    /// Number of lagged differences in the chosen regression
    pub used_lag: usize,
    /// Observations in the chosen regression
    pub nobs: usize,
}

impl AdfResult {
    /// Whether the unit root is rejected at the 5% level
    pub fn is_stationary(&self) -> bool {
        self.p_value < SIGNIFICANCE_LEVEL
    }
}

/// Tests for and removes non-stationarity by differencing
#[derive(Debug, Clone, Default)]
pub struct StationarityAnalyzer {
    max_lag: Option<usize>,
}

impl StationarityAnalyzer {
    /// Create an analyzer that picks the lag length automatically
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of lagged differences the test may use
    pub fn with_max_lag(mut self, max_lag: usize) -> Self {
        self.max_lag = Some(max_lag);
        self
    }

    /// Run the Augmented Dickey-Fuller test
    pub fn adf_test(&self, series: &[f64]) -> Result<AdfResult> {
        let n = series.len();
        if n < MIN_OBSERVATIONS {
            return Err(ForecastError::InsufficientData {
                required: MIN_OBSERVATIONS,
                actual: n,
            });
        }

        // Schwert's rule, limited so the regression keeps enough degrees of freedom
        let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
        let mut max_lag = schwert.min(n / 2 - 2);
        if let Some(cap) = self.max_lag {
            max_lag = max_lag.min(cap);
        }

        let diffs = difference_once(series);

        // Choose the lag on the sample that the longest lag allows
        let mut best: Option<(usize, f64)> = None;
        for lag in 0..=max_lag {
            let (design, response) = adf_design(series, &diffs, lag, max_lag);
            match ols(&design, &response) {
                Ok(fit) => {
                    let aic = fit.aic();
                    if best.map_or(true, |(_, best_aic)| aic < best_aic) {
                        best = Some((lag, aic));
                    }
                }
                Err(err) => debug!(lag, %err, "skipping ADF lag"),
            }
        }
        let used_lag = match best {
            Some((lag, _)) => lag,
            None => {
                return Err(ForecastError::Math(MathError::CalculationError(
                    "No ADF regression could be estimated".to_string(),
                )))
            }
        };

        let (design, response) = adf_design(series, &diffs, used_lag, used_lag);
        let fit = ols(&design, &response)?;
        let statistic = fit.t_stat(1);

        Ok(AdfResult {
            statistic,
            p_value: mackinnon_p_value(statistic),
            used_lag,
            nobs: fit.nobs,
        })
    }

    /// Whether the series is stationary at the 5% level
    ///
    /// A series without any variation is treated as stationary. When no ADF
    /// regression can be estimated, for example because the lagged level is
    /// all zeros, the unit root is not rejected. Only a series too short for
    /// the test is an error.
    pub fn is_stationary(&self, series: &[f64]) -> Result<bool> {
        if series.len() >= MIN_OBSERVATIONS && is_constant(series) {
            return Ok(true);
        }
        match self.adf_test(series) {
            Ok(adf) => Ok(adf.is_stationary()),
            Err(ForecastError::Math(err)) => {
                debug!(%err, "ADF regression failed, treating series as non-stationary");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Difference the series until it is stationary, at most twice
    ///
    /// A series that is still non-stationary after the second difference is
    /// returned as is with `d = 2`.
    pub fn make_stationary(&self, series: &[f64]) -> Result<(Vec<f64>, usize)> {
        let mut current = series.to_vec();
        let mut d = 0;

        while d < MAX_DIFFERENCING && !self.is_stationary(&current)? {
            current = difference_once(&current);
            d += 1;
        }

        debug!(d, "stationarity reached");
        Ok((current, d))
    }
}

/// Rows `[1, y(t-1), dy(t-1), ..., dy(t-lag)]` against `dy(t)`, skipping the first `skip` differences
fn adf_design(series: &[f64], diffs: &[f64], lag: usize, skip: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut design = Vec::with_capacity(diffs.len().saturating_sub(skip));
    let mut response = Vec::with_capacity(diffs.len().saturating_sub(skip));

    for t in skip..diffs.len() {
        let mut row = Vec::with_capacity(lag + 2);
        row.push(1.0);
        row.push(series[t]);
        for i in 1..=lag {
            row.push(diffs[t - i]);
        }
        design.push(row);
        response.push(diffs[t]);
    }

    (design, response)
}

/// MacKinnon's approximate p-value for an ADF statistic
pub fn mackinnon_p_value(statistic: f64) -> f64 {
    if statistic.is_nan() {
        return 1.0;
    }
    if statistic > TAU_MAX {
        return 1.0;
    }
    if statistic < TAU_MIN {
        return 0.0;
    }

    let coefficients: &[f64] = if statistic <= TAU_STAR {
        &TAU_SMALL_P
    } else {
        &TAU_LARGE_P
    };
    let z = coefficients
        .iter()
        .rev()
        .fold(0.0, |acc, c| acc * statistic + c);

    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.cdf(z),
        Err(_) => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_p_value_at_five_percent_critical_value() {
        assert_abs_diff_eq!(mackinnon_p_value(-2.86), 0.05, epsilon = 0.005);
    }

    #[test]
    fn test_p_value_surface_is_continuous_at_switch() {
        let below = mackinnon_p_value(TAU_STAR - 1e-9);
        let above = mackinnon_p_value(TAU_STAR + 1e-9);
        assert_abs_diff_eq!(below, above, epsilon = 0.01);
    }

    #[test]
    fn test_p_value_bounds() {
        assert_eq!(mackinnon_p_value(-25.0), 0.0);
        assert_eq!(mackinnon_p_value(3.0), 1.0);
        assert_eq!(mackinnon_p_value(f64::NAN), 1.0);
        assert!(mackinnon_p_value(0.0) > 0.9);
    }

    #[test]
    fn test_design_alignment() {
        let series = [1.0, 2.0, 4.0, 7.0, 11.0];
        let diffs = difference_once(&series);
        let (design, response) = adf_design(&series, &diffs, 1, 1);

        // dy(t) for t = 1..4 against [1, y(t), dy(t-1)]
        assert_eq!(response, vec![2.0, 3.0, 4.0]);
        assert_eq!(design[0], vec![1.0, 2.0, 1.0]);
        assert_eq!(design[2], vec![1.0, 7.0, 3.0]);
    }
}
