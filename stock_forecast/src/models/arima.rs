//! ARIMA models for demand time series
//!
//! Parameters are estimated by conditional sum of squares over the
//! differenced series. The optimiser works in an unconstrained space that is
//! mapped onto stationary AR and invertible MA polynomials, so every
//! candidate it evaluates satisfies both constraints.

use std::f64::consts::PI;
use stock_math::descriptive::{mean, population_std};
use stock_math::differencing::difference;
use stock_math::optimize::{nelder_mead, NelderMeadConfig};
use tracing::debug;

use crate::error::CandidateFitError;
use crate::models::{arma_innovations, FittedModel, ModelOrder};

/// Lower bound on the innovation variance so a perfect fit keeps a finite likelihood
const VARIANCE_FLOOR: f64 = 1e-10;

/// ARIMA model (AutoRegressive Integrated Moving Average)
#[derive(Debug, Clone)]
pub struct ArimaModel {
    /// Model order
    order: ModelOrder,
    /// Optimiser settings, including the iteration cap
    optimizer: NelderMeadConfig,
}

impl ArimaModel {
    /// Create a new ARIMA model
    pub fn new(order: ModelOrder) -> Self {
        Self {
            order,
            optimizer: default_optimizer(),
        }
    }

    /// Override the optimiser settings
    pub fn with_optimizer(mut self, optimizer: NelderMeadConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Cap the number of optimiser iterations
    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.optimizer.max_iter = max_iter;
        self
    }

    /// Order of the model
    pub fn order(&self) -> ModelOrder {
        self.order
    }

    /// Fit the model to `values`
    pub fn fit(&self, values: &[f64]) -> Result<FittedModel, CandidateFitError> {
        let order = self.order;
        let (p, d, q) = (order.p(), order.d(), order.q());

        let diff = difference(values, d);
        let n = diff.len();
        let k = order.num_params();
        if n <= k {
            return Err(CandidateFitError::InsufficientObservations {
                order,
                needed: k,
                available: n,
            });
        }

        let center = mean(&diff).map_err(|source| CandidateFitError::Numeric { order, source })?;
        let spread = population_std(&diff)
            .map_err(|source| CandidateFitError::Numeric { order, source })?;
        let scale = if spread > 0.0 { spread } else { 1.0 };
        let has_intercept = order.has_intercept();

        let unpack = |params: &[f64]| -> (f64, Vec<f64>, Vec<f64>) {
            let (intercept, rest) = if has_intercept {
                (center + scale * params[0], &params[1..])
            } else {
                (0.0, params)
            };
            let ar = constrain_stationary(&rest[..p]);
            let ma = constrain_invertible(&rest[p..p + q]);
            (intercept, ar, ma)
        };

        let free = p + q + usize::from(has_intercept);
        let result = nelder_mead(
            |params| {
                let (intercept, ar, ma) = unpack(params);
                sum_of_squares(&arma_innovations(&diff, intercept, &ar, &ma))
            },
            &vec![0.0; free],
            self.optimizer,
        );

        if !result.converged {
            debug!(%order, iterations = result.iterations, "optimiser hit its iteration cap");
            return Err(CandidateFitError::IterationLimit {
                order,
                iterations: result.iterations,
            });
        }

        let (intercept, ar, ma) = unpack(&result.optimal_point);
        let innovations = arma_innovations(&diff, intercept, &ar, &ma);
        let css = sum_of_squares(&innovations);

        let nobs = n as f64;
        let sigma2 = (css / nobs).max(VARIANCE_FLOOR);
        let log_likelihood = -0.5 * nobs * ((2.0 * PI * sigma2).ln() + 1.0);
        let aic = -2.0 * log_likelihood + 2.0 * k as f64;
        let bic = -2.0 * log_likelihood + k as f64 * nobs.ln();

        if !(log_likelihood.is_finite() && aic.is_finite() && bic.is_finite()) {
            return Err(CandidateFitError::NonFiniteLikelihood { order });
        }

        let mut residuals = vec![0.0; d];
        residuals.extend(innovations);

        Ok(FittedModel {
            order,
            intercept,
            ar,
            ma,
            sigma2,
            log_likelihood,
            aic,
            bic,
            residuals,
            history: values.to_vec(),
        })
    }
}

/// Optimiser settings used when none are supplied
pub fn default_optimizer() -> NelderMeadConfig {
    NelderMeadConfig {
        max_iter: 5000,
        tolerance: 1e-9,
        ..Default::default()
    }
}

fn sum_of_squares(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum()
}

/// Map unconstrained reals onto the coefficients of a stationary AR polynomial
///
/// Each value is squashed into (-1, 1) and read as a partial autocorrelation;
/// the Durbin-Levinson recursion turns those into AR coefficients.
pub(crate) fn constrain_stationary(unconstrained: &[f64]) -> Vec<f64> {
    let n = unconstrained.len();
    let r: Vec<f64> = unconstrained
        .iter()
        .map(|x| x / (1.0 + x * x).sqrt())
        .collect();

    let mut y = vec![vec![0.0; n]; n];
    for k in 0..n {
        for i in 0..k {
            y[k][i] = y[k - 1][i] + r[k] * y[k - 1][k - i - 1];
        }
        y[k][k] = r[k];
    }

    match y.last() {
        Some(row) => row.iter().map(|v| -v).collect(),
        None => Vec::new(),
    }
}

/// Map unconstrained reals onto the coefficients of an invertible MA polynomial
pub(crate) fn constrain_invertible(unconstrained: &[f64]) -> Vec<f64> {
    constrain_stationary(unconstrained)
        .into_iter()
        .map(|v| -v)
        .collect()
}
