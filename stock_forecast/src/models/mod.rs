//! ARIMA model orders and fitted models

use serde::{Deserialize, Serialize};
use std::fmt;
use stock_math::differencing::{difference, integrate};
use stock_math::MathError;

use crate::error::{ForecastError, Result};

pub mod arima;

/// Highest differencing order the engine will use
pub const MAX_DIFFERENCING: usize = 2;

/// Autoregressive, differencing and moving-average order of an ARIMA model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawOrder")]
pub struct ModelOrder {
    p: usize,
    d: usize,
    q: usize,
}

#[derive(Deserialize)]
struct RawOrder {
    p: usize,
    d: usize,
    q: usize,
}

impl TryFrom<RawOrder> for ModelOrder {
    type Error = ForecastError;

    fn try_from(raw: RawOrder) -> Result<Self> {
        ModelOrder::new(raw.p, raw.d, raw.q)
    }
}

impl ModelOrder {
    /// Create a new order, rejecting differencing beyond second order
    pub fn new(p: usize, d: usize, q: usize) -> Result<Self> {
        if d > MAX_DIFFERENCING {
            return Err(ForecastError::InvalidParameter(format!(
                "Differencing order {} exceeds the maximum of {}",
                d, MAX_DIFFERENCING
            )));
        }
        Ok(Self { p, d, q })
    }

    /// Build an order whose differencing is already known to be in range
    pub(crate) fn clamped(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d: d.min(MAX_DIFFERENCING),
            q,
        }
    }

    /// AR order (p)
    pub fn p(&self) -> usize {
        self.p
    }

    /// Differencing order (d)
    pub fn d(&self) -> usize {
        self.d
    }

    /// MA order (q)
    pub fn q(&self) -> usize {
        self.q
    }

    /// Undifferenced models carry an intercept; differenced ones do not
    pub fn has_intercept(&self) -> bool {
        self.d == 0
    }

    /// Number of estimated parameters, counting the innovation variance
    pub fn num_params(&self) -> usize {
        self.p + self.q + usize::from(self.has_intercept()) + 1
    }
}

impl fmt::Display for ModelOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.p, self.d, self.q)
    }
}

/// A successfully fitted ARIMA model
///
/// Values of this type only come out of [`arima::ArimaModel::fit`] and are
/// never modified afterwards; refitting produces a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    pub(crate) order: ModelOrder,
    pub(crate) intercept: f64,
    pub(crate) ar: Vec<f64>,
    pub(crate) ma: Vec<f64>,
    pub(crate) sigma2: f64,
    pub(crate) log_likelihood: f64,
    pub(crate) aic: f64,
    pub(crate) bic: f64,
    pub(crate) residuals: Vec<f64>,
    pub(crate) history: Vec<f64>,
}

impl FittedModel {
    /// Order the model was fitted at
    pub fn order(&self) -> ModelOrder {
        self.order
    }

    /// Intercept on the differenced scale (zero when `d > 0`)
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// AR coefficients
    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar
    }

    /// MA coefficients
    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma
    }

    /// Innovation variance estimate
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Gaussian log-likelihood at the fitted parameters
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Akaike information criterion
    pub fn aic(&self) -> f64 {
        self.aic
    }

    /// Bayesian information criterion
    pub fn bic(&self) -> f64 {
        self.bic
    }

    /// Residuals aligned with the fitting series
    ///
    /// The first `d` positions have no prediction of their own and carry zero.
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Series the model was fitted on
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// One-step-ahead predictions for every position of `values`
    ///
    /// `values` does not have to be the fitting series; the fitted
    /// coefficients are run over whatever series is supplied. Positions that
    /// precede the differencing window are predicted as their own value.
    pub fn predict_in_sample(&self, values: &[f64]) -> Vec<f64> {
        let d = self.order.d;
        if values.len() <= d {
            return values.to_vec();
        }

        let diff = difference(values, d);
        let innovations = arma_innovations(&diff, self.intercept, &self.ar, &self.ma);

        values
            .iter()
            .enumerate()
            .map(|(t, &x)| if t < d { x } else { x - innovations[t - d] })
            .collect()
    }

    /// Point forecasts for the `horizon` periods after the fitting series
    pub fn forecast(&self, horizon: usize) -> std::result::Result<Vec<f64>, MathError> {
        if horizon == 0 {
            return Ok(Vec::new());
        }

        let d = self.order.d;
        let diff = difference(&self.history, d);
        let mut extended = diff.clone();
        let mut errors = arma_innovations(&diff, self.intercept, &self.ar, &self.ma);

        for _ in 0..horizon {
            let t = extended.len();
            let pred = arma_prediction(&extended, &errors, t, self.intercept, &self.ar, &self.ma);
            extended.push(pred);
            // Future innovations have zero expectation
            errors.push(0.0);
        }

        integrate(&extended[diff.len()..], &self.history, d)
    }
}

/// Conditional one-step prediction at position `t` from the values and innovations before it
///
/// Pre-sample deviations and innovations are taken as zero.
pub(crate) fn arma_prediction(
    values: &[f64],
    errors: &[f64],
    t: usize,
    intercept: f64,
    ar: &[f64],
    ma: &[f64],
) -> f64 {
    let mut pred = intercept;

    for (i, phi) in ar.iter().enumerate() {
        if t > i {
            pred += phi * (values[t - 1 - i] - intercept);
        }
    }

    for (j, theta) in ma.iter().enumerate() {
        if t > j {
            pred += theta * errors[t - 1 - j];
        }
    }

    pred
}

/// Innovations of an ARMA recursion over `values`
pub(crate) fn arma_innovations(values: &[f64], intercept: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let mut errors = Vec::with_capacity(values.len());
    for t in 0..values.len() {
        let pred = arma_prediction(values, &errors, t, intercept, ar, ma);
        errors.push(values[t] - pred);
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(order: ModelOrder, intercept: f64, ar: Vec<f64>, ma: Vec<f64>, history: Vec<f64>) -> FittedModel {
        FittedModel {
            order,
            intercept,
            ar,
            ma,
            sigma2: 1.0,
            log_likelihood: 0.0,
            aic: 0.0,
            bic: 0.0,
            residuals: vec![0.0; history.len()],
            history,
        }
    }

    #[test]
    fn test_order_rejects_third_difference() {
        assert!(ModelOrder::new(1, 3, 1).is_err());
        let order = ModelOrder::new(2, 1, 0).unwrap();
        assert_eq!(order.to_string(), "(2,1,0)");
        assert_eq!(order.num_params(), 3);
        assert!(!order.has_intercept());
    }

    #[test]
    fn test_order_deserialization_validates() {
        let ok: ModelOrder = serde_json::from_str(r#"{"p":1,"d":1,"q":1}"#).unwrap();
        assert_eq!(ok, ModelOrder::new(1, 1, 1).unwrap());
        assert!(serde_json::from_str::<ModelOrder>(r#"{"p":1,"d":5,"q":1}"#).is_err());
    }

    #[test]
    fn test_random_walk_forecast_is_flat() {
        let order = ModelOrder::new(0, 1, 0).unwrap();
        let m = model(order, 0.0, vec![], vec![], vec![3.0, 5.0, 4.0]);

        assert_eq!(m.forecast(3).unwrap(), vec![4.0, 4.0, 4.0]);
        assert_eq!(m.predict_in_sample(&[3.0, 5.0, 4.0]), vec![3.0, 3.0, 5.0]);
    }

    #[test]
    fn test_ar1_forecast_decays_to_mean() {
        let order = ModelOrder::new(1, 0, 0).unwrap();
        let m = model(order, 10.0, vec![0.5], vec![], vec![10.0, 14.0]);

        let forecast = m.forecast(2).unwrap();
        assert_eq!(forecast, vec![12.0, 11.0]);
    }

    #[test]
    fn test_ma1_uses_last_innovation() {
        let order = ModelOrder::new(0, 0, 1).unwrap();
        let m = model(order, 0.0, vec![], vec![0.5], vec![2.0, 3.0]);

        // e0 = 2, e1 = 3 - 0.5 * 2 = 2, next = 0.5 * 2 and then zero
        assert_eq!(m.forecast(2).unwrap(), vec![1.0, 0.0]);
        assert_eq!(m.predict_in_sample(&[2.0, 3.0]), vec![0.0, 1.0]);
    }
}
