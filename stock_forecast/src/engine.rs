//! Final model fit, forecast horizon and in-sample diagnostics

use chrono::NaiveDate;
use serde::Serialize;
use stock_math::descriptive::{mean, population_std};
use stock_math::optimize::NelderMeadConfig;
use tracing::{debug, info};

use crate::config::DEFAULT_HORIZON;
use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::metrics::forecast_accuracy;
use crate::models::arima::{default_optimizer, ArimaModel};
use crate::models::{FittedModel, ModelOrder};
use crate::utils::future_dates;

/// One forecast day
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Forecast horizon, one point per day after the last observation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ForecastResult {
    points: Vec<ForecastPoint>,
}

impl ForecastResult {
    /// Forecast points in date order
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// Forecast values in date order
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Fit quality of a model on its own history
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Diagnostics {
    pub mae: f64,
    pub rmse: f64,
    pub aic: f64,
    pub bic: f64,
    pub residuals_mean: f64,
    pub residuals_std: f64,
}

/// Fits a model at a given order and projects it forward
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    optimizer: NelderMeadConfig,
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self {
            optimizer: default_optimizer(),
        }
    }
}

impl ForecastEngine {
    /// Create an engine with the default optimiser settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the optimiser settings
    pub fn with_optimizer(mut self, optimizer: NelderMeadConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Fit at `order` and forecast the default 30 days
    pub fn fit_and_forecast_default(
        &self,
        series: &TimeSeries,
        order: ModelOrder,
    ) -> Result<(FittedModel, ForecastResult, Diagnostics)> {
        self.fit_and_forecast(series, order, DEFAULT_HORIZON)
    }

    /// Fit at `order`, forecast `horizon` days and score the fit in sample
    ///
    /// Forecasts and in-sample predictions are clamped at zero.
    pub fn fit_and_forecast(
        &self,
        series: &TimeSeries,
        order: ModelOrder,
        horizon: usize,
    ) -> Result<(FittedModel, ForecastResult, Diagnostics)> {
        let last_date = series.last_date().ok_or(ForecastError::InsufficientData {
            required: 1,
            actual: 0,
        })?;
        let values = series.values();

        let fitted = ArimaModel::new(order)
            .with_optimizer(self.optimizer)
            .fit(values)?;
        debug!(%order, aic = fitted.aic(), "final model fitted");

        let raw = fitted.forecast(horizon)?;
        if raw.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ModelFit(format!(
                "ARIMA{} produced a non-finite forecast",
                order
            )));
        }
        let points = future_dates(last_date, horizon)?
            .into_iter()
            .zip(raw)
            .map(|(date, value)| ForecastPoint {
                date,
                value: value.max(0.0),
            })
            .collect();

        let predictions: Vec<f64> = fitted
            .predict_in_sample(values)
            .into_iter()
            .map(|v| v.max(0.0))
            .collect();
        let accuracy = forecast_accuracy(&predictions, values)?;

        let diagnostics = Diagnostics {
            mae: accuracy.mae,
            rmse: accuracy.rmse,
            aic: fitted.aic(),
            bic: fitted.bic(),
            residuals_mean: mean(fitted.residuals())?,
            residuals_std: population_std(fitted.residuals())?,
        };
        info!(%order, horizon, mae = diagnostics.mae, rmse = diagnostics.rmse, "forecast generated");

        Ok((fitted, ForecastResult { points }, diagnostics))
    }
}
