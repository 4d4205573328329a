//! Hybrid anomaly detection on observed demand
//!
//! A day is flagged when its model residual exceeds a threshold derived from
//! the fitted residuals, or when it strays too far from a short trailing
//! window. Either signal is enough.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use stock_math::descriptive::{mean, population_std};
use stock_math::rolling::rolling_stats;
use tracing::{debug, info};

use crate::config::AnomalyConfig;
use crate::data::{DemandRecord, TimeSeries};
use crate::error::{CandidateFitError, ForecastError, Result};
use crate::models::arima::ArimaModel;
use crate::models::{FittedModel, ModelOrder};

/// How far an anomalous day strays from what was expected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Medium,
    High,
}

/// A flagged day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRecord {
    pub date: NaiveDate,
    pub actual_value: f64,
    pub predicted_value: f64,
    pub residual: f64,
    pub severity: Severity,
}

/// A detector model together with its residual threshold
#[derive(Debug, Clone, PartialEq)]
pub struct FittedDetector {
    model: FittedModel,
    threshold: f64,
}

impl FittedDetector {
    /// Underlying fitted model
    pub fn model(&self) -> &FittedModel {
        &self.model
    }

    /// Order of the underlying model
    pub fn order(&self) -> ModelOrder {
        self.model.order()
    }

    /// Absolute residual above which a day is flagged
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// Fits a small ARIMA model and scans observed demand for anomalies
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    /// Create a detector, rejecting unusable settings
    pub fn new(config: AnomalyConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Settings in use
    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Aggregate raw records by day, then fit
    pub fn fit_records(&self, records: &[DemandRecord]) -> Result<FittedDetector> {
        self.fit(&TimeSeries::from_records(records)?)
    }

    /// Fit the lowest-AIC order of the configured grid
    ///
    /// Unlike the forecasting order search there is no fallback: if no order
    /// can be fitted the detector cannot be used.
    pub fn fit(&self, series: &TimeSeries) -> Result<FittedDetector> {
        let required = self.config.min_records();
        if series.len() < required {
            return Err(ForecastError::InsufficientData {
                required,
                actual: series.len(),
            });
        }

        let values = series.values();
        let grid = self.grid();
        let fit = |order: &ModelOrder| {
            ArimaModel::new(*order)
                .with_optimizer(self.config.optimizer)
                .fit(values)
        };
        let results: Vec<std::result::Result<FittedModel, CandidateFitError>> = if self.config.parallel {
            grid.par_iter().map(fit).collect()
        } else {
            grid.iter().map(fit).collect()
        };

        let mut best: Option<FittedModel> = None;
        let mut failures = 0;
        for result in results {
            match result {
                Ok(model) => {
                    if best.as_ref().map_or(true, |b| model.aic() < b.aic()) {
                        best = Some(model);
                    }
                }
                Err(err) => {
                    debug!(%err, "detector candidate skipped");
                    failures += 1;
                }
            }
        }

        let model = best.ok_or_else(|| {
            ForecastError::ModelFit(format!(
                "None of the {} candidate orders could be fitted",
                failures
            ))
        })?;
        let threshold = self.config.threshold_multiplier * population_std(model.residuals())?;
        info!(order = %model.order(), threshold, "anomaly detector fitted");

        Ok(FittedDetector { model, threshold })
    }

    /// Flag anomalous days of `series` in date order
    ///
    /// Only observed days are scanned. The same inputs always give the same output.
    pub fn detect(&self, series: &TimeSeries, fitted: &FittedDetector) -> Result<Vec<AnomalyRecord>> {
        if series.is_empty() {
            return Err(ForecastError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        let values = series.values();
        let predictions = fitted.model.predict_in_sample(values);
        let windows = rolling_stats(values, self.config.rolling_window)?;
        let series_mean = mean(values)?;

        let mut anomalies = Vec::new();
        for (((date, actual), predicted), window) in series.iter().zip(predictions).zip(windows) {
            let residual = actual - predicted;

            let residual_flag = residual.abs() > fitted.threshold;
            // A single-value window has no spread and never flags
            let value_flag = window
                .std_dev
                .map_or(false, |sd| (actual - window.mean).abs() > self.config.rolling_sigma * sd);
            if !(residual_flag || value_flag) {
                continue;
            }

            let residual_severity = ratio(residual.abs(), fitted.threshold);
            let value_severity = if series_mean > 0.0 {
                (actual - predicted).abs() / series_mean
            } else {
                0.0
            };
            let combined = (residual_severity + value_severity) / 2.0;
            let severity = if combined > self.config.high_severity_cutoff {
                Severity::High
            } else {
                Severity::Medium
            };

            anomalies.push(AnomalyRecord {
                date,
                actual_value: actual,
                predicted_value: predicted,
                residual,
                severity,
            });
        }

        info!(days = series.len(), anomalies = anomalies.len(), "anomaly scan complete");
        Ok(anomalies)
    }

    fn grid(&self) -> Vec<ModelOrder> {
        let mut grid = Vec::new();
        for p in 0..self.config.p_bound {
            for d in 0..self.config.d_bound {
                for q in 0..self.config.q_bound {
                    grid.push(ModelOrder::clamped(p, d, q));
                }
            }
        }
        grid
    }
}

fn ratio(value: f64, threshold: f64) -> f64 {
    if threshold > 0.0 {
        value / threshold
    } else if value > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}
