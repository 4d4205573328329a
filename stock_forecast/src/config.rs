//! Configuration for the forecasting, inventory and anomaly pipelines
//!
//! Every struct carries the documented defaults and deserializes with
//! missing fields filled in, so callers can override a single knob from JSON.

use serde::{Deserialize, Serialize};
use stock_math::optimize::NelderMeadConfig;

use crate::error::{ForecastError, Result};
use crate::models::arima::default_optimizer;
use crate::models::ModelOrder;

/// z-score for a 95% service level
pub const DEFAULT_SERVICE_Z: f64 = 1.645;
/// Supplier lead time in days
pub const DEFAULT_LEAD_TIME_DAYS: u32 = 7;
/// Fixed cost of placing one order
pub const DEFAULT_ORDERING_COST: f64 = 50.0;
/// Annual holding cost as a fraction of unit cost
pub const DEFAULT_HOLDING_COST_FRACTION: f64 = 0.2;
/// Days of demand forecast by default
pub const DEFAULT_HORIZON: usize = 30;

/// Cost and service parameters for inventory policy derivation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryParameters {
    pub service_z: f64,
    pub lead_time_days: u32,
    pub ordering_cost: f64,
    pub holding_cost_fraction: f64,
}

impl Default for InventoryParameters {
    fn default() -> Self {
        Self {
            service_z: DEFAULT_SERVICE_Z,
            lead_time_days: DEFAULT_LEAD_TIME_DAYS,
            ordering_cost: DEFAULT_ORDERING_COST,
            holding_cost_fraction: DEFAULT_HOLDING_COST_FRACTION,
        }
    }
}

impl InventoryParameters {
    /// Set the lead time
    pub fn with_lead_time_days(mut self, days: u32) -> Self {
        self.lead_time_days = days;
        self
    }

    /// Set the service level z-score
    pub fn with_service_z(mut self, z: f64) -> Self {
        self.service_z = z;
        self
    }

    /// Set the ordering cost
    pub fn with_ordering_cost(mut self, cost: f64) -> Self {
        self.ordering_cost = cost;
        self
    }

    /// Set the holding cost fraction
    pub fn with_holding_cost_fraction(mut self, fraction: f64) -> Self {
        self.holding_cost_fraction = fraction;
        self
    }

    /// Check that every parameter is usable
    pub fn validate(&self) -> Result<()> {
        if !(self.service_z.is_finite() && self.service_z >= 0.0) {
            return Err(ForecastError::InvalidParameter(
                "Service z-score must be a non-negative finite number".to_string(),
            ));
        }
        if !(self.ordering_cost.is_finite() && self.ordering_cost >= 0.0) {
            return Err(ForecastError::InvalidParameter(
                "Ordering cost must be a non-negative finite number".to_string(),
            ));
        }
        if !(self.holding_cost_fraction.is_finite() && self.holding_cost_fraction > 0.0) {
            return Err(ForecastError::InvalidParameter(
                "Holding cost fraction must be a positive finite number".to_string(),
            ));
        }
        Ok(())
    }
}

/// How the order search walks the candidate space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Orders within one step of the correlation-based guess, at the stationary `d`
    Neighbourhood,
    /// The full `[0, max_p] x [0, max_d] x [0, max_q]` grid
    Exhaustive,
}

/// Settings for the ARIMA order search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_p: usize,
    pub max_d: usize,
    pub max_q: usize,
    pub strategy: SearchStrategy,
    /// Upper bound on candidates fitted per search
    pub max_candidates: usize,
    /// Fit candidates on the rayon thread pool
    pub parallel: bool,
    /// Optimiser settings for every candidate fit
    pub optimizer: NelderMeadConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_p: 5,
            max_d: 2,
            max_q: 5,
            strategy: SearchStrategy::Neighbourhood,
            max_candidates: 50,
            parallel: true,
            optimizer: default_optimizer(),
        }
    }
}

impl SearchConfig {
    /// Search the full grid instead of the neighbourhood of the guess
    pub fn exhaustive(mut self) -> Self {
        self.strategy = SearchStrategy::Exhaustive;
        self
    }

    /// Fit candidates one after another on the calling thread
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Settings for the anomaly detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// AR orders searched are `0..p_bound`
    pub p_bound: usize,
    /// Differencing orders searched are `0..d_bound`
    pub d_bound: usize,
    /// MA orders searched are `0..q_bound`
    pub q_bound: usize,
    /// Residual threshold in residual standard deviations
    pub threshold_multiplier: f64,
    /// Length of the trailing window for the value-based signal
    pub rolling_window: usize,
    /// Rolling standard deviations a value may stray from the rolling mean
    pub rolling_sigma: f64,
    /// Combined severity score above which an anomaly is `High`
    pub high_severity_cutoff: f64,
    /// Fit grid candidates on the rayon thread pool
    pub parallel: bool,
    /// Optimiser settings for every candidate fit
    pub optimizer: NelderMeadConfig,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            p_bound: 3,
            d_bound: 2,
            q_bound: 3,
            threshold_multiplier: 1.5,
            rolling_window: 5,
            rolling_sigma: 2.0,
            high_severity_cutoff: 2.0,
            parallel: true,
            optimizer: default_optimizer(),
        }
    }
}

impl AnomalyConfig {
    /// Check that the bounds and multipliers are usable
    pub fn validate(&self) -> Result<()> {
        if self.p_bound == 0 || self.d_bound == 0 || self.q_bound == 0 {
            return Err(ForecastError::InvalidParameter(
                "Order bounds are exclusive and must be at least 1".to_string(),
            ));
        }
        if self.d_bound > crate::models::MAX_DIFFERENCING + 1 {
            return Err(ForecastError::InvalidParameter(format!(
                "Differencing bound {} exceeds the maximum order of {}",
                self.d_bound,
                crate::models::MAX_DIFFERENCING
            )));
        }
        if self.rolling_window == 0 {
            return Err(ForecastError::InvalidParameter(
                "Rolling window must be greater than zero".to_string(),
            ));
        }
        if !(self.threshold_multiplier > 0.0 && self.rolling_sigma > 0.0) {
            return Err(ForecastError::InvalidParameter(
                "Threshold multipliers must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Fewest observations the detector accepts: enough to exceed `max(p, q) + d`
    pub fn min_records(&self) -> usize {
        (self.p_bound - 1).max(self.q_bound - 1) + (self.d_bound - 1) + 1
    }
}

/// Settings for the end-to-end planner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Days of demand to forecast
    pub horizon: usize,
    /// Records required before a forecast is attempted
    pub min_forecast_records: usize,
    /// Records required before stock levels are optimised
    pub min_optimization_records: usize,
    /// Fixed order used by stock level optimisation
    pub optimization_order: ModelOrder,
    pub search: SearchConfig,
    pub inventory: InventoryParameters,
    pub anomaly: AnomalyConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            min_forecast_records: 10,
            min_optimization_records: 30,
            optimization_order: ModelOrder::clamped(5, 1, 0),
            search: SearchConfig::default(),
            inventory: InventoryParameters::default(),
            anomaly: AnomalyConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from JSON, filling in defaults for missing fields
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.inventory.validate()?;
        config.anomaly.validate()?;
        Ok(config)
    }

    /// Set the forecast horizon
    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }
}
