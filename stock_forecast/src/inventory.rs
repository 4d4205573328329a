//! Inventory policy derivation from demand statistics
//!
//! Safety stock is `z * std_demand` with the standard deviation taken as
//! given, without scaling by the square root of the lead time. Reorder point
//! covers mean demand over the lead time plus safety stock, and the economic
//! order quantity is the classic Wilson formula on annualised demand.

use serde::{Deserialize, Serialize};
use stock_math::descriptive::{mean, population_std};

use crate::config::InventoryParameters;
use crate::error::{ForecastError, Result};

/// Days used to annualise mean daily demand
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Stocking parameters derived from a demand sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InventoryPolicy {
    pub mean_demand: f64,
    pub std_demand: f64,
    pub safety_stock: f64,
    pub reorder_point: f64,
    pub economic_order_quantity: f64,
}

impl InventoryPolicy {
    /// Derive a policy from daily demand observations
    pub fn from_demand(demand: &[f64], params: &InventoryParameters) -> Result<Self> {
        derive_policy(mean(demand)?, population_std(demand)?, params)
    }

    /// Copy of the policy with every figure rounded to two decimals
    pub fn rounded(&self) -> Self {
        Self {
            mean_demand: round2(self.mean_demand),
            std_demand: round2(self.std_demand),
            safety_stock: round2(self.safety_stock),
            reorder_point: round2(self.reorder_point),
            economic_order_quantity: round2(self.economic_order_quantity),
        }
    }
}

/// Derive safety stock, reorder point and economic order quantity
pub fn derive_policy(
    mean_demand: f64,
    std_demand: f64,
    params: &InventoryParameters,
) -> Result<InventoryPolicy> {
    if !(mean_demand.is_finite() && mean_demand >= 0.0) {
        return Err(ForecastError::InvalidInput(format!(
            "Mean demand must be a non-negative finite number, got {}",
            mean_demand
        )));
    }
    if !(std_demand.is_finite() && std_demand >= 0.0) {
        return Err(ForecastError::InvalidInput(format!(
            "Demand standard deviation must be a non-negative finite number, got {}",
            std_demand
        )));
    }
    params.validate()?;

    let safety_stock = params.service_z * std_demand;
    let reorder_point = mean_demand * f64::from(params.lead_time_days) + safety_stock;
    let annual_demand = mean_demand * DAYS_PER_YEAR;
    let economic_order_quantity =
        (2.0 * annual_demand * params.ordering_cost / params.holding_cost_fraction).sqrt();

    Ok(InventoryPolicy {
        mean_demand,
        std_demand,
        safety_stock,
        reorder_point,
        economic_order_quantity,
    })
}

/// Derives policies with a fixed set of parameters
#[derive(Debug, Clone, Default)]
pub struct InventoryPolicyCalculator {
    params: InventoryParameters,
}

impl InventoryPolicyCalculator {
    /// Create a calculator, rejecting unusable parameters
    pub fn new(params: InventoryParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Parameters in use
    pub fn params(&self) -> &InventoryParameters {
        &self.params
    }

    /// Derive a policy from summary statistics
    pub fn derive_policy(&self, mean_demand: f64, std_demand: f64) -> Result<InventoryPolicy> {
        derive_policy(mean_demand, std_demand, &self.params)
    }

    /// Derive a policy from raw daily demand
    pub fn from_demand(&self, demand: &[f64]) -> Result<InventoryPolicy> {
        InventoryPolicy::from_demand(demand, &self.params)
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
