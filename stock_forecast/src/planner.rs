//! End-to-end demand planning operations
//!
//! The planner ties the stages together: order search feeds the forecast
//! engine, history feeds the inventory policy, and the anomaly detector runs
//! on the same series independently.

use tracing::info;

use crate::anomaly::{AnomalyDetector, AnomalyRecord};
use crate::config::PipelineConfig;
use crate::data::TimeSeries;
use crate::engine::{Diagnostics, ForecastEngine, ForecastResult};
use crate::error::{ForecastError, Result};
use crate::inventory::{InventoryPolicy, InventoryPolicyCalculator};
use crate::models::{FittedModel, ModelOrder};
use crate::selection::{OrderSelector, SearchReport};

/// Forecast with its order search, diagnostics and stocking policy
#[derive(Debug, Clone)]
pub struct DemandForecast {
    pub search: SearchReport,
    pub model: FittedModel,
    pub forecast: ForecastResult,
    pub diagnostics: Diagnostics,
    pub policy: InventoryPolicy,
}

impl DemandForecast {
    /// Order the forecast was produced with
    pub fn order(&self) -> ModelOrder {
        self.model.order()
    }
}

/// Forecast at the fixed optimisation order with its stocking policy
#[derive(Debug, Clone)]
pub struct StockOptimization {
    pub model: FittedModel,
    pub forecast: ForecastResult,
    pub policy: InventoryPolicy,
}

/// Flagged days together with the model that flagged them
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyReport {
    pub anomalies: Vec<AnomalyRecord>,
    pub order: ModelOrder,
    pub threshold: f64,
}

/// Runs forecasting, stock optimisation and anomaly detection for one product series
#[derive(Debug, Clone)]
pub struct DemandPlanner {
    config: PipelineConfig,
    selector: OrderSelector,
    engine: ForecastEngine,
    calculator: InventoryPolicyCalculator,
    detector: AnomalyDetector,
}

impl DemandPlanner {
    /// Create a planner, rejecting unusable settings
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Ok(Self {
            selector: OrderSelector::new(config.search),
            engine: ForecastEngine::new().with_optimizer(config.search.optimizer),
            calculator: InventoryPolicyCalculator::new(config.inventory)?,
            detector: AnomalyDetector::new(config.anomaly)?,
            config,
        })
    }

    /// Settings in use
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Search an order, forecast the configured horizon and derive a policy from history
    pub fn forecast_demand(&self, series: &TimeSeries) -> Result<DemandForecast> {
        require(series, self.config.min_forecast_records)?;

        let search = self.selector.select(series.values())?;
        let (model, forecast, diagnostics) =
            self.engine
                .fit_and_forecast(series, search.selected, self.config.horizon)?;
        let policy = self.calculator.from_demand(series.values())?;
        info!(order = %model.order(), fallback = search.used_fallback, "demand forecast complete");

        Ok(DemandForecast {
            search,
            model,
            forecast,
            diagnostics,
            policy,
        })
    }

    /// Forecast at the fixed optimisation order and derive a policy from history
    pub fn optimize_stock_levels(&self, series: &TimeSeries) -> Result<StockOptimization> {
        require(series, self.config.min_optimization_records)?;

        let (model, forecast, _) = self.engine.fit_and_forecast(
            series,
            self.config.optimization_order,
            self.config.horizon,
        )?;
        let policy = self.calculator.from_demand(series.values())?;
        info!(order = %model.order(), "stock levels optimised");

        Ok(StockOptimization {
            model,
            forecast,
            policy,
        })
    }

    /// Fit the anomaly detector and scan the whole series
    pub fn detect_anomalies(&self, series: &TimeSeries) -> Result<AnomalyReport> {
        let fitted = self.detector.fit(series)?;
        let anomalies = self.detector.detect(series, &fitted)?;

        Ok(AnomalyReport {
            anomalies,
            order: fitted.order(),
            threshold: fitted.threshold(),
        })
    }
}

fn require(series: &TimeSeries, required: usize) -> Result<()> {
    if series.len() < required {
        return Err(ForecastError::InsufficientData {
            required,
            actual: series.len(),
        });
    }
    Ok(())
}
