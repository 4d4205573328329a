//! JSON result documents
//!
//! Callers run each operation as an isolated batch job and inspect the
//! document for an `error` key instead of handling a Rust error.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::anomaly::AnomalyRecord;
use crate::data::{DemandRecord, TimeSeries};
use crate::engine::{Diagnostics, ForecastResult};
use crate::error::Result;
use crate::inventory::InventoryPolicy;
use crate::models::ModelOrder;
use crate::planner::{AnomalyReport, DemandForecast, DemandPlanner, StockOptimization};

/// One forecast day as it appears in a document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastEntry {
    pub date: NaiveDate,
    pub forecasted_quantity: f64,
}

fn entries(forecast: &ForecastResult) -> Vec<ForecastEntry> {
    forecast
        .points()
        .iter()
        .map(|point| ForecastEntry {
            date: point.date,
            forecasted_quantity: point.value,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDocument {
    pub forecast: Vec<ForecastEntry>,
    pub optimal_levels: InventoryPolicy,
    pub model_diagnostics: Diagnostics,
    pub model_order: ModelOrder,
}

impl From<&DemandForecast> for ForecastDocument {
    fn from(result: &DemandForecast) -> Self {
        Self {
            forecast: entries(&result.forecast),
            optimal_levels: result.policy.rounded(),
            model_diagnostics: result.diagnostics,
            model_order: result.order(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockDocument {
    pub forecast: Vec<ForecastEntry>,
    pub optimal_levels: InventoryPolicy,
}

impl From<&StockOptimization> for StockDocument {
    fn from(result: &StockOptimization) -> Self {
        Self {
            forecast: entries(&result.forecast),
            optimal_levels: result.policy.rounded(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyDocument {
    pub anomalies: Vec<AnomalyRecord>,
    pub model_parameters: ModelOrder,
    pub threshold: f64,
}

impl From<&AnomalyReport> for AnomalyDocument {
    fn from(report: &AnomalyReport) -> Self {
        Self {
            anomalies: report.anomalies.clone(),
            model_parameters: report.order,
            threshold: report.threshold,
        }
    }
}

/// Render an operation outcome, degrading any error to `{"error": message}`
pub fn into_document<T: Serialize>(result: Result<T>) -> Value {
    let rendered = result.and_then(|doc| Ok(serde_json::to_value(doc)?));
    match rendered {
        Ok(value) => value,
        Err(err) => {
            warn!(%err, "operation failed");
            error_document(&err.to_string())
        }
    }
}

/// A document carrying only an error message
pub fn error_document(message: &str) -> Value {
    json!({ "error": message })
}

/// Forecast demand for raw records and render the result
pub fn forecast_demand_document(planner: &DemandPlanner, records: &[DemandRecord]) -> Value {
    into_document(
        TimeSeries::from_records(records)
            .and_then(|series| planner.forecast_demand(&series))
            .map(|result| ForecastDocument::from(&result)),
    )
}

/// Optimise stock levels for raw records and render the result
pub fn stock_levels_document(planner: &DemandPlanner, records: &[DemandRecord]) -> Value {
    into_document(
        TimeSeries::from_records(records)
            .and_then(|series| planner.optimize_stock_levels(&series))
            .map(|result| StockDocument::from(&result)),
    )
}

/// Detect anomalies in raw records and render the result
pub fn anomaly_document(planner: &DemandPlanner, records: &[DemandRecord]) -> Value {
    into_document(
        TimeSeries::from_records(records)
            .and_then(|series| planner.detect_anomalies(&series))
            .map(|report| AnomalyDocument::from(&report)),
    )
}
