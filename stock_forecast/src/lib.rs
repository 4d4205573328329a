//! # Stock Forecast
//!
//! A Rust library for product demand forecasting and inventory planning.
//!
//! ## Features
//!
//! - Daily demand series from CSV or JSON records, aggregated by day
//! - Augmented Dickey-Fuller stationarity testing and differencing
//! - Automatic ARIMA order search by AIC, with a report of every candidate
//! - Forecasts with in-sample diagnostics
//! - Safety stock, reorder point and economic order quantity
//! - Hybrid anomaly detection from model residuals and a rolling window
//!
//! ## Quick Start
//!
//! ```no_run
//! use stock_forecast::config::PipelineConfig;
//! use stock_forecast::data::DataLoader;
//! use stock_forecast::planner::DemandPlanner;
//!
//! # fn main() -> stock_forecast::error::Result<()> {
//! let series = DataLoader::from_csv("sales.csv")?;
//! let planner = DemandPlanner::new(PipelineConfig::default())?;
//!
//! let forecast = planner.forecast_demand(&series)?;
//! println!("order {} reorder at {:.1}", forecast.order(), forecast.policy.reorder_point);
//!
//! let report = planner.detect_anomalies(&series)?;
//! for anomaly in &report.anomalies {
//!     println!("{} {:?}", anomaly.date, anomaly.severity);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod anomaly;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod metrics;
pub mod models;
pub mod planner;
pub mod report;
pub mod selection;
pub mod stationarity;
pub mod utils;

// Re-export commonly used types
pub use crate::anomaly::{AnomalyDetector, AnomalyRecord, FittedDetector, Severity};
pub use crate::config::{AnomalyConfig, InventoryParameters, PipelineConfig, SearchConfig};
pub use crate::data::{DataLoader, DemandRecord, TimeSeries};
pub use crate::engine::{Diagnostics, ForecastEngine, ForecastResult};
pub use crate::error::{CandidateFitError, ForecastError};
pub use crate::inventory::{derive_policy, InventoryPolicy, InventoryPolicyCalculator};
pub use crate::models::{FittedModel, ModelOrder};
pub use crate::planner::DemandPlanner;
pub use crate::selection::{OrderSelector, SearchReport};
pub use crate::stationarity::StationarityAnalyzer;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
