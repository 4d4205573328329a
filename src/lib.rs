//! # Stockcast
//!
//! Demand forecasting and inventory planning for product sales histories.
//!
//! The workspace is split in two crates:
//!
//! - [`stock_math`]: numeric primitives (descriptive and rolling statistics,
//!   autocorrelation, differencing, least squares, Nelder-Mead)
//! - [`stock_forecast`]: stationarity testing, ARIMA order search and
//!   forecasting, inventory policies and anomaly detection
//!
//! ## Example
//!
//! ```
//! use stockcast_workspace::stock_forecast::{derive_policy, InventoryParameters};
//!
//! let policy = derive_policy(100.0, 20.0, &InventoryParameters::default()).unwrap();
//! assert_eq!(policy.rounded().reorder_point, 732.9);
//! assert_eq!(policy.rounded().economic_order_quantity, 4272.0);
//! ```

pub use stock_forecast;
pub use stock_math;
