//! # Stock Math
//!
//! Numeric building blocks for demand time series analysis.
//! This crate provides the statistics, correlation estimates, differencing,
//! least squares and optimisation routines the forecasting engine is built on.

use thiserror::Error;

pub mod correlation;
pub mod descriptive;
pub mod differencing;
pub mod optimize;
pub mod regression;
pub mod rolling;

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;
