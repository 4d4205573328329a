//! Error types for the stock_forecast crate

use stock_math::MathError;
use thiserror::Error;

use crate::models::ModelOrder;

/// Custom error types for the stock_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Fewer records than the operation needs
    #[error("Insufficient data: need at least {required} records, have {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Malformed dates, negative-only series or otherwise unusable input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// No candidate order could be fitted
    #[error("Model fit error: {0}")]
    ModelFit(String),

    /// Error from numeric primitives
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from JSON parsing or serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Why a single candidate order could not be fitted
///
/// These are recoverable: an order search records them and moves on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandidateFitError {
    /// Not enough observations left after differencing to estimate the parameters
    #[error("ARIMA{order} needs more than {needed} observations after differencing, have {available}")]
    InsufficientObservations {
        order: ModelOrder,
        needed: usize,
        available: usize,
    },

    /// The optimiser hit its iteration cap before converging
    #[error("ARIMA{order} did not converge within {iterations} iterations")]
    IterationLimit { order: ModelOrder, iterations: usize },

    /// The likelihood could not be evaluated at the optimum
    #[error("ARIMA{order} produced a non-finite likelihood")]
    NonFiniteLikelihood { order: ModelOrder },

    /// A numeric primitive failed
    #[error("ARIMA{order}: {source}")]
    Numeric { order: ModelOrder, source: MathError },
}

impl CandidateFitError {
    /// Order of the candidate that failed
    pub fn order(&self) -> ModelOrder {
        match self {
            CandidateFitError::InsufficientObservations { order, .. }
            | CandidateFitError::IterationLimit { order, .. }
            | CandidateFitError::NonFiniteLikelihood { order }
            | CandidateFitError::Numeric { order, .. } => *order,
        }
    }
}

impl From<CandidateFitError> for ForecastError {
    fn from(err: CandidateFitError) -> Self {
        ForecastError::ModelFit(err.to_string())
    }
}
