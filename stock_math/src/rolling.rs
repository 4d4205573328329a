//! Trailing window statistics
//!
//! A `RollingStats` window keeps the most recent `period` observations and
//! reports their mean and sample standard deviation. Values are available as
//! soon as one observation has been seen (`min_periods = 1`).

use crate::{MathError, Result};
use std::collections::VecDeque;

/// Trailing window mean and standard deviation
#[derive(Debug, Clone)]
pub struct RollingStats {
    period: usize,
    values: VecDeque<f64>,
}

/// Window statistics at a single position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    /// Mean of the observations in the window
    pub mean: f64,
    /// Sample standard deviation, `None` while the window holds a single value
    pub std_dev: Option<f64>,
}

impl RollingStats {
    /// Create a new rolling window with the specified period
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            period,
            values: VecDeque::with_capacity(period),
        })
    }

    /// Push a new observation, evicting the oldest once the window is full
    pub fn update(&mut self, value: f64) {
        self.values.push_back(value);

        if self.values.len() > self.period {
            self.values.pop_front();
        }
    }

    /// Statistics of the current window
    pub fn value(&self) -> Result<WindowStats> {
        if self.values.is_empty() {
            return Err(MathError::InsufficientData(
                "Rolling window is empty".to_string(),
            ));
        }

        let n = self.values.len();
        let mean = self.values.iter().sum::<f64>() / n as f64;
        let std_dev = if n > 1 {
            let ss = self.values.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
            Some((ss / (n - 1) as f64).sqrt())
        } else {
            None
        };

        Ok(WindowStats { mean, std_dev })
    }

    /// Get the current period
    pub fn period(&self) -> usize {
        self.period
    }

    /// Reset the window, clearing all values
    pub fn reset(&mut self) {
        self.values.clear();
    }
}

/// Trailing window statistics for every position of the series
pub fn rolling_stats(values: &[f64], period: usize) -> Result<Vec<WindowStats>> {
    let mut window = RollingStats::new(period)?;
    let mut out = Vec::with_capacity(values.len());

    for &value in values {
        window.update(value);
        out.push(window.value()?);
    }

    Ok(out)
}
