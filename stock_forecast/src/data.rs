//! Daily demand series and their loaders

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use stock_math::descriptive::{mean, population_std};
use tracing::debug;

use crate::error::{ForecastError, Result};
use crate::utils::parse_date;

/// One raw demand observation as supplied by a data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandRecord {
    /// ISO-8601 date or timestamp
    pub date: String,
    /// Units demanded
    pub quantity: f64,
}

impl DemandRecord {
    /// Create a new record
    pub fn new(date: impl Into<String>, quantity: f64) -> Self {
        Self {
            date: date.into(),
            quantity,
        }
    }
}

/// Daily demand ordered by date
///
/// Dates are strictly increasing and every quantity is finite and
/// non-negative. A series is never modified once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a series from aligned dates and quantities
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(ForecastError::InvalidInput(format!(
                "Got {} dates but {} quantities",
                dates.len(),
                values.len()
            )));
        }
        if let Some(pair) = dates.windows(2).find(|pair| pair[1] <= pair[0]) {
            return Err(ForecastError::InvalidInput(format!(
                "Dates must be strictly increasing, found {} after {}",
                pair[1], pair[0]
            )));
        }
        if let Some(value) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(ForecastError::InvalidInput(format!(
                "Quantities must be finite and non-negative, found {}",
                value
            )));
        }

        Ok(Self { dates, values })
    }

    /// Create a series of consecutive days starting at `start`
    pub fn from_daily_values(start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        let dates = (0..values.len())
            .map(|i| {
                start
                    .checked_add_signed(Duration::days(i as i64))
                    .ok_or_else(|| ForecastError::InvalidInput(format!("Day {} after {} is out of range", i, start)))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(dates, values)
    }

    /// Build a series from raw records
    ///
    /// Quantities on the same day are summed, days are sorted and negative
    /// totals are clamped to zero. Input made only of negative quantities is
    /// rejected.
    pub fn from_records(records: &[DemandRecord]) -> Result<Self> {
        if records.is_empty() {
            return Err(ForecastError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        let mut any_non_negative = false;
        for record in records {
            if !record.quantity.is_finite() {
                return Err(ForecastError::InvalidInput(format!(
                    "Quantity for {} is not a finite number",
                    record.date
                )));
            }
            any_non_negative |= record.quantity >= 0.0;
            let date = parse_date(&record.date)?;
            *by_day.entry(date).or_insert(0.0) += record.quantity;
        }

        if !any_non_negative {
            return Err(ForecastError::InvalidInput(
                "Every quantity in the series is negative".to_string(),
            ));
        }

        debug!(records = records.len(), days = by_day.len(), "aggregated demand records");
        let (dates, values) = by_day.into_iter().map(|(date, qty)| (date, qty.max(0.0))).unzip();
        Self::new(dates, values)
    }

    /// Dates of the series
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Quantities of the series
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of days in the series
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First observed day
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    /// Last observed day
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Mean daily demand
    pub fn mean(&self) -> Result<f64> {
        Ok(mean(&self.values)?)
    }

    /// Population standard deviation of daily demand
    pub fn std_dev(&self) -> Result<f64> {
        Ok(population_std(&self.values)?)
    }

    /// Pairs of date and quantity
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// The last `n` days, or the whole series when it is shorter
    pub fn tail(&self, n: usize) -> Self {
        let start = self.len().saturating_sub(n);
        Self {
            dates: self.dates[start..].to_vec(),
            values: self.values[start..].to_vec(),
        }
    }
}

/// Data loader for demand records
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a series from a CSV file with `date` and `quantity` columns
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<TimeSeries> {
        let file = File::open(path)?;
        let records = Self::read_csv_records(file)?;
        TimeSeries::from_records(&records)
    }

    /// Read raw records from any CSV source
    pub fn read_csv_records<R: std::io::Read>(reader: R) -> Result<Vec<DemandRecord>> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut records = Vec::new();
        for row in csv_reader.deserialize() {
            records.push(row?);
        }
        Ok(records)
    }

    /// Load a series from a JSON array of `{date, quantity}` objects
    pub fn from_json(json: &str) -> Result<TimeSeries> {
        let records: Vec<DemandRecord> = serde_json::from_str(json)?;
        TimeSeries::from_records(&records)
    }
}

/// Seeded synthetic daily demand, normally distributed and clamped at zero
///
/// The same seed always produces the same series.
pub fn synthetic_demand(
    start: NaiveDate,
    days: usize,
    mean: f64,
    std_dev: f64,
    seed: u64,
) -> Result<TimeSeries> {
    if !(mean.is_finite() && std_dev.is_finite() && std_dev >= 0.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "Invalid demand distribution: mean {}, std_dev {}",
            mean, std_dev
        )));
    }
    let normal = Normal::new(mean, std_dev).map_err(|e| {
        ForecastError::InvalidParameter(format!("Invalid demand distribution: {}", e))
    })?;
    let mut rng = StdRng::seed_from_u64(seed);
    let values = (0..days).map(|_| normal.sample(&mut rng).max(0.0)).collect();
    TimeSeries::from_daily_values(start, values)
}
