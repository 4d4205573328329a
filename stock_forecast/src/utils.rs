//! Date handling helpers

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

use crate::error::{ForecastError, Result};

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse an ISO-8601 date, naive datetime or RFC 3339 timestamp down to its calendar day
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let input = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date);
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(datetime.date());
        }
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(input) {
        return Ok(datetime.date_naive());
    }

    Err(ForecastError::InvalidInput(format!(
        "Unrecognised date: '{}'",
        input
    )))
}

/// Consecutive days following `last`
pub fn future_dates(last: NaiveDate, horizon: usize) -> Result<Vec<NaiveDate>> {
    let mut dates = Vec::with_capacity(horizon);
    let mut current = last;

    for _ in 0..horizon {
        current = current.checked_add_signed(Duration::days(1)).ok_or_else(|| {
            ForecastError::InvalidInput(format!("Forecast horizon runs past the calendar from {}", last))
        })?;
        dates.push(current);
    }

    Ok(dates)
}
