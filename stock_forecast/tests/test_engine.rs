use approx::assert_abs_diff_eq;
use chrono::{Duration, NaiveDate};
use stock_forecast::data::{synthetic_demand, TimeSeries};
use stock_forecast::engine::ForecastEngine;
use stock_forecast::ModelOrder;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn demand() -> TimeSeries {
    synthetic_demand(start(), 90, 100.0, 15.0, 42).unwrap()
}

#[test]
fn test_forecast_has_requested_horizon_and_dates() {
    let series = demand();
    let order = ModelOrder::new(1, 0, 0).unwrap();
    let (model, forecast, _) = ForecastEngine::new()
        .fit_and_forecast(&series, order, 14)
        .unwrap();

    assert_eq!(model.order(), order);
    assert_eq!(forecast.len(), 14);

    let last = series.last_date().unwrap();
    for (i, point) in forecast.points().iter().enumerate() {
        assert_eq!(point.date, last + Duration::days(i as i64 + 1));
        assert!(point.value >= 0.0);
    }
}

#[test]
fn test_default_horizon_is_thirty_days() {
    let series = demand();
    let (_, forecast, _) = ForecastEngine::new()
        .fit_and_forecast_default(&series, ModelOrder::new(1, 1, 0).unwrap())
        .unwrap();
    assert_eq!(forecast.len(), 30);
}

#[test]
fn test_diagnostics_are_consistent() {
    let series = demand();
    let (model, _, diagnostics) = ForecastEngine::new()
        .fit_and_forecast(&series, ModelOrder::new(1, 0, 0).unwrap(), 5)
        .unwrap();

    assert_eq!(diagnostics.aic, model.aic());
    assert_eq!(diagnostics.bic, model.bic());
    assert!(diagnostics.mae > 0.0);
    assert!(diagnostics.rmse >= diagnostics.mae);
    // Noise around a constant mean leaves residuals of roughly the noise scale
    assert!(diagnostics.residuals_std > 5.0 && diagnostics.residuals_std < 30.0);
    assert!(diagnostics.residuals_mean.abs() < 5.0);
    assert_eq!(model.residuals().len(), series.len());
}

#[test]
fn test_forecasts_are_clamped_at_zero() {
    // Demand falling steeply towards zero drags a differenced model below it
    let values: Vec<f64> = (0..40).map(|t| (400.0 - 10.0 * t as f64).max(0.0) + (t % 3) as f64).collect();
    let series = TimeSeries::from_daily_values(start(), values).unwrap();
    let (_, forecast, _) = ForecastEngine::new()
        .fit_and_forecast(&series, ModelOrder::new(0, 2, 0).unwrap(), 60)
        .unwrap();

    assert!(forecast.values().iter().all(|v| *v >= 0.0));
}

#[test]
fn test_random_walk_forecast_repeats_last_value() {
    let series = TimeSeries::from_daily_values(start(), vec![5.0, 9.0, 7.0, 8.0, 6.0, 10.0]).unwrap();
    let (_, forecast, _) = ForecastEngine::new()
        .fit_and_forecast(&series, ModelOrder::new(0, 1, 0).unwrap(), 3)
        .unwrap();

    for value in forecast.values() {
        assert_abs_diff_eq!(value, 10.0, epsilon = 1e-12);
    }
}

#[test]
fn test_empty_series_is_rejected() {
    let series = TimeSeries::new(Vec::new(), Vec::new()).unwrap();
    let result = ForecastEngine::new().fit_and_forecast(&series, ModelOrder::new(0, 0, 0).unwrap(), 5);
    assert!(result.is_err());
}
