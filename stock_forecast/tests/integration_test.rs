use chrono::NaiveDate;
use std::io::Write;
use stock_forecast::config::PipelineConfig;
use stock_forecast::data::{synthetic_demand, DataLoader, TimeSeries};
use stock_forecast::planner::DemandPlanner;
use stock_forecast::{ForecastError, ModelOrder, Severity};
use tempfile::NamedTempFile;

// Helper function to create a demand history on disk
fn create_sample_data() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    let series = synthetic_demand(NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(), 60, 120.0, 18.0, 2024).unwrap();

    writeln!(file, "date,quantity").unwrap();
    for (date, quantity) in series.iter() {
        writeln!(file, "{},{:.2}", date, quantity).unwrap();
    }
    // A second delivery on an existing day
    writeln!(file, "2023-06-15,5.00").unwrap();

    file
}

#[test]
fn test_full_planning_workflow() {
    // 1. Load data
    let data_file = create_sample_data();
    let series = DataLoader::from_csv(data_file.path()).unwrap();
    assert_eq!(series.len(), 60);

    let planner = DemandPlanner::new(PipelineConfig::default()).unwrap();

    // 2. Forecast with an automatically selected order
    let forecast = planner.forecast_demand(&series).unwrap();
    assert_eq!(forecast.forecast.len(), 30);
    assert_eq!(forecast.order(), forecast.search.selected);
    assert!(forecast.order().d() <= 2);
    assert!(forecast.forecast.values().iter().all(|v| *v >= 0.0));
    assert_eq!(
        forecast.forecast.points()[0].date,
        NaiveDate::from_ymd_opt(2023, 7, 31).unwrap()
    );

    // 3. Policy comes from the observed history
    assert!((forecast.policy.mean_demand - series.mean().unwrap()).abs() < 1e-9);
    assert!(forecast.policy.reorder_point > 7.0 * forecast.policy.mean_demand);

    // 4. Fixed-order stock optimisation
    let stock = planner.optimize_stock_levels(&series).unwrap();
    assert_eq!(stock.model.order(), ModelOrder::new(5, 1, 0).unwrap());
    assert_eq!(stock.policy, forecast.policy);

    // 5. Anomaly scan over the same history
    let report = planner.detect_anomalies(&series).unwrap();
    assert!(report.threshold > 0.0);
    assert!(report
        .anomalies
        .iter()
        .all(|a| a.severity == Severity::High || a.severity == Severity::Medium));
}

#[test]
fn test_forecast_never_negative_over_a_year() {
    // Sparse demand sitting close to zero
    let series = synthetic_demand(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 120, 3.0, 4.0, 77).unwrap();
    let planner = DemandPlanner::new(PipelineConfig::default().with_horizon(365)).unwrap();

    let forecast = planner.forecast_demand(&series).unwrap();
    assert_eq!(forecast.forecast.len(), 365);
    assert!(forecast.forecast.values().iter().all(|v| *v >= 0.0));
}

#[test]
fn test_intermittent_demand_still_forecasts() {
    // Nothing sold until the last day
    let mut values = vec![0.0; 29];
    values.push(10.0);
    let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    let series = TimeSeries::from_daily_values(start, values).unwrap();
    let planner = DemandPlanner::new(PipelineConfig::default()).unwrap();

    let forecast = planner.forecast_demand(&series).unwrap();
    assert_eq!(forecast.search.stationary_d, 2);
    assert_eq!(forecast.forecast.len(), 30);
    assert!(forecast.forecast.values().iter().all(|v| v.is_finite() && *v >= 0.0));
    assert_eq!(
        forecast.forecast.points()[0].date,
        NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
    );

    assert!(planner.optimize_stock_levels(&series).is_ok());
    assert!(planner.detect_anomalies(&series).is_ok());
}

#[test]
fn test_minimum_record_counts() {
    let planner = DemandPlanner::new(PipelineConfig::default()).unwrap();
    let series = synthetic_demand(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 20, 50.0, 5.0, 1).unwrap();

    // Enough for a forecast, not for stock optimisation
    assert!(planner.forecast_demand(&series).is_ok());
    assert!(matches!(
        planner.optimize_stock_levels(&series),
        Err(ForecastError::InsufficientData { required: 30, actual: 20 })
    ));

    let short = series.tail(9);
    assert!(matches!(
        planner.forecast_demand(&short),
        Err(ForecastError::InsufficientData { required: 10, actual: 9 })
    ));
}

#[test]
fn test_config_from_json() {
    let config = PipelineConfig::from_json(
        r#"{
            "horizon": 7,
            "optimization_order": {"p": 2, "d": 1, "q": 0},
            "search": {"strategy": "exhaustive", "max_p": 1, "max_d": 1, "max_q": 1, "parallel": false}
        }"#,
    )
    .unwrap();
    let planner = DemandPlanner::new(config).unwrap();
    let series = synthetic_demand(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 40, 30.0, 6.0, 12).unwrap();

    let forecast = planner.forecast_demand(&series).unwrap();
    assert_eq!(forecast.forecast.len(), 7);
    assert_eq!(forecast.search.candidates.len(), 8);

    let stock = planner.optimize_stock_levels(&series).unwrap();
    assert_eq!(stock.model.order(), ModelOrder::new(2, 1, 0).unwrap());
}

#[test]
fn test_config_rejects_third_difference() {
    let result = PipelineConfig::from_json(r#"{"optimization_order": {"p": 1, "d": 3, "q": 0}}"#);
    assert!(matches!(result, Err(ForecastError::Json(_))));
}
