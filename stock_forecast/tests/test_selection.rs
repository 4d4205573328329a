use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use stock_forecast::config::{SearchConfig, SearchStrategy};
use stock_forecast::error::CandidateFitError;
use stock_forecast::selection::{initial_guess, OrderSelector};
use stock_forecast::ModelOrder;

fn ar1(n: usize, phi: f64, seed: u64) -> Vec<f64> {
    let normal = Normal::new(0.0, 1.0).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut value = 0.0;
    (0..n)
        .map(|_| {
            value = phi * value + normal.sample(&mut rng);
            50.0 + value
        })
        .collect()
}

fn trending_demand(n: usize, seed: u64) -> Vec<f64> {
    let normal = Normal::new(0.0, 3.0).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|t| 20.0 + 0.8 * t as f64 + normal.sample(&mut rng))
        .collect()
}

#[test]
fn test_select_order_respects_bounds() {
    let series = ar1(150, 0.7, 1);
    let order = OrderSelector::default().select_order(&series, 3, 2, 3).unwrap();

    assert!(order.p() <= 3);
    assert!(order.d() <= 2);
    assert!(order.q() <= 3);
}

#[test]
fn test_select_order_is_deterministic() {
    let series = trending_demand(90, 4);
    let selector = OrderSelector::default();

    let first = selector.select_order(&series, 5, 2, 5).unwrap();
    let second = selector.select_order(&series, 5, 2, 5).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_parallel_and_sequential_searches_agree() {
    let series = ar1(120, 0.5, 8);
    let parallel = OrderSelector::new(SearchConfig::default()).select(&series).unwrap();
    let sequential = OrderSelector::new(SearchConfig::default().sequential())
        .select(&series)
        .unwrap();

    assert_eq!(parallel, sequential);
}

#[test]
fn test_report_records_every_candidate() {
    let series = trending_demand(80, 2);
    let report = OrderSelector::default().select(&series).unwrap();

    assert!(!report.candidates.is_empty());
    assert!(report.candidates.len() <= 9);
    assert!(report.stationary_d >= 1);
    assert!(report
        .candidates
        .iter()
        .all(|c| c.order.d() == report.stationary_d));
    assert!(!report.used_fallback);

    // The selected order has the lowest AIC of the successful candidates
    let best = report
        .candidates
        .iter()
        .filter_map(|c| c.result.as_ref().ok().map(|s| s.aic))
        .fold(f64::INFINITY, f64::min);
    assert_eq!(report.selected_aic(), Some(best));
}

#[test]
fn test_exhaustive_search_is_capped() {
    let series = ar1(60, 0.3, 5);
    let config = SearchConfig {
        strategy: SearchStrategy::Exhaustive,
        max_candidates: 12,
        ..SearchConfig::default()
    };
    let report = OrderSelector::new(config).select(&series).unwrap();

    assert_eq!(report.candidates.len(), 12);
    let (p, q) = report.initial_guess;
    assert_eq!(
        report.candidates[0].order,
        ModelOrder::new(p, report.stationary_d, q).unwrap()
    );
}

#[test]
fn test_exhaustive_search_reaches_high_ar_orders() {
    let series = ar1(60, 0.3, 5);
    let config = SearchConfig {
        strategy: SearchStrategy::Exhaustive,
        ..SearchConfig::default()
    };
    let report = OrderSelector::new(config).select(&series).unwrap();

    assert_eq!(report.candidates.len(), 50);
    let (p, q) = report.initial_guess;
    let reach = report.candidates.iter().map(|c| c.order.p()).max().unwrap();
    // Every order within distance 2 of the guess fits under the cap
    assert!(reach >= (p + 2).min(5), "max p {} for guess {:?}", reach, (p, q));
    assert!(reach > 2 || p == 0);
}

#[test]
fn test_fallback_when_every_candidate_fails() {
    let normal = Normal::new(100.0, 10.0).unwrap();
    let mut rng = StdRng::seed_from_u64(17);
    let series: Vec<f64> = (0..200).map(|_| normal.sample(&mut rng)).collect();

    // One optimiser step is never enough, so every undifferenced candidate fails
    let mut config = SearchConfig::default();
    config.optimizer.max_iter = 1;
    let report = OrderSelector::new(config).select(&series).unwrap();

    assert_eq!(report.stationary_d, 0);
    assert!(report.used_fallback);
    assert_eq!(report.selected, ModelOrder::new(1, 0, 1).unwrap());
    assert_eq!(report.failures().count(), report.candidates.len());
    assert!(report
        .failures()
        .all(|err| matches!(err, CandidateFitError::IterationLimit { .. })));
    assert_eq!(report.selected_aic(), None);
}

#[test]
fn test_initial_guess_is_capped() {
    let series = ar1(400, 0.95, 3);
    let (p, q) = initial_guess(&series);
    assert!(p <= 5);
    // A persistent AR process has many significant autocorrelations
    assert_eq!(q, 5);
}
