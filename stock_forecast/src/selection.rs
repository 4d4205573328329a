//! Automatic ARIMA order selection
//!
//! The selector differences the series to stationarity, reads a starting
//! `(p, q)` guess off the partial autocorrelation and autocorrelation
//! functions, then fits candidate orders and keeps the one with the lowest AIC.

use rayon::prelude::*;
use stock_math::correlation::{acf, count_significant, pacf, significance_bound};
use tracing::{debug, info, warn};

use crate::config::{SearchConfig, SearchStrategy};
use crate::error::{CandidateFitError, Result};
use crate::models::arima::ArimaModel;
use crate::models::{ModelOrder, MAX_DIFFERENCING};
use crate::stationarity::StationarityAnalyzer;

/// Largest lag inspected when guessing the starting order
const MAX_CORRELATION_LAG: usize = 20;

/// Cap on the AR and MA guesses taken from the correlation functions
const MAX_GUESS: usize = 5;

/// Information criteria of a successfully fitted candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateScore {
    pub aic: f64,
    pub bic: f64,
}

/// Outcome of fitting one candidate order
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateOutcome {
    pub order: ModelOrder,
    pub result: std::result::Result<CandidateScore, CandidateFitError>,
}

/// Everything an order search tried and what it settled on
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    /// Differencing order suggested by the stationarity step
    pub stationary_d: usize,
    /// Starting `(p, q)` read from the correlation functions
    pub initial_guess: (usize, usize),
    /// Every candidate evaluated, in grid order
    pub candidates: Vec<CandidateOutcome>,
    /// Order returned by the search
    pub selected: ModelOrder,
    /// Whether no candidate converged and the fallback order was used
    pub used_fallback: bool,
}

impl SearchReport {
    /// Candidates that failed to fit
    pub fn failures(&self) -> impl Iterator<Item = &CandidateFitError> {
        self.candidates.iter().filter_map(|c| c.result.as_ref().err())
    }

    /// AIC of the selected order, if it came out of the search
    pub fn selected_aic(&self) -> Option<f64> {
        self.candidates
            .iter()
            .find(|c| c.order == self.selected)
            .and_then(|c| c.result.as_ref().ok())
            .map(|score| score.aic)
    }
}

/// Searches for the ARIMA order with the lowest AIC
#[derive(Debug, Clone, Default)]
pub struct OrderSelector {
    config: SearchConfig,
    analyzer: StationarityAnalyzer,
}

impl OrderSelector {
    /// Create a selector with the given search settings
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            analyzer: StationarityAnalyzer::new(),
        }
    }

    /// Search settings in use
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Pick an order for `series` within `[0, max_p] x [0, max_d] x [0, max_q]`
    pub fn select_order(
        &self,
        series: &[f64],
        max_p: usize,
        max_d: usize,
        max_q: usize,
    ) -> Result<ModelOrder> {
        Ok(self.search(series, max_p, max_d, max_q)?.selected)
    }

    /// Pick an order using the bounds from the configuration
    pub fn select(&self, series: &[f64]) -> Result<SearchReport> {
        self.search(series, self.config.max_p, self.config.max_d, self.config.max_q)
    }

    /// Run the search and report every candidate
    pub fn search(
        &self,
        series: &[f64],
        max_p: usize,
        max_d: usize,
        max_q: usize,
    ) -> Result<SearchReport> {
        let (stationary, d) = self.analyzer.make_stationary(series)?;
        let d = d.min(max_d);
        let initial_guess = initial_guess(&stationary);
        debug!(d, p = initial_guess.0, q = initial_guess.1, "initial order guess");

        let grid = self.candidate_grid(initial_guess, d, max_p, max_d, max_q);
        let outcomes = self.evaluate(series, &grid);

        let best = best_candidate(&outcomes);
        let (selected, used_fallback) = match best {
            Some(order) => (order, false),
            None => {
                let fallback = ModelOrder::clamped(1, d, 1);
                warn!(%fallback, "no candidate order converged, using fallback");
                (fallback, true)
            }
        };
        info!(%selected, candidates = outcomes.len(), "order selected");

        Ok(SearchReport {
            stationary_d: d,
            initial_guess,
            candidates: outcomes,
            selected,
            used_fallback,
        })
    }

    fn candidate_grid(
        &self,
        (p, q): (usize, usize),
        d: usize,
        max_p: usize,
        max_d: usize,
        max_q: usize,
    ) -> Vec<ModelOrder> {
        let mut grid = Vec::new();
        match self.config.strategy {
            SearchStrategy::Neighbourhood => {
                // Keep the neighbourhood inside the bounds even when the guess is not
                let (p, q) = (p.min(max_p), q.min(max_q));
                for p_val in p.saturating_sub(1)..=(p + 1).min(max_p) {
                    for q_val in q.saturating_sub(1)..=(q + 1).min(max_q) {
                        grid.push(ModelOrder::clamped(p_val, d, q_val));
                    }
                }
            }
            SearchStrategy::Exhaustive => {
                for p_val in 0..=max_p {
                    for d_val in 0..=max_d.min(MAX_DIFFERENCING) {
                        for q_val in 0..=max_q {
                            grid.push(ModelOrder::clamped(p_val, d_val, q_val));
                        }
                    }
                }
                // Nearest orders first so the cap trims the far corners of every axis
                grid.sort_by_key(|order| distance(order, (p, d, q)));
            }
        }

        if grid.len() > self.config.max_candidates {
            warn!(
                grid = grid.len(),
                cap = self.config.max_candidates,
                "candidate grid truncated"
            );
            grid.truncate(self.config.max_candidates);
        }
        grid
    }

    fn evaluate(&self, series: &[f64], grid: &[ModelOrder]) -> Vec<CandidateOutcome> {
        let fit = |order: &ModelOrder| {
            let model = ArimaModel::new(*order).with_optimizer(self.config.optimizer);
            let result = model.fit(series).map(|fitted| CandidateScore {
                aic: fitted.aic(),
                bic: fitted.bic(),
            });
            if let Err(err) = &result {
                debug!(%err, "candidate skipped");
            }
            CandidateOutcome {
                order: *order,
                result,
            }
        };

        // Collecting from an indexed parallel iterator keeps grid order
        if self.config.parallel {
            grid.par_iter().map(fit).collect()
        } else {
            grid.iter().map(fit).collect()
        }
    }
}

/// Lowest-AIC order; the first of several equal scores wins
fn best_candidate(outcomes: &[CandidateOutcome]) -> Option<ModelOrder> {
    let mut best: Option<(ModelOrder, f64)> = None;
    for outcome in outcomes {
        if let Ok(score) = &outcome.result {
            if best.map_or(true, |(_, aic)| score.aic < aic) {
                best = Some((outcome.order, score.aic));
            }
        }
    }
    best.map(|(order, _)| order)
}

/// L1 distance between an order and the guessed `(p, d, q)`
fn distance(order: &ModelOrder, (p, d, q): (usize, usize, usize)) -> usize {
    order.p().abs_diff(p) + order.d().abs_diff(d) + order.q().abs_diff(q)
}

/// Starting `(p, q)` from the number of significant partial and plain autocorrelations
pub fn initial_guess(stationary: &[f64]) -> (usize, usize) {
    let n = stationary.len();
    let nlags = MAX_CORRELATION_LAG.min((n / 2).saturating_sub(1));
    if nlags == 0 {
        return (0, 0);
    }

    let bound = significance_bound(n);
    let p = pacf(stationary, nlags)
        .map(|values| count_significant(&values, bound))
        .unwrap_or(0);
    let q = acf(stationary, nlags)
        .map(|values| count_significant(&values, bound))
        .unwrap_or(0);

    (p.min(MAX_GUESS), q.min(MAX_GUESS))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(p: usize, aic: Option<f64>) -> CandidateOutcome {
        let order = ModelOrder::new(p, 0, 0).unwrap();
        CandidateOutcome {
            order,
            result: match aic {
                Some(aic) => Ok(CandidateScore { aic, bic: aic }),
                None => Err(CandidateFitError::NonFiniteLikelihood { order }),
            },
        }
    }

    #[test]
    fn test_best_candidate_first_tie_wins() {
        let outcomes = vec![
            outcome(0, Some(10.0)),
            outcome(1, Some(5.0)),
            outcome(2, Some(5.0)),
            outcome(3, None),
        ];
        assert_eq!(best_candidate(&outcomes), Some(ModelOrder::new(1, 0, 0).unwrap()));
    }

    #[test]
    fn test_best_candidate_all_failed() {
        let outcomes = vec![outcome(0, None), outcome(1, None)];
        assert_eq!(best_candidate(&outcomes), None);
    }

    #[test]
    fn test_neighbourhood_grid_respects_bounds() {
        let selector = OrderSelector::default();
        let grid = selector.candidate_grid((0, 5), 1, 5, 2, 5);

        // p in 0..=1, q in 4..=5
        assert_eq!(grid.len(), 4);
        assert!(grid.iter().all(|o| o.d() == 1 && o.p() <= 1 && o.q() >= 4));
    }

    #[test]
    fn test_exhaustive_grid_is_capped() {
        let selector = OrderSelector::new(SearchConfig {
            strategy: SearchStrategy::Exhaustive,
            max_candidates: 50,
            ..Default::default()
        });
        let grid = selector.candidate_grid((0, 0), 0, 5, 2, 5);
        assert_eq!(grid.len(), 50);
        assert_eq!(grid[0], ModelOrder::new(0, 0, 0).unwrap());

        // The cap keeps the far end of each axis in reach
        assert!(grid.contains(&ModelOrder::new(5, 0, 0).unwrap()));
        assert!(grid.contains(&ModelOrder::new(0, 0, 5).unwrap()));
        assert!(grid.contains(&ModelOrder::new(0, 2, 0).unwrap()));
        assert!(grid
            .windows(2)
            .all(|pair| distance(&pair[0], (0, 0, 0)) <= distance(&pair[1], (0, 0, 0))));
    }

    #[test]
    fn test_exhaustive_grid_starts_at_the_guess() {
        let selector = OrderSelector::new(SearchConfig {
            strategy: SearchStrategy::Exhaustive,
            max_candidates: 12,
            ..Default::default()
        });
        let grid = selector.candidate_grid((4, 3), 1, 5, 2, 5);
        assert_eq!(grid.len(), 12);
        assert_eq!(grid[0], ModelOrder::new(4, 1, 3).unwrap());
        assert!(grid.iter().all(|o| distance(o, (4, 1, 3)) <= 2));
    }

    #[test]
    fn test_initial_guess_on_short_series() {
        assert_eq!(initial_guess(&[1.0, 2.0, 3.0]), (0, 0));
    }
}
