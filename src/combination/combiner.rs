//! Performance-weighted combination of per-indicator nowcasts.

use super::history::{ForecastHistory, HistoryTable};
use super::strategy::CombinationStrategy;
use crate::utils::{average_ranks, least_squares, median, population_std};
use serde::Serialize;

/// Smallest error used when inverting RMSE values.
const MIN_ERROR: f64 = 1e-10;

/// Offset added to the worst finite score to replace non-finite ones.
const NON_FINITE_PENALTY: f64 = 100.0;

/// One indicator's contribution to a combination round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub indicator: String,
    pub forecast: f64,
    /// Information criterion of the fitted model; lower is better.
    pub criterion: f64,
}

impl Candidate {
    pub fn new(indicator: impl Into<String>, forecast: f64, criterion: f64) -> Self {
        Self {
            indicator: indicator.into(),
            forecast,
            criterion,
        }
    }
}

/// Non-negative weights summing to one, in candidate order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinationWeights {
    strategy: CombinationStrategy,
    weights: Vec<(String, f64)>,
    fallback: bool,
}

impl CombinationWeights {
    fn new(strategy: CombinationStrategy, candidates: &[Candidate], weights: Vec<f64>) -> Self {
        Self {
            strategy,
            weights: candidates
                .iter()
                .map(|c| c.indicator.clone())
                .zip(weights)
                .collect(),
            fallback: false,
        }
    }

    fn equal(strategy: CombinationStrategy, candidates: &[Candidate], fallback: bool) -> Self {
        let n = candidates.len();
        let mut weights = Self::new(strategy, candidates, vec![1.0 / n as f64; n]);
        weights.fallback = fallback;
        weights
    }

    pub fn strategy(&self) -> CombinationStrategy {
        self.strategy
    }

    /// True when the strategy could not be computed and equal weights were used.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn get(&self, indicator: &str) -> Option<f64> {
        self.weights
            .iter()
            .find(|(name, _)| name == indicator)
            .map(|(_, w)| *w)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(name, w)| (name.as_str(), *w))
    }

    pub fn sum(&self) -> f64 {
        self.weights.iter().map(|(_, w)| w).sum()
    }

    /// Weighted nowcast; `None` when nothing participates.
    pub fn apply(&self, candidates: &[Candidate]) -> Option<f64> {
        if self.weights.is_empty() {
            return None;
        }
        let mut total = 0.0;
        for (name, weight) in &self.weights {
            let candidate = candidates.iter().find(|c| &c.indicator == name)?;
            total += weight * candidate.forecast;
        }
        total.is_finite().then_some(total)
    }
}

/// Computes combination weights from the current fits and recorded history.
#[derive(Debug, Clone, Copy)]
pub struct ForecastCombiner<'a> {
    history: &'a HistoryTable,
}

impl<'a> ForecastCombiner<'a> {
    pub fn new(history: &'a HistoryTable) -> Self {
        Self { history }
    }

    /// Weights under `strategy`. Empty when `candidates` is empty; equal
    /// weights whenever the strategy is undefined for this round.
    pub fn weights(
        &self,
        strategy: CombinationStrategy,
        candidates: &[Candidate],
    ) -> CombinationWeights {
        if candidates.is_empty() {
            return CombinationWeights::new(strategy, candidates, Vec::new());
        }

        let raw = match strategy {
            CombinationStrategy::Equal => {
                return CombinationWeights::equal(strategy, candidates, false)
            }
            CombinationStrategy::Criterion => self.criterion_weights(candidates),
            CombinationStrategy::Rmse { window } => self.rmse_weights(candidates, window),
            CombinationStrategy::Rank => self.rank_weights(candidates),
            CombinationStrategy::Adaptive { window } => self.adaptive_weights(candidates, window),
            CombinationStrategy::ThickModeling { n_models } => {
                self.thick_weights(candidates, n_models)
            }
            CombinationStrategy::Regression { window, alpha } => {
                self.regression_weights(candidates, window, alpha)
            }
        };

        match raw.and_then(normalize) {
            Some(weights) => CombinationWeights::new(strategy, candidates, weights),
            None => {
                tracing::debug!(
                    strategy = %strategy,
                    candidates = candidates.len(),
                    "falling back to equal weights"
                );
                CombinationWeights::equal(strategy, candidates, true)
            }
        }
    }

    /// Weighted nowcast under `strategy`, `None` without candidates.
    pub fn combine(&self, strategy: CombinationStrategy, candidates: &[Candidate]) -> Option<f64> {
        self.weights(strategy, candidates).apply(candidates)
    }

    fn histories(&self, candidates: &[Candidate]) -> Vec<Option<&'a ForecastHistory>> {
        candidates
            .iter()
            .map(|c| self.history.get(&c.indicator).filter(|h| !h.is_empty()))
            .collect()
    }

    fn criterion_weights(&self, candidates: &[Candidate]) -> Option<Vec<f64>> {
        let scores = positive_scores(candidates.iter().map(|c| c.criterion).collect())?;
        Some(scores.iter().map(|s| 1.0 / s).collect())
    }

    fn rmse(&self, candidates: &[Candidate], window: Option<usize>) -> Option<Vec<f64>> {
        let histories = self.histories(candidates);
        if histories.iter().all(Option::is_none) {
            return None;
        }
        Some(
            histories
                .iter()
                .map(|h| h.map_or(f64::INFINITY, |h| h.calculate_rmse(window)))
                .collect(),
        )
    }

    fn rmse_weights(&self, candidates: &[Candidate], window: Option<usize>) -> Option<Vec<f64>> {
        let rmse = self.rmse(candidates, window)?;
        Some(rmse.iter().map(|&r| inverse_error(r)).collect())
    }

    fn rank_weights(&self, candidates: &[Candidate]) -> Option<Vec<f64>> {
        let histories = self.histories(candidates);
        if histories.iter().all(Option::is_none) {
            return None;
        }
        let rmse = average_ranks(&metric(&histories, f64::INFINITY, |h| h.calculate_rmse(None)));
        let mae = average_ranks(&metric(&histories, f64::INFINITY, |h| h.calculate_mae(None)));
        let direction = average_ranks(&metric(&histories, -0.5, |h| {
            -h.calculate_directional_accuracy(None)
        }));

        Some(
            rmse.iter()
                .zip(mae.iter())
                .zip(direction.iter())
                .map(|((a, b), c)| 1.0 / (a + b + c))
                .collect(),
        )
    }

    fn adaptive_weights(&self, candidates: &[Candidate], window: usize) -> Option<Vec<f64>> {
        let rmse = self.rmse(candidates, Some(window))?;
        let histories = self.histories(candidates);
        let direction: Vec<f64> = histories
            .iter()
            .map(|h| h.map_or(0.5, |h| h.calculate_directional_accuracy(Some(window))))
            .collect();

        let (rmse_share, direction_share) = if self.volatile(&histories, window) {
            (0.5, 0.5)
        } else {
            (0.7, 0.3)
        };

        Some(
            rmse.iter()
                .zip(direction.iter())
                .map(|(&r, d)| {
                    if r.is_finite() {
                        rmse_share * inverse_error(r) + direction_share * d
                    } else {
                        0.0
                    }
                })
                .collect(),
        )
    }

    /// Recent actuals more dispersed than their (non-zero) median level.
    fn volatile(&self, histories: &[Option<&ForecastHistory>], window: usize) -> bool {
        let window = window.max(1);
        let Some(history) = histories.iter().flatten().find(|h| h.len() >= window) else {
            return false;
        };
        let actuals = history.actuals();
        let recent = &actuals[actuals.len() - window..];
        let level = median(actuals);
        level != 0.0 && population_std(recent) > level
    }

    fn thick_weights(&self, candidates: &[Candidate], n_models: usize) -> Option<Vec<f64>> {
        let histories = self.histories(candidates);
        let rmse: Vec<f64> = histories
            .iter()
            .map(|h| h.map_or(f64::INFINITY, |h| h.calculate_rmse(None)))
            .collect();

        let mut ranked: Vec<usize> = (0..rmse.len()).filter(|&i| rmse[i].is_finite()).collect();
        if ranked.is_empty() || n_models == 0 {
            return None;
        }
        ranked.sort_by(|&a, &b| rmse[a].total_cmp(&rmse[b]));
        ranked.truncate(n_models);

        let share = 1.0 / ranked.len() as f64;
        let mut weights = vec![0.0; candidates.len()];
        for i in ranked {
            weights[i] = share;
        }
        Some(weights)
    }

    fn regression_weights(
        &self,
        candidates: &[Candidate],
        window: usize,
        alpha: f64,
    ) -> Option<Vec<f64>> {
        if window == 0 {
            return None;
        }
        let histories = self
            .histories(candidates)
            .into_iter()
            .collect::<Option<Vec<_>>>()?;
        if histories.iter().any(|h| h.len() < window) {
            return None;
        }

        let actuals = latest(histories[0].actuals(), window);
        let rows: Vec<Vec<f64>> = (0..window)
            .map(|t| {
                histories
                    .iter()
                    .map(|h| latest(h.forecasts(), window)[t])
                    .collect()
            })
            .collect();

        let fit = least_squares(&rows, actuals, alpha)
            .map_err(|e| tracing::debug!(error = %e, "combination regression failed"))
            .ok()?;
        Some(fit.coefficients.iter().map(|c| c.max(0.0)).collect())
    }
}

fn metric<F>(histories: &[Option<&ForecastHistory>], missing: f64, f: F) -> Vec<f64>
where
    F: Fn(&ForecastHistory) -> f64,
{
    histories
        .iter()
        .map(|h| h.map_or(missing, |h| f(h)))
        .collect()
}

fn latest(values: &[f64], window: usize) -> &[f64] {
    &values[values.len() - window..]
}

/// Inverse of an error measure floored at [`MIN_ERROR`]; zero for `+inf`.
fn inverse_error(error: f64) -> f64 {
    if error.is_finite() {
        1.0 / error.max(MIN_ERROR)
    } else {
        0.0
    }
}

/// Scale non-negative finite weights to sum to one.
fn normalize(weights: Vec<f64>) -> Option<Vec<f64>> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return None;
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return None;
    }
    Some(weights.iter().map(|w| w / total).collect())
}

/// Replace non-finite values by the worst finite value plus a penalty.
fn replace_non_finite(values: Vec<f64>) -> Option<Vec<f64>> {
    let worst = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .reduce(f64::max)?;
    Some(
        values
            .into_iter()
            .map(|v| if v.is_finite() { v } else { worst + NON_FINITE_PENALTY })
            .collect(),
    )
}

/// Criterion scores made strictly positive for inversion.
///
/// Strictly positive inputs are returned unchanged; otherwise all scores
/// are shifted so the smallest becomes 1.
fn positive_scores(scores: Vec<f64>) -> Option<Vec<f64>> {
    let scores = replace_non_finite(scores)?;
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    if min > 0.0 {
        return Some(scores);
    }
    let shift = 1.0 - min;
    Some(scores.iter().map(|s| s + shift).collect())
}
