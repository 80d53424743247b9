//! Lag-order selection for per-indicator U-MIDAS models.

use super::model::{information_criterion, LagOrder, MidasFit};
use crate::alignment::{AlignedPanel, TargetQuarter};
use crate::core::{MonthlySeries, Quarter, QuarterlySeries, MONTHS_PER_QUARTER};
use crate::error::{NowcastError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the lag grid search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MidasConfig {
    /// Largest number of quarterly target lags to consider.
    pub max_y_lags: usize,
    /// Largest number of additional monthly indicator lags to consider.
    pub max_x_lags: usize,
    /// High-frequency observations per low-frequency period. Quarters are
    /// calendar quarters, so only [`MONTHS_PER_QUARTER`] is accepted.
    pub frequency_ratio: usize,
    /// Floor applied to the sum of squared residuals inside the criterion.
    pub ssr_floor: f64,
}

impl Default for MidasConfig {
    fn default() -> Self {
        Self {
            max_y_lags: 4,
            max_x_lags: 6,
            frequency_ratio: MONTHS_PER_QUARTER as usize,
            ssr_floor: 1e-12,
        }
    }
}

impl MidasConfig {
    /// Set maximum lag orders.
    pub fn with_max_lags(mut self, max_y_lags: usize, max_x_lags: usize) -> Self {
        self.max_y_lags = max_y_lags;
        self.max_x_lags = max_x_lags;
        self
    }

    /// Reject settings the monthly-to-quarterly alignment cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.frequency_ratio != MONTHS_PER_QUARTER as usize {
            return Err(NowcastError::Configuration(format!(
                "model.frequency_ratio must be {} (months per calendar quarter), got {}",
                MONTHS_PER_QUARTER, self.frequency_ratio
            )));
        }
        if !(self.ssr_floor > 0.0 && self.ssr_floor.is_finite()) {
            return Err(NowcastError::Configuration(
                "model.ssr_floor must be a positive number".into(),
            ));
        }
        Ok(())
    }

    /// Candidate orders in `(y_lags, x_lags)` lexicographic order.
    pub fn candidate_orders(&self) -> Vec<LagOrder> {
        (0..=self.max_y_lags)
            .flat_map(|y| (0..=self.max_x_lags).map(move |x| LagOrder::new(y, x)))
            .collect()
    }
}

/// Outcome of fitting one indicator for one reference date.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult {
    pub indicator: String,
    pub order: LagOrder,
    /// Intercept first, then target lags, then monthly lags.
    pub coefficients: Vec<f64>,
    pub residuals: Vec<f64>,
    pub fitted: Vec<f64>,
    /// BIC-like score of the selected order; lower is better.
    pub criterion: f64,
    pub n_obs: usize,
    pub target: Quarter,
    pub month_in_quarter: u32,
    /// One-step-ahead value for the target quarter.
    pub forecast: f64,
    /// Target lags `y(T-1) .. y(T-p)` used for the forecast.
    y_lag_values: Vec<f64>,
}

impl FitResult {
    pub fn num_params(&self) -> usize {
        self.coefficients.len()
    }
}

/// Per-indicator mixed-frequency model with lag selection by information criterion.
#[derive(Debug, Clone)]
pub struct IndicatorModel {
    name: String,
    config: MidasConfig,
    selected: Option<FitResult>,
    model_scores: Vec<(LagOrder, f64)>,
}

impl IndicatorModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, MidasConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: MidasConfig) -> Self {
        Self {
            name: name.into(),
            config,
            selected: None,
            model_scores: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &MidasConfig {
        &self.config
    }

    /// Selected model after a successful [`fit`](Self::fit).
    pub fn selected(&self) -> Option<&FitResult> {
        self.selected.as_ref()
    }

    /// Criterion of every candidate that could be estimated.
    pub fn model_scores(&self) -> &[(LagOrder, f64)] {
        &self.model_scores
    }

    /// Grid-search all lag orders and keep the lowest criterion.
    ///
    /// Candidates that cannot be estimated are skipped. Ties keep the
    /// earlier order. Fails with [`NowcastError::NoModel`] when no candidate
    /// succeeds.
    pub fn fit(
        &mut self,
        x_monthly: &MonthlySeries,
        y_quarterly: &QuarterlySeries,
        target: TargetQuarter,
    ) -> Result<&FitResult> {
        self.selected = None;
        self.model_scores.clear();

        let panel = AlignedPanel::build(
            x_monthly,
            target.period(),
            target.month_in_quarter,
            self.config.frequency_ratio,
        )?;

        let candidates = self.config.candidate_orders();
        let mut best: Option<(MidasFit, f64)> = None;

        for order in &candidates {
            match self.score(&panel, y_quarterly, *order) {
                Ok((fit, score)) => {
                    self.model_scores.push((*order, score));
                    if best.as_ref().map_or(true, |(_, b)| score < *b) {
                        best = Some((fit, score));
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        indicator = %self.name,
                        order = %order,
                        error = %e,
                        "skipping lag combination"
                    );
                }
            }
        }

        let (fit, criterion) = best.ok_or_else(|| NowcastError::NoModel {
            indicator: self.name.clone(),
            tried: candidates.len(),
        })?;
        let forecast = fit.nowcast()?;
        let y_lags = fit.order.y_lags;

        let selected: &FitResult = self.selected.insert(FitResult {
            indicator: self.name.clone(),
            order: fit.order,
            n_obs: fit.sample.len(),
            criterion,
            forecast,
            target: target.period(),
            month_in_quarter: target.month_in_quarter,
            y_lag_values: fit.nowcast_row[1..=y_lags].to_vec(),
            coefficients: fit.least_squares.coefficients,
            residuals: fit.least_squares.residuals,
            fitted: fit.least_squares.fitted,
        });
        Ok(selected)
    }

    fn score(
        &self,
        panel: &AlignedPanel,
        y: &QuarterlySeries,
        order: LagOrder,
    ) -> Result<(MidasFit, f64)> {
        let fit = MidasFit::estimate(panel, y, order)?;
        let forecast = fit.nowcast()?;
        if !forecast.is_finite() {
            return Err(NowcastError::MissingPrediction(format!(
                "non-finite forecast at order {}",
                order
            )));
        }
        let score = information_criterion(
            fit.least_squares.ssr(),
            fit.residuals().len(),
            fit.num_params(),
            self.config.ssr_floor,
        );
        if !score.is_finite() {
            return Err(NowcastError::SingularMatrix);
        }
        Ok((fit, score))
    }

    /// In-sample fitted values followed by the target-quarter forecast built
    /// from the latest `month_in_quarter + 1` observed months of `x_monthly`.
    pub fn forecast_path(&self, x_monthly: &MonthlySeries, month_in_quarter: u32) -> Result<Vec<f64>> {
        let fit = self.selected.as_ref().ok_or_else(|| {
            NowcastError::MissingPrediction(format!("indicator {} has not been fitted", self.name))
        })?;
        if month_in_quarter != fit.month_in_quarter {
            return Err(NowcastError::InvalidParameter(format!(
                "model was fitted for month {} of the quarter, asked for month {}",
                fit.month_in_quarter, month_in_quarter
            )));
        }

        let panel = AlignedPanel::build(
            x_monthly,
            fit.target,
            month_in_quarter,
            self.config.frequency_ratio,
        )?;
        let monthly = panel.lagged(fit.target, fit.order.x_lags).ok_or_else(|| {
            NowcastError::MissingPrediction(format!(
                "indicator {} lacks the months needed for {}",
                self.name, fit.target
            ))
        })?;

        let nowcast: f64 = std::iter::once(1.0)
            .chain(fit.y_lag_values.iter().copied())
            .chain(monthly)
            .zip(fit.coefficients.iter())
            .map(|(r, c)| r * c)
            .sum();

        let mut path = fit.fitted.clone();
        path.push(nowcast);
        Ok(path)
    }

    /// Nowcast for the target quarter: the last element of the forecast path.
    pub fn predict(&self, x_monthly: &MonthlySeries, month_in_quarter: u32) -> Result<f64> {
        self.forecast_path(x_monthly, month_in_quarter)?
            .last()
            .copied()
            .ok_or_else(|| NowcastError::MissingPrediction("empty forecast path".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::target_quarter;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// 40 quarters of history, y driven by the first month of each quarter
    /// plus its own lag, and one observed month of 2020Q1.
    fn ar_x_data() -> (MonthlySeries, QuarterlySeries) {
        let months = 40 * 3 + 1;
        let x: Vec<f64> = (0..months)
            .map(|i| (i as f64 * 0.45).sin() * 2.0 + (i as f64 * 0.13).cos())
            .collect();
        let mut y = Vec::with_capacity(40);
        let mut prev = 0.0;
        for t in 0..40 {
            let value = 0.3 + 0.4 * prev + 1.5 * x[3 * t] + 0.01 * ((t * 7 % 5) as f64 - 2.0);
            y.push(value);
            prev = value;
        }
        (
            MonthlySeries::new(date(2010, 1, 1), x),
            QuarterlySeries::from_values(Quarter::new(2010, 1).unwrap(), &y),
        )
    }

    #[test]
    fn grid_search_selects_minimum_criterion() {
        let (x, y) = ar_x_data();
        let target = target_quarter(date(2020, 1, 20));
        let mut model = IndicatorModel::with_config("ip", MidasConfig::default().with_max_lags(2, 2));

        let fit = model.fit(&x, &y, target).unwrap().clone();
        let min = model
            .model_scores()
            .iter()
            .map(|(_, s)| *s)
            .fold(f64::INFINITY, f64::min);

        assert_eq!(fit.criterion, min);
        assert_eq!(model.model_scores().len(), 9);
        assert_eq!(fit.target, Quarter::new(2020, 1).unwrap());
        assert!(fit.forecast.is_finite());
        assert_eq!(fit.num_params(), fit.order.num_params());
    }

    #[test]
    fn predict_matches_fit_forecast() {
        let (x, y) = ar_x_data();
        let target = target_quarter(date(2020, 1, 20));
        let mut model = IndicatorModel::with_config("ip", MidasConfig::default().with_max_lags(2, 2));
        let forecast = model.fit(&x, &y, target).unwrap().forecast;

        let predicted = model.predict(&x, 0).unwrap();
        assert_relative_eq!(predicted, forecast, epsilon = 1e-10);

        let path = model.forecast_path(&x, 0).unwrap();
        assert_eq!(path.len(), model.selected().unwrap().n_obs + 1);
        assert!(model.predict(&x, 1).is_err());
    }

    #[test]
    fn fit_is_deterministic() {
        let (x, y) = ar_x_data();
        let target = target_quarter(date(2020, 1, 20));
        let mut a = IndicatorModel::new("ip");
        let mut b = IndicatorModel::new("ip");
        let first = a.fit(&x, &y, target).unwrap().clone();
        let second = b.fit(&x, &y, target).unwrap().clone();
        assert_eq!(first, second);

        let again = a.fit(&x, &y, target).unwrap().clone();
        assert_eq!(first, again);
    }

    #[test]
    fn single_observation_reports_no_model() {
        let x = MonthlySeries::new(date(2020, 1, 1), vec![1.2]);
        let y = QuarterlySeries::from_values(Quarter::new(2018, 1).unwrap(), &[0.5, 0.6, 0.7, 0.4, 0.3, 0.2, 0.9, 1.0]);
        let mut model = IndicatorModel::with_config("new", MidasConfig::default().with_max_lags(1, 1));

        let err = model.fit(&x, &y, target_quarter(date(2020, 1, 1))).unwrap_err();
        assert!(matches!(err, NowcastError::NoModel { tried: 4, .. }));
        assert!(model.selected().is_none());
        assert!(model.predict(&x, 0).is_err());
    }

    #[test]
    fn candidate_orders_are_lexicographic() {
        let orders = MidasConfig::default().with_max_lags(1, 2).candidate_orders();
        assert_eq!(orders.len(), 6);
        assert_eq!(orders[0], LagOrder::new(0, 0));
        assert_eq!(orders[2], LagOrder::new(0, 2));
        assert_eq!(orders[3], LagOrder::new(1, 0));
    }
}
