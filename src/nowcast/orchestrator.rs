//! One-reference-date nowcast pipeline.

use super::report::{
    AlternativeForecast, DroppedIndicator, IndicatorContribution, NowcastReport, NowcastStatus,
};
use crate::alignment::{target_quarter, TargetQuarter};
use crate::calendar::ReleaseCalendar;
use crate::combination::{
    update_forecast_history, Candidate, CombinationStrategy, ForecastCombiner, HistoryTable,
};
use crate::config::NowcastConfig;
use crate::core::{first_of_month, MonthlySeries, Quarter, QuarterlySeries};
use crate::error::{NowcastError, Result};
use crate::models::{midas_factory, BoxedForecaster, LagOrder, MidasConfig, ModelFactory};
use crate::target::QuarterlyTarget;
use crate::transform::Transformation;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Drives calendar lookup, per-indicator fits and combination.
///
/// Owns the forecast history used by the history-based strategies; it only
/// grows through [`record_actual`](Self::record_actual) and
/// [`record_report`](Self::record_report).
pub struct Nowcaster {
    calendar: ReleaseCalendar,
    target: QuarterlyTarget,
    indicators: BTreeMap<String, MonthlySeries>,
    transformations: BTreeMap<String, Transformation>,
    models: BTreeMap<String, BoxedForecaster>,
    factory: ModelFactory,
    model_config: MidasConfig,
    primary: CombinationStrategy,
    alternatives: Vec<CombinationStrategy>,
    history: HistoryTable,
}

struct Fitted {
    indicator: String,
    forecast: f64,
    criterion: f64,
    order: LagOrder,
    n_obs: usize,
}

impl Nowcaster {
    pub fn new(calendar: ReleaseCalendar, target: QuarterlyTarget) -> Self {
        Self {
            calendar,
            target,
            indicators: BTreeMap::new(),
            transformations: BTreeMap::new(),
            models: BTreeMap::new(),
            factory: midas_factory,
            model_config: MidasConfig::default(),
            primary: CombinationStrategy::default(),
            alternatives: Vec::new(),
            history: HistoryTable::new(),
        }
    }

    /// Build from a validated configuration and the target history.
    pub fn from_config(config: &NowcastConfig, target_history: QuarterlySeries) -> Result<Self> {
        config.validate()?;
        let mut target = QuarterlyTarget::new(target_history)
            .with_release_day(config.target.provisional_release_day);
        if let Some(v) = config.target.last_forecast {
            target = target.with_last_forecast(v);
        }

        let mut nowcaster = Self::new(config.calendar()?, target)
            .with_model_config(config.model.clone())
            .with_strategy(config.combination.primary)
            .with_alternatives(config.combination.alternatives.clone());
        nowcaster.transformations = config.transformations.clone();
        Ok(nowcaster)
    }

    pub fn with_model_config(mut self, config: MidasConfig) -> Self {
        self.model_config = config;
        self.models.clear();
        self
    }

    /// Strategy for the published combined forecast.
    pub fn with_strategy(mut self, strategy: CombinationStrategy) -> Self {
        self.primary = strategy;
        self
    }

    /// Strategies reported next to the primary one.
    pub fn with_alternatives(mut self, strategies: Vec<CombinationStrategy>) -> Self {
        self.alternatives = strategies;
        self
    }

    /// Replace the model used for every indicator.
    pub fn with_factory(mut self, factory: ModelFactory) -> Self {
        self.factory = factory;
        self.models.clear();
        self
    }

    /// Start from previously recorded forecast performance.
    pub fn with_history(mut self, history: HistoryTable) -> Self {
        self.history = history;
        self
    }

    /// Register or replace an indicator's monthly data, applying its
    /// configured transformation.
    pub fn add_indicator(&mut self, indicator: impl Into<String>, series: MonthlySeries) {
        let indicator = indicator.into();
        let series = match self.transformations.get(&indicator) {
            Some(t) => t.apply_monthly(&series),
            None => series,
        };
        self.indicators.insert(indicator, series);
    }

    pub fn set_transformation(&mut self, indicator: impl Into<String>, t: Transformation) {
        self.transformations.insert(indicator.into(), t);
    }

    pub fn calendar(&self) -> &ReleaseCalendar {
        &self.calendar
    }

    pub fn target(&self) -> &QuarterlyTarget {
        &self.target
    }

    pub fn history(&self) -> &HistoryTable {
        &self.history
    }

    pub fn indicator(&self, id: &str) -> Option<&MonthlySeries> {
        self.indicators.get(id)
    }

    /// Model kept from an indicator's most recent fit.
    pub fn model(&self, id: &str) -> Option<&BoxedForecaster> {
        self.models.get(id)
    }

    /// Append a newly published quarterly target value.
    pub fn record_target(&mut self, quarter: Quarter, value: f64) {
        self.target.record(quarter, value);
    }

    /// Record the published actual against each indicator's forecast.
    pub fn record_actual<S: AsRef<str>>(
        &mut self,
        indicators: &[S],
        forecasts: &[f64],
        actual: f64,
        date: NaiveDate,
    ) -> Result<()> {
        if indicators.len() != forecasts.len() {
            return Err(NowcastError::DimensionMismatch {
                expected: indicators.len(),
                got: forecasts.len(),
            });
        }
        update_forecast_history(
            &mut self.history,
            indicators.iter().zip(forecasts.iter().copied()),
            actual,
            date,
        );
        Ok(())
    }

    /// Record the published actual against every contribution of `report`.
    pub fn record_report(&mut self, report: &NowcastReport, actual: f64, date: NaiveDate) {
        update_forecast_history(&mut self.history, report.forecasts(), actual, date);
    }

    /// Nowcast the quarter containing `reference_date`.
    ///
    /// Per-indicator failures drop that indicator; the run only fails on
    /// missing target data or invalid model settings.
    pub fn run(&mut self, reference_date: NaiveDate) -> Result<NowcastReport> {
        self.model_config.validate()?;
        if self.target.history().is_empty() {
            return Err(NowcastError::MissingInput(
                "quarterly target series is empty".into(),
            ));
        }

        let position = target_quarter(reference_date);
        tracing::info!(
            reference_date = %reference_date,
            target = %position.period(),
            month_in_quarter = position.month_in_quarter,
            "starting nowcast run"
        );

        let available = self.calendar.available_indicators(reference_date);
        let y = self.target.get_gdp_series(reference_date);
        let vintage_end = first_of_month(reference_date.year(), reference_date.month());

        let mut fitted = Vec::new();
        let mut dropped = Vec::new();
        for id in &available {
            let Some(series) = self.indicators.get(id) else {
                tracing::warn!(indicator = %id, "available indicator has no data");
                dropped.push(DroppedIndicator {
                    indicator: id.clone(),
                    reason: "no data".into(),
                });
                continue;
            };
            let x = series.up_to(vintage_end);
            if x.observed_count() == 0 {
                tracing::warn!(indicator = %id, "available indicator has no observations yet");
                dropped.push(DroppedIndicator {
                    indicator: id.clone(),
                    reason: "no observations before the reference date".into(),
                });
                continue;
            }

            let factory = self.factory;
            let config = &self.model_config;
            let model = self
                .models
                .entry(id.clone())
                .or_insert_with(|| factory(id, config));

            match fit_indicator(model, &x, &y, position) {
                Ok(f) => fitted.push(f),
                Err(e) if e.is_recoverable() => {
                    if matches!(e, NowcastError::NoModel { .. }) {
                        tracing::info!(indicator = %id, "no model for indicator");
                    } else {
                        tracing::debug!(indicator = %id, error = %e, "indicator dropped");
                    }
                    dropped.push(DroppedIndicator {
                        indicator: id.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let candidates: Vec<Candidate> = fitted
            .iter()
            .map(|f| Candidate::new(f.indicator.clone(), f.forecast, f.criterion))
            .collect();
        let combiner = ForecastCombiner::new(&self.history);
        let weights = combiner.weights(self.primary, &candidates);
        let combined_forecast = weights.apply(&candidates);

        let alternatives = self
            .alternatives
            .iter()
            .filter(|s| **s != self.primary)
            .map(|&strategy| {
                let w = combiner.weights(strategy, &candidates);
                AlternativeForecast {
                    strategy,
                    forecast: w.apply(&candidates),
                    fallback: w.is_fallback(),
                }
            })
            .collect();

        let per_indicator = fitted
            .into_iter()
            .map(|f| IndicatorContribution {
                weight: weights.get(&f.indicator).unwrap_or(0.0),
                indicator: f.indicator,
                forecast: f.forecast,
                criterion_score: f.criterion,
                order: f.order,
                n_obs: f.n_obs,
            })
            .collect();

        let status = match combined_forecast {
            Some(value) => {
                tracing::info!(
                    strategy = %self.primary,
                    indicators = candidates.len(),
                    value,
                    "combined nowcast"
                );
                NowcastStatus::Success
            }
            None => {
                tracing::info!(reference_date = %reference_date, "no forecast available");
                NowcastStatus::NoForecast
            }
        };

        Ok(NowcastReport {
            status,
            reference_date,
            target_quarter: position.quarter,
            target_year: position.year,
            month_in_quarter: position.month_in_quarter,
            quarter_progress_pct: position.progress_pct(),
            available_indicators: available.into_iter().collect(),
            combined_forecast,
            strategy: self.primary,
            weights_fallback: weights.is_fallback(),
            per_indicator,
            alternatives,
            dropped,
            provisional_quarter: self.target.provisional_quarter(reference_date),
        })
    }
}

fn fit_indicator(
    model: &mut BoxedForecaster,
    x: &MonthlySeries,
    y: &QuarterlySeries,
    position: TargetQuarter,
) -> Result<Fitted> {
    let (criterion, order, n_obs) = {
        let fit = model.fit(x, y, position)?;
        (fit.criterion, fit.order, fit.n_obs)
    };
    let forecast = model.predict(x, position.month_in_quarter)?;
    if !forecast.is_finite() {
        return Err(NowcastError::MissingPrediction(format!(
            "non-finite forecast for {}",
            model.name()
        )));
    }
    Ok(Fitted {
        indicator: model.name().to_string(),
        forecast,
        criterion,
        order,
        n_obs,
    })
}
