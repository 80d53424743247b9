//! Forecast-versus-actual records per indicator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Append-only `(forecast, actual, date)` records for one indicator.
///
/// The three sequences always have the same length; the only way to
/// extend them is [`update_forecast_history`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastHistory {
    indicator: String,
    forecasts: Vec<f64>,
    actuals: Vec<f64>,
    dates: Vec<NaiveDate>,
}

impl ForecastHistory {
    pub fn new(indicator: impl Into<String>) -> Self {
        Self {
            indicator: indicator.into(),
            forecasts: Vec::new(),
            actuals: Vec::new(),
            dates: Vec::new(),
        }
    }

    pub fn indicator(&self) -> &str {
        &self.indicator
    }

    pub fn forecasts(&self) -> &[f64] {
        &self.forecasts
    }

    pub fn actuals(&self) -> &[f64] {
        &self.actuals
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.forecasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forecasts.is_empty()
    }

    fn push(&mut self, forecast: f64, actual: f64, date: NaiveDate) {
        self.forecasts.push(forecast);
        self.actuals.push(actual);
        self.dates.push(date);
    }

    /// Errors of the last `window` records (all records for `None` or `Some(0)`).
    fn errors(&self, window: Option<usize>) -> Vec<f64> {
        let errors: Vec<f64> = self
            .forecasts
            .iter()
            .zip(self.actuals.iter())
            .map(|(f, a)| f - a)
            .collect();
        tail(errors, window)
    }

    /// Root mean squared error; `+inf` without records.
    pub fn calculate_rmse(&self, window: Option<usize>) -> f64 {
        let errors = self.errors(window);
        if errors.is_empty() {
            return f64::INFINITY;
        }
        (errors.iter().map(|e| e * e).sum::<f64>() / errors.len() as f64).sqrt()
    }

    /// Mean absolute error; `+inf` without records.
    pub fn calculate_mae(&self, window: Option<usize>) -> f64 {
        let errors = self.errors(window);
        if errors.is_empty() {
            return f64::INFINITY;
        }
        errors.iter().map(|e| e.abs()).sum::<f64>() / errors.len() as f64
    }

    /// Share of periods where forecast and actual moved in the same direction.
    ///
    /// A zero change on either side counts as a miss. Returns the neutral
    /// `0.5` with fewer than two records.
    pub fn calculate_directional_accuracy(&self, window: Option<usize>) -> f64 {
        if self.len() < 2 {
            return 0.5;
        }
        let hits: Vec<f64> = self
            .forecasts
            .windows(2)
            .zip(self.actuals.windows(2))
            .map(|(f, a)| {
                if (f[1] - f[0]) * (a[1] - a[0]) > 0.0 {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();
        let hits = tail(hits, window);
        if hits.is_empty() {
            return 0.5;
        }
        hits.iter().sum::<f64>() / hits.len() as f64
    }
}

fn tail(mut values: Vec<f64>, window: Option<usize>) -> Vec<f64> {
    match window {
        Some(w) if w > 0 && w < values.len() => values.split_off(values.len() - w),
        _ => values,
    }
}

/// Histories for every indicator seen so far, keyed by indicator id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryTable {
    entries: BTreeMap<String, ForecastHistory>,
}

impl HistoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, indicator: &str) -> Option<&ForecastHistory> {
        self.entries.get(indicator)
    }

    pub fn contains(&self, indicator: &str) -> bool {
        self.entries.contains_key(indicator)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ForecastHistory)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Append `(forecast, actual, date)` for each indicator in `new_forecasts`,
/// creating its history on first sight. Non-finite forecasts are skipped.
pub fn update_forecast_history<I, S>(
    history: &mut HistoryTable,
    new_forecasts: I,
    actual: f64,
    date: NaiveDate,
) where
    I: IntoIterator<Item = (S, f64)>,
    S: AsRef<str>,
{
    for (indicator, forecast) in new_forecasts {
        let indicator = indicator.as_ref();
        if !forecast.is_finite() {
            tracing::debug!(indicator, "skipping non-finite forecast in history update");
            continue;
        }
        history
            .entries
            .entry(indicator.to_string())
            .or_insert_with(|| ForecastHistory::new(indicator))
            .push(forecast, actual, date);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn history(forecasts: &[f64], actuals: &[f64]) -> ForecastHistory {
        let mut table = HistoryTable::new();
        for (i, (f, a)) in forecasts.iter().zip(actuals.iter()).enumerate() {
            update_forecast_history(&mut table, [("ind", *f)], *a, date(2020 + i as i32, 1, 1));
        }
        table.get("ind").cloned().unwrap_or_else(|| ForecastHistory::new("ind"))
    }

    #[test]
    fn rmse_of_small_history() {
        let h = history(&[1.0, 2.0, 3.0], &[1.0, 1.0, 4.0]);
        assert_relative_eq!(h.calculate_rmse(None), (2.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(h.calculate_mae(None), 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_history_metrics() {
        let h = ForecastHistory::new("x");
        assert!(h.calculate_rmse(None).is_infinite());
        assert!(h.calculate_mae(Some(3)).is_infinite());
        assert_eq!(h.calculate_directional_accuracy(None), 0.5);
    }

    #[test]
    fn windows_use_latest_records() {
        let h = history(&[10.0, 1.0, 2.0], &[0.0, 1.0, 3.0]);
        assert_relative_eq!(h.calculate_rmse(Some(2)), (0.5f64).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(h.calculate_rmse(Some(0)), h.calculate_rmse(None));
        assert_relative_eq!(h.calculate_rmse(Some(10)), h.calculate_rmse(None));
    }

    #[test]
    fn directional_accuracy_counts_ties_as_misses() {
        // moves: (+,+) hit, (0,+) miss, (-,-) hit
        let h = history(&[1.0, 2.0, 2.0, 1.0], &[1.0, 2.0, 3.0, 2.0]);
        assert_relative_eq!(h.calculate_directional_accuracy(None), 2.0 / 3.0);
        assert_relative_eq!(h.calculate_directional_accuracy(Some(1)), 1.0);
        assert_eq!(history(&[1.0], &[2.0]).calculate_directional_accuracy(None), 0.5);
    }

    #[test]
    fn update_creates_and_appends() {
        let mut table = HistoryTable::new();
        update_forecast_history(&mut table, [("a", 1.0), ("b", 2.0)], 1.5, date(2023, 4, 30));
        update_forecast_history(&mut table, vec![("a".to_string(), 1.2)], 1.1, date(2023, 7, 30));

        assert_eq!(table.len(), 2);
        let a = table.get("a").unwrap();
        assert_eq!(a.forecasts(), &[1.0, 1.2]);
        assert_eq!(a.actuals(), &[1.5, 1.1]);
        assert_eq!(a.dates().len(), a.len());
        assert_eq!(table.get("b").unwrap().len(), 1);
    }

    #[test]
    fn update_skips_nan_forecasts() {
        let mut table = HistoryTable::new();
        update_forecast_history(&mut table, [("a", f64::NAN)], 1.0, date(2023, 4, 30));
        assert!(table.is_empty());
    }
}
