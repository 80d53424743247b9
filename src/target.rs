//! Quarterly target with provisional substitution for an unreleased quarter.

use crate::alignment::target_quarter;
use crate::core::{Quarter, QuarterlySeries};
use chrono::{Datelike, NaiveDate};

/// Day of the quarter's first month by which the previous quarter's GDP is
/// assumed to be published.
pub const DEFAULT_RELEASE_DAY: u32 = 25;

/// Historical target values plus an optional stand-in for the latest quarter.
#[derive(Debug, Clone, PartialEq)]
pub struct QuarterlyTarget {
    history: QuarterlySeries,
    last_forecast: Option<f64>,
    release_day: u32,
}

impl QuarterlyTarget {
    pub fn new(history: QuarterlySeries) -> Self {
        Self {
            history,
            last_forecast: None,
            release_day: DEFAULT_RELEASE_DAY,
        }
    }

    /// Provisional value for the quarter before the reference quarter.
    pub fn with_last_forecast(mut self, value: f64) -> Self {
        self.last_forecast = Some(value);
        self
    }

    /// Override the assumed release day (default 25).
    pub fn with_release_day(mut self, day: u32) -> Self {
        self.release_day = day;
        self
    }

    pub fn history(&self) -> &QuarterlySeries {
        &self.history
    }

    pub fn last_forecast(&self) -> Option<f64> {
        self.last_forecast
    }

    pub fn release_day(&self) -> u32 {
        self.release_day
    }

    /// Append a newly published true value.
    pub fn record(&mut self, quarter: Quarter, value: f64) {
        self.history.insert(quarter, value);
    }

    /// Quarter that would receive the provisional value at `reference_date`, if any.
    ///
    /// Substitution applies only in the first month of a quarter before the
    /// release day, when a provisional value was supplied and the history
    /// does not reach the previous quarter yet.
    pub fn provisional_quarter(&self, reference_date: NaiveDate) -> Option<Quarter> {
        self.last_forecast?;
        let last = self.history.last_quarter()?;
        let position = target_quarter(reference_date);
        let previous = position.period().prev();

        let in_release_window =
            position.month_in_quarter == 0 && reference_date.day() < self.release_day;
        (in_release_window && last < previous).then_some(previous)
    }

    /// Target series as seen on `reference_date`, with the provisional value
    /// appended at the previous quarter's end date when it applies.
    pub fn get_gdp_series(&self, reference_date: NaiveDate) -> QuarterlySeries {
        let mut series = self.history.clone();
        if let (Some(quarter), Some(value)) =
            (self.provisional_quarter(reference_date), self.last_forecast)
        {
            tracing::debug!(
                quarter = %quarter,
                value,
                "using provisional value for unreleased quarter"
            );
            series.insert(quarter, value);
        }
        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn history_through(last: Quarter) -> QuarterlySeries {
        let first = last.offset(-7);
        QuarterlySeries::from_values(first, &[0.5, 0.7, 0.2, 0.9, 1.1, 0.4, 0.6, 0.8])
    }

    #[test]
    fn provisional_value_appended_before_release() {
        let q3 = Quarter::new(2022, 3).unwrap();
        let target = QuarterlyTarget::new(history_through(q3)).with_last_forecast(2.1);

        let series = target.get_gdp_series(date(2023, 1, 15));
        let q4 = Quarter::new(2022, 4).unwrap();
        assert_eq!(series.get(q4), Some(2.1));
        assert_eq!(series.last_quarter(), Some(q4));
        assert_eq!(series.end_dates().last(), Some(&date(2022, 12, 31)));
    }

    #[test]
    fn no_substitution_after_release_day() {
        let q3 = Quarter::new(2022, 3).unwrap();
        let target = QuarterlyTarget::new(history_through(q3)).with_last_forecast(2.1);
        assert_eq!(target.get_gdp_series(date(2023, 1, 25)).len(), 8);
        assert_eq!(target.get_gdp_series(date(2023, 2, 10)).len(), 8);
    }

    #[test]
    fn no_substitution_when_previous_quarter_known() {
        let q4 = Quarter::new(2022, 4).unwrap();
        let target = QuarterlyTarget::new(history_through(q4)).with_last_forecast(2.1);
        let series = target.get_gdp_series(date(2023, 1, 10));
        assert_eq!(series.get(q4), Some(0.8));
        assert!(target.provisional_quarter(date(2023, 1, 10)).is_none());
    }

    #[test]
    fn no_substitution_without_forecast() {
        let q3 = Quarter::new(2022, 3).unwrap();
        let target = QuarterlyTarget::new(history_through(q3));
        assert_eq!(target.get_gdp_series(date(2023, 1, 15)).len(), 8);
    }

    #[test]
    fn release_day_is_overridable() {
        let q3 = Quarter::new(2022, 3).unwrap();
        let target = QuarterlyTarget::new(history_through(q3))
            .with_last_forecast(2.1)
            .with_release_day(10);
        assert!(target.provisional_quarter(date(2023, 1, 12)).is_none());
        assert!(target.provisional_quarter(date(2023, 1, 9)).is_some());
    }
}
