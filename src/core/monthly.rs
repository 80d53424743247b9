//! Monthly indicator series with explicit missing-value states.

use crate::core::quarter::{first_of_month, month_from_index, month_index};
use crate::error::{NowcastError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One monthly slot of an indicator.
///
/// `Absent` is a month the source recorded as missing; `Pending` is a month
/// of the target quarter that has not been published yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Observation {
    Value(f64),
    Absent,
    Pending,
}

impl Observation {
    /// Wrap a raw value, treating NaN and infinities as recorded-absent.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Observation::Value(value)
        } else {
            Observation::Absent
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Observation::Value(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_observed(&self) -> bool {
        matches!(self, Observation::Value(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Observation::Pending)
    }
}

/// A contiguous monthly series indexed by the first day of each month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeries {
    start: NaiveDate,
    observations: Vec<Observation>,
}

impl MonthlySeries {
    /// Create a series starting at the month containing `start`.
    pub fn new(start: NaiveDate, values: Vec<f64>) -> Self {
        Self {
            start: first_of_month(start.year(), start.month()),
            observations: values.into_iter().map(Observation::from_f64).collect(),
        }
    }

    /// Create a series from explicit observations.
    pub fn with_observations(start: NaiveDate, observations: Vec<Observation>) -> Self {
        Self {
            start: first_of_month(start.year(), start.month()),
            observations,
        }
    }

    /// Build from `(month, value)` pairs in strictly increasing month order.
    ///
    /// Months skipped between two pairs are filled with [`Observation::Absent`].
    pub fn from_pairs(pairs: &[(NaiveDate, f64)]) -> Result<Self> {
        let (first, _) = pairs.first().ok_or(NowcastError::EmptyData)?;
        let base = month_index(*first);
        let mut observations = Vec::with_capacity(pairs.len());

        for (date, value) in pairs {
            let offset = month_index(*date) - base;
            if offset < observations.len() as i64 {
                return Err(NowcastError::InvalidParameter(format!(
                    "monthly observations must be strictly increasing, found {} out of order",
                    date
                )));
            }
            while (observations.len() as i64) < offset {
                observations.push(Observation::Absent);
            }
            observations.push(Observation::from_f64(*value));
        }

        Ok(Self::with_observations(*first, observations))
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// First month of the series.
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Month of the `i`-th slot.
    pub fn month_at(&self, i: usize) -> NaiveDate {
        month_from_index(month_index(self.start) + i as i64)
    }

    /// Month of the final slot, observed or not.
    pub fn last_month(&self) -> Option<NaiveDate> {
        if self.is_empty() {
            None
        } else {
            Some(self.month_at(self.len() - 1))
        }
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Most recent observed value and its month.
    pub fn last_observed(&self) -> Option<(NaiveDate, f64)> {
        self.observations
            .iter()
            .enumerate()
            .rev()
            .find_map(|(i, o)| o.value().map(|v| (self.month_at(i), v)))
    }

    /// Count of observed (non-missing) months.
    pub fn observed_count(&self) -> usize {
        self.observations.iter().filter(|o| o.is_observed()).count()
    }

    /// Observation for a given month, if the month is covered.
    pub fn get(&self, month: NaiveDate) -> Option<Observation> {
        let offset = month_index(month) - month_index(self.start);
        if offset < 0 {
            return None;
        }
        self.observations.get(offset as usize).copied()
    }

    /// Append the next month's value.
    pub fn push(&mut self, value: f64) {
        self.observations.push(Observation::from_f64(value));
    }

    /// Append `n` months that are not yet observed.
    pub(crate) fn push_pending(&mut self, n: usize) {
        self.observations
            .extend(std::iter::repeat(Observation::Pending).take(n));
    }

    /// The vintage of the series whose last month is `month` (inclusive).
    pub fn up_to(&self, month: NaiveDate) -> MonthlySeries {
        let keep = (month_index(month) - month_index(self.start) + 1).max(0) as usize;
        Self {
            start: self.start,
            observations: self.observations.iter().take(keep).copied().collect(),
        }
    }

    /// Apply `f` to observed values, leaving missing slots untouched.
    pub fn map_values<F>(&self, f: F) -> MonthlySeries
    where
        F: Fn(f64) -> f64,
    {
        Self {
            start: self.start,
            observations: self
                .observations
                .iter()
                .map(|o| match o {
                    Observation::Value(v) => Observation::from_f64(f(*v)),
                    other => *other,
                })
                .collect(),
        }
    }
}
