//! Quarterly target series keyed by calendar quarter.

use crate::core::quarter::Quarter;
use crate::error::{NowcastError, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// A quarterly series such as GDP growth, one value per quarter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuarterlySeries {
    values: BTreeMap<Quarter, f64>,
}

impl QuarterlySeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(date, value)` pairs; each date is mapped to its quarter.
    ///
    /// Non-finite values are skipped. Two values in the same quarter are rejected.
    pub fn from_pairs(pairs: &[(NaiveDate, f64)]) -> Result<Self> {
        let mut series = Self::new();
        for (date, value) in pairs {
            if !value.is_finite() {
                continue;
            }
            let quarter = Quarter::from_date(*date);
            if series.values.insert(quarter, *value).is_some() {
                return Err(NowcastError::InvalidParameter(format!(
                    "duplicate quarterly value for {}",
                    quarter
                )));
            }
        }
        Ok(series)
    }

    /// Build from consecutive values starting at `first`.
    pub fn from_values(first: Quarter, values: &[f64]) -> Self {
        Self {
            values: values
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_finite())
                .map(|(i, v)| (first.offset(i as i64), *v))
                .collect(),
        }
    }

    pub fn insert(&mut self, quarter: Quarter, value: f64) -> Option<f64> {
        self.values.insert(quarter, value)
    }

    pub fn get(&self, quarter: Quarter) -> Option<f64> {
        self.values.get(&quarter).copied()
    }

    pub fn contains(&self, quarter: Quarter) -> bool {
        self.values.contains_key(&quarter)
    }

    pub fn first_quarter(&self) -> Option<Quarter> {
        self.values.keys().next().copied()
    }

    pub fn last_quarter(&self) -> Option<Quarter> {
        self.values.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (Quarter, f64)> + '_ {
        self.values.iter().map(|(q, v)| (*q, *v))
    }

    /// Quarter-end index dates in chronological order.
    pub fn end_dates(&self) -> Vec<NaiveDate> {
        self.values.keys().map(|q| q.end_date()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn pairs_map_to_quarters() {
        let s = QuarterlySeries::from_pairs(&[
            (date(2022, 9, 30), 1.2),
            (date(2022, 12, 31), 0.8),
        ])
        .unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.get(Quarter::new(2022, 4).unwrap()), Some(0.8));
        assert_eq!(s.last_quarter(), Some(Quarter::new(2022, 4).unwrap()));
        assert_eq!(s.end_dates(), vec![date(2022, 9, 30), date(2022, 12, 31)]);
    }

    #[test]
    fn duplicate_quarter_rejected() {
        let result = QuarterlySeries::from_pairs(&[(date(2022, 8, 1), 1.0), (date(2022, 9, 30), 2.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn from_values_is_consecutive() {
        let s = QuarterlySeries::from_values(Quarter::new(2021, 3).unwrap(), &[1.0, f64::NAN, 3.0]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.get(Quarter::new(2022, 1).unwrap()), Some(3.0));
        assert!(!s.contains(Quarter::new(2021, 4).unwrap()));
    }
}
