//! Calendar quarter and month arithmetic.

use crate::error::{NowcastError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Months per quarter.
pub const MONTHS_PER_QUARTER: u32 = 3;

/// A calendar quarter, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quarter {
    year: i32,
    quarter: u32,
}

impl Quarter {
    /// Create a quarter, validating `quarter` in 1..=4.
    pub fn new(year: i32, quarter: u32) -> Result<Self> {
        if !(1..=4).contains(&quarter) {
            return Err(NowcastError::InvalidParameter(format!(
                "quarter must be in 1..=4, got {}",
                quarter
            )));
        }
        Ok(Self { year, quarter })
    }

    /// The quarter containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            quarter: (date.month() - 1) / MONTHS_PER_QUARTER + 1,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn quarter(&self) -> u32 {
        self.quarter
    }

    /// Calendar month (1..=12) opening the quarter.
    pub fn first_month(&self) -> u32 {
        (self.quarter - 1) * MONTHS_PER_QUARTER + 1
    }

    /// First day of the quarter.
    pub fn start_date(&self) -> NaiveDate {
        first_of_month(self.year, self.first_month())
    }

    /// Last day of the quarter, the index date used for quarterly series.
    pub fn end_date(&self) -> NaiveDate {
        let next = self.next().start_date();
        next.pred_opt().unwrap_or(next)
    }

    /// Shift by `n` quarters (negative shifts go back in time).
    pub fn offset(self, n: i64) -> Self {
        let index = self.year as i64 * 4 + (self.quarter as i64 - 1) + n;
        Self {
            year: index.div_euclid(4) as i32,
            quarter: index.rem_euclid(4) as u32 + 1,
        }
    }

    pub fn prev(self) -> Self {
        self.offset(-1)
    }

    pub fn next(self) -> Self {
        self.offset(1)
    }

    /// Number of quarters from `self` to `other` (positive when `other` is later).
    pub fn distance_to(&self, other: &Quarter) -> i64 {
        (other.year as i64 * 4 + other.quarter as i64) - (self.year as i64 * 4 + self.quarter as i64)
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

/// First day of the given calendar month.
pub(crate) fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

/// Months elapsed since year 0, used for contiguous monthly indexing.
pub(crate) fn month_index(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

/// Inverse of [`month_index`]: first day of the indexed month.
pub(crate) fn month_from_index(index: i64) -> NaiveDate {
    first_of_month(index.div_euclid(12) as i32, index.rem_euclid(12) as u32 + 1)
}

/// Number of days in the month containing `date`.
pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    let next = month_from_index(month_index(first_of_month(year, month)) + 1);
    next.pred_opt().map(|d| d.day()).unwrap_or(28)
}
