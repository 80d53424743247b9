//! Per-indicator publication rules.

use crate::core::days_in_month;
use crate::error::{NowcastError, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Deserialize;
use std::fmt;

/// When an indicator's latest monthly value is published within a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseRule {
    /// Published in week `week` (1..=5) of the month, on or after day `day`.
    ///
    /// Weeks are counted from the first of the month in blocks of seven
    /// days, so week 2 covers days 8 to 14.
    Scheduled { week: u32, day: u32 },
    /// Published on the last given weekday of the month.
    LastWeekday(Weekday),
}

/// Raw, unvalidated rule as it appears in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    #[serde(default)]
    pub week: Option<u32>,
    #[serde(default)]
    pub day: Option<u32>,
    /// Relative rule such as `"last tuesday"`.
    #[serde(default)]
    pub relative: Option<String>,
}

impl RuleSpec {
    pub fn scheduled(week: u32, day: u32) -> Self {
        Self {
            week: Some(week),
            day: Some(day),
            relative: None,
        }
    }

    pub fn relative(pattern: &str) -> Self {
        Self {
            week: None,
            day: None,
            relative: Some(pattern.to_string()),
        }
    }
}

/// Week of the month for a date: days 1-7 are week 1, 8-14 week 2, and so on.
pub fn week_of_month(date: NaiveDate) -> u32 {
    (date.day() - 1) / 7 + 1
}

impl ReleaseRule {
    /// Validate a configured rule for `indicator`.
    ///
    /// Exactly one of the explicit `week`/`day` pair or the `relative`
    /// pattern must be given.
    pub fn from_spec(indicator: &str, spec: &RuleSpec) -> Result<Self> {
        match (spec.week, spec.day, spec.relative.as_deref()) {
            (Some(week), Some(day), None) => Self::scheduled(week, day).map_err(|e| {
                NowcastError::Configuration(format!("indicator {}: {}", indicator, e))
            }),
            (None, None, Some(pattern)) => Self::parse_relative(pattern).ok_or_else(|| {
                NowcastError::Configuration(format!(
                    "indicator {}: unrecognized relative release rule '{}'",
                    indicator, pattern
                ))
            }),
            (None, None, None) => Err(NowcastError::Configuration(format!(
                "indicator {}: release rule needs a week/day pair or a relative pattern",
                indicator
            ))),
            (_, _, Some(_)) => Err(NowcastError::Configuration(format!(
                "indicator {}: release rule mixes a week/day pair with a relative pattern",
                indicator
            ))),
            _ => Err(NowcastError::Configuration(format!(
                "indicator {}: release rule needs both week and day",
                indicator
            ))),
        }
    }

    /// Explicit week/day rule with range checks.
    pub fn scheduled(week: u32, day: u32) -> Result<Self> {
        if !(1..=5).contains(&week) {
            return Err(NowcastError::Configuration(format!(
                "release week must be in 1..=5, got {}",
                week
            )));
        }
        if !(1..=31).contains(&day) {
            return Err(NowcastError::Configuration(format!(
                "release day must be in 1..=31, got {}",
                day
            )));
        }
        Ok(ReleaseRule::Scheduled { week, day })
    }

    /// Parse `"last <weekday>"`, case-insensitive.
    fn parse_relative(pattern: &str) -> Option<Self> {
        let lower = pattern.trim().to_ascii_lowercase();
        let mut words = lower.split_whitespace();
        match (words.next(), words.next(), words.next()) {
            (Some("last"), Some(day), None) => day.parse::<Weekday>().ok().map(ReleaseRule::LastWeekday),
            _ => None,
        }
    }

    /// Whether the month's value has been published as of `reference_date`.
    pub fn is_available(&self, reference_date: NaiveDate) -> bool {
        match *self {
            ReleaseRule::Scheduled { week, day } => {
                let current = week_of_month(reference_date);
                current > week || (current == week && reference_date.day() >= day)
            }
            ReleaseRule::LastWeekday(weekday) => {
                let release = last_weekday_of_month(reference_date.year(), reference_date.month(), weekday);
                reference_date.day() >= release
            }
        }
    }

    /// First day of the month on which the rule is satisfied.
    ///
    /// `None` when the month ends before the rule can be met (week 5 in a
    /// short month).
    pub fn release_day(&self, year: i32, month: u32) -> Option<u32> {
        let month_len = days_in_month(year, month);
        let day = match *self {
            ReleaseRule::Scheduled { week, day } => {
                let week_start = (week - 1) * 7 + 1;
                let week_end = week * 7;
                if day <= week_start {
                    week_start
                } else if day <= week_end {
                    day
                } else {
                    week_end + 1
                }
            }
            ReleaseRule::LastWeekday(weekday) => last_weekday_of_month(year, month, weekday),
        };
        (day <= month_len).then_some(day)
    }
}

impl fmt::Display for ReleaseRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseRule::Scheduled { week, day } => write!(f, "week {} day {}", week, day),
            ReleaseRule::LastWeekday(weekday) => write!(f, "last {}", weekday),
        }
    }
}

/// Scan back from month end for the last date falling on `weekday`.
fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> u32 {
    let last = days_in_month(year, month);
    (0..7)
        .map(|offset| last - offset)
        .find(|&day| {
            NaiveDate::from_ymd_opt(year, month, day)
                .map(|d| d.weekday() == weekday)
                .unwrap_or(false)
        })
        .unwrap_or(last)
}
