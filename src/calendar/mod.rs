//! Release calendar: which indicators are published as of a reference date.
//!
//! Each indicator carries a [`ReleaseRule`]. A calendar answers, for any
//! reference date, which indicators already have the current month's value
//! out, and can lay out the release dates of a whole year.

mod rule;

pub use rule::{week_of_month, ReleaseRule, RuleSpec};

use crate::core::{first_of_month, Quarter};
use crate::error::Result;
use chrono::{NaiveDate, Weekday};
use std::collections::{BTreeMap, BTreeSet};

/// One scheduled publication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEvent {
    pub indicator: String,
    pub quarter: Quarter,
    pub release_date: NaiveDate,
}

/// Mapping from indicator id to its release rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReleaseCalendar {
    rules: BTreeMap<String, ReleaseRule>,
}

impl ReleaseCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw configuration entries, failing on the first malformed rule.
    pub fn from_specs<'a, I>(specs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a RuleSpec)>,
    {
        let mut calendar = Self::new();
        for (indicator, spec) in specs {
            let rule = ReleaseRule::from_spec(indicator, spec)?;
            calendar.insert(indicator.clone(), rule);
        }
        Ok(calendar)
    }

    /// Add a rule, builder style.
    pub fn with_rule(mut self, indicator: impl Into<String>, rule: ReleaseRule) -> Self {
        self.insert(indicator, rule);
        self
    }

    pub fn insert(&mut self, indicator: impl Into<String>, rule: ReleaseRule) {
        self.rules.insert(indicator.into(), rule);
    }

    /// Combine two calendars; rules in `other` replace rules with the same id.
    pub fn merge(mut self, other: ReleaseCalendar) -> Self {
        self.rules.extend(other.rules);
        self
    }

    pub fn rule(&self, indicator: &str) -> Option<&ReleaseRule> {
        self.rules.get(indicator)
    }

    pub fn indicators(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Indicators whose current-month value is published as of `reference_date`.
    pub fn available_indicators(&self, reference_date: NaiveDate) -> BTreeSet<String> {
        self.rules
            .iter()
            .filter(|(_, rule)| rule.is_available(reference_date))
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Release dates in the first month of each quarter of `year`.
    pub fn schedule(&self, year: i32) -> Vec<ReleaseEvent> {
        let mut events = Vec::new();
        for q in 1..=4 {
            let quarter = Quarter::from_date(first_of_month(year, (q - 1) * 3 + 1));
            let month = quarter.first_month();
            for (indicator, rule) in &self.rules {
                if let Some(day) = rule.release_day(year, month) {
                    if let Some(release_date) = NaiveDate::from_ymd_opt(year, month, day) {
                        events.push(ReleaseEvent {
                            indicator: indicator.clone(),
                            quarter,
                            release_date,
                        });
                    }
                }
            }
        }
        events.sort_by(|a, b| {
            a.release_date
                .cmp(&b.release_date)
                .then_with(|| a.indicator.cmp(&b.indicator))
        });
        events
    }

    /// Mexican monthly indicators (IGAE, PMIs and retail sales components).
    pub fn mexico() -> Self {
        let mut calendar = Self::new()
            .with_rule("EAI", ReleaseRule::Scheduled { week: 4, day: 22 })
            .with_rule("PMI_M", ReleaseRule::Scheduled { week: 1, day: 3 })
            .with_rule("PMI_NM", ReleaseRule::Scheduled { week: 1, day: 3 });
        for retail in [
            "RETSALES", "RETGRO", "RETSUP", "RETTEXT", "RETPERF", "RETFURN", "RETCAR",
        ] {
            calendar.insert(retail, ReleaseRule::Scheduled { week: 3, day: 21 });
        }
        calendar
    }

    /// US indicators, ids prefixed with `us_`.
    pub fn united_states() -> Self {
        Self::new()
            .with_rule("us_ism_manufacturing", ReleaseRule::Scheduled { week: 1, day: 1 })
            .with_rule("us_nonfarm_payrolls", ReleaseRule::Scheduled { week: 1, day: 5 })
            .with_rule("us_retail_sales", ReleaseRule::Scheduled { week: 2, day: 15 })
            .with_rule(
                "us_industrial_production",
                ReleaseRule::Scheduled { week: 2, day: 16 },
            )
            .with_rule("us_consumer_confidence", ReleaseRule::LastWeekday(Weekday::Tue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn mexico_availability_through_month() {
        let cal = ReleaseCalendar::mexico();

        assert!(cal.available_indicators(date(2023, 4, 1)).is_empty());

        let early = cal.available_indicators(date(2023, 4, 3));
        assert!(early.contains("PMI_M"));
        assert!(early.contains("PMI_NM"));
        assert!(!early.contains("RETSALES"));

        let late = cal.available_indicators(date(2023, 4, 22));
        assert_eq!(late.len(), cal.len());
    }

    #[test]
    fn us_last_tuesday_rule() {
        let cal = ReleaseCalendar::united_states();
        // last Tuesday of January 2024 is the 30th
        assert!(!cal
            .available_indicators(date(2024, 1, 29))
            .contains("us_consumer_confidence"));
        assert!(cal
            .available_indicators(date(2024, 1, 30))
            .contains("us_consumer_confidence"));
    }

    #[test]
    fn from_specs_propagates_configuration_error() {
        let mut specs = BTreeMap::new();
        specs.insert("ok".to_string(), RuleSpec::scheduled(1, 3));
        specs.insert("broken".to_string(), RuleSpec::default());
        assert!(ReleaseCalendar::from_specs(&specs).is_err());

        specs.remove("broken");
        let cal = ReleaseCalendar::from_specs(&specs).unwrap();
        assert_eq!(cal.len(), 1);
    }

    #[test]
    fn schedule_matches_availability() {
        let cal = ReleaseCalendar::mexico().merge(ReleaseCalendar::united_states());
        let events = cal.schedule(2023);
        assert_eq!(events.len(), cal.len() * 4);

        for event in &events {
            let available = cal.available_indicators(event.release_date);
            assert!(available.contains(&event.indicator), "{:?}", event);
            if let Some(before) = event.release_date.pred_opt() {
                if before >= event.quarter.start_date() {
                    assert!(!cal.available_indicators(before).contains(&event.indicator));
                }
            }
        }
    }

    #[test]
    fn schedule_is_chronological() {
        let events = ReleaseCalendar::mexico().schedule(2023);
        assert!(events.windows(2).all(|w| w[0].release_date <= w[1].release_date));
        assert_eq!(events[0].release_date, date(2023, 1, 3));
    }
}
