//! TOML configuration for a nowcasting setup.

use crate::calendar::{ReleaseCalendar, RuleSpec};
use crate::combination::CombinationStrategy;
use crate::error::{NowcastError, Result};
use crate::models::MidasConfig;
use crate::target::DEFAULT_RELEASE_DAY;
use crate::transform::Transformation;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Complete configuration: model grid, target handling, combination and calendar.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NowcastConfig {
    pub model: MidasConfig,
    pub target: TargetConfig,
    pub combination: CombinationConfig,
    pub calendar: CalendarConfig,
    /// Release rule per indicator id.
    pub indicators: BTreeMap<String, RuleSpec>,
    /// Transformation applied to an indicator when it is added.
    pub transformations: BTreeMap<String, Transformation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TargetConfig {
    /// Day of a quarter's first month by which the previous quarter is published.
    pub provisional_release_day: u32,
    /// Stand-in for the latest quarter while its release is outstanding.
    pub last_forecast: Option<f64>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            provisional_release_day: DEFAULT_RELEASE_DAY,
            last_forecast: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CombinationConfig {
    /// Strategy producing the published nowcast.
    pub primary: CombinationStrategy,
    /// Strategies reported side by side with the primary one.
    pub alternatives: Vec<CombinationStrategy>,
}

/// Built-in release calendars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarPreset {
    Mexico,
    UnitedStates,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalendarConfig {
    /// Preset whose rules are loaded before `[indicators]`.
    pub preset: Option<CalendarPreset>,
}

impl NowcastConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: NowcastConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading nowcast configuration");
        Self::from_toml_str(&text)
    }

    /// Check value ranges and that every release rule is well formed.
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        if !(1..=31).contains(&self.target.provisional_release_day) {
            return Err(NowcastError::Configuration(format!(
                "target.provisional_release_day must be within 1..=31, got {}",
                self.target.provisional_release_day
            )));
        }
        if let Some(v) = self.target.last_forecast {
            if !v.is_finite() {
                return Err(NowcastError::Configuration(
                    "target.last_forecast must be finite".into(),
                ));
            }
        }
        self.calendar().map(|_| ())
    }

    /// Release calendar: the preset (if any) overridden by `[indicators]`.
    pub fn calendar(&self) -> Result<ReleaseCalendar> {
        let base = match self.calendar.preset {
            Some(CalendarPreset::Mexico) => ReleaseCalendar::mexico(),
            Some(CalendarPreset::UnitedStates) => ReleaseCalendar::united_states(),
            None => ReleaseCalendar::new(),
        };
        Ok(base.merge(ReleaseCalendar::from_specs(&self.indicators)?))
    }

    /// Primary strategy followed by the alternatives, without duplicates.
    pub fn strategies(&self) -> Vec<CombinationStrategy> {
        let mut out = vec![self.combination.primary];
        for s in &self.combination.alternatives {
            if !out.contains(s) {
                out.push(*s);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::ReleaseRule;
    use chrono::{NaiveDate, Weekday};

    const SAMPLE: &str = r#"
[model]
max_y_lags = 2
max_x_lags = 3

[target]
provisional_release_day = 28
last_forecast = 2.1

[combination]
primary = { kind = "criterion" }
alternatives = [ { kind = "rmse", window = 4 }, { kind = "thick_modeling", n_models = 5 } ]

[indicators.EAI]
week = 4
day = 22

[indicators.us_consumer_confidence]
relative = "last tuesday"

[transformations]
EAI = "ldiff"
"#;

    #[test]
    fn parses_full_document() {
        let config = NowcastConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.model.max_y_lags, 2);
        assert_eq!(config.model.max_x_lags, 3);
        assert_eq!(config.model.frequency_ratio, 3);
        assert_eq!(config.target.provisional_release_day, 28);
        assert_eq!(config.target.last_forecast, Some(2.1));
        assert_eq!(config.combination.primary, CombinationStrategy::Criterion);
        assert_eq!(config.strategies().len(), 3);
        assert_eq!(config.transformations.get("EAI"), Some(&Transformation::LogDiff));

        let calendar = config.calendar().unwrap();
        assert_eq!(
            calendar.rule("EAI"),
            Some(&ReleaseRule::Scheduled { week: 4, day: 22 })
        );
        assert_eq!(
            calendar.rule("us_consumer_confidence"),
            Some(&ReleaseRule::LastWeekday(Weekday::Tue))
        );
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = NowcastConfig::from_toml_str("").unwrap();
        assert_eq!(config, NowcastConfig::default());
        assert_eq!(config.model.max_y_lags, 4);
        assert_eq!(config.model.max_x_lags, 6);
        assert_eq!(config.target.provisional_release_day, 25);
        assert!(config.calendar().unwrap().is_empty());
    }

    #[test]
    fn preset_is_merged_with_overrides() {
        let config = NowcastConfig::from_toml_str(
            "[calendar]\npreset = \"mexico\"\n\n[indicators.EAI]\nweek = 3\nday = 18\n",
        )
        .unwrap();
        let calendar = config.calendar().unwrap();
        assert_eq!(calendar.len(), ReleaseCalendar::mexico().len());
        assert_eq!(
            calendar.rule("EAI"),
            Some(&ReleaseRule::Scheduled { week: 3, day: 18 })
        );
        let date = NaiveDate::from_ymd_opt(2024, 2, 5).unwrap();
        assert!(calendar.available_indicators(date).contains("PMI_M"));
    }

    #[test]
    fn malformed_rules_are_configuration_errors() {
        let both = "[indicators.X]\nweek = 1\nday = 3\nrelative = \"last friday\"\n";
        let neither = "[indicators.X]\n";
        let half = "[indicators.X]\nweek = 2\n";
        let bad_week = "[indicators.X]\nweek = 6\nday = 3\n";
        let bad_phrase = "[indicators.X]\nrelative = \"second monday\"\n";
        for doc in [both, neither, half, bad_week, bad_phrase] {
            assert!(
                matches!(
                    NowcastConfig::from_toml_str(doc),
                    Err(NowcastError::Configuration(_))
                ),
                "accepted {:?}",
                doc
            );
        }
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(NowcastConfig::from_toml_str("[target]\nprovisional_release_day = 0\n").is_err());
        assert!(NowcastConfig::from_toml_str("[model]\nfrequency_ratio = 0\n").is_err());
        assert!(matches!(
            NowcastConfig::from_toml_str("[model]\nmax_lags = 3\n"),
            Err(NowcastError::Toml(_))
        ));
        assert!(matches!(
            NowcastConfig::from_toml_str("[transformations]\nEAI = \"boxcox\"\n"),
            Err(NowcastError::Toml(_))
        ));
    }

    #[test]
    fn non_quarterly_frequency_ratio_rejected() {
        for ratio in [2, 4, 12] {
            let toml = format!("[model]\nfrequency_ratio = {}\n", ratio);
            assert!(matches!(
                NowcastConfig::from_toml_str(&toml),
                Err(NowcastError::Configuration(_))
            ));
        }
        assert!(NowcastConfig::from_toml_str("[model]\nfrequency_ratio = 3\n").is_ok());
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            NowcastConfig::from_path("/nonexistent/nowcast.toml"),
            Err(NowcastError::Io(_))
        ));
    }
}
