//! Stationarity transformations applied to raw indicator series.
//!
//! Missing values are NaN on slices and non-observed slots on
//! [`MonthlySeries`]; both are skipped when computing means and deviations.
//!
//! # Example
//!
//! ```
//! use midas_nowcast::transform::Transformation;
//!
//! let t: Transformation = "ldiff".parse().unwrap();
//! let out = t.apply(&[100.0, 110.0, 121.0]);
//! assert!(out[0].is_nan());
//! assert!((out[1] - 1.1f64.ln()).abs() < 1e-12);
//! ```

use crate::core::{MonthlySeries, Observation};
use crate::error::{NowcastError, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;
use std::str::FromStr;

/// Per-series transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Transformation {
    /// First difference.
    Diff,
    /// First difference of the natural log.
    LogDiff,
    /// Deviation from the sample mean.
    Demean,
    /// Natural log.
    Log,
    /// Natural log minus its sample mean.
    DemeanedLog,
    /// Z-score using the sample standard deviation.
    Standardize,
}

impl Transformation {
    pub fn code(&self) -> &'static str {
        match self {
            Transformation::Diff => "diff",
            Transformation::LogDiff => "ldiff",
            Transformation::Demean => "dmean",
            Transformation::Log => "log",
            Transformation::DemeanedLog => "dllog",
            Transformation::Standardize => "std",
        }
    }

    fn needs_positive(&self) -> bool {
        matches!(
            self,
            Transformation::LogDiff | Transformation::Log | Transformation::DemeanedLog
        )
    }

    /// Transform a slice of values of equal length.
    ///
    /// Log-based transformations of a series with any non-positive value
    /// return an all-NaN series.
    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        if self.needs_positive() && values.iter().any(|v| *v <= 0.0) {
            return vec![f64::NAN; values.len()];
        }
        match self {
            Transformation::Diff => diff(values),
            Transformation::LogDiff => diff(&log(values)),
            Transformation::Demean => demean(values),
            Transformation::Log => log(values),
            Transformation::DemeanedLog => demean(&log(values)),
            Transformation::Standardize => {
                let observed = values.iter().copied().filter(|v| v.is_finite());
                let std = observed.std_dev();
                if !std.is_finite() || std == 0.0 {
                    return vec![f64::NAN; values.len()];
                }
                demean(values).iter().map(|v| v / std).collect()
            }
        }
    }

    /// Transform the observed months of `series`; pending slots stay pending.
    pub fn apply_monthly(&self, series: &MonthlySeries) -> MonthlySeries {
        let raw: Vec<f64> = series
            .observations()
            .iter()
            .map(|o| o.value().unwrap_or(f64::NAN))
            .collect();
        let transformed = self.apply(&raw);
        let observations = series
            .observations()
            .iter()
            .zip(transformed)
            .map(|(o, v)| match o {
                Observation::Value(_) => Observation::from_f64(v),
                other => *other,
            })
            .collect();
        MonthlySeries::with_observations(series.start(), observations)
    }
}

fn diff(values: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    if !values.is_empty() {
        out.push(f64::NAN);
    }
    out.extend(values.windows(2).map(|w| w[1] - w[0]));
    out
}

fn log(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| v.ln()).collect()
}

fn demean(values: &[f64]) -> Vec<f64> {
    let mean = values.iter().copied().filter(|v| v.is_finite()).mean();
    values.iter().map(|v| v - mean).collect()
}

impl FromStr for Transformation {
    type Err = NowcastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "diff" => Ok(Transformation::Diff),
            "ldiff" => Ok(Transformation::LogDiff),
            "dmean" => Ok(Transformation::Demean),
            "log" => Ok(Transformation::Log),
            "dllog" => Ok(Transformation::DemeanedLog),
            "std" => Ok(Transformation::Standardize),
            other => Err(NowcastError::InvalidParameter(format!(
                "unknown transformation '{}', expected one of diff, ldiff, dmean, log, dllog, std",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Transformation {
    type Error = NowcastError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Transformation> for String {
    fn from(t: Transformation) -> Self {
        t.code().to_string()
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    #[test]
    fn difference_and_log_difference() {
        let d = Transformation::Diff.apply(&[1.0, 4.0, 2.0]);
        assert!(d[0].is_nan());
        assert_eq!(&d[1..], &[3.0, -2.0]);

        let ld = Transformation::LogDiff.apply(&[1.0, std::f64::consts::E]);
        assert_relative_eq!(ld[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn log_transforms_reject_non_positive() {
        for t in [Transformation::Log, Transformation::LogDiff, Transformation::DemeanedLog] {
            assert!(t.apply(&[1.0, 0.0, 2.0]).iter().all(|v| v.is_nan()));
        }
    }

    #[test]
    fn demean_skips_missing() {
        let out = Transformation::Demean.apply(&[1.0, f64::NAN, 3.0]);
        assert_eq!(out[0], -1.0);
        assert!(out[1].is_nan());
        assert_eq!(out[2], 1.0);
    }

    #[test]
    fn standardize_uses_sample_std() {
        let out = Transformation::Standardize.apply(&[1.0, 2.0, 3.0]);
        assert_relative_eq!(out[0], -1.0, epsilon = 1e-12);
        assert_relative_eq!(out[2], 1.0, epsilon = 1e-12);
        assert!(Transformation::Standardize.apply(&[2.0, 2.0]).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn parses_codes() {
        assert_eq!("dllog".parse::<Transformation>().unwrap(), Transformation::DemeanedLog);
        assert_eq!(" STD ".parse::<Transformation>().unwrap(), Transformation::Standardize);
        assert!(matches!(
            "boxcox".parse::<Transformation>(),
            Err(NowcastError::InvalidParameter(_))
        ));
        assert_eq!(Transformation::LogDiff.to_string(), "ldiff");
    }

    #[test]
    fn monthly_keeps_pending_slots() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let series = MonthlySeries::with_observations(
            start,
            vec![
                Observation::Value(1.0),
                Observation::Value(3.0),
                Observation::Absent,
                Observation::Pending,
            ],
        );
        let out = Transformation::Diff.apply_monthly(&series);
        assert_eq!(out.observations()[0], Observation::Absent);
        assert_eq!(out.observations()[1], Observation::Value(2.0));
        assert_eq!(out.observations()[2], Observation::Absent);
        assert_eq!(out.observations()[3], Observation::Pending);
    }
}
