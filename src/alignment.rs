//! Quarter alignment of ragged monthly panels.
//!
//! A reference date fixes the target quarter and how far into it we are.
//! Monthly indicators are padded with explicit pending months so that the
//! final three slots always line up with the target quarter, then grouped
//! into per-quarter blocks for the mixed-frequency regression.

use crate::core::{MonthlySeries, Observation, Quarter, MONTHS_PER_QUARTER};
use crate::error::{NowcastError, Result};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// The quarter being nowcast and the position of the reference date in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetQuarter {
    /// Quarter number, 1..=4.
    pub quarter: u32,
    pub year: i32,
    /// 0 for the first month of the quarter, 2 for the last.
    pub month_in_quarter: u32,
}

impl TargetQuarter {
    pub fn period(&self) -> Quarter {
        Quarter::from_date(
            NaiveDate::from_ymd_opt(self.year, (self.quarter - 1) * MONTHS_PER_QUARTER + 1, 1)
                .unwrap_or(NaiveDate::MIN),
        )
    }

    /// Share of the quarter's months that have started, in percent.
    pub fn progress_pct(&self) -> f64 {
        (self.month_in_quarter + 1) as f64 / MONTHS_PER_QUARTER as f64 * 100.0
    }
}

/// Target quarter for a reference date: always the quarter the date falls in.
pub fn target_quarter(reference_date: NaiveDate) -> TargetQuarter {
    let month = reference_date.month();
    TargetQuarter {
        quarter: (month - 1) / MONTHS_PER_QUARTER + 1,
        year: reference_date.year(),
        month_in_quarter: (month - 1) % MONTHS_PER_QUARTER,
    }
}

/// Append `2 - month_in_quarter` pending months after the last timestamp.
pub fn pad_to_quarter(series: &MonthlySeries, month_in_quarter: u32) -> Result<MonthlySeries> {
    pad_to_period(series, month_in_quarter as usize, MONTHS_PER_QUARTER as usize)
}

/// Generalized padding for `ratio` high-frequency slots per low-frequency period.
pub fn pad_to_period(
    series: &MonthlySeries,
    month_in_period: usize,
    ratio: usize,
) -> Result<MonthlySeries> {
    if ratio == 0 {
        return Err(NowcastError::InvalidParameter(
            "frequency ratio must be positive".into(),
        ));
    }
    if month_in_period >= ratio {
        return Err(NowcastError::InvalidParameter(format!(
            "month in period must be below {}, got {}",
            ratio, month_in_period
        )));
    }
    if series.is_empty() {
        return Err(NowcastError::EmptyData);
    }

    let mut padded = series.clone();
    padded.push_pending(ratio - 1 - month_in_period);
    Ok(padded)
}

/// Padded monthly values grouped into consecutive quarter blocks.
///
/// The last block is the target quarter. Slots before the first month of
/// the series are filled with [`Observation::Absent`].
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedPanel {
    quarters: Vec<Quarter>,
    months: Vec<Observation>,
    month_in_quarter: usize,
    ratio: usize,
}

impl AlignedPanel {
    /// Pad `series` and split it into blocks ending at `target`.
    pub fn build(
        series: &MonthlySeries,
        target: Quarter,
        month_in_quarter: u32,
        ratio: usize,
    ) -> Result<Self> {
        let padded = pad_to_period(series, month_in_quarter as usize, ratio)?;
        let blocks = padded.len().div_ceil(ratio);
        let lead = blocks * ratio - padded.len();

        let mut months = vec![Observation::Absent; lead];
        months.extend_from_slice(padded.observations());

        let quarters = (0..blocks)
            .map(|b| target.offset(b as i64 - (blocks as i64 - 1)))
            .collect();

        Ok(Self {
            quarters,
            months,
            month_in_quarter: month_in_quarter as usize,
            ratio,
        })
    }

    pub fn quarters(&self) -> &[Quarter] {
        &self.quarters
    }

    pub fn target(&self) -> Quarter {
        self.quarters[self.quarters.len() - 1]
    }

    pub fn month_in_quarter(&self) -> usize {
        self.month_in_quarter
    }

    /// Monthly slots of the given quarter.
    pub fn block(&self, quarter: Quarter) -> Option<&[Observation]> {
        let b = self.block_index(quarter)?;
        Some(&self.months[b * self.ratio..(b + 1) * self.ratio])
    }

    /// Monthly slots of the target quarter.
    pub fn current(&self) -> &[Observation] {
        let start = self.months.len() - self.ratio;
        &self.months[start..]
    }

    /// Values at the anchor month of `quarter` and the `lags` months before it.
    ///
    /// The anchor is the slot at `month_in_quarter`. Returns `None` if any of
    /// those months is missing or precedes the panel.
    pub fn lagged(&self, quarter: Quarter, lags: usize) -> Option<Vec<f64>> {
        let anchor = self.block_index(quarter)? * self.ratio + self.month_in_quarter;
        if lags > anchor {
            return None;
        }
        (0..=lags).map(|i| self.months[anchor - i].value()).collect()
    }

    fn block_index(&self, quarter: Quarter) -> Option<usize> {
        let first = *self.quarters.first()?;
        let idx = first.distance_to(&quarter);
        (idx >= 0 && (idx as usize) < self.quarters.len()).then_some(idx as usize)
    }
}
