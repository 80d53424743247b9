//! Outcome of a nowcast run for the reporting layer.

use crate::combination::CombinationStrategy;
use crate::core::Quarter;
use crate::models::LagOrder;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NowcastStatus {
    Success,
    /// No indicator produced a valid forecast.
    NoForecast,
}

/// One indicator's part in the combined nowcast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorContribution {
    pub indicator: String,
    pub forecast: f64,
    pub weight: f64,
    pub criterion_score: f64,
    pub order: LagOrder,
    /// Quarters in the estimation sample.
    pub n_obs: usize,
}

/// Combined forecast under a non-primary strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlternativeForecast {
    pub strategy: CombinationStrategy,
    pub forecast: Option<f64>,
    /// Equal weights were used because the strategy was undefined.
    pub fallback: bool,
}

/// An available indicator left out of the combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedIndicator {
    pub indicator: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NowcastReport {
    pub status: NowcastStatus,
    pub reference_date: NaiveDate,
    pub target_quarter: u32,
    pub target_year: i32,
    pub month_in_quarter: u32,
    pub quarter_progress_pct: f64,
    pub available_indicators: Vec<String>,
    /// `None` exactly when `status` is `NoForecast`.
    pub combined_forecast: Option<f64>,
    pub strategy: CombinationStrategy,
    pub weights_fallback: bool,
    pub per_indicator: Vec<IndicatorContribution>,
    pub alternatives: Vec<AlternativeForecast>,
    pub dropped: Vec<DroppedIndicator>,
    /// Quarter whose target value was a provisional stand-in.
    pub provisional_quarter: Option<Quarter>,
}

impl NowcastReport {
    pub fn is_success(&self) -> bool {
        self.status == NowcastStatus::Success
    }

    pub fn target(&self) -> Quarter {
        Quarter::from_date(
            NaiveDate::from_ymd_opt(self.target_year, (self.target_quarter - 1) * 3 + 1, 1)
                .unwrap_or(self.reference_date),
        )
    }

    pub fn contribution(&self, indicator: &str) -> Option<&IndicatorContribution> {
        self.per_indicator.iter().find(|c| c.indicator == indicator)
    }

    /// `(indicator, forecast)` pairs for recording against an actual value.
    pub fn forecasts(&self) -> impl Iterator<Item = (&str, f64)> {
        self.per_indicator
            .iter()
            .map(|c| (c.indicator.as_str(), c.forecast))
    }
}

impl fmt::Display for NowcastReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Nowcast for {}Q{} as of {} ({:.0}% of quarter)",
            self.target_year, self.target_quarter, self.reference_date, self.quarter_progress_pct
        )?;
        if let Some(q) = self.provisional_quarter {
            writeln!(f, "  provisional target value used for {}", q)?;
        }
        writeln!(
            f,
            "  available indicators: {}",
            if self.available_indicators.is_empty() {
                "none".to_string()
            } else {
                self.available_indicators.join(", ")
            }
        )?;

        if !self.per_indicator.is_empty() {
            writeln!(
                f,
                "  {:<28} {:>10} {:>8} {:>12} {:>12}",
                "indicator", "forecast", "weight", "criterion", "order"
            )?;
            for c in &self.per_indicator {
                writeln!(
                    f,
                    "  {:<28} {:>10.4} {:>8.4} {:>12.3} {:>12}",
                    c.indicator,
                    c.forecast,
                    c.weight,
                    c.criterion_score,
                    c.order.to_string()
                )?;
            }
        }
        for d in &self.dropped {
            writeln!(f, "  dropped {}: {}", d.indicator, d.reason)?;
        }

        match self.combined_forecast {
            Some(v) => writeln!(f, "  combined ({}): {:.4}", self.strategy, v)?,
            None => writeln!(f, "  no forecast available")?,
        }
        for alt in &self.alternatives {
            match alt.forecast {
                Some(v) => writeln!(f, "  {:<28} {:.4}", alt.strategy.to_string(), v)?,
                None => writeln!(f, "  {:<28} -", alt.strategy.to_string())?,
            }
        }
        Ok(())
    }
}
