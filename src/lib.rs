//! # midas-nowcast
//!
//! Mixed-frequency nowcasting of a quarterly aggregate from monthly
//! indicators published on staggered release schedules.
//!
//! For a reference date the engine decides which indicators are out
//! ([`calendar`]), aligns their ragged monthly data to the target quarter
//! ([`alignment`]), fits one U-MIDAS regression per indicator with lag
//! selection by information criterion ([`models`]), and combines the
//! per-indicator nowcasts with performance-based weights ([`combination`]).
//! [`nowcast::Nowcaster`] runs the whole pipeline.
//!
//! ```
//! use midas_nowcast::prelude::*;
//! use chrono::NaiveDate;
//!
//! let start = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
//! let x: Vec<f64> = (0..37).map(|i| (i as f64 * 0.5).sin()).collect();
//! let y: Vec<f64> = (0..12).map(|t| 0.4 + 1.5 * x[3 * t] + 0.01 * t as f64).collect();
//!
//! let calendar = ReleaseCalendar::new()
//!     .with_rule("ip", ReleaseRule::Scheduled { week: 1, day: 1 });
//! let target = QuarterlyTarget::new(QuarterlySeries::from_values(Quarter::new(2015, 1).unwrap(), &y));
//!
//! let mut nowcaster = Nowcaster::new(calendar, target)
//!     .with_model_config(MidasConfig::default().with_max_lags(1, 2));
//! nowcaster.add_indicator("ip", MonthlySeries::new(start, x));
//!
//! let report = nowcaster.run(NaiveDate::from_ymd_opt(2018, 1, 15).unwrap()).unwrap();
//! assert!(report.is_success());
//! ```

#![allow(clippy::needless_range_loop)]

pub mod alignment;
pub mod calendar;
pub mod combination;
pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod nowcast;
pub mod target;
pub mod transform;
pub mod utils;

pub use error::{NowcastError, Result};

pub mod prelude {
    pub use crate::alignment::{pad_to_quarter, target_quarter, AlignedPanel, TargetQuarter};
    pub use crate::calendar::{ReleaseCalendar, ReleaseRule, RuleSpec};
    pub use crate::combination::{
        update_forecast_history, Candidate, CombinationStrategy, CombinationWeights,
        ForecastCombiner, ForecastHistory, HistoryTable,
    };
    pub use crate::config::NowcastConfig;
    pub use crate::core::{MonthlySeries, Observation, Quarter, QuarterlySeries};
    pub use crate::error::{NowcastError, Result};
    pub use crate::models::{FitResult, IndicatorForecaster, IndicatorModel, LagOrder, MidasConfig};
    pub use crate::nowcast::{NowcastReport, NowcastStatus, Nowcaster};
    pub use crate::target::QuarterlyTarget;
    pub use crate::transform::Transformation;
}
