//! Forecast history tracking and performance-weighted combination.
//!
//! [`ForecastCombiner`] borrows a [`HistoryTable`] owned by the caller and
//! recomputes weights on every call, so weights always reflect the latest
//! recorded performance.

mod combiner;
mod history;
mod strategy;

pub use combiner::{Candidate, CombinationWeights, ForecastCombiner};
pub use history::{update_forecast_history, ForecastHistory, HistoryTable};
pub use strategy::CombinationStrategy;
