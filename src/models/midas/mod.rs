//! Unrestricted MIDAS (mixed-data sampling) regression.
//!
//! One quarterly target is regressed on its own lags and on unrestricted
//! lags of a single monthly indicator. [`IndicatorModel`] searches the lag
//! grid and keeps the order with the lowest information criterion.

mod auto;
mod model;

pub use auto::{FitResult, IndicatorModel, MidasConfig};
pub use model::{information_criterion, LagOrder, MidasFit};
