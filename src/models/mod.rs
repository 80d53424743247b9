//! Per-indicator nowcasting models.

mod traits;

pub mod midas;

pub use midas::{information_criterion, FitResult, IndicatorModel, LagOrder, MidasConfig};
pub use traits::{midas_factory, BoxedForecaster, IndicatorForecaster, ModelFactory};
