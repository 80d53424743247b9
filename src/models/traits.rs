//! Common interface for per-indicator mixed-frequency models.

use super::midas::{FitResult, IndicatorModel, MidasConfig};
use crate::alignment::TargetQuarter;
use crate::core::{MonthlySeries, QuarterlySeries};
use crate::error::Result;

/// A model mapping one monthly indicator to a quarterly nowcast.
///
/// This trait is object-safe and can be used with `Box<dyn IndicatorForecaster>`.
pub trait IndicatorForecaster {
    /// Fit the model for the quarter and intra-quarter position in `target`.
    fn fit(
        &mut self,
        x_monthly: &MonthlySeries,
        y_quarterly: &QuarterlySeries,
        target: TargetQuarter,
    ) -> Result<&FitResult>;

    /// Nowcast for the fitted target quarter.
    fn predict(&self, x_monthly: &MonthlySeries, month_in_quarter: u32) -> Result<f64>;

    /// Result of the last successful fit.
    fn fitted(&self) -> Option<&FitResult>;

    /// Indicator id.
    fn name(&self) -> &str;

    fn is_fitted(&self) -> bool {
        self.fitted().is_some()
    }
}

/// Type alias for boxed model trait objects.
pub type BoxedForecaster = Box<dyn IndicatorForecaster>;

/// Builds a fresh model for an indicator id.
pub type ModelFactory = fn(&str, &MidasConfig) -> BoxedForecaster;

/// Default factory: a U-MIDAS [`IndicatorModel`].
pub fn midas_factory(indicator: &str, config: &MidasConfig) -> BoxedForecaster {
    Box::new(IndicatorModel::with_config(indicator, config.clone()))
}

impl IndicatorForecaster for IndicatorModel {
    fn fit(
        &mut self,
        x_monthly: &MonthlySeries,
        y_quarterly: &QuarterlySeries,
        target: TargetQuarter,
    ) -> Result<&FitResult> {
        IndicatorModel::fit(self, x_monthly, y_quarterly, target)
    }

    fn predict(&self, x_monthly: &MonthlySeries, month_in_quarter: u32) -> Result<f64> {
        IndicatorModel::predict(self, x_monthly, month_in_quarter)
    }

    fn fitted(&self) -> Option<&FitResult> {
        self.selected()
    }

    fn name(&self) -> &str {
        IndicatorModel::name(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_builds_unfitted_model() {
        let model = midas_factory("EAI", &MidasConfig::default());
        assert_eq!(model.name(), "EAI");
        assert!(!model.is_fitted());
    }
}
