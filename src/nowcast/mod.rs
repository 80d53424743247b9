//! End-to-end nowcast runs and their reports.

mod orchestrator;
mod report;

pub use orchestrator::Nowcaster;
pub use report::{
    AlternativeForecast, DroppedIndicator, IndicatorContribution, NowcastReport, NowcastStatus,
};
