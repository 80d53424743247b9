//! Core data structures: quarters, monthly indicators and quarterly targets.

mod monthly;
mod quarter;
mod quarterly;

pub use monthly::{MonthlySeries, Observation};
pub use quarter::{Quarter, MONTHS_PER_QUARTER};
pub use quarterly::QuarterlySeries;

pub(crate) use quarter::{days_in_month, first_of_month};
