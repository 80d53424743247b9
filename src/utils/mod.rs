//! Numerical utilities shared by models and combiners.

pub mod ols;
pub mod stats;

pub use ols::{least_squares, LeastSquaresFit};
pub use stats::{average_ranks, median, population_std};
