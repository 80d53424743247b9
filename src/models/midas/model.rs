//! Unrestricted MIDAS regression for a single lag order.
//!
//! For quarter `t` and lag order `(p, q)` the regressors are
//!
//! `[1, y(t-1) .. y(t-p), x(a_t), x(a_t - 1) .. x(a_t - q)]`
//!
//! where `a_t` is the monthly slot at `month_in_quarter` inside quarter `t`.
//! Every historical quarter therefore uses the same intra-quarter
//! information set as the target quarter has on the reference date.

use crate::alignment::AlignedPanel;
use crate::core::{Quarter, QuarterlySeries};
use crate::error::{NowcastError, Result};
use crate::utils::{least_squares, LeastSquaresFit};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of quarterly target lags and extra monthly indicator lags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LagOrder {
    pub y_lags: usize,
    pub x_lags: usize,
}

impl LagOrder {
    pub fn new(y_lags: usize, x_lags: usize) -> Self {
        Self { y_lags, x_lags }
    }

    /// Intercept, target lags and `x_lags + 1` monthly values.
    pub fn num_params(&self) -> usize {
        1 + self.y_lags + self.x_lags + 1
    }
}

impl fmt::Display for LagOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(y={}, x={})", self.y_lags, self.x_lags)
    }
}

/// Regressor row for `quarter`, or `None` if any input is missing.
pub(crate) fn design_row(
    panel: &AlignedPanel,
    y: &QuarterlySeries,
    quarter: Quarter,
    order: LagOrder,
) -> Option<Vec<f64>> {
    let mut row = Vec::with_capacity(order.num_params());
    row.push(1.0);
    for lag in 1..=order.y_lags {
        row.push(y.get(quarter.offset(-(lag as i64)))?);
    }
    row.extend(panel.lagged(quarter, order.x_lags)?);
    Some(row)
}

/// Estimated U-MIDAS regression together with its target-quarter regressors.
#[derive(Debug, Clone, PartialEq)]
pub struct MidasFit {
    pub order: LagOrder,
    /// Quarters of the estimation sample, in order.
    pub sample: Vec<Quarter>,
    pub least_squares: LeastSquaresFit,
    /// Regressor row of the target quarter.
    pub nowcast_row: Vec<f64>,
}

impl MidasFit {
    /// Estimate `order` on every historical quarter with complete regressors.
    ///
    /// Fails when the sample has no more rows than parameters, when the
    /// normal equations are singular, or when the target quarter's
    /// regressors cannot be built.
    pub fn estimate(panel: &AlignedPanel, y: &QuarterlySeries, order: LagOrder) -> Result<Self> {
        let target = panel.target();

        let nowcast_row = design_row(panel, y, target, order).ok_or_else(|| {
            NowcastError::MissingPrediction(format!(
                "regressors for {} unavailable at order {}",
                target, order
            ))
        })?;

        let mut sample = Vec::new();
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for &quarter in panel.quarters().iter().filter(|q| **q < target) {
            let Some(value) = y.get(quarter) else {
                continue;
            };
            if let Some(row) = design_row(panel, y, quarter, order) {
                sample.push(quarter);
                rows.push(row);
                targets.push(value);
            }
        }

        let k = order.num_params();
        if rows.len() <= k {
            return Err(NowcastError::InsufficientData {
                needed: k + 1,
                got: rows.len(),
            });
        }

        let least_squares = least_squares(&rows, &targets, 0.0)?;

        Ok(Self {
            order,
            sample,
            least_squares,
            nowcast_row,
        })
    }

    /// One-step-ahead value for the target quarter.
    pub fn nowcast(&self) -> Result<f64> {
        self.least_squares.predict_row(&self.nowcast_row)
    }

    pub fn residuals(&self) -> &[f64] {
        &self.least_squares.residuals
    }

    pub fn num_params(&self) -> usize {
        self.least_squares.num_params()
    }
}

/// BIC-like score `n ln(SSR / n) + k ln(n)`, lower is better.
///
/// `ssr` is floored at `ssr_floor` so perfect fits do not produce `ln(0)`.
pub fn information_criterion(ssr: f64, n: usize, k: usize, ssr_floor: f64) -> f64 {
    let n = n as f64;
    n * (ssr.max(ssr_floor) / n).ln() + k as f64 * n.ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MonthlySeries;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2018, 1, 1).unwrap()
    }

    /// Monthly x and quarterly y = 0.5 + 2 * (second month of quarter).
    fn linear_pair(quarters: usize) -> (MonthlySeries, QuarterlySeries) {
        let x: Vec<f64> = (0..quarters * 3)
            .map(|i| ((i as f64) * 0.7).sin() + 0.1 * i as f64)
            .collect();
        let y: Vec<f64> = (0..quarters).map(|t| 0.5 + 2.0 * x[3 * t + 1]).collect();
        (
            MonthlySeries::new(start(), x),
            QuarterlySeries::from_values(Quarter::new(2018, 1).unwrap(), &y),
        )
    }

    #[test]
    fn recovers_exact_relationship() {
        // reference in month 2 of the quarter after the history
        let (mut x, y) = linear_pair(12);
        x.push(1.0);
        x.push(3.0);
        let target = Quarter::new(2021, 1).unwrap();
        let panel = AlignedPanel::build(&x, target, 1, 3).unwrap();

        let fit = MidasFit::estimate(&panel, &y, LagOrder::new(0, 0)).unwrap();
        assert_eq!(fit.sample.len(), 12);
        assert_relative_eq!(fit.least_squares.coefficients[0], 0.5, epsilon = 1e-8);
        assert_relative_eq!(fit.least_squares.coefficients[1], 2.0, epsilon = 1e-8);
        assert_relative_eq!(fit.nowcast().unwrap(), 6.5, epsilon = 1e-8);
    }

    #[test]
    fn target_lags_need_history() {
        let (mut x, y) = linear_pair(12);
        x.push(1.0);
        // y ends in 2020Q4; a target two quarters later lacks y(t-1)
        x.push(1.0);
        x.push(1.0);
        x.push(1.0);
        let panel = AlignedPanel::build(&x, Quarter::new(2021, 2).unwrap(), 0, 3).unwrap();
        assert!(matches!(
            MidasFit::estimate(&panel, &y, LagOrder::new(1, 0)),
            Err(NowcastError::MissingPrediction(_))
        ));
        assert!(MidasFit::estimate(&panel, &y, LagOrder::new(0, 0)).is_ok());
    }

    #[test]
    fn too_few_rows_rejected() {
        let (mut x, y) = linear_pair(3);
        x.push(1.0);
        let panel = AlignedPanel::build(&x, Quarter::new(2018, 4).unwrap(), 0, 3).unwrap();
        assert!(matches!(
            MidasFit::estimate(&panel, &y, LagOrder::new(1, 1)),
            Err(NowcastError::InsufficientData { .. })
        ));
    }

    #[test]
    fn criterion_formula() {
        let n = 20;
        let score = information_criterion(5.0, n, 3, 1e-12);
        let expected = 20.0 * (5.0f64 / 20.0).ln() + 3.0 * 20.0f64.ln();
        assert_relative_eq!(score, expected, epsilon = 1e-12);
        assert!(information_criterion(0.0, n, 3, 1e-12).is_finite());
    }

    #[test]
    fn order_parameter_count() {
        assert_eq!(LagOrder::new(0, 0).num_params(), 2);
        assert_eq!(LagOrder::new(4, 6).num_params(), 12);
    }
}
