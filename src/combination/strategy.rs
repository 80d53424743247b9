//! Forecast combination strategies.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule for turning per-indicator forecasts into combination weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CombinationStrategy {
    /// `1/N` for every participating indicator.
    Equal,
    /// Inverse information criterion of the current fit.
    Criterion,
    /// Inverse historical RMSE, optionally over the latest `window` records.
    Rmse {
        #[serde(default)]
        window: Option<usize>,
    },
    /// Inverse sum of the RMSE, MAE and directional-accuracy ranks.
    Rank,
    /// Blend of recent inverse RMSE and directional accuracy.
    Adaptive {
        #[serde(default = "default_adaptive_window")]
        window: usize,
    },
    /// Equal weight on the `n_models` lowest-RMSE indicators.
    ThickModeling {
        #[serde(default = "default_thick_models")]
        n_models: usize,
    },
    /// Ridge regression of actuals on past forecasts, negative weights clipped.
    Regression {
        #[serde(default = "default_regression_window")]
        window: usize,
        #[serde(default = "default_ridge_alpha")]
        alpha: f64,
    },
}

fn default_adaptive_window() -> usize {
    4
}

fn default_thick_models() -> usize {
    5
}

fn default_regression_window() -> usize {
    8
}

fn default_ridge_alpha() -> f64 {
    1.0
}

impl Default for CombinationStrategy {
    fn default() -> Self {
        CombinationStrategy::Criterion
    }
}

impl CombinationStrategy {
    pub fn rmse() -> Self {
        CombinationStrategy::Rmse { window: None }
    }

    pub fn adaptive() -> Self {
        CombinationStrategy::Adaptive {
            window: default_adaptive_window(),
        }
    }

    pub fn thick_modeling() -> Self {
        CombinationStrategy::ThickModeling {
            n_models: default_thick_models(),
        }
    }

    pub fn regression() -> Self {
        CombinationStrategy::Regression {
            window: default_regression_window(),
            alpha: default_ridge_alpha(),
        }
    }

    /// Every strategy with its default parameters.
    pub fn all() -> Vec<Self> {
        vec![
            CombinationStrategy::Equal,
            CombinationStrategy::Criterion,
            Self::rmse(),
            CombinationStrategy::Rank,
            Self::adaptive(),
            Self::thick_modeling(),
            Self::regression(),
        ]
    }

    /// Whether weights depend on recorded forecast history.
    pub fn uses_history(&self) -> bool {
        !matches!(self, CombinationStrategy::Equal | CombinationStrategy::Criterion)
    }

    pub fn name(&self) -> &'static str {
        match self {
            CombinationStrategy::Equal => "equal",
            CombinationStrategy::Criterion => "criterion",
            CombinationStrategy::Rmse { .. } => "rmse",
            CombinationStrategy::Rank => "rank",
            CombinationStrategy::Adaptive { .. } => "adaptive",
            CombinationStrategy::ThickModeling { .. } => "thick_modeling",
            CombinationStrategy::Regression { .. } => "regression",
        }
    }
}

impl fmt::Display for CombinationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombinationStrategy::Rmse { window: Some(w) } => write!(f, "rmse(window={})", w),
            CombinationStrategy::Adaptive { window } => write!(f, "adaptive(window={})", window),
            CombinationStrategy::ThickModeling { n_models } => {
                write!(f, "thick_modeling(n={})", n_models)
            }
            CombinationStrategy::Regression { window, alpha } => {
                write!(f, "regression(window={}, alpha={})", window, alpha)
            }
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        strategy: CombinationStrategy,
    }

    fn parse(s: &str) -> CombinationStrategy {
        toml::from_str::<Holder>(s).unwrap().strategy
    }

    #[test]
    fn parses_tagged_variants_with_defaults() {
        assert_eq!(parse("strategy = { kind = \"criterion\" }"), CombinationStrategy::Criterion);
        assert_eq!(
            parse("strategy = { kind = \"adaptive\" }"),
            CombinationStrategy::Adaptive { window: 4 }
        );
        assert_eq!(
            parse("strategy = { kind = \"thick_modeling\", n_models = 2 }"),
            CombinationStrategy::ThickModeling { n_models: 2 }
        );
        assert_eq!(
            parse("strategy = { kind = \"regression\" }"),
            CombinationStrategy::Regression { window: 8, alpha: 1.0 }
        );
        assert_eq!(
            parse("strategy = { kind = \"rmse\", window = 4 }"),
            CombinationStrategy::Rmse { window: Some(4) }
        );
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(toml::from_str::<Holder>("strategy = { kind = \"bayesian\" }").is_err());
    }

    #[test]
    fn display_names() {
        assert_eq!(CombinationStrategy::rmse().to_string(), "rmse");
        assert_eq!(CombinationStrategy::adaptive().to_string(), "adaptive(window=4)");
        assert_eq!(CombinationStrategy::all().len(), 7);
        assert!(!CombinationStrategy::Criterion.uses_history());
        assert!(CombinationStrategy::Rank.uses_history());
    }
}
