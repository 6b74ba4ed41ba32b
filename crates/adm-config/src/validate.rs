//! Semantic validation of resolved policy parameters.

use crate::policy_params::{PolicyKind, PolicyParams};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Validate resolved policy parameters: `alpha`/`margin`/`corrBeta` are
/// probabilities/weights in `[0,1]`; `warmup`/`windowSize`/`minObservations`
/// are non-negative.
pub fn validate_policy_params(p: &PolicyParams) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&p.alpha) {
        return Err(ConfigError::InvalidValue {
            field: "alpha",
            message: format!("must be in [0,1], got {}", p.alpha),
        });
    }
    if p.margin < 0.0 {
        return Err(ConfigError::InvalidValue {
            field: "risk-margin",
            message: format!("must be >= 0, got {}", p.margin),
        });
    }
    if matches!(p.kind, PolicyKind::AttrEwma) && !(0.0..=1.0).contains(&p.corr_beta) {
        return Err(ConfigError::InvalidValue {
            field: "corr-beta",
            message: format!("must be in [0,1], got {}", p.corr_beta),
        });
    }
    if matches!(p.kind, PolicyKind::Window) && p.window_size == 0 {
        return Err(ConfigError::InvalidValue {
            field: "window-size",
            message: "must be > 0".to_string(),
        });
    }
    Ok(())
}
