//! Policy selection and default-parameter resolution.
//!
//! Defaults here are the per-policy-family defaults. CLI flags
//! override them; anything left unset falls back to these constants.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Which policy family to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    Reserve,
    Window,
    Ewma,
    #[value(name = "attr-ewma")]
    AttrEwma,
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyKind::Reserve => write!(f, "reserve"),
            PolicyKind::Window => write!(f, "window"),
            PolicyKind::Ewma => write!(f, "ewma"),
            PolicyKind::AttrEwma => write!(f, "attr-ewma"),
        }
    }
}

/// Resolved numeric parameters for whichever policy was selected.
///
/// Every field is populated (CLI override or documented default) before
/// this reaches `adm-core`; the core never guesses a default itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyParams {
    pub kind: PolicyKind,
    pub alpha: f64,
    pub margin: f64,
    pub warmup: u64,
    pub window_size: usize,
    pub min_observations: u64,
    pub gate_top_k: usize,
    pub corr_aware: bool,
    pub corr_beta: f64,
}

impl PolicyParams {
    /// Resolve parameters for `kind`, applying CLI overrides atop the
    /// documented defaults for that policy family.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve(
        kind: PolicyKind,
        alpha: Option<f64>,
        margin: Option<f64>,
        warmup: Option<u64>,
        window_size: Option<usize>,
        min_observations: Option<u64>,
        gate_top_k: usize,
        corr_aware: bool,
        corr_beta: Option<f64>,
    ) -> Self {
        let (default_alpha, default_margin, default_warmup) = match kind {
            PolicyKind::Reserve => (0.0, 0.0, 0),
            PolicyKind::Window => (0.0, 0.15, 0),
            PolicyKind::Ewma => (0.03, 0.18, 100),
            PolicyKind::AttrEwma => (0.04, 0.15, 120),
        };

        PolicyParams {
            kind,
            alpha: alpha.unwrap_or(default_alpha),
            margin: margin.unwrap_or(default_margin),
            warmup: warmup.unwrap_or(default_warmup),
            window_size: window_size.unwrap_or(500),
            min_observations: min_observations.unwrap_or(80),
            gate_top_k,
            corr_aware,
            corr_beta: corr_beta.unwrap_or(0.25),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_ignores_overrides_sensibly() {
        let p = PolicyParams::resolve(PolicyKind::Reserve, None, None, None, None, None, 0, false, None);
        assert_eq!(p.kind, PolicyKind::Reserve);
    }

    #[test]
    fn window_defaults_match_spec() {
        let p = PolicyParams::resolve(PolicyKind::Window, None, None, None, None, None, 0, false, None);
        assert_eq!(p.window_size, 500);
        assert_eq!(p.min_observations, 80);
        assert!((p.margin - 0.15).abs() < 1e-12);
    }

    #[test]
    fn ewma_defaults_match_spec() {
        let p = PolicyParams::resolve(PolicyKind::Ewma, None, None, None, None, None, 0, false, None);
        assert!((p.alpha - 0.03).abs() < 1e-12);
        assert!((p.margin - 0.18).abs() < 1e-12);
        assert_eq!(p.warmup, 100);
    }

    #[test]
    fn attr_ewma_defaults_match_spec() {
        let p = PolicyParams::resolve(PolicyKind::AttrEwma, None, None, None, None, None, 0, false, None);
        assert!((p.alpha - 0.04).abs() < 1e-12);
        assert!((p.margin - 0.15).abs() < 1e-12);
        assert_eq!(p.warmup, 120);
        assert!((p.corr_beta - 0.25).abs() < 1e-12);
    }

    #[test]
    fn overrides_win_over_defaults() {
        let p = PolicyParams::resolve(
            PolicyKind::AttrEwma,
            Some(0.1),
            Some(0.2),
            Some(10),
            None,
            None,
            2,
            true,
            Some(0.5),
        );
        assert_eq!(p.alpha, 0.1);
        assert_eq!(p.margin, 0.2);
        assert_eq!(p.warmup, 10);
        assert_eq!(p.gate_top_k, 2);
        assert!(p.corr_aware);
        assert_eq!(p.corr_beta, 0.5);
    }
}
