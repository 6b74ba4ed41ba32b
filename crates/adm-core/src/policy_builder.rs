//! Constructs a [`Policy`] from resolved configuration and a scenario.
//!
//! The sole place that turns a [`PolicyKind`] selection into a concrete
//! policy variant; both the fresh-start path (`main.rs`) and the
//! reconstructor (`reconstruct.rs`) call through here so both produce
//! identically-parameterized policies.

use adm_config::{PolicyKind, PolicyParams};

use crate::model::Scenario;
use crate::policy::{AttrEwmaPolicy, GlobalEwmaPolicy, Policy, ReservePolicy, WindowPolicy};

pub fn build_policy(scenario: &Scenario, params: &PolicyParams) -> Policy {
    match params.kind {
        PolicyKind::Reserve => Policy::Reserve(ReservePolicy::new()),
        PolicyKind::Window => {
            Policy::Window(WindowPolicy::new(params.window_size, params.min_observations, params.margin))
        }
        PolicyKind::Ewma => {
            Policy::GlobalEwma(GlobalEwmaPolicy::new(params.alpha, params.margin, params.warmup))
        }
        PolicyKind::AttrEwma => Policy::AttrEwma(AttrEwmaPolicy::new(
            scenario,
            params.alpha,
            params.margin,
            params.warmup,
            params.corr_aware,
            params.corr_beta,
            params.gate_top_k,
        )),
    }
}
