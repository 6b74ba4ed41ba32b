//! Numerical primitives for the admission-control streaming estimators.
//!
//! Small, allocation-free functions shared by every relaxed policy in
//! `adm-core::policy`. Kept separate from the policies themselves so their
//! numeric properties (boundedness, monotonicity) can be property-tested in
//! isolation.

pub mod ewma;
pub mod threshold;

pub use ewma::ewma_update;
pub use threshold::{break_even_rate, clamp01, coverage_ratio};
