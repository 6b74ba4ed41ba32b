//! Feasibility-preserving baseline policy.

use crate::accounting::Accounting;
use crate::model::{Candidate, Decision};

use super::{reserve_decide, AdmissionPolicy};

/// Stateless: every decision is a pure function of the accounting it is
/// handed, so `record_observation` has nothing to update.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReservePolicy;

impl ReservePolicy {
    pub fn new() -> Self {
        ReservePolicy
    }
}

impl AdmissionPolicy for ReservePolicy {
    fn decide(&mut self, candidate: &Candidate, accounting: &Accounting) -> Decision {
        reserve_decide(candidate, accounting)
    }

    fn record_observation(&mut self, _candidate: &Candidate, _accounting: &Accounting) {}
}
