//! The policy family.
//!
//! Implemented as a closed sum type rather than an open-ended trait-object
//! hierarchy: four named variants, no extension point exposed to external
//! consumers. The [`AdmissionPolicy`] trait exists only to share code
//! between the four variants; `Policy` itself dispatches by `match`, never
//! by dynamic dispatch.
//!
//! ## A widened observation signature
//!
//! A narrower design would write `recordObservation(helpful: bool)`. The
//! attribute-EWMA policy updates one estimate *per attribute* from the
//! candidate's full attribute vector, which a single aggregate boolean
//! cannot reconstruct. Because the reconstructor already has the full
//! `Candidate` and a live `Accounting` in hand when it replays a `request`
//! event, this implementation widens the signature to
//! `record_observation(&Candidate, &Accounting)` — a strict superset of the
//! boolean (callers who only have `helpful` can still call
//! `accounting.is_helpful(candidate)` themselves). This is recorded as a
//! deliberate resolution in DESIGN.md, not an oversight.

mod attr_ewma;
mod global_ewma;
mod reserve;
mod window;

pub use attr_ewma::AttrEwmaPolicy;
pub use global_ewma::GlobalEwmaPolicy;
pub use reserve::ReservePolicy;
pub use window::WindowPolicy;

use std::collections::BTreeMap;

use adm_common::AttrId;

use crate::accounting::Accounting;
use crate::model::{Candidate, Decision};

/// Shared contract every policy implements.
pub trait AdmissionPolicy {
    /// Decide accept/reject for `candidate`, given the accounting state as
    /// it stands *before* this decision. May mutate streaming estimators
    /// first — see the module-level note on `decide` not being pure.
    fn decide(&mut self, candidate: &Candidate, accounting: &Accounting) -> Decision;

    /// Pure estimator update for `candidate`, used only during
    /// reconstruction; never renders a decision.
    fn record_observation(&mut self, candidate: &Candidate, accounting: &Accounting);

    /// Hook after an accept has been applied to accounting. Most policies
    /// do nothing here; accounting is already authoritative.
    fn on_accept(&mut self, _candidate: &Candidate) {}

    /// Mirrors `need` from the accounting this policy was given.
    fn remaining_needed(&self, accounting: &Accounting) -> BTreeMap<AttrId, u64> {
        accounting.needs()
    }
}

/// The reserve decision rule shared by every policy's "fall back to safe
/// behavior" branch: accept a helpful candidate unconditionally, otherwise
/// accept a non-helpful one only while slack is strictly below what
/// remains.
pub(crate) fn reserve_decide(candidate: &Candidate, accounting: &Accounting) -> Decision {
    if accounting.is_helpful(candidate) {
        return Decision::Accept;
    }
    if accounting.slack() < accounting.remaining() {
        Decision::Accept
    } else {
        Decision::Reject
    }
}

/// The closed policy family. Construction parameters are validated by
/// `adm-config` before reaching here.
pub enum Policy {
    Reserve(ReservePolicy),
    Window(WindowPolicy),
    GlobalEwma(GlobalEwmaPolicy),
    AttrEwma(AttrEwmaPolicy),
}

impl Policy {
    pub fn decide(&mut self, candidate: &Candidate, accounting: &Accounting) -> Decision {
        match self {
            Policy::Reserve(p) => p.decide(candidate, accounting),
            Policy::Window(p) => p.decide(candidate, accounting),
            Policy::GlobalEwma(p) => p.decide(candidate, accounting),
            Policy::AttrEwma(p) => p.decide(candidate, accounting),
        }
    }

    pub fn record_observation(&mut self, candidate: &Candidate, accounting: &Accounting) {
        match self {
            Policy::Reserve(p) => p.record_observation(candidate, accounting),
            Policy::Window(p) => p.record_observation(candidate, accounting),
            Policy::GlobalEwma(p) => p.record_observation(candidate, accounting),
            Policy::AttrEwma(p) => p.record_observation(candidate, accounting),
        }
    }

    pub fn on_accept(&mut self, candidate: &Candidate) {
        match self {
            Policy::Reserve(p) => p.on_accept(candidate),
            Policy::Window(p) => p.on_accept(candidate),
            Policy::GlobalEwma(p) => p.on_accept(candidate),
            Policy::AttrEwma(p) => p.on_accept(candidate),
        }
    }

    pub fn remaining_needed(&self, accounting: &Accounting) -> BTreeMap<AttrId, u64> {
        accounting.needs()
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Policy::Reserve(_) => "reserve",
            Policy::Window(_) => "window",
            Policy::GlobalEwma(_) => "ewma",
            Policy::AttrEwma(_) => "attr-ewma",
        }
    }
}
