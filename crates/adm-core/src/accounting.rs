//! Accounting state: the sole authority on admission progress.
//!
//! Policies read accounting but never own or mutate it directly — the
//! controller applies accepts via [`Accounting::apply_accept`] after the
//! policy has rendered its decision.

use adm_common::{AttrId, Error};
use std::collections::BTreeMap;

use crate::model::{Candidate, Scenario};

/// Mutable progress state for one game.
#[derive(Debug, Clone)]
pub struct Accounting {
    capacity: u64,
    min_count: BTreeMap<AttrId, u64>,
    admitted: u64,
    count_by_attr: BTreeMap<AttrId, u64>,
}

impl Accounting {
    /// Start a fresh accounting state for `scenario`.
    pub fn new(scenario: &Scenario) -> Self {
        let min_count = scenario
            .constraints
            .iter()
            .map(|c| (c.attribute.clone(), c.min_count))
            .collect();
        let count_by_attr = scenario
            .constraints
            .iter()
            .map(|c| (c.attribute.clone(), 0))
            .collect();
        Accounting {
            capacity: scenario.capacity,
            min_count,
            admitted: 0,
            count_by_attr,
        }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn admitted(&self) -> u64 {
        self.admitted
    }

    pub fn count_by_attr(&self) -> &BTreeMap<AttrId, u64> {
        &self.count_by_attr
    }

    /// `R = C - admitted`.
    pub fn remaining(&self) -> u64 {
        self.capacity - self.admitted
    }

    /// `need[a] = max(0, minCount[a] - countByAttr[a])`.
    pub fn need(&self, a: &AttrId) -> u64 {
        let min = self.min_count.get(a).copied().unwrap_or(0);
        let have = self.count_by_attr.get(a).copied().unwrap_or(0);
        min.saturating_sub(have)
    }

    /// `S = sum over a of need[a]`.
    pub fn slack(&self) -> u64 {
        self.min_count.keys().map(|a| self.need(a)).sum()
    }

    /// All constrained attribute ids with `need[a] > 0`.
    pub fn under_filled(&self) -> Vec<AttrId> {
        self.min_count
            .keys()
            .filter(|a| self.need(a) > 0)
            .cloned()
            .collect()
    }

    /// `minCount[a]` for a constrained attribute (0 if unconstrained).
    pub fn min_count(&self, a: &AttrId) -> u64 {
        self.min_count.get(a).copied().unwrap_or(0)
    }

    /// `need[a]` for every constrained attribute, mirrored for policies'
    /// `remainingNeeded()`.
    pub fn needs(&self) -> BTreeMap<AttrId, u64> {
        self.min_count.keys().map(|a| (a.clone(), self.need(a))).collect()
    }

    /// A candidate is helpful iff it carries at least one currently
    /// under-filled attribute. Computed against *this* accounting state.
    pub fn is_helpful(&self, candidate: &Candidate) -> bool {
        self.min_count
            .keys()
            .any(|a| self.need(a) > 0 && candidate.has(a))
    }

    /// Apply an accept: increment `admitted` and every attribute the
    /// candidate carries. Enforces the admitted-never-exceeds-capacity and
    /// per-attribute-count-never-exceeds-admitted invariants as
    /// programming-error checks — a caller that invokes this when
    /// `admitted == capacity` has a bug, not a recoverable condition.
    pub fn apply_accept(&mut self, candidate: &Candidate) -> Result<(), Error> {
        if self.admitted >= self.capacity {
            return Err(Error::CapacityOverflow {
                would_be: self.admitted + 1,
                capacity: self.capacity,
            });
        }
        self.admitted += 1;
        for a in self.min_count.keys().cloned().collect::<Vec<_>>() {
            if candidate.has(&a) {
                *self.count_by_attr.entry(a).or_insert(0) += 1;
            }
        }
        Ok(())
    }

    /// Local feasibility check: `S <= R`, treated as a programming-error
    /// check — under the reserve policy this should never trip.
    pub fn check_feasible(&self) -> Result<(), Error> {
        let slack = self.slack();
        let remaining = self.remaining();
        if slack > remaining {
            return Err(Error::Infeasible { slack, remaining });
        }
        Ok(())
    }

    /// Whether every constrained attribute's need is satisfied and capacity
    /// is full (the `Completed` condition).
    pub fn is_complete(&self) -> bool {
        self.admitted == self.capacity && self.min_count.keys().all(|a| self.need(a) == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Constraint;
    use std::collections::BTreeMap as Map;

    fn attr(s: &str) -> AttrId {
        AttrId::new(s)
    }

    fn scenario(capacity: u64, constraints: &[(&str, u64)]) -> Scenario {
        Scenario {
            name: None,
            capacity,
            constraints: constraints
                .iter()
                .map(|(a, m)| Constraint { attribute: attr(a), min_count: *m })
                .collect(),
            relative_frequencies: Map::new(),
            correlations: Map::new(),
        }
    }

    fn candidate(index: u64, attrs: &[(&str, bool)]) -> Candidate {
        Candidate {
            index,
            attributes: attrs.iter().map(|(a, v)| (attr(a), *v)).collect(),
        }
    }

    #[test]
    fn need_and_slack_start_at_min_count() {
        let acc = Accounting::new(&scenario(10, &[("x", 3), ("y", 2)]));
        assert_eq!(acc.need(&attr("x")), 3);
        assert_eq!(acc.need(&attr("y")), 2);
        assert_eq!(acc.slack(), 5);
        assert_eq!(acc.remaining(), 10);
    }

    #[test]
    fn accept_updates_counts_and_need() {
        let mut acc = Accounting::new(&scenario(10, &[("x", 3)]));
        let c = candidate(0, &[("x", true)]);
        acc.apply_accept(&c).unwrap();
        assert_eq!(acc.admitted(), 1);
        assert_eq!(acc.need(&attr("x")), 2);
        assert_eq!(acc.remaining(), 9);
    }

    #[test]
    fn overlapping_accept_clears_multiple_needs() {
        let mut acc = Accounting::new(&scenario(2, &[("x", 1), ("y", 1)]));
        let c = candidate(0, &[("x", true), ("y", true)]);
        assert!(acc.is_helpful(&c));
        acc.apply_accept(&c).unwrap();
        assert_eq!(acc.slack(), 0);
    }

    #[test]
    fn capacity_overflow_is_rejected() {
        let mut acc = Accounting::new(&scenario(1, &[]));
        let c = candidate(0, &[]);
        acc.apply_accept(&c).unwrap();
        let err = acc.apply_accept(&c).unwrap_err();
        assert!(matches!(err, Error::CapacityOverflow { .. }));
    }

    #[test]
    fn zero_min_count_never_contributes_to_slack() {
        let acc = Accounting::new(&scenario(10, &[("x", 0)]));
        assert_eq!(acc.need(&attr("x")), 0);
        assert_eq!(acc.slack(), 0);
    }

    #[test]
    fn completion_requires_full_capacity_and_zero_need() {
        let mut acc = Accounting::new(&scenario(1, &[("x", 1)]));
        assert!(!acc.is_complete());
        acc.apply_accept(&candidate(0, &[("x", true)])).unwrap();
        assert!(acc.is_complete());
    }

    #[test]
    fn feasibility_check_trips_when_slack_exceeds_remaining() {
        let acc = Accounting::new(&scenario(1, &[("x", 1), ("y", 1)]));
        assert!(acc.check_feasible().is_err());
    }
}
