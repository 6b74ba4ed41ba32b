//! Single-rate relaxed policy.

use adm_math::{break_even_rate, ewma_update};

use crate::accounting::Accounting;
use crate::model::{Candidate, Decision};

use super::{reserve_decide, AdmissionPolicy};

#[derive(Debug, Clone, Copy)]
pub struct GlobalEwmaPolicy {
    alpha: f64,
    margin: f64,
    warmup: u64,
    p_hat: f64,
    n: u64,
}

impl GlobalEwmaPolicy {
    pub fn new(alpha: f64, margin: f64, warmup: u64) -> Self {
        GlobalEwmaPolicy { alpha, margin, warmup, p_hat: 0.5, n: 0 }
    }

    /// Construct with an explicit starting estimate, used by the
    /// reconstructor to resume mid-stream without re-deriving `p_hat` by
    /// replaying from 0.5 (it replays the full log instead, but this
    /// constructor keeps the two code paths — fresh start and resume —
    /// symmetric).
    pub fn with_state(alpha: f64, margin: f64, warmup: u64, p_hat: f64, n: u64) -> Self {
        GlobalEwmaPolicy { alpha, margin, warmup, p_hat, n }
    }

    pub fn p_hat(&self) -> f64 {
        self.p_hat
    }

    pub fn observations(&self) -> u64 {
        self.n
    }

    fn update(&mut self, helpful: bool) {
        self.p_hat = ewma_update(self.p_hat, helpful, self.alpha);
    }
}

impl AdmissionPolicy for GlobalEwmaPolicy {
    fn decide(&mut self, candidate: &Candidate, accounting: &Accounting) -> Decision {
        let helpful = accounting.is_helpful(candidate);
        self.update(helpful);

        let decision = if self.n < self.warmup || helpful {
            reserve_decide(candidate, accounting)
        } else {
            let threshold = break_even_rate(accounting.slack() as f64, accounting.remaining() as i64)
                * (1.0 + self.margin);
            if self.p_hat >= threshold && accounting.slack() < accounting.remaining() {
                Decision::Accept
            } else {
                Decision::Reject
            }
        };
        self.n += 1;
        decision
    }

    fn record_observation(&mut self, candidate: &Candidate, accounting: &Accounting) {
        let helpful = accounting.is_helpful(candidate);
        self.update(helpful);
        self.n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Constraint, Scenario};
    use adm_common::AttrId;
    use std::collections::BTreeMap;

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
            relative_frequencies: BTreeMap::new(),
            correlations: BTreeMap::new(),
        }
    }

    fn candidate(index: u64, attrs: &[(&str, bool)]) -> Candidate {
        Candidate { index, attributes: attrs.iter().map(|(a, v)| (attr(a), *v)).collect() }
    }

    #[test]
    fn p_hat_stays_in_unit_interval() {
        let mut p = GlobalEwmaPolicy::new(0.3, 0.0, 0);
        let scenario = scenario(10, &[("x", 1)]);
        let mut acc = Accounting::new(&scenario);
        for i in 0..20u64 {
            let c = candidate(i, &[("x", i % 3 == 0)]);
            let d = p.decide(&c, &acc);
            if d.is_accept() && acc.admitted() < acc.capacity() {
                let _ = acc.apply_accept(&c);
            }
            assert!((0.0..=1.0).contains(&p.p_hat()));
        }
    }

    #[test]
    fn e4_ewma_warmup_with_all_non_helpful_arrivals_fails_constraint() {
        let scenario = scenario(10, &[("x", 3)]);
        let mut acc = Accounting::new(&scenario);
        let mut p = GlobalEwmaPolicy::new(0.1, 0.0, 5);
        let mut decisions = vec![];
        for i in 0..10u64 {
            let c = candidate(i, &[("x", false)]);
            let d = p.decide(&c, &acc);
            decisions.push(d);
            if d.is_accept() {
                acc.apply_accept(&c).unwrap();
            }
        }
        assert_eq!(acc.admitted(), 5);
        assert_eq!(acc.need(&attr("x")), 3);
        assert!(!acc.is_complete());
    }

    #[test]
    fn warmup_defers_to_reserve_rule() {
        let scenario = scenario(10, &[("x", 1)]);
        let acc = Accounting::new(&scenario);
        let mut p = GlobalEwmaPolicy::new(0.1, 0.0, 100);
        let c = candidate(0, &[("x", false)]);
        assert_eq!(p.decide(&c, &acc), Decision::Accept);
    }
}
