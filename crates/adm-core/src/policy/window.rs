//! Sliding-window relaxed policy.

use std::collections::VecDeque;

use adm_math::break_even_rate;

use crate::accounting::Accounting;
use crate::model::{Candidate, Decision};

use super::{reserve_decide, AdmissionPolicy};

/// Ring buffer of the last `window_size` helpfulness observations.
#[derive(Debug, Clone)]
pub struct WindowPolicy {
    window_size: usize,
    min_observations: u64,
    margin: f64,
    ring: VecDeque<bool>,
    helpful_count: u64,
    observed: u64,
}

impl WindowPolicy {
    pub fn new(window_size: usize, min_observations: u64, margin: f64) -> Self {
        WindowPolicy {
            window_size: window_size.max(1),
            min_observations,
            margin,
            ring: VecDeque::with_capacity(window_size.max(1)),
            helpful_count: 0,
            observed: 0,
        }
    }

    fn push(&mut self, helpful: bool) {
        if self.ring.len() == self.window_size {
            if let Some(evicted) = self.ring.pop_front() {
                if evicted {
                    self.helpful_count -= 1;
                }
            }
        }
        self.ring.push_back(helpful);
        if helpful {
            self.helpful_count += 1;
        }
        self.observed += 1;
    }

    fn estimate(&self) -> f64 {
        let denom = self.ring.len().min(self.window_size).max(1) as f64;
        self.helpful_count as f64 / denom
    }

    fn decide_with(&self, candidate: &Candidate, accounting: &Accounting, helpful: bool) -> Decision {
        if self.observed < self.min_observations || helpful {
            return reserve_decide(candidate, accounting);
        }
        let slack = accounting.slack() as f64;
        let remaining = accounting.remaining() as i64;
        let threshold = break_even_rate(slack, remaining) * (1.0 + self.margin);
        if self.estimate() >= threshold && accounting.slack() < accounting.remaining() {
            Decision::Accept
        } else {
            Decision::Reject
        }
    }
}

impl AdmissionPolicy for WindowPolicy {
    fn decide(&mut self, candidate: &Candidate, accounting: &Accounting) -> Decision {
        let helpful = accounting.is_helpful(candidate);
        self.push(helpful);
        self.decide_with(candidate, accounting, helpful)
    }

    fn record_observation(&mut self, candidate: &Candidate, accounting: &Accounting) {
        let helpful = accounting.is_helpful(candidate);
        self.push(helpful);
    }
}
