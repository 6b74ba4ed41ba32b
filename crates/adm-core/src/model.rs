//! Scenario and candidate data model.

use adm_common::AttrId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One `(attribute, minimum count)` pair. The scenario carries an ordered
/// sequence of these with unique attribute ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub attribute: AttrId,
    pub min_count: u64,
}

/// The game scenario: constraints, capacity, and optional priors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Optional human-readable label; participates in no decision.
    #[serde(default)]
    pub name: Option<String>,
    pub constraints: Vec<Constraint>,
    pub capacity: u64,
    /// Relative frequency prior per attribute, in `[0, 1]`.
    #[serde(default)]
    pub relative_frequencies: BTreeMap<AttrId, f64>,
    /// Symmetric pairwise correlation matrix, diagonal 1, off-diagonal in
    /// `[-1, 1]`. Stored nested (`A -> A -> float`) to match the wire
    /// protocol's `attributeStatistics.correlations` shape; `correlation`
    /// looks up either order regardless of which side was populated.
    #[serde(default)]
    pub correlations: BTreeMap<AttrId, BTreeMap<AttrId, f64>>,
}

impl Scenario {
    /// Symmetric correlation lookup; `1.0` on the diagonal by construction
    /// even if not explicitly present, `0.0` if entirely unspecified.
    pub fn correlation(&self, a: &AttrId, b: &AttrId) -> f64 {
        if a == b {
            return 1.0;
        }
        self.correlations
            .get(a)
            .and_then(|row| row.get(b))
            .or_else(|| self.correlations.get(b).and_then(|row| row.get(a)))
            .copied()
            .unwrap_or(0.0)
    }

    /// The constrained attribute ids, in declaration order.
    pub fn attribute_ids(&self) -> Vec<AttrId> {
        self.constraints.iter().map(|c| c.attribute.clone()).collect()
    }
}

/// One arriving candidate. Indices arrive in strictly increasing order
/// starting at 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub index: u64,
    pub attributes: BTreeMap<AttrId, bool>,
}

impl Candidate {
    pub fn has(&self, a: &AttrId) -> bool {
        self.attributes.get(a).copied().unwrap_or(false)
    }
}

/// An irrevocable per-candidate decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn is_accept(self) -> bool {
        matches!(self, Decision::Accept)
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Accept => write!(f, "accept"),
            Decision::Reject => write!(f, "reject"),
        }
    }
}
