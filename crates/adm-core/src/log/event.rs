//! Event kinds written to the durable NDJSON log.

use std::collections::BTreeMap;

use adm_common::{AttrId, GameId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Constraint, Decision};

/// One line of the event log. `kind` is carried as an internal tag so the
/// Each line in the NDJSON file self-describes its own record via `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Start {
        ts: DateTime<Utc>,
        game_id: GameId,
        scenario: Option<String>,
        capacity: u64,
        constraints: Vec<Constraint>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        relative_frequencies: Option<BTreeMap<AttrId, f64>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correlations: Option<BTreeMap<AttrId, BTreeMap<AttrId, f64>>>,
        policy: String,
        policy_params: serde_json::Value,
    },
    Request {
        ts: DateTime<Utc>,
        game_id: GameId,
        person_index: u64,
        attributes: BTreeMap<AttrId, bool>,
    },
    Response {
        ts: DateTime<Utc>,
        game_id: GameId,
        person_index: u64,
        decision: Decision,
    },
    Progress {
        ts: DateTime<Utc>,
        game_id: GameId,
        admitted: u64,
        rejected: u64,
        count_by_attr: BTreeMap<AttrId, u64>,
    },
    Resync {
        ts: DateTime<Utc>,
        game_id: GameId,
        expected: u64,
        submitted: u64,
    },
    Completed {
        ts: DateTime<Utc>,
        game_id: GameId,
        admitted: u64,
        rejected: u64,
        reason: String,
    },
    Failed {
        ts: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        game_id: Option<GameId>,
        error: String,
    },
}

impl Event {
    /// The event kind as written in the `kind` tag, for logging/metrics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Event::Start { .. } => "start",
            Event::Request { .. } => "request",
            Event::Response { .. } => "response",
            Event::Progress { .. } => "progress",
            Event::Resync { .. } => "resync",
            Event::Completed { .. } => "completed",
            Event::Failed { .. } => "failed",
        }
    }
}
