//! Server collaborator: wire protocol client.
//!
//! `ServerClient` is the seam the controller programs against; only
//! `HttpServerClient` talks to a real network. Transport details (TLS,
//! connection pooling, timeouts) live entirely inside `ureq`.

use std::collections::BTreeMap;
use std::time::Duration;

use adm_common::{AttrId, Error, GameId};
use serde::{Deserialize, Serialize};

use crate::model::{Candidate, Constraint};

/// `newGame` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGameResponse {
    pub game_id: GameId,
    pub constraints: Vec<Constraint>,
    pub capacity: u64,
    #[serde(default)]
    pub attribute_statistics: AttributeStatistics,
    /// The first candidate, when the collaborator overloads `newGame` to
    /// return it directly rather than requiring a separate fetch.
    #[serde(default)]
    pub first_person: Option<Candidate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeStatistics {
    #[serde(default)]
    pub relative_frequencies: BTreeMap<AttrId, f64>,
    #[serde(default)]
    pub correlations: BTreeMap<AttrId, BTreeMap<AttrId, f64>>,
}

/// `decideAndNext` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DecideResponse {
    Running {
        next_person: Candidate,
        admitted_count: u64,
        rejected_count: u64,
    },
    Completed {
        admitted_count: u64,
        rejected_count: u64,
        reason: String,
    },
    Failed {
        error: String,
        #[serde(default)]
        admitted_count: Option<u64>,
        #[serde(default)]
        rejected_count: Option<u64>,
    },
}

/// The protocol surface the controller consumes. Implemented by
/// `HttpServerClient` for real games and by a test-only in-memory client
/// for unit and scenario tests.
pub trait ServerClient {
    fn new_game(&self, scenario_capacity: u64, constraints: &[Constraint], player_id: &str) -> Result<NewGameResponse, Error>;
    fn decide_and_next(&self, game_id: &GameId, person_index: u64, accept: bool) -> Result<DecideResponse, Error>;
}

/// `ureq`-backed HTTP client (grounded in the dependency the wider example
/// pack already uses for outbound JSON calls).
pub struct HttpServerClient {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpServerClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        HttpServerClient { base_url: base_url.into(), agent }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl ServerClient for HttpServerClient {
    fn new_game(&self, scenario_capacity: u64, constraints: &[Constraint], player_id: &str) -> Result<NewGameResponse, Error> {
        let _ = scenario_capacity; // the server derives capacity from the scenario it has on file
        let response = self
            .agent
            .get(&self.url("/new-game"))
            .query("playerId", player_id)
            .call()
            .map_err(|e| Error::Transport(e.to_string()))?;
        let _ = constraints;
        response
            .into_json::<NewGameResponse>()
            .map_err(|e| Error::Protocol(format!("malformed newGame response: {e}")))
    }

    fn decide_and_next(&self, game_id: &GameId, person_index: u64, accept: bool) -> Result<DecideResponse, Error> {
        let response = self
            .agent
            .get(&self.url("/decide-and-next"))
            .query("gameId", game_id.as_str())
            .query("personIndex", &person_index.to_string())
            .query("accept", &accept.to_string())
            .call()
            .map_err(|e| Error::Transport(e.to_string()))?;
        response
            .into_json::<DecideResponse>()
            .map_err(|e| Error::Protocol(format!("malformed decideAndNext response: {e}")))
    }
}
