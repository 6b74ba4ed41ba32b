//! Offline `ServerClient` backed by a local scenario file.
//!
//! `--scenario` points at a JSON description of the game (capacity,
//! constraints, relative frequencies, correlations) instead of a live
//! server. Candidates are sampled independently per attribute from the
//! scenario's relative frequencies using `rand`'s seedable generator for
//! repeatable synthetic sampling. The stream is capped at `max_candidates`
//! so a misconfigured scenario
//! (frequencies too low to ever fill capacity) fails loudly instead of
//! looping forever.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use adm_common::{AttrId, Error, GameId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::model::{Candidate, Constraint};
use crate::server::{AttributeStatistics, DecideResponse, NewGameResponse, ServerClient};

fn default_max_candidates() -> u64 {
    200_000
}

/// On-disk shape of a `--scenario` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalScenarioFile {
    pub capacity: u64,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    #[serde(default)]
    pub relative_frequencies: BTreeMap<AttrId, f64>,
    #[serde(default)]
    pub correlations: BTreeMap<AttrId, BTreeMap<AttrId, f64>>,
    #[serde(default = "default_max_candidates")]
    pub max_candidates: u64,
}

struct LocalState {
    rng: StdRng,
    admitted: u64,
    rejected: u64,
    next_index: u64,
}

/// Replays a [`LocalScenarioFile`] as if it were a live server, generating
/// candidates on demand instead of fetching them over HTTP.
pub struct LocalServerClient {
    scenario: LocalScenarioFile,
    game_id: GameId,
    stream_limit: u64,
    state: RefCell<LocalState>,
}

impl LocalServerClient {
    pub fn new(scenario: LocalScenarioFile, game_id: GameId, start_index: u64) -> Self {
        let seed = seed_from_game_id(&game_id);
        let stream_limit = start_index + scenario.max_candidates;
        let state = LocalState { rng: StdRng::seed_from_u64(seed), admitted: 0, rejected: 0, next_index: start_index };
        LocalServerClient { scenario, game_id, stream_limit, state: RefCell::new(state) }
    }

    fn sample(&self, state: &mut LocalState) -> Candidate {
        let attributes = self
            .scenario
            .relative_frequencies
            .iter()
            .map(|(attr, p)| (attr.clone(), state.rng.random_bool(p.clamp(0.0, 1.0))))
            .collect();
        let candidate = Candidate { index: state.next_index, attributes };
        state.next_index += 1;
        candidate
    }
}

fn seed_from_game_id(game_id: &GameId) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    game_id.as_str().hash(&mut hasher);
    hasher.finish()
}

impl ServerClient for LocalServerClient {
    fn new_game(&self, _scenario_capacity: u64, _constraints: &[Constraint], _player_id: &str) -> Result<NewGameResponse, Error> {
        let mut state = self.state.borrow_mut();
        let first = self.sample(&mut state);
        Ok(NewGameResponse {
            game_id: self.game_id.clone(),
            constraints: self.scenario.constraints.clone(),
            capacity: self.scenario.capacity,
            attribute_statistics: AttributeStatistics {
                relative_frequencies: self.scenario.relative_frequencies.clone(),
                correlations: self.scenario.correlations.clone(),
            },
            first_person: Some(first),
        })
    }

    fn decide_and_next(&self, game_id: &GameId, _person_index: u64, accept: bool) -> Result<DecideResponse, Error> {
        if game_id != &self.game_id {
            return Err(Error::Protocol(format!("unknown local game id {game_id}")));
        }
        let mut state = self.state.borrow_mut();
        if accept {
            state.admitted += 1;
        } else {
            state.rejected += 1;
        }
        if state.admitted >= self.scenario.capacity {
            return Ok(DecideResponse::Completed {
                admitted_count: state.admitted,
                rejected_count: state.rejected,
                reason: "capacity filled".into(),
            });
        }
        if state.next_index >= self.stream_limit {
            return Ok(DecideResponse::Failed {
                error: "local candidate stream exhausted before capacity was filled".into(),
                admitted_count: Some(state.admitted),
                rejected_count: Some(state.rejected),
            });
        }
        let next_person = self.sample(&mut state);
        Ok(DecideResponse::Running { next_person, admitted_count: state.admitted, rejected_count: state.rejected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> LocalScenarioFile {
        LocalScenarioFile {
            capacity: 2,
            constraints: vec![Constraint { attribute: AttrId::new("x"), min_count: 1 }],
            relative_frequencies: BTreeMap::from([(AttrId::new("x"), 1.0)]),
            correlations: BTreeMap::new(),
            max_candidates: 10,
        }
    }

    #[test]
    fn same_game_id_is_deterministic() {
        let a = LocalServerClient::new(scenario(), GameId::new("g"), 0);
        let b = LocalServerClient::new(scenario(), GameId::new("g"), 0);
        let first_a = a.new_game(0, &[], "p").unwrap().first_person.unwrap();
        let first_b = b.new_game(0, &[], "p").unwrap().first_person.unwrap();
        assert_eq!(first_a.attributes, first_b.attributes);
    }

    #[test]
    fn completes_once_capacity_is_reached() {
        let client = LocalServerClient::new(scenario(), GameId::new("g"), 0);
        let game = client.new_game(0, &[], "p").unwrap();
        client.decide_and_next(&game.game_id, 0, true).unwrap();
        let result = client.decide_and_next(&game.game_id, 1, true).unwrap();
        assert!(matches!(result, DecideResponse::Completed { admitted_count: 2, .. }));
    }

    #[test]
    fn rejects_unknown_game_id() {
        let client = LocalServerClient::new(scenario(), GameId::new("g"), 0);
        let err = client.decide_and_next(&GameId::new("other"), 0, true).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn fails_when_stream_is_exhausted_before_capacity() {
        let mut s = scenario();
        s.capacity = 100;
        s.max_candidates = 1;
        let client = LocalServerClient::new(s, GameId::new("g"), 0);
        let game = client.new_game(0, &[], "p").unwrap();
        let result = client.decide_and_next(&game.game_id, 0, false).unwrap();
        assert!(matches!(result, DecideResponse::Failed { .. }));
    }
}
