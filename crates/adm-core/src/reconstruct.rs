//! Rebuilds accounting and policy state from a prior event log.
//!
//! Grounded on the same replay-to-resume shape as a session-resume
//! reconstructor: scan forward once, trust only durable events, and hand
//! back state the controller can continue from without re-deriving
//! anything from the live server.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use adm_common::{Error, GameId};
use adm_config::PolicyParams;

use crate::accounting::Accounting;
use crate::log::Event;
use crate::model::{Candidate, Scenario};
use crate::policy::Policy;
use crate::policy_builder::build_policy;

/// Result of replaying a log: accounting and policy state as of the last
/// durable event, plus the index the controller should resume from.
pub struct Reconstructed {
    pub accounting: Accounting,
    pub policy: Policy,
    pub game_id: GameId,
    pub scenario: Scenario,
    /// The first `personIndex` not yet observed in the log.
    pub next_index: u64,
    /// The decision logged for `next_index - 1`, needed to resubmit the
    /// same `decideAndNext` call the controller made just before the crash
    /// (the server has no "fetch candidate by index" operation on its own).
    pub last_decision: Option<crate::model::Decision>,
}

/// Replay `path` to rebuild state for `params`. The policy constructed here
/// must match the one that produced the log (caller passes the same
/// construction parameters the original run used); a mismatch is a caller
/// error, not something this function can detect from the log alone.
pub fn reconstruct(path: impl AsRef<Path>, params: &PolicyParams) -> Result<Reconstructed, Error> {
    reconstruct_up_to(path, params, None)
}

/// Replay `path` as [`reconstruct`] does, but discard any `Request`/
/// `Response` pair whose `personIndex >= stop_before_index`.
///
/// Used by the controller to rebuild accounting and policy state after an
/// expected-index-skew resync: the log already holds entries for candidates
/// the server never actually confirmed past `stop_before_index`, and those
/// must not be folded into the rebuilt state a second time.
pub fn reconstruct_up_to(
    path: impl AsRef<Path>,
    params: &PolicyParams,
    stop_before_index: Option<u64>,
) -> Result<Reconstructed, Error> {
    let file = File::open(path.as_ref())
        .map_err(|source| Error::LogWrite { path: path.as_ref().display().to_string(), source })?;
    let reader = BufReader::new(file);

    let mut game_id: Option<GameId> = None;
    let mut scenario: Option<Scenario> = None;
    let mut accounting: Option<Accounting> = None;
    let mut policy: Option<Policy> = None;
    let mut highest_index: Option<u64> = None;
    let mut last_candidate: Option<Candidate> = None;
    let mut last_decision: Option<crate::model::Decision> = None;

    for line in reader.lines() {
        let line = line.map_err(|source| Error::LogWrite {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let event: Event = serde_json::from_str(&line)
            .map_err(|e| Error::LogParse(format!("malformed event line: {e}")))?;

        match event {
            Event::Start {
                game_id: gid,
                capacity,
                constraints,
                relative_frequencies,
                correlations,
                scenario: name,
                ..
            } => {
                let built = Scenario {
                    name,
                    capacity,
                    constraints,
                    relative_frequencies: relative_frequencies.unwrap_or_default(),
                    correlations: correlations.unwrap_or_default(),
                };
                accounting = Some(Accounting::new(&built));
                policy = Some(build_policy(&built, params));
                scenario = Some(built);
                game_id = Some(gid);
            }
            Event::Request { person_index, attributes, .. } => {
                if stop_before_index.is_some_and(|stop| person_index >= stop) {
                    continue;
                }
                highest_index = Some(person_index);
                let candidate = Candidate { index: person_index, attributes };
                if let (Some(acc), Some(pol)) = (accounting.as_ref(), policy.as_mut()) {
                    pol.record_observation(&candidate, acc);
                }
                last_candidate = Some(candidate);
            }
            Event::Response { person_index, decision, .. } => {
                if stop_before_index.is_some_and(|stop| person_index >= stop) {
                    continue;
                }
                if decision.is_accept() {
                    if let (Some(acc), Some(candidate)) = (accounting.as_mut(), &last_candidate) {
                        if candidate.index == person_index {
                            acc.apply_accept(candidate)?;
                        }
                    }
                }
                if last_candidate.as_ref().is_some_and(|c| c.index == person_index) {
                    last_decision = Some(decision);
                }
            }
            Event::Resync { .. } | Event::Progress { .. } | Event::Completed { .. } | Event::Failed { .. } => {}
        }
    }

    let game_id = game_id.ok_or_else(|| Error::LogParse("log has no start event".into()))?;
    let scenario = scenario.ok_or_else(|| Error::LogParse("log has no start event".into()))?;
    let accounting = accounting.ok_or_else(|| Error::LogParse("log has no start event".into()))?;
    let policy = policy.ok_or_else(|| Error::LogParse("log has no start event".into()))?;
    let next_index = match stop_before_index {
        Some(stop) => stop,
        None => highest_index.map(|i| i + 1).unwrap_or(0),
    };

    Ok(Reconstructed { accounting, policy, game_id, scenario, next_index, last_decision })
}
