//! Run controller: the per-candidate loop, retries, resync, logging.
//!
//! States: `Starting -> Running <-> Retrying/Resyncing -> {Completed, Failed}`.
//! `Cancelled` is reached only via an external stop signal checked between
//! candidates, never by the server.

use std::thread;

use adm_common::{Error, GameId};
use adm_config::PolicyParams;
use tracing::{info, warn};

use crate::accounting::Accounting;
use crate::backoff::{backoff_delay, DEFAULT_BASE, DEFAULT_CAP, DEFAULT_FACTOR};
use crate::log::{Event, EventLog};
use crate::model::{Candidate, Decision, Scenario};
use crate::policy::Policy;
use crate::policy_builder::build_policy;
use crate::reconstruct::reconstruct_up_to;
use crate::server::{DecideResponse, ServerClient};

/// Terminal outcome of a run, used to choose the process exit code.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed { admitted: u64, rejected: u64 },
    Failed { reason: String },
    Cancelled,
}

/// Parses the server's expected-index-skew error string, e.g.
/// `"Expected person 5, got 7"`.
fn parse_expected_index_skew(error: &str) -> Option<(u64, u64)> {
    let rest = error.strip_prefix("Expected person ")?;
    let (expected_str, rest) = rest.split_once(", got ")?;
    let expected = expected_str.trim().parse().ok()?;
    let submitted = rest.trim().trim_end_matches('.').parse().ok()?;
    Some((expected, submitted))
}

/// External cancellation signal, checked between candidates only — never
/// mid-decision.
pub trait CancelSignal {
    fn is_cancelled(&self) -> bool;
}

impl CancelSignal for std::sync::atomic::AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(std::sync::atomic::Ordering::Relaxed)
    }
}

/// Never cancels; used when the caller has no external signal to wire up.
pub struct NeverCancel;

impl CancelSignal for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

pub struct Controller<'a, S: ServerClient, C: CancelSignal> {
    server: &'a S,
    log: &'a EventLog,
    player_id: String,
    retries: u32,
    progress_interval: u64,
    log_interval: u64,
    cancel: &'a C,
}

impl<'a, S: ServerClient, C: CancelSignal> Controller<'a, S, C> {
    /// `progress_interval` governs the durable NDJSON `progress` event
    /// cadence (§6.2); `log_interval` is the independent cadence for the
    /// `tracing` console progress line emitted by this controller — the two
    /// serve different audiences (audit trail vs. operator console) and are
    /// allowed to differ.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        server: &'a S,
        log: &'a EventLog,
        player_id: impl Into<String>,
        retries: u32,
        progress_interval: u64,
        log_interval: u64,
        cancel: &'a C,
    ) -> Self {
        Controller { server, log, player_id: player_id.into(), retries, progress_interval, log_interval, cancel }
    }

    /// `Starting`: fetch the scenario, construct a fresh accounting and
    /// policy, log `start`, and run to completion.
    pub fn run_fresh(&self, scenario_capacity: u64, constraints: &[crate::model::Constraint], params: &PolicyParams) -> RunOutcome {
        let new_game = match self.server.new_game(scenario_capacity, constraints, &self.player_id) {
            Ok(g) => g,
            Err(e) => return self.fail(None, format!("newGame failed: {e}")),
        };

        let scenario = Scenario {
            name: None,
            capacity: new_game.capacity,
            constraints: new_game.constraints,
            relative_frequencies: new_game.attribute_statistics.relative_frequencies,
            correlations: new_game.attribute_statistics.correlations,
        };
        let mut accounting = Accounting::new(&scenario);
        let mut policy = build_policy(&scenario, params);

        if let Err(e) = self.log.append(&Event::Start {
            ts: now(),
            game_id: new_game.game_id.clone(),
            scenario: scenario.name.clone(),
            capacity: scenario.capacity,
            constraints: scenario.constraints.clone(),
            relative_frequencies: Some(scenario.relative_frequencies.clone()),
            correlations: Some(scenario.correlations.clone()),
            policy: params.kind.to_string(),
            policy_params: serde_json::to_value(params).unwrap_or(serde_json::Value::Null),
        }) {
            return self.fail(Some(&new_game.game_id), format!("log write failed: {e}"));
        }

        let first = match new_game.first_person {
            Some(c) => c,
            None => match self.server.decide_and_next(&new_game.game_id, 0, false) {
                Ok(DecideResponse::Running { next_person, .. }) => next_person,
                Ok(DecideResponse::Completed { admitted_count, rejected_count, .. }) => {
                    return RunOutcome::Completed { admitted: admitted_count, rejected: rejected_count };
                }
                Ok(DecideResponse::Failed { error, .. }) => {
                    return self.fail(Some(&new_game.game_id), error);
                }
                Err(e) => return self.fail(Some(&new_game.game_id), format!("{e}")),
            },
        };

        self.run_loop(new_game.game_id, &mut accounting, &mut policy, first, 0, params)
    }

    /// `Resuming`: a distinct entry point fed by the reconstructor.
    ///
    /// `last_decision` is the decision logged for `next_index - 1`; the
    /// server exposes no "fetch candidate by index" call of its own, so
    /// resuming means resubmitting that same `decideAndNext` verbatim to
    /// get the next candidate back (it is idempotent on the server side
    /// because the index has not advanced since our crash).
    #[allow(clippy::too_many_arguments)]
    pub fn run_resumed(
        &self,
        game_id: GameId,
        _scenario: Scenario,
        mut accounting: Accounting,
        mut policy: Policy,
        next_index: u64,
        last_decision: Option<Decision>,
        params: &PolicyParams,
    ) -> RunOutcome {
        let accept = last_decision.map(|d| d.is_accept()).unwrap_or(false);
        let next = match self.server.decide_and_next(&game_id, next_index.saturating_sub(1), accept) {
            Ok(DecideResponse::Running { next_person, .. }) => next_person,
            Ok(DecideResponse::Completed { admitted_count, rejected_count, .. }) => {
                return RunOutcome::Completed { admitted: admitted_count, rejected: rejected_count };
            }
            Ok(DecideResponse::Failed { error, .. }) => return self.fail(Some(&game_id), error),
            Err(e) => return self.fail(Some(&game_id), format!("{e}")),
        };
        self.run_loop(game_id, &mut accounting, &mut policy, next, next_index, params)
    }

    #[allow(clippy::too_many_arguments)]
    fn run_loop(
        &self,
        game_id: GameId,
        accounting: &mut Accounting,
        policy: &mut Policy,
        mut candidate: Candidate,
        mut decisions_logged: u64,
        params: &PolicyParams,
    ) -> RunOutcome {
        let mut rejected: u64 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return RunOutcome::Cancelled;
            }

            if let Err(e) = self.log.append(&Event::Request {
                ts: now(),
                game_id: game_id.clone(),
                person_index: candidate.index,
                attributes: candidate.attributes.clone(),
            }) {
                return self.fail(Some(&game_id), format!("log write failed: {e}"));
            }

            let decision = policy.decide(&candidate, accounting);
            if decision.is_accept() {
                if let Err(e) = accounting.apply_accept(&candidate) {
                    return self.fail(Some(&game_id), format!("{e}"));
                }
                policy.on_accept(&candidate);
            } else {
                rejected += 1;
            }

            if let Err(e) = self.log.append(&Event::Response {
                ts: now(),
                game_id: game_id.clone(),
                person_index: candidate.index,
                decision,
            }) {
                return self.fail(Some(&game_id), format!("log write failed: {e}"));
            }

            decisions_logged += 1;
            if self.progress_interval > 0 && decisions_logged % self.progress_interval == 0 {
                let _ = self.log.append(&Event::Progress {
                    ts: now(),
                    game_id: game_id.clone(),
                    admitted: accounting.admitted(),
                    rejected,
                    count_by_attr: accounting.count_by_attr().clone(),
                });
            }
            if self.log_interval > 0 && decisions_logged % self.log_interval == 0 {
                info!(admitted = accounting.admitted(), rejected, remaining = accounting.remaining(), "progress");
            }

            if accounting.is_complete() {
                let _ = self.log.append(&Event::Completed {
                    ts: now(),
                    game_id: game_id.clone(),
                    admitted: accounting.admitted(),
                    rejected,
                    reason: "capacity filled, all quotas met".into(),
                });
                return RunOutcome::Completed { admitted: accounting.admitted(), rejected };
            }

            match self.submit_with_retry(&game_id, candidate.index, decision.is_accept()) {
                Ok(DecideResponse::Running { next_person, .. }) => candidate = next_person,
                Ok(DecideResponse::Completed { admitted_count, rejected_count, .. }) => {
                    return RunOutcome::Completed { admitted: admitted_count, rejected: rejected_count };
                }
                Ok(DecideResponse::Failed { error, .. }) => {
                    if let Some((expected, submitted)) = parse_expected_index_skew(&error) {
                        warn!(expected, submitted, "resyncing after expected-index skew");
                        let _ = self.log.append(&Event::Resync {
                            ts: now(),
                            game_id: game_id.clone(),
                            expected,
                            submitted,
                        });
                        match self.rebuild_after_resync(&game_id, params, expected) {
                            Ok((rebuilt_accounting, rebuilt_policy, refetched)) => {
                                *accounting = rebuilt_accounting;
                                *policy = rebuilt_policy;
                                candidate = refetched;
                                continue;
                            }
                            Err(e) => return self.fail(Some(&game_id), format!("resync recovery failed: {e}")),
                        }
                    }
                    return self.fail(Some(&game_id), error);
                }
                Err(e) => return self.fail(Some(&game_id), format!("{e}")),
            }
        }
    }

    /// Recover from an expected-index-skew resync: rebuild accounting and
    /// policy from the durable log, discarding any entries at or past
    /// `expected` (they cover candidates the server never actually
    /// confirmed, and replaying them again after the refetch below would
    /// double-count accepts), then fetch the candidate the server says it
    /// actually expects next.
    fn rebuild_after_resync(
        &self,
        game_id: &GameId,
        params: &PolicyParams,
        expected: u64,
    ) -> Result<(Accounting, Policy, Candidate), Error> {
        let reconstructed = reconstruct_up_to(self.log.path(), params, Some(expected))?;
        let candidate = self.refetch_at(game_id, expected)?;
        Ok((reconstructed.accounting, reconstructed.policy, candidate))
    }

    fn refetch_at(&self, game_id: &GameId, index: u64) -> Result<Candidate, Error> {
        match self.server.decide_and_next(game_id, index, false)? {
            DecideResponse::Running { next_person, .. } => Ok(next_person),
            DecideResponse::Completed { .. } => {
                Err(Error::ServerFailed("resync refetch returned completed".into()))
            }
            DecideResponse::Failed { error, .. } => Err(Error::ServerFailed(error)),
        }
    }

    /// Exponential backoff retry of one `decideAndNext` submission
    /// (the transient-transport branch). Only `Error::Transport`
    /// is retried; protocol/invariant errors propagate immediately.
    fn submit_with_retry(&self, game_id: &GameId, index: u64, accept: bool) -> Result<DecideResponse, Error> {
        let mut attempt = 0;
        loop {
            match self.server.decide_and_next(game_id, index, accept) {
                Ok(r) => return Ok(r),
                Err(Error::Transport(msg)) if attempt < self.retries => {
                    let delay = backoff_delay(attempt, DEFAULT_BASE, DEFAULT_FACTOR, DEFAULT_CAP);
                    warn!(attempt, %msg, ?delay, "transient transport error, retrying");
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn fail(&self, game_id: Option<&GameId>, reason: String) -> RunOutcome {
        let _ = self.log.append(&Event::Failed { ts: now(), game_id: game_id.cloned(), error: reason.clone() });
        info!(reason = %reason, "game failed");
        RunOutcome::Failed { reason }
    }
}

fn now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}
