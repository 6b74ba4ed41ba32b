//! Unified error taxonomy for the admission-control agent.
//!
//! Transient transport errors are
//! retried by the controller and never surface here; everything that does
//! surface as an `Error` is, by construction, fatal to the current game.
//! Resync (expected-index skew) is *not* an error variant — it is a
//! controller state transition (`Resyncing`) and is represented in
//! `adm-core::controller` directly.

use serde::Serialize;
use thiserror::Error;

/// Result type alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories, for grouping in the `failed` event and for the
/// agent-facing JSON error shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or out-of-range CLI arguments / configuration.
    Config,
    /// Exhausted the retry budget on a transient transport failure.
    Transport,
    /// Server response could not be decoded, or violated the documented
    /// wire contract.
    Protocol,
    /// A programming-error check tripped: `S > R` locally, or an accept
    /// would push `admitted > C`.
    Invariant,
    /// The durable event log could not be written.
    Log,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Transport => write!(f, "transport"),
            ErrorCategory::Protocol => write!(f, "protocol"),
            ErrorCategory::Invariant => write!(f, "invariant"),
            ErrorCategory::Log => write!(f, "log"),
        }
    }
}

/// Unified error type for the admission-control agent.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("transport error after exhausting retry budget: {0}")]
    Transport(String),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("locally detected infeasibility: slack {slack} exceeds remaining capacity {remaining}")]
    Infeasible { slack: u64, remaining: u64 },

    #[error("capacity overflow: accept would push admitted to {would_be}, capacity is {capacity}")]
    CapacityOverflow { would_be: u64, capacity: u64 },

    #[error("failed to write event log at {path}: {source}")]
    LogWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse event log: {0}")]
    LogParse(String),

    #[error("server reported failure: {0}")]
    ServerFailed(String),
}

impl Error {
    /// The category this error belongs to, for the `failed` event and JSON output.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) => ErrorCategory::Config,
            Error::Transport(_) => ErrorCategory::Transport,
            Error::Protocol(_) => ErrorCategory::Protocol,
            Error::Infeasible { .. } | Error::CapacityOverflow { .. } => ErrorCategory::Invariant,
            Error::LogWrite { .. } | Error::LogParse(_) => ErrorCategory::Log,
            Error::ServerFailed(_) => ErrorCategory::Protocol,
        }
    }

    /// Whether this failure is a programming-error-class invariant violation,
    /// as opposed to an environmental one. Useful for deciding whether to
    /// panic in debug builds during development versus fail cleanly in
    /// production (these should never occur in a correct run).
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self.category(), ErrorCategory::Invariant)
    }
}
