//! `admitctl` command-line surface.
//!
//! Only the flags the core consumes live here; connecting to a server or
//! driving a local scenario happens downstream in `adm-core`.

use crate::policy_params::PolicyKind;
use adm_common::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

/// Online admission-control agent for a constrained-quota challenge.
#[derive(Parser, Debug)]
#[command(name = "admitctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the game server (also settable via BASE_URL).
    #[arg(long, env = "BASE_URL")]
    pub base_url: Option<String>,

    /// Player identifier to present to the game server (also via PLAYER_ID).
    #[arg(long, env = "PLAYER_ID")]
    pub player_id: Option<String>,

    /// Per-request timeout in milliseconds (also via TIMEOUT).
    #[arg(long, env = "TIMEOUT", default_value_t = 10_000)]
    pub timeout: u64,

    /// Maximum transient-transport retry attempts (also via RETRIES).
    #[arg(long, env = "RETRIES", default_value_t = 3)]
    pub retries: u32,

    /// Path to a local scenario file, used instead of a live server for
    /// offline simulation and testing.
    #[arg(long)]
    pub scenario: Option<PathBuf>,

    /// Override the scenario's capacity (for local scenario files).
    #[arg(long)]
    pub capacity: Option<u64>,

    /// Which policy family to run.
    #[arg(long, value_enum, default_value_t = PolicyKind::Reserve)]
    pub policy: PolicyKind,

    /// EWMA learning rate (policy-specific default applies when omitted).
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Additive safety margin on the break-even / coverage threshold.
    #[arg(long = "risk-margin")]
    pub risk_margin: Option<f64>,

    /// Warmup candidate count before relaxed rules activate.
    #[arg(long)]
    pub warmup: Option<u64>,

    /// Ring buffer size for the window policy.
    #[arg(long = "window-size")]
    pub window_size: Option<usize>,

    /// Minimum observations before the window policy relaxes.
    #[arg(long = "min-observations")]
    pub min_observations: Option<u64>,

    /// Top-K gating for the attribute-EWMA policy (0 = all attributes).
    #[arg(long = "gate-top-k", default_value_t = 0)]
    pub gate_top_k: usize,

    /// Enable correlation-aware rate inflation (attribute-EWMA only).
    #[arg(long = "corr-aware", default_value_t = false)]
    pub corr_aware: bool,

    /// Correlation inflation weight, in [0, 1].
    #[arg(long = "corr-beta")]
    pub corr_beta: Option<f64>,

    /// Write the NDJSON event log to this path instead of the default.
    #[arg(long = "log-json")]
    pub log_json: Option<PathBuf>,

    /// Emit a durable `progress` event to the NDJSON log every N decisions.
    #[arg(long = "progress-interval", default_value_t = 50)]
    pub progress_interval: u64,

    /// Emit a console progress line every N decisions (0 disables it).
    #[arg(long = "log-interval", default_value_t = 100)]
    pub log_interval: u64,

    /// Resume a previous run from this event log instead of starting fresh.
    #[arg(long = "resume-from-log")]
    pub resume_from_log: Option<PathBuf>,

    /// Override the game id (local scenario mode only).
    #[arg(long = "game-id")]
    pub game_id: Option<String>,

    /// First candidate index to request (local scenario mode only).
    #[arg(long = "start-index", default_value_t = 0)]
    pub start_index: u64,

    /// Final summary output format.
    #[arg(long = "output", value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_invocation() {
        let cli = Cli::parse_from(["admitctl", "--scenario", "game.json"]);
        assert_eq!(cli.policy, PolicyKind::Reserve);
        assert_eq!(cli.timeout, 10_000);
        assert_eq!(cli.retries, 3);
        assert_eq!(cli.progress_interval, 50);
        assert_eq!(cli.log_interval, 100);
    }

    #[test]
    fn parses_attr_ewma_with_overrides() {
        let cli = Cli::parse_from([
            "admitctl",
            "--scenario",
            "game.json",
            "--policy",
            "attr-ewma",
            "--alpha",
            "0.04",
            "--gate-top-k",
            "1",
            "--corr-aware",
        ]);
        assert_eq!(cli.policy, PolicyKind::AttrEwma);
        assert_eq!(cli.alpha, Some(0.04));
        assert_eq!(cli.gate_top_k, 1);
        assert!(cli.corr_aware);
    }
}
