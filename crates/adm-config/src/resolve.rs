//! Runtime configuration resolution.
//!
//! `clap`'s `env = "..."` attribute already folds CLI → environment
//! variable precedence into each field on `Cli`; this module's job is just
//! to turn the resolved `Cli` into the plain parameter bundle `adm-core`
//! expects, without `adm-core` ever touching `std::env` itself.

use crate::cli::Cli;

/// Resolved connection parameters for the server collaborator.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub base_url: String,
    pub player_id: String,
    pub timeout_ms: u64,
    pub retries: u32,
}

/// Default base URL used when neither `--base-url` nor `BASE_URL` is set.
/// Local-scenario runs (`--scenario`) never dereference this.
const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default player id used when neither `--player-id` nor `PLAYER_ID` is set.
const DEFAULT_PLAYER_ID: &str = "anonymous";

impl RuntimeConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        RuntimeConfig {
            base_url: cli.base_url.clone().unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            player_id: cli.player_id.clone().unwrap_or_else(|| DEFAULT_PLAYER_ID.to_string()),
            timeout_ms: cli.timeout,
            retries: cli.retries,
        }
    }
}
