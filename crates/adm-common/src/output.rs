//! Output format selection for the CLI's final summary line.
//!
//! Formatting of human-readable progress lines is left to callers; this is
//! the minimal selector the CLI collaborator needs to pick between the two
//! shapes it actually emits.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Supported output formats for the final run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Structured JSON summary (default, machine-consumable).
    #[default]
    Json,
    /// One-line human-readable summary on stderr.
    Human,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Human => write!(f, "human"),
        }
    }
}
