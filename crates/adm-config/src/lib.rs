//! CLI parsing and configuration resolution.
//!
//! Everything in this crate is an external collaborator: none of it
//! participates in a policy decision. It exists to turn `argv` + environment
//! variables into the typed parameters `adm-core` consumes.

pub mod cli;
pub mod policy_params;
pub mod resolve;
pub mod validate;

pub use cli::Cli;
pub use policy_params::{PolicyKind, PolicyParams};
pub use resolve::RuntimeConfig;
pub use validate::{validate_policy_params, ConfigError};
