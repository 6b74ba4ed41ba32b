//! Admission-control core: scenario model, accounting, the policy family,
//! the durable event log, reconstruction, and the run controller.

pub mod accounting;
pub mod backoff;
pub mod controller;
pub mod exit_codes;
pub mod local_server;
pub mod log;
pub mod model;
pub mod policy;
pub mod policy_builder;
pub mod reconstruct;
pub mod server;


pub use accounting::Accounting;
pub use controller::{CancelSignal, Controller, RunOutcome};
pub use model::{Candidate, Constraint, Decision, Scenario};
pub use policy::Policy;
