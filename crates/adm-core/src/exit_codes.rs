//! Process exit codes. Deliberately three values: this agent has exactly
//! three terminal states, unlike process-supervision tools that map a wider
//! range of failure modes onto distinct codes.

pub const COMPLETED: i32 = 0;
pub const FAILED: i32 = 1;
pub const CANCELLED: i32 = 2;

use crate::controller::RunOutcome;

pub fn exit_code_for(outcome: &RunOutcome) -> i32 {
    match outcome {
        RunOutcome::Completed { .. } => COMPLETED,
        RunOutcome::Failed { .. } => FAILED,
        RunOutcome::Cancelled => CANCELLED,
    }
}
