//! Exponential backoff for transient transport retries.

use std::time::Duration;

/// Delay before retry attempt `attempt` (0-indexed): `base * factor^attempt`,
/// capped at `cap`. Pure and deterministic so the controller's retry loop
/// is testable without a clock.
pub fn backoff_delay(attempt: u32, base: Duration, factor: f64, cap: Duration) -> Duration {
    let scaled = base.as_secs_f64() * factor.powi(attempt as i32);
    Duration::from_secs_f64(scaled.min(cap.as_secs_f64()))
}

/// Defaults: base 0.5s, factor 2, cap 10s.
pub const DEFAULT_BASE: Duration = Duration::from_millis(500);
pub const DEFAULT_FACTOR: f64 = 2.0;
pub const DEFAULT_CAP: Duration = Duration::from_secs(10);
