//! Threshold arithmetic shared by the relaxed (non-reserve) policies.

/// Clamp a value into `[0, 1]`.
pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// The break-even helpful rate needed among the remaining seats after
/// consuming one seat on a non-helpful admit: `S / max(1, R - 1)`.
///
/// The `max(1, R - 1)` guard handles the `R == 1` edge case: rather than
/// dividing by zero (or by a negative number once `R - 1` would go
/// negative, which cannot happen because the caller never evaluates this
/// when `R <= 0`), the denominator is floored at 1, so the break-even rate
/// degenerates to exactly `slack` instead of diverging. Locked down by
/// `break_even_floors_denominator_at_one` below.
pub fn break_even_rate(slack: f64, remaining: i64) -> f64 {
    let denom = (remaining - 1).max(1) as f64;
    slack / denom
}

/// Coverage ratio for one attribute in the attribute-EWMA policy:
/// `q[a] * (R - 1) / need[a]`.
///
/// Used only to rank attributes for top-K gating, never
/// as an accept/reject threshold by itself. Returns `f64::INFINITY` when
/// `need` is zero so a fully-satisfied attribute never looks like the
/// bottleneck.
pub fn coverage_ratio(q: f64, remaining_minus_one: f64, need: u64) -> f64 {
    if need == 0 {
        return f64::INFINITY;
    }
    q * remaining_minus_one / need as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp01(-0.5), 0.0);
        assert_eq!(clamp01(1.5), 1.0);
        assert_eq!(clamp01(0.42), 0.42);
    }

    #[test]
    fn break_even_floors_denominator_at_one() {
        // R = 1 => R - 1 = 0, floored to 1.
        assert_eq!(break_even_rate(3.0, 1), 3.0);
        // R = 0 would never be passed by a live controller, but the floor
        // still prevents a negative or zero denominator.
        assert_eq!(break_even_rate(3.0, 0), 3.0);
    }

    #[test]
    fn break_even_normal_case() {
        assert_eq!(break_even_rate(3.0, 4), 1.0); // 3 / (4-1)
    }

    #[test]
    fn coverage_ratio_satisfied_attribute_is_infinite() {
        assert_eq!(coverage_ratio(0.5, 10.0, 0), f64::INFINITY);
    }

    #[test]
    fn coverage_ratio_normal_case() {
        assert!((coverage_ratio(0.2, 98.0, 10) - 1.96).abs() < 1e-9);
    }
}
