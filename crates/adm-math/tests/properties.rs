//! Property-based tests for adm-math numerical functions.

use adm_math::{ewma_update, clamp01};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// EWMA update always stays in [0, 1] when starting in [0, 1].
    #[test]
    fn ewma_stays_in_unit_interval(p in 0.0..1.0f64, alpha in 0.0..1.0f64, observed in any::<bool>()) {
        let next = ewma_update(p, observed, alpha);
        prop_assert!((0.0..=1.0).contains(&next), "ewma_update produced {next}");
    }

    /// clamp01 is idempotent.
    #[test]
    fn clamp01_idempotent(x in -1000.0..1000.0f64) {
        let once = clamp01(x);
        let twice = clamp01(once);
        prop_assert_eq!(once, twice);
    }
}
