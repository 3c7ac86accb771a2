//! Property-based tests for snapshot write sanitization.
//!
//! Randomized inputs pin the two safety invariants of the store: no scalar
//! slot ever holds a non-finite value, and step controls never leave [0, 1].

use super::{StrField, TelemetrySnapshot};
use proptest::prelude::*;

proptest! {
    /// Property: any f64 written through `set_scalar` reads back finite.
    #[test]
    fn prop_scalars_always_finite(value in proptest::num::f64::ANY) {
        let mut snapshot = TelemetrySnapshot::new();
        snapshot.set_scalar(0, value);
        prop_assert!(snapshot.scalar(0).is_finite());
    }

    /// Property: any sequence of step deltas leaves the slot in [0, 1].
    #[test]
    fn prop_step_stays_clamped(deltas in proptest::collection::vec(-5.0..5.0f64, 0..64)) {
        let mut snapshot = TelemetrySnapshot::new();
        for delta in deltas {
            snapshot.apply_step(0, delta);
            let v = snapshot.scalar(0);
            prop_assert!((0.0..=1.0).contains(&v), "slot escaped clamp: {v}");
        }
    }

    /// Property: non-finite step deltas are inert.
    #[test]
    fn prop_non_finite_step_is_noop(start in 0.0..1.0f64) {
        let mut snapshot = TelemetrySnapshot::new();
        snapshot.set_scalar(0, start);
        snapshot.apply_step(0, f64::NAN);
        prop_assert!((snapshot.scalar(0) - start).abs() < 1e-12);
    }

    /// Property: stored strings are printable ASCII and NUL-terminated.
    #[test]
    fn prop_strings_sanitized(bytes in proptest::collection::vec(any::<u8>(), 0..128)) {
        let mut snapshot = TelemetrySnapshot::new();
        snapshot.set_string(StrField::NearestAirportName, &bytes);

        let text = snapshot.string(StrField::NearestAirportName);
        prop_assert!(text.bytes().all(|b| (0x20..=0x7e).contains(&b)));
        prop_assert_eq!(*snapshot.nearest_airport_name.last().unwrap(), 0);
    }
}
