//! Property-based tests for error classification.

use legged_errors::{CycleError, ErrorCategory, ErrorSeverity, HarnessError};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_check_finite_accepts_all_finite(values in proptest::collection::vec(-1.0e6f32..1.0e6f32, 0..64)) {
        prop_assert_eq!(CycleError::check_finite("q", &values), Ok(()));
    }

    #[test]
    fn test_check_finite_finds_injected_nan(
        values in proptest::collection::vec(-10.0f32..10.0f32, 1..64),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut values = values;
        let index = pick.index(values.len());
        if let Some(slot) = values.get_mut(index) {
            *slot = f32::NAN;
        }
        prop_assert_eq!(
            CycleError::check_finite("q", &values),
            Err(CycleError::NonFinite { field: "q", index })
        );
    }

    #[test]
    fn test_cycle_errors_never_critical(reason in ".{0,32}") {
        for err in [
            CycleError::Sensor(reason.clone()),
            CycleError::Actuator(reason.clone()),
            CycleError::Policy(reason.clone()),
        ] {
            let wrapped: HarnessError = err.into();
            prop_assert_eq!(wrapped.category(), ErrorCategory::Cycle);
            prop_assert!(wrapped.severity() < ErrorSeverity::Critical);
        }
    }
}
