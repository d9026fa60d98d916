//! Property-based tests for cycle clock accounting.

use legged_scheduler::{Clock, CycleClock, ManualClock};
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    #[test]
    fn test_overrun_count_matches_late_bodies(
        period_us in 1_000u64..50_000,
        bodies_us in proptest::collection::vec(0u64..100_000, 1..64),
    ) {
        let time = ManualClock::new();
        let mut clock = CycleClock::new(Duration::from_micros(period_us), time.clone(), time.sleeper());

        let mut expected_overruns = 0u64;
        let mut previous_total = 0u64;
        for body in &bodies_us {
            clock.start_cycle();
            time.advance(Duration::from_micros(*body));
            let outcome = clock.finish_cycle();

            if *body >= period_us {
                expected_overruns += 1;
                prop_assert!(outcome.overran);
                prop_assert_eq!(outcome.slept, Duration::ZERO);
            } else {
                prop_assert_eq!(outcome.slept, Duration::from_micros(period_us - body));
            }

            prop_assert!(clock.overrun_count() >= previous_total);
            previous_total = clock.overrun_count();
        }

        prop_assert_eq!(clock.overrun_count(), expected_overruns);
        prop_assert_eq!(clock.cycle_count(), bodies_us.len() as u64);
    }

    #[test]
    fn test_on_time_cycles_take_exactly_one_period(
        period_us in 1_000u64..50_000,
        body_fraction in 0.0f64..0.99,
    ) {
        let time = ManualClock::new();
        let period = Duration::from_micros(period_us);
        let mut clock = CycleClock::new(period, time.clone(), time.sleeper());

        clock.start_cycle();
        time.advance(period.mul_f64(body_fraction));
        let _ = clock.finish_cycle();

        prop_assert_eq!(time.now(), period);
    }
}
