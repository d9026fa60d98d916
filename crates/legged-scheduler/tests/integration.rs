//! Integration tests for the cycle clock.

use legged_scheduler::prelude::*;
use legged_scheduler::{ManualClock, ManualSleeper};
use std::time::{Duration, Instant};

fn manual_clock(period: Duration) -> (ManualClock, CycleClock<ManualClock, ManualSleeper>) {
    let time = ManualClock::new();
    let clock = CycleClock::new(period, time.clone(), time.sleeper());
    (time, clock)
}

#[test]
fn test_overrun_counting_with_manual_clock() {
    let period = Duration::from_millis(20);
    let (time, mut clock) = manual_clock(period);

    // on-time, late, late, on-time, late
    let bodies_ms = [5u64, 25, 40, 19, 21];
    for body in bodies_ms {
        clock.start_cycle();
        time.advance(Duration::from_millis(body));
        let _ = clock.finish_cycle();
    }

    assert_eq!(clock.cycle_count(), 5);
    assert_eq!(clock.overrun_count(), 3);
    assert_eq!(clock.consecutive_overruns(), 1);
    assert_eq!(
        clock.sleeper().sleeps(),
        &[Duration::from_millis(15), Duration::from_millis(1)]
    );
}

#[test]
fn test_consecutive_overruns_reset_but_total_does_not() {
    let period = Duration::from_millis(10);
    let (time, mut clock) = manual_clock(period);

    for _ in 0..4 {
        clock.start_cycle();
        time.advance(Duration::from_millis(12));
        let _ = clock.finish_cycle();
    }
    assert_eq!(clock.consecutive_overruns(), 4);

    clock.start_cycle();
    time.advance(Duration::from_millis(2));
    let outcome = clock.finish_cycle();

    assert!(!outcome.overran);
    assert_eq!(clock.consecutive_overruns(), 0);
    assert_eq!(clock.overrun_count(), 4);
}

#[test]
fn test_no_catch_up_after_overrun() {
    let period = Duration::from_millis(10);
    let (time, mut clock) = manual_clock(period);

    clock.start_cycle();
    time.advance(Duration::from_millis(35));
    let _ = clock.finish_cycle();

    // The next cycle gets a full period from its own start.
    clock.start_cycle();
    assert_eq!(clock.last_deadline(), Some(Duration::from_millis(45)));
    time.advance(Duration::from_millis(1));
    let outcome = clock.finish_cycle();
    assert_eq!(outcome.slept, Duration::from_millis(9));
    assert_eq!(time.now(), Duration::from_millis(45));
}

#[test]
fn test_drift_tracks_overrun_amounts() {
    let period = Duration::from_millis(10);
    let (time, mut clock) = manual_clock(period);

    for body in [3u64, 14, 11] {
        clock.start_cycle();
        time.advance(Duration::from_millis(body));
        let _ = clock.finish_cycle();
    }

    assert_eq!(clock.overrun_count(), 2);
    let drift = clock.drift().summary();
    assert_eq!(drift.cycles, 3);
    assert_eq!(drift.max_ns, 4_000_000);
    assert_eq!(drift.p50_ns, 1_000_000);
}

#[test]
fn test_system_clock_keeps_cadence() {
    let period = Duration::from_millis(2);
    let mut clock = CycleClock::system(period);
    let start = Instant::now();

    for _ in 0..5 {
        clock.start_cycle();
        let _ = clock.finish_cycle();
    }

    // Sleeping never undershoots the requested remainder.
    assert!(start.elapsed() >= Duration::from_millis(10));
    assert_eq!(clock.cycle_count(), 5);
    assert!(clock.clock().now() >= Duration::from_millis(10));
}
