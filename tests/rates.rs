//! Rate derivation edge cases: first sample, elapsed math, counter resets.

use std::time::{Duration, Instant};
use traymon::rates::RateTracker;

#[test]
fn first_observation_reports_zero() {
    let mut rates = RateTracker::new();
    assert_eq!(rates.rate("net_recv", 1_000.0, Instant::now()), 0.0);
}

#[test]
fn rate_is_delta_over_elapsed() {
    let mut rates = RateTracker::new();
    let t0 = Instant::now();
    rates.rate("net_recv", 1_000.0, t0);
    let r = rates.rate("net_recv", 3_048.0, t0 + Duration::from_secs(2));
    assert_eq!(r, 1_024.0);
}

#[test]
fn counter_reset_rebaselines_instead_of_going_negative() {
    let mut rates = RateTracker::new();
    let t0 = Instant::now();
    rates.rate("disk_read", 5_000.0, t0);
    // counter went backwards (sleep/driver reset)
    let r = rates.rate("disk_read", 100.0, t0 + Duration::from_secs(1));
    assert_eq!(r, 0.0);
    // new baseline is the reset value
    let r = rates.rate("disk_read", 1_124.0, t0 + Duration::from_secs(2));
    assert_eq!(r, 1_024.0);
}

#[test]
fn zero_elapsed_returns_last_rate_without_update() {
    let mut rates = RateTracker::new();
    let t0 = Instant::now();
    rates.rate("net_sent", 0.0, t0);
    let t1 = t0 + Duration::from_secs(1);
    assert_eq!(rates.rate("net_sent", 500.0, t1), 500.0);
    // sub-tick re-resolution at the same instant repeats the last rate
    assert_eq!(rates.rate("net_sent", 9_999.0, t1), 500.0);
    // and did not move the stored baseline
    let r = rates.rate("net_sent", 1_000.0, t1 + Duration::from_secs(1));
    assert_eq!(r, 500.0);
}

#[test]
fn keys_are_tracked_independently() {
    let mut rates = RateTracker::new();
    let t0 = Instant::now();
    rates.rate("a", 100.0, t0);
    rates.rate("b", 0.0, t0);
    let t1 = t0 + Duration::from_secs(1);
    assert_eq!(rates.rate("a", 150.0, t1), 50.0);
    assert_eq!(rates.rate("b", 10.0, t1), 10.0);
}
