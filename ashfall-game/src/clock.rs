//! Wall-clock access and time-based resource regeneration.
//!
//! The resolver never calls `Utc::now()` directly; it asks an injected
//! [`Clock`] once per request so tests and replays can pin "now".
use std::cell::Cell;

use chrono::{DateTime, Duration, Utc};

use crate::constants::DEBT_REGEN_FACTOR;
use crate::numbers::i64_to_f64;

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the host clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    #[must_use]
    pub const fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn set(&self, to: DateTime<Utc>) {
        self.now.set(to);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Seconds from `since` to `now`, never negative.
#[must_use]
pub fn elapsed_seconds(since: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let millis = (now - since).num_milliseconds().max(0);
    i64_to_f64(millis) / 1000.0
}

/// Up-to-date value of a regenerating resource.
///
/// Regeneration runs at half rate while `debt > 0`; the result is clamped to
/// `[0, max_value]`.
#[must_use]
pub fn current_value(
    last_value: f64,
    last_update: DateTime<Utc>,
    max_value: f64,
    debt: f64,
    regen_per_second: f64,
    now: DateTime<Utc>,
) -> f64 {
    let rate = if debt > 0.0 {
        regen_per_second * DEBT_REGEN_FACTOR
    } else {
        regen_per_second
    };
    let regenerated = elapsed_seconds(last_update, now) * rate;
    let raw = last_value + regenerated;
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, max_value.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn regenerates_at_full_rate_without_debt() {
        let now = t0() + Duration::milliseconds(1_500);
        let value = current_value(0.5, t0(), 3.0, 0.0, 1.0, now);
        assert!((value - 2.0).abs() < 1e-9);
    }

    #[test]
    fn debt_halves_regeneration() {
        let now = t0() + Duration::seconds(2);
        let value = current_value(0.0, t0(), 3.0, 0.25, 1.0, now);
        assert!((value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn clamps_to_bounds_and_ignores_backwards_time() {
        let later = t0() + Duration::seconds(3_600);
        assert!((current_value(1.0, t0(), 3.0, 0.0, 1.0, later) - 3.0).abs() < 1e-9);
        let earlier = t0() - Duration::seconds(10);
        assert!((current_value(1.0, t0(), 3.0, 0.0, 1.0, earlier) - 1.0).abs() < 1e-9);
        assert!((current_value(-4.0, t0(), 3.0, 0.0, 1.0, t0()) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn value_is_monotonic_in_elapsed_time() {
        for debt in [0.0, 0.5, 3.0] {
            for start in [0.0, 0.4, 1.0, 2.5] {
                let mut previous = f64::MIN;
                for step in 0..40 {
                    let now = t0() + Duration::milliseconds(step * 250);
                    let value = current_value(start, t0(), 3.0, debt, 1.0, now);
                    assert!(value >= previous, "regressed at step {step}");
                    assert!((0.0..=3.0).contains(&value));
                    previous = value;
                }
            }
        }
    }

    #[test]
    fn manual_clock_moves_only_when_advanced() {
        let clock = ManualClock::new(t0());
        assert_eq!(clock.now(), t0());
        clock.advance(Duration::seconds(5));
        assert_eq!(clock.now(), t0() + Duration::seconds(5));
        let by_ref: &dyn Clock = &clock;
        assert_eq!(by_ref.now(), clock.now());
        assert_eq!(FixedClock(t0()).now(), t0());
    }
}
