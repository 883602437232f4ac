//! Minimum spacing between a character's submitted actions.
//!
//! Resolution itself assumes the caller already throttled the request; the
//! engine runs this check before loading anything else.
use chrono::{DateTime, Utc};

pub const TOO_FAST: &str = "Too fast. Steady yourself.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimit {
    Allowed,
    /// Rejected; the character may act again in `wait_ms`.
    Throttled { wait_ms: u64 },
}

impl RateLimit {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Compare `now` against the character's previous accepted action.
///
/// A first action, or a clock that moved backwards, is always allowed.
#[must_use]
pub fn check_rate_limit(
    last_action_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    min_interval_ms: u64,
) -> RateLimit {
    let Some(last) = last_action_at else {
        return RateLimit::Allowed;
    };
    let Ok(elapsed) = u64::try_from((now - last).num_milliseconds()) else {
        return RateLimit::Allowed;
    };
    if elapsed >= min_interval_ms {
        RateLimit::Allowed
    } else {
        RateLimit::Throttled {
            wait_ms: min_interval_ms - elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 5, 5, 5, 5).unwrap()
    }

    #[test]
    fn first_action_is_allowed() {
        assert_eq!(check_rate_limit(None, t0(), 300), RateLimit::Allowed);
    }

    #[test]
    fn rapid_follow_up_is_throttled() {
        let now = t0() + Duration::milliseconds(120);
        assert_eq!(
            check_rate_limit(Some(t0()), now, 300),
            RateLimit::Throttled { wait_ms: 180 }
        );
        assert!(!check_rate_limit(Some(t0()), t0(), 300).is_allowed());
    }

    #[test]
    fn interval_boundary_is_inclusive() {
        let now = t0() + Duration::milliseconds(300);
        assert!(check_rate_limit(Some(t0()), now, 300).is_allowed());
        assert!(check_rate_limit(Some(t0()), t0(), 0).is_allowed());
    }

    #[test]
    fn backwards_clock_does_not_lock_out() {
        let now = t0() - Duration::seconds(5);
        assert!(check_rate_limit(Some(t0()), now, 300).is_allowed());
    }
}
