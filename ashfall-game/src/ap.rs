//! Action-point economy: spending with debt, strategic waiting, and
//! descriptive AP states.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::character::CharacterSnapshot;
use crate::clock::current_value;
use crate::config::CoreConfig;
use crate::constants::{
    OVERCOMMIT_SEVERE_DEBT, OVERCOMMIT_STRAINED_DEBT, OVEREXTENDED_DEBT_RATIO,
};
use crate::numbers::floor_f64_to_u32;

/// Descriptive AP condition derived from the numeric pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApState {
    Exhausted,
    Winded,
    Recovering,
    Ready,
    Overextended,
}

/// Severity of an overspend, by debt added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overcommit {
    Mild,
    Strained,
    Severe,
}

impl Overcommit {
    #[must_use]
    pub fn from_shortfall(shortfall: f64) -> Self {
        if shortfall > OVERCOMMIT_SEVERE_DEBT {
            Self::Severe
        } else if shortfall > OVERCOMMIT_STRAINED_DEBT {
            Self::Strained
        } else {
            Self::Mild
        }
    }
}

/// How a wait changed the character's strain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryOutcome {
    DebtCleared,
    DebtEased,
    Gathered,
    Holding,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spend {
    pub snapshot: CharacterSnapshot,
    /// Portion of the cost that could not be paid and became debt.
    pub shortfall: f64,
    pub overcommit: Option<Overcommit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recovery {
    pub snapshot: CharacterSnapshot,
    pub ap_gained: f64,
    pub outcome: RecoveryOutcome,
}

/// AP available right now, after time-based regeneration.
#[must_use]
pub fn current_ap(snapshot: &CharacterSnapshot, now: DateTime<Utc>, cfg: &CoreConfig) -> f64 {
    current_value(
        snapshot.ap_current,
        snapshot.ap_last_update,
        f64::from(snapshot.ap_max),
        snapshot.ap_debt,
        cfg.ap_regen_per_second,
        now,
    )
}

/// Whole AP shown to the player.
#[must_use]
pub fn display_ap(snapshot: &CharacterSnapshot, now: DateTime<Utc>, cfg: &CoreConfig) -> u32 {
    floor_f64_to_u32(current_ap(snapshot, now, cfg))
}

/// Pay `cost` AP. Never refuses: any shortfall is booked as debt.
#[must_use]
pub fn spend(
    snapshot: &CharacterSnapshot,
    cost: f64,
    now: DateTime<Utc>,
    cfg: &CoreConfig,
) -> Spend {
    let available = current_ap(snapshot, now, cfg);
    let remaining = available - cost.max(0.0);
    let mut next = snapshot.clone();
    next.ap_last_update = now;

    if remaining < 0.0 {
        let shortfall = -remaining;
        next.ap_current = 0.0;
        next.ap_debt += shortfall;
        next.clamp();
        return Spend {
            snapshot: next,
            shortfall,
            overcommit: Some(Overcommit::from_shortfall(shortfall)),
        };
    }

    next.ap_current = remaining;
    next.clamp();
    Spend {
        snapshot: next,
        shortfall: 0.0,
        overcommit: None,
    }
}

/// Hold position: bonus AP plus a fixed debt repayment.
#[must_use]
pub fn wait(snapshot: &CharacterSnapshot, now: DateTime<Utc>, cfg: &CoreConfig) -> Recovery {
    let available = current_ap(snapshot, now, cfg);
    let ap_max = f64::from(snapshot.ap_max);
    let new_ap = (available + cfg.wait_ap_bonus).min(ap_max);
    let new_debt = (snapshot.ap_debt - cfg.wait_debt_reduction).max(0.0);
    let ap_gained = new_ap - available;

    let outcome = if snapshot.ap_debt > 0.0 && new_debt <= 0.0 {
        RecoveryOutcome::DebtCleared
    } else if snapshot.ap_debt > new_debt {
        RecoveryOutcome::DebtEased
    } else if ap_gained > 0.0 {
        RecoveryOutcome::Gathered
    } else {
        RecoveryOutcome::Holding
    };

    let mut next = snapshot.clone();
    next.ap_current = new_ap;
    next.ap_debt = new_debt;
    next.ap_last_update = now;
    next.clamp();
    Recovery {
        snapshot: next,
        ap_gained,
        outcome,
    }
}

/// Classify the AP pools. Debt-driven states win over raw zero AP.
#[must_use]
pub fn state(snapshot: &CharacterSnapshot, now: DateTime<Utc>, cfg: &CoreConfig) -> ApState {
    let current = current_ap(snapshot, now, cfg);
    if snapshot.ap_debt > f64::from(snapshot.ap_max) * OVEREXTENDED_DEBT_RATIO {
        ApState::Overextended
    } else if current <= 0.0 {
        ApState::Exhausted
    } else if snapshot.ap_debt > 0.0 {
        ApState::Recovering
    } else if (current - 1.0).abs() < f64::EPSILON {
        ApState::Winded
    } else {
        ApState::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 2, 10, 0, 0).unwrap()
    }

    fn character(ap: f64, debt: f64) -> CharacterSnapshot {
        let mut c = CharacterSnapshot::new("p1", "Rook", 3, 100, 0, t0());
        c.ap_current = ap;
        c.ap_debt = debt;
        c
    }

    #[test]
    fn spend_within_budget_leaves_no_debt() {
        let cfg = CoreConfig::default();
        let result = spend(&character(3.0, 0.0), 2.0, t0(), &cfg);
        assert!((result.snapshot.ap_current - 1.0).abs() < 1e-9);
        assert!((result.snapshot.ap_debt - 0.0).abs() < 1e-9);
        assert!(result.overcommit.is_none());
    }

    #[test]
    fn overspend_books_exact_shortfall_as_debt() {
        let cfg = CoreConfig::default();
        let result = spend(&character(0.0, 0.0), 2.0, t0(), &cfg);
        assert!((result.snapshot.ap_current - 0.0).abs() < 1e-9);
        assert!((result.snapshot.ap_debt - 2.0).abs() < 1e-9);
        assert_eq!(result.overcommit, Some(Overcommit::Strained));

        for (ap, debt, cost) in [(0.5, 0.0, 3.0), (1.0, 1.0, 2.0), (2.9, 0.2, 3.0)] {
            let before = character(ap, debt);
            let result = spend(&before, cost, t0(), &cfg);
            assert!(result.snapshot.ap_current >= 0.0);
            assert!((result.snapshot.ap_current - 0.0).abs() < 1e-9);
            assert!((result.snapshot.ap_debt - (debt + cost - ap)).abs() < 1e-9);
        }
    }

    #[test]
    fn overcommit_tiers_follow_shortfall() {
        assert_eq!(Overcommit::from_shortfall(0.5), Overcommit::Mild);
        assert_eq!(Overcommit::from_shortfall(1.0), Overcommit::Mild);
        assert_eq!(Overcommit::from_shortfall(1.5), Overcommit::Strained);
        assert_eq!(Overcommit::from_shortfall(2.0), Overcommit::Strained);
        assert_eq!(Overcommit::from_shortfall(2.5), Overcommit::Severe);
    }

    #[test]
    fn spend_uses_regenerated_ap_and_stamps_time() {
        let cfg = CoreConfig::default();
        let later = t0() + Duration::seconds(2);
        let result = spend(&character(0.0, 0.0), 2.0, later, &cfg);
        assert!((result.snapshot.ap_current - 0.0).abs() < 1e-9);
        assert!((result.snapshot.ap_debt - 0.0).abs() < 1e-9);
        assert_eq!(result.snapshot.ap_last_update, later);
    }

    #[test]
    fn wait_recovers_and_repays_debt() {
        let cfg = CoreConfig::default();
        let result = wait(&character(1.0, 0.4), t0(), &cfg);
        assert!((result.snapshot.ap_current - 2.0).abs() < 1e-9);
        assert!((result.snapshot.ap_debt - 0.0).abs() < 1e-9);
        assert_eq!(result.outcome, RecoveryOutcome::DebtCleared);

        let result = wait(&character(0.0, 2.0), t0(), &cfg);
        assert!((result.snapshot.ap_debt - 1.5).abs() < 1e-9);
        assert_eq!(result.outcome, RecoveryOutcome::DebtEased);

        let result = wait(&character(1.0, 0.0), t0(), &cfg);
        assert_eq!(result.outcome, RecoveryOutcome::Gathered);
        assert!((result.ap_gained - 1.0).abs() < 1e-9);

        let result = wait(&character(3.0, 0.0), t0(), &cfg);
        assert_eq!(result.outcome, RecoveryOutcome::Holding);
        assert!((result.snapshot.ap_current - 3.0).abs() < 1e-9);
    }

    #[test]
    fn wait_never_raises_debt_or_drops_below_zero() {
        let cfg = CoreConfig::default();
        for debt in [0.0, 0.1, 0.5, 0.75, 4.0] {
            for ap in [0.0, 1.5, 3.0] {
                let before = character(ap, debt);
                let after = wait(&before, t0(), &cfg).snapshot;
                assert!(after.ap_debt <= before.ap_debt);
                assert!(after.ap_debt >= 0.0);
                assert!(after.ap_current <= 3.0);
            }
        }
    }

    #[test]
    fn state_checks_debt_before_zero_ap() {
        let cfg = CoreConfig::default();
        assert_eq!(state(&character(0.0, 2.0), t0(), &cfg), ApState::Overextended);
        assert_eq!(state(&character(0.0, 0.0), t0(), &cfg), ApState::Exhausted);
        assert_eq!(state(&character(0.0, 1.0), t0(), &cfg), ApState::Exhausted);
        assert_eq!(state(&character(2.0, 1.0), t0(), &cfg), ApState::Recovering);
        assert_eq!(state(&character(1.0, 0.0), t0(), &cfg), ApState::Winded);
        assert_eq!(state(&character(3.0, 0.0), t0(), &cfg), ApState::Ready);
        assert_eq!(state(&character(1.5, 0.0), t0(), &cfg), ApState::Ready);
    }

    #[test]
    fn display_floors_current_ap() {
        let cfg = CoreConfig::default();
        let later = t0() + Duration::milliseconds(1_700);
        assert_eq!(display_ap(&character(0.0, 0.0), later, &cfg), 1);
    }
}
