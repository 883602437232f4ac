//! Character resource snapshot loaded by the caller before each resolution.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CharacterStatus {
    #[default]
    #[serde(alias = "ALIVE")]
    Alive,
    #[serde(alias = "DEAD")]
    Dead,
    #[serde(alias = "RESTING")]
    Resting,
    #[serde(alias = "IN_COMBAT")]
    InCombat,
}

impl CharacterStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Alive => "alive",
            Self::Dead => "dead",
            Self::Resting => "resting",
            Self::InCombat => "in_combat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CharacterError {
    #[error("ap_current {value} outside [0, {max}]")]
    ApOutOfRange { value: f64, max: u32 },
    #[error("ap_debt must be a non-negative number (got {0})")]
    NegativeDebt(f64),
    #[error("{field} {value} outside [0, {max}]")]
    PoolOutOfRange {
        field: &'static str,
        value: i32,
        max: i32,
    },
    #[error("character id must not be empty")]
    MissingId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSnapshot {
    pub id: String,
    pub name: String,
    pub ap_current: f64,
    pub ap_max: u32,
    pub ap_debt: f64,
    pub ap_last_update: DateTime<Utc>,
    pub hp: i32,
    pub hp_max: i32,
    #[serde(default)]
    pub mp: i32,
    #[serde(default)]
    pub mp_max: i32,
    #[serde(default)]
    pub status: CharacterStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_action_at: Option<DateTime<Utc>>,
}

impl CharacterSnapshot {
    /// Fresh character at full pools.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        ap_max: u32,
        hp_max: i32,
        mp_max: i32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ap_current: f64::from(ap_max),
            ap_max,
            ap_debt: 0.0,
            ap_last_update: now,
            hp: hp_max,
            hp_max,
            mp: mp_max,
            mp_max,
            status: CharacterStatus::Alive,
            last_action_at: None,
        }
    }

    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.status == CharacterStatus::Dead
    }

    /// Check the stored invariants without repairing anything.
    ///
    /// # Errors
    ///
    /// Returns the first violated bound.
    pub fn validate(&self) -> Result<(), CharacterError> {
        if self.id.trim().is_empty() {
            return Err(CharacterError::MissingId);
        }
        let ap_max = f64::from(self.ap_max);
        if !self.ap_current.is_finite() || !(0.0..=ap_max).contains(&self.ap_current) {
            return Err(CharacterError::ApOutOfRange {
                value: self.ap_current,
                max: self.ap_max,
            });
        }
        if !self.ap_debt.is_finite() || self.ap_debt < 0.0 {
            return Err(CharacterError::NegativeDebt(self.ap_debt));
        }
        check_pool("hp", self.hp, self.hp_max)?;
        check_pool("mp", self.mp, self.mp_max)?;
        Ok(())
    }

    /// Pull every pool back inside its bounds.
    pub fn clamp(&mut self) {
        let ap_max = f64::from(self.ap_max);
        self.ap_current = if self.ap_current.is_finite() {
            self.ap_current.clamp(0.0, ap_max)
        } else {
            0.0
        };
        self.ap_debt = if self.ap_debt.is_finite() {
            self.ap_debt.max(0.0)
        } else {
            0.0
        };
        self.hp_max = self.hp_max.max(0);
        self.hp = self.hp.clamp(0, self.hp_max);
        self.mp_max = self.mp_max.max(0);
        self.mp = self.mp.clamp(0, self.mp_max);
    }

    /// Subtract damage from HP, flooring at zero. Returns HP lost.
    pub fn take_damage(&mut self, damage: i32) -> i32 {
        let before = self.hp;
        self.hp = self.hp.saturating_sub(damage.max(0)).max(0);
        before - self.hp
    }
}

fn check_pool(field: &'static str, value: i32, max: i32) -> Result<(), CharacterError> {
    if max < 0 || !(0..=max).contains(&value) {
        return Err(CharacterError::PoolOutOfRange { field, value, max });
    }
    Ok(())
}
