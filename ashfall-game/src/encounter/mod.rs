//! Encounter state: phase, turn order and the active hostile set.
//!
//! Encounter documents arrive from storage as JSON. [`EncounterState::from_json`]
//! rejects malformed shapes at the boundary so the resolver only ever sees
//! states that satisfy the invariants checked by [`EncounterState::validate`].
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DamageRange;

pub mod enemy_turn;
pub mod turns;

pub use enemy_turn::run_enemy_phase;
pub use turns::{Opening, advance, create_encounter, is_complete, is_player_turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    #[serde(alias = "IDLE")]
    Idle,
    #[serde(alias = "PLAYER_TURN")]
    PlayerTurn,
    #[serde(alias = "ENEMY_TURN")]
    EnemyTurn,
    /// Reserved for multi-step resolution; nothing transitions here yet.
    #[serde(alias = "RESOLVING")]
    Resolving,
    #[serde(alias = "COMPLETE")]
    Complete,
}

impl Phase {
    #[must_use]
    pub const fn in_combat(self) -> bool {
        matches!(self, Self::PlayerTurn | Self::EnemyTurn | Self::Resolving)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PlayerTurn => "player_turn",
            Self::EnemyTurn => "enemy_turn",
            Self::Resolving => "resolving",
            Self::Complete => "complete",
        }
    }
}

/// A hostile's declared next behavior, shown on `look`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Attack,
    Defend,
    Charge,
    Wait,
}

impl Intent {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::Defend => "defend",
            Self::Charge => "charge",
            Self::Wait => "wait",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostileActor {
    pub id: String,
    pub name: String,
    pub hp: i32,
    pub hp_max: i32,
    pub ap: u32,
    pub intent: Intent,
    /// Copied from the enemy definition at spawn; `None` uses the configured
    /// fallback window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<DamageRange>,
}

impl HostileActor {
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

#[derive(Debug, Error)]
pub enum EncounterStateError {
    #[error("current_turn_index {index} out of range for turn order of {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("player_count {player_count} exceeds turn order of {len}")]
    PlayerCountOutOfRange { player_count: usize, len: usize },
    #[error("phase {phase} requires an empty enemy list")]
    LingeringEnemies { phase: &'static str },
    #[error("phase {phase} requires live enemies")]
    MissingEnemies { phase: &'static str },
    #[error("phase {phase} requires round >= 1")]
    RoundNotStarted { phase: &'static str },
    #[error("enemy id {0} appears more than once")]
    DuplicateEnemy(String),
    #[error("enemy {0} is not in the turn order")]
    EnemyNotInTurnOrder(String),
    #[error("enemy {id} sits in player slot {slot} of {player_count}")]
    EnemyInPlayerSlot {
        id: String,
        slot: usize,
        player_count: usize,
    },
    #[error("phase {phase} requires at least one player")]
    MissingPlayers { phase: &'static str },
    #[error("enemy {id} hp {hp} outside [1, {hp_max}]")]
    EnemyHpOutOfRange { id: String, hp: i32, hp_max: i32 },
    #[error("encounter document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterState {
    pub phase: Phase,
    pub turn_order: Vec<String>,
    pub current_turn_index: usize,
    pub enemies: Vec<HostileActor>,
    pub round: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_zone: Option<String>,
    /// Leading entries of `turn_order` that belong to players.
    #[serde(default)]
    pub player_count: usize,
}

impl Default for EncounterState {
    fn default() -> Self {
        Self::idle()
    }
}

impl EncounterState {
    /// State for a character outside combat.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            turn_order: Vec::new(),
            current_turn_index: 0,
            enemies: Vec::new(),
            round: 0,
            current_zone: None,
            player_count: 0,
        }
    }

    #[must_use]
    pub fn idle_in(zone: impl Into<String>) -> Self {
        Self {
            current_zone: Some(zone.into()),
            ..Self::idle()
        }
    }

    /// Return to `Idle` after combat, keeping the zone.
    #[must_use]
    pub fn reset(&self) -> Self {
        Self {
            current_zone: self.current_zone.clone(),
            ..Self::idle()
        }
    }

    #[must_use]
    pub const fn in_combat(&self) -> bool {
        self.phase.in_combat()
    }

    #[must_use]
    pub fn has_hostiles(&self) -> bool {
        !self.enemies.is_empty()
    }

    #[must_use]
    pub const fn is_hostile_slot(&self, index: usize) -> bool {
        index >= self.player_count
    }

    #[must_use]
    pub fn current_actor(&self) -> Option<&str> {
        self.turn_order
            .get(self.current_turn_index)
            .map(String::as_str)
    }

    #[must_use]
    pub fn enemy(&self, id: &str) -> Option<&HostileActor> {
        self.enemies.iter().find(|enemy| enemy.id == id)
    }

    /// Parse and validate a stored encounter document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or violates a state invariant.
    pub fn from_json(json: &str) -> Result<Self, EncounterStateError> {
        let state: Self = serde_json::from_str(json)?;
        state.validate()?;
        Ok(state)
    }

    /// Check structural invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), EncounterStateError> {
        let len = self.turn_order.len();
        if len > 0 && self.current_turn_index >= len {
            return Err(EncounterStateError::IndexOutOfRange {
                index: self.current_turn_index,
                len,
            });
        }
        if self.player_count > len {
            return Err(EncounterStateError::PlayerCountOutOfRange {
                player_count: self.player_count,
                len,
            });
        }

        let phase = self.phase.label();
        match self.phase {
            Phase::Idle => {
                if self.has_hostiles() {
                    return Err(EncounterStateError::LingeringEnemies { phase });
                }
            }
            // A fallen party leaves its killers standing.
            Phase::Complete => {}
            Phase::PlayerTurn | Phase::EnemyTurn | Phase::Resolving => {
                if !self.has_hostiles() {
                    return Err(EncounterStateError::MissingEnemies { phase });
                }
                if self.round == 0 {
                    return Err(EncounterStateError::RoundNotStarted { phase });
                }
                if self.player_count == 0 {
                    return Err(EncounterStateError::MissingPlayers { phase });
                }
            }
        }

        let mut seen = HashSet::new();
        for enemy in &self.enemies {
            if !seen.insert(enemy.id.as_str()) {
                return Err(EncounterStateError::DuplicateEnemy(enemy.id.clone()));
            }
            let Some(slot) = self.turn_order.iter().position(|id| id == &enemy.id) else {
                return Err(EncounterStateError::EnemyNotInTurnOrder(enemy.id.clone()));
            };
            if slot < self.player_count {
                return Err(EncounterStateError::EnemyInPlayerSlot {
                    id: enemy.id.clone(),
                    slot,
                    player_count: self.player_count,
                });
            }
            if enemy.hp < 1 || enemy.hp > enemy.hp_max {
                return Err(EncounterStateError::EnemyHpOutOfRange {
                    id: enemy.id.clone(),
                    hp: enemy.hp,
                    hp_max: enemy.hp_max,
                });
            }
        }
        Ok(())
    }
}
