//! Static enemy and zone tables.
//!
//! The core reads only `hp`, `damage` and `intents` from enemy definitions,
//! plus zone text and spawn lists. Everything else in the tables is flavor.
use std::collections::HashSet;
use std::sync::OnceLock;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::config::DamageRange;
use crate::constants::HOSTILE_STARTING_AP;
use crate::encounter::{HostileActor, Intent};

const DEFAULT_GAME_DATA: &str = include_str!("../assets/data/game_data.json");

static BUNDLED: OnceLock<GameData> = OnceLock::new();

#[derive(Debug, Error)]
pub enum DataError {
    #[error("game data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate {table} id {id}")]
    DuplicateId { table: &'static str, id: String },
    #[error("enemy {0} must have positive hp")]
    InvalidHp(String),
    #[error("enemy {id} damage window invalid ({min}..={max})")]
    InvalidDamage { id: String, min: i32, max: i32 },
    #[error("enemy {0} declares no intents")]
    EmptyIntents(String),
    #[error("zone {zone} spawns unknown enemy {enemy}")]
    UnknownEnemyType { zone: String, enemy: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub hp: i32,
    pub damage: DamageRange,
    pub intents: SmallVec<[Intent; 4]>,
}

impl EnemyDef {
    /// Instantiate a live hostile with a unique id and a uniformly drawn intent.
    pub fn spawn<R: Rng>(&self, rng: &mut R) -> HostileActor {
        let intent = self.intents.choose(rng).copied().unwrap_or(Intent::Attack);
        let tag: u32 = rng.r#gen();
        HostileActor {
            id: format!("{}-{tag:08x}", self.id),
            name: self.name.clone(),
            hp: self.hp,
            hp_max: self.hp,
            ap: HOSTILE_STARTING_AP,
            intent,
            damage: Some(self.damage),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Safe,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDef {
    pub id: String,
    pub name: String,
    pub kind: ZoneKind,
    pub description: String,
    #[serde(default)]
    pub welcome: Vec<String>,
    #[serde(default)]
    pub ambient: Vec<String>,
    #[serde(default)]
    pub enemy_types: Vec<String>,
}

impl ZoneDef {
    pub fn welcome_line<R: Rng>(&self, rng: &mut R) -> String {
        self.welcome
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| format!("You arrive at {}.", self.name))
    }

    pub fn ambient_line<R: Rng>(&self, rng: &mut R) -> Option<&str> {
        self.ambient.choose(rng).map(String::as_str)
    }
}

/// Enemy and zone definitions keyed by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GameData {
    #[serde(default)]
    pub enemies: Vec<EnemyDef>,
    #[serde(default)]
    pub zones: Vec<ZoneDef>,
}

impl GameData {
    /// Create empty tables (useful for tests)
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            enemies: Vec::new(),
            zones: Vec::new(),
        }
    }

    /// Parse and validate a JSON table document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the tables are inconsistent.
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let data: Self = serde_json::from_str(json)?;
        data.validate()?;
        Ok(data)
    }

    /// The tables shipped with the crate, parsed once per process.
    #[must_use]
    pub fn load_from_static() -> Self {
        BUNDLED
            .get_or_init(|| Self::from_json(DEFAULT_GAME_DATA).unwrap_or_default())
            .clone()
    }

    /// Check ids, hp, damage windows and zone spawn references.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), DataError> {
        let mut enemy_ids = HashSet::new();
        for enemy in &self.enemies {
            if !enemy_ids.insert(enemy.id.as_str()) {
                return Err(DataError::DuplicateId {
                    table: "enemy",
                    id: enemy.id.clone(),
                });
            }
            if enemy.hp <= 0 {
                return Err(DataError::InvalidHp(enemy.id.clone()));
            }
            if enemy.damage.min < 0 || enemy.damage.min > enemy.damage.max {
                return Err(DataError::InvalidDamage {
                    id: enemy.id.clone(),
                    min: enemy.damage.min,
                    max: enemy.damage.max,
                });
            }
            if enemy.intents.is_empty() {
                return Err(DataError::EmptyIntents(enemy.id.clone()));
            }
        }

        let mut zone_ids = HashSet::new();
        for zone in &self.zones {
            if !zone_ids.insert(zone.id.as_str()) {
                return Err(DataError::DuplicateId {
                    table: "zone",
                    id: zone.id.clone(),
                });
            }
            if let Some(unknown) = zone
                .enemy_types
                .iter()
                .find(|id| !enemy_ids.contains(id.as_str()))
            {
                return Err(DataError::UnknownEnemyType {
                    zone: zone.id.clone(),
                    enemy: unknown.clone(),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn enemy(&self, id: &str) -> Option<&EnemyDef> {
        self.enemies.iter().find(|enemy| enemy.id == id)
    }

    #[must_use]
    pub fn zone(&self, id: &str) -> Option<&ZoneDef> {
        self.zones.iter().find(|zone| zone.id == id)
    }

    /// Enemies that may spawn in `zone_id`: the zone's own list, or the whole
    /// table when the zone is unknown or lists none.
    #[must_use]
    pub fn spawn_pool(&self, zone_id: Option<&str>) -> Vec<&EnemyDef> {
        let listed: Vec<&EnemyDef> = zone_id
            .and_then(|id| self.zone(id))
            .map(|zone| {
                zone.enemy_types
                    .iter()
                    .filter_map(|id| self.enemy(id))
                    .collect()
            })
            .unwrap_or_default();
        if listed.is_empty() {
            self.enemies.iter().collect()
        } else {
            listed
        }
    }

    /// Uniform pick among zones other than `current`.
    pub fn pick_other_zone<R: Rng>(&self, current: Option<&str>, rng: &mut R) -> Option<&ZoneDef> {
        let candidates: Vec<&ZoneDef> = self
            .zones
            .iter()
            .filter(|zone| Some(zone.id.as_str()) != current)
            .collect();
        candidates.choose(rng).copied()
    }
}
