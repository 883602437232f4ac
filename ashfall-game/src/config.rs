//! Externally supplied tuning for the resolution core.
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::action::ActionType;
use crate::constants::{
    AP_REGEN_PER_SECOND, ATTACK_BASE_DAMAGE, COST_ATTACK, COST_DEFEND, COST_EXPLORE,
    ENCOUNTER_SIZE_MAX, ENCOUNTER_SIZE_MIN, ENEMY_ATTACK_CHANCE, ENEMY_DAMAGE_MAX,
    ENEMY_DAMAGE_MIN, EXPLORE_WEIGHT_AMBUSH, EXPLORE_WEIGHT_ENCOUNTER, EXPLORE_WEIGHT_ITEM,
    EXPLORE_WEIGHT_NOTHING, EXPLORE_WEIGHT_TOLERANCE, EXPLORE_WEIGHT_TRAP,
    EXPLORE_WEIGHT_ZONE_CHANGE, MIN_ACTION_INTERVAL_MS, TRAP_DAMAGE_MAX, TRAP_DAMAGE_MIN,
    WAIT_AP_BONUS, WAIT_DEBT_REDUCTION,
};

const DEFAULT_CONFIG_DATA: &str = include_str!("../assets/data/config.json");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be at least {min:.2} (got {value:.2})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} bounds invalid (min {min} > max {max})")]
    Bounds {
        field: &'static str,
        min: i64,
        max: i64,
    },
    #[error("explore weights must sum to 1.0 (got {sum:.4})")]
    WeightSum { sum: f64 },
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Inclusive integer damage window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRange {
    pub min: i32,
    pub max: i32,
}

impl DamageRange {
    #[must_use]
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Uniform roll within `[min, max]`; a collapsed window returns `min`.
    pub fn roll<R: Rng>(&self, rng: &mut R) -> i32 {
        if self.min >= self.max {
            return self.min.max(0);
        }
        rng.gen_range(self.min..=self.max).max(0)
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if self.min < 0 {
            return Err(ConfigError::MinViolation {
                field,
                min: 0.0,
                value: f64::from(self.min),
            });
        }
        if self.min > self.max {
            return Err(ConfigError::Bounds {
                field,
                min: i64::from(self.min),
                max: i64::from(self.max),
            });
        }
        Ok(())
    }
}

/// AP price per action type.
///
/// `wait`, `look` and `status` never pay: their entries are validated but
/// the resolver ignores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionCosts {
    pub attack: f64,
    pub defend: f64,
    pub wait: f64,
    pub look: f64,
    pub status: f64,
    pub explore: f64,
    pub inventory: f64,
    pub r#use: f64,
    pub talk: f64,
}

impl ActionCosts {
    #[must_use]
    pub const fn cost(&self, kind: ActionType) -> f64 {
        match kind {
            ActionType::Attack => self.attack,
            ActionType::Defend => self.defend,
            ActionType::Wait => self.wait,
            ActionType::Look => self.look,
            ActionType::Status => self.status,
            ActionType::Explore => self.explore,
            ActionType::Inventory => self.inventory,
            ActionType::Use => self.r#use,
            ActionType::Talk => self.talk,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for kind in ActionType::ALL {
            let value = self.cost(kind);
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::MinViolation {
                    field: kind.cost_field(),
                    min: 0.0,
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Default for ActionCosts {
    fn default() -> Self {
        Self {
            attack: COST_ATTACK,
            defend: COST_DEFEND,
            wait: 0.0,
            look: 0.0,
            status: 0.0,
            explore: COST_EXPLORE,
            inventory: 0.0,
            r#use: 0.0,
            talk: 0.0,
        }
    }
}

/// Probability mass of each exploration outcome, in table order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExploreWeights {
    pub zone_change: f64,
    pub nothing: f64,
    pub item: f64,
    pub trap: f64,
    pub encounter: f64,
    pub ambush: f64,
}

impl ExploreWeights {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.zone_change + self.nothing + self.item + self.trap + self.encounter + self.ambush
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let entries = [
            ("explore_weights.zone_change", self.zone_change),
            ("explore_weights.nothing", self.nothing),
            ("explore_weights.item", self.item),
            ("explore_weights.trap", self.trap),
            ("explore_weights.encounter", self.encounter),
            ("explore_weights.ambush", self.ambush),
        ];
        for (field, value) in entries {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::MinViolation {
                    field,
                    min: 0.0,
                    value,
                });
            }
        }
        let sum = self.total();
        if (sum - 1.0).abs() > EXPLORE_WEIGHT_TOLERANCE {
            return Err(ConfigError::WeightSum { sum });
        }
        Ok(())
    }
}

impl Default for ExploreWeights {
    fn default() -> Self {
        Self {
            zone_change: EXPLORE_WEIGHT_ZONE_CHANGE,
            nothing: EXPLORE_WEIGHT_NOTHING,
            item: EXPLORE_WEIGHT_ITEM,
            trap: EXPLORE_WEIGHT_TRAP,
            encounter: EXPLORE_WEIGHT_ENCOUNTER,
            ambush: EXPLORE_WEIGHT_AMBUSH,
        }
    }
}

/// Tunable constants consumed by every resolver call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub ap_regen_per_second: f64,
    pub wait_ap_bonus: f64,
    pub wait_debt_reduction: f64,
    pub action_costs: ActionCosts,
    pub attack_base_damage: i32,
    /// Fallback window for hostiles whose definition carries no damage range.
    pub enemy_damage: DamageRange,
    pub enemy_attack_chance: f64,
    pub trap_damage: DamageRange,
    pub encounter_size_min: u32,
    pub encounter_size_max: u32,
    pub explore_weights: ExploreWeights,
    /// Enforced by the caller (see [`crate::ratelimit`]) before `resolve`.
    pub min_action_interval_ms: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            ap_regen_per_second: AP_REGEN_PER_SECOND,
            wait_ap_bonus: WAIT_AP_BONUS,
            wait_debt_reduction: WAIT_DEBT_REDUCTION,
            action_costs: ActionCosts::default(),
            attack_base_damage: ATTACK_BASE_DAMAGE,
            enemy_damage: DamageRange::new(ENEMY_DAMAGE_MIN, ENEMY_DAMAGE_MAX),
            enemy_attack_chance: ENEMY_ATTACK_CHANCE,
            trap_damage: DamageRange::new(TRAP_DAMAGE_MIN, TRAP_DAMAGE_MAX),
            encounter_size_min: ENCOUNTER_SIZE_MIN,
            encounter_size_max: ENCOUNTER_SIZE_MAX,
            explore_weights: ExploreWeights::default(),
            min_action_interval_ms: MIN_ACTION_INTERVAL_MS,
        }
    }
}

impl CoreConfig {
    /// Load the bundled configuration, falling back to compiled defaults.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_CONFIG_DATA).unwrap_or_default()
    }

    /// Parse and validate a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or any value is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate every tunable.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("ap_regen_per_second", self.ap_regen_per_second)?;
        non_negative("wait_ap_bonus", self.wait_ap_bonus)?;
        non_negative("wait_debt_reduction", self.wait_debt_reduction)?;
        self.action_costs.validate()?;
        if self.attack_base_damage < 0 {
            return Err(ConfigError::MinViolation {
                field: "attack_base_damage",
                min: 0.0,
                value: f64::from(self.attack_base_damage),
            });
        }
        self.enemy_damage.validate("enemy_damage")?;
        self.trap_damage.validate("trap_damage")?;
        if !(0.0..=1.0).contains(&self.enemy_attack_chance) {
            return Err(ConfigError::RangeViolation {
                field: "enemy_attack_chance",
                min: 0.0,
                max: 1.0,
                value: self.enemy_attack_chance,
            });
        }
        if self.encounter_size_min == 0 {
            return Err(ConfigError::MinViolation {
                field: "encounter_size_min",
                min: 1.0,
                value: 0.0,
            });
        }
        if self.encounter_size_min > self.encounter_size_max {
            return Err(ConfigError::Bounds {
                field: "encounter_size",
                min: i64::from(self.encounter_size_min),
                max: i64::from(self.encounter_size_max),
            });
        }
        self.explore_weights.validate()?;
        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::MinViolation {
            field,
            min: 0.0,
            value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn defaults_validate_and_match_bundled_asset() {
        let defaults = CoreConfig::default();
        defaults.validate().unwrap();
        let bundled = CoreConfig::from_json(DEFAULT_CONFIG_DATA).unwrap();
        assert_eq!(bundled, defaults);
        assert_eq!(CoreConfig::load_from_static(), defaults);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = CoreConfig::from_json(r#"{ "attack_base_damage": 14 }"#).unwrap();
        assert_eq!(cfg.attack_base_damage, 14);
        assert!((cfg.action_costs.cost(ActionType::Attack) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_bad_weights() {
        let mut cfg = CoreConfig::default();
        cfg.explore_weights.ambush = 0.5;
        assert!(matches!(cfg.validate(), Err(ConfigError::WeightSum { .. })));

        cfg.explore_weights = ExploreWeights::default();
        cfg.explore_weights.trap = -0.1;
        cfg.explore_weights.nothing += 0.2;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::MinViolation {
                field: "explore_weights.trap",
                ..
            })
        ));
    }

    #[test]
    fn rejects_inverted_damage_and_bad_chance() {
        let mut cfg = CoreConfig::default();
        cfg.enemy_damage = DamageRange::new(9, 3);
        assert!(matches!(cfg.validate(), Err(ConfigError::Bounds { .. })));

        let mut cfg = CoreConfig::default();
        cfg.enemy_attack_chance = 1.5;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::RangeViolation { .. })
        ));

        let mut cfg = CoreConfig::default();
        cfg.action_costs.defend = -1.0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("action_costs.defend"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            CoreConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn damage_roll_stays_in_window() {
        let range = DamageRange::new(5, 8);
        let mut low = StepRng::new(0, 0);
        assert_eq!(range.roll(&mut low), 5);
        let mut rng = StepRng::new(0, 0x9E37_79B9_7F4A_7C15);
        for _ in 0..64 {
            let value = range.roll(&mut rng);
            assert!((5..=8).contains(&value));
        }
        assert_eq!(DamageRange::new(4, 4).roll(&mut low), 4);
    }
}
