//! Centralized balance and tuning constants for the Ashfall core.
//!
//! These are the defaults behind [`crate::config::CoreConfig`]. Deployments
//! override them through configuration, never by mutating module state.

// Action points --------------------------------------------------------------
pub(crate) const AP_REGEN_PER_SECOND: f64 = 1.0;
pub(crate) const WAIT_AP_BONUS: f64 = 1.0;
pub(crate) const WAIT_DEBT_REDUCTION: f64 = 0.5;
/// Regeneration multiplier applied while any debt is outstanding.
pub(crate) const DEBT_REGEN_FACTOR: f64 = 0.5;
/// Debt above `ap_max * OVEREXTENDED_DEBT_RATIO` reads as overextended.
pub(crate) const OVEREXTENDED_DEBT_RATIO: f64 = 0.5;
pub(crate) const OVERCOMMIT_SEVERE_DEBT: f64 = 2.0;
pub(crate) const OVERCOMMIT_STRAINED_DEBT: f64 = 1.0;

// Action costs ---------------------------------------------------------------
pub(crate) const COST_ATTACK: f64 = 2.0;
pub(crate) const COST_DEFEND: f64 = 1.0;
pub(crate) const COST_EXPLORE: f64 = 3.0;

// Combat ---------------------------------------------------------------------
pub(crate) const ATTACK_BASE_DAMAGE: i32 = 10;
pub(crate) const ENEMY_DAMAGE_MIN: i32 = 5;
pub(crate) const ENEMY_DAMAGE_MAX: i32 = 15;
pub(crate) const ENEMY_ATTACK_CHANCE: f64 = 0.8;
pub(crate) const HOSTILE_STARTING_AP: u32 = 3;

// Exploration ----------------------------------------------------------------
pub(crate) const TRAP_DAMAGE_MIN: i32 = 5;
pub(crate) const TRAP_DAMAGE_MAX: i32 = 15;
pub(crate) const ENCOUNTER_SIZE_MIN: u32 = 1;
pub(crate) const ENCOUNTER_SIZE_MAX: u32 = 2;
pub(crate) const EXPLORE_WEIGHT_ZONE_CHANGE: f64 = 0.25;
pub(crate) const EXPLORE_WEIGHT_NOTHING: f64 = 0.20;
pub(crate) const EXPLORE_WEIGHT_ITEM: f64 = 0.15;
pub(crate) const EXPLORE_WEIGHT_TRAP: f64 = 0.10;
pub(crate) const EXPLORE_WEIGHT_ENCOUNTER: f64 = 0.20;
pub(crate) const EXPLORE_WEIGHT_AMBUSH: f64 = 0.10;
/// Allowed drift between the outcome weight sum and 1.0.
pub(crate) const EXPLORE_WEIGHT_TOLERANCE: f64 = 1e-6;

// Rate limiting --------------------------------------------------------------
pub(crate) const MIN_ACTION_INTERVAL_MS: u64 = 300;

// Narrative thresholds -------------------------------------------------------
pub(crate) const TIER_GLANCING_RATIO: f64 = 0.1;
pub(crate) const TIER_LIGHT_RATIO: f64 = 0.2;
pub(crate) const TIER_HEAVY_RATIO: f64 = 0.4;
pub(crate) const ENEMY_HEAVY_RATIO: f64 = 0.2;
pub(crate) const HEALTH_UNSCATHED: f64 = 0.9;
pub(crate) const HEALTH_LIGHT: f64 = 0.7;
pub(crate) const HEALTH_BLOODIED: f64 = 0.4;
pub(crate) const HEALTH_GRIEVOUS: f64 = 0.2;
