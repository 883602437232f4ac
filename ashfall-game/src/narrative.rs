//! Message tables and the pickers that map numeric outcomes onto them.
//!
//! Everything here is stateless. Variant choice draws from the caller's RNG
//! so seeded runs narrate identically.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::ap::{ApState, Overcommit, RecoveryOutcome};
use crate::constants::{
    ENEMY_HEAVY_RATIO, HEALTH_BLOODIED, HEALTH_GRIEVOUS, HEALTH_LIGHT, HEALTH_UNSCATHED,
    TIER_GLANCING_RATIO, TIER_HEAVY_RATIO, TIER_LIGHT_RATIO,
};
use crate::explore::ExploreOutcome;
use crate::numbers::ratio;

const ATTACK_MISS: &[&str] = &[
    "You swing wide, hitting nothing but air.",
    "Your attack is easily sidestepped.",
    "You stumble, missing your mark.",
    "The enemy weaves away from your strike.",
];
const ATTACK_GLANCING: &[&str] = &[
    "You land a glancing blow.",
    "Your strike connects, but lacks force.",
    "You scrape the enemy's defense.",
];
const ATTACK_LIGHT: &[&str] = &["Your hit lands solid.", "You strike true.", "A clean hit."];
const ATTACK_HEAVY: &[&str] = &[
    "You strike with crushing force!",
    "A devastating blow!",
    "You drive your weapon deep!",
    "The impact echoes through the chamber.",
];
const ATTACK_CRITICAL: &[&str] = &[
    "CRITICAL HIT! You shatter their defense!",
    "A lethal strike! Use this advantage!",
    "Perfect form. Perfect execution. Maximum damage.",
];

const DEFEND: &[&str] = &[
    "You raise your guard, eyes locked on the enemy.",
    "You brace yourself for the incoming assault.",
    "You shift into a defensive stance.",
    "You prioritize survival, ready to parry.",
];

const ENEMY_MISS: &[&str] = &[
    "{attacker} lunges but misses!",
    "{attacker}'s attack whistles past you.",
    "{attacker} strikes the air where you stood.",
];
const ENEMY_HIT: &[&str] = &[
    "{attacker} strikes you!",
    "{attacker} lands a blow.",
    "{attacker} attacks with ferocity.",
];
const ENEMY_HEAVY: &[&str] = &[
    "{attacker} smashes into your defenses!",
    "A heavy blow from {attacker} staggers you!",
    "{attacker} connects with brutal force.",
];
const ENEMY_HESITATE: &[&str] = &[
    "{attacker} hesitates, circling warily.",
    "{attacker} holds back, measuring you.",
    "{attacker} falters and gives ground.",
];

const EXPLORE_NOTHING: &[&str] = &[
    "The corridor stretches on, silent and empty.",
    "Dust dampens your footsteps. Nothing here.",
    "You search the area, but find only debris.",
    "A cold wind blows through the hollow halls.",
];
const EXPLORE_ITEM: &[&str] = &[
    "You pry open a rusted container... supplies!",
    "Glinting in the debris, you spot something useful.",
    "A hidden cache! Fortune smiles upon you.",
    "Scavenging pays off. You found something.",
];
const EXPLORE_TRAP: &[&str] = &[
    "CLICK. The sound echoes. You freeze, too late!",
    "The floor gives way beneath you!",
    "A tripwire snaps. Pain explodes!",
    "You triggered a security measure!",
];
const EXPLORE_ENCOUNTER: &[&str] = &[
    "Movement! Something emerges from the shadows.",
    "A low growl freezes your blood. You are not alone.",
    "Mechanical whirring starts up ahead. Hostiles!",
    "You walked right into them. Prepare for combat!",
];
const EXPLORE_AMBUSH: &[&str] = &[
    "Ambush! They were waiting for you!",
    "Ambush! Attackers spring from the darkness!",
    "Ambush! Defend yourself!",
    "Ambush! You are surrounded before you realize it.",
];
const EXPLORE_WANDER: &[&str] = &[
    "You find a path leading onward, but it loops back.",
    "The trail forks and rejoins. You are where you started.",
];

const INVENTORY: &str = "You rummage through your pack.";
const USE: &str = "You reach for the item, but nothing happens yet.";
const TALK: &str = "Your words echo, but no one answers.";

pub const TARGET_GONE: &str = "You strike at nothing. The enemy is gone.";
pub const EXPLORE_BLOCKED: &str = "You cannot explore with enemies this close.";
pub const AREA_QUIET: &str = "The area is quiet. Nothing stirs.";
pub const COMBAT_BEGINS: &str = "Combat begins.";
pub const AMBUSH_WARNING: &str = "Ambush! The enemy strikes before you can act.";
pub const VICTORY: &str = "The last foe falls. Silence returns.";
pub const DEATH: &str = "Darkness takes you.";

/// Attack severity by damage relative to the target's max HP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackTier {
    Miss,
    Glancing,
    Light,
    Heavy,
    Critical,
}

impl AttackTier {
    #[must_use]
    pub fn from_damage(damage: i32, target_hp_max: i32) -> Self {
        if damage <= 0 {
            return Self::Miss;
        }
        let share = ratio(damage, target_hp_max);
        if share < TIER_GLANCING_RATIO {
            Self::Glancing
        } else if share < TIER_LIGHT_RATIO {
            Self::Light
        } else if share < TIER_HEAVY_RATIO {
            Self::Heavy
        } else {
            Self::Critical
        }
    }

    const fn lines(self) -> &'static [&'static str] {
        match self {
            Self::Miss => ATTACK_MISS,
            Self::Glancing => ATTACK_GLANCING,
            Self::Light => ATTACK_LIGHT,
            Self::Heavy => ATTACK_HEAVY,
            Self::Critical => ATTACK_CRITICAL,
        }
    }
}

/// Enemy strike severity by damage relative to the player's max HP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrikeSeverity {
    Miss,
    Hit,
    Heavy,
}

impl StrikeSeverity {
    #[must_use]
    pub fn from_damage(damage: i32, player_hp_max: i32) -> Self {
        if damage <= 0 {
            Self::Miss
        } else if ratio(damage, player_hp_max) < ENEMY_HEAVY_RATIO {
            Self::Hit
        } else {
            Self::Heavy
        }
    }

    const fn lines(self) -> &'static [&'static str] {
        match self {
            Self::Miss => ENEMY_MISS,
            Self::Hit => ENEMY_HIT,
            Self::Heavy => ENEMY_HEAVY,
        }
    }
}

fn pick<R: Rng>(rng: &mut R, lines: &'static [&'static str]) -> &'static str {
    lines.choose(rng).copied().unwrap_or_default()
}

fn with_attacker(template: &str, attacker: &str) -> String {
    template.replace("{attacker}", attacker)
}

#[must_use]
pub fn attack_line<R: Rng>(tier: AttackTier, rng: &mut R) -> &'static str {
    pick(rng, tier.lines())
}

#[must_use]
pub fn defend_line<R: Rng>(rng: &mut R) -> &'static str {
    pick(rng, DEFEND)
}

#[must_use]
pub fn enemy_attack_line<R: Rng>(
    severity: StrikeSeverity,
    attacker: &str,
    rng: &mut R,
) -> String {
    with_attacker(pick(rng, severity.lines()), attacker)
}

#[must_use]
pub fn hesitation_line<R: Rng>(attacker: &str, rng: &mut R) -> String {
    with_attacker(pick(rng, ENEMY_HESITATE), attacker)
}

/// Flavor for an exploration result. Zone changes narrate with the
/// destination's welcome text instead; this covers the no-destination case.
#[must_use]
pub fn explore_line<R: Rng>(outcome: ExploreOutcome, rng: &mut R) -> &'static str {
    let lines = match outcome {
        ExploreOutcome::ZoneChange => EXPLORE_WANDER,
        ExploreOutcome::Nothing => EXPLORE_NOTHING,
        ExploreOutcome::Item => EXPLORE_ITEM,
        ExploreOutcome::Trap => EXPLORE_TRAP,
        ExploreOutcome::Encounter => EXPLORE_ENCOUNTER,
        ExploreOutcome::Ambush => EXPLORE_AMBUSH,
    };
    pick(rng, lines)
}

#[must_use]
pub const fn ap_state_line(state: ApState) -> &'static str {
    match state {
        ApState::Exhausted => "Your limbs feel like lead. Every breath is a struggle.",
        ApState::Winded => "You catch your breath, muscles burning.",
        ApState::Recovering => "Strength slowly returns, though the strain lingers.",
        ApState::Ready => "You stand poised, ready to act.",
        ApState::Overextended => "You pushed too far. Your body screams for rest.",
    }
}

#[must_use]
pub const fn overcommit_line(severity: Overcommit) -> &'static str {
    match severity {
        Overcommit::Severe => "You push beyond your limits. Pain lances through exhausted muscles.",
        Overcommit::Strained => "You strain yourself, feeling the cost of over-commitment.",
        Overcommit::Mild => "You push harder than you should.",
    }
}

#[must_use]
pub const fn recovery_line(outcome: RecoveryOutcome) -> &'static str {
    match outcome {
        RecoveryOutcome::DebtCleared => "You steady your breathing. The strain fades. Focus returns.",
        RecoveryOutcome::DebtEased => "You hold position, letting exhaustion slowly ebb away.",
        RecoveryOutcome::Gathered => "You wait, gathering your strength.",
        RecoveryOutcome::Holding => "You hold, watching. Waiting.",
    }
}

#[must_use]
pub fn health_description(current: i32, max: i32) -> &'static str {
    let share = ratio(current, max);
    if share >= HEALTH_UNSCATHED {
        "unscathed"
    } else if share >= HEALTH_LIGHT {
        "lightly wounded"
    } else if share >= HEALTH_BLOODIED {
        "bloodied"
    } else if share >= HEALTH_GRIEVOUS {
        "grievously wounded"
    } else if share > 0.0 {
        "near death"
    } else {
        "dead"
    }
}

#[must_use]
pub const fn inventory_line() -> &'static str {
    INVENTORY
}

#[must_use]
pub const fn use_line() -> &'static str {
    USE
}

#[must_use]
pub const fn talk_line() -> &'static str {
    TALK
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn attack_tiers_follow_damage_ratio() {
        assert_eq!(AttackTier::from_damage(0, 20), AttackTier::Miss);
        assert_eq!(AttackTier::from_damage(5, 100), AttackTier::Glancing);
        assert_eq!(AttackTier::from_damage(10, 100), AttackTier::Light);
        assert_eq!(AttackTier::from_damage(10, 35), AttackTier::Heavy);
        assert_eq!(AttackTier::from_damage(10, 20), AttackTier::Critical);
        assert_eq!(AttackTier::from_damage(10, 0), AttackTier::Glancing);
    }

    #[test]
    fn enemy_severity_uses_player_max_hp() {
        assert_eq!(StrikeSeverity::from_damage(0, 100), StrikeSeverity::Miss);
        assert_eq!(StrikeSeverity::from_damage(19, 100), StrikeSeverity::Hit);
        assert_eq!(StrikeSeverity::from_damage(20, 100), StrikeSeverity::Heavy);
    }

    #[test]
    fn pickers_substitute_attacker_and_stay_in_table() {
        let mut rng = StepRng::new(0, 0);
        let line = enemy_attack_line(StrikeSeverity::Hit, "Feral Hound", &mut rng);
        assert_eq!(line, "Feral Hound strikes you!");
        let line = hesitation_line("Raider", &mut rng);
        assert!(line.starts_with("Raider"));
        assert!(!line.contains("{attacker}"));
        assert!(ATTACK_CRITICAL.contains(&attack_line(AttackTier::Critical, &mut rng)));
        assert!(DEFEND.contains(&defend_line(&mut rng)));
    }

    #[test]
    fn ambush_flavor_always_names_the_ambush() {
        let mut rng = StepRng::new(0, 0x1234_5678_9abc_def1);
        for _ in 0..16 {
            assert!(explore_line(ExploreOutcome::Ambush, &mut rng).contains("Ambush"));
        }
    }

    #[test]
    fn health_descriptions_cover_every_band() {
        assert_eq!(health_description(20, 20), "unscathed");
        assert_eq!(health_description(15, 20), "lightly wounded");
        assert_eq!(health_description(10, 20), "bloodied");
        assert_eq!(health_description(4, 20), "grievously wounded");
        assert_eq!(health_description(1, 20), "near death");
        assert_eq!(health_description(0, 20), "dead");
    }

    #[test]
    fn resource_lines_are_distinct() {
        assert_ne!(
            overcommit_line(Overcommit::Mild),
            overcommit_line(Overcommit::Severe)
        );
        assert_eq!(
            ap_state_line(ApState::Ready),
            "You stand poised, ready to act."
        );
        assert!(recovery_line(RecoveryOutcome::DebtCleared).contains("strain fades"));
    }
}
