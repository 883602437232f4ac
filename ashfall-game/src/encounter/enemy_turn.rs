//! Hostile phase: every live hostile acts once, in list order.
//!
//! All hostiles resolve inside one call instead of taking turns between
//! players. The hostile entries in `turn_order` only mark where the enemy
//! phase starts.
use rand::Rng;

use super::{EncounterState, Phase};
use crate::character::{CharacterSnapshot, CharacterStatus};
use crate::config::CoreConfig;
use crate::event::{EventKind, GameEvent};
use crate::narrative::{self, DEATH, StrikeSeverity};
use crate::resolver::Resolution;

/// Resolve the enemy phase against `character`.
///
/// Outside `EnemyTurn` this returns the inputs unchanged with no events.
/// A killing blow ends the phase at once and completes the encounter;
/// otherwise play returns to the first player in a new round.
pub fn run_enemy_phase<R: Rng>(
    cfg: &CoreConfig,
    encounter_id: &str,
    character: &CharacterSnapshot,
    encounter: &EncounterState,
    rng: &mut R,
) -> Resolution {
    let mut next_character = character.clone();
    let mut next_encounter = encounter.clone();
    let mut events = Vec::new();
    if encounter.phase != Phase::EnemyTurn {
        return Resolution {
            character: next_character,
            encounter: next_encounter,
            events,
        };
    }

    for hostile in encounter.enemies.iter().filter(|enemy| enemy.is_alive()) {
        if !rng.gen_bool(cfg.enemy_attack_chance) {
            events.push(GameEvent::new(
                encounter_id,
                Some(hostile.id.as_str()),
                EventKind::EnemyAction,
                narrative::hesitation_line(&hostile.name, rng),
            ));
            continue;
        }

        let damage = hostile.damage.unwrap_or(cfg.enemy_damage).roll(rng);
        let lost = next_character.take_damage(damage);
        let severity = StrikeSeverity::from_damage(lost, next_character.hp_max);
        let line = narrative::enemy_attack_line(severity, &hostile.name, rng);
        let message = if lost > 0 {
            format!("{line} You take {lost} damage.")
        } else {
            line
        };
        events.push(GameEvent::new(
            encounter_id,
            Some(hostile.id.as_str()),
            EventKind::EnemyAction,
            message,
        ));

        if next_character.hp == 0 {
            log::debug!(
                "{} fell to {} in round {}",
                next_character.id,
                hostile.id,
                encounter.round
            );
            next_character.status = CharacterStatus::Dead;
            next_encounter.phase = Phase::Complete;
            events.push(GameEvent::new(
                encounter_id,
                Some(next_character.id.as_str()),
                EventKind::System,
                DEATH,
            ));
            next_character.clamp();
            return Resolution {
                character: next_character,
                encounter: next_encounter,
                events,
            };
        }
    }

    next_encounter.phase = Phase::PlayerTurn;
    next_encounter.current_turn_index = 0;
    next_encounter.round = encounter.round.saturating_add(1);
    next_character.clamp();
    Resolution {
        character: next_character,
        encounter: next_encounter,
        events,
    }
}
