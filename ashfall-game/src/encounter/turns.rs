//! Combat turn state machine.
//!
//! `Idle -> PlayerTurn <-> EnemyTurn -> Complete`. Both functions here are
//! pure; they know nothing about why a turn ended.
use super::{EncounterState, HostileActor, Phase};
use crate::event::{EventKind, GameEvent};
use crate::narrative::{AMBUSH_WARNING, COMBAT_BEGINS};

/// How a freshly created encounter opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Opening {
    #[default]
    Standard,
    /// Hostiles act before any player.
    Ambush,
}

/// `EnemyTurn` only when the slot belongs to a hostile still standing; a
/// fallen hostile's slot passes back to the players.
fn phase_for_slot(state: &EncounterState, index: usize) -> Phase {
    let live_hostile = state.is_hostile_slot(index)
        && state
            .turn_order
            .get(index)
            .is_some_and(|id| state.enemy(id).is_some());
    if live_hostile {
        Phase::EnemyTurn
    } else {
        Phase::PlayerTurn
    }
}

/// Build a new encounter with players first, then hostiles, in round 1.
///
/// Returns the opening events: an ambush warning (ambush only), "Combat
/// begins.", then one arrival line per hostile.
#[must_use]
pub fn create_encounter(
    encounter_id: &str,
    actor_ids: &[String],
    enemies: Vec<HostileActor>,
    opening: Opening,
    current_zone: Option<String>,
) -> (EncounterState, Vec<GameEvent>) {
    let mut turn_order: Vec<String> = actor_ids.to_vec();
    turn_order.extend(enemies.iter().map(|enemy| enemy.id.clone()));
    let player_count = actor_ids.len();

    let ambush = opening == Opening::Ambush && !enemies.is_empty();
    let mut events = Vec::with_capacity(enemies.len() + 2);
    if ambush {
        events.push(GameEvent::ambient(
            encounter_id,
            EventKind::Combat,
            AMBUSH_WARNING,
        ));
    }
    events.push(GameEvent::ambient(
        encounter_id,
        EventKind::Combat,
        COMBAT_BEGINS,
    ));
    for enemy in &enemies {
        events.push(GameEvent::ambient(
            encounter_id,
            EventKind::Combat,
            format!("{} appears.", enemy.name),
        ));
    }

    let mut state = EncounterState {
        phase: Phase::PlayerTurn,
        turn_order,
        current_turn_index: 0,
        enemies,
        round: 1,
        current_zone,
        player_count,
    };
    if ambush {
        state.current_turn_index = player_count;
        state.phase = Phase::EnemyTurn;
    } else if !state.turn_order.is_empty() {
        state.phase = phase_for_slot(&state, 0);
    }
    log::debug!(
        "encounter {encounter_id} created: {} hostiles, phase {}",
        state.enemies.len(),
        state.phase.label()
    );
    (state, events)
}

/// Move to the next slot in the turn order.
///
/// An empty hostile list forces `Complete` whatever the prior phase, and
/// `Complete` is terminal. Wrapping to slot 0 starts a new round.
#[must_use]
pub fn advance(state: &EncounterState) -> EncounterState {
    let mut next = state.clone();
    if state.enemies.is_empty() || state.phase == Phase::Complete {
        next.phase = Phase::Complete;
        return next;
    }
    let len = state.turn_order.len();
    if len == 0 {
        return next;
    }
    let index = (state.current_turn_index + 1) % len;
    if index == 0 {
        next.round = state.round.saturating_add(1);
    }
    next.current_turn_index = index;
    next.phase = phase_for_slot(state, index);
    next
}

/// True when it is `actor_id`'s player turn.
#[must_use]
pub fn is_player_turn(state: &EncounterState, actor_id: &str) -> bool {
    state.phase == Phase::PlayerTurn && state.current_actor() == Some(actor_id)
}

#[must_use]
pub fn is_complete(state: &EncounterState) -> bool {
    state.phase == Phase::Complete
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounter::Intent;

    fn hostile(id: &str) -> HostileActor {
        HostileActor {
            id: id.to_string(),
            name: format!("Hostile {id}"),
            hp: 20,
            hp_max: 20,
            ap: 3,
            intent: Intent::Attack,
            damage: None,
        }
    }

    fn players(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| (*id).to_string()).collect()
    }

    #[test]
    fn standard_opening_puts_players_first() {
        let (state, events) = create_encounter(
            "enc",
            &players(&["p1", "p2"]),
            vec![hostile("e1"), hostile("e2")],
            Opening::Standard,
            Some("ruins".into()),
        );
        assert_eq!(state.turn_order, vec!["p1", "p2", "e1", "e2"]);
        assert_eq!(state.phase, Phase::PlayerTurn);
        assert_eq!(state.current_turn_index, 0);
        assert_eq!(state.round, 1);
        assert_eq!(state.player_count, 2);
        state.validate().unwrap();

        let messages: Vec<_> = events.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["Combat begins.", "Hostile e1 appears.", "Hostile e2 appears."]
        );
        assert!(is_player_turn(&state, "p1"));
        assert!(!is_player_turn(&state, "p2"));
    }

    #[test]
    fn ambush_opens_on_first_hostile_with_warning_first() {
        let (state, events) = create_encounter(
            "enc",
            &players(&["p1"]),
            vec![hostile("e1")],
            Opening::Ambush,
            None,
        );
        assert_eq!(state.phase, Phase::EnemyTurn);
        assert_eq!(state.current_actor(), Some("e1"));
        assert!(events[0].message.contains("Ambush"));
        assert_eq!(events[1].message, "Combat begins.");
        state.validate().unwrap();
    }

    #[test]
    fn advance_walks_slots_and_counts_rounds() {
        let (state, _) = create_encounter(
            "enc",
            &players(&["p1", "p2"]),
            vec![hostile("e1")],
            Opening::Standard,
            None,
        );
        let len = state.turn_order.len();
        for start in 0..len {
            let mut current = state.clone();
            current.current_turn_index = start;
            current.round = 1;
            for n in 1..=10 {
                current = advance(&current);
                assert_eq!(current.current_turn_index, (start + n) % len);
                let expected_round = 1 + u32::try_from((start + n) / len).unwrap();
                assert_eq!(current.round, expected_round);
                let expected = if current.current_turn_index >= 2 {
                    Phase::EnemyTurn
                } else {
                    Phase::PlayerTurn
                };
                assert_eq!(current.phase, expected);
            }
        }
    }

    #[test]
    fn empty_hostiles_complete_from_any_phase() {
        for phase in [
            Phase::Idle,
            Phase::PlayerTurn,
            Phase::EnemyTurn,
            Phase::Resolving,
            Phase::Complete,
        ] {
            let state = EncounterState {
                phase,
                turn_order: players(&["p1", "e1"]),
                current_turn_index: 1,
                enemies: Vec::new(),
                round: 4,
                current_zone: None,
                player_count: 1,
            };
            let once = advance(&state);
            assert!(is_complete(&once));
            let twice = advance(&once);
            assert_eq!(twice, once);
            assert_eq!(once.current_turn_index, 1);
            assert_eq!(once.round, 4);
        }
    }

    #[test]
    fn fallen_hostile_slot_passes_to_players() {
        let (mut state, _) = create_encounter(
            "enc",
            &players(&["p1"]),
            vec![hostile("e1"), hostile("e2")],
            Opening::Standard,
            None,
        );
        state.enemies.retain(|enemy| enemy.id != "e1");
        let next = advance(&state);
        assert_eq!(next.current_turn_index, 1);
        assert_eq!(next.current_actor(), Some("e1"));
        assert_eq!(next.phase, Phase::PlayerTurn);
        let after = advance(&next);
        assert_eq!(after.current_actor(), Some("e2"));
        assert_eq!(after.phase, Phase::EnemyTurn);
    }
}
