//! Action resolver: applies one player intent to a character and encounter.
//!
//! Every rule is a pure transformation. The resolver reads the injected
//! clock once per call and draws all randomness from the caller's RNG.
use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;

use crate::action::{ActionIntent, ActionType};
use crate::ap;
use crate::character::{CharacterError, CharacterSnapshot, CharacterStatus};
use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::data::GameData;
use crate::encounter::{
    EncounterState, EncounterStateError, Opening, Phase, advance, create_encounter,
    run_enemy_phase,
};
use crate::event::{EventKind, GameEvent};
use crate::explore::{ExploreOutcome, roll_outcome, spawn_party};
use crate::narrative::{
    self, AREA_QUIET, AttackTier, DEATH, EXPLORE_BLOCKED, TARGET_GONE, VICTORY,
};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unknown action: {0}")]
    InvalidAction(String),
    #[error("intent from {intent} submitted for character {character}")]
    ActorMismatch { intent: String, character: String },
    #[error("character {0} is dead")]
    CharacterDead(String),
    #[error("encounter {0} is already complete")]
    EncounterComplete(String),
    #[error("invalid character: {0}")]
    InvalidCharacter(#[from] CharacterError),
    #[error("invalid encounter: {0}")]
    InvalidEncounter(#[from] EncounterStateError),
}

/// New snapshots plus the ordered events that narrate the change.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub character: CharacterSnapshot,
    pub encounter: EncounterState,
    pub events: Vec<GameEvent>,
}

/// Working copy threaded through a single rule.
struct Turn<'i> {
    intent: &'i ActionIntent,
    now: DateTime<Utc>,
    character: CharacterSnapshot,
    encounter: EncounterState,
    events: Vec<GameEvent>,
}

impl<'i> Turn<'i> {
    fn new(
        intent: &'i ActionIntent,
        now: DateTime<Utc>,
        character: &CharacterSnapshot,
        encounter: &EncounterState,
    ) -> Self {
        Self {
            intent,
            now,
            character: character.clone(),
            encounter: encounter.clone(),
            events: Vec::new(),
        }
    }

    fn say(&mut self, kind: EventKind, message: impl Into<String>) {
        let event = GameEvent::new(
            self.intent.encounter_id.clone(),
            Some(self.intent.actor_id.as_str()),
            kind,
            message,
        );
        self.events.push(event);
    }

    fn announce(&mut self, kind: EventKind, message: impl Into<String>) {
        let event = GameEvent::ambient(self.intent.encounter_id.clone(), kind, message);
        self.events.push(event);
    }

    fn finish(mut self) -> Resolution {
        self.character.clamp();
        Resolution {
            character: self.character,
            encounter: self.encounter,
            events: self.events,
        }
    }
}

pub struct Resolver<'a, C: Clock + ?Sized> {
    cfg: &'a CoreConfig,
    data: &'a GameData,
    clock: &'a C,
}

impl<'a, C: Clock + ?Sized> Resolver<'a, C> {
    #[must_use]
    pub const fn new(cfg: &'a CoreConfig, data: &'a GameData, clock: &'a C) -> Self {
        Self { cfg, data, clock }
    }

    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        self.cfg
    }

    /// Validate both snapshots, then [`Resolver::resolve`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidCharacter` / `InvalidEncounter` for snapshots that break
    /// their invariants, plus every error `resolve` can return.
    pub fn resolve_checked<R: Rng>(
        &self,
        intent: &ActionIntent,
        character: &CharacterSnapshot,
        encounter: &EncounterState,
        rng: &mut R,
    ) -> Result<Resolution, ResolveError> {
        character.validate()?;
        encounter.validate()?;
        self.resolve(intent, character, encounter, rng)
    }

    /// Apply `intent` and return the successor state.
    ///
    /// Snapshots are trusted as given; callers loading from storage should use
    /// [`Resolver::resolve_checked`].
    ///
    /// # Errors
    ///
    /// - `ActorMismatch` when the intent names a different character.
    /// - `CharacterDead` for anything but `look` / `status` from a dead character.
    /// - `EncounterComplete` for `attack` / `defend` once the encounter ended.
    pub fn resolve<R: Rng>(
        &self,
        intent: &ActionIntent,
        character: &CharacterSnapshot,
        encounter: &EncounterState,
        rng: &mut R,
    ) -> Result<Resolution, ResolveError> {
        if intent.actor_id != character.id {
            return Err(ResolveError::ActorMismatch {
                intent: intent.actor_id.clone(),
                character: character.id.clone(),
            });
        }
        if character.is_dead() && !intent.kind.is_observation() {
            log::warn!(
                "rejecting {} from dead character {}",
                intent.kind,
                character.id
            );
            return Err(ResolveError::CharacterDead(character.id.clone()));
        }
        if encounter.phase == Phase::Complete
            && matches!(intent.kind, ActionType::Attack | ActionType::Defend)
        {
            log::warn!(
                "rejecting {} on completed encounter {}",
                intent.kind,
                intent.encounter_id
            );
            return Err(ResolveError::EncounterComplete(intent.encounter_id.clone()));
        }

        let now = self.clock.now();
        log::debug!(
            "resolving {} for {} in phase {}",
            intent.kind,
            character.id,
            encounter.phase.label()
        );
        let mut turn = Turn::new(intent, now, character, encounter);
        match intent.kind {
            ActionType::Attack => self.attack(&mut turn, rng),
            ActionType::Defend => self.defend(&mut turn, rng),
            ActionType::Wait => self.wait(&mut turn),
            ActionType::Look => self.look(&mut turn, rng),
            ActionType::Status => self.status(&mut turn),
            ActionType::Explore => self.explore(&mut turn, rng),
            ActionType::Inventory | ActionType::Use | ActionType::Talk => {
                self.acknowledge(&mut turn);
            }
        }
        Ok(turn.finish())
    }

    /// Run the hostile phase for `character`. A no-op outside `EnemyTurn`.
    ///
    /// # Errors
    ///
    /// Returns `CharacterDead` when asked to strike a character who already fell.
    pub fn resolve_enemy_turn<R: Rng>(
        &self,
        encounter_id: &str,
        character: &CharacterSnapshot,
        encounter: &EncounterState,
        rng: &mut R,
    ) -> Result<Resolution, ResolveError> {
        if encounter.phase == Phase::EnemyTurn && character.is_dead() {
            return Err(ResolveError::CharacterDead(character.id.clone()));
        }
        Ok(run_enemy_phase(self.cfg, encounter_id, character, encounter, rng))
    }

    fn pay(&self, turn: &mut Turn<'_>, kind: ActionType) {
        let cost = self.cfg.action_costs.cost(kind);
        if cost <= 0.0 {
            return;
        }
        let spent = ap::spend(&turn.character, cost, turn.now, self.cfg);
        turn.character = spent.snapshot;
        if let Some(severity) = spent.overcommit {
            turn.say(EventKind::Combat, narrative::overcommit_line(severity));
        }
    }

    fn end_player_turn(turn: &mut Turn<'_>) {
        if !turn.encounter.in_combat() {
            return;
        }
        turn.encounter = advance(&turn.encounter);
        if turn.encounter.phase == Phase::Complete {
            turn.announce(EventKind::Combat, VICTORY);
            turn.character.status = CharacterStatus::Alive;
        } else {
            turn.character.status = CharacterStatus::InCombat;
        }
    }

    fn attack<R: Rng>(&self, turn: &mut Turn<'_>, rng: &mut R) {
        self.pay(turn, ActionType::Attack);

        let target_id = turn
            .intent
            .target_id
            .clone()
            .or_else(|| turn.encounter.enemies.first().map(|enemy| enemy.id.clone()));
        let Some(index) = target_id.and_then(|id| {
            turn.encounter
                .enemies
                .iter()
                .position(|enemy| enemy.id == id)
        }) else {
            turn.say(EventKind::Combat, TARGET_GONE);
            return;
        };

        let damage = self.cfg.attack_base_damage;
        let target = &mut turn.encounter.enemies[index];
        let before = target.hp;
        target.hp = (target.hp - damage).max(0);
        let dealt = before - target.hp;
        let name = target.name.clone();
        let felled = target.hp == 0;
        let tier = AttackTier::from_damage(damage, target.hp_max);

        turn.say(
            EventKind::PlayerAction,
            format!(
                "{} You strike {name} for {dealt} damage.",
                narrative::attack_line(tier, rng)
            ),
        );
        if felled {
            turn.announce(EventKind::Combat, format!("{name} collapses, defeated."));
            turn.encounter.enemies.retain(|enemy| enemy.hp > 0);
        }
        Self::end_player_turn(turn);
    }

    fn defend<R: Rng>(&self, turn: &mut Turn<'_>, rng: &mut R) {
        self.pay(turn, ActionType::Defend);
        turn.say(EventKind::PlayerAction, narrative::defend_line(rng));
        Self::end_player_turn(turn);
    }

    fn wait(&self, turn: &mut Turn<'_>) {
        let recovery = ap::wait(&turn.character, turn.now, self.cfg);
        turn.character = recovery.snapshot;
        turn.say(
            EventKind::PlayerAction,
            narrative::recovery_line(recovery.outcome),
        );
        let state = ap::state(&turn.character, turn.now, self.cfg);
        turn.say(EventKind::Narrative, narrative::ap_state_line(state));
        Self::end_player_turn(turn);
    }

    fn look<R: Rng>(&self, turn: &mut Turn<'_>, rng: &mut R) {
        if turn.encounter.enemies.is_empty() {
            let zone = turn
                .encounter
                .current_zone
                .as_deref()
                .and_then(|id| self.data.zone(id));
            if let Some(zone) = zone {
                turn.say(
                    EventKind::Narrative,
                    format!("{}. {}", zone.name, zone.description),
                );
                if let Some(line) = zone.ambient_line(rng) {
                    turn.say(EventKind::Narrative, line);
                }
            }
            turn.say(EventKind::Narrative, AREA_QUIET);
            return;
        }

        let lines: Vec<String> = turn
            .encounter
            .enemies
            .iter()
            .map(|enemy| {
                format!(
                    "{}: {}. Intent: {}.",
                    enemy.name,
                    narrative::health_description(enemy.hp, enemy.hp_max),
                    enemy.intent.label()
                )
            })
            .collect();
        for line in lines {
            turn.say(EventKind::Narrative, line);
        }
    }

    fn status(&self, turn: &mut Turn<'_>) {
        let character = &turn.character;
        let hp_line = format!(
            "HP: {}/{} ({})",
            character.hp,
            character.hp_max,
            narrative::health_description(character.hp, character.hp_max)
        );
        let state = ap::state(character, turn.now, self.cfg);
        let ap_line = format!(
            "AP: {}/{}. {}",
            ap::display_ap(character, turn.now, self.cfg),
            character.ap_max,
            narrative::ap_state_line(state)
        );
        let mp_line = (character.mp_max > 0)
            .then(|| format!("MP: {}/{}", character.mp, character.mp_max));
        let strain_line = (character.ap_debt > 0.0)
            .then(|| format!("Strain: {:.1}. Recovery slowed.", character.ap_debt));

        turn.say(EventKind::System, hp_line);
        turn.say(EventKind::System, ap_line);
        for line in [mp_line, strain_line].into_iter().flatten() {
            turn.say(EventKind::System, line);
        }
    }

    fn explore<R: Rng>(&self, turn: &mut Turn<'_>, rng: &mut R) {
        if turn.encounter.has_hostiles() {
            turn.say(EventKind::System, EXPLORE_BLOCKED);
            return;
        }
        self.pay(turn, ActionType::Explore);
        if turn.encounter.phase == Phase::Complete {
            turn.encounter = turn.encounter.reset();
        }

        let draw: f64 = rng.r#gen();
        let outcome = roll_outcome(draw, &self.cfg.explore_weights);
        log::debug!(
            "{} explored: draw {draw:.3} -> {}",
            turn.character.id,
            outcome.label()
        );

        match outcome {
            ExploreOutcome::ZoneChange => {
                let current = turn.encounter.current_zone.clone();
                match self.data.pick_other_zone(current.as_deref(), rng) {
                    Some(zone) => {
                        turn.encounter.current_zone = Some(zone.id.clone());
                        turn.say(EventKind::Narrative, zone.welcome_line(rng));
                    }
                    None => {
                        turn.say(EventKind::Narrative, narrative::explore_line(outcome, rng));
                    }
                }
            }
            ExploreOutcome::Nothing | ExploreOutcome::Item => {
                turn.say(EventKind::Narrative, narrative::explore_line(outcome, rng));
            }
            ExploreOutcome::Trap => {
                let damage = self.cfg.trap_damage.roll(rng);
                let lost = turn.character.take_damage(damage);
                let line = narrative::explore_line(outcome, rng);
                turn.say(EventKind::Combat, format!("{line} You take {lost} damage."));
                if turn.character.hp == 0 {
                    turn.character.status = CharacterStatus::Dead;
                    turn.say(EventKind::System, DEATH);
                }
            }
            ExploreOutcome::Encounter | ExploreOutcome::Ambush => {
                let zone = turn.encounter.current_zone.clone();
                let party = spawn_party(self.data, zone.as_deref(), self.cfg, rng);
                if party.is_empty() {
                    turn.say(
                        EventKind::Narrative,
                        narrative::explore_line(ExploreOutcome::Nothing, rng),
                    );
                    return;
                }
                turn.say(EventKind::Narrative, narrative::explore_line(outcome, rng));
                let opening = if outcome == ExploreOutcome::Ambush {
                    Opening::Ambush
                } else {
                    Opening::Standard
                };
                let (encounter, opening_events) = create_encounter(
                    &turn.intent.encounter_id,
                    std::slice::from_ref(&turn.character.id),
                    party,
                    opening,
                    zone,
                );
                turn.encounter = encounter;
                turn.events.extend(opening_events);
                turn.character.status = CharacterStatus::InCombat;
            }
        }
    }

    fn acknowledge(&self, turn: &mut Turn<'_>) {
        let kind = turn.intent.kind;
        self.pay(turn, kind);
        let line = match kind {
            ActionType::Inventory => narrative::inventory_line(),
            ActionType::Use => narrative::use_line(),
            _ => narrative::talk_line(),
        };
        turn.say(EventKind::Narrative, line);
    }
}
