//! Ashfall Game Core
//!
//! Turn resolution for the Ashfall encounter game: the action-point economy
//! with debt and real-time recovery, the combat turn state machine, and the
//! action resolver with its exploration roller and narrative tables.
//! This crate holds no transport, persistence or UI code.

pub mod action;
pub mod ap;
pub mod character;
pub mod clock;
pub mod config;
pub mod constants;
pub mod data;
pub mod encounter;
pub mod event;
pub mod explore;
pub mod narrative;
pub mod numbers;
pub mod ratelimit;
pub mod resolver;
pub mod rng;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export commonly used types
pub use action::{ActionIntent, ActionType};
pub use ap::{ApState, Overcommit, Recovery, RecoveryOutcome, Spend};
pub use character::{CharacterError, CharacterSnapshot, CharacterStatus};
pub use clock::{Clock, FixedClock, ManualClock, SystemClock, current_value};
pub use config::{ActionCosts, ConfigError, CoreConfig, DamageRange, ExploreWeights};
pub use data::{DataError, EnemyDef, GameData, ZoneDef, ZoneKind};
pub use encounter::{
    EncounterState, EncounterStateError, HostileActor, Intent, Opening, Phase, advance,
    create_encounter, is_complete, is_player_turn,
};
pub use event::{EventKind, GameEvent, StampedEvent};
pub use explore::{ExploreOutcome, roll_outcome};
pub use ratelimit::{RateLimit, check_rate_limit};
pub use resolver::{Resolution, ResolveError, Resolver};
pub use rng::{CountingRng, RngBundle};

/// Name passed to [`DataLoader::load_config`] for the core tunables.
pub const CORE_CONFIG_NAME: &str = "core";

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the enemy and zone tables.
    ///
    /// # Errors
    ///
    /// Returns an error if the tables cannot be loaded.
    fn load_game_data(&self) -> Result<GameData, Self::Error>;

    /// Load configuration data for a specific system
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: serde::de::DeserializeOwned;
}

/// A stored record and the version it was read at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

impl<T> Versioned<T> {
    pub const fn new(version: u64, value: T) -> Self {
        Self { version, value }
    }
}

/// Everything one request writes, applied atomically by storage.
///
/// `expected_*_version` is the version the engine read, or `None` when the
/// record did not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnCommit {
    pub encounter_id: String,
    pub expected_character_version: Option<u64>,
    pub expected_encounter_version: Option<u64>,
    pub character: CharacterSnapshot,
    pub encounter: EncounterState,
    pub events: Vec<GameEvent>,
    pub committed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitStatus {
    /// Written; events carry their assigned ids.
    Committed(Vec<StampedEvent>),
    /// Another writer got there first. Nothing was written.
    Conflict,
}

/// Trait for abstracting persistence of snapshots and events
/// Platform-specific implementations should provide this
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load a character snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read.
    fn load_character(
        &self,
        character_id: &str,
    ) -> Result<Option<Versioned<CharacterSnapshot>>, Self::Error>;

    /// Load an encounter snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read.
    fn load_encounter(
        &self,
        encounter_id: &str,
    ) -> Result<Option<Versioned<EncounterState>>, Self::Error>;

    /// Write both snapshots and append the events, or nothing at all when
    /// either expected version is stale.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails for reasons other than a conflict.
    fn commit(&self, commit: TurnCommit) -> Result<CommitStatus, Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("character {0} not found")]
    CharacterNotFound(String),
    #[error("unknown enemy definition {0}")]
    UnknownEnemy(String),
    #[error("an encounter needs at least one enemy")]
    NoEnemies,
    #[error("encounter {0} is already in combat")]
    EncounterInProgress(String),
    #[error("{} Try again in {wait_ms}ms.", ratelimit::TOO_FAST)]
    RateLimited { wait_ms: u64 },
    #[error("state changed underneath this request; reload and retry")]
    Conflict,
}

/// Result of one committed request.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    pub character: CharacterSnapshot,
    pub encounter: EncounterState,
    pub events: Vec<StampedEvent>,
}

/// What a player is shown about their own character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: String,
    pub name: String,
    pub hp: i32,
    pub hp_max: i32,
    pub mp: i32,
    pub mp_max: i32,
    pub ap: u32,
    pub ap_max: u32,
    pub ap_debt: f64,
    pub ap_state: ApState,
    pub status: CharacterStatus,
}

/// Main engine wiring loaded data, storage and a clock around the resolver
pub struct GameEngine<L, S, C = SystemClock>
where
    L: DataLoader,
    S: GameStorage,
    C: Clock,
{
    data_loader: L,
    storage: S,
    clock: C,
    config: CoreConfig,
    data: GameData,
}

impl<L, S, C> GameEngine<L, S, C>
where
    L: DataLoader,
    S: GameStorage,
    C: Clock,
{
    /// Load and validate configuration and tables through `data_loader`.
    ///
    /// # Errors
    ///
    /// Returns an error if either source fails to load or validate.
    pub fn new(data_loader: L, storage: S, clock: C) -> anyhow::Result<Self> {
        let config: CoreConfig = data_loader
            .load_config(CORE_CONFIG_NAME)
            .context("loading core config")?;
        config.validate().context("validating core config")?;
        let data = data_loader
            .load_game_data()
            .context("loading game data")?;
        data.validate().context("validating game data")?;
        log::debug!(
            "engine ready: {} enemies, {} zones",
            data.enemies.len(),
            data.zones.len()
        );
        Ok(Self {
            data_loader,
            storage,
            clock,
            config,
            data,
        })
    }

    /// Re-read tables through the loader, keeping the current ones on failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the new tables fail to load or validate.
    pub fn reload_data(&mut self) -> anyhow::Result<()> {
        let data = self
            .data_loader
            .load_game_data()
            .context("reloading game data")?;
        data.validate().context("validating game data")?;
        self.data = data;
        Ok(())
    }

    #[must_use]
    pub const fn config(&self) -> &CoreConfig {
        &self.config
    }

    #[must_use]
    pub const fn data(&self) -> &GameData {
        &self.data
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Resolve one player intent end to end.
    ///
    /// Rate limit, load, validate, resolve, run the hostile phase when the
    /// player's action handed it the turn, then commit under the versions
    /// read. Player rules draw from `rngs.action()`, hostiles from
    /// `rngs.enemy()`.
    ///
    /// # Errors
    ///
    /// [`EngineError`] for missing characters, throttling and write
    /// conflicts; [`ResolveError`] for rejected intents; storage errors as-is.
    pub fn submit(&self, intent: &ActionIntent, rngs: &RngBundle) -> anyhow::Result<TurnReport> {
        let now = self.clock.now();
        let character = self.load_character(&intent.actor_id)?;
        if let RateLimit::Throttled { wait_ms } = check_rate_limit(
            character.value.last_action_at,
            now,
            self.config.min_action_interval_ms,
        ) {
            log::warn!("throttled {} for {wait_ms}ms", intent.actor_id);
            return Err(EngineError::RateLimited { wait_ms }.into());
        }
        let (encounter_version, encounter) = self.load_encounter(&intent.encounter_id)?;

        let clock = FixedClock(now);
        let resolver = Resolver::new(&self.config, &self.data, &clock);
        let mut resolution = resolver.resolve_checked(
            intent,
            &character.value,
            &encounter,
            &mut *rngs.action(),
        )?;
        if resolution.encounter.phase == Phase::EnemyTurn {
            let hostile = resolver.resolve_enemy_turn(
                &intent.encounter_id,
                &resolution.character,
                &resolution.encounter,
                &mut *rngs.enemy(),
            )?;
            resolution.events.extend(hostile.events);
            resolution.character = hostile.character;
            resolution.encounter = hostile.encounter;
        }
        resolution.character.last_action_at = Some(now);

        self.commit(
            &intent.encounter_id,
            character.version,
            encounter_version,
            resolution,
            now,
        )
    }

    /// Open an encounter against the named enemy definitions.
    ///
    /// The encounter keeps the zone of any prior (finished) encounter under
    /// the same id. An ambush opening runs the hostile phase immediately.
    ///
    /// # Errors
    ///
    /// [`EngineError`] for missing characters, empty or unknown enemy lists,
    /// an encounter already in combat and write conflicts;
    /// [`ResolveError::CharacterDead`] for a fallen character.
    pub fn start_combat(
        &self,
        encounter_id: &str,
        actor_id: &str,
        enemy_ids: &[&str],
        opening: Opening,
        rngs: &RngBundle,
    ) -> anyhow::Result<TurnReport> {
        if enemy_ids.is_empty() {
            return Err(EngineError::NoEnemies.into());
        }
        let defs = enemy_ids
            .iter()
            .map(|id| {
                self.data
                    .enemy(id)
                    .ok_or_else(|| EngineError::UnknownEnemy((*id).to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let now = self.clock.now();
        let character = self.load_character(actor_id)?;
        if character.value.is_dead() {
            return Err(ResolveError::CharacterDead(actor_id.to_string()).into());
        }
        character.value.validate().map_err(ResolveError::from)?;
        let (existing_version, existing) = self.load_encounter(encounter_id)?;
        if existing.in_combat() {
            return Err(EngineError::EncounterInProgress(encounter_id.to_string()).into());
        }

        let mut party: Vec<HostileActor> = Vec::with_capacity(defs.len());
        for def in defs {
            explore::enlist(&mut party, def.spawn(&mut *rngs.action()));
        }
        let (encounter, events) = create_encounter(
            encounter_id,
            &[actor_id.to_string()],
            party,
            opening,
            existing.current_zone,
        );
        let mut next = character.value.clone();
        next.status = CharacterStatus::InCombat;
        let mut resolution = Resolution {
            character: next,
            encounter,
            events,
        };

        if resolution.encounter.phase == Phase::EnemyTurn {
            let clock = FixedClock(now);
            let resolver = Resolver::new(&self.config, &self.data, &clock);
            let hostile = resolver.resolve_enemy_turn(
                encounter_id,
                &resolution.character,
                &resolution.encounter,
                &mut *rngs.enemy(),
            )?;
            resolution.events.extend(hostile.events);
            resolution.character = hostile.character;
            resolution.encounter = hostile.encounter;
        }

        self.commit(
            encounter_id,
            character.version,
            existing_version,
            resolution,
            now,
        )
    }

    /// Player-facing summary of a character at the current instant.
    ///
    /// # Errors
    ///
    /// [`EngineError::CharacterNotFound`] or a storage error.
    pub fn player_view(&self, character_id: &str) -> anyhow::Result<PlayerView> {
        let now = self.clock.now();
        let character = self.load_character(character_id)?.value;
        Ok(PlayerView {
            ap: ap::display_ap(&character, now, &self.config),
            ap_state: ap::state(&character, now, &self.config),
            id: character.id,
            name: character.name,
            hp: character.hp,
            hp_max: character.hp_max,
            mp: character.mp,
            mp_max: character.mp_max,
            ap_max: character.ap_max,
            ap_debt: character.ap_debt,
            status: character.status,
        })
    }

    fn load_character(&self, character_id: &str) -> anyhow::Result<Versioned<CharacterSnapshot>> {
        self.storage
            .load_character(character_id)
            .with_context(|| format!("loading character {character_id}"))?
            .ok_or_else(|| {
                anyhow::Error::from(EngineError::CharacterNotFound(character_id.to_string()))
            })
    }

    /// Missing encounters read as idle with no version.
    fn load_encounter(&self, encounter_id: &str) -> anyhow::Result<(Option<u64>, EncounterState)> {
        let stored = self
            .storage
            .load_encounter(encounter_id)
            .with_context(|| format!("loading encounter {encounter_id}"))?;
        Ok(match stored {
            Some(record) => (Some(record.version), record.value),
            None => (None, EncounterState::idle()),
        })
    }

    fn commit(
        &self,
        encounter_id: &str,
        character_version: u64,
        encounter_version: Option<u64>,
        resolution: Resolution,
        now: DateTime<Utc>,
    ) -> anyhow::Result<TurnReport> {
        let commit = TurnCommit {
            encounter_id: encounter_id.to_string(),
            expected_character_version: Some(character_version),
            expected_encounter_version: encounter_version,
            character: resolution.character.clone(),
            encounter: resolution.encounter.clone(),
            events: resolution.events,
            committed_at: now,
        };
        match self
            .storage
            .commit(commit)
            .with_context(|| format!("committing encounter {encounter_id}"))?
        {
            CommitStatus::Committed(events) => Ok(TurnReport {
                character: resolution.character,
                encounter: resolution.encounter,
                events,
            }),
            CommitStatus::Conflict => {
                log::warn!("version conflict on encounter {encounter_id}");
                Err(EngineError::Conflict.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde::de::DeserializeOwned;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Copy, Default)]
    struct FixtureLoader;

    impl DataLoader for FixtureLoader {
        type Error = Infallible;

        fn load_game_data(&self) -> Result<GameData, Self::Error> {
            Ok(GameData::load_from_static())
        }

        fn load_config<T>(&self, _config_name: &str) -> Result<T, Self::Error>
        where
            T: DeserializeOwned,
        {
            let parsed = serde_json::from_str("{}")
                .or_else(|_| serde_json::from_str("null"))
                .unwrap();
            Ok(parsed)
        }
    }

    #[derive(Clone, Default)]
    struct MemoryStorage {
        characters: Rc<RefCell<HashMap<String, Versioned<CharacterSnapshot>>>>,
        encounters: Rc<RefCell<HashMap<String, Versioned<EncounterState>>>>,
        events: Rc<RefCell<Vec<StampedEvent>>>,
    }

    impl MemoryStorage {
        fn put_character(&self, character: CharacterSnapshot) {
            self.characters
                .borrow_mut()
                .insert(character.id.clone(), Versioned::new(1, character));
        }

        fn character(&self, id: &str) -> Versioned<CharacterSnapshot> {
            self.characters.borrow().get(id).cloned().unwrap()
        }
    }

    impl GameStorage for MemoryStorage {
        type Error = Infallible;

        fn load_character(
            &self,
            character_id: &str,
        ) -> Result<Option<Versioned<CharacterSnapshot>>, Self::Error> {
            Ok(self.characters.borrow().get(character_id).cloned())
        }

        fn load_encounter(
            &self,
            encounter_id: &str,
        ) -> Result<Option<Versioned<EncounterState>>, Self::Error> {
            Ok(self.encounters.borrow().get(encounter_id).cloned())
        }

        fn commit(&self, commit: TurnCommit) -> Result<CommitStatus, Self::Error> {
            let mut characters = self.characters.borrow_mut();
            let mut encounters = self.encounters.borrow_mut();
            let character_version = characters.get(&commit.character.id).map(|c| c.version);
            let encounter_version = encounters.get(&commit.encounter_id).map(|e| e.version);
            if character_version != commit.expected_character_version
                || encounter_version != commit.expected_encounter_version
            {
                return Ok(CommitStatus::Conflict);
            }
            characters.insert(
                commit.character.id.clone(),
                Versioned::new(character_version.unwrap_or(0) + 1, commit.character),
            );
            encounters.insert(
                commit.encounter_id.clone(),
                Versioned::new(encounter_version.unwrap_or(0) + 1, commit.encounter),
            );
            let mut log = self.events.borrow_mut();
            let mut stamped = Vec::with_capacity(commit.events.len());
            for event in commit.events {
                let id = u64::try_from(log.len()).unwrap() + 1;
                let event = event.stamp(id, commit.committed_at);
                log.push(event.clone());
                stamped.push(event);
            }
            Ok(CommitStatus::Committed(stamped))
        }
    }

    /// Storage whose writes always lose the race.
    #[derive(Clone, Default)]
    struct RacingStorage(MemoryStorage);

    impl GameStorage for RacingStorage {
        type Error = Infallible;

        fn load_character(
            &self,
            character_id: &str,
        ) -> Result<Option<Versioned<CharacterSnapshot>>, Self::Error> {
            self.0.load_character(character_id)
        }

        fn load_encounter(
            &self,
            encounter_id: &str,
        ) -> Result<Option<Versioned<EncounterState>>, Self::Error> {
            self.0.load_encounter(encounter_id)
        }

        fn commit(&self, _commit: TurnCommit) -> Result<CommitStatus, Self::Error> {
            Ok(CommitStatus::Conflict)
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 7, 7, 0, 0).unwrap()
    }

    fn engine() -> (GameEngine<FixtureLoader, MemoryStorage, ManualClock>, MemoryStorage) {
        let storage = MemoryStorage::default();
        storage.put_character(CharacterSnapshot::new("p1", "Rook", 3, 100, 10, t0()));
        let engine =
            GameEngine::new(FixtureLoader, storage.clone(), ManualClock::new(t0())).unwrap();
        (engine, storage)
    }

    fn engine_error(err: &anyhow::Error) -> Option<&EngineError> {
        err.downcast_ref::<EngineError>()
    }

    #[test]
    fn engine_loads_defaults() {
        let (engine, _) = engine();
        assert_eq!(engine.config(), &CoreConfig::default());
        assert_eq!(engine.data().enemies.len(), 5);
    }

    #[test]
    fn attack_hands_turn_to_hostiles_and_back() {
        let (engine, storage) = engine();
        let rngs = RngBundle::from_user_seed(11);
        let opened = engine
            .start_combat("enc", "p1", &["scavenger_drone"], Opening::Standard, &rngs)
            .unwrap();
        assert_eq!(opened.encounter.phase, Phase::PlayerTurn);
        assert_eq!(opened.character.status, CharacterStatus::InCombat);
        let drone = opened.encounter.enemies[0].id.clone();

        let intent = ActionIntent::new(ActionType::Attack, "p1", "enc").with_target(&drone);
        let report = engine.submit(&intent, &rngs).unwrap();
        assert_eq!(report.encounter.enemies[0].hp, 10);
        assert_eq!(report.encounter.phase, Phase::PlayerTurn);
        assert_eq!(report.encounter.round, 2);
        assert!((report.character.ap_current - 1.0).abs() < 1e-9);
        assert_eq!(report.character.last_action_at, Some(t0()));
        assert_eq!(report.events[0].event.kind, EventKind::PlayerAction);
        assert_eq!(
            report.events.last().unwrap().event.kind,
            EventKind::EnemyAction
        );
        assert!(report.events.windows(2).all(|w| w[0].id < w[1].id));

        let stored = storage.character("p1");
        assert_eq!(stored.version, 3);
        assert_eq!(stored.value, report.character);
    }

    #[test]
    fn rapid_resubmission_is_throttled() {
        let (engine, _) = engine();
        let rngs = RngBundle::from_user_seed(3);
        let look = ActionIntent::new(ActionType::Look, "p1", "enc");
        engine.submit(&look, &rngs).unwrap();
        let err = engine.submit(&look, &rngs).unwrap_err();
        assert_eq!(
            engine_error(&err),
            Some(&EngineError::RateLimited { wait_ms: 300 })
        );
        assert!(err.to_string().starts_with(ratelimit::TOO_FAST));

        engine.clock.advance(Duration::milliseconds(300));
        engine.submit(&look, &rngs).unwrap();
    }

    #[test]
    fn stale_versions_surface_as_conflict() {
        let storage = RacingStorage::default();
        storage
            .0
            .put_character(CharacterSnapshot::new("p1", "Rook", 3, 100, 0, t0()));
        let engine = GameEngine::new(FixtureLoader, storage, FixedClock(t0())).unwrap();
        let rngs = RngBundle::from_user_seed(5);
        let err = engine
            .submit(&ActionIntent::new(ActionType::Wait, "p1", "enc"), &rngs)
            .unwrap_err();
        assert_eq!(engine_error(&err), Some(&EngineError::Conflict));
    }

    #[test]
    fn missing_character_and_bad_enemy_lists_are_rejected() {
        let (engine, _) = engine();
        let rngs = RngBundle::from_user_seed(9);
        let err = engine
            .submit(&ActionIntent::new(ActionType::Look, "ghost", "enc"), &rngs)
            .unwrap_err();
        assert_eq!(
            engine_error(&err),
            Some(&EngineError::CharacterNotFound("ghost".into()))
        );

        let err = engine
            .start_combat("enc", "p1", &[], Opening::Standard, &rngs)
            .unwrap_err();
        assert_eq!(engine_error(&err), Some(&EngineError::NoEnemies));

        let err = engine
            .start_combat("enc", "p1", &["dragon"], Opening::Standard, &rngs)
            .unwrap_err();
        assert_eq!(
            engine_error(&err),
            Some(&EngineError::UnknownEnemy("dragon".into()))
        );

        engine
            .start_combat("enc", "p1", &["raider"], Opening::Standard, &rngs)
            .unwrap();
        let err = engine
            .start_combat("enc", "p1", &["raider"], Opening::Standard, &rngs)
            .unwrap_err();
        assert_eq!(
            engine_error(&err),
            Some(&EngineError::EncounterInProgress("enc".into()))
        );
    }

    #[test]
    fn ambush_opening_strikes_first() {
        let (engine, _) = engine();
        let rngs = RngBundle::from_user_seed(21);
        let report = engine
            .start_combat(
                "enc",
                "p1",
                &["raider", "raider"],
                Opening::Ambush,
                &rngs,
            )
            .unwrap();
        assert_eq!(report.events[0].event.message, narrative::AMBUSH_WARNING);
        assert_eq!(report.encounter.phase, Phase::PlayerTurn);
        assert_eq!(report.encounter.round, 2);
        assert_ne!(report.encounter.enemies[0].id, report.encounter.enemies[1].id);
        assert!(
            report
                .events
                .iter()
                .any(|e| e.event.kind == EventKind::EnemyAction)
        );
    }

    #[test]
    fn player_view_reflects_regeneration() {
        let (engine, storage) = engine();
        let mut tired = storage.character("p1").value;
        tired.ap_current = 0.5;
        storage.put_character(tired);
        engine.clock.advance(Duration::milliseconds(500));
        let view = engine.player_view("p1").unwrap();
        assert_eq!(view.ap, 1);
        assert_eq!(view.ap_max, 3);
        assert_eq!(view.ap_state, ApState::Winded);
        assert_eq!(view.status, CharacterStatus::Alive);
    }

    #[test]
    fn dead_characters_cannot_start_fights() {
        let (engine, storage) = engine();
        let mut fallen = storage.character("p1").value;
        fallen.hp = 0;
        fallen.status = CharacterStatus::Dead;
        storage.put_character(fallen);
        let err = engine
            .start_combat(
                "enc",
                "p1",
                &["raider"],
                Opening::Standard,
                &RngBundle::from_user_seed(1),
            )
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResolveError>(),
            Some(ResolveError::CharacterDead(_))
        ));
    }
}
