//! One simulated player driving the engine step by step.
use anyhow::{Context, Result, bail, ensure};
use ashfall_game::{
    ActionIntent, ActionType, CharacterSnapshot, Clock, EncounterState, GameEngine, ManualClock,
    Opening, Phase, PlayerView, RngBundle, TurnReport,
};
use chrono::Duration;

use super::storage::{AssetLoader, MemoryStorage};

pub const PLAYER_ID: &str = "tester";
pub const ENCOUNTER_ID: &str = "tester-encounter";

pub type Engine<'c> = GameEngine<AssetLoader, MemoryStorage, &'c ManualClock>;

pub struct Session<'c> {
    engine: Engine<'c>,
    storage: MemoryStorage,
    clock: &'c ManualClock,
    rngs: RngBundle,
    steps: usize,
    last_event_id: u64,
}

impl<'c> Session<'c> {
    /// Fresh character at full pools, no encounter on record.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine cannot load its config or tables.
    pub fn new(loader: AssetLoader, clock: &'c ManualClock, seed: u64) -> Result<Self> {
        let storage = MemoryStorage::default();
        storage.put_character(CharacterSnapshot::new(
            PLAYER_ID,
            "Tester",
            3,
            100,
            20,
            clock.now(),
        ));
        let engine = GameEngine::new(loader, storage.clone(), clock)?;
        Ok(Self {
            engine,
            storage,
            clock,
            rngs: RngBundle::from_user_seed(seed),
            steps: 0,
            last_event_id: 0,
        })
    }

    #[must_use]
    pub const fn engine(&self) -> &Engine<'c> {
        &self.engine
    }

    #[must_use]
    pub const fn steps(&self) -> usize {
        self.steps
    }

    /// Advance by `pause`, submit one action, and check invariants.
    ///
    /// # Errors
    ///
    /// Returns the engine's error or the first broken invariant.
    pub fn act(
        &mut self,
        kind: ActionType,
        target: Option<&str>,
        pause: Duration,
    ) -> Result<TurnReport> {
        self.clock.advance(pause);
        let mut intent = ActionIntent::new(kind, PLAYER_ID, ENCOUNTER_ID);
        if let Some(target) = target {
            intent = intent.with_target(target);
        }
        let report = self
            .engine
            .submit(&intent, &self.rngs)
            .with_context(|| format!("step {} ({kind})", self.steps + 1))?;
        self.steps += 1;
        self.check(&report)
            .with_context(|| format!("after step {} ({kind})", self.steps))?;
        Ok(report)
    }

    /// Open an encounter against `enemy_ids` and check invariants.
    ///
    /// # Errors
    ///
    /// Returns the engine's error or the first broken invariant.
    pub fn start(&mut self, enemy_ids: &[&str], opening: Opening) -> Result<TurnReport> {
        let report = self
            .engine
            .start_combat(ENCOUNTER_ID, PLAYER_ID, enemy_ids, opening, &self.rngs)
            .context("starting combat")?;
        self.steps += 1;
        self.check(&report).context("after combat start")?;
        Ok(report)
    }

    /// # Errors
    ///
    /// Returns an error if the character is missing from storage.
    pub fn view(&self) -> Result<PlayerView> {
        self.engine.player_view(PLAYER_ID)
    }

    /// # Errors
    ///
    /// Returns an error if the character is missing from storage.
    pub fn character(&self) -> Result<CharacterSnapshot> {
        self.storage
            .character(PLAYER_ID)
            .context("character missing from storage")
    }

    #[must_use]
    pub fn encounter(&self) -> EncounterState {
        self.storage
            .encounter(ENCOUNTER_ID)
            .unwrap_or_else(EncounterState::idle)
    }

    fn check(&mut self, report: &TurnReport) -> Result<()> {
        report.character.validate()?;
        report.encounter.validate()?;
        ensure!(!report.events.is_empty(), "resolution produced no events");
        ensure!(
            report.encounter.phase != Phase::EnemyTurn,
            "hostile phase left pending after commit"
        );
        if report.character.is_dead() {
            ensure!(report.character.hp == 0, "dead character with hp left");
        }
        if report.character.hp == 0 && !report.character.is_dead() {
            bail!("character at 0 hp is not marked dead");
        }
        for event in &report.events {
            ensure!(
                event.id > self.last_event_id,
                "event id {} not after {}",
                event.id,
                self.last_event_id
            );
            self.last_event_id = event.id;
        }
        let stored = self.character()?;
        ensure!(stored == report.character, "stored character differs from report");
        ensure!(
            self.encounter() == report.encounter,
            "stored encounter differs from report"
        );
        Ok(())
    }
}
