//! In-process collaborators for driving `GameEngine` without a database.
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use ashfall_game::{
    CharacterSnapshot, CommitStatus, CoreConfig, DataLoader, EncounterState, GameData,
    GameStorage, StampedEvent, TurnCommit, Versioned,
};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Bundled tables, with an optional on-disk override for the core config.
#[derive(Debug, Clone, Default)]
pub struct AssetLoader {
    config_path: Option<PathBuf>,
}

impl AssetLoader {
    #[must_use]
    pub fn new(config_path: Option<&Path>) -> Self {
        Self {
            config_path: config_path.map(Path::to_path_buf),
        }
    }
}

impl DataLoader for AssetLoader {
    type Error = LoaderError;

    fn load_game_data(&self) -> Result<GameData, Self::Error> {
        Ok(GameData::load_from_static())
    }

    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: DeserializeOwned,
    {
        if let Some(path) = &self.config_path {
            log::debug!("loading {config_name} config from {}", path.display());
            let json = std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
                path: path.clone(),
                source,
            })?;
            return Ok(serde_json::from_str(&json)?);
        }
        let bundled = serde_json::to_value(CoreConfig::load_from_static())?;
        Ok(serde_json::from_value(bundled)?)
    }
}

/// Versioned snapshot store plus an append-only event log.
///
/// Clones share the same backing maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    characters: Rc<RefCell<HashMap<String, Versioned<CharacterSnapshot>>>>,
    encounters: Rc<RefCell<HashMap<String, Versioned<EncounterState>>>>,
    events: Rc<RefCell<Vec<StampedEvent>>>,
}

impl MemoryStorage {
    /// Insert or replace a character at the next version.
    pub fn put_character(&self, character: CharacterSnapshot) {
        let mut characters = self.characters.borrow_mut();
        let version = characters.get(&character.id).map_or(1, |c| c.version + 1);
        characters.insert(character.id.clone(), Versioned::new(version, character));
    }

    #[must_use]
    pub fn character(&self, id: &str) -> Option<CharacterSnapshot> {
        self.characters.borrow().get(id).map(|c| c.value.clone())
    }

    #[must_use]
    pub fn encounter(&self, id: &str) -> Option<EncounterState> {
        self.encounters.borrow().get(id).map(|e| e.value.clone())
    }

    #[cfg(test)]
    pub fn event_count(&self) -> usize {
        self.events.borrow().len()
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
            Versioned::new(character_version.map_or(1, |v| v + 1), commit.character),
        );
        encounters.insert(
            commit.encounter_id.clone(),
            Versioned::new(encounter_version.map_or(1, |v| v + 1), commit.encounter),
        );

        let mut log = self.events.borrow_mut();
        let mut next_id = log.last().map_or(1, |event| event.id + 1);
        let stamped: Vec<StampedEvent> = commit
            .events
            .into_iter()
            .map(|event| {
                let event = event.stamp(next_id, commit.committed_at);
                next_id += 1;
                event
            })
            .collect();
        log.extend(stamped.iter().cloned());
        Ok(CommitStatus::Committed(stamped))
    }
}
