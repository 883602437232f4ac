//! Exploration outcome table and hostile party spawning.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::config::{CoreConfig, ExploreWeights};
use crate::data::GameData;
use crate::encounter::HostileActor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExploreOutcome {
    ZoneChange,
    Nothing,
    Item,
    Trap,
    Encounter,
    Ambush,
}

impl ExploreOutcome {
    /// Table order; each outcome owns the next slice of `[0, 1)`.
    pub const ALL: [Self; 6] = [
        Self::ZoneChange,
        Self::Nothing,
        Self::Item,
        Self::Trap,
        Self::Encounter,
        Self::Ambush,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ZoneChange => "zone_change",
            Self::Nothing => "nothing",
            Self::Item => "item",
            Self::Trap => "trap",
            Self::Encounter => "encounter",
            Self::Ambush => "ambush",
        }
    }

    #[must_use]
    pub const fn spawns_hostiles(self) -> bool {
        matches!(self, Self::Encounter | Self::Ambush)
    }

    const fn weight(self, weights: &ExploreWeights) -> f64 {
        match self {
            Self::ZoneChange => weights.zone_change,
            Self::Nothing => weights.nothing,
            Self::Item => weights.item,
            Self::Trap => weights.trap,
            Self::Encounter => weights.encounter,
            Self::Ambush => weights.ambush,
        }
    }
}

/// Map a uniform draw in `[0, 1)` onto the cumulative outcome table.
///
/// Draws past the accumulated total (float drift) land on the last outcome.
#[must_use]
pub fn roll_outcome(draw: f64, weights: &ExploreWeights) -> ExploreOutcome {
    let draw = if draw.is_finite() { draw.max(0.0) } else { 0.0 };
    let mut cumulative = 0.0;
    for outcome in ExploreOutcome::ALL {
        cumulative += outcome.weight(weights);
        if draw < cumulative {
            return outcome;
        }
    }
    ExploreOutcome::Ambush
}

/// Spawn `encounter_size_min..=encounter_size_max` hostiles from the zone's
/// pool. Empty when the table has no enemies.
pub fn spawn_party<R: Rng>(
    data: &GameData,
    zone_id: Option<&str>,
    cfg: &CoreConfig,
    rng: &mut R,
) -> Vec<HostileActor> {
    let pool = data.spawn_pool(zone_id);
    if pool.is_empty() {
        return Vec::new();
    }
    let count = if cfg.encounter_size_min >= cfg.encounter_size_max {
        cfg.encounter_size_min
    } else {
        rng.gen_range(cfg.encounter_size_min..=cfg.encounter_size_max)
    };

    let mut party: Vec<HostileActor> = Vec::new();
    for _ in 0..count {
        let Some(def) = pool.choose(rng) else {
            break;
        };
        enlist(&mut party, def.spawn(rng));
    }
    party
}

/// Append `hostile`, suffixing its id with its slot when the id is taken.
pub fn enlist(party: &mut Vec<HostileActor>, mut hostile: HostileActor) {
    let slot = party.len();
    if party.iter().any(|other| other.id == hostile.id) {
        hostile.id = format!("{}-{slot}", hostile.id);
    }
    party.push(hostile);
}
