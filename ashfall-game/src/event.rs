//! Narrated output records produced by every resolution.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Combat,
    Narrative,
    System,
    PlayerAction,
    EnemyAction,
}

/// Unpersisted event. Storage assigns `id` and `created_at` on commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    pub encounter_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    pub message: String,
    pub kind: EventKind,
}

impl GameEvent {
    #[must_use]
    pub fn new(
        encounter_id: impl Into<String>,
        actor_id: Option<&str>,
        kind: EventKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            encounter_id: encounter_id.into(),
            actor_id: actor_id.map(str::to_string),
            message: message.into(),
            kind,
        }
    }

    /// Event with no acting character.
    #[must_use]
    pub fn ambient(
        encounter_id: impl Into<String>,
        kind: EventKind,
        message: impl Into<String>,
    ) -> Self {
        Self::new(encounter_id, None, kind, message)
    }

    /// Attach the id and timestamp assigned by storage.
    #[must_use]
    pub fn stamp(self, id: u64, created_at: DateTime<Utc>) -> StampedEvent {
        StampedEvent {
            id,
            created_at,
            event: self,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampedEvent {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: GameEvent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stamped_event_flattens_payload() {
        let at = Utc.with_ymd_and_hms(2026, 2, 2, 2, 2, 2).unwrap();
        let stamped = GameEvent::new("enc", Some("p1"), EventKind::PlayerAction, "You wait.")
            .stamp(7, at);
        let value = serde_json::to_value(&stamped).unwrap();
        assert_eq!(value["id"], 7);
        assert_eq!(value["kind"], "player_action");
        assert_eq!(value["actor_id"], "p1");
        assert_eq!(value["message"], "You wait.");
    }

    #[test]
    fn ambient_events_omit_actor() {
        let event = GameEvent::ambient("enc", EventKind::Combat, "Combat begins.");
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("actor_id"));
    }
}
