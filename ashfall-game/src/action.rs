//! Player intents and the closed set of action types the resolver accepts.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::resolver::ResolveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Attack,
    Defend,
    Wait,
    Look,
    Status,
    Explore,
    Inventory,
    Use,
    Talk,
}

impl ActionType {
    pub const ALL: [Self; 9] = [
        Self::Attack,
        Self::Defend,
        Self::Wait,
        Self::Look,
        Self::Status,
        Self::Explore,
        Self::Inventory,
        Self::Use,
        Self::Talk,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::Defend => "defend",
            Self::Wait => "wait",
            Self::Look => "look",
            Self::Status => "status",
            Self::Explore => "explore",
            Self::Inventory => "inventory",
            Self::Use => "use",
            Self::Talk => "talk",
        }
    }

    /// Config path of this action's AP price, used in validation messages.
    #[must_use]
    pub const fn cost_field(self) -> &'static str {
        match self {
            Self::Attack => "action_costs.attack",
            Self::Defend => "action_costs.defend",
            Self::Wait => "action_costs.wait",
            Self::Look => "action_costs.look",
            Self::Status => "action_costs.status",
            Self::Explore => "action_costs.explore",
            Self::Inventory => "action_costs.inventory",
            Self::Use => "action_costs.use",
            Self::Talk => "action_costs.talk",
        }
    }

    /// Actions that only read state and may be issued by a dead character.
    #[must_use]
    pub const fn is_observation(self) -> bool {
        matches!(self, Self::Look | Self::Status)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ActionType {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label() == wanted)
            .ok_or_else(|| ResolveError::InvalidAction(s.to_string()))
    }
}

/// A declared player action: the resolver's sole external input besides
/// the character and encounter snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionIntent {
    pub kind: ActionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    pub actor_id: String,
    pub encounter_id: String,
}

impl ActionIntent {
    #[must_use]
    pub fn new(
        kind: ActionType,
        actor_id: impl Into<String>,
        encounter_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            target_id: None,
            actor_id: actor_id.into(),
            encounter_id: encounter_id.into(),
        }
    }

    #[must_use]
    pub fn with_target(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    /// Parse a raw action name into an intent.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidAction`] for names outside the action set.
    pub fn parse(
        raw: &str,
        actor_id: impl Into<String>,
        encounter_id: impl Into<String>,
    ) -> Result<Self, ResolveError> {
        let kind = raw.parse::<ActionType>()?;
        Ok(Self::new(kind, actor_id, encounter_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_label_case_insensitively() {
        for kind in ActionType::ALL {
            assert_eq!(kind.label().parse::<ActionType>().unwrap(), kind);
            assert_eq!(
                kind.label().to_uppercase().parse::<ActionType>().unwrap(),
                kind
            );
        }
    }

    #[test]
    fn unknown_action_is_invalid() {
        let err = "dance".parse::<ActionType>().unwrap_err();
        assert!(matches!(err, ResolveError::InvalidAction(ref name) if name == "dance"));
        assert!(ActionIntent::parse("", "p1", "e1").is_err());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let intent = ActionIntent::new(ActionType::Use, "p1", "e1").with_target("hound-1");
        let json = serde_json::to_string(&intent).unwrap();
        assert!(json.contains("\"kind\":\"use\""));
        let back: ActionIntent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, intent);
    }

    #[test]
    fn only_look_and_status_observe() {
        let observers: Vec<_> = ActionType::ALL
            .into_iter()
            .filter(|kind| kind.is_observation())
            .collect();
        assert_eq!(observers, vec![ActionType::Look, ActionType::Status]);
    }
}
