//! Item status and interactive sub-state tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of one independently generated item (a single slide).
///
/// Legal transitions are `Idle -> Running -> {Done, Failed}` and
/// `Failed -> Idle` via an explicit reset-for-retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// Not yet dispatched.
    #[default]
    Idle,
    /// A service call is in flight for this item.
    Running,
    /// The item produced content.
    Done,
    /// The item's call failed; retry is an explicit caller action.
    Failed,
}

impl ItemStatus {
    /// Returns true if the status is terminal (`Done` or `Failed`).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, ItemStatus::Done | ItemStatus::Failed)
    }

    /// Returns true if `self -> to` is a legal transition.
    #[must_use]
    pub fn may_transition(self, to: ItemStatus) -> bool {
        matches!(
            (self, to),
            (ItemStatus::Idle, ItemStatus::Running)
                | (ItemStatus::Running, ItemStatus::Done)
                | (ItemStatus::Running, ItemStatus::Failed)
                | (ItemStatus::Failed, ItemStatus::Idle)
        )
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItemStatus::Idle => "idle",
            ItemStatus::Running => "running",
            ItemStatus::Done => "done",
            ItemStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Stage-scoped sub-state reported by the service when it needs more user
/// input before the current stage can complete.
///
/// A sub-state never advances the pipeline stage; it only changes what the
/// next submitted action means.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InteractionState {
    /// The service proposed a page count and wants it confirmed.
    ConfirmingPageCount,
    /// The service asks whether the derived configuration needs changes.
    AwaitingConfigDecision,
    /// The user opted to adjust the configuration; adjustments are pending.
    AdjustingConfiguration,
    /// Everything is gathered; the service awaits the go-ahead.
    AwaitingFinalConfirmation,
    /// A sub-state tag this client does not know; forwarded verbatim.
    Other(String),
}

impl InteractionState {
    /// Returns the wire tag for this sub-state.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            InteractionState::ConfirmingPageCount => "confirm_goals",
            InteractionState::AwaitingConfigDecision => "ask_config_modification",
            InteractionState::AdjustingConfiguration => "adjust_configurations",
            InteractionState::AwaitingFinalConfirmation => "final_confirm",
            InteractionState::Other(tag) => tag,
        }
    }
}

impl From<String> for InteractionState {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "confirm_goals" => InteractionState::ConfirmingPageCount,
            "ask_config_modification" => InteractionState::AwaitingConfigDecision,
            "adjust_configurations" => InteractionState::AdjustingConfiguration,
            "final_confirm" => InteractionState::AwaitingFinalConfirmation,
            _ => InteractionState::Other(tag),
        }
    }
}

impl From<InteractionState> for String {
    fn from(state: InteractionState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for InteractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_status_legal_transitions() {
        assert!(ItemStatus::Idle.may_transition(ItemStatus::Running));
        assert!(ItemStatus::Running.may_transition(ItemStatus::Done));
        assert!(ItemStatus::Running.may_transition(ItemStatus::Failed));
        assert!(ItemStatus::Failed.may_transition(ItemStatus::Idle));
    }

    #[test]
    fn test_item_status_illegal_transitions() {
        assert!(!ItemStatus::Idle.may_transition(ItemStatus::Done));
        assert!(!ItemStatus::Idle.may_transition(ItemStatus::Failed));
        assert!(!ItemStatus::Done.may_transition(ItemStatus::Running));
        assert!(!ItemStatus::Done.may_transition(ItemStatus::Idle));
        assert!(!ItemStatus::Running.may_transition(ItemStatus::Idle));
        assert!(!ItemStatus::Failed.may_transition(ItemStatus::Running));
    }

    #[test]
    fn test_item_status_terminal() {
        assert!(ItemStatus::Done.is_terminal());
        assert!(ItemStatus::Failed.is_terminal());
        assert!(!ItemStatus::Idle.is_terminal());
        assert!(!ItemStatus::Running.is_terminal());
    }

    #[test]
    fn test_interaction_state_roundtrip() {
        let known = [
            InteractionState::ConfirmingPageCount,
            InteractionState::AwaitingConfigDecision,
            InteractionState::AdjustingConfiguration,
            InteractionState::AwaitingFinalConfirmation,
        ];
        for state in known {
            let tag = state.as_str().to_string();
            assert_eq!(InteractionState::from(tag), state);
        }
    }

    #[test]
    fn test_interaction_state_unknown_forwarded() {
        let state = InteractionState::from("something_new".to_string());
        assert_eq!(state, InteractionState::Other("something_new".to_string()));
        assert_eq!(state.as_str(), "something_new");
    }
}
