use serde::{Deserialize, Serialize};

use crate::error::{ExperimentError, Result};
use crate::item::ItemId;
use crate::layout::Slot;

/// Number of images shown per trial.
pub const CHOICES: usize = 3;

/// Presenter state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenterState {
    Idle,
    Loaded,
    Displayed,
    AwaitingInput,
    Captured,
    Reset,
}

/// Three distinct items in display order (left, center, right).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ItemId>", into = "Vec<ItemId>")]
pub struct Trial {
    items: [ItemId; CHOICES],
}

impl Trial {
    pub fn new(items: [ItemId; CHOICES]) -> Result<Self> {
        for (i, item) in items.iter().enumerate() {
            if items[i + 1..].contains(item) {
                return Err(ExperimentError::InvalidConfiguration(format!(
                    "item {} appears twice in one trial",
                    item
                )));
            }
        }
        Ok(Self { items })
    }

    pub fn items(&self) -> &[ItemId; CHOICES] {
        &self.items
    }

    pub fn item_at(&self, slot: Slot) -> ItemId {
        self.items[slot.index()]
    }
}

impl TryFrom<Vec<ItemId>> for Trial {
    type Error = ExperimentError;

    fn try_from(items: Vec<ItemId>) -> Result<Self> {
        let len = items.len();
        let items: [ItemId; CHOICES] = items.try_into().map_err(|_| {
            ExperimentError::InvalidConfiguration(format!(
                "a trial needs exactly {} items, got {}",
                CHOICES, len
            ))
        })?;
        Self::new(items)
    }
}

impl From<Trial> for Vec<ItemId> {
    fn from(trial: Trial) -> Self {
        trial.items.to_vec()
    }
}

/// Outcome of one presented trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial: Trial,
    pub selected: Option<Slot>,
    /// Session-elapsed time when the trial was rendered.
    pub display_latency_ms: f64,
    /// Time from render to the qualifying press.
    pub response_time_ms: f64,
}

impl TrialResult {
    pub fn selected_item(&self) -> Option<ItemId> {
        self.selected.map(|slot| self.trial.item_at(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_items_are_rejected() {
        assert!(Trial::new([ItemId(1), ItemId(2), ItemId(1)]).is_err());
        assert!(Trial::new([ItemId(1), ItemId(2), ItemId(3)]).is_ok());
    }

    #[test]
    fn wrong_length_is_rejected() {
        let err = Trial::try_from(vec![ItemId(0), ItemId(1)]).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn selected_item_follows_slot() {
        let trial = Trial::new([ItemId(4), ItemId(8), ItemId(15)]).unwrap();
        let result = TrialResult {
            trial,
            selected: Some(Slot::Right),
            display_latency_ms: 0.0,
            response_time_ms: 12.5,
        };
        assert_eq!(result.selected_item(), Some(ItemId(15)));
    }

    #[test]
    fn result_survives_json() {
        let result = TrialResult {
            trial: Trial::new([ItemId(10), ItemId(20), ItemId(30)]).unwrap(),
            selected: Some(Slot::Left),
            display_latency_ms: 1234.5,
            response_time_ms: 87.25,
        };
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(
            json,
            r#"{"trial":[10,20,30],"selected":"Left","display_latency_ms":1234.5,"response_time_ms":87.25}"#
        );
        let back: TrialResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);

        let unanswered: TrialResult = serde_json::from_str(
            r#"{"trial":[1,2,3],"selected":null,"display_latency_ms":0.0,"response_time_ms":0.0}"#,
        )
        .unwrap();
        assert_eq!(unanswered.selected_item(), None);
        assert!(serde_json::from_str::<TrialResult>(
            r#"{"trial":[1,1,3],"selected":null,"display_latency_ms":0.0,"response_time_ms":0.0}"#,
        )
        .is_err());
    }
}
