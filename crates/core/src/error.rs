use crate::InventoryError;
use thiserror::Error;

/// Requests the engine refuses outright. Nothing is mutated when one of these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("selected die index {0} is not in the current hand")]
    SelectionOutOfRange(usize),
    #[error("die index {0} selected more than once")]
    DuplicateSelection(usize),
    #[error("combination {kind} references die {index} outside the hand")]
    CombinationOutOfRange { kind: String, index: usize },
    #[error("consumable {0} does not take a die selection")]
    NotDieSelection(String),
    #[error("ability {0} is already registered")]
    DuplicateAbility(String),
    #[error("inventory error: {0}")]
    Inventory(#[from] InventoryError),
}
