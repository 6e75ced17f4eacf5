use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ABILITY_SLOTS: usize = 3;
pub const DEFAULT_CONSUMABLE_SLOTS: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsumableInstance {
    pub id: String,
}

impl ConsumableInstance {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Slot limits plus the consumables held. Abilities live in the `AbilityManager`; only their slot
/// count is kept here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Inventory {
    pub ability_slots: usize,
    pub consumable_slots: usize,
    #[serde(default)]
    pub consumables: Vec<ConsumableInstance>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("no consumable slots")]
    NoConsumableSlots,
    #[error("invalid consumable index {0}")]
    InvalidConsumableIndex(usize),
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self::with_slots(DEFAULT_ABILITY_SLOTS, DEFAULT_CONSUMABLE_SLOTS)
    }

    pub fn with_slots(ability_slots: usize, consumable_slots: usize) -> Self {
        Self {
            ability_slots,
            consumable_slots,
            consumables: Vec::new(),
        }
    }

    pub fn consumable_slots_free(&self) -> usize {
        self.consumable_slots.saturating_sub(self.consumables.len())
    }

    pub fn has_consumable_slot(&self) -> bool {
        self.consumable_slots_free() > 0
    }

    pub fn add_consumable(&mut self, id: impl Into<String>) -> Result<(), InventoryError> {
        if !self.has_consumable_slot() {
            return Err(InventoryError::NoConsumableSlots);
        }
        self.consumables.push(ConsumableInstance::new(id));
        Ok(())
    }

    pub fn take_consumable(&mut self, index: usize) -> Result<ConsumableInstance, InventoryError> {
        if index >= self.consumables.len() {
            return Err(InventoryError::InvalidConsumableIndex(index));
        }
        Ok(self.consumables.remove(index))
    }
}
