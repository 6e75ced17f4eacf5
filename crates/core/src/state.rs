use crate::{Die, Inventory};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LevelState {
    pub number: u32,
    #[serde(default)]
    pub rerolls_remaining: u32,
    #[serde(default)]
    pub banks_remaining: u32,
    #[serde(default)]
    pub points_banked: i64,
    #[serde(default)]
    pub consecutive_flops: u32,
    #[serde(default)]
    pub is_boss: bool,
}

impl Default for LevelState {
    fn default() -> Self {
        Self {
            number: 1,
            rerolls_remaining: 3,
            banks_remaining: 3,
            points_banked: 0,
            consecutive_flops: 0,
            is_boss: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionHistory {
    #[serde(default)]
    pub combination_counters: BTreeMap<String, u32>,
    #[serde(default)]
    pub combination_levels: BTreeMap<String, u32>,
    #[serde(default)]
    pub ability_scratch: ScratchTable,
    #[serde(default)]
    pub last_forfeited_points: i64,
    #[serde(default)]
    pub highest_score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    pub money: i64,
    pub dice_set: Vec<Die>,
    pub inventory: Inventory,
    #[serde(default)]
    pub level: LevelState,
    #[serde(default)]
    pub history: SessionHistory,
}

impl SessionState {
    pub fn new(dice_set: Vec<Die>, inventory: Inventory) -> Self {
        Self {
            money: 0,
            dice_set,
            inventory,
            level: LevelState::default(),
            history: SessionHistory::default(),
        }
    }

    /// Six plastic d6s with default slots.
    pub fn standard() -> Self {
        let dice = (1..=6).map(|n| Die::standard(format!("d{n}"))).collect();
        Self::new(dice, Inventory::new())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RoundState {
    pub round_number: u32,
    pub dice_hand: Vec<Die>,
    #[serde(default)]
    pub round_points: i64,
    #[serde(default)]
    pub roll_count: u32,
    #[serde(default)]
    pub hot_dice_counter: u32,
    #[serde(default)]
    pub forfeited_points: i64,
    #[serde(default)]
    pub flopped: bool,
    #[serde(default)]
    pub instant_bank: bool,
}

impl RoundState {
    pub fn new(round_number: u32, dice_hand: Vec<Die>) -> Self {
        Self {
            round_number,
            dice_hand,
            ..Self::default()
        }
    }

    pub fn hand_values(&self) -> Vec<Option<u32>> {
        self.dice_hand.iter().map(|die| die.rolled_value).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScratchEntry {
    pub version: u32,
    pub payload: serde_json::Value,
}

/// Per-ability private memory, keyed by ability id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScratchTable {
    entries: BTreeMap<String, ScratchEntry>,
}

impl ScratchTable {
    pub fn get(&self, ability_id: &str) -> Option<&ScratchEntry> {
        self.entries.get(ability_id)
    }

    pub fn contains(&self, ability_id: &str) -> bool {
        self.entries.contains_key(ability_id)
    }

    /// Missing or unreadable payloads read as `T::default()`.
    pub fn read<T: DeserializeOwned + Default>(&self, ability_id: &str) -> T {
        let Some(entry) = self.entries.get(ability_id) else {
            return T::default();
        };
        match serde_json::from_value(entry.payload.clone()) {
            Ok(value) => value,
            Err(err) => {
                warn!(ability_id, version = entry.version, %err, "unreadable scratch payload");
                T::default()
            }
        }
    }

    pub fn write<T: Serialize>(&mut self, ability_id: &str, value: &T) {
        let payload = match serde_json::to_value(value) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(ability_id, %err, "scratch payload not serializable");
                return;
            }
        };
        let version = self
            .entries
            .get(ability_id)
            .map(|entry| entry.version + 1)
            .unwrap_or(1);
        self.entries
            .insert(ability_id.to_string(), ScratchEntry { version, payload });
    }

    pub fn update<T, F>(&mut self, ability_id: &str, apply: F) -> T
    where
        T: Serialize + DeserializeOwned + Default + Clone,
        F: FnOnce(&mut T),
    {
        let mut value: T = self.read(ability_id);
        apply(&mut value);
        self.write(ability_id, &value);
        value
    }

    pub fn remove(&mut self, ability_id: &str) -> Option<ScratchEntry> {
        self.entries.remove(ability_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
