#![allow(dead_code)]

use rollio_core::{
    AbilityData, AbilityManager, AbilityRegistry, ConsumableDef, ConsumableKind, Content, Die,
    MaterialDef, RandomSource, RoundState,
};
use std::collections::VecDeque;

/// Replays fixed draws, then keeps returning `fallback`.
pub struct ScriptedRng {
    rolls: VecDeque<f64>,
    fallback: f64,
}

impl ScriptedRng {
    pub fn new(rolls: &[f64]) -> Self {
        Self {
            rolls: rolls.iter().copied().collect(),
            fallback: 0.0,
        }
    }

    pub fn always(value: f64) -> Self {
        Self {
            rolls: VecDeque::new(),
            fallback: value,
        }
    }
}

impl RandomSource for ScriptedRng {
    fn next_u64(&mut self) -> u64 {
        (self.next_f64() * u64::MAX as f64) as u64
    }

    fn next_f64(&mut self) -> f64 {
        self.rolls.pop_front().unwrap_or(self.fallback)
    }
}

pub fn material(id: &str) -> MaterialDef {
    MaterialDef {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        abbreviation: id.chars().take(2).collect(),
    }
}

pub fn consumable(id: &str, kind: ConsumableKind) -> ConsumableDef {
    ConsumableDef {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        kind,
    }
}

pub fn content() -> Content {
    Content {
        abilities: vec![
            AbilityData::new("scoreMultiplier", "Score Multiplier"),
            AbilityData::new("moneyMagnet", "Money Magnet"),
            AbilityData::new("oddCollector", "Odd Collector"),
        ],
        consumables: vec![
            consumable("moneyDoubler", ConsumableKind::Wish),
            consumable("chisel", ConsumableKind::Whim),
        ],
        materials: vec![material("plastic"), material("crystal"), material("golden")],
    }
}

pub fn hand(values: &[u32]) -> Vec<Die> {
    values
        .iter()
        .enumerate()
        .map(|(idx, value)| Die::standard(format!("d{}", idx + 1)).with_value(*value))
        .collect()
}

pub fn round_with(dice: Vec<Die>) -> RoundState {
    RoundState::new(1, dice)
}

pub fn manager_with(registry: &AbilityRegistry, ids: &[&str]) -> AbilityManager {
    let mut manager = AbilityManager::new();
    for id in ids {
        assert!(
            manager.add(registry, &AbilityData::new(*id, *id)),
            "unknown ability {id}"
        );
    }
    manager
}

pub fn uses_of(manager: &AbilityManager, id: &str) -> Option<u32> {
    manager.get(id).and_then(|ability| ability.state().uses)
}
