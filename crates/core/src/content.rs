use crate::{AbilityData, RandomSource, PLASTIC};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConsumableKind {
    Whim,
    Wish,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsumableDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: ConsumableKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaterialDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub abbreviation: String,
}

/// Declarative catalog supplied by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub abilities: Vec<AbilityData>,
    #[serde(default)]
    pub consumables: Vec<ConsumableDef>,
    #[serde(default)]
    pub materials: Vec<MaterialDef>,
}

impl Content {
    pub fn ability(&self, id: &str) -> Option<&AbilityData> {
        self.abilities.iter().find(|ability| ability.id == id)
    }

    pub fn consumable(&self, id: &str) -> Option<&ConsumableDef> {
        self.consumables.iter().find(|consumable| consumable.id == id)
    }

    pub fn pick_consumable<'a>(&'a self, rng: &mut dyn RandomSource) -> Option<&'a ConsumableDef> {
        rng.pick_index(self.consumables.len())
            .map(|index| &self.consumables[index])
    }

    /// Any material except the base one.
    pub fn pick_special_material<'a>(&'a self, rng: &mut dyn RandomSource) -> Option<&'a MaterialDef> {
        let special: Vec<&MaterialDef> = self
            .materials
            .iter()
            .filter(|material| material.id != PLASTIC)
            .collect();
        rng.pick_index(special.len()).map(|index| special[index])
    }
}
