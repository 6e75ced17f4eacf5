use crate::RandomSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const PLASTIC: &str = "plastic";

/// Allowed die sizes, smallest first. Chisel and pottery wheel walk this sequence.
pub const DIE_SIZE_SEQUENCE: [u32; 7] = [3, 4, 6, 8, 10, 12, 20];
const STANDARD_SIDES: u32 = 6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum PipEffect {
    #[default]
    None,
    Money,
    CreateConsumable,
    UpgradeHand,
    TwoFaced,
    Wild,
    Blank,
    #[serde(other)]
    Unknown,
}

impl PipEffect {
    /// Only affect which combinations are detected; never fire during scoring.
    pub fn is_detection_only(self) -> bool {
        matches!(self, Self::TwoFaced | Self::Wild)
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Money => "money",
            Self::CreateConsumable => "createConsumable",
            Self::UpgradeHand => "upgradeHand",
            Self::TwoFaced => "twoFaced",
            Self::Wild => "wild",
            Self::Blank => "blank",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PipEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Die {
    pub id: String,
    pub sides: u32,
    pub allowed_values: Vec<u32>,
    pub material: String,
    #[serde(default)]
    pub rolled_value: Option<u32>,
    #[serde(default)]
    pub pip_effects: BTreeMap<u32, PipEffect>,
}

impl Die {
    pub fn new(id: impl Into<String>, sides: u32, material: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sides,
            allowed_values: (1..=sides).collect(),
            material: material.into(),
            rolled_value: None,
            pip_effects: BTreeMap::new(),
        }
    }

    pub fn standard(id: impl Into<String>) -> Self {
        Self::new(id, STANDARD_SIDES, PLASTIC)
    }

    pub fn with_value(mut self, value: u32) -> Self {
        self.rolled_value = Some(value);
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = material.into();
        self
    }

    pub fn with_pip(mut self, face: u32, effect: PipEffect) -> Self {
        self.pip_effects.insert(face, effect);
        self
    }

    pub fn is_plastic(&self) -> bool {
        self.material == PLASTIC
    }

    /// The effect on the rolled face, `None` when unrolled or unmapped.
    pub fn pip_effect(&self) -> PipEffect {
        self.rolled_value
            .and_then(|value| self.pip_effects.get(&value).copied())
            .unwrap_or_default()
    }

    pub fn roll(&mut self, rng: &mut dyn RandomSource) -> Option<u32> {
        let index = rng.pick_index(self.allowed_values.len())?;
        let value = self.allowed_values[index];
        self.rolled_value = Some(value);
        Some(value)
    }

    pub fn clear_roll(&mut self) {
        self.rolled_value = None;
    }

    /// Changes the size and resets the face list. Pip effects on faces that no longer exist are dropped.
    pub fn resize(&mut self, sides: u32) {
        self.sides = sides;
        self.allowed_values = (1..=sides).collect();
        self.pip_effects.retain(|face, _| *face <= sides);
        if self.rolled_value.is_some_and(|value| value > sides) {
            self.rolled_value = None;
        }
    }
}

pub fn is_valid_die_size(sides: u32) -> bool {
    DIE_SIZE_SEQUENCE.contains(&sides)
}

pub fn next_die_size(sides: u32) -> Option<u32> {
    let index = DIE_SIZE_SEQUENCE.iter().position(|size| *size == sides)?;
    DIE_SIZE_SEQUENCE.get(index + 1).copied()
}

pub fn previous_die_size(sides: u32) -> Option<u32> {
    let index = DIE_SIZE_SEQUENCE.iter().position(|size| *size == sides)?;
    index.checked_sub(1).map(|prev| DIE_SIZE_SEQUENCE[prev])
}

pub fn min_die_size() -> u32 {
    DIE_SIZE_SEQUENCE[0]
}

pub fn max_die_size() -> u32 {
    DIE_SIZE_SEQUENCE[DIE_SIZE_SEQUENCE.len() - 1]
}

/// 1.0 for a d6, plus or minus 0.5 per step along the size sequence. Unknown sizes count as 1.0.
pub fn die_size_multiplier(sides: u32) -> f64 {
    let standard = DIE_SIZE_SEQUENCE
        .iter()
        .position(|size| *size == STANDARD_SIDES)
        .unwrap_or(2) as f64;
    match DIE_SIZE_SEQUENCE.iter().position(|size| *size == sides) {
        Some(index) => 1.0 + (index as f64 - standard) * 0.5,
        None => 1.0,
    }
}
