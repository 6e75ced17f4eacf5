use crate::{Die, SessionHistory};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One scoring group found by the partitioner. `dice` indexes the round's hand.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringCombination {
    #[serde(rename = "type")]
    pub kind: String,
    pub dice: Vec<usize>,
    pub points: f64,
}

impl ScoringCombination {
    pub fn new(kind: impl Into<String>, dice: Vec<usize>, points: f64) -> Self {
        Self {
            kind: kind.into(),
            dice,
            points,
        }
    }

    pub fn category(&self) -> CombinationCategory {
        CombinationCategory::from_tag(&self.kind)
    }
}

pub fn total_points(combinations: &[ScoringCombination]) -> f64 {
    combinations.iter().map(|combo| combo.points).sum()
}

const TUPLET_TAGS: [(&str, u32, &str); 8] = [
    ("nTriplets", 3, "Triplets"),
    ("nQuadruplets", 4, "Quadruplets"),
    ("nQuintuplets", 5, "Quintuplets"),
    ("nSextuplets", 6, "Sextuplets"),
    ("nSeptuplets", 7, "Septuplets"),
    ("nOctuplets", 8, "Octuplets"),
    ("nNonuplets", 9, "Nonuplets"),
    ("nDecuplets", 10, "Decuplets"),
];

/// Addresses every tuplet category at once in `upgrade_category`.
pub const ALL_TUPLETS: &str = "nTuplets";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CombinationCategory {
    SingleN,
    NPairs,
    NOfAKind,
    StraightOfN,
    PyramidOfN,
    /// Groups of `size` identical dice, `nTriplets` through `nDecuplets`.
    Tuplets(u32),
    Other(String),
}

impl CombinationCategory {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "singleN" => Self::SingleN,
            "nPairs" => Self::NPairs,
            "nOfAKind" => Self::NOfAKind,
            "straightOfN" => Self::StraightOfN,
            "pyramidOfN" => Self::PyramidOfN,
            other => TUPLET_TAGS
                .iter()
                .find(|(name, _, _)| *name == other)
                .map(|(_, size, _)| Self::Tuplets(*size))
                .unwrap_or_else(|| Self::Other(other.to_string())),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Self::SingleN => "singleN",
            Self::NPairs => "nPairs",
            Self::NOfAKind => "nOfAKind",
            Self::StraightOfN => "straightOfN",
            Self::PyramidOfN => "pyramidOfN",
            Self::Tuplets(size) => TUPLET_TAGS
                .iter()
                .find(|(_, n, _)| n == size)
                .map(|(name, _, _)| *name)
                .unwrap_or(ALL_TUPLETS),
            Self::Other(tag) => tag,
        }
    }

    pub fn plural_name(&self) -> &str {
        match self {
            Self::SingleN => "Singles",
            Self::NPairs => "Pairs",
            Self::NOfAKind => "N of a Kind",
            Self::StraightOfN => "Straights",
            Self::PyramidOfN => "Pyramids",
            Self::Tuplets(size) => TUPLET_TAGS
                .iter()
                .find(|(_, n, _)| n == size)
                .map(|(_, _, label)| *label)
                .unwrap_or("Tuplets"),
            Self::Other(tag) => tag,
        }
    }

    pub fn is_tuplet(&self) -> bool {
        matches!(self, Self::Tuplets(_))
    }
}

/// `"<category>:<parameter>"`. Depends on counts and lengths, never on which dice scored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombinationKey(String);

impl CombinationKey {
    pub const FLOP: &'static str = "flop";
    pub const HOT_DICE: &'static str = "hotDice";

    pub fn new(category: &str, parameter: u32) -> Self {
        Self(format!("{category}:{parameter}"))
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn for_combination(combination: &ScoringCombination, hand: &[Die]) -> Self {
        let count = combination.dice.len() as u32;
        let category = combination.category();
        let parameter = match &category {
            CombinationCategory::NPairs => count / 2,
            CombinationCategory::NOfAKind
            | CombinationCategory::StraightOfN
            | CombinationCategory::PyramidOfN => count,
            CombinationCategory::Tuplets(size) => count / size,
            CombinationCategory::SingleN => combination
                .dice
                .first()
                .and_then(|index| hand.get(*index))
                .and_then(|die| die.rolled_value)
                .unwrap_or(0),
            CombinationCategory::Other(tag) => return Self(tag.clone()),
        };
        Self::new(category.tag(), parameter)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn category(&self) -> &str {
        self.0.split(':').next().unwrap_or(&self.0)
    }

    pub fn parameter(&self) -> Option<u32> {
        self.0.split_once(':')?.1.parse().ok()
    }

    pub fn display_name(&self) -> String {
        if self.0 == Self::FLOP {
            return "Flop".to_string();
        }
        if self.0 == Self::HOT_DICE {
            return "Hot Dice".to_string();
        }
        let Some(n) = self.parameter() else {
            return self.0.clone();
        };
        match CombinationCategory::from_tag(self.category()) {
            CombinationCategory::SingleN => format!("Single {n}"),
            CombinationCategory::NPairs if n == 1 => "1 Pair".to_string(),
            CombinationCategory::NPairs => format!("{n} Pairs"),
            CombinationCategory::NOfAKind => format!("{n} of a Kind"),
            CombinationCategory::StraightOfN => format!("{n}-Length Straight"),
            CombinationCategory::PyramidOfN => format!("Pyramid ({n})"),
            category @ CombinationCategory::Tuplets(_) => {
                format!("{n} {}", category.plural_name())
            }
            CombinationCategory::Other(_) => self.0.clone(),
        }
    }
}

impl fmt::Display for CombinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl SessionHistory {
    /// Levels start at 1.
    pub fn combination_level(&self, key: &CombinationKey) -> u32 {
        self.combination_levels
            .get(key.as_str())
            .copied()
            .unwrap_or(1)
    }

    pub fn combination_count(&self, key: &CombinationKey) -> u32 {
        self.combination_counters
            .get(key.as_str())
            .copied()
            .unwrap_or(0)
    }

    pub fn upgrade_combination(&mut self, key: &CombinationKey) -> u32 {
        let next = self.combination_level(key) + 1;
        self.combination_levels.insert(key.as_str().to_string(), next);
        next
    }

    pub fn upgrade_combinations<'a>(&mut self, keys: impl IntoIterator<Item = &'a CombinationKey>) {
        for key in keys {
            self.upgrade_combination(key);
        }
    }

    /// Upgrades every key already seen for `category`. `ALL_TUPLETS` covers every tuplet size.
    pub fn upgrade_category(&mut self, category: &str) -> Vec<CombinationKey> {
        let mut known: Vec<CombinationKey> = self
            .combination_counters
            .keys()
            .chain(self.combination_levels.keys())
            .map(|raw| CombinationKey::from_raw(raw.clone()))
            .filter(|key| {
                if category == ALL_TUPLETS {
                    CombinationCategory::from_tag(key.category()).is_tuplet()
                } else {
                    key.category() == category
                }
            })
            .collect();
        known.sort();
        known.dedup();
        self.upgrade_combinations(&known);
        known
    }

    /// Counts each combination of the partitioning that was actually scored.
    pub fn record_partitioning(
        &mut self,
        partitioning: &[ScoringCombination],
        hand: &[Die],
    ) -> Vec<CombinationKey> {
        let keys: Vec<CombinationKey> = partitioning
            .iter()
            .map(|combo| CombinationKey::for_combination(combo, hand))
            .collect();
        for key in &keys {
            *self
                .combination_counters
                .entry(key.as_str().to_string())
                .or_insert(0) += 1;
        }
        keys
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PartitionContext<'a> {
    pub hand: &'a [Die],
    pub selected: &'a [usize],
}

/// Finds candidate groupings for the selected values. Lives outside the engine; the engine only
/// consumes the partitioning that `choose` returns.
pub trait Partitioner {
    fn partition(
        &self,
        values: &[u32],
        context: &PartitionContext<'_>,
    ) -> Vec<Vec<ScoringCombination>>;

    /// Highest total points, earliest candidate on ties.
    fn choose(&self, partitionings: Vec<Vec<ScoringCombination>>) -> Option<Vec<ScoringCombination>> {
        let mut best: Option<(f64, Vec<ScoringCombination>)> = None;
        for candidate in partitionings {
            let total = total_points(&candidate);
            match &best {
                Some((best_total, _)) if total <= *best_total => {}
                _ => best = Some((total, candidate)),
            }
        }
        best.map(|(_, partitioning)| partitioning)
    }
}
