use crate::{
    Die, RandomSource, RoundState, ScoreModification, ScoringCombination, ScoringElements,
    SessionState,
};
use serde::{Deserialize, Serialize};
use std::fmt;

mod builtin;
mod manager;
mod registry;

pub use builtin::{register_builtins, RetriggerTally};
pub use manager::*;
pub use registry::*;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AbilityRarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Legendary,
}

fn default_active() -> bool {
    true
}

/// Declarative record of an owned ability, as found in the catalog or in persisted session data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AbilityData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub rarity: AbilityRarity,
    /// `None` means unlimited.
    #[serde(default)]
    pub uses: Option<u32>,
}

impl AbilityData {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            active: true,
            rarity: AbilityRarity::Common,
            uses: None,
        }
    }

    pub fn with_uses(mut self, uses: u32) -> Self {
        self.uses = Some(uses);
        self
    }
}

/// Runtime header shared by every ability.
#[derive(Debug, Clone, PartialEq)]
pub struct AbilityState {
    pub id: String,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub rarity: AbilityRarity,
    pub uses: Option<u32>,
}

impl AbilityState {
    pub fn from_data(data: &AbilityData) -> Self {
        Self {
            id: data.id.clone(),
            name: data.name.clone(),
            description: data.description.clone(),
            active: data.active,
            rarity: data.rarity,
            uses: data.uses,
        }
    }

    pub fn can_use(&self) -> bool {
        self.active && self.uses.map_or(true, |uses| uses > 0)
    }

    /// Spends one charge when uses are finite.
    pub fn consume_use(&mut self) {
        if let Some(uses) = self.uses.as_mut() {
            *uses = uses.saturating_sub(1);
        }
    }

    pub fn to_data(&self) -> AbilityData {
        AbilityData {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            active: self.active,
            rarity: self.rarity,
            uses: self.uses,
        }
    }
}

pub struct FilterContext<'a> {
    pub hand: &'a [Die],
    pub selected: &'a [usize],
    pub session: &'a SessionState,
}

impl FilterContext<'_> {
    /// Face of the first die of `combination`, if rolled.
    pub fn face_of(&self, combination: &ScoringCombination) -> Option<u32> {
        combination
            .dice
            .first()
            .and_then(|index| self.hand.get(*index))
            .and_then(|die| die.rolled_value)
    }
}

pub struct ScoringContext<'a> {
    /// Score after every earlier stage, including abilities acquired before this one.
    pub values: ScoringElements,
    pub combinations: &'a [ScoringCombination],
    pub selected: &'a [usize],
    pub session: &'a mut SessionState,
    pub round: &'a RoundState,
    pub rng: &'a mut dyn RandomSource,
}

impl ScoringContext<'_> {
    pub fn selected_dice(&self) -> impl Iterator<Item = &Die> + '_ {
        self.selected
            .iter()
            .filter_map(|index| self.round.dice_hand.get(*index))
    }

    pub fn selected_values(&self) -> Vec<u32> {
        self.selected_dice()
            .filter_map(|die| die.rolled_value)
            .collect()
    }
}

pub struct DieScoredContext<'a> {
    pub die: &'a Die,
    pub die_index: usize,
    /// Position within the selection order.
    pub position: usize,
    /// 0 for the normal pass, 1.. for retriggers.
    pub pass: u32,
    pub values: ScoringElements,
    pub session: &'a mut SessionState,
    pub round: &'a RoundState,
    pub rng: &'a mut dyn RandomSource,
}

pub struct FlopContext<'a> {
    pub session: &'a mut SessionState,
    pub round: &'a mut RoundState,
    pub rng: &'a mut dyn RandomSource,
}

pub struct BankContext<'a> {
    /// Output of the previous ability, or the raw amount for the first one.
    pub banked: i64,
    pub session: &'a mut SessionState,
    pub round: &'a RoundState,
}

pub struct RoundStartContext<'a> {
    pub session: &'a mut SessionState,
    pub round: &'a mut RoundState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlopResponse {
    pub prevented: bool,
    pub log: Option<String>,
}

impl FlopResponse {
    pub fn prevented(log: impl Into<String>) -> Self {
        Self {
            prevented: true,
            log: Some(log.into()),
        }
    }

    pub fn ignored() -> Self {
        Self::default()
    }
}

/// Hook surface every ability implements. Only `on_scoring` is required.
///
/// The manager gates every hook on `can_use`. Hooks that should spend a charge call
/// `consume_use` themselves.
pub trait Ability: fmt::Debug {
    fn state(&self) -> &AbilityState;
    fn state_mut(&mut self) -> &mut AbilityState;

    fn id(&self) -> &str {
        &self.state().id
    }

    fn can_use(&self) -> bool {
        self.state().can_use()
    }

    fn consume_use(&mut self) {
        self.state_mut().consume_use();
    }

    /// Rewrites combination points before base points are summed. Must keep each `dice` set intact.
    fn filter_combinations(
        &mut self,
        combinations: Vec<ScoringCombination>,
        _ctx: &FilterContext<'_>,
    ) -> Vec<ScoringCombination> {
        combinations
    }

    fn on_scoring(&mut self, ctx: &mut ScoringContext<'_>) -> ScoreModification;

    fn on_die_scored(&mut self, _ctx: &mut DieScoredContext<'_>) -> Option<ScoreModification> {
        None
    }

    fn on_flop(&mut self, _ctx: &mut FlopContext<'_>) -> FlopResponse {
        FlopResponse::ignored()
    }

    /// Returns the rewritten banked amount, or `None` to pass it through.
    fn on_bank(&mut self, _ctx: &mut BankContext<'_>) -> Option<i64> {
        None
    }

    fn on_round_start(&mut self, _ctx: &mut RoundStartContext<'_>) {}
}
