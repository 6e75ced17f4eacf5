use serde::{Deserialize, Serialize};

/// Lucky token outcomes, in the order of `EngineConfig::lucky_token_weights`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LuckyTokenOutcome {
    DoublePoints,
    ExtraReroll,
    InstantBank,
}

impl LuckyTokenOutcome {
    pub const ALL: [Self; 3] = [Self::DoublePoints, Self::ExtraReroll, Self::InstantBank];
}

/// Tunable constants of the pipeline. Every field falls back to its default when absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub money_pip_amount: i64,
    pub consumable_pip_chance: f64,
    pub blank_exponent_bump: f64,
    pub empowered_blank_exponent_bump: f64,
    /// Ability whose presence raises the blank pip bump.
    pub blank_empowering_ability: String,
    pub retrigger_material: String,
    /// Ability whose presence adds `retrigger_extra_passes` passes.
    pub retrigger_empowering_ability: String,
    pub retrigger_extra_passes: u32,
    /// Ability that doubles consumable probabilities at the call sites that allow it.
    pub probability_doubling_ability: String,
    pub enchant_chance: f64,
    pub forfeit_recovery_ratio: f64,
    pub lucky_token_weights: [f64; 3],
    pub lucky_token_favored: LuckyTokenOutcome,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            money_pip_amount: 1,
            consumable_pip_chance: 0.25,
            blank_exponent_bump: 0.1,
            empowered_blank_exponent_bump: 0.25,
            blank_empowering_ability: "blankSlate".to_string(),
            retrigger_material: "resonant".to_string(),
            retrigger_empowering_ability: "resonanceChamber".to_string(),
            retrigger_extra_passes: 2,
            probability_doubling_ability: "weightedDice".to_string(),
            enchant_chance: 0.5,
            forfeit_recovery_ratio: 1.25,
            lucky_token_weights: [1.0, 1.0, 1.0],
            lucky_token_favored: LuckyTokenOutcome::DoublePoints,
        }
    }
}

impl EngineConfig {
    /// Doubles `probability` when the doubling ability is held, capped at 1.
    pub fn boosted_chance(&self, probability: f64, doubled: bool) -> f64 {
        let chance = if doubled { probability * 2.0 } else { probability };
        chance.clamp(0.0, 1.0)
    }

    /// Normalized weights, with the favored outcome doubled when boosted.
    pub fn normalized_lucky_weights(&self, boosted: bool) -> [f64; 3] {
        let mut weights = self.lucky_token_weights;
        if boosted {
            if let Some(index) = LuckyTokenOutcome::ALL
                .iter()
                .position(|outcome| *outcome == self.lucky_token_favored)
            {
                weights[index] *= 2.0;
            }
        }
        let total: f64 = weights.iter().filter(|weight| **weight > 0.0).sum();
        if total > 0.0 {
            for weight in &mut weights {
                *weight = weight.max(0.0) / total;
            }
        }
        weights
    }
}
