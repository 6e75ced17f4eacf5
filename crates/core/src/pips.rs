use crate::breakdown::record;
use crate::{
    AbilityManager, BreakdownBuilder, Content, Die, EngineConfig, EngineError, PipEffect,
    RandomSource, RetriggerTally, RoundState, ScoredDie, ScoringElements, SessionState,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PipOutcome {
    MoneyGranted { amount: i64 },
    ConsumableCreated { id: String },
    ConsumableMissed,
    NoConsumableSlot,
    UpgradeMarked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipSideEffect {
    pub die_index: usize,
    pub position: usize,
    pub pass: u32,
    pub effect: PipEffect,
    pub outcome: PipOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipResolution {
    pub scoring_elements: ScoringElements,
    pub side_effects: Vec<PipSideEffect>,
    /// Extra passes granted by retrigger material across the whole selection.
    pub retrigger_passes: u32,
}

impl PipResolution {
    pub fn upgrade_markers(&self) -> usize {
        self.side_effects
            .iter()
            .filter(|effect| effect.outcome == PipOutcome::UpgradeMarked)
            .count()
    }
}

/// Rejects indices outside the hand and repeated indices.
pub fn validate_selection(hand: &[Die], selected: &[usize]) -> Result<(), EngineError> {
    let mut seen = HashSet::new();
    for &index in selected {
        if index >= hand.len() {
            return Err(EngineError::SelectionOutOfRange(index));
        }
        if !seen.insert(index) {
            return Err(EngineError::DuplicateSelection(index));
        }
    }
    Ok(())
}

/// Walks the selected dice in selection order: per-die ability hooks, then the die's own pip
/// effect, then any retrigger passes.
#[derive(Debug, Clone, Copy)]
pub struct PipEffectSystem<'a> {
    config: &'a EngineConfig,
    content: &'a Content,
}

impl<'a> PipEffectSystem<'a> {
    pub fn new(config: &'a EngineConfig, content: &'a Content) -> Self {
        Self { config, content }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn apply_all(
        &self,
        hand: &[Die],
        selected: &[usize],
        initial: ScoringElements,
        session: &mut SessionState,
        round: &RoundState,
        manager: &mut AbilityManager,
        rng: &mut dyn RandomSource,
        mut breakdown: Option<&mut BreakdownBuilder>,
    ) -> Result<PipResolution, EngineError> {
        validate_selection(hand, selected)?;
        let extra_passes = if manager.has_active(&self.config.retrigger_empowering_ability) {
            self.config.retrigger_extra_passes
        } else {
            0
        };
        let blank_bump = if manager.has_active(&self.config.blank_empowering_ability) {
            self.config.empowered_blank_exponent_bump
        } else {
            self.config.blank_exponent_bump
        };

        let mut current = initial;
        let mut side_effects = Vec::new();
        let mut retrigger_passes = 0;
        for (position, &die_index) in selected.iter().enumerate() {
            let die = &hand[die_index];
            let retriggers = if die.material == self.config.retrigger_material {
                1 + extra_passes
            } else {
                0
            };
            for pass in 0..=retriggers {
                let label = if pass == 0 {
                    format!("die{}", position + 1)
                } else {
                    format!("die{}:retrigger{pass}", position + 1)
                };
                let scored = ScoredDie {
                    die,
                    die_index,
                    position,
                    pass,
                };
                current = manager.apply_die_scored(
                    scored,
                    current,
                    session,
                    round,
                    rng,
                    &label,
                    &mut breakdown,
                );
                current = self.apply_pip(
                    scored,
                    current,
                    blank_bump,
                    session,
                    rng,
                    &label,
                    &mut breakdown,
                    &mut side_effects,
                );
            }
            retrigger_passes += retriggers;
        }

        if retrigger_passes > 0 {
            session.history.ability_scratch.update(
                RetriggerTally::SCRATCH_KEY,
                |tally: &mut RetriggerTally| {
                    tally.last = retrigger_passes;
                    tally.total += retrigger_passes;
                },
            );
        }
        debug!(
            dice = selected.len(),
            retrigger_passes,
            side_effects = side_effects.len(),
            "pip effects applied"
        );
        Ok(PipResolution {
            scoring_elements: current,
            side_effects,
            retrigger_passes,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_pip(
        &self,
        target: ScoredDie<'_>,
        values: ScoringElements,
        blank_bump: f64,
        session: &mut SessionState,
        rng: &mut dyn RandomSource,
        label: &str,
        breakdown: &mut Option<&mut BreakdownBuilder>,
        side_effects: &mut Vec<PipSideEffect>,
    ) -> ScoringElements {
        let effect = target.die.pip_effect();
        let step = format!("{label}:pip:{effect}");
        let mut push = |outcome: PipOutcome| {
            side_effects.push(PipSideEffect {
                die_index: target.die_index,
                position: target.position,
                pass: target.pass,
                effect,
                outcome,
            })
        };

        let (next, description) = match effect {
            PipEffect::TwoFaced | PipEffect::Wild => {
                (values, "detection only, no scoring effect".to_string())
            }
            PipEffect::Money => {
                let amount = self.config.money_pip_amount;
                session.money += amount;
                push(PipOutcome::MoneyGranted { amount });
                (values, format!("+${amount}"))
            }
            PipEffect::CreateConsumable => {
                // Slots are checked now; an earlier die in this pass may have filled the last one.
                let outcome = if !session.inventory.has_consumable_slot() {
                    PipOutcome::NoConsumableSlot
                } else if !rng.chance(self.config.consumable_pip_chance) {
                    PipOutcome::ConsumableMissed
                } else {
                    match self.content.pick_consumable(rng) {
                        Some(def) => match session.inventory.add_consumable(def.id.clone()) {
                            Ok(()) => PipOutcome::ConsumableCreated { id: def.id.clone() },
                            Err(err) => {
                                warn!(%err, "consumable pip");
                                PipOutcome::NoConsumableSlot
                            }
                        },
                        None => PipOutcome::ConsumableMissed,
                    }
                };
                let description = match &outcome {
                    PipOutcome::ConsumableCreated { id } => format!("created consumable {id}"),
                    PipOutcome::NoConsumableSlot => "no free consumable slot".to_string(),
                    _ => "no consumable this time".to_string(),
                };
                push(outcome);
                (values, description)
            }
            PipEffect::UpgradeHand => {
                push(PipOutcome::UpgradeMarked);
                (values, "scored combinations marked for upgrade".to_string())
            }
            PipEffect::Blank => (
                values.add_exponent(blank_bump),
                format!("+{blank_bump} exponent"),
            ),
            PipEffect::None | PipEffect::Unknown => (values, "no pip effect".to_string()),
        };
        record(breakdown, step, next, description);
        next
    }
}
