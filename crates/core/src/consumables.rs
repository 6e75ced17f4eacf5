use crate::{
    next_die_size, previous_die_size, AbilityManager, Die, EngineError, Event, EventBus,
    InventoryError, LuckyTokenOutcome, RandomSource, RoundState, ScoringEngine, SessionState,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConsumableEffect {
    MoneyDoubler,
    ExtraDie,
    MaterialEnchanter,
    CharmGiver,
    SlotExpander,
    Chisel,
    PotteryWheel,
    ForfeitRecovery,
    LuckyToken,
}

impl ConsumableEffect {
    pub const ALL: [Self; 9] = [
        Self::MoneyDoubler,
        Self::ExtraDie,
        Self::MaterialEnchanter,
        Self::CharmGiver,
        Self::SlotExpander,
        Self::Chisel,
        Self::PotteryWheel,
        Self::ForfeitRecovery,
        Self::LuckyToken,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::MoneyDoubler => "moneyDoubler",
            Self::ExtraDie => "extraDie",
            Self::MaterialEnchanter => "materialEnchanter",
            Self::CharmGiver => "charmGiver",
            Self::SlotExpander => "slotExpander",
            Self::Chisel => "chisel",
            Self::PotteryWheel => "potteryWheel",
            Self::ForfeitRecovery => "forfeitRecovery",
            Self::LuckyToken => "luckyToken",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|effect| effect.id() == id)
    }

    pub fn needs_die_selection(self) -> bool {
        matches!(self, Self::Chisel | Self::PotteryWheel)
    }

    fn resize(self, sides: u32) -> Option<u32> {
        match self {
            Self::Chisel => previous_die_size(sides),
            Self::PotteryWheel => next_die_size(sides),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputRequest {
    /// Pick one of `candidates`, indices into the session's dice set.
    DieSelection {
        consumable: String,
        candidates: Vec<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumableOutcome {
    pub success: bool,
    pub should_remove: bool,
    pub message: String,
    pub requires_input: Option<InputRequest>,
}

impl ConsumableOutcome {
    fn applied(message: impl Into<String>) -> Self {
        Self {
            success: true,
            should_remove: true,
            message: message.into(),
            requires_input: None,
        }
    }

    /// Not consumed; the player keeps the item.
    fn refunded(message: impl Into<String>) -> Self {
        Self {
            success: false,
            should_remove: false,
            message: message.into(),
            requires_input: None,
        }
    }

    fn needs_input(request: InputRequest, message: impl Into<String>) -> Self {
        Self {
            success: false,
            should_remove: false,
            message: message.into(),
            requires_input: Some(request),
        }
    }
}

impl ScoringEngine<'_> {
    /// Applies the consumable in inventory slot `index`. It is removed only when the outcome says so.
    pub fn apply_consumable(
        &self,
        index: usize,
        session: &mut SessionState,
        round: Option<&mut RoundState>,
        manager: &mut AbilityManager,
        rng: &mut dyn RandomSource,
        events: &mut EventBus,
    ) -> Result<ConsumableOutcome, EngineError> {
        let id = consumable_id(session, index)?;
        let Some(effect) = ConsumableEffect::from_id(&id) else {
            warn!(%id, "unknown consumable id");
            return Ok(ConsumableOutcome::refunded(format!("Unknown consumable: {id}")));
        };
        let outcome = match effect {
            ConsumableEffect::MoneyDoubler => {
                session.money = session.money.saturating_mul(2);
                ConsumableOutcome::applied(format!("Money doubled to ${}", session.money))
            }
            ConsumableEffect::ExtraDie => {
                let die = Die::standard(format!("d{}", session.dice_set.len() + 1));
                let message = format!("Added die {}", die.id);
                session.dice_set.push(die);
                ConsumableOutcome::applied(message)
            }
            ConsumableEffect::MaterialEnchanter => self.enchant_material(session, manager, rng),
            ConsumableEffect::CharmGiver => self.grant_ability(session, manager, rng, events),
            ConsumableEffect::SlotExpander => {
                session.inventory.ability_slots += 1;
                ConsumableOutcome::applied(format!(
                    "Ability slots increased to {}",
                    session.inventory.ability_slots
                ))
            }
            ConsumableEffect::Chisel | ConsumableEffect::PotteryWheel => {
                let candidates: Vec<usize> = session
                    .dice_set
                    .iter()
                    .enumerate()
                    .filter(|(_, die)| effect.resize(die.sides).is_some())
                    .map(|(idx, _)| idx)
                    .collect();
                if candidates.is_empty() {
                    ConsumableOutcome::refunded("No die can be resized")
                } else {
                    ConsumableOutcome::needs_input(
                        InputRequest::DieSelection {
                            consumable: id.clone(),
                            candidates,
                        },
                        "Choose a die",
                    )
                }
            }
            ConsumableEffect::ForfeitRecovery => self.recover_forfeit(session, round),
            ConsumableEffect::LuckyToken => self.draw_lucky_token(session, round, manager, rng),
        };
        self.finish(index, id, outcome, session, events)
    }

    /// Second phase for consumables that asked for a die. `die_index` points into the dice set.
    pub fn complete_die_selection(
        &self,
        index: usize,
        die_index: usize,
        session: &mut SessionState,
        events: &mut EventBus,
    ) -> Result<ConsumableOutcome, EngineError> {
        let id = consumable_id(session, index)?;
        let effect = ConsumableEffect::from_id(&id)
            .filter(|effect| effect.needs_die_selection())
            .ok_or_else(|| EngineError::NotDieSelection(id.clone()))?;
        let outcome = match session.dice_set.get_mut(die_index) {
            None => ConsumableOutcome::refunded(format!("No die at position {die_index}")),
            Some(die) => match effect.resize(die.sides) {
                None => ConsumableOutcome::refunded(format!(
                    "Die {} cannot be resized from d{}",
                    die.id, die.sides
                )),
                Some(sides) => {
                    let from = die.sides;
                    die.resize(sides);
                    ConsumableOutcome::applied(format!("Die {} is now d{sides} (was d{from})", die.id))
                }
            },
        };
        self.finish(index, id, outcome, session, events)
    }

    fn finish(
        &self,
        index: usize,
        id: String,
        outcome: ConsumableOutcome,
        session: &mut SessionState,
        events: &mut EventBus,
    ) -> Result<ConsumableOutcome, EngineError> {
        if outcome.should_remove {
            session.inventory.take_consumable(index)?;
        }
        debug!(%id, success = outcome.success, removed = outcome.should_remove, message = %outcome.message, "consumable");
        events.push(Event::ConsumableUsed {
            id,
            success: outcome.success,
            removed: outcome.should_remove,
        });
        Ok(outcome)
    }

    fn enchant_material(
        &self,
        session: &mut SessionState,
        manager: &AbilityManager,
        rng: &mut dyn RandomSource,
    ) -> ConsumableOutcome {
        let plastic: Vec<usize> = session
            .dice_set
            .iter()
            .enumerate()
            .filter(|(_, die)| die.is_plastic())
            .map(|(idx, _)| idx)
            .collect();
        if plastic.is_empty() {
            return ConsumableOutcome::refunded("No plastic dice to enchant");
        }
        let boosted = manager.has_active(&self.config.probability_doubling_ability);
        let chance = self.config.boosted_chance(self.config.enchant_chance, boosted);
        if !rng.chance(chance) {
            return ConsumableOutcome::refunded("The enchantment fizzled");
        }
        let Some(die_index) = rng.pick_index(plastic.len()).map(|pick| plastic[pick]) else {
            return ConsumableOutcome::refunded("No plastic dice to enchant");
        };
        let Some(material) = self.content.pick_special_material(rng) else {
            return ConsumableOutcome::refunded("No materials to enchant with");
        };
        let die = &mut session.dice_set[die_index];
        die.material = material.id.clone();
        ConsumableOutcome::applied(format!("Die {} became {}", die.id, material.name))
    }

    fn grant_ability(
        &self,
        session: &mut SessionState,
        manager: &mut AbilityManager,
        rng: &mut dyn RandomSource,
        events: &mut EventBus,
    ) -> ConsumableOutcome {
        if manager.len() >= session.inventory.ability_slots {
            return ConsumableOutcome::refunded("No free ability slot");
        }
        let available: Vec<_> = self
            .content
            .abilities
            .iter()
            .filter(|data| !manager.contains(&data.id) && self.registry.contains(&data.id))
            .collect();
        let Some(data) = rng.pick_index(available.len()).map(|pick| available[pick]) else {
            return ConsumableOutcome::refunded("No abilities left to grant");
        };
        if !manager.add(self.registry, data) {
            return ConsumableOutcome::refunded(format!("Ability {} is unavailable", data.id));
        }
        events.push(Event::AbilityGranted {
            id: data.id.clone(),
        });
        ConsumableOutcome::applied(format!("Gained {}", data.name))
    }

    fn recover_forfeit(
        &self,
        session: &mut SessionState,
        round: Option<&mut RoundState>,
    ) -> ConsumableOutcome {
        let Some(round) = round else {
            return ConsumableOutcome::refunded("No round in progress");
        };
        let last = session.history.last_forfeited_points;
        let recovered = (last as f64 * self.config.forfeit_recovery_ratio).floor() as i64;
        if recovered <= 0 {
            return ConsumableOutcome::refunded("No forfeited points to recover");
        }
        round.round_points = round.round_points.saturating_add(recovered);
        session.history.last_forfeited_points = 0;
        ConsumableOutcome::applied(format!("Recovered {recovered} points"))
    }

    fn draw_lucky_token(
        &self,
        session: &mut SessionState,
        round: Option<&mut RoundState>,
        manager: &AbilityManager,
        rng: &mut dyn RandomSource,
    ) -> ConsumableOutcome {
        let Some(round) = round else {
            return ConsumableOutcome::refunded("No round in progress");
        };
        let boosted = manager.has_active(&self.config.probability_doubling_ability);
        let weights = self.config.normalized_lucky_weights(boosted);
        let Some(pick) = rng.weighted_index(&weights) else {
            return ConsumableOutcome::refunded("The token landed on its edge");
        };
        match LuckyTokenOutcome::ALL[pick] {
            LuckyTokenOutcome::DoublePoints => {
                round.round_points = round.round_points.saturating_mul(2);
                ConsumableOutcome::applied(format!(
                    "Round points doubled to {}",
                    round.round_points
                ))
            }
            LuckyTokenOutcome::ExtraReroll => {
                session.level.rerolls_remaining += 1;
                ConsumableOutcome::applied("Gained an extra reroll")
            }
            LuckyTokenOutcome::InstantBank => {
                round.instant_bank = true;
                ConsumableOutcome::applied("Next bank happens instantly")
            }
        }
    }
}

fn consumable_id(session: &SessionState, index: usize) -> Result<String, EngineError> {
    session
        .inventory
        .consumables
        .get(index)
        .map(|item| item.id.clone())
        .ok_or(EngineError::Inventory(InventoryError::InvalidConsumableIndex(
            index,
        )))
}
