use super::{
    Ability, AbilityRegistry, AbilityState, BankContext, DieScoredContext, FilterContext,
    FlopContext, FlopResponse, RoundStartContext, ScoringContext,
};
use crate::{
    die_size_multiplier, CombinationCategory, EngineError, ScoreModification, ScoringCombination,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

macro_rules! ability_state {
    () => {
        fn state(&self) -> &AbilityState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut AbilityState {
            &mut self.state
        }
    };
}

/// Abilities with no hook of their own; call sites check for them by id.
macro_rules! passive_ability {
    ($name:ident) => {
        #[derive(Debug)]
        struct $name {
            state: AbilityState,
        }

        impl Ability for $name {
            ability_state!();

            fn on_scoring(&mut self, _ctx: &mut ScoringContext<'_>) -> ScoreModification {
                ScoreModification::default()
            }
        }
    };
}

fn boxed<T: Ability + 'static>(ability: T) -> Box<dyn Ability> {
    Box::new(ability)
}

pub fn register_builtins(registry: &mut AbilityRegistry) -> Result<(), EngineError> {
    registry.register("scoreMultiplier", |state| boxed(ScoreMultiplier { state }))?;
    registry.register("highStakes", |state| boxed(HighStakes { state }))?;
    registry.register("moneyMagnet", |state| boxed(MoneyMagnet { state }))?;
    registry.register("oddCollector", |state| boxed(OddCollector { state }))?;
    registry.register("evenPerfection", |state| boxed(EvenPerfection { state }))?;
    registry.register("fourOfAKindBooster", |state| {
        boxed(FourOfAKindBooster { state })
    })?;
    registry.register("straightCollector", |state| {
        boxed(StraightCollector { state })
    })?;
    registry.register("sizeMatters", |state| boxed(SizeMatters { state }))?;
    registry.register("kingslayer", |state| boxed(Kingslayer { state }))?;
    registry.register("armadilloArmor", |state| boxed(ArmadilloArmor { state }))?;
    registry.register("tasteTheRainbow", |state| boxed(TasteTheRainbow { state }))?;
    registry.register(RetriggerTally::SCRATCH_KEY, |state| boxed(Reverberation { state }))?;
    registry.register("aceInTheHole", |state| boxed(AceInTheHole { state }))?;
    registry.register("quarterback", |state| boxed(Quarterback { state }))?;
    registry.register("ruleOfThree", |state| boxed(RuleOfThree { state }))?;
    registry.register("hex", |state| boxed(Hex { state }))?;
    registry.register("flopShield", |mut state| {
        state.uses.get_or_insert(FLOP_SHIELD_USES);
        boxed(FlopShield { state })
    })?;
    registry.register("savingGrace", |state| boxed(SavingGrace { state }))?;
    registry.register("divineIntervention", |mut state| {
        state.uses.get_or_insert(1);
        boxed(DivineIntervention { state })
    })?;
    registry.register("angelInvestor", |state| boxed(AngelInvestor { state }))?;
    registry.register("flopCollector", |state| boxed(FlopCollector { state }))?;
    registry.register("roundMultiplier", |state| boxed(RoundMultiplier { state }))?;
    registry.register("snowball", |state| boxed(Snowball { state }))?;
    registry.register("pointPirate", |state| boxed(PointPirate { state }))?;
    registry.register("battingTheCycle", |state| boxed(BattingTheCycle { state }))?;
    registry.register("weightedDice", |state| boxed(WeightedDice { state }))?;
    registry.register("blankSlate", |state| boxed(BlankSlate { state }))?;
    registry.register("resonanceChamber", |state| {
        boxed(ResonanceChamber { state })
    })?;
    Ok(())
}

const FLOP_SHIELD_USES: u32 = 3;

passive_ability!(WeightedDice);
passive_ability!(BlankSlate);
passive_ability!(ResonanceChamber);

#[derive(Debug)]
struct ScoreMultiplier {
    state: AbilityState,
}

impl Ability for ScoreMultiplier {
    ability_state!();

    fn on_scoring(&mut self, ctx: &mut ScoringContext<'_>) -> ScoreModification {
        let bonus = (ctx.values.base_points * 0.25).floor();
        if bonus == 0.0 {
            return ScoreModification::default();
        }
        ScoreModification::base_points(bonus)
    }
}

#[derive(Debug)]
struct HighStakes {
    state: AbilityState,
}

impl Ability for HighStakes {
    ability_state!();

    fn filter_combinations(
        &mut self,
        combinations: Vec<ScoringCombination>,
        ctx: &FilterContext<'_>,
    ) -> Vec<ScoringCombination> {
        combinations
            .into_iter()
            .map(|mut combo| {
                let low_single = combo.category() == CombinationCategory::SingleN
                    && matches!(ctx.face_of(&combo), Some(1) | Some(5));
                if low_single {
                    combo.points = 0.0;
                }
                combo
            })
            .collect()
    }

    fn on_scoring(&mut self, _ctx: &mut ScoringContext<'_>) -> ScoreModification {
        ScoreModification::multiplier_factor(3.0)
    }
}

#[derive(Debug)]
struct MoneyMagnet {
    state: AbilityState,
}

impl Ability for MoneyMagnet {
    ability_state!();

    fn on_scoring(&mut self, ctx: &mut ScoringContext<'_>) -> ScoreModification {
        if ctx.session.money <= 0 {
            return ScoreModification::default();
        }
        ScoreModification::base_points(ctx.session.money as f64 * 5.0)
    }
}

#[derive(Debug)]
struct OddCollector {
    state: AbilityState,
}

impl Ability for OddCollector {
    ability_state!();

    fn on_scoring(&mut self, ctx: &mut ScoringContext<'_>) -> ScoreModification {
        let odd = ctx
            .selected_values()
            .into_iter()
            .filter(|value| value % 2 == 1)
            .count();
        if odd == 0 {
            return ScoreModification::default();
        }
        ScoreModification::base_points(odd as f64 * 15.0)
    }
}

#[derive(Debug)]
struct EvenPerfection {
    state: AbilityState,
}

impl Ability for EvenPerfection {
    ability_state!();

    fn on_scoring(&mut self, ctx: &mut ScoringContext<'_>) -> ScoreModification {
        let values = ctx.selected_values();
        if values.is_empty() || values.iter().any(|value| value % 2 == 1) {
            return ScoreModification::default();
        }
        ScoreModification::base_points(300.0)
    }
}

#[derive(Debug)]
struct FourOfAKindBooster {
    state: AbilityState,
}

impl Ability for FourOfAKindBooster {
    ability_state!();

    fn on_scoring(&mut self, ctx: &mut ScoringContext<'_>) -> ScoreModification {
        let boosted = ctx.combinations.iter().any(|combo| {
            combo.category() == CombinationCategory::NOfAKind && combo.dice.len() >= 4
        });
        if boosted {
            ScoreModification::multiplier_factor(2.0)
        } else {
            ScoreModification::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StraightTally {
    straights: u32,
}

#[derive(Debug)]
struct StraightCollector {
    state: AbilityState,
}

impl Ability for StraightCollector {
    ability_state!();

    fn on_scoring(&mut self, ctx: &mut ScoringContext<'_>) -> ScoreModification {
        let played = ctx
            .combinations
            .iter()
            .filter(|combo| combo.category() == CombinationCategory::StraightOfN)
            .count() as u32;
        let scratch = &mut ctx.session.history.ability_scratch;
        let tally = if played > 0 {
            scratch.update(&self.state.id, |tally: &mut StraightTally| {
                tally.straights += played
            })
        } else {
            scratch.read::<StraightTally>(&self.state.id)
        };
        if tally.straights == 0 {
            return ScoreModification::default();
        }
        ScoreModification::base_points(tally.straights as f64 * 20.0)
    }
}

#[derive(Debug)]
struct SizeMatters {
    state: AbilityState,
}

impl Ability for SizeMatters {
    ability_state!();

    fn on_scoring(&mut self, ctx: &mut ScoringContext<'_>) -> ScoreModification {
        let factors: Vec<f64> = ctx
            .selected_dice()
            .map(|die| die_size_multiplier(die.sides))
            .collect();
        if factors.is_empty() {
            return ScoreModification::default();
        }
        let average = factors.iter().sum::<f64>() / factors.len() as f64;
        if average == 1.0 {
            return ScoreModification::default();
        }
        ScoreModification::multiplier_factor(average)
    }
}

#[derive(Debug)]
struct Kingslayer {
    state: AbilityState,
}

impl Ability for Kingslayer {
    ability_state!();

    fn on_scoring(&mut self, ctx: &mut ScoringContext<'_>) -> ScoreModification {
        if ctx.session.level.is_boss {
            ScoreModification::multiplier_factor(3.0)
        } else {
            ScoreModification::default()
        }
    }
}

#[derive(Debug)]
struct ArmadilloArmor {
    state: AbilityState,
}

impl Ability for ArmadilloArmor {
    ability_state!();

    fn on_scoring(&mut self, ctx: &mut ScoringContext<'_>) -> ScoreModification {
        let rerolls = ctx.session.level.rerolls_remaining;
        if rerolls == 0 {
            return ScoreModification::default();
        }
        ScoreModification::multiplier(rerolls as f64)
    }
}

#[derive(Debug)]
struct TasteTheRainbow {
    state: AbilityState,
}

impl Ability for TasteTheRainbow {
    ability_state!();

    fn on_scoring(&mut self, ctx: &mut ScoringContext<'_>) -> ScoreModification {
        let hand = &ctx.round.dice_hand;
        let materials: BTreeSet<&str> = hand.iter().map(|die| die.material.as_str()).collect();
        if hand.len() < 2 || materials.len() != hand.len() {
            return ScoreModification::default();
        }
        ScoreModification::base_points(500.0)
            .with_multiplier(5.0)
            .with_exponent(0.5)
    }
}

/// Written by the pip system under `RetriggerTally::SCRATCH_KEY`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetriggerTally {
    /// Retrigger passes in the most recent resolution.
    pub last: u32,
    pub total: u32,
}

impl RetriggerTally {
    /// Also the id `reverberation` is registered under.
    pub const SCRATCH_KEY: &'static str = "reverberation";
}

#[derive(Debug)]
struct Reverberation {
    state: AbilityState,
}

impl Ability for Reverberation {
    ability_state!();

    fn on_scoring(&mut self, ctx: &mut ScoringContext<'_>) -> ScoreModification {
        let tally: RetriggerTally = ctx
            .session
            .history
            .ability_scratch
            .read(RetriggerTally::SCRATCH_KEY);
        if tally.total == 0 {
            return ScoreModification::default();
        }
        ScoreModification::multiplier(tally.total as f64 * 0.1)
    }
}

#[derive(Debug)]
struct AceInTheHole {
    state: AbilityState,
}

impl Ability for AceInTheHole {
    ability_state!();

    fn on_scoring(&mut self, _ctx: &mut ScoringContext<'_>) -> ScoreModification {
        ScoreModification::default()
    }

    fn on_die_scored(&mut self, ctx: &mut DieScoredContext<'_>) -> Option<ScoreModification> {
        (ctx.die.rolled_value == Some(1)).then(|| ScoreModification::multiplier(1.0))
    }
}

#[derive(Debug)]
struct Quarterback {
    state: AbilityState,
}

impl Ability for Quarterback {
    ability_state!();

    fn on_scoring(&mut self, _ctx: &mut ScoringContext<'_>) -> ScoreModification {
        ScoreModification::default()
    }

    fn on_die_scored(&mut self, ctx: &mut DieScoredContext<'_>) -> Option<ScoreModification> {
        (ctx.die.rolled_value == Some(4)).then(|| ScoreModification::exponent(0.1))
    }
}

#[derive(Debug)]
struct RuleOfThree {
    state: AbilityState,
}

impl Ability for RuleOfThree {
    ability_state!();

    fn on_scoring(&mut self, _ctx: &mut ScoringContext<'_>) -> ScoreModification {
        ScoreModification::default()
    }

    fn on_die_scored(&mut self, ctx: &mut DieScoredContext<'_>) -> Option<ScoreModification> {
        (ctx.die.rolled_value == Some(3)).then(|| ScoreModification::base_points(30.0))
    }
}

#[derive(Debug)]
struct Hex {
    state: AbilityState,
}

impl Ability for Hex {
    ability_state!();

    fn on_scoring(&mut self, _ctx: &mut ScoringContext<'_>) -> ScoreModification {
        ScoreModification::default()
    }

    fn on_die_scored(&mut self, ctx: &mut DieScoredContext<'_>) -> Option<ScoreModification> {
        if ctx.die.rolled_value != Some(6) {
            return None;
        }
        ctx.rng
            .chance(0.5)
            .then(|| ScoreModification::base_points(66.0))
    }
}

#[derive(Debug)]
struct FlopShield {
    state: AbilityState,
}

impl Ability for FlopShield {
    ability_state!();

    fn on_scoring(&mut self, _ctx: &mut ScoringContext<'_>) -> ScoreModification {
        ScoreModification::default()
    }

    fn on_flop(&mut self, _ctx: &mut FlopContext<'_>) -> FlopResponse {
        self.consume_use();
        let left = self.state.uses.unwrap_or(0);
        FlopResponse::prevented(format!("Flop Shield prevented the flop ({left} left)"))
    }
}

#[derive(Debug)]
struct SavingGrace {
    state: AbilityState,
}

impl Ability for SavingGrace {
    ability_state!();

    fn on_scoring(&mut self, _ctx: &mut ScoringContext<'_>) -> ScoreModification {
        ScoreModification::default()
    }

    fn on_flop(&mut self, ctx: &mut FlopContext<'_>) -> FlopResponse {
        if ctx.rng.chance(0.5) {
            FlopResponse::prevented("Saving Grace prevented the flop")
        } else {
            FlopResponse::ignored()
        }
    }
}

#[derive(Debug)]
struct DivineIntervention {
    state: AbilityState,
}

impl Ability for DivineIntervention {
    ability_state!();

    fn on_scoring(&mut self, _ctx: &mut ScoringContext<'_>) -> ScoreModification {
        ScoreModification::default()
    }

    fn on_flop(&mut self, ctx: &mut FlopContext<'_>) -> FlopResponse {
        if !ctx.rng.chance(0.8) {
            return FlopResponse::ignored();
        }
        self.consume_use();
        FlopResponse::prevented("Divine Intervention prevented the flop")
    }
}

#[derive(Debug)]
struct AngelInvestor {
    state: AbilityState,
}

impl Ability for AngelInvestor {
    ability_state!();

    fn on_scoring(&mut self, _ctx: &mut ScoringContext<'_>) -> ScoreModification {
        ScoreModification::default()
    }

    fn on_flop(&mut self, ctx: &mut FlopContext<'_>) -> FlopResponse {
        ctx.session.money += 1;
        FlopResponse::ignored()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct FlopTally {
    flops: u32,
}

#[derive(Debug)]
struct FlopCollector {
    state: AbilityState,
}

impl Ability for FlopCollector {
    ability_state!();

    // Ignores uses; counts every flop while active.
    fn can_use(&self) -> bool {
        self.state.active
    }

    fn on_scoring(&mut self, ctx: &mut ScoringContext<'_>) -> ScoreModification {
        let tally: FlopTally = ctx.session.history.ability_scratch.read(&self.state.id);
        if tally.flops == 0 {
            return ScoreModification::default();
        }
        ScoreModification::base_points(tally.flops as f64 * 50.0)
    }

    fn on_flop(&mut self, ctx: &mut FlopContext<'_>) -> FlopResponse {
        let tally = ctx
            .session
            .history
            .ability_scratch
            .update(&self.state.id, |tally: &mut FlopTally| tally.flops += 1);
        FlopResponse {
            prevented: false,
            log: Some(format!("Flop Collector recorded flop #{}", tally.flops)),
        }
    }
}

#[derive(Debug)]
struct RoundMultiplier {
    state: AbilityState,
}

impl Ability for RoundMultiplier {
    ability_state!();

    fn on_scoring(&mut self, _ctx: &mut ScoringContext<'_>) -> ScoreModification {
        ScoreModification::default()
    }

    fn on_bank(&mut self, ctx: &mut BankContext<'_>) -> Option<i64> {
        Some((ctx.banked as f64 * 1.25).floor() as i64)
    }
}

#[derive(Debug)]
struct Snowball {
    state: AbilityState,
}

impl Ability for Snowball {
    ability_state!();

    fn on_scoring(&mut self, _ctx: &mut ScoringContext<'_>) -> ScoreModification {
        ScoreModification::default()
    }

    fn on_bank(&mut self, ctx: &mut BankContext<'_>) -> Option<i64> {
        Some((ctx.banked as f64 * 1.15).floor() as i64)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PirateLedger {
    first_bank_taken: bool,
}

#[derive(Debug)]
struct PointPirate {
    state: AbilityState,
}

impl Ability for PointPirate {
    ability_state!();

    fn on_scoring(&mut self, _ctx: &mut ScoringContext<'_>) -> ScoreModification {
        ScoreModification::default()
    }

    fn on_bank(&mut self, ctx: &mut BankContext<'_>) -> Option<i64> {
        let scratch = &mut ctx.session.history.ability_scratch;
        let ledger: PirateLedger = scratch.read(&self.state.id);
        if !ledger.first_bank_taken {
            scratch.write(
                &self.state.id,
                &PirateLedger {
                    first_bank_taken: true,
                },
            );
            return Some(ctx.banked + 500);
        }
        let penalty = i64::from(ctx.round.roll_count) * 10;
        Some((ctx.banked - penalty).max(0))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CycleProgress {
    values: BTreeSet<u32>,
}

#[derive(Debug)]
struct BattingTheCycle {
    state: AbilityState,
}

impl Ability for BattingTheCycle {
    ability_state!();

    fn on_scoring(&mut self, ctx: &mut ScoringContext<'_>) -> ScoreModification {
        let scored = ctx.selected_values();
        let progress = ctx
            .session
            .history
            .ability_scratch
            .update(&self.state.id, |progress: &mut CycleProgress| {
                progress.values.extend(scored)
            });
        if (1..=4).all(|value| progress.values.contains(&value)) {
            ScoreModification::multiplier(4.0)
        } else {
            ScoreModification::default()
        }
    }

    fn on_round_start(&mut self, ctx: &mut RoundStartContext<'_>) {
        ctx.session.history.ability_scratch.remove(&self.state.id);
    }
}
