use crate::{
    total_points, validate_selection, AbilityManager, AbilityRegistry, BreakdownBuilder,
    CombinationKey, Content, EngineConfig, EngineError, Event, EventBus, FilterContext,
    FlopResolution, PipEffectSystem, PipSideEffect, RandomSource, RoundState, ScoringBreakdown,
    ScoringCombination, ScoringElements, SessionState,
};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringResolution {
    pub scoring_elements: ScoringElements,
    pub final_score: i64,
    pub side_effects: Vec<PipSideEffect>,
    pub breakdown: ScoringBreakdown,
    /// The partitioning after ability filters; dice sets are unchanged.
    pub combinations: Vec<ScoringCombination>,
    pub keys: Vec<CombinationKey>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlopOutcome {
    pub resolution: FlopResolution,
    pub forfeited: i64,
}

/// Shared, read-only collaborators of one session. Holds no mutable state, so one engine can
/// serve any number of independent sessions.
#[derive(Debug, Clone, Copy)]
pub struct ScoringEngine<'a> {
    pub(crate) config: &'a EngineConfig,
    pub(crate) content: &'a Content,
    pub(crate) registry: &'a AbilityRegistry,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(
        config: &'a EngineConfig,
        content: &'a Content,
        registry: &'a AbilityRegistry,
    ) -> Self {
        Self {
            config,
            content,
            registry,
        }
    }

    pub fn config(&self) -> &'a EngineConfig {
        self.config
    }

    pub fn content(&self) -> &'a Content {
        self.content
    }

    pub fn registry(&self) -> &'a AbilityRegistry {
        self.registry
    }

    pub fn pip_system(&self) -> PipEffectSystem<'a> {
        PipEffectSystem::new(self.config, self.content)
    }

    /// Scores one chosen partitioning of the selected dice.
    ///
    /// Order: ability filters, base points, pip effects, ability scoring hooks, final score,
    /// combination counters, upgrade markers. Structural problems are reported before anything
    /// is touched.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve_scoring(
        &self,
        session: &mut SessionState,
        round: &mut RoundState,
        manager: &mut AbilityManager,
        selected: &[usize],
        partitioning: &[ScoringCombination],
        rng: &mut dyn RandomSource,
        events: &mut EventBus,
    ) -> Result<ScoringResolution, EngineError> {
        validate_selection(&round.dice_hand, selected)?;
        validate_partitioning(&round.dice_hand, partitioning)?;

        let filter_ctx = FilterContext {
            hand: &round.dice_hand,
            selected,
            session: &*session,
        };
        let combinations = manager.filter_combinations(partitioning.to_vec(), &filter_ctx);

        let base_points = total_points(&combinations);
        let base = ScoringElements::from_points(base_points);
        let mut builder = BreakdownBuilder::new(ScoringElements::initial());
        let names: Vec<&str> = combinations.iter().map(|combo| combo.kind.as_str()).collect();
        builder.add_step(
            "baseCombinations",
            base,
            format!("Combinations: {} = {base_points}", names.join(", ")),
        );

        let pips = self.pip_system().apply_all(
            &round.dice_hand,
            selected,
            base,
            session,
            round,
            manager,
            rng,
            Some(&mut builder),
        )?;
        let upgrade_markers = pips.upgrade_markers();

        let values = manager.apply_scoring_effects(
            pips.scoring_elements,
            &combinations,
            selected,
            session,
            round,
            rng,
            &mut Some(&mut builder),
        );
        let final_score = values.final_score();

        let keys = session
            .history
            .record_partitioning(&combinations, &round.dice_hand);
        for _ in 0..upgrade_markers {
            session.history.upgrade_combinations(&keys);
        }
        round.round_points = round.round_points.saturating_add(final_score);
        session.history.highest_score = session.history.highest_score.max(final_score);

        debug!(
            base_points,
            multiplier = values.multiplier,
            exponent = values.exponent,
            final_score,
            "selection scored"
        );
        for effect in &pips.side_effects {
            events.push(Event::PipSideEffect {
                die: effect.die_index,
                effect: effect.effect.id().to_string(),
            });
        }
        events.push(Event::SelectionScored {
            combinations: keys.iter().map(|key| key.to_string()).collect(),
            base_points: values.base_points,
            multiplier: values.multiplier,
            exponent: values.exponent,
            total: final_score,
        });
        Ok(ScoringResolution {
            scoring_elements: values,
            final_score,
            side_effects: pips.side_effects,
            breakdown: builder.build(),
            combinations,
            keys,
        })
    }

    /// Runs flop hooks; without a prevention the round's points are forfeited.
    pub fn resolve_flop(
        &self,
        session: &mut SessionState,
        round: &mut RoundState,
        manager: &mut AbilityManager,
        rng: &mut dyn RandomSource,
        events: &mut EventBus,
    ) -> FlopOutcome {
        let resolution = manager.try_prevent_flop(session, round, rng);
        let mut forfeited = 0;
        if !resolution.prevented {
            forfeited = round.round_points;
            round.forfeited_points = forfeited;
            round.round_points = 0;
            round.flopped = true;
            session.history.last_forfeited_points = forfeited;
            session.level.consecutive_flops += 1;
        }
        debug!(prevented = resolution.prevented, forfeited, "flop resolved");
        events.push(Event::FlopResolved {
            prevented: resolution.prevented,
            forfeited,
        });
        FlopOutcome {
            resolution,
            forfeited,
        }
    }

    /// Banks the round's points through the bank hooks and returns the amount credited.
    pub fn bank_round(
        &self,
        session: &mut SessionState,
        round: &mut RoundState,
        manager: &mut AbilityManager,
        events: &mut EventBus,
    ) -> i64 {
        let requested = round.round_points;
        let banked = manager.apply_bank_effects(requested, session, round);
        session.level.points_banked = session.level.points_banked.saturating_add(banked);
        session.level.banks_remaining = session.level.banks_remaining.saturating_sub(1);
        session.level.consecutive_flops = 0;
        round.round_points = 0;
        events.push(Event::Banked {
            requested,
            banked,
            level_total: session.level.points_banked,
        });
        banked
    }

    /// Fresh round with every die of the set unrolled, then round-start hooks.
    pub fn start_round(
        &self,
        session: &mut SessionState,
        manager: &mut AbilityManager,
        round_number: u32,
        events: &mut EventBus,
    ) -> RoundState {
        let hand = session
            .dice_set
            .iter()
            .cloned()
            .map(|mut die| {
                die.clear_roll();
                die
            })
            .collect();
        let mut round = RoundState::new(round_number, hand);
        manager.on_round_start(session, &mut round);
        events.push(Event::RoundStarted {
            round: round_number,
        });
        round
    }
}

/// Rolls every die in the hand.
pub fn roll_hand(round: &mut RoundState, rng: &mut dyn RandomSource) {
    for die in &mut round.dice_hand {
        die.roll(rng);
    }
    round.roll_count += 1;
}

fn validate_partitioning(
    hand: &[crate::Die],
    partitioning: &[ScoringCombination],
) -> Result<(), EngineError> {
    for combo in partitioning {
        if let Some(&index) = combo.dice.iter().find(|index| **index >= hand.len()) {
            return Err(EngineError::CombinationOutOfRange {
                kind: combo.kind.clone(),
                index,
            });
        }
    }
    Ok(())
}
