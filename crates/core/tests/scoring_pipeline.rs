mod common;

use common::{content, hand, manager_with, round_with, uses_of, ScriptedRng};
use rollio_core::{
    Ability, AbilityData, AbilityManager, AbilityRegistry, AbilityState, Content, Die,
    EngineConfig, EngineError, EventBus, FilterContext, PipEffect, PipOutcome, RetriggerTally,
    RngState, RoundState, ScoreModification, ScoringCombination, ScoringContext, ScoringElements,
    ScoringEngine, ScoringResolution, SessionState,
};

struct Table {
    config: EngineConfig,
    content: Content,
    registry: AbilityRegistry,
}

impl Table {
    fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            content: content(),
            registry: AbilityRegistry::with_builtins(),
        }
    }

    fn engine(&self) -> ScoringEngine<'_> {
        ScoringEngine::new(&self.config, &self.content, &self.registry)
    }
}

fn fixture_state(id: &str) -> AbilityState {
    AbilityState::from_data(&AbilityData::new(id, id))
}

/// Filter-only fixtures: rewrite combination points and nothing else.
#[derive(Debug)]
struct DoublePoints {
    state: AbilityState,
}

impl Ability for DoublePoints {
    fn state(&self) -> &AbilityState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AbilityState {
        &mut self.state
    }

    fn filter_combinations(
        &mut self,
        mut combinations: Vec<ScoringCombination>,
        _ctx: &FilterContext<'_>,
    ) -> Vec<ScoringCombination> {
        for combo in &mut combinations {
            combo.points *= 2.0;
        }
        combinations
    }

    fn on_scoring(&mut self, _ctx: &mut ScoringContext<'_>) -> ScoreModification {
        ScoreModification::default()
    }
}

#[derive(Debug)]
struct AddFifty {
    state: AbilityState,
}

impl Ability for AddFifty {
    fn state(&self) -> &AbilityState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AbilityState {
        &mut self.state
    }

    fn filter_combinations(
        &mut self,
        mut combinations: Vec<ScoringCombination>,
        _ctx: &FilterContext<'_>,
    ) -> Vec<ScoringCombination> {
        for combo in &mut combinations {
            combo.points += 50.0;
        }
        combinations
    }

    fn on_scoring(&mut self, _ctx: &mut ScoringContext<'_>) -> ScoreModification {
        ScoreModification::default()
    }
}

/// Zeroes points while also touching the dice: drops the last die or reverses the order.
#[derive(Debug)]
struct RewritesDice {
    state: AbilityState,
    drop_last: bool,
}

impl Ability for RewritesDice {
    fn state(&self) -> &AbilityState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AbilityState {
        &mut self.state
    }

    fn filter_combinations(
        &mut self,
        mut combinations: Vec<ScoringCombination>,
        _ctx: &FilterContext<'_>,
    ) -> Vec<ScoringCombination> {
        for combo in &mut combinations {
            combo.points = 0.0;
            if self.drop_last {
                combo.dice.pop();
            } else {
                combo.dice.reverse();
            }
        }
        combinations
    }

    fn on_scoring(&mut self, _ctx: &mut ScoringContext<'_>) -> ScoreModification {
        ScoreModification::default()
    }
}

fn three_of_a_kind() -> Vec<ScoringCombination> {
    vec![ScoringCombination::new("nOfAKind", vec![0, 1, 2], 300.0)]
}

fn score(
    table: &Table,
    session: &mut SessionState,
    round: &mut RoundState,
    manager: &mut AbilityManager,
    selected: &[usize],
    partitioning: &[ScoringCombination],
) -> ScoringResolution {
    table
        .engine()
        .resolve_scoring(
            session,
            round,
            manager,
            selected,
            partitioning,
            &mut ScriptedRng::always(0.0),
            &mut EventBus::default(),
        )
        .expect("resolve scoring")
}

#[test]
fn three_ones_score_base_points() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut round = round_with(hand(&[1, 1, 1, 2, 3, 4]));
    let mut manager = AbilityManager::new();
    let result = score(
        &table,
        &mut session,
        &mut round,
        &mut manager,
        &[0, 1, 2],
        &three_of_a_kind(),
    );
    assert_eq!(result.scoring_elements, ScoringElements::new(300.0, 1.0, 1.0));
    assert_eq!(result.final_score, 300);
    assert_eq!(round.round_points, 300);
}

#[test]
fn quarter_bonus_adds_flat_base_points() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut round = round_with(hand(&[1, 1, 1, 2, 3, 4]));
    let mut manager = manager_with(&table.registry, &["scoreMultiplier"]);
    let result = score(
        &table,
        &mut session,
        &mut round,
        &mut manager,
        &[0, 1, 2],
        &three_of_a_kind(),
    );
    assert_eq!(result.scoring_elements.base_points, 375.0);
    assert_eq!(result.final_score, 375);
    let step = result
        .breakdown
        .find("ability:scoreMultiplier")
        .expect("ability step");
    assert_eq!(step.input.base_points, 300.0);
    assert_eq!(step.output.base_points, 375.0);
}

#[test]
fn breakdown_records_every_die_in_selection_order() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut round = round_with(hand(&[1, 1, 1, 2, 3, 4]));
    let mut manager = AbilityManager::new();
    let result = score(
        &table,
        &mut session,
        &mut round,
        &mut manager,
        &[2, 0, 1],
        &three_of_a_kind(),
    );
    let labels: Vec<&str> = result.breakdown.labels().collect();
    assert_eq!(
        labels,
        vec![
            "baseCombinations",
            "die1:pip:none",
            "die2:pip:none",
            "die3:pip:none"
        ]
    );
    for pair in result.breakdown.steps.windows(2) {
        assert_eq!(pair[0].output, pair[1].input);
    }
    assert_eq!(result.breakdown.final_values, result.scoring_elements);
}

#[test]
fn out_of_hand_selection_leaves_state_untouched() {
    let table = Table::new();
    let mut session = SessionState::standard();
    session.money = 4;
    let mut round = round_with(hand(&[1, 1, 1]));
    round.dice_hand[0] = round.dice_hand[0].clone().with_pip(1, PipEffect::Money);
    let mut manager = manager_with(&table.registry, &["scoreMultiplier"]);
    let session_before = session.clone();
    let round_before = round.clone();

    let err = table
        .engine()
        .resolve_scoring(
            &mut session,
            &mut round,
            &mut manager,
            &[0, 9],
            &three_of_a_kind(),
            &mut ScriptedRng::always(0.0),
            &mut EventBus::default(),
        )
        .expect_err("index 9 is not in the hand");
    assert_eq!(err, EngineError::SelectionOutOfRange(9));
    assert_eq!(session, session_before);
    assert_eq!(round, round_before);
}

#[test]
fn repeated_selection_is_rejected() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut round = round_with(hand(&[1, 1, 1]));
    let result = table.engine().resolve_scoring(
        &mut session,
        &mut round,
        &mut AbilityManager::new(),
        &[0, 0, 1],
        &three_of_a_kind(),
        &mut ScriptedRng::always(0.0),
        &mut EventBus::default(),
    );
    assert_eq!(result, Err(EngineError::DuplicateSelection(0)));
    assert_eq!(round.round_points, 0);
}

#[test]
fn combination_outside_hand_is_rejected() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut round = round_with(hand(&[1, 1]));
    let result = table.engine().resolve_scoring(
        &mut session,
        &mut round,
        &mut AbilityManager::new(),
        &[0, 1],
        &three_of_a_kind(),
        &mut ScriptedRng::always(0.0),
        &mut EventBus::default(),
    );
    assert_eq!(
        result,
        Err(EngineError::CombinationOutOfRange {
            kind: "nOfAKind".to_string(),
            index: 2
        })
    );
    assert!(session.history.combination_counters.is_empty());
}

#[test]
fn later_abilities_observe_earlier_modifications() {
    let table = Table::new();
    let mut session = SessionState::standard();

    let mut round = round_with(hand(&[1, 1, 1]));
    let mut manager = manager_with(&table.registry, &["oddCollector", "scoreMultiplier"]);
    let first = score(
        &table,
        &mut session,
        &mut round,
        &mut manager,
        &[0, 1, 2],
        &three_of_a_kind(),
    );
    // 300 + 45, then a quarter of 345 floored.
    assert_eq!(first.final_score, 431);

    let mut round = round_with(hand(&[1, 1, 1]));
    let mut manager = manager_with(&table.registry, &["scoreMultiplier", "oddCollector"]);
    let second = score(
        &table,
        &mut session,
        &mut round,
        &mut manager,
        &[0, 1, 2],
        &three_of_a_kind(),
    );
    assert_eq!(second.final_score, 420);
}

#[test]
fn high_stakes_filter_zeroes_low_singles_but_keeps_dice() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut round = round_with(hand(&[2, 2, 2, 1, 5, 3]));
    let mut manager = manager_with(&table.registry, &["highStakes"]);
    let partitioning = vec![
        ScoringCombination::new("nOfAKind", vec![0, 1, 2], 200.0),
        ScoringCombination::new("singleN", vec![3], 100.0),
        ScoringCombination::new("singleN", vec![4], 50.0),
    ];
    let result = score(
        &table,
        &mut session,
        &mut round,
        &mut manager,
        &[0, 1, 2, 3, 4],
        &partitioning,
    );
    assert_eq!(result.scoring_elements.base_points, 200.0);
    assert_eq!(result.scoring_elements.multiplier, 3.0);
    assert_eq!(result.final_score, 600);
    let dice: Vec<Vec<usize>> = result.combinations.iter().map(|c| c.dice.clone()).collect();
    assert_eq!(dice, vec![vec![0, 1, 2], vec![3], vec![4]]);
    assert_eq!(session.history.combination_counters.get("singleN:1"), Some(&1));
}

#[test]
fn filters_compose_in_acquisition_order() {
    let table = Table::new();

    let mut session = SessionState::standard();
    let mut round = round_with(hand(&[1, 1, 1]));
    let mut manager = AbilityManager::new();
    manager.push(Box::new(DoublePoints { state: fixture_state("double") }));
    manager.push(Box::new(AddFifty { state: fixture_state("addFifty") }));
    let result = score(
        &table,
        &mut session,
        &mut round,
        &mut manager,
        &[0, 1, 2],
        &three_of_a_kind(),
    );
    assert_eq!(result.combinations[0].points, 650.0);
    assert_eq!(result.final_score, 650);

    let mut session = SessionState::standard();
    let mut round = round_with(hand(&[1, 1, 1]));
    let mut manager = AbilityManager::new();
    manager.push(Box::new(AddFifty { state: fixture_state("addFifty") }));
    manager.push(Box::new(DoublePoints { state: fixture_state("double") }));
    let result = score(
        &table,
        &mut session,
        &mut round,
        &mut manager,
        &[0, 1, 2],
        &three_of_a_kind(),
    );
    assert_eq!(result.final_score, 700);
}

#[test]
fn filter_that_changes_dice_is_ignored() {
    let table = Table::new();
    for drop_last in [true, false] {
        let mut session = SessionState::standard();
        let mut round = round_with(hand(&[1, 1, 1]));
        let mut manager = AbilityManager::new();
        manager.push(Box::new(AddFifty { state: fixture_state("addFifty") }));
        manager.push(Box::new(RewritesDice {
            state: fixture_state("rewritesDice"),
            drop_last,
        }));
        manager.push(Box::new(DoublePoints { state: fixture_state("double") }));
        let result = score(
            &table,
            &mut session,
            &mut round,
            &mut manager,
            &[0, 1, 2],
            &three_of_a_kind(),
        );
        assert_eq!(result.final_score, 700, "drop_last={drop_last}");
        assert_eq!(result.combinations[0].dice, vec![0, 1, 2]);
    }
}

#[test]
fn per_die_hook_runs_before_pip_for_each_die() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut round = round_with(hand(&[1, 1, 1]));
    let mut manager = manager_with(&table.registry, &["aceInTheHole"]);
    let result = score(
        &table,
        &mut session,
        &mut round,
        &mut manager,
        &[0, 1, 2],
        &three_of_a_kind(),
    );
    assert_eq!(result.scoring_elements.multiplier, 4.0);
    assert_eq!(result.final_score, 1200);
    let labels: Vec<&str> = result.breakdown.labels().collect();
    assert_eq!(labels[1], "die1:ability:aceInTheHole");
    assert_eq!(labels[2], "die1:pip:none");
}

#[test]
fn money_pip_is_a_pure_side_effect() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut dice = hand(&[1, 1, 1]);
    dice[1] = dice[1].clone().with_pip(1, PipEffect::Money);
    let mut round = round_with(dice);
    let result = score(
        &table,
        &mut session,
        &mut round,
        &mut AbilityManager::new(),
        &[0, 1, 2],
        &three_of_a_kind(),
    );
    assert_eq!(session.money, 1);
    assert_eq!(result.final_score, 300);
    assert_eq!(result.side_effects.len(), 1);
    assert_eq!(result.side_effects[0].die_index, 1);
    let step = result.breakdown.find("die2:pip:money").expect("money step");
    assert_eq!(step.input, step.output);
}

#[test]
fn detection_only_pips_do_not_fire() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut dice = hand(&[1, 1, 1]);
    dice[0] = dice[0].clone().with_pip(1, PipEffect::Wild);
    dice[1] = dice[1].clone().with_pip(1, PipEffect::TwoFaced);
    let mut round = round_with(dice);
    let result = score(
        &table,
        &mut session,
        &mut round,
        &mut AbilityManager::new(),
        &[0, 1, 2],
        &three_of_a_kind(),
    );
    assert!(result.side_effects.is_empty());
    assert!(result.breakdown.find("die1:pip:wild").is_some());
    assert_eq!(result.final_score, 300);
}

#[test]
fn blank_pips_bump_exponent_more_with_blank_slate() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let dice: Vec<Die> = hand(&[2, 2, 2])
        .into_iter()
        .map(|die| die.with_pip(2, PipEffect::Blank))
        .collect();
    let partitioning = vec![ScoringCombination::new("nOfAKind", vec![0, 1, 2], 200.0)];

    let mut round = round_with(dice.clone());
    let plain = score(
        &table,
        &mut session,
        &mut round,
        &mut AbilityManager::new(),
        &[0, 1, 2],
        &partitioning,
    );
    assert!((plain.scoring_elements.exponent - 1.3).abs() < 1e-9);

    let mut round = round_with(dice);
    let mut manager = manager_with(&table.registry, &["blankSlate"]);
    let empowered = score(
        &table,
        &mut session,
        &mut round,
        &mut manager,
        &[0, 1, 2],
        &partitioning,
    );
    assert_eq!(empowered.scoring_elements.exponent, 1.75);
    assert_eq!(empowered.final_score, 200);
}

fn resonant_money_round() -> RoundState {
    let die = Die::standard("d1")
        .with_material("resonant")
        .with_pip(1, PipEffect::Money)
        .with_value(1);
    round_with(vec![die])
}

fn single_one() -> Vec<ScoringCombination> {
    vec![ScoringCombination::new("singleN", vec![0], 100.0)]
}

#[test]
fn retrigger_material_fires_twice() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut round = resonant_money_round();
    let result = score(
        &table,
        &mut session,
        &mut round,
        &mut AbilityManager::new(),
        &[0],
        &single_one(),
    );
    assert_eq!(session.money, 2);
    assert_eq!(result.side_effects.len(), 2);
    assert_eq!(result.side_effects[1].pass, 1);
    assert!(result.breakdown.find("die1:retrigger1:pip:money").is_some());
    let tally: RetriggerTally = session.history.ability_scratch.read(RetriggerTally::SCRATCH_KEY);
    assert_eq!(tally, RetriggerTally { last: 1, total: 1 });
}

#[test]
fn resonance_chamber_adds_two_more_passes() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut round = resonant_money_round();
    let mut manager = manager_with(&table.registry, &["resonanceChamber"]);
    let result = score(&table, &mut session, &mut round, &mut manager, &[0], &single_one());
    assert_eq!(session.money, 4);
    assert_eq!(result.side_effects.len(), 4);
    let tally: RetriggerTally = session.history.ability_scratch.read(RetriggerTally::SCRATCH_KEY);
    assert_eq!(tally.total, 3);
}

#[test]
fn reverberation_reads_the_retrigger_tally() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut manager = manager_with(&table.registry, &["reverberation"]);

    let mut round = resonant_money_round();
    let first = score(&table, &mut session, &mut round, &mut manager, &[0], &single_one());
    assert!((first.scoring_elements.multiplier - 1.1).abs() < 1e-9);

    let mut round = resonant_money_round();
    let second = score(&table, &mut session, &mut round, &mut manager, &[0], &single_one());
    assert!((second.scoring_elements.multiplier - 1.2).abs() < 1e-9);
}

#[test]
fn reverberation_reads_the_key_the_pip_walk_writes() {
    let table = Table::new();
    let mut session = SessionState::standard();
    session
        .history
        .ability_scratch
        .write(RetriggerTally::SCRATCH_KEY, &RetriggerTally { last: 0, total: 5 });
    let mut manager = manager_with(&table.registry, &[RetriggerTally::SCRATCH_KEY]);
    assert_eq!(manager.ids(), vec!["reverberation"]);
    let mut round = round_with(hand(&[1, 1, 1]));
    let result = score(
        &table,
        &mut session,
        &mut round,
        &mut manager,
        &[0, 1, 2],
        &three_of_a_kind(),
    );
    assert!((result.scoring_elements.multiplier - 1.5).abs() < 1e-9);
    assert_eq!(result.final_score, 450);
}

#[test]
fn consumable_pip_rechecks_capacity_per_die() {
    let mut table = Table::new();
    table.config.consumable_pip_chance = 1.0;
    let mut session = SessionState::standard();
    session.inventory.consumable_slots = 1;
    let dice: Vec<Die> = hand(&[4, 4, 4])
        .into_iter()
        .map(|die| die.with_pip(4, PipEffect::CreateConsumable))
        .collect();
    let mut round = round_with(dice);
    let partitioning = vec![ScoringCombination::new("nOfAKind", vec![0, 1, 2], 400.0)];
    let result = score(
        &table,
        &mut session,
        &mut round,
        &mut AbilityManager::new(),
        &[0, 1, 2],
        &partitioning,
    );
    let outcomes: Vec<&PipOutcome> = result.side_effects.iter().map(|e| &e.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            &PipOutcome::ConsumableCreated {
                id: "moneyDoubler".to_string()
            },
            &PipOutcome::NoConsumableSlot,
            &PipOutcome::NoConsumableSlot,
        ]
    );
    assert_eq!(session.inventory.consumables.len(), 1);
}

#[test]
fn upgrade_pip_raises_scored_combination_level() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut dice = hand(&[3, 3, 3]);
    dice[0] = dice[0].clone().with_pip(3, PipEffect::UpgradeHand);
    let mut round = round_with(dice);
    let result = score(
        &table,
        &mut session,
        &mut round,
        &mut AbilityManager::new(),
        &[0, 1, 2],
        &three_of_a_kind(),
    );
    let key = &result.keys[0];
    assert_eq!(key.as_str(), "nOfAKind:3");
    assert_eq!(session.history.combination_level(key), 2);
    assert_eq!(session.history.combination_count(key), 1);
}

#[test]
fn unrolled_die_behaves_as_no_effect() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut dice = hand(&[1, 1, 1]);
    dice[2] = Die::standard("d3").with_pip(1, PipEffect::Money);
    let mut round = round_with(dice);
    let result = score(
        &table,
        &mut session,
        &mut round,
        &mut AbilityManager::new(),
        &[0, 1, 2],
        &three_of_a_kind(),
    );
    assert_eq!(session.money, 0);
    assert!(result.breakdown.find("die3:pip:none").is_some());
}

#[test]
fn scoring_effects_are_deterministic() {
    let table = Table::new();
    let ids = ["oddCollector", "hex", "scoreMultiplier", "highStakes"];
    let run = || {
        let mut session = SessionState::standard();
        let mut round = round_with(hand(&[6, 6, 6, 1]));
        let mut manager = manager_with(&table.registry, &ids);
        let partitioning = vec![
            ScoringCombination::new("nOfAKind", vec![0, 1, 2], 600.0),
            ScoringCombination::new("singleN", vec![3], 100.0),
        ];
        table
            .engine()
            .resolve_scoring(
                &mut session,
                &mut round,
                &mut manager,
                &[0, 1, 2, 3],
                &partitioning,
                &mut RngState::from_seed(99),
                &mut EventBus::default(),
            )
            .expect("resolve")
    };
    let first = run();
    let second = run();
    assert_eq!(first, second);
}

#[test]
fn two_preventers_spend_only_their_own_uses() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut round = round_with(hand(&[2, 3, 4]));
    round.round_points = 500;
    let mut manager = AbilityManager::new();
    manager.add(&table.registry, &AbilityData::new("flopShield", "Flop Shield"));
    manager.add(
        &table.registry,
        &AbilityData::new("savingGrace", "Saving Grace").with_uses(2),
    );
    manager.add(
        &table.registry,
        &AbilityData::new("divineIntervention", "Divine Intervention"),
    );

    // Saving Grace misses, Divine Intervention hits.
    let mut rng = ScriptedRng::new(&[0.9, 0.1]);
    let outcome = table.engine().resolve_flop(
        &mut session,
        &mut round,
        &mut manager,
        &mut rng,
        &mut EventBus::default(),
    );
    assert!(outcome.resolution.prevented);
    assert_eq!(
        outcome.resolution.preventers,
        vec!["flopShield".to_string(), "divineIntervention".to_string()]
    );
    assert!(!round.flopped);
    assert_eq!(round.round_points, 500);
    assert_eq!(uses_of(&manager, "flopShield"), Some(2));
    assert_eq!(uses_of(&manager, "savingGrace"), Some(2));
    assert_eq!(uses_of(&manager, "divineIntervention"), Some(0));
}

#[test]
fn unprevented_flop_forfeits_round_points() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut round = round_with(hand(&[2, 3, 4]));
    round.round_points = 450;
    let mut manager = manager_with(&table.registry, &["angelInvestor"]);
    let outcome = table.engine().resolve_flop(
        &mut session,
        &mut round,
        &mut manager,
        &mut ScriptedRng::always(0.0),
        &mut EventBus::default(),
    );
    assert!(!outcome.resolution.prevented);
    assert_eq!(outcome.forfeited, 450);
    assert!(round.flopped);
    assert_eq!(round.round_points, 0);
    assert_eq!(session.history.last_forfeited_points, 450);
    assert_eq!(session.money, 1);
}

#[test]
fn exhausted_shield_stays_owned_but_stops_firing() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut manager = manager_with(&table.registry, &["flopShield"]);
    for _ in 0..3 {
        let mut round = round_with(hand(&[2]));
        let outcome = table.engine().resolve_flop(
            &mut session,
            &mut round,
            &mut manager,
            &mut ScriptedRng::always(0.0),
            &mut EventBus::default(),
        );
        assert!(outcome.resolution.prevented);
    }
    let mut round = round_with(hand(&[2]));
    let outcome = table.engine().resolve_flop(
        &mut session,
        &mut round,
        &mut manager,
        &mut ScriptedRng::always(0.0),
        &mut EventBus::default(),
    );
    assert!(!outcome.resolution.prevented);
    assert!(manager.contains("flopShield"));
    assert!(!manager.has_active("flopShield"));
}

#[test]
fn flop_collector_counts_prevented_flops_too() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut manager = manager_with(&table.registry, &["flopShield", "flopCollector"]);
    let mut round = round_with(hand(&[2]));
    table.engine().resolve_flop(
        &mut session,
        &mut round,
        &mut manager,
        &mut ScriptedRng::always(0.0),
        &mut EventBus::default(),
    );
    let mut round = round_with(hand(&[1, 1, 1]));
    let result = score(
        &table,
        &mut session,
        &mut round,
        &mut manager,
        &[0, 1, 2],
        &three_of_a_kind(),
    );
    assert_eq!(result.final_score, 350);
}

#[test]
fn inactive_flop_collector_neither_counts_nor_scores() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut data = AbilityData::new("flopCollector", "Flop Collector");
    data.active = false;
    let mut manager = AbilityManager::new();
    assert!(manager.add(&table.registry, &data));
    let mut round = round_with(hand(&[2]));
    table.engine().resolve_flop(
        &mut session,
        &mut round,
        &mut manager,
        &mut ScriptedRng::always(0.0),
        &mut EventBus::default(),
    );
    assert!(!session.history.ability_scratch.contains("flopCollector"));
    let mut round = round_with(hand(&[1, 1, 1]));
    let result = score(
        &table,
        &mut session,
        &mut round,
        &mut manager,
        &[0, 1, 2],
        &three_of_a_kind(),
    );
    assert_eq!(result.final_score, 300);
}

#[test]
fn bank_hooks_reduce_in_acquisition_order() {
    let table = Table::new();

    let mut session = SessionState::standard();
    let mut round = round_with(hand(&[1]));
    round.round_points = 1000;
    let mut manager = manager_with(&table.registry, &["pointPirate", "roundMultiplier"]);
    let banked = table
        .engine()
        .bank_round(&mut session, &mut round, &mut manager, &mut EventBus::default());
    assert_eq!(banked, 1875);
    assert_eq!(session.level.points_banked, 1875);
    assert_eq!(round.round_points, 0);

    let mut session = SessionState::standard();
    let mut round = round_with(hand(&[1]));
    round.round_points = 1000;
    let mut manager = manager_with(&table.registry, &["roundMultiplier", "pointPirate"]);
    let banked = table
        .engine()
        .bank_round(&mut session, &mut round, &mut manager, &mut EventBus::default());
    assert_eq!(banked, 1750);
}

#[test]
fn round_start_resets_cycle_progress() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut manager = manager_with(&table.registry, &["battingTheCycle"]);
    let straight = vec![ScoringCombination::new("straightOfN", vec![0, 1, 2, 3], 500.0)];

    let mut round = round_with(hand(&[1, 2, 3, 4]));
    let result = score(&table, &mut session, &mut round, &mut manager, &[0, 1, 2, 3], &straight);
    assert_eq!(result.scoring_elements.multiplier, 5.0);

    let mut events = EventBus::default();
    let mut round = table
        .engine()
        .start_round(&mut session, &mut manager, 2, &mut events);
    assert_eq!(round.dice_hand.len(), 6);
    assert!(round.dice_hand.iter().all(|die| die.rolled_value.is_none()));
    assert!(!session.history.ability_scratch.contains("battingTheCycle"));
    assert_eq!(events.len(), 1);

    round.dice_hand = hand(&[1, 2, 3]);
    let partial = vec![ScoringCombination::new("singleN", vec![0], 100.0)];
    let result = score(&table, &mut session, &mut round, &mut manager, &[0, 1, 2], &partial);
    assert_eq!(result.scoring_elements.multiplier, 1.0);
}

#[test]
fn unknown_ability_ids_are_skipped() {
    let registry = AbilityRegistry::with_builtins();
    let records = vec![
        AbilityData::new("scoreMultiplier", "Score Multiplier"),
        AbilityData::new("retiredCharm", "Retired"),
        AbilityData::new("flopShield", "Flop Shield").with_uses(1),
    ];
    let manager = AbilityManager::from_records(&registry, &records);
    assert_eq!(manager.ids(), vec!["scoreMultiplier", "flopShield"]);
    assert_eq!(uses_of(&manager, "flopShield"), Some(1));
    assert!(registry.create(&AbilityData::new("retiredCharm", "Retired")).is_none());
}

#[test]
fn inactive_abilities_do_not_fire() {
    let table = Table::new();
    let mut session = SessionState::standard();
    let mut round = round_with(hand(&[1, 1, 1]));
    let mut data = AbilityData::new("scoreMultiplier", "Score Multiplier");
    data.active = false;
    let mut manager = AbilityManager::new();
    manager.add(&table.registry, &data);
    let result = score(
        &table,
        &mut session,
        &mut round,
        &mut manager,
        &[0, 1, 2],
        &three_of_a_kind(),
    );
    assert_eq!(result.final_score, 300);
}
