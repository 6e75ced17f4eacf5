mod common;

use common::hand;
use rollio_core::{
    CombinationKey, Partitioner, PartitionContext, ScoringCombination, SessionHistory,
    ALL_TUPLETS,
};

fn key_of(kind: &str, dice: Vec<usize>, values: &[u32]) -> String {
    let combo = ScoringCombination::new(kind, dice, 0.0);
    CombinationKey::for_combination(&combo, &hand(values)).to_string()
}

macro_rules! key_cases {
    ($($name:ident: $kind:literal, $dice:expr, $values:expr => $expected:literal;)*) => {
        $(
            #[test]
            fn $name() {
                assert_eq!(key_of($kind, $dice, &$values), $expected);
            }
        )*
    };
}

key_cases! {
    single_keys_on_face: "singleN", vec![2], [1, 1, 5] => "singleN:5";
    pairs_key_on_pair_count: "nPairs", vec![0, 1, 2, 3], [2, 2, 3, 3] => "nPairs:2";
    of_a_kind_keys_on_length: "nOfAKind", vec![0, 1, 2, 3], [4, 4, 4, 4] => "nOfAKind:4";
    straight_keys_on_length: "straightOfN", vec![0, 1, 2, 3, 4], [1, 2, 3, 4, 5] => "straightOfN:5";
    pyramid_keys_on_length: "pyramidOfN", vec![0, 1, 2, 3, 4, 5], [1, 2, 2, 3, 3, 3] => "pyramidOfN:6";
    triplets_key_on_group_count: "nTriplets", vec![0, 1, 2, 3, 4, 5], [2, 2, 2, 5, 5, 5] => "nTriplets:2";
    quadruplets_key_on_group_count: "nQuadruplets", vec![0, 1, 2, 3], [6, 6, 6, 6] => "nQuadruplets:1";
    unknown_category_keeps_its_tag: "hotDice", vec![0], [3] => "hotDice";
    single_without_roll_uses_zero: "singleN", vec![7], [1] => "singleN:0";
}

#[test]
fn key_ignores_which_dice_scored() {
    let values = [3, 3, 3, 4, 4, 4];
    assert_eq!(
        key_of("nOfAKind", vec![0, 1, 2], &values),
        key_of("nOfAKind", vec![5, 3, 4], &values)
    );
}

#[test]
fn display_names_read_naturally() {
    let cases = [
        (CombinationKey::new("singleN", 5), "Single 5"),
        (CombinationKey::new("nPairs", 1), "1 Pair"),
        (CombinationKey::new("nPairs", 3), "3 Pairs"),
        (CombinationKey::new("nOfAKind", 4), "4 of a Kind"),
        (CombinationKey::new("straightOfN", 6), "6-Length Straight"),
        (CombinationKey::new("pyramidOfN", 6), "Pyramid (6)"),
        (CombinationKey::new("nTriplets", 2), "2 Triplets"),
        (CombinationKey::from_raw(CombinationKey::FLOP), "Flop"),
        (CombinationKey::from_raw(CombinationKey::HOT_DICE), "Hot Dice"),
    ];
    for (key, expected) in cases {
        assert_eq!(key.display_name(), expected, "{key}");
    }
}

#[test]
fn unseen_keys_start_at_level_one() {
    let history = SessionHistory::default();
    let key = CombinationKey::new("nOfAKind", 5);
    assert_eq!(history.combination_level(&key), 1);
    assert_eq!(history.combination_count(&key), 0);
}

#[test]
fn upgrade_category_touches_only_known_keys() {
    let mut history = SessionHistory::default();
    let values = [2, 2, 2, 5, 5, 5];
    history.record_partitioning(
        &[
            ScoringCombination::new("nOfAKind", vec![0, 1, 2], 200.0),
            ScoringCombination::new("singleN", vec![3], 50.0),
        ],
        &hand(&values),
    );
    history.upgrade_combination(&CombinationKey::new("nOfAKind", 4));

    let upgraded = history.upgrade_category("nOfAKind");
    let raw: Vec<&str> = upgraded.iter().map(|key| key.as_str()).collect();
    assert_eq!(raw, vec!["nOfAKind:3", "nOfAKind:4"]);
    assert_eq!(history.combination_level(&CombinationKey::new("nOfAKind", 3)), 2);
    assert_eq!(history.combination_level(&CombinationKey::new("nOfAKind", 4)), 3);
    assert_eq!(history.combination_level(&CombinationKey::new("singleN", 5)), 1);
}

#[test]
fn tuplet_upgrade_covers_every_size() {
    let mut history = SessionHistory::default();
    let values = [2, 2, 2, 5, 5, 5, 6, 6];
    history.record_partitioning(
        &[ScoringCombination::new("nTriplets", vec![0, 1, 2, 3, 4, 5], 900.0)],
        &hand(&values),
    );
    history.upgrade_combination(&CombinationKey::new("nQuadruplets", 2));
    history.upgrade_combination(&CombinationKey::new("nPairs", 1));

    let upgraded = history.upgrade_category(ALL_TUPLETS);
    assert_eq!(upgraded.len(), 2);
    assert_eq!(history.combination_level(&CombinationKey::new("nTriplets", 2)), 2);
    assert_eq!(history.combination_level(&CombinationKey::new("nQuadruplets", 2)), 3);
    assert_eq!(history.combination_level(&CombinationKey::new("nPairs", 1)), 2);
}

#[test]
fn counters_follow_the_scored_partitioning() {
    let mut history = SessionHistory::default();
    let values = [1, 1, 1, 1, 5, 5];
    let keys = history.record_partitioning(
        &[
            ScoringCombination::new("nOfAKind", vec![0, 1, 2, 3], 1000.0),
            ScoringCombination::new("singleN", vec![4], 50.0),
            ScoringCombination::new("singleN", vec![5], 50.0),
        ],
        &hand(&values),
    );
    assert_eq!(keys.len(), 3);
    assert_eq!(history.combination_counters.get("nOfAKind:4"), Some(&1));
    assert_eq!(history.combination_counters.get("singleN:5"), Some(&2));
    assert_eq!(history.combination_counters.get("nPairs:3"), None);
}

struct Fixed(Vec<Vec<ScoringCombination>>);

impl Partitioner for Fixed {
    fn partition(
        &self,
        _values: &[u32],
        _context: &PartitionContext<'_>,
    ) -> Vec<Vec<ScoringCombination>> {
        self.0.clone()
    }
}

#[test]
fn partitioner_picks_highest_total_first_on_ties() {
    let pairs = vec![ScoringCombination::new("nPairs", vec![0, 1, 2, 3], 500.0)];
    let singles = vec![
        ScoringCombination::new("singleN", vec![0], 100.0),
        ScoringCombination::new("singleN", vec![1], 100.0),
    ];
    let tied = vec![ScoringCombination::new("nOfAKind", vec![0, 1], 500.0)];
    let partitioner = Fixed(vec![singles, pairs.clone(), tied]);

    let dice = hand(&[1, 1, 4, 4]);
    let context = PartitionContext {
        hand: &dice,
        selected: &[0, 1, 2, 3],
    };
    let candidates = partitioner.partition(&[1, 1, 4, 4], &context);
    assert_eq!(partitioner.choose(candidates), Some(pairs));
    assert_eq!(partitioner.choose(Vec::new()), None);
}
