use super::{
    Ability, AbilityData, AbilityRegistry, BankContext, DieScoredContext, FilterContext,
    FlopContext, RoundStartContext, ScoringContext,
};
use crate::breakdown::record;
use crate::{
    BreakdownBuilder, Die, RandomSource, RoundState, ScoringCombination, ScoringElements,
    SessionState,
};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlopResolution {
    pub prevented: bool,
    /// Abilities that reported prevention, in acquisition order.
    pub preventers: Vec<String>,
    pub logs: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoredDie<'a> {
    pub die: &'a Die,
    pub die_index: usize,
    pub position: usize,
    pub pass: u32,
}

/// Owns one session's abilities in acquisition order and dispatches every hook.
#[derive(Debug, Default)]
pub struct AbilityManager {
    abilities: Vec<Box<dyn Ability>>,
}

impl AbilityManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a manager from persisted records. Unknown ids are skipped.
    pub fn from_records(registry: &AbilityRegistry, records: &[AbilityData]) -> Self {
        let mut manager = Self::new();
        for data in records {
            manager.add(registry, data);
        }
        manager
    }

    pub fn add(&mut self, registry: &AbilityRegistry, data: &AbilityData) -> bool {
        match registry.create(data) {
            Some(ability) => {
                debug!(id = %data.id, "ability acquired");
                self.abilities.push(ability);
                true
            }
            None => false,
        }
    }

    pub fn push(&mut self, ability: Box<dyn Ability>) {
        self.abilities.push(ability);
    }

    pub fn remove(&mut self, id: &str) -> Option<Box<dyn Ability>> {
        let index = self.abilities.iter().position(|ability| ability.id() == id)?;
        Some(self.abilities.remove(index))
    }

    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.abilities.iter().any(|ability| ability.id() == id)
    }

    /// Owned, active and not out of uses.
    pub fn has_active(&self, id: &str) -> bool {
        self.abilities
            .iter()
            .any(|ability| ability.id() == id && ability.can_use())
    }

    pub fn get(&self, id: &str) -> Option<&dyn Ability> {
        self.abilities
            .iter()
            .find(|ability| ability.id() == id)
            .map(|ability| ability.as_ref())
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Box<dyn Ability>> {
        self.abilities.iter_mut().find(|ability| ability.id() == id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.abilities
            .iter()
            .map(|ability| ability.id().to_string())
            .collect()
    }

    pub fn snapshot(&self) -> Vec<AbilityData> {
        self.abilities
            .iter()
            .map(|ability| ability.state().to_data())
            .collect()
    }

    /// Each usable ability's filter sees the previous one's output, in acquisition order.
    /// A filter that changes any combination's dice is ignored.
    pub fn filter_combinations(
        &mut self,
        combinations: Vec<ScoringCombination>,
        ctx: &FilterContext<'_>,
    ) -> Vec<ScoringCombination> {
        let mut current = combinations;
        for ability in self.abilities.iter_mut() {
            if !ability.can_use() {
                continue;
            }
            let filtered = ability.filter_combinations(current.clone(), ctx);
            let same_dice = filtered.len() == current.len()
                && filtered
                    .iter()
                    .zip(&current)
                    .all(|(after, before)| after.dice == before.dice);
            if !same_dice {
                warn!(id = ability.id(), "combination filter changed dice sets, output ignored");
                continue;
            }
            current = filtered;
        }
        current
    }

    #[allow(clippy::too_many_arguments)]
    pub fn apply_die_scored(
        &mut self,
        target: ScoredDie<'_>,
        values: ScoringElements,
        session: &mut SessionState,
        round: &RoundState,
        rng: &mut dyn RandomSource,
        label: &str,
        breakdown: &mut Option<&mut BreakdownBuilder>,
    ) -> ScoringElements {
        let mut current = values;
        for ability in self.abilities.iter_mut() {
            if !ability.can_use() {
                continue;
            }
            let mut ctx = DieScoredContext {
                die: target.die,
                die_index: target.die_index,
                position: target.position,
                pass: target.pass,
                values: current,
                session: &mut *session,
                round,
                rng: &mut *rng,
            };
            let Some(modification) = ability.on_die_scored(&mut ctx) else {
                continue;
            };
            current = modification.apply(current);
            record(
                breakdown,
                format!("{label}:ability:{}", ability.id()),
                current,
                modification.describe(),
            );
        }
        current
    }

    /// Applies each ability's modification as soon as it is returned, so later abilities see
    /// earlier ones' effects.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_scoring_effects(
        &mut self,
        values: ScoringElements,
        combinations: &[ScoringCombination],
        selected: &[usize],
        session: &mut SessionState,
        round: &RoundState,
        rng: &mut dyn RandomSource,
        breakdown: &mut Option<&mut BreakdownBuilder>,
    ) -> ScoringElements {
        let mut current = values;
        for ability in self.abilities.iter_mut() {
            if !ability.can_use() {
                continue;
            }
            let mut ctx = ScoringContext {
                values: current,
                combinations,
                selected,
                session: &mut *session,
                round,
                rng: &mut *rng,
            };
            let modification = ability.on_scoring(&mut ctx);
            if modification.is_empty() {
                continue;
            }
            current = modification.apply(current);
            debug!(id = ability.id(), change = %modification.describe(), "ability scoring");
            record(
                breakdown,
                format!("ability:{}", ability.id()),
                current,
                modification.describe(),
            );
        }
        current
    }

    /// Every usable ability gets its flop hook called, even after one has already prevented.
    pub fn try_prevent_flop(
        &mut self,
        session: &mut SessionState,
        round: &mut RoundState,
        rng: &mut dyn RandomSource,
    ) -> FlopResolution {
        let mut resolution = FlopResolution::default();
        for ability in self.abilities.iter_mut() {
            if !ability.can_use() {
                continue;
            }
            let mut ctx = FlopContext {
                session: &mut *session,
                round: &mut *round,
                rng: &mut *rng,
            };
            let response = ability.on_flop(&mut ctx);
            if let Some(log) = response.log {
                resolution.logs.push(log);
            }
            if response.prevented {
                resolution.prevented = true;
                resolution.preventers.push(ability.id().to_string());
            }
        }
        resolution
    }

    /// Sequential reduction: each ability rewrites the previous one's output.
    pub fn apply_bank_effects(
        &mut self,
        banked: i64,
        session: &mut SessionState,
        round: &RoundState,
    ) -> i64 {
        let mut current = banked;
        for ability in self.abilities.iter_mut() {
            if !ability.can_use() {
                continue;
            }
            let mut ctx = BankContext {
                banked: current,
                session: &mut *session,
                round,
            };
            if let Some(next) = ability.on_bank(&mut ctx) {
                current = next;
            }
        }
        current
    }

    pub fn on_round_start(&mut self, session: &mut SessionState, round: &mut RoundState) {
        for ability in self.abilities.iter_mut() {
            if !ability.can_use() {
                continue;
            }
            let mut ctx = RoundStartContext {
                session: &mut *session,
                round: &mut *round,
            };
            ability.on_round_start(&mut ctx);
        }
    }
}
