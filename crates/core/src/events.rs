use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    RoundStarted { round: u32 },
    SelectionScored {
        combinations: Vec<String>,
        base_points: f64,
        multiplier: f64,
        exponent: f64,
        total: i64,
    },
    FlopResolved { prevented: bool, forfeited: i64 },
    Banked { requested: i64, banked: i64, level_total: i64 },
    ConsumableUsed { id: String, success: bool, removed: bool },
    AbilityGranted { id: String },
    PipSideEffect { die: usize, effect: String },
}

#[derive(Debug, Default)]
pub struct EventBus {
    queue: Vec<Event>,
}

impl EventBus {
    pub fn push(&mut self, event: Event) {
        self.queue.push(event);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.queue.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
