use crate::ScoringElements;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringBreakdownStep {
    pub step: String,
    pub input: ScoringElements,
    pub output: ScoringElements,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoringBreakdown {
    pub steps: Vec<ScoringBreakdownStep>,
    pub final_values: ScoringElements,
}

impl ScoringBreakdown {
    pub fn find(&self, step: &str) -> Option<&ScoringBreakdownStep> {
        self.steps.iter().find(|entry| entry.step == step)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|entry| entry.step.as_str())
    }
}

/// Append-only recorder. Each step's input is the previous step's output.
#[derive(Debug, Clone)]
pub struct BreakdownBuilder {
    steps: Vec<ScoringBreakdownStep>,
    cursor: ScoringElements,
}

impl BreakdownBuilder {
    pub fn new(initial: ScoringElements) -> Self {
        Self {
            steps: Vec::new(),
            cursor: initial,
        }
    }

    pub fn add_step(
        &mut self,
        step: impl Into<String>,
        output: ScoringElements,
        description: impl Into<String>,
    ) {
        self.steps.push(ScoringBreakdownStep {
            step: step.into(),
            input: self.cursor,
            output,
            description: description.into(),
        });
        self.cursor = output;
    }

    pub fn build(self) -> ScoringBreakdown {
        ScoringBreakdown {
            steps: self.steps,
            final_values: self.cursor,
        }
    }
}

/// Records into the builder when one is attached; a no-op otherwise.
pub(crate) fn record(
    breakdown: &mut Option<&mut BreakdownBuilder>,
    step: impl Into<String>,
    output: ScoringElements,
    description: impl Into<String>,
) {
    if let Some(builder) = breakdown.as_deref_mut() {
        builder.add_step(step, output, description);
    }
}
