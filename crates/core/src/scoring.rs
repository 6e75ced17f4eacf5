use serde::{Deserialize, Serialize};
use tracing::warn;

/// Three-number score model. Every operator returns a new value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringElements {
    pub base_points: f64,
    pub multiplier: f64,
    pub exponent: f64,
}

impl Default for ScoringElements {
    fn default() -> Self {
        Self::INITIAL
    }
}

impl ScoringElements {
    pub const INITIAL: Self = Self {
        base_points: 0.0,
        multiplier: 1.0,
        exponent: 1.0,
    };

    pub fn initial() -> Self {
        Self::INITIAL
    }

    pub fn from_points(points: f64) -> Self {
        Self::INITIAL.add_base_points(points)
    }

    pub fn new(base_points: f64, multiplier: f64, exponent: f64) -> Self {
        Self::INITIAL
            .add_base_points(base_points)
            .multiply_multiplier(multiplier)
            .multiply_exponent(exponent)
    }

    #[must_use]
    pub fn add_base_points(self, amount: f64) -> Self {
        if !operand_ok("add_base_points", amount) {
            return self;
        }
        Self {
            base_points: self.base_points + amount,
            ..self
        }
    }

    #[must_use]
    pub fn multiply_base_points(self, factor: f64) -> Self {
        if !operand_ok("multiply_base_points", factor) {
            return self;
        }
        Self {
            base_points: self.base_points * factor,
            ..self
        }
    }

    #[must_use]
    pub fn add_multiplier(self, amount: f64) -> Self {
        if !operand_ok("add_multiplier", amount) {
            return self;
        }
        Self {
            multiplier: self.multiplier + amount,
            ..self
        }
    }

    #[must_use]
    pub fn multiply_multiplier(self, factor: f64) -> Self {
        if !operand_ok("multiply_multiplier", factor) {
            return self;
        }
        Self {
            multiplier: self.multiplier * factor,
            ..self
        }
    }

    #[must_use]
    pub fn add_exponent(self, amount: f64) -> Self {
        if !operand_ok("add_exponent", amount) {
            return self;
        }
        Self {
            exponent: self.exponent + amount,
            ..self
        }
    }

    #[must_use]
    pub fn multiply_exponent(self, factor: f64) -> Self {
        if !operand_ok("multiply_exponent", factor) {
            return self;
        }
        Self {
            exponent: self.exponent * factor,
            ..self
        }
    }

    pub fn total_raw(&self) -> f64 {
        self.base_points * self.multiplier.powf(self.exponent)
    }

    /// `ceil(base_points * multiplier ^ exponent)`, saturated to the `i64` range.
    pub fn final_score(&self) -> i64 {
        // `as` saturates and maps NaN to 0.
        self.total_raw().ceil() as i64
    }

    pub fn is_finite(&self) -> bool {
        self.base_points.is_finite() && self.multiplier.is_finite() && self.exponent.is_finite()
    }
}

fn operand_ok(op: &str, value: f64) -> bool {
    if value.is_finite() {
        return true;
    }
    warn!(op, value, "ignoring non-finite scoring operand");
    false
}

/// A single effect source's change to the score. Absent fields leave the value untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreModification {
    #[serde(default)]
    pub base_points_add: Option<f64>,
    #[serde(default)]
    pub base_points_multiply: Option<f64>,
    #[serde(default)]
    pub multiplier_add: Option<f64>,
    #[serde(default)]
    pub multiplier_multiply: Option<f64>,
    #[serde(default)]
    pub exponent_add: Option<f64>,
    #[serde(default)]
    pub exponent_multiply: Option<f64>,
}

impl ScoreModification {
    pub fn base_points(amount: f64) -> Self {
        Self {
            base_points_add: Some(amount),
            ..Self::default()
        }
    }

    pub fn multiplier(amount: f64) -> Self {
        Self {
            multiplier_add: Some(amount),
            ..Self::default()
        }
    }

    pub fn multiplier_factor(factor: f64) -> Self {
        Self {
            multiplier_multiply: Some(factor),
            ..Self::default()
        }
    }

    pub fn exponent(amount: f64) -> Self {
        Self {
            exponent_add: Some(amount),
            ..Self::default()
        }
    }

    pub fn with_base_points(mut self, amount: f64) -> Self {
        self.base_points_add = Some(self.base_points_add.unwrap_or(0.0) + amount);
        self
    }

    pub fn with_multiplier(mut self, amount: f64) -> Self {
        self.multiplier_add = Some(self.multiplier_add.unwrap_or(0.0) + amount);
        self
    }

    pub fn with_multiplier_factor(mut self, factor: f64) -> Self {
        self.multiplier_multiply = Some(self.multiplier_multiply.unwrap_or(1.0) * factor);
        self
    }

    pub fn with_exponent(mut self, amount: f64) -> Self {
        self.exponent_add = Some(self.exponent_add.unwrap_or(0.0) + amount);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies add then multiply for each field, fields in base, multiplier, exponent order.
    pub fn apply(&self, values: ScoringElements) -> ScoringElements {
        let mut next = values;
        if let Some(amount) = self.base_points_add {
            next = next.add_base_points(amount);
        }
        if let Some(factor) = self.base_points_multiply {
            next = next.multiply_base_points(factor);
        }
        if let Some(amount) = self.multiplier_add {
            next = next.add_multiplier(amount);
        }
        if let Some(factor) = self.multiplier_multiply {
            next = next.multiply_multiplier(factor);
        }
        if let Some(amount) = self.exponent_add {
            next = next.add_exponent(amount);
        }
        if let Some(factor) = self.exponent_multiply {
            next = next.multiply_exponent(factor);
        }
        next
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(amount) = self.base_points_add {
            parts.push(format!("{amount:+} points"));
        }
        if let Some(factor) = self.base_points_multiply {
            parts.push(format!("x{factor} points"));
        }
        if let Some(amount) = self.multiplier_add {
            parts.push(format!("{amount:+} multiplier"));
        }
        if let Some(factor) = self.multiplier_multiply {
            parts.push(format!("x{factor} multiplier"));
        }
        if let Some(amount) = self.exponent_add {
            parts.push(format!("{amount:+} exponent"));
        }
        if let Some(factor) = self.exponent_multiply {
            parts.push(format!("x{factor} exponent"));
        }
        if parts.is_empty() {
            "no change".to_string()
        } else {
            parts.join(", ")
        }
    }
}
