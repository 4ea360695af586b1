//! Stat modifiers combined across every capability implementing a stat hook.
//!
//! Application order follows the layered stack used for all stats:
//! `(value + base) × additive × multiplicative + flat`.

/// Associative merge used by additive stat hooks.
///
/// `identity()` must be a neutral element: `identity().combine(x) == x`.
pub trait Combine: Sized {
    fn identity() -> Self;

    fn combine(self, other: Self) -> Self;
}

/// A modifier for a single numeric stat.
///
/// - **base**: added to the raw value before any scaling
/// - **additive**: summed percentage-style scale (1.0 = unchanged, 1.2 = +20%)
/// - **multiplicative**: sequential scale applied after additive
/// - **flat**: added after all scaling
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatModifier {
    pub base: f32,
    pub additive: f32,
    pub multiplicative: f32,
    pub flat: f32,
}

impl StatModifier {
    pub const DEFAULT: Self = Self {
        base: 0.0,
        additive: 1.0,
        multiplicative: 1.0,
        flat: 0.0,
    };

    /// Percentage-style increase (0.2 = +20%), summed with other increases.
    #[must_use]
    pub fn increased(mut self, amount: f32) -> Self {
        self.additive += amount;
        self
    }

    /// Sequential multiplier.
    #[must_use]
    pub fn more(mut self, factor: f32) -> Self {
        self.multiplicative *= factor;
        self
    }

    #[must_use]
    pub fn with_flat(mut self, amount: f32) -> Self {
        self.flat += amount;
        self
    }

    #[must_use]
    pub fn with_base(mut self, amount: f32) -> Self {
        self.base += amount;
        self
    }

    /// Applies this modifier to a raw value.
    pub fn apply(&self, value: f32) -> f32 {
        (value + self.base) * self.additive * self.multiplicative + self.flat
    }
}

impl Default for StatModifier {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Combine for StatModifier {
    fn identity() -> Self {
        Self::DEFAULT
    }

    fn combine(self, other: Self) -> Self {
        Self {
            base: self.base + other.base,
            // Increases are summed, so only the deltas above 1.0 accumulate.
            additive: self.additive + other.additive - 1.0,
            multiplicative: self.multiplicative * other.multiplicative,
            flat: self.flat + other.flat,
        }
    }
}
