//! Fuzzer Configuration.

use serde::{Deserialize, Serialize};
use skelter_core::theory::Theory;

/// Configuration record consumed by the fuzzing engine.
///
/// The trace output writer is passed separately at run time; everything else
/// the engine needs is in here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzerConfig {
    /// Seed of the master random stream.
    pub seed: u64,
    /// Theories to fuzz; `None` enables every theory the backend supports.
    /// The effective set is always intersected with the backend's and always
    /// contains `Theory::Bool`.
    pub theories: Option<Vec<Theory>>,
    /// Number of counted (external) actions to execute before steering to
    /// the final state.
    pub action_budget: u64,
    /// Mint symbols as `_s0`, `_s1`, … instead of random printable names.
    pub simple_symbols: bool,
    /// Precede every action with a `set-seed` line so any single action can
    /// be replayed in isolation.
    pub trace_seeds: bool,
    /// Treat Int as a subtype of Real when sampling arithmetic arguments.
    pub arith_subtyping: bool,
    /// Restrict arithmetic multiplication to the linear fragment (at most
    /// one non-value factor).
    pub arith_linear: bool,
}

impl Default for FuzzerConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            theories: None,
            action_budget: 100,
            simple_symbols: true,
            trace_seeds: false,
            arith_subtyping: false,
            arith_linear: false,
        }
    }
}

impl FuzzerConfig {
    /// Config with a seed and defaults for everything else.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Restrict fuzzing to the given theories.
    #[must_use]
    pub fn with_theories(mut self, theories: impl IntoIterator<Item = Theory>) -> Self {
        self.theories = Some(theories.into_iter().collect());
        self
    }

    /// Set the action budget.
    #[must_use]
    pub fn with_budget(mut self, budget: u64) -> Self {
        self.action_budget = budget;
        self
    }

    /// Enable seed-per-action tracing.
    #[must_use]
    pub fn with_trace_seeds(mut self) -> Self {
        self.trace_seeds = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let config = FuzzerConfig::with_seed(0xC0FFEE)
            .with_theories([Theory::Bool, Theory::Bv])
            .with_budget(500);
        assert_eq!(config.seed, 0xC0FFEE);
        assert_eq!(config.action_budget, 500);
        assert_eq!(config.theories.as_deref(), Some(&[Theory::Bool, Theory::Bv][..]));
        assert!(!config.trace_seeds);
    }
}
