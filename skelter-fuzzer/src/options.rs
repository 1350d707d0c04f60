//! Solver Option Registry.
//!
//! Backends register their tuning knobs here via
//! [`crate::solver::Solver::configure_options`]. Each option carries a value
//! shape the sampler can draw from, plus dependency and conflict sets over
//! option names; the manager's `pick_option` respects both and never
//! configures an option twice per run.

use rustc_hash::{FxHashMap, FxHashSet};

use skelter_core::rng::SeededRng;

/// Value shape of a solver option.
#[derive(Debug, Clone)]
pub enum OptionValue {
    /// Boolean flag.
    Bool {
        /// Value the backend starts with.
        default: bool,
    },
    /// Numeric option, sampled from an inclusive range.
    Num {
        /// Minimum value.
        min: u64,
        /// Maximum value.
        max: u64,
        /// Value the backend starts with.
        default: u64,
    },
    /// Enumerated option, sampled from a fixed value list.
    List {
        /// Legal values.
        values: Vec<String>,
        /// Value the backend starts with.
        default: String,
    },
}

/// A backend option with its sampling shape and compatibility constraints.
#[derive(Debug, Clone)]
pub struct SolverOption {
    name: String,
    value: OptionValue,
    depends: FxHashSet<String>,
    conflicts: FxHashSet<String>,
}

impl SolverOption {
    /// A Boolean option.
    #[must_use]
    pub fn bool_opt(name: impl Into<String>, default: bool) -> Self {
        Self {
            name: name.into(),
            value: OptionValue::Bool { default },
            depends: FxHashSet::default(),
            conflicts: FxHashSet::default(),
        }
    }

    /// A numeric option over `min..=max`.
    #[must_use]
    pub fn num_opt(name: impl Into<String>, min: u64, max: u64, default: u64) -> Self {
        assert!(min <= max, "empty option range");
        Self {
            name: name.into(),
            value: OptionValue::Num { min, max, default },
            depends: FxHashSet::default(),
            conflicts: FxHashSet::default(),
        }
    }

    /// An enumerated option over a non-empty value list.
    #[must_use]
    pub fn list_opt(
        name: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<String>>,
        default: impl Into<String>,
    ) -> Self {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        assert!(!values.is_empty(), "list option without values");
        Self {
            name: name.into(),
            value: OptionValue::List {
                values,
                default: default.into(),
            },
            depends: FxHashSet::default(),
            conflicts: FxHashSet::default(),
        }
    }

    /// Require another option to be configured first.
    #[must_use]
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends.insert(name.into());
        self
    }

    /// Forbid combination with another option.
    #[must_use]
    pub fn conflicts_with(mut self, name: impl Into<String>) -> Self {
        self.conflicts.insert(name.into());
        self
    }

    /// Option name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Options that must be configured before this one.
    #[must_use]
    pub fn depends(&self) -> &FxHashSet<String> {
        &self.depends
    }

    /// Options this one cannot be combined with.
    #[must_use]
    pub fn conflicts(&self) -> &FxHashSet<String> {
        &self.conflicts
    }

    /// The default value, rendered as the backend expects it.
    #[must_use]
    pub fn default_value(&self) -> String {
        match &self.value {
            OptionValue::Bool { default } => default.to_string(),
            OptionValue::Num { default, .. } => default.to_string(),
            OptionValue::List { default, .. } => default.clone(),
        }
    }

    /// Sample a legal value.
    pub fn pick_value(&self, rng: &mut SeededRng) -> String {
        match &self.value {
            OptionValue::Bool { .. } => rng.flip_coin().to_string(),
            OptionValue::Num { min, max, .. } => rng.pick_u64(*min, *max).to_string(),
            OptionValue::List { values, .. } => rng.choose(values).clone(),
        }
    }
}

/// The set of options a backend advertises, in registration order.
#[derive(Debug, Default)]
pub struct OptionRegistry {
    options: Vec<SolverOption>,
    index: FxHashMap<String, usize>,
}

impl OptionRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an option. Re-registering a name replaces the old entry.
    pub fn add(&mut self, option: SolverOption) {
        if let Some(&i) = self.index.get(option.name()) {
            self.options[i] = option;
        } else {
            self.index.insert(option.name().to_string(), self.options.len());
            self.options.push(option);
        }
    }

    /// Look up an option by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SolverOption> {
        self.index.get(name).map(|&i| &self.options[i])
    }

    /// All options, in registration order.
    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, SolverOption> {
        self.options.iter()
    }

    /// Number of registered options.
    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// True if no options are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_option_values() {
        let opt = SolverOption::bool_opt("incremental", false);
        let mut rng = SeededRng::new(1);
        for _ in 0..20 {
            let v = opt.pick_value(&mut rng);
            assert!(v == "true" || v == "false");
        }
        assert_eq!(opt.default_value(), "false");
    }

    #[test]
    fn test_num_option_range() {
        let opt = SolverOption::num_opt("rlimit", 10, 20, 10);
        let mut rng = SeededRng::new(2);
        for _ in 0..50 {
            let v: u64 = opt.pick_value(&mut rng).parse().unwrap();
            assert!((10..=20).contains(&v));
        }
    }

    #[test]
    fn test_list_option_membership() {
        let opt = SolverOption::list_opt("sat-engine", ["cadical", "kissat", "cms"], "cadical");
        let mut rng = SeededRng::new(3);
        for _ in 0..20 {
            let v = opt.pick_value(&mut rng);
            assert!(["cadical", "kissat", "cms"].contains(&v.as_str()));
        }
    }

    #[test]
    fn test_constraints_recorded() {
        let opt = SolverOption::bool_opt("foo", false)
            .depends_on("base")
            .conflicts_with("bar");
        assert!(opt.depends().contains("base"));
        assert!(opt.conflicts().contains("bar"));
    }

    #[test]
    fn test_registry_replaces_duplicates() {
        let mut reg = OptionRegistry::new();
        reg.add(SolverOption::bool_opt("foo", false));
        reg.add(SolverOption::bool_opt("foo", true));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("foo").unwrap().default_value(), "true");
    }
}
