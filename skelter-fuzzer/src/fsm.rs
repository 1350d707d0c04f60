//! The Weighted State Machine Driving Action Selection.
//!
//! Each state owns a weighted list of entries; an entry couples an action
//! with an optional successor state and a `counted` flag. Counted (external)
//! actions consume the action budget; internal entries (transitions, solver
//! lifecycle) do not. Once the budget is exhausted only internal entries
//! remain eligible, which walks every state's default-transition chain to
//! the final state, so termination does not depend on the RNG.
//!
//! Backends splice private states and actions in through
//! [`crate::solver::Solver::configure_fsm`].

use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::actions::{
    Action, ActionAssert, ActionCheckSat, ActionCheckSatAssuming, ActionDelete,
    ActionGetUnsatAssumptions, ActionGetValue, ActionMkConst, ActionMkSort, ActionMkSpecialValue,
    ActionMkTerm, ActionMkValue, ActionMkVar, ActionNew, ActionPop, ActionPrintModel, ActionPush,
    ActionResetAssertions, ActionSetOpt, ActionTermGetSort, TransitionDefault,
};
use crate::config::FuzzerConfig;
use crate::error::{Result, SkelterError};
use crate::manager::SolverManager;

/// Canonical state names.
pub const STATE_NEW: &str = "new";
/// Option configuration.
pub const STATE_OPT: &str = "opt";
/// Sort, value and constant creation.
pub const STATE_INPUTS: &str = "inputs";
/// Term creation.
pub const STATE_TERMS: &str = "terms";
/// Assertion.
pub const STATE_ASSERT: &str = "assert";
/// Sat checking.
pub const STATE_CHECK_SAT: &str = "check_sat";
/// Model and unsat-assumption queries.
pub const STATE_MODEL: &str = "model";
/// Scope push/pop.
pub const STATE_PUSH_POP: &str = "push_pop";
/// Solver teardown.
pub const STATE_DELETE: &str = "delete";
/// Terminal state.
pub const STATE_FINAL: &str = "final";

/// Upper bound on consecutive skipped samples within one state; exceeding
/// it means every entry is permanently disabled, which the liveness check
/// is supposed to rule out.
const MAX_STALLED_SAMPLES: u32 = 100_000;

/// Handle to a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(usize);

struct Entry {
    action: Rc<dyn Action>,
    weight: u32,
    next: Option<StateId>,
    counted: bool,
}

struct State {
    name: String,
    is_final: bool,
    entries: Vec<Entry>,
}

/// The finite-state machine.
pub struct Fsm {
    states: Vec<State>,
    by_name: FxHashMap<String, StateId>,
    init: Option<StateId>,
    final_state: Option<StateId>,
    action_budget: u64,
}

impl std::fmt::Debug for Fsm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fsm")
            .field("states", &self.states.iter().map(|s| &s.name).collect::<Vec<_>>())
            .field("action_budget", &self.action_budget)
            .finish()
    }
}

impl Fsm {
    /// An empty machine with the given action budget.
    #[must_use]
    pub fn new(action_budget: u64) -> Self {
        Self {
            states: Vec::new(),
            by_name: FxHashMap::default(),
            init: None,
            final_state: None,
            action_budget,
        }
    }

    /// Add a state. Duplicate names are a configuration bug.
    pub fn new_state(&mut self, name: &str) -> StateId {
        assert!(!self.by_name.contains_key(name), "state `{name}` defined twice");
        let id = StateId(self.states.len());
        self.states.push(State {
            name: name.to_string(),
            is_final: false,
            entries: Vec::new(),
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Look up a state by name.
    #[must_use]
    pub fn state(&self, name: &str) -> Option<StateId> {
        self.by_name.get(name).copied()
    }

    /// Set the initial state.
    pub fn set_init_state(&mut self, id: StateId) {
        self.init = Some(id);
    }

    /// Mark and set the terminal state.
    pub fn set_final_state(&mut self, id: StateId) {
        self.states[id.0].is_final = true;
        self.final_state = Some(id);
    }

    /// Attach an action to a state. `next: None` stays in the state;
    /// `counted` controls whether executions consume the action budget.
    pub fn add_action(
        &mut self,
        state: StateId,
        action: Rc<dyn Action>,
        weight: u32,
        next: Option<StateId>,
        counted: bool,
    ) {
        assert!(weight > 0, "zero-weight action in state `{}`", self.states[state.0].name);
        self.states[state.0].entries.push(Entry {
            action,
            weight,
            next,
            counted,
        });
    }

    /// Attach an internal default transition from `state` to `next`.
    pub fn add_transition(&mut self, state: StateId, weight: u32, next: StateId) {
        self.add_action(state, Rc::new(TransitionDefault), weight, Some(next), false);
    }

    /// Splice an action into every state except the named ones and the
    /// final state. Entries stay in their state and are counted.
    pub fn add_action_to_all_states(
        &mut self,
        action: &Rc<dyn Action>,
        weight: u32,
        excluded: &[&str],
    ) {
        for idx in 0..self.states.len() {
            let state = &self.states[idx];
            if state.is_final || excluded.contains(&state.name.as_str()) {
                continue;
            }
            self.add_action(StateId(idx), Rc::clone(action), weight, None, true);
        }
    }

    /// Splice an action into every state except the named ones and the
    /// final state, transitioning to `next` after execution. Used to insert
    /// a backend detour state between canonical states.
    pub fn add_action_to_all_states_next(
        &mut self,
        action: &Rc<dyn Action>,
        weight: u32,
        next: StateId,
        excluded: &[&str],
    ) {
        for idx in 0..self.states.len() {
            let state = &self.states[idx];
            if state.is_final || excluded.contains(&state.name.as_str()) {
                continue;
            }
            self.add_action(StateId(idx), Rc::clone(action), weight, Some(next), true);
        }
    }

    /// All attached actions, keyed by trace tag. The untracer dispatches on
    /// this, so backend-injected actions replay without extra wiring.
    #[must_use]
    pub fn action_registry(&self) -> FxHashMap<String, Rc<dyn Action>> {
        let mut registry: FxHashMap<String, Rc<dyn Action>> = FxHashMap::default();
        for state in &self.states {
            for entry in &state.entries {
                registry
                    .entry(entry.action.kind().to_string())
                    .or_insert_with(|| Rc::clone(&entry.action));
            }
        }
        // Trace-protocol auxiliary emitted by mk_term, not owned by a state.
        registry
            .entry("term_get_sort".to_string())
            .or_insert_with(|| Rc::new(ActionTermGetSort));
        registry
    }

    /// The canonical machine.
    #[must_use]
    pub fn standard(config: &FuzzerConfig) -> Self {
        let mut fsm = Self::new(config.action_budget);

        let s_new = fsm.new_state(STATE_NEW);
        let s_opt = fsm.new_state(STATE_OPT);
        let s_inputs = fsm.new_state(STATE_INPUTS);
        let s_terms = fsm.new_state(STATE_TERMS);
        let s_assert = fsm.new_state(STATE_ASSERT);
        let s_push_pop = fsm.new_state(STATE_PUSH_POP);
        let s_check_sat = fsm.new_state(STATE_CHECK_SAT);
        let s_model = fsm.new_state(STATE_MODEL);
        let s_delete = fsm.new_state(STATE_DELETE);
        let s_final = fsm.new_state(STATE_FINAL);

        fsm.set_init_state(s_new);
        fsm.set_final_state(s_final);

        fsm.add_action(s_new, Rc::new(ActionNew), 1, Some(s_opt), false);

        fsm.add_action(s_opt, Rc::new(ActionSetOpt), 10, None, true);
        fsm.add_transition(s_opt, 5, s_inputs);

        fsm.add_action(s_inputs, Rc::new(ActionMkSort), 10, None, true);
        fsm.add_action(s_inputs, Rc::new(ActionMkConst), 10, None, true);
        fsm.add_action(s_inputs, Rc::new(ActionMkValue), 8, None, true);
        fsm.add_action(s_inputs, Rc::new(ActionMkSpecialValue), 4, None, true);
        fsm.add_action(s_inputs, Rc::new(ActionMkVar), 1, None, true);
        fsm.add_transition(s_inputs, 4, s_terms);

        fsm.add_action(s_terms, Rc::new(ActionMkTerm), 20, None, true);
        fsm.add_action(s_terms, Rc::new(ActionMkSort), 2, None, true);
        fsm.add_action(s_terms, Rc::new(ActionMkConst), 4, None, true);
        fsm.add_action(s_terms, Rc::new(ActionMkValue), 4, None, true);
        fsm.add_action(s_terms, Rc::new(ActionMkSpecialValue), 2, None, true);
        fsm.add_action(s_terms, Rc::new(ActionMkVar), 1, None, true);
        fsm.add_transition(s_terms, 1, s_inputs);
        fsm.add_transition(s_terms, 3, s_assert);

        fsm.add_action(s_assert, Rc::new(ActionAssert), 10, None, true);
        fsm.add_transition(s_assert, 2, s_terms);
        fsm.add_transition(s_assert, 2, s_push_pop);
        fsm.add_transition(s_assert, 3, s_check_sat);

        fsm.add_action(s_push_pop, Rc::new(ActionPush), 5, None, true);
        fsm.add_action(s_push_pop, Rc::new(ActionPop), 5, None, true);
        fsm.add_transition(s_push_pop, 3, s_terms);
        fsm.add_transition(s_push_pop, 1, s_assert);
        fsm.add_transition(s_push_pop, 2, s_check_sat);

        fsm.add_action(s_check_sat, Rc::new(ActionCheckSat), 5, None, true);
        fsm.add_action(s_check_sat, Rc::new(ActionCheckSatAssuming), 5, None, true);
        fsm.add_transition(s_check_sat, 2, s_assert);
        fsm.add_transition(s_check_sat, 1, s_push_pop);
        fsm.add_transition(s_check_sat, 3, s_model);

        fsm.add_action(s_model, Rc::new(ActionGetValue), 5, None, true);
        fsm.add_action(s_model, Rc::new(ActionPrintModel), 2, None, true);
        fsm.add_action(s_model, Rc::new(ActionGetUnsatAssumptions), 3, None, true);
        fsm.add_transition(s_model, 2, s_terms);
        fsm.add_transition(s_model, 2, s_check_sat);
        fsm.add_transition(s_model, 2, s_delete);

        fsm.add_action(s_delete, Rc::new(ActionDelete), 1, Some(s_final), false);

        let reset_assertions: Rc<dyn Action> = Rc::new(ActionResetAssertions);
        fsm.add_action_to_all_states(
            &reset_assertions,
            1,
            &[STATE_NEW, STATE_OPT, STATE_DELETE],
        );

        fsm
    }

    /// Verify the machine: initial and final states are set and every state
    /// reaches the final state through internal (budget-independent)
    /// entries.
    pub fn check(&self) -> Result<()> {
        self.init
            .ok_or_else(|| SkelterError::config("FSM has no initial state"))?;
        let final_state = self
            .final_state
            .ok_or_else(|| SkelterError::config("FSM has no final state"))?;

        // Reverse fixpoint over internal edges.
        let mut reaches = vec![false; self.states.len()];
        reaches[final_state.0] = true;
        loop {
            let mut changed = false;
            for (idx, state) in self.states.iter().enumerate() {
                if reaches[idx] {
                    continue;
                }
                let escapes = state.entries.iter().any(|e| {
                    !e.counted && e.weight > 0 && e.next.is_some_and(|n| reaches[n.0])
                });
                if escapes {
                    reaches[idx] = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        if let Some(idx) = reaches.iter().position(|&r| !r) {
            return Err(SkelterError::config(format!(
                "state `{}` cannot reach the final state through internal transitions",
                self.states[idx].name
            )));
        }
        Ok(())
    }

    /// The driver loop: from the initial state, sample and execute weighted
    /// actions until the final state is reached. Once `action_budget`
    /// counted actions have executed, only internal entries remain eligible.
    pub fn run(&self, mgr: &mut SolverManager) -> Result<()> {
        self.check()?;
        let mut seed_stream = mgr.rng_mut().fork();
        let mut counted: u64 = 0;
        let mut cur = self.init.unwrap_or_else(|| unreachable!("check verified init"));
        let mut stalled: u32 = 0;

        loop {
            let state = &self.states[cur.0];
            if state.is_final {
                break;
            }
            let budget_left = counted < self.action_budget;
            let eligible: Vec<&Entry> = state
                .entries
                .iter()
                .filter(|e| budget_left || !e.counted)
                .collect();
            let weights: Vec<u32> = eligible.iter().map(|e| e.weight).collect();
            let entry = eligible[mgr.rng_mut().pick_weighted(&weights)];

            if !entry.action.enabled(mgr) {
                stalled += 1;
                assert!(
                    stalled < MAX_STALLED_SAMPLES,
                    "state `{}` stalled: no enabled action",
                    state.name
                );
                continue;
            }

            if mgr.trace_seeds {
                // One fresh seed per dispatch; the action's own trace line
                // records it, so any single action replays in isolation.
                let seed = seed_stream.pick_u64(0, u64::MAX);
                mgr.rng_mut().reseed(seed);
            }

            trace!(state = %state.name, action = entry.action.kind(), "dispatch");
            let executed = entry.action.run(mgr).map_err(|e| match e {
                SkelterError::Backend {
                    action,
                    n_actions: 0,
                    source,
                } => SkelterError::Backend {
                    action,
                    n_actions: counted,
                    source,
                },
                other => other,
            })?;
            if !executed {
                stalled += 1;
                assert!(
                    stalled < MAX_STALLED_SAMPLES,
                    "state `{}` stalled: actions keep bailing",
                    state.name
                );
                continue;
            }
            stalled = 0;
            if entry.counted {
                counted += 1;
            }
            if let Some(next) = entry.next {
                cur = next;
            }
        }
        debug!(actions = counted, "fsm finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_fsm_passes_liveness() {
        let fsm = Fsm::standard(&FuzzerConfig::default());
        assert!(fsm.check().is_ok());
    }

    #[test]
    fn test_missing_escape_fails_liveness() {
        let mut fsm = Fsm::new(10);
        let a = fsm.new_state("a");
        let b = fsm.new_state("stuck");
        let f = fsm.new_state(STATE_FINAL);
        fsm.set_init_state(a);
        fsm.set_final_state(f);
        fsm.add_transition(a, 1, f);
        // `stuck` has an entry, but it is counted, so the budget-exhausted
        // walk can never leave.
        fsm.add_action(b, Rc::new(TransitionDefault), 1, Some(f), true);
        let err = fsm.check().unwrap_err();
        assert!(err.to_string().contains("stuck"));
    }

    #[test]
    fn test_registry_covers_all_kinds() {
        let fsm = Fsm::standard(&FuzzerConfig::default());
        let registry = fsm.action_registry();
        for kind in [
            "new",
            "delete",
            "set_opt",
            "mk_sort",
            "mk_const",
            "mk_var",
            "mk_value",
            "mk_special_value",
            "mk_term",
            "assert",
            "push",
            "pop",
            "reset_assertions",
            "check_sat",
            "check_sat_assuming",
            "get_unsat_assumptions",
            "get_value",
            "print_model",
        ] {
            assert!(registry.contains_key(kind), "missing action `{kind}`");
        }
    }
}
