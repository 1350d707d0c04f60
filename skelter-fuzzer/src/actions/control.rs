//! Assertion-Context Actions.

use skelter_core::theory::SortKind;

use crate::error::Result;
use crate::manager::SolverManager;

use super::{Action, TracedObject, backend_err, expect_args, term_arg, u32_arg};

/// Largest number of levels pushed at once.
const MAX_PUSH_LEVELS: u32 = 3;

/// Assert a random closed Boolean term.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionAssert;

impl Action for ActionAssert {
    fn kind(&self) -> &'static str {
        "assert"
    }

    fn enabled(&self, mgr: &SolverManager) -> bool {
        mgr.solver().is_initialized() && mgr.has_closed_term_kind(SortKind::Bool)
    }

    fn run(&self, mgr: &mut SolverManager) -> Result<bool> {
        let term = mgr.pick_closed_term_kind(SortKind::Bool);
        mgr.trace_line(&format!("assert {}", term.id()))?;
        mgr.trace_flush()?;
        mgr.solver_mut()
            .assert_formula(&term)
            .map_err(|e| backend_err(self.kind(), e))?;
        mgr.reset_sat();
        Ok(true)
    }

    fn untrace(&self, mgr: &mut SolverManager, tokens: &[String]) -> Result<Option<TracedObject>> {
        expect_args(self.kind(), tokens, 1)?;
        let term = term_arg(mgr, &tokens[0])?;
        mgr.solver_mut()
            .assert_formula(&term)
            .map_err(|e| backend_err(self.kind(), e))?;
        mgr.reset_sat();
        Ok(None)
    }
}

/// Push a random number of assertion levels.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionPush;

impl Action for ActionPush {
    fn kind(&self) -> &'static str {
        "push"
    }

    fn enabled(&self, mgr: &SolverManager) -> bool {
        mgr.solver().is_initialized() && mgr.incremental && !mgr.term_db().in_binder()
    }

    fn run(&self, mgr: &mut SolverManager) -> Result<bool> {
        let n = mgr.rng_mut().pick_u32(1, MAX_PUSH_LEVELS);
        mgr.trace_line(&format!("push {n}"))?;
        mgr.trace_flush()?;
        mgr.solver_mut()
            .push(n)
            .map_err(|e| backend_err(self.kind(), e))?;
        mgr.on_push(n);
        mgr.reset_sat();
        Ok(true)
    }

    fn untrace(&self, mgr: &mut SolverManager, tokens: &[String]) -> Result<Option<TracedObject>> {
        expect_args(self.kind(), tokens, 1)?;
        let n = u32_arg(&tokens[0])?;
        mgr.solver_mut()
            .push(n)
            .map_err(|e| backend_err(self.kind(), e))?;
        mgr.on_push(n);
        mgr.reset_sat();
        Ok(None)
    }
}

/// Pop up to the number of currently pushed levels, evicting the terms the
/// popped scopes defined.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionPop;

impl Action for ActionPop {
    fn kind(&self) -> &'static str {
        "pop"
    }

    fn enabled(&self, mgr: &SolverManager) -> bool {
        mgr.solver().is_initialized()
            && mgr.incremental
            && mgr.n_push_levels() > 0
            && !mgr.term_db().in_binder()
    }

    fn run(&self, mgr: &mut SolverManager) -> Result<bool> {
        let n_push_levels = mgr.n_push_levels();
        let n = mgr.rng_mut().pick_u32(1, n_push_levels);
        mgr.trace_line(&format!("pop {n}"))?;
        mgr.trace_flush()?;
        mgr.solver_mut()
            .pop(n)
            .map_err(|e| backend_err(self.kind(), e))?;
        mgr.on_pop(n);
        mgr.reset_sat();
        Ok(true)
    }

    fn untrace(&self, mgr: &mut SolverManager, tokens: &[String]) -> Result<Option<TracedObject>> {
        expect_args(self.kind(), tokens, 1)?;
        let n = u32_arg(&tokens[0])?;
        mgr.solver_mut()
            .pop(n)
            .map_err(|e| backend_err(self.kind(), e))?;
        mgr.on_pop(n);
        mgr.reset_sat();
        Ok(None)
    }
}

/// Remove all assertions and pop every pushed scope. Only offered when the
/// backend advertises support.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionResetAssertions;

impl ActionResetAssertions {
    fn sync(mgr: &mut SolverManager) {
        let n = mgr.n_push_levels();
        if n > 0 {
            mgr.on_pop(n);
        }
        mgr.reset_sat();
    }
}

impl Action for ActionResetAssertions {
    fn kind(&self) -> &'static str {
        "reset_assertions"
    }

    fn enabled(&self, mgr: &SolverManager) -> bool {
        mgr.solver().is_initialized()
            && mgr.solver().supports_reset_assertions()
            && !mgr.term_db().in_binder()
    }

    fn run(&self, mgr: &mut SolverManager) -> Result<bool> {
        mgr.trace_line("reset_assertions")?;
        mgr.trace_flush()?;
        mgr.solver_mut()
            .reset_assertions()
            .map_err(|e| backend_err(self.kind(), e))?;
        Self::sync(mgr);
        Ok(true)
    }

    fn untrace(&self, mgr: &mut SolverManager, tokens: &[String]) -> Result<Option<TracedObject>> {
        expect_args(self.kind(), tokens, 0)?;
        mgr.solver_mut()
            .reset_assertions()
            .map_err(|e| backend_err(self.kind(), e))?;
        Self::sync(mgr);
        Ok(None)
    }
}
