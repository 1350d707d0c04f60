//! Lifecycle and Option Actions.

use tracing::debug;

use crate::error::Result;
use crate::manager::SolverManager;

use super::{Action, TracedObject, expect_args};

/// Create the backend solver instance (replacing a live one).
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionNew;

impl ActionNew {
    fn apply(mgr: &mut SolverManager) {
        if mgr.solver().is_initialized() {
            mgr.solver_mut().delete_solver();
            mgr.reset();
        }
        mgr.solver_mut().new_solver();
    }
}

impl Action for ActionNew {
    fn kind(&self) -> &'static str {
        "new"
    }

    fn run(&self, mgr: &mut SolverManager) -> Result<bool> {
        mgr.trace_line("new")?;
        mgr.trace_flush()?;
        Self::apply(mgr);
        Ok(true)
    }

    fn untrace(&self, mgr: &mut SolverManager, tokens: &[String]) -> Result<Option<TracedObject>> {
        expect_args(self.kind(), tokens, 0)?;
        Self::apply(mgr);
        Ok(None)
    }
}

/// Destroy the backend solver instance and drop all generator data.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionDelete;

impl ActionDelete {
    fn apply(mgr: &mut SolverManager) {
        mgr.clear();
        mgr.solver_mut().delete_solver();
    }
}

impl Action for ActionDelete {
    fn kind(&self) -> &'static str {
        "delete"
    }

    fn enabled(&self, mgr: &SolverManager) -> bool {
        mgr.solver().is_initialized()
    }

    fn run(&self, mgr: &mut SolverManager) -> Result<bool> {
        mgr.trace_line("delete")?;
        mgr.trace_flush()?;
        Self::apply(mgr);
        Ok(true)
    }

    fn untrace(&self, mgr: &mut SolverManager, tokens: &[String]) -> Result<Option<TracedObject>> {
        expect_args(self.kind(), tokens, 0)?;
        Self::apply(mgr);
        Ok(None)
    }
}

/// Configure one backend option, respecting dependencies, conflicts and the
/// used-options set. Options the backend rejects are dropped silently but
/// still marked used.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionSetOpt;

impl ActionSetOpt {
    fn apply(mgr: &mut SolverManager, name: &str, value: &str) {
        if let Err(err) = mgr.solver_mut().set_opt(name, value) {
            debug!(option = name, %err, "option rejected by backend");
        }
        mgr.mark_option_used(name);
        mgr.refresh_option_flags();
    }
}

impl Action for ActionSetOpt {
    fn kind(&self) -> &'static str {
        "set_opt"
    }

    fn enabled(&self, mgr: &SolverManager) -> bool {
        mgr.solver().is_initialized()
    }

    fn run(&self, mgr: &mut SolverManager) -> Result<bool> {
        let Some((name, value)) = mgr.pick_option(None, None) else {
            return Ok(false);
        };
        mgr.trace_line(&format!("set_opt {name} {value}"))?;
        mgr.trace_flush()?;
        Self::apply(mgr, &name, &value);
        Ok(true)
    }

    fn untrace(&self, mgr: &mut SolverManager, tokens: &[String]) -> Result<Option<TracedObject>> {
        expect_args(self.kind(), tokens, 2)?;
        Self::apply(mgr, &tokens[0], &tokens[1]);
        Ok(None)
    }
}
