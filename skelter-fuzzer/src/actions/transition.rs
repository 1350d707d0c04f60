//! The empty transition action.

use crate::error::Result;
use crate::manager::SolverManager;

use super::{Action, TracedObject};

/// Advances the FSM to the entry's successor state without touching the
/// backend or the trace. Always internal, always enabled; every state's
/// escape hatch.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransitionDefault;

impl Action for TransitionDefault {
    fn kind(&self) -> &'static str {
        "t_default"
    }

    fn run(&self, _mgr: &mut SolverManager) -> Result<bool> {
        Ok(true)
    }

    fn untrace(&self, _mgr: &mut SolverManager, _tokens: &[String]) -> Result<Option<TracedObject>> {
        // Transitions never appear in traces.
        Ok(None)
    }
}
