//! Actions: the Units of Generation.
//!
//! One action = one backend API call, with its argument sampling, its trace
//! line, and the inverse `untrace` that re-executes the call from tokenized
//! trace arguments. `enabled` is the cheap precondition the FSM consults
//! before dispatch; `run` may still bail with `Ok(false)` when a deeper
//! sampling requirement turns out unmet, in which case the FSM samples
//! another action.
//!
//! Every action traces its line and flushes *before* touching the backend,
//! so a crash leaves the offending call as the last line of the trace.

mod check;
mod control;
mod inputs;
mod lifecycle;
mod sorts;
mod terms;
mod transition;

pub use check::{
    ActionCheckSat, ActionCheckSatAssuming, ActionGetUnsatAssumptions, ActionGetValue,
    ActionPrintModel,
};
pub use control::{ActionAssert, ActionPop, ActionPush, ActionResetAssertions};
pub use inputs::{ActionMkConst, ActionMkSpecialValue, ActionMkValue, ActionMkVar};
pub use lifecycle::{ActionDelete, ActionNew, ActionSetOpt};
pub use sorts::ActionMkSort;
pub use terms::{ActionMkTerm, ActionTermGetSort};
pub use transition::TransitionDefault;

use skelter_core::sort::Sort;
use skelter_core::term::Term;

use crate::error::{Result, SkelterError};
use crate::manager::SolverManager;
use crate::solver::SolverError;

/// An object created by a replayed action, to be bound to the id of the
/// following `return` line.
#[derive(Debug, Clone)]
pub enum TracedObject {
    /// A created sort.
    Sort(Sort),
    /// A created term.
    Term(Term),
}

/// A unit of generation.
pub trait Action {
    /// Stable trace tag.
    fn kind(&self) -> &'static str;

    /// Cheap precondition; the FSM skips disabled actions.
    fn enabled(&self, _mgr: &SolverManager) -> bool {
        true
    }

    /// Sample arguments, trace, and perform the backend call. `Ok(false)`
    /// means the action could not find suitable arguments and did nothing.
    fn run(&self, mgr: &mut SolverManager) -> Result<bool>;

    /// Re-execute the call from tokenized trace arguments; returns the
    /// created object, if any.
    fn untrace(&self, mgr: &mut SolverManager, tokens: &[String]) -> Result<Option<TracedObject>>;
}

/// Wrap a backend failure; the FSM fills in the action count.
pub(crate) fn backend_err(kind: &'static str, source: SolverError) -> SkelterError {
    SkelterError::Backend {
        action: kind.to_string(),
        n_actions: 0,
        source,
    }
}

/// An untrace parse error; the untracer fills in the line number.
pub(crate) fn untrace_err(message: impl Into<String>) -> SkelterError {
    SkelterError::untrace(0, message)
}

/// Require an exact argument count.
pub(crate) fn expect_args(kind: &str, tokens: &[String], n: usize) -> Result<()> {
    if tokens.len() == n {
        Ok(())
    } else {
        Err(untrace_err(format!(
            "{kind} expects {n} arguments, got {}",
            tokens.len()
        )))
    }
}

/// Resolve a `sN` token to the replay's sort.
pub(crate) fn sort_arg(mgr: &SolverManager, token: &str) -> Result<Sort> {
    let id = crate::trace::parse_sort_ref(token)
        .ok_or_else(|| untrace_err(format!("malformed sort id `{token}`")))?;
    mgr.untraced_sort(id)
}

/// Resolve a `tN` token to the replay's term.
pub(crate) fn term_arg(mgr: &SolverManager, token: &str) -> Result<Term> {
    let id = crate::trace::parse_term_ref(token)
        .ok_or_else(|| untrace_err(format!("malformed term id `{token}`")))?;
    mgr.untraced_term(id)
}

/// Parse an unsigned numeral token.
pub(crate) fn u32_arg(token: &str) -> Result<u32> {
    token
        .parse()
        .map_err(|_| untrace_err(format!("malformed numeral `{token}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_args() {
        let tokens = vec!["a".to_string(), "b".to_string()];
        assert!(expect_args("x", &tokens, 2).is_ok());
        assert!(expect_args("x", &tokens, 3).is_err());
    }

    #[test]
    fn test_u32_arg() {
        assert_eq!(u32_arg("17").unwrap(), 17);
        assert!(u32_arg("s1").is_err());
        assert!(u32_arg("-3").is_err());
    }
}
