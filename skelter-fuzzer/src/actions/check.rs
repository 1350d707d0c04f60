//! Solving and Model Queries.

use tracing::debug;

use skelter_core::term::Term;
use skelter_core::theory::SortKind;

use crate::error::Result;
use crate::manager::SolverManager;
use crate::solver::SatResult;

use super::{Action, TracedObject, backend_err, expect_args, term_arg};

/// Largest number of assumptions passed to one `check_sat_assuming` and of
/// terms queried by one `get_value`.
const MAX_BATCH: u32 = 5;

/// Check satisfiability of the current assertion stack.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionCheckSat;

impl Action for ActionCheckSat {
    fn kind(&self) -> &'static str {
        "check_sat"
    }

    fn enabled(&self, mgr: &SolverManager) -> bool {
        mgr.solver().is_initialized() && (!mgr.sat_called || mgr.incremental)
    }

    fn run(&self, mgr: &mut SolverManager) -> Result<bool> {
        mgr.trace_line("check_sat")?;
        mgr.trace_flush()?;
        mgr.clear_assumptions();
        let result = mgr
            .solver_mut()
            .check_sat()
            .map_err(|e| backend_err(self.kind(), e))?;
        debug!(%result, "check_sat");
        mgr.report_sat(result);
        Ok(true)
    }

    fn untrace(&self, mgr: &mut SolverManager, tokens: &[String]) -> Result<Option<TracedObject>> {
        expect_args(self.kind(), tokens, 0)?;
        mgr.clear_assumptions();
        let result = mgr
            .solver_mut()
            .check_sat()
            .map_err(|e| backend_err(self.kind(), e))?;
        mgr.report_sat(result);
        Ok(None)
    }
}

/// Check satisfiability under freshly picked Boolean assumptions; the
/// assumption batch replaces the previously recorded one.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionCheckSatAssuming;

impl Action for ActionCheckSatAssuming {
    fn kind(&self) -> &'static str {
        "check_sat_assuming"
    }

    fn enabled(&self, mgr: &SolverManager) -> bool {
        mgr.solver().is_initialized()
            && mgr.incremental
            && mgr.has_closed_term_kind(SortKind::Bool)
    }

    fn run(&self, mgr: &mut SolverManager) -> Result<bool> {
        let n = mgr.rng_mut().pick_u32(1, MAX_BATCH);
        let assumptions: Vec<Term> = (0..n)
            .map(|_| mgr.pick_closed_term_kind(SortKind::Bool))
            .collect();
        let mut line = "check_sat_assuming".to_string();
        for t in &assumptions {
            line.push_str(&format!(" {}", t.id()));
        }
        mgr.trace_line(&line)?;
        mgr.trace_flush()?;
        mgr.clear_assumptions();
        let result = mgr
            .solver_mut()
            .check_sat_assuming(&assumptions)
            .map_err(|e| backend_err(self.kind(), e))?;
        debug!(%result, n_assumptions = assumptions.len(), "check_sat_assuming");
        for t in assumptions {
            mgr.add_assumption(t);
        }
        mgr.report_sat(result);
        Ok(true)
    }

    fn untrace(&self, mgr: &mut SolverManager, tokens: &[String]) -> Result<Option<TracedObject>> {
        if tokens.is_empty() {
            return Err(super::untrace_err("check_sat_assuming without assumptions"));
        }
        let assumptions: Vec<Term> = tokens
            .iter()
            .map(|t| term_arg(mgr, t))
            .collect::<Result<_>>()?;
        mgr.clear_assumptions();
        let result = mgr
            .solver_mut()
            .check_sat_assuming(&assumptions)
            .map_err(|e| backend_err(self.kind(), e))?;
        for t in assumptions {
            mgr.add_assumption(t);
        }
        mgr.report_sat(result);
        Ok(None)
    }
}

/// Query the failed assumptions of an unsat `check_sat_assuming`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionGetUnsatAssumptions;

impl Action for ActionGetUnsatAssumptions {
    fn kind(&self) -> &'static str {
        "get_unsat_assumptions"
    }

    fn enabled(&self, mgr: &SolverManager) -> bool {
        mgr.solver().is_initialized()
            && mgr.incremental
            && mgr.unsat_assumptions
            && mgr.sat_called
            && mgr.sat_result == SatResult::Unsat
            && mgr.has_assumed()
    }

    fn run(&self, mgr: &mut SolverManager) -> Result<bool> {
        mgr.trace_line("get_unsat_assumptions")?;
        mgr.trace_flush()?;
        let failed = mgr
            .solver_mut()
            .get_unsat_assumptions()
            .map_err(|e| backend_err(self.kind(), e))?;
        debug!(n_failed = failed.len(), "get_unsat_assumptions");
        Ok(true)
    }

    fn untrace(&self, mgr: &mut SolverManager, tokens: &[String]) -> Result<Option<TracedObject>> {
        expect_args(self.kind(), tokens, 0)?;
        mgr.solver_mut()
            .get_unsat_assumptions()
            .map_err(|e| backend_err(self.kind(), e))?;
        Ok(None)
    }
}

/// Query model values for a batch of closed terms after a sat result.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionGetValue;

impl Action for ActionGetValue {
    fn kind(&self) -> &'static str {
        "get_value"
    }

    fn enabled(&self, mgr: &SolverManager) -> bool {
        mgr.solver().is_initialized()
            && mgr.model_gen
            && mgr.sat_called
            && mgr.sat_result == SatResult::Sat
            && !mgr.term_db().kinds_with_closed_terms().is_empty()
    }

    fn run(&self, mgr: &mut SolverManager) -> Result<bool> {
        let kinds = mgr.term_db().kinds_with_closed_terms();
        if kinds.is_empty() {
            return Ok(false);
        }
        let n = mgr.rng_mut().pick_u32(1, MAX_BATCH);
        let terms: Vec<Term> = (0..n)
            .map(|_| {
                let kind = *mgr.rng_mut().choose(&kinds);
                mgr.pick_closed_term_kind(kind)
            })
            .collect();
        let mut line = "get_value".to_string();
        for t in &terms {
            line.push_str(&format!(" {}", t.id()));
        }
        mgr.trace_line(&line)?;
        mgr.trace_flush()?;
        let values = mgr
            .solver_mut()
            .get_value(&terms)
            .map_err(|e| backend_err(self.kind(), e))?;
        debug!(n_values = values.len(), "get_value");
        Ok(true)
    }

    fn untrace(&self, mgr: &mut SolverManager, tokens: &[String]) -> Result<Option<TracedObject>> {
        if tokens.is_empty() {
            return Err(super::untrace_err("get_value without terms"));
        }
        let terms: Vec<Term> = tokens
            .iter()
            .map(|t| term_arg(mgr, t))
            .collect::<Result<_>>()?;
        mgr.solver_mut()
            .get_value(&terms)
            .map_err(|e| backend_err(self.kind(), e))?;
        Ok(None)
    }
}

/// Render the backend's model after a sat result.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionPrintModel;

impl Action for ActionPrintModel {
    fn kind(&self) -> &'static str {
        "print_model"
    }

    fn enabled(&self, mgr: &SolverManager) -> bool {
        mgr.solver().is_initialized()
            && mgr.model_gen
            && mgr.sat_called
            && mgr.sat_result == SatResult::Sat
    }

    fn run(&self, mgr: &mut SolverManager) -> Result<bool> {
        mgr.trace_line("print_model")?;
        mgr.trace_flush()?;
        let model = mgr
            .solver_mut()
            .print_model()
            .map_err(|e| backend_err(self.kind(), e))?;
        debug!(model = %model, "print_model");
        Ok(true)
    }

    fn untrace(&self, mgr: &mut SolverManager, tokens: &[String]) -> Result<Option<TracedObject>> {
        expect_args(self.kind(), tokens, 0)?;
        mgr.solver_mut()
            .print_model()
            .map_err(|e| backend_err(self.kind(), e))?;
        Ok(None)
    }
}
