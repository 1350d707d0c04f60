//! Backend Capability Interface.
//!
//! Every solver backend implements [`Solver`]; the FSM, the databases and
//! the operator catalog are written once against this trait. The contract is
//! narrow on purpose: the generator is responsible for calling each method
//! only when its precondition holds, and a backend reports violations (or
//! genuine solver failures) through [`SolverError`]; those are candidate
//! findings, not generator bugs.

use std::fmt;

use skelter_core::op::{OpCatalog, OpKind, OpKindSet};
use skelter_core::sort::{BackendSort, Sort};
use skelter_core::term::{BackendTerm, SpecialValueKind, Term};
use skelter_core::theory::{SortKind, SortKindSet, Theory};

use crate::fsm::Fsm;
use crate::options::OptionRegistry;

/// Verdict of a satisfiability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SatResult {
    /// The backend could not decide.
    #[default]
    Unknown,
    /// Satisfiable.
    Sat,
    /// Unsatisfiable.
    Unsat,
}

impl fmt::Display for SatResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SatResult::Unknown => "unknown",
            SatResult::Sat => "sat",
            SatResult::Unsat => "unsat",
        };
        write!(f, "{name}")
    }
}

/// Numeral base of a string-encoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    /// Binary (`#b…`).
    Bin,
    /// Decimal.
    Dec,
    /// Hexadecimal (`#x…`).
    Hex,
}

impl Base {
    /// The radix of this base.
    #[must_use]
    pub const fn radix(self) -> u32 {
        match self {
            Base::Bin => 2,
            Base::Dec => 10,
            Base::Hex => 16,
        }
    }
}

/// An error reported by a backend.
///
/// Carries the failing call so the driver can reproduce a finding from the
/// trace position alone.
#[derive(Debug, Clone, thiserror::Error)]
#[error("backend `{backend}` failed in {call}: {message}")]
pub struct SolverError {
    /// Backend name.
    pub backend: String,
    /// The API call that failed.
    pub call: &'static str,
    /// Backend-reported message.
    pub message: String,
}

impl SolverError {
    /// Build an error for a failing call.
    #[must_use]
    pub fn new(backend: impl Into<String>, call: &'static str, message: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            call,
            message: message.into(),
        }
    }
}

/// Result alias for backend calls.
pub type SolverResult<T> = Result<T, SolverError>;

/// The capability contract a backend implements.
///
/// Extension hooks (`configure_*`) default to no-ops; capability
/// advertisement defaults to "everything supported" so a minimal backend only
/// implements the constructors and queries.
pub trait Solver {
    /// Stable backend name; also the namespace prefix for backend-private
    /// action and operator tags.
    fn name(&self) -> &'static str;

    /// Create the underlying solver instance.
    fn new_solver(&mut self);

    /// Destroy the underlying solver instance.
    fn delete_solver(&mut self);

    /// True between `new_solver` and `delete_solver`.
    fn is_initialized(&self) -> bool;

    /// Theories this backend can fuzz.
    fn supported_theories(&self) -> Vec<Theory>;

    /// Operator kinds the backend rejects even within supported theories.
    fn unsupported_op_kinds(&self) -> OpKindSet {
        OpKindSet::default()
    }

    /// Sort kinds that cannot be used for quantifier variables.
    fn unsupported_var_sort_kinds(&self) -> SortKindSet {
        [SortKind::Fun, SortKind::Reglan].into_iter().collect()
    }

    /// Sort kinds that cannot index arrays.
    fn unsupported_array_index_sort_kinds(&self) -> SortKindSet {
        [SortKind::Fun, SortKind::Reglan].into_iter().collect()
    }

    /// Sort kinds that cannot be array elements.
    fn unsupported_array_element_sort_kinds(&self) -> SortKindSet {
        [SortKind::Fun, SortKind::Reglan].into_iter().collect()
    }

    /// Sort kinds that cannot appear in function domains.
    fn unsupported_fun_domain_sort_kinds(&self) -> SortKindSet {
        [SortKind::Fun, SortKind::Reglan].into_iter().collect()
    }

    /// Whether `reset_assertions` may be issued.
    fn supports_reset_assertions(&self) -> bool {
        true
    }

    /// Splice backend-private states, actions and transitions into the FSM.
    fn configure_fsm(&self, _fsm: &mut Fsm) {}

    /// Register backend-private operators.
    fn configure_ops(&self, _catalog: &mut OpCatalog) {}

    /// Register backend options (names, shapes, dependencies, conflicts).
    fn configure_options(&self, _options: &mut OptionRegistry) {}

    /// Create an atomic sort (BOOL, INT, REAL, RM, STRING, REGLAN).
    fn mk_sort_atomic(&mut self, kind: SortKind) -> SolverResult<BackendSort>;

    /// Create a bit-vector sort of the given width (>= 1).
    fn mk_sort_bv(&mut self, width: u32) -> SolverResult<BackendSort>;

    /// Create a floating-point sort (exponent and significand widths >= 2).
    fn mk_sort_fp(&mut self, exp: u32, sig: u32) -> SolverResult<BackendSort>;

    /// Create a composite sort from child sorts (`[index, element]` for
    /// ARRAY; domains then codomain for FUN; the element sort for
    /// BAG/SEQ/SET).
    fn mk_sort_composite(&mut self, kind: SortKind, children: &[Sort]) -> SolverResult<BackendSort>;

    /// Declare a free constant.
    fn mk_const(&mut self, sort: &Sort, name: &str) -> SolverResult<BackendTerm>;

    /// Create a quantifier variable.
    fn mk_var(&mut self, sort: &Sort, name: &str) -> SolverResult<BackendTerm>;

    /// Create a Boolean value.
    fn mk_value_bool(&mut self, sort: &Sort, value: bool) -> SolverResult<BackendTerm>;

    /// Create a value from a string numeral in the given base. Non-numeric
    /// sorts (STRING, REAL) always use `Base::Dec`.
    fn mk_value_str(&mut self, sort: &Sort, value: &str, base: Base) -> SolverResult<BackendTerm>;

    /// Create a distinguished constant of the sort.
    fn mk_special_value(
        &mut self,
        sort: &Sort,
        value: SpecialValueKind,
    ) -> SolverResult<BackendTerm>;

    /// Apply an operator.
    fn mk_term(&mut self, kind: OpKind, args: &[Term], params: &[u32])
    -> SolverResult<BackendTerm>;

    /// The sort of a backend term.
    fn get_sort(&mut self, term: &BackendTerm) -> SolverResult<BackendSort>;

    /// Assert a Boolean term.
    fn assert_formula(&mut self, term: &Term) -> SolverResult<()>;

    /// Check satisfiability of the current assertion stack.
    fn check_sat(&mut self) -> SolverResult<SatResult>;

    /// Check satisfiability under the given assumptions.
    fn check_sat_assuming(&mut self, assumptions: &[Term]) -> SolverResult<SatResult>;

    /// The failed assumptions of the last unsat `check_sat_assuming`.
    fn get_unsat_assumptions(&mut self) -> SolverResult<Vec<BackendTerm>>;

    /// Model values for the given terms after a sat result.
    fn get_value(&mut self, terms: &[Term]) -> SolverResult<Vec<BackendTerm>>;

    /// Push `n` assertion levels.
    fn push(&mut self, n: u32) -> SolverResult<()>;

    /// Pop `n` assertion levels.
    fn pop(&mut self, n: u32) -> SolverResult<()>;

    /// Render the current model.
    fn print_model(&mut self) -> SolverResult<String>;

    /// Remove all assertions (only called when
    /// [`Solver::supports_reset_assertions`] holds).
    fn reset_assertions(&mut self) -> SolverResult<()>;

    /// Set a backend option. A rejected option is an `Err`; the generator
    /// drops it silently.
    fn set_opt(&mut self, name: &str, value: &str) -> SolverResult<()>;

    /// Backend name of the incremental-solving option.
    fn get_option_name_incremental(&self) -> &'static str;

    /// Backend name of the model-production option.
    fn get_option_name_model_gen(&self) -> &'static str;

    /// Backend name of the unsat-assumptions option.
    fn get_option_name_unsat_assumptions(&self) -> &'static str;

    /// Backend name of the unsat-cores option.
    fn get_option_name_unsat_cores(&self) -> &'static str;

    /// True if incremental solving is currently enabled.
    fn option_incremental_enabled(&self) -> bool;

    /// True if model production is currently enabled.
    fn option_model_gen_enabled(&self) -> bool;

    /// True if unsat-assumption production is currently enabled.
    fn option_unsat_assumptions_enabled(&self) -> bool;

    /// True if unsat-core production is currently enabled.
    fn option_unsat_cores_enabled(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_radix() {
        assert_eq!(Base::Bin.radix(), 2);
        assert_eq!(Base::Dec.radix(), 10);
        assert_eq!(Base::Hex.radix(), 16);
    }

    #[test]
    fn test_sat_result_display() {
        assert_eq!(SatResult::Sat.to_string(), "sat");
        assert_eq!(SatResult::Unsat.to_string(), "unsat");
        assert_eq!(SatResult::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_solver_error_message() {
        let err = SolverError::new("mock", "check_sat", "resource limit");
        assert!(err.to_string().contains("mock"));
        assert!(err.to_string().contains("check_sat"));
    }
}
