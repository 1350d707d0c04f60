//! Solver Manager.
//!
//! The one object actions see. Owns the RNG, the tracer, the sort and term
//! databases, the operator catalog, the option registry and the active
//! backend, and exposes the sampling primitives actions consume. Every
//! `pick_*` that has a `has_*` counterpart requires it; violating that is a
//! generator bug and aborts.

use std::io::Write;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use skelter_core::op::{Arity, Op, OpCatalog, OpKind, OpKindSet};
use skelter_core::rng::SeededRng;
use skelter_core::sort::{BackendSort, Sort, SortId};
use skelter_core::term::{BackendTerm, SpecialValueKind, Term, TermId, TermKind};
use skelter_core::theory::{SortKind, SortKindSet, Theory, TheorySet, sort_kinds_of};

use crate::config::FuzzerConfig;
use crate::error::{Result, SkelterError};
use crate::options::OptionRegistry;
use crate::solver::{SatResult, Solver};
use crate::sort_db::SortDb;
use crate::term_db::TermDb;
use crate::trace::Tracer;

/// Creation counters, kept across `clear`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    /// Values and constants created.
    pub inputs: u64,
    /// Quantifier variables created.
    pub vars: u64,
    /// All terms created, inputs included.
    pub terms: u64,
    /// All sorts created.
    pub sorts: u64,
}

/// The solver manager.
pub struct SolverManager {
    solver: Box<dyn Solver>,
    rng: SeededRng,
    tracer: Tracer,
    catalog: OpCatalog,
    options: OptionRegistry,

    enabled_theories: TheorySet,
    enabled_sort_kinds: SortKindSet,
    enabled_ops: Vec<OpKind>,
    unsupported_ops: OpKindSet,
    unsupported_var_sorts: SortKindSet,
    unsupported_array_index_sorts: SortKindSet,
    unsupported_array_element_sorts: SortKindSet,
    unsupported_fun_domain_sorts: SortKindSet,

    sort_db: SortDb,
    term_db: TermDb,

    // Config; never touched by clear/reset.
    /// Treat Int as a subtype of Real when sampling arithmetic arguments.
    pub arith_subtyping: bool,
    /// Restrict multiplication to the linear fragment.
    pub arith_linear: bool,
    /// Emit a `set-seed` line before every action.
    pub trace_seeds: bool,
    /// Mint `_sN` symbols instead of random names.
    pub simple_symbols: bool,

    // Solver state; reset() returns all of this to its initial value.
    used_options: FxHashSet<String>,
    /// True if incremental solving has been enabled via options.
    pub incremental: bool,
    /// True if model production has been enabled via options.
    pub model_gen: bool,
    /// True if unsat-assumption production has been enabled via options.
    pub unsat_assumptions: bool,
    /// True if unsat-core production has been enabled via options.
    pub unsat_cores: bool,
    /// True while the last sat result is still valid (nothing asserted or
    /// assumed since).
    pub sat_called: bool,
    /// Result of the last sat call.
    pub sat_result: SatResult,
    n_sat_calls: u32,
    n_push_levels: u32,
    assumptions: Vec<Term>,

    n_sorts: u64,
    n_terms: u64,
    n_symbols: u64,
    n_sort_terms: FxHashMap<SortKind, u64>,
    stats: Stats,

    untraced_sorts: FxHashMap<u64, Sort>,
    untraced_terms: FxHashMap<u64, Term>,
}

impl std::fmt::Debug for SolverManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverManager")
            .field("backend", &self.solver.name())
            .field("enabled_theories", &self.enabled_theories)
            .field("n_sorts", &self.n_sorts)
            .field("n_terms", &self.n_terms)
            .finish_non_exhaustive()
    }
}

impl SolverManager {
    /// Wire a backend to a fresh manager.
    ///
    /// Intersects the requested theories with the backend's supported set
    /// (Bool is always kept), collects the backend's operator and option
    /// registrations, and caches its sort-kind restrictions.
    pub fn new(
        solver: Box<dyn Solver>,
        config: &FuzzerConfig,
        trace_out: Box<dyn Write>,
    ) -> Result<Self> {
        let mut catalog = OpCatalog::builtin();
        solver.configure_ops(&mut catalog);

        let mut options = OptionRegistry::new();
        solver.configure_options(&mut options);

        let supported: TheorySet = solver.supported_theories().into_iter().collect();
        let mut enabled_theories = match &config.theories {
            None => supported,
            Some(requested) => {
                if requested.is_empty() {
                    return Err(SkelterError::config("empty theory selection"));
                }
                requested.iter().copied().filter(|t| supported.contains(t)).collect()
            }
        };
        enabled_theories.insert(Theory::Bool);

        let enabled_sort_kinds = sort_kinds_of(&enabled_theories);
        let unsupported_ops = solver.unsupported_op_kinds();
        let enabled_ops = catalog
            .enabled_ops(&enabled_theories, &unsupported_ops)
            .iter()
            .map(|op| op.kind)
            .collect();

        let unsupported_var_sorts = solver.unsupported_var_sort_kinds();
        let unsupported_array_index_sorts = solver.unsupported_array_index_sort_kinds();
        let unsupported_array_element_sorts = solver.unsupported_array_element_sort_kinds();
        let unsupported_fun_domain_sorts = solver.unsupported_fun_domain_sort_kinds();

        debug!(backend = solver.name(), ?enabled_theories, "manager configured");

        Ok(Self {
            solver,
            rng: SeededRng::new(config.seed),
            tracer: Tracer::new(trace_out),
            catalog,
            options,
            enabled_theories,
            enabled_sort_kinds,
            enabled_ops,
            unsupported_ops,
            unsupported_var_sorts,
            unsupported_array_index_sorts,
            unsupported_array_element_sorts,
            unsupported_fun_domain_sorts,
            sort_db: SortDb::new(),
            term_db: TermDb::new(),
            arith_subtyping: config.arith_subtyping,
            arith_linear: config.arith_linear,
            trace_seeds: config.trace_seeds,
            simple_symbols: config.simple_symbols,
            used_options: FxHashSet::default(),
            incremental: false,
            model_gen: false,
            unsat_assumptions: false,
            unsat_cores: false,
            sat_called: false,
            sat_result: SatResult::Unknown,
            n_sat_calls: 0,
            n_push_levels: 0,
            assumptions: Vec::new(),
            n_sorts: 0,
            n_terms: 0,
            n_symbols: 0,
            n_sort_terms: FxHashMap::default(),
            stats: Stats::default(),
            untraced_sorts: FxHashMap::default(),
            untraced_terms: FxHashMap::default(),
        })
    }

    // ------------------------------------------------------------------
    // Component access.

    /// The active backend.
    #[must_use]
    pub fn solver(&self) -> &dyn Solver {
        self.solver.as_ref()
    }

    /// The active backend, mutably.
    pub fn solver_mut(&mut self) -> &mut dyn Solver {
        self.solver.as_mut()
    }

    /// The random stream.
    pub fn rng_mut(&mut self) -> &mut SeededRng {
        &mut self.rng
    }

    /// The operator catalog.
    #[must_use]
    pub fn catalog(&self) -> &OpCatalog {
        &self.catalog
    }

    /// The sort database.
    #[must_use]
    pub fn sort_db(&self) -> &SortDb {
        &self.sort_db
    }

    /// The term database.
    #[must_use]
    pub fn term_db(&self) -> &TermDb {
        &self.term_db
    }

    /// Creation counters.
    #[must_use]
    pub fn stats(&self) -> Stats {
        self.stats
    }

    // ------------------------------------------------------------------
    // Tracing.

    /// Emit one action line; in seed-per-action mode it is preceded by a
    /// `set-seed` line carrying the stream's current seed.
    pub fn trace_line(&mut self, line: &str) -> Result<()> {
        if self.trace_seeds {
            self.tracer.seed(self.rng.seed())?;
        }
        self.tracer.line(line)
    }

    /// Emit the `return` line of a created sort.
    pub fn trace_ret_sort(&mut self, id: SortId) -> Result<()> {
        self.tracer.ret_sort(id)
    }

    /// Emit the `return` line of a created term.
    pub fn trace_ret_term(&mut self, id: TermId) -> Result<()> {
        self.tracer.ret_term(id)
    }

    /// Flush the trace; actions call this before every backend call.
    pub fn trace_flush(&mut self) -> Result<()> {
        self.tracer.flush()
    }

    // ------------------------------------------------------------------
    // Theories and sort kinds.

    /// The enabled theories.
    #[must_use]
    pub fn enabled_theories(&self) -> &TheorySet {
        &self.enabled_theories
    }

    /// True if a theory is enabled.
    #[must_use]
    pub fn theory_enabled(&self, theory: Theory) -> bool {
        self.enabled_theories.contains(&theory)
    }

    /// Remove a theory from the enabled set.
    pub fn disable_theory(&mut self, theory: Theory) {
        self.enabled_theories.remove(&theory);
        self.enabled_sort_kinds = sort_kinds_of(&self.enabled_theories);
        self.enabled_ops = self
            .catalog
            .enabled_ops(&self.enabled_theories, &self.unsupported_ops)
            .iter()
            .map(|op| op.kind)
            .collect();
    }

    /// True if any theory qualifies; `with_terms` additionally requires a
    /// live term whose sort kind belongs to the theory.
    #[must_use]
    pub fn has_theory(&self, with_terms: bool) -> bool {
        if !with_terms {
            return !self.enabled_theories.is_empty();
        }
        self.enabled_theories
            .iter()
            .any(|t| t.sort_kinds().iter().any(|&k| self.term_db.has_term_kind(k)))
    }

    /// Pick an enabled theory; `with_terms` restricts to theories with live
    /// terms. Requires [`SolverManager::has_theory`].
    pub fn pick_theory(&mut self, with_terms: bool) -> Theory {
        let mut theories: Vec<Theory> = self
            .enabled_theories
            .iter()
            .copied()
            .filter(|t| {
                !with_terms || t.sort_kinds().iter().any(|&k| self.term_db.has_term_kind(k))
            })
            .collect();
        assert!(!theories.is_empty(), "pick_theory without qualifying theory");
        theories.sort();
        *self.rng.choose(&theories)
    }

    /// The sort kinds of the enabled theories.
    #[must_use]
    pub fn enabled_sort_kinds(&self) -> &SortKindSet {
        &self.enabled_sort_kinds
    }

    /// Enabled sort kinds, in registry order.
    #[must_use]
    pub fn enabled_sort_kinds_sorted(&self) -> Vec<SortKind> {
        let mut kinds: Vec<SortKind> = self.enabled_sort_kinds.iter().copied().collect();
        kinds.sort();
        kinds
    }

    /// Sort kinds that may carry quantifier variables.
    #[must_use]
    pub fn var_sort_kinds(&self) -> Vec<SortKind> {
        self.enabled_sort_kinds_sorted()
            .into_iter()
            .filter(|k| !self.unsupported_var_sorts.contains(k))
            .collect()
    }

    /// Sort kinds the backend accepts as array indices.
    #[must_use]
    pub fn array_index_excluded(&self) -> &SortKindSet {
        &self.unsupported_array_index_sorts
    }

    /// Sort kinds the backend rejects as array elements.
    #[must_use]
    pub fn array_element_excluded(&self) -> &SortKindSet {
        &self.unsupported_array_element_sorts
    }

    /// Sort kinds the backend rejects in function domains.
    #[must_use]
    pub fn fun_domain_excluded(&self) -> &SortKindSet {
        &self.unsupported_fun_domain_sorts
    }

    // ------------------------------------------------------------------
    // Sorts.

    /// Register a sort created by the backend; returns the canonical
    /// instance (an existing sort if the backend considers them equal).
    pub fn add_sort(&mut self, backend: BackendSort, kind: SortKind, children: Vec<Sort>) -> Sort {
        let probe = Sort::unregistered(kind, children, backend);
        if let Some(existing) = self.sort_db.find(&probe) {
            return existing;
        }
        self.n_sorts += 1;
        self.stats.sorts += 1;
        let sort = probe.with_id(SortId::new(self.n_sorts));
        self.sort_db.insert(sort.clone());
        sort
    }

    /// Map a backend-returned sort of a known kind to its canonical
    /// registered instance, registering it if it is new.
    pub fn resolve_sort(&mut self, backend: BackendSort, kind: SortKind) -> Sort {
        self.add_sort(backend, kind, Vec::new())
    }

    /// The registered instance equal to `probe`, or `probe` itself.
    #[must_use]
    pub fn find_sort(&self, probe: Sort) -> Sort {
        self.sort_db.find(&probe).unwrap_or(probe)
    }

    /// True if any sort exists.
    #[must_use]
    pub fn has_sort(&self) -> bool {
        !self.sort_db.is_empty()
    }

    /// True if a sort of the kind exists.
    #[must_use]
    pub fn has_sort_kind(&self, kind: SortKind) -> bool {
        self.sort_db.has_kind(kind)
    }

    /// True if a bit-vector sort of the width exists.
    #[must_use]
    pub fn has_sort_bv(&self, width: u32, with_terms: bool) -> bool {
        self.sort_db
            .has_bv_where(width, |s| !with_terms || self.term_db.has_term_sort(s))
    }

    /// True if a bit-vector sort of width `<= max_width` exists.
    #[must_use]
    pub fn has_sort_bv_max(&self, max_width: u32, with_terms: bool) -> bool {
        self.sort_db
            .has_bv_max_where(max_width, |s| !with_terms || self.term_db.has_term_sort(s))
    }

    /// Pick any sort.
    pub fn pick_sort(&mut self) -> Sort {
        self.sort_db.pick(&mut self.rng)
    }

    /// Pick a sort of the kind; `with_terms` restricts to sorts that have
    /// terms.
    pub fn pick_sort_kind(&mut self, kind: SortKind, with_terms: bool) -> Option<Sort> {
        let term_db = &self.term_db;
        self.sort_db.pick_kind_where(&mut self.rng, kind, |s| {
            !with_terms || term_db.has_term_sort(s)
        })
    }

    /// Pick a sort excluding the given kinds.
    pub fn pick_sort_excluding(&mut self, exclude: &SortKindSet, with_terms: bool) -> Option<Sort> {
        let term_db = &self.term_db;
        self.sort_db.pick_excluding_where(&mut self.rng, exclude, |s| {
            !with_terms || term_db.has_term_sort(s)
        })
    }

    /// Pick a bit-vector sort of the width.
    pub fn pick_sort_bv(&mut self, width: u32, with_terms: bool) -> Option<Sort> {
        let term_db = &self.term_db;
        self.sort_db.pick_bv_where(&mut self.rng, width, |s| {
            !with_terms || term_db.has_term_sort(s)
        })
    }

    /// Pick a bit-vector sort of width `<= max_width`.
    pub fn pick_sort_bv_max(&mut self, max_width: u32, with_terms: bool) -> Option<Sort> {
        let term_db = &self.term_db;
        self.sort_db.pick_bv_max_where(&mut self.rng, max_width, |s| {
            !with_terms || term_db.has_term_sort(s)
        })
    }

    /// Pick an existing sort kind; `with_terms` restricts to kinds that
    /// currently have terms.
    pub fn pick_existing_sort_kind(&mut self, with_terms: bool) -> Option<SortKind> {
        let kinds: Vec<SortKind> = if with_terms {
            self.term_db.kinds_with_terms()
        } else {
            self.sort_db.kinds()
        };
        if kinds.is_empty() {
            None
        } else {
            Some(*self.rng.choose(&kinds))
        }
    }

    // ------------------------------------------------------------------
    // Terms.

    fn fresh_term_id(&mut self) -> TermId {
        self.n_terms += 1;
        TermId::new(self.n_terms)
    }

    fn bump_sort_terms(&mut self, kind: SortKind) {
        *self.n_sort_terms.entry(kind).or_insert(0) += 1;
        self.stats.terms += 1;
    }

    /// Register a value term; returns the canonical instance.
    pub fn add_value(&mut self, backend: BackendTerm, sort: Sort) -> Term {
        let probe = Term::leaf(TermId::UNREGISTERED, sort.clone(), TermKind::Value, backend);
        if let Some(existing) = self.term_db.find(&probe) {
            return existing;
        }
        let id = self.fresh_term_id();
        let term = probe.with_id(id);
        self.term_db.register_value(term.clone(), self.term_db.cur_level());
        self.bump_sort_terms(sort.kind());
        self.stats.inputs += 1;
        term
    }

    /// Register a special-value term; returns the canonical instance.
    pub fn add_special_value(
        &mut self,
        backend: BackendTerm,
        sort: Sort,
        value: SpecialValueKind,
    ) -> Term {
        let probe = Term::special(TermId::UNREGISTERED, sort.clone(), value, backend);
        if let Some(existing) = self.term_db.find(&probe) {
            return existing;
        }
        let id = self.fresh_term_id();
        let term = probe.with_id(id);
        self.term_db.register_value(term.clone(), self.term_db.cur_level());
        self.bump_sort_terms(sort.kind());
        self.stats.inputs += 1;
        term
    }

    /// Register a length-1 string value in the character pool.
    pub fn add_string_char_value(&mut self, term: &Term) {
        self.term_db.register_string_char(term);
    }

    /// Register a constant; returns the canonical instance.
    pub fn add_input(&mut self, backend: BackendTerm, sort: Sort) -> Term {
        let probe = Term::leaf(TermId::UNREGISTERED, sort.clone(), TermKind::Const, backend);
        if let Some(existing) = self.term_db.find(&probe) {
            return existing;
        }
        let id = self.fresh_term_id();
        let term = probe.with_id(id);
        self.term_db.register(term.clone(), self.term_db.cur_level());
        self.bump_sort_terms(sort.kind());
        self.stats.inputs += 1;
        term
    }

    /// Register a quantifier variable, opening its binder level.
    pub fn add_var(&mut self, backend: BackendTerm, sort: Sort) -> Term {
        let id = self.fresh_term_id();
        let term = Term::leaf(id, sort.clone(), TermKind::Var, backend);
        self.term_db.open_binder(term.clone());
        self.bump_sort_terms(sort.kind());
        self.stats.vars += 1;
        term
    }

    /// Register an operator application; returns the canonical instance.
    ///
    /// The defining level is the maximum of the argument levels, so the term
    /// is evicted exactly when its deepest argument is.
    pub fn add_term(&mut self, backend: BackendTerm, sort: Sort, op: OpKind, args: Vec<Term>) -> Term {
        let level = args
            .iter()
            .filter_map(|a| self.term_db.level_of(a))
            .max()
            .unwrap_or(0);
        self.add_term_at(backend, sort, op, args, level)
    }

    /// Register an operator application at an explicit level. Used for
    /// quantified terms, whose binder-level arguments are already evicted
    /// when the term is created.
    pub fn add_term_at(
        &mut self,
        backend: BackendTerm,
        sort: Sort,
        op: OpKind,
        args: Vec<Term>,
        level: usize,
    ) -> Term {
        let probe = Term::app(TermId::UNREGISTERED, sort.clone(), op, args, backend);
        if let Some(existing) = self.term_db.find(&probe) {
            return existing;
        }
        let id = self.fresh_term_id();
        let term = probe.with_id(id);
        self.term_db.register(term.clone(), level);
        self.bump_sort_terms(sort.kind());
        term
    }

    /// Close the top binder level (used by quantifier construction);
    /// returns its variable.
    pub fn close_binder(&mut self) -> Term {
        self.term_db.close_binder()
    }

    /// The live instance equal to `probe`, if any (used to re-wrap
    /// backend-returned terms).
    #[must_use]
    pub fn find_term(&self, probe: &Term) -> Option<Term> {
        self.term_db.find(probe)
    }

    /// True if any term exists.
    #[must_use]
    pub fn has_term(&self) -> bool {
        self.term_db.has_term()
    }

    /// True if a term of the kind exists.
    #[must_use]
    pub fn has_term_kind(&self, kind: SortKind) -> bool {
        self.term_db.has_term_kind(kind)
    }

    /// True if a term of the sort exists.
    #[must_use]
    pub fn has_term_sort(&self, sort: &Sort) -> bool {
        self.term_db.has_term_sort(sort)
    }

    /// True if a closed term of the kind exists (below any open binder).
    #[must_use]
    pub fn has_closed_term_kind(&self, kind: SortKind) -> bool {
        self.term_db.has_closed_term_kind(kind)
    }

    /// Pick any term.
    pub fn pick_term(&mut self) -> Term {
        self.term_db.pick_term(&mut self.rng)
    }

    /// Pick a term of the kind.
    pub fn pick_term_kind(&mut self, kind: SortKind) -> Term {
        self.term_db.pick_term_kind(&mut self.rng, kind)
    }

    /// Pick a term of the sort.
    pub fn pick_term_sort(&mut self, sort: &Sort) -> Term {
        self.term_db.pick_term_sort(&mut self.rng, sort)
    }

    /// Pick a closed term of the kind.
    pub fn pick_closed_term_kind(&mut self, kind: SortKind) -> Term {
        self.term_db.pick_closed_term_kind(&mut self.rng, kind)
    }

    /// Pick a closed term of the sort.
    pub fn pick_closed_term_sort(&mut self, sort: &Sort) -> Term {
        self.term_db.pick_closed_term_sort(&mut self.rng, sort)
    }

    /// True if a value of the sort exists.
    #[must_use]
    pub fn has_value(&self, sort: &Sort) -> bool {
        self.term_db.has_value(sort)
    }

    /// Pick a value of the sort.
    pub fn pick_value(&mut self, sort: &Sort) -> Term {
        self.term_db.pick_value(&mut self.rng, sort)
    }

    /// True if a length-1 string value exists.
    #[must_use]
    pub fn has_string_char_value(&self) -> bool {
        self.term_db.has_string_char_value()
    }

    /// Pick a length-1 string value.
    pub fn pick_string_char_value(&mut self) -> Term {
        self.term_db.pick_string_char_value(&mut self.rng)
    }

    /// True if a quantifier variable is in scope.
    #[must_use]
    pub fn has_var(&self) -> bool {
        self.term_db.has_var()
    }

    /// Pick the current quantifier variable.
    pub fn pick_var(&mut self) -> Term {
        match self.term_db.cur_var() {
            Some(var) => var.clone(),
            None => panic!("pick_var without open binder scope"),
        }
    }

    /// True if a Boolean term is available as a quantifier matrix.
    #[must_use]
    pub fn has_quant_body(&self) -> bool {
        self.term_db.has_quant_body()
    }

    /// Pick a quantifier matrix.
    pub fn pick_quant_body(&mut self) -> Term {
        self.term_db.pick_quant_body(&mut self.rng)
    }

    // ------------------------------------------------------------------
    // Symbols.

    /// Mint a fresh symbol. Uniqueness within a trace comes from the
    /// monotonic symbol counter in both modes.
    pub fn pick_symbol(&mut self) -> String {
        let n = self.n_symbols;
        self.n_symbols += 1;
        if self.simple_symbols {
            format!("_s{n}")
        } else {
            let len = self.rng.pick_usize(1, 8);
            format!("{}{n}", self.rng.pick_string(len))
        }
    }

    // ------------------------------------------------------------------
    // Assumptions and sat state.

    /// Record an assumption passed to the current `check_sat_assuming`.
    pub fn add_assumption(&mut self, term: Term) {
        if !self.assumptions.iter().any(|t| t == &term) {
            self.assumptions.push(term);
        }
    }

    /// True if assumptions from the last `check_sat_assuming` are recorded.
    #[must_use]
    pub fn has_assumed(&self) -> bool {
        !self.assumptions.is_empty()
    }

    /// Pick one of the recorded assumptions.
    pub fn pick_assumed_assumption(&mut self) -> Term {
        assert!(!self.assumptions.is_empty(), "no assumptions recorded");
        self.rng.choose(&self.assumptions).clone()
    }

    /// True if the term was passed as an assumption to the last check.
    #[must_use]
    pub fn is_assumed(&self, term: &Term) -> bool {
        self.assumptions.iter().any(|t| t == term)
    }

    /// Drop the recorded assumptions.
    pub fn clear_assumptions(&mut self) {
        self.assumptions.clear();
    }

    /// Record a sat verdict.
    pub fn report_sat(&mut self, result: SatResult) {
        self.sat_called = true;
        self.sat_result = result;
        self.n_sat_calls += 1;
    }

    /// Invalidate the last sat verdict; called whenever an assertion or
    /// assumption context changes.
    pub fn reset_sat(&mut self) {
        self.sat_called = false;
        self.clear_assumptions();
    }

    /// Number of sat calls issued so far.
    #[must_use]
    pub fn n_sat_calls(&self) -> u32 {
        self.n_sat_calls
    }

    // ------------------------------------------------------------------
    // Scope levels.

    /// Number of currently pushed assertion levels.
    #[must_use]
    pub fn n_push_levels(&self) -> u32 {
        self.n_push_levels
    }

    /// Record a `push`.
    pub fn on_push(&mut self, n: u32) {
        self.n_push_levels += n;
        self.term_db.push_assertion_levels(n);
    }

    /// Record a `pop`, evicting the popped levels.
    pub fn on_pop(&mut self, n: u32) {
        assert!(n <= self.n_push_levels, "pop of {n} exceeds {} pushed levels", self.n_push_levels);
        self.n_push_levels -= n;
        self.term_db.pop_assertion_levels(n);
    }

    // ------------------------------------------------------------------
    // Options.

    /// True if the option was already configured this run.
    #[must_use]
    pub fn is_option_used(&self, name: &str) -> bool {
        self.used_options.contains(name)
    }

    /// Mark an option configured; it will not be picked again.
    pub fn mark_option_used(&mut self, name: &str) {
        self.used_options.insert(name.to_string());
    }

    /// Pick an option and a value for it, honoring `used_options`,
    /// dependencies and conflicts. Forcing a name or value narrows the
    /// choice. Returns `None` when nothing can be configured.
    pub fn pick_option(
        &mut self,
        name: Option<&str>,
        value: Option<&str>,
    ) -> Option<(String, String)> {
        let candidates: Vec<usize> = self
            .options
            .iter()
            .enumerate()
            .filter(|(_, opt)| {
                if self.used_options.contains(opt.name()) {
                    return false;
                }
                if let Some(forced) = name {
                    if opt.name() != forced {
                        return false;
                    }
                }
                opt.depends().iter().all(|d| self.used_options.contains(d))
                    && opt.conflicts().iter().all(|c| !self.used_options.contains(c))
            })
            .map(|(i, _)| i)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let idx = *self.rng.choose(&candidates);
        let opt = self
            .options
            .iter()
            .nth(idx)
            .unwrap_or_else(|| unreachable!());
        let picked_value = match value {
            Some(forced) => forced.to_string(),
            None => opt.pick_value(&mut self.rng),
        };
        Some((opt.name().to_string(), picked_value))
    }

    /// Re-read the FSM-relevant option flags from the backend.
    pub fn refresh_option_flags(&mut self) {
        self.incremental = self.solver.option_incremental_enabled();
        self.model_gen = self.solver.option_model_gen_enabled();
        self.unsat_assumptions = self.solver.option_unsat_assumptions_enabled();
        self.unsat_cores = self.solver.option_unsat_cores_enabled();
    }

    // ------------------------------------------------------------------
    // Operators.

    /// The schema of an operator; absence from the catalog is a bug.
    #[must_use]
    pub fn op(&self, kind: OpKind) -> &Op {
        match self.catalog.get(kind) {
            Some(op) => op,
            None => panic!("operator {kind} not in catalog"),
        }
    }

    /// Pick an enabled operator whose argument schema is realizable from
    /// the current term database. Returns `None` when no operator applies.
    pub fn pick_op_kind(&mut self) -> Option<OpKind> {
        let candidates: Vec<OpKind> = self
            .enabled_ops
            .iter()
            .copied()
            .filter(|&kind| {
                let op = match self.catalog.get(kind) {
                    Some(op) => op,
                    None => unreachable!("enabled op missing from catalog"),
                };
                self.op_realizable(op)
            })
            .collect();
        if candidates.is_empty() {
            None
        } else {
            Some(*self.rng.choose(&candidates))
        }
    }

    fn op_realizable(&self, op: &Op) -> bool {
        match op.kind {
            OpKind::Forall | OpKind::Exists => {
                self.term_db.has_var() && self.term_db.has_quant_body()
            }
            OpKind::ArraySelect => self.array_op_candidate(false),
            OpKind::ArrayStore => self.array_op_candidate(true),
            OpKind::UfApply => self.uf_apply_candidate(),
            OpKind::FpFp => self.fp_fp_candidate(),
            OpKind::ReRange => self.term_db.has_string_char_value(),
            _ => {
                let n = match op.arity {
                    Arity::Fixed(n) => n as usize,
                    Arity::Nary => 1,
                };
                (0..n).all(|i| match op.arg_kind(i) {
                    SortKind::Any => self.term_db.has_term(),
                    kind => self.term_db.has_term_kind(kind),
                })
            }
        }
    }

    /// An array sort with a live array term whose index (and, for stores,
    /// element) sort also has terms.
    #[must_use]
    pub fn array_op_candidate(&self, need_element: bool) -> bool {
        self.sort_db.iter_kind(SortKind::Array).any(|sort| {
            self.term_db.has_term_sort(sort)
                && self.term_db.has_term_sort(sort.array_index())
                && (!need_element || self.term_db.has_term_sort(sort.array_element()))
        })
    }

    fn uf_apply_candidate(&self) -> bool {
        self.sort_db.iter_kind(SortKind::Fun).any(|sort| {
            self.term_db.has_term_sort(sort)
                && sort.fun_domain().iter().all(|d| self.term_db.has_term_sort(d))
        })
    }

    fn fp_fp_candidate(&self) -> bool {
        self.sort_db.iter_kind(SortKind::Fp).any(|sort| {
            let e = sort.fp_exp_width();
            let s = sort.fp_sig_width();
            self.has_sort_bv(1, true) && self.has_sort_bv(e, true) && self.has_sort_bv(s - 1, true)
        })
    }

    /// Pick an array sort suitable for select/store instantiation.
    pub fn pick_array_op_sort(&mut self, need_element: bool) -> Option<Sort> {
        let term_db = &self.term_db;
        self.sort_db.pick_kind_where(&mut self.rng, SortKind::Array, |sort| {
            term_db.has_term_sort(sort)
                && term_db.has_term_sort(sort.array_index())
                && (!need_element || term_db.has_term_sort(sort.array_element()))
        })
    }

    /// Pick a function sort whose domain sorts all have terms.
    pub fn pick_fun_op_sort(&mut self) -> Option<Sort> {
        let term_db = &self.term_db;
        self.sort_db.pick_kind_where(&mut self.rng, SortKind::Fun, |sort| {
            term_db.has_term_sort(sort)
                && sort.fun_domain().iter().all(|d| term_db.has_term_sort(d))
        })
    }

    /// Pick an FP sort whose component bit-vector sorts have terms.
    pub fn pick_fp_fp_sort(&mut self) -> Option<Sort> {
        let candidates: Vec<Sort> = {
            let term_db = &self.term_db;
            let sort_db = &self.sort_db;
            sort_db
                .iter_kind(SortKind::Fp)
                .filter(|sort| {
                    let e = sort.fp_exp_width();
                    let s = sort.fp_sig_width();
                    sort_db.has_bv_where(1, |b| term_db.has_term_sort(b))
                        && sort_db.has_bv_where(e, |b| term_db.has_term_sort(b))
                        && sort_db.has_bv_where(s - 1, |b| term_db.has_term_sort(b))
                })
                .cloned()
                .collect()
        };
        if candidates.is_empty() {
            None
        } else {
            Some(self.rng.choose(&candidates).clone())
        }
    }

    // ------------------------------------------------------------------
    // Untrace id maps.

    /// Bind a trace id to a sort produced during replay.
    pub fn register_untraced_sort(&mut self, trace_id: u64, sort: Sort) {
        self.untraced_sorts.insert(trace_id, sort);
    }

    /// Bind a trace id to a term produced during replay.
    pub fn register_untraced_term(&mut self, trace_id: u64, term: Term) {
        self.untraced_terms.insert(trace_id, term);
    }

    /// Resolve a trace sort id.
    pub fn untraced_sort(&self, trace_id: u64) -> Result<Sort> {
        self.untraced_sorts
            .get(&trace_id)
            .cloned()
            .ok_or_else(|| SkelterError::untrace(0, format!("unknown sort id s{trace_id}")))
    }

    /// Resolve a trace term id.
    pub fn untraced_term(&self, trace_id: u64) -> Result<Term> {
        self.untraced_terms
            .get(&trace_id)
            .cloned()
            .ok_or_else(|| SkelterError::untrace(0, format!("unknown term id t{trace_id}")))
    }

    // ------------------------------------------------------------------
    // Counters and lifecycle.

    /// Number of sorts ever created.
    #[must_use]
    pub fn n_sorts(&self) -> u64 {
        self.n_sorts
    }

    /// Number of terms ever created.
    #[must_use]
    pub fn n_terms(&self) -> u64 {
        self.n_terms
    }

    /// Number of terms ever created with the given sort kind.
    #[must_use]
    pub fn n_sort_terms(&self, kind: SortKind) -> u64 {
        self.n_sort_terms.get(&kind).copied().unwrap_or(0)
    }

    /// Drop all data structures but keep configuration and id counters
    /// (ids are never reused, even across `clear`).
    pub fn clear(&mut self) {
        self.sort_db.clear();
        self.term_db.clear();
        self.assumptions.clear();
        self.untraced_sorts.clear();
        self.untraced_terms.clear();
        self.sat_called = false;
        self.sat_result = SatResult::Unknown;
        self.n_push_levels = 0;
    }

    /// Return to the initial configuration state.
    pub fn reset(&mut self) {
        self.clear();
        self.used_options.clear();
        self.incremental = false;
        self.model_gen = false;
        self.unsat_assumptions = false;
        self.unsat_cores = false;
        self.n_sat_calls = 0;
    }
}

