//! Manager-level unit tests, run as an integration test to avoid the
//! dev-dependency cycle between this crate and `skelter-solvers`.

use rustc_hash::FxHashSet;

use skelter_core::theory::{SortKind, Theory};
use skelter_fuzzer::config::FuzzerConfig;
use skelter_fuzzer::manager::SolverManager;
use skelter_fuzzer::solver::{SatResult, Solver};
use skelter_solvers::MockSolver;

fn mgr_with(config: FuzzerConfig) -> SolverManager {
    let mut solver = MockSolver::new();
    solver.new_solver();
    SolverManager::new(Box::new(solver), &config, Box::new(std::io::sink()))
        .expect("manager construction")
}

fn mgr() -> SolverManager {
    mgr_with(FuzzerConfig::with_seed(7))
}

#[test]
fn test_simple_symbols_are_unique_and_monotonic() {
    let mut mgr = mgr();
    assert_eq!(mgr.pick_symbol(), "_s0");
    assert_eq!(mgr.pick_symbol(), "_s1");
    assert_eq!(mgr.pick_symbol(), "_s2");
}

#[test]
fn test_random_symbols_stay_unique() {
    let mut config = FuzzerConfig::with_seed(7);
    config.simple_symbols = false;
    let mut mgr = mgr_with(config);
    let mut seen = FxHashSet::default();
    for _ in 0..100 {
        assert!(seen.insert(mgr.pick_symbol()), "symbol minted twice");
    }
}

#[test]
fn test_theories_intersect_with_backend() {
    let config = FuzzerConfig::with_seed(0).with_theories([Theory::Bv, Theory::Fp]);
    let mgr = mgr_with(config);
    assert!(mgr.theory_enabled(Theory::Bv));
    assert!(mgr.theory_enabled(Theory::Fp));
    // Bool is always kept.
    assert!(mgr.theory_enabled(Theory::Bool));
    assert!(!mgr.theory_enabled(Theory::Int));
    assert!(mgr.enabled_sort_kinds().contains(&SortKind::Rm));
}

#[test]
fn test_add_sort_deduplicates_and_keeps_ids_monotonic() {
    let mut mgr = mgr();
    let b1 = mgr.solver_mut().mk_sort_bv(8).unwrap();
    let b2 = mgr.solver_mut().mk_sort_bv(8).unwrap();
    let b3 = mgr.solver_mut().mk_sort_bv(16).unwrap();

    let s1 = mgr.add_sort(b1, SortKind::Bv, vec![]);
    let s2 = mgr.add_sort(b2, SortKind::Bv, vec![]);
    let s3 = mgr.add_sort(b3, SortKind::Bv, vec![]);

    assert_eq!(s1.id(), s2.id(), "equal sorts must share one id");
    assert!(s3.id() > s1.id());
    assert_eq!(mgr.n_sorts(), 2);
}

#[test]
fn test_ids_survive_clear_without_reuse() {
    let mut mgr = mgr();
    let b = mgr.solver_mut().mk_sort_bv(8).unwrap();
    let s1 = mgr.add_sort(b, SortKind::Bv, vec![]);
    mgr.clear();
    assert!(!mgr.has_sort());
    let b = mgr.solver_mut().mk_sort_bv(8).unwrap();
    let s2 = mgr.add_sort(b, SortKind::Bv, vec![]);
    assert!(s2.id() > s1.id(), "id reused after clear");
}

#[test]
fn test_pick_option_respects_conflicts() {
    let mut mgr = mgr();
    mgr.mark_option_used("eager-bitblast");
    // The conflicting option can no longer be picked, even when forced.
    assert!(mgr.pick_option(Some("lazy-bitblast"), None).is_none());
    // An unrelated option still can.
    let (name, _) = mgr.pick_option(Some("incremental"), None).unwrap();
    assert_eq!(name, "incremental");
}

#[test]
fn test_pick_option_respects_dependencies_and_used_set() {
    let mut mgr = mgr();
    // `model-compress` depends on `produce-models`.
    assert!(mgr.pick_option(Some("model-compress"), None).is_none());
    mgr.mark_option_used("produce-models");
    assert!(mgr.pick_option(Some("model-compress"), None).is_some());

    mgr.mark_option_used("model-compress");
    assert!(mgr.pick_option(Some("model-compress"), None).is_none());
}

#[test]
fn test_pick_option_forced_value() {
    let mut mgr = mgr();
    let (name, value) = mgr.pick_option(Some("incremental"), Some("true")).unwrap();
    assert_eq!((name.as_str(), value.as_str()), ("incremental", "true"));
}

#[test]
fn test_assumption_bookkeeping() {
    let mut mgr = mgr();
    let bool_backend = mgr.solver_mut().mk_sort_atomic(SortKind::Bool).unwrap();
    let bool_sort = mgr.add_sort(bool_backend, SortKind::Bool, vec![]);
    let t_backend = mgr.solver_mut().mk_value_bool(&bool_sort, true).unwrap();
    let t = mgr.add_value(t_backend, bool_sort);

    assert!(!mgr.has_assumed());
    mgr.add_assumption(t.clone());
    mgr.add_assumption(t.clone());
    assert!(mgr.has_assumed());
    assert!(mgr.is_assumed(&t));
    assert_eq!(mgr.pick_assumed_assumption().id(), t.id());

    mgr.report_sat(SatResult::Unsat);
    assert!(mgr.sat_called);
    mgr.reset_sat();
    assert!(!mgr.sat_called);
    assert!(!mgr.has_assumed());
}

#[test]
fn test_term_registration_tracks_levels() {
    let mut mgr = mgr();
    let b = mgr.solver_mut().mk_sort_bv(8).unwrap();
    let bv8 = mgr.add_sort(b, SortKind::Bv, vec![]);
    let c = mgr.solver_mut().mk_const(&bv8, "c0").unwrap();
    let c = mgr.add_input(c, bv8.clone());

    mgr.on_push(2);
    let d = mgr.solver_mut().mk_const(&bv8, "c1").unwrap();
    let d = mgr.add_input(d, bv8.clone());
    assert_eq!(mgr.term_db().level_of(&d), Some(2));

    mgr.on_pop(2);
    assert!(mgr.find_term(&d).is_none());
    assert!(mgr.find_term(&c).is_some());
    assert_eq!(mgr.n_terms(), 2, "eviction must not roll back ids");
}

#[test]
fn test_theory_queries_respect_terms() {
    let mut mgr = mgr_with(FuzzerConfig::with_seed(1).with_theories([Theory::Bool, Theory::Bv]));
    assert!(mgr.has_theory(false));
    assert!(!mgr.has_theory(true));

    let b = mgr.solver_mut().mk_sort_atomic(SortKind::Bool).unwrap();
    let bool_sort = mgr.add_sort(b, SortKind::Bool, vec![]);
    let v = mgr.solver_mut().mk_value_bool(&bool_sort, true).unwrap();
    mgr.add_value(v, bool_sort);

    assert!(mgr.has_theory(true));
    for _ in 0..10 {
        assert_eq!(mgr.pick_theory(true), Theory::Bool);
    }
}

#[test]
fn test_pick_op_kind_requires_realizable_args() {
    let mut mgr = mgr_with(FuzzerConfig::with_seed(3).with_theories([Theory::Bool, Theory::Bv]));
    // No terms at all: nothing is realizable.
    assert!(mgr.pick_op_kind().is_none());

    let b = mgr.solver_mut().mk_sort_atomic(SortKind::Bool).unwrap();
    let bool_sort = mgr.add_sort(b, SortKind::Bool, vec![]);
    let v = mgr.solver_mut().mk_value_bool(&bool_sort, true).unwrap();
    mgr.add_value(v, bool_sort);

    // Only Boolean-argument operators qualify now.
    for _ in 0..50 {
        let kind = mgr.pick_op_kind().expect("boolean ops are realizable");
        let op = mgr.op(kind).clone();
        for i in 0..op.args.len() {
            let arg = op.arg_kind(i);
            assert!(
                arg == SortKind::Bool || arg == SortKind::Any,
                "op {kind} needs {arg} terms that do not exist"
            );
        }
    }
}
