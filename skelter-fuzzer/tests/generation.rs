//! Generation-side properties: determinism, id monotonicity,
//! well-typedness, budget and gating discipline.

mod common;

use proptest::prelude::*;

use skelter_core::op::Arity;
use skelter_core::op::{MAX_VAR_ARGS, MIN_VAR_ARGS, OpKind};
use skelter_core::term::TermKind;
use skelter_core::theory::{SortKind, Theory};
use skelter_fuzzer::FuzzerConfig;

use common::{bv_config, generate};

#[test]
fn same_seed_gives_byte_identical_traces() {
    let (a, _, _) = generate(bv_config(0xC0FFEE, 100));
    let (b, _, _) = generate(bv_config(0xC0FFEE, 100));
    assert_eq!(a, b);
    assert!(!a.is_empty());
}

#[test]
fn different_seeds_diverge() {
    let (a, _, _) = generate(bv_config(1, 200));
    let (b, _, _) = generate(bv_config(2, 200));
    // Both start with `new`, but the streams must not be identical.
    assert_ne!(a, b);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn determinism_over_seeds(seed in any::<u64>()) {
        let (a, _, calls_a) = generate(bv_config(seed, 40));
        let (b, _, calls_b) = generate(bv_config(seed, 40));
        prop_assert_eq!(a, b);
        prop_assert_eq!(calls_a, calls_b);
    }

    #[test]
    fn sort_and_term_ids_are_strictly_increasing(seed in any::<u64>()) {
        let (_, mgr, _) = generate(bv_config(seed, 60));

        let sort_ids: Vec<u64> = mgr.sort_db().iter().map(|s| s.id().get()).collect();
        for w in sort_ids.windows(2) {
            prop_assert!(w[0] < w[1], "sort ids not increasing: {:?}", sort_ids);
        }
        for id in &sort_ids {
            prop_assert!(*id > 0);
        }

        let mut term_ids: Vec<u64> = mgr.term_db().iter().map(|(t, _)| t.id().get()).collect();
        let n = term_ids.len();
        term_ids.sort_unstable();
        term_ids.dedup();
        prop_assert_eq!(term_ids.len(), n, "term ids are not unique");
    }
}

#[test]
fn emitted_applications_satisfy_operator_schemas() {
    for seed in [3u64, 17, 0xBEEF, 9999] {
        let config = FuzzerConfig::with_seed(seed)
            .with_theories([
                Theory::Bool,
                Theory::Bv,
                Theory::Int,
                Theory::Real,
                Theory::Array,
                Theory::Fp,
                Theory::Quant,
                Theory::Uf,
                Theory::String,
            ])
            .with_budget(150);
        let (_, mgr, _) = generate(config);

        for (term, _level) in mgr.term_db().iter() {
            if term.kind() != TermKind::OpApp {
                continue;
            }
            let kind = term.op().expect("application carries its operator");
            let op = mgr
                .catalog()
                .get(kind)
                .expect("applied operator is in the catalog");
            let args = term.args();

            match op.arity {
                Arity::Fixed(n) => assert_eq!(args.len(), n as usize, "arity of {kind}"),
                Arity::Nary if kind != OpKind::UfApply => {
                    assert!(
                        (MIN_VAR_ARGS as usize..=MAX_VAR_ARGS as usize).contains(&args.len()),
                        "variadic arity of {kind} out of range: {}",
                        args.len()
                    );
                }
                Arity::Nary => {}
            }

            if kind != OpKind::UfApply {
                for (i, arg) in args.iter().enumerate() {
                    let expected = op.arg_kind(i.min(op.args.len() - 1));
                    if expected != SortKind::Any {
                        assert_eq!(
                            arg.sort().kind(),
                            expected,
                            "argument {i} of {kind} has the wrong sort kind"
                        );
                    }
                }
            }

            let expected_result = match kind {
                OpKind::Ite => args[1].sort().kind(),
                OpKind::ArraySelect => args[0].sort().array_element().kind(),
                OpKind::UfApply => args[0].sort().fun_codomain().kind(),
                _ => op.result,
            };
            if expected_result != SortKind::Any {
                assert_eq!(
                    term.sort().kind(),
                    expected_result,
                    "result sort of {kind} disagrees with the schema"
                );
            }
        }
    }
}

#[test]
fn zero_budget_runs_lifecycle_only() {
    let (trace, _, calls) = generate(bv_config(7, 0));
    assert_eq!(trace, "new\ndelete\n");
    assert_eq!(calls, vec!["new_solver".to_string(), "delete_solver".to_string()]);
}

#[test]
fn budget_bounds_counted_actions() {
    for seed in [5u64, 6, 7] {
        let budget = 25;
        let (trace, _, _) = generate(bv_config(seed, budget));
        let counted = trace
            .lines()
            .filter(|l| {
                !l.is_empty()
                    && *l != "new"
                    && *l != "delete"
                    && !l.starts_with("return ")
                    && !l.starts_with("set-seed ")
                    && !l.starts_with("term_get_sort ")
            })
            .count();
        assert!(
            counted <= budget as usize,
            "{counted} counted actions exceed budget {budget}"
        );
    }
}

#[test]
fn check_sat_assuming_requires_incremental() {
    for seed in 0..12u64 {
        let (trace, _, _) = generate(bv_config(seed, 80));
        let mut incremental = false;
        for line in trace.lines() {
            if line == "set_opt incremental true" {
                incremental = true;
            }
            if line.starts_with("check_sat_assuming") {
                assert!(
                    incremental,
                    "seed {seed}: check_sat_assuming before incremental was enabled"
                );
            }
        }
    }
}

#[test]
fn options_are_configured_at_most_once() {
    for seed in 0..12u64 {
        let (trace, _, _) = generate(bv_config(seed, 120));
        let mut seen = std::collections::HashSet::new();
        for line in trace.lines() {
            if let Some(rest) = line.strip_prefix("set_opt ") {
                let name = rest.split_whitespace().next().expect("option name");
                assert!(
                    seen.insert(name.to_string()),
                    "seed {seed}: option `{name}` configured twice"
                );
            }
        }
    }
}

#[test]
fn conflicting_options_never_cooccur() {
    for seed in 0..24u64 {
        let (trace, _, _) = generate(bv_config(seed, 120));
        let eager = trace.lines().any(|l| l.starts_with("set_opt eager-bitblast"));
        let lazy = trace.lines().any(|l| l.starts_with("set_opt lazy-bitblast"));
        assert!(
            !(eager && lazy),
            "seed {seed}: conflicting bitblast options both configured"
        );
    }
}

#[test]
fn model_queries_only_after_matching_sat_result() {
    // `get_value` must only appear while a sat verdict is fresh, and
    // `get_unsat_assumptions` while an unsat verdict is fresh. The mock's
    // call log records verdicts; the trace records query order.
    for seed in 0..12u64 {
        let (trace, _, calls) = generate(bv_config(seed, 120));
        let mut verdicts = calls.iter().filter_map(|c| {
            if !c.starts_with("check_sat") {
                return None;
            }
            c.rsplit_once(" -> ").map(|(_, v)| v.to_string())
        });
        let mut last: Option<String> = None;
        for line in trace.lines() {
            if line == "check_sat" || line.starts_with("check_sat_assuming") {
                last = verdicts.next();
                assert!(last.is_some(), "seed {seed}: more checks traced than logged");
            } else if line.starts_with("assert ")
                || line.starts_with("push ")
                || line.starts_with("pop ")
                || line == "reset_assertions"
            {
                last = None;
            } else if line.starts_with("get_value") || line == "print_model" {
                assert_eq!(last.as_deref(), Some("sat"), "seed {seed}: stale model query");
            } else if line == "get_unsat_assumptions" {
                assert_eq!(last.as_deref(), Some("unsat"), "seed {seed}: stale core query");
            }
        }
    }
}

#[test]
fn trace_seeds_mode_prefixes_actions() {
    let config = bv_config(11, 40).with_trace_seeds();
    let (trace, _, _) = generate(config);
    let lines: Vec<&str> = trace.lines().collect();
    assert!(lines.iter().any(|l| l.starts_with("set-seed ")));
    // Every action line (non-return) is preceded by a set-seed line.
    for (i, line) in lines.iter().enumerate() {
        if line.starts_with("set-seed ") || line.starts_with("return ") {
            continue;
        }
        assert!(
            i > 0 && lines[i - 1].starts_with("set-seed "),
            "action `{line}` without a preceding set-seed line"
        );
    }
}
