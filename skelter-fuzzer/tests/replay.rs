//! Trace round-trip: replaying a generated trace must drive the backend
//! through the identical call sequence, and malformed traces must fail with
//! the offending line number.

mod common;

use skelter_core::theory::Theory;
use skelter_fuzzer::{Fuzzer, FuzzerConfig, SkelterError};
use skelter_solvers::MockSolver;

use common::{bv_config, generate, replay};

#[test]
fn roundtrip_preserves_backend_call_sequence() {
    for seed in [0u64, 1, 42, 0xC0FFEE, 777] {
        let config = bv_config(seed, 80);
        let (trace, gen_mgr, gen_calls) = generate(config.clone());
        let (replay_mgr, replay_calls) = replay(config, &trace);

        assert_eq!(gen_calls, replay_calls, "seed {seed}: call sequences diverge");
        assert_eq!(gen_mgr.n_terms(), replay_mgr.n_terms(), "seed {seed}");
        assert_eq!(gen_mgr.n_sorts(), replay_mgr.n_sorts(), "seed {seed}");
    }
}

#[test]
fn roundtrip_with_all_theories() {
    let config = FuzzerConfig::with_seed(0xDEAD)
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
        .with_budget(120);
    let (trace, _, gen_calls) = generate(config.clone());
    let (_, replay_calls) = replay(config, &trace);
    assert_eq!(gen_calls, replay_calls);
}

#[test]
fn roundtrip_with_seed_per_action_tracing() {
    let config = bv_config(99, 60).with_trace_seeds();
    let (trace, _, gen_calls) = generate(config.clone());
    assert!(trace.lines().any(|l| l.starts_with("set-seed ")));
    let (_, replay_calls) = replay(config, &trace);
    assert_eq!(gen_calls, replay_calls);
}

#[test]
fn replayed_ids_match_original_ids() {
    let config = bv_config(1234, 80);
    let (trace, _, _) = generate(config.clone());
    // Replay everything up to the final `delete`, which would drop the id
    // tables along with the rest of the run's data.
    let trace = trace
        .strip_suffix("delete\n")
        .map_or(trace.as_str(), |prefix| prefix)
        .to_string();
    let (mgr, _) = replay(config, &trace);

    // Under a faithful replay every trace id resolves to the object that
    // got the same id again.
    for line in trace.lines() {
        if let Some(id) = line.strip_prefix("return s").and_then(|s| s.parse::<u64>().ok()) {
            let sort = mgr.untraced_sort(id).expect("trace sort id resolves");
            assert_eq!(sort.id().get(), id);
        }
        if let Some(id) = line.strip_prefix("return t").and_then(|s| s.parse::<u64>().ok()) {
            let term = mgr.untraced_term(id).expect("trace term id resolves");
            assert_eq!(term.id().get(), id);
        }
    }
}

#[test]
fn comments_and_blank_lines_are_skipped() {
    let trace = "# a comment\n\nnew\n# another\ndelete\n";
    let (_, calls) = replay(bv_config(0, 10), trace);
    assert_eq!(calls, vec!["new_solver".to_string(), "delete_solver".to_string()]);
}

#[test]
fn unknown_action_kind_is_fatal_with_line_number() {
    let trace = "new\nfrobnicate t1\n";
    let err = Fuzzer::new(bv_config(0, 10))
        .untrace(Box::new(MockSolver::new()), trace.as_bytes())
        .unwrap_err();
    match err {
        SkelterError::Untrace { line, message } => {
            assert_eq!(line, 2);
            assert!(message.contains("frobnicate"));
        }
        other => panic!("expected untrace error, got {other}"),
    }
}

#[test]
fn unknown_id_is_fatal_with_line_number() {
    let trace = "new\nassert t99\n";
    let err = Fuzzer::new(bv_config(0, 10))
        .untrace(Box::new(MockSolver::new()), trace.as_bytes())
        .unwrap_err();
    match err {
        SkelterError::Untrace { line, message } => {
            assert_eq!(line, 2);
            assert!(message.contains("t99"));
        }
        other => panic!("expected untrace error, got {other}"),
    }
}

#[test]
fn return_without_creation_is_fatal() {
    let trace = "new\nreturn t1\n";
    let err = Fuzzer::new(bv_config(0, 10))
        .untrace(Box::new(MockSolver::new()), trace.as_bytes())
        .unwrap_err();
    assert!(matches!(err, SkelterError::Untrace { line: 2, .. }));
}

#[test]
fn malformed_set_seed_is_fatal() {
    let trace = "set-seed banana\n";
    let err = Fuzzer::new(bv_config(0, 10))
        .untrace(Box::new(MockSolver::new()), trace.as_bytes())
        .unwrap_err();
    assert!(matches!(err, SkelterError::Untrace { line: 1, .. }));
}

#[test]
fn truncated_trace_replays_up_to_the_cut() {
    // A crash after the action line but before the return line leaves a
    // trailing creation; everything before it must still replay.
    let trace = "new\nmk_sort BV 8\n";
    let (_, calls) = replay(bv_config(0, 10), trace);
    assert_eq!(
        calls,
        vec!["new_solver".to_string(), "mk_sort (_ BitVec 8)".to_string()]
    );
}
