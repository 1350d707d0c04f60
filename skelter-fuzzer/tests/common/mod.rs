//! Shared helpers for the engine's integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use skelter_core::theory::Theory;
use skelter_fuzzer::{Fuzzer, FuzzerConfig, SolverManager};
use skelter_solvers::MockSolver;

/// An owned, clonable trace sink readable after the run.
#[derive(Clone, Default)]
pub struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).expect("trace is UTF-8")
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Generate one trace against a fresh mock; returns the trace text, the
/// manager after the run, and the mock's call log.
pub fn generate(config: FuzzerConfig) -> (String, SolverManager, Vec<String>) {
    let solver = MockSolver::new();
    let log = solver.log_handle();
    let buf = SharedBuf::new();
    let mgr = Fuzzer::new(config)
        .run(Box::new(solver), Box::new(buf.clone()))
        .expect("generation succeeds against the mock");
    let calls = log.borrow().clone();
    (buf.text(), mgr, calls)
}

/// A config over Bool and BV with a small budget, the workhorse of these
/// tests.
pub fn bv_config(seed: u64, budget: u64) -> FuzzerConfig {
    FuzzerConfig::with_seed(seed)
        .with_theories([Theory::Bool, Theory::Bv])
        .with_budget(budget)
}

/// Replay a trace against a fresh mock; returns the manager and the call
/// log.
pub fn replay(config: FuzzerConfig, trace: &str) -> (SolverManager, Vec<String>) {
    let solver = MockSolver::new();
    let log = solver.log_handle();
    let mgr = Fuzzer::new(config)
        .untrace(Box::new(solver), trace.as_bytes())
        .expect("replay succeeds against the mock");
    let calls = log.borrow().clone();
    (mgr, calls)
}
