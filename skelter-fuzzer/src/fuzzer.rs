//! Fuzzer Front Object.
//!
//! Wires a configuration and a backend into a solver manager and an FSM,
//! then either generates a fresh trace or replays an existing one.

use std::io::{BufRead, Write};

use crate::config::FuzzerConfig;
use crate::error::Result;
use crate::fsm::Fsm;
use crate::manager::SolverManager;
use crate::solver::Solver;
use crate::trace;

/// A configured fuzzer instance; one per generation thread.
#[derive(Debug, Clone)]
pub struct Fuzzer {
    config: FuzzerConfig,
}

impl Fuzzer {
    /// A fuzzer with the given configuration.
    #[must_use]
    pub fn new(config: FuzzerConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &FuzzerConfig {
        &self.config
    }

    fn setup(
        &self,
        solver: Box<dyn Solver>,
        trace_out: Box<dyn Write>,
    ) -> Result<(SolverManager, Fsm)> {
        let mgr = SolverManager::new(solver, &self.config, trace_out)?;
        let mut fsm = Fsm::standard(&self.config);
        mgr.solver().configure_fsm(&mut fsm);
        fsm.check()?;
        Ok((mgr, fsm))
    }

    /// Generate one trace against the backend, writing it to `trace_out`.
    /// Returns the manager for post-run inspection.
    pub fn run(&self, solver: Box<dyn Solver>, trace_out: Box<dyn Write>) -> Result<SolverManager> {
        let (mut mgr, fsm) = self.setup(solver, trace_out)?;
        fsm.run(&mut mgr)?;
        Ok(mgr)
    }

    /// Replay a trace stream against the backend. Returns the manager for
    /// post-run inspection.
    pub fn untrace(
        &self,
        solver: Box<dyn Solver>,
        reader: impl BufRead,
    ) -> Result<SolverManager> {
        let (mut mgr, fsm) = self.setup(solver, Box::new(std::io::sink()))?;
        trace::untrace(&mut mgr, &fsm, reader)?;
        Ok(mgr)
    }
}
