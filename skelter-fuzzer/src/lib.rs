//! Skelter Fuzzer - the Generation Engine
//!
//! Model-based API fuzzing for SMT solvers: a weighted finite-state machine
//! walks the solver lifecycle and fires [`actions::Action`]s; each action
//! samples semantically well-typed arguments from the sort and term
//! databases through the [`manager::SolverManager`], calls the backend
//! through the [`solver::Solver`] capability trait, and appends one line to
//! a replayable trace.
//!
//! # Examples
//!
//! Generating and replaying a trace against a backend:
//!
//! ```no_run
//! use skelter_fuzzer::{Fuzzer, FuzzerConfig};
//! use skelter_core::theory::Theory;
//!
//! # fn backend() -> Box<dyn skelter_fuzzer::Solver> { unimplemented!() }
//! let config = FuzzerConfig::with_seed(0xC0FFEE)
//!     .with_theories([Theory::Bool, Theory::Bv])
//!     .with_budget(1_000);
//! let fuzzer = Fuzzer::new(config);
//!
//! let trace: Vec<u8> = Vec::new();
//! // fuzzer.run(backend(), Box::new(trace))?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod actions;
pub mod config;
pub mod error;
pub mod fsm;
pub mod manager;
pub mod options;
pub mod solver;
pub mod sort_db;
pub mod term_db;
pub mod trace;

mod fuzzer;

pub use config::FuzzerConfig;
pub use error::{Result, SkelterError};
pub use fuzzer::Fuzzer;
pub use manager::{SolverManager, Stats};
pub use solver::{Base, SatResult, Solver, SolverError, SolverResult};
