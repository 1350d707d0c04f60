//! Skelter Solvers - Backend Implementations
//!
//! Backends implementing the [`skelter_fuzzer::Solver`] capability trait.
//! Currently ships the in-memory [`MockSolver`] used by the engine's test
//! suite and for smoke runs without a real SMT solver; bindings to external
//! solvers live in downstream crates built on the same trait.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod mock;

pub use mock::{MOCK_BV_REDOR, MockCapabilities, MockSolver, MockSort, MockTerm};
