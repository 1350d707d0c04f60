//! Skelter Core - Data Model for the Skelter SMT API Fuzzer
//!
//! This crate provides the foundational types the fuzzing engine is built
//! on:
//! - Closed [`Theory`] and [`SortKind`] enumerations with their static
//!   registry metadata
//! - The [`Sort`]/[`Term`] wrappers around opaque backend handles, with
//!   backend-delegated equality
//! - The declarative [`OpCatalog`] of operator signatures
//! - The deterministic [`SeededRng`] every random decision goes through
//!
//! # Examples
//!
//! ## Consulting the operator catalog
//!
//! ```
//! use skelter_core::op::{OpCatalog, OpKind, OpKindSet};
//! use skelter_core::theory::{Theory, TheorySet};
//!
//! let catalog = OpCatalog::builtin();
//! let theories: TheorySet = [Theory::Bool, Theory::Bv].into_iter().collect();
//!
//! let enabled = catalog.enabled_ops(&theories, &OpKindSet::default());
//! assert!(enabled.iter().any(|op| op.kind == OpKind::BvAdd));
//! assert!(!enabled.iter().any(|op| op.kind == OpKind::FpAdd));
//! ```
//!
//! ## Deterministic sampling
//!
//! ```
//! use skelter_core::rng::SeededRng;
//!
//! let mut a = SeededRng::new(0xC0FFEE);
//! let mut b = SeededRng::new(0xC0FFEE);
//! assert_eq!(a.pick_u32(0, 100), b.pick_u32(0, 100));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod op;
pub mod rng;
pub mod sort;
pub mod term;
pub mod theory;

pub use op::{Arity, MAX_VAR_ARGS, MIN_VAR_ARGS, Op, OpCatalog, OpKind, OpKindSet};
pub use rng::{Choice, SeededRng};
pub use sort::{BackendSort, Sort, SortId, SortImpl};
pub use term::{BackendTerm, SpecialValueKind, Term, TermId, TermImpl, TermKind};
pub use theory::{
    ALL_SORT_KINDS, ALL_THEORIES, SortKind, SortKindSet, SortStructure, Theory, TheorySet,
    sort_kinds_of,
};
