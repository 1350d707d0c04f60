//! Theory and Sort-Kind Registry.
//!
//! Closed enumerations of the theories and sort kinds the generator knows
//! about, plus the static metadata that drives sort construction: which sort
//! kinds belong to which theory, and whether a kind is atomic, parametric, or
//! composite.

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// A first-order theory a backend may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Theory {
    /// Arrays with extensionality.
    Array,
    /// Bags (multisets).
    Bag,
    /// The Boolean core.
    Bool,
    /// Fixed-width bit-vectors.
    Bv,
    /// Algebraic datatypes.
    Dt,
    /// IEEE-754 floating-point.
    Fp,
    /// Integer arithmetic.
    Int,
    /// Quantifiers.
    Quant,
    /// Real arithmetic.
    Real,
    /// Sequences.
    Seq,
    /// Sets.
    Set,
    /// Unicode strings and regular languages.
    String,
    /// Transcendental extensions of the reals.
    Transcendental,
    /// Uninterpreted functions.
    Uf,
}

/// All theories, in registry order.
pub const ALL_THEORIES: &[Theory] = &[
    Theory::Array,
    Theory::Bag,
    Theory::Bool,
    Theory::Bv,
    Theory::Dt,
    Theory::Fp,
    Theory::Int,
    Theory::Quant,
    Theory::Real,
    Theory::Seq,
    Theory::Set,
    Theory::String,
    Theory::Transcendental,
    Theory::Uf,
];

/// Set of theories.
pub type TheorySet = FxHashSet<Theory>;

impl Theory {
    /// The sort kinds a theory introduces.
    ///
    /// `Quant`, `Transcendental` and `Uf` piggyback on sorts of other
    /// theories (`Uf` introduces the function sort kind).
    #[must_use]
    pub fn sort_kinds(self) -> &'static [SortKind] {
        match self {
            Theory::Array => &[SortKind::Array],
            Theory::Bag => &[SortKind::Bag],
            Theory::Bool => &[SortKind::Bool],
            Theory::Bv => &[SortKind::Bv],
            Theory::Dt => &[SortKind::Dt],
            Theory::Fp => &[SortKind::Fp, SortKind::Rm],
            Theory::Int => &[SortKind::Int],
            Theory::Quant => &[],
            Theory::Real => &[SortKind::Real],
            Theory::Seq => &[SortKind::Seq],
            Theory::Set => &[SortKind::Set],
            Theory::String => &[SortKind::String, SortKind::Reglan],
            Theory::Transcendental => &[],
            Theory::Uf => &[SortKind::Fun],
        }
    }
}

impl fmt::Display for Theory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Theory::Array => "ARRAY",
            Theory::Bag => "BAG",
            Theory::Bool => "BOOL",
            Theory::Bv => "BV",
            Theory::Dt => "DT",
            Theory::Fp => "FP",
            Theory::Int => "INT",
            Theory::Quant => "QUANT",
            Theory::Real => "REAL",
            Theory::Seq => "SEQ",
            Theory::Set => "SET",
            Theory::String => "STRING",
            Theory::Transcendental => "TRANSCENDENTAL",
            Theory::Uf => "UF",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Theory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ARRAY" => Ok(Theory::Array),
            "BAG" => Ok(Theory::Bag),
            "BOOL" => Ok(Theory::Bool),
            "BV" => Ok(Theory::Bv),
            "DT" => Ok(Theory::Dt),
            "FP" => Ok(Theory::Fp),
            "INT" => Ok(Theory::Int),
            "QUANT" => Ok(Theory::Quant),
            "REAL" => Ok(Theory::Real),
            "SEQ" => Ok(Theory::Seq),
            "SET" => Ok(Theory::Set),
            "STRING" => Ok(Theory::String),
            "TRANSCENDENTAL" => Ok(Theory::Transcendental),
            "UF" => Ok(Theory::Uf),
            _ => Err(format!("unknown theory `{s}`")),
        }
    }
}

/// Coarse classifier over sorts, used for operator dispatch and sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SortKind {
    /// Booleans.
    Bool,
    /// Bit-vectors of a fixed width.
    Bv,
    /// Floating-point numbers of a fixed format.
    Fp,
    /// Floating-point rounding modes.
    Rm,
    /// Integers.
    Int,
    /// Reals.
    Real,
    /// Strings.
    String,
    /// Regular languages over strings.
    Reglan,
    /// Arrays from an index sort to an element sort.
    Array,
    /// Uninterpreted functions (domain sorts plus codomain).
    Fun,
    /// Bags over an element sort.
    Bag,
    /// Sequences over an element sort.
    Seq,
    /// Sets over an element sort.
    Set,
    /// Algebraic datatypes.
    Dt,
    /// Wildcard for polymorphic operator schemas only; never a created sort.
    Any,
}

/// All concrete (non-wildcard) sort kinds, in registry order.
pub const ALL_SORT_KINDS: &[SortKind] = &[
    SortKind::Bool,
    SortKind::Bv,
    SortKind::Fp,
    SortKind::Rm,
    SortKind::Int,
    SortKind::Real,
    SortKind::String,
    SortKind::Reglan,
    SortKind::Array,
    SortKind::Fun,
    SortKind::Bag,
    SortKind::Seq,
    SortKind::Set,
    SortKind::Dt,
];

/// Set of sort kinds.
pub type SortKindSet = FxHashSet<SortKind>;

/// Structural shape of a sort kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortStructure {
    /// No parameters, no child sorts.
    Atomic,
    /// Scalar parameters (BV width, FP exponent/significand widths).
    Parametric,
    /// Child sorts, with an inclusive arity range (`None` = unbounded).
    Composite {
        /// Minimum number of child sorts.
        min_children: u32,
        /// Maximum number of child sorts, if bounded.
        max_children: Option<u32>,
    },
}

impl SortKind {
    /// The theory that owns sorts of this kind.
    ///
    /// Panics on [`SortKind::Any`], which belongs to no theory.
    #[must_use]
    pub fn theory(self) -> Theory {
        match self {
            SortKind::Bool => Theory::Bool,
            SortKind::Bv => Theory::Bv,
            SortKind::Fp | SortKind::Rm => Theory::Fp,
            SortKind::Int => Theory::Int,
            SortKind::Real => Theory::Real,
            SortKind::String | SortKind::Reglan => Theory::String,
            SortKind::Array => Theory::Array,
            SortKind::Fun => Theory::Uf,
            SortKind::Bag => Theory::Bag,
            SortKind::Seq => Theory::Seq,
            SortKind::Set => Theory::Set,
            SortKind::Dt => Theory::Dt,
            SortKind::Any => panic!("SortKind::Any has no owning theory"),
        }
    }

    /// Structural shape of this kind.
    #[must_use]
    pub fn structure(self) -> SortStructure {
        match self {
            SortKind::Bool
            | SortKind::Rm
            | SortKind::Int
            | SortKind::Real
            | SortKind::String
            | SortKind::Reglan
            | SortKind::Dt
            | SortKind::Any => SortStructure::Atomic,
            SortKind::Bv | SortKind::Fp => SortStructure::Parametric,
            SortKind::Array => SortStructure::Composite {
                min_children: 2,
                max_children: Some(2),
            },
            SortKind::Fun => SortStructure::Composite {
                min_children: 2,
                max_children: None,
            },
            SortKind::Bag | SortKind::Seq | SortKind::Set => SortStructure::Composite {
                min_children: 1,
                max_children: Some(1),
            },
        }
    }
}

impl fmt::Display for SortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortKind::Bool => "BOOL",
            SortKind::Bv => "BV",
            SortKind::Fp => "FP",
            SortKind::Rm => "RM",
            SortKind::Int => "INT",
            SortKind::Real => "REAL",
            SortKind::String => "STRING",
            SortKind::Reglan => "REGLAN",
            SortKind::Array => "ARRAY",
            SortKind::Fun => "FUN",
            SortKind::Bag => "BAG",
            SortKind::Seq => "SEQ",
            SortKind::Set => "SET",
            SortKind::Dt => "DT",
            SortKind::Any => "ANY",
        };
        write!(f, "{name}")
    }
}

impl FromStr for SortKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BOOL" => Ok(SortKind::Bool),
            "BV" => Ok(SortKind::Bv),
            "FP" => Ok(SortKind::Fp),
            "RM" => Ok(SortKind::Rm),
            "INT" => Ok(SortKind::Int),
            "REAL" => Ok(SortKind::Real),
            "STRING" => Ok(SortKind::String),
            "REGLAN" => Ok(SortKind::Reglan),
            "ARRAY" => Ok(SortKind::Array),
            "FUN" => Ok(SortKind::Fun),
            "BAG" => Ok(SortKind::Bag),
            "SEQ" => Ok(SortKind::Seq),
            "SET" => Ok(SortKind::Set),
            "DT" => Ok(SortKind::Dt),
            "ANY" => Ok(SortKind::Any),
            _ => Err(format!("unknown sort kind `{s}`")),
        }
    }
}

/// Derive the enabled sort kinds from a set of enabled theories.
#[must_use]
pub fn sort_kinds_of(theories: &TheorySet) -> SortKindSet {
    let mut kinds = SortKindSet::default();
    for theory in theories {
        kinds.extend(theory.sort_kinds().iter().copied());
    }
    kinds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theory_roundtrip() {
        for &theory in ALL_THEORIES {
            let printed = theory.to_string();
            assert_eq!(printed.parse::<Theory>(), Ok(theory));
        }
    }

    #[test]
    fn test_sort_kind_roundtrip() {
        for &kind in ALL_SORT_KINDS {
            let printed = kind.to_string();
            assert_eq!(printed.parse::<SortKind>(), Ok(kind));
        }
        assert_eq!("ANY".parse::<SortKind>(), Ok(SortKind::Any));
    }

    #[test]
    fn test_sort_kind_theory_consistency() {
        for &theory in ALL_THEORIES {
            for &kind in theory.sort_kinds() {
                assert_eq!(kind.theory(), theory);
            }
        }
    }

    #[test]
    fn test_enabled_kinds_derivation() {
        let mut theories = TheorySet::default();
        theories.insert(Theory::Bool);
        theories.insert(Theory::Fp);

        let kinds = sort_kinds_of(&theories);
        assert!(kinds.contains(&SortKind::Bool));
        assert!(kinds.contains(&SortKind::Fp));
        assert!(kinds.contains(&SortKind::Rm));
        assert!(!kinds.contains(&SortKind::Bv));
    }

    #[test]
    fn test_structure_metadata() {
        assert_eq!(SortKind::Int.structure(), SortStructure::Atomic);
        assert_eq!(SortKind::Bv.structure(), SortStructure::Parametric);
        assert_eq!(
            SortKind::Array.structure(),
            SortStructure::Composite {
                min_children: 2,
                max_children: Some(2)
            }
        );
        assert_eq!(
            SortKind::Fun.structure(),
            SortStructure::Composite {
                min_children: 2,
                max_children: None
            }
        );
    }
}
