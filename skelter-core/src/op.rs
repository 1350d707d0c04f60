//! Operator Catalog.
//!
//! The catalog is the single place where sort kinds govern operator
//! applicability: every operator is registered with its arity, its index
//! parameter count, the sort-kind schema of its arguments and its result
//! sort kind. Samplers consult the catalog instead of dispatching on sort
//! kinds themselves.
//!
//! Backends extend the builtin table with solver-private operators through
//! [`crate::solver::Solver::configure_ops`]; those must use
//! [`OpKind::Custom`] tags namespaced by a solver prefix.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::theory::{SortKind, Theory, TheorySet};

/// Set of operator kinds.
pub type OpKindSet = FxHashSet<OpKind>;

/// Minimum argument count sampled for variadic operators.
pub const MIN_VAR_ARGS: u32 = 2;

/// Maximum argument count sampled for variadic operators.
pub const MAX_VAR_ARGS: u32 = 11;

/// Operator identity.
///
/// The builtin set is closed; backend-private operators use [`OpKind::Custom`]
/// with a stable, solver-prefixed tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum OpKind {
    // Boolean core (including the polymorphic comparisons).
    And,
    Or,
    Not,
    Xor,
    Implies,
    Equal,
    Distinct,
    Ite,

    // Bit-vectors.
    BvConcat,
    BvAnd,
    BvOr,
    BvXor,
    BvMul,
    BvAdd,
    BvSub,
    BvNot,
    BvNeg,
    BvNand,
    BvNor,
    BvXnor,
    BvComp,
    BvUdiv,
    BvUrem,
    BvSdiv,
    BvSrem,
    BvSmod,
    BvShl,
    BvLshr,
    BvAshr,
    BvUlt,
    BvUle,
    BvUgt,
    BvUge,
    BvSlt,
    BvSle,
    BvSgt,
    BvSge,
    BvExtract,
    BvRepeat,
    BvRotateLeft,
    BvRotateRight,
    BvSignExtend,
    BvZeroExtend,

    // Floating-point.
    FpAbs,
    FpAdd,
    FpDiv,
    FpEq,
    FpFma,
    FpFp,
    FpIsNormal,
    FpIsSubnormal,
    FpIsInf,
    FpIsNan,
    FpIsNeg,
    FpIsPos,
    FpIsZero,
    FpLt,
    FpLeq,
    FpGt,
    FpGeq,
    FpMax,
    FpMin,
    FpMul,
    FpNeg,
    FpRem,
    FpRti,
    FpSqrt,
    FpSub,
    FpToFpFromBv,
    FpToFpFromSbv,
    FpToFpFromUbv,
    FpToFpFromFp,
    FpToFpFromReal,
    FpToReal,
    FpToSbv,
    FpToUbv,

    // Integer arithmetic.
    IntNeg,
    IntSub,
    IntAdd,
    IntMul,
    IntDiv,
    IntMod,
    IntAbs,
    IntLt,
    IntLte,
    IntGt,
    IntGte,
    IntIsDiv,
    IntToReal,

    // Real arithmetic.
    RealNeg,
    RealSub,
    RealAdd,
    RealMul,
    RealDiv,
    RealLt,
    RealLte,
    RealGt,
    RealGte,
    RealIsInt,
    RealToInt,

    // Arrays.
    ArraySelect,
    ArrayStore,

    // Quantifiers.
    Forall,
    Exists,

    // Uninterpreted functions.
    UfApply,

    // Strings and regular languages.
    StrConcat,
    StrLen,
    StrLt,
    StrToRe,
    StrInRe,
    StrAt,
    StrSubstr,
    StrPrefixof,
    StrSuffixof,
    StrContains,
    StrIndexof,
    StrReplace,
    StrReplaceAll,
    StrIsDigit,
    StrToCode,
    StrFromCode,
    StrToInt,
    StrFromInt,
    ReConcat,
    ReUnion,
    ReInter,
    ReStar,
    RePlus,
    ReOpt,
    ReComp,
    ReRange,
    ReNone,
    ReAll,
    ReAllchar,

    // Transcendentals.
    TransPi,
    TransSine,
    TransCosine,
    TransTangent,

    /// A backend-private operator, tagged with a solver-prefixed name.
    Custom(&'static str),
}

impl OpKind {
    /// Stable trace tag of this operator.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            OpKind::And => "AND",
            OpKind::Or => "OR",
            OpKind::Not => "NOT",
            OpKind::Xor => "XOR",
            OpKind::Implies => "IMPLIES",
            OpKind::Equal => "EQUAL",
            OpKind::Distinct => "DISTINCT",
            OpKind::Ite => "ITE",
            OpKind::BvConcat => "BV_CONCAT",
            OpKind::BvAnd => "BV_AND",
            OpKind::BvOr => "BV_OR",
            OpKind::BvXor => "BV_XOR",
            OpKind::BvMul => "BV_MUL",
            OpKind::BvAdd => "BV_ADD",
            OpKind::BvSub => "BV_SUB",
            OpKind::BvNot => "BV_NOT",
            OpKind::BvNeg => "BV_NEG",
            OpKind::BvNand => "BV_NAND",
            OpKind::BvNor => "BV_NOR",
            OpKind::BvXnor => "BV_XNOR",
            OpKind::BvComp => "BV_COMP",
            OpKind::BvUdiv => "BV_UDIV",
            OpKind::BvUrem => "BV_UREM",
            OpKind::BvSdiv => "BV_SDIV",
            OpKind::BvSrem => "BV_SREM",
            OpKind::BvSmod => "BV_SMOD",
            OpKind::BvShl => "BV_SHL",
            OpKind::BvLshr => "BV_LSHR",
            OpKind::BvAshr => "BV_ASHR",
            OpKind::BvUlt => "BV_ULT",
            OpKind::BvUle => "BV_ULE",
            OpKind::BvUgt => "BV_UGT",
            OpKind::BvUge => "BV_UGE",
            OpKind::BvSlt => "BV_SLT",
            OpKind::BvSle => "BV_SLE",
            OpKind::BvSgt => "BV_SGT",
            OpKind::BvSge => "BV_SGE",
            OpKind::BvExtract => "BV_EXTRACT",
            OpKind::BvRepeat => "BV_REPEAT",
            OpKind::BvRotateLeft => "BV_ROTATE_LEFT",
            OpKind::BvRotateRight => "BV_ROTATE_RIGHT",
            OpKind::BvSignExtend => "BV_SIGN_EXTEND",
            OpKind::BvZeroExtend => "BV_ZERO_EXTEND",
            OpKind::FpAbs => "FP_ABS",
            OpKind::FpAdd => "FP_ADD",
            OpKind::FpDiv => "FP_DIV",
            OpKind::FpEq => "FP_EQ",
            OpKind::FpFma => "FP_FMA",
            OpKind::FpFp => "FP_FP",
            OpKind::FpIsNormal => "FP_IS_NORMAL",
            OpKind::FpIsSubnormal => "FP_IS_SUBNORMAL",
            OpKind::FpIsInf => "FP_IS_INF",
            OpKind::FpIsNan => "FP_IS_NAN",
            OpKind::FpIsNeg => "FP_IS_NEG",
            OpKind::FpIsPos => "FP_IS_POS",
            OpKind::FpIsZero => "FP_IS_ZERO",
            OpKind::FpLt => "FP_LT",
            OpKind::FpLeq => "FP_LEQ",
            OpKind::FpGt => "FP_GT",
            OpKind::FpGeq => "FP_GEQ",
            OpKind::FpMax => "FP_MAX",
            OpKind::FpMin => "FP_MIN",
            OpKind::FpMul => "FP_MUL",
            OpKind::FpNeg => "FP_NEG",
            OpKind::FpRem => "FP_REM",
            OpKind::FpRti => "FP_RTI",
            OpKind::FpSqrt => "FP_SQRT",
            OpKind::FpSub => "FP_SUB",
            OpKind::FpToFpFromBv => "FP_TO_FP_FROM_BV",
            OpKind::FpToFpFromSbv => "FP_TO_FP_FROM_SBV",
            OpKind::FpToFpFromUbv => "FP_TO_FP_FROM_UBV",
            OpKind::FpToFpFromFp => "FP_TO_FP_FROM_FP",
            OpKind::FpToFpFromReal => "FP_TO_FP_FROM_REAL",
            OpKind::FpToReal => "FP_TO_REAL",
            OpKind::FpToSbv => "FP_TO_SBV",
            OpKind::FpToUbv => "FP_TO_UBV",
            OpKind::IntNeg => "INT_NEG",
            OpKind::IntSub => "INT_SUB",
            OpKind::IntAdd => "INT_ADD",
            OpKind::IntMul => "INT_MUL",
            OpKind::IntDiv => "INT_DIV",
            OpKind::IntMod => "INT_MOD",
            OpKind::IntAbs => "INT_ABS",
            OpKind::IntLt => "INT_LT",
            OpKind::IntLte => "INT_LTE",
            OpKind::IntGt => "INT_GT",
            OpKind::IntGte => "INT_GTE",
            OpKind::IntIsDiv => "INT_IS_DIV",
            OpKind::IntToReal => "INT_TO_REAL",
            OpKind::RealNeg => "REAL_NEG",
            OpKind::RealSub => "REAL_SUB",
            OpKind::RealAdd => "REAL_ADD",
            OpKind::RealMul => "REAL_MUL",
            OpKind::RealDiv => "REAL_DIV",
            OpKind::RealLt => "REAL_LT",
            OpKind::RealLte => "REAL_LTE",
            OpKind::RealGt => "REAL_GT",
            OpKind::RealGte => "REAL_GTE",
            OpKind::RealIsInt => "REAL_IS_INT",
            OpKind::RealToInt => "REAL_TO_INT",
            OpKind::ArraySelect => "ARRAY_SELECT",
            OpKind::ArrayStore => "ARRAY_STORE",
            OpKind::Forall => "FORALL",
            OpKind::Exists => "EXISTS",
            OpKind::UfApply => "UF_APPLY",
            OpKind::StrConcat => "STR_CONCAT",
            OpKind::StrLen => "STR_LEN",
            OpKind::StrLt => "STR_LT",
            OpKind::StrToRe => "STR_TO_RE",
            OpKind::StrInRe => "STR_IN_RE",
            OpKind::StrAt => "STR_AT",
            OpKind::StrSubstr => "STR_SUBSTR",
            OpKind::StrPrefixof => "STR_PREFIXOF",
            OpKind::StrSuffixof => "STR_SUFFIXOF",
            OpKind::StrContains => "STR_CONTAINS",
            OpKind::StrIndexof => "STR_INDEXOF",
            OpKind::StrReplace => "STR_REPLACE",
            OpKind::StrReplaceAll => "STR_REPLACE_ALL",
            OpKind::StrIsDigit => "STR_IS_DIGIT",
            OpKind::StrToCode => "STR_TO_CODE",
            OpKind::StrFromCode => "STR_FROM_CODE",
            OpKind::StrToInt => "STR_TO_INT",
            OpKind::StrFromInt => "STR_FROM_INT",
            OpKind::ReConcat => "RE_CONCAT",
            OpKind::ReUnion => "RE_UNION",
            OpKind::ReInter => "RE_INTER",
            OpKind::ReStar => "RE_STAR",
            OpKind::RePlus => "RE_PLUS",
            OpKind::ReOpt => "RE_OPT",
            OpKind::ReComp => "RE_COMP",
            OpKind::ReRange => "RE_RANGE",
            OpKind::ReNone => "RE_NONE",
            OpKind::ReAll => "RE_ALL",
            OpKind::ReAllchar => "RE_ALLCHAR",
            OpKind::TransPi => "TRANS_PI",
            OpKind::TransSine => "TRANS_SINE",
            OpKind::TransCosine => "TRANS_COSINE",
            OpKind::TransTangent => "TRANS_TANGENT",
            OpKind::Custom(tag) => tag,
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Argument count of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many term arguments (may be 0).
    Fixed(u32),
    /// Variadic; sampled from `MIN_VAR_ARGS..=MAX_VAR_ARGS`.
    Nary,
}

/// Sort-kind schema of operator arguments.
pub type ArgSchema = SmallVec<[SortKind; 4]>;

/// A registered operator.
#[derive(Debug, Clone)]
pub struct Op {
    /// Operator identity.
    pub kind: OpKind,
    /// Term argument count.
    pub arity: Arity,
    /// Number of non-term index parameters (e.g. extract's `hi`, `lo`).
    pub n_params: u32,
    /// Result sort kind; [`SortKind::Any`] for polymorphic results.
    pub result: SortKind,
    /// Argument sort kinds. For variadic operators the schema holds the
    /// element kind (one entry).
    pub args: ArgSchema,
    /// Owning theory.
    pub theory: Theory,
}

impl Op {
    /// True for variadic operators.
    #[must_use]
    pub fn is_nary(&self) -> bool {
        matches!(self.arity, Arity::Nary)
    }

    /// Sort kind of the `i`-th argument.
    #[must_use]
    pub fn arg_kind(&self, i: usize) -> SortKind {
        match self.arity {
            Arity::Fixed(_) => self.args[i],
            Arity::Nary => self.args[0],
        }
    }
}

/// Declarative table of all operators the fuzzer may apply.
#[derive(Debug)]
pub struct OpCatalog {
    ops: Vec<Op>,
    index: FxHashMap<OpKind, usize>,
    names: FxHashMap<&'static str, OpKind>,
}

impl OpCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            ops: Vec::new(),
            index: FxHashMap::default(),
            names: FxHashMap::default(),
        }
    }

    /// The catalog of builtin operators.
    ///
    /// BAG, SEQ, SET and DT carry no builtin operators; backends register
    /// them as [`OpKind::Custom`] entries.
    #[must_use]
    pub fn builtin() -> Self {
        use Arity::{Fixed, Nary};
        use SortKind::{Any, Array, Bool, Bv, Fp, Fun, Int, Real, Reglan, Rm, String};

        let mut cat = Self::empty();
        let mut add = |kind, arity, n_params, result, args: &[SortKind], theory| {
            cat.add_op(Op {
                kind,
                arity,
                n_params,
                result,
                args: ArgSchema::from_slice(args),
                theory,
            });
        };

        // Boolean core.
        add(OpKind::And, Nary, 0, Bool, &[Bool], Theory::Bool);
        add(OpKind::Or, Nary, 0, Bool, &[Bool], Theory::Bool);
        add(OpKind::Not, Fixed(1), 0, Bool, &[Bool], Theory::Bool);
        add(OpKind::Xor, Nary, 0, Bool, &[Bool], Theory::Bool);
        add(OpKind::Implies, Nary, 0, Bool, &[Bool], Theory::Bool);
        add(OpKind::Equal, Nary, 0, Bool, &[Any], Theory::Bool);
        add(OpKind::Distinct, Nary, 0, Bool, &[Any], Theory::Bool);
        add(OpKind::Ite, Fixed(3), 0, Any, &[Bool, Any, Any], Theory::Bool);

        // Bit-vectors.
        add(OpKind::BvConcat, Nary, 0, Bv, &[Bv], Theory::Bv);
        add(OpKind::BvAnd, Nary, 0, Bv, &[Bv], Theory::Bv);
        add(OpKind::BvOr, Nary, 0, Bv, &[Bv], Theory::Bv);
        add(OpKind::BvXor, Nary, 0, Bv, &[Bv], Theory::Bv);
        add(OpKind::BvMul, Nary, 0, Bv, &[Bv], Theory::Bv);
        add(OpKind::BvAdd, Nary, 0, Bv, &[Bv], Theory::Bv);
        add(OpKind::BvSub, Nary, 0, Bv, &[Bv], Theory::Bv);
        add(OpKind::BvNot, Fixed(1), 0, Bv, &[Bv], Theory::Bv);
        add(OpKind::BvNeg, Fixed(1), 0, Bv, &[Bv], Theory::Bv);
        for kind in [
            OpKind::BvNand,
            OpKind::BvNor,
            OpKind::BvXnor,
            OpKind::BvComp,
            OpKind::BvUdiv,
            OpKind::BvUrem,
            OpKind::BvSdiv,
            OpKind::BvSrem,
            OpKind::BvSmod,
            OpKind::BvShl,
            OpKind::BvLshr,
            OpKind::BvAshr,
        ] {
            add(kind, Fixed(2), 0, Bv, &[Bv, Bv], Theory::Bv);
        }
        for kind in [
            OpKind::BvUlt,
            OpKind::BvUle,
            OpKind::BvUgt,
            OpKind::BvUge,
            OpKind::BvSlt,
            OpKind::BvSle,
            OpKind::BvSgt,
            OpKind::BvSge,
        ] {
            add(kind, Fixed(2), 0, Bool, &[Bv, Bv], Theory::Bv);
        }
        add(OpKind::BvExtract, Fixed(1), 2, Bv, &[Bv], Theory::Bv);
        for kind in [
            OpKind::BvRepeat,
            OpKind::BvRotateLeft,
            OpKind::BvRotateRight,
            OpKind::BvSignExtend,
            OpKind::BvZeroExtend,
        ] {
            add(kind, Fixed(1), 1, Bv, &[Bv], Theory::Bv);
        }

        // Floating-point.
        add(OpKind::FpAbs, Fixed(1), 0, Fp, &[Fp], Theory::Fp);
        add(OpKind::FpNeg, Fixed(1), 0, Fp, &[Fp], Theory::Fp);
        for kind in [OpKind::FpAdd, OpKind::FpSub, OpKind::FpMul, OpKind::FpDiv] {
            add(kind, Fixed(3), 0, Fp, &[Rm, Fp, Fp], Theory::Fp);
        }
        add(OpKind::FpFma, Fixed(4), 0, Fp, &[Rm, Fp, Fp, Fp], Theory::Fp);
        add(OpKind::FpSqrt, Fixed(2), 0, Fp, &[Rm, Fp], Theory::Fp);
        add(OpKind::FpRti, Fixed(2), 0, Fp, &[Rm, Fp], Theory::Fp);
        add(OpKind::FpRem, Fixed(2), 0, Fp, &[Fp, Fp], Theory::Fp);
        add(OpKind::FpMin, Fixed(2), 0, Fp, &[Fp, Fp], Theory::Fp);
        add(OpKind::FpMax, Fixed(2), 0, Fp, &[Fp, Fp], Theory::Fp);
        for kind in [
            OpKind::FpEq,
            OpKind::FpLt,
            OpKind::FpLeq,
            OpKind::FpGt,
            OpKind::FpGeq,
        ] {
            add(kind, Nary, 0, Bool, &[Fp], Theory::Fp);
        }
        for kind in [
            OpKind::FpIsNormal,
            OpKind::FpIsSubnormal,
            OpKind::FpIsInf,
            OpKind::FpIsNan,
            OpKind::FpIsNeg,
            OpKind::FpIsPos,
            OpKind::FpIsZero,
        ] {
            add(kind, Fixed(1), 0, Bool, &[Fp], Theory::Fp);
        }
        add(OpKind::FpFp, Fixed(3), 0, Fp, &[Bv, Bv, Bv], Theory::Fp);
        add(OpKind::FpToFpFromBv, Fixed(1), 2, Fp, &[Bv], Theory::Fp);
        add(OpKind::FpToFpFromSbv, Fixed(2), 2, Fp, &[Rm, Bv], Theory::Fp);
        add(OpKind::FpToFpFromUbv, Fixed(2), 2, Fp, &[Rm, Bv], Theory::Fp);
        add(OpKind::FpToFpFromFp, Fixed(2), 2, Fp, &[Rm, Fp], Theory::Fp);
        add(OpKind::FpToFpFromReal, Fixed(2), 2, Fp, &[Rm, Real], Theory::Fp);
        add(OpKind::FpToReal, Fixed(1), 0, Real, &[Fp], Theory::Fp);
        add(OpKind::FpToSbv, Fixed(2), 1, Bv, &[Rm, Fp], Theory::Fp);
        add(OpKind::FpToUbv, Fixed(2), 1, Bv, &[Rm, Fp], Theory::Fp);

        // Integer arithmetic.
        add(OpKind::IntNeg, Fixed(1), 0, Int, &[Int], Theory::Int);
        add(OpKind::IntAbs, Fixed(1), 0, Int, &[Int], Theory::Int);
        add(OpKind::IntSub, Nary, 0, Int, &[Int], Theory::Int);
        add(OpKind::IntAdd, Nary, 0, Int, &[Int], Theory::Int);
        add(OpKind::IntMul, Nary, 0, Int, &[Int], Theory::Int);
        add(OpKind::IntDiv, Nary, 0, Int, &[Int], Theory::Int);
        add(OpKind::IntMod, Fixed(2), 0, Int, &[Int, Int], Theory::Int);
        for kind in [OpKind::IntLt, OpKind::IntLte, OpKind::IntGt, OpKind::IntGte] {
            add(kind, Nary, 0, Bool, &[Int], Theory::Int);
        }
        add(OpKind::IntIsDiv, Fixed(1), 1, Bool, &[Int], Theory::Int);
        add(OpKind::IntToReal, Fixed(1), 0, Real, &[Int], Theory::Int);

        // Real arithmetic.
        add(OpKind::RealNeg, Fixed(1), 0, Real, &[Real], Theory::Real);
        add(OpKind::RealSub, Nary, 0, Real, &[Real], Theory::Real);
        add(OpKind::RealAdd, Nary, 0, Real, &[Real], Theory::Real);
        add(OpKind::RealMul, Nary, 0, Real, &[Real], Theory::Real);
        add(OpKind::RealDiv, Nary, 0, Real, &[Real], Theory::Real);
        for kind in [
            OpKind::RealLt,
            OpKind::RealLte,
            OpKind::RealGt,
            OpKind::RealGte,
        ] {
            add(kind, Nary, 0, Bool, &[Real], Theory::Real);
        }
        add(OpKind::RealIsInt, Fixed(1), 0, Bool, &[Real], Theory::Real);
        add(OpKind::RealToInt, Fixed(1), 0, Int, &[Real], Theory::Real);

        // Arrays.
        add(OpKind::ArraySelect, Fixed(2), 0, Any, &[Array, Any], Theory::Array);
        add(
            OpKind::ArrayStore,
            Fixed(3),
            0,
            Array,
            &[Array, Any, Any],
            Theory::Array,
        );

        // Quantifiers.
        add(OpKind::Forall, Fixed(2), 0, Bool, &[Any, Bool], Theory::Quant);
        add(OpKind::Exists, Fixed(2), 0, Bool, &[Any, Bool], Theory::Quant);

        // Uninterpreted functions.
        add(OpKind::UfApply, Nary, 0, Any, &[Fun], Theory::Uf);

        // Strings.
        add(OpKind::StrConcat, Nary, 0, String, &[String], Theory::String);
        add(OpKind::StrLen, Fixed(1), 0, Int, &[String], Theory::String);
        add(OpKind::StrLt, Fixed(2), 0, Bool, &[String, String], Theory::String);
        add(OpKind::StrAt, Fixed(2), 0, String, &[String, Int], Theory::String);
        add(
            OpKind::StrSubstr,
            Fixed(3),
            0,
            String,
            &[String, Int, Int],
            Theory::String,
        );
        for kind in [
            OpKind::StrPrefixof,
            OpKind::StrSuffixof,
            OpKind::StrContains,
        ] {
            add(kind, Fixed(2), 0, Bool, &[String, String], Theory::String);
        }
        add(
            OpKind::StrIndexof,
            Fixed(3),
            0,
            Int,
            &[String, String, Int],
            Theory::String,
        );
        add(
            OpKind::StrReplace,
            Fixed(3),
            0,
            String,
            &[String, String, String],
            Theory::String,
        );
        add(
            OpKind::StrReplaceAll,
            Fixed(3),
            0,
            String,
            &[String, String, String],
            Theory::String,
        );
        add(OpKind::StrIsDigit, Fixed(1), 0, Bool, &[String], Theory::String);
        add(OpKind::StrToCode, Fixed(1), 0, Int, &[String], Theory::String);
        add(OpKind::StrFromCode, Fixed(1), 0, String, &[Int], Theory::String);
        add(OpKind::StrToInt, Fixed(1), 0, Int, &[String], Theory::String);
        add(OpKind::StrFromInt, Fixed(1), 0, String, &[Int], Theory::String);

        // Regular languages.
        add(OpKind::StrToRe, Fixed(1), 0, Reglan, &[String], Theory::String);
        add(OpKind::StrInRe, Fixed(2), 0, Bool, &[String, Reglan], Theory::String);
        add(OpKind::ReConcat, Nary, 0, Reglan, &[Reglan], Theory::String);
        add(OpKind::ReUnion, Nary, 0, Reglan, &[Reglan], Theory::String);
        add(OpKind::ReInter, Nary, 0, Reglan, &[Reglan], Theory::String);
        add(OpKind::ReStar, Fixed(1), 0, Reglan, &[Reglan], Theory::String);
        add(OpKind::RePlus, Fixed(1), 0, Reglan, &[Reglan], Theory::String);
        add(OpKind::ReOpt, Fixed(1), 0, Reglan, &[Reglan], Theory::String);
        add(OpKind::ReComp, Fixed(1), 0, Reglan, &[Reglan], Theory::String);
        add(OpKind::ReRange, Fixed(2), 0, Reglan, &[String, String], Theory::String);
        add(OpKind::ReNone, Fixed(0), 0, Reglan, &[], Theory::String);
        add(OpKind::ReAll, Fixed(0), 0, Reglan, &[], Theory::String);
        add(OpKind::ReAllchar, Fixed(0), 0, Reglan, &[], Theory::String);

        // Transcendentals.
        add(OpKind::TransPi, Fixed(0), 0, Real, &[], Theory::Transcendental);
        add(OpKind::TransSine, Fixed(1), 0, Real, &[Real], Theory::Transcendental);
        add(OpKind::TransCosine, Fixed(1), 0, Real, &[Real], Theory::Transcendental);
        add(OpKind::TransTangent, Fixed(1), 0, Real, &[Real], Theory::Transcendental);

        cat
    }

    /// Register an operator. Panics on duplicate kinds; a backend
    /// re-registering a builtin is a configuration bug.
    pub fn add_op(&mut self, op: Op) {
        assert!(
            !self.index.contains_key(&op.kind),
            "operator {} registered twice",
            op.kind
        );
        if let Arity::Fixed(n) = op.arity {
            assert_eq!(op.args.len(), n as usize, "schema arity mismatch for {}", op.kind);
        } else {
            assert_eq!(op.args.len(), 1, "variadic schema must have one element kind");
        }
        self.names.insert(op.kind.as_str(), op.kind);
        self.index.insert(op.kind, self.ops.len());
        self.ops.push(op);
    }

    /// Look up an operator.
    #[must_use]
    pub fn get(&self, kind: OpKind) -> Option<&Op> {
        self.index.get(&kind).map(|&i| &self.ops[i])
    }

    /// All registered operators, in registration order.
    #[must_use]
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Resolve a trace tag to an operator kind.
    #[must_use]
    pub fn parse_kind(&self, token: &str) -> Option<OpKind> {
        self.names.get(token).copied()
    }

    /// Operators the fuzzer may choose from: the owning theory and every
    /// theory referenced by the schema are enabled, and the backend does not
    /// reject the kind.
    #[must_use]
    pub fn enabled_ops(&self, theories: &TheorySet, unsupported: &OpKindSet) -> Vec<&Op> {
        self.ops
            .iter()
            .filter(|op| {
                if unsupported.contains(&op.kind) || !theories.contains(&op.theory) {
                    return false;
                }
                let kind_enabled = |kind: SortKind| {
                    kind == SortKind::Any || theories.contains(&kind.theory())
                };
                kind_enabled(op.result) && op.args.iter().copied().all(kind_enabled)
            })
            .collect()
    }
}

impl Default for OpCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theories(list: &[Theory]) -> TheorySet {
        list.iter().copied().collect()
    }

    #[test]
    fn test_builtin_lookup() {
        let cat = OpCatalog::builtin();
        let extract = cat.get(OpKind::BvExtract).unwrap();
        assert_eq!(extract.arity, Arity::Fixed(1));
        assert_eq!(extract.n_params, 2);
        assert_eq!(extract.result, SortKind::Bv);

        let ite = cat.get(OpKind::Ite).unwrap();
        assert_eq!(ite.arity, Arity::Fixed(3));
        assert_eq!(ite.result, SortKind::Any);
    }

    #[test]
    fn test_parse_kind_roundtrip() {
        let cat = OpCatalog::builtin();
        for op in cat.ops() {
            assert_eq!(cat.parse_kind(op.kind.as_str()), Some(op.kind));
        }
        assert_eq!(cat.parse_kind("NO_SUCH_OP"), None);
    }

    #[test]
    fn test_enabled_ops_respects_theories() {
        let cat = OpCatalog::builtin();
        let enabled = cat.enabled_ops(&theories(&[Theory::Bool, Theory::Bv]), &OpKindSet::default());
        assert!(enabled.iter().any(|op| op.kind == OpKind::BvAdd));
        assert!(enabled.iter().any(|op| op.kind == OpKind::Equal));
        // FP ops need the FP theory.
        assert!(!enabled.iter().any(|op| op.kind == OpKind::FpAdd));
        // FP_TO_REAL additionally needs REAL.
        let with_fp = cat.enabled_ops(&theories(&[Theory::Bool, Theory::Fp]), &OpKindSet::default());
        assert!(with_fp.iter().any(|op| op.kind == OpKind::FpAdd));
        assert!(!with_fp.iter().any(|op| op.kind == OpKind::FpToReal));
    }

    #[test]
    fn test_enabled_ops_respects_unsupported() {
        let cat = OpCatalog::builtin();
        let mut unsupported = OpKindSet::default();
        unsupported.insert(OpKind::BvSmod);
        let enabled = cat.enabled_ops(&theories(&[Theory::Bool, Theory::Bv]), &unsupported);
        assert!(!enabled.iter().any(|op| op.kind == OpKind::BvSmod));
        assert!(enabled.iter().any(|op| op.kind == OpKind::BvSrem));
    }

    #[test]
    fn test_custom_op_registration() {
        let mut cat = OpCatalog::builtin();
        cat.add_op(Op {
            kind: OpKind::Custom("mock-BV_REDOR"),
            arity: Arity::Fixed(1),
            n_params: 0,
            result: SortKind::Bv,
            args: ArgSchema::from_slice(&[SortKind::Bv]),
            theory: Theory::Bv,
        });
        assert_eq!(
            cat.parse_kind("mock-BV_REDOR"),
            Some(OpKind::Custom("mock-BV_REDOR"))
        );
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn test_duplicate_registration_panics() {
        let mut cat = OpCatalog::builtin();
        cat.add_op(Op {
            kind: OpKind::And,
            arity: Arity::Nary,
            n_params: 0,
            result: SortKind::Bool,
            args: ArgSchema::from_slice(&[SortKind::Bool]),
            theory: Theory::Bool,
        });
    }
}
