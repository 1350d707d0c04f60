//! In-Memory Mock Backend.
//!
//! A structural solver: sorts and terms are plain reference-counted nodes,
//! `mk_term` type-checks every application against the operator's SMT-LIB
//! signature and computes the exact result sort, and `check_sat` decides a
//! tiny fragment (an asserted `false`, value-distinct equalities, and a
//! constant bound to two different values) that is enough to drive the
//! engine through sat and unsat paths deterministically.
//!
//! Every API call is appended to a canonical call log, which the trace
//! round-trip tests compare between generation and replay.

use std::any::Any;
use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use num_bigint::BigUint;
use rustc_hash::FxHashMap;

use skelter_core::op::{ArgSchema, Arity, Op, OpCatalog, OpKind, OpKindSet};
use skelter_core::sort::{BackendSort, Sort, SortImpl};
use skelter_core::term::{BackendTerm, SpecialValueKind, Term, TermImpl};
use skelter_core::theory::{ALL_THEORIES, SortKind, Theory};

use skelter_fuzzer::options::{OptionRegistry, SolverOption};
use skelter_fuzzer::solver::{Base, SatResult, Solver, SolverError, SolverResult};

/// Backend name, also the namespace prefix of mock-private tags.
const NAME: &str = "mock";

/// The mock's solver-private operator: unary or-reduction of a bit-vector
/// to width 1.
pub const MOCK_BV_REDOR: OpKind = OpKind::Custom("mock-BV_REDOR");

// ---------------------------------------------------------------------
// Sorts.

/// Structural sort node.
#[derive(Debug)]
pub struct MockSort {
    kind: SortKind,
    width: u32,
    exp: u32,
    sig: u32,
    children: Vec<Rc<MockSort>>,
}

impl MockSort {
    fn atomic(kind: SortKind) -> Rc<Self> {
        Rc::new(Self {
            kind,
            width: 0,
            exp: 0,
            sig: 0,
            children: Vec::new(),
        })
    }

    fn bv(width: u32) -> Rc<Self> {
        Rc::new(Self {
            kind: SortKind::Bv,
            width,
            exp: 0,
            sig: 0,
            children: Vec::new(),
        })
    }

    fn fp(exp: u32, sig: u32) -> Rc<Self> {
        Rc::new(Self {
            kind: SortKind::Fp,
            width: 0,
            exp,
            sig,
            children: Vec::new(),
        })
    }

    fn composite(kind: SortKind, children: Vec<Rc<MockSort>>) -> Rc<Self> {
        Rc::new(Self {
            kind,
            width: 0,
            exp: 0,
            sig: 0,
            children,
        })
    }

    fn structural_eq(&self, other: &MockSort) -> bool {
        self.kind == other.kind
            && self.width == other.width
            && self.exp == other.exp
            && self.sig == other.sig
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.structural_eq(b))
    }

    fn structural_hash(&self) -> u64 {
        let mut h = 0xcbf2_9ce4_8422_2325u64;
        let mut mix = |v: u64| {
            h ^= v;
            h = h.wrapping_mul(0x0000_0100_0000_01b3);
        };
        mix(self.kind as u64);
        mix(u64::from(self.width));
        mix(u64::from(self.exp));
        mix(u64::from(self.sig));
        for c in &self.children {
            mix(c.structural_hash());
        }
        h
    }

    fn render(&self) -> String {
        match self.kind {
            SortKind::Bv => format!("(_ BitVec {})", self.width),
            SortKind::Fp => format!("(_ FloatingPoint {} {})", self.exp, self.sig),
            kind if self.children.is_empty() => kind.to_string(),
            kind => {
                let mut out = format!("({kind}");
                for c in &self.children {
                    let _ = write!(out, " {}", c.render());
                }
                out.push(')');
                out
            }
        }
    }
}

impl SortImpl for MockSort {
    fn equals(&self, other: &dyn SortImpl) -> bool {
        other
            .as_any()
            .downcast_ref::<MockSort>()
            .is_some_and(|o| self.structural_eq(o))
    }

    fn hash_value(&self) -> u64 {
        self.structural_hash()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn bv_width(&self) -> Option<u32> {
        (self.kind == SortKind::Bv).then_some(self.width)
    }

    fn fp_exp_width(&self) -> Option<u32> {
        (self.kind == SortKind::Fp).then_some(self.exp)
    }

    fn fp_sig_width(&self) -> Option<u32> {
        (self.kind == SortKind::Fp).then_some(self.sig)
    }
}

// ---------------------------------------------------------------------
// Terms.

#[derive(Debug)]
enum MockNode {
    /// Canonical value literal (decimal for numerals, raw for strings).
    Value(String),
    Special(SpecialValueKind),
    Const(String),
    Var(String),
    App(OpKind, Vec<BackendTerm>, Vec<u32>),
}

/// Structural term node.
#[derive(Debug)]
pub struct MockTerm {
    node: MockNode,
    sort: Rc<MockSort>,
}

impl MockTerm {
    fn new(node: MockNode, sort: Rc<MockSort>) -> Rc<Self> {
        Rc::new(Self { node, sort })
    }

    fn render(&self) -> String {
        match &self.node {
            MockNode::Value(v) => format!("(val {v} {})", self.sort.render()),
            MockNode::Special(sv) => format!("(special {sv})"),
            MockNode::Const(name) => name.clone(),
            MockNode::Var(name) => format!("(var {name})"),
            MockNode::App(kind, args, params) => {
                let mut out = format!("({kind}");
                for p in params {
                    let _ = write!(out, " [{p}]");
                }
                for a in args {
                    let _ = write!(out, " {}", render_backend(a));
                }
                out.push(')');
                out
            }
        }
    }
}

fn render_backend(term: &BackendTerm) -> String {
    term.as_any()
        .downcast_ref::<MockTerm>()
        .map_or_else(|| "<foreign>".to_string(), MockTerm::render)
}

impl TermImpl for MockTerm {
    fn equals(&self, other: &dyn TermImpl) -> bool {
        let Some(o) = other.as_any().downcast_ref::<MockTerm>() else {
            return false;
        };
        if !self.sort.structural_eq(&o.sort) {
            return false;
        }
        match (&self.node, &o.node) {
            (MockNode::Value(a), MockNode::Value(b)) => a == b,
            (MockNode::Special(a), MockNode::Special(b)) => a == b,
            (MockNode::Const(a), MockNode::Const(b)) | (MockNode::Var(a), MockNode::Var(b)) => {
                a == b
            }
            (MockNode::App(ka, aa, pa), MockNode::App(kb, ab, pb)) => {
                ka == kb
                    && pa == pb
                    && aa.len() == ab.len()
                    && aa.iter().zip(ab).all(|(x, y)| x.equals(y.as_ref()))
            }
            _ => false,
        }
    }

    fn hash_value(&self) -> u64 {
        let mut h = 0xcbf2_9ce4_8422_2325u64;
        let mut mix = |v: u64| {
            h ^= v;
            h = h.wrapping_mul(0x0000_0100_0000_01b3);
        };
        mix(self.sort.structural_hash());
        match &self.node {
            MockNode::Value(v) => {
                mix(1);
                for b in v.bytes() {
                    mix(u64::from(b));
                }
            }
            MockNode::Special(sv) => {
                mix(2);
                mix(*sv as u64);
            }
            MockNode::Const(name) => {
                mix(3);
                for b in name.bytes() {
                    mix(u64::from(b));
                }
            }
            MockNode::Var(name) => {
                mix(4);
                for b in name.bytes() {
                    mix(u64::from(b));
                }
            }
            MockNode::App(kind, args, params) => {
                mix(5);
                for b in kind.as_str().bytes() {
                    mix(u64::from(b));
                }
                for p in params {
                    mix(u64::from(*p));
                }
                for a in args {
                    mix(a.hash_value());
                }
            }
        }
        h
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ---------------------------------------------------------------------
// Capabilities.

/// What the mock advertises; tests override fields to exercise capability
/// filtering.
#[derive(Debug, Clone)]
pub struct MockCapabilities {
    /// Theories reported by `supported_theories`.
    pub theories: Vec<Theory>,
    /// Operator kinds reported as unsupported.
    pub unsupported_ops: OpKindSet,
    /// Whether `reset_assertions` is advertised.
    pub reset_assertions: bool,
}

impl Default for MockCapabilities {
    fn default() -> Self {
        Self {
            theories: ALL_THEORIES.to_vec(),
            unsupported_ops: OpKindSet::default(),
            reset_assertions: true,
        }
    }
}

// ---------------------------------------------------------------------
// The solver.

/// The mock backend.
pub struct MockSolver {
    caps: MockCapabilities,
    initialized: bool,
    options: FxHashMap<String, String>,
    consts: Vec<Rc<MockTerm>>,
    assertions: Vec<Vec<BackendTerm>>,
    last_assumptions: Vec<BackendTerm>,
    last_result: Option<SatResult>,
    last_unsat_assumptions: Vec<BackendTerm>,
    calls: Rc<RefCell<Vec<String>>>,
}

impl Default for MockSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MockSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSolver")
            .field("initialized", &self.initialized)
            .field("n_calls", &self.calls.borrow().len())
            .finish_non_exhaustive()
    }
}

impl MockSolver {
    /// A mock with default capabilities (everything supported).
    #[must_use]
    pub fn new() -> Self {
        Self::with_capabilities(MockCapabilities::default())
    }

    /// A mock with explicit capabilities.
    #[must_use]
    pub fn with_capabilities(caps: MockCapabilities) -> Self {
        Self {
            caps,
            initialized: false,
            options: FxHashMap::default(),
            consts: Vec::new(),
            assertions: vec![Vec::new()],
            last_assumptions: Vec::new(),
            last_result: None,
            last_unsat_assumptions: Vec::new(),
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// A snapshot of the canonical log of every API call issued so far.
    #[must_use]
    pub fn call_log(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// A handle onto the live call log; stays readable after the solver is
    /// boxed and moved into the engine.
    #[must_use]
    pub fn log_handle(&self) -> Rc<RefCell<Vec<String>>> {
        Rc::clone(&self.calls)
    }

    fn log(&mut self, entry: String) {
        self.calls.borrow_mut().push(entry);
    }

    fn err(&self, call: &'static str, message: impl Into<String>) -> SolverError {
        SolverError::new(NAME, call, message)
    }

    fn require_init(&self, call: &'static str) -> SolverResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(self.err(call, "solver not initialized"))
        }
    }

    fn option_true(&self, name: &str) -> bool {
        self.options.get(name).is_some_and(|v| v == "true")
    }

    fn down_sort<'a>(&self, sort: &'a Sort, call: &'static str) -> SolverResult<&'a MockSort> {
        sort.backend()
            .as_any()
            .downcast_ref::<MockSort>()
            .ok_or_else(|| self.err(call, "foreign sort handle"))
    }

    fn down_term<'a>(&self, term: &'a Term, call: &'static str) -> SolverResult<&'a MockTerm> {
        term.backend()
            .as_any()
            .downcast_ref::<MockTerm>()
            .ok_or_else(|| self.err(call, "foreign term handle"))
    }

    fn rc_sort(&self, sort: &Sort, call: &'static str) -> SolverResult<Rc<MockSort>> {
        let m = self.down_sort(sort, call)?;
        Ok(Rc::new(MockSort {
            kind: m.kind,
            width: m.width,
            exp: m.exp,
            sig: m.sig,
            children: m.children.clone(),
        }))
    }

    /// All formulas currently constraining the solver, assumptions last.
    fn live_formulas(&self) -> Vec<(BackendTerm, bool)> {
        let mut formulas: Vec<(BackendTerm, bool)> = self
            .assertions
            .iter()
            .flatten()
            .map(|t| (Rc::clone(t), false))
            .collect();
        formulas.extend(self.last_assumptions.iter().map(|t| (Rc::clone(t), true)));
        formulas
    }

    /// The decided fragment: asserted `false`, value-distinct equalities,
    /// and conflicting constant bindings.
    fn decide(&mut self) -> SatResult {
        let formulas = self.live_formulas();
        self.last_unsat_assumptions.clear();

        let mut bindings: FxHashMap<String, (String, usize)> = FxHashMap::default();
        for (idx, (formula, _)) in formulas.iter().enumerate() {
            let Some(term) = formula.as_any().downcast_ref::<MockTerm>() else {
                continue;
            };
            match &term.node {
                MockNode::Value(v) if term.sort.kind == SortKind::Bool && v == "false" => {
                    return self.conclude_unsat(&formulas, &[idx]);
                }
                MockNode::App(OpKind::Equal, args, _) => {
                    let nodes: Vec<&MockTerm> = args
                        .iter()
                        .filter_map(|a| a.as_any().downcast_ref::<MockTerm>())
                        .collect();
                    let values: Vec<&String> = nodes
                        .iter()
                        .filter_map(|n| match &n.node {
                            MockNode::Value(v) => Some(v),
                            _ => None,
                        })
                        .collect();
                    if values.len() == nodes.len()
                        && values.windows(2).any(|w| w[0] != w[1])
                    {
                        return self.conclude_unsat(&formulas, &[idx]);
                    }
                    let constant = nodes.iter().find_map(|n| match &n.node {
                        MockNode::Const(name) => Some(name.clone()),
                        _ => None,
                    });
                    if let (Some(name), Some(value)) = (constant, values.first()) {
                        if let Some((bound, prev_idx)) = bindings.get(&name) {
                            if bound != *value {
                                let involved = [*prev_idx, idx];
                                return self.conclude_unsat(&formulas, &involved);
                            }
                        } else {
                            bindings.insert(name, ((*value).clone(), idx));
                        }
                    }
                }
                _ => {}
            }
        }
        SatResult::Sat
    }

    fn conclude_unsat(
        &mut self,
        formulas: &[(BackendTerm, bool)],
        involved: &[usize],
    ) -> SatResult {
        self.last_unsat_assumptions = involved
            .iter()
            .filter(|&&i| formulas[i].1)
            .map(|&i| Rc::clone(&formulas[i].0))
            .collect();
        SatResult::Unsat
    }

    fn default_value(&self, sort: &Rc<MockSort>) -> BackendTerm {
        let node = match sort.kind {
            SortKind::Bool => MockNode::Value("false".to_string()),
            SortKind::Int | SortKind::Bv => MockNode::Value("0".to_string()),
            SortKind::Real => MockNode::Value("0.0".to_string()),
            SortKind::String => MockNode::Value(String::new()),
            SortKind::Rm => MockNode::Special(SpecialValueKind::RmRne),
            SortKind::Fp => MockNode::Special(SpecialValueKind::FpPosZero),
            _ => MockNode::Const("@default".to_string()),
        };
        MockTerm::new(node, Rc::clone(sort))
    }

    fn check_same_sorts(
        &self,
        call: &'static str,
        nodes: &[&MockTerm],
    ) -> SolverResult<()> {
        if nodes
            .windows(2)
            .all(|w| w[0].sort.structural_eq(&w[1].sort))
        {
            Ok(())
        } else {
            Err(self.err(call, "argument sorts differ"))
        }
    }

    fn check_kinds(
        &self,
        call: &'static str,
        nodes: &[&MockTerm],
        kind: SortKind,
    ) -> SolverResult<()> {
        if nodes.iter().all(|n| n.sort.kind == kind) {
            Ok(())
        } else {
            Err(self.err(call, format!("expected {kind} arguments")))
        }
    }

    /// Type-check an application and compute its result sort.
    #[allow(clippy::too_many_lines)]
    fn result_sort(
        &self,
        kind: OpKind,
        nodes: &[&MockTerm],
        params: &[u32],
    ) -> SolverResult<Rc<MockSort>> {
        const CALL: &str = "mk_term";
        let arity_err = || self.err(CALL, format!("wrong arity for {kind}"));
        let arg = |i: usize| -> SolverResult<&&MockTerm> { nodes.get(i).ok_or_else(arity_err) };
        let split = |i: usize| -> SolverResult<(&[&MockTerm], &[&MockTerm])> {
            if nodes.len() < i {
                Err(arity_err())
            } else {
                Ok(nodes.split_at(i))
            }
        };
        let param = |i: usize| -> SolverResult<u32> {
            params
                .get(i)
                .copied()
                .ok_or_else(|| self.err(CALL, format!("missing parameter for {kind}")))
        };

        let sort = match kind {
            OpKind::And | OpKind::Or | OpKind::Xor | OpKind::Implies | OpKind::Not => {
                self.check_kinds(CALL, nodes, SortKind::Bool)?;
                MockSort::atomic(SortKind::Bool)
            }
            OpKind::Equal | OpKind::Distinct => {
                self.check_same_sorts(CALL, nodes)?;
                MockSort::atomic(SortKind::Bool)
            }
            OpKind::Ite => {
                if arg(0)?.sort.kind != SortKind::Bool {
                    return Err(self.err(CALL, "ite condition must be Bool"));
                }
                self.check_same_sorts(CALL, split(1)?.1)?;
                Rc::clone(&arg(1)?.sort)
            }
            OpKind::BvConcat => {
                self.check_kinds(CALL, nodes, SortKind::Bv)?;
                MockSort::bv(nodes.iter().map(|n| n.sort.width).sum())
            }
            OpKind::BvAnd
            | OpKind::BvOr
            | OpKind::BvXor
            | OpKind::BvMul
            | OpKind::BvAdd
            | OpKind::BvSub
            | OpKind::BvNand
            | OpKind::BvNor
            | OpKind::BvXnor
            | OpKind::BvUdiv
            | OpKind::BvUrem
            | OpKind::BvSdiv
            | OpKind::BvSrem
            | OpKind::BvSmod
            | OpKind::BvShl
            | OpKind::BvLshr
            | OpKind::BvAshr => {
                self.check_kinds(CALL, nodes, SortKind::Bv)?;
                self.check_same_sorts(CALL, nodes)?;
                Rc::clone(&arg(0)?.sort)
            }
            OpKind::BvNot | OpKind::BvNeg => {
                self.check_kinds(CALL, nodes, SortKind::Bv)?;
                Rc::clone(&arg(0)?.sort)
            }
            OpKind::BvComp => {
                self.check_kinds(CALL, nodes, SortKind::Bv)?;
                self.check_same_sorts(CALL, nodes)?;
                MockSort::bv(1)
            }
            OpKind::BvUlt
            | OpKind::BvUle
            | OpKind::BvUgt
            | OpKind::BvUge
            | OpKind::BvSlt
            | OpKind::BvSle
            | OpKind::BvSgt
            | OpKind::BvSge => {
                self.check_kinds(CALL, nodes, SortKind::Bv)?;
                self.check_same_sorts(CALL, nodes)?;
                MockSort::atomic(SortKind::Bool)
            }
            OpKind::BvExtract => {
                let node = arg(0)?;
                self.check_kinds(CALL, nodes, SortKind::Bv)?;
                let (hi, lo) = (param(0)?, param(1)?);
                if hi >= node.sort.width || lo > hi {
                    return Err(self.err(CALL, "extract indices out of range"));
                }
                MockSort::bv(hi - lo + 1)
            }
            OpKind::BvRepeat => {
                let node = arg(0)?;
                self.check_kinds(CALL, nodes, SortKind::Bv)?;
                let n = param(0)?;
                if n == 0 {
                    return Err(self.err(CALL, "repeat count must be positive"));
                }
                MockSort::bv(node.sort.width * n)
            }
            OpKind::BvRotateLeft | OpKind::BvRotateRight => {
                self.check_kinds(CALL, nodes, SortKind::Bv)?;
                Rc::clone(&arg(0)?.sort)
            }
            OpKind::BvSignExtend | OpKind::BvZeroExtend => {
                let node = arg(0)?;
                self.check_kinds(CALL, nodes, SortKind::Bv)?;
                MockSort::bv(node.sort.width + param(0)?)
            }
            OpKind::FpAbs | OpKind::FpNeg => {
                self.check_kinds(CALL, nodes, SortKind::Fp)?;
                Rc::clone(&arg(0)?.sort)
            }
            OpKind::FpAdd | OpKind::FpSub | OpKind::FpMul | OpKind::FpDiv | OpKind::FpFma => {
                let (rm, rest) = split(1)?;
                self.check_kinds(CALL, rm, SortKind::Rm)?;
                self.check_kinds(CALL, rest, SortKind::Fp)?;
                self.check_same_sorts(CALL, rest)?;
                Rc::clone(&arg(1)?.sort)
            }
            OpKind::FpSqrt | OpKind::FpRti => {
                let (rm, rest) = split(1)?;
                self.check_kinds(CALL, rm, SortKind::Rm)?;
                self.check_kinds(CALL, rest, SortKind::Fp)?;
                Rc::clone(&arg(1)?.sort)
            }
            OpKind::FpRem | OpKind::FpMin | OpKind::FpMax => {
                self.check_kinds(CALL, nodes, SortKind::Fp)?;
                self.check_same_sorts(CALL, nodes)?;
                Rc::clone(&arg(0)?.sort)
            }
            OpKind::FpEq | OpKind::FpLt | OpKind::FpLeq | OpKind::FpGt | OpKind::FpGeq => {
                self.check_kinds(CALL, nodes, SortKind::Fp)?;
                self.check_same_sorts(CALL, nodes)?;
                MockSort::atomic(SortKind::Bool)
            }
            OpKind::FpIsNormal
            | OpKind::FpIsSubnormal
            | OpKind::FpIsInf
            | OpKind::FpIsNan
            | OpKind::FpIsNeg
            | OpKind::FpIsPos
            | OpKind::FpIsZero => {
                self.check_kinds(CALL, nodes, SortKind::Fp)?;
                MockSort::atomic(SortKind::Bool)
            }
            OpKind::FpFp => {
                self.check_kinds(CALL, nodes, SortKind::Bv)?;
                if arg(0)?.sort.width != 1 {
                    return Err(self.err(CALL, "fp sign component must be one bit"));
                }
                MockSort::fp(arg(1)?.sort.width, arg(2)?.sort.width + 1)
            }
            OpKind::FpToFpFromBv => {
                let node = arg(0)?;
                self.check_kinds(CALL, nodes, SortKind::Bv)?;
                let (exp, sig) = (param(0)?, param(1)?);
                if node.sort.width != exp + sig {
                    return Err(self.err(CALL, "to_fp width must equal exp + sig"));
                }
                MockSort::fp(exp, sig)
            }
            OpKind::FpToFpFromSbv | OpKind::FpToFpFromUbv => {
                let (rm, rest) = split(1)?;
                self.check_kinds(CALL, rm, SortKind::Rm)?;
                self.check_kinds(CALL, rest, SortKind::Bv)?;
                MockSort::fp(param(0)?, param(1)?)
            }
            OpKind::FpToFpFromFp => {
                let (rm, rest) = split(1)?;
                self.check_kinds(CALL, rm, SortKind::Rm)?;
                self.check_kinds(CALL, rest, SortKind::Fp)?;
                MockSort::fp(param(0)?, param(1)?)
            }
            OpKind::FpToFpFromReal => {
                let (rm, rest) = split(1)?;
                self.check_kinds(CALL, rm, SortKind::Rm)?;
                self.check_kinds(CALL, rest, SortKind::Real)?;
                MockSort::fp(param(0)?, param(1)?)
            }
            OpKind::FpToSbv | OpKind::FpToUbv => {
                let (rm, rest) = split(1)?;
                self.check_kinds(CALL, rm, SortKind::Rm)?;
                self.check_kinds(CALL, rest, SortKind::Fp)?;
                MockSort::bv(param(0)?)
            }
            OpKind::FpToReal => {
                self.check_kinds(CALL, nodes, SortKind::Fp)?;
                MockSort::atomic(SortKind::Real)
            }
            OpKind::IntNeg
            | OpKind::IntAbs
            | OpKind::IntSub
            | OpKind::IntAdd
            | OpKind::IntMul
            | OpKind::IntDiv
            | OpKind::IntMod => {
                self.check_kinds(CALL, nodes, SortKind::Int)?;
                MockSort::atomic(SortKind::Int)
            }
            OpKind::IntLt | OpKind::IntLte | OpKind::IntGt | OpKind::IntGte | OpKind::IntIsDiv => {
                self.check_kinds(CALL, nodes, SortKind::Int)?;
                MockSort::atomic(SortKind::Bool)
            }
            OpKind::IntToReal => {
                self.check_kinds(CALL, nodes, SortKind::Int)?;
                MockSort::atomic(SortKind::Real)
            }
            OpKind::RealNeg
            | OpKind::RealSub
            | OpKind::RealAdd
            | OpKind::RealMul
            | OpKind::RealDiv => {
                self.check_kinds(CALL, nodes, SortKind::Real)?;
                MockSort::atomic(SortKind::Real)
            }
            OpKind::RealLt | OpKind::RealLte | OpKind::RealGt | OpKind::RealGte => {
                self.check_kinds(CALL, nodes, SortKind::Real)?;
                MockSort::atomic(SortKind::Bool)
            }
            OpKind::RealIsInt => {
                self.check_kinds(CALL, nodes, SortKind::Real)?;
                MockSort::atomic(SortKind::Bool)
            }
            OpKind::RealToInt => {
                self.check_kinds(CALL, nodes, SortKind::Real)?;
                MockSort::atomic(SortKind::Int)
            }
            OpKind::ArraySelect => {
                let array = arg(0)?;
                if array.sort.kind != SortKind::Array {
                    return Err(self.err(CALL, "select on non-array"));
                }
                if !arg(1)?.sort.structural_eq(&array.sort.children[0]) {
                    return Err(self.err(CALL, "select index sort mismatch"));
                }
                Rc::clone(&array.sort.children[1])
            }
            OpKind::ArrayStore => {
                let array = arg(0)?;
                if array.sort.kind != SortKind::Array {
                    return Err(self.err(CALL, "store on non-array"));
                }
                if !arg(1)?.sort.structural_eq(&array.sort.children[0]) {
                    return Err(self.err(CALL, "store index sort mismatch"));
                }
                if !arg(2)?.sort.structural_eq(&array.sort.children[1]) {
                    return Err(self.err(CALL, "store element sort mismatch"));
                }
                Rc::clone(&array.sort)
            }
            OpKind::Forall | OpKind::Exists => {
                if !matches!(arg(0)?.node, MockNode::Var(_)) {
                    return Err(self.err(CALL, "binder without variable"));
                }
                if arg(1)?.sort.kind != SortKind::Bool {
                    return Err(self.err(CALL, "binder body must be Bool"));
                }
                MockSort::atomic(SortKind::Bool)
            }
            OpKind::UfApply => {
                let fun = arg(0)?;
                if fun.sort.kind != SortKind::Fun {
                    return Err(self.err(CALL, "apply on non-function"));
                }
                let domain = &fun.sort.children[..fun.sort.children.len() - 1];
                if nodes.len() - 1 != domain.len() {
                    return Err(arity_err());
                }
                for (node, expected) in nodes[1..].iter().zip(domain) {
                    if !node.sort.structural_eq(expected) {
                        return Err(self.err(CALL, "apply argument sort mismatch"));
                    }
                }
                Rc::clone(&fun.sort.children[fun.sort.children.len() - 1])
            }
            OpKind::StrConcat => {
                self.check_kinds(CALL, nodes, SortKind::String)?;
                MockSort::atomic(SortKind::String)
            }
            OpKind::StrLen | OpKind::StrToCode | OpKind::StrToInt => {
                self.check_kinds(CALL, nodes, SortKind::String)?;
                MockSort::atomic(SortKind::Int)
            }
            OpKind::StrLt
            | OpKind::StrPrefixof
            | OpKind::StrSuffixof
            | OpKind::StrContains
            | OpKind::StrIsDigit => {
                self.check_kinds(CALL, nodes, SortKind::String)?;
                MockSort::atomic(SortKind::Bool)
            }
            OpKind::StrAt | OpKind::StrSubstr => {
                let (s, idx) = split(1)?;
                self.check_kinds(CALL, s, SortKind::String)?;
                self.check_kinds(CALL, idx, SortKind::Int)?;
                MockSort::atomic(SortKind::String)
            }
            OpKind::StrIndexof => {
                let (s, idx) = split(2)?;
                self.check_kinds(CALL, s, SortKind::String)?;
                self.check_kinds(CALL, idx, SortKind::Int)?;
                MockSort::atomic(SortKind::Int)
            }
            OpKind::StrReplace | OpKind::StrReplaceAll => {
                self.check_kinds(CALL, nodes, SortKind::String)?;
                MockSort::atomic(SortKind::String)
            }
            OpKind::StrFromCode | OpKind::StrFromInt => {
                self.check_kinds(CALL, nodes, SortKind::Int)?;
                MockSort::atomic(SortKind::String)
            }
            OpKind::StrToRe => {
                self.check_kinds(CALL, nodes, SortKind::String)?;
                MockSort::atomic(SortKind::Reglan)
            }
            OpKind::StrInRe => {
                let (s, re) = split(1)?;
                self.check_kinds(CALL, s, SortKind::String)?;
                self.check_kinds(CALL, re, SortKind::Reglan)?;
                MockSort::atomic(SortKind::Bool)
            }
            OpKind::ReConcat
            | OpKind::ReUnion
            | OpKind::ReInter
            | OpKind::ReStar
            | OpKind::RePlus
            | OpKind::ReOpt
            | OpKind::ReComp => {
                self.check_kinds(CALL, nodes, SortKind::Reglan)?;
                MockSort::atomic(SortKind::Reglan)
            }
            OpKind::ReRange => {
                self.check_kinds(CALL, nodes, SortKind::String)?;
                MockSort::atomic(SortKind::Reglan)
            }
            OpKind::ReNone | OpKind::ReAll | OpKind::ReAllchar => {
                MockSort::atomic(SortKind::Reglan)
            }
            OpKind::TransPi => MockSort::atomic(SortKind::Real),
            OpKind::TransSine | OpKind::TransCosine | OpKind::TransTangent => {
                self.check_kinds(CALL, nodes, SortKind::Real)?;
                MockSort::atomic(SortKind::Real)
            }
            kind if kind == MOCK_BV_REDOR => {
                self.check_kinds(CALL, nodes, SortKind::Bv)?;
                MockSort::bv(1)
            }
            other => {
                return Err(self.err(CALL, format!("unsupported operator {other}")));
            }
        };
        Ok(sort)
    }
}

impl Solver for MockSolver {
    fn name(&self) -> &'static str {
        NAME
    }

    fn new_solver(&mut self) {
        self.initialized = true;
        self.options.clear();
        self.consts.clear();
        self.assertions = vec![Vec::new()];
        self.last_assumptions.clear();
        self.last_result = None;
        self.last_unsat_assumptions.clear();
        self.log("new_solver".to_string());
    }

    fn delete_solver(&mut self) {
        self.initialized = false;
        self.log("delete_solver".to_string());
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn supported_theories(&self) -> Vec<Theory> {
        self.caps.theories.clone()
    }

    fn unsupported_op_kinds(&self) -> OpKindSet {
        self.caps.unsupported_ops.clone()
    }

    fn supports_reset_assertions(&self) -> bool {
        self.caps.reset_assertions
    }

    fn configure_ops(&self, catalog: &mut OpCatalog) {
        catalog.add_op(Op {
            kind: MOCK_BV_REDOR,
            arity: Arity::Fixed(1),
            n_params: 0,
            result: SortKind::Bv,
            args: ArgSchema::from_slice(&[SortKind::Bv]),
            theory: Theory::Bv,
        });
    }

    fn configure_options(&self, options: &mut OptionRegistry) {
        options.add(SolverOption::bool_opt("incremental", false));
        options.add(SolverOption::bool_opt("produce-models", false));
        options.add(SolverOption::bool_opt("produce-unsat-assumptions", false));
        options.add(SolverOption::bool_opt("produce-unsat-cores", false));
        options.add(SolverOption::num_opt("seed", 0, u64::from(u32::MAX), 0));
        options.add(SolverOption::list_opt(
            "sat-engine",
            ["cadical", "kissat", "minisat"],
            "cadical",
        ));
        options.add(
            SolverOption::bool_opt("eager-bitblast", false).conflicts_with("lazy-bitblast"),
        );
        options.add(
            SolverOption::bool_opt("lazy-bitblast", false).conflicts_with("eager-bitblast"),
        );
        options.add(
            SolverOption::bool_opt("model-compress", false).depends_on("produce-models"),
        );
    }

    fn mk_sort_atomic(&mut self, kind: SortKind) -> SolverResult<BackendSort> {
        self.require_init("mk_sort")?;
        match kind {
            SortKind::Bool
            | SortKind::Int
            | SortKind::Real
            | SortKind::String
            | SortKind::Reglan
            | SortKind::Rm => {
                let sort = MockSort::atomic(kind);
                self.log(format!("mk_sort {}", sort.render()));
                Ok(sort)
            }
            other => Err(self.err("mk_sort", format!("{other} is not atomic"))),
        }
    }

    fn mk_sort_bv(&mut self, width: u32) -> SolverResult<BackendSort> {
        self.require_init("mk_sort")?;
        if width == 0 {
            return Err(self.err("mk_sort", "zero-width bit-vector"));
        }
        let sort = MockSort::bv(width);
        self.log(format!("mk_sort {}", sort.render()));
        Ok(sort)
    }

    fn mk_sort_fp(&mut self, exp: u32, sig: u32) -> SolverResult<BackendSort> {
        self.require_init("mk_sort")?;
        if exp < 2 || sig < 2 {
            return Err(self.err("mk_sort", "floating-point widths must be at least 2"));
        }
        let sort = MockSort::fp(exp, sig);
        self.log(format!("mk_sort {}", sort.render()));
        Ok(sort)
    }

    fn mk_sort_composite(&mut self, kind: SortKind, children: &[Sort]) -> SolverResult<BackendSort> {
        self.require_init("mk_sort")?;
        let expected = match kind {
            SortKind::Array => 2..=2,
            SortKind::Bag | SortKind::Seq | SortKind::Set => 1..=1,
            SortKind::Fun => 2..=usize::MAX,
            other => return Err(self.err("mk_sort", format!("{other} is not composite"))),
        };
        if !expected.contains(&children.len()) {
            return Err(self.err("mk_sort", "wrong number of child sorts"));
        }
        let children: Vec<Rc<MockSort>> = children
            .iter()
            .map(|c| self.rc_sort(c, "mk_sort"))
            .collect::<SolverResult<_>>()?;
        let sort = MockSort::composite(kind, children);
        self.log(format!("mk_sort {}", sort.render()));
        Ok(sort)
    }

    fn mk_const(&mut self, sort: &Sort, name: &str) -> SolverResult<BackendTerm> {
        self.require_init("mk_const")?;
        let msort = self.rc_sort(sort, "mk_const")?;
        let term = MockTerm::new(MockNode::Const(name.to_string()), Rc::clone(&msort));
        self.consts.push(Rc::clone(&term));
        self.log(format!("mk_const {} {name}", msort.render()));
        Ok(term)
    }

    fn mk_var(&mut self, sort: &Sort, name: &str) -> SolverResult<BackendTerm> {
        self.require_init("mk_var")?;
        let msort = self.rc_sort(sort, "mk_var")?;
        self.log(format!("mk_var {} {name}", msort.render()));
        Ok(MockTerm::new(MockNode::Var(name.to_string()), msort))
    }

    fn mk_value_bool(&mut self, sort: &Sort, value: bool) -> SolverResult<BackendTerm> {
        self.require_init("mk_value")?;
        let msort = self.rc_sort(sort, "mk_value")?;
        if msort.kind != SortKind::Bool {
            return Err(self.err("mk_value", "Boolean value for non-Bool sort"));
        }
        self.log(format!("mk_value Bool {value}"));
        Ok(MockTerm::new(MockNode::Value(value.to_string()), msort))
    }

    fn mk_value_str(&mut self, sort: &Sort, value: &str, base: Base) -> SolverResult<BackendTerm> {
        self.require_init("mk_value")?;
        let msort = self.rc_sort(sort, "mk_value")?;
        let canonical = match msort.kind {
            SortKind::Bv => {
                let parsed = BigUint::parse_bytes(value.as_bytes(), base.radix())
                    .ok_or_else(|| self.err("mk_value", "malformed bit-vector numeral"))?;
                if parsed.bits() > u64::from(msort.width) {
                    return Err(self.err("mk_value", "bit-vector numeral exceeds width"));
                }
                parsed.to_str_radix(10)
            }
            SortKind::Int => {
                let digits = value.strip_prefix('-').unwrap_or(value);
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(self.err("mk_value", "malformed integer numeral"));
                }
                value.to_string()
            }
            SortKind::Real => {
                let digits = value.strip_prefix('-').unwrap_or(value);
                let ok = match digits.split_once('.') {
                    Some((a, b)) => {
                        !a.is_empty()
                            && !b.is_empty()
                            && a.bytes().all(|c| c.is_ascii_digit())
                            && b.bytes().all(|c| c.is_ascii_digit())
                    }
                    None => !digits.is_empty() && digits.bytes().all(|c| c.is_ascii_digit()),
                };
                if !ok {
                    return Err(self.err("mk_value", "malformed real numeral"));
                }
                value.to_string()
            }
            SortKind::String => value.to_string(),
            other => {
                return Err(self.err("mk_value", format!("no string values for {other}")));
            }
        };
        self.log(format!("mk_value {} {canonical:?}", msort.render()));
        Ok(MockTerm::new(MockNode::Value(canonical), msort))
    }

    fn mk_special_value(
        &mut self,
        sort: &Sort,
        value: SpecialValueKind,
    ) -> SolverResult<BackendTerm> {
        self.require_init("mk_special_value")?;
        let msort = self.rc_sort(sort, "mk_special_value")?;
        let valid = SpecialValueKind::for_sort_kind(msort.kind).contains(&value);
        if !valid {
            return Err(self.err(
                "mk_special_value",
                format!("{value} undefined for {} sorts", msort.kind),
            ));
        }
        self.log(format!("mk_special_value {} {value}", msort.render()));
        Ok(MockTerm::new(MockNode::Special(value), msort))
    }

    fn mk_term(&mut self, kind: OpKind, args: &[Term], params: &[u32]) -> SolverResult<BackendTerm> {
        self.require_init("mk_term")?;
        let nodes: Vec<&MockTerm> = args
            .iter()
            .map(|a| self.down_term(a, "mk_term"))
            .collect::<SolverResult<_>>()?;
        let sort = self.result_sort(kind, &nodes, params)?;
        let backend_args: Vec<BackendTerm> = args.iter().map(|a| Rc::clone(a.backend())).collect();
        let term = MockTerm::new(
            MockNode::App(kind, backend_args, params.to_vec()),
            sort,
        );
        self.log(format!("mk_term {}", term.render()));
        Ok(term)
    }

    fn get_sort(&mut self, term: &BackendTerm) -> SolverResult<BackendSort> {
        let mock = term
            .as_any()
            .downcast_ref::<MockTerm>()
            .ok_or_else(|| self.err("get_sort", "foreign term handle"))?;
        self.log("get_sort".to_string());
        let sort: BackendSort = mock.sort.clone();
        Ok(sort)
    }

    fn assert_formula(&mut self, term: &Term) -> SolverResult<()> {
        self.require_init("assert")?;
        let mock = self.down_term(term, "assert")?;
        if mock.sort.kind != SortKind::Bool {
            return Err(self.err("assert", "asserted term is not Boolean"));
        }
        self.log(format!("assert {}", mock.render()));
        let handle = Rc::clone(term.backend());
        match self.assertions.last_mut() {
            Some(level) => level.push(handle),
            None => unreachable!("assertion stack is never empty"),
        }
        Ok(())
    }

    fn check_sat(&mut self) -> SolverResult<SatResult> {
        self.require_init("check_sat")?;
        self.last_assumptions.clear();
        let result = self.decide();
        self.last_result = Some(result);
        self.log(format!("check_sat -> {result}"));
        Ok(result)
    }

    fn check_sat_assuming(&mut self, assumptions: &[Term]) -> SolverResult<SatResult> {
        self.require_init("check_sat_assuming")?;
        if !self.option_true("incremental") {
            return Err(self.err("check_sat_assuming", "incremental solving is disabled"));
        }
        for t in assumptions {
            let mock = self.down_term(t, "check_sat_assuming")?;
            if mock.sort.kind != SortKind::Bool {
                return Err(self.err("check_sat_assuming", "assumption is not Boolean"));
            }
        }
        self.last_assumptions = assumptions.iter().map(|t| Rc::clone(t.backend())).collect();
        let result = self.decide();
        self.last_result = Some(result);
        self.log(format!(
            "check_sat_assuming {} -> {result}",
            assumptions.len()
        ));
        Ok(result)
    }

    fn get_unsat_assumptions(&mut self) -> SolverResult<Vec<BackendTerm>> {
        self.require_init("get_unsat_assumptions")?;
        if !self.option_true("produce-unsat-assumptions") {
            return Err(self.err(
                "get_unsat_assumptions",
                "unsat assumption production is disabled",
            ));
        }
        if self.last_result != Some(SatResult::Unsat) {
            return Err(self.err("get_unsat_assumptions", "previous result was not unsat"));
        }
        self.log(format!(
            "get_unsat_assumptions -> {}",
            self.last_unsat_assumptions.len()
        ));
        Ok(self.last_unsat_assumptions.clone())
    }

    fn get_value(&mut self, terms: &[Term]) -> SolverResult<Vec<BackendTerm>> {
        self.require_init("get_value")?;
        if !self.option_true("produce-models") {
            return Err(self.err("get_value", "model production is disabled"));
        }
        if self.last_result != Some(SatResult::Sat) {
            return Err(self.err("get_value", "previous result was not sat"));
        }
        let mut values = Vec::with_capacity(terms.len());
        for t in terms {
            let mock = self.down_term(t, "get_value")?;
            let value = match &mock.node {
                MockNode::Value(_) | MockNode::Special(_) => Rc::clone(t.backend()),
                _ => self.default_value(&mock.sort),
            };
            values.push(value);
        }
        self.log(format!("get_value {}", terms.len()));
        Ok(values)
    }

    fn push(&mut self, n: u32) -> SolverResult<()> {
        self.require_init("push")?;
        if !self.option_true("incremental") {
            return Err(self.err("push", "incremental solving is disabled"));
        }
        for _ in 0..n {
            self.assertions.push(Vec::new());
        }
        self.log(format!("push {n}"));
        Ok(())
    }

    fn pop(&mut self, n: u32) -> SolverResult<()> {
        self.require_init("pop")?;
        if !self.option_true("incremental") {
            return Err(self.err("pop", "incremental solving is disabled"));
        }
        if (n as usize) >= self.assertions.len() {
            return Err(self.err("pop", "pop exceeds stack depth"));
        }
        for _ in 0..n {
            self.assertions.pop();
        }
        self.log(format!("pop {n}"));
        Ok(())
    }

    fn print_model(&mut self) -> SolverResult<String> {
        self.require_init("print_model")?;
        if !self.option_true("produce-models") {
            return Err(self.err("print_model", "model production is disabled"));
        }
        if self.last_result != Some(SatResult::Sat) {
            return Err(self.err("print_model", "previous result was not sat"));
        }
        let mut out = String::from("(model");
        for c in &self.consts {
            if let MockNode::Const(name) = &c.node {
                let default = self.default_value(&c.sort);
                let _ = write!(out, "\n  (define-fun {name} () {} {})",
                    c.sort.render(),
                    render_backend(&default));
            }
        }
        out.push(')');
        self.log("print_model".to_string());
        Ok(out)
    }

    fn reset_assertions(&mut self) -> SolverResult<()> {
        self.require_init("reset_assertions")?;
        if !self.caps.reset_assertions {
            return Err(self.err("reset_assertions", "not supported"));
        }
        self.assertions = vec![Vec::new()];
        self.last_assumptions.clear();
        self.last_result = None;
        self.last_unsat_assumptions.clear();
        self.log("reset_assertions".to_string());
        Ok(())
    }

    fn set_opt(&mut self, name: &str, value: &str) -> SolverResult<()> {
        self.require_init("set_opt")?;
        let known = [
            "incremental",
            "produce-models",
            "produce-unsat-assumptions",
            "produce-unsat-cores",
            "seed",
            "sat-engine",
            "eager-bitblast",
            "lazy-bitblast",
            "model-compress",
        ];
        if !known.contains(&name) {
            return Err(self.err("set_opt", format!("unknown option `{name}`")));
        }
        self.options.insert(name.to_string(), value.to_string());
        self.log(format!("set_opt {name}={value}"));
        Ok(())
    }

    fn get_option_name_incremental(&self) -> &'static str {
        "incremental"
    }

    fn get_option_name_model_gen(&self) -> &'static str {
        "produce-models"
    }

    fn get_option_name_unsat_assumptions(&self) -> &'static str {
        "produce-unsat-assumptions"
    }

    fn get_option_name_unsat_cores(&self) -> &'static str {
        "produce-unsat-cores"
    }

    fn option_incremental_enabled(&self) -> bool {
        self.option_true("incremental")
    }

    fn option_model_gen_enabled(&self) -> bool {
        self.option_true("produce-models")
    }

    fn option_unsat_assumptions_enabled(&self) -> bool {
        self.option_true("produce-unsat-assumptions")
    }

    fn option_unsat_cores_enabled(&self) -> bool {
        self.option_true("produce-unsat-cores")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skelter_core::sort::SortId;
    use skelter_core::term::{TermId, TermKind};

    fn wrap_sort(backend: BackendSort, kind: SortKind, id: u64) -> Sort {
        Sort::new(SortId::new(id), kind, vec![], backend)
    }

    fn wrap_term(backend: BackendTerm, sort: &Sort, kind: TermKind, id: u64) -> Term {
        Term::leaf(TermId::new(id), sort.clone(), kind, backend)
    }

    fn init() -> MockSolver {
        let mut solver = MockSolver::new();
        solver.new_solver();
        solver
    }

    #[test]
    fn test_sort_equality_is_structural() {
        let mut solver = init();
        let a = solver.mk_sort_bv(8).unwrap();
        let b = solver.mk_sort_bv(8).unwrap();
        let c = solver.mk_sort_bv(9).unwrap();
        assert!(a.equals(b.as_ref()));
        assert!(!a.equals(c.as_ref()));
        assert_eq!(a.hash_value(), b.hash_value());
    }

    #[test]
    fn test_mk_term_type_checks() {
        let mut solver = init();
        let bv8 = wrap_sort(solver.mk_sort_bv(8).unwrap(), SortKind::Bv, 1);
        let bv9 = wrap_sort(solver.mk_sort_bv(9).unwrap(), SortKind::Bv, 2);
        let x = wrap_term(solver.mk_const(&bv8, "x").unwrap(), &bv8, TermKind::Const, 1);
        let y = wrap_term(solver.mk_const(&bv9, "y").unwrap(), &bv9, TermKind::Const, 2);

        // Same-width addition works and has the argument sort.
        let sum = solver
            .mk_term(OpKind::BvAdd, &[x.clone(), x.clone()], &[])
            .unwrap();
        assert_eq!(
            solver.get_sort(&sum).unwrap().bv_width(),
            Some(8)
        );

        // Mixed widths are rejected.
        assert!(solver.mk_term(OpKind::BvAdd, &[x.clone(), y], &[]).is_err());

        // Extract yields the sliced width and validates indices.
        let slice = solver
            .mk_term(OpKind::BvExtract, &[x.clone()], &[5, 2])
            .unwrap();
        assert_eq!(solver.get_sort(&slice).unwrap().bv_width(), Some(4));
        assert!(solver.mk_term(OpKind::BvExtract, &[x], &[8, 0]).is_err());
    }

    #[test]
    fn test_conflicting_bindings_are_unsat() {
        let mut solver = init();
        solver.set_opt("incremental", "true").unwrap();
        solver.set_opt("produce-unsat-assumptions", "true").unwrap();

        let bv8 = wrap_sort(solver.mk_sort_bv(8).unwrap(), SortKind::Bv, 1);
        let x = wrap_term(solver.mk_const(&bv8, "x").unwrap(), &bv8, TermKind::Const, 1);
        let zero = wrap_term(
            solver.mk_value_str(&bv8, "0", Base::Dec).unwrap(),
            &bv8,
            TermKind::Value,
            2,
        );
        let one = wrap_term(
            solver.mk_value_str(&bv8, "1", Base::Dec).unwrap(),
            &bv8,
            TermKind::Value,
            3,
        );

        let bool_sort = wrap_sort(
            solver.mk_sort_atomic(SortKind::Bool).unwrap(),
            SortKind::Bool,
            2,
        );
        let eq0 = solver
            .mk_term(OpKind::Equal, &[x.clone(), zero], &[])
            .unwrap();
        let eq1 = solver.mk_term(OpKind::Equal, &[x, one], &[]).unwrap();
        let t_a = wrap_term(eq0, &bool_sort, TermKind::OpApp, 4);
        let t_b = wrap_term(eq1, &bool_sort, TermKind::OpApp, 5);

        let result = solver
            .check_sat_assuming(&[t_a.clone(), t_b.clone()])
            .unwrap();
        assert_eq!(result, SatResult::Unsat);

        let failed = solver.get_unsat_assumptions().unwrap();
        assert!(!failed.is_empty());
        for f in &failed {
            assert!(
                f.equals(t_a.backend().as_ref()) || f.equals(t_b.backend().as_ref()),
                "failed assumption is not a subset of the assumed set"
            );
        }
    }

    #[test]
    fn test_same_binding_twice_is_sat() {
        let mut solver = init();
        let int = wrap_sort(solver.mk_sort_atomic(SortKind::Int).unwrap(), SortKind::Int, 1);
        let x = wrap_term(solver.mk_const(&int, "x").unwrap(), &int, TermKind::Const, 1);
        let five = wrap_term(
            solver.mk_value_str(&int, "5", Base::Dec).unwrap(),
            &int,
            TermKind::Value,
            2,
        );
        let bool_sort = wrap_sort(
            solver.mk_sort_atomic(SortKind::Bool).unwrap(),
            SortKind::Bool,
            2,
        );
        let eq = solver.mk_term(OpKind::Equal, &[x, five], &[]).unwrap();
        let eq = wrap_term(eq, &bool_sort, TermKind::OpApp, 3);
        solver.assert_formula(&eq).unwrap();
        solver.assert_formula(&eq).unwrap();
        assert_eq!(solver.check_sat().unwrap(), SatResult::Sat);
    }

    #[test]
    fn test_value_distinct_equality_is_unsat() {
        let mut solver = init();
        let int = wrap_sort(solver.mk_sort_atomic(SortKind::Int).unwrap(), SortKind::Int, 1);
        let bool_sort = wrap_sort(
            solver.mk_sort_atomic(SortKind::Bool).unwrap(),
            SortKind::Bool,
            2,
        );
        let a = wrap_term(
            solver.mk_value_str(&int, "1", Base::Dec).unwrap(),
            &int,
            TermKind::Value,
            1,
        );
        let b = wrap_term(
            solver.mk_value_str(&int, "2", Base::Dec).unwrap(),
            &int,
            TermKind::Value,
            2,
        );
        let eq = solver.mk_term(OpKind::Equal, &[a, b], &[]).unwrap();
        let eq = wrap_term(eq, &bool_sort, TermKind::OpApp, 3);
        solver.assert_formula(&eq).unwrap();
        assert_eq!(solver.check_sat().unwrap(), SatResult::Unsat);
    }

    #[test]
    fn test_push_pop_scopes_assertions() {
        let mut solver = init();
        solver.set_opt("incremental", "true").unwrap();
        let bool_backend = solver.mk_sort_atomic(SortKind::Bool).unwrap();
        let bool_sort = wrap_sort(bool_backend, SortKind::Bool, 1);
        let f = wrap_term(
            solver.mk_value_bool(&bool_sort, false).unwrap(),
            &bool_sort,
            TermKind::Value,
            1,
        );

        solver.push(1).unwrap();
        solver.assert_formula(&f).unwrap();
        assert_eq!(solver.check_sat().unwrap(), SatResult::Unsat);
        solver.pop(1).unwrap();
        assert_eq!(solver.check_sat().unwrap(), SatResult::Sat);
        assert!(solver.pop(1).is_err());
    }

    #[test]
    fn test_gated_queries_require_options() {
        let mut solver = init();
        let bool_sort = wrap_sort(
            solver.mk_sort_atomic(SortKind::Bool).unwrap(),
            SortKind::Bool,
            1,
        );
        let t = wrap_term(
            solver.mk_value_bool(&bool_sort, true).unwrap(),
            &bool_sort,
            TermKind::Value,
            1,
        );
        assert!(solver.check_sat_assuming(&[t.clone()]).is_err());
        solver.check_sat().unwrap();
        assert!(solver.get_value(&[t]).is_err());
        assert!(solver.print_model().is_err());
        assert!(solver.get_unsat_assumptions().is_err());
    }

    #[test]
    fn test_bv_value_width_check() {
        let mut solver = init();
        let bv4 = wrap_sort(solver.mk_sort_bv(4).unwrap(), SortKind::Bv, 1);
        assert!(solver.mk_value_str(&bv4, "15", Base::Dec).is_ok());
        assert!(solver.mk_value_str(&bv4, "16", Base::Dec).is_err());
        assert!(solver.mk_value_str(&bv4, "1111", Base::Bin).is_ok());
        assert!(solver.mk_value_str(&bv4, "g", Base::Hex).is_err());
    }

    #[test]
    fn test_private_op_registration_and_typing() {
        let mut solver = init();
        let mut catalog = OpCatalog::builtin();
        solver.configure_ops(&mut catalog);
        assert!(catalog.get(MOCK_BV_REDOR).is_some());

        let bv8 = wrap_sort(solver.mk_sort_bv(8).unwrap(), SortKind::Bv, 1);
        let x = wrap_term(solver.mk_const(&bv8, "x").unwrap(), &bv8, TermKind::Const, 1);
        let red = solver.mk_term(MOCK_BV_REDOR, &[x], &[]).unwrap();
        assert_eq!(solver.get_sort(&red).unwrap().bv_width(), Some(1));
    }

    #[test]
    fn test_unknown_option_rejected() {
        let mut solver = init();
        assert!(solver.set_opt("no-such-option", "1").is_err());
        assert!(solver.set_opt("incremental", "true").is_ok());
        assert!(solver.option_incremental_enabled());
    }
}
