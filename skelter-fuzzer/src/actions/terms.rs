//! Operator Application.

use smallvec::SmallVec;

use skelter_core::op::{Arity, MAX_VAR_ARGS, MIN_VAR_ARGS, Op, OpKind};
use skelter_core::sort::Sort;
use skelter_core::term::Term;
use skelter_core::theory::SortKind;

use crate::error::Result;
use crate::manager::SolverManager;

use super::sorts::{FP_EXP_RANGE, FP_SIG_RANGE, MAX_BV_WIDTH};
use super::{Action, TracedObject, backend_err, term_arg, u32_arg, untrace_err};

/// Probability (in 1000) of substituting an Int term into a Real argument
/// slot when arithmetic subtyping is on.
const P_ARITH_SUBTYPE: u32 = 100;

/// Apply a randomly chosen enabled operator to freshly sampled, mutually
/// sort-consistent arguments.
///
/// Polymorphic operators pick a concrete sort first and draw every wildcard
/// argument from it; indexed operators sample their parameters against the
/// argument sort's shape; quantifiers consume the innermost binder scope.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionMkTerm;

/// Trace-protocol auxiliary: binds the id of a result sort that `mk_term`
/// registered on the fly (a sort no `mk_sort` line ever returned, like the
/// width born from an extract).
///
/// Emitted by [`ActionMkTerm`] right after its own `return` line; never
/// scheduled by the FSM.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionTermGetSort;

impl Action for ActionTermGetSort {
    fn kind(&self) -> &'static str {
        "term_get_sort"
    }

    fn run(&self, _mgr: &mut SolverManager) -> Result<bool> {
        Ok(false)
    }

    fn untrace(&self, mgr: &mut SolverManager, tokens: &[String]) -> Result<Option<TracedObject>> {
        super::expect_args(self.kind(), tokens, 1)?;
        let term = term_arg(mgr, &tokens[0])?;
        // The sort was registered while the term's own line replayed; this
        // line only rebinds its trace id.
        Ok(Some(TracedObject::Sort(term.sort().clone())))
    }
}

/// Concrete result sort kind of an operator application.
fn result_kind(op: &Op, args: &[Term]) -> SortKind {
    match op.kind {
        OpKind::Ite => args[1].sort().kind(),
        OpKind::ArraySelect => args[0].sort().array_element().kind(),
        OpKind::UfApply => args[0].sort().fun_codomain().kind(),
        _ => op.result,
    }
}

/// Index parameter list of an instantiated operator.
type Params = SmallVec<[u32; 2]>;

enum Sampled {
    /// Arguments and index parameters ready for the backend call.
    Args(Vec<Term>, Params, bool),
    /// The deeper sampling requirement was unmet.
    Bail,
}

impl ActionMkTerm {
    #[allow(clippy::too_many_lines)]
    fn sample(kind: OpKind, op: &Op, mgr: &mut SolverManager) -> Sampled {
        let mut params = Params::new();
        let mut closes_binder = false;

        let args: Vec<Term> = match kind {
            OpKind::Forall | OpKind::Exists => {
                if !mgr.has_quant_body() {
                    return Sampled::Bail;
                }
                let body = mgr.pick_quant_body();
                let var = mgr.close_binder();
                closes_binder = true;
                vec![var, body]
            }
            OpKind::ArraySelect => {
                let Some(asort) = mgr.pick_array_op_sort(false) else {
                    return Sampled::Bail;
                };
                let index_sort = asort.array_index().clone();
                let array = mgr.pick_term_sort(&asort);
                let index = mgr.pick_term_sort(&index_sort);
                vec![array, index]
            }
            OpKind::ArrayStore => {
                let Some(asort) = mgr.pick_array_op_sort(true) else {
                    return Sampled::Bail;
                };
                let index_sort = asort.array_index().clone();
                let element_sort = asort.array_element().clone();
                let array = mgr.pick_term_sort(&asort);
                let index = mgr.pick_term_sort(&index_sort);
                let element = mgr.pick_term_sort(&element_sort);
                vec![array, index, element]
            }
            OpKind::UfApply => {
                let Some(fsort) = mgr.pick_fun_op_sort() else {
                    return Sampled::Bail;
                };
                let domain: Vec<Sort> = fsort.fun_domain().to_vec();
                let mut args = vec![mgr.pick_term_sort(&fsort)];
                for d in &domain {
                    args.push(mgr.pick_term_sort(d));
                }
                args
            }
            OpKind::FpFp => {
                let Some(fpsort) = mgr.pick_fp_fp_sort() else {
                    return Sampled::Bail;
                };
                let exp = fpsort.fp_exp_width();
                let sig = fpsort.fp_sig_width();
                let (Some(sign_sort), Some(exp_sort), Some(sig_sort)) = (
                    mgr.pick_sort_bv(1, true),
                    mgr.pick_sort_bv(exp, true),
                    mgr.pick_sort_bv(sig - 1, true),
                ) else {
                    return Sampled::Bail;
                };
                vec![
                    mgr.pick_term_sort(&sign_sort),
                    mgr.pick_term_sort(&exp_sort),
                    mgr.pick_term_sort(&sig_sort),
                ]
            }
            OpKind::BvExtract => {
                let Some(sort) = mgr.pick_sort_kind(SortKind::Bv, true) else {
                    return Sampled::Bail;
                };
                let width = sort.bv_width();
                let hi = mgr.rng_mut().pick_u32(0, width - 1);
                let lo = mgr.rng_mut().pick_u32(0, hi);
                params = Params::from_slice(&[hi, lo]);
                vec![mgr.pick_term_sort(&sort)]
            }
            OpKind::BvRepeat => {
                let Some(sort) = mgr.pick_sort_kind(SortKind::Bv, true) else {
                    return Sampled::Bail;
                };
                let width = sort.bv_width();
                let n = mgr.rng_mut().pick_u32(1, (MAX_BV_WIDTH / width).max(1));
                params = Params::from_slice(&[n]);
                vec![mgr.pick_term_sort(&sort)]
            }
            OpKind::BvRotateLeft | OpKind::BvRotateRight => {
                let Some(sort) = mgr.pick_sort_kind(SortKind::Bv, true) else {
                    return Sampled::Bail;
                };
                let width = sort.bv_width();
                params = Params::from_slice(&[mgr.rng_mut().pick_u32(0, width)]);
                vec![mgr.pick_term_sort(&sort)]
            }
            OpKind::BvSignExtend | OpKind::BvZeroExtend => {
                let Some(sort) = mgr.pick_sort_kind(SortKind::Bv, true) else {
                    return Sampled::Bail;
                };
                let width = sort.bv_width();
                params = Params::from_slice(&[mgr.rng_mut().pick_u32(0, MAX_BV_WIDTH.saturating_sub(width))]);
                vec![mgr.pick_term_sort(&sort)]
            }
            OpKind::FpToFpFromBv => {
                // The target format splits the input: width = exp + sig.
                let candidates: Vec<Sort> = mgr
                    .sort_db()
                    .iter_kind(SortKind::Bv)
                    .filter(|s| s.bv_width() >= 4 && mgr.term_db().has_term_sort(s))
                    .cloned()
                    .collect();
                if candidates.is_empty() {
                    return Sampled::Bail;
                }
                let sort = mgr.rng_mut().choose(&candidates).clone();
                let width = sort.bv_width();
                let exp = mgr.rng_mut().pick_u32(2, width - 2);
                params = Params::from_slice(&[exp, width - exp]);
                vec![mgr.pick_term_sort(&sort)]
            }
            OpKind::FpToFpFromSbv | OpKind::FpToFpFromUbv => {
                let rm = mgr.pick_term_kind(SortKind::Rm);
                let bv = mgr.pick_term_kind(SortKind::Bv);
                params = Params::from_slice(&[
                    mgr.rng_mut().pick_u32(FP_EXP_RANGE.0, FP_EXP_RANGE.1),
                    mgr.rng_mut().pick_u32(FP_SIG_RANGE.0, FP_SIG_RANGE.1),
                ]);
                vec![rm, bv]
            }
            OpKind::FpToFpFromFp => {
                let rm = mgr.pick_term_kind(SortKind::Rm);
                let fp = mgr.pick_term_kind(SortKind::Fp);
                params = Params::from_slice(&[
                    mgr.rng_mut().pick_u32(FP_EXP_RANGE.0, FP_EXP_RANGE.1),
                    mgr.rng_mut().pick_u32(FP_SIG_RANGE.0, FP_SIG_RANGE.1),
                ]);
                vec![rm, fp]
            }
            OpKind::FpToFpFromReal => {
                let rm = mgr.pick_term_kind(SortKind::Rm);
                let real = mgr.pick_term_kind(SortKind::Real);
                params = Params::from_slice(&[
                    mgr.rng_mut().pick_u32(FP_EXP_RANGE.0, FP_EXP_RANGE.1),
                    mgr.rng_mut().pick_u32(FP_SIG_RANGE.0, FP_SIG_RANGE.1),
                ]);
                vec![rm, real]
            }
            OpKind::FpToSbv | OpKind::FpToUbv => {
                let rm = mgr.pick_term_kind(SortKind::Rm);
                let fp = mgr.pick_term_kind(SortKind::Fp);
                params = Params::from_slice(&[mgr.rng_mut().pick_u32(1, MAX_BV_WIDTH)]);
                vec![rm, fp]
            }
            OpKind::IntIsDiv => {
                params = Params::from_slice(&[mgr.rng_mut().pick_u32(1, 9)]);
                vec![mgr.pick_term_kind(SortKind::Int)]
            }
            OpKind::ReRange => {
                vec![mgr.pick_string_char_value(), mgr.pick_string_char_value()]
            }
            OpKind::Equal | OpKind::Distinct => {
                let kinds = mgr.term_db().kinds_with_terms();
                if kinds.is_empty() {
                    return Sampled::Bail;
                }
                let pick = *mgr.rng_mut().choose(&kinds);
                let Some(sort) = mgr.pick_sort_kind(pick, true) else {
                    return Sampled::Bail;
                };
                let n = mgr.rng_mut().pick_u32(MIN_VAR_ARGS, MAX_VAR_ARGS);
                (0..n).map(|_| mgr.pick_term_sort(&sort)).collect()
            }
            OpKind::Ite => {
                let kinds = mgr.term_db().kinds_with_terms();
                if kinds.is_empty() {
                    return Sampled::Bail;
                }
                let cond = mgr.pick_term_kind(SortKind::Bool);
                let pick = *mgr.rng_mut().choose(&kinds);
                let Some(sort) = mgr.pick_sort_kind(pick, true) else {
                    return Sampled::Bail;
                };
                let then_branch = mgr.pick_term_sort(&sort);
                let else_branch = mgr.pick_term_sort(&sort);
                vec![cond, then_branch, else_branch]
            }
            OpKind::IntMul | OpKind::RealMul if mgr.arith_linear => {
                let elem = if kind == OpKind::IntMul {
                    SortKind::Int
                } else {
                    SortKind::Real
                };
                let Some(sort) = mgr.pick_sort_kind(elem, true) else {
                    return Sampled::Bail;
                };
                if !mgr.has_value(&sort) {
                    return Sampled::Bail;
                }
                let n = mgr.rng_mut().pick_u32(MIN_VAR_ARGS, MAX_VAR_ARGS);
                let free_slot = mgr.rng_mut().pick_u32(0, n - 1);
                (0..n)
                    .map(|i| {
                        if i == free_slot {
                            mgr.pick_term_sort(&sort)
                        } else {
                            mgr.pick_value(&sort)
                        }
                    })
                    .collect()
            }
            _ => {
                let n = match op.arity {
                    Arity::Fixed(n) => n,
                    Arity::Nary => mgr.rng_mut().pick_u32(MIN_VAR_ARGS, MAX_VAR_ARGS),
                };
                // One concrete sort per argument kind; same-kind arguments
                // share it.
                let mut sorts: Vec<(SortKind, Sort)> = Vec::new();
                let mut args = Vec::with_capacity(n as usize);
                for i in 0..n {
                    let arg_kind = op.arg_kind(i as usize);
                    debug_assert!(arg_kind != SortKind::Any, "unhandled polymorphic op {kind}");
                    if arg_kind == SortKind::Real
                        && mgr.arith_subtyping
                        && mgr.has_term_kind(SortKind::Int)
                        && mgr.rng_mut().pick_with_prob(P_ARITH_SUBTYPE)
                    {
                        args.push(mgr.pick_term_kind(SortKind::Int));
                        continue;
                    }
                    let sort = match sorts.iter().position(|(k, _)| *k == arg_kind) {
                        Some(found) => sorts[found].1.clone(),
                        None => {
                            let Some(s) = mgr.pick_sort_kind(arg_kind, true) else {
                                return Sampled::Bail;
                            };
                            sorts.push((arg_kind, s.clone()));
                            s
                        }
                    };
                    args.push(mgr.pick_term_sort(&sort));
                }
                args
            }
        };
        Sampled::Args(args, params, closes_binder)
    }
}

impl Action for ActionMkTerm {
    fn kind(&self) -> &'static str {
        "mk_term"
    }

    fn enabled(&self, mgr: &SolverManager) -> bool {
        mgr.solver().is_initialized() && mgr.has_term()
    }

    fn run(&self, mgr: &mut SolverManager) -> Result<bool> {
        let Some(kind) = mgr.pick_op_kind() else {
            return Ok(false);
        };
        let op = mgr.op(kind).clone();
        let (args, params, closes_binder) = match Self::sample(kind, &op, mgr) {
            Sampled::Args(args, params, closes_binder) => (args, params, closes_binder),
            Sampled::Bail => return Ok(false),
        };

        let mut line = format!("mk_term {kind}");
        for arg in &args {
            line.push_str(&format!(" {}", arg.id()));
        }
        for param in &params {
            line.push_str(&format!(" {param}"));
        }
        mgr.trace_line(&line)?;
        mgr.trace_flush()?;

        let backend = mgr
            .solver_mut()
            .mk_term(kind, &args, &params)
            .map_err(|e| backend_err(self.kind(), e))?;
        let backend_sort = mgr
            .solver_mut()
            .get_sort(&backend)
            .map_err(|e| backend_err(self.kind(), e))?;
        let rkind = result_kind(&op, &args);
        let n_sorts_before = mgr.n_sorts();
        let sort = mgr.resolve_sort(backend_sort, rkind);
        let sort_is_fresh = mgr.n_sorts() > n_sorts_before;

        let term = if closes_binder {
            let level = mgr.term_db().cur_level();
            mgr.add_term_at(backend, sort.clone(), kind, args, level)
        } else {
            mgr.add_term(backend, sort.clone(), kind, args)
        };
        mgr.trace_ret_term(term.id())?;
        if sort_is_fresh {
            // Bind the on-the-fly sort id for the untracer.
            mgr.trace_line(&format!("term_get_sort {}", term.id()))?;
            mgr.trace_ret_sort(sort.id())?;
        }
        Ok(true)
    }

    fn untrace(&self, mgr: &mut SolverManager, tokens: &[String]) -> Result<Option<TracedObject>> {
        if tokens.is_empty() {
            return Err(untrace_err("mk_term without operator kind"));
        }
        let kind = mgr
            .catalog()
            .parse_kind(&tokens[0])
            .ok_or_else(|| untrace_err(format!("unknown operator `{}`", tokens[0])))?;
        let op = mgr.op(kind).clone();

        let mut args: Vec<Term> = Vec::new();
        let mut params = Params::new();
        for token in &tokens[1..] {
            if crate::trace::parse_term_ref(token).is_some() {
                args.push(term_arg(mgr, token)?);
            } else {
                params.push(u32_arg(token)?);
            }
        }
        if let Arity::Fixed(n) = op.arity {
            if args.len() != n as usize {
                return Err(untrace_err(format!(
                    "{kind} expects {n} arguments, got {}",
                    args.len()
                )));
            }
        }
        if params.len() != op.n_params as usize {
            return Err(untrace_err(format!(
                "{kind} expects {} parameters, got {}",
                op.n_params,
                params.len()
            )));
        }

        let closes_binder = matches!(kind, OpKind::Forall | OpKind::Exists);
        if closes_binder {
            if !mgr.term_db().in_binder() {
                return Err(untrace_err(format!("{kind} without open binder scope")));
            }
            mgr.close_binder();
        }

        let backend = mgr
            .solver_mut()
            .mk_term(kind, &args, &params)
            .map_err(|e| backend_err(self.kind(), e))?;
        let backend_sort = mgr
            .solver_mut()
            .get_sort(&backend)
            .map_err(|e| backend_err(self.kind(), e))?;
        let rkind = result_kind(&op, &args);
        let sort = mgr.resolve_sort(backend_sort, rkind);

        let term = if closes_binder {
            let level = mgr.term_db().cur_level();
            mgr.add_term_at(backend, sort, kind, args, level)
        } else {
            mgr.add_term(backend, sort, kind, args)
        };
        Ok(Some(TracedObject::Term(term)))
    }
}
