//! Sort Construction.

use skelter_core::sort::Sort;
use skelter_core::theory::{SortKind, SortKindSet, SortStructure};

use crate::error::Result;
use crate::manager::SolverManager;

use super::{Action, TracedObject, backend_err, expect_args, sort_arg, u32_arg, untrace_err};

/// Largest bit-vector width the generator creates.
pub const MAX_BV_WIDTH: u32 = 128;

/// Floating-point exponent widths sampled by `mk_sort FP`.
pub const FP_EXP_RANGE: (u32, u32) = (2, 10);

/// Floating-point significand widths sampled by `mk_sort FP`.
pub const FP_SIG_RANGE: (u32, u32) = (2, 24);

/// Largest function domain arity sampled by `mk_sort FUN`.
pub const MAX_FUN_DOMAIN: u32 = 3;

/// Create a sort of a random enabled kind.
///
/// Composite kinds draw their child sorts from the sort database, honoring
/// the backend's index/element/domain restrictions. DT sorts have no builtin
/// constructor; datatype-capable backends register their own action.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionMkSort;

impl ActionMkSort {
    fn constructible(mgr: &SolverManager) -> Vec<SortKind> {
        let any_sort_outside = |excluded: &SortKindSet| {
            mgr.sort_db().iter().any(|s| !excluded.contains(&s.kind()))
        };
        let seq_excluded: SortKindSet = [SortKind::Fun, SortKind::Reglan].into_iter().collect();
        mgr.enabled_sort_kinds_sorted()
            .into_iter()
            .filter(|&kind| match kind {
                SortKind::Dt | SortKind::Any => false,
                SortKind::Array => {
                    any_sort_outside(mgr.array_index_excluded())
                        && any_sort_outside(mgr.array_element_excluded())
                }
                SortKind::Fun => any_sort_outside(mgr.fun_domain_excluded()),
                SortKind::Bag | SortKind::Seq | SortKind::Set => any_sort_outside(&seq_excluded),
                _ => true,
            })
            .collect()
    }
}

impl Action for ActionMkSort {
    fn kind(&self) -> &'static str {
        "mk_sort"
    }

    fn enabled(&self, mgr: &SolverManager) -> bool {
        mgr.solver().is_initialized()
    }

    fn run(&self, mgr: &mut SolverManager) -> Result<bool> {
        let kinds = Self::constructible(mgr);
        if kinds.is_empty() {
            return Ok(false);
        }
        let kind = *mgr.rng_mut().choose(&kinds);

        let sort = match kind.structure() {
            SortStructure::Atomic => {
                mgr.trace_line(&format!("mk_sort {kind}"))?;
                mgr.trace_flush()?;
                let backend = mgr
                    .solver_mut()
                    .mk_sort_atomic(kind)
                    .map_err(|e| backend_err(self.kind(), e))?;
                mgr.add_sort(backend, kind, Vec::new())
            }
            SortStructure::Parametric if kind == SortKind::Bv => {
                let width = mgr.rng_mut().pick_u32(1, MAX_BV_WIDTH);
                mgr.trace_line(&format!("mk_sort BV {width}"))?;
                mgr.trace_flush()?;
                let backend = mgr
                    .solver_mut()
                    .mk_sort_bv(width)
                    .map_err(|e| backend_err(self.kind(), e))?;
                mgr.add_sort(backend, kind, Vec::new())
            }
            SortStructure::Parametric => {
                let exp = mgr.rng_mut().pick_u32(FP_EXP_RANGE.0, FP_EXP_RANGE.1);
                let sig = mgr.rng_mut().pick_u32(FP_SIG_RANGE.0, FP_SIG_RANGE.1);
                mgr.trace_line(&format!("mk_sort FP {exp} {sig}"))?;
                mgr.trace_flush()?;
                let backend = mgr
                    .solver_mut()
                    .mk_sort_fp(exp, sig)
                    .map_err(|e| backend_err(self.kind(), e))?;
                mgr.add_sort(backend, kind, Vec::new())
            }
            SortStructure::Composite { .. } => {
                let children = match kind {
                    SortKind::Array => {
                        let idx_excluded = mgr.array_index_excluded().clone();
                        let elt_excluded = mgr.array_element_excluded().clone();
                        let index = match mgr.pick_sort_excluding(&idx_excluded, false) {
                            Some(s) => s,
                            None => return Ok(false),
                        };
                        let element = match mgr.pick_sort_excluding(&elt_excluded, false) {
                            Some(s) => s,
                            None => return Ok(false),
                        };
                        vec![index, element]
                    }
                    SortKind::Fun => {
                        let excluded = mgr.fun_domain_excluded().clone();
                        let n = mgr.rng_mut().pick_u32(1, MAX_FUN_DOMAIN);
                        let mut children = Vec::with_capacity(n as usize + 1);
                        for _ in 0..=n {
                            match mgr.pick_sort_excluding(&excluded, false) {
                                Some(s) => children.push(s),
                                None => return Ok(false),
                            }
                        }
                        children
                    }
                    _ => {
                        let excluded: SortKindSet =
                            [SortKind::Fun, SortKind::Reglan].into_iter().collect();
                        match mgr.pick_sort_excluding(&excluded, false) {
                            Some(s) => vec![s],
                            None => return Ok(false),
                        }
                    }
                };
                let mut line = format!("mk_sort {kind}");
                for child in &children {
                    line.push_str(&format!(" {}", child.id()));
                }
                mgr.trace_line(&line)?;
                mgr.trace_flush()?;
                let backend = mgr
                    .solver_mut()
                    .mk_sort_composite(kind, &children)
                    .map_err(|e| backend_err(self.kind(), e))?;
                mgr.add_sort(backend, kind, children)
            }
        };
        mgr.trace_ret_sort(sort.id())?;
        Ok(true)
    }

    fn untrace(&self, mgr: &mut SolverManager, tokens: &[String]) -> Result<Option<TracedObject>> {
        if tokens.is_empty() {
            return Err(untrace_err("mk_sort without sort kind"));
        }
        let kind: SortKind = tokens[0]
            .parse()
            .map_err(|e: String| untrace_err(e))?;
        let sort = match kind.structure() {
            SortStructure::Atomic => {
                expect_args(self.kind(), tokens, 1)?;
                let backend = mgr
                    .solver_mut()
                    .mk_sort_atomic(kind)
                    .map_err(|e| backend_err(self.kind(), e))?;
                mgr.add_sort(backend, kind, Vec::new())
            }
            SortStructure::Parametric if kind == SortKind::Bv => {
                expect_args(self.kind(), tokens, 2)?;
                let width = u32_arg(&tokens[1])?;
                let backend = mgr
                    .solver_mut()
                    .mk_sort_bv(width)
                    .map_err(|e| backend_err(self.kind(), e))?;
                mgr.add_sort(backend, kind, Vec::new())
            }
            SortStructure::Parametric => {
                expect_args(self.kind(), tokens, 3)?;
                let exp = u32_arg(&tokens[1])?;
                let sig = u32_arg(&tokens[2])?;
                let backend = mgr
                    .solver_mut()
                    .mk_sort_fp(exp, sig)
                    .map_err(|e| backend_err(self.kind(), e))?;
                mgr.add_sort(backend, kind, Vec::new())
            }
            SortStructure::Composite { min_children, max_children } => {
                let n = tokens.len() - 1;
                let min = min_children as usize;
                if n < min || max_children.is_some_and(|max| n > max as usize) {
                    return Err(untrace_err(format!(
                        "mk_sort {kind} with {n} child sorts"
                    )));
                }
                let children: Vec<Sort> = tokens[1..]
                    .iter()
                    .map(|t| sort_arg(mgr, t))
                    .collect::<Result<_>>()?;
                let backend = mgr
                    .solver_mut()
                    .mk_sort_composite(kind, &children)
                    .map_err(|e| backend_err(self.kind(), e))?;
                mgr.add_sort(backend, kind, children)
            }
        };
        Ok(Some(TracedObject::Sort(sort)))
    }
}
