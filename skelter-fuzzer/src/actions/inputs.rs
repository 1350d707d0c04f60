//! Input Construction: Constants, Variables, Values, Special Values.

use num_bigint::BigUint;

use skelter_core::term::SpecialValueKind;
use skelter_core::theory::{SortKind, Theory};

use crate::error::Result;
use crate::manager::SolverManager;
use crate::solver::Base;
use crate::trace::quote;

use super::{Action, TracedObject, backend_err, expect_args, sort_arg, untrace_err};

/// Longest random string value generated by `mk_value`.
const MAX_STRING_VALUE_LEN: usize = 8;

/// Longest decimal numeral generated for Int and Real values.
const MAX_DEC_DIGITS: usize = 10;

/// Declare a free constant of a random existing sort.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionMkConst;

impl Action for ActionMkConst {
    fn kind(&self) -> &'static str {
        "mk_const"
    }

    fn enabled(&self, mgr: &SolverManager) -> bool {
        mgr.solver().is_initialized()
            && mgr.sort_db().iter().any(|s| s.kind() != SortKind::Reglan)
    }

    fn run(&self, mgr: &mut SolverManager) -> Result<bool> {
        // No constants of regular-language sorts.
        let excluded = [SortKind::Reglan].into_iter().collect();
        let Some(sort) = mgr.pick_sort_excluding(&excluded, false) else {
            return Ok(false);
        };
        let name = mgr.pick_symbol();
        mgr.trace_line(&format!("mk_const {} {}", sort.id(), quote(&name)))?;
        mgr.trace_flush()?;
        let backend = mgr
            .solver_mut()
            .mk_const(&sort, &name)
            .map_err(|e| backend_err(self.kind(), e))?;
        let term = mgr.add_input(backend, sort);
        mgr.trace_ret_term(term.id())?;
        Ok(true)
    }

    fn untrace(&self, mgr: &mut SolverManager, tokens: &[String]) -> Result<Option<TracedObject>> {
        expect_args(self.kind(), tokens, 2)?;
        let sort = sort_arg(mgr, &tokens[0])?;
        let backend = mgr
            .solver_mut()
            .mk_const(&sort, &tokens[1])
            .map_err(|e| backend_err(self.kind(), e))?;
        let term = mgr.add_input(backend, sort);
        Ok(Some(TracedObject::Term(term)))
    }
}

/// Create a quantifier variable, opening its binder scope.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionMkVar;

impl Action for ActionMkVar {
    fn kind(&self) -> &'static str {
        "mk_var"
    }

    fn enabled(&self, mgr: &SolverManager) -> bool {
        mgr.solver().is_initialized() && mgr.theory_enabled(Theory::Quant) && mgr.has_sort()
    }

    fn run(&self, mgr: &mut SolverManager) -> Result<bool> {
        let allowed = mgr.var_sort_kinds();
        let excluded: skelter_core::theory::SortKindSet = skelter_core::theory::ALL_SORT_KINDS
            .iter()
            .copied()
            .filter(|k| !allowed.contains(k))
            .collect();
        let Some(sort) = mgr.pick_sort_excluding(&excluded, false) else {
            return Ok(false);
        };
        let name = mgr.pick_symbol();
        mgr.trace_line(&format!("mk_var {} {}", sort.id(), quote(&name)))?;
        mgr.trace_flush()?;
        let backend = mgr
            .solver_mut()
            .mk_var(&sort, &name)
            .map_err(|e| backend_err(self.kind(), e))?;
        let term = mgr.add_var(backend, sort);
        mgr.trace_ret_term(term.id())?;
        Ok(true)
    }

    fn untrace(&self, mgr: &mut SolverManager, tokens: &[String]) -> Result<Option<TracedObject>> {
        expect_args(self.kind(), tokens, 2)?;
        let sort = sort_arg(mgr, &tokens[0])?;
        let backend = mgr
            .solver_mut()
            .mk_var(&sort, &tokens[1])
            .map_err(|e| backend_err(self.kind(), e))?;
        let term = mgr.add_var(backend, sort);
        Ok(Some(TracedObject::Term(term)))
    }
}

/// Sort kinds `mk_value` can build literals for.
const VALUE_KINDS: &[SortKind] = &[
    SortKind::Bool,
    SortKind::Bv,
    SortKind::Int,
    SortKind::Real,
    SortKind::String,
];

/// Create a random value literal of a random existing sort.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionMkValue;

impl ActionMkValue {
    fn register_value(
        mgr: &mut SolverManager,
        sort: skelter_core::sort::Sort,
        backend: skelter_core::term::BackendTerm,
        string_value: Option<&str>,
    ) -> skelter_core::term::Term {
        let term = mgr.add_value(backend, sort);
        if let Some(s) = string_value {
            if s.chars().count() == 1 {
                mgr.add_string_char_value(&term);
            }
        }
        term
    }
}

impl Action for ActionMkValue {
    fn kind(&self) -> &'static str {
        "mk_value"
    }

    fn enabled(&self, mgr: &SolverManager) -> bool {
        mgr.solver().is_initialized() && VALUE_KINDS.iter().any(|&k| mgr.has_sort_kind(k))
    }

    fn run(&self, mgr: &mut SolverManager) -> Result<bool> {
        let kinds: Vec<SortKind> = VALUE_KINDS
            .iter()
            .copied()
            .filter(|&k| mgr.has_sort_kind(k))
            .collect();
        if kinds.is_empty() {
            return Ok(false);
        }
        let kind = *mgr.rng_mut().choose(&kinds);
        let Some(sort) = mgr.pick_sort_kind(kind, false) else {
            return Ok(false);
        };

        match kind {
            SortKind::Bool => {
                let value = mgr.rng_mut().flip_coin();
                mgr.trace_line(&format!("mk_value {} {value}", sort.id()))?;
                mgr.trace_flush()?;
                let backend = mgr
                    .solver_mut()
                    .mk_value_bool(&sort, value)
                    .map_err(|e| backend_err(self.kind(), e))?;
                let term = mgr.add_value(backend, sort);
                mgr.trace_ret_term(term.id())?;
            }
            SortKind::Bv => {
                let width = sort.bv_width();
                let mut bases = vec![Base::Bin, Base::Dec];
                if width % 4 == 0 {
                    bases.push(Base::Hex);
                }
                let base = *mgr.rng_mut().choose(&bases);
                let bits = mgr.rng_mut().pick_bin_string(width);
                let (digits, token) = match base {
                    Base::Bin => (bits.clone(), format!("#b{bits}")),
                    Base::Hex => {
                        let hex = BigUint::parse_bytes(bits.as_bytes(), 2)
                            .map(|v| v.to_str_radix(16))
                            .unwrap_or_else(|| unreachable!("binary numeral parses"));
                        let padded = format!("{hex:0>width$}", width = (width / 4) as usize);
                        (padded.clone(), format!("#x{padded}"))
                    }
                    Base::Dec => {
                        let dec = BigUint::parse_bytes(bits.as_bytes(), 2)
                            .map(|v| v.to_str_radix(10))
                            .unwrap_or_else(|| unreachable!("binary numeral parses"));
                        (dec.clone(), dec)
                    }
                };
                mgr.trace_line(&format!("mk_value {} {token}", sort.id()))?;
                mgr.trace_flush()?;
                let backend = mgr
                    .solver_mut()
                    .mk_value_str(&sort, &digits, base)
                    .map_err(|e| backend_err(self.kind(), e))?;
                let term = mgr.add_value(backend, sort);
                mgr.trace_ret_term(term.id())?;
            }
            SortKind::Int => {
                let mut value = mgr.rng_mut().pick_dec_string(MAX_DEC_DIGITS);
                if mgr.rng_mut().flip_coin() && value != "0" {
                    value.insert(0, '-');
                }
                mgr.trace_line(&format!("mk_value {} {}", sort.id(), quote(&value)))?;
                mgr.trace_flush()?;
                let backend = mgr
                    .solver_mut()
                    .mk_value_str(&sort, &value, Base::Dec)
                    .map_err(|e| backend_err(self.kind(), e))?;
                let term = mgr.add_value(backend, sort);
                mgr.trace_ret_term(term.id())?;
            }
            SortKind::Real => {
                let integral = mgr.rng_mut().pick_dec_string(MAX_DEC_DIGITS);
                let fractional = mgr.rng_mut().pick_dec_string(MAX_DEC_DIGITS);
                let mut value = format!("{integral}.{fractional}");
                if mgr.rng_mut().flip_coin() {
                    value.insert(0, '-');
                }
                mgr.trace_line(&format!("mk_value {} {}", sort.id(), quote(&value)))?;
                mgr.trace_flush()?;
                let backend = mgr
                    .solver_mut()
                    .mk_value_str(&sort, &value, Base::Dec)
                    .map_err(|e| backend_err(self.kind(), e))?;
                let term = mgr.add_value(backend, sort);
                mgr.trace_ret_term(term.id())?;
            }
            SortKind::String => {
                let len = mgr.rng_mut().pick_usize(0, MAX_STRING_VALUE_LEN);
                let value = mgr.rng_mut().pick_string(len);
                mgr.trace_line(&format!("mk_value {} {}", sort.id(), quote(&value)))?;
                mgr.trace_flush()?;
                let backend = mgr
                    .solver_mut()
                    .mk_value_str(&sort, &value, Base::Dec)
                    .map_err(|e| backend_err(self.kind(), e))?;
                let term = Self::register_value(mgr, sort, backend, Some(&value));
                mgr.trace_ret_term(term.id())?;
            }
            _ => unreachable!("non-value sort kind sampled"),
        }
        Ok(true)
    }

    fn untrace(&self, mgr: &mut SolverManager, tokens: &[String]) -> Result<Option<TracedObject>> {
        expect_args(self.kind(), tokens, 2)?;
        let sort = sort_arg(mgr, &tokens[0])?;
        let token = &tokens[1];
        let term = match sort.kind() {
            SortKind::Bool => {
                let value = match token.as_str() {
                    "true" => true,
                    "false" => false,
                    other => return Err(untrace_err(format!("malformed Bool value `{other}`"))),
                };
                let backend = mgr
                    .solver_mut()
                    .mk_value_bool(&sort, value)
                    .map_err(|e| backend_err(self.kind(), e))?;
                mgr.add_value(backend, sort)
            }
            SortKind::Bv => {
                let (digits, base) = if let Some(bits) = token.strip_prefix("#b") {
                    (bits, Base::Bin)
                } else if let Some(hex) = token.strip_prefix("#x") {
                    (hex, Base::Hex)
                } else {
                    (token.as_str(), Base::Dec)
                };
                let backend = mgr
                    .solver_mut()
                    .mk_value_str(&sort, digits, base)
                    .map_err(|e| backend_err(self.kind(), e))?;
                mgr.add_value(backend, sort)
            }
            SortKind::Int | SortKind::Real => {
                let backend = mgr
                    .solver_mut()
                    .mk_value_str(&sort, token, Base::Dec)
                    .map_err(|e| backend_err(self.kind(), e))?;
                mgr.add_value(backend, sort)
            }
            SortKind::String => {
                let backend = mgr
                    .solver_mut()
                    .mk_value_str(&sort, token, Base::Dec)
                    .map_err(|e| backend_err(self.kind(), e))?;
                Self::register_value(mgr, sort, backend, Some(token))
            }
            other => {
                return Err(untrace_err(format!("mk_value for {other} sort")));
            }
        };
        Ok(Some(TracedObject::Term(term)))
    }
}

/// Create a distinguished constant (BV extrema, FP infinities and NaN,
/// rounding modes) of a random existing sort.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionMkSpecialValue;

const SPECIAL_KINDS: &[SortKind] = &[SortKind::Bv, SortKind::Fp, SortKind::Rm];

impl Action for ActionMkSpecialValue {
    fn kind(&self) -> &'static str {
        "mk_special_value"
    }

    fn enabled(&self, mgr: &SolverManager) -> bool {
        mgr.solver().is_initialized() && SPECIAL_KINDS.iter().any(|&k| mgr.has_sort_kind(k))
    }

    fn run(&self, mgr: &mut SolverManager) -> Result<bool> {
        let kinds: Vec<SortKind> = SPECIAL_KINDS
            .iter()
            .copied()
            .filter(|&k| mgr.has_sort_kind(k))
            .collect();
        if kinds.is_empty() {
            return Ok(false);
        }
        let kind = *mgr.rng_mut().choose(&kinds);
        let Some(sort) = mgr.pick_sort_kind(kind, false) else {
            return Ok(false);
        };
        let value = *mgr.rng_mut().choose(SpecialValueKind::for_sort_kind(kind));
        mgr.trace_line(&format!("mk_special_value {} {value}", sort.id()))?;
        mgr.trace_flush()?;
        let backend = mgr
            .solver_mut()
            .mk_special_value(&sort, value)
            .map_err(|e| backend_err(self.kind(), e))?;
        let term = mgr.add_special_value(backend, sort, value);
        mgr.trace_ret_term(term.id())?;
        Ok(true)
    }

    fn untrace(&self, mgr: &mut SolverManager, tokens: &[String]) -> Result<Option<TracedObject>> {
        expect_args(self.kind(), tokens, 2)?;
        let sort = sort_arg(mgr, &tokens[0])?;
        let value: SpecialValueKind = tokens[1]
            .parse()
            .map_err(|e: String| untrace_err(e))?;
        let backend = mgr
            .solver_mut()
            .mk_special_value(&sort, value)
            .map_err(|e| backend_err(self.kind(), e))?;
        let term = mgr.add_special_value(backend, sort, value);
        Ok(Some(TracedObject::Term(term)))
    }
}
