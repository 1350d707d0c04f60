//! Term Database.
//!
//! All live terms, indexed by sort kind, sort and defining scope level.
//! Levels form a stack: level 0 is the global assertion context, `push`/`pop`
//! add and remove assertion levels, and each quantifier variable opens a
//! binder level on top. Popping a level evicts every term defined at it, so
//! no sampler can ever hand out a term whose scope is gone.
//!
//! Binder levels always sit above assertion levels. Samplers that feed
//! context-escaping calls (assert, check-sat-assuming, get-value) use the
//! `closed_*` variants, which only see levels below the first open binder.

use rustc_hash::FxHashMap;

use skelter_core::rng::SeededRng;
use skelter_core::sort::Sort;
use skelter_core::term::{Term, TermKind};
use skelter_core::theory::SortKind;

/// What a scope level was opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelKind {
    /// A `push` scope (level 0 is the implicit outermost one).
    Assertion,
    /// The scope of one quantifier variable.
    Binder,
}

#[derive(Debug, Default)]
struct SortPool {
    sorts: Vec<Sort>,
    terms: FxHashMap<Sort, Vec<Term>>,
}

impl SortPool {
    fn add(&mut self, term: Term) {
        let sort = term.sort().clone();
        let bucket = self.terms.entry(sort.clone()).or_default();
        if bucket.is_empty() {
            self.sorts.push(sort);
        }
        bucket.push(term);
    }
}

#[derive(Debug)]
struct Level {
    kind: LevelKind,
    var: Option<Term>,
    pools: FxHashMap<SortKind, SortPool>,
    all: Vec<Term>,
}

impl Level {
    fn new(kind: LevelKind, var: Option<Term>) -> Self {
        Self {
            kind,
            var,
            pools: FxHashMap::default(),
            all: Vec::new(),
        }
    }
}

/// The term database with its scope stack.
#[derive(Debug)]
pub struct TermDb {
    levels: Vec<Level>,
    lookup: FxHashMap<Term, Term>,
    term_level: FxHashMap<Term, usize>,
    values: FxHashMap<Sort, Vec<Term>>,
    string_chars: Vec<Term>,
}

impl TermDb {
    /// A database with only the global assertion level.
    #[must_use]
    pub fn new() -> Self {
        Self {
            levels: vec![Level::new(LevelKind::Assertion, None)],
            lookup: FxHashMap::default(),
            term_level: FxHashMap::default(),
            values: FxHashMap::default(),
            string_chars: Vec::new(),
        }
    }

    /// Index of the current (top) level.
    #[must_use]
    pub fn cur_level(&self) -> usize {
        self.levels.len() - 1
    }

    /// Index of the lowest open binder level, if any.
    #[must_use]
    pub fn first_binder_level(&self) -> Option<usize> {
        self.levels.iter().position(|l| l.kind == LevelKind::Binder)
    }

    /// True if a binder level is open.
    #[must_use]
    pub fn in_binder(&self) -> bool {
        self.first_binder_level().is_some()
    }

    /// Highest level visible to context-escaping calls.
    #[must_use]
    pub fn closed_top(&self) -> usize {
        match self.first_binder_level() {
            Some(first) => first - 1,
            None => self.cur_level(),
        }
    }

    /// Open `n` assertion levels.
    pub fn push_assertion_levels(&mut self, n: u32) {
        assert!(!self.in_binder(), "push with an open binder scope");
        for _ in 0..n {
            self.levels.push(Level::new(LevelKind::Assertion, None));
        }
    }

    /// Close `n` assertion levels, evicting every term they defined.
    pub fn pop_assertion_levels(&mut self, n: u32) {
        assert!(!self.in_binder(), "pop with an open binder scope");
        assert!(
            (n as usize) < self.levels.len(),
            "pop of {n} levels exceeds stack depth"
        );
        for _ in 0..n {
            let level = self.levels.pop().unwrap_or_else(|| unreachable!());
            self.evict(level);
        }
    }

    /// Open a binder level for a quantifier variable and register the
    /// variable in it.
    pub fn open_binder(&mut self, var: Term) {
        assert_eq!(var.kind(), TermKind::Var, "binder scope for a non-variable");
        self.levels.push(Level::new(LevelKind::Binder, Some(var.clone())));
        self.register(var, self.cur_level());
    }

    /// Close the top binder level, evicting its terms; returns its variable.
    pub fn close_binder(&mut self) -> Term {
        let level = self.levels.pop().unwrap_or_else(|| unreachable!());
        assert_eq!(level.kind, LevelKind::Binder, "close_binder on assertion level");
        let var = level.var.clone();
        self.evict(level);
        match var {
            Some(v) => v,
            None => unreachable!("binder level without variable"),
        }
    }

    /// The variable of the top binder level.
    #[must_use]
    pub fn cur_var(&self) -> Option<&Term> {
        let top = self.levels.last()?;
        if top.kind == LevelKind::Binder {
            top.var.as_ref()
        } else {
            None
        }
    }

    /// The canonical live instance semantically equal to `probe`, if any.
    #[must_use]
    pub fn find(&self, probe: &Term) -> Option<Term> {
        self.lookup.get(probe).cloned()
    }

    /// Defining level of a live term.
    #[must_use]
    pub fn level_of(&self, term: &Term) -> Option<usize> {
        self.term_level.get(term).copied()
    }

    /// Register a term at a level. Fresh id and absence from the database
    /// are generator invariants.
    pub fn register(&mut self, term: Term, level: usize) {
        assert!(term.id().get() > 0, "registering unregistered term");
        assert!(level < self.levels.len(), "registering at dead level {level}");
        let prev = self.lookup.insert(term.clone(), term.clone());
        assert!(prev.is_none(), "term {} registered twice", term.id());
        self.term_level.insert(term.clone(), level);
        let slot = &mut self.levels[level];
        slot.pools
            .entry(term.sort().kind())
            .or_default()
            .add(term.clone());
        slot.all.push(term);
    }

    /// Register a value term; it additionally joins the per-sort value pool.
    pub fn register_value(&mut self, term: Term, level: usize) {
        self.values.entry(term.sort().clone()).or_default().push(term.clone());
        self.register(term, level);
    }

    /// Add an already registered length-1 string value to the character
    /// pool.
    pub fn register_string_char(&mut self, term: &Term) {
        debug_assert!(self.lookup.contains_key(term));
        self.string_chars.push(term.clone());
    }

    fn evict(&mut self, level: Level) {
        for term in &level.all {
            self.lookup.remove(term);
            self.term_level.remove(term);
            if term.is_value() {
                if let Some(pool) = self.values.get_mut(term.sort()) {
                    pool.retain(|t| t.id() != term.id());
                }
            }
        }
        let term_level = &self.term_level;
        self.string_chars.retain(|t| term_level.contains_key(t));
    }

    fn pools_up_to(&self, kind: SortKind, max_level: usize) -> impl Iterator<Item = &SortPool> {
        self.levels[..=max_level]
            .iter()
            .filter_map(move |l| l.pools.get(&kind))
    }

    fn kinds_up_to(&self, max_level: usize) -> Vec<SortKind> {
        let mut kinds: Vec<SortKind> = Vec::new();
        for level in &self.levels[..=max_level] {
            for (&kind, pool) in &level.pools {
                if !pool.sorts.is_empty() && !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
        }
        kinds.sort();
        kinds
    }

    /// True if any term is live.
    #[must_use]
    pub fn has_term(&self) -> bool {
        !self.term_level.is_empty()
    }

    /// True if a term of the kind is live at levels `0..=max_level`.
    #[must_use]
    pub fn has_term_kind_at(&self, kind: SortKind, max_level: usize) -> bool {
        self.pools_up_to(kind, max_level).any(|p| !p.sorts.is_empty())
    }

    /// True if a term of the kind is live anywhere.
    #[must_use]
    pub fn has_term_kind(&self, kind: SortKind) -> bool {
        self.has_term_kind_at(kind, self.cur_level())
    }

    /// True if a term of the sort is live anywhere.
    #[must_use]
    pub fn has_term_sort(&self, sort: &Sort) -> bool {
        self.pools_up_to(sort.kind(), self.cur_level())
            .any(|p| p.terms.get(sort).is_some_and(|v| !v.is_empty()))
    }

    /// True if a term of the kind is live below every open binder.
    #[must_use]
    pub fn has_closed_term_kind(&self, kind: SortKind) -> bool {
        self.has_term_kind_at(kind, self.closed_top())
    }

    /// True if a term of the sort is live below every open binder.
    #[must_use]
    pub fn has_closed_term_sort(&self, sort: &Sort) -> bool {
        self.pools_up_to(sort.kind(), self.closed_top())
            .any(|p| p.terms.get(sort).is_some_and(|v| !v.is_empty()))
    }

    /// Sort kinds with live terms, in registry order.
    #[must_use]
    pub fn kinds_with_terms(&self) -> Vec<SortKind> {
        self.kinds_up_to(self.cur_level())
    }

    /// Sort kinds with live terms below every open binder.
    #[must_use]
    pub fn kinds_with_closed_terms(&self) -> Vec<SortKind> {
        self.kinds_up_to(self.closed_top())
    }

    fn pick_at(&self, rng: &mut SeededRng, kind: SortKind, max_level: usize) -> Term {
        // Sort first, then a term of that sort, per the tie-breaking rule.
        let mut sorts: Vec<&Sort> = Vec::new();
        for pool in self.pools_up_to(kind, max_level) {
            for sort in &pool.sorts {
                if !pool.terms.get(sort).is_some_and(|v| !v.is_empty()) {
                    continue;
                }
                if !sorts.iter().any(|s| *s == sort) {
                    sorts.push(sort);
                }
            }
        }
        assert!(!sorts.is_empty(), "pick_term({kind}) without terms of that kind");
        let sort = (*rng.choose(&sorts)).clone();
        self.pick_sort_at(rng, &sort, max_level)
    }

    fn pick_sort_at(&self, rng: &mut SeededRng, sort: &Sort, max_level: usize) -> Term {
        let candidates: Vec<&Term> = self
            .pools_up_to(sort.kind(), max_level)
            .filter_map(|p| p.terms.get(sort))
            .flatten()
            .collect();
        assert!(!candidates.is_empty(), "pick_term(sort {}) without terms", sort.id());
        (*rng.choose(&candidates)).clone()
    }

    /// Pick any live term.
    pub fn pick_term(&self, rng: &mut SeededRng) -> Term {
        let kinds = self.kinds_with_terms();
        assert!(!kinds.is_empty(), "pick_term on empty term database");
        let kind = *rng.choose(&kinds);
        self.pick_at(rng, kind, self.cur_level())
    }

    /// Pick a live term of the kind.
    pub fn pick_term_kind(&self, rng: &mut SeededRng, kind: SortKind) -> Term {
        self.pick_at(rng, kind, self.cur_level())
    }

    /// Pick a live term of the kind from levels `0..=max_level`.
    pub fn pick_term_kind_at(&self, rng: &mut SeededRng, kind: SortKind, max_level: usize) -> Term {
        self.pick_at(rng, kind, max_level)
    }

    /// Pick a live term of the sort.
    pub fn pick_term_sort(&self, rng: &mut SeededRng, sort: &Sort) -> Term {
        self.pick_sort_at(rng, sort, self.cur_level())
    }

    /// Pick a term of the kind from below every open binder.
    pub fn pick_closed_term_kind(&self, rng: &mut SeededRng, kind: SortKind) -> Term {
        self.pick_at(rng, kind, self.closed_top())
    }

    /// Pick a term of the sort from below every open binder.
    pub fn pick_closed_term_sort(&self, rng: &mut SeededRng, sort: &Sort) -> Term {
        self.pick_sort_at(rng, sort, self.closed_top())
    }

    /// True if a value of the sort is live.
    #[must_use]
    pub fn has_value(&self, sort: &Sort) -> bool {
        self.values.get(sort).is_some_and(|v| !v.is_empty())
    }

    /// Pick a live value of the sort.
    pub fn pick_value(&self, rng: &mut SeededRng, sort: &Sort) -> Term {
        let pool = match self.values.get(sort) {
            Some(pool) if !pool.is_empty() => pool,
            _ => panic!("pick_value(sort {}) without values", sort.id()),
        };
        rng.choose(pool).clone()
    }

    /// True if a length-1 string value is live.
    #[must_use]
    pub fn has_string_char_value(&self) -> bool {
        !self.string_chars.is_empty()
    }

    /// Pick a live length-1 string value.
    pub fn pick_string_char_value(&self, rng: &mut SeededRng) -> Term {
        assert!(!self.string_chars.is_empty(), "no string character values");
        rng.choose(&self.string_chars).clone()
    }

    /// True if a quantifier variable is in scope.
    #[must_use]
    pub fn has_var(&self) -> bool {
        self.cur_var().is_some()
    }

    /// True if a Boolean term is live at a level where variables are in
    /// scope.
    #[must_use]
    pub fn has_quant_body(&self) -> bool {
        let Some(first) = self.first_binder_level() else {
            return false;
        };
        (first..=self.cur_level())
            .any(|l| self.levels[l].pools.get(&SortKind::Bool).is_some_and(|p| !p.sorts.is_empty()))
    }

    /// Pick a Boolean term from the open binder levels, for use as a
    /// quantifier matrix.
    pub fn pick_quant_body(&self, rng: &mut SeededRng) -> Term {
        let first = match self.first_binder_level() {
            Some(first) => first,
            None => panic!("pick_quant_body without open binder"),
        };
        let candidates: Vec<&Term> = self.levels[first..]
            .iter()
            .filter_map(|l| l.pools.get(&SortKind::Bool))
            .flat_map(|p| p.sorts.iter().filter_map(|s| p.terms.get(s)))
            .flatten()
            .collect();
        assert!(!candidates.is_empty(), "pick_quant_body without Boolean body");
        (*rng.choose(&candidates)).clone()
    }

    /// All live terms with their defining levels.
    pub fn iter(&self) -> impl Iterator<Item = (&Term, usize)> {
        self.term_level.iter().map(|(t, &l)| (t, l))
    }

    /// Number of live terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.term_level.len()
    }

    /// True if no terms are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.term_level.is_empty()
    }

    /// Drop everything and return to a single empty assertion level.
    pub fn clear(&mut self) {
        self.levels = vec![Level::new(LevelKind::Assertion, None)];
        self.lookup.clear();
        self.term_level.clear();
        self.values.clear();
        self.string_chars.clear();
    }
}

impl Default for TermDb {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skelter_core::sort::{SortId, SortImpl};
    use skelter_core::term::{TermId, TermImpl};
    use std::any::Any;
    use std::rc::Rc;

    #[derive(Debug)]
    struct TagSort(SortKind);

    impl SortImpl for TagSort {
        fn equals(&self, other: &dyn SortImpl) -> bool {
            other.as_any().downcast_ref::<TagSort>().is_some_and(|o| o.0 == self.0)
        }
        fn hash_value(&self) -> u64 {
            self.0 as u64
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug)]
    struct TagTerm(u64);

    impl TermImpl for TagTerm {
        fn equals(&self, other: &dyn TermImpl) -> bool {
            other.as_any().downcast_ref::<TagTerm>().is_some_and(|o| o.0 == self.0)
        }
        fn hash_value(&self) -> u64 {
            self.0
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn sort(kind: SortKind, id: u64) -> Sort {
        Sort::new(SortId::new(id), kind, vec![], Rc::new(TagSort(kind)))
    }

    fn term(id: u64, s: &Sort, kind: TermKind) -> Term {
        Term::leaf(TermId::new(id), s.clone(), kind, Rc::new(TagTerm(id)))
    }

    #[test]
    fn test_pop_evicts_terms() {
        let mut db = TermDb::new();
        let bv = sort(SortKind::Bv, 1);
        db.register(term(1, &bv, TermKind::Const), 0);

        db.push_assertion_levels(2);
        let y = term(2, &bv, TermKind::Const);
        db.register(y.clone(), db.cur_level());
        assert!(db.has_term_sort(&bv));
        assert!(db.find(&y).is_some());

        db.pop_assertion_levels(1);
        assert!(db.find(&y).is_none());
        assert!(db.level_of(&y).is_none());

        // The level-0 constant is still there.
        assert!(db.has_term_sort(&bv));
        let mut rng = SeededRng::new(0);
        for _ in 0..20 {
            assert_eq!(db.pick_term_sort(&mut rng, &bv).id().get(), 1);
        }
    }

    #[test]
    fn test_binder_scope_discipline() {
        let mut db = TermDb::new();
        let boolean = sort(SortKind::Bool, 1);
        db.register(term(1, &boolean, TermKind::Const), 0);

        let var = term(2, &boolean, TermKind::Var);
        db.open_binder(var.clone());
        assert!(db.has_var());
        assert!(db.in_binder());
        assert_eq!(db.closed_top(), 0);

        // A body mentioning the variable lives at the binder level.
        let body = term(3, &boolean, TermKind::Const);
        db.register(body.clone(), db.cur_level());
        assert!(db.has_quant_body());
        assert!(db.has_closed_term_kind(SortKind::Bool));

        // Closed sampling never sees binder-level terms.
        let mut rng = SeededRng::new(1);
        for _ in 0..20 {
            assert_eq!(db.pick_closed_term_kind(&mut rng, SortKind::Bool).id().get(), 1);
        }

        let returned = db.close_binder();
        assert_eq!(returned.id(), var.id());
        assert!(db.find(&body).is_none());
        assert!(db.find(&var).is_none());
        assert!(!db.has_var());
    }

    #[test]
    fn test_value_pool_eviction() {
        let mut db = TermDb::new();
        let int = sort(SortKind::Int, 1);
        db.push_assertion_levels(1);
        let v = term(1, &int, TermKind::Value);
        db.register_value(v.clone(), db.cur_level());
        assert!(db.has_value(&int));
        db.pop_assertion_levels(1);
        assert!(!db.has_value(&int));
    }

    #[test]
    fn test_string_char_pool_follows_liveness() {
        let mut db = TermDb::new();
        let string = sort(SortKind::String, 1);
        db.push_assertion_levels(1);
        let c = term(1, &string, TermKind::Value);
        db.register_value(c.clone(), db.cur_level());
        db.register_string_char(&c);
        assert!(db.has_string_char_value());
        db.pop_assertion_levels(1);
        assert!(!db.has_string_char_value());
    }

    #[test]
    fn test_kind_queries() {
        let mut db = TermDb::new();
        let bv = sort(SortKind::Bv, 1);
        assert!(!db.has_term_kind(SortKind::Bv));
        db.register(term(1, &bv, TermKind::Const), 0);
        assert!(db.has_term_kind(SortKind::Bv));
        assert_eq!(db.kinds_with_terms(), vec![SortKind::Bv]);
    }

    #[test]
    #[should_panic(expected = "without terms of that kind")]
    fn test_pick_missing_kind_panics() {
        let db = TermDb::new();
        let mut rng = SeededRng::new(0);
        let _ = db.pick_term_kind(&mut rng, SortKind::Bv);
    }
}
