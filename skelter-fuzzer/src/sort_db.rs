//! Sort Database.
//!
//! Every sort ever created during a trace, deduplicated by backend equality
//! and indexed by kind. Sampling walks insertion-ordered vectors so that a
//! fixed seed always yields the same picks. Sorts are never evicted during a
//! trace.

use rustc_hash::FxHashMap;

use skelter_core::rng::SeededRng;
use skelter_core::sort::Sort;
use skelter_core::theory::{SortKind, SortKindSet};

/// The set of created sorts with kind and bit-width indices.
#[derive(Debug, Default)]
pub struct SortDb {
    sorts: Vec<Sort>,
    lookup: FxHashMap<Sort, usize>,
    by_kind: FxHashMap<SortKind, Vec<usize>>,
}

impl SortDb {
    /// An empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct sorts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sorts.len()
    }

    /// True if no sorts have been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sorts.is_empty()
    }

    /// The registered sort semantically equal to `probe`, if any.
    #[must_use]
    pub fn find(&self, probe: &Sort) -> Option<Sort> {
        self.lookup.get(probe).map(|&i| self.sorts[i].clone())
    }

    /// Insert a registered sort. The caller guarantees a fresh id and no
    /// semantically equal entry; both are generator invariants.
    pub fn insert(&mut self, sort: Sort) {
        assert!(sort.id().get() > 0, "inserting unregistered sort");
        let idx = self.sorts.len();
        let prev = self.lookup.insert(sort.clone(), idx);
        assert!(prev.is_none(), "sort {} inserted twice", sort.id());
        self.by_kind.entry(sort.kind()).or_default().push(idx);
        self.sorts.push(sort);
    }

    /// All sorts, in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Sort> {
        self.sorts.iter()
    }

    /// Sorts of one kind, in creation order.
    pub fn iter_kind(&self, kind: SortKind) -> impl Iterator<Item = &Sort> {
        self.by_kind
            .get(&kind)
            .into_iter()
            .flatten()
            .map(|&i| &self.sorts[i])
    }

    /// True if a sort of the given kind exists.
    #[must_use]
    pub fn has_kind(&self, kind: SortKind) -> bool {
        self.by_kind.get(&kind).is_some_and(|v| !v.is_empty())
    }

    /// The kinds that currently have at least one sort, in registry order.
    #[must_use]
    pub fn kinds(&self) -> Vec<SortKind> {
        let mut kinds: Vec<SortKind> = self
            .by_kind
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(&k, _)| k)
            .collect();
        kinds.sort();
        kinds
    }

    /// Uniform pick over all sorts. Requires a non-empty database.
    pub fn pick(&self, rng: &mut SeededRng) -> Sort {
        assert!(!self.sorts.is_empty(), "pick_sort on empty sort database");
        self.sorts[rng.pick_usize(0, self.sorts.len() - 1)].clone()
    }

    /// Uniform pick over the sorts of one kind that satisfy `pred`.
    pub fn pick_kind_where<F>(&self, rng: &mut SeededRng, kind: SortKind, pred: F) -> Option<Sort>
    where
        F: Fn(&Sort) -> bool,
    {
        let candidates: Vec<&Sort> = self.iter_kind(kind).filter(|s| pred(s)).collect();
        if candidates.is_empty() {
            None
        } else {
            Some((*rng.choose(&candidates)).clone())
        }
    }

    /// Uniform pick over all sorts that satisfy `pred`, excluding the given
    /// kinds.
    pub fn pick_excluding_where<F>(
        &self,
        rng: &mut SeededRng,
        exclude: &SortKindSet,
        pred: F,
    ) -> Option<Sort>
    where
        F: Fn(&Sort) -> bool,
    {
        let candidates: Vec<&Sort> = self
            .sorts
            .iter()
            .filter(|s| !exclude.contains(&s.kind()) && pred(s))
            .collect();
        if candidates.is_empty() {
            None
        } else {
            Some((*rng.choose(&candidates)).clone())
        }
    }

    /// True if a bit-vector sort of exactly this width exists and satisfies
    /// `pred`.
    pub fn has_bv_where<F>(&self, width: u32, pred: F) -> bool
    where
        F: Fn(&Sort) -> bool,
    {
        self.iter_kind(SortKind::Bv)
            .any(|s| s.bv_width() == width && pred(s))
    }

    /// True if a bit-vector sort of width `<= max_width` exists and
    /// satisfies `pred`.
    pub fn has_bv_max_where<F>(&self, max_width: u32, pred: F) -> bool
    where
        F: Fn(&Sort) -> bool,
    {
        self.iter_kind(SortKind::Bv)
            .any(|s| s.bv_width() <= max_width && pred(s))
    }

    /// Pick a bit-vector sort of exactly this width.
    pub fn pick_bv_where<F>(&self, rng: &mut SeededRng, width: u32, pred: F) -> Option<Sort>
    where
        F: Fn(&Sort) -> bool,
    {
        self.pick_kind_where(rng, SortKind::Bv, |s| s.bv_width() == width && pred(s))
    }

    /// Pick a bit-vector sort of width `<= max_width`.
    pub fn pick_bv_max_where<F>(&self, rng: &mut SeededRng, max_width: u32, pred: F) -> Option<Sort>
    where
        F: Fn(&Sort) -> bool,
    {
        self.pick_kind_where(rng, SortKind::Bv, |s| s.bv_width() <= max_width && pred(s))
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.sorts.clear();
        self.lookup.clear();
        self.by_kind.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skelter_core::sort::{SortId, SortImpl};
    use std::any::Any;
    use std::rc::Rc;

    #[derive(Debug)]
    struct StructSort {
        kind: SortKind,
        width: u32,
    }

    impl SortImpl for StructSort {
        fn equals(&self, other: &dyn SortImpl) -> bool {
            other
                .as_any()
                .downcast_ref::<StructSort>()
                .is_some_and(|o| o.kind == self.kind && o.width == self.width)
        }
        fn hash_value(&self) -> u64 {
            (self.kind as u64) << 32 | u64::from(self.width)
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn bv_width(&self) -> Option<u32> {
            (self.kind == SortKind::Bv).then_some(self.width)
        }
    }

    fn mk(id: u64, kind: SortKind, width: u32) -> Sort {
        Sort::new(
            SortId::new(id),
            kind,
            vec![],
            Rc::new(StructSort { kind, width }),
        )
    }

    #[test]
    fn test_find_deduplicates_by_backend_equality() {
        let mut db = SortDb::new();
        db.insert(mk(1, SortKind::Bv, 8));
        let probe = Sort::unregistered(SortKind::Bv, vec![], Rc::new(StructSort {
            kind: SortKind::Bv,
            width: 8,
        }));
        let found = db.find(&probe).unwrap();
        assert_eq!(found.id().get(), 1);
        assert!(db.find(&mk(0, SortKind::Bv, 16)).is_none());
    }

    #[test]
    fn test_bv_width_queries() {
        let mut db = SortDb::new();
        db.insert(mk(1, SortKind::Bv, 8));
        db.insert(mk(2, SortKind::Bv, 32));
        db.insert(mk(3, SortKind::Bool, 0));

        assert!(db.has_bv_where(8, |_| true));
        assert!(!db.has_bv_where(16, |_| true));
        assert!(db.has_bv_max_where(16, |_| true));

        let mut rng = SeededRng::new(5);
        let picked = db.pick_bv_max_where(&mut rng, 16, |_| true).unwrap();
        assert_eq!(picked.bv_width(), 8);
        assert!(db.pick_bv_where(&mut rng, 64, |_| true).is_none());
    }

    #[test]
    fn test_kinds_are_sorted_and_nonempty() {
        let mut db = SortDb::new();
        db.insert(mk(1, SortKind::Int, 0));
        db.insert(mk(2, SortKind::Bool, 0));
        assert_eq!(db.kinds(), vec![SortKind::Bool, SortKind::Int]);
    }

    #[test]
    fn test_pick_excluding() {
        let mut db = SortDb::new();
        db.insert(mk(1, SortKind::Bool, 0));
        db.insert(mk(2, SortKind::Int, 0));
        let mut rng = SeededRng::new(1);
        let exclude: SortKindSet = [SortKind::Bool].into_iter().collect();
        for _ in 0..10 {
            let s = db.pick_excluding_where(&mut rng, &exclude, |_| true).unwrap();
            assert_eq!(s.kind(), SortKind::Int);
        }
    }

    #[test]
    #[should_panic(expected = "unregistered")]
    fn test_insert_unregistered_panics() {
        let mut db = SortDb::new();
        db.insert(mk(0, SortKind::Bool, 0));
    }
}
