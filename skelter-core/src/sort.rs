//! Sort Data Model.
//!
//! A [`Sort`] wraps an opaque backend handle together with the metadata the
//! generator tracks: a stable id, the sort kind, and the child sorts it was
//! constructed from. Semantic equality and hashing are delegated to the
//! backend handle, so two structurally distinct handles the backend considers
//! equal collapse to one database entry.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::theory::SortKind;

/// Stable numeric identifier of a registered sort. Id 0 means unregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SortId(u64);

impl SortId {
    /// The id of a sort that has not been registered yet.
    pub const UNREGISTERED: SortId = SortId(0);

    /// Wrap a raw id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Backend-side representation of a sort.
///
/// Backends decide semantic equality and answer the shape queries for
/// parametric kinds; the generator never inspects the handle beyond this
/// trait.
pub trait SortImpl: fmt::Debug {
    /// Semantic equality as decided by the backend.
    fn equals(&self, other: &dyn SortImpl) -> bool;

    /// Hash consistent with [`SortImpl::equals`].
    fn hash_value(&self) -> u64;

    /// Downcast support for backends.
    fn as_any(&self) -> &dyn Any;

    /// Bit-width, for bit-vector sorts.
    fn bv_width(&self) -> Option<u32> {
        None
    }

    /// Exponent width, for floating-point sorts.
    fn fp_exp_width(&self) -> Option<u32> {
        None
    }

    /// Significand width, for floating-point sorts.
    fn fp_sig_width(&self) -> Option<u32> {
        None
    }
}

/// Shared backend sort handle.
pub type BackendSort = Rc<dyn SortImpl>;

#[derive(Debug)]
struct SortInner {
    id: SortId,
    kind: SortKind,
    children: Vec<Sort>,
    backend: BackendSort,
}

/// A registered sort: backend handle plus generator metadata.
///
/// Cheap to clone; all clones share one inner allocation. References between
/// sorts only point from parent to child, so no cycles can form.
#[derive(Debug, Clone)]
pub struct Sort {
    inner: Rc<SortInner>,
}

impl Sort {
    /// Wrap a backend handle under a registered id.
    ///
    /// For composite kinds `children` holds the construction arguments
    /// (`[index, element]` for arrays; domains then codomain for functions).
    #[must_use]
    pub fn new(id: SortId, kind: SortKind, children: Vec<Sort>, backend: BackendSort) -> Self {
        Self {
            inner: Rc::new(SortInner {
                id,
                kind,
                children,
                backend,
            }),
        }
    }

    /// Wrap a backend handle that has not been registered yet.
    ///
    /// Used to probe the sort database for an existing semantically equal
    /// sort before assigning a fresh id.
    #[must_use]
    pub fn unregistered(kind: SortKind, children: Vec<Sort>, backend: BackendSort) -> Self {
        Self::new(SortId::UNREGISTERED, kind, children, backend)
    }

    /// Stable id.
    #[must_use]
    pub fn id(&self) -> SortId {
        self.inner.id
    }

    /// Sort kind.
    #[must_use]
    pub fn kind(&self) -> SortKind {
        self.inner.kind
    }

    /// Child sorts this sort was constructed from; empty for atomic and
    /// parametric kinds.
    #[must_use]
    pub fn children(&self) -> &[Sort] {
        &self.inner.children
    }

    /// The backend handle.
    #[must_use]
    pub fn backend(&self) -> &BackendSort {
        &self.inner.backend
    }

    /// Re-wrap this sort's backend handle and children under a new id.
    #[must_use]
    pub fn with_id(&self, id: SortId) -> Sort {
        Sort::new(
            id,
            self.inner.kind,
            self.inner.children.clone(),
            Rc::clone(&self.inner.backend),
        )
    }

    /// Bit-width of a bit-vector sort.
    ///
    /// Panics if this is not a BV sort or the backend reports no width;
    /// either is a generator bug.
    #[must_use]
    pub fn bv_width(&self) -> u32 {
        assert_eq!(self.kind(), SortKind::Bv, "bv_width on {} sort", self.kind());
        match self.inner.backend.bv_width() {
            Some(w) => w,
            None => panic!("backend reports no width for BV sort {}", self.id()),
        }
    }

    /// Exponent width of a floating-point sort.
    #[must_use]
    pub fn fp_exp_width(&self) -> u32 {
        assert_eq!(self.kind(), SortKind::Fp, "fp_exp_width on {} sort", self.kind());
        match self.inner.backend.fp_exp_width() {
            Some(w) => w,
            None => panic!("backend reports no exponent width for FP sort {}", self.id()),
        }
    }

    /// Significand width of a floating-point sort.
    #[must_use]
    pub fn fp_sig_width(&self) -> u32 {
        assert_eq!(self.kind(), SortKind::Fp, "fp_sig_width on {} sort", self.kind());
        match self.inner.backend.fp_sig_width() {
            Some(w) => w,
            None => panic!("backend reports no significand width for FP sort {}", self.id()),
        }
    }

    /// Index sort of an array sort.
    #[must_use]
    pub fn array_index(&self) -> &Sort {
        assert_eq!(self.kind(), SortKind::Array, "array_index on {} sort", self.kind());
        &self.inner.children[0]
    }

    /// Element sort of an array sort.
    #[must_use]
    pub fn array_element(&self) -> &Sort {
        assert_eq!(self.kind(), SortKind::Array, "array_element on {} sort", self.kind());
        &self.inner.children[1]
    }

    /// Domain sorts of a function sort.
    #[must_use]
    pub fn fun_domain(&self) -> &[Sort] {
        assert_eq!(self.kind(), SortKind::Fun, "fun_domain on {} sort", self.kind());
        let children = &self.inner.children;
        &children[..children.len() - 1]
    }

    /// Codomain sort of a function sort.
    #[must_use]
    pub fn fun_codomain(&self) -> &Sort {
        assert_eq!(self.kind(), SortKind::Fun, "fun_codomain on {} sort", self.kind());
        let children = &self.inner.children;
        &children[children.len() - 1]
    }

    /// True for Boolean sorts.
    #[must_use]
    pub fn is_bool(&self) -> bool {
        self.kind() == SortKind::Bool
    }

    /// True for bit-vector sorts.
    #[must_use]
    pub fn is_bv(&self) -> bool {
        self.kind() == SortKind::Bv
    }

    /// True for floating-point sorts.
    #[must_use]
    pub fn is_fp(&self) -> bool {
        self.kind() == SortKind::Fp
    }

    /// True for function sorts.
    #[must_use]
    pub fn is_fun(&self) -> bool {
        self.kind() == SortKind::Fun
    }
}

impl PartialEq for Sort {
    fn eq(&self, other: &Self) -> bool {
        self.inner.backend.equals(other.inner.backend.as_ref())
    }
}

impl Eq for Sort {}

impl Hash for Sort {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.inner.backend.hash_value());
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FakeSort {
        tag: u32,
        width: Option<u32>,
    }

    impl SortImpl for FakeSort {
        fn equals(&self, other: &dyn SortImpl) -> bool {
            other
                .as_any()
                .downcast_ref::<FakeSort>()
                .is_some_and(|o| o.tag == self.tag)
        }

        fn hash_value(&self) -> u64 {
            u64::from(self.tag)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn bv_width(&self) -> Option<u32> {
            self.width
        }
    }

    fn fake(kind: SortKind, tag: u32, width: Option<u32>) -> Sort {
        Sort::new(
            SortId::new(u64::from(tag)),
            kind,
            vec![],
            Rc::new(FakeSort { tag, width }),
        )
    }

    #[test]
    fn test_equality_is_backend_delegated() {
        let a = fake(SortKind::Bv, 1, Some(8));
        let b = Sort::new(SortId::new(99), SortKind::Bv, vec![], Rc::new(FakeSort { tag: 1, width: Some(8) }));
        let c = fake(SortKind::Bv, 2, Some(8));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_bv_width_delegation() {
        let a = fake(SortKind::Bv, 1, Some(32));
        assert_eq!(a.bv_width(), 32);
    }

    #[test]
    fn test_composite_accessors() {
        let idx = fake(SortKind::Int, 1, None);
        let elt = fake(SortKind::Bool, 2, None);
        let arr = Sort::new(
            SortId::new(3),
            SortKind::Array,
            vec![idx.clone(), elt.clone()],
            Rc::new(FakeSort { tag: 3, width: None }),
        );
        assert_eq!(arr.array_index().id(), idx.id());
        assert_eq!(arr.array_element().id(), elt.id());

        let fun = Sort::new(
            SortId::new(4),
            SortKind::Fun,
            vec![idx.clone(), elt.clone()],
            Rc::new(FakeSort { tag: 4, width: None }),
        );
        assert_eq!(fun.fun_domain().len(), 1);
        assert_eq!(fun.fun_codomain().id(), elt.id());
    }

    #[test]
    fn test_display_uses_id() {
        let a = fake(SortKind::Bool, 7, None);
        assert_eq!(a.to_string(), "s7");
    }
}
