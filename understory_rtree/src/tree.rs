// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `RTree` container: construction, bounds, teardown, and introspection.

use core::fmt::Debug;
use core::marker::PhantomData;

use crate::error::ConfigError;
use crate::node::{Arena, Node, NodeIdx};
use crate::params::{DefaultParams, RTreeParams, validate};
use crate::types::{Aabb, Scalar};

/// A mutable R-tree mapping axis-aligned boxes to payloads.
///
/// `T` is the coordinate scalar, `P` the payload stored inline in leaves, `D`
/// the dimensionality, and `C` the compile-time [structural parameters][RTreeParams].
///
/// The root always exists. An empty tree is a single empty leaf, and every
/// other node is owned by exactly one parent branch.
///
/// ## Example
///
/// ```rust
/// use understory_rtree::{Aabb2D, RTree, SearchMode};
///
/// let mut tree: RTree<f64, u32> = RTree::new();
/// tree.insert(Aabb2D::new(0.0, 0.0, 10.0, 10.0), 1);
/// tree.insert(Aabb2D::new(5.0, 5.0, 15.0, 15.0), 2);
///
/// let hits: Vec<_> = tree
///     .query(Aabb2D::new(12.0, 12.0, 20.0, 20.0), SearchMode::Intersecting)
///     .map(|(_, p)| *p)
///     .collect();
/// assert_eq!(hits, [2]);
///
/// assert!(tree.remove(&Aabb2D::new(0.0, 0.0, 10.0, 10.0), &1));
/// assert_eq!(tree.bounds(), Some(Aabb2D::new(5.0, 5.0, 15.0, 15.0)));
/// ```
pub struct RTree<T: Scalar, P, const D: usize = 2, C: RTreeParams = DefaultParams> {
    pub(crate) arena: Arena<T, P, D>,
    pub(crate) root: NodeIdx,
    pub(crate) len: usize,
    _params: PhantomData<C>,
}

impl<T: Scalar, P, const D: usize, C: RTreeParams> RTree<T, P, D, C> {
    /// Create an empty tree, validating the structural parameters.
    pub fn try_new() -> Result<Self, ConfigError> {
        validate::<C, D>()?;
        let mut arena = Arena::new();
        let root = arena.alloc(Node::empty_leaf(C::MAX_LEAF_ENTRIES));
        Ok(Self {
            arena,
            root,
            len: 0,
            _params: PhantomData,
        })
    }

    /// Create an empty tree.
    ///
    /// # Panics
    ///
    /// Panics if `D` is zero or `C` describes node shapes that cannot be split
    /// (see [`ConfigError`]). Use [`RTree::try_new`] to handle this as an error.
    pub fn new() -> Self {
        match Self::try_new() {
            Ok(tree) => tree,
            Err(err) => panic!("invalid R-tree parameters: {err}"),
        }
    }

    /// Number of entries stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of node levels; 1 for a tree whose root is a leaf.
    pub fn height(&self) -> usize {
        self.arena.get(self.root).level() + 1
    }

    /// Number of nodes currently allocated, root included.
    pub fn node_count(&self) -> usize {
        self.arena.live()
    }

    /// Union of every stored rectangle, or `None` when the tree is empty.
    pub fn bounds(&self) -> Option<Aabb<T, D>> {
        self.arena.get(self.root).cover()
    }

    /// Remove every entry, leaving a single empty root leaf.
    ///
    /// The tree is reusable afterwards and behaves exactly like a fresh one.
    pub fn clear(&mut self) {
        if self.len > 0 {
            log::debug!(
                "clearing R-tree: {} entries in {} nodes",
                self.len,
                self.arena.live()
            );
        }
        self.arena.clear();
        self.root = self.arena.alloc(Node::empty_leaf(C::MAX_LEAF_ENTRIES));
        self.len = 0;
    }

    pub(crate) fn min_fill(level: usize) -> usize {
        if level == 0 {
            C::MIN_LEAF_ENTRIES
        } else {
            C::MIN_INTERNAL_ENTRIES
        }
    }
}

impl<T: Scalar, P, const D: usize, C: RTreeParams> Default for RTree<T, P, D, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Scalar, P: Clone, const D: usize, C: RTreeParams> Clone for RTree<T, P, D, C> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena.clone(),
            root: self.root,
            len: self.len,
            _params: PhantomData,
        }
    }
}

impl<T: Scalar, P, const D: usize, C: RTreeParams> Debug for RTree<T, P, D, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RTree")
            .field("len", &self.len)
            .field("height", &self.height())
            .field("nodes", &self.arena.live())
            .field("max_leaf_entries", &C::MAX_LEAF_ENTRIES)
            .field("max_internal_entries", &C::MAX_INTERNAL_ENTRIES)
            .field("bounds", &self.bounds())
            .finish_non_exhaustive()
    }
}

impl<T: Scalar, P, const D: usize, C: RTreeParams> Extend<(Aabb<T, D>, P)> for RTree<T, P, D, C> {
    fn extend<I: IntoIterator<Item = (Aabb<T, D>, P)>>(&mut self, iter: I) {
        for (rect, payload) in iter {
            self.insert(rect, payload);
        }
    }
}

impl<T: Scalar, P, const D: usize, C: RTreeParams> FromIterator<(Aabb<T, D>, P)>
    for RTree<T, P, D, C>
{
    fn from_iter<I: IntoIterator<Item = (Aabb<T, D>, P)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

/// R-tree with i64 coordinates and i128 metrics.
pub type RTreeI64<P> = RTree<i64, P>;

/// R-tree with f32 coordinates and f64 metrics.
pub type RTreeF32<P> = RTree<f32, P>;

/// R-tree with f64 coordinates and f64 metrics.
pub type RTreeF64<P> = RTree<f64, P>;

#[cfg(test)]
impl<T: Scalar, P, const D: usize, C: RTreeParams> RTree<T, P, D, C> {
    /// Walk the whole tree and panic on any broken structural invariant.
    pub(crate) fn assert_invariants(&self) {
        let root = self.arena.get(self.root);
        if let Node::Internal { children, .. } = root {
            assert!(children.len() >= 2, "internal root has {} children", children.len());
        }
        let (entries, nodes) = self.check_node(self.root, true);
        assert_eq!(entries, self.len, "entry count out of sync");
        assert_eq!(nodes, self.arena.live(), "unreachable nodes in arena");
    }

    fn check_node(&self, idx: NodeIdx, is_root: bool) -> (usize, usize) {
        let node = self.arena.get(idx);
        let level = node.level();
        let capacity = if level == 0 {
            C::MAX_LEAF_ENTRIES
        } else {
            C::MAX_INTERNAL_ENTRIES
        };
        assert!(node.len() <= capacity, "node over capacity");
        if !is_root {
            assert!(node.len() >= Self::min_fill(level), "non-root node underflows");
        }
        match node {
            Node::Leaf { entries } => (entries.len(), 1),
            Node::Internal { children, .. } => {
                let mut totals = (0, 1);
                for child in children {
                    let sub = self.arena.get(child.node);
                    assert_eq!(sub.level() + 1, level, "child level mismatch");
                    assert_eq!(sub.cover(), Some(child.rect), "stale branch rectangle");
                    let (e, n) = self.check_node(child.node, false);
                    totals.0 += e;
                    totals.1 += n;
                }
                totals
            }
        }
    }
}
