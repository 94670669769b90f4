// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Predicate-driven traversal: the visitor form and the lazy iterator form.
//!
//! Both walk depth-first, pre-order, in slot order, and prune subtrees with the
//! same rule, so they yield the same entries in the same order.

use core::fmt::Debug;
use core::iter::FusedIterator;

use smallvec::SmallVec;

use crate::node::{Arena, Node, NodeIdx};
use crate::params::RTreeParams;
use crate::tree::RTree;
use crate::types::{Aabb, Scalar};

/// Which stored rectangles a search reports, relative to the query rectangle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SearchMode {
    /// Entries that overlap the query, edges included.
    #[default]
    Intersecting,
    /// Entries lying entirely inside the query.
    ContainedBy,
    /// Entries that entirely cover the query.
    Containing,
}

impl SearchMode {
    /// Whether an entry with rectangle `rect` is reported for `query`.
    ///
    /// ```
    /// use understory_rtree::{Aabb2D, SearchMode};
    ///
    /// let query = Aabb2D::new(0, 0, 10, 10);
    /// let small = Aabb2D::new(2, 2, 3, 3);
    /// assert!(SearchMode::Intersecting.matches(&small, &query));
    /// assert!(SearchMode::ContainedBy.matches(&small, &query));
    /// assert!(!SearchMode::Containing.matches(&small, &query));
    /// ```
    #[inline]
    pub fn matches<T: Copy + PartialOrd, const D: usize>(
        self,
        rect: &Aabb<T, D>,
        query: &Aabb<T, D>,
    ) -> bool {
        match self {
            Self::Intersecting => rect.overlaps(query),
            Self::ContainedBy => query.contains(rect),
            Self::Containing => rect.contains(query),
        }
    }

    /// Whether a subtree covered by `cover` can hold a matching entry.
    #[inline]
    pub(crate) fn descend<T: Copy + PartialOrd, const D: usize>(
        self,
        cover: &Aabb<T, D>,
        query: &Aabb<T, D>,
    ) -> bool {
        match self {
            Self::Intersecting | Self::ContainedBy => cover.overlaps(query),
            Self::Containing => cover.contains(query),
        }
    }
}

impl<T: Scalar, P, const D: usize, C: RTreeParams> RTree<T, P, D, C> {
    /// Visit every entry matching `query` under `mode`.
    ///
    /// The visitor receives the entry's rectangle first and its payload second,
    /// the same order as the items of [`RTree::query`]. Returning `false` stops
    /// the traversal immediately. Returns the number of entries visited,
    /// including the one that stopped it.
    ///
    /// ```
    /// use understory_rtree::{Aabb2D, RTree, SearchMode};
    ///
    /// let mut tree: RTree<i64, char> = RTree::new();
    /// tree.insert(Aabb2D::new(0, 0, 4, 4), 'a');
    /// tree.insert(Aabb2D::new(2, 2, 6, 6), 'b');
    ///
    /// let mut seen = Vec::new();
    /// let visited = tree.search(&Aabb2D::new(3, 3, 3, 3), SearchMode::Intersecting, |rect, payload| {
    ///     seen.push((*payload, rect.max[0]));
    ///     true
    /// });
    /// assert_eq!(visited, 2);
    /// seen.sort_unstable();
    /// assert_eq!(seen, [('a', 4), ('b', 6)]);
    /// ```
    pub fn search<F>(&self, query: &Aabb<T, D>, mode: SearchMode, mut visit: F) -> usize
    where
        F: FnMut(&Aabb<T, D>, &P) -> bool,
    {
        let mut visited = 0;
        self.search_node(self.root, query, mode, &mut visit, &mut visited);
        visited
    }

    /// Returns `false` once the visitor has asked to stop.
    fn search_node<F>(
        &self,
        idx: NodeIdx,
        query: &Aabb<T, D>,
        mode: SearchMode,
        visit: &mut F,
        visited: &mut usize,
    ) -> bool
    where
        F: FnMut(&Aabb<T, D>, &P) -> bool,
    {
        match self.arena.get(idx) {
            Node::Leaf { entries } => {
                for e in entries.iter().filter(|e| mode.matches(&e.rect, query)) {
                    *visited += 1;
                    if !visit(&e.rect, &e.payload) {
                        return false;
                    }
                }
                true
            }
            Node::Internal { children, .. } => children
                .iter()
                .filter(|c| mode.descend(&c.rect, query))
                .all(|c| self.search_node(c.node, query, mode, visit, visited)),
        }
    }

    /// Lazily iterate entries matching `query` under `mode`.
    pub fn query(&self, query: Aabb<T, D>, mode: SearchMode) -> SearchIter<'_, T, P, D> {
        SearchIter::new(&self.arena, self.root, Some((query, mode)))
    }

    /// Lazily iterate entries whose rectangle contains `point`.
    pub fn query_point(&self, point: [T; D]) -> SearchIter<'_, T, P, D> {
        self.query(Aabb::from_point(point), SearchMode::Containing)
    }

    /// Iterate every entry in the tree.
    pub fn iter(&self) -> SearchIter<'_, T, P, D> {
        SearchIter::new(&self.arena, self.root, None)
    }

    /// The first entry matching `query` under `mode`, in traversal order.
    pub fn first(&self, query: &Aabb<T, D>, mode: SearchMode) -> Option<(&Aabb<T, D>, &P)> {
        self.query(*query, mode).next()
    }

    /// Whether an entry with exactly this rectangle and payload is stored.
    pub fn contains(&self, rect: &Aabb<T, D>, payload: &P) -> bool
    where
        P: PartialEq,
    {
        self.query(*rect, SearchMode::Containing)
            .any(|(r, p)| r == rect && p == payload)
    }
}

impl<'a, T: Scalar, P, const D: usize, C: RTreeParams> IntoIterator for &'a RTree<T, P, D, C> {
    type Item = (&'a Aabb<T, D>, &'a P);
    type IntoIter = SearchIter<'a, T, P, D>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Copy, Clone, Debug)]
struct Frame {
    node: NodeIdx,
    /// Next branch slot to examine.
    next: usize,
}

/// Lazy, restartable traversal over an [`RTree`].
///
/// Returned by [`RTree::query`], [`RTree::query_point`], and [`RTree::iter`].
/// The tree stays borrowed for the iterator's lifetime.
pub struct SearchIter<'a, T, P, const D: usize> {
    arena: &'a Arena<T, P, D>,
    root: NodeIdx,
    /// `None` yields every entry.
    filter: Option<(Aabb<T, D>, SearchMode)>,
    stack: SmallVec<[Frame; 8]>,
}

impl<'a, T: Scalar, P, const D: usize> SearchIter<'a, T, P, D> {
    fn new(
        arena: &'a Arena<T, P, D>,
        root: NodeIdx,
        filter: Option<(Aabb<T, D>, SearchMode)>,
    ) -> Self {
        let mut iter = Self {
            arena,
            root,
            filter,
            stack: SmallVec::new(),
        };
        iter.restart();
        iter
    }

    /// Rewind to the beginning of the traversal.
    pub fn restart(&mut self) {
        self.stack.clear();
        self.stack.push(Frame {
            node: self.root,
            next: 0,
        });
    }
}

impl<'a, T: Scalar, P, const D: usize> Iterator for SearchIter<'a, T, P, D> {
    type Item = (&'a Aabb<T, D>, &'a P);

    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        let filter = self.filter;
        loop {
            let frame = self.stack.last_mut()?;
            match arena.get(frame.node) {
                Node::Leaf { entries } => {
                    while let Some(e) = entries.get(frame.next) {
                        frame.next += 1;
                        if filter.map(|(q, mode)| mode.matches(&e.rect, &q)).unwrap_or(true) {
                            return Some((&e.rect, &e.payload));
                        }
                    }
                    self.stack.pop();
                }
                Node::Internal { children, .. } => {
                    let mut down = None;
                    while let Some(c) = children.get(frame.next) {
                        frame.next += 1;
                        if filter.map(|(q, mode)| mode.descend(&c.rect, &q)).unwrap_or(true) {
                            down = Some(c.node);
                            break;
                        }
                    }
                    match down {
                        Some(node) => self.stack.push(Frame { node, next: 0 }),
                        None => {
                            self.stack.pop();
                        }
                    }
                }
            }
        }
    }
}

impl<T: Scalar, P, const D: usize> FusedIterator for SearchIter<'_, T, P, D> {}

impl<T: Scalar, P, const D: usize> Clone for SearchIter<'_, T, P, D> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena,
            root: self.root,
            filter: self.filter,
            stack: self.stack.clone(),
        }
    }
}

impl<T: Scalar, P, const D: usize> Debug for SearchIter<'_, T, P, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SearchIter")
            .field("filter", &self.filter)
            .field("depth", &self.stack.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Aabb2D;
    use alloc::vec::Vec;

    struct Small;

    impl RTreeParams for Small {
        const MAX_LEAF_ENTRIES: usize = 4;
        const MAX_INTERNAL_ENTRIES: usize = 4;
        const MIN_FILL_PERCENT: usize = 50;
    }

    fn nested() -> RTree<i64, u32, 2, Small> {
        let mut tree = RTree::new();
        tree.insert(Aabb2D::new(0, 0, 100, 100), 0);
        tree.insert(Aabb2D::new(10, 10, 20, 20), 1);
        tree.insert(Aabb2D::new(15, 15, 30, 30), 2);
        tree.insert(Aabb2D::new(50, 50, 60, 60), 3);
        tree.insert(Aabb2D::new(90, 90, 95, 95), 4);
        tree.insert(Aabb2D::new(200, 200, 210, 210), 5);
        tree
    }

    fn hits(tree: &RTree<i64, u32, 2, Small>, query: Aabb2D<i64>, mode: SearchMode) -> Vec<u32> {
        let mut out: Vec<_> = tree.query(query, mode).map(|(_, p)| *p).collect();
        out.sort_unstable();
        out
    }

    #[test]
    fn predicates_select_expected_entries() {
        let tree = nested();
        let q = Aabb2D::new(12, 12, 55, 55);
        assert_eq!(hits(&tree, q, SearchMode::Intersecting), [0, 1, 2, 3]);
        assert_eq!(hits(&tree, q, SearchMode::ContainedBy), [2]);
        assert_eq!(hits(&tree, q, SearchMode::Containing), [0]);

        let inner = Aabb2D::new(16, 16, 18, 18);
        assert_eq!(hits(&tree, inner, SearchMode::Containing), [0, 1, 2]);
        // Shared edges count as overlap.
        assert_eq!(
            hits(&tree, Aabb2D::new(210, 210, 300, 300), SearchMode::Intersecting),
            [5]
        );
        assert!(hits(&tree, Aabb2D::new(101, 101, 199, 199), SearchMode::Intersecting).is_empty());
    }

    #[test]
    fn visitor_stops_when_asked() {
        let tree = nested();
        let everything = Aabb2D::new(-1000, -1000, 1000, 1000);
        let mut seen = Vec::new();
        let visited = tree.search(&everything, SearchMode::Intersecting, |_, p| {
            seen.push(*p);
            false
        });
        assert_eq!(visited, 1);
        assert_eq!(seen.len(), 1);

        let mut count = 0;
        let visited = tree.search(&everything, SearchMode::Intersecting, |_, _| {
            count += 1;
            count < 3
        });
        assert_eq!(visited, 3);
        assert_eq!(
            tree.search(&everything, SearchMode::Intersecting, |_, _| true),
            6
        );
    }

    #[test]
    fn iterator_matches_visitor_order() {
        let tree = nested();
        for mode in [
            SearchMode::Intersecting,
            SearchMode::ContainedBy,
            SearchMode::Containing,
        ] {
            let q = Aabb2D::new(5, 5, 92, 92);
            let mut via_visitor = Vec::new();
            tree.search(&q, mode, |r, p| {
                via_visitor.push((*r, *p));
                true
            });
            let via_iter: Vec<_> = tree.query(q, mode).map(|(r, p)| (*r, *p)).collect();
            assert_eq!(via_iter, via_visitor, "{mode:?}");
        }
    }

    #[test]
    fn iterator_restarts_and_clones() {
        let tree = nested();
        let mut it = tree.iter();
        let first: Vec<_> = it.by_ref().take(2).map(|(_, p)| *p).collect();
        let fork = it.clone();
        let rest: Vec<_> = it.by_ref().map(|(_, p)| *p).collect();
        assert_eq!(first.len() + rest.len(), 6);
        assert_eq!(fork.map(|(_, p)| *p).collect::<Vec<_>>(), rest);
        assert!(it.next().is_none());

        it.restart();
        let again: Vec<_> = it.map(|(_, p)| *p).collect();
        let mut all = first.clone();
        all.extend(rest);
        assert_eq!(again, all);
    }

    #[test]
    fn point_first_and_contains() {
        let tree = nested();
        let mut at: Vec<_> = tree.query_point([17, 17]).map(|(_, p)| *p).collect();
        at.sort_unstable();
        assert_eq!(at, [0, 1, 2]);

        let far = Aabb2D::new(205, 205, 206, 206);
        assert_eq!(
            tree.first(&far, SearchMode::Intersecting).map(|(_, p)| *p),
            Some(5)
        );
        assert!(tree.first(&Aabb2D::new(300, 300, 301, 301), SearchMode::Intersecting).is_none());

        assert!(tree.contains(&Aabb2D::new(50, 50, 60, 60), &3));
        assert!(!tree.contains(&Aabb2D::new(50, 50, 60, 60), &4));
        assert!(!tree.contains(&Aabb2D::new(50, 50, 61, 60), &3));
    }

    #[test]
    fn empty_tree_yields_nothing() {
        let tree: RTree<f64, u32> = RTree::new();
        assert_eq!(tree.iter().count(), 0);
        assert_eq!(
            tree.search(&Aabb2D::new(0.0, 0.0, 1.0, 1.0), SearchMode::Containing, |_, _| true),
            0
        );
        assert!((&tree).into_iter().next().is_none());
    }
}
