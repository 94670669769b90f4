// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deletion: exact-match removal, underflow condensation, and root shrinking.

use alloc::vec::Vec;
use core::cmp::Reverse;

use crate::node::{Branch, Node, NodeIdx};
use crate::params::RTreeParams;
use crate::search::SearchMode;
use crate::tree::RTree;
use crate::types::{Aabb, Scalar};

/// A branch detached from an underflowing node, with the level it must rejoin at.
type Orphan<T, P, const D: usize> = (usize, Branch<T, P, D>);

impl<T: Scalar, P, const D: usize, C: RTreeParams> RTree<T, P, D, C> {
    /// Remove one entry whose rectangle equals `rect` and whose payload equals `payload`.
    ///
    /// Returns `false`, leaving the tree untouched, if no such entry exists.
    /// When duplicates are stored, exactly one of them is removed.
    pub fn remove(&mut self, rect: &Aabb<T, D>, payload: &P) -> bool
    where
        P: PartialEq,
    {
        let mut orphans = Vec::new();
        if !self.remove_from(self.root, rect, payload, &mut orphans) {
            return false;
        }
        self.len -= 1;
        self.reinsert(orphans);
        self.shrink_root();
        true
    }

    /// Remove every entry matching `query` under `mode`, returning what was removed.
    pub fn remove_matching(&mut self, query: &Aabb<T, D>, mode: SearchMode) -> Vec<(Aabb<T, D>, P)>
    where
        P: Clone + PartialEq,
    {
        let doomed: Vec<_> = self
            .query(*query, mode)
            .map(|(rect, payload)| (*rect, payload.clone()))
            .collect();
        for (rect, payload) in &doomed {
            let removed = self.remove(rect, payload);
            debug_assert!(removed, "matched entry vanished before removal");
        }
        doomed
    }

    /// Returns whether the entry was found below `idx`.
    ///
    /// Children that drop below the minimum fill are detached and freed, and
    /// their branches are pushed onto `orphans`.
    fn remove_from(
        &mut self,
        idx: NodeIdx,
        rect: &Aabb<T, D>,
        payload: &P,
        orphans: &mut Vec<Orphan<T, P, D>>,
    ) -> bool
    where
        P: PartialEq,
    {
        if let Node::Leaf { entries } = self.arena.get_mut(idx) {
            return match entries
                .iter()
                .position(|e| e.rect == *rect && e.payload == *payload)
            {
                Some(i) => {
                    entries.remove(i);
                    true
                }
                None => false,
            };
        }

        let mut slot = 0;
        let (child, child_level, child_len) = loop {
            let Some(branch) = self.arena.get(idx).children().get(slot) else {
                return false;
            };
            // An exact match can only live below a branch that contains it.
            if branch.rect.contains(rect) {
                let child = branch.node;
                if self.remove_from(child, rect, payload, orphans) {
                    let node = self.arena.get(child);
                    break (child, node.level(), node.len());
                }
            }
            slot += 1;
        };

        if child_len < Self::min_fill(child_level) {
            self.arena.get_mut(idx).children_mut().remove(slot);
            let before = orphans.len();
            match self.arena.free(child) {
                Node::Leaf { entries } => {
                    orphans.extend(entries.into_iter().map(|e| (0, Branch::Entry(e))));
                }
                Node::Internal { level, children } => {
                    orphans.extend(children.into_iter().map(|c| (level, Branch::Child(c))));
                }
            }
            log::trace!(
                "condensed underflowing node at level {child_level}: {} branches pending",
                orphans.len() - before
            );
        } else {
            let cover = self
                .arena
                .get(child)
                .cover()
                .expect("R-tree invariant violated: non-empty node has no cover");
            self.arena.get_mut(idx).children_mut()[slot].rect = cover;
        }
        true
    }

    /// Put orphaned branches back, highest subtrees first.
    fn reinsert(&mut self, mut orphans: Vec<Orphan<T, P, D>>) {
        if orphans.is_empty() {
            return;
        }
        orphans.sort_by_key(|(level, _)| Reverse(*level));
        log::trace!("reinserting {} orphaned branches", orphans.len());
        for (level, branch) in orphans {
            self.insert_branch(branch, level);
        }
    }

    /// Collapse internal roots with a single child.
    fn shrink_root(&mut self) {
        loop {
            let only = match self.arena.get(self.root) {
                Node::Internal { children, .. } if children.len() == 1 => children[0].node,
                Node::Internal { children, .. } => {
                    debug_assert!(!children.is_empty(), "internal root has no children");
                    return;
                }
                Node::Leaf { .. } => return,
            };
            self.arena.free(self.root);
            self.root = only;
            log::debug!("R-tree root collapsed; height is now {}", self.height());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Aabb2D;

    struct Small;

    impl RTreeParams for Small {
        const MAX_LEAF_ENTRIES: usize = 4;
        const MAX_INTERNAL_ENTRIES: usize = 4;
        const MIN_FILL_PERCENT: usize = 50;
    }

    fn unit(x: i64, y: i64) -> Aabb2D<i64> {
        Aabb2D::new(x, y, x + 1, y + 1)
    }

    fn grid(n: i64) -> impl Iterator<Item = (Aabb2D<i64>, i64)> {
        (0..n).map(move |i| (unit((i % 10) * 3, (i / 10) * 3), i))
    }

    #[test]
    fn missing_entries_are_not_found() {
        let mut tree: RTree<i64, i64, 2, Small> = RTree::new();
        assert!(!tree.remove(&unit(0, 0), &0));

        tree.extend(grid(20));
        assert!(!tree.remove(&unit(0, 0), &99), "payload mismatch");
        assert!(!tree.remove(&Aabb2D::new(0, 0, 2, 2), &0), "rect mismatch");
        assert!(!tree.remove(&unit(500, 500), &0), "outside the tree");
        assert_eq!(tree.len(), 20);
        tree.assert_invariants();
    }

    #[test]
    fn removes_exact_pair_only() {
        let mut tree: RTree<f64, &str> = RTree::new();
        let r = Aabb2D::new(0.0, 0.0, 1.0, 1.0);
        tree.insert(r, "a");
        tree.insert(r, "b");
        tree.insert(r, "a");

        assert!(tree.remove(&r, &"a"));
        assert_eq!(tree.len(), 2);
        let mut left: Vec<_> = tree.iter().map(|(_, p)| *p).collect();
        left.sort_unstable();
        assert_eq!(left, ["a", "b"]);

        assert!(tree.remove(&r, &"a"));
        assert!(!tree.remove(&r, &"a"));
        assert!(tree.remove(&r, &"b"));
        assert!(tree.is_empty());
        assert_eq!(tree.bounds(), None);
    }

    #[test]
    fn root_collapses_back_to_leaf() {
        let mut tree: RTree<i64, i64, 2, Small> = RTree::new();
        tree.extend(grid(5));
        assert_eq!(tree.height(), 2);

        for (rect, payload) in grid(4) {
            assert!(tree.remove(&rect, &payload));
            tree.assert_invariants();
        }
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.height(), 1);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.bounds(), Some(unit(12, 0)));
    }

    #[test]
    fn underflow_reinserts_subtrees_at_their_level() {
        let mut tree: RTree<i64, i64, 2, Small> = RTree::new();
        tree.extend(grid(100));
        assert!(tree.height() >= 4);
        tree.assert_invariants();

        // Remove in an order that repeatedly empties whole regions.
        for (rect, payload) in grid(100).filter(|(_, i)| i % 10 < 7) {
            assert!(tree.remove(&rect, &payload), "missing {payload}");
            tree.assert_invariants();
        }
        assert_eq!(tree.len(), 30);
        let mut left: Vec<_> = tree.iter().map(|(_, p)| *p).collect();
        left.sort_unstable();
        let expected: Vec<_> = (0..100).filter(|i| i % 10 >= 7).collect();
        assert_eq!(left, expected);
        assert_eq!(tree.bounds(), Some(Aabb2D::new(21, 0, 28, 28)));
    }

    #[test]
    fn remove_matching_drains_region() {
        let mut tree: RTree<i64, i64, 2, Small> = RTree::new();
        tree.extend(grid(50));
        // Left two columns: x in {0, 3}.
        let mut removed: Vec<_> = tree
            .remove_matching(&Aabb2D::new(0, 0, 4, 100), SearchMode::ContainedBy)
            .into_iter()
            .map(|(_, p)| p)
            .collect();
        removed.sort_unstable();
        let expected: Vec<_> = (0..50).filter(|i| i % 10 < 2).collect();
        assert_eq!(removed, expected);
        assert_eq!(tree.len(), 40);
        tree.assert_invariants();

        assert!(
            tree.remove_matching(&Aabb2D::new(0, 0, 4, 100), SearchMode::ContainedBy)
                .is_empty()
        );
    }
}
