// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Insertion: subtree choice, overflow splits, and root growth.

use alloc::vec::Vec;
use core::mem;

use crate::node::{Branch, Child, Entry, Node, NodeIdx};
use crate::params::RTreeParams;
use crate::split::split;
use crate::tree::RTree;
use crate::types::{Aabb, Scalar};

impl<T: Scalar, P, const D: usize, C: RTreeParams> RTree<T, P, D, C> {
    /// Insert a rectangle with its payload.
    ///
    /// Always succeeds. Duplicate `(rect, payload)` pairs are kept as distinct entries.
    /// The rectangle must satisfy `min <= max` on every axis.
    pub fn insert(&mut self, rect: Aabb<T, D>, payload: P) {
        debug_assert!(rect.is_valid(), "inserted rectangle has min > max on some axis");
        self.insert_branch(Branch::Entry(Entry { rect, payload }), 0);
        self.len += 1;
    }

    /// Place a branch into a node at `level`, splitting and growing the root as needed.
    ///
    /// Level 0 places a leaf entry; higher levels reattach whole subtrees.
    pub(crate) fn insert_branch(&mut self, branch: Branch<T, P, D>, level: usize) {
        debug_assert!(
            level <= self.arena.get(self.root).level(),
            "branch level above the root"
        );
        if let Some(sibling) = self.insert_into(self.root, branch, level) {
            self.grow_root(sibling);
        }
    }

    /// Returns the new sibling if `idx` split.
    fn insert_into(
        &mut self,
        idx: NodeIdx,
        branch: Branch<T, P, D>,
        level: usize,
    ) -> Option<Child<T, D>> {
        if self.arena.get(idx).level() == level {
            return self.add_branch(idx, branch);
        }

        let rect = branch.rect();
        let slot = choose_subtree(self.arena.get(idx).children(), &rect);
        let child = self.arena.get(idx).children()[slot].node;
        let split = self.insert_into(child, branch, level);

        let child_rect = if split.is_some() {
            self.arena
                .get(child)
                .cover()
                .expect("R-tree invariant violated: split left an empty node")
        } else {
            self.arena.get(idx).children()[slot].rect.union(&rect)
        };
        self.arena.get_mut(idx).children_mut()[slot].rect = child_rect;

        split.and_then(|sibling| self.add_branch(idx, Branch::Child(sibling)))
    }

    /// Append a branch to `idx`. If that overflows the node, split it and
    /// return the branch for the new sibling.
    fn add_branch(&mut self, idx: NodeIdx, branch: Branch<T, P, D>) -> Option<Child<T, D>> {
        let sibling = match (self.arena.get_mut(idx), branch) {
            (Node::Leaf { entries }, Branch::Entry(entry)) => {
                entries.push(entry);
                if entries.len() <= C::MAX_LEAF_ENTRIES {
                    return None;
                }
                let (keep, moved) = split::<T, D, _>(
                    C::SPLIT,
                    mem::take(entries),
                    C::MIN_LEAF_ENTRIES,
                );
                log::trace!("split leaf: {} kept, {} moved", keep.len(), moved.len());
                *entries = keep;
                Node::Leaf { entries: moved }
            }
            (Node::Internal { level, children }, Branch::Child(child)) => {
                children.push(child);
                if children.len() <= C::MAX_INTERNAL_ENTRIES {
                    return None;
                }
                let level = *level;
                let (keep, moved) = split::<T, D, _>(
                    C::SPLIT,
                    mem::take(children),
                    C::MIN_INTERNAL_ENTRIES,
                );
                log::trace!(
                    "split internal node at level {level}: {} kept, {} moved",
                    keep.len(),
                    moved.len()
                );
                *children = keep;
                Node::Internal {
                    level,
                    children: moved,
                }
            }
            _ => unreachable!("R-tree invariant violated: branch kind does not match node level"),
        };
        let rect = sibling
            .cover()
            .expect("R-tree invariant violated: split produced an empty sibling");
        Some(Child {
            rect,
            node: self.arena.alloc(sibling),
        })
    }

    /// Replace the root with a new internal node over the old root and its split sibling.
    fn grow_root(&mut self, sibling: Child<T, D>) {
        let old = self.arena.get(self.root);
        let level = old.level() + 1;
        let rect = old
            .cover()
            .expect("R-tree invariant violated: split left an empty root");
        let mut children = Vec::with_capacity(C::MAX_INTERNAL_ENTRIES + 1);
        children.push(Child {
            rect,
            node: self.root,
        });
        children.push(sibling);
        self.root = self.arena.alloc(Node::Internal { level, children });
        log::debug!("R-tree root split; height is now {}", level + 1);
    }
}

/// Slot of the child needing the least enlargement to cover `rect`.
///
/// Ties go to the smaller resulting volume, then to the lowest slot.
fn choose_subtree<T: Scalar, const D: usize>(children: &[Child<T, D>], rect: &Aabb<T, D>) -> usize {
    let mut best = 0;
    let mut best_cost: Option<(T::Acc, T::Acc)> = None;
    for (i, child) in children.iter().enumerate() {
        let grown = child.rect.union(rect).volume();
        let cost = (grown - child.rect.volume(), grown);
        let better = best_cost
            .map(|(be, bv)| cost.0 < be || (cost.0 == be && cost.1 < bv))
            .unwrap_or(true);
        if better {
            best_cost = Some(cost);
            best = i;
        }
    }
    best
}
