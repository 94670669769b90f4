// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node store: an index-addressed arena of leaf and internal nodes.

use alloc::vec::Vec;

use crate::types::Aabb;

/// Index of a node inside the [`Arena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeIdx(usize);

impl NodeIdx {
    const fn get(self) -> usize {
        self.0
    }
}

/// Leaf branch: a payload and its rectangle.
#[derive(Clone, Debug)]
pub(crate) struct Entry<T, P, const D: usize> {
    pub(crate) rect: Aabb<T, D>,
    pub(crate) payload: P,
}

/// Internal branch: a subtree and the cover of everything below it.
#[derive(Clone, Debug)]
pub(crate) struct Child<T, const D: usize> {
    pub(crate) rect: Aabb<T, D>,
    pub(crate) node: NodeIdx,
}

/// Anything stored in a node slot that carries a bounding rectangle.
pub(crate) trait Bounded<T, const D: usize> {
    fn rect(&self) -> &Aabb<T, D>;
}

impl<T, P, const D: usize> Bounded<T, D> for Entry<T, P, D> {
    #[inline]
    fn rect(&self) -> &Aabb<T, D> {
        &self.rect
    }
}

impl<T, const D: usize> Bounded<T, D> for Child<T, D> {
    #[inline]
    fn rect(&self) -> &Aabb<T, D> {
        &self.rect
    }
}

/// A branch on its way into a node at a particular level.
#[derive(Clone, Debug)]
pub(crate) enum Branch<T, P, const D: usize> {
    Entry(Entry<T, P, D>),
    Child(Child<T, D>),
}

impl<T: Copy, P, const D: usize> Branch<T, P, D> {
    pub(crate) fn rect(&self) -> Aabb<T, D> {
        match self {
            Self::Entry(e) => e.rect,
            Self::Child(c) => c.rect,
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Node<T, P, const D: usize> {
    Leaf {
        entries: Vec<Entry<T, P, D>>,
    },
    Internal {
        /// Height of this subtree; always at least 1.
        level: usize,
        children: Vec<Child<T, D>>,
    },
}

impl<T: Copy + PartialOrd, P, const D: usize> Node<T, P, D> {
    pub(crate) fn empty_leaf(capacity: usize) -> Self {
        // One spare slot: a node briefly holds `capacity + 1` branches before it splits.
        Self::Leaf {
            entries: Vec::with_capacity(capacity + 1),
        }
    }

    pub(crate) fn level(&self) -> usize {
        match self {
            Self::Leaf { .. } => 0,
            Self::Internal { level, .. } => *level,
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Leaf { entries } => entries.len(),
            Self::Internal { children, .. } => children.len(),
        }
    }

    /// Union of the live branch rectangles, or `None` for an empty node.
    pub(crate) fn cover(&self) -> Option<Aabb<T, D>> {
        match self {
            Self::Leaf { entries } => cover_of(entries),
            Self::Internal { children, .. } => cover_of(children),
        }
    }

    pub(crate) fn children(&self) -> &[Child<T, D>] {
        match self {
            Self::Internal { children, .. } => children,
            Self::Leaf { .. } => unreachable!("R-tree invariant violated: leaf used as internal node"),
        }
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Child<T, D>> {
        match self {
            Self::Internal { children, .. } => children,
            Self::Leaf { .. } => unreachable!("R-tree invariant violated: leaf used as internal node"),
        }
    }
}

/// Smallest box covering every item, or `None` if there are none.
pub(crate) fn cover_of<T, const D: usize, B>(items: &[B]) -> Option<Aabb<T, D>>
where
    T: Copy + PartialOrd,
    B: Bounded<T, D>,
{
    let (first, rest) = items.split_first()?;
    Some(rest.iter().fold(*first.rect(), |acc, b| acc.union(b.rect())))
}

/// Slot storage for nodes. Vacated slots are recycled through a free list.
#[derive(Clone, Debug)]
pub(crate) struct Arena<T, P, const D: usize> {
    slots: Vec<Option<Node<T, P, D>>>,
    free_list: Vec<usize>,
}

impl<T, P, const D: usize> Arena<T, P, D> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    pub(crate) fn alloc(&mut self, node: Node<T, P, D>) -> NodeIdx {
        if let Some(i) = self.free_list.pop() {
            debug_assert!(self.slots[i].is_none(), "free list holds a live slot");
            self.slots[i] = Some(node);
            NodeIdx(i)
        } else {
            self.slots.push(Some(node));
            NodeIdx(self.slots.len() - 1)
        }
    }

    /// Detach a node from the arena, handing its contents back to the caller.
    pub(crate) fn free(&mut self, idx: NodeIdx) -> Node<T, P, D> {
        let node = self
            .slots
            .get_mut(idx.get())
            .and_then(Option::take)
            .expect("node arena invariant violated: freeing a vacant slot");
        self.free_list.push(idx.get());
        node
    }

    pub(crate) fn get(&self, idx: NodeIdx) -> &Node<T, P, D> {
        self.slots
            .get(idx.get())
            .and_then(Option::as_ref)
            .expect("node arena invariant violated: dangling node index")
    }

    pub(crate) fn get_mut(&mut self, idx: NodeIdx) -> &mut Node<T, P, D> {
        self.slots
            .get_mut(idx.get())
            .and_then(Option::as_mut)
            .expect("node arena invariant violated: dangling node index")
    }

    /// Number of nodes currently allocated.
    pub(crate) fn live(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    /// Drop every node at once.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Aabb2D;
    use alloc::vec;

    fn leaf(rects: &[Aabb2D<i64>]) -> Node<i64, usize, 2> {
        Node::Leaf {
            entries: rects
                .iter()
                .enumerate()
                .map(|(i, &rect)| Entry {
                    rect,
                    payload: i,
                })
                .collect(),
        }
    }

    #[test]
    fn arena_recycles_freed_slots() {
        let mut arena: Arena<i64, usize, 2> = Arena::new();
        let a = arena.alloc(Node::empty_leaf(4));
        let b = arena.alloc(Node::empty_leaf(4));
        assert_eq!(arena.live(), 2);

        let freed = arena.free(a);
        assert_eq!(freed.len(), 0);
        assert_eq!(arena.live(), 1);

        let c = arena.alloc(Node::empty_leaf(4));
        assert_eq!(c, a, "vacated slot should be reused");
        assert_ne!(c, b);
        assert_eq!(arena.live(), 2);

        arena.clear();
        assert_eq!(arena.live(), 0);
    }

    #[test]
    fn node_cover_tracks_branches() {
        let empty = leaf(&[]);
        assert_eq!(empty.cover(), None);
        assert_eq!(empty.level(), 0);

        let n = leaf(&[Aabb2D::new(0, 0, 1, 1), Aabb2D::new(5, -2, 6, 0)]);
        assert_eq!(n.len(), 2);
        assert_eq!(n.cover(), Some(Aabb2D::new(0, -2, 6, 1)));
    }

    #[test]
    fn internal_node_exposes_children() {
        let mut arena: Arena<i64, usize, 2> = Arena::new();
        let child = arena.alloc(leaf(&[Aabb2D::new(1, 1, 2, 2)]));
        let mut parent: Node<i64, usize, 2> = Node::Internal {
            level: 1,
            children: vec![Child {
                rect: Aabb2D::new(1, 1, 2, 2),
                node: child,
            }],
        };
        assert_eq!(parent.level(), 1);
        assert_eq!(parent.children()[0].node, child);
        parent.children_mut().clear();
        assert_eq!(parent.cover(), None);
    }
}
