// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory R-tree: a mutable N-dimensional R-tree over axis-aligned boxes.
//!
//! Understory R-tree maps rectangles to payloads and answers range queries with
//! sub-linear traversal cost.
//!
//! - Insert `(rect, payload)` pairs; overflowing nodes split with Guttman's
//!   quadratic (default) or linear heuristic.
//! - Remove exact `(rect, payload)` pairs; underflowing nodes are condensed and
//!   their contents reinserted at their original level.
//! - Search by [`SearchMode`]: intersecting, contained-by, or containing the
//!   query, either through an early-exit visitor ([`RTree::search`]) or a lazy,
//!   restartable iterator ([`RTree::query`]).
//!
//! It is generic over the scalar type `T`, the payload `P`, the dimension count `D`,
//! and a compile-time [`RTreeParams`] describing node fanout, minimum fill, and
//! the split heuristic. Volume metrics use widened accumulator types
//! (f32→f64, i32→i64, i64→i128).
//!
//! # Example
//!
//! ```rust
//! use understory_rtree::{Aabb2D, RTree, SearchMode};
//!
//! let mut tree: RTree<i64, &str> = RTree::new();
//! tree.insert(Aabb2D::new(0, 0, 10, 10), "a");
//! tree.insert(Aabb2D::new(5, 5, 15, 15), "b");
//! tree.insert(Aabb2D::new(40, 40, 50, 50), "c");
//!
//! // Visitor form: stop after the first hit.
//! let mut first = None;
//! tree.search(&Aabb2D::new(6, 6, 7, 7), SearchMode::Intersecting, |_, p| {
//!     first = Some(*p);
//!     false
//! });
//! assert!(first.is_some());
//!
//! // Iterator form.
//! let mut inside: Vec<_> = tree
//!     .query(Aabb2D::new(0, 0, 20, 20), SearchMode::ContainedBy)
//!     .map(|(_, p)| *p)
//!     .collect();
//! inside.sort_unstable();
//! assert_eq!(inside, ["a", "b"]);
//!
//! assert!(tree.remove(&Aabb2D::new(40, 40, 50, 50), &"c"));
//! assert_eq!(tree.bounds(), Some(Aabb2D::new(0, 0, 15, 15)));
//! ```
//!
//! Other dimensions and node shapes are type parameters:
//!
//! ```rust
//! use understory_rtree::{Aabb, RTree, SearchMode};
//!
//! let mut cubes: RTree<f32, u32, 3> = RTree::new();
//! cubes.insert(Aabb::from_corners([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]), 1);
//! cubes.insert(Aabb::from_corners([2.0, 2.0, 2.0], [3.0, 3.0, 3.0]), 2);
//!
//! let hits: Vec<_> = cubes.query_point([0.5, 0.5, 0.5]).map(|(_, p)| *p).collect();
//! assert_eq!(hits, [1]);
//! ```
//!
//! ## Empty trees
//!
//! [`RTree::bounds`] is `None` for an empty tree. [`RTree::clear`] returns any
//! tree to that state, freeing every node except a fresh root leaf.
//!
//! ## Logging
//!
//! Structural changes are reported through the [`log`] facade: root growth,
//! root collapse, and clears at `debug`, node splits and reinsertion at `trace`.
//!
//! ## Coordinates
//!
//! Integer volumes are computed in the widened accumulator and saturate at its
//! maximum, so boxes spanning the whole coordinate range are accepted in any
//! dimension; only the split and subtree-choice heuristics see the clamped value.
//!
//! ### Float semantics
//!
//! This crate assumes no NaNs for floating-point coordinates. Debug builds
//! assert that inserted rectangles have `min <= max` on every axis.

#![no_std]

extern crate alloc;

mod error;
mod insert;
mod node;
mod params;
mod remove;
mod search;
mod split;
mod tree;
mod types;

pub use error::{ConfigError, NodeRole};
pub use params::{DefaultParams, RTreeParams, SplitStrategy};
pub use search::{SearchIter, SearchMode};
pub use tree::{RTree, RTreeF32, RTreeF64, RTreeI64};
pub use types::{Aabb, Aabb2D, Scalar, ScalarAcc};
