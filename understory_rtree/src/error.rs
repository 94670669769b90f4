// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Construction-time configuration errors.

use core::fmt;

use thiserror::Error;

/// Which kind of node a structural limit applies to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// Nodes at level 0, holding payload entries.
    Leaf,
    /// Nodes above level 0, holding child subtrees.
    Internal,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf => f.write_str("leaf"),
            Self::Internal => f.write_str("internal"),
        }
    }
}

/// Rejected combinations of [`RTreeParams`][crate::RTreeParams] and dimensionality.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The tree was instantiated with `D == 0`.
    #[error("an R-tree needs at least one dimension")]
    ZeroDimensions,

    /// A fanout too small to ever split into two non-empty nodes.
    #[error("{role} capacity {capacity} is below the minimum of 2")]
    CapacityTooSmall {
        /// Node kind the capacity belongs to.
        role: NodeRole,
        /// The configured capacity.
        capacity: usize,
    },

    /// A minimum fill of zero would let empty nodes survive deletes.
    #[error("{role} minimum fill must be at least 1")]
    ZeroMinimumFill {
        /// Node kind the minimum belongs to.
        role: NodeRole,
    },

    /// A minimum fill that an overflowing node cannot satisfy on both halves of a split.
    #[error("{role} minimum fill {min} exceeds half of capacity {capacity}")]
    MinimumFillTooLarge {
        /// Node kind the minimum belongs to.
        role: NodeRole,
        /// The configured minimum fill.
        min: usize,
        /// The configured capacity.
        capacity: usize,
    },
}
