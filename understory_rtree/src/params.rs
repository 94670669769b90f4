// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compile-time structural parameters.
//!
//! Fanouts and fill factors are associated constants rather than runtime
//! options: every tree type is monomorphized for one node shape.

use crate::error::{ConfigError, NodeRole};

/// How an overflowing node's branches are divided between it and its new sibling.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SplitStrategy {
    /// Guttman's quadratic split.
    ///
    /// Seeds are the pair of branches whose covering box wastes the most volume.
    /// Remaining branches are assigned greatest-preference first to the group
    /// needing the least enlargement.
    #[default]
    Quadratic,
    /// Guttman's linear split.
    ///
    /// Seeds are the pair with the greatest normalized separation along any axis.
    /// Remaining branches are assigned in slot order to the group needing the
    /// least enlargement.
    Linear,
}

/// Structural parameters of an [`RTree`][crate::RTree].
///
/// Both halves of a split must be able to meet the minimum fill, so each
/// minimum may be at most half of its capacity.
///
/// ```rust
/// use understory_rtree::{Aabb2D, RTree, RTreeParams, SplitStrategy};
///
/// struct Wide;
///
/// impl RTreeParams for Wide {
///     const MAX_LEAF_ENTRIES: usize = 32;
///     const MAX_INTERNAL_ENTRIES: usize = 16;
///     const MIN_FILL_PERCENT: usize = 50;
///     const SPLIT: SplitStrategy = SplitStrategy::Linear;
/// }
///
/// let mut tree = RTree::<f64, u32, 2, Wide>::try_new().unwrap();
/// tree.insert(Aabb2D::new(0.0, 0.0, 1.0, 1.0), 7);
/// assert_eq!(tree.len(), 1);
/// ```
pub trait RTreeParams {
    /// Maximum number of entries in a leaf node.
    const MAX_LEAF_ENTRIES: usize;

    /// Maximum number of children in an internal node.
    const MAX_INTERNAL_ENTRIES: usize;

    /// Minimum fill, as a percentage of capacity, below which a non-root node is condensed.
    const MIN_FILL_PERCENT: usize = 40;

    /// Minimum number of entries in a non-root leaf.
    const MIN_LEAF_ENTRIES: usize = Self::MAX_LEAF_ENTRIES * Self::MIN_FILL_PERCENT / 100;

    /// Minimum number of children in a non-root internal node.
    const MIN_INTERNAL_ENTRIES: usize =
        Self::MAX_INTERNAL_ENTRIES * Self::MIN_FILL_PERCENT / 100;

    /// Overflow split heuristic.
    const SPLIT: SplitStrategy = SplitStrategy::Quadratic;
}

/// 16 entries per leaf, 8 children per internal node, 40% minimum fill, quadratic split.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DefaultParams;

impl RTreeParams for DefaultParams {
    const MAX_LEAF_ENTRIES: usize = 16;
    const MAX_INTERNAL_ENTRIES: usize = 8;
}

/// Check a parameter set for a `D`-dimensional tree.
pub(crate) fn validate<C: RTreeParams, const D: usize>() -> Result<(), ConfigError> {
    if D == 0 {
        return Err(ConfigError::ZeroDimensions);
    }
    check_role(NodeRole::Leaf, C::MAX_LEAF_ENTRIES, C::MIN_LEAF_ENTRIES)?;
    check_role(NodeRole::Internal, C::MAX_INTERNAL_ENTRIES, C::MIN_INTERNAL_ENTRIES)
}

fn check_role(role: NodeRole, capacity: usize, min: usize) -> Result<(), ConfigError> {
    if capacity < 2 {
        return Err(ConfigError::CapacityTooSmall { role, capacity });
    }
    if min == 0 {
        return Err(ConfigError::ZeroMinimumFill { role });
    }
    if min * 2 > capacity {
        return Err(ConfigError::MinimumFillTooLarge { role, min, capacity });
    }
    Ok(())
}
