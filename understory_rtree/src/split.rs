// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overflow splits.
//!
//! An overflowing node holds exactly one branch more than its capacity. The
//! split divides those branches into two groups: the first stays in the
//! original node, the second moves into a new sibling at the same level.
//!
//! Both strategies share the distribution rules:
//! - a branch joins the group whose cover grows least;
//! - ties go to the group with the smaller resulting volume, then to the group
//!   with fewer members, then to the first group;
//! - once a group needs every remaining branch to reach the minimum fill, it
//!   receives all of them.

use alloc::vec::Vec;

use crate::node::Bounded;
use crate::params::SplitStrategy;
use crate::types::{Aabb, Scalar};

/// Divide `items` into two groups, each holding at least `min_fill` branches.
pub(crate) fn split<T, const D: usize, B>(
    strategy: SplitStrategy,
    items: Vec<B>,
    min_fill: usize,
) -> (Vec<B>, Vec<B>)
where
    T: Scalar,
    B: Bounded<T, D>,
{
    debug_assert!(items.len() >= 2, "split requires at least two branches");
    debug_assert!(
        min_fill * 2 <= items.len(),
        "minimum fill cannot be met by both groups"
    );
    let seeds = match strategy {
        SplitStrategy::Quadratic => quadratic_seeds::<T, D, B>(&items),
        SplitStrategy::Linear => linear_seeds::<T, D, B>(&items),
    };
    distribute::<T, D, B>(strategy, items, seeds, min_fill)
}

/// The pair whose covering box wastes the most volume. Earliest pair wins ties.
fn quadratic_seeds<T, const D: usize, B>(items: &[B]) -> (usize, usize)
where
    T: Scalar,
    B: Bounded<T, D>,
{
    let mut seeds = (0, 1);
    let mut worst: Option<T::Acc> = None;
    for i in 0..items.len() {
        let a = items[i].rect();
        for (j, item) in items.iter().enumerate().skip(i + 1) {
            let b = item.rect();
            let waste = a.union(b).volume() - a.volume() - b.volume();
            if worst.map(|w| waste > w).unwrap_or(true) {
                worst = Some(waste);
                seeds = (i, j);
            }
        }
    }
    seeds
}

/// The pair with the greatest separation along any axis, normalized by the
/// extent of all items on that axis.
fn linear_seeds<T, const D: usize, B>(items: &[B]) -> (usize, usize)
where
    T: Scalar,
    B: Bounded<T, D>,
{
    let mut seeds = (0, 1);
    // (separation, width) of the best axis so far; compared by cross-multiplying.
    let mut best: Option<(T::Acc, T::Acc)> = None;
    for axis in 0..D {
        // Entry with the highest low side.
        let mut high_low = 0;
        for (i, item) in items.iter().enumerate() {
            if item.rect().min[axis] > items[high_low].rect().min[axis] {
                high_low = i;
            }
        }
        // Entry with the lowest high side, other than `high_low`.
        let mut low_high: Option<usize> = None;
        for (i, item) in items.iter().enumerate() {
            if i == high_low {
                continue;
            }
            let better = low_high
                .map(|l| item.rect().max[axis] < items[l].rect().max[axis])
                .unwrap_or(true);
            if better {
                low_high = Some(i);
            }
        }
        let Some(low_high) = low_high else {
            continue;
        };

        let (lo, hi) = items.iter().fold(
            (items[0].rect().min[axis], items[0].rect().max[axis]),
            |(lo, hi), item| {
                (
                    T::min(lo, item.rect().min[axis]),
                    T::max(hi, item.rect().max[axis]),
                )
            },
        );
        let width = T::widen(hi) - T::widen(lo);
        if width <= T::acc_from_usize(0) {
            // Every item is flat on this axis; it cannot separate anything.
            continue;
        }
        let separation = T::widen(items[high_low].rect().min[axis])
            - T::widen(items[low_high].rect().max[axis]);

        let better = best
            .map(|(bs, bw)| T::mul_acc(separation, bw) > T::mul_acc(bs, width))
            .unwrap_or(true);
        if better {
            best = Some((separation, width));
            seeds = (high_low, low_high);
        }
    }
    seeds
}

struct Group<T, const D: usize, B> {
    items: Vec<B>,
    cover: Aabb<T, D>,
}

impl<T: Scalar, const D: usize, B: Bounded<T, D>> Group<T, D, B> {
    fn seeded(seed: B, capacity: usize) -> Self {
        let cover = *seed.rect();
        let mut items = Vec::with_capacity(capacity);
        items.push(seed);
        Self { items, cover }
    }

    fn push(&mut self, item: B) {
        self.cover = self.cover.union(item.rect());
        self.items.push(item);
    }
}

fn distribute<T, const D: usize, B>(
    strategy: SplitStrategy,
    items: Vec<B>,
    (s0, s1): (usize, usize),
    min_fill: usize,
) -> (Vec<B>, Vec<B>)
where
    T: Scalar,
    B: Bounded<T, D>,
{
    debug_assert_ne!(s0, s1, "split seeds must be distinct");
    let capacity = items.len();
    let mut pending: Vec<Option<B>> = items.into_iter().map(Some).collect();
    let mut remaining = pending.len() - 2;

    let seed0 = pending[s0].take().expect("seed slot is occupied");
    let seed1 = pending[s1].take().expect("seed slot is occupied");
    let mut groups: [Group<T, D, B>; 2] = [
        Group::seeded(seed0, capacity),
        Group::seeded(seed1, capacity),
    ];

    while remaining > 0 {
        if let Some(starved) = groups
            .iter()
            .position(|g| g.items.len() + remaining == min_fill)
        {
            for item in pending.iter_mut().filter_map(Option::take) {
                groups[starved].push(item);
            }
            break;
        }

        let next = match strategy {
            SplitStrategy::Quadratic => pick_next(&pending, &groups),
            SplitStrategy::Linear => pending
                .iter()
                .position(Option::is_some)
                .expect("remaining count matches pending slots"),
        };
        let item = pending[next].take().expect("picked slot is occupied");
        let target = preferred_group(&groups, item.rect());
        groups[target].push(item);
        remaining -= 1;
    }

    let [g0, g1] = groups;
    (g0.items, g1.items)
}

/// The pending branch with the strongest preference for one group over the other.
fn pick_next<T, const D: usize, B>(pending: &[Option<B>], groups: &[Group<T, D, B>; 2]) -> usize
where
    T: Scalar,
    B: Bounded<T, D>,
{
    let mut best = None;
    let mut best_diff: Option<T::Acc> = None;
    for (i, item) in pending.iter().enumerate() {
        let Some(item) = item else {
            continue;
        };
        let d0 = groups[0].cover.enlargement(item.rect());
        let d1 = groups[1].cover.enlargement(item.rect());
        let diff = if d0 > d1 { d0 - d1 } else { d1 - d0 };
        if best_diff.map(|b| diff > b).unwrap_or(true) {
            best_diff = Some(diff);
            best = Some(i);
        }
    }
    best.expect("pick_next called with no pending branches")
}

fn preferred_group<T, const D: usize, B>(groups: &[Group<T, D, B>; 2], rect: &Aabb<T, D>) -> usize
where
    T: Scalar,
    B: Bounded<T, D>,
{
    let [g0, g1] = groups;
    let d0 = g0.cover.enlargement(rect);
    let d1 = g1.cover.enlargement(rect);
    if d0 < d1 {
        return 0;
    }
    if d1 < d0 {
        return 1;
    }
    let a0 = g0.cover.union(rect).volume();
    let a1 = g1.cover.union(rect).volume();
    if a0 < a1 {
        return 0;
    }
    if a1 < a0 {
        return 1;
    }
    usize::from(g1.items.len() < g0.items.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Entry, cover_of};
    use crate::types::Aabb2D;
    use alloc::vec::Vec;

    fn entries(rects: &[Aabb2D<f64>]) -> Vec<Entry<f64, usize, 2>> {
        rects
            .iter()
            .enumerate()
            .map(|(payload, &rect)| Entry { rect, payload })
            .collect()
    }

    fn payloads(group: &[Entry<f64, usize, 2>]) -> Vec<usize> {
        let mut p: Vec<_> = group.iter().map(|e| e.payload).collect();
        p.sort_unstable();
        p
    }

    /// Two tight clusters far apart.
    fn clusters() -> Vec<Entry<f64, usize, 2>> {
        entries(&[
            Aabb2D::new(0.0, 0.0, 1.0, 1.0),
            Aabb2D::new(100.0, 100.0, 101.0, 101.0),
            Aabb2D::new(1.0, 1.0, 2.0, 2.0),
            Aabb2D::new(101.0, 101.0, 102.0, 102.0),
            Aabb2D::new(0.5, 0.5, 1.5, 1.5),
        ])
    }

    #[test]
    fn quadratic_seeds_pick_most_wasteful_pair() {
        let items = entries(&[
            Aabb2D::new(0.0, 0.0, 1.0, 1.0),
            Aabb2D::new(2.0, 2.0, 3.0, 3.0),
            Aabb2D::new(50.0, 50.0, 51.0, 51.0),
        ]);
        assert_eq!(quadratic_seeds::<f64, 2, _>(&items), (0, 2));
    }

    #[test]
    fn quadratic_split_separates_clusters() {
        let (a, b) = split::<f64, 2, _>(SplitStrategy::Quadratic, clusters(), 2);
        let (near, far) = if a.iter().any(|e| e.payload == 0) {
            (a, b)
        } else {
            (b, a)
        };
        assert_eq!(payloads(&near), [0, 2, 4]);
        assert_eq!(payloads(&far), [1, 3]);
    }

    #[test]
    fn linear_split_separates_clusters() {
        let (a, b) = split::<f64, 2, _>(SplitStrategy::Linear, clusters(), 2);
        let (near, far) = if a.iter().any(|e| e.payload == 0) {
            (a, b)
        } else {
            (b, a)
        };
        assert_eq!(payloads(&near), [0, 2, 4]);
        assert_eq!(payloads(&far), [1, 3]);
    }

    #[test]
    fn minimum_fill_is_enforced() {
        // One outlier and a crowd: greedy assignment would leave the outlier alone.
        let mut rects = Vec::new();
        rects.push(Aabb2D::new(1000.0, 1000.0, 1001.0, 1001.0));
        for i in 0..8 {
            let x = f64::from(i);
            rects.push(Aabb2D::new(x, x, x + 1.0, x + 1.0));
        }
        for strategy in [SplitStrategy::Quadratic, SplitStrategy::Linear] {
            let (a, b) = split::<f64, 2, _>(strategy, entries(&rects), 4);
            assert_eq!(a.len() + b.len(), 9);
            assert!(a.len() >= 4 && b.len() >= 4, "{strategy:?}: {} / {}", a.len(), b.len());
        }
    }

    #[test]
    fn coincident_points_still_split() {
        let rects = [Aabb2D::from_point([3.0, 3.0]); 5];
        for strategy in [SplitStrategy::Quadratic, SplitStrategy::Linear] {
            let (a, b) = split::<f64, 2, _>(strategy, entries(&rects), 2);
            assert!(a.len() >= 2 && b.len() >= 2, "{strategy:?}");
            assert_eq!(cover_of(&a), Some(Aabb2D::from_point([3.0, 3.0])));
        }
    }
}
