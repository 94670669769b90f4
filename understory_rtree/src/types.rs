// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Primitive geometry types and helpers.

use core::array;
use core::cmp::Ordering;
use core::fmt::Debug;

/// Axis-aligned bounding box in `D` dimensions.
///
/// Both corners are inclusive: a box whose `min` equals its `max` on every axis
/// is a point, and two boxes that only share an edge still overlap.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Aabb<T, const D: usize> {
    /// Lower bound on each axis.
    pub min: [T; D],
    /// Upper bound on each axis.
    pub max: [T; D],
}

/// Axis-aligned bounding box in 2D.
pub type Aabb2D<T> = Aabb<T, 2>;

impl<T, const D: usize> Aabb<T, D> {
    /// Create a box from its lower and upper corners.
    #[inline(always)]
    pub const fn from_corners(min: [T; D], max: [T; D]) -> Self {
        Self { min, max }
    }
}

impl<T> Aabb<T, 2> {
    /// Create a new 2D AABB from min/max corners.
    #[inline(always)]
    pub const fn new(min_x: T, min_y: T, max_x: T, max_y: T) -> Self {
        Self {
            min: [min_x, min_y],
            max: [max_x, max_y],
        }
    }
}

impl<T: Copy, const D: usize> Aabb<T, D> {
    /// A degenerate box covering exactly one point.
    #[inline]
    pub fn from_point(point: [T; D]) -> Self {
        Self {
            min: point,
            max: point,
        }
    }
}

impl<T: Copy + PartialOrd, const D: usize> Aabb<T, D> {
    /// Whether `min <= max` holds on every axis. Assumes no NaN.
    #[inline]
    pub fn is_valid(&self) -> bool {
        (0..D).all(|i| self.min[i] <= self.max[i])
    }

    /// Whether this AABB contains the point.
    #[inline]
    pub fn contains_point(&self, point: &[T; D]) -> bool {
        (0..D).all(|i| self.min[i] <= point[i] && point[i] <= self.max[i])
    }

    /// Determines whether this AABB overlaps with another in any way.
    ///
    /// Note that the edge of the AABB is considered to be part of itself, meaning
    /// that two AABBs that share an edge are considered to overlap.
    ///
    /// # Examples
    ///
    /// ```
    /// use understory_rtree::Aabb2D;
    ///
    /// let aabb1 = Aabb2D::new(0.0, 0.0, 10.0, 10.0);
    /// let aabb2 = Aabb2D::new(5.0, 5.0, 15.0, 15.0);
    /// assert!(aabb1.overlaps(&aabb2));
    ///
    /// let aabb1 = Aabb2D::new(0.0, 0.0, 10.0, 10.0);
    /// let aabb2 = Aabb2D::new(10.0, 0.0, 20.0, 10.0);
    /// assert!(aabb1.overlaps(&aabb2));
    ///
    /// let aabb1 = Aabb2D::new(0.0, 0.0, 10.0, 10.0);
    /// let aabb2 = Aabb2D::new(11.0, 0.0, 20.0, 10.0);
    /// assert!(!aabb1.overlaps(&aabb2));
    /// ```
    #[inline]
    pub fn overlaps(&self, other: &Self) -> bool {
        (0..D).all(|i| self.min[i] <= other.max[i] && self.max[i] >= other.min[i])
    }

    /// Whether `other` lies entirely inside this AABB (edges included).
    ///
    /// ```
    /// use understory_rtree::Aabb2D;
    ///
    /// let outer = Aabb2D::new(0, 0, 10, 10);
    /// assert!(outer.contains(&Aabb2D::new(0, 0, 10, 10)));
    /// assert!(outer.contains(&Aabb2D::new(2, 2, 3, 3)));
    /// assert!(!outer.contains(&Aabb2D::new(2, 2, 11, 3)));
    /// ```
    #[inline]
    pub fn contains(&self, other: &Self) -> bool {
        (0..D).all(|i| self.min[i] <= other.min[i] && other.max[i] <= self.max[i])
    }

    /// The smallest AABB enclosing two AABBs.
    #[inline]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: array::from_fn(|i| min_t(self.min[i], other.min[i])),
            max: array::from_fn(|i| max_t(self.max[i], other.max[i])),
        }
    }
}

impl<T: Scalar, const D: usize> Aabb<T, D> {
    /// Compute the volume (area in 2D) using the scalar's widened accumulator type.
    ///
    /// Inverted axes contribute a zero extent. Integer volumes saturate at the
    /// accumulator's maximum instead of overflowing.
    ///
    /// ```
    /// use understory_rtree::Aabb;
    ///
    /// let huge = Aabb::<i32, 3>::from_corners([i32::MIN; 3], [i32::MAX; 3]);
    /// assert_eq!(huge.volume(), i64::MAX);
    /// ```
    #[inline]
    pub fn volume(&self) -> T::Acc {
        (0..D).fold(T::acc_from_usize(1), |acc, i| T::mul_acc(acc, self.extent(i)))
    }

    /// How much the volume grows when this box is stretched to also cover `other`.
    #[inline]
    pub fn enlargement(&self, other: &Self) -> T::Acc {
        self.union(other).volume() - self.volume()
    }

    /// Width of the box along `axis`, widened before subtracting and clamped at zero.
    #[inline]
    pub(crate) fn extent(&self, axis: usize) -> T::Acc {
        let (lo, hi) = (T::widen(self.min[axis]), T::widen(self.max[axis]));
        if hi > lo { hi - lo } else { T::acc_from_usize(0) }
    }
}

/// Numeric scalar abstraction for AABB coordinates.
///
/// This trait provides the minimal set of operations required for enlargement
/// and split metrics, and an associated widened accumulator type for volume
/// (e.g., f32→f64, i64→i128). The widened type holds any single extent exactly;
/// products of extents go through [`Scalar::mul_acc`], which saturates for
/// integer accumulators so high-dimensional volumes cannot overflow.
pub trait Scalar: Copy + PartialOrd + Debug {
    /// Widened accumulator type suitable for area/cost computations.
    type Acc: Copy
        + PartialOrd
        + core::ops::Add<Output = Self::Acc>
        + core::ops::Sub<Output = Self::Acc>
        + Debug;

    /// Max of the two scalar values.
    fn max(a: Self, b: Self) -> Self;

    /// Min of the two scalar values.
    fn min(a: Self, b: Self) -> Self;

    /// Convert a scalar to the accumulator type.
    fn widen(v: Self) -> Self::Acc;

    /// Convert a `usize` to the accumulator type.
    fn acc_from_usize(n: usize) -> Self::Acc;

    /// Multiply two accumulator values, saturating where the accumulator is an integer.
    fn mul_acc(a: Self::Acc, b: Self::Acc) -> Self::Acc;
}

impl Scalar for f32 {
    type Acc = f64;

    #[inline]
    fn max(a: Self, b: Self) -> Self {
        Self::max(a, b)
    }

    #[inline]
    fn min(a: Self, b: Self) -> Self {
        Self::min(a, b)
    }

    #[inline]
    fn widen(v: Self) -> Self::Acc {
        v as f64
    }

    #[inline]
    fn acc_from_usize(n: usize) -> Self::Acc {
        n as f64
    }

    #[inline]
    fn mul_acc(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a * b
    }
}

impl Scalar for f64 {
    type Acc = Self;

    #[inline]
    fn max(a: Self, b: Self) -> Self {
        Self::max(a, b)
    }

    #[inline]
    fn min(a: Self, b: Self) -> Self {
        Self::min(a, b)
    }

    #[inline(always)]
    fn widen(v: Self) -> Self::Acc {
        v
    }

    #[inline]
    fn acc_from_usize(n: usize) -> Self::Acc {
        n as Self::Acc
    }

    #[inline]
    fn mul_acc(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a * b
    }
}

impl Scalar for i32 {
    type Acc = i64;

    #[inline]
    fn max(a: Self, b: Self) -> Self {
        core::cmp::max(a, b)
    }

    #[inline]
    fn min(a: Self, b: Self) -> Self {
        core::cmp::min(a, b)
    }

    #[inline]
    fn widen(v: Self) -> Self::Acc {
        i64::from(v)
    }

    #[inline]
    fn acc_from_usize(n: usize) -> Self::Acc {
        n as i64
    }

    #[inline]
    fn mul_acc(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a.saturating_mul(b)
    }
}

impl Scalar for i64 {
    type Acc = i128;

    #[inline]
    fn max(a: Self, b: Self) -> Self {
        core::cmp::max(a, b)
    }

    #[inline]
    fn min(a: Self, b: Self) -> Self {
        core::cmp::min(a, b)
    }

    #[inline]
    fn widen(v: Self) -> Self::Acc {
        v as i128
    }

    #[inline]
    fn acc_from_usize(n: usize) -> Self::Acc {
        n as i128
    }

    #[inline]
    fn mul_acc(a: Self::Acc, b: Self::Acc) -> Self::Acc {
        a.saturating_mul(b)
    }
}

/// Helper alias for the widened accumulator type `Scalar::Acc` associated with a `T: Scalar`.
pub type ScalarAcc<T> = <T as Scalar>::Acc;

pub(crate) fn min_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Greater) => b,
        _ => a,
    }
}

pub(crate) fn max_t<T: PartialOrd + Copy>(a: T, b: T) -> T {
    match a.partial_cmp(&b) {
        Some(Ordering::Less) => b,
        _ => a,
    }
}

#[cfg(test)]
mod tests {
    use super::{Aabb, Aabb2D};

    #[test]
    fn aabb_volume_and_validity() {
        const EPSILON: f64 = 1e-10;

        let mut aabb = Aabb2D::<f64>::new(5., 7., 10., 9.);
        assert!((aabb.volume() - 5. * 2.).abs() < EPSILON);
        assert!(aabb.is_valid());

        // Inverted boxes are invalid and get zero volume.
        aabb.max[0] = -aabb.max[0];
        assert!(aabb.volume() < EPSILON);
        assert!(!aabb.is_valid());

        // Points are valid but have no volume.
        let p = Aabb2D::from_point([3.0, 4.0]);
        assert!(p.is_valid());
        assert!(p.volume() < EPSILON);
    }

    #[test]
    fn union_and_enlargement() {
        let a = Aabb2D::new(0_i64, 0, 10, 10);
        let b = Aabb2D::new(5, 5, 20, 12);
        let u = a.union(&b);
        assert_eq!(u, Aabb2D::new(0, 0, 20, 12));
        assert_eq!(a.enlargement(&b), 240 - 100);
        // Covering something already inside costs nothing.
        assert_eq!(u.enlargement(&a), 0);
    }

    #[test]
    fn containment_is_directional() {
        let outer = Aabb2D::new(0_i32, 0, 10, 10);
        let inner = Aabb2D::new(2, 2, 4, 4);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(inner.overlaps(&outer) && outer.overlaps(&inner));
        assert!(outer.contains_point(&[10, 0]));
        assert!(!outer.contains_point(&[11, 0]));
    }

    #[test]
    fn integer_volume_saturates_instead_of_overflowing() {
        let wide = Aabb::<i32, 3>::from_corners([-3_000_000; 3], [3_000_001; 3]);
        assert_eq!(wide.volume(), i64::MAX);
        let small = Aabb::<i32, 3>::from_corners([0; 3], [2; 3]);
        assert_eq!(small.volume(), 8);
        assert_eq!(small.enlargement(&wide), i64::MAX - 8);

        let extreme = Aabb2D::new(i64::MIN, i64::MIN, i64::MAX, i64::MAX);
        assert_eq!(extreme.volume(), i128::MAX);
        // A single extent always fits the accumulator exactly.
        let line = Aabb::<i64, 1>::from_corners([i64::MIN], [i64::MAX]);
        assert_eq!(line.volume(), i128::from(u64::MAX));
    }

    #[test]
    fn three_dimensional_volume() {
        let cube = Aabb::<f32, 3>::from_corners([0.0, 0.0, 0.0], [2.0, 3.0, 4.0]);
        assert_eq!(cube.volume(), 24.0);
        let other = Aabb::from_corners([1.0, 1.0, 1.0], [5.0, 2.0, 2.0]);
        assert!(cube.overlaps(&other));
        assert!(!cube.contains(&other));
        assert_eq!(cube.union(&other).volume(), 5.0 * 3.0 * 4.0);
    }
}
