//! Axis-aligned bounding box
//!
//! `Bounds` keeps `min <= max` on every axis. The only exception is the
//! empty box, which is the identity of [`Bounds::expand`] and never
//! intersects anything.

use crate::core::error::{SceneError, SceneResult};
use crate::foundation::math::{Mat4, Point3, Vec3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    min: Vec3,
    max: Vec3,
}

impl Bounds {
    /// Create a box from its corners, failing if `min > max` on any axis
    pub fn new(min: Vec3, max: Vec3) -> SceneResult<Self> {
        if (0..3).any(|i| !(min[i] <= max[i])) {
            return Err(SceneError::InvalidArgument(format!(
                "bounds min {:?} exceeds max {:?}",
                min.as_slice(),
                max.as_slice()
            )));
        }
        Ok(Self { min, max })
    }

    /// The empty box
    pub fn empty() -> Self {
        Self {
            min: Vec3::repeat(f32::INFINITY),
            max: Vec3::repeat(f32::NEG_INFINITY),
        }
    }

    /// A degenerate box containing a single point
    pub fn from_point(point: Vec3) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// A box centred at `center` with the given half extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> SceneResult<Self> {
        Self::new(center - extents, center + extents)
    }

    /// Smallest box containing every point, empty for no points
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        let mut bounds = Self::empty();
        for point in points {
            bounds.expand_point(point);
        }
        bounds
    }

    /// Whether the box contains no point at all
    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    /// Minimum corner
    pub fn min(&self) -> Vec3 {
        self.min
    }

    /// Maximum corner
    pub fn max(&self) -> Vec3 {
        self.max
    }

    /// Centre of the box (origin for the empty box)
    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::zeros();
        }
        (self.min + self.max) * 0.5
    }

    /// Size along each axis (zero for the empty box)
    pub fn dimensions(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::zeros();
        }
        self.max - self.min
    }

    /// Volume of the box
    pub fn volume(&self) -> f32 {
        let d = self.dimensions();
        d.x * d.y * d.z
    }

    /// Grow the box to include `point`
    pub fn expand_point(&mut self, point: Vec3) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    /// Grow the box to include `other`
    pub fn expand(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }
        self.min = self.min.inf(&other.min);
        self.max = self.max.sup(&other.max);
    }

    /// Union of two boxes
    pub fn union(mut self, other: &Bounds) -> Bounds {
        self.expand(other);
        self
    }

    /// Check if this box contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }

    /// Check if this box overlaps another one
    pub fn intersects(&self, other: &Bounds) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        (0..3).all(|i| self.min[i] <= other.max[i] && self.max[i] >= other.min[i])
    }

    /// The eight corners
    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Box enclosing this one after transformation by `matrix`
    pub fn transformed(&self, matrix: &Mat4) -> Bounds {
        if self.is_empty() {
            return *self;
        }
        Self::from_points(
            self.corners()
                .iter()
                .map(|corner| matrix.transform_point(&Point3::from(*corner)).coords),
        )
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::foundation::math::Transform;
    use approx::assert_relative_eq;

    fn unit() -> Bounds {
        Bounds::new(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0)).unwrap()
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        for axis in 0..3 {
            let mut min = Vec3::zeros();
            min[axis] = 2.0;
            let err = Bounds::new(min, Vec3::new(1.0, 1.0, 1.0)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn test_nan_rejected() {
        assert!(Bounds::new(Vec3::new(f32::NAN, 0.0, 0.0), Vec3::repeat(1.0)).is_err());
    }

    #[test]
    fn test_flat_bounds_accepted() {
        let flat = Bounds::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 1.0)).unwrap();
        assert_eq!(flat.volume(), 0.0);
        assert!(!flat.is_empty());
    }

    #[test]
    fn test_center_and_dimensions() {
        let b = Bounds::new(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(1.0, 4.0, 3.0)).unwrap();
        assert_relative_eq!(b.center(), Vec3::new(0.0, 2.0, 2.5));
        assert_relative_eq!(b.dimensions(), Vec3::new(2.0, 4.0, 1.0));
    }

    #[test]
    fn test_empty_behaviour() {
        let empty = Bounds::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.dimensions(), Vec3::zeros());
        assert_eq!(empty.center(), Vec3::zeros());
        assert!(!empty.intersects(&unit()));
        assert_eq!(unit().union(&empty), unit());
    }

    #[test]
    fn test_expand_is_monotone() {
        let mut b = unit();
        let points = [
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(-1.0, -3.0, 0.5),
            Vec3::new(0.0, 0.0, 0.0),
        ];
        let mut previous = b.volume();
        for point in points {
            b.expand_point(point);
            assert!(b.volume() >= previous);
            assert!(b.contains_point(point));
            previous = b.volume();
        }

        let other = Bounds::new(Vec3::repeat(5.0), Vec3::repeat(6.0)).unwrap();
        b.expand(&other);
        assert!(b.volume() >= previous);
    }

    #[test]
    fn test_intersects() {
        let a = unit();
        let touching = Bounds::new(Vec3::repeat(1.0), Vec3::repeat(2.0)).unwrap();
        let apart = Bounds::new(Vec3::repeat(1.5), Vec3::repeat(2.0)).unwrap();
        assert!(a.intersects(&touching));
        assert!(!a.intersects(&apart));
    }

    #[test]
    fn test_transformed() {
        let t = Transform::from_translation(Vec3::new(10.0, 0.0, 0.0))
            .with_scale(Vec3::repeat(2.0));
        let moved = unit().transformed(&t.to_matrix());
        assert_relative_eq!(moved.min(), Vec3::new(10.0, 0.0, 0.0));
        assert_relative_eq!(moved.max(), Vec3::new(12.0, 2.0, 2.0));
        assert!(Bounds::empty().transformed(&t.to_matrix()).is_empty());
    }
}
