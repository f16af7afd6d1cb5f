use super::{Matrix4, Point3, Vector3};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Creates a bounding box from explicit corners.
    #[must_use]
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Creates an empty (inverted) box that any `expand_by_point` will fix.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Returns `true` if no point has been added yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grows the box to contain `p`.
    pub fn expand_by_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Grows the box to contain another box.
    pub fn union_with(&mut self, other: &Aabb) {
        if other.is_empty() {
            return;
        }
        self.expand_by_point(&other.min);
        self.expand_by_point(&other.max);
    }

    /// Pads every side by `fraction` of the box size, so a 5% fraction
    /// yields a box 110% of the original in each dimension.
    #[must_use]
    pub fn expanded_by_fraction(&self, fraction: f64) -> Self {
        let pad = self.size() * fraction;
        Self {
            min: self.min - pad,
            max: self.max + pad,
        }
    }

    /// Size of the box along each axis.
    #[must_use]
    pub fn size(&self) -> Vector3 {
        if self.is_empty() {
            return Vector3::zeros();
        }
        self.max - self.min
    }

    /// Center point of the box.
    #[must_use]
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Returns `true` if `p` lies inside or on the boundary.
    #[must_use]
    pub fn contains_point(&self, p: &Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Returns `true` if `other` lies entirely inside this box.
    #[must_use]
    pub fn contains_aabb(&self, other: &Aabb) -> bool {
        !other.is_empty() && self.contains_point(&other.min) && self.contains_point(&other.max)
    }

    /// Returns the box containing all eight transformed corners.
    #[must_use]
    pub fn transformed(&self, matrix: &Matrix4) -> Self {
        let mut out = Self::empty();
        if self.is_empty() {
            return out;
        }
        for corner in self.corners() {
            out.expand_by_point(&matrix.transform_point(&corner));
        }
        out
    }

    /// The eight corners of the box.
    #[must_use]
    pub fn corners(&self) -> [Point3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(a.x, b.y, b.z),
            Point3::new(b.x, b.y, b.z),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn expand_by_point_grows_box() {
        let mut bb = Aabb::empty();
        bb.expand_by_point(&Point3::new(1.0, 2.0, 3.0));
        bb.expand_by_point(&Point3::new(-1.0, 0.0, 5.0));
        assert_eq!(bb.min, Point3::new(-1.0, 0.0, 3.0));
        assert_eq!(bb.max, Point3::new(1.0, 2.0, 5.0));
    }

    #[test]
    fn fraction_padding_scales_each_side() {
        let bb = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 20.0));
        let padded = bb.expanded_by_fraction(0.05);
        assert_relative_eq!(padded.min.x, -0.5);
        assert_relative_eq!(padded.max.x, 10.5);
        assert_relative_eq!(padded.min.z, -1.0);
        assert_relative_eq!(padded.max.z, 21.0);
        assert!(padded.contains_aabb(&bb));
    }

    #[test]
    fn union_ignores_empty_operand() {
        let mut bb = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        bb.union_with(&Aabb::empty());
        assert_eq!(bb.max, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn transformed_box_contains_rotated_corners() {
        let bb = Aabb::new(Point3::new(-1.0, 0.0, -1.0), Point3::new(1.0, 2.0, 1.0));
        let yaw = Matrix4::from_euler_angles(0.0, std::f64::consts::FRAC_PI_4, 0.0);
        let rotated = bb.transformed(&yaw);
        let half_diag = 2.0_f64.sqrt();
        assert_relative_eq!(rotated.max.x, half_diag, epsilon = 1e-9);
        assert_relative_eq!(rotated.max.y, 2.0, epsilon = 1e-9);
    }
}
