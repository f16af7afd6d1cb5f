use super::{Aabb, Point3, Vector3, TOLERANCE};

/// A ray with an origin and a (not necessarily unit) direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3,
    pub direction: Vector3,
}

impl Ray {
    /// Creates a new ray.
    #[must_use]
    pub fn new(origin: Point3, direction: Vector3) -> Self {
        Self { origin, direction }
    }

    /// Point at parameter `t` along the ray.
    #[must_use]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Slab-method ray/AABB intersection.
    ///
    /// Returns the entry parameter, or the exit parameter when the origin is
    /// inside the box, or `None` when the box is missed entirely or lies
    /// behind the origin.
    #[must_use]
    pub fn hit_aabb(&self, aabb: &Aabb) -> Option<f64> {
        let inv = Vector3::new(
            safe_recip(self.direction.x),
            safe_recip(self.direction.y),
            safe_recip(self.direction.z),
        );

        let mut tmin = (aabb.min.x - self.origin.x) * inv.x;
        let mut tmax = (aabb.max.x - self.origin.x) * inv.x;
        if tmin > tmax {
            std::mem::swap(&mut tmin, &mut tmax);
        }

        let mut tymin = (aabb.min.y - self.origin.y) * inv.y;
        let mut tymax = (aabb.max.y - self.origin.y) * inv.y;
        if tymin > tymax {
            std::mem::swap(&mut tymin, &mut tymax);
        }

        if tmin > tymax || tymin > tmax {
            return None;
        }
        tmin = tmin.max(tymin);
        tmax = tmax.min(tymax);

        let mut tzmin = (aabb.min.z - self.origin.z) * inv.z;
        let mut tzmax = (aabb.max.z - self.origin.z) * inv.z;
        if tzmin > tzmax {
            std::mem::swap(&mut tzmin, &mut tzmax);
        }

        if tmin > tzmax || tzmin > tmax {
            return None;
        }
        tmin = tmin.max(tzmin);
        tmax = tmax.min(tzmax);

        if tmax < 0.0 {
            return None;
        }
        Some(if tmin >= 0.0 { tmin } else { tmax })
    }

    /// Möller–Trumbore ray/triangle intersection.
    ///
    /// Returns the ray parameter of the hit, or `None` if the triangle is
    /// missed, degenerate, or behind the origin. Back faces count as hits;
    /// a pick must land on whatever surface is nearest.
    #[must_use]
    pub fn hit_triangle(&self, a: &Point3, b: &Point3, c: &Point3) -> Option<f64> {
        let ab = b - a;
        let ac = c - a;
        let pvec = self.direction.cross(&ac);
        let det = ab.dot(&pvec);
        if det.abs() < TOLERANCE {
            return None;
        }
        let inv_det = 1.0 / det;

        let tvec = self.origin - a;
        let u = tvec.dot(&pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let qvec = tvec.cross(&ab);
        let v = self.direction.dot(&qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = ac.dot(&qvec) * inv_det;
        if t < TOLERANCE {
            return None;
        }
        Some(t)
    }
}

fn safe_recip(x: f64) -> f64 {
    if x == 0.0 {
        f64::INFINITY
    } else {
        1.0 / x
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn ray_hits_box_from_outside() {
        let bb = Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        let ray = Ray::new(Point3::new(0.0, 0.0, -5.0), Vector3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(ray.hit_aabb(&bb).unwrap(), 4.0);
    }

    #[test]
    fn ray_misses_box_behind_origin() {
        let bb = Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        let ray = Ray::new(Point3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(ray.hit_aabb(&bb).is_none());
    }

    #[test]
    fn ray_inside_box_returns_exit() {
        let bb = Aabb::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(ray.hit_aabb(&bb).unwrap(), 1.0);
    }

    #[test]
    fn triangle_hit_and_miss() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(2.0, 0.0, 0.0);
        let c = Point3::new(0.0, 2.0, 0.0);
        let hit = Ray::new(Point3::new(0.5, 0.5, -3.0), Vector3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(hit.hit_triangle(&a, &b, &c).unwrap(), 3.0);

        let miss = Ray::new(Point3::new(3.0, 3.0, -3.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(miss.hit_triangle(&a, &b, &c).is_none());
    }

    #[test]
    fn back_face_still_hits() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(2.0, 0.0, 0.0);
        let c = Point3::new(0.0, 2.0, 0.0);
        let ray = Ray::new(Point3::new(0.5, 0.5, 3.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(ray.hit_triangle(&a, &b, &c).is_some());
    }
}
