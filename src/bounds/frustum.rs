use crate::math::{Aabb, Point3, Vector3};

/// One half-plane constraint: outward normal plus signed distance.
/// A point is kept when `normal · p <= distance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfPlane {
    pub normal: Vector3,
    pub distance: f64,
}

impl HalfPlane {
    /// Returns `true` if `p` lies on the kept side.
    #[must_use]
    pub fn keeps(&self, p: &Point3) -> bool {
        self.normal.dot(&p.coords) <= self.distance + crate::math::TOLERANCE
    }
}

/// Four outward half-planes hiding geometry outside a rectangular
/// footprint. Vertical extent is unconstrained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClippingFrustum {
    pub planes: [HalfPlane; 4],
}

impl ClippingFrustum {
    /// Derives the frustum from a bounding box footprint: planes at
    /// `x = min/max` and `z = min/max`, facing outward.
    #[must_use]
    pub fn from_aabb(aabb: &Aabb) -> Self {
        Self {
            planes: [
                HalfPlane {
                    normal: Vector3::new(-1.0, 0.0, 0.0),
                    distance: -aabb.min.x,
                },
                HalfPlane {
                    normal: Vector3::new(1.0, 0.0, 0.0),
                    distance: aabb.max.x,
                },
                HalfPlane {
                    normal: Vector3::new(0.0, 0.0, -1.0),
                    distance: -aabb.min.z,
                },
                HalfPlane {
                    normal: Vector3::new(0.0, 0.0, 1.0),
                    distance: aabb.max.z,
                },
            ],
        }
    }

    /// Returns `true` if `p` satisfies every half-plane.
    #[must_use]
    pub fn contains_point(&self, p: &Point3) -> bool {
        self.planes.iter().all(|plane| plane.keeps(p))
    }

    /// Returns `true` if the whole box lies inside the footprint.
    #[must_use]
    pub fn contains_aabb(&self, aabb: &Aabb) -> bool {
        aabb.corners().iter().all(|c| self.contains_point(c))
    }
}

/// Orthographic shadow-camera extents derived from the scene bounds,
/// independent of the clipping frustum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowFrustum {
    /// Half-extent of the square orthographic window.
    pub half_extent: f64,
    pub near: f64,
    pub far: f64,
}

impl ShadowFrustum {
    /// Near/far planes sized for the sun-light radius.
    pub const NEAR: f64 = 10.0;
    pub const FAR: f64 = 3000.0;

    /// Derives the shadow window: `max(width, depth) × scale`.
    #[must_use]
    pub fn from_aabb(aabb: &Aabb, scale: f64) -> Self {
        let size = aabb.size();
        Self {
            half_extent: size.x.max(size.z) * scale,
            near: Self::NEAR,
            far: Self::FAR,
        }
    }
}
