use std::f64::consts::FRAC_PI_2;

use crate::config::SiteConfig;
use crate::error::Result;
use crate::math::{Aabb, Point2, Point3, TOLERANCE};
use crate::mesh::{triangulate_ring, TriangleMesh};
use crate::scene::MaterialId;

/// Segments used to sample each rounded corner.
const CORNER_SEGMENTS: usize = 6;

/// The rounded base plate under the whole model. Not a scene volume: it is
/// the one element exempt from the clipping frustum.
#[derive(Debug, Clone)]
pub struct BasePlate {
    pub mesh: TriangleMesh,
    pub material: MaterialId,
}

/// Builds the base plate for a bounding volume: a rounded rectangle sized
/// to the padded bounds, extruded downward with a beveled top rim, with its
/// topmost point at the configured offset below the zero plane so it never
/// occludes the flat layers sitting just above zero.
pub struct BuildBasePlate<'a> {
    bounds: &'a Aabb,
    config: &'a SiteConfig,
}

impl<'a> BuildBasePlate<'a> {
    /// Creates a new plate build.
    #[must_use]
    pub fn new(bounds: &'a Aabb, config: &'a SiteConfig) -> Self {
        Self { bounds, config }
    }

    /// Executes the build.
    ///
    /// # Errors
    ///
    /// Returns a geometry error if the bounds degenerate to a line.
    pub fn execute(&self, material: MaterialId) -> Result<BasePlate> {
        let size = self.bounds.size();
        let center = self.bounds.center();
        let (width, depth) = (size.x, size.z);
        let center = Point2::new(center.x, center.z);

        let radius = self
            .config
            .plate_corner_radius
            .min(width / 2.0 - TOLERANCE)
            .min(depth / 2.0 - TOLERANCE)
            .max(0.0);
        let bevel = self.config.plate_bevel.min(radius).max(0.0);

        let y_top = self.config.plate_top_offset;
        let y_mid = y_top - bevel;
        let y_bottom = y_top - self.config.plate_thickness;

        let outer = rounded_rect_outline(center, width, depth, radius);
        let inset = rounded_rect_outline(
            center,
            width - 2.0 * bevel,
            depth - 2.0 * bevel,
            (radius - bevel).max(0.0),
        );

        let mut mesh = triangulate_ring(&outer)?.lift(y_bottom, false);
        mesh.append(triangulate_ring(&inset)?.lift(y_top, true));
        append_band(&mut mesh, &outer, y_bottom, &outer, y_mid);
        append_band(&mut mesh, &outer, y_mid, &inset, y_top);
        mesh.recompute_normals();

        Ok(BasePlate { mesh, material })
    }
}

/// A counter-clockwise rounded-rectangle outline centered at `center`,
/// sampled with `CORNER_SEGMENTS` arcs per corner.
#[must_use]
pub fn rounded_rect_outline(center: Point2, width: f64, depth: f64, radius: f64) -> Vec<Point2> {
    let hw = width / 2.0;
    let hd = depth / 2.0;
    // corner arc centers and start angles, counter-clockwise from the
    // bottom-right corner
    let corners = [
        (center.x + hw - radius, center.y - hd + radius, -FRAC_PI_2),
        (center.x + hw - radius, center.y + hd - radius, 0.0),
        (center.x - hw + radius, center.y + hd - radius, FRAC_PI_2),
        (center.x - hw + radius, center.y - hd + radius, 2.0 * FRAC_PI_2),
    ];

    let mut outline = Vec::with_capacity(4 * (CORNER_SEGMENTS + 1));
    for (cx, cy, start) in corners {
        for i in 0..=CORNER_SEGMENTS {
            #[allow(clippy::cast_precision_loss)]
            let angle = start + FRAC_PI_2 * (i as f64 / CORNER_SEGMENTS as f64);
            outline.push(Point2::new(
                cx + radius * angle.cos(),
                cy + radius * angle.sin(),
            ));
        }
    }
    outline
}

/// Connects two same-length rings with outward-facing quads.
#[allow(clippy::cast_possible_truncation)]
fn append_band(
    mesh: &mut TriangleMesh,
    lower: &[Point2],
    y_lower: f64,
    upper: &[Point2],
    y_upper: f64,
) {
    debug_assert_eq!(lower.len(), upper.len());
    let base = mesh.vertices.len() as u32;
    let n = lower.len() as u32;

    for p in lower {
        mesh.vertices.push(Point3::new(p.x, y_lower, p.y));
    }
    for p in upper {
        mesh.vertices.push(Point3::new(p.x, y_upper, p.y));
    }
    mesh.normals
        .extend(std::iter::repeat_n(crate::math::Vector3::y(), 2 * n as usize));

    for i in 0..n {
        let j = (i + 1) % n;
        let (bi, bj) = (base + i, base + j);
        let (ti, tj) = (base + n + i, base + n + j);
        mesh.indices.push([bi, tj, bj]);
        mesh.indices.push([bi, ti, tj]);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::layer::LayerKind;
    use crate::scene::SceneState;
    use approx::assert_relative_eq;

    fn build(bounds: &Aabb) -> BasePlate {
        let config = SiteConfig::default();
        let scene = SceneState::new();
        BuildBasePlate::new(bounds, &config)
            .execute(scene.palette.plate)
            .unwrap()
    }

    #[test]
    fn plate_top_sits_at_configured_offset() {
        let bounds = Aabb::new(
            Point3::new(-200.0, 0.0, -150.0),
            Point3::new(200.0, 40.0, 150.0),
        );
        let plate = build(&bounds);
        let bb = plate.mesh.local_aabb();
        assert_relative_eq!(bb.max.y, -0.2, epsilon = 1e-9);
        assert_relative_eq!(bb.min.y, -10.2, epsilon = 1e-9);
    }

    #[test]
    fn plate_top_stays_below_every_flat_layer() {
        for extent in [10.0, 100.0, 5000.0] {
            let bounds = Aabb::new(
                Point3::new(-extent, 0.0, -extent),
                Point3::new(extent, 30.0, extent),
            );
            let top = build(&bounds).mesh.local_aabb().max.y;
            for kind in [
                LayerKind::OpenSpace,
                LayerKind::Water,
                LayerKind::Road,
                LayerKind::Path,
            ] {
                assert!(top < kind.elevation(), "plate top {top} occludes {kind:?}");
            }
        }
    }

    #[test]
    fn plate_footprint_matches_bounds() {
        let bounds = Aabb::new(
            Point3::new(-50.0, 0.0, -80.0),
            Point3::new(50.0, 20.0, 80.0),
        );
        let plate = build(&bounds);
        let bb = plate.mesh.local_aabb();
        assert_relative_eq!(bb.min.x, -50.0, epsilon = 1e-9);
        assert_relative_eq!(bb.max.z, 80.0, epsilon = 1e-9);
    }

    #[test]
    fn corner_radius_clamps_on_small_plates() {
        // 10-unit plate cannot carry a 20-unit corner radius
        let bounds = Aabb::new(Point3::new(-5.0, 0.0, -5.0), Point3::new(5.0, 5.0, 5.0));
        let plate = build(&bounds);
        assert!(!plate.mesh.vertices.is_empty());
    }

    #[test]
    fn outline_is_counter_clockwise() {
        let outline = rounded_rect_outline(Point2::origin(), 100.0, 60.0, 10.0);
        assert!(crate::math::polygon_2d::signed_area_2d(&outline) > 0.0);
    }
}
