use crate::error::{GeometryError, Result};
use crate::layer::Shape;
use crate::math::polygon_2d::signed_area_2d;
use crate::math::{Point2, Point3, Vector3, TOLERANCE};
use crate::mesh::{triangulate_ring, TriangleMesh};

/// Extrudes a shape into a vertical prism: triangulated caps at the base
/// plane and at `height`, plus outward-facing wall quads.
///
/// The shape's 2D plane maps onto the ground (`x → x`, `y → z`); the
/// extrusion axis is +Y.
///
/// # Errors
///
/// Returns [`GeometryError`] for non-positive heights or rings that cannot
/// be triangulated.
pub fn extrude_prism(shape: &Shape, height: f64) -> Result<TriangleMesh> {
    if height <= 0.0 || !height.is_finite() {
        return Err(GeometryError::ParameterOutOfRange {
            parameter: "height",
            value: height,
            min: f64::MIN_POSITIVE,
            max: f64::INFINITY,
        }
        .into());
    }

    let ring = oriented_open_ring(&shape.ring)?;

    let cap = triangulate_ring(&ring)?;
    let mut mesh = cap.lift(0.0, false);
    mesh.append(cap.lift(height, true));

    // Wall quads. With a counter-clockwise ring the outward direction of
    // edge (dx, dy) is (dy, -dx) on the ground plane.
    let n = ring.len();
    #[allow(clippy::cast_possible_truncation)]
    for i in 0..n {
        let j = (i + 1) % n;
        let (p, q) = (ring[i], ring[j]);
        let d = q - p;
        let outward = Vector3::new(d.y, 0.0, -d.x);
        let len = outward.norm();
        if len < TOLERANCE {
            continue;
        }
        let normal = outward / len;

        let base = mesh.vertices.len() as u32;
        mesh.vertices.extend([
            Point3::new(p.x, 0.0, p.y),
            Point3::new(q.x, 0.0, q.y),
            Point3::new(q.x, height, q.y),
            Point3::new(p.x, height, p.y),
        ]);
        mesh.normals.extend([normal; 4]);
        mesh.indices.push([base, base + 2, base + 1]);
        mesh.indices.push([base, base + 3, base + 2]);
    }

    Ok(mesh)
}

/// Builds a flat, cap-only mesh for a non-extruded layer at the given
/// elevation above the zero plane.
///
/// # Errors
///
/// Returns [`GeometryError`] if the ring cannot be triangulated.
pub fn flat_mesh(shape: &Shape, elevation: f64) -> Result<TriangleMesh> {
    let ring = oriented_open_ring(&shape.ring)?;
    Ok(triangulate_ring(&ring)?.lift(elevation, true))
}

/// Drops a closing duplicate vertex and consecutive duplicates, then orients
/// the ring counter-clockwise so wall winding is deterministic.
fn oriented_open_ring(ring: &[Point2]) -> Result<Vec<Point2>> {
    let mut open: Vec<Point2> = Vec::with_capacity(ring.len());
    for p in ring {
        if open
            .last()
            .is_none_or(|prev| (p - prev).norm() > TOLERANCE)
        {
            open.push(*p);
        }
    }
    if open.len() > 1 && (open[0] - open[open.len() - 1]).norm() <= TOLERANCE {
        open.pop();
    }
    if open.len() < 3 {
        return Err(GeometryError::Degenerate(format!(
            "ring has only {} distinct vertices",
            open.len()
        ))
        .into());
    }
    if signed_area_2d(&open) < 0.0 {
        open.reverse();
    }
    Ok(open)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> Shape {
        Shape::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
            Point2::new(0.0, 0.0),
        ])
    }

    #[test]
    fn prism_has_caps_and_walls() {
        let mesh = extrude_prism(&unit_square(), 10.0).unwrap();
        // 2 cap triangles per cap + 2 per wall edge
        assert_eq!(mesh.indices.len(), 2 + 2 + 4 * 2);
        let bb = mesh.local_aabb();
        assert_relative_eq!(bb.min.y, 0.0);
        assert_relative_eq!(bb.max.y, 10.0);
    }

    #[test]
    fn extrusion_is_deterministic() {
        let a = extrude_prism(&unit_square(), 7.5).unwrap();
        let b = extrude_prism(&unit_square(), 7.5).unwrap();
        assert_eq!(a.vertices, b.vertices);
        assert_eq!(a.indices, b.indices);
    }

    #[test]
    fn clockwise_ring_is_reoriented() {
        let mut ring = unit_square().ring;
        ring.reverse();
        let cw = extrude_prism(&Shape::new(ring), 2.0).unwrap();
        let ccw = extrude_prism(&unit_square(), 2.0).unwrap();
        assert_eq!(cw.vertices.len(), ccw.vertices.len());
    }

    #[test]
    fn wall_normals_point_outward() {
        let mesh = extrude_prism(&unit_square(), 4.0).unwrap();
        let center = Point3::new(0.5, 2.0, 0.5);
        for (v, n) in mesh.vertices.iter().zip(&mesh.normals) {
            if n.y.abs() < 1e-9 {
                // wall vertex: normal must point away from the prism axis
                let away = Vector3::new(v.x - center.x, 0.0, v.z - center.z);
                assert!(n.dot(&away) > 0.0, "wall normal {n:?} at {v:?} points inward");
            }
        }
    }

    #[test]
    fn zero_height_is_rejected() {
        assert!(extrude_prism(&unit_square(), 0.0).is_err());
        assert!(extrude_prism(&unit_square(), f64::NAN).is_err());
    }

    #[test]
    fn flat_mesh_sits_at_elevation() {
        let mesh = flat_mesh(&unit_square(), 0.3).unwrap();
        assert!(mesh.vertices.iter().all(|v| (v.y - 0.3).abs() < 1e-12));
    }
}
