use std::collections::{HashMap, HashSet, VecDeque};

use spade::handles::FixedFaceHandle;
use spade::{
    ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation,
};

use crate::error::{GeometryError, Result};
use crate::math::{Aabb, Point2, Point3, Vector3};

/// A triangle mesh in scene-local coordinates.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Vertex normals.
    pub normals: Vec<Vector3>,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[u32; 3]>,
}

/// A bounding sphere around a mesh.
#[derive(Debug, Clone, Copy)]
pub struct BoundingSphere {
    pub center: Point3,
    pub radius: f64,
}

impl TriangleMesh {
    /// Appends another mesh, offsetting its indices.
    #[allow(clippy::cast_possible_truncation)]
    pub fn append(&mut self, other: TriangleMesh) {
        let base = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.normals.extend(other.normals);
        self.indices
            .extend(other.indices.into_iter().map(|[a, b, c]| {
                [a + base, b + base, c + base]
            }));
    }

    /// Recomputes area-weighted vertex normals from the triangle set.
    pub fn recompute_normals(&mut self) {
        self.normals = vec![Vector3::zeros(); self.vertices.len()];
        for [a, b, c] in &self.indices {
            let (a, b, c) = (*a as usize, *b as usize, *c as usize);
            let n = (self.vertices[b] - self.vertices[a])
                .cross(&(self.vertices[c] - self.vertices[a]));
            self.normals[a] += n;
            self.normals[b] += n;
            self.normals[c] += n;
        }
        for n in &mut self.normals {
            let len = n.norm();
            if len > crate::math::TOLERANCE {
                *n /= len;
            }
        }
    }

    /// Axis-aligned bounding box over the vertex set, in mesh-local space.
    #[must_use]
    pub fn local_aabb(&self) -> Aabb {
        let mut bb = Aabb::empty();
        for v in &self.vertices {
            bb.expand_by_point(v);
        }
        bb
    }

    /// Bounding sphere centered on the local AABB center.
    #[must_use]
    pub fn bounding_sphere(&self) -> BoundingSphere {
        let bb = self.local_aabb();
        if bb.is_empty() {
            return BoundingSphere {
                center: Point3::origin(),
                radius: 0.0,
            };
        }
        let center = bb.center();
        let radius = self
            .vertices
            .iter()
            .map(|v| (v - center).norm())
            .fold(0.0, f64::max);
        BoundingSphere { center, radius }
    }
}

/// A triangulated polygon cap: deduplicated 2D points plus triangles over them.
#[derive(Debug, Clone)]
pub struct CapTriangulation {
    pub points: Vec<Point2>,
    pub triangles: Vec<[u32; 3]>,
}

impl CapTriangulation {
    /// Lifts the cap into 3D on the ground plane (`x → x`, `y → z`) at the
    /// given elevation. `up` selects the facing: `true` emits +Y normals and
    /// counter-clockwise-from-above winding, `false` the mirror.
    #[must_use]
    pub fn lift(&self, elevation: f64, up: bool) -> TriangleMesh {
        let normal = if up { Vector3::y() } else { -Vector3::y() };
        let vertices: Vec<Point3> = self
            .points
            .iter()
            .map(|p| Point3::new(p.x, elevation, p.y))
            .collect();
        let normals = vec![normal; vertices.len()];
        // Planar 2D CCW becomes clockwise seen from +Y once y maps to z,
        // so the upward cap takes the reversed winding.
        let indices = self
            .triangles
            .iter()
            .map(|&[a, b, c]| if up { [a, c, b] } else { [a, b, c] })
            .collect();
        TriangleMesh {
            vertices,
            normals,
            indices,
        }
    }
}

/// Triangulates a closed polygon ring with a constrained Delaunay
/// triangulation, keeping only faces interior to the ring.
///
/// # Errors
///
/// Returns [`GeometryError::Triangulation`] if the ring cannot be inserted
/// or produces no interior triangles.
#[allow(clippy::cast_possible_truncation)]
pub fn triangulate_ring(ring: &[Point2]) -> Result<CapTriangulation> {
    if ring.len() < 3 {
        return Err(
            GeometryError::Triangulation("constraint loop needs at least 3 points".into()).into(),
        );
    }

    let spade_points: Vec<SpadePoint2<f64>> =
        ring.iter().map(|p| SpadePoint2::new(p.x, p.y)).collect();

    let mut cdt = ConstrainedDelaunayTriangulation::<SpadePoint2<f64>>::new();
    insert_constraint_loop(&mut cdt, &spade_points)?;

    let interior_faces = classify_interior_faces(&cdt);

    let mut points = Vec::new();
    let mut triangles = Vec::new();
    let mut vertex_map: HashMap<usize, u32> = HashMap::new();

    for face_handle in cdt.inner_faces() {
        let fix = face_handle.fix();
        if !interior_faces.contains(&fix.index()) {
            continue;
        }

        let verts = face_handle.vertices();
        let mut tri = [0u32; 3];
        for (i, vh) in verts.iter().enumerate() {
            let idx = vh.fix().index();
            let mesh_idx = if let Some(&existing) = vertex_map.get(&idx) {
                existing
            } else {
                let pos = vh.position();
                let new_idx = points.len() as u32;
                points.push(Point2::new(pos.x, pos.y));
                vertex_map.insert(idx, new_idx);
                new_idx
            };
            tri[i] = mesh_idx;
        }
        triangles.push(tri);
    }

    if triangles.is_empty() {
        return Err(GeometryError::Triangulation("ring has no interior area".into()).into());
    }

    Ok(CapTriangulation { points, triangles })
}

/// Inserts a closed polygon as constraint edges into the CDT.
fn insert_constraint_loop(
    cdt: &mut ConstrainedDelaunayTriangulation<SpadePoint2<f64>>,
    points: &[SpadePoint2<f64>],
) -> Result<()> {
    let mut handles = Vec::with_capacity(points.len());
    for &pt in points {
        let h = cdt
            .insert(pt)
            .map_err(|e: InsertionError| GeometryError::Triangulation(format!("CDT insert: {e}")))?;
        handles.push(h);
    }

    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from == to {
            continue;
        }
        // spade panics on crossing constraint edges, so probe first
        if !cdt.can_add_constraint(from, to) {
            return Err(GeometryError::Triangulation(
                "ring is self-intersecting".into(),
            )
            .into());
        }
        cdt.add_constraint(from, to);
    }

    Ok(())
}

/// Classifies which inner faces of the CDT are inside the polygon using
/// flood-fill. Starts from faces adjacent to the outer (infinite) face at
/// depth 0; each crossing of a constraint edge increments the depth, and odd
/// depth means interior.
fn classify_interior_faces(
    cdt: &ConstrainedDelaunayTriangulation<SpadePoint2<f64>>,
) -> HashSet<usize> {
    let mut interior = HashSet::new();
    let mut depth_map: HashMap<usize, u32> = HashMap::new();
    let mut queue: VecDeque<(FixedFaceHandle<spade::handles::InnerTag>, u32)> = VecDeque::new();

    let outer_fix = cdt.outer_face().fix();

    for edge in cdt.directed_edges() {
        if edge.face().fix() == outer_fix {
            let rev_face = edge.rev().face();
            if let Some(inner) = rev_face.as_inner() {
                let idx = inner.fix().index();
                if depth_map.contains_key(&idx) {
                    continue;
                }
                let depth = u32::from(cdt.is_constraint_edge(edge.as_undirected().fix()));
                depth_map.insert(idx, depth);
                if depth % 2 == 1 {
                    interior.insert(idx);
                }
                queue.push_back((inner.fix(), depth));
            }
        }
    }

    while let Some((face_fix, depth)) = queue.pop_front() {
        let face = cdt.face(face_fix);
        for edge in face.adjacent_edges() {
            let neighbor = edge.rev().face();
            if let Some(inner_neighbor) = neighbor.as_inner() {
                let n_idx = inner_neighbor.fix().index();
                if depth_map.contains_key(&n_idx) {
                    continue;
                }
                let new_depth = if cdt.is_constraint_edge(edge.as_undirected().fix()) {
                    depth + 1
                } else {
                    depth
                };
                depth_map.insert(n_idx, new_depth);
                if new_depth % 2 == 1 {
                    interior.insert(n_idx);
                }
                queue.push_back((inner_neighbor.fix(), new_depth));
            }
        }
    }

    interior
}
