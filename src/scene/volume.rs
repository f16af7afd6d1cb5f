use serde_json::{Map, Value};
use slotmap::new_key_type;

use crate::layer::{LayerKind, Shape};
use crate::math::{Aabb, Matrix4, Vector3};
use crate::mesh::{BoundingSphere, TriangleMesh};

use super::material::MaterialId;

new_key_type! {
    /// Generational id of a volume in the scene arena.
    pub struct VolumeId;
}

/// Position, yaw and scale of a volume in scene space.
///
/// The site model only ever rotates volumes about the up axis, so a single
/// yaw angle stands in for a full orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vector3,
    pub yaw: f64,
    pub scale: Vector3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            yaw: 0.0,
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Pose {
    /// Local-to-scene transform: translation ∘ yaw ∘ scale.
    #[must_use]
    pub fn matrix(&self) -> Matrix4 {
        let translation = Matrix4::new_translation(&self.position);
        let rotation = Matrix4::from_euler_angles(0.0, self.yaw, 0.0);
        let scale = Matrix4::new_nonuniform_scaling(&self.scale);
        translation * rotation * scale
    }
}

/// Semantic metadata attached to a volume at build time.
#[derive(Debug, Clone)]
pub struct Meta {
    /// Stable id used by picking, plots and history.
    pub id: String,
    /// The source feature's `fid`, when it had one.
    pub fid: Option<String>,
    /// The source feature's full property bag.
    pub properties: Map<String, Value>,
    /// Height at build time (buildings only).
    pub original_height: Option<f64>,
    /// Current extrusion height (buildings only).
    pub current_height: Option<f64>,
}

/// A positioned, extruded (or flat) mesh representing one site feature.
#[derive(Debug, Clone)]
pub struct Volume {
    pub kind: LayerKind,
    /// Retained source shapes so height edits can re-extrude.
    pub shapes: Vec<Shape>,
    pub pose: Pose,
    pub mesh: TriangleMesh,
    pub meta: Meta,
    /// Material currently applied.
    pub material: MaterialId,
    /// Back-reference key to the never-mutated original material.
    pub original_material: MaterialId,
    pub clickable: bool,
    /// Clipped volumes obey the scene clipping frustum; the base plate
    /// opts out to stay always visible.
    pub clipped: bool,
    local_aabb: Aabb,
    bounding_sphere: BoundingSphere,
}

impl Volume {
    /// Creates a volume, caching the mesh's derived geometry.
    #[must_use]
    pub fn new(
        kind: LayerKind,
        shapes: Vec<Shape>,
        mesh: TriangleMesh,
        meta: Meta,
        material: MaterialId,
    ) -> Self {
        let local_aabb = mesh.local_aabb();
        let bounding_sphere = mesh.bounding_sphere();
        Self {
            kind,
            shapes,
            pose: Pose::default(),
            mesh,
            meta,
            material,
            original_material: material,
            clickable: kind.clickable(),
            clipped: true,
            local_aabb,
            bounding_sphere,
        }
    }

    /// Replaces the mesh and refreshes the derived caches.
    pub fn replace_mesh(&mut self, mesh: TriangleMesh) {
        self.local_aabb = mesh.local_aabb();
        self.bounding_sphere = mesh.bounding_sphere();
        self.mesh = mesh;
    }

    /// Mesh-local bounding box.
    #[must_use]
    pub fn local_aabb(&self) -> Aabb {
        self.local_aabb
    }

    /// Mesh-local bounding sphere.
    #[must_use]
    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.bounding_sphere
    }

    /// Scene-space bounding box under the current pose.
    #[must_use]
    pub fn world_aabb(&self) -> Aabb {
        self.local_aabb.transformed(&self.pose.matrix())
    }
}
