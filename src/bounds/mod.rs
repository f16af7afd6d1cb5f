pub mod frustum;
pub mod plate;

pub use frustum::{ClippingFrustum, HalfPlane, ShadowFrustum};
pub use plate::{BasePlate, BuildBasePlate};

use tracing::debug;

use crate::config::SiteConfig;
use crate::error::{Result, SceneError};
use crate::math::Aabb;
use crate::scene::SceneState;

/// Derived spatial state: the padded building bounds plus the frusta cut
/// from them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneBounds {
    /// Building union, padded by the configured fraction.
    pub aabb: Aabb,
    pub clipping: ClippingFrustum,
    pub shadow: ShadowFrustum,
}

/// Recomputes the scene bounds from the current building set, rebuilds the
/// base plate to match and fans the clipping flag out to every material.
///
/// Run after any building is added, removed or re-extruded. The previous
/// plate is dropped, so repeated runs never accumulate geometry.
pub struct RecomputeBounds;

impl RecomputeBounds {
    /// Executes the recomputation.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NoBuildings`] when the scene holds no building
    /// to derive bounds from, or a geometry error if the plate build fails.
    pub fn execute(scene: &mut SceneState, config: &SiteConfig) -> Result<SceneBounds> {
        let mut union = Aabb::empty();
        for &id in scene.buildings() {
            let volume = scene.volume(id)?;
            union.union_with(&volume.world_aabb());
        }
        if union.is_empty() {
            return Err(SceneError::NoBuildings.into());
        }

        let padded = union.expanded_by_fraction(config.padding_fraction);
        let bounds = SceneBounds {
            aabb: padded,
            clipping: ClippingFrustum::from_aabb(&padded),
            shadow: ShadowFrustum::from_aabb(&padded, config.shadow_scale),
        };

        let plate_material = scene.palette.plate;
        let plate = BuildBasePlate::new(&padded, config).execute(plate_material)?;
        scene.replace_base_plate(plate);

        // The plate is the one surface allowed to extend past the footprint.
        for (id, material) in scene.materials.iter_mut() {
            material.clipped = id != plate_material;
        }
        for (_, volume) in scene.iter_volumes_mut() {
            volume.clipped = true;
        }

        scene.set_bounds(bounds);
        debug!(size = ?padded.size(), "scene bounds recomputed");
        Ok(bounds)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::build::BuildLayer;
    use crate::layer::{FeatureCollection, LayerKind};
    use crate::math::Point2;
    use approx::assert_relative_eq;

    fn scene_with_buildings() -> (SceneState, SiteConfig) {
        let fc: FeatureCollection = serde_json::from_str(
            r#"{"features": [
                {"geometry": {"type": "Polygon",
                  "coordinates": [[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]]},
                 "properties": {"fid": "a", "height": 20.0}},
                {"geometry": {"type": "Polygon",
                  "coordinates": [[[40.0, 0.0], [50.0, 0.0], [50.0, 10.0], [40.0, 10.0]]]},
                 "properties": {"fid": "b", "height": 8.0}}
            ]}"#,
        )
        .unwrap();
        let mut scene = SceneState::new();
        let config = SiteConfig::default();
        BuildLayer::new(&fc, LayerKind::Building, Point2::origin(), scene.ticket())
            .execute(&mut scene, &config)
            .unwrap();
        (scene, config)
    }

    #[test]
    fn bounds_contain_every_building() {
        let (mut scene, config) = scene_with_buildings();
        let bounds = RecomputeBounds::execute(&mut scene, &config).unwrap();
        for &id in &scene.buildings().to_vec() {
            let bb = scene.volume(id).unwrap().world_aabb();
            assert!(bounds.aabb.contains_aabb(&bb));
            assert!(bounds.clipping.contains_aabb(&bb));
        }
    }

    #[test]
    fn padding_expands_each_side() {
        let (mut scene, config) = scene_with_buildings();
        let bounds = RecomputeBounds::execute(&mut scene, &config).unwrap();
        // raw x span is 50, padded by 5% per side
        assert_relative_eq!(bounds.aabb.size().x, 55.0, epsilon = 1e-9);
        assert_relative_eq!(bounds.aabb.min.x, -2.5, epsilon = 1e-9);
    }

    #[test]
    fn empty_scene_has_no_bounds() {
        let mut scene = SceneState::new();
        let config = SiteConfig::default();
        assert!(RecomputeBounds::execute(&mut scene, &config).is_err());
        assert!(scene.bounds().is_none());
    }

    #[test]
    fn plate_is_rebuilt_not_accumulated() {
        let (mut scene, config) = scene_with_buildings();
        RecomputeBounds::execute(&mut scene, &config).unwrap();
        let first = scene.base_plate().unwrap().mesh.vertices.len();
        RecomputeBounds::execute(&mut scene, &config).unwrap();
        assert_eq!(scene.base_plate().unwrap().mesh.vertices.len(), first);
    }

    #[test]
    fn every_material_clips_except_the_plate() {
        let (mut scene, config) = scene_with_buildings();
        RecomputeBounds::execute(&mut scene, &config).unwrap();
        let plate = scene.palette.plate;
        for (id, material) in scene.materials.iter_mut() {
            assert_eq!(material.clipped, id != plate);
        }
    }

    #[test]
    fn plate_sits_under_the_footprint() {
        let (mut scene, config) = scene_with_buildings();
        let bounds = RecomputeBounds::execute(&mut scene, &config).unwrap();
        let plate_bb = scene.base_plate().unwrap().mesh.local_aabb();
        assert_relative_eq!(plate_bb.min.x, bounds.aabb.min.x, epsilon = 1e-9);
        assert_relative_eq!(plate_bb.max.z, bounds.aabb.max.z, epsilon = 1e-9);
        assert!(plate_bb.max.y < 0.0);
    }
}
