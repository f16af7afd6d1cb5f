pub mod extrude;

pub use extrude::{extrude_prism, flat_mesh};

use crate::config::SiteConfig;
use crate::error::{Result, SceneError};
use crate::layer::{Feature, FeatureCollection, IngestLayer, LayerKind, Shape};
use crate::math::Point2;
use crate::mesh::TriangleMesh;
use crate::scene::{LayerTicket, MaterialId, Meta, SceneState, Volume, VolumeId};

/// Builds one volume from a feature's shapes.
///
/// Buildings extrude by the feature height (or the configured default);
/// flat layers get a cap-only mesh at their per-layer elevation.
pub struct BuildVolume<'a> {
    kind: LayerKind,
    feature: &'a Feature,
    shapes: Vec<Shape>,
    fallback_id: String,
}

impl<'a> BuildVolume<'a> {
    /// Creates a new build operation. `fallback_id` names the volume when
    /// the feature carries no id of its own.
    #[must_use]
    pub fn new(
        kind: LayerKind,
        feature: &'a Feature,
        shapes: Vec<Shape>,
        fallback_id: String,
    ) -> Self {
        Self {
            kind,
            feature,
            shapes,
            fallback_id,
        }
    }

    /// Executes the build, returning the volume ready for insertion.
    ///
    /// # Errors
    ///
    /// Returns a geometry error if no shape of the feature can be meshed.
    pub fn execute(self, material: MaterialId, config: &SiteConfig) -> Result<Volume> {
        let height = if self.kind.extruded() {
            Some(
                self.feature
                    .height()
                    .unwrap_or(config.default_building_height),
            )
        } else {
            None
        };

        let mut mesh = TriangleMesh::default();
        for shape in &self.shapes {
            let part = match height {
                Some(h) => extrude_prism(shape, h)?,
                None => flat_mesh(shape, self.kind.elevation())?,
            };
            mesh.append(part);
        }

        let meta = Meta {
            id: self.feature.id().unwrap_or(self.fallback_id),
            fid: self.feature.fid(),
            properties: self.feature.properties.clone(),
            original_height: height,
            current_height: height,
        };

        Ok(Volume::new(self.kind, self.shapes, mesh, meta, material))
    }
}

/// Ingests and builds a whole feature collection into the scene.
///
/// Each layer load is independent and unordered; the ticket taken at fetch
/// start is checked so a response arriving after a scene rebuild is
/// rejected instead of stale-writing into the new graph.
pub struct BuildLayer<'a> {
    collection: &'a FeatureCollection,
    kind: LayerKind,
    origin: Point2,
    ticket: LayerTicket,
}

impl<'a> BuildLayer<'a> {
    /// Creates a new layer build operation.
    #[must_use]
    pub fn new(
        collection: &'a FeatureCollection,
        kind: LayerKind,
        origin: Point2,
        ticket: LayerTicket,
    ) -> Self {
        Self {
            collection,
            kind,
            origin,
            ticket,
        }
    }

    /// Executes the build, inserting one volume per surviving feature.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::StaleLayer`] if the scene was rebuilt since the
    /// ticket was issued. Individual unmeshable features are skipped.
    pub fn execute(&self, scene: &mut SceneState, config: &SiteConfig) -> Result<Vec<VolumeId>> {
        scene.ensure_fresh(self.ticket)?;

        let material = material_for(scene, self.kind);
        let ingested =
            IngestLayer::new(self.collection, self.origin, &config.excluded_feature_ids).execute();

        let mut inserted = Vec::with_capacity(ingested.len());
        for (index, (feature, shapes)) in ingested.into_iter().enumerate() {
            let fallback_id = fallback_id(self.kind, index);
            let volume = match BuildVolume::new(self.kind, feature, shapes, fallback_id)
                .execute(material, config)
            {
                Ok(volume) => volume,
                Err(err) => {
                    tracing::warn!(fid = ?feature.fid(), %err, "skipping unmeshable feature");
                    continue;
                }
            };
            inserted.push(scene.insert_volume(volume));
        }
        Ok(inserted)
    }
}

/// Re-extrudes a building at a new height.
///
/// Idempotent: the same height twice yields a vertex-identical mesh. The
/// old mesh is dropped, derived caches are recomputed and the volume is
/// reset onto the layer baseline. Callers re-run bounds recomputation
/// afterwards.
pub struct UpdateHeight {
    volume: VolumeId,
    height: f64,
}

impl UpdateHeight {
    /// Creates a new height update.
    #[must_use]
    pub fn new(volume: VolumeId, height: f64) -> Self {
        Self { volume, height }
    }

    /// Executes the update.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::NotABuilding`] for flat-layer volumes, or a
    /// geometry error if re-extrusion fails.
    pub fn execute(&self, scene: &mut SceneState) -> Result<()> {
        let volume = scene.volume(self.volume)?;
        if !volume.kind.extruded() {
            return Err(SceneError::NotABuilding(volume.meta.id.clone()).into());
        }

        let mut mesh = TriangleMesh::default();
        for shape in &volume.shapes {
            mesh.append(extrude_prism(shape, self.height)?);
        }
        mesh.recompute_normals();

        let volume = scene.volume_mut(self.volume)?;
        volume.replace_mesh(mesh);
        volume.pose.position.y = 0.0;
        volume.meta.current_height = Some(self.height);
        Ok(())
    }
}

fn material_for(scene: &SceneState, kind: LayerKind) -> MaterialId {
    let palette = scene.palette;
    match kind {
        LayerKind::Building => palette.building,
        LayerKind::Water => palette.water,
        LayerKind::Green => palette.green,
        LayerKind::Road => palette.road,
        LayerKind::Path => palette.path,
        LayerKind::OpenSpace => palette.open_space,
    }
}

fn fallback_id(kind: LayerKind, index: usize) -> String {
    match kind {
        LayerKind::Building => index.to_string(),
        LayerKind::Water => format!("water_{index}"),
        LayerKind::Green => format!("green_{index}"),
        LayerKind::Road => format!("road_{index}"),
        LayerKind::Path => format!("path_{index}"),
        LayerKind::OpenSpace => format!("open_space_{index}"),
    }
}
