use std::collections::HashSet;

use tracing::warn;

use crate::math::polygon_2d::is_valid_ring;
use crate::math::{Aabb, Point2, Point3};

use super::{Feature, FeatureCollection, Shape};

/// Converts a feature collection into scene-local shapes.
///
/// Vertices are recentered by subtracting the shared origin; features on
/// the exclusion list, features without geometry, and malformed rings are
/// skipped with a warning. Skipping is a data-quality policy, never fatal.
pub struct IngestLayer<'a> {
    collection: &'a FeatureCollection,
    origin: Point2,
    exclusions: &'a HashSet<String>,
}

impl<'a> IngestLayer<'a> {
    /// Creates a new ingest operation.
    #[must_use]
    pub fn new(
        collection: &'a FeatureCollection,
        origin: Point2,
        exclusions: &'a HashSet<String>,
    ) -> Self {
        Self {
            collection,
            origin,
            exclusions,
        }
    }

    /// Executes the ingest, returning one entry per surviving feature with
    /// the feature's shapes in local space.
    #[must_use]
    pub fn execute(&self) -> Vec<(&'a Feature, Vec<Shape>)> {
        let mut out = Vec::new();

        for feature in &self.collection.features {
            if is_excluded(feature, self.exclusions) {
                continue;
            }
            let Some(geometry) = &feature.geometry else {
                warn!(fid = ?feature.fid(), "skipping feature without geometry");
                continue;
            };

            let mut shapes = Vec::new();
            for ring in geometry.rings() {
                if !is_valid_ring(&ring) {
                    warn!(
                        fid = ?feature.fid(),
                        vertices = ring.len(),
                        "skipping malformed ring"
                    );
                    continue;
                }
                let local: Vec<Point2> = ring
                    .iter()
                    .map(|p| Point2::new(p.x - self.origin.x, p.y - self.origin.y))
                    .collect();
                shapes.push(Shape::new(local));
            }

            if !shapes.is_empty() {
                out.push((feature, shapes));
            }
        }

        out
    }
}

/// Computes the shared recenter origin: the center of the 2D bounding box
/// over every non-excluded building vertex. Every layer subtracts this same
/// point, so the whole site shares one local frame.
#[must_use]
pub fn building_origin(collection: &FeatureCollection, exclusions: &HashSet<String>) -> Point2 {
    let mut bounds = Aabb::empty();
    for feature in &collection.features {
        if is_excluded(feature, exclusions) {
            continue;
        }
        let Some(geometry) = &feature.geometry else {
            continue;
        };
        for ring in geometry.rings() {
            for p in ring {
                if p.x.is_finite() && p.y.is_finite() {
                    bounds.expand_by_point(&Point3::new(p.x, 0.0, p.y));
                }
            }
        }
    }
    if bounds.is_empty() {
        return Point2::origin();
    }
    let c = bounds.center();
    Point2::new(c.x, c.z)
}

fn is_excluded(feature: &Feature, exclusions: &HashSet<String>) -> bool {
    feature
        .fid()
        .or_else(|| feature.id())
        .is_some_and(|id| exclusions.contains(&id))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn collection(json: &str) -> FeatureCollection {
        serde_json::from_str(json).unwrap()
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn sample() -> FeatureCollection {
        collection(
            r#"{"features": [
                {"geometry": {"type": "Polygon",
                  "coordinates": [[[100.0, 200.0], [110.0, 200.0], [110.0, 210.0], [100.0, 210.0]]]},
                 "properties": {"fid": "a", "height": 12.0}},
                {"geometry": {"type": "Polygon",
                  "coordinates": [[[120.0, 200.0], [130.0, 200.0], [130.0, 210.0], [120.0, 210.0]]]},
                 "properties": {"fid": "outlier"}},
                {"geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 1.0]]]},
                 "properties": {"fid": "tiny"}}
            ]}"#,
        )
    }

    #[test]
    fn origin_ignores_excluded_features() {
        let fc = sample();
        let exclusions = HashSet::from(["outlier".to_owned()]);
        let origin = building_origin(&fc, &exclusions);
        assert_relative_eq!(origin.x, 105.0);
        assert_relative_eq!(origin.y, 205.0);
    }

    #[test]
    fn ingest_recenters_and_skips() {
        init_tracing();
        let fc = sample();
        let exclusions = HashSet::from(["outlier".to_owned()]);
        let origin = building_origin(&fc, &exclusions);
        let ingested = IngestLayer::new(&fc, origin, &exclusions).execute();

        // outlier excluded, malformed 2-vertex ring skipped
        assert_eq!(ingested.len(), 1);
        let (feature, shapes) = &ingested[0];
        assert_eq!(feature.fid().unwrap(), "a");
        assert_relative_eq!(shapes[0].ring[0].x, -5.0);
        assert_relative_eq!(shapes[0].ring[0].y, -5.0);
    }

    #[test]
    fn empty_collection_yields_origin_zero() {
        let fc = collection(r#"{"features": []}"#);
        let origin = building_origin(&fc, &HashSet::new());
        assert_relative_eq!(origin.x, 0.0);
    }
}
