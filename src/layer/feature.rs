use serde::Deserialize;
use serde_json::{Map, Value};

use crate::math::Point2;

/// A GeoJSON-shaped feature collection, as served by the layer endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

/// One polygonal feature: geometry in world coordinates plus a property bag.
/// Immutable once ingested.
#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// Polygon geometry. Positions may carry more than two ordinates; only the
/// first two are used.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Polygon(Vec<Vec<Vec<f64>>>),
    MultiPolygon(Vec<Vec<Vec<Vec<f64>>>>),
}

impl Geometry {
    /// All rings of the geometry, in declaration order.
    #[must_use]
    pub fn rings(&self) -> Vec<Vec<Point2>> {
        match self {
            Geometry::Polygon(rings) => rings.iter().map(|r| ring_points(r)).collect(),
            Geometry::MultiPolygon(polys) => polys
                .iter()
                .flat_map(|rings| rings.iter().map(|r| ring_points(r)))
                .collect(),
        }
    }
}

fn ring_points(ring: &[Vec<f64>]) -> Vec<Point2> {
    ring.iter()
        .map(|pos| {
            let x = pos.first().copied().unwrap_or(f64::NAN);
            let y = pos.get(1).copied().unwrap_or(f64::NAN);
            Point2::new(x, y)
        })
        .collect()
}

impl Feature {
    /// The feature's stable identifier: the `id` property when present,
    /// otherwise `fid`. Numeric values are stringified.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.property_string("id")
            .or_else(|| self.property_string("fid"))
    }

    /// The source `fid`, when present.
    #[must_use]
    pub fn fid(&self) -> Option<String> {
        self.property_string("fid")
    }

    /// The feature's extrusion height, when present and numeric.
    #[must_use]
    pub fn height(&self) -> Option<f64> {
        self.properties.get("height").and_then(Value::as_f64)
    }

    fn property_string(&self, key: &str) -> Option<String> {
        match self.properties.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_polygon_collection() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]]]
                },
                "properties": {"fid": "osgb123", "height": 24.5}
            }]
        }"#;
        let fc: FeatureCollection = serde_json::from_str(json).unwrap();
        assert_eq!(fc.features.len(), 1);
        let f = &fc.features[0];
        assert_eq!(f.fid().unwrap(), "osgb123");
        assert_eq!(f.id().unwrap(), "osgb123");
        assert!((f.height().unwrap() - 24.5).abs() < f64::EPSILON);
        assert_eq!(f.geometry.as_ref().unwrap().rings()[0].len(), 5);
    }

    #[test]
    fn multipolygon_yields_all_rings() {
        let json = r#"{
            "type": "MultiPolygon",
            "coordinates": [
                [[[0,0],[1,0],[1,1]]],
                [[[5,5],[6,5],[6,6]], [[5.2,5.2],[5.8,5.2],[5.8,5.8]]]
            ]
        }"#;
        let geom: Geometry = serde_json::from_str(json).unwrap();
        assert_eq!(geom.rings().len(), 3);
    }

    #[test]
    fn numeric_id_is_stringified() {
        let json = r#"{"geometry": null, "properties": {"id": 42}}"#;
        let f: Feature = serde_json::from_str(json).unwrap();
        assert_eq!(f.id().unwrap(), "42");
    }

    #[test]
    fn short_positions_become_nan() {
        let json = r#"{"type": "Polygon", "coordinates": [[[1.0], [2.0, 3.0], [4.0, 5.0]]]}"#;
        let geom: Geometry = serde_json::from_str(json).unwrap();
        assert!(geom.rings()[0][0].y.is_nan());
    }
}
