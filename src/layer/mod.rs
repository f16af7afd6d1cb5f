pub mod feature;
pub mod ingest;

pub use feature::{Feature, FeatureCollection, Geometry};
pub use ingest::{building_origin, IngestLayer};

use crate::math::Point2;

/// The closed set of layer kinds the site model knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Building,
    Water,
    Green,
    Road,
    Path,
    OpenSpace,
}

impl LayerKind {
    /// Vertical offset of the flat layers above the zero plane; small and
    /// distinct per layer to avoid coplanar z-fighting. Buildings sit on
    /// the zero plane itself.
    #[must_use]
    pub fn elevation(self) -> f64 {
        match self {
            LayerKind::Building => 0.0,
            LayerKind::OpenSpace => 0.05,
            LayerKind::Water => 0.1,
            LayerKind::Road => 0.3,
            LayerKind::Green | LayerKind::Path => 0.4,
        }
    }

    /// Whether volumes of this kind participate in hit testing.
    #[must_use]
    pub fn clickable(self) -> bool {
        matches!(
            self,
            LayerKind::Building | LayerKind::Water | LayerKind::OpenSpace
        )
    }

    /// Whether volumes of this kind are extruded by a feature height.
    #[must_use]
    pub fn extruded(self) -> bool {
        matches!(self, LayerKind::Building)
    }
}

/// A closed 2D polygon in scene-local coordinates (world minus the shared
/// recenter origin). `x` maps to scene X and `y` to scene Z.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub ring: Vec<Point2>,
}

impl Shape {
    /// Creates a shape from a local-space ring.
    #[must_use]
    pub fn new(ring: Vec<Point2>) -> Self {
        Self { ring }
    }
}
