use thiserror::Error;

/// Top-level error type for the maquette site-model engine.
#[derive(Debug, Error)]
pub enum MaquetteError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Solar(#[from] SolarError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("triangulation failed: {0}")]
    Triangulation(String),
}

/// Errors related to ingesting layer data.
///
/// Malformed individual features are a data-quality condition, not an error:
/// the ingestor skips and logs them. These variants cover whole-collection
/// failures only.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("layer contains no usable features")]
    EmptyLayer,

    #[error("invalid feature collection: {0}")]
    InvalidCollection(String),
}

/// Errors related to scene-state mutation.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("volume not found: {0}")]
    VolumeNotFound(String),

    #[error("volume {0} is not a building")]
    NotABuilding(String),

    #[error("material not found")]
    MaterialNotFound,

    #[error("layer result is stale: scene generation {current}, ticket {ticket}")]
    StaleLayer { current: u64, ticket: u64 },

    #[error("scene has no buildings to derive bounds from")]
    NoBuildings,
}

/// Errors related to the solar state machine.
#[derive(Debug, Error)]
pub enum SolarError {
    #[error("latitude {0} is out of range [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("invalid simulated time: {0}")]
    InvalidTime(String),
}

/// Convenience type alias for results using [`MaquetteError`].
pub type Result<T> = std::result::Result<T, MaquetteError>;
