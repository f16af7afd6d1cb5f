use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Tunable constants for the site model.
///
/// Defaults reproduce the reference masterplan setup (a London site viewed
/// as a tabletop model).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Fraction of the building bounds added as padding on every side.
    pub padding_fraction: f64,
    /// Corner radius of the rounded base plate.
    pub plate_corner_radius: f64,
    /// Extruded thickness of the base plate.
    pub plate_thickness: f64,
    /// Bevel size on the plate's top rim.
    pub plate_bevel: f64,
    /// Y of the plate's top surface; strictly below every flat layer.
    pub plate_top_offset: f64,
    /// Shadow-camera half-extent as a fraction of the larger bounds dimension.
    pub shadow_scale: f64,
    /// Distance between street lamps along a road centerline.
    pub lamp_spacing: f64,
    /// Lateral offset of lamps from the road centerline.
    pub lamp_offset: f64,
    /// Maximum screen-space displacement (px) for a press/release to count
    /// as a click rather than a camera drag.
    pub click_slop_px: f64,
    /// Camera zoom limits, surfaced to the camera collaborator.
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Radius of the sphere the sun light travels on.
    pub sun_radius: f64,
    /// Site latitude in degrees.
    pub latitude: f64,
    /// Site longitude in degrees (east positive).
    pub longitude: f64,
    /// Yaw applied to the whole site, radians. Solar azimuth is corrected
    /// by this before the sun is placed.
    pub site_yaw: f64,
    /// Simulated seconds that pass per wall-clock second.
    pub time_scale: f64,
    /// Simulated start time, `YYYY-MM-DDTHH:MM:SS`.
    pub start_time: String,
    /// Extrusion height used when a building feature carries none.
    pub default_building_height: f64,
    /// Feature ids excluded from ingestion (known data outliers).
    pub excluded_feature_ids: HashSet<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            padding_fraction: 0.05,
            plate_corner_radius: 20.0,
            plate_thickness: 10.0,
            plate_bevel: 1.0,
            plate_top_offset: -0.2,
            shadow_scale: 0.8,
            lamp_spacing: 20.0,
            lamp_offset: 3.0,
            click_slop_px: 5.0,
            min_zoom: 0.3,
            max_zoom: 10.0,
            sun_radius: 1500.0,
            latitude: 51.5074,
            longitude: -0.1278,
            site_yaw: 90.0_f64.to_radians(),
            time_scale: 900.0,
            start_time: "2024-06-21T12:00:00".to_owned(),
            default_building_height: 10.0,
            excluded_feature_ids: HashSet::from(["osgb1000041681948".to_owned()]),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_json() {
        let config = SiteConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: SiteConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.excluded_feature_ids, config.excluded_feature_ids);
        assert!((back.plate_top_offset - -0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: SiteConfig = serde_json::from_str(r#"{"lamp_spacing": 35.0}"#).unwrap();
        assert!((config.lamp_spacing - 35.0).abs() < f64::EPSILON);
        assert!((config.padding_fraction - 0.05).abs() < f64::EPSILON);
    }
}
