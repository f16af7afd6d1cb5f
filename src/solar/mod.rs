use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use tracing::trace;

use crate::config::SiteConfig;
use crate::error::{Result, SolarError};
use crate::scene::{Color, SceneState};

/// Simulated wall clock driving the solar state machine.
///
/// Advances at a configurable multiple of real time and can be paused to
/// freeze the lighting regime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimClock {
    time: NaiveDateTime,
    scale: f64,
    paused: bool,
}

impl SimClock {
    /// Creates a clock from the configured start time and time scale.
    ///
    /// # Errors
    ///
    /// Returns [`SolarError::InvalidTime`] if the start time does not parse.
    pub fn from_config(config: &SiteConfig) -> Result<Self> {
        let time = NaiveDateTime::parse_from_str(&config.start_time, "%Y-%m-%dT%H:%M:%S")
            .map_err(|e| SolarError::InvalidTime(format!("{}: {e}", config.start_time)))?;
        Ok(Self {
            time,
            scale: config.time_scale,
            paused: false,
        })
    }

    /// Current simulated time.
    #[must_use]
    pub fn time(&self) -> NaiveDateTime {
        self.time
    }

    /// Advances by `delta_seconds` of wall time, scaled. Frozen while paused.
    #[allow(clippy::cast_possible_truncation)]
    pub fn advance(&mut self, delta_seconds: f64) {
        if self.paused {
            return;
        }
        let millis = (delta_seconds * self.scale * 1000.0) as i64;
        self.time += Duration::milliseconds(millis);
    }

    /// Pauses or resumes the clock.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Whether the clock is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Display string for the time readout, minute precision.
    #[must_use]
    pub fn display(&self) -> String {
        self.time.format("%Y-%m-%d %H:%M").to_string()
    }
}

/// Computes the sun's altitude and azimuth for a time and site, both in
/// radians. Azimuth is measured from north, clockwise. The simulated time
/// is treated as UTC.
///
/// Uses the day-of-year declination and equation-of-time approximations,
/// accurate to well under a degree, which is plenty for scene lighting.
///
/// # Errors
///
/// Returns [`SolarError::LatitudeOutOfRange`] for latitudes beyond ±90°.
pub fn solar_angles(time: NaiveDateTime, lat_deg: f64, lon_deg: f64) -> Result<(f64, f64)> {
    if !(-90.0..=90.0).contains(&lat_deg) {
        return Err(SolarError::LatitudeOutOfRange(lat_deg).into());
    }

    let day = f64::from(time.ordinal());
    let clock_hours = f64::from(time.num_seconds_from_midnight()) / 3600.0;

    // declination, Cooper's approximation
    let declination = 23.45_f64.to_radians() * ((360.0 / 365.0) * (284.0 + day)).to_radians().sin();

    // equation of time, minutes
    let b = ((360.0 / 365.0) * (day - 81.0)).to_radians();
    let eot = 9.87 * (2.0 * b).sin() - 7.53 * b.cos() - 1.5 * b.sin();

    let solar_hours = clock_hours + eot / 60.0 + lon_deg / 15.0;
    let hour_angle = (15.0 * (solar_hours - 12.0)).to_radians();

    let lat = lat_deg.to_radians();
    let altitude = (lat.sin() * declination.sin()
        + lat.cos() * declination.cos() * hour_angle.cos())
    .asin();

    let cos_az = (declination.sin() - lat.sin() * altitude.sin())
        / (lat.cos() * altitude.cos());
    let mut azimuth = cos_az.clamp(-1.0, 1.0).acos();
    if hour_angle > 0.0 {
        azimuth = std::f64::consts::TAU - azimuth;
    }

    Ok((altitude, azimuth))
}

/// The full lighting regime derived from one solar position.
///
/// Two regimes, switched on the horizon crossing: below it the sun light
/// goes dark and the night ambience takes over; above it every intensity
/// scales with the sine of the altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingRig {
    /// Sun light position on the placement sphere, scene space.
    pub sun_position: crate::math::Point3,
    pub directional_intensity: f64,
    pub ambient_intensity: f64,
    pub background: Color,
    pub fog_color: Color,
    /// Halo opacity for street lamps.
    pub lamp_glow_opacity: f64,
    /// Emissive intensity of lamp lantern heads.
    pub lantern_emissive: f64,
    /// Emissive intensity of building windows.
    pub building_emissive: f64,
}

impl LightingRig {
    /// Derives the regime for a solar position.
    ///
    /// The site yaw is subtracted from the azimuth so the sun moves in
    /// scene space, not geographic space.
    #[must_use]
    pub fn from_solar(altitude: f64, azimuth: f64, config: &SiteConfig) -> Self {
        let world_azimuth = azimuth - config.site_yaw;
        let r = config.sun_radius;
        let sun_position = crate::math::Point3::new(
            r * altitude.cos() * world_azimuth.sin(),
            r * altitude.sin(),
            -r * altitude.cos() * world_azimuth.cos(),
        );

        if altitude <= 0.0 {
            return Self {
                sun_position,
                directional_intensity: 0.0,
                ambient_intensity: 0.3,
                background: Color::from_hex(0x0c0c_10),
                fog_color: Color::from_hex(0x0c0c_10),
                lamp_glow_opacity: 0.9,
                lantern_emissive: 1.0,
                building_emissive: 0.2,
            };
        }

        let k = altitude.sin();
        Self {
            sun_position,
            directional_intensity: 0.3 + 0.5 * k,
            ambient_intensity: 0.3 + 0.3 * k,
            background: Color::from_hex(0xA3B1_8A),
            fog_color: Color::from_hex(0xD7D0_C8),
            lamp_glow_opacity: 0.05,
            lantern_emissive: 0.0,
            building_emissive: 0.05,
        }
    }

    /// Pushes the regime into the scene: lamp glow state and the shared
    /// building material's window emissive.
    pub fn apply(&self, scene: &mut SceneState) {
        for lamp in scene.lamps_mut() {
            lamp.glow_opacity = self.lamp_glow_opacity;
            lamp.lantern_emissive = self.lantern_emissive;
        }
        let building = scene.palette.building;
        if let Ok(material) = scene.materials.get_mut(building) {
            material.emissive = Some(Color::from_hex(0xFFEE_CC));
            material.emissive_intensity = self.building_emissive;
        }
        trace!(
            dir = self.directional_intensity,
            ambient = self.ambient_intensity,
            "lighting regime applied"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lamps::Lamp;
    use crate::math::Point2;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn noon_june() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2024-06-21T12:00:00", "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    #[test]
    fn night_regime_kicks_in_at_the_horizon() {
        let config = SiteConfig::default();
        let rig = LightingRig::from_solar(-0.01, 0.0, &config);
        assert_relative_eq!(rig.directional_intensity, 0.0);
        assert_relative_eq!(rig.ambient_intensity, 0.3);
        assert_relative_eq!(rig.lamp_glow_opacity, 0.9);
        assert_relative_eq!(rig.lantern_emissive, 1.0);
        assert_relative_eq!(rig.building_emissive, 0.2);
    }

    #[test]
    fn day_regime_scales_with_altitude() {
        let config = SiteConfig::default();
        let rig = LightingRig::from_solar(FRAC_PI_2, 0.0, &config);
        assert_relative_eq!(rig.directional_intensity, 0.8, epsilon = 1e-12);
        assert_relative_eq!(rig.ambient_intensity, 0.6, epsilon = 1e-12);
        assert_relative_eq!(rig.lamp_glow_opacity, 0.05);
        assert_relative_eq!(rig.building_emissive, 0.05);
    }

    #[test]
    fn zenith_sun_sits_atop_the_sphere() {
        let config = SiteConfig::default();
        let rig = LightingRig::from_solar(FRAC_PI_2, 0.0, &config);
        assert_relative_eq!(rig.sun_position.y, config.sun_radius, epsilon = 1e-6);
    }

    #[test]
    fn london_midsummer_noon_is_high_and_southern() {
        let (altitude, azimuth) = solar_angles(noon_june(), 51.5074, -0.1278).unwrap();
        let alt_deg = altitude.to_degrees();
        let az_deg = azimuth.to_degrees();
        assert!((55.0..=65.0).contains(&alt_deg), "altitude {alt_deg}");
        assert!((150.0..=210.0).contains(&az_deg), "azimuth {az_deg}");
    }

    #[test]
    fn midnight_sun_is_below_the_horizon() {
        let midnight =
            NaiveDateTime::parse_from_str("2024-06-21T00:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        let (altitude, _) = solar_angles(midnight, 51.5074, -0.1278).unwrap();
        assert!(altitude < 0.0);
    }

    #[test]
    fn out_of_range_latitude_is_rejected() {
        assert!(solar_angles(noon_june(), 95.0, 0.0).is_err());
    }

    #[test]
    fn paused_clock_freezes_time() {
        let config = SiteConfig::default();
        let mut clock = SimClock::from_config(&config).unwrap();
        let start = clock.time();
        clock.set_paused(true);
        clock.advance(10.0);
        assert_eq!(clock.time(), start);

        clock.set_paused(false);
        clock.advance(4.0);
        // 4 wall seconds at 900x is one simulated hour
        assert_eq!((clock.time() - start).num_seconds(), 3600);
    }

    #[test]
    fn display_has_minute_precision() {
        let config = SiteConfig::default();
        let clock = SimClock::from_config(&config).unwrap();
        assert_eq!(clock.display(), "2024-06-21 12:00");
    }

    #[test]
    fn regime_fans_out_to_lamps_and_buildings() {
        let config = SiteConfig::default();
        let mut scene = SceneState::new();
        scene.add_lamps(crate::lamps::plan_lamps(
            &[vec![Point2::new(0.0, 0.0), Point2::new(50.0, 0.0)]],
            20.0,
            3.0,
        ));

        LightingRig::from_solar(-0.5, 0.0, &config).apply(&mut scene);
        assert!(scene.lamps().iter().all(|l: &Lamp| l.lantern_emissive > 0.9));
        let building = scene
            .materials
            .get(scene.palette.building)
            .unwrap();
        assert_relative_eq!(building.emissive_intensity, 0.2);
    }
}
