//! Orbital regime classification from mean elements

use std::fmt;

use super::Elements;

/// Equatorial radius of the Earth (WGS-84), km
pub const EARTH_RADIUS_KM: f64 = 6378.137;
/// Earth gravitational parameter, km^3/s^2
pub const MU_EARTH_KM3_S2: f64 = 398600.4418;
pub const SECONDS_PER_DAY: f64 = 86_400.0;

const LEO_MAX_ALTITUDE_KM: f64 = 2_000.0;
const MEO_MAX_ALTITUDE_KM: f64 = 34_000.0;
// Period within a 5-minute buffer of 24 hours
const GEO_PERIOD_TOLERANCE_S: f64 = 300.0;
const GEO_MAX_INCLINATION_DEG: f64 = 0.5;
const GEO_MAX_ECCENTRICITY: f64 = 0.001;

/// Coarse classification of orbit shape and altitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrbitalRegime {
    LowEarthOrbit,
    MediumEarthOrbit,
    Geostationary,
    Other,
}

impl OrbitalRegime {
    /// Short label for display
    pub fn label(&self) -> &'static str {
        match self {
            Self::LowEarthOrbit => "LEO",
            Self::MediumEarthOrbit => "MEO",
            Self::Geostationary => "GEO",
            Self::Other => "Other",
        }
    }

    /// All regimes in classification order
    pub fn all() -> &'static [OrbitalRegime] {
        &[
            OrbitalRegime::LowEarthOrbit,
            OrbitalRegime::MediumEarthOrbit,
            OrbitalRegime::Geostationary,
            OrbitalRegime::Other,
        ]
    }
}

impl fmt::Display for OrbitalRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Orbit shape and period derived from mean elements
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitShape {
    pub mean_motion_rad_s: f64,
    pub mean_motion_rev_per_day: f64,
    pub inclination_deg: f64,
    pub eccentricity: f64,
    /// Semi-major axis from Kepler's third law, km
    pub semi_major_axis_km: f64,
    /// Orbital period, seconds
    pub period_s: f64,
}

impl OrbitShape {
    pub fn from_elements(elements: &Elements) -> Self {
        Self::from_mean_elements(
            elements.mean_motion_rev_per_day(),
            elements.inclination_deg(),
            elements.eccentricity(),
        )
    }

    pub fn from_mean_elements(
        mean_motion_rev_per_day: f64,
        inclination_deg: f64,
        eccentricity: f64,
    ) -> Self {
        let mean_motion_rad_s =
            mean_motion_rev_per_day * (2.0 * std::f64::consts::PI) / SECONDS_PER_DAY;
        let semi_major_axis_km =
            (MU_EARTH_KM3_S2 / (mean_motion_rad_s * mean_motion_rad_s)).cbrt();

        Self {
            mean_motion_rad_s,
            mean_motion_rev_per_day,
            inclination_deg,
            eccentricity,
            semi_major_axis_km,
            period_s: SECONDS_PER_DAY / mean_motion_rev_per_day,
        }
    }

    /// Mean altitude above the equatorial radius, km
    pub fn mean_altitude_km(&self) -> f64 {
        self.semi_major_axis_km - EARTH_RADIUS_KM
    }

    /// Perigee and apogee altitudes in km, if the shape is a bound ellipse
    pub fn perigee_apogee_km(&self) -> Option<(f64, f64)> {
        if !self.semi_major_axis_km.is_finite() || !(0.0..1.0).contains(&self.eccentricity) {
            return None;
        }
        let a = self.semi_major_axis_km;
        Some((
            a * (1.0 - self.eccentricity) - EARTH_RADIUS_KM,
            a * (1.0 + self.eccentricity) - EARTH_RADIUS_KM,
        ))
    }
}

/// Classify an element record.
pub fn classify(elements: &Elements) -> OrbitalRegime {
    classify_shape(&OrbitShape::from_elements(elements))
}

/// Classify a derived orbit shape.
///
/// Branches are evaluated in order and the first match wins: the
/// geostationary test is a refinement over the altitude bands and never
/// fires for objects inside the LEO or MEO range.
pub fn classify_shape(shape: &OrbitShape) -> OrbitalRegime {
    let altitude_km = shape.mean_altitude_km();

    if altitude_km <= LEO_MAX_ALTITUDE_KM {
        OrbitalRegime::LowEarthOrbit
    } else if altitude_km <= MEO_MAX_ALTITUDE_KM {
        OrbitalRegime::MediumEarthOrbit
    } else if (shape.period_s - SECONDS_PER_DAY).abs() <= GEO_PERIOD_TOLERANCE_S
        && shape.inclination_deg.abs() < GEO_MAX_INCLINATION_DEG
        && shape.eccentricity <= GEO_MAX_ECCENTRICITY
    {
        OrbitalRegime::Geostationary
    } else {
        OrbitalRegime::Other
    }
}
