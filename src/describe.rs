//! Derived orbit summaries for display

use std::fmt;

use glam::DVec3;
use satkit::Instant;

use crate::data::{ElementSet, OrbitShape, OrbitalRegime, SECONDS_PER_DAY};
use crate::propagation::{teme_to_scene, Propagator};

/// Display summary of one object at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitSummary {
    pub name: String,
    pub regime: OrbitalRegime,
    /// Orbital period, seconds
    pub period_s: f64,
    pub semi_major_axis_km: f64,
    pub eccentricity: f64,
    pub inclination_deg: f64,
    /// Perigee/apogee altitudes in km
    pub perigee_km: Option<f64>,
    pub apogee_km: Option<f64>,
    /// Days between the element epoch and `at_time`, negative before epoch
    pub element_age_days: f64,
    /// Scene position (km) at `at_time`, `None` when unpropagatable
    pub position: Option<DVec3>,
}

/// Summarize an object's orbit at `at_time`
pub fn describe(propagator: &Propagator, set: &ElementSet, at_time: &Instant) -> OrbitSummary {
    let shape = OrbitShape::from_elements(set.elements());
    let (perigee_km, apogee_km) = match shape.perigee_apogee_km() {
        Some((perigee, apogee)) => (Some(perigee), Some(apogee)),
        None => (None, None),
    };

    let element_age_days = (*at_time - set.elements().epoch()).as_seconds() / SECONDS_PER_DAY;
    let position = propagator
        .propagate(set, at_time)
        .state
        .map(|state| teme_to_scene(&state.position_km));

    OrbitSummary {
        name: set.name().to_string(),
        regime: set.regime(),
        period_s: shape.period_s,
        semi_major_axis_km: shape.semi_major_axis_km,
        eccentricity: shape.eccentricity,
        inclination_deg: shape.inclination_deg,
        perigee_km,
        apogee_km,
        element_age_days,
        position,
    }
}

/// Format seconds as `[Dd ]Hh Mm Ss`; the day part only appears from one day up
pub fn format_duration(duration_s: f64) -> String {
    let total = if duration_s.is_finite() && duration_s > 0.0 {
        duration_s.floor() as u64
    } else {
        0
    };

    let days = total / 86_400;
    let hours = (total % 86_400) / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if days >= 1 {
        format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
    } else {
        format!("{}h {}m {}s", hours, minutes, seconds)
    }
}

impl fmt::Display for OrbitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.name, self.regime)?;
        writeln!(f, "  Period:          {}", format_duration(self.period_s))?;
        writeln!(f, "  Semi-major axis: {:.0} km", self.semi_major_axis_km)?;
        writeln!(f, "  Eccentricity:    {:.6}", self.eccentricity)?;
        writeln!(f, "  Inclination:     {:.1}°", self.inclination_deg)?;
        if let (Some(perigee), Some(apogee)) = (self.perigee_km, self.apogee_km) {
            writeln!(f, "  Perigee/apogee:  {:.0} / {:.0} km", perigee, apogee)?;
        }
        write!(f, "  Element age:     {:.2} days", self.element_age_days)?;
        match self.position {
            Some(p) => write!(f, "\n  Position:        ({:.1}, {:.1}, {:.1}) km", p.x, p.y, p.z),
            None => write!(f, "\n  Position:        unavailable"),
        }
    }
}
