//! Orbit path sampling for a selected object

use glam::DVec3;
use satkit::{Duration, Instant};

use super::{teme_to_scene, Propagator};
use crate::data::{ElementSet, OrbitShape};
use crate::error::{Error, Result};

/// Points per sampled orbit
pub const DEFAULT_ORBIT_SAMPLES: usize = 512;

/// One full orbital period as a scene-space polyline
#[derive(Debug, Clone)]
pub struct OrbitPath {
    pub center_time: Instant,
    pub period_s: f64,
    /// Scene coordinates (km), oldest first
    pub points: Vec<DVec3>,
}

impl OrbitPath {
    /// Distance between the first and last points, km
    pub fn closure_gap_km(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => first.distance(*last),
            _ => 0.0,
        }
    }
}

/// Sample one orbital period centred on `center_time`.
///
/// The window `[center - T/2, center + T/2]` puts the seam where the two
/// ends meet on the far side of the globe from the object. Any failed
/// instant discards the whole path.
pub fn sample_orbit(
    propagator: &Propagator,
    set: &ElementSet,
    center_time: &Instant,
    num_points: usize,
) -> Result<OrbitPath> {
    let num_points = num_points.max(2);
    let period_s = OrbitShape::from_elements(set.elements()).period_s;
    if !period_s.is_finite() || period_s <= 0.0 {
        return Err(Error::OrbitPathUnavailable {
            name: set.name().to_string(),
            sample: 0,
        });
    }

    let start_time = *center_time - Duration::from_seconds(period_s / 2.0);
    let step = period_s / (num_points - 1) as f64;

    let mut points = Vec::with_capacity(num_points);
    for i in 0..num_points {
        let prop_time = start_time + Duration::from_seconds(step * i as f64);
        match propagator.propagate_elements(set.elements(), &prop_time) {
            Ok(state) => points.push(teme_to_scene(&state.position_km)),
            Err(e) => {
                log::debug!("Orbit path for {} failed at sample {}: {}", set.name(), i, e);
                return Err(Error::OrbitPathUnavailable {
                    name: set.name().to_string(),
                    sample: i,
                });
            }
        }
    }

    Ok(OrbitPath {
        center_time: *center_time,
        period_s,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::element_set::tests::{DECAYING, ISS};
    use crate::data::parse_element_sets;
    use crate::propagation::model::tests::{CircularModel, FailingModel};
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_circular_orbit_closes() {
        let sets = parse_element_sets(ISS).unwrap();
        let propagator = Propagator::with_model(Arc::new(CircularModel));
        let center = sets[0].elements().epoch() + Duration::from_seconds(1800.0);

        let path = sample_orbit(&propagator, &sets[0], &center, DEFAULT_ORBIT_SAMPLES).unwrap();
        assert_eq!(path.points.len(), DEFAULT_ORBIT_SAMPLES);
        assert!(path.closure_gap_km() < 1e-2, "gap {}", path.closure_gap_km());
    }

    #[test]
    fn test_center_point_is_opposite_the_seam() {
        let sets = parse_element_sets(ISS).unwrap();
        let propagator = Propagator::with_model(Arc::new(CircularModel));
        let center = sets[0].elements().epoch();

        // Odd count puts a sample exactly at the center time
        let path = sample_orbit(&propagator, &sets[0], &center, 101).unwrap();
        let mid = path.points[50];
        let seam = path.points[0];
        // Diametrically opposite on a circle: distance is the diameter
        let diameter = 2.0 * mid.length();
        assert!((mid.distance(seam) - diameter).abs() < 1e-3);
    }

    #[test]
    fn test_sgp4_leo_path_nearly_closes() {
        let sets = parse_element_sets(ISS).unwrap();
        let propagator = Propagator::new();
        let center = sets[0].elements().epoch();

        let path = sample_orbit(&propagator, &sets[0], &center, DEFAULT_ORBIT_SAMPLES).unwrap();
        assert_eq!(path.points.len(), DEFAULT_ORBIT_SAMPLES);
        // Perturbations open the loop slightly; far below the ~13,500 km diameter
        assert!(path.closure_gap_km() < 250.0, "gap {}", path.closure_gap_km());
    }

    #[test]
    fn test_any_failure_discards_path() {
        let sets = parse_element_sets(ISS).unwrap();
        let propagator = Propagator::with_model(Arc::new(FailingModel {
            rejected: HashSet::from([25544]),
        }));

        let result = sample_orbit(&propagator, &sets[0], &sets[0].elements().epoch(), 16);
        assert!(matches!(
            result,
            Err(Error::OrbitPathUnavailable { sample: 0, .. })
        ));
    }

    #[test]
    fn test_decayed_object_has_no_path() {
        let sets = parse_element_sets(DECAYING).unwrap();
        let center = sets[0].elements().epoch() + Duration::from_seconds(365.0 * 86_400.0);

        let result = sample_orbit(&Propagator::new(), &sets[0], &center, 32);
        assert!(matches!(result, Err(Error::OrbitPathUnavailable { .. })));
    }
}
