//! The supplied perturbation primitive and its adapter trait

use nalgebra::Vector3;
use satkit::sgp4::{sgp4, SGP4Error};
use satkit::Instant;
use thiserror::Error;

use crate::data::Elements;

/// Inertial (TEME) state of one object at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InertialState {
    /// Position, km
    pub position_km: Vector3<f64>,
    /// Velocity, km/s
    pub velocity_km_s: Vector3<f64>,
}

impl InertialState {
    /// Distance above the equatorial radius, km
    pub fn altitude_km(&self) -> f64 {
        self.position_km.norm() - crate::data::EARTH_RADIUS_KM
    }

    pub fn speed_km_s(&self) -> f64 {
        self.velocity_km_s.norm()
    }
}

/// Why a single object could not be propagated
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropagationError {
    /// The model reported a decay or invalid-elements condition
    #[error("propagation rejected: {0}")]
    Rejected(String),

    /// The model returned NaN or infinite components
    #[error("propagation produced non-finite state")]
    NonFinite,
}

/// Converts element records plus an instant into an inertial state.
///
/// Implementations must not keep mutable state between calls so batches
/// can run concurrently for different target times.
pub trait PropagationModel: Send + Sync {
    fn propagate(
        &self,
        elements: &Elements,
        at: &Instant,
    ) -> Result<InertialState, PropagationError>;

    /// Model name for diagnostics
    fn name(&self) -> &'static str;
}

/// SGP4/SDP4 via satkit
#[derive(Debug, Default, Clone, Copy)]
pub struct Sgp4Model;

impl PropagationModel for Sgp4Model {
    fn propagate(
        &self,
        elements: &Elements,
        at: &Instant,
    ) -> Result<InertialState, PropagationError> {
        // sgp4 caches its initialization in the TLE, so each call works on a copy
        let mut tle = elements.tle().clone();
        let result = sgp4(&mut tle, &[*at]).map_err(|_| {
            PropagationError::Rejected(format!(
                "sgp4 failed for catalog number {}",
                elements.catalog_number()
            ))
        })?;

        // Decay and bad elements at this instant come back as Ok with an
        // error code and zeroed vectors
        match result.errcode.first() {
            Some(SGP4Error::SGP4Success) => {}
            Some(code) => return Err(PropagationError::Rejected(format!("{:?}", code))),
            None => {
                return Err(PropagationError::Rejected(
                    "sgp4 returned no state".to_string(),
                ))
            }
        }

        // pos and vel are in metres and m/s
        let pos = result.pos.column(0);
        let vel = result.vel.column(0);
        let state = InertialState {
            position_km: Vector3::new(pos[0], pos[1], pos[2]) / 1000.0,
            velocity_km_s: Vector3::new(vel[0], vel[1], vel[2]) / 1000.0,
        };

        let finite = state.position_km.iter().all(|c| c.is_finite())
            && state.velocity_km_s.iter().all(|c| c.is_finite());
        if !finite {
            return Err(PropagationError::NonFinite);
        }
        Ok(state)
    }

    fn name(&self) -> &'static str {
        "SGP4"
    }
}
