//! Coordinate adapter from the inertial frame to the scene convention
//!
//! TEME is Z-up (polar axis) while the scene is Y-up. The mapping keeps
//! right-handedness: TEME X -> scene X, TEME Z -> scene Y, TEME Y -> scene -Z.
//! Every position leaving the propagation layer (batch samples and orbit
//! paths alike) goes through [`teme_to_scene`].

use glam::{DVec3, Vec3};
use nalgebra::Vector3;

use super::InertialState;
use crate::data::EARTH_RADIUS_KM;

/// Map an inertial vector `(x, y, z)` to scene coordinates `(x, z, -y)`
pub fn teme_to_scene(v: &Vector3<f64>) -> DVec3 {
    DVec3::new(v.x, v.z, -v.y)
}

/// Inertial state expressed in scene coordinates (km, km/s)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneState {
    pub position: DVec3,
    pub velocity: DVec3,
}

impl From<&InertialState> for SceneState {
    fn from(state: &InertialState) -> Self {
        Self {
            position: teme_to_scene(&state.position_km),
            velocity: teme_to_scene(&state.velocity_km_s),
        }
    }
}

/// Scale a scene position in km to Earth radii, single precision
pub fn to_render_units(position_km: DVec3) -> Vec3 {
    (position_km / EARTH_RADIUS_KM).as_vec3()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_permutation() {
        let mapped = teme_to_scene(&Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(mapped, DVec3::new(1.0, 3.0, -2.0));
    }

    #[test]
    fn test_mapping_is_not_involutive() {
        let once = teme_to_scene(&Vector3::new(1.0, 2.0, 3.0));
        let twice = teme_to_scene(&Vector3::new(once.x, once.y, once.z));
        assert_eq!(twice, DVec3::new(1.0, -2.0, -3.0));
        assert_ne!(twice, DVec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_mapping_preserves_handedness() {
        let x = teme_to_scene(&Vector3::x());
        let y = teme_to_scene(&Vector3::y());
        let z = teme_to_scene(&Vector3::z());
        assert_eq!(x.cross(y), z);
    }

    #[test]
    fn test_scene_state_maps_velocity_identically() {
        let state = InertialState {
            position_km: Vector3::new(7000.0, -10.0, 5.0),
            velocity_km_s: Vector3::new(0.1, 7.5, -0.3),
        };
        let scene = SceneState::from(&state);
        assert_eq!(scene.position, DVec3::new(7000.0, 5.0, 10.0));
        assert_eq!(scene.velocity, DVec3::new(0.1, -0.3, -7.5));
    }

    #[test]
    fn test_render_units() {
        let p = to_render_units(DVec3::new(EARTH_RADIUS_KM * 2.0, 0.0, 0.0));
        assert!((p.x - 2.0).abs() < 1e-6);
    }
}
