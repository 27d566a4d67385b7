//! Orbital propagation module
//!
//! SGP4 via satkit sits behind [`PropagationModel`]. [`Propagator`] runs it
//! over whole catalogs (on rayon for large ones), [`frame`] maps inertial
//! results into scene coordinates, [`orbit_track`] samples a full period
//! for one object, and [`PropagationWorker`] moves batches off the caller's
//! thread.

pub mod frame;
pub(crate) mod model;
pub mod orbit_track;
mod propagator;
mod worker;

pub use frame::{teme_to_scene, to_render_units, SceneState};
pub use model::{InertialState, PropagationError, PropagationModel, Sgp4Model};
pub use orbit_track::{sample_orbit, OrbitPath, DEFAULT_ORBIT_SAMPLES};
pub use propagator::{
    BatchReport, PropagatedBatch, PropagationSample, Propagator, DEFAULT_PARALLEL_THRESHOLD,
};
pub use worker::PropagationWorker;
