//! Orbit data pipeline for near-real-time satellite visualization
//!
//! Raw three-line element sets are fetched through a staleness-bounded
//! cache, parsed and classified by orbital regime, batch-propagated with
//! SGP4 and mapped into a Y-up scene frame. A tick engine then turns the
//! coarse propagation samples into smoothly interpolated per-frame
//! positions.

pub mod animation;
pub mod config;
pub mod data;
pub mod describe;
pub mod error;
pub mod pipeline;
pub mod propagation;
pub mod telemetry;

pub use animation::{AnimationState, FramePositions, TickEngine};
pub use config::PipelineConfig;
pub use data::{CacheOutcome, CatalogStats, ElementSet, OrbitalRegime};
pub use describe::{format_duration, OrbitSummary};
pub use error::{Error, Result};
pub use pipeline::OrbitPipeline;
pub use propagation::{
    teme_to_scene, BatchReport, OrbitPath, PropagationSample, Propagator,
};
pub use telemetry::{LogTelemetry, NullTelemetry, Telemetry};

pub use satkit::{Duration, Instant};
