//! Batched propagation of catalog objects to a target instant

use std::sync::Arc;

use rayon::prelude::*;
use satkit::Instant;

use super::model::{InertialState, PropagationError, PropagationModel, Sgp4Model};
use super::SceneState;
use crate::data::{ElementSet, Elements};
use crate::telemetry::{LogTelemetry, Telemetry};

/// Catalogs at least this large are propagated on the rayon pool
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1024;

/// Result of propagating one element set to one instant
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationSample {
    pub name: Arc<str>,
    /// `None` marks an unpropagatable entry
    pub state: Option<InertialState>,
}

impl PropagationSample {
    pub fn is_propagated(&self) -> bool {
        self.state.is_some()
    }

    /// Position and velocity in scene coordinates
    pub fn scene_state(&self) -> Option<SceneState> {
        self.state.as_ref().map(SceneState::from)
    }
}

/// Success/failure accounting for one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    pub failed_names: Vec<Arc<str>>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// One batch: samples in catalog order plus their accounting
#[derive(Debug, Clone)]
pub struct PropagatedBatch {
    pub time: Instant,
    pub samples: Vec<PropagationSample>,
    pub report: BatchReport,
}

/// Propagation engine shared by the tick loop, orbit paths and summaries
#[derive(Clone)]
pub struct Propagator {
    model: Arc<dyn PropagationModel>,
    telemetry: Arc<dyn Telemetry>,
    parallel_threshold: usize,
}

impl Default for Propagator {
    fn default() -> Self {
        Self::new()
    }
}

impl Propagator {
    /// SGP4 engine with log-backed telemetry
    pub fn new() -> Self {
        Self::with_model(Arc::new(Sgp4Model))
    }

    pub fn with_model(model: Arc<dyn PropagationModel>) -> Self {
        Self {
            model,
            telemetry: Arc::new(LogTelemetry::new()),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    /// Propagate bare elements, surfacing the failure reason
    pub fn propagate_elements(
        &self,
        elements: &Elements,
        at: &Instant,
    ) -> Result<InertialState, PropagationError> {
        self.model.propagate(elements, at)
    }

    /// Propagate a single element set
    pub fn propagate(&self, set: &ElementSet, at: &Instant) -> PropagationSample {
        let state = match self.model.propagate(set.elements(), at) {
            Ok(state) => Some(state),
            Err(e) => {
                log::trace!("Unable to propagate {}: {}", set.name(), e);
                None
            }
        };
        PropagationSample {
            name: set.shared_name(),
            state,
        }
    }

    /// Propagate every element set to `target_time`.
    ///
    /// The output has one sample per input, in input order. Objects the
    /// model rejects become unpropagatable samples; the batch itself
    /// never fails.
    pub fn propagate_batch(&self, sets: &[ElementSet], target_time: Instant) -> PropagatedBatch {
        const SPAN: &str = "Propagated element sets";
        self.telemetry.start(SPAN);

        let samples: Vec<PropagationSample> = if sets.len() >= self.parallel_threshold {
            sets.par_iter()
                .map(|set| self.propagate(set, &target_time))
                .collect()
        } else {
            sets.iter()
                .map(|set| self.propagate(set, &target_time))
                .collect()
        };

        let mut report = BatchReport::default();
        for sample in &samples {
            if sample.is_propagated() {
                report.succeeded += 1;
            } else {
                report.failed += 1;
                report.failed_names.push(Arc::clone(&sample.name));
            }
        }

        if report.failed > 0 {
            self.telemetry.warn(&format!(
                "Failed to propagate {}/{} objects",
                report.failed,
                report.total()
            ));
        }
        self.telemetry.end(SPAN);

        PropagatedBatch {
            time: target_time,
            samples,
            report,
        }
    }
}
