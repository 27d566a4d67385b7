//! Tick engine: coarse propagation ticks driving per-frame interpolation

use std::sync::Arc;

use satkit::Instant;

use super::state::{AnimationState, FrameBatch, FramePositions};
use crate::data::ElementSet;
use crate::propagation::{BatchReport, PropagatedBatch, Propagator};

/// Owns a catalog and its animation state.
///
/// A single-object view is simply an engine over a one-element catalog.
pub struct TickEngine {
    catalog: Arc<[ElementSet]>,
    propagator: Propagator,
    state: AnimationState,
    last_report: BatchReport,
}

impl TickEngine {
    pub fn new(catalog: Arc<[ElementSet]>, propagator: Propagator, tick_period_s: f64) -> Self {
        Self {
            catalog,
            propagator,
            state: AnimationState::new(tick_period_s),
            last_report: BatchReport::default(),
        }
    }

    /// Engine tracking one object
    pub fn single(set: ElementSet, propagator: Propagator, tick_period_s: f64) -> Self {
        Self::new(Arc::from(vec![set]), propagator, tick_period_s)
    }

    pub fn catalog(&self) -> &Arc<[ElementSet]> {
        &self.catalog
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn last_report(&self) -> &BatchReport {
        &self.last_report
    }

    /// Propagate the catalog to `target_time` and start interpolating toward it
    pub fn on_tick(&mut self, target_time: Instant) -> &BatchReport {
        let batch = self.propagator.propagate_batch(&self.catalog, target_time);
        self.install(batch);
        &self.last_report
    }

    /// Install a batch propagated elsewhere, e.g. by a
    /// [`PropagationWorker`](crate::propagation::PropagationWorker).
    ///
    /// Returns false when the batch does not line up with the catalog.
    pub fn apply_batch(&mut self, batch: PropagatedBatch) -> bool {
        if batch.samples.len() != self.catalog.len() {
            log::warn!(
                "Ignoring batch of {} samples for a catalog of {}",
                batch.samples.len(),
                self.catalog.len()
            );
            return false;
        }
        self.install(batch);
        true
    }

    fn install(&mut self, batch: PropagatedBatch) {
        let frame = FrameBatch::from_samples(batch.time, &batch.samples);
        self.state.tick(frame);
        self.last_report = batch.report;
    }

    /// Advance the frame clock and return interpolated positions
    pub fn on_frame(&mut self, delta_s: f64) -> FramePositions {
        self.state.advance_frame(delta_s)
    }

    /// Takes effect at the next tick
    pub fn set_tick_period(&mut self, tick_period_s: f64) {
        self.state.set_tick_period(tick_period_s);
    }

    /// Swap the tracked catalog; interpolation restarts on the next tick
    pub fn replace_catalog(&mut self, catalog: Arc<[ElementSet]>) {
        self.catalog = catalog;
        self.state.reset();
        self.last_report = BatchReport::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::element_set::tests::{catalog, ISS};
    use crate::data::parse_element_sets;
    use crate::propagation::model::tests::{CircularModel, FailingModel};
    use crate::propagation::teme_to_scene;
    use satkit::Duration;
    use std::collections::HashSet;

    fn engine_with(propagator: Propagator) -> (TickEngine, Instant) {
        let sets: Arc<[ElementSet]> = parse_element_sets(&catalog()).unwrap().into();
        let epoch = sets[0].elements().epoch();
        (TickEngine::new(sets, propagator, 1.0), epoch)
    }

    #[test]
    fn test_frames_converge_on_tick_target() {
        let propagator = Propagator::with_model(Arc::new(CircularModel));
        let (mut engine, epoch) = engine_with(propagator.clone());

        engine.on_tick(epoch);
        let target_time = epoch + Duration::from_seconds(60.0);
        let report = engine.on_tick(target_time);
        assert_eq!(report.succeeded, 3);

        let expected = propagator.propagate_batch(engine.catalog(), target_time);
        let mut last_distance = f64::INFINITY;
        for _ in 0..10 {
            let frame = engine.on_frame(0.125);
            let p = frame.positions[0].unwrap();
            let target = teme_to_scene(&expected.samples[0].state.unwrap().position_km);
            let distance = (p - target).length();
            assert!(distance <= last_distance);
            last_distance = distance;
        }
        let frame = engine.on_frame(0.0);
        assert_eq!(frame.fraction, 1.0);
        for (got, sample) in frame.positions.iter().zip(&expected.samples) {
            let want = sample.state.map(|s| teme_to_scene(&s.position_km));
            assert_eq!(*got, want);
        }
    }

    #[test]
    fn test_failed_objects_are_skipped() {
        let propagator = Propagator::with_model(Arc::new(FailingModel {
            rejected: HashSet::from([99002]),
        }));
        let (mut engine, epoch) = engine_with(propagator);

        assert_eq!(engine.on_tick(epoch).failed, 1);
        let frame = engine.on_frame(0.5);
        assert_eq!(frame.positions.len(), 3);
        assert!(frame.positions[0].is_some());
        assert!(frame.positions[2].is_none());
    }

    #[test]
    fn test_apply_batch_rejects_mismatched_length() {
        let propagator = Propagator::with_model(Arc::new(CircularModel));
        let (mut engine, epoch) = engine_with(propagator.clone());

        let single = parse_element_sets(ISS).unwrap();
        let wrong = propagator.propagate_batch(&single, epoch);
        assert!(!engine.apply_batch(wrong));
        assert!(engine.state().is_awaiting_first_tick());

        let right = propagator.propagate_batch(engine.catalog(), epoch);
        assert!(engine.apply_batch(right));
        assert!(!engine.state().is_awaiting_first_tick());
    }

    #[test]
    fn test_single_object_engine() {
        let set = parse_element_sets(ISS).unwrap().remove(0);
        let epoch = set.elements().epoch();
        let mut engine = TickEngine::single(set, Propagator::new(), 2.0);

        engine.on_tick(epoch);
        engine.on_tick(epoch + Duration::from_seconds(2.0));
        let frame = engine.on_frame(1.0);
        assert_eq!(frame.positions.len(), 1);
        assert!((frame.fraction - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_tick_period_applies_on_next_tick() {
        let (mut engine, epoch) = engine_with(Propagator::with_model(Arc::new(CircularModel)));
        engine.on_tick(epoch);
        engine.set_tick_period(5.0);
        assert_eq!(engine.state().tick_period_s(), 1.0);
        engine.on_tick(epoch + Duration::from_seconds(1.0));
        assert_eq!(engine.state().tick_period_s(), 5.0);

        engine.replace_catalog(parse_element_sets(ISS).unwrap().into());
        assert!(engine.state().is_awaiting_first_tick());
        assert_eq!(engine.state().tick_period_s(), 5.0);
    }

    #[test]
    fn test_pending_tick_period_survives_catalog_swap() {
        let (mut engine, epoch) = engine_with(Propagator::with_model(Arc::new(CircularModel)));
        engine.on_tick(epoch);
        engine.set_tick_period(2.5);

        engine.replace_catalog(parse_element_sets(ISS).unwrap().into());
        assert_eq!(engine.state().tick_period_s(), 1.0);

        engine.on_tick(epoch + Duration::from_seconds(1.0));
        assert_eq!(engine.state().tick_period_s(), 2.5);
        assert_eq!(engine.on_frame(1.25).fraction, 0.5);
    }
}
