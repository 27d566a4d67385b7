//! Interpolation state between two authoritative propagation samples

use glam::DVec3;
use satkit::Instant;

use crate::propagation::{teme_to_scene, PropagationSample};

/// Shortest tick period accepted, seconds
pub const MIN_TICK_PERIOD_S: f64 = 1e-3;

/// Scene positions (km) of every tracked object at one instant
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBatch {
    pub time: Instant,
    /// Catalog order; `None` for unpropagatable objects
    pub positions: Vec<Option<DVec3>>,
}

impl FrameBatch {
    pub fn from_samples(time: Instant, samples: &[PropagationSample]) -> Self {
        Self {
            time,
            positions: samples
                .iter()
                .map(|s| s.state.as_ref().map(|state| teme_to_scene(&state.position_km)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Interpolated positions for one rendered frame
#[derive(Debug, Clone, PartialEq)]
pub struct FramePositions {
    /// Interpolation fraction in `[0, 1]`
    pub fraction: f64,
    /// Catalog order; `None` means skip the object this frame
    pub positions: Vec<Option<DVec3>>,
}

#[derive(Debug, Clone)]
enum Phase {
    AwaitingFirstTick,
    Interpolating {
        start: FrameBatch,
        target: FrameBatch,
    },
}

/// Start/target samples plus the frame clock between coarse ticks.
///
/// `elapsed` stays within `[0, tick_period]`.
#[derive(Debug, Clone)]
pub struct AnimationState {
    phase: Phase,
    elapsed_s: f64,
    tick_period_s: f64,
    pending_tick_period_s: Option<f64>,
}

impl AnimationState {
    pub fn new(tick_period_s: f64) -> Self {
        Self {
            phase: Phase::AwaitingFirstTick,
            elapsed_s: 0.0,
            tick_period_s: sanitize_period(tick_period_s),
            pending_tick_period_s: None,
        }
    }

    pub fn is_awaiting_first_tick(&self) -> bool {
        matches!(self.phase, Phase::AwaitingFirstTick)
    }

    pub fn start(&self) -> Option<&FrameBatch> {
        match &self.phase {
            Phase::AwaitingFirstTick => None,
            Phase::Interpolating { start, .. } => Some(start),
        }
    }

    pub fn target(&self) -> Option<&FrameBatch> {
        match &self.phase {
            Phase::AwaitingFirstTick => None,
            Phase::Interpolating { target, .. } => Some(target),
        }
    }

    pub fn elapsed_s(&self) -> f64 {
        self.elapsed_s
    }

    pub fn tick_period_s(&self) -> f64 {
        self.tick_period_s
    }

    /// Change the tick period from the next tick boundary on.
    ///
    /// An in-flight interpolation keeps its current period.
    pub fn set_tick_period(&mut self, tick_period_s: f64) {
        self.pending_tick_period_s = Some(sanitize_period(tick_period_s));
    }

    /// `clamp(elapsed / tick_period, 0, 1)`
    pub fn fraction(&self) -> f64 {
        (self.elapsed_s / self.tick_period_s).clamp(0.0, 1.0)
    }

    /// Coarse tick: the previous target becomes the start, `next` the target.
    ///
    /// On the very first tick start and target are the same batch so the
    /// first frame shows no motion.
    pub fn tick(&mut self, next: FrameBatch) {
        let phase = std::mem::replace(&mut self.phase, Phase::AwaitingFirstTick);
        self.phase = match phase {
            Phase::AwaitingFirstTick => Phase::Interpolating {
                start: next.clone(),
                target: next,
            },
            Phase::Interpolating { target, .. } => Phase::Interpolating {
                start: target,
                target: next,
            },
        };
        self.elapsed_s = 0.0;
        if let Some(period) = self.pending_tick_period_s.take() {
            log::debug!("Tick period now {}s", period);
            self.tick_period_s = period;
        }
    }

    /// Drop both samples and wait for a new first tick.
    ///
    /// The tick period, including one still pending, carries over.
    pub fn reset(&mut self) {
        self.phase = Phase::AwaitingFirstTick;
        self.elapsed_s = 0.0;
    }

    /// Accumulate frame time; no-op once the target has been reached
    pub fn advance(&mut self, delta_s: f64) {
        if self.is_awaiting_first_tick() || self.elapsed_s >= self.tick_period_s {
            return;
        }
        let delta_s = if delta_s.is_finite() { delta_s.max(0.0) } else { 0.0 };
        self.elapsed_s = (self.elapsed_s + delta_s).min(self.tick_period_s);
    }

    /// Advance by `delta_s`, then compute the frame
    pub fn advance_frame(&mut self, delta_s: f64) -> FramePositions {
        self.advance(delta_s);
        compute_frame_positions(self)
    }
}

fn sanitize_period(tick_period_s: f64) -> f64 {
    if tick_period_s.is_finite() {
        tick_period_s.max(MIN_TICK_PERIOD_S)
    } else {
        MIN_TICK_PERIOD_S
    }
}

/// Component-wise linear interpolation, exact at both ends
pub fn lerp(start: DVec3, target: DVec3, t: f64) -> DVec3 {
    if t <= 0.0 {
        start
    } else if t >= 1.0 {
        target
    } else {
        start + (target - start) * t
    }
}

/// Per-object positions for the current interpolation fraction.
///
/// Objects without a target sample are skipped; where only the start is
/// missing the object appears directly at its target.
pub fn compute_frame_positions(state: &AnimationState) -> FramePositions {
    let fraction = state.fraction();
    let positions = match &state.phase {
        Phase::AwaitingFirstTick => Vec::new(),
        Phase::Interpolating { start, target } => start
            .positions
            .iter()
            .zip(&target.positions)
            .map(|(start, target)| match (start, target) {
                (Some(s), Some(t)) => Some(lerp(*s, *t, fraction)),
                (None, Some(t)) => Some(*t),
                (_, None) => None,
            })
            .collect(),
    };

    FramePositions {
        fraction,
        positions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(seconds: f64, positions: Vec<Option<DVec3>>) -> FrameBatch {
        FrameBatch {
            time: Instant::from_unixtime(1_700_000_000.0 + seconds),
            positions,
        }
    }

    fn two_tick_state(period: f64) -> AnimationState {
        let mut state = AnimationState::new(period);
        state.tick(batch(0.0, vec![Some(DVec3::new(0.0, 0.0, 0.0))]));
        state.tick(batch(1.0, vec![Some(DVec3::new(10.0, -20.0, 30.0))]));
        state
    }

    #[test]
    fn test_first_tick_shows_no_motion() {
        let mut state = AnimationState::new(1.0);
        assert!(state.is_awaiting_first_tick());
        assert!(state.advance_frame(0.5).positions.is_empty());

        let first = batch(0.0, vec![Some(DVec3::new(7000.0, 0.0, 0.0))]);
        state.tick(first.clone());
        assert_eq!(state.start(), Some(&first));
        assert_eq!(state.target(), Some(&first));

        let frame = state.advance_frame(0.5);
        assert_eq!(frame.positions, vec![Some(DVec3::new(7000.0, 0.0, 0.0))]);
    }

    #[test]
    fn test_interpolation_endpoints_and_midpoint() {
        let mut state = two_tick_state(2.0);

        let at_start = compute_frame_positions(&state);
        assert_eq!(at_start.fraction, 0.0);
        assert_eq!(at_start.positions[0], Some(DVec3::ZERO));

        let mid = state.advance_frame(1.0);
        let p = mid.positions[0].unwrap();
        assert!((p - DVec3::new(5.0, -10.0, 15.0)).length() < 1e-12);

        let end = state.advance_frame(5.0);
        assert_eq!(end.fraction, 1.0);
        assert_eq!(end.positions[0], Some(DVec3::new(10.0, -20.0, 30.0)));
        assert_eq!(state.elapsed_s(), 2.0);
    }

    #[test]
    fn test_advance_is_noop_at_target() {
        let mut state = two_tick_state(1.0);
        state.advance(1.0);
        assert_eq!(state.elapsed_s(), 1.0);
        state.advance(0.25);
        assert_eq!(state.elapsed_s(), 1.0);
    }

    #[test]
    fn test_tick_resets_for_any_prior_fraction() {
        for advanced in [0.0, 0.3, 0.5, 0.99, 1.0, 4.0] {
            let mut state = two_tick_state(1.0);
            state.advance(advanced);
            let previous_target = state.target().cloned();

            let next = batch(2.0, vec![Some(DVec3::new(-1.0, 2.0, -3.0))]);
            state.tick(next.clone());
            assert_eq!(state.start().cloned(), previous_target);
            assert_eq!(state.target(), Some(&next));
            assert_eq!(state.elapsed_s(), 0.0);
        }
    }

    #[test]
    fn test_negative_and_nan_deltas_are_ignored() {
        let mut state = two_tick_state(1.0);
        state.advance(-0.5);
        state.advance(f64::NAN);
        assert_eq!(state.elapsed_s(), 0.0);
    }

    #[test]
    fn test_tick_period_change_waits_for_boundary() {
        let mut state = two_tick_state(1.0);
        state.advance(0.5);
        state.set_tick_period(4.0);
        assert_eq!(state.tick_period_s(), 1.0);
        assert_eq!(state.fraction(), 0.5);

        state.tick(batch(2.0, vec![Some(DVec3::ONE)]));
        assert_eq!(state.tick_period_s(), 4.0);
        state.advance(1.0);
        assert_eq!(state.fraction(), 0.25);
    }

    #[test]
    fn test_unpropagatable_objects() {
        let mut state = AnimationState::new(1.0);
        state.tick(batch(0.0, vec![None, Some(DVec3::X), Some(DVec3::Y)]));
        state.tick(batch(1.0, vec![Some(DVec3::Z), None, Some(DVec3::ZERO)]));

        let frame = state.advance_frame(0.5);
        assert_eq!(frame.positions[0], Some(DVec3::Z));
        assert_eq!(frame.positions[1], None);
        assert_eq!(frame.positions[2], Some(DVec3::new(0.0, 0.5, 0.0)));
    }

    #[test]
    fn test_reset_keeps_pending_tick_period() {
        let mut state = two_tick_state(1.0);
        state.advance(0.5);
        state.set_tick_period(3.0);
        state.reset();
        assert!(state.is_awaiting_first_tick());
        assert_eq!(state.elapsed_s(), 0.0);
        assert_eq!(state.tick_period_s(), 1.0);

        state.tick(batch(5.0, vec![Some(DVec3::X)]));
        assert_eq!(state.tick_period_s(), 3.0);
    }

    #[test]
    fn test_degenerate_tick_period() {
        let state = AnimationState::new(0.0);
        assert_eq!(state.tick_period_s(), MIN_TICK_PERIOD_S);
        assert_eq!(AnimationState::new(f64::NAN).tick_period_s(), MIN_TICK_PERIOD_S);
    }
}
