//! Frame interpolation between coarse propagation ticks

mod engine;
mod state;

pub use engine::TickEngine;
pub use state::{
    compute_frame_positions, lerp, AnimationState, FrameBatch, FramePositions, MIN_TICK_PERIOD_S,
};
