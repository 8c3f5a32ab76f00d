//! Fixed-timestep accumulator
//!
//! Frame-driven hosts (render loops, headless runners) feed wall-clock frame
//! deltas in; the accumulator answers how many fixed simulation ticks to run.

use crate::consts::{MAX_SUBSTEPS, SIM_DT};

/// Converts variable frame time into a bounded number of fixed ticks
#[derive(Debug, Clone, Default)]
pub struct FixedStep {
    accumulator: f32,
}

impl FixedStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a frame's elapsed time and return how many ticks to run now.
    ///
    /// Frame deltas are clamped to 100 ms and at most `MAX_SUBSTEPS` ticks are
    /// released per frame, so a stalled host never triggers a catch-up storm.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.clamp(0.0, 0.1);

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }

    /// Fraction of a tick left in the accumulator (for render interpolation)
    pub fn alpha(&self) -> f32 {
        (self.accumulator / SIM_DT).clamp(0.0, 1.0)
    }
}
