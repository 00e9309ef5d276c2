/// Maximum fixed steps taken for one host frame.
const MAX_STEPS_PER_FRAME: u32 = 8;

/// Fixed timestep accumulator driving auto-stepped spaces.
/// Frame deltas of any size turn into whole steps of `dt`.
#[derive(Debug, Clone)]
pub struct StepClock {
    dt: f32,
    accumulator: f32,
}

impl StepClock {
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            accumulator: 0.0,
        }
    }

    /// Feed one frame's elapsed time. Returns how many fixed steps to run.
    /// Bad deltas (negative, NaN, infinite) count as no time passing.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if !frame_dt.is_finite() || frame_dt <= 0.0 {
            return 0;
        }
        // Cap the backlog after a stall.
        self.accumulator = (self.accumulator + frame_dt).min(self.dt * MAX_STEPS_PER_FRAME as f32);
        let steps = (self.accumulator / self.dt) as u32;
        self.accumulator -= steps as f32 * self.dt;
        steps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_frame_one_step() {
        let mut clock = StepClock::new(0.25);
        assert_eq!(clock.advance(0.25), 1);
    }

    #[test]
    fn partial_frames_accumulate() {
        let mut clock = StepClock::new(1.0 / 60.0);
        assert_eq!(clock.advance(0.008), 0);
        assert_eq!(clock.advance(0.010), 1);
    }

    #[test]
    fn long_stall_is_capped() {
        let mut clock = StepClock::new(1.0 / 60.0);
        assert_eq!(clock.advance(2.0), MAX_STEPS_PER_FRAME);
    }

    #[test]
    fn bad_deltas_are_ignored() {
        let mut clock = StepClock::new(0.5);
        assert_eq!(clock.advance(f32::NAN), 0);
        assert_eq!(clock.advance(-1.0), 0);
        assert_eq!(clock.advance(0.5), 1);

        clock.advance(0.3);
        clock.reset();
        assert_eq!(clock.advance(0.3), 0);
        assert_eq!(clock.dt(), 0.5);
    }
}
