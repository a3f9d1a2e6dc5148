use std::time::{Duration, Instant};

use crate::{
    sim::input::{InputSource, MoveSpeeds, apply_input},
    world::Camera,
};

pub const SIM_FPS: u32 = 35;
pub const DT: f64 = 1.0 / SIM_FPS as f64;
const TIC: Duration = Duration::from_micros(1_000_000 / SIM_FPS as u64);

/// Fixed-rate camera update, decoupled from the frame rate.
#[derive(Clone, Debug)]
pub struct TicRunner {
    last: Instant,
    pub speeds: MoveSpeeds,
}

impl Default for TicRunner {
    fn default() -> Self {
        Self::new(MoveSpeeds::default())
    }
}

impl TicRunner {
    pub fn new(speeds: MoveSpeeds) -> Self {
        Self {
            last: Instant::now(),
            speeds,
        }
    }

    /// Run every tic that is due by now.  Returns how many ran.
    pub fn pump(&mut self, input: &mut impl InputSource, camera: &mut Camera) -> u32 {
        self.pump_until(Instant::now(), input, camera)
    }

    /// Same as [`TicRunner::pump`] with an explicit clock.
    pub fn pump_until(
        &mut self,
        now: Instant,
        input: &mut impl InputSource,
        camera: &mut Camera,
    ) -> u32 {
        let mut ran = 0;
        while now.saturating_duration_since(self.last) >= TIC {
            self.tick(input, camera);
            self.last += TIC;
            ran += 1;
        }
        ran
    }

    /// One fixed-rate tic: poll input once, move the camera.
    fn tick(&self, input: &mut impl InputSource, camera: &mut Camera) {
        let cmd = input.snapshot();
        apply_input(camera, cmd, DT, &self.speeds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{InputCmd, Scripted};

    #[test]
    fn pump_runs_one_tic_per_period() {
        let mut runner = TicRunner::default();
        let start = runner.last;
        let ahead = InputCmd {
            forward: 1.0,
            ..InputCmd::default()
        };
        let mut src = Scripted::new([ahead; 3]);
        let mut cam = Camera::new(0.0, 0.0, 0.0);

        assert_eq!(runner.pump_until(start, &mut src, &mut cam), 0);
        assert_eq!(runner.pump_until(start + TIC * 3, &mut src, &mut cam), 3);
        assert_eq!(src.remaining(), 0);
        let expected = runner.speeds.walk * DT * 3.0;
        assert!((cam.pos().x - expected).abs() < 1e-9);
    }
}
