//! Input snapshot → camera motion.
//!
//! The window layer turns raw key state into an [`InputCmd`] once per tic;
//! [`apply_input`] is the only thing that moves the camera.

use std::collections::VecDeque;

use crate::world::Camera;

/// Directional intent for one tic.  Axes are clamped to `[-1, 1]` when
/// applied.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InputCmd {
    pub forward: f64, // +1 ahead, –1 back
    pub strafe: f64,  // +1 right, –1 left
    pub turn: f64,    // +1 clockwise (right), –1 left
    /// Mouse-look steps this tic, signed like `turn`.  Not scaled by time.
    pub look: f64,
    pub run: bool,
}

impl InputCmd {
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.forward == 0.0 && self.strafe == 0.0 && self.turn == 0.0 && self.look == 0.0
    }
}

/// Scaling from intent to motion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveSpeeds {
    /// Map units per second.
    pub walk: f64,
    /// Degrees per second.
    pub turn: f64,
    /// Multiplier while `run` is held.
    pub run_factor: f64,
    /// Degrees per mouse-look step.
    pub look_step: f64,
}

impl Default for MoveSpeeds {
    fn default() -> Self {
        Self {
            walk: 120.0,
            turn: 120.0,
            run_factor: 2.0,
            look_step: 0.5,
        }
    }
}

/// Anything that can be polled for the current input snapshot.
pub trait InputSource {
    fn snapshot(&mut self) -> InputCmd;
}

/// Turns horizontal pointer motion into mouse-look steps: one step per
/// poll in which the pointer moved, in the direction it moved.
#[derive(Clone, Copy, Debug, Default)]
pub struct MouseLook {
    last_x: Option<f32>,
}

impl MouseLook {
    /// Feed the pointer's current x; returns -1, 0 or +1.  The first
    /// sample only primes the tracker.
    pub fn step(&mut self, x: f32) -> f64 {
        let dx = self.last_x.map_or(0.0, |last| x - last);
        self.last_x = Some(x);
        if dx > 0.0 {
            1.0
        } else if dx < 0.0 {
            -1.0
        } else {
            0.0
        }
    }
}

/// Replays a fixed list of commands, then stays idle.
#[derive(Clone, Debug, Default)]
pub struct Scripted {
    queue: VecDeque<InputCmd>,
}

impl Scripted {
    pub fn new(cmds: impl IntoIterator<Item = InputCmd>) -> Self {
        Self {
            queue: cmds.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl InputSource for Scripted {
    fn snapshot(&mut self) -> InputCmd {
        self.queue.pop_front().unwrap_or_default()
    }
}

/// Advance `camera` by `cmd` over `dt` seconds.  Turning happens before
/// translation.
pub fn apply_input(camera: &mut Camera, cmd: InputCmd, dt: f64, speeds: &MoveSpeeds) {
    let turn = cmd.turn.clamp(-1.0, 1.0);
    if turn != 0.0 {
        camera.rotate(turn * speeds.turn * dt);
    }
    if cmd.look != 0.0 {
        camera.rotate(cmd.look * speeds.look_step);
    }

    let speed = if cmd.run {
        speeds.walk * speeds.run_factor
    } else {
        speeds.walk
    };
    let step = speed * dt;

    let forward = cmd.forward.clamp(-1.0, 1.0);
    if forward > 0.0 {
        camera.move_forward(forward * step);
    } else if forward < 0.0 {
        camera.move_backward(-forward * step);
    }

    let strafe = cmd.strafe.clamp(-1.0, 1.0);
    if strafe > 0.0 {
        camera.strafe_right(strafe * step);
    } else if strafe < 0.0 {
        camera.strafe_left(-strafe * step);
    }
}
