mod input;
mod tic;

pub use input::{InputCmd, InputSource, MouseLook, MoveSpeeds, Scripted, apply_input};
pub use tic::{DT, SIM_FPS, TicRunner};
