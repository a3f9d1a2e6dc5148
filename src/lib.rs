pub mod engine;
pub mod map;
pub mod renderer;
pub mod sim;
pub mod world;
