pub mod bsp;
pub mod camera;
pub mod geometry;
mod level;
mod sector;

pub use bsp::{Branch, BspError, BspNode, BspTree, NodeId, SectorId, Side};
pub use camera::Camera;
pub use geometry::{Gradient, Segment};
pub use level::{Bounds, Level, LevelError};
pub use sector::{LEGACY_SLOPE_RED, Rgba, Sector, SectorError, Wall, WallFlags};
