pub mod column;
pub mod overhead;
pub mod pipeline;
pub mod raycaster;
pub mod types;

pub use column::{Backdrop, Extents, composite_column};
pub use overhead::{MapView, OverheadStyle, draw_overhead};
pub use pipeline::{Engine, FrameStats};
pub use raycaster::{Hit, Layers, Ray, cast_layers, cast_ray};
pub use types::{DrawMode, Frame, RenderConfig, Screen, Viewer};
