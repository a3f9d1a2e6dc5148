use glam::DVec2;

use crate::world::{Camera, Rgba};

/// Which traversal feeds the column compositor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrawMode {
    /// Walk the BSP back-to-front and composite each sector on its own.
    #[default]
    Bsp,
    /// Cast every column against every wall of the level at once.
    Direct,
}

/// Every tunable of the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Horizontal field of view, degrees.
    pub fov: f64,
    /// Rays per frame; each ray owns `width / columns` pixels.
    pub columns: usize,
    /// Projected height constant is `wall_scale × screen height`.
    pub wall_scale: f64,
    /// Distances are clamped to at least this before projecting.
    pub min_distance: f64,
    /// Slack (map units) when checking a hit lies on its wall.
    pub segment_tolerance: f64,
    /// Maximum azimuth drift (degrees) for a hit to count as ahead.
    pub heading_tolerance: f64,
    pub floor: Rgba,
    pub ceiling: Rgba,
    pub background: Rgba,
    /// Colour offset applied to the floor/ceiling half adjacent to a wall.
    pub shade_offset: i16,
    pub mode: DrawMode,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fov: 60.0,
            columns: 256,
            wall_scale: 20.0,
            min_distance: 1e-3,
            segment_tolerance: 0.5,
            heading_tolerance: 10.0,
            floor: Rgba::opaque(90, 70, 50),
            ceiling: Rgba::opaque(60, 60, 90),
            background: Rgba::BLACK,
            shade_offset: -30,
            mode: DrawMode::Bsp,
        }
    }
}

/// Constants that depend on the *surface*, not on the map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Screen {
    pub w: usize,
    pub h: usize,
    pub half_h: f64, // horizon row
    pub columns: usize,
}

impl Screen {
    pub fn new(w: usize, h: usize, columns: usize) -> Self {
        Self {
            w,
            h,
            half_h: h as f64 * 0.5,
            columns: columns.clamp(1, w.max(1)),
        }
    }

    /// Pixel range `[x0, x1)` covered by ray `column`.
    #[inline]
    pub fn column_span(&self, column: usize) -> (i32, i32) {
        let x0 = column * self.w / self.columns;
        let x1 = (column + 1) * self.w / self.columns;
        (x0 as i32, x1 as i32)
    }
}

/// Camera state reused by every column of a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewer {
    pub origin: DVec2,
    pub direction: f64,
    /// Projected height constant `K`.
    pub scale: f64,
}

impl Viewer {
    pub fn new(camera: &Camera, screen: &Screen, cfg: &RenderConfig) -> Self {
        Self {
            origin: camera.pos(),
            direction: camera.direction(),
            scale: cfg.wall_scale * screen.h as f64,
        }
    }
}

/// Explicit render context handed through a frame.
#[derive(Clone, Copy, Debug)]
pub struct Frame<'a> {
    pub cfg: &'a RenderConfig,
    pub screen: Screen,
    pub view: Viewer,
}

impl<'a> Frame<'a> {
    pub fn new(cfg: &'a RenderConfig, camera: &Camera, w: usize, h: usize) -> Self {
        let screen = Screen::new(w, h, cfg.columns);
        Self {
            cfg,
            screen,
            view: Viewer::new(camera, &screen, cfg),
        }
    }
}
