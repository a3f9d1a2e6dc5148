//! Per-frame driver: walks the BSP (or the whole wall set) and feeds the
//! column compositor.
use log::{debug, warn};

use crate::{
    engine::{
        column::{Backdrop, composite_column},
        raycaster::{Layers, cast_layers, rays},
        types::{DrawMode, Frame, RenderConfig},
    },
    renderer::{Surface, SurfaceExt},
    world::{Camera, Level, SectorId},
};

/// Counters for one rendered frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub mode: DrawMode,
    /// Sectors composited (BSP mode), 1 in direct mode.
    pub sectors: usize,
    pub columns: usize,
    /// Wall layers painted, summed over every column.
    pub layers: usize,
}

/// Owns the render config and per-frame scratch buffers.
#[derive(Debug, Default)]
pub struct Engine {
    pub cfg: RenderConfig,
    draw_order: Vec<SectorId>,
    warned_no_bsp: bool,
}

impl Engine {
    pub fn new(cfg: RenderConfig) -> Self {
        Self {
            cfg,
            ..Self::default()
        }
    }

    /// Mode actually used for `level`: BSP needs a tree.
    pub fn effective_mode(&self, level: &Level) -> DrawMode {
        match (self.cfg.mode, &level.bsp) {
            (DrawMode::Bsp, Some(_)) => DrawMode::Bsp,
            _ => DrawMode::Direct,
        }
    }

    /// Render one frame of `level` seen from `camera` into `surface`.
    pub fn render_frame<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        level: &Level,
        camera: &Camera,
    ) -> FrameStats {
        surface.clear(self.cfg.background);

        let mode = self.effective_mode(level);
        if mode != self.cfg.mode && !self.warned_no_bsp {
            warn!("level `{}` has no BSP tree; drawing in direct mode", level.name);
            self.warned_no_bsp = true;
        }

        let frame = Frame::new(&self.cfg, camera, surface.width(), surface.height());
        let mut stats = FrameStats {
            mode,
            columns: frame.screen.columns,
            ..FrameStats::default()
        };
        let mut layers = Layers::new();

        match (mode, &level.bsp) {
            (DrawMode::Bsp, Some(bsp)) => {
                bsp.fill_draw_order(camera.pos(), &mut self.draw_order);
                for &id in &self.draw_order {
                    let sector = level
                        .sector(id)
                        .expect("validated level: every BSP leaf names a sector");
                    for ray in rays(&frame) {
                        cast_layers(sector.walls(), &frame.view, frame.cfg, ray.angle, &mut layers);
                        stats.layers +=
                            composite_column(surface, &frame, ray.column, &layers, Backdrop::Painted);
                    }
                }
                stats.sectors = self.draw_order.len();
            }
            _ => {
                for ray in rays(&frame) {
                    cast_layers(level.walls(), &frame.view, frame.cfg, ray.angle, &mut layers);
                    stats.layers +=
                        composite_column(surface, &frame, ray.column, &layers, Backdrop::Empty);
                }
                stats.sectors = 1;
            }
        }

        debug!(
            "frame: {:?}, {} sectors, {} columns, {} layers",
            stats.mode, stats.sectors, stats.columns, stats.layers
        );
        stats
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
