//! ----------------------------------------------------------------------------
//! **Column compositor**
//!
//! Turns the (at most two) hits of one ray into vertical spans:
//!
//! ```text
//!   0 ┌──────────┐
//!     │ ceiling  │  plain, then shaded next to the wall
//! top ├──────────┤
//!     │ top band │  only when ceiling height ≠ 0
//!     ├──────────┤ mid_top
//!     │  middle  │  only when its alpha ≠ 0
//!     ├──────────┤ mid_bottom
//!     │ bottom   │  only when floor height ≠ 0
//! bot ├──────────┤
//!     │  floor   │  shaded next to the wall, then plain
//!   h └──────────┘
//! ```
//!
//! Painting is back to front.  When the near wall's middle band is open the
//! far layer goes first, clipped to the near wall's opening, and the near
//! layer is painted over it.
//! ----------------------------------------------------------------------------

use crate::{
    engine::{
        raycaster::Hit,
        types::{Frame, RenderConfig},
    },
    renderer::{Surface, SurfaceExt},
    world::{Rgba, Wall},
};

/// What already sits behind the walls handed to the compositor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backdrop {
    /// Farther sectors were painted first; open gaps are left untouched.
    Painted,
    /// Nothing behind: floor and ceiling close any open gap.
    Empty,
}

/// Screen rows of one wall hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extents {
    pub top: f64,
    pub bottom: f64,
    pub mid_top: f64,
    pub mid_bottom: f64,
    /// Floor height (percent) at the hit point.
    pub floor: f64,
    /// Ceiling height (percent) at the hit point.
    pub ceiling: f64,
}

impl Extents {
    pub fn of(hit: &Hit<'_>, horizon: f64) -> Self {
        let h = hit.height;
        let t = hit.wall_fraction();
        let floor = hit.wall.floor_at(t);
        let ceiling = hit.wall.ceiling_at(t);

        let top = horizon - h * 0.5;
        let bottom = horizon + h * 0.5;
        let mut mid_top = top + h * ceiling / 100.0;
        let mut mid_bottom = bottom - h * floor / 100.0;
        // steps taller than the wall meet in the middle instead of crossing
        if mid_top > mid_bottom {
            let m = (mid_top + mid_bottom) * 0.5;
            mid_top = m;
            mid_bottom = m;
        }

        Self {
            top,
            bottom,
            mid_top,
            mid_bottom,
            floor,
            ceiling,
        }
    }

    /// Lowest row the ceiling fill reaches.
    #[inline]
    pub fn ceiling_edge(&self) -> f64 {
        self.top.min(self.mid_top)
    }

    /// Highest row the floor fill starts at.
    #[inline]
    pub fn floor_edge(&self) -> f64 {
        self.bottom.max(self.mid_bottom)
    }
}

/// Rows `[top, bottom)` a layer may paint.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Window {
    top: f64,
    bottom: f64,
}

impl Window {
    #[inline]
    fn clip(self, a: f64, b: f64) -> (f64, f64) {
        (a.max(self.top), b.min(self.bottom))
    }
}

/// Span emitter bound to one column's pixel range.
struct Painter<'s, S: Surface + ?Sized> {
    surface: &'s mut S,
    cfg: &'s RenderConfig,
    x0: i32,
    x1: i32,
}

impl<S: Surface + ?Sized> Painter<'_, S> {
    #[inline]
    fn span(&mut self, win: Window, a: f64, b: f64, colour: Rgba) {
        let (a, b) = win.clip(a.min(b), a.max(b));
        self.surface.fill_span(self.x0, self.x1, a, b, colour);
    }

    /// Ceiling `[win.top, edge)`: plain far half, shaded half next to the wall.
    fn ceiling(&mut self, win: Window, edge: f64) {
        let (a, b) = win.clip(win.top, edge);
        if b <= a {
            return;
        }
        let mid = (a + b) * 0.5;
        let c = self.cfg.ceiling;
        self.span(win, a, mid, c);
        self.span(win, mid, b, c.shaded(self.cfg.shade_offset));
    }

    /// Floor `[edge, win.bottom)`: shaded half next to the wall, then plain.
    fn floor(&mut self, win: Window, edge: f64) {
        let (a, b) = win.clip(edge, win.bottom);
        if b <= a {
            return;
        }
        let mid = (a + b) * 0.5;
        let c = self.cfg.floor;
        self.span(win, a, mid, c.shaded(self.cfg.shade_offset));
        self.span(win, mid, b, c);
    }

    fn layer(&mut self, wall: &Wall, ext: &Extents, win: Window, backdrop: Backdrop) {
        let (ceil_edge, floor_edge) = if wall.is_open() && backdrop == Backdrop::Empty {
            let gap = (ext.mid_top + ext.mid_bottom) * 0.5;
            (gap, gap)
        } else {
            (ext.ceiling_edge(), ext.floor_edge())
        };
        self.ceiling(win, ceil_edge);
        self.floor(win, floor_edge);

        if wall.middle.is_visible() {
            self.span(win, ext.mid_top, ext.mid_bottom, wall.middle);
        }
        if ext.ceiling != 0.0 {
            self.span(win, ext.top, ext.mid_top, wall.top);
        }
        if ext.floor != 0.0 {
            self.span(win, ext.mid_bottom, ext.bottom, wall.bottom);
        }
    }
}

/// Paint `layers` (nearest first, as produced by `cast_layers`) into ray
/// `column`.  Returns how many layers were painted.
pub fn composite_column<S: Surface + ?Sized>(
    surface: &mut S,
    frame: &Frame<'_>,
    column: usize,
    layers: &[Hit<'_>],
    backdrop: Backdrop,
) -> usize {
    let Some(near) = layers.first() else {
        return 0;
    };
    let (x0, x1) = frame.screen.column_span(column);
    let mut painter = Painter {
        surface,
        cfg: frame.cfg,
        x0,
        x1,
    };
    let horizon = frame.screen.half_h;
    let full = Window {
        top: 0.0,
        bottom: frame.screen.h as f64,
    };
    let near_ext = Extents::of(near, horizon);

    let mut painted = 0;
    let mut behind = backdrop;
    if near.wall.is_open() {
        if let Some(far) = layers.get(1) {
            let opening = Window {
                top: near_ext.mid_top.max(0.0),
                bottom: near_ext.mid_bottom.min(full.bottom),
            };
            painter.layer(far.wall, &Extents::of(far, horizon), opening, backdrop);
            painted += 1;
            behind = Backdrop::Painted;
        }
    }
    painter.layer(near.wall, &near_ext, full, behind);
    painted + 1
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
