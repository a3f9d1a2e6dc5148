//! ---------------------------------------------------------------------------
//! Software (CPU) frame-buffer surface
//!
//! * Fills a `Vec<u32>` in **0xAARRGGBB** format, row-major.
//! * Opaque colours overwrite; translucent ones blend over what is there.
//! * `resize` re-allocates when the window changes size.
//! ---------------------------------------------------------------------------

use glam::{DVec2, dvec2};
use log::debug;

use crate::{
    renderer::{Surface, clip_segment},
    world::Rgba,
};

/// Pixel format of the frame-buffer (0xAARRGGBB).
pub type Pixel = u32;

#[derive(Clone, Debug, Default)]
pub struct Software {
    scratch: Vec<Pixel>,
    width: usize,
    height: usize,
}

impl Software {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            scratch: vec![0; width * height],
            width,
            height,
        }
    }

    /// (Re)allocate for a new resolution.  Returns true if anything changed.
    pub fn resize(&mut self, width: usize, height: usize) -> bool {
        if width == self.width && height == self.height {
            return false;
        }
        debug!("framebuffer resize {}x{} -> {width}x{height}", self.width, self.height);
        self.width = width;
        self.height = height;
        self.scratch.clear();
        self.scratch.resize(width * height, 0);
        true
    }

    /// Finished frame, ready for `minifb::Window::update_with_buffer`.
    #[inline]
    pub fn pixels(&self) -> &[Pixel] {
        &self.scratch
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Option<Pixel> {
        (x < self.width && y < self.height).then(|| self.scratch[y * self.width + x])
    }

    #[inline]
    fn plot(&mut self, x: i32, y: i32, colour: Rgba) {
        if (0..self.width as i32).contains(&x) && (0..self.height as i32).contains(&y) {
            let idx = y as usize * self.width + x as usize;
            self.scratch[idx] = blend(self.scratch[idx], colour);
        }
    }
}

/// `src` over `dst`, straight alpha.
fn blend(dst: Pixel, src: Rgba) -> Pixel {
    match src.a {
        255 => src.to_argb(),
        0 => dst,
        a => {
            let d = Rgba::from_argb(dst);
            let mix = |s: u8, d: u8| ((s as u32 * a as u32 + d as u32 * (255 - a as u32)) / 255) as u8;
            Rgba::new(mix(src.r, d.r), mix(src.g, d.g), mix(src.b, d.b), 255).to_argb()
        }
    }
}

/*──────────────────────── Surface trait impl ────────────────────────*/
impl Surface for Software {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    /// Integer Bresenham line-drawing algorithm over the on-screen part of
    /// the segment.
    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, colour: Rgba) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let max = dvec2(self.width as f64 - 1.0, self.height as f64 - 1.0);
        let Some((a, b)) = clip_segment(
            dvec2(x1 as f64, y1 as f64),
            dvec2(x2 as f64, y2 as f64),
            DVec2::ZERO,
            max,
        ) else {
            return;
        };
        let (x1, y1) = (a.x.round() as i32, a.y.round() as i32);
        let (x2, y2) = (b.x.round() as i32, b.y.round() as i32);

        let (mut x0, mut y0) = (x1, y1);
        let dx = (x2 - x0).abs();
        let sx = if x0 < x2 { 1 } else { -1 };
        let dy = -(y2 - y0).abs();
        let sy = if y0 < y2 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.plot(x0, y0, colour);
            if x0 == x2 && y0 == y2 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    fn fill_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, colour: Rgba) {
        if !colour.is_visible() || self.width == 0 || self.height == 0 {
            return;
        }
        let (xa, xb) = (x1.min(x2).max(0), x1.max(x2).min(self.width as i32 - 1));
        let (ya, yb) = (y1.min(y2).max(0), y1.max(y2).min(self.height as i32 - 1));
        if xa > xb || ya > yb {
            return;
        }

        let (xa, xb) = (xa as usize, xb as usize);
        for y in ya as usize..=yb as usize {
            let row = &mut self.scratch[y * self.width + xa..=y * self.width + xb];
            if colour.a == 255 {
                row.fill(colour.to_argb());
            } else {
                for px in row {
                    *px = blend(*px, colour);
                }
            }
        }
    }
}

/*──────────────────────────────── Tests ───────────────────────────────*/
