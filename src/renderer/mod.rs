//! Drawing-surface abstraction layer.
//!
//! *The engine never touches a pixel buffer directly.*
//! It issues line and rectangle calls against a type implementing
//! [`Surface`]; windowing, presentation and pixel formats live behind it.
//!
//! * [`Software`] rasterises into a 0xAARRGGBB frame-buffer.
//! * [`Recorder`] keeps the calls as a list of [`DrawCall`]s (headless
//!   rendering, tests) that can be [`replay`]ed onto any other surface.
//! * The blanket [`SurfaceExt`] adds column helpers so call-sites stay short.

use glam::DVec2;

use crate::world::Rgba;

mod software;

pub use software::Software;

/// A 2-D target the renderer draws into.  All corners are inclusive pixel
/// coordinates; implementations clip to their own bounds.
pub trait Surface {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, colour: Rgba);

    fn fill_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, colour: Rgba);
}

/// Convenience blanket-impl used by the column compositor.
pub trait SurfaceExt: Surface {
    /// Fill the whole surface.
    fn clear(&mut self, colour: Rgba) {
        let (w, h) = (self.width() as i32, self.height() as i32);
        self.fill_rect(0, 0, w - 1, h - 1, colour);
    }

    /// Paint screen columns `x0 .. x1` between the fractional rows
    /// `y_top .. y_bot`.  Empty or fully transparent spans are skipped.
    fn fill_span(&mut self, x0: i32, x1: i32, y_top: f64, y_bot: f64, colour: Rgba) {
        if !colour.is_visible() || x1 <= x0 {
            return;
        }
        let y0 = y_top.round().max(0.0);
        let y1 = y_bot.round().min(self.height() as f64);
        if y1 <= y0 {
            return;
        }
        self.fill_rect(x0, y0 as i32, x1 - 1, y1 as i32 - 1, colour);
    }
}
impl<T: Surface + ?Sized> SurfaceExt for T {}

/// Liang-Barsky clip: the part of segment `a`-`b` inside the box
/// `[min, max]`, or `None` when the segment misses it.
pub fn clip_segment(a: DVec2, b: DVec2, min: DVec2, max: DVec2) -> Option<(DVec2, DVec2)> {
    let d = b - a;
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [
        (-d.x, a.x - min.x),
        (d.x, max.x - a.x),
        (-d.y, a.y - min.y),
        (d.y, max.y - a.y),
    ] {
        if p == 0.0 {
            // parallel to this edge
            if q < 0.0 {
                return None;
            }
        } else if p < 0.0 {
            t0 = t0.max(q / p);
        } else {
            t1 = t1.min(q / p);
        }
    }
    (t0 <= t1).then(|| (a + d * t0, a + d * t1))
}

/// One recorded drawing primitive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawCall {
    Line {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        colour: Rgba,
    },
    Rect {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        colour: Rgba,
    },
}

/// Surface that records instead of rasterising.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    pub width: usize,
    pub height: usize,
    pub calls: Vec<DrawCall>,
}

impl Recorder {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            calls: Vec::new(),
        }
    }

    /// Rectangles that touch column `x`, in draw order.
    pub fn rects_at_column(&self, x: i32) -> impl Iterator<Item = &DrawCall> + '_ {
        self.calls.iter().filter(move |c| match **c {
            DrawCall::Rect { x1, x2, .. } => x1 <= x && x <= x2,
            DrawCall::Line { .. } => false,
        })
    }

    /// Colour the last rectangle drawn over pixel `(x, y)` left behind.
    pub fn colour_at(&self, x: i32, y: i32) -> Option<Rgba> {
        self.calls.iter().rev().find_map(|c| match *c {
            DrawCall::Rect {
                x1,
                y1,
                x2,
                y2,
                colour,
            } if x1 <= x && x <= x2 && y1 <= y && y <= y2 => Some(colour),
            _ => None,
        })
    }
}

impl Surface for Recorder {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, colour: Rgba) {
        self.calls.push(DrawCall::Line {
            x1,
            y1,
            x2,
            y2,
            colour,
        });
    }

    fn fill_rect(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, colour: Rgba) {
        self.calls.push(DrawCall::Rect {
            x1,
            y1,
            x2,
            y2,
            colour,
        });
    }
}

/// Forward recorded calls to `target` in order.
pub fn replay<S: Surface + ?Sized>(calls: &[DrawCall], target: &mut S) {
    for c in calls {
        match *c {
            DrawCall::Line {
                x1,
                y1,
                x2,
                y2,
                colour,
            } => target.draw_line(x1, y1, x2, y2, colour),
            DrawCall::Rect {
                x1,
                y1,
                x2,
                y2,
                colour,
            } => target.fill_rect(x1, y1, x2, y2, colour),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    #[test]
    fn clip_keeps_the_inside_part() {
        let (min, max) = (DVec2::ZERO, dvec2(10.0, 10.0));
        let inside = (dvec2(1.0, 2.0), dvec2(8.0, 9.0));
        assert_eq!(clip_segment(inside.0, inside.1, min, max), Some(inside));

        let (a, b) = clip_segment(dvec2(-10.0, 5.0), dvec2(30.0, 5.0), min, max).unwrap();
        assert_eq!((a, b), (dvec2(0.0, 5.0), dvec2(10.0, 5.0)));

        let (a, b) = clip_segment(dvec2(-5.0, -5.0), dvec2(5.0, 5.0), min, max).unwrap();
        assert!(a.abs_diff_eq(DVec2::ZERO, 1e-12));
        assert_eq!(b, dvec2(5.0, 5.0));

        assert_eq!(clip_segment(dvec2(-5.0, 11.0), dvec2(20.0, 11.0), min, max), None);
        assert_eq!(clip_segment(dvec2(-5.0, 0.0), dvec2(0.0, -5.0), min, max), None);
    }

    #[test]
    fn fill_span_rounds_and_clips() {
        let mut rec = Recorder::new(8, 10);
        rec.fill_span(2, 4, -3.2, 4.6, Rgba::WHITE);
        assert_eq!(
            rec.calls,
            vec![DrawCall::Rect {
                x1: 2,
                y1: 0,
                x2: 3,
                y2: 4,
                colour: Rgba::WHITE
            }]
        );

        rec.calls.clear();
        rec.fill_span(2, 4, 8.0, 30.0, Rgba::WHITE);
        assert!(matches!(rec.calls[0], DrawCall::Rect { y1: 8, y2: 9, .. }));
    }

    #[test]
    fn fill_span_skips_empty_and_invisible() {
        let mut rec = Recorder::new(8, 10);
        rec.fill_span(2, 4, 5.0, 5.2, Rgba::WHITE);
        rec.fill_span(2, 4, 1.0, 9.0, Rgba::TRANSPARENT);
        rec.fill_span(4, 4, 1.0, 9.0, Rgba::WHITE);
        rec.fill_span(0, 1, 12.0, 20.0, Rgba::WHITE);
        assert!(rec.calls.is_empty());
    }

    #[test]
    fn colour_at_reports_topmost() {
        let mut rec = Recorder::new(4, 4);
        rec.clear(Rgba::BLACK);
        rec.fill_rect(1, 1, 2, 2, Rgba::WHITE);
        assert_eq!(rec.colour_at(1, 2), Some(Rgba::WHITE));
        assert_eq!(rec.colour_at(3, 3), Some(Rgba::BLACK));
        assert_eq!(rec.colour_at(9, 9), None);
        assert_eq!(rec.rects_at_column(1).count(), 2);
    }

    #[test]
    fn replay_forwards_in_order() {
        let mut rec = Recorder::new(4, 4);
        rec.draw_line(0, 0, 3, 3, Rgba::WHITE);
        rec.fill_rect(0, 0, 1, 1, Rgba::BLACK);
        let mut copy = Recorder::new(4, 4);
        replay(&rec.calls, &mut copy);
        assert_eq!(copy.calls, rec.calls);
    }
}
