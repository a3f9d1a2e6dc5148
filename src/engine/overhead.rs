//! Top-down map view: every wall, the viewer as a marker with a heading
//! arrow, and optionally the fan of rays the 3-D view casts.
use glam::{DVec2, dvec2};

use crate::{
    engine::{
        raycaster::{cast_ray, rays},
        types::{Frame, RenderConfig},
    },
    renderer::{Surface, SurfaceExt, clip_segment},
    world::{Bounds, Camera, Level, Rgba, SectorId, geometry::polar},
};

/// Colours and sizes of the map overlay.  Sizes are screen pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct OverheadStyle {
    pub background: Rgba,
    pub wall: Rgba,
    /// Walls of the sector the camera stands in.
    pub current_sector: Rgba,
    pub marker: Rgba,
    pub ray: Rgba,
    pub show_rays: bool,
    pub marker_radius: f64,
    pub arrow_len: f64,
    pub barb_len: f64,
    /// Barb angle either side of the shaft, degrees.
    pub barb_spread: f64,
}

impl Default for OverheadStyle {
    fn default() -> Self {
        Self {
            background: Rgba::BLACK,
            wall: Rgba::WHITE,
            current_sector: Rgba::opaque(255, 128, 0),
            marker: Rgba::opaque(0, 255, 0),
            ray: Rgba::new(255, 255, 0, 50),
            show_rays: false,
            marker_radius: 4.0,
            arrow_len: 20.0,
            barb_len: 14.0,
            barb_spread: 30.0,
        }
    }
}

/// Uniform map → screen fit with a 10 % margin.  Map and screen are both
/// y-down, so no axis flip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapView {
    min: DVec2,
    scale: f64,
    offset: DVec2,
}

impl MapView {
    pub fn fit(bounds: Bounds, w: usize, h: usize) -> Self {
        let size = (bounds.max - bounds.min).max(DVec2::ONE);
        let scale = (w as f64 / size.x).min(h as f64 / size.y) * 0.9;
        let offset = (dvec2(w as f64, h as f64) - size * scale) * 0.5;
        Self {
            min: bounds.min,
            scale,
            offset,
        }
    }

    #[inline]
    pub fn scale(&self) -> f64 {
        self.scale
    }

    #[inline]
    pub fn to_screen_f(&self, p: DVec2) -> DVec2 {
        (p - self.min) * self.scale + self.offset
    }

    #[inline]
    pub fn to_screen(&self, p: DVec2) -> (i32, i32) {
        let s = self.to_screen_f(p).round();
        (s.x as i32, s.y as i32)
    }
}

/// Map lines can end far off-screen once the camera wanders; only the
/// visible part reaches the surface.
fn line<S: Surface + ?Sized>(surface: &mut S, a: DVec2, b: DVec2, colour: Rgba) {
    let max = dvec2(surface.width() as f64, surface.height() as f64);
    let Some((a, b)) = clip_segment(a, b, DVec2::NEG_ONE, max) else {
        return;
    };
    let (a, b) = (a.round(), b.round());
    surface.draw_line(a.x as i32, a.y as i32, b.x as i32, b.y as i32, colour);
}

/// Draw the overhead map of `level`.  Does nothing for a level without
/// walls beyond clearing the surface.
pub fn draw_overhead<S: Surface + ?Sized>(
    surface: &mut S,
    level: &Level,
    camera: &Camera,
    cfg: &RenderConfig,
    style: &OverheadStyle,
) {
    surface.clear(style.background);
    let Some(bounds) = level.bounds() else {
        return;
    };
    let (w, h) = (surface.width(), surface.height());
    let view = MapView::fit(bounds, w, h);

    // walls, the camera's own sector on top
    let here = level.bsp.as_ref().and_then(|t| t.locate(camera.pos()));
    for (id, sector) in level.sectors.iter().enumerate() {
        if here == Some(id as SectorId) {
            continue;
        }
        for wall in sector.walls() {
            line(surface, view.to_screen_f(wall.line.a), view.to_screen_f(wall.line.b), style.wall);
        }
    }
    if let Some(sector) = here.and_then(|id| level.sector(id)) {
        for wall in sector.walls() {
            line(
                surface,
                view.to_screen_f(wall.line.a),
                view.to_screen_f(wall.line.b),
                style.current_sector,
            );
        }
    }

    let eye = view.to_screen_f(camera.pos());
    if style.show_rays {
        let frame = Frame::new(cfg, camera, w, h);
        for ray in rays(&frame) {
            if let Some(hit) = cast_ray(level.walls(), &frame.view, cfg, ray.angle) {
                line(surface, eye, view.to_screen_f(hit.point), style.ray);
            }
        }
    }

    // marker: circle outline, shaft and two barbs
    let dir = camera.direction();
    let r = style.marker_radius;
    let steps = 12;
    for i in 0..steps {
        let a0 = i as f64 * 360.0 / steps as f64;
        let a1 = (i + 1) as f64 * 360.0 / steps as f64;
        line(surface, polar(eye, a0, r), polar(eye, a1, r), style.marker);
    }
    let tip = polar(eye, dir, style.arrow_len);
    line(surface, eye, tip, style.marker);
    for spread in [-style.barb_spread, style.barb_spread] {
        line(surface, tip, polar(tip, dir + 180.0 + spread, style.barb_len), style.marker);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::{DrawCall, Recorder};

    fn lines_with(rec: &Recorder, colour: Rgba) -> Vec<(i32, i32, i32, i32)> {
        rec.calls
            .iter()
            .filter_map(|c| match *c {
                DrawCall::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    colour: k,
                } if k == colour => Some((x1, y1, x2, y2)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn fit_centres_the_map() {
        let b = Bounds {
            min: dvec2(100.0, 100.0),
            max: dvec2(300.0, 200.0),
        };
        let v = MapView::fit(b, 400, 400);
        assert!((v.scale() - 1.8).abs() < 1e-9);
        let c = v.to_screen_f(dvec2(200.0, 150.0));
        assert!((c - dvec2(200.0, 200.0)).length() < 1e-9);
        // y grows downwards on both sides
        assert!(v.to_screen(dvec2(100.0, 200.0)).1 > v.to_screen(dvec2(100.0, 100.0)).1);
    }

    #[test]
    fn demo_map_highlights_camera_sector() {
        let level = Level::demo();
        let style = OverheadStyle::default();
        let mut rec = Recorder::new(320, 200);
        draw_overhead(&mut rec, &level, &level.spawn, &RenderConfig::default(), &style);

        let here = level.bsp.as_ref().unwrap().locate(level.spawn.pos()).unwrap();
        let highlighted = lines_with(&rec, style.current_sector);
        assert_eq!(highlighted.len(), level.sector(here).unwrap().len());
        assert_eq!(
            lines_with(&rec, style.wall).len() + highlighted.len(),
            level.wall_count()
        );
        // circle + shaft + two barbs
        assert_eq!(lines_with(&rec, style.marker).len(), 12 + 3);
        assert!(lines_with(&rec, style.ray).is_empty());
    }

    #[test]
    fn arrow_points_along_heading() {
        let level = Level::demo();
        let style = OverheadStyle::default();
        let mut rec = Recorder::new(320, 200);
        // facing 270 is "up" on a y-down map
        draw_overhead(&mut rec, &level, &level.spawn, &RenderConfig::default(), &style);
        let marker = lines_with(&rec, style.marker);
        let (x1, y1, x2, y2) = marker[12];
        assert!((x2 - x1).abs() <= 1);
        assert!(y1 - y2 >= 19 && y1 - y2 <= 21);
    }

    #[test]
    fn distant_camera_lines_stay_on_the_surface() {
        let level = Level::demo();
        let style = OverheadStyle {
            show_rays: true,
            ..OverheadStyle::default()
        };
        let far = Camera::new(1.0e9, -3.0e8, 45.0);
        let mut rec = Recorder::new(320, 200);
        draw_overhead(&mut rec, &level, &far, &RenderConfig::default(), &style);

        let lines: Vec<_> = rec
            .calls
            .iter()
            .filter_map(|c| match *c {
                DrawCall::Line { x1, y1, x2, y2, .. } => Some((x1, y1, x2, y2)),
                _ => None,
            })
            .collect();
        // the map itself still fits, the far-off marker is dropped
        assert_eq!(lines.len(), level.wall_count());
        for (x1, y1, x2, y2) in lines {
            for (x, y) in [(x1, y1), (x2, y2)] {
                assert!((-1..=320).contains(&x) && (-1..=200).contains(&y));
            }
        }
    }

    #[test]
    fn ray_fan_draws_one_line_per_hit() {
        let level = Level::demo();
        let style = OverheadStyle {
            show_rays: true,
            ..OverheadStyle::default()
        };
        let cfg = RenderConfig {
            columns: 16,
            ..RenderConfig::default()
        };
        let mut rec = Recorder::new(320, 200);
        draw_overhead(&mut rec, &level, &level.spawn, &cfg, &style);
        let n = lines_with(&rec, style.ray).len();
        assert!(n > 0 && n <= 16);
    }
}
