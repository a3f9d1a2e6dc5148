//! ----------------------------------------------------------------------------
//! **Per-column ray casting**
//!
//! One ray per screen column, spread evenly across the field of view from
//! the left edge (`direction − fov/2`) to the right.  A candidate hit counts
//! only when
//! * the intersection lies on the wall segment (bounding box + tolerance), and
//! * its azimuth from the viewer is within `heading_tolerance` of the ray.
//!
//! The azimuth test stands in for a proper `t ≥ 0` check and can accept or
//! reject grazing hits wrongly; rendering output depends on it, so it stays.
//! ----------------------------------------------------------------------------

use glam::DVec2;
use smallvec::SmallVec;

use crate::{
    engine::types::{Frame, RenderConfig, Screen, Viewer},
    world::{
        Wall,
        geometry::{
            angle_from_origin, distance, intersect, normalize_angle, point_within_segment,
            within_heading,
        },
    },
};

/// Most layers a single column composites (nearer + farther).
pub const MAX_LAYERS: usize = 2;

/// One ray of the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub column: usize,
    /// Absolute heading, `[0, 360)`.
    pub angle: f64,
}

/// A validated wall hit.
#[derive(Clone, Copy, Debug)]
pub struct Hit<'a> {
    pub wall: &'a Wall,
    /// Position of the wall in the candidate sequence; distinguishes walls.
    pub index: usize,
    pub point: DVec2,
    /// Raw Euclidean distance.
    pub distance: f64,
    /// Fisheye-corrected distance.
    pub corrected: f64,
    /// Projected wall height in pixels.
    pub height: f64,
}

impl Hit<'_> {
    /// Fraction along the wall, 0 at its first endpoint.
    #[inline]
    pub fn wall_fraction(&self) -> f64 {
        self.wall.line.fraction_of(self.point)
    }
}

/// Up to [`MAX_LAYERS`] hits of one column, nearest first.
pub type Layers<'a> = SmallVec<[Hit<'a>; MAX_LAYERS]>;

/// Heading of ray `column` out of `screen.columns`.
#[inline]
pub fn ray_angle(view: &Viewer, screen: &Screen, cfg: &RenderConfig, column: usize) -> f64 {
    let step = cfg.fov / screen.columns as f64;
    normalize_angle(view.direction - cfg.fov * 0.5 + column as f64 * step)
}

/// All rays of a frame, left to right.
pub fn rays<'f>(frame: &'f Frame<'_>) -> impl Iterator<Item = Ray> + 'f {
    (0..frame.screen.columns).map(move |column| Ray {
        column,
        angle: ray_angle(&frame.view, &frame.screen, frame.cfg, column),
    })
}

/// Remove the fisheye: scale by the cosine of the ray's offset from the
/// view direction.
#[inline]
pub fn correct_distance(raw: f64, ray_angle: f64, view_direction: f64) -> f64 {
    raw * (ray_angle - view_direction).to_radians().cos()
}

/// `K / max(distance, ε)`.
#[inline]
pub fn projected_height(distance: f64, scale: f64, min_distance: f64) -> f64 {
    scale / distance.max(min_distance)
}

/// Validated hit of `wall` by the ray, if any.
pub fn hit_wall<'a>(
    wall: &'a Wall,
    index: usize,
    view: &Viewer,
    cfg: &RenderConfig,
    angle: f64,
) -> Option<Hit<'a>> {
    let point = intersect(view.origin, &wall.line, angle)?;
    if !point_within_segment(&wall.line, point, cfg.segment_tolerance) {
        return None;
    }
    if !within_heading(angle_from_origin(view.origin, point), angle, cfg.heading_tolerance) {
        return None;
    }

    let raw = distance(view.origin, point);
    let corrected = correct_distance(raw, angle, view.direction);
    Some(Hit {
        wall,
        index,
        point,
        distance: raw,
        corrected,
        height: projected_height(corrected, view.scale, cfg.min_distance),
    })
}

/// Nearest valid hit among `walls`.  Ties go to the earlier wall.
pub fn cast_ray<'a>(
    walls: impl IntoIterator<Item = &'a Wall>,
    view: &Viewer,
    cfg: &RenderConfig,
    angle: f64,
) -> Option<Hit<'a>> {
    walls
        .into_iter()
        .enumerate()
        .filter_map(|(i, w)| hit_wall(w, i, view, cfg, angle))
        .fold(None, |best: Option<Hit<'a>>, h| match best {
            Some(b) if b.distance <= h.distance => Some(b),
            _ => Some(h),
        })
}

/// The two nearest distinct walls hit by the ray, nearest first.
pub fn cast_layers<'a>(
    walls: impl IntoIterator<Item = &'a Wall>,
    view: &Viewer,
    cfg: &RenderConfig,
    angle: f64,
    out: &mut Layers<'a>,
) {
    out.clear();
    for (i, w) in walls.into_iter().enumerate() {
        let Some(h) = hit_wall(w, i, view, cfg, angle) else {
            continue;
        };
        let slot = out.iter().position(|o| h.distance < o.distance).unwrap_or(out.len());
        if slot < MAX_LAYERS {
            out.insert(slot, h);
            out.truncate(MAX_LAYERS);
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
