//! Geometry kernel shared by the raycaster, the compositor and the BSP.
//!
//! Every degenerate case (vertical lines, parallel lines, collinear overlap)
//! is handled here, so callers only ever see finite points or `None`.
//!
//! Coordinates are map units with +y pointing *down* (screen-like), angles
//! are degrees measured from +x and grow clockwise on the overhead map.

use glam::{DVec2, dvec2};

/// Two lines closer than this (in map units) are treated as the same line.
pub const COLLINEAR_EPS: f64 = 1e-6;

/// Gradients closer than this are treated as parallel.
pub const PARALLEL_EPS: f64 = 1e-9;

/// Angles within this many degrees of an axis snap to that axis.
const AXIS_SNAP_DEG: f64 = 1e-9;

/// Undirected line segment `a → b`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Segment {
    pub a: DVec2,
    pub b: DVec2,
}

impl Segment {
    #[inline]
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            a: dvec2(x1, y1),
            b: dvec2(x2, y2),
        }
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.a.distance(self.b)
    }

    #[inline]
    pub fn midpoint(&self) -> DVec2 {
        (self.a + self.b) * 0.5
    }

    #[inline]
    pub fn is_vertical(&self) -> bool {
        self.b.x - self.a.x == 0.0
    }

    #[inline]
    pub fn is_horizontal(&self) -> bool {
        self.b.y - self.a.y == 0.0
    }

    /// Fraction (0 at `a`, 1 at `b`) of the projection of `p` onto the segment.
    pub fn fraction_of(&self, p: DVec2) -> f64 {
        let len = self.length();
        if len == 0.0 {
            return 0.0;
        }
        (self.a.distance(p) / len).clamp(0.0, 1.0)
    }
}

/// Slope of a line, with verticals kept apart from ordinary values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Gradient {
    Vertical,
    Finite(f64),
}

impl Gradient {
    #[inline]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Gradient::Finite(m) if m == 0.0)
    }
}

/// `(y2 - y1) / (x2 - x1)`, or [`Gradient::Vertical`] when `x1 == x2`.
pub fn wall_gradient(seg: &Segment) -> Gradient {
    let dx = seg.b.x - seg.a.x;
    if dx == 0.0 {
        Gradient::Vertical
    } else {
        Gradient::Finite((seg.b.y - seg.a.y) / dx)
    }
}

/// `tan(angle)`: exactly zero at 0°/180°, vertical at 90°/270°.
pub fn ray_gradient(angle_deg: f64) -> Gradient {
    let a = normalize_angle(angle_deg);
    let near = |axis: f64| (a - axis).abs() < AXIS_SNAP_DEG;

    if near(0.0) || near(180.0) || near(360.0) {
        Gradient::Finite(0.0)
    } else if near(90.0) || near(270.0) {
        Gradient::Vertical
    } else {
        Gradient::Finite(a.to_radians().tan())
    }
}

/// Intersect the infinite ray line through `origin` at `angle_deg` with the
/// infinite line carrying `seg`.
///
/// The maths runs in a frame centred on `origin`.  Collinear overlaps report
/// the segment endpoint nearest to `origin`; parallel lines report `None`.
/// Whether the point lies on the segment, or ahead of the viewer, is the
/// caller's business (see [`point_within_segment`], [`within_heading`]).
pub fn intersect(origin: DVec2, seg: &Segment, angle_deg: f64) -> Option<DVec2> {
    let a = seg.a - origin;
    let b = seg.b - origin;
    let wall = wall_gradient(seg);
    let ray = ray_gradient(angle_deg);

    let local = match (wall, ray) {
        // (a) both vertical: the ray is x = 0
        (Gradient::Vertical, Gradient::Vertical) => {
            if a.x.abs() <= COLLINEAR_EPS {
                nearest_endpoint(a, b)
            } else {
                return None;
            }
        }
        // (b) both horizontal: the ray is y = 0
        (Gradient::Finite(m1), Gradient::Finite(m2)) if m1 == 0.0 && m2 == 0.0 => {
            if a.y.abs() <= COLLINEAR_EPS {
                nearest_endpoint(a, b)
            } else {
                return None;
            }
        }
        // (c) wall x = a.x, ray y = m2·x
        (Gradient::Vertical, Gradient::Finite(m2)) => dvec2(a.x, m2 * a.x),
        // (d) ray x = 0, wall through `a` with slope m1
        (Gradient::Finite(m1), Gradient::Vertical) => dvec2(0.0, a.y - a.x * m1),
        // (e) general two-line solution
        (Gradient::Finite(m1), Gradient::Finite(m2)) => {
            let intercept = a.y - a.x * m1;
            if (m2 - m1).abs() < PARALLEL_EPS {
                if intercept.abs() <= COLLINEAR_EPS {
                    nearest_endpoint(a, b)
                } else {
                    return None;
                }
            } else {
                let x = intercept / (m2 - m1);
                dvec2(x, m2 * x)
            }
        }
    };

    let p = local + origin;
    p.is_finite().then_some(p)
}

#[inline]
fn nearest_endpoint(a: DVec2, b: DVec2) -> DVec2 {
    if a.length_squared() <= b.length_squared() { a } else { b }
}

/// Euclidean distance.
#[inline]
pub fn distance(origin: DVec2, p: DVec2) -> f64 {
    origin.distance(p)
}

/// Wrap any angle into `[0, 360)`.
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid rounds tiny negatives up to exactly 360.0
    if a >= 360.0 { 0.0 } else { a }
}

/// Bounding-box containment of `p` in `seg`, with `tolerance` slack on
/// every side.
pub fn point_within_segment(seg: &Segment, p: DVec2, tolerance: f64) -> bool {
    let min = seg.a.min(seg.b) - DVec2::splat(tolerance);
    let max = seg.a.max(seg.b) + DVec2::splat(tolerance);
    p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
}

/// Azimuth of `p` seen from `origin`, in `[0, 360)`.
pub fn angle_from_origin(origin: DVec2, p: DVec2) -> f64 {
    let d = p - origin;
    if d.x == 0.0 {
        return if d.y >= 0.0 { 90.0 } else { 270.0 };
    }
    normalize_angle(d.y.atan2(d.x).to_degrees())
}

/// True when `azimuth` is within `tolerance` degrees of `heading`, across
/// the 0/360 seam.
///
/// This is the forward-ray test used by the raycaster.  It is not a `t ≥ 0`
/// parametric test and misbehaves for grazing hits whose azimuth drifts more
/// than `tolerance` from the ray (e.g. hits very close to the viewer).
#[inline]
pub fn within_heading(azimuth: f64, heading: f64, tolerance: f64) -> bool {
    let d = (normalize_angle(azimuth) - normalize_angle(heading)).abs();
    d < tolerance || d > 360.0 - tolerance
}

/// Signed smallest difference `a - b` in `(-180, 180]`.
pub fn angle_delta(a: f64, b: f64) -> f64 {
    let d = normalize_angle(a - b);
    if d > 180.0 { d - 360.0 } else { d }
}

/// Point `len` units from `origin` along `angle_deg`.
#[inline]
pub fn polar(origin: DVec2, angle_deg: f64, len: f64) -> DVec2 {
    let (s, c) = angle_deg.to_radians().sin_cos();
    origin + dvec2(c, s) * len
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
