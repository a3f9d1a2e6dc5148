use glam::{DVec2, dvec2};

use crate::world::geometry::{normalize_angle, polar};

/// Viewer position and heading on the map plane.
///
/// * `direction` is in degrees, always kept in `[0, 360)`.
/// * No collision: movement never consults the walls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pos: DVec2,
    direction: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl Camera {
    pub fn new(x: f64, y: f64, direction: f64) -> Self {
        Self {
            pos: dvec2(x, y),
            direction: normalize_angle(direction),
        }
    }

    #[inline]
    pub fn pos(&self) -> DVec2 {
        self.pos
    }

    #[inline]
    pub fn direction(&self) -> f64 {
        self.direction
    }

    #[inline]
    pub fn set_pos(&mut self, pos: DVec2) {
        self.pos = pos;
    }

    #[inline]
    pub fn set_direction(&mut self, direction: f64) {
        self.direction = normalize_angle(direction);
    }

    /*──────────────────────── derived vectors ───────────────────────*/

    /// Unit vector along the heading.
    #[inline]
    pub fn forward(&self) -> DVec2 {
        polar(DVec2::ZERO, self.direction, 1.0)
    }

    /*──────────────────────── movement helpers ──────────────────────*/

    pub fn move_forward(&mut self, distance: f64) {
        self.pos = polar(self.pos, self.direction, distance);
    }

    pub fn move_backward(&mut self, distance: f64) {
        self.pos = polar(self.pos, self.direction, -distance);
    }

    /// Sidestep to the left of the heading (heading − 90°).
    pub fn strafe_left(&mut self, distance: f64) {
        self.pos = polar(self.pos, self.direction - 90.0, distance);
    }

    /// Sidestep to the right of the heading (heading + 90°).
    pub fn strafe_right(&mut self, distance: f64) {
        self.pos = polar(self.pos, self.direction + 90.0, distance);
    }

    /// Turn by `delta` degrees (positive = clockwise on the map).
    pub fn rotate(&mut self, delta: f64) {
        self.direction = normalize_angle(self.direction + delta);
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-9;

    #[test]
    fn direction_is_normalised() {
        assert!((Camera::new(0.0, 0.0, 370.0).direction() - 10.0).abs() < TOL);
        let mut cam = Camera::new(0.0, 0.0, 5.0);
        cam.rotate(-10.0);
        assert!((cam.direction() - 355.0).abs() < TOL);
        cam.rotate(725.0);
        assert!((cam.direction() - 0.0).abs() < TOL);
    }

    #[test]
    fn forward_and_back_cancel() {
        let mut cam = Camera::new(3.0, 4.0, 33.0);
        cam.move_forward(10.0);
        assert!((cam.pos().distance(dvec2(3.0, 4.0)) - 10.0).abs() < TOL);
        cam.move_backward(10.0);
        assert!(cam.pos().distance(dvec2(3.0, 4.0)) < TOL);
    }

    #[test]
    fn heading_270_moves_up_the_map() {
        let mut cam = Camera::new(640.0, 310.0, 270.0);
        cam.move_forward(1.0);
        assert!(cam.pos().distance(dvec2(640.0, 309.0)) < TOL);
    }

    #[test]
    fn strafes_are_perpendicular() {
        let mut cam = Camera::new(0.0, 0.0, 0.0);
        cam.strafe_right(2.0);
        assert!(cam.pos().distance(dvec2(0.0, 2.0)) < TOL);
        cam.strafe_left(4.0);
        assert!(cam.pos().distance(dvec2(0.0, -2.0)) < TOL);
        assert!(cam.forward().dot(dvec2(0.0, 1.0)).abs() < TOL);
    }
}
