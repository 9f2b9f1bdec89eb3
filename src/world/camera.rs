use glam::{DAffine2, DVec2};
use std::f64::consts::TAU;

use crate::geom;
use crate::world::RegionId;

/// Viewer in world space.
///
/// * `angle` is the heading (0 = +X, counter-clockwise).
/// * `v_angle` tilts the projection plane (positive = look up).
/// * `height` is eye height above the floor of `region`, not absolute.
///
/// Camera space puts the eye at the origin looking down +X, with +Y to
/// the viewer's left.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub pos: DVec2,
    pub angle: f64,
    pub v_angle: f64,
    pub height: f64,
    /// Distance from the eye to the projection plane, in world units.
    pub focal: f64,
    pub region: RegionId,
}

impl Camera {
    /// Camera whose horizontal field of view spans `viewport_w` world units
    /// of projection plane.
    pub fn new(viewport_w: f64, h_fov: f64, region: RegionId) -> Self {
        Self {
            pos: DVec2::ZERO,
            angle: 0.0,
            v_angle: 0.0,
            height: 0.0,
            focal: Self::focal_for(viewport_w, h_fov),
            region,
        }
    }

    /// ```text
    /// F = (w / 2) / tan(fov / 2)
    /// ```
    #[inline]
    pub fn focal_for(viewport_w: f64, h_fov: f64) -> f64 {
        viewport_w * 0.5 / (h_fov * 0.5).tan()
    }

    /// Camera space → world space.
    #[inline]
    pub fn matrix(&self) -> DAffine2 {
        geom::frame(self.pos, self.angle)
    }

    /// World point → camera space.
    #[inline]
    pub fn to_cam(&self, p: DVec2) -> DVec2 {
        self.matrix().inverse().transform_point2(p)
    }

    /// Absolute eye height, given the floor of the camera's region.
    #[inline]
    pub fn eye_z(&self, floor_height: f64) -> f64 {
        floor_height + self.height
    }

    /*──────────────────────── derived vectors ───────────────────────*/

    /// Unit vector pointing where the camera looks on the X-Y plane.
    #[inline(always)]
    pub fn forward(&self) -> DVec2 {
        DVec2::from_angle(self.angle)
    }

    /// Unit vector pointing to the camera's right on the X-Y plane.
    #[inline(always)]
    pub fn right(&self) -> DVec2 {
        -self.forward().perp()
    }

    /*──────────────────────── movement helpers ──────────────────────*/

    /// Rotate around Z-axis (positive = turn left).
    pub fn turn(&mut self, delta: f64) {
        self.angle = (self.angle + delta).rem_euclid(TAU);
    }

    /// Tilt up/down, clamped short of vertical.
    pub fn tilt(&mut self, delta: f64, limit: f64) {
        self.v_angle = (self.v_angle + delta).clamp(-limit, limit);
    }

    /// Displacement for `forward` units ahead and `side` units to the right.
    pub fn step_vector(&self, forward: f64, side: f64) -> DVec2 {
        self.forward() * forward + self.right() * side
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn forward_and_right_are_orthonormal() {
        let mut cam = Camera::new(10.0, 1.0, 0);
        cam.angle = 0.3;
        let f = cam.forward();
        let r = cam.right();
        assert!((f.length() - 1.0).abs() < 1e-9);
        assert!((r.length() - 1.0).abs() < 1e-9);
        assert!(f.dot(r).abs() < 1e-9);
        // right is clockwise from forward
        assert!(f.perp_dot(r) < 0.0);
    }

    #[test]
    fn focal_at_90_deg() {
        let cam = Camera::new(640.0, FRAC_PI_2, 0);
        assert!((cam.focal - 320.0).abs() < 1e-9);
    }

    #[test]
    fn to_cam_axes_align() {
        let mut cam = Camera::new(10.0, FRAC_PI_2, 0);
        cam.pos = dvec2(1.0, 1.0);
        // straight ahead → +X
        assert!((cam.to_cam(dvec2(11.0, 1.0)) - dvec2(10.0, 0.0)).length() < 1e-9);
        // to the left → +Y
        assert!((cam.to_cam(dvec2(1.0, 6.0)) - dvec2(0.0, 5.0)).length() < 1e-9);

        cam.angle = FRAC_PI_2;
        assert!((cam.to_cam(dvec2(1.0, 11.0)) - dvec2(10.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn tilt_is_clamped() {
        let mut cam = Camera::new(10.0, 1.0, 0);
        cam.tilt(5.0, 0.5);
        assert_eq!(cam.v_angle, 0.5);
        cam.tilt(-5.0, 0.5);
        assert_eq!(cam.v_angle, -0.5);
    }
}
