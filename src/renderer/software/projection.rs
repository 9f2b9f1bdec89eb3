//! Screen ↔ camera-space mapping.
//!
//! Horizontally each screen column owns one ray through the projection
//! plane at distance `F`.  Vertically a column is a 2-D cross-section:
//! x = depth along the camera axis, y = height relative to the eye.  The
//! projection plane in that cross-section is a segment of length
//! `viewport.y` tilted by the camera's `v_angle`.

use glam::{DMat2, DVec2, dvec2};

use crate::geom::{Line, LineSegment, SELF_INTERSECT_EPSILON, line_intersect};

/// Pixel grid of the render target expressed in projection-plane units.
#[derive(Clone, Copy, Debug)]
pub struct Screen {
    pub width: usize,
    pub height: usize,
    /// Pixels per world unit on the projection plane.
    pub h_units: f64,
    pub v_units: f64,
}

impl Screen {
    pub fn new(width: usize, height: usize, viewport: DVec2) -> Self {
        Self {
            width,
            height,
            h_units: width as f64 / viewport.x,
            v_units: height as f64 / viewport.y,
        }
    }

    /// Horizontal offset of column `col` on the projection plane
    /// (positive = right of centre).
    #[inline]
    pub fn proj_x(&self, col: f64) -> f64 {
        (col - (self.width / 2) as f64) / self.h_units
    }

    /// Camera-space ray through column `col`, `len` focal lengths long.
    #[inline]
    pub fn column_ray(&self, col: usize, focal: f64, len: f64) -> LineSegment {
        LineSegment::new(DVec2::ZERO, dvec2(focal, -self.proj_x(col as f64)) * len)
    }

    /// Fractional column a camera-space point projects onto.  Points
    /// behind the eye have no column.
    pub fn column_of(&self, p_cam: DVec2, focal: f64) -> Option<f64> {
        if p_cam.x <= 0.0 {
            return None;
        }
        let proj_x = -p_cam.y * focal / p_cam.x;
        Some(proj_x * self.h_units + (self.width / 2) as f64)
    }

    /// Screen row of a position measured up the projection plane.
    #[inline]
    pub fn row_of(&self, proj: f64) -> f64 {
        self.height as f64 - proj * self.v_units
    }

    /// Integer row boundary, clamped to the target.
    #[inline]
    pub fn pixel_row(&self, proj: f64) -> usize {
        let r = self.row_of(proj).round();
        if r <= 0.0 { 0 } else { (r as usize).min(self.height) }
    }

    /// Inverse of [`Screen::row_of`], sampled at the centre of row `j`.
    #[inline]
    pub fn proj_of_row(&self, j: usize) -> f64 {
        (self.height as f64 - (j as f64 + 0.5)) / self.v_units
    }
}

/// Tilted projection plane of one column's vertical cross-section.
#[derive(Clone, Copy, Debug)]
pub struct ProjPlane {
    /// Bottom → top, in (depth, height-above-eye) coordinates.
    lseg: LineSegment,
    v_angle: f64,
    view_dir: DVec2,
}

impl ProjPlane {
    pub fn new(focal: f64, viewport_h: f64, v_angle: f64) -> Self {
        let rot = DMat2::from_angle(v_angle);
        let a = rot * dvec2(focal, -viewport_h * 0.5 + SELF_INTERSECT_EPSILON);
        let b = rot * dvec2(focal, viewport_h * 0.5);
        Self {
            lseg: LineSegment::new(a, b),
            v_angle,
            view_dir: DVec2::from_angle(v_angle),
        }
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.lseg.length()
    }

    /// Where the sight line to the point at `depth`, `h` above the eye,
    /// crosses the plane, measured up from its bottom edge.
    ///
    /// Points outside the forward half-space (and infinite heights) come
    /// back as ±∞ so callers can clip them uniformly.
    pub fn project(&self, depth: f64, h: f64) -> f64 {
        if !h.is_finite() {
            return h;
        }
        let r = dvec2(depth, h);
        if r.dot(self.view_dir) > 0.0 {
            if let Some(p) = line_intersect(&Line { point: DVec2::ZERO, dir: r }, &self.lseg.line()) {
                return self.lseg.signed_distance(p);
            }
        }
        if h.atan2(depth) > self.v_angle {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        }
    }

    /// Height above the eye at which the sight line through plane
    /// position `s` reaches `depth`.
    pub fn height_at(&self, depth: f64, s: f64) -> f64 {
        let dir = self.lseg.direction().normalize_or_zero();
        let p = self.lseg.a + dir * s;
        let wall = Line {
            point: dvec2(depth, 0.0),
            dir: dvec2(0.0, 1.0),
        };
        match line_intersect(&Line { point: DVec2::ZERO, dir: p }, &wall) {
            Some(q) => q.y,
            None if p.y > 0.0 => f64::INFINITY,
            None => f64::NEG_INFINITY,
        }
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
