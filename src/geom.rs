//! 2-D geometry kernel: segments, lines and the handful of intersection /
//! clipping helpers the traversal and the column renderer are built on.
//!
//! Points and vectors are plain [`glam::DVec2`]; frames (camera, query
//! origin) are [`glam::DAffine2`] mapping local → world.

use glam::{DAffine2, DVec2};
use std::f64::consts::TAU;

/// Forward nudge applied when geometry is re-derived right at a hit point,
/// so the same edge is not reported a second time.
pub const SELF_INTERSECT_EPSILON: f64 = 1e-5;

/// Cross products below this are treated as parallel.
const PARALLEL_EPSILON: f64 = 1e-12;

/*──────────────────────────── segments ─────────────────────────────*/

/// Directed segment `a → b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment {
    pub a: DVec2,
    pub b: DVec2,
}

impl LineSegment {
    #[inline]
    pub const fn new(a: DVec2, b: DVec2) -> Self {
        Self { a, b }
    }

    #[inline]
    pub fn direction(&self) -> DVec2 {
        self.b - self.a
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.a.distance(self.b)
    }

    /// Infinite line through both endpoints.
    #[inline]
    pub fn line(&self) -> Line {
        Line {
            point: self.a,
            dir: self.direction(),
        }
    }

    /// Both endpoints mapped through `m`.
    #[inline]
    pub fn transform(&self, m: &DAffine2) -> LineSegment {
        LineSegment {
            a: m.transform_point2(self.a),
            b: m.transform_point2(self.b),
        }
    }

    /// Position of `p` along the segment's direction, measured from `a`.
    /// Negative when `p` projects behind `a`; 0 for a degenerate segment.
    pub fn signed_distance(&self, p: DVec2) -> f64 {
        let dir = self.direction();
        let len = dir.length();
        if len < PARALLEL_EPSILON {
            return 0.0;
        }
        (p - self.a).dot(dir) / len
    }

    /// Shortest distance from `p` to any point of the segment.
    pub fn distance_to_point(&self, p: DVec2) -> f64 {
        clip_to_line_segment(p, self).distance(p)
    }
}

/*────────────────────────────── lines ──────────────────────────────*/

/// Infinite line `point + t·dir`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    pub point: DVec2,
    pub dir: DVec2,
}

impl Line {
    /// Signed perpendicular distance; positive on the left of `dir`.
    pub fn signed_distance_to(&self, p: DVec2) -> f64 {
        let len = self.dir.length();
        if len < PARALLEL_EPSILON {
            return self.point.distance(p);
        }
        self.dir.perp_dot(p - self.point) / len
    }
}

/*──────────────────────── intersection tests ───────────────────────*/

/// Intersection of two infinite lines, `None` if they are parallel.
pub fn line_intersect(l0: &Line, l1: &Line) -> Option<DVec2> {
    let denom = l0.dir.perp_dot(l1.dir);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = (l1.point - l0.point).perp_dot(l1.dir) / denom;
    Some(l0.point + l0.dir * t)
}

/// Intersection of two closed segments.
///
/// Parallel, collinear and zero-length inputs all report `None`.
pub fn line_segment_intersect(l0: &LineSegment, l1: &LineSegment) -> Option<DVec2> {
    let r = l0.direction();
    let s = l1.direction();
    let denom = r.perp_dot(s);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }

    let qp = l1.a - l0.a;
    let t = qp.perp_dot(s) / denom;
    let u = qp.perp_dot(r) / denom;

    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(l0.a + r * t)
    } else {
        None
    }
}

/// Clamp a point lying on `lseg`'s line to the segment itself.
pub fn clip_to_line_segment(p: DVec2, lseg: &LineSegment) -> DVec2 {
    let dir = lseg.direction();
    let len_sq = dir.length_squared();
    if len_sq < PARALLEL_EPSILON {
        return lseg.a;
    }
    let t = ((p - lseg.a).dot(dir) / len_sq).clamp(0.0, 1.0);
    lseg.a + dir * t
}

/// Clamp `x` into the range spanned by `a` and `b` (either order).
///
/// Unlike `f64::clamp` this accepts infinite bounds and never panics.
#[inline]
pub fn clip_number(x: f64, a: f64, b: f64) -> f64 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if x < lo {
        lo
    } else if x > hi {
        hi
    } else {
        x
    }
}

/// Wrap an angle into `[0, 2π)`.
#[inline]
pub fn normalise_angle(a: f64) -> f64 {
    let n = a.rem_euclid(TAU);
    // rem_euclid may round tiny negatives up to exactly TAU
    if n >= TAU { 0.0 } else { n }
}

/// Local → world frame for something at `pos` facing `angle`.
#[inline]
pub fn frame(pos: DVec2, angle: f64) -> DAffine2 {
    DAffine2::from_angle_translation(angle, pos)
}

/// Even–odd point-in-polygon test over an unordered set of boundary
/// segments (orientation and edge order do not matter).
pub fn point_in_polygon<'a, I>(p: DVec2, edges: I) -> bool
where
    I: IntoIterator<Item = &'a LineSegment>,
{
    let mut inside = false;
    for e in edges {
        let (a, b) = (e.a, e.b);
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
