//! Pre-computed trigonometry for the per-pixel floor/ceiling loops.

use std::f64::consts::TAU;

use crate::geom::normalise_angle;

/// Domain of the arctangent table; inputs outside are clamped.
pub const ATAN_MIN: f64 = -10.0;
pub const ATAN_MAX: f64 = 10.0;

#[derive(Clone, Debug)]
pub struct TrigTables {
    /// `1 / tan(a)` for `a` in `[0, 2π)`.
    tan_rp: Vec<f64>,
    /// `atan(x)` for `x` in `[ATAN_MIN, ATAN_MAX]`.
    atan: Vec<f64>,
}

impl TrigTables {
    pub fn new(tan_size: usize, atan_size: usize) -> Self {
        let tan_size = tan_size.max(1);
        let atan_size = atan_size.max(2);

        let tan_rp = (0..tan_size)
            .map(|i| 1.0 / (TAU * i as f64 / tan_size as f64).tan())
            .collect();

        let step = (ATAN_MAX - ATAN_MIN) / (atan_size - 1) as f64;
        let atan = (0..atan_size)
            .map(|i| (ATAN_MIN + step * i as f64).atan())
            .collect();

        Self { tan_rp, atan }
    }

    /// Reciprocal tangent.  Angles are wrapped, so `a` and `a + 2π` land
    /// on the same entry.
    #[inline]
    pub fn fast_tan_rp(&self, a: f64) -> f64 {
        let n = self.tan_rp.len();
        let i = (normalise_angle(a) * n as f64 / TAU) as usize;
        self.tan_rp[i.min(n - 1)]
    }

    #[inline]
    pub fn fast_atan(&self, x: f64) -> f64 {
        let n = self.atan.len();
        let x = x.clamp(ATAN_MIN, ATAN_MAX);
        let i = ((x - ATAN_MIN) * (n - 1) as f64 / (ATAN_MAX - ATAN_MIN)).round() as usize;
        self.atan[i.min(n - 1)]
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_4;

    fn tables() -> TrigTables {
        TrigTables::new(10_000, 10_000)
    }

    #[test]
    fn tan_rp_wraps_a_full_turn() {
        let t = tables();
        assert_eq!(t.fast_tan_rp(0.0), t.fast_tan_rp(TAU));
        assert_eq!(t.fast_tan_rp(1.0), t.fast_tan_rp(1.0 + TAU));
        assert_eq!(t.fast_tan_rp(-1.0), t.fast_tan_rp(TAU - 1.0));
    }

    #[test]
    fn tan_rp_is_close_to_exact() {
        let t = tables();
        assert!((t.fast_tan_rp(FRAC_PI_4) - 1.0).abs() < 2e-3);
        let a = 0.3;
        assert!((t.fast_tan_rp(a) - 1.0 / a.tan()).abs() < 0.02);
    }

    #[test]
    fn atan_clamps_to_its_domain() {
        let t = tables();
        assert_eq!(t.fast_atan(1e6), t.fast_atan(ATAN_MAX));
        assert_eq!(t.fast_atan(-1e6), t.fast_atan(ATAN_MIN));
        assert!((t.fast_atan(ATAN_MAX) - ATAN_MAX.atan()).abs() < 1e-12);
        assert!(t.fast_atan(f64::INFINITY).is_finite());
    }

    #[test]
    fn atan_is_close_to_exact() {
        let t = tables();
        for x in [-3.7, -0.5, 0.0, 0.25, 1.0, 9.9] {
            assert!((t.fast_atan(x) - f64::atan(x)).abs() < 2e-3, "x = {x}");
        }
    }
}
