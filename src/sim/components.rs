use glam::DVec2;

use crate::world::RegionId;

/// World-space position on the map plane.  Heights come from the zone's
/// floor plus [`Body::elevation`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub DVec2);

/// Region the entity currently stands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zone(pub RegionId);

/// Vertical billboard used by the ray queries: always faces the ray,
/// `width` across, `height` tall, floating `elevation` above the floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub width: f64,
    pub height: f64,
    pub elevation: f64,
}

impl Body {
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            elevation: 0.0,
        }
    }

    #[inline]
    pub fn half_width(&self) -> f64 {
        self.width * 0.5
    }

    /// Absolute bottom and top given the floor under the entity.
    #[inline]
    pub fn z_range(&self, floor: f64) -> (f64, f64) {
        let bottom = floor + self.elevation;
        (bottom, bottom + self.height)
    }
}
