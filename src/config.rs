use glam::{DVec2, dvec2};

use crate::renderer::Rgba;

/// Knobs shared by the software renderer and the ray queries.
///
/// Everything here is fixed for the lifetime of a [`Software`] instance;
/// change it by building a new renderer.
///
/// [`Software`]: crate::renderer::Software
#[derive(Clone, Debug)]
pub struct RenderConfig {
    /// Size of the projection window in world units (width, height).
    pub viewport: DVec2,
    /// World size of one texture tile, both for walls and flats.
    pub tile_size: f64,
    /// Entries in the reciprocal-tangent table (one full turn).
    pub tan_table_size: usize,
    /// Entries in the arctangent table (`ATAN_MIN ..= ATAN_MAX`).
    pub atan_table_size: usize,
    /// Nested portal crossings allowed before the graph is declared broken.
    pub max_portal_depth: usize,
    /// Length of a camera ray, in multiples of the focal length.
    pub ray_length: f64,
    /// Colour of anything no slice was painted over.
    pub background: Rgba,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            viewport: dvec2(10.0 * 320.0 / 240.0, 10.0),
            tile_size: 100.0,
            tan_table_size: 10_000,
            atan_table_size: 10_000,
            max_portal_depth: 64,
            ray_length: 999.9,
            background: 0xFF_00_00_00,
        }
    }
}

impl RenderConfig {
    /// Config with the same aspect ratio as a `w`×`h` window.
    pub fn for_screen(w: usize, h: usize) -> Self {
        let height = 10.0;
        Self {
            viewport: dvec2(height * w as f64 / h as f64, height),
            ..Self::default()
        }
    }
}
