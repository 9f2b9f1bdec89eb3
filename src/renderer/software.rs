//! ---------------------------------------------------------------------------
//! Software (CPU) portal column renderer
//!
//! * One ray per screen column is cast through the region graph and the
//!   sorted hits are drawn front to back.
//! * A per-column subview shrinks at every portal, so farther geometry is
//!   clipped without a Z-buffer; the walk stops at the first wall or when
//!   the subview closes.
//! * Floors and ceilings are sampled per pixel through [`TrigTables`].
//! ---------------------------------------------------------------------------

mod column;
mod planes;
mod projection;
mod tables;

pub use column::{ColumnItem, ColumnKind, Slice};
pub use projection::{ProjPlane, Screen};
pub use tables::{ATAN_MAX, ATAN_MIN, TrigTables};

use crate::{
    config::RenderConfig,
    renderer::{RenderError, RenderTarget, Renderer},
    visibility::{CastResult, cast_ray},
    world::{Camera, SceneGraph, TextureBank},
};
use column::ColumnWalk;
use planes::ColumnPainter;

/*───────────────────────────────────────────────────────────────────────*/
/*                              Backend                                 */
/*───────────────────────────────────────────────────────────────────────*/

pub struct Software {
    config: RenderConfig,
    tables: TrigTables,
    /* scratch reused by every column */
    hits: CastResult,
    items: Vec<ColumnItem>,
}

impl Default for Software {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl Software {
    pub fn new(config: RenderConfig) -> Self {
        log::debug!(
            "software renderer: viewport {}×{}, tan table {}, atan table {}",
            config.viewport.x,
            config.viewport.y,
            config.tan_table_size,
            config.atan_table_size
        );
        Self {
            tables: TrigTables::new(config.tan_table_size, config.atan_table_size),
            config,
            hits: CastResult::default(),
            items: Vec::new(),
        }
    }

    #[inline]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Cast and plan column `col` of a `width`×`height` target without
    /// painting it.  The returned slice is valid until the next call.
    pub fn plan_column(
        &mut self,
        scene: &SceneGraph,
        camera: &Camera,
        width: usize,
        height: usize,
        col: usize,
    ) -> Result<&[ColumnItem], RenderError> {
        let region = scene
            .get_region(camera.region)
            .ok_or(RenderError::UnknownRegion(camera.region))?;
        let screen = Screen::new(width, height, self.config.viewport);
        let plane = ProjPlane::new(camera.focal, self.config.viewport.y, camera.v_angle);
        let walk = ColumnWalk {
            scene,
            plane: &plane,
            eye_z: camera.eye_z(region.floor_height),
        };
        self.cast_and_plan(scene, camera, &screen, &walk, col)?;
        Ok(&self.items)
    }

    fn cast_and_plan(
        &mut self,
        scene: &SceneGraph,
        camera: &Camera,
        screen: &Screen,
        walk: &ColumnWalk<'_>,
        col: usize,
    ) -> Result<(), RenderError> {
        let ray = screen.column_ray(col, camera.focal, self.config.ray_length);
        cast_ray(
            scene,
            camera.matrix(),
            ray,
            camera.region,
            self.config.max_portal_depth,
            &mut self.hits,
        )?;
        walk.plan(camera.region, &self.hits.intersections, &mut self.items);
        Ok(())
    }
}

/*──────────────────────── Renderer trait impl ────────────────────────*/
impl Renderer for Software {
    fn render_scene<T: RenderTarget>(
        &mut self,
        target: &mut T,
        scene: &SceneGraph,
        camera: &Camera,
        bank: &TextureBank,
    ) -> Result<(), RenderError> {
        let region = scene
            .get_region(camera.region)
            .ok_or(RenderError::UnknownRegion(camera.region))?;

        target.fill(self.config.background);
        let (w, h) = (target.width(), target.height());
        if w == 0 || h == 0 {
            return Ok(());
        }

        let screen = Screen::new(w, h, self.config.viewport);
        let plane = ProjPlane::new(camera.focal, self.config.viewport.y, camera.v_angle);
        let eye_z = camera.eye_z(region.floor_height);
        let walk = ColumnWalk {
            scene,
            plane: &plane,
            eye_z,
        };

        for col in 0..w {
            self.cast_and_plan(scene, camera, &screen, &walk, col)?;

            let h_angle = (screen.proj_x(col as f64) / camera.focal).atan();
            let painter = ColumnPainter {
                scene,
                bank,
                tables: &self.tables,
                screen: &screen,
                plane: &plane,
                camera,
                eye_z,
                tile_size: self.config.tile_size,
                col,
                cos_rp: 1.0 / h_angle.cos(),
            };
            for item in &self.items {
                painter.paint(target, item);
            }
        }
        Ok(())
    }
}

/*──────────────────────────────── Tests ───────────────────────────────*/
