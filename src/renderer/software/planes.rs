//! Per-pixel painting of one column: textured wall slices plus the floor
//! and ceiling spans in front of them.
//!
//! Flats are sampled by walking back along the column's ray: the row's
//! angle below (or above) the horizon gives the distance at which the ray
//! meets the plane, and that distance picks the world point.

use std::ops::Range;

use glam::DVec2;

use crate::{
    renderer::{
        RenderTarget,
        software::{
            column::{ColumnItem, ColumnKind, Slice},
            projection::{ProjPlane, Screen},
            tables::TrigTables,
        },
    },
    visibility::Intersection,
    world::{Camera, Region, SceneGraph, Texture, TextureBank, TextureId},
};

/// Everything fixed for one screen column.
pub struct ColumnPainter<'a> {
    pub scene: &'a SceneGraph,
    pub bank: &'a TextureBank,
    pub tables: &'a TrigTables,
    pub screen: &'a Screen,
    pub plane: &'a ProjPlane,
    pub camera: &'a Camera,
    pub eye_z: f64,
    pub tile_size: f64,
    pub col: usize,
    /// `1 / cos` of the column's horizontal angle off the view axis.
    pub cos_rp: f64,
}

impl ColumnPainter<'_> {
    pub fn paint<T: RenderTarget>(&self, target: &mut T, item: &ColumnItem) {
        let near = self.scene.region(item.near);
        match item.kind {
            ColumnKind::Wall { slice, texture } => {
                self.wall(target, &slice, &item.hit, texture);
                self.flats(target, near, &slice, &slice, &item.hit);
            }
            ColumnKind::Portal {
                bottom,
                top,
                bottom_texture,
                top_texture,
                ..
            } => {
                self.wall(target, &bottom, &item.hit, bottom_texture);
                self.wall(target, &top, &item.hit, top_texture);
                self.flats(target, near, &bottom, &top, &item.hit);
            }
        }
    }

    /// Floor below `lower`, ceiling above `upper`, each up to the subview
    /// edge.  Open-air regions get no ceiling.
    fn flats<T: RenderTarget>(
        &self,
        target: &mut T,
        near: &Region,
        lower: &Slice,
        upper: &Slice,
        hit: &Intersection,
    ) {
        let floor_rows = self.screen.pixel_row(lower.proj_slice_bottom_wd)
            ..self.screen.pixel_row(lower.viewport_bottom_wd);
        self.floor(target, floor_rows, near.floor_height, near.floor_texture, hit.point_world);

        if let (Some(z), Some(texture)) = (near.ceiling_height, near.ceiling_texture) {
            let ceiling_rows = self.screen.pixel_row(upper.viewport_top_wd)
                ..self.screen.pixel_row(upper.proj_slice_top_wd);
            self.ceiling(target, ceiling_rows, z, texture, hit.point_world);
        }
    }

    fn wall<T: RenderTarget>(
        &self,
        target: &mut T,
        slice: &Slice,
        hit: &Intersection,
        texture: TextureId,
    ) {
        if slice.is_empty() {
            return;
        }
        let tex = self.bank.texture_or_missing(texture);
        let u = (fract(hit.distance_along_target / self.tile_size) * tex.w as f64) as i64;
        let depth = hit.distance_from_camera;

        let rows = self.screen.pixel_row(slice.proj_slice_top_wd)
            ..self.screen.pixel_row(slice.proj_slice_bottom_wd);
        for j in rows {
            let z = self.plane.height_at(depth, self.screen.proj_of_row(j)) + self.eye_z;
            // texture rows run top → bottom, world z bottom → top
            let v = ((1.0 - fract(z / self.tile_size)) * tex.h as f64) as i64;
            target.put_pixel(self.col, j, tex.texel(u, v));
        }
    }

    fn floor<T: RenderTarget>(
        &self,
        target: &mut T,
        rows: Range<usize>,
        z: f64,
        texture: TextureId,
        hit_world: DVec2,
    ) {
        let drop = self.eye_z - z;
        if drop <= 0.0 {
            return;
        }
        let half_h = self.screen.height as f64 * 0.5;
        let tex = self.bank.texture_or_missing(texture);

        for j in rows {
            let proj_y = (j as f64 + 0.5 - half_h) / self.screen.v_units;
            let below = self.tables.fast_atan(proj_y / self.camera.focal) - self.camera.v_angle;
            let depth = drop * self.tables.fast_tan_rp(below);
            if let Some(p) = self.point_at(depth, hit_world) {
                target.put_pixel(self.col, j, flat_texel(tex, p, self.tile_size));
            }
        }
    }

    fn ceiling<T: RenderTarget>(
        &self,
        target: &mut T,
        rows: Range<usize>,
        z: f64,
        texture: TextureId,
        hit_world: DVec2,
    ) {
        let rise = z - self.eye_z;
        if rise <= 0.0 {
            return;
        }
        let half_h = self.screen.height as f64 * 0.5;
        let tex = self.bank.texture_or_missing(texture);

        for j in rows {
            let proj_y = (half_h - (j as f64 + 0.5)) / self.screen.v_units;
            let above = self.tables.fast_atan(proj_y / self.camera.focal) + self.camera.v_angle;
            let depth = rise * self.tables.fast_tan_rp(above);
            if let Some(p) = self.point_at(depth, hit_world) {
                target.put_pixel(self.col, j, flat_texel(tex, p, self.tile_size));
            }
        }
    }

    /// World point on the column's ray whose depth along the view axis is
    /// `depth`.
    #[inline]
    fn point_at(&self, depth: f64, hit_world: DVec2) -> Option<DVec2> {
        if !(depth > 0.0 && depth.is_finite()) {
            return None;
        }
        let to_hit = hit_world - self.camera.pos;
        let ray_len = to_hit.length();
        if ray_len <= 0.0 {
            return None;
        }
        let d = depth * self.cos_rp;
        Some(self.camera.pos + to_hit * (d / ray_len))
    }
}

#[inline]
fn fract(x: f64) -> f64 {
    x - x.floor()
}

/// Texel of a floor/ceiling texture at world point `p`; one texture
/// covers one `tile`×`tile` square.
#[inline]
pub fn flat_texel(tex: &Texture, p: DVec2, tile: f64) -> u32 {
    let n = p / tile;
    let u = (fract(n.x) * tex.w as f64) as i64;
    let v = (fract(n.y) * tex.h as f64) as i64;
    tex.texel(u, v)
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    #[test]
    fn flat_texels_tile_the_world() {
        let mut tex = Texture::solid("T", 4, 4, 0);
        for (i, px) in tex.pixels.iter_mut().enumerate() {
            *px = i as u32;
        }
        // same spot in neighbouring tiles
        assert_eq!(flat_texel(&tex, dvec2(30.0, 60.0), 100.0), flat_texel(&tex, dvec2(130.0, -40.0), 100.0));
        // (30, 60) of a 100-unit tile → texel (1, 2)
        assert_eq!(flat_texel(&tex, dvec2(30.0, 60.0), 100.0), 2 * 4 + 1);
        // negative coordinates wrap, not mirror
        assert_eq!(flat_texel(&tex, dvec2(-70.0, -40.0), 100.0), 2 * 4 + 1);
    }
}
