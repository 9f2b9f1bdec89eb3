//! Turning one column's sorted hit list into paintable slices.
//!
//! The walk keeps a *subview*: the part of the projection plane (bottom
//! and top, in plane units) still open after everything in front has been
//! drawn.  Each portal narrows it to the opening between the two regions;
//! a wall closes it.

use crate::{
    geom::clip_number,
    renderer::software::projection::ProjPlane,
    visibility::Intersection,
    world::{EdgeKind, Region, RegionId, SceneGraph, TextureId},
};

/// One vertical span of a column, both in world heights and in
/// projection-plane positions.  Every value is already clipped to the
/// subview that was open when the slice was made.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Slice {
    /// Visible absolute world heights.
    pub slice_bottom_wd: f64,
    pub slice_top_wd: f64,
    /// Same span on the projection plane.
    pub proj_slice_bottom_wd: f64,
    pub proj_slice_top_wd: f64,
    /// Subview the slice was clipped against.
    pub viewport_bottom_wd: f64,
    pub viewport_top_wd: f64,
}

impl Slice {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.proj_slice_top_wd <= self.proj_slice_bottom_wd
    }
}

#[derive(Clone, Copy, Debug)]
pub enum ColumnKind {
    Wall {
        slice: Slice,
        texture: TextureId,
    },
    Portal {
        far: RegionId,
        bottom: Slice,
        top: Slice,
        bottom_texture: TextureId,
        top_texture: TextureId,
    },
}

/// One hit of the column, ready for painting.
#[derive(Clone, Copy, Debug)]
pub struct ColumnItem {
    pub hit: Intersection,
    /// Region the ray is in when it reaches the hit; its floor and
    /// ceiling fill the space in front.
    pub near: RegionId,
    pub kind: ColumnKind,
}

/// Vertical state shared by every hit of one column.
pub struct ColumnWalk<'a> {
    pub scene: &'a SceneGraph,
    pub plane: &'a ProjPlane,
    /// Absolute eye height.
    pub eye_z: f64,
}

impl ColumnWalk<'_> {
    /// Fill `out` from `hits` (sorted near → far), starting in `region`.
    pub fn plan(&self, region: RegionId, hits: &[Intersection], out: &mut Vec<ColumnItem>) {
        out.clear();
        let mut sub = (0.0, self.plane.height());
        let mut current = region;

        for hit in hits {
            let edge = self.scene.edge(hit.edge());
            let depth = hit.distance_from_camera;

            match edge.kind {
                EdgeKind::Wall { region: owner, texture } => {
                    let r = self.scene.region(owner);
                    let slice = self.slice(depth, r.floor_height, ceiling_of(r), sub);
                    out.push(ColumnItem {
                        hit: *hit,
                        near: current,
                        kind: ColumnKind::Wall { slice, texture },
                    });
                    return;
                }
                EdgeKind::Portal {
                    bottom_texture,
                    top_texture,
                    ..
                } => {
                    let near_id = if edge.touches(current) {
                        current
                    } else {
                        log::warn!(
                            "portal {} reached from region {current}, which it does not join",
                            hit.edge()
                        );
                        hit.region
                    };
                    let Some(far_id) = edge.other_region(near_id) else {
                        return;
                    };
                    let near = self.scene.region(near_id);
                    let far = self.scene.region(far_id);

                    let (bottom_lo, bottom_hi) = floor_step(near, far);
                    let (top_lo, top_hi) = ceiling_step(near, far);

                    let bottom = self.slice(depth, bottom_lo, bottom_hi, sub);
                    let top = self.slice(depth, top_lo, top_hi, sub);
                    out.push(ColumnItem {
                        hit: *hit,
                        near: near_id,
                        kind: ColumnKind::Portal {
                            far: far_id,
                            bottom,
                            top,
                            bottom_texture,
                            top_texture,
                        },
                    });

                    // narrow to the opening; never widen
                    let open_lo = self.plane.project(depth, bottom_hi - self.eye_z);
                    let open_hi = self.plane.project(depth, top_lo - self.eye_z);
                    sub = (sub.0.max(open_lo), sub.1.min(open_hi));
                    current = far_id;
                }
            }

            if sub.1 <= sub.0 {
                return;
            }
        }
    }

    /// Project the world span `z_bottom ..= z_top` at `depth` and clip it
    /// to `sub`.
    fn slice(&self, depth: f64, z_bottom: f64, z_top: f64, sub: (f64, f64)) -> Slice {
        let proj_b = self.plane.project(depth, z_bottom - self.eye_z);
        let proj_t = self.plane.project(depth, z_top - self.eye_z);

        let z_sub_lo = self.plane.height_at(depth, sub.0) + self.eye_z;
        let z_sub_hi = self.plane.height_at(depth, sub.1) + self.eye_z;

        Slice {
            slice_bottom_wd: clip_number(z_bottom, z_sub_lo, z_sub_hi),
            slice_top_wd: clip_number(z_top, z_sub_lo, z_sub_hi),
            proj_slice_bottom_wd: clip_number(proj_b, sub.0, sub.1),
            proj_slice_top_wd: clip_number(proj_t, sub.0, sub.1),
            viewport_bottom_wd: sub.0,
            viewport_top_wd: sub.1,
        }
    }
}

#[inline]
fn ceiling_of(r: &Region) -> f64 {
    r.ceiling_height.unwrap_or(f64::INFINITY)
}

/// Wall below a portal: from the near floor up to the far floor when the
/// far side is higher, empty otherwise.
fn floor_step(near: &Region, far: &Region) -> (f64, f64) {
    (near.floor_height, far.floor_height.max(near.floor_height))
}

/// Wall above a portal: from the far ceiling up to the near ceiling when
/// the far side is lower.  Open air on either side is an infinite ceiling.
fn ceiling_step(near: &Region, far: &Region) -> (f64, f64) {
    match (near.ceiling_height, far.ceiling_height) {
        (Some(n), Some(f)) => (f.min(n), n),
        (Some(n), None) => (n, n),
        (None, Some(f)) => (f, f64::INFINITY),
        (None, None) => (f64::INFINITY, f64::INFINITY),
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        renderer::software::projection::Screen,
        visibility::{CastResult, cast_ray},
        world::{Camera, SceneBuilder, TextureBank},
    };
    use glam::{DVec2, dvec2};

    const VIEWPORT: DVec2 = DVec2::new(10.0 * 320.0 / 240.0, 10.0);

    /// Corridor of three rooms along +x; each step raises the floor and
    /// lowers the ceiling, ending in a wall at x = 600.
    fn corridor() -> (SceneGraph, Vec<RegionId>) {
        let mut b = SceneBuilder::new();
        let root = b.add_region(None, 0.0, Some(100.0));
        let rooms: Vec<_> = [(0.0, 100.0), (20.0, 90.0), (40.0, 80.0)]
            .into_iter()
            .map(|(f, c)| b.add_region(Some(root), f, Some(c)))
            .collect();

        for (i, &r) in rooms.iter().enumerate() {
            let x0 = i as f64 * 200.0;
            let x1 = x0 + 200.0;
            b.add_wall(r, dvec2(x0, -100.0), dvec2(x1, -100.0), "MISSING").unwrap();
            b.add_wall(r, dvec2(x1, 100.0), dvec2(x0, 100.0), "MISSING").unwrap();
            if i + 1 < rooms.len() {
                b.add_portal(r, rooms[i + 1], dvec2(x1, -100.0), dvec2(x1, 100.0), "MISSING", "MISSING")
                    .unwrap();
            } else {
                b.add_wall(r, dvec2(x1, -100.0), dvec2(x1, 100.0), "MISSING").unwrap();
            }
        }
        b.add_wall(rooms[0], dvec2(0.0, 100.0), dvec2(0.0, -100.0), "MISSING").unwrap();
        let sg = b.finish(&TextureBank::default_with_checker()).unwrap();
        (sg, rooms)
    }

    fn plan_centre(sg: &SceneGraph, cam: &Camera) -> Vec<ColumnItem> {
        let screen = Screen::new(640, 480, VIEWPORT);
        let plane = ProjPlane::new(cam.focal, VIEWPORT.y, cam.v_angle);
        let mut hits = CastResult::default();
        cast_ray(sg, cam.matrix(), screen.column_ray(320, cam.focal, 999.9), cam.region, 64, &mut hits)
            .unwrap();

        let walk = ColumnWalk {
            scene: sg,
            plane: &plane,
            eye_z: cam.eye_z(sg.region(cam.region).floor_height),
        };
        let mut out = Vec::new();
        walk.plan(cam.region, &hits.intersections, &mut out);
        out
    }

    fn camera(region: RegionId) -> Camera {
        let mut cam = Camera::new(VIEWPORT.x, 60f64.to_radians(), region);
        cam.pos = dvec2(50.0, 0.0);
        cam.height = 50.0;
        cam
    }

    #[test]
    fn subview_only_shrinks() {
        let (sg, rooms) = corridor();
        let items = plan_centre(&sg, &camera(rooms[0]));

        assert_eq!(items.len(), 3);
        assert!(matches!(items[0].kind, ColumnKind::Portal { .. }));
        assert!(matches!(items[1].kind, ColumnKind::Portal { .. }));
        assert!(matches!(items[2].kind, ColumnKind::Wall { .. }));

        let views: Vec<(f64, f64)> = items
            .iter()
            .map(|it| match it.kind {
                ColumnKind::Wall { slice, .. } => (slice.viewport_bottom_wd, slice.viewport_top_wd),
                ColumnKind::Portal { bottom, .. } => (bottom.viewport_bottom_wd, bottom.viewport_top_wd),
            })
            .collect();
        for w in views.windows(2) {
            assert!(w[1].0 >= w[0].0 && w[1].1 <= w[0].1, "{views:?}");
            assert!(w[1].1 - w[1].0 <= w[0].1 - w[0].0);
        }
        assert_eq!(items[1].near, rooms[1]);
        assert_eq!(items[2].near, rooms[2]);
    }

    #[test]
    fn portal_steps_span_the_height_differences() {
        let (sg, rooms) = corridor();
        let items = plan_centre(&sg, &camera(rooms[0]));

        let ColumnKind::Portal { bottom, top, far, .. } = items[0].kind else {
            panic!("first hit should be a portal");
        };
        assert_eq!(far, rooms[1]);
        assert!((bottom.slice_bottom_wd - 0.0).abs() < 1e-6);
        assert!((bottom.slice_top_wd - 20.0).abs() < 1e-6);
        assert!((top.slice_bottom_wd - 90.0).abs() < 1e-6);
        assert!((top.slice_top_wd - 100.0).abs() < 1e-6);
        assert!(!bottom.is_empty());
        assert!(!top.is_empty());
    }

    #[test]
    fn wall_slice_uses_its_own_region() {
        let (sg, rooms) = corridor();
        let items = plan_centre(&sg, &camera(rooms[0]));
        let ColumnKind::Wall { slice, .. } = items[2].kind else {
            panic!("last hit should be a wall");
        };
        // farther than the last opening, so nothing is clipped away
        assert!((slice.slice_bottom_wd - 40.0).abs() < 1e-6);
        assert!((slice.slice_top_wd - 80.0).abs() < 1e-6);
    }

    #[test]
    fn closed_opening_stops_the_walk() {
        let mut b = SceneBuilder::new();
        let root = b.add_region(None, 0.0, Some(100.0));
        let near = b.add_region(Some(root), 0.0, Some(100.0));
        // far floor above the near ceiling: nothing is visible through it
        let far = b.add_region(Some(root), 120.0, Some(200.0));
        b.add_portal(near, far, dvec2(200.0, -100.0), dvec2(200.0, 100.0), "MISSING", "MISSING")
            .unwrap();
        b.add_wall(far, dvec2(400.0, -100.0), dvec2(400.0, 100.0), "MISSING").unwrap();
        let sg = b.finish(&TextureBank::default_with_checker()).unwrap();

        let items = plan_centre(&sg, &camera(near));
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn open_air_extends_to_the_top() {
        let mut b = SceneBuilder::new();
        let root = b.add_region(None, 0.0, None);
        let yard = b.add_region(Some(root), 0.0, None);
        b.add_wall(yard, dvec2(300.0, -100.0), dvec2(300.0, 100.0), "MISSING").unwrap();
        let sg = b.finish(&TextureBank::default_with_checker()).unwrap();

        let items = plan_centre(&sg, &camera(yard));
        let ColumnKind::Wall { slice, .. } = items[0].kind else {
            panic!("expected a wall");
        };
        assert_eq!(slice.proj_slice_top_wd, slice.viewport_top_wd);
        assert!(slice.slice_top_wd.is_finite());
    }
}
