//! Portal-aware ray casting through the region graph.
//!
//! The ray lives in a local frame (camera space for rendering, the query
//! origin's frame for gameplay rays): origin at `(0, 0)`, pointing down
//! +X.  Every edge is moved into that frame before testing, so
//! `point_cam.x` is directly the distance along the view axis.
//!
//! The walk:
//! 1. always recurses into every child region (nested areas are tested
//!    regardless of occlusion);
//! 2. tests every edge of the region except the portal it came through;
//! 3. on a portal hit, continues into the region on the other side with
//!    that portal excluded.
//!
//! Results come back unordered; [`cast_ray`] sorts them near → far.

use glam::{DAffine2, DVec2};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    geom::{LineSegment, line_segment_intersect},
    world::{EdgeId, EdgeKind, RegionId, SceneGraph},
};

/// What a ray ran into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum XKind {
    Wall(EdgeId),
    Portal(EdgeId),
}

#[derive(Clone, Copy, Debug)]
pub struct Intersection {
    pub kind: XKind,
    /// Hit point in the ray's local frame.
    pub point_cam: DVec2,
    pub point_world: DVec2,
    /// Local x of the hit, i.e. depth along the ray's axis.
    pub distance_from_camera: f64,
    /// Distance from the edge's first endpoint (horizontal texture coord).
    pub distance_along_target: f64,
    /// Region whose edge list produced this hit.
    pub region: RegionId,
}

impl Intersection {
    #[inline]
    pub fn edge(&self) -> EdgeId {
        match self.kind {
            XKind::Wall(e) | XKind::Portal(e) => e,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TraversalError {
    /// Recursion went deeper than any sane level allows; the portal /
    /// parent links form a loop the exclusion rule cannot break.
    #[error("region walk exceeded depth {limit} at region {region}; region graph is malformed")]
    DepthExceeded { limit: usize, region: RegionId },
}

/// Scratch filled by one cast.  Reuse across columns to keep allocations
/// out of the render loop.
#[derive(Default, Debug)]
pub struct CastResult {
    pub intersections: Vec<Intersection>,
    /// Every region whose edges were tested, in visiting order.
    pub regions: SmallVec<[RegionId; 8]>,
}

impl CastResult {
    pub fn clear(&mut self) {
        self.intersections.clear();
        self.regions.clear();
    }

    /// Near → far by `distance_from_camera`; ties keep discovery order.
    pub fn sort(&mut self) {
        self.intersections
            .sort_by(|a, b| a.distance_from_camera.total_cmp(&b.distance_from_camera));
    }

    #[inline]
    fn has_edge(&self, edge: EdgeId) -> bool {
        self.intersections.iter().any(|x| x.edge() == edge)
    }
}

/// One ray, ready to be walked through a scene.
pub struct RayCaster<'s> {
    scene: &'s SceneGraph,
    /// local → world
    frame: DAffine2,
    /// world → local
    inv_frame: DAffine2,
    ray: LineSegment,
    max_depth: usize,
}

impl<'s> RayCaster<'s> {
    /// `ray` is expressed in the local frame `frame` (local → world).
    pub fn new(scene: &'s SceneGraph, frame: DAffine2, ray: LineSegment, max_depth: usize) -> Self {
        Self {
            scene,
            frame,
            inv_frame: frame.inverse(),
            ray,
            max_depth,
        }
    }

    /// Collect every edge crossing reachable from `region`, appending to
    /// `result`.  `exclude` is the portal the ray just came through.
    pub fn find_intersections(
        &self,
        region: RegionId,
        exclude: Option<EdgeId>,
        result: &mut CastResult,
    ) -> Result<(), TraversalError> {
        self.walk(region, exclude, 0, result)
    }

    fn walk(
        &self,
        region: RegionId,
        exclude: Option<EdgeId>,
        depth: usize,
        result: &mut CastResult,
    ) -> Result<(), TraversalError> {
        if depth > self.max_depth {
            return Err(TraversalError::DepthExceeded {
                limit: self.max_depth,
                region,
            });
        }
        if !result.regions.contains(&region) {
            result.regions.push(region);
        }

        let r = self.scene.region(region);

        for &child in &r.children {
            self.walk(child, None, depth + 1, result)?;
        }

        for &edge_id in &r.edges {
            if exclude == Some(edge_id) {
                continue;
            }
            let edge = self.scene.edge(edge_id);
            let lseg = edge.lseg.transform(&self.inv_frame);

            let Some(pt) = line_segment_intersect(&self.ray, &lseg) else {
                continue;
            };
            // A straight ray meets an edge once; a second report is the
            // same crossing reached through another path.
            if result.has_edge(edge_id) {
                continue;
            }

            let kind = match edge.kind {
                EdgeKind::Wall { .. } => XKind::Wall(edge_id),
                EdgeKind::Portal { .. } => XKind::Portal(edge_id),
            };
            result.intersections.push(Intersection {
                kind,
                point_cam: pt,
                point_world: self.frame.transform_point2(pt),
                distance_from_camera: pt.x,
                distance_along_target: lseg.a.distance(pt),
                region,
            });

            if let XKind::Portal(_) = kind {
                if let Some(next) = edge.other_region(region) {
                    self.walk(next, Some(edge_id), depth + 1, result)?;
                }
            }
        }
        Ok(())
    }
}

/// Cast `ray` (local frame `frame`) from `start` and sort the hits.
pub fn cast_ray(
    scene: &SceneGraph,
    frame: DAffine2,
    ray: LineSegment,
    start: RegionId,
    max_depth: usize,
    result: &mut CastResult,
) -> Result<(), TraversalError> {
    result.clear();
    RayCaster::new(scene, frame, ray, max_depth).find_intersections(start, None, result)?;
    result.sort();
    Ok(())
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
