use crate::geom::LineSegment;
use crate::world::texture::TextureId;

pub type RegionId = u32;
pub type EdgeId = u32;

/// Runtime snapshot of one level (immutable while a frame is drawn).
///
/// Regions and edges live in flat arenas; every cross-reference (parent,
/// children, portal partners) is an index into them.
#[derive(Debug)]
pub struct SceneGraph {
    pub regions: Vec<Region>,
    pub edges: Vec<Edge>,
    pub(crate) root: RegionId,
}

/*----------------------------- regions ------------------------------*/

/// Convex area with a flat floor and an optional flat ceiling.
///
/// The polygon itself is implicit: it is whatever the edge list encloses.
#[derive(Clone, Debug)]
pub struct Region {
    pub id: RegionId,
    pub parent: Option<RegionId>,
    pub children: Vec<RegionId>,
    pub edges: Vec<EdgeId>,
    pub floor_height: f64,
    /// `None` = open air, nothing is drawn above the walls.
    pub ceiling_height: Option<f64>,
    pub floor_texture: TextureId,
    pub ceiling_texture: Option<TextureId>,
}

impl Region {
    /// Whether height `z` is between floor and ceiling.
    #[inline]
    pub fn contains_height(&self, z: f64) -> bool {
        z >= self.floor_height && self.ceiling_height.is_none_or(|c| z <= c)
    }
}

/*------------------------------ edges -------------------------------*/

#[derive(Clone, Debug)]
pub struct Edge {
    pub id: EdgeId,
    pub lseg: LineSegment,
    pub kind: EdgeKind,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EdgeKind {
    /// Opaque boundary of exactly one region.
    Wall { region: RegionId, texture: TextureId },
    /// Opening between two regions. `bottom_texture` covers a step up in
    /// floor height, `top_texture` a step down in ceiling height.
    Portal {
        regions: [RegionId; 2],
        bottom_texture: TextureId,
        top_texture: TextureId,
    },
}

impl Edge {
    /// For a portal, the region on the far side of `from`.
    ///
    /// Returns `None` for walls and for portals that do not touch `from`.
    pub fn other_region(&self, from: RegionId) -> Option<RegionId> {
        match self.kind {
            EdgeKind::Portal { regions: [a, b], .. } if a == from => Some(b),
            EdgeKind::Portal { regions: [a, b], .. } if b == from => Some(a),
            _ => None,
        }
    }

    /// Whether this edge bounds `region`.
    pub fn touches(&self, region: RegionId) -> bool {
        match self.kind {
            EdgeKind::Wall { region: r, .. } => r == region,
            EdgeKind::Portal { regions, .. } => regions.contains(&region),
        }
    }
}
