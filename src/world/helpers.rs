use glam::DVec2;
use std::collections::BTreeSet;

use crate::geom::point_in_polygon;

use super::{Edge, Region, RegionId, SceneGraph};
use super::geometry::EdgeId;

// ──────────────────────────────────────────────────────────────────────────
//                     SceneGraph – read-only traversal
// ──────────────────────────────────────────────────────────────────────────
impl SceneGraph {
    /// The region with no parent; every other region descends from it.
    #[inline(always)]
    pub fn root(&self) -> RegionId {
        self.root
    }

    #[inline]
    pub fn region(&self, id: RegionId) -> &Region {
        &self.regions[id as usize]
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id as usize]
    }

    /// Bounds-checked lookup, for ids coming from outside the graph.
    #[inline]
    pub fn get_region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id as usize)
    }

    pub fn children(&self, id: RegionId) -> impl Iterator<Item = &Region> + '_ {
        self.region(id).children.iter().map(|&c| self.region(c))
    }

    pub fn edges_of(&self, id: RegionId) -> impl Iterator<Item = &Edge> + '_ {
        self.region(id).edges.iter().map(|&e| self.edge(e))
    }

    /// Strict ancestors of `id`, root included.
    pub fn ancestors(&self, id: RegionId) -> BTreeSet<RegionId> {
        let mut out = BTreeSet::new();
        let mut cur = self.region(id).parent;
        while let Some(p) = cur {
            out.insert(p);
            cur = self.region(p).parent;
        }
        out
    }

    /// True if `a` is a strict ancestor of `b`.
    pub fn is_ancestor(&self, a: RegionId, b: RegionId) -> bool {
        let mut cur = self.region(b).parent;
        while let Some(p) = cur {
            if p == a {
                return true;
            }
            cur = self.region(p).parent;
        }
        false
    }

    /// Whether `p` lies inside the polygon bounded by `id`'s edges.
    /// A region with no edges of its own is unbounded.
    pub fn region_contains(&self, id: RegionId, p: DVec2) -> bool {
        let region = self.region(id);
        if region.edges.is_empty() {
            return true;
        }
        point_in_polygon(p, self.edges_of(id).map(|e| &e.lseg))
    }

    /// Deepest region containing `p`, descending from the root.
    ///
    /// Points outside the root polygon still resolve to the root.
    pub fn locate_region(&self, p: DVec2) -> RegionId {
        self.locate_region_below(self.root, p)
    }

    /// Deepest descendant of `start` (or `start` itself) containing `p`.
    pub fn locate_region_below(&self, start: RegionId, p: DVec2) -> RegionId {
        let mut idx = start;
        'descend: loop {
            for &child in &self.region(idx).children {
                if self.region_contains(child, p) {
                    idx = child;
                    continue 'descend;
                }
            }
            return idx;
        }
    }
}
