// ──────────────────────────────────────────────────────────────────────────
// world/builder.rs
//
//  *   regions / walls / portals (by name)   ──╮
//  *   TextureBank (resolved, read-only)       │   --->  world::SceneGraph
//                                              ╯
//  Whatever produced the level (a map parser, a test, the demo viewer)
//  describes it through `SceneBuilder`; `finish` checks every structural
//  invariant once so the traversal never has to.
// ──────────────────────────────────────────────────────────────────────────

use glam::DVec2;
use thiserror::Error;

use crate::{
    geom::LineSegment,
    world::{
        geometry::{Edge, EdgeId, EdgeKind, Region, RegionId, SceneGraph},
        texture::{TextureBank, TextureId},
    },
};

/*──────────────────────────── Error type ───────────────────────────*/

#[derive(Error, Debug, PartialEq)]
pub enum SceneError {
    #[error("region {0} does not exist")]
    UnknownRegion(RegionId),

    #[error("scene has no root region")]
    NoRoot,

    #[error("regions {0} and {1} both have no parent")]
    MultipleRoots(RegionId, RegionId),

    #[error("region {0} is its own ancestor")]
    ParentCycle(RegionId),

    #[error("region {region}: floor {floor} is above ceiling {ceiling}")]
    FloorAboveCeiling {
        region: RegionId,
        floor: f64,
        ceiling: f64,
    },

    #[error("portal {0} joins region {1} to itself")]
    SelfPortal(EdgeId, RegionId),

    #[error("portal {edge} joins unrelated regions {a} and {b}")]
    UnrelatedPortal {
        edge: EdgeId,
        a: RegionId,
        b: RegionId,
    },

    #[error("unknown texture `{0}`")]
    UnknownTexture(String),
}

/*────────────────────────────── drafts ─────────────────────────────*/

#[derive(Clone, Debug)]
struct RegionDraft {
    parent: Option<RegionId>,
    floor_height: f64,
    ceiling_height: Option<f64>,
    floor_texture: String,
    ceiling_texture: String,
}

#[derive(Clone, Debug)]
enum EdgeDraft {
    Wall {
        lseg: LineSegment,
        region: RegionId,
        texture: String,
    },
    Portal {
        lseg: LineSegment,
        regions: [RegionId; 2],
        bottom_texture: String,
        top_texture: String,
    },
}

/// Incremental description of a level, validated by [`SceneBuilder::finish`].
#[derive(Default, Debug)]
pub struct SceneBuilder {
    regions: Vec<RegionDraft>,
    edges: Vec<EdgeDraft>,
}

/*====================================================================*/
/*                       Public API                                   */
/*====================================================================*/

impl SceneBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region; `parent = None` marks the root.
    ///
    /// Flats default to the bank's `"MISSING"` texture, see [`Self::set_flats`].
    pub fn add_region(
        &mut self,
        parent: Option<RegionId>,
        floor_height: f64,
        ceiling_height: Option<f64>,
    ) -> RegionId {
        let id = self.regions.len() as RegionId;
        self.regions.push(RegionDraft {
            parent,
            floor_height,
            ceiling_height,
            floor_texture: "MISSING".into(),
            ceiling_texture: "MISSING".into(),
        });
        id
    }

    pub fn set_flats(
        &mut self,
        region: RegionId,
        floor_texture: &str,
        ceiling_texture: &str,
    ) -> Result<(), SceneError> {
        let draft = self
            .regions
            .get_mut(region as usize)
            .ok_or(SceneError::UnknownRegion(region))?;
        draft.floor_texture = floor_texture.into();
        draft.ceiling_texture = ceiling_texture.into();
        Ok(())
    }

    pub fn add_wall(
        &mut self,
        region: RegionId,
        a: DVec2,
        b: DVec2,
        texture: &str,
    ) -> Result<EdgeId, SceneError> {
        self.check_region(region)?;
        let id = self.edges.len() as EdgeId;
        self.edges.push(EdgeDraft::Wall {
            lseg: LineSegment::new(a, b),
            region,
            texture: texture.into(),
        });
        Ok(id)
    }

    pub fn add_portal(
        &mut self,
        region_a: RegionId,
        region_b: RegionId,
        a: DVec2,
        b: DVec2,
        bottom_texture: &str,
        top_texture: &str,
    ) -> Result<EdgeId, SceneError> {
        self.check_region(region_a)?;
        self.check_region(region_b)?;
        let id = self.edges.len() as EdgeId;
        if region_a == region_b {
            return Err(SceneError::SelfPortal(id, region_a));
        }
        self.edges.push(EdgeDraft::Portal {
            lseg: LineSegment::new(a, b),
            regions: [region_a, region_b],
            bottom_texture: bottom_texture.into(),
            top_texture: top_texture.into(),
        });
        Ok(id)
    }

    /// Resolve texture names against `bank`, wire up children / edge lists
    /// and check every structural invariant.
    pub fn finish(self, bank: &TextureBank) -> Result<SceneGraph, SceneError> {
        let tex = |name: &str| -> Result<TextureId, SceneError> {
            bank.id(name)
                .ok_or_else(|| SceneError::UnknownTexture(name.to_string()))
        };

        /*----- 1. regions, parents, heights ------------------------------*/
        let mut root = None;
        let mut regions = Vec::with_capacity(self.regions.len());
        for (idx, d) in self.regions.iter().enumerate() {
            let id = idx as RegionId;
            match d.parent {
                None => match root {
                    None => root = Some(id),
                    Some(first) => return Err(SceneError::MultipleRoots(first, id)),
                },
                Some(p) => self.check_region(p)?,
            }
            if let Some(ceiling) = d.ceiling_height {
                if d.floor_height > ceiling {
                    return Err(SceneError::FloorAboveCeiling {
                        region: id,
                        floor: d.floor_height,
                        ceiling,
                    });
                }
            }
            regions.push(Region {
                id,
                parent: d.parent,
                children: Vec::new(),
                edges: Vec::new(),
                floor_height: d.floor_height,
                ceiling_height: d.ceiling_height,
                floor_texture: tex(&d.floor_texture)?,
                ceiling_texture: match d.ceiling_height {
                    Some(_) => Some(tex(&d.ceiling_texture)?),
                    None => None,
                },
            });
        }
        let root = root.ok_or(SceneError::NoRoot)?;

        for id in 0..regions.len() {
            let mut cur = regions[id].parent;
            let mut steps = 0;
            while let Some(p) = cur {
                steps += 1;
                if p as usize == id || steps > regions.len() {
                    return Err(SceneError::ParentCycle(id as RegionId));
                }
                cur = regions[p as usize].parent;
            }
            if let Some(p) = regions[id].parent {
                regions[p as usize].children.push(id as RegionId);
            }
        }

        /*----- 2. edges --------------------------------------------------*/
        let mut edges = Vec::with_capacity(self.edges.len());
        for (idx, d) in self.edges.iter().enumerate() {
            let id = idx as EdgeId;
            let edge = match d {
                EdgeDraft::Wall {
                    lseg,
                    region,
                    texture,
                } => {
                    regions[*region as usize].edges.push(id);
                    Edge {
                        id,
                        lseg: *lseg,
                        kind: EdgeKind::Wall {
                            region: *region,
                            texture: tex(texture)?,
                        },
                    }
                }
                EdgeDraft::Portal {
                    lseg,
                    regions: [a, b],
                    bottom_texture,
                    top_texture,
                } => {
                    if !Self::related(&regions, *a, *b) {
                        return Err(SceneError::UnrelatedPortal {
                            edge: id,
                            a: *a,
                            b: *b,
                        });
                    }
                    regions[*a as usize].edges.push(id);
                    regions[*b as usize].edges.push(id);
                    Edge {
                        id,
                        lseg: *lseg,
                        kind: EdgeKind::Portal {
                            regions: [*a, *b],
                            bottom_texture: tex(bottom_texture)?,
                            top_texture: tex(top_texture)?,
                        },
                    }
                }
            };
            edges.push(edge);
        }

        log::debug!(
            "scene graph built: {} regions, {} edges, root {}",
            regions.len(),
            edges.len(),
            root
        );

        Ok(SceneGraph {
            regions,
            edges,
            root,
        })
    }

    /*────────────────────────── internals ──────────────────────────*/

    fn check_region(&self, id: RegionId) -> Result<(), SceneError> {
        if (id as usize) < self.regions.len() {
            Ok(())
        } else {
            Err(SceneError::UnknownRegion(id))
        }
    }

    /// Siblings, or one an ancestor of the other.
    fn related(regions: &[Region], a: RegionId, b: RegionId) -> bool {
        let is_ancestor = |anc: RegionId, of: RegionId| {
            let mut cur = regions[of as usize].parent;
            while let Some(p) = cur {
                if p == anc {
                    return true;
                }
                cur = regions[p as usize].parent;
            }
            false
        };
        regions[a as usize].parent == regions[b as usize].parent
            || is_ancestor(a, b)
            || is_ancestor(b, a)
    }
}

/*====================================================================*/
/*                               Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::texture::Texture;
    use glam::dvec2;

    fn bank() -> TextureBank {
        let mut bank = TextureBank::default_with_checker();
        bank.insert("BRICK", Texture::solid("BRICK", 4, 4, 0xFF_80_20_20))
            .unwrap();
        bank
    }

    #[test]
    fn portal_is_listed_on_both_sides() {
        let mut b = SceneBuilder::new();
        let root = b.add_region(None, 0.0, None);
        let r1 = b.add_region(Some(root), 0.0, Some(50.0));
        let r2 = b.add_region(Some(root), 10.0, Some(40.0));
        let p = b
            .add_portal(r1, r2, dvec2(0.0, 0.0), dvec2(0.0, 10.0), "BRICK", "BRICK")
            .unwrap();
        let sg = b.finish(&bank()).unwrap();

        assert_eq!(sg.root(), root);
        assert_eq!(sg.region(r1).edges, vec![p]);
        assert_eq!(sg.region(r2).edges, vec![p]);
        assert_eq!(sg.edge(p).other_region(r1), Some(r2));
        assert_eq!(sg.edge(p).other_region(r2), Some(r1));
        assert_eq!(sg.edge(p).other_region(root), None);
        assert_eq!(sg.region(root).children, vec![r1, r2]);
        assert_eq!(sg.region(root).ceiling_texture, None);
    }

    #[test]
    fn floor_above_ceiling_is_fatal() {
        let mut b = SceneBuilder::new();
        b.add_region(None, 10.0, Some(5.0));
        assert!(matches!(
            b.finish(&bank()),
            Err(SceneError::FloorAboveCeiling { region: 0, .. })
        ));
    }

    #[test]
    fn unknown_texture_is_fatal() {
        let mut b = SceneBuilder::new();
        let root = b.add_region(None, 0.0, Some(10.0));
        b.add_wall(root, dvec2(0.0, 0.0), dvec2(1.0, 0.0), "NOPE")
            .unwrap();
        assert_eq!(
            b.finish(&bank()).unwrap_err(),
            SceneError::UnknownTexture("NOPE".into())
        );
    }

    #[test]
    fn malformed_portals_rejected() {
        let mut b = SceneBuilder::new();
        let root = b.add_region(None, 0.0, Some(10.0));
        assert_eq!(
            b.add_portal(root, root, dvec2(0.0, 0.0), dvec2(1.0, 0.0), "BRICK", "BRICK"),
            Err(SceneError::SelfPortal(0, root))
        );
        assert_eq!(
            b.add_portal(root, 7, dvec2(0.0, 0.0), dvec2(1.0, 0.0), "BRICK", "BRICK"),
            Err(SceneError::UnknownRegion(7))
        );

        // cousins: children of two different siblings
        let a = b.add_region(Some(root), 0.0, Some(10.0));
        let c = b.add_region(Some(root), 0.0, Some(10.0));
        let a1 = b.add_region(Some(a), 0.0, Some(10.0));
        let c1 = b.add_region(Some(c), 0.0, Some(10.0));
        b.add_portal(a1, c1, dvec2(0.0, 0.0), dvec2(1.0, 0.0), "BRICK", "BRICK")
            .unwrap();
        assert!(matches!(
            b.finish(&bank()),
            Err(SceneError::UnrelatedPortal { .. })
        ));
    }

    #[test]
    fn root_count_checked() {
        let mut b = SceneBuilder::new();
        let a = b.add_region(Some(1), 0.0, None);
        let c = b.add_region(Some(a), 0.0, None);
        assert!(c == 1);
        assert_eq!(b.finish(&bank()).unwrap_err(), SceneError::NoRoot);

        let mut b = SceneBuilder::new();
        b.add_region(None, 0.0, None);
        b.add_region(None, 0.0, None);
        assert_eq!(
            b.finish(&bank()).unwrap_err(),
            SceneError::MultipleRoots(0, 1)
        );
    }
}
