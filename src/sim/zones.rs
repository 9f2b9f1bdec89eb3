//! Zone-crossing detection.
//!
//! Zones nest, so leaving a room for a sibling does not leave the building
//! both sit in.  A crossing therefore reports the *sets* of zones left and
//! entered: `self ∪ ancestors` before, minus the same after, and vice versa.

use hecs::Entity;
use std::collections::BTreeSet;

use crate::world::{RegionId, SceneGraph};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneChange {
    pub entity: Entity,
    pub old_zone: RegionId,
    pub new_zone: RegionId,
    pub zones_left: BTreeSet<RegionId>,
    pub zones_entered: BTreeSet<RegionId>,
}

/// `id` and everything above it.
fn lineage(scene: &SceneGraph, id: RegionId) -> BTreeSet<RegionId> {
    let mut set = scene.ancestors(id);
    set.insert(id);
    set
}

/// Crossing from `old` to `new`, or `None` when the zone did not change.
pub fn zone_change(
    scene: &SceneGraph,
    entity: Entity,
    old: RegionId,
    new: RegionId,
) -> Option<ZoneChange> {
    if old == new {
        return None;
    }
    let before = lineage(scene, old);
    let after = lineage(scene, new);

    Some(ZoneChange {
        entity,
        old_zone: old,
        new_zone: new,
        zones_left: before.difference(&after).copied().collect(),
        zones_entered: after.difference(&before).copied().collect(),
    })
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
