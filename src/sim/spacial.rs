//! Zone → entity index.
//!
//! * One bucket per region that currently holds something.
//! * Each bucket is a `SmallVec`; zones rarely hold more than a handful of
//!   live entities, so lookups stay allocation-free in the common case.
//!
//! The index is **write-through** from [`SpatialWorld`]: every spawn,
//! despawn and zone change updates it in the same call.
//!
//! [`SpatialWorld`]: super::SpatialWorld

use hecs::Entity;
use smallvec::SmallVec;
use std::collections::HashMap;

use crate::world::RegionId;

/// Small fixed-capacity bucket
type Bucket = SmallVec<[Entity; 8]>;

#[derive(Default, Debug)]
pub struct ZoneIndex {
    zones: HashMap<RegionId, Bucket>,
}

impl ZoneIndex {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn insert(&mut self, zone: RegionId, ent: Entity) {
        self.zones.entry(zone).or_default().push(ent);
    }

    /// Remove `ent` from `zone`; returns whether it was there.
    pub fn remove(&mut self, zone: RegionId, ent: Entity) -> bool {
        let Some(bucket) = self.zones.get_mut(&zone) else {
            return false;
        };
        let Some(i) = bucket.iter().position(|&e| e == ent) else {
            return false;
        };
        bucket.swap_remove(i);
        if bucket.is_empty() {
            self.zones.remove(&zone);
        }
        true
    }

    pub fn relocate(&mut self, ent: Entity, from: RegionId, to: RegionId) {
        if from != to {
            self.remove(from, ent);
            self.insert(to, ent);
        }
    }

    /// Entities standing directly in `zone` (not in its children).
    #[inline]
    pub fn entities(&self, zone: RegionId) -> &[Entity] {
        self.zones.get(&zone).map(|b| b.as_slice()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.zones.values().map(|b| b.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;

    #[test]
    fn buckets_follow_relocation() {
        let mut world = World::new();
        let a = world.spawn(());
        let b = world.spawn(());

        let mut idx = ZoneIndex::new();
        idx.insert(1, a);
        idx.insert(1, b);
        assert_eq!(idx.entities(1).len(), 2);

        idx.relocate(a, 1, 2);
        assert_eq!(idx.entities(1), &[b]);
        assert_eq!(idx.entities(2), &[a]);
        assert_eq!(idx.len(), 2);

        assert!(idx.remove(1, b));
        assert!(!idx.remove(1, b));
        assert!(idx.entities(1).is_empty());
        assert!(idx.entities(7).is_empty());
    }
}
