use glam::DVec2;
use hecs::{Entity, World};
use thiserror::Error;

use super::{
    Body, Position, Zone, ZoneChange,
    events::{EventQueue, GameEvent},
    spacial::ZoneIndex,
    zones::zone_change,
};
use crate::{
    visibility::TraversalError,
    world::{RegionId, SceneGraph},
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SpatialError {
    #[error("entity {0:?} has no spatial components")]
    UnknownEntity(Entity),

    #[error("region {0} is not in the scene")]
    UnknownRegion(RegionId),

    #[error(transparent)]
    Traversal(#[from] TraversalError),
}

/// Owns the scene graph plus every entity placed in it, and answers
/// gameplay's spatial questions between frames.
pub struct SpatialWorld {
    pub(super) scene: SceneGraph,
    pub(super) world: World,
    pub(super) index: ZoneIndex,
    pub(super) events: EventQueue,
    pub(super) max_depth: usize,
}

impl SpatialWorld {
    pub fn new(scene: SceneGraph, max_depth: usize) -> Self {
        Self {
            scene,
            world: World::new(),
            index: ZoneIndex::new(),
            events: EventQueue::new(),
            max_depth,
        }
    }

    #[inline]
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    #[inline]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Attach non-spatial components here; spatial ones must go through
    /// the methods below so the zone index stays in sync.
    #[inline]
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    #[inline]
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    #[inline]
    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    pub(super) fn check_region(&self, id: RegionId) -> Result<(), SpatialError> {
        self.scene
            .get_region(id)
            .map(|_| ())
            .ok_or(SpatialError::UnknownRegion(id))
    }

    /*──────────────────────── spawning ────────────────────────*/

    /// Spawn at `pos`, in whichever region contains it.
    pub fn spawn(&mut self, pos: DVec2, body: Body) -> Entity {
        let zone = self.scene.locate_region(pos);
        self.spawn_unchecked(zone, pos, body)
    }

    /// Spawn in an explicit zone (for points on shared boundaries).
    pub fn spawn_in(&mut self, zone: RegionId, pos: DVec2, body: Body) -> Result<Entity, SpatialError> {
        self.check_region(zone)?;
        Ok(self.spawn_unchecked(zone, pos, body))
    }

    fn spawn_unchecked(&mut self, zone: RegionId, pos: DVec2, body: Body) -> Entity {
        let ent = self.world.spawn((Position(pos), Zone(zone), body));
        self.index.insert(zone, ent);
        ent
    }

    pub fn despawn(&mut self, ent: Entity) -> Result<(), SpatialError> {
        let zone = self.zone(ent)?;
        self.index.remove(zone, ent);
        self.events.unsubscribe(ent);
        self.world
            .despawn(ent)
            .map_err(|_| SpatialError::UnknownEntity(ent))
    }

    /*──────────────────────── accessors ───────────────────────*/

    pub fn position(&self, ent: Entity) -> Result<DVec2, SpatialError> {
        self.world
            .get::<&Position>(ent)
            .map(|p| p.0)
            .map_err(|_| SpatialError::UnknownEntity(ent))
    }

    pub fn zone(&self, ent: Entity) -> Result<RegionId, SpatialError> {
        self.world
            .get::<&Zone>(ent)
            .map(|z| z.0)
            .map_err(|_| SpatialError::UnknownEntity(ent))
    }

    pub fn body(&self, ent: Entity) -> Result<Body, SpatialError> {
        self.world
            .get::<&Body>(ent)
            .map(|b| *b)
            .map_err(|_| SpatialError::UnknownEntity(ent))
    }

    /*──────────────────────── movement ────────────────────────*/

    /// Displace `ent` by `dv`.  The zone is looked up again from the new
    /// position; a crossing is returned and queued as an event.
    ///
    /// No collision is done here.
    pub fn move_entity(&mut self, ent: Entity, dv: DVec2) -> Result<Option<ZoneChange>, SpatialError> {
        let pos = self.position(ent)? + dv;
        let zone = self.scene.locate_region(pos);
        self.relocate_entity(ent, zone, pos)
    }

    /// Put `ent` at `pos` in `zone`, reporting a crossing as
    /// [`SpatialWorld::move_entity`] does.
    pub fn relocate_entity(
        &mut self,
        ent: Entity,
        zone: RegionId,
        pos: DVec2,
    ) -> Result<Option<ZoneChange>, SpatialError> {
        self.check_region(zone)?;
        let old = self.zone(ent)?;

        {
            let (p, z) = self
                .world
                .query_one_mut::<(&mut Position, &mut Zone)>(ent)
                .map_err(|_| SpatialError::UnknownEntity(ent))?;
            p.0 = pos;
            z.0 = zone;
        }
        self.index.relocate(ent, old, zone);

        let change = zone_change(&self.scene, ent, old, zone);
        if let Some(c) = &change {
            log::trace!(
                "{ent:?} zone {} → {} (left {:?}, entered {:?})",
                c.old_zone,
                c.new_zone,
                c.zones_left,
                c.zones_entered
            );
            self.events.push(GameEvent::ChangedZone(c.clone()));
        }
        Ok(change)
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        sim::{EventKind, Subscription},
        world::{SceneBuilder, TextureBank},
    };
    use glam::dvec2;

    /// Two 100×100 rooms side by side, joined at x = 100.
    fn world() -> (SpatialWorld, RegionId, RegionId) {
        let mut b = SceneBuilder::new();
        let root = b.add_region(None, 0.0, Some(100.0));
        let west = b.add_region(Some(root), 0.0, Some(100.0));
        let east = b.add_region(Some(root), 0.0, Some(100.0));
        for (r, x0) in [(west, 0.0), (east, 100.0)] {
            let x1 = x0 + 100.0;
            b.add_wall(r, dvec2(x0, 0.0), dvec2(x1, 0.0), "MISSING").unwrap();
            b.add_wall(r, dvec2(x1, 100.0), dvec2(x0, 100.0), "MISSING").unwrap();
        }
        b.add_wall(west, dvec2(0.0, 100.0), dvec2(0.0, 0.0), "MISSING").unwrap();
        b.add_wall(east, dvec2(200.0, 0.0), dvec2(200.0, 100.0), "MISSING").unwrap();
        b.add_portal(west, east, dvec2(100.0, 0.0), dvec2(100.0, 100.0), "MISSING", "MISSING")
            .unwrap();
        let sg = b.finish(&TextureBank::default_with_checker()).unwrap();
        (SpatialWorld::new(sg, 64), west, east)
    }

    #[test]
    fn spawn_locates_the_zone() {
        let (mut sw, west, east) = world();
        let a = sw.spawn(dvec2(50.0, 50.0), Body::new(10.0, 50.0));
        let b = sw.spawn(dvec2(150.0, 50.0), Body::new(10.0, 50.0));
        assert_eq!(sw.zone(a).unwrap(), west);
        assert_eq!(sw.zone(b).unwrap(), east);
        assert_eq!(sw.index.entities(west), &[a]);
    }

    #[test]
    fn moving_through_the_portal_reports_a_crossing() {
        let (mut sw, west, east) = world();
        let e = sw.spawn(dvec2(80.0, 50.0), Body::new(10.0, 50.0));

        assert!(sw.move_entity(e, dvec2(10.0, 0.0)).unwrap().is_none());
        assert_eq!(sw.events().pending(), 0);

        let c = sw.move_entity(e, dvec2(20.0, 0.0)).unwrap().unwrap();
        assert_eq!((c.old_zone, c.new_zone), (west, east));
        assert_eq!(c.zones_left, [west].into());
        assert_eq!(c.zones_entered, [east].into());

        assert_eq!(sw.position(e).unwrap(), dvec2(110.0, 50.0));
        assert_eq!(sw.zone(e).unwrap(), east);
        assert!(sw.index.entities(west).is_empty());
        assert_eq!(sw.events().pending(), 1);
    }

    #[test]
    fn relocation_and_subscriptions() {
        let (mut sw, west, east) = world();
        let e = sw.spawn(dvec2(50.0, 50.0), Body::new(10.0, 50.0));
        sw.events_mut().subscribe(Subscription {
            entity: Some(e),
            kind: EventKind::ChangedZone,
            payload: 3,
        });

        let c = sw.relocate_entity(e, east, dvec2(150.0, 20.0)).unwrap();
        assert_eq!(c.map(|c| c.new_zone), Some(east));
        sw.relocate_entity(e, west, dvec2(50.0, 20.0)).unwrap();

        let d = sw.events_mut().dispatch();
        assert_eq!(d.len(), 2);
        assert!(d.iter().all(|d| d.subscription.payload == 3));
    }

    #[test]
    fn bad_ids_are_errors() {
        let (mut sw, west, _) = world();
        let e = sw.spawn(dvec2(50.0, 50.0), Body::new(10.0, 50.0));

        assert_eq!(
            sw.relocate_entity(e, 77, dvec2(0.0, 0.0)).unwrap_err(),
            SpatialError::UnknownRegion(77)
        );
        assert_eq!(sw.zone(e).unwrap(), west);

        sw.despawn(e).unwrap();
        assert!(sw.index.is_empty());
        assert_eq!(sw.move_entity(e, dvec2(1.0, 0.0)).unwrap_err(), SpatialError::UnknownEntity(e));
        assert_eq!(sw.despawn(e).unwrap_err(), SpatialError::UnknownEntity(e));
        assert!(sw.spawn_in(5, dvec2(0.0, 0.0), Body::new(1.0, 1.0)).is_err());
    }
}
