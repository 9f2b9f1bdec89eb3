//! Entity-oriented ray and radius queries.
//!
//! The ray queries reuse the visibility traversal: the ray is cast in a
//! frame centred on the query origin and facing along the ray, every
//! region the cast touches is scanned for entities, and each entity is
//! tested as a billboard perpendicular to the ray.

use glam::{DAffine2, DVec2, dvec2};
use hecs::Entity;
use std::collections::BTreeSet;

use super::{
    Body, Position, SpatialError, SpatialWorld,
    events::{Activation, GameEvent},
};
use crate::{
    geom::{self, LineSegment},
    visibility::{CastResult, Intersection, XKind, cast_ray},
    world::{EdgeKind, Region, RegionId},
};

/// One entity struck by a query ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntityHit {
    pub entity: Entity,
    pub point_world: DVec2,
    /// Along the ray, from the query origin.
    pub distance: f64,
    /// Absolute height of the ray at the hit (3-D queries only).
    pub height: Option<f64>,
}

/// Shared result of casting a query ray: the frame it was cast in, the
/// sorted edge hits and the regions it visited.
struct QueryRay {
    inv_frame: DAffine2,
    cast: CastResult,
}

impl SpatialWorld {
    fn cast_query(
        &self,
        region: RegionId,
        origin: DVec2,
        dir: DVec2,
        distance: f64,
    ) -> Result<Option<QueryRay>, SpatialError> {
        self.check_region(region)?;
        if dir.length_squared() == 0.0 || !(distance > 0.0) {
            return Ok(None);
        }
        let frame = geom::frame(origin, dir.to_angle());
        let ray = LineSegment::new(DVec2::ZERO, dvec2(distance, 0.0));

        let mut cast = CastResult::default();
        cast_ray(&self.scene, frame, ray, region, self.max_depth, &mut cast)?;
        Ok(Some(QueryRay {
            inv_frame: frame.inverse(),
            cast,
        }))
    }

    /// Billboard test of every entity in the regions `q` visited, up to
    /// `limit` along the ray.  `slope` is `(start height, rise per unit)`
    /// for 3-D rays; hits then also need the ray inside the body's
    /// vertical extent.
    fn collect_hits(&self, q: &QueryRay, limit: f64, slope: Option<(f64, f64)>) -> Vec<EntityHit> {
        let mut hits = Vec::new();
        for &zone in &q.cast.regions {
            for &ent in self.index.entities(zone) {
                let Ok(mut query) = self.world.query_one::<(&Position, &Body)>(ent) else {
                    continue;
                };
                let Some((pos, body)) = query.get() else {
                    continue;
                };
                let local = q.inv_frame.transform_point2(pos.0);
                // a hit exactly at the stopping wall still counts
                if local.x < 0.0 || local.x > limit + geom::SELF_INTERSECT_EPSILON {
                    continue;
                }
                if local.y.abs() > body.half_width() {
                    continue;
                }

                let height = match slope {
                    Some((z0, rise)) => {
                        let z = z0 + local.x * rise;
                        let (bottom, top) = body.z_range(self.scene.region(zone).floor_height);
                        if !(bottom..=top).contains(&z) {
                            continue;
                        }
                        Some(z)
                    }
                    None => None,
                };
                hits.push(EntityHit {
                    entity: ent,
                    point_world: pos.0,
                    distance: local.x,
                    height,
                });
            }
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    /// Distance to the first wall along a ray, if one is within
    /// `distance`.  Portals never stop the ray.
    pub fn first_wall_along(
        &self,
        region: RegionId,
        origin: DVec2,
        dir: DVec2,
        distance: f64,
    ) -> Result<Option<f64>, SpatialError> {
        let Some(q) = self.cast_query(region, origin, dir, distance)? else {
            return Ok(None);
        };
        Ok(first_wall(&q.cast.intersections))
    }

    /// Entities the ray from `origin` along `dir` passes through, nearest
    /// first.  Nothing behind the first wall is reported.
    pub fn entities_along_ray(
        &self,
        region: RegionId,
        origin: DVec2,
        dir: DVec2,
        distance: f64,
    ) -> Result<Vec<EntityHit>, SpatialError> {
        let Some(q) = self.cast_query(region, origin, dir, distance)? else {
            return Ok(Vec::new());
        };
        let limit = first_wall(&q.cast.intersections).unwrap_or(distance);
        Ok(self.collect_hits(&q, limit, None))
    }

    /// Like [`SpatialWorld::entities_along_ray`], but the ray starts at
    /// absolute height `height` and climbs at `v_angle`.  Entities count
    /// only where the ray passes through their vertical extent; walls and
    /// portal steps block it only where they actually are.
    pub fn entities_along_3d_ray(
        &self,
        region: RegionId,
        origin: DVec2,
        height: f64,
        dir: DVec2,
        v_angle: f64,
        distance: f64,
    ) -> Result<Vec<EntityHit>, SpatialError> {
        let Some(q) = self.cast_query(region, origin, dir, distance)? else {
            return Ok(Vec::new());
        };
        let slope = v_angle.tan();
        let limit = self
            .reach_3d(region, &q.cast.intersections, height, slope)
            .min(distance);

        Ok(self.collect_hits(&q, limit, Some((height, slope))))
    }

    /// How far a sloped ray gets along the sorted `hits`, starting in
    /// `region` at height `z0`.
    ///
    /// The region the ray is in is tracked hit by hit.  The ray stops where
    /// it leaves that region's floor..ceiling band, at a wall whose region
    /// spans its height, or at a portal whose far side does not.
    fn reach_3d(&self, region: RegionId, hits: &[Intersection], z0: f64, slope: f64) -> f64 {
        let mut current = region;
        let mut from = 0.0;

        for x in hits {
            let d = x.distance_from_camera;
            if let Some(exit) = band_exit(self.scene.region(current), z0, slope, from) {
                if exit <= d {
                    return exit;
                }
            }

            let z = z0 + d * slope;
            let edge = self.scene.edge(x.edge());
            match edge.kind {
                EdgeKind::Wall { region: owner, .. } => {
                    if self.scene.region(owner).contains_height(z) {
                        return d;
                    }
                }
                EdgeKind::Portal { .. } => {
                    // the discovering region is only a fallback: a child
                    // walk can report a portal into its own parent first
                    let near = if edge.touches(current) { current } else { x.region };
                    let Some(far) = edge.other_region(near) else {
                        return d;
                    };
                    if !self.scene.region(far).contains_height(z) {
                        return d;
                    }
                    current = far;
                }
            }
            from = d;
        }

        band_exit(self.scene.region(current), z0, slope, from).unwrap_or(f64::INFINITY)
    }

    /// Entities within `radius` of `pos`, found by flooding out from
    /// `region`: into every child, through portals the circle reaches and
    /// up to the parent when the circle crosses one of the region's walls.
    pub fn entities_in_radius(
        &self,
        region: RegionId,
        pos: DVec2,
        radius: f64,
    ) -> Result<BTreeSet<Entity>, SpatialError> {
        self.check_region(region)?;

        let mut found = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut stack = vec![region];

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            for &ent in self.index.entities(id) {
                if let Ok(p) = self.world.get::<&Position>(ent) {
                    if p.0.distance(pos) <= radius {
                        found.insert(ent);
                    }
                }
            }

            let r = self.scene.region(id);
            stack.extend(r.children.iter().copied());
            for edge in self.scene.edges_of(id) {
                if edge.lseg.distance_to_point(pos) > radius {
                    continue;
                }
                match edge.kind {
                    EdgeKind::Portal { .. } => stack.extend(edge.other_region(id)),
                    EdgeKind::Wall { .. } => stack.extend(r.parent),
                }
            }
        }
        Ok(found)
    }

    /// Queue an activation by `ent`: everything within `radius` of it and
    /// everything along its line of sight `dir` up to `radius`.
    pub fn activate(&mut self, ent: Entity, dir: DVec2, radius: f64) -> Result<Activation, SpatialError> {
        let pos = self.position(ent)?;
        let zone = self.zone(ent)?;

        let mut in_radius = self.entities_in_radius(zone, pos, radius)?;
        in_radius.remove(&ent);
        let looking_at = self
            .entities_along_ray(zone, pos, dir, radius)?
            .into_iter()
            .map(|h| h.entity)
            .filter(|&e| e != ent)
            .collect();

        let activation = Activation {
            entity: ent,
            in_radius,
            looking_at,
        };
        self.events.push(GameEvent::Activate(activation.clone()));
        Ok(activation)
    }
}

/// First distance from `from` on where the ray `z0 + d * slope` is
/// outside `r`'s floor..ceiling band; `None` if it never leaves.
fn band_exit(r: &Region, z0: f64, slope: f64, from: f64) -> Option<f64> {
    if !r.contains_height(z0 + from * slope) {
        return Some(from);
    }
    if slope < 0.0 {
        Some((r.floor_height - z0) / slope)
    } else if slope > 0.0 {
        r.ceiling_height.map(|c| (c - z0) / slope)
    } else {
        None
    }
}

fn first_wall(hits: &[Intersection]) -> Option<f64> {
    hits.iter()
        .find(|x| matches!(x.kind, XKind::Wall(_)))
        .map(|x| x.distance_from_camera)
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{SceneBuilder, SceneGraph, TextureBank};

    /// Two rooms along +x joined by a portal at x = 200; the second has a
    /// raised floor (30) and lowered ceiling (80).
    fn two_rooms() -> (SceneGraph, [RegionId; 3]) {
        let mut b = SceneBuilder::new();
        let root = b.add_region(None, 0.0, None);
        let r1 = b.add_region(Some(root), 0.0, Some(100.0));
        let r2 = b.add_region(Some(root), 30.0, Some(80.0));

        let w = |b: &mut SceneBuilder, r: RegionId, ax: f64, ay: f64, bx: f64, by: f64| {
            b.add_wall(r, dvec2(ax, ay), dvec2(bx, by), "MISSING").unwrap();
        };
        w(&mut b, r1, 0.0, -100.0, 200.0, -100.0);
        w(&mut b, r1, 200.0, 100.0, 0.0, 100.0);
        w(&mut b, r1, 0.0, 100.0, 0.0, -100.0);
        b.add_portal(r1, r2, dvec2(200.0, -100.0), dvec2(200.0, 100.0), "MISSING", "MISSING")
            .unwrap();
        w(&mut b, r2, 200.0, -100.0, 400.0, -100.0);
        w(&mut b, r2, 400.0, -100.0, 400.0, 100.0);
        w(&mut b, r2, 400.0, 100.0, 200.0, 100.0);

        let sg = b.finish(&TextureBank::default_with_checker()).unwrap();
        (sg, [root, r1, r2])
    }

    struct Fixture {
        sw: SpatialWorld,
        zones: [RegionId; 3],
        a: Entity,
        b: Entity,
        c: Entity,
        beyond: Entity,
        outside: Entity,
    }

    fn fixture() -> Fixture {
        let (sg, zones) = two_rooms();
        let [root, _, r2] = zones;
        let mut sw = SpatialWorld::new(sg, 64);
        let body = Body::new(20.0, 50.0);

        let a = sw.spawn(dvec2(100.0, 0.0), body);
        let b = sw.spawn(dvec2(300.0, 0.0), body);
        let c = sw.spawn(dvec2(100.0, 50.0), body);
        // placed by hand behind r2's far wall
        let beyond = sw.spawn_in(r2, dvec2(450.0, 0.0), body).unwrap();
        let outside = sw.spawn(dvec2(-50.0, 0.0), body);
        assert_eq!(sw.zone(outside).unwrap(), root);

        Fixture {
            sw,
            zones,
            a,
            b,
            c,
            beyond,
            outside,
        }
    }

    fn ents(hits: &[EntityHit]) -> Vec<Entity> {
        hits.iter().map(|h| h.entity).collect()
    }

    #[test]
    fn ray_hits_in_order_and_stops_at_the_wall() {
        let f = fixture();
        let [_, r1, _] = f.zones;
        let hits = f
            .sw
            .entities_along_ray(r1, dvec2(50.0, 0.0), dvec2(1.0, 0.0), 1000.0)
            .unwrap();

        assert_eq!(ents(&hits), vec![f.a, f.b]);
        assert!((hits[0].distance - 50.0).abs() < 1e-9);
        assert!((hits[1].distance - 250.0).abs() < 1e-9);
        assert!(hits.iter().all(|h| h.height.is_none()));
        assert!(!ents(&hits).contains(&f.beyond));
    }

    #[test]
    fn ray_misses_entities_off_to_the_side() {
        let f = fixture();
        let [_, r1, _] = f.zones;
        // a is behind the origin, c straight ahead
        let hits = f
            .sw
            .entities_along_ray(r1, dvec2(100.0, 20.0), dvec2(0.0, 1.0), 1000.0)
            .unwrap();
        assert_eq!(ents(&hits), vec![f.c]);
        assert!((hits[0].distance - 30.0).abs() < 1e-9);
    }

    #[test]
    fn ray_length_and_direction_edge_cases() {
        let f = fixture();
        let [_, r1, _] = f.zones;
        let short = f
            .sw
            .entities_along_ray(r1, dvec2(50.0, 0.0), dvec2(1.0, 0.0), 20.0)
            .unwrap();
        assert!(short.is_empty());

        let none = f
            .sw
            .entities_along_ray(r1, dvec2(50.0, 0.0), DVec2::ZERO, 1000.0)
            .unwrap();
        assert!(none.is_empty());

        let err = f
            .sw
            .entities_along_ray(99, dvec2(50.0, 0.0), dvec2(1.0, 0.0), 1000.0)
            .unwrap_err();
        assert_eq!(err, SpatialError::UnknownRegion(99));
    }

    #[test]
    fn level_3d_ray_passes_the_portal_opening() {
        let f = fixture();
        let [_, r1, _] = f.zones;
        let hits = f
            .sw
            .entities_along_3d_ray(r1, dvec2(50.0, 0.0), 40.0, dvec2(1.0, 0.0), 0.0, 1000.0)
            .unwrap();
        assert_eq!(ents(&hits), vec![f.a, f.b]);
        assert_eq!(hits[1].height, Some(40.0));
    }

    #[test]
    fn low_3d_ray_is_stopped_by_the_step() {
        let f = fixture();
        let [_, r1, _] = f.zones;
        // z = 20 is below r2's floor (30)
        let hits = f
            .sw
            .entities_along_3d_ray(r1, dvec2(50.0, 0.0), 20.0, dvec2(1.0, 0.0), 0.0, 1000.0)
            .unwrap();
        assert_eq!(ents(&hits), vec![f.a]);
    }

    #[test]
    fn rising_3d_ray_passes_over_and_hits_the_lintel() {
        let f = fixture();
        let [_, r1, _] = f.zones;
        // slope 0.3: z = 55 over a (top at 50), 85 at the portal (r2 ceiling 80)
        let hits = f
            .sw
            .entities_along_3d_ray(r1, dvec2(50.0, 0.0), 40.0, dvec2(1.0, 0.0), 0.3f64.atan(), 1000.0)
            .unwrap();
        assert!(hits.is_empty());
    }

    /// A room (floor 0, ceiling 100) next to `next` across x = 200, both
    /// 200 wide.  `next` is built by `add` so it can be a sibling or a
    /// child of the room.
    fn room_and_neighbour(
        add: impl FnOnce(&mut SceneBuilder) -> (RegionId, RegionId),
    ) -> (SpatialWorld, RegionId, RegionId) {
        let mut b = SceneBuilder::new();
        let (room, next) = add(&mut b);
        let w = |b: &mut SceneBuilder, r: RegionId, ax: f64, ay: f64, bx: f64, by: f64| {
            b.add_wall(r, dvec2(ax, ay), dvec2(bx, by), "MISSING").unwrap();
        };
        w(&mut b, room, 0.0, -100.0, 200.0, -100.0);
        w(&mut b, room, 200.0, 100.0, 0.0, 100.0);
        w(&mut b, room, 0.0, 100.0, 0.0, -100.0);
        b.add_portal(room, next, dvec2(200.0, -100.0), dvec2(200.0, 100.0), "MISSING", "MISSING")
            .unwrap();
        w(&mut b, next, 200.0, -100.0, 400.0, -100.0);
        w(&mut b, next, 400.0, -100.0, 400.0, 100.0);
        w(&mut b, next, 400.0, 100.0, 200.0, 100.0);

        let sg = b.finish(&TextureBank::default_with_checker()).unwrap();
        (SpatialWorld::new(sg, 64), room, next)
    }

    #[test]
    fn descending_3d_ray_stops_at_its_own_floor() {
        let (mut sw, room, pit) = room_and_neighbour(|b| {
            let root = b.add_region(None, -100.0, None);
            let room = b.add_region(Some(root), 0.0, Some(100.0));
            let pit = b.add_region(Some(root), -100.0, Some(100.0));
            (room, pit)
        });
        let near = sw.spawn(dvec2(100.0, 0.0), Body::new(20.0, 50.0));
        let sunk = sw.spawn(dvec2(300.0, 0.0), Body::new(20.0, 50.0));
        assert_eq!(sw.zone(sunk).unwrap(), pit);

        // z = 40 - 0.4·d: 20 at `near`, the floor at d = 100, and -60 at
        // `sunk` (inside its -100..-50 extent) had it gone on
        let slope = -(0.4f64.atan());
        let hits = sw
            .entities_along_3d_ray(room, dvec2(50.0, 0.0), 40.0, dvec2(1.0, 0.0), slope, 1000.0)
            .unwrap();
        assert_eq!(ents(&hits), vec![near]);
        assert!((hits[0].height.unwrap() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn portal_into_a_child_uses_the_side_the_ray_came_from() {
        let (mut sw, hall, alcove) = room_and_neighbour(|b| {
            let hall = b.add_region(None, 0.0, Some(100.0));
            let alcove = b.add_region(Some(hall), 60.0, Some(100.0));
            (hall, alcove)
        });
        let e = sw.spawn_in(alcove, dvec2(250.0, 0.0), Body::new(20.0, 50.0)).unwrap();
        let from = dvec2(50.0, 0.0);

        // slope 0.25: 57.5 at the portal, under the alcove's raised floor
        let hits = sw
            .entities_along_3d_ray(hall, from, 20.0, dvec2(1.0, 0.0), 0.25f64.atan(), 1000.0)
            .unwrap();
        assert!(hits.is_empty());

        // slope 0.3: 65 at the portal, 80 at the entity (60..110)
        let hits = sw
            .entities_along_3d_ray(hall, from, 20.0, dvec2(1.0, 0.0), 0.3f64.atan(), 1000.0)
            .unwrap();
        assert_eq!(ents(&hits), vec![e]);
        assert!((hits[0].height.unwrap() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn radius_search_floods_through_portals() {
        let f = fixture();
        let [_, r1, _] = f.zones;
        let found = f.sw.entities_in_radius(r1, dvec2(190.0, 0.0), 120.0).unwrap();
        assert_eq!(found, [f.a, f.b, f.c].into_iter().collect());

        let near = f.sw.entities_in_radius(r1, dvec2(190.0, 0.0), 95.0).unwrap();
        assert_eq!(near, [f.a].into_iter().collect());
    }

    #[test]
    fn radius_search_climbs_to_the_parent_through_walls() {
        let f = fixture();
        let [_, r1, _] = f.zones;
        let found = f.sw.entities_in_radius(r1, dvec2(10.0, 0.0), 70.0).unwrap();
        assert!(found.contains(&f.outside));
        assert!(!found.contains(&f.b));

        // circle entirely inside r1: the parent is never consulted
        let inside = f.sw.entities_in_radius(r1, dvec2(100.0, 0.0), 40.0).unwrap();
        assert_eq!(inside, [f.a].into_iter().collect());
    }

    #[test]
    fn activation_collects_reach_and_sight() {
        let mut f = fixture();
        let player = f.sw.spawn(dvec2(60.0, 0.0), Body::new(10.0, 56.0));

        let act = f.sw.activate(player, dvec2(1.0, 0.0), 45.0).unwrap();
        assert_eq!(act.entity, player);
        assert_eq!(act.in_radius, [f.a].into_iter().collect());
        assert_eq!(act.looking_at, vec![f.a]);
        assert_eq!(f.sw.events().pending(), 1);
    }
}
