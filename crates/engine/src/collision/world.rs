use glam::Vec3;

use super::shapes::{box_sweep_vs_shape, overlap_shapes, ray_vs_shape};
use super::{Collider, HitInfo, LayerMask};
use crate::app::{Entity, EntityId, SceneWorld};

/// Overlaps shallower than this are treated as resting contact.
const MIN_PENETRATION: f32 = 1.0e-4;

#[derive(Debug, Clone, Copy)]
pub struct QueryFilter<'a> {
    pub layers: LayerMask,
    pub ignore: &'a [EntityId],
}

impl<'a> QueryFilter<'a> {
    pub const fn new(layers: LayerMask) -> Self {
        Self {
            layers,
            ignore: &[],
        }
    }

    pub fn ignoring(mut self, ignore: &'a [EntityId]) -> Self {
        self.ignore = ignore;
        self
    }

    fn accepts(&self, collider: &Collider, entity: Option<EntityId>) -> bool {
        if !self.layers.contains(collider.layer) {
            return false;
        }
        match entity {
            Some(id) => !self.ignore.contains(&id),
            None => true,
        }
    }
}

impl Default for QueryFilter<'_> {
    fn default() -> Self {
        Self::new(LayerMask::ALL)
    }
}

/// Collision capability of a kind of thing in the level.
pub trait Collidable {
    fn collider(&self) -> Collider;
}

/// What queries walk over: a placed collider and the entity that owns it.
pub(crate) trait QueryCandidate {
    fn collision_entity(&self) -> Option<EntityId>;
    /// Collider and the position it is attached to, or `None` when not currently collidable.
    fn world_collider(&self) -> Option<(Collider, Vec3)>;
}

/// Level geometry that never moves and is not an entity.
#[derive(Debug, Clone)]
pub struct StaticBody {
    pub name: &'static str,
    pub position: Vec3,
    pub collider: Collider,
}

impl QueryCandidate for StaticBody {
    fn collision_entity(&self) -> Option<EntityId> {
        None
    }

    fn world_collider(&self) -> Option<(Collider, Vec3)> {
        Some((self.collider, self.position))
    }
}

impl QueryCandidate for Entity {
    fn collision_entity(&self) -> Option<EntityId> {
        Some(self.id)
    }

    fn world_collider(&self) -> Option<(Collider, Vec3)> {
        if !self.enabled {
            return None;
        }
        self.collider
            .map(|collider| (collider, self.transform.position))
    }
}

/// Synchronous collision queries. Every query returns a value; "nothing found" is
/// `HitInfo::miss()` or an empty list, including for degenerate input.
pub trait CollisionQuery {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter<'_>,
    ) -> HitInfo;

    fn boxcast(
        &self,
        origin: Vec3,
        half_extents: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter<'_>,
    ) -> HitInfo;

    fn overlap(&self, collider: &Collider, position: Vec3, filter: &QueryFilter<'_>)
        -> Vec<HitInfo>;

    /// Deepest single overlap, or a miss.
    fn intersect(&self, collider: &Collider, position: Vec3, filter: &QueryFilter<'_>) -> HitInfo {
        self.overlap(collider, position, filter)
            .into_iter()
            .max_by(|a, b| a.penetration.total_cmp(&b.penetration))
            .unwrap_or_else(HitInfo::miss)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollisionWorld {
    bodies: Vec<StaticBody>,
}

impl CollisionWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &'static str, position: Vec3, collider: Collider) {
        self.bodies.push(StaticBody {
            name,
            position,
            collider,
        });
    }

    pub fn bodies(&self) -> &[StaticBody] {
        &self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl CollisionQuery for CollisionWorld {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter<'_>,
    ) -> HitInfo {
        raycast_candidates(self.bodies.iter(), origin, direction, max_distance, filter)
    }

    fn boxcast(
        &self,
        origin: Vec3,
        half_extents: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter<'_>,
    ) -> HitInfo {
        boxcast_candidates(
            self.bodies.iter(),
            origin,
            half_extents,
            direction,
            max_distance,
            filter,
        )
    }

    fn overlap(
        &self,
        collider: &Collider,
        position: Vec3,
        filter: &QueryFilter<'_>,
    ) -> Vec<HitInfo> {
        overlap_candidates(self.bodies.iter(), collider, position, filter)
    }
}

/// Static geometry plus every enabled entity collider in a scene world.
#[derive(Clone, Copy)]
pub struct WorldQuery<'a> {
    pub geometry: &'a CollisionWorld,
    pub world: &'a SceneWorld,
}

impl<'a> WorldQuery<'a> {
    pub fn new(geometry: &'a CollisionWorld, world: &'a SceneWorld) -> Self {
        Self { geometry, world }
    }

    fn candidates(&self) -> impl Iterator<Item = &'a dyn QueryCandidate> {
        let statics = self.geometry.bodies().iter().map(|b| b as &dyn QueryCandidate);
        let entities = self.world.entities().iter().map(|e| e as &dyn QueryCandidate);
        statics.chain(entities)
    }
}

impl CollisionQuery for WorldQuery<'_> {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter<'_>,
    ) -> HitInfo {
        raycast_candidates(self.candidates(), origin, direction, max_distance, filter)
    }

    fn boxcast(
        &self,
        origin: Vec3,
        half_extents: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &QueryFilter<'_>,
    ) -> HitInfo {
        boxcast_candidates(
            self.candidates(),
            origin,
            half_extents,
            direction,
            max_distance,
            filter,
        )
    }

    fn overlap(
        &self,
        collider: &Collider,
        position: Vec3,
        filter: &QueryFilter<'_>,
    ) -> Vec<HitInfo> {
        overlap_candidates(self.candidates(), collider, position, filter)
    }
}

fn sanitize_cast(origin: Vec3, direction: Vec3, max_distance: f32) -> Option<Vec3> {
    if !origin.is_finite() || !max_distance.is_finite() || max_distance <= 0.0 {
        return None;
    }
    direction.try_normalize()
}

fn raycast_candidates<'c, C, I>(
    candidates: I,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    filter: &QueryFilter<'_>,
) -> HitInfo
where
    C: QueryCandidate + ?Sized + 'c,
    I: Iterator<Item = &'c C>,
{
    let Some(direction) = sanitize_cast(origin, direction, max_distance) else {
        return HitInfo::miss();
    };

    let mut best: Option<(f32, Vec3, Option<EntityId>)> = None;
    for candidate in candidates {
        let Some((collider, position)) = candidate.world_collider() else {
            continue;
        };
        let entity = candidate.collision_entity();
        if !filter.accepts(&collider, entity) {
            continue;
        }
        let center = collider.center(position);
        if let Some((t, normal)) =
            ray_vs_shape(origin, direction, max_distance, &collider.shape, center)
        {
            if best.map_or(true, |(best_t, _, _)| t < best_t) {
                best = Some((t, normal, entity));
            }
        }
    }

    match best {
        Some((t, normal, entity)) => HitInfo {
            hit: true,
            point: origin + direction * t,
            normal,
            penetration: 0.0,
            entity,
        },
        None => HitInfo::miss(),
    }
}

fn boxcast_candidates<'c, C, I>(
    candidates: I,
    origin: Vec3,
    half_extents: Vec3,
    direction: Vec3,
    max_distance: f32,
    filter: &QueryFilter<'_>,
) -> HitInfo
where
    C: QueryCandidate + ?Sized + 'c,
    I: Iterator<Item = &'c C>,
{
    let Some(direction) = sanitize_cast(origin, direction, max_distance) else {
        return HitInfo::miss();
    };
    if !half_extents.is_finite() || half_extents.cmplt(Vec3::ZERO).any() {
        return HitInfo::miss();
    }

    let mut best: Option<(f32, Vec3, f32, Option<EntityId>)> = None;
    for candidate in candidates {
        let Some((collider, position)) = candidate.world_collider() else {
            continue;
        };
        let entity = candidate.collision_entity();
        if !filter.accepts(&collider, entity) {
            continue;
        }
        let center = collider.center(position);
        if let Some((t, normal, depth)) = box_sweep_vs_shape(
            origin,
            half_extents,
            direction,
            max_distance,
            &collider.shape,
            center,
        ) {
            let closer = best.map_or(true, |(best_t, _, best_depth, _)| {
                t < best_t || (t == best_t && depth > best_depth)
            });
            if closer {
                best = Some((t, normal, depth, entity));
            }
        }
    }

    match best {
        Some((t, normal, depth, entity)) => HitInfo {
            hit: true,
            // Contact point on the swept box's leading face, pushed out when it started inside.
            point: origin + direction * t + normal * depth
                - normal * normal.abs().dot(half_extents),
            normal,
            penetration: depth,
            entity,
        },
        None => HitInfo::miss(),
    }
}

fn overlap_candidates<'c, C, I>(
    candidates: I,
    collider: &Collider,
    position: Vec3,
    filter: &QueryFilter<'_>,
) -> Vec<HitInfo>
where
    C: QueryCandidate + ?Sized + 'c,
    I: Iterator<Item = &'c C>,
{
    if !position.is_finite() {
        return Vec::new();
    }
    let probe_center = collider.center(position);
    let mut hits = Vec::new();
    for candidate in candidates {
        let Some((target, target_position)) = candidate.world_collider() else {
            continue;
        };
        let entity = candidate.collision_entity();
        if !filter.accepts(&target, entity) {
            continue;
        }
        let Some((normal, penetration)) = overlap_shapes(
            &collider.shape,
            probe_center,
            &target.shape,
            target.center(target_position),
        ) else {
            continue;
        };
        if penetration <= MIN_PENETRATION {
            continue;
        }
        hits.push(HitInfo {
            hit: true,
            point: probe_center - normal * (collider.shape.support(normal) - penetration),
            normal,
            penetration,
            entity,
        });
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Transform;
    use crate::collision::CollisionLayer;

    fn level() -> CollisionWorld {
        let mut geometry = CollisionWorld::new();
        geometry.add(
            "ground",
            Vec3::new(0.0, -0.5, 0.0),
            Collider::aabb(Vec3::new(50.0, 0.5, 50.0), CollisionLayer::World),
        );
        geometry.add(
            "wall",
            Vec3::new(5.0, 2.0, 0.0),
            Collider::aabb(Vec3::new(0.5, 2.0, 5.0), CollisionLayer::World),
        );
        geometry
    }

    #[test]
    fn raycast_reports_nearest_hit() {
        let geometry = level();
        let hit = geometry.raycast(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::X,
            20.0,
            &QueryFilter::default(),
        );
        assert!(hit.hit);
        assert!((hit.point.x - 4.5).abs() < 1e-5);
        assert_eq!(hit.normal, Vec3::NEG_X);
        assert_eq!(hit.entity, None);
    }

    #[test]
    fn degenerate_queries_return_miss() {
        let geometry = level();
        let filter = QueryFilter::default();
        assert!(!geometry.raycast(Vec3::ZERO, Vec3::ZERO, 5.0, &filter).hit);
        assert!(!geometry.raycast(Vec3::ZERO, Vec3::X, 0.0, &filter).hit);
        assert!(!geometry.raycast(Vec3::NAN, Vec3::X, 5.0, &filter).hit);
        assert!(
            !geometry
                .boxcast(Vec3::ZERO, Vec3::NEG_ONE, Vec3::NEG_Y, 1.0, &filter)
                .hit
        );
        assert!(geometry
            .overlap(&Collider::sphere(1.0, CollisionLayer::Actor), Vec3::NAN, &filter)
            .is_empty());
    }

    #[test]
    fn boxcast_point_lies_on_ground_surface() {
        let geometry = level();
        let hit = geometry.boxcast(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.4, 0.9, 0.4),
            Vec3::NEG_Y,
            0.2,
            &QueryFilter::new(LayerMask::WORLD),
        );
        assert!(hit.hit);
        assert!(hit.point.y.abs() < 1e-5);
        assert_eq!(hit.normal, Vec3::Y);
    }

    #[test]
    fn layer_mask_filters_out_geometry() {
        let geometry = level();
        let hit = geometry.raycast(
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::NEG_Y,
            5.0,
            &QueryFilter::new(LayerMask::ACTOR),
        );
        assert_eq!(hit, HitInfo::miss());
    }

    #[test]
    fn world_query_sees_enabled_entities_and_honours_ignore_set() {
        let geometry = CollisionWorld::new();
        let mut world = SceneWorld::default();
        let near = world.spawn(
            Transform::from_position(Vec3::new(0.0, 0.0, 3.0)),
            Some(Collider::sphere(1.0, CollisionLayer::Actor)),
            "near",
        );
        let far = world.spawn(
            Transform::from_position(Vec3::new(0.0, 0.0, 8.0)),
            Some(Collider::sphere(1.0, CollisionLayer::Actor)),
            "far",
        );
        world.apply_pending();
        let query = WorldQuery::new(&geometry, &world);

        let hit = query.raycast(Vec3::ZERO, Vec3::Z, 20.0, &QueryFilter::default());
        assert_eq!(hit.entity, Some(near));

        let ignore = [near];
        let filter = QueryFilter::default().ignoring(&ignore);
        let hit = query.raycast(Vec3::ZERO, Vec3::Z, 20.0, &filter);
        assert_eq!(hit.entity, Some(far));

        world.set_enabled(far, false);
        let query = WorldQuery::new(&geometry, &world);
        assert!(!query.raycast(Vec3::ZERO, Vec3::Z, 20.0, &filter).hit);
    }

    #[test]
    fn overlap_lists_every_contact_and_intersect_picks_deepest() {
        let geometry = level();
        let probe = Collider::aabb(Vec3::new(0.4, 0.9, 0.4), CollisionLayer::Actor);
        // Sunk 0.1 into the ground and 0.3 into the wall.
        let position = Vec3::new(4.4, 0.8, 0.0);

        let hits = geometry.overlap(&probe, position, &QueryFilter::default());
        assert_eq!(hits.len(), 2);

        let deepest = geometry.intersect(&probe, position, &QueryFilter::default());
        assert!(deepest.hit);
        assert!((deepest.penetration - 0.3).abs() < 1e-5);
        assert_eq!(deepest.normal, Vec3::NEG_X);
    }

    #[test]
    fn resting_contact_is_not_an_overlap() {
        let geometry = level();
        let probe = Collider::aabb(Vec3::new(0.4, 0.9, 0.4), CollisionLayer::Actor);
        let hits = geometry.overlap(&probe, Vec3::new(0.0, 0.9, 0.0), &QueryFilter::default());
        assert!(hits.is_empty());
        assert!(!geometry
            .intersect(&probe, Vec3::new(0.0, 0.9, 0.0), &QueryFilter::default())
            .hit);
    }
}
