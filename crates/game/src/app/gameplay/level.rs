use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::Rng;
use sim_engine::{
    Collidable, Collider, CollisionLayer, CollisionWorld, EntityId, SceneWorld, Transform, Vec3,
};

use super::boss::Boss;
use super::chaser::Chaser;
use super::patroller::Patroller;
use super::player::Player;
use crate::app::tuning::Tuning;

const ARENA_TOP: f32 = 0.5;
const ARENA_HALF_WIDTH: f32 = 30.0;
const POST_HALF_EXTENTS: Vec3 = Vec3::new(0.5, 2.5, 0.5);

/// Counters for the current level. Only the interaction resolver writes them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct LevelState {
    pub(crate) coins: u32,
    pub(crate) stars: u32,
    pub(crate) boss_hit_count: u32,
    pub(crate) holding_boss: bool,
}

impl LevelState {
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Default)]
pub(crate) struct Roster {
    pub(crate) player: Option<(EntityId, Player)>,
    pub(crate) boss: Option<(EntityId, Boss)>,
    pub(crate) patrollers: BTreeMap<EntityId, Patroller>,
    pub(crate) chasers: BTreeMap<EntityId, Chaser>,
    pub(crate) coins: BTreeSet<EntityId>,
    pub(crate) star: Option<EntityId>,
}

impl Roster {
    pub(crate) fn player_id(&self) -> Option<EntityId> {
        self.player.as_ref().map(|(id, _)| *id)
    }

    pub(crate) fn boss_id(&self) -> Option<EntityId> {
        self.boss.as_ref().map(|(id, _)| *id)
    }

    pub(crate) fn retain_live(&mut self, world: &SceneWorld) {
        if self.player_id().is_some_and(|id| !world.is_alive(id)) {
            self.player = None;
        }
        if self.boss_id().is_some_and(|id| !world.is_alive(id)) {
            self.boss = None;
        }
        if self.star.is_some_and(|id| !world.is_alive(id)) {
            self.star = None;
        }
        self.patrollers.retain(|id, _| world.is_alive(*id));
        self.chasers.retain(|id, _| world.is_alive(*id));
        self.coins.retain(|id| world.is_alive(*id));
    }
}

pub(crate) fn build_geometry(tuning: &Tuning) -> CollisionWorld {
    let level = &tuning.level;
    let mut geometry = CollisionWorld::new();
    geometry.add(
        "ground",
        Vec3::new(0.0, -5.0, 0.0),
        Collider::aabb(Vec3::new(100.0, 5.0, 100.0), CollisionLayer::World),
    );
    geometry.add(
        "castle_keep",
        Vec3::new(0.0, 15.0, 40.0),
        Collider::aabb(Vec3::new(10.0, 15.0, 10.0), CollisionLayer::World),
    );
    for side in [-1.0, 1.0] {
        geometry.add(
            "castle_tower",
            Vec3::new(15.0 * side, 5.0, 40.0),
            Collider::aabb(Vec3::new(5.0, 10.0, 5.0), CollisionLayer::World),
        );
    }

    let arena_half_height = (ARENA_TOP + 10.0) * 0.5;
    geometry.add(
        "arena",
        Vec3::new(
            level.boss_home.x,
            ARENA_TOP - arena_half_height,
            level.boss_home.z,
        ),
        Collider::aabb(
            Vec3::new(ARENA_HALF_WIDTH, arena_half_height, ARENA_HALF_WIDTH),
            CollisionLayer::World,
        ),
    );
    geometry.add(
        "chain_post",
        level.chaser_post + Vec3::Y * POST_HALF_EXTENTS.y,
        Collider::aabb(POST_HALF_EXTENTS, CollisionLayer::World),
    );
    geometry
}

/// The star starts disabled.
pub(crate) fn spawn_level(tuning: &Tuning, world: &mut SceneWorld, rng: &mut StdRng) -> Roster {
    let level = &tuning.level;
    let mut roster = Roster::default();

    let player = Player::new(tuning.player.clone(), level.respawn_point);
    let player_id = spawn_actor(world, level.player_spawn, &player, "player");
    roster.player = Some((player_id, player));

    for spawn in &level.patroller_spawns {
        let patroller = Patroller::new(tuning.patroller.clone(), spawn.x);
        let id = spawn_actor(world, *spawn, &patroller, "patroller");
        roster.patrollers.insert(id, patroller);
    }

    let boss = Boss::new(tuning.boss.clone(), level.boss_home);
    let boss_id = spawn_actor(world, level.boss_home, &boss, "boss");
    roster.boss = Some((boss_id, boss));

    let chaser = Chaser::new(tuning.chaser.clone(), level.chaser_post);
    let chaser_start = level.chaser_post + tuning.chaser.spawn_offset;
    let chaser_id = spawn_actor(world, chaser_start, &chaser, "chaser");
    roster.chasers.insert(chaser_id, chaser);

    let spread = level.coin_area_half_extent;
    for _ in 0..level.coin_count {
        let position = Vec3::new(
            rng.gen_range(-spread..=spread),
            level.coin_height,
            rng.gen_range(-spread..=spread),
        );
        let id = world.spawn(
            Transform::from_position(position),
            Some(Collider::sphere(level.coin_radius, CollisionLayer::Pickup)),
            "coin",
        );
        roster.coins.insert(id);
    }

    roster.star = Some(world.spawn_disabled(
        Transform::from_position(level.star_position),
        Some(Collider::sphere(level.star_radius, CollisionLayer::Pickup)),
        "star",
    ));

    roster
}

fn spawn_actor(
    world: &mut SceneWorld,
    position: Vec3,
    actor: &impl Collidable,
    name: &'static str,
) -> EntityId {
    world.spawn(Transform::from_position(position), Some(actor.collider()), name)
}
