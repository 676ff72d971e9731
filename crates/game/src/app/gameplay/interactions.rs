use sim_engine::{
    Collidable, CollisionQuery, EntityId, HitInfo, InputSnapshot, LayerMask, QueryFilter,
    SceneWorld, Transform,
};
use tracing::{debug, info};

use super::level::{LevelState, Roster};
use super::types::{
    GameplayEvent, TickServices, COUNTER_COINS, COUNTER_STARS, CUE_COIN, CUE_STAR, CUE_STOMP,
};
use crate::app::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InteractionRule {
    BossImpact,
    Stomp,
    Damage,
    CoinPickup,
    BossCarry,
    StarPickup,
    Capture,
}

/// Stomp runs before damage so a landing on a patroller never hurts the player.
pub(crate) const INTERACTION_RULES: [InteractionRule; 7] = [
    InteractionRule::BossImpact,
    InteractionRule::Stomp,
    InteractionRule::Damage,
    InteractionRule::CoinPickup,
    InteractionRule::BossCarry,
    InteractionRule::StarPickup,
    InteractionRule::Capture,
];

pub(crate) struct InteractionContext<'a> {
    pub(crate) tuning: &'a Tuning,
    pub(crate) input: &'a InputSnapshot,
    pub(crate) world: &'a mut SceneWorld,
    pub(crate) roster: &'a mut Roster,
    pub(crate) level: &'a mut LevelState,
    pub(crate) services: &'a mut TickServices,
    pub(crate) contacts: Vec<HitInfo>,
    pub(crate) player_pose: Transform,
}

/// Everything the player currently overlaps on the actor and pickup layers.
/// A carried boss is excluded.
pub(crate) fn player_contacts(
    query: &dyn CollisionQuery,
    roster: &Roster,
    level: &LevelState,
    player_pose: &Transform,
) -> Vec<HitInfo> {
    let Some((player_id, player)) = roster.player.as_ref() else {
        return Vec::new();
    };
    let mut ignore = vec![*player_id];
    if level.holding_boss {
        ignore.extend(roster.boss_id());
    }
    let filter = QueryFilter::new(LayerMask::ACTOR | LayerMask::PICKUP).ignoring(&ignore);
    query.overlap(&player.collider(), player_pose.position, &filter)
}

pub(crate) fn resolve(ctx: &mut InteractionContext<'_>) {
    let Some(player_id) = ctx.roster.player_id() else {
        return;
    };
    for rule in INTERACTION_RULES {
        apply_rule(rule, ctx);
    }
    ctx.world.set_transform(player_id, ctx.player_pose);
}

fn apply_rule(rule: InteractionRule, ctx: &mut InteractionContext<'_>) {
    match rule {
        InteractionRule::BossImpact => boss_impact(ctx),
        InteractionRule::Stomp => stomp(ctx),
        InteractionRule::Damage => damage(ctx),
        InteractionRule::CoinPickup => coin_pickup(ctx),
        InteractionRule::BossCarry => boss_carry(ctx),
        InteractionRule::StarPickup => star_pickup(ctx),
        InteractionRule::Capture => capture(ctx),
    }
}

fn contact_ids(contacts: &[HitInfo]) -> impl Iterator<Item = EntityId> + '_ {
    contacts.iter().filter_map(|contact| contact.entity)
}

fn boss_impact(ctx: &mut InteractionContext<'_>) {
    let Some((boss_id, boss)) = ctx.roster.boss.as_ref() else {
        return;
    };
    let boss_id = *boss_id;
    ctx.level.boss_hit_count = boss.hits();
    if !boss.is_defeated() {
        return;
    }

    ctx.world.despawn(boss_id);
    ctx.roster.boss = None;
    ctx.services.timers.cancel_for_target(boss_id);
    ctx.level.holding_boss = false;
    if let Some(star) = ctx.roster.star {
        ctx.world.set_enabled(star, true);
    }
    ctx.services.events.emit(GameplayEvent::BossDefeated);
    info!(hits = ctx.level.boss_hit_count, "boss_defeated");
}

fn stomp(ctx: &mut InteractionContext<'_>) {
    let tuning = &ctx.tuning.interactions;
    let Some((_, player)) = ctx.roster.player.as_mut() else {
        return;
    };
    if player.velocity_y >= tuning.stomp_descent_threshold
        || player.air_time <= tuning.stomp_min_air_time
    {
        return;
    }

    let feet = ctx.player_pose.position.y;
    let mut stomped = 0;
    for id in contact_ids(&ctx.contacts) {
        if !ctx.roster.patrollers.contains_key(&id) {
            continue;
        }
        let Some(enemy) = ctx.world.transform_of(id) else {
            continue;
        };
        if feet <= enemy.position.y + tuning.stomp_height_margin {
            continue;
        }
        ctx.roster.patrollers.remove(&id);
        ctx.world.despawn(id);
        ctx.services
            .events
            .emit(GameplayEvent::PatrollerStomped { patroller_id: id });
        debug!(patroller = id.0, "patroller_stomped");
        stomped += 1;
    }

    if stomped > 0 {
        player.bounce(tuning.stomp_bounce);
        ctx.services.cue(CUE_STOMP);
    }
}

fn damage(ctx: &mut InteractionContext<'_>) {
    let stomped_this_tick = ctx
        .services
        .events
        .iter_emitted_so_far()
        .any(|event| matches!(event, GameplayEvent::PatrollerStomped { .. }));
    if stomped_this_tick {
        return;
    }

    let roster = &*ctx.roster;
    let attacker = contact_ids(&ctx.contacts)
        .find(|id| roster.patrollers.contains_key(id) || roster.chasers.contains_key(id));
    let Some(attacker) = attacker else {
        return;
    };
    let Some((_, player)) = ctx.roster.player.as_mut() else {
        return;
    };
    player.respawn(&mut ctx.player_pose);
    ctx.services
        .events
        .emit(GameplayEvent::PlayerDamaged { by: attacker });
    info!(reason = "damage", by = attacker.0, "player_respawned");
}

fn coin_pickup(ctx: &mut InteractionContext<'_>) {
    for id in contact_ids(&ctx.contacts) {
        // Removal from the roster is what makes a pickup count once.
        if !ctx.roster.coins.remove(&id) {
            continue;
        }
        ctx.world.despawn(id);
        ctx.level.coins += 1;
        ctx.services.cue(CUE_COIN);
        ctx.services.set_counter(COUNTER_COINS, ctx.level.coins);
        ctx.services.events.emit(GameplayEvent::CoinCollected {
            coin_id: id,
            total: ctx.level.coins,
        });
        debug!(coin = id.0, coins = ctx.level.coins, "coin_collected");
    }
}

fn boss_carry(ctx: &mut InteractionContext<'_>) {
    if !ctx.level.holding_boss {
        return;
    }
    let Some((boss_id, boss)) = ctx.roster.boss.as_mut() else {
        ctx.level.holding_boss = false;
        return;
    };

    if let Some(mut pose) = ctx.world.transform_of(*boss_id) {
        boss.follow_holder(&mut pose, &ctx.player_pose);
        ctx.world.set_transform(*boss_id, pose);
    }

    if ctx.input.grab_released() {
        ctx.level.holding_boss = false;
        if let Some(velocity) = boss.throw(ctx.player_pose.forward(), ctx.player_pose.up()) {
            ctx.services
                .events
                .emit(GameplayEvent::BossThrown { velocity });
            info!(
                vx = velocity.x,
                vy = velocity.y,
                vz = velocity.z,
                "boss_thrown"
            );
        }
    }
}

fn star_pickup(ctx: &mut InteractionContext<'_>) {
    let Some(star) = ctx.roster.star else {
        return;
    };
    let Some(entity) = ctx.world.find_entity(star) else {
        return;
    };
    if !entity.enabled {
        return;
    }
    let distance = entity.transform.position.distance(ctx.player_pose.position);
    let tuning = &ctx.tuning.interactions;
    if distance >= tuning.star_pickup_radius {
        return;
    }

    ctx.world.despawn(star);
    ctx.roster.star = None;
    ctx.level.stars += 1;
    ctx.services.cue(CUE_STAR);
    ctx.services.set_counter(COUNTER_STARS, ctx.level.stars);
    ctx.services
        .show_message(&tuning.star_message, tuning.star_message_seconds);
    ctx.services.events.emit(GameplayEvent::StarCollected {
        total: ctx.level.stars,
    });
    info!(stars = ctx.level.stars, "star_collected");
}

fn capture(ctx: &mut InteractionContext<'_>) {
    if !ctx.input.grab_pressed() || ctx.level.holding_boss {
        return;
    }
    let Some((boss_id, boss)) = ctx.roster.boss.as_mut() else {
        return;
    };
    if !boss.is_wandering() {
        return;
    }
    let Some(boss_pose) = ctx.world.transform_of(*boss_id) else {
        return;
    };

    let tuning = &ctx.tuning.boss;
    let to_boss = boss_pose.position - ctx.player_pose.position;
    if to_boss.length() >= tuning.capture_distance {
        return;
    }
    let facing = ctx.player_pose.forward().dot(to_boss.normalize_or_zero());
    if facing <= tuning.capture_facing_dot {
        return;
    }

    if boss.capture() {
        ctx.level.holding_boss = true;
        ctx.services.events.emit(GameplayEvent::BossCaptured);
        info!(facing, "boss_captured");
    }
}
