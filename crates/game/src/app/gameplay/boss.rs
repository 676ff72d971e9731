use rand::Rng;
use sim_engine::{
    Collidable, Collider, CollisionLayer, HitInfo, LayerMask, Quat, QueryFilter, Transform, Vec3,
};
use tracing::{debug, info};

use super::types::{GameplayEvent, TickContext, TimedTransition, Updatable};
use crate::app::tuning::BossTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BossState {
    Wandering,
    Held,
    Thrown,
    Stunned,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct WanderMove {
    from: Vec3,
    to: Vec3,
    elapsed: f32,
}

/// A boss the player can pick up and throw. Each throw that ends in an impact
/// counts as a hit; reaching `hits_to_defeat` is terminal.
#[derive(Debug, Clone)]
pub(crate) struct Boss {
    tuning: BossTuning,
    home: Vec3,
    state: BossState,
    pub(crate) velocity: Vec3,
    hits: u32,
    wander: Option<WanderMove>,
}

impl Boss {
    pub(crate) fn new(tuning: BossTuning, home: Vec3) -> Self {
        Self {
            tuning,
            home,
            state: BossState::Wandering,
            velocity: Vec3::ZERO,
            hits: 0,
            wander: None,
        }
    }

    pub(crate) fn state(&self) -> BossState {
        self.state
    }

    pub(crate) fn hits(&self) -> u32 {
        self.hits
    }

    pub(crate) fn is_defeated(&self) -> bool {
        self.hits >= self.tuning.hits_to_defeat
    }

    pub(crate) fn is_wandering(&self) -> bool {
        self.state == BossState::Wandering
    }

    /// Wandering -> Held. Any other state rejects the capture.
    pub(crate) fn capture(&mut self) -> bool {
        if self.state != BossState::Wandering {
            return false;
        }
        self.state = BossState::Held;
        self.wander = None;
        true
    }

    pub(crate) fn follow_holder(&self, pose: &mut Transform, holder: &Transform) {
        pose.position = holder.position
            + Vec3::Y * self.tuning.carry_up
            + holder.forward() * self.tuning.carry_forward;
        pose.rotation = holder.rotation;
    }

    pub(crate) fn throw_velocity(&self, forward: Vec3, up: Vec3) -> Vec3 {
        forward * self.tuning.throw_force + up * self.tuning.upward_force
    }

    /// Held -> Thrown. Returns the launch velocity, or `None` if the boss was not held.
    pub(crate) fn throw(&mut self, forward: Vec3, up: Vec3) -> Option<Vec3> {
        if self.state != BossState::Held {
            return None;
        }
        self.velocity = self.throw_velocity(forward, up);
        self.state = BossState::Thrown;
        Some(self.velocity)
    }

    /// Stunned -> Wandering, unless the last hit was terminal.
    pub(crate) fn recover(&mut self) -> bool {
        if self.state != BossState::Stunned || self.is_defeated() {
            return false;
        }
        self.state = BossState::Wandering;
        true
    }

    fn wander(&mut self, pose: &mut Transform, ctx: &mut TickContext<'_>) {
        let duration = self.tuning.wander_duration_seconds;
        if let Some(mut step) = self.wander.take() {
            step.elapsed = (step.elapsed + ctx.dt).min(duration);
            let t = step.elapsed / duration;
            pose.position = step.from.lerp(step.to, t * t * (3.0 - 2.0 * t));
            if step.elapsed < duration {
                self.wander = Some(step);
            }
            return;
        }

        // Poisson arrivals: the start chance depends on elapsed time, not on tick count.
        let chance = 1.0 - (-self.tuning.wander_rate_per_second * ctx.dt).exp();
        let rng = &mut ctx.services.rng;
        if rng.gen::<f32>() < chance {
            let radius = self.tuning.wander_radius;
            let offset = Vec3::new(
                rng.gen_range(-radius..=radius),
                0.0,
                rng.gen_range(-radius..=radius),
            );
            self.wander = Some(WanderMove {
                from: pose.position,
                to: pose.position + offset,
                elapsed: 0.0,
            });
        }
    }

    fn fly(&mut self, pose: &mut Transform, ctx: &mut TickContext<'_>) {
        let dt = ctx.dt;
        pose.position += self.velocity * dt;
        self.velocity.y -= self.tuning.gravity * dt;
        let spin = self.tuning.spin_degrees_per_second.to_radians() * dt;
        pose.rotation = (Quat::from_rotation_y(spin) * pose.rotation).normalize();

        let ignore = [ctx.self_id, ctx.player_id.unwrap_or(ctx.self_id)];
        let filter = QueryFilter::new(LayerMask::WORLD | LayerMask::ACTOR).ignoring(&ignore);
        let contact = ctx.query.intersect(&self.collider(), pose.position, &filter);
        if contact.hit {
            self.impact(pose, ctx, contact);
            return;
        }

        if pose.position.y < self.tuning.fall_threshold {
            *pose = Transform::from_position(self.home);
            self.velocity = Vec3::ZERO;
            self.state = BossState::Wandering;
            ctx.services.events.emit(GameplayEvent::BossRecovered);
            info!(reason = "fell", "boss_returned_home");
        }
    }

    fn impact(&mut self, pose: &mut Transform, ctx: &mut TickContext<'_>, contact: HitInfo) {
        pose.position += contact.normal * contact.penetration;
        pose.rotation = Quat::IDENTITY;
        self.velocity = Vec3::ZERO;
        self.state = BossState::Stunned;
        self.hits = self.hits.saturating_add(1);
        ctx.services.events.emit(GameplayEvent::BossHit { hits: self.hits });
        info!(
            hits = self.hits,
            hits_to_defeat = self.tuning.hits_to_defeat,
            "boss_hit"
        );

        if !self.is_defeated() {
            let deadline = ctx.now_seconds + f64::from(self.tuning.recovery_seconds);
            ctx.services
                .timers
                .schedule(deadline, Some(ctx.self_id), TimedTransition::BossRecover);
            debug!(deadline, "boss_recovery_scheduled");
        }
    }
}

impl Collidable for Boss {
    fn collider(&self) -> Collider {
        Collider::sphere(self.tuning.radius, CollisionLayer::Actor)
    }
}

impl Updatable for Boss {
    fn update(&mut self, pose: &mut Transform, ctx: &mut TickContext<'_>) {
        match self.state {
            BossState::Wandering => self.wander(pose, ctx),
            BossState::Thrown => self.fly(pose, ctx),
            // Held poses are written by the carrier; stunned bosses wait for their timer.
            BossState::Held | BossState::Stunned => {}
        }
    }
}
