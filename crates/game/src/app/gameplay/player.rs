use sim_engine::{
    look_rotation, Collidable, Collider, CollisionLayer, InputAction, LayerMask, Quat, QueryFilter,
    Transform, Vec3,
};
use tracing::{debug, info};

use super::types::{GameplayEvent, TickContext, TickServices, Updatable, CUE_JUMP};
use crate::app::tuning::PlayerTuning;

const MAX_JUMPS: u32 = 1;

/// Third-person character state. The pose's position is the player's feet.
#[derive(Debug, Clone)]
pub(crate) struct Player {
    tuning: PlayerTuning,
    respawn_point: Vec3,
    pub(crate) velocity_y: f32,
    pub(crate) grounded: bool,
    pub(crate) jump_count: u32,
    pub(crate) air_time: f32,
    pub(crate) pitch_degrees: f32,
}

impl Player {
    pub(crate) fn new(tuning: PlayerTuning, respawn_point: Vec3) -> Self {
        Self {
            tuning,
            respawn_point,
            velocity_y: 0.0,
            grounded: false,
            jump_count: 0,
            air_time: 0.0,
            pitch_degrees: 0.0,
        }
    }

    pub(crate) fn try_jump(&mut self, services: &mut TickServices) -> bool {
        if self.jump_count >= MAX_JUMPS {
            return false;
        }
        self.grounded = false;
        self.velocity_y = self.tuning.jump_velocity;
        self.jump_count += 1;
        self.air_time = 0.0;
        services.cue(CUE_JUMP);
        true
    }

    pub(crate) fn bounce(&mut self, velocity_y: f32) {
        self.grounded = false;
        self.velocity_y = velocity_y;
    }

    /// Moves the player to the respawn point. Rotation and jump budget are kept.
    pub(crate) fn respawn(&mut self, pose: &mut Transform) {
        pose.position = self.respawn_point;
        self.velocity_y = 0.0;
    }

    fn land(&mut self, pose: &mut Transform, ground_y: f32, was_grounded: bool) {
        if !was_grounded {
            debug!(y = ground_y, air_time = self.air_time, "player_landed");
        }
        self.grounded = true;
        pose.position.y = ground_y;
        self.velocity_y = 0.0;
        self.jump_count = 0;
    }

    fn movement_intent(&self, pose: &Transform, ctx: &TickContext<'_>) -> Vec3 {
        let axis = |positive: InputAction, negative: InputAction| -> f32 {
            let mut value = 0.0;
            if ctx.input.is_down(positive) {
                value += 1.0;
            }
            if ctx.input.is_down(negative) {
                value -= 1.0;
            }
            value
        };
        let forward_axis = axis(InputAction::MoveForward, InputAction::MoveBack);
        let right_axis = axis(InputAction::MoveRight, InputAction::MoveLeft);
        let intent = pose.forward() * forward_axis + pose.right() * right_axis;
        Vec3::new(intent.x, 0.0, intent.z).normalize_or_zero()
    }
}

impl Collidable for Player {
    fn collider(&self) -> Collider {
        Collider::aabb(self.tuning.half_extents, CollisionLayer::Actor)
            .with_offset(Vec3::Y * self.tuning.half_extents.y)
    }
}

impl Updatable for Player {
    fn update(&mut self, pose: &mut Transform, ctx: &mut TickContext<'_>) {
        let dt = ctx.dt;
        let half = self.tuning.half_extents;
        let ignore = [ctx.self_id];
        let solid = QueryFilter::new(LayerMask::WORLD).ignoring(&ignore);

        if ctx.input.jump_pressed() {
            self.try_jump(ctx.services);
        }

        let intent = self.movement_intent(pose, ctx);
        if intent != Vec3::ZERO {
            if let Some(target) = look_rotation(intent) {
                let blend = (self.tuning.turn_rate * dt).clamp(0.0, 1.0);
                pose.rotation = pose.rotation.slerp(target, blend).normalize();
            }

            // Blocked moves are dropped whole; there is no sliding along walls.
            let displacement = intent * self.tuning.speed * dt;
            let mid_body = pose.position + Vec3::Y * half.y;
            let blocked = ctx.query.raycast(mid_body, displacement, half.x, &solid);
            if !blocked.hit {
                pose.position.x += displacement.x;
                pose.position.z += displacement.z;
            }
        }

        pose.position.y += self.velocity_y * dt;

        let was_grounded = self.grounded;
        self.grounded = false;
        if self.velocity_y <= 0.0 {
            let probe_origin = pose.position + Vec3::Y * self.tuning.ground_probe_lift;
            let ground = ctx.query.boxcast(
                probe_origin,
                Vec3::new(half.x, 0.0, half.z),
                Vec3::NEG_Y,
                self.tuning.ground_probe_distance,
                &solid,
            );
            if ground.hit {
                self.land(pose, ground.point.y, was_grounded);
            }
        }

        let contact = ctx.query.intersect(&self.collider(), pose.position, &solid);
        if contact.hit {
            if contact.normal.y.abs() < 0.5 {
                pose.position += contact.normal * contact.penetration;
            } else if contact.normal.y < 0.0 && self.velocity_y > 0.0 {
                pose.position.y -= contact.penetration;
                self.velocity_y = 0.0;
            }
        }

        if self.grounded {
            self.air_time = 0.0;
        } else {
            self.velocity_y -= self.tuning.gravity * dt;
            self.air_time += dt;
        }

        let pointer = ctx.input.pointer_delta();
        let sensitivity = self.tuning.pointer_sensitivity_degrees;
        if pointer.x != 0.0 {
            let yaw = (pointer.x * sensitivity).to_radians();
            pose.rotation = (Quat::from_rotation_y(yaw) * pose.rotation).normalize();
        }
        let limit = self.tuning.pitch_limit_degrees;
        self.pitch_degrees = (self.pitch_degrees - pointer.y * sensitivity).clamp(-limit, limit);

        if pose.position.y < self.tuning.fall_threshold {
            let fell_at = pose.position;
            self.respawn(pose);
            ctx.services
                .events
                .emit(GameplayEvent::PlayerFellOut { position: fell_at });
            info!(reason = "fell", y = fell_at.y, "player_respawned");
        }
    }
}
