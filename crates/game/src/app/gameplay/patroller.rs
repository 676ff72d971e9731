use std::f32::consts::PI;

use sim_engine::{Collidable, Collider, CollisionLayer, Quat, Transform};

use super::types::{TickContext, Updatable};
use crate::app::tuning::PatrollerTuning;

/// Walks back and forth along world x, turning around at `origin_x ± path_limit`.
#[derive(Debug, Clone)]
pub(crate) struct Patroller {
    tuning: PatrollerTuning,
    origin_x: f32,
    pub(crate) direction: f32,
}

impl Patroller {
    pub(crate) fn new(tuning: PatrollerTuning, origin_x: f32) -> Self {
        Self {
            tuning,
            origin_x,
            direction: 1.0,
        }
    }

    pub(crate) fn origin_x(&self) -> f32 {
        self.origin_x
    }

    pub(crate) fn path_limit(&self) -> f32 {
        self.tuning.path_limit
    }
}

impl Collidable for Patroller {
    fn collider(&self) -> Collider {
        Collider::aabb(self.tuning.half_extents, CollisionLayer::Actor)
    }
}

impl Updatable for Patroller {
    fn update(&mut self, pose: &mut Transform, ctx: &mut TickContext<'_>) {
        pose.position.x += self.direction * self.tuning.speed * ctx.dt;

        let offset = pose.position.x - self.origin_x;
        if offset.abs() >= self.tuning.path_limit {
            // Clamp onto the bound so the path invariant holds at every tick.
            pose.position.x = self.origin_x + self.tuning.path_limit * offset.signum();
            self.direction = -self.direction;
            pose.rotation = (Quat::from_rotation_y(PI) * pose.rotation).normalize();
        }
    }
}
