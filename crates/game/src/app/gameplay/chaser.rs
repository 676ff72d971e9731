use sim_engine::{Collidable, Collider, CollisionLayer, Transform, Vec3};
use tracing::debug;

use super::types::{GameplayEvent, TickContext, Updatable, CUE_CHASER_LUNGE};
use crate::app::tuning::ChaserTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChaserState {
    Idle,
    Lunging,
    Retracting,
}

/// Chained to a post. Lunges at a nearby player until the chain runs out,
/// then reels back to hover above the post.
#[derive(Debug, Clone)]
pub(crate) struct Chaser {
    tuning: ChaserTuning,
    anchor: Vec3,
    state: ChaserState,
}

impl Chaser {
    pub(crate) fn new(tuning: ChaserTuning, anchor: Vec3) -> Self {
        Self {
            tuning,
            anchor,
            state: ChaserState::Idle,
        }
    }

    pub(crate) fn state(&self) -> ChaserState {
        self.state
    }

    pub(crate) fn anchor(&self) -> Vec3 {
        self.anchor
    }

    pub(crate) fn tether_length(&self) -> f32 {
        self.tuning.tether_length
    }

    pub(crate) fn retract_target(&self) -> Vec3 {
        self.anchor + Vec3::Y * self.tuning.retract_height
    }
}

impl Collidable for Chaser {
    fn collider(&self) -> Collider {
        Collider::sphere(self.tuning.radius, CollisionLayer::Actor)
    }
}

impl Updatable for Chaser {
    // States chain within a tick: a lunge that snaps the tether starts retracting at once.
    fn update(&mut self, pose: &mut Transform, ctx: &mut TickContext<'_>) {
        let player = ctx.player_pose.map(|player| player.position);

        if self.state == ChaserState::Idle {
            if let Some(player) = player {
                let distance = pose.position.distance(player);
                if distance < self.tuning.detection_radius {
                    self.state = ChaserState::Lunging;
                    ctx.services.cue(CUE_CHASER_LUNGE);
                    ctx.services.events.emit(GameplayEvent::ChaserLunged {
                        chaser_id: ctx.self_id,
                    });
                    debug!(chaser = ctx.self_id.0, distance, "chaser_lunging");
                }
            }
        }

        if self.state == ChaserState::Lunging {
            if let Some(player) = player {
                pose.look_at(player);
            }
            pose.position += pose.forward() * self.tuning.lunge_speed * ctx.dt;
            let stretch = pose.position.distance(self.anchor);
            if stretch > self.tuning.tether_length {
                self.state = ChaserState::Retracting;
                ctx.services.events.emit(GameplayEvent::ChaserRetracting {
                    chaser_id: ctx.self_id,
                });
                debug!(chaser = ctx.self_id.0, stretch, "chaser_retracting");
            }
        }

        if self.state == ChaserState::Retracting {
            let target = self.retract_target();
            pose.look_at(target);
            let blend = 1.0 - (-self.tuning.retract_speed * ctx.dt).exp();
            pose.position = pose.position.lerp(target, blend);
            if pose.position.distance(target) < self.tuning.arrival_distance {
                self.state = ChaserState::Idle;
                ctx.services.events.emit(GameplayEvent::ChaserIdle {
                    chaser_id: ctx.self_id,
                });
                debug!(chaser = ctx.self_id.0, "chaser_idle");
            }
        }
    }
}
