use rand::rngs::StdRng;
use rand::SeedableRng;
use sim_engine::{
    CollisionWorld, EntityId, FeedbackRequest, InputSnapshot, Scene, SceneCommand, SceneWorld,
    SimClock, Transform, WorldQuery,
};
use tracing::{debug, info};

use super::interactions::{player_contacts, resolve, InteractionContext};
use super::level::{build_geometry, spawn_level, LevelState, Roster};
use super::types::{
    GameplayEvent, TickContext, TickPhase, TickServices, TimedTransition, Updatable,
    COUNTER_COINS, COUNTER_STARS, TICK_PHASE_ORDER,
};
use crate::app::tuning::Tuning;

pub(crate) struct PlatformerScene {
    tuning: Tuning,
    geometry: CollisionWorld,
    pub(crate) roster: Roster,
    pub(crate) level: LevelState,
    pub(crate) services: TickServices,
    pub(crate) last_tick_order: Vec<TickPhase>,
    builds: u32,
}

#[derive(Clone, Copy)]
struct Frame<'a> {
    dt: f32,
    now_seconds: f64,
    input: &'a InputSnapshot,
    player_id: Option<EntityId>,
    player_pose: Option<Transform>,
}

impl PlatformerScene {
    pub(crate) fn new(tuning: Tuning, seed: u64) -> Self {
        Self {
            tuning,
            geometry: CollisionWorld::new(),
            roster: Roster::default(),
            level: LevelState::default(),
            services: TickServices::new(StdRng::seed_from_u64(seed)),
            last_tick_order: Vec::with_capacity(TICK_PHASE_ORDER.len()),
            builds: 0,
        }
    }

    fn frame<'a>(
        &self,
        clock: &SimClock,
        input: &'a InputSnapshot,
        world: &SceneWorld,
    ) -> Frame<'a> {
        let player_id = self.roster.player_id();
        Frame {
            dt: clock.dt_seconds(),
            now_seconds: clock.now_seconds(),
            input,
            player_id,
            player_pose: player_id.and_then(|id| world.transform_of(id)),
        }
    }

    fn run_phase(
        &mut self,
        phase: TickPhase,
        clock: &SimClock,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) {
        match phase {
            TickPhase::Timers => self.run_timers(clock, world),
            TickPhase::PlayerController => {
                let frame = self.frame(clock, input, world);
                if let Some((id, player)) = self.roster.player.as_mut() {
                    drive(player, *id, &frame, world, &self.geometry, &mut self.services);
                }
            }
            TickPhase::Adversaries => {
                let frame = self.frame(clock, input, world);
                for (id, patroller) in self.roster.patrollers.iter_mut() {
                    drive(patroller, *id, &frame, world, &self.geometry, &mut self.services);
                }
                if let Some((id, boss)) = self.roster.boss.as_mut() {
                    drive(boss, *id, &frame, world, &self.geometry, &mut self.services);
                }
                for (id, chaser) in self.roster.chasers.iter_mut() {
                    drive(chaser, *id, &frame, world, &self.geometry, &mut self.services);
                }
            }
            TickPhase::Interactions => self.run_interactions(input, world),
            TickPhase::LevelBookkeeping => self.run_bookkeeping(world),
        }
    }

    fn run_timers(&mut self, clock: &SimClock, world: &SceneWorld) {
        for task in clock.poll_due(&mut self.services.timers) {
            if !task.target_is_live(|id| world.is_alive(id)) {
                debug!(task = task.id.0, "stale_timer_skipped");
                continue;
            }
            match task.payload {
                TimedTransition::BossRecover => {
                    let recovered = match self.roster.boss.as_mut() {
                        Some((id, boss)) if task.target == Some(*id) => boss.recover(),
                        _ => false,
                    };
                    if recovered {
                        self.services.events.emit(GameplayEvent::BossRecovered);
                        debug!(task = task.id.0, "boss_recovered");
                    } else {
                        debug!(task = task.id.0, "stale_timer_skipped");
                    }
                }
            }
        }
    }

    fn run_interactions(&mut self, input: &InputSnapshot, world: &mut SceneWorld) {
        let Some(player_pose) = self
            .roster
            .player_id()
            .and_then(|id| world.transform_of(id))
        else {
            return;
        };
        let contacts = {
            let query = WorldQuery::new(&self.geometry, world);
            player_contacts(&query, &self.roster, &self.level, &player_pose)
        };
        let mut ctx = InteractionContext {
            tuning: &self.tuning,
            input,
            world,
            roster: &mut self.roster,
            level: &mut self.level,
            services: &mut self.services,
            contacts,
            player_pose,
        };
        resolve(&mut ctx);
    }

    fn run_bookkeeping(&mut self, world: &SceneWorld) {
        self.roster.retain_live(world);
        let dropped = self
            .services
            .timers
            .retain_live_targets(|id| world.is_alive(id));
        if dropped > 0 {
            debug!(dropped, "stale_timers_dropped");
        }
        self.services.events.finish_tick_rollover();
    }
}

fn drive(
    actor: &mut dyn Updatable,
    id: EntityId,
    frame: &Frame<'_>,
    world: &mut SceneWorld,
    geometry: &CollisionWorld,
    services: &mut TickServices,
) {
    let Some(mut pose) = world.transform_of(id) else {
        return;
    };
    {
        let query = WorldQuery::new(geometry, world);
        let mut ctx = TickContext {
            dt: frame.dt,
            now_seconds: frame.now_seconds,
            input: frame.input,
            query: &query,
            self_id: id,
            player_id: frame.player_id,
            player_pose: frame.player_pose,
            services,
        };
        actor.update(&mut pose, &mut ctx);
    }
    world.set_transform(id, pose);
}

impl Scene for PlatformerScene {
    fn load(&mut self, world: &mut SceneWorld) {
        self.level.reset();
        self.services.timers.clear();
        self.services.events.reset();
        self.last_tick_order.clear();
        self.geometry = build_geometry(&self.tuning);
        self.roster = spawn_level(&self.tuning, world, &mut self.services.rng);
        self.services.set_counter(COUNTER_COINS, 0);
        self.services.set_counter(COUNTER_STARS, 0);
        self.builds += 1;
        info!(
            build = self.builds,
            coins = self.roster.coins.len(),
            patrollers = self.roster.patrollers.len(),
            static_bodies = self.geometry.len(),
            "level_built"
        );
    }

    fn update(
        &mut self,
        clock: &SimClock,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        if input.reset_pressed() {
            info!(build = self.builds, "level_reset_requested");
            return SceneCommand::HardReset;
        }

        self.last_tick_order.clear();
        self.services.events.clear_current_tick();
        for phase in TICK_PHASE_ORDER {
            self.last_tick_order.push(phase);
            self.run_phase(phase, clock, input, world);
        }
        SceneCommand::None
    }

    fn unload(&mut self, _world: &mut SceneWorld) {
        info!(
            build = self.builds,
            coins = self.level.coins,
            stars = self.level.stars,
            "level_unloaded"
        );
        self.roster = Roster::default();
        self.services.timers.clear();
    }

    fn drain_feedback(&mut self, out: &mut Vec<FeedbackRequest>) {
        out.append(&mut self.services.feedback);
    }

    fn debug_title(&self, world: &SceneWorld) -> Option<String> {
        Some(format!(
            "coins {} | stars {} | boss hits {} | entities {}",
            self.level.coins,
            self.level.stars,
            self.level.boss_hit_count,
            world.entity_count()
        ))
    }
}
