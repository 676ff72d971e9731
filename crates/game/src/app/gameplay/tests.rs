use sim_engine::{
    EntityId, FeedbackRequest, InputAction, InputSnapshot, Scene, SceneCommand, SceneRuntime,
    SceneWorld, SimClock, Transform, Vec3,
};

use super::boss::BossState;
use super::chaser::ChaserState;
use super::scene_impl::PlatformerScene;
use super::types::{TimedTransition, COUNTER_COINS, COUNTER_STARS, CUE_STOMP, TICK_PHASE_ORDER};
use crate::app::tuning::{BossTuning, Tuning};

const SEED: u64 = 42;

struct Harness {
    scene: PlatformerScene,
    world: SceneWorld,
    clock: SimClock,
}

impl Harness {
    fn new() -> Self {
        Self::with_tuning(Tuning::default())
    }

    fn with_tuning(tuning: Tuning) -> Self {
        let mut scene = PlatformerScene::new(tuning, SEED);
        let mut world = SceneWorld::default();
        scene.load(&mut world);
        world.apply_pending();
        Self {
            scene,
            world,
            clock: SimClock::from_tick_rate(60),
        }
    }

    fn tick(&mut self, input: &InputSnapshot) -> SceneCommand {
        self.clock.advance();
        let command = self.scene.update(&self.clock, input, &mut self.world);
        self.world.apply_pending();
        command
    }

    fn advance(&mut self, steps: usize) {
        for _ in 0..steps {
            self.tick(&InputSnapshot::empty());
        }
    }

    fn player_id(&self) -> EntityId {
        self.scene.roster.player_id().expect("player")
    }

    fn player_pose(&self) -> Transform {
        self.world.transform_of(self.player_id()).expect("player pose")
    }

    fn place_player(&mut self, position: Vec3, yaw: f32, velocity_y: f32, air_time: f32) {
        let id = self.player_id();
        self.world
            .set_transform(id, Transform::from_position_yaw(position, yaw));
        let (_, player) = self.scene.roster.player.as_mut().expect("player");
        player.velocity_y = velocity_y;
        player.air_time = air_time;
    }

    fn boss_position(&self) -> Vec3 {
        let id = self.scene.roster.boss_id().expect("boss");
        self.world.transform_of(id).expect("boss pose").position
    }

    fn boss_state(&self) -> Option<BossState> {
        self.scene.roster.boss.as_ref().map(|(_, boss)| boss.state())
    }

    fn drain_feedback(&mut self) -> Vec<FeedbackRequest> {
        let mut out = Vec::new();
        self.scene.drain_feedback(&mut out);
        out
    }

    /// Stands the player three units behind the boss along `direction_z`,
    /// picks it up, and throws it. Runs until the throw resolves.
    fn capture_and_throw(&mut self, direction_z: f32) {
        let boss = self.boss_position();
        let yaw = if direction_z > 0.0 { 0.0 } else { std::f32::consts::PI };
        self.place_player(
            Vec3::new(boss.x, 0.5, boss.z - 3.0 * direction_z),
            yaw,
            0.0,
            0.0,
        );
        let hold = InputSnapshot::empty().with_action_down(InputAction::Grab, true);
        self.tick(&hold.with_grab_pressed(true));
        assert_eq!(self.boss_state(), Some(BossState::Held));
        assert!(self.scene.level.holding_boss);
        self.tick(&hold);
        self.tick(&InputSnapshot::empty().with_grab_released(true));
        assert_eq!(self.boss_state(), Some(BossState::Thrown));

        let mut last_hits = self.scene.level.boss_hit_count;
        for _ in 0..240 {
            self.tick(&InputSnapshot::empty());
            assert!(self.scene.level.boss_hit_count >= last_hits);
            last_hits = self.scene.level.boss_hit_count;
            match self.boss_state() {
                Some(BossState::Thrown) => continue,
                _ => return,
            }
        }
        panic!("thrown boss never landed");
    }
}

fn calm_boss_tuning() -> Tuning {
    Tuning {
        boss: BossTuning {
            wander_rate_per_second: 0.0,
            ..BossTuning::default()
        },
        ..Tuning::default()
    }
}

#[test]
fn load_builds_full_level_and_zeroes_counters() {
    let mut harness = Harness::new();
    assert_eq!(harness.world.entity_count(), 16);
    assert_eq!(harness.scene.roster.coins.len(), 10);
    assert_eq!(harness.scene.level.coins, 0);
    let feedback = harness.drain_feedback();
    assert_eq!(
        feedback,
        vec![
            FeedbackRequest::SetCounter {
                name: COUNTER_COINS,
                value: 0
            },
            FeedbackRequest::SetCounter {
                name: COUNTER_STARS,
                value: 0
            },
        ]
    );
}

#[test]
fn tick_runs_phases_in_fixed_order() {
    let mut harness = Harness::new();
    harness.advance(1);
    assert_eq!(harness.scene.last_tick_order, TICK_PHASE_ORDER.to_vec());
}

#[test]
fn scenario_a_falling_player_lands_on_ground() {
    let mut harness = Harness::new();
    harness.place_player(Vec3::new(0.0, 10.0, -30.0), 0.0, 0.0, 0.0);

    harness.advance(180);

    let (_, player) = harness.scene.roster.player.as_ref().expect("player");
    assert!(player.grounded);
    assert_eq!(player.velocity_y, 0.0);
    assert!(harness.player_pose().position.y.abs() < 1e-3);
}

#[test]
fn jump_budget_holds_over_long_run() {
    let mut harness = Harness::new();
    harness.place_player(Vec3::new(0.0, 0.0, -30.0), 0.0, 0.0, 0.0);

    for tick in 0..900 {
        let input = if tick % 23 == 0 {
            InputSnapshot::empty().with_jump_pressed(true)
        } else {
            InputSnapshot::empty()
        };
        harness.tick(&input);
        let (_, player) = harness.scene.roster.player.as_ref().expect("player");
        assert!(player.jump_count <= 1, "tick {tick}");
        if player.grounded {
            assert_eq!(player.jump_count, 0, "tick {tick}");
            assert_eq!(player.air_time, 0.0, "tick {tick}");
        }
    }
}

#[test]
fn patrollers_stay_on_their_paths() {
    let mut harness = Harness::new();
    harness.place_player(Vec3::new(0.0, 0.0, -30.0), 0.0, 0.0, 0.0);

    for tick in 0..3_000 {
        harness.advance(1);
        for (id, patroller) in &harness.scene.roster.patrollers {
            let x = harness.world.transform_of(*id).expect("patroller").position.x;
            assert!(
                (x - patroller.origin_x()).abs() <= patroller.path_limit(),
                "tick {tick}: x = {x}"
            );
        }
    }
    assert_eq!(harness.scene.roster.patrollers.len(), 2);
}

#[test]
fn landing_on_patroller_stomps_it() {
    let mut harness = Harness::new();
    let (&patroller, _) = harness
        .scene
        .roster
        .patrollers
        .iter()
        .next()
        .expect("patroller");
    let below = harness.world.transform_of(patroller).expect("pose").position;
    harness.place_player(Vec3::new(below.x, 0.75, below.z), 0.0, -3.0, 0.5);
    harness.drain_feedback();

    harness.advance(1);

    assert!(!harness.world.is_alive(patroller));
    assert!(!harness.scene.roster.patrollers.contains_key(&patroller));
    let (_, player) = harness.scene.roster.player.as_ref().expect("player");
    assert!(player.velocity_y > 0.0);
    assert!(harness.drain_feedback().contains(&FeedbackRequest::Cue(CUE_STOMP)));
    let counts = harness.scene.services.events.last_tick_counts();
    assert_eq!(counts.patroller_stomped, 1);
    assert_eq!(counts.player_damaged, 0);
}

#[test]
fn scenario_c_three_throws_defeat_boss_and_reveal_star() {
    let mut harness = Harness::with_tuning(calm_boss_tuning());
    let boss_id = harness.scene.roster.boss_id().expect("boss");
    let star = harness.scene.roster.star.expect("star");

    for (throw, direction) in [(1_u32, 1.0), (2, -1.0)] {
        harness.capture_and_throw(direction);
        assert_eq!(harness.boss_state(), Some(BossState::Stunned));
        assert_eq!(harness.scene.level.boss_hit_count, throw);
        assert!(!harness.world.find_entity(star).expect("star").enabled);

        harness.advance(179);
        assert_eq!(harness.boss_state(), Some(BossState::Stunned));
        harness.advance(2);
        assert_eq!(harness.boss_state(), Some(BossState::Wandering));
    }

    harness.capture_and_throw(1.0);

    assert_eq!(harness.scene.level.boss_hit_count, 3);
    assert!(harness.scene.roster.boss.is_none());
    assert!(!harness.world.is_alive(boss_id));
    assert!(harness.world.find_entity(star).expect("star").enabled);
    assert!(harness.scene.services.timers.is_empty());
    let lifetime = harness.scene.services.events.lifetime_counts();
    assert_eq!(lifetime.boss_hit, 3);
    assert_eq!(lifetime.boss_defeated, 1);
    assert_eq!(lifetime.boss_recovered, 2);

    harness.advance(400);
    assert!(!harness.world.is_alive(boss_id));

    let star_position = harness.world.transform_of(star).expect("star").position;
    harness.place_player(
        Vec3::new(star_position.x, 0.5, star_position.z),
        0.0,
        0.0,
        0.0,
    );
    harness.drain_feedback();
    harness.advance(1);

    assert_eq!(harness.scene.level.stars, 1);
    assert!(!harness.world.is_alive(star));
    let feedback = harness.drain_feedback();
    assert!(feedback.contains(&FeedbackRequest::SetCounter {
        name: COUNTER_STARS,
        value: 1
    }));
    assert!(feedback
        .iter()
        .any(|request| matches!(request, FeedbackRequest::ShowMessage { .. })));
}

#[test]
fn scenario_d_chaser_lunges_retracts_and_settles() {
    let mut harness = Harness::new();
    let chaser = *harness.scene.roster.chasers.keys().next().expect("chaser");
    let state = |harness: &Harness| harness.scene.roster.chasers[&chaser].state();
    assert_eq!(state(&harness), ChaserState::Idle);

    harness.place_player(Vec3::new(-67.0, 0.0, 0.0), 0.0, 0.0, 0.0);
    harness.advance(1);
    assert_eq!(state(&harness), ChaserState::Lunging);

    let mut ticks = 0;
    while state(&harness) == ChaserState::Lunging {
        harness.advance(1);
        ticks += 1;
        assert!(ticks < 120, "tether never snapped");
    }
    assert_eq!(state(&harness), ChaserState::Retracting);
    let anchor = harness.scene.roster.chasers[&chaser].anchor();
    let pose = harness.world.transform_of(chaser).expect("chaser");
    assert!(pose.position.distance(anchor) > 0.0);

    while state(&harness) == ChaserState::Retracting {
        harness.advance(1);
        ticks += 1;
        assert!(ticks < 600, "chaser never settled");
    }
    assert_eq!(state(&harness), ChaserState::Idle);
    let target = harness.scene.roster.chasers[&chaser].retract_target();
    let settled = harness.world.transform_of(chaser).expect("chaser").position;
    assert!(settled.distance(target) < 1.0);

    let player = harness.player_pose().position;
    assert!(player.distance(Vec3::new(-67.0, 0.0, 0.0)) < 1e-3);
    assert_eq!(
        harness.scene.services.events.lifetime_counts().player_damaged,
        0
    );
}

#[test]
fn scenario_e_collect_all_ten_coins() {
    let mut harness = Harness::new();
    let coins: Vec<EntityId> = harness.scene.roster.coins.iter().copied().collect();
    assert_eq!(coins.len(), 10);
    let mut pickups = 0;

    for coin in coins {
        let Some(pose) = harness.world.transform_of(coin) else {
            continue;
        };
        harness.place_player(
            Vec3::new(pose.position.x, 0.0, pose.position.z),
            0.0,
            0.0,
            0.0,
        );
        harness.advance(1);
        pickups += harness.scene.services.events.last_tick_counts().coin_collected;
        assert!(!harness.world.is_alive(coin));
    }

    assert_eq!(harness.scene.level.coins, 10);
    assert_eq!(pickups, 10);
    assert!(harness.scene.roster.coins.is_empty());
    let remaining = harness
        .world
        .entities()
        .iter()
        .filter(|entity| entity.debug_name == "coin")
        .count();
    assert_eq!(remaining, 0);
    let last_counter = harness
        .drain_feedback()
        .into_iter()
        .filter_map(|request| match request {
            FeedbackRequest::SetCounter { name, value } if name == COUNTER_COINS => Some(value),
            _ => None,
        })
        .last();
    assert_eq!(last_counter, Some(10));
}

#[test]
fn stale_timers_are_skipped_without_side_effects() {
    let mut harness = Harness::with_tuning(calm_boss_tuning());
    let boss_id = harness.scene.roster.boss_id().expect("boss");
    harness
        .scene
        .services
        .timers
        .schedule(0.0, Some(EntityId(9_999)), TimedTransition::BossRecover);

    harness.advance(1);

    assert_eq!(harness.boss_state(), Some(BossState::Wandering));
    assert!(harness.scene.services.timers.is_empty());

    harness.world.despawn(boss_id);
    harness.world.apply_pending();
    harness.scene.services.timers.schedule(
        harness.clock.now_seconds() + 0.05,
        Some(boss_id),
        TimedTransition::BossRecover,
    );
    harness.advance(10);

    assert!(!harness.world.is_alive(boss_id));
    assert!(harness.scene.roster.boss.is_none());
    assert_eq!(
        harness.scene.services.events.lifetime_counts().boss_recovered,
        0
    );
}

#[test]
fn reset_input_requests_rebuild_that_zeroes_level_state() {
    let mut harness = Harness::new();
    let coin = *harness.scene.roster.coins.iter().next().expect("coin");
    let coin_position = harness.world.transform_of(coin).expect("coin").position;
    harness.place_player(
        Vec3::new(coin_position.x, 0.0, coin_position.z),
        0.0,
        0.0,
        0.0,
    );
    harness.advance(1);
    assert!(harness.scene.level.coins >= 1);

    let command = harness.tick(&InputSnapshot::empty().with_reset_pressed(true));
    assert_eq!(command, SceneCommand::HardReset);

    harness.scene.unload(&mut harness.world);
    harness.world.clear();
    harness.scene.load(&mut harness.world);
    harness.world.apply_pending();

    assert_eq!(harness.scene.level.coins, 0);
    assert_eq!(harness.scene.level.boss_hit_count, 0);
    assert!(!harness.scene.level.holding_boss);
    assert_eq!(harness.scene.roster.coins.len(), 10);
    assert_eq!(harness.world.entity_count(), 16);
    assert!(!harness.world.is_alive(coin));
    let star = harness.scene.roster.star.expect("star");
    assert!(!harness.world.find_entity(star).expect("star").enabled);
}

#[test]
fn runtime_hard_reset_restores_fresh_level() {
    let mut runtime = SceneRuntime::new(super::build_scene(Tuning::default(), SEED));
    let mut clock = SimClock::from_tick_rate(60);
    runtime.load();

    for _ in 0..30 {
        clock.advance();
        runtime.update(&clock, &InputSnapshot::empty());
    }
    clock.advance();
    let command = runtime.update(&clock, &InputSnapshot::empty().with_reset_pressed(true));
    assert_eq!(command, SceneCommand::HardReset);
    runtime.hard_reset();

    assert_eq!(
        runtime.debug_title().as_deref(),
        Some("coins 0 | stars 0 | boss hits 0 | entities 16")
    );
}
