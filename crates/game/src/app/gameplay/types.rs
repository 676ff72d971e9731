use rand::rngs::StdRng;
use sim_engine::{
    CollisionQuery, CueId, EntityId, FeedbackRequest, InputSnapshot, TaskQueue, Transform, Vec3,
};

pub(crate) const CUE_JUMP: CueId = CueId("jump");
pub(crate) const CUE_COIN: CueId = CueId("coin");
pub(crate) const CUE_STOMP: CueId = CueId("stomp");
pub(crate) const CUE_STAR: CueId = CueId("star");
pub(crate) const CUE_CHASER_LUNGE: CueId = CueId("chaser_lunge");

pub(crate) const COUNTER_COINS: &str = "coins";
pub(crate) const COUNTER_STARS: &str = "stars";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickPhase {
    Timers,
    PlayerController,
    Adversaries,
    Interactions,
    LevelBookkeeping,
}

impl TickPhase {
    #[cfg(test)]
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Timers => "Timers",
            Self::PlayerController => "PlayerController",
            Self::Adversaries => "Adversaries",
            Self::Interactions => "Interactions",
            Self::LevelBookkeeping => "LevelBookkeeping",
        }
    }
}

pub(crate) const TICK_PHASE_ORDER: [TickPhase; 5] = [
    TickPhase::Timers,
    TickPhase::PlayerController,
    TickPhase::Adversaries,
    TickPhase::Interactions,
    TickPhase::LevelBookkeeping,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimedTransition {
    BossRecover,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum GameplayEvent {
    CoinCollected { coin_id: EntityId, total: u32 },
    StarCollected { total: u32 },
    PatrollerStomped { patroller_id: EntityId },
    PlayerDamaged { by: EntityId },
    PlayerFellOut { position: Vec3 },
    BossCaptured,
    BossThrown { velocity: Vec3 },
    BossHit { hits: u32 },
    BossDefeated,
    BossRecovered,
    ChaserLunged { chaser_id: EntityId },
    ChaserRetracting { chaser_id: EntityId },
    ChaserIdle { chaser_id: EntityId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GameplayEventKind {
    CoinCollected,
    StarCollected,
    PatrollerStomped,
    PlayerDamaged,
    PlayerFellOut,
    BossCaptured,
    BossThrown,
    BossHit,
    BossDefeated,
    BossRecovered,
    ChaserLunged,
    ChaserRetracting,
    ChaserIdle,
}

impl GameplayEvent {
    pub(crate) fn kind(self) -> GameplayEventKind {
        match self {
            Self::CoinCollected { .. } => GameplayEventKind::CoinCollected,
            Self::StarCollected { .. } => GameplayEventKind::StarCollected,
            Self::PatrollerStomped { .. } => GameplayEventKind::PatrollerStomped,
            Self::PlayerDamaged { .. } => GameplayEventKind::PlayerDamaged,
            Self::PlayerFellOut { .. } => GameplayEventKind::PlayerFellOut,
            Self::BossCaptured => GameplayEventKind::BossCaptured,
            Self::BossThrown { .. } => GameplayEventKind::BossThrown,
            Self::BossHit { .. } => GameplayEventKind::BossHit,
            Self::BossDefeated => GameplayEventKind::BossDefeated,
            Self::BossRecovered => GameplayEventKind::BossRecovered,
            Self::ChaserLunged { .. } => GameplayEventKind::ChaserLunged,
            Self::ChaserRetracting { .. } => GameplayEventKind::ChaserRetracting,
            Self::ChaserIdle { .. } => GameplayEventKind::ChaserIdle,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct GameplayEventCounts {
    pub(crate) total: u32,
    pub(crate) coin_collected: u32,
    pub(crate) star_collected: u32,
    pub(crate) patroller_stomped: u32,
    pub(crate) player_damaged: u32,
    pub(crate) player_fell_out: u32,
    pub(crate) boss_captured: u32,
    pub(crate) boss_thrown: u32,
    pub(crate) boss_hit: u32,
    pub(crate) boss_defeated: u32,
    pub(crate) boss_recovered: u32,
    pub(crate) chaser_lunged: u32,
    pub(crate) chaser_retracting: u32,
    pub(crate) chaser_idle: u32,
}

impl GameplayEventCounts {
    fn record(&mut self, kind: GameplayEventKind) {
        self.total = self.total.saturating_add(1);
        let slot = match kind {
            GameplayEventKind::CoinCollected => &mut self.coin_collected,
            GameplayEventKind::StarCollected => &mut self.star_collected,
            GameplayEventKind::PatrollerStomped => &mut self.patroller_stomped,
            GameplayEventKind::PlayerDamaged => &mut self.player_damaged,
            GameplayEventKind::PlayerFellOut => &mut self.player_fell_out,
            GameplayEventKind::BossCaptured => &mut self.boss_captured,
            GameplayEventKind::BossThrown => &mut self.boss_thrown,
            GameplayEventKind::BossHit => &mut self.boss_hit,
            GameplayEventKind::BossDefeated => &mut self.boss_defeated,
            GameplayEventKind::BossRecovered => &mut self.boss_recovered,
            GameplayEventKind::ChaserLunged => &mut self.chaser_lunged,
            GameplayEventKind::ChaserRetracting => &mut self.chaser_retracting,
            GameplayEventKind::ChaserIdle => &mut self.chaser_idle,
        };
        *slot = slot.saturating_add(1);
    }

    pub(crate) fn add(&mut self, other: GameplayEventCounts) {
        self.total = self.total.saturating_add(other.total);
        self.coin_collected = self.coin_collected.saturating_add(other.coin_collected);
        self.star_collected = self.star_collected.saturating_add(other.star_collected);
        self.patroller_stomped = self.patroller_stomped.saturating_add(other.patroller_stomped);
        self.player_damaged = self.player_damaged.saturating_add(other.player_damaged);
        self.player_fell_out = self.player_fell_out.saturating_add(other.player_fell_out);
        self.boss_captured = self.boss_captured.saturating_add(other.boss_captured);
        self.boss_thrown = self.boss_thrown.saturating_add(other.boss_thrown);
        self.boss_hit = self.boss_hit.saturating_add(other.boss_hit);
        self.boss_defeated = self.boss_defeated.saturating_add(other.boss_defeated);
        self.boss_recovered = self.boss_recovered.saturating_add(other.boss_recovered);
        self.chaser_lunged = self.chaser_lunged.saturating_add(other.chaser_lunged);
        self.chaser_retracting = self.chaser_retracting.saturating_add(other.chaser_retracting);
        self.chaser_idle = self.chaser_idle.saturating_add(other.chaser_idle);
    }
}

/// Events raised during the current tick, rolled into per-kind counts at tick end.
#[derive(Debug, Default)]
pub(crate) struct GameplayEventBus {
    current_tick_events: Vec<GameplayEvent>,
    last_tick_counts: GameplayEventCounts,
    lifetime_counts: GameplayEventCounts,
}

impl GameplayEventBus {
    pub(crate) fn clear_current_tick(&mut self) {
        self.current_tick_events.clear();
    }

    pub(crate) fn emit(&mut self, event: GameplayEvent) {
        self.current_tick_events.push(event);
    }

    pub(crate) fn iter_emitted_so_far(&self) -> impl Iterator<Item = &GameplayEvent> {
        self.current_tick_events.iter()
    }

    pub(crate) fn finish_tick_rollover(&mut self) {
        let mut counts = GameplayEventCounts::default();
        for event in &self.current_tick_events {
            counts.record(event.kind());
        }
        self.last_tick_counts = counts;
        self.lifetime_counts.add(counts);
        self.current_tick_events.clear();
    }

    pub(crate) fn last_tick_counts(&self) -> GameplayEventCounts {
        self.last_tick_counts
    }

    /// Counts since the level was last built.
    pub(crate) fn lifetime_counts(&self) -> GameplayEventCounts {
        self.lifetime_counts
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

pub(crate) struct TickServices {
    pub(crate) rng: StdRng,
    pub(crate) timers: TaskQueue<TimedTransition>,
    pub(crate) feedback: Vec<FeedbackRequest>,
    pub(crate) events: GameplayEventBus,
}

impl TickServices {
    pub(crate) fn new(rng: StdRng) -> Self {
        Self {
            rng,
            timers: TaskQueue::new(),
            feedback: Vec::new(),
            events: GameplayEventBus::default(),
        }
    }

    pub(crate) fn cue(&mut self, cue: CueId) {
        self.feedback.push(FeedbackRequest::Cue(cue));
    }

    pub(crate) fn set_counter(&mut self, name: &'static str, value: u32) {
        self.feedback
            .push(FeedbackRequest::SetCounter { name, value });
    }

    pub(crate) fn show_message(&mut self, text: &str, duration_seconds: f32) {
        self.feedback.push(FeedbackRequest::ShowMessage {
            text: text.to_string(),
            duration_seconds,
        });
    }
}

pub(crate) struct TickContext<'a> {
    pub(crate) dt: f32,
    pub(crate) now_seconds: f64,
    pub(crate) input: &'a InputSnapshot,
    pub(crate) query: &'a dyn CollisionQuery,
    pub(crate) self_id: EntityId,
    pub(crate) player_id: Option<EntityId>,
    pub(crate) player_pose: Option<Transform>,
    pub(crate) services: &'a mut TickServices,
}

/// Per-tick behaviour for an entity kind. The entity's pose lives in the scene
/// world; `pose` is a working copy written back after the update.
pub(crate) trait Updatable {
    fn update(&mut self, pose: &mut Transform, ctx: &mut TickContext<'_>);
}
