pub mod app;
pub mod collision;

pub use app::{
    clamp_frame_delta, look_rotation, plan_sim_steps, run_headless, run_headless_with_metrics,
    ActionStates, AppError, AudioSink, CueId, Entity, EntityId, EntityIdAllocator,
    FeedbackRequest, FeedbackRouter, InputAction, InputCollector, InputSnapshot, InputSource,
    LogAudioSink, LogUiSink, LoopConfig, LoopMetricsSnapshot, LoopSummary, MetricsHandle,
    RawInputEvent, RecordingSinks, Scene, SceneCommand, SceneRuntime, SceneWorld, ScheduledTask,
    SimClock, StepPlan, TaskId, TaskQueue, Transform, UiSink,
};
pub use collision::{
    Collidable, Collider, ColliderShape, CollisionLayer, CollisionQuery, CollisionWorld, HitInfo,
    LayerMask, QueryFilter, StaticBody, WorldQuery,
};

pub use glam::{Quat, Vec2, Vec3};
