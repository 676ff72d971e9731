mod clock;
mod feedback;
mod input;
mod loop_runner;
mod metrics;
mod scene;
mod scheduler;
mod transform;

pub use clock::{clamp_frame_delta, plan_sim_steps, SimClock, StepPlan};
pub use feedback::{
    AudioSink, CueId, FeedbackRequest, FeedbackRouter, LogAudioSink, LogUiSink, RecordingSinks,
    UiSink,
};
pub use input::{
    ActionStates, InputAction, InputCollector, InputSnapshot, InputSource, RawInputEvent,
};
pub use loop_runner::{run_headless, run_headless_with_metrics, AppError, LoopConfig, LoopSummary};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use scene::{
    Entity, EntityId, EntityIdAllocator, Scene, SceneCommand, SceneRuntime, SceneWorld,
};
pub use scheduler::{ScheduledTask, TaskId, TaskQueue};
pub use transform::{look_rotation, Transform};
