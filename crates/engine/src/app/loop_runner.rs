use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::clock::{clamp_frame_delta, plan_sim_steps, SimClock};
use super::feedback::{FeedbackRequest, FeedbackRouter};
use super::input::{InputCollector, InputSource, RawInputEvent};
use super::metrics::{LoopMetricsSnapshot, MetricsHandle, MetricsWindow};
use super::scene::{SceneCommand, SceneRuntime};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    /// Stop after this many ticks. `None` runs until the scene or the input asks to quit.
    pub max_ticks: Option<u64>,
    /// Sleep to hold real time to the tick rate. Unpaced runs feed one fixed step per frame.
    pub paced: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            max_ticks: None,
            paced: false,
        }
    }
}

impl LoopConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.target_tps == 0 {
            return Err(AppError::InvalidConfig("target_tps must be at least 1"));
        }
        if self.max_ticks_per_frame == 0 {
            return Err(AppError::InvalidConfig(
                "max_ticks_per_frame must be at least 1",
            ));
        }
        if self.max_frame_delta.is_zero() {
            return Err(AppError::InvalidConfig("max_frame_delta must be non-zero"));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid loop config: {0}")]
    InvalidConfig(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct LoopSummary {
    pub ticks_run: u64,
    pub resets: u32,
    pub sim_seconds: f64,
    pub metrics: LoopMetricsSnapshot,
}

/// Drives a scene at a fixed tick rate without a window.
pub fn run_headless(
    config: &LoopConfig,
    runtime: &mut SceneRuntime,
    input: &mut dyn InputSource,
    router: &mut FeedbackRouter,
) -> Result<LoopSummary, AppError> {
    run_headless_with_metrics(config, runtime, input, router, &MetricsHandle::default())
}

pub fn run_headless_with_metrics(
    config: &LoopConfig,
    runtime: &mut SceneRuntime,
    input: &mut dyn InputSource,
    router: &mut FeedbackRouter,
    metrics_handle: &MetricsHandle,
) -> Result<LoopSummary, AppError> {
    config.validate()?;

    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let mut clock = SimClock::from_tick_rate(config.target_tps);
    let fixed_dt = clock.fixed_dt();

    runtime.load();
    info!(
        entity_count = runtime.world().entity_count(),
        "scene_loaded"
    );
    info!(
        target_tps = config.target_tps,
        max_frame_delta_ms = config.max_frame_delta.as_millis() as u64,
        max_ticks_per_frame = config.max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        max_ticks = ?config.max_ticks,
        paced = config.paced,
        "loop_config"
    );

    let mut collector = InputCollector::new();
    let mut raw_events: Vec<RawInputEvent> = Vec::new();
    let mut feedback: Vec<FeedbackRequest> = Vec::new();
    let mut metrics_window = MetricsWindow::new(metrics_log_interval);
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut resets = 0u32;

    'frames: loop {
        let frame_dt = if config.paced {
            let since_last = Instant::now().saturating_duration_since(last_frame_instant);
            if since_last < fixed_dt {
                thread::sleep(fixed_dt - since_last);
            }
            let now = Instant::now();
            let raw = now.saturating_duration_since(last_frame_instant);
            last_frame_instant = now;
            raw
        } else {
            fixed_dt
        };

        accumulator =
            accumulator.saturating_add(clamp_frame_delta(frame_dt, config.max_frame_delta));
        let step_plan = plan_sim_steps(accumulator, fixed_dt, config.max_ticks_per_frame);
        accumulator = step_plan.remaining_accumulator;

        for _ in 0..step_plan.ticks_to_run {
            if reached_tick_limit(config.max_ticks, clock.tick()) {
                info!(reason = "tick_limit", tick = clock.tick(), "shutdown_requested");
                break 'frames;
            }

            raw_events.clear();
            input.poll_events(clock.tick(), &mut raw_events);
            for event in raw_events.drain(..) {
                collector.handle_event(event);
            }
            let snapshot = collector.snapshot_for_tick();
            if snapshot.quit_requested() {
                info!(reason = "input", tick = clock.tick(), "shutdown_requested");
                break 'frames;
            }

            let tick_start = Instant::now();
            clock.advance();
            let command = runtime.update(&clock, &snapshot);

            runtime.drain_feedback(&mut feedback);
            router.dispatch_all(feedback.drain(..));

            match command {
                SceneCommand::None => {}
                SceneCommand::HardReset => {
                    runtime.hard_reset();
                    resets = resets.saturating_add(1);
                    info!(
                        tick = clock.tick(),
                        entity_count = runtime.world().entity_count(),
                        "scene_reset"
                    );
                    runtime.drain_feedback(&mut feedback);
                    router.dispatch_all(feedback.drain(..));
                }
                SceneCommand::Quit => {
                    metrics_window.record_tick(tick_start.elapsed());
                    info!(reason = "scene", tick = clock.tick(), "shutdown_requested");
                    break 'frames;
                }
            }
            metrics_window.record_tick(tick_start.elapsed());
        }

        if step_plan.dropped_backlog > Duration::ZERO {
            metrics_window.record_clamp();
            warn!(
                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                max_ticks_per_frame = config.max_ticks_per_frame,
                "sim_clamp_triggered"
            );
        }

        if let Some(snapshot) =
            metrics_window.close_if_due(Instant::now(), runtime.world().entity_count())
        {
            metrics_handle.publish(snapshot);
            info!(
                tps = snapshot.tps,
                mean_tick_ms = snapshot.mean_tick_ms,
                worst_tick_ms = snapshot.worst_tick_ms,
                clamped_frames = snapshot.clamped_frames,
                entity_count = snapshot.entity_count,
                "loop_metrics"
            );
        }
        if let Some(title) = runtime.debug_title() {
            debug!(title = %title, "scene_status");
        }
    }

    if let Some(snapshot) = metrics_window.flush(Instant::now(), runtime.world().entity_count()) {
        metrics_handle.publish(snapshot);
    }
    runtime.shutdown();
    info!(
        ticks_run = clock.tick(),
        resets,
        sim_seconds = clock.now_seconds(),
        feedback_dispatched = router.dispatched_count(),
        "shutdown"
    );

    Ok(LoopSummary {
        ticks_run: clock.tick(),
        resets,
        sim_seconds: clock.now_seconds(),
        metrics: metrics_handle.snapshot(),
    })
}

fn reached_tick_limit(max_ticks: Option<u64>, tick: u64) -> bool {
    max_ticks.is_some_and(|max| tick >= max)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
