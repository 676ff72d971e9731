use std::time::Duration;

use super::scheduler::{ScheduledTask, TaskQueue};

/// Fixed-step simulation clock.
///
/// Every tick advances by exactly `fixed_dt`; wall-clock jitter is absorbed by
/// the loop runner's accumulator, never by the simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimClock {
    fixed_dt: Duration,
    tick: u64,
    elapsed_seconds: f64,
}

impl SimClock {
    pub fn new(fixed_dt: Duration) -> Self {
        Self {
            fixed_dt,
            tick: 0,
            elapsed_seconds: 0.0,
        }
    }

    pub fn from_tick_rate(target_tps: u32) -> Self {
        Self::new(Duration::from_secs_f64(1.0 / target_tps.max(1) as f64))
    }

    pub fn advance(&mut self) {
        self.tick = self.tick.saturating_add(1);
        self.elapsed_seconds += self.fixed_dt.as_secs_f64();
    }

    pub fn reset(&mut self) {
        self.tick = 0;
        self.elapsed_seconds = 0.0;
    }

    pub fn fixed_dt(&self) -> Duration {
        self.fixed_dt
    }

    pub fn dt_seconds(&self) -> f32 {
        self.fixed_dt.as_secs_f32()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn now_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    /// Drains every task whose deadline has passed, in deadline order.
    pub fn poll_due<T>(&self, queue: &mut TaskQueue<T>) -> Vec<ScheduledTask<T>> {
        queue.drain_due(self.elapsed_seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    pub ticks_to_run: u32,
    pub remaining_accumulator: Duration,
    pub dropped_backlog: Duration,
}

pub fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog: accumulator,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

pub fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        let raw_frame_dt = Duration::from_millis(600);

        assert_eq!(
            clamp_frame_delta(raw_frame_dt, max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(48), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_keeps_partial_remainder() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(40), fixed_dt, 5);

        assert_eq!(result.ticks_to_run, 2);
        assert_eq!(result.remaining_accumulator, Duration::from_millis(8));
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let fixed_dt = Duration::from_millis(16);
        let result = plan_sim_steps(Duration::from_millis(120), fixed_dt, 3);

        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn clock_advances_by_fixed_dt() {
        let mut clock = SimClock::new(Duration::from_millis(250));
        clock.advance();
        clock.advance();

        assert_eq!(clock.tick(), 2);
        assert!((clock.now_seconds() - 0.5).abs() < 1e-9);
        assert!((clock.dt_seconds() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn clock_from_zero_tick_rate_falls_back_to_one_hz() {
        let clock = SimClock::from_tick_rate(0);
        assert_eq!(clock.fixed_dt(), Duration::from_secs(1));
    }

    #[test]
    fn clock_polls_only_due_tasks() {
        let mut clock = SimClock::new(Duration::from_secs(1));
        let mut queue = TaskQueue::new();
        queue.schedule(1.0, None, "early");
        queue.schedule(3.0, None, "late");

        assert!(clock.poll_due(&mut queue).is_empty());
        clock.advance();
        let due = clock.poll_due(&mut queue);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].payload, "early");
        assert_eq!(queue.len(), 1);
    }
}
