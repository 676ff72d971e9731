use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

static LOCK_RECOVERY_REPORTED: AtomicBool = AtomicBool::new(false);

/// Loop health over the most recent metrics window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub tps: f32,
    pub mean_tick_ms: f32,
    pub worst_tick_ms: f32,
    /// Frames whose backlog was cut because they needed more than the per-frame tick cap.
    pub clamped_frames: u32,
    pub entity_count: usize,
}

/// Latest published snapshot, readable from any thread.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        *self.latest.read().unwrap_or_else(|poisoned| {
            report_lock_recovery("read");
            poisoned.into_inner()
        })
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        *self.latest.write().unwrap_or_else(|poisoned| {
            report_lock_recovery("write");
            poisoned.into_inner()
        }) = snapshot;
    }
}

fn report_lock_recovery(operation: &'static str) {
    if !LOCK_RECOVERY_REPORTED.swap(true, Ordering::Relaxed) {
        warn!(operation, "metrics_lock_recovered");
    }
}

/// Collects tick timings until the window length has passed, then closes into a snapshot.
#[derive(Debug)]
pub(crate) struct MetricsWindow {
    opened_at: Instant,
    length: Duration,
    ticks: u32,
    busy: Duration,
    worst: Duration,
    clamped_frames: u32,
}

impl MetricsWindow {
    pub(crate) fn new(length: Duration) -> Self {
        Self::opened_at(length, Instant::now())
    }

    pub(crate) fn opened_at(length: Duration, at: Instant) -> Self {
        Self {
            opened_at: at,
            length,
            ticks: 0,
            busy: Duration::ZERO,
            worst: Duration::ZERO,
            clamped_frames: 0,
        }
    }

    pub(crate) fn record_tick(&mut self, busy: Duration) {
        self.ticks = self.ticks.saturating_add(1);
        self.busy = self.busy.saturating_add(busy);
        self.worst = self.worst.max(busy);
    }

    pub(crate) fn record_clamp(&mut self) {
        self.clamped_frames = self.clamped_frames.saturating_add(1);
    }

    pub(crate) fn close_if_due(
        &mut self,
        now: Instant,
        entity_count: usize,
    ) -> Option<LoopMetricsSnapshot> {
        if now.saturating_duration_since(self.opened_at) < self.length {
            return None;
        }
        Some(self.close(now, entity_count))
    }

    /// Closes the window early. `None` when it saw no ticks.
    pub(crate) fn flush(
        &mut self,
        now: Instant,
        entity_count: usize,
    ) -> Option<LoopMetricsSnapshot> {
        if self.ticks == 0 {
            return None;
        }
        Some(self.close(now, entity_count))
    }

    fn close(&mut self, now: Instant, entity_count: usize) -> LoopMetricsSnapshot {
        let elapsed = now.saturating_duration_since(self.opened_at);
        let mean_tick_ms = if self.ticks == 0 {
            0.0
        } else {
            millis(self.busy) / self.ticks as f32
        };
        let snapshot = LoopMetricsSnapshot {
            tps: self.ticks as f32 / elapsed.as_secs_f32().max(f32::EPSILON),
            mean_tick_ms,
            worst_tick_ms: millis(self.worst),
            clamped_frames: self.clamped_frames,
            entity_count,
        };
        *self = Self::opened_at(self.length, now);
        snapshot
    }
}

fn millis(duration: Duration) -> f32 {
    duration.as_secs_f32() * 1000.0
}
