use std::time::{Duration, Instant};

use super::FrameReport;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameMetricsSnapshot {
    pub frames: u32,
    pub fps: f32,
    pub frame_time_ms: f32,
    pub draw_calls_per_frame: f32,
    pub evictions: usize,
}

/// Aggregates frame reports over a wall-clock interval.
#[derive(Debug)]
pub struct FrameMetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    frames: u32,
    frame_time_sum: Duration,
    draw_calls: usize,
    evictions: usize,
}

impl FrameMetricsAccumulator {
    pub fn new(interval: Duration) -> Self {
        Self::starting_at(Instant::now(), interval)
    }

    pub fn starting_at(start: Instant, interval: Duration) -> Self {
        Self {
            interval_start: start,
            interval,
            frames: 0,
            frame_time_sum: Duration::ZERO,
            draw_calls: 0,
            evictions: 0,
        }
    }

    pub fn record_frame(&mut self, report: &FrameReport) {
        self.frames = self.frames.saturating_add(1);
        self.frame_time_sum = self.frame_time_sum.saturating_add(report.duration);
        self.draw_calls = self.draw_calls.saturating_add(report.view.draw_calls());
        self.evictions = self.evictions.saturating_add(report.evicted);
    }

    /// Emits and resets once `interval` has elapsed since the last snapshot.
    pub fn maybe_snapshot(&mut self, now: Instant) -> Option<FrameMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }
        Some(self.snapshot(now))
    }

    /// Emits whatever has accumulated so far and resets.
    pub fn snapshot(&mut self, now: Instant) -> FrameMetricsSnapshot {
        let elapsed = now.saturating_duration_since(self.interval_start);
        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let (frame_time_ms, draw_calls_per_frame) = if self.frames == 0 {
            (0.0, 0.0)
        } else {
            (
                (self.frame_time_sum.as_secs_f32() / self.frames as f32) * 1000.0,
                self.draw_calls as f32 / self.frames as f32,
            )
        };

        let snapshot = FrameMetricsSnapshot {
            frames: self.frames,
            fps: self.frames as f32 / elapsed_seconds,
            frame_time_ms,
            draw_calls_per_frame,
            evictions: self.evictions,
        };

        self.interval_start = now;
        self.frames = 0;
        self.frame_time_sum = Duration::ZERO;
        self.draw_calls = 0;
        self.evictions = 0;

        snapshot
    }
}
