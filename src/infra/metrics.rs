//! Lock-free session counters and periodic reporting
//!
//! The frame loop and the narrator update these from different tasks.
//! All atomics use Relaxed ordering: they are statistics only and must not be
//! used for coordination.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

#[derive(Debug)]
pub struct Metrics {
    frames_total: AtomicU64,
    frames_skipped: AtomicU64,
    frames_invalid: AtomicU64,
    /// Frames that arrived before the countdown finished
    frames_discarded: AtomicU64,
    reps_correct: AtomicU64,
    reps_incorrect: AtomicU64,
    narration_enqueued: AtomicU64,
    narration_dropped: AtomicU64,
    narration_suppressed: AtomicU64,
    narration_failed: AtomicU64,

    // Reset on every report
    frames_since_report: AtomicU64,
    eval_sum_us: AtomicU64,
    eval_max_us: AtomicU64,
    last_report_time: parking_lot::Mutex<Instant>,
}

/// Point-in-time view of the counters
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSummary {
    pub frames_total: u64,
    pub frames_per_sec: f64,
    pub frames_skipped: u64,
    pub frames_invalid: u64,
    pub frames_discarded: u64,
    pub reps_correct: u64,
    pub reps_incorrect: u64,
    pub narration_enqueued: u64,
    pub narration_dropped: u64,
    pub narration_suppressed: u64,
    pub narration_failed: u64,
    pub avg_eval_us: u64,
    pub max_eval_us: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            frames_total: AtomicU64::new(0),
            frames_skipped: AtomicU64::new(0),
            frames_invalid: AtomicU64::new(0),
            frames_discarded: AtomicU64::new(0),
            reps_correct: AtomicU64::new(0),
            reps_incorrect: AtomicU64::new(0),
            narration_enqueued: AtomicU64::new(0),
            narration_dropped: AtomicU64::new(0),
            narration_suppressed: AtomicU64::new(0),
            narration_failed: AtomicU64::new(0),
            frames_since_report: AtomicU64::new(0),
            eval_sum_us: AtomicU64::new(0),
            eval_max_us: AtomicU64::new(0),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    /// Record one evaluated frame and how long the state machine took
    #[inline]
    pub fn record_frame(&self, eval_us: u64) {
        self.frames_total.fetch_add(1, Ordering::Relaxed);
        self.frames_since_report.fetch_add(1, Ordering::Relaxed);
        self.eval_sum_us.fetch_add(eval_us, Ordering::Relaxed);
        update_atomic_max(&self.eval_max_us, eval_us);
    }

    #[inline]
    pub fn record_frame_skipped(&self) {
        self.frames_skipped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_frame_invalid(&self) {
        self.frames_invalid.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_frame_discarded(&self) {
        self.frames_discarded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rep(&self, correct: bool) {
        if correct {
            self.reps_correct.fetch_add(1, Ordering::Relaxed);
        } else {
            self.reps_incorrect.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_narration_enqueued(&self) {
        self.narration_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Narration queue full or closed
    #[inline]
    pub fn record_narration_dropped(&self) {
        self.narration_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Held back by the cooldown gate
    #[inline]
    pub fn record_narration_suppressed(&self) {
        self.narration_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    /// Speech backend returned an error
    #[inline]
    pub fn record_narration_failed(&self) {
        self.narration_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frames_total(&self) -> u64 {
        self.frames_total.load(Ordering::Relaxed)
    }

    pub fn narration_dropped(&self) -> u64 {
        self.narration_dropped.load(Ordering::Relaxed)
    }

    /// Snapshot the counters and reset the per-interval ones
    pub fn report(&self) -> MetricsSummary {
        let frames = self.frames_since_report.swap(0, Ordering::Relaxed);
        let eval_sum = self.eval_sum_us.swap(0, Ordering::Relaxed);
        let eval_max = self.eval_max_us.swap(0, Ordering::Relaxed);

        let elapsed_secs = {
            let mut last = self.last_report_time.lock();
            let secs = last.elapsed().as_secs_f64();
            *last = Instant::now();
            secs
        };
        let frames_per_sec = if elapsed_secs > 0.0 { frames as f64 / elapsed_secs } else { 0.0 };

        MetricsSummary {
            frames_total: self.frames_total.load(Ordering::Relaxed),
            frames_per_sec,
            frames_skipped: self.frames_skipped.load(Ordering::Relaxed),
            frames_invalid: self.frames_invalid.load(Ordering::Relaxed),
            frames_discarded: self.frames_discarded.load(Ordering::Relaxed),
            reps_correct: self.reps_correct.load(Ordering::Relaxed),
            reps_incorrect: self.reps_incorrect.load(Ordering::Relaxed),
            narration_enqueued: self.narration_enqueued.load(Ordering::Relaxed),
            narration_dropped: self.narration_dropped.load(Ordering::Relaxed),
            narration_suppressed: self.narration_suppressed.load(Ordering::Relaxed),
            narration_failed: self.narration_failed.load(Ordering::Relaxed),
            avg_eval_us: if frames > 0 { eval_sum / frames } else { 0 },
            max_eval_us: eval_max,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            frames_total = %self.frames_total,
            frames_per_sec = format!("{:.1}", self.frames_per_sec),
            skipped = %self.frames_skipped,
            invalid = %self.frames_invalid,
            discarded = %self.frames_discarded,
            reps_correct = %self.reps_correct,
            reps_incorrect = %self.reps_incorrect,
            narration_enqueued = %self.narration_enqueued,
            narration_dropped = %self.narration_dropped,
            narration_suppressed = %self.narration_suppressed,
            narration_failed = %self.narration_failed,
            avg_eval_us = %self.avg_eval_us,
            max_eval_us = %self.max_eval_us,
            "metrics"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new();
        assert_eq!(metrics.frames_total(), 0);
        assert_eq!(metrics.narration_dropped(), 0);
    }

    #[test]
    fn test_record_frame() {
        let metrics = Metrics::new();
        metrics.record_frame(100);
        metrics.record_frame(300);
        assert_eq!(metrics.frames_total(), 2);
        assert_eq!(metrics.eval_sum_us.load(Ordering::Relaxed), 400);
        assert_eq!(metrics.eval_max_us.load(Ordering::Relaxed), 300);
    }

    #[test]
    fn test_report() {
        let metrics = Metrics::new();
        metrics.record_frame(100);
        metrics.record_frame(200);
        metrics.record_frame(300);
        metrics.record_frame_skipped();
        metrics.record_rep(true);
        metrics.record_rep(false);
        metrics.record_rep(true);
        metrics.record_narration_enqueued();
        metrics.record_narration_dropped();

        let summary = metrics.report();
        assert_eq!(summary.frames_total, 3);
        assert_eq!(summary.avg_eval_us, 200);
        assert_eq!(summary.max_eval_us, 300);
        assert_eq!(summary.frames_skipped, 1);
        assert_eq!(summary.reps_correct, 2);
        assert_eq!(summary.reps_incorrect, 1);
        assert_eq!(summary.narration_enqueued, 1);
        assert_eq!(summary.narration_dropped, 1);

        // Per-interval counters reset, totals kept
        assert_eq!(metrics.frames_since_report.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.eval_sum_us.load(Ordering::Relaxed), 0);
        let again = metrics.report();
        assert_eq!(again.frames_total, 3);
        assert_eq!(again.avg_eval_us, 0);
    }

    #[test]
    fn test_update_atomic_max() {
        let max = AtomicU64::new(50);
        update_atomic_max(&max, 10);
        assert_eq!(max.load(Ordering::Relaxed), 50);
        update_atomic_max(&max, 70);
        assert_eq!(max.load(Ordering::Relaxed), 70);
    }
}
