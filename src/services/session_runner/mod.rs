//! Session runner - the single frame loop for every exercise kind
//!
//! Owns the `ExerciseSession` for one session and is the only code that
//! mutates it. Frames come in over an mpsc channel from the landmark source;
//! narration goes out through the `Narrator` without ever waiting on speech.
//!
//! Lifecycle:
//! 1. Start sequence (instructions, "Three, Two, One, Start"); frames that
//!    arrive meanwhile are discarded.
//! 2. Frame loop until the time limit, shutdown, or end of input.
//! 3. Report written, narrator stopped with its sentinel.

use crate::domain::types::{ExerciseKind, FeedbackEvent, RepVerdict, SessionId, TimeSeriesSample};
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::io::landmarks::LandmarkFrame;
use crate::io::report::{RepCounts, ReportWriter, SessionReport};
use crate::services::countdown::Countdown;
use crate::services::exercise::{ExerciseSession, FrameOutcome};
use crate::services::feedback_gate::FeedbackGate;
use crate::services::narrator::Narrator;
use crate::services::recorder::{Append, SessionRecorder};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

const REPORT_SAVED: &str = "Your exercise report has been saved";

/// Session time and the configured length limit
///
/// Frames stamped by the producer are timed from the first stamped frame so
/// a recorded file replays with its own timing; unstamped frames use the
/// wall clock since the frame loop started.
#[derive(Debug, Clone)]
pub struct SessionClock {
    /// `None` means no limit
    limit: Option<Duration>,
    started: Instant,
    first_frame_ms: Option<u64>,
}

impl SessionClock {
    /// A zero limit means the session runs until stopped
    pub fn new(limit: Duration) -> Self {
        Self {
            limit: (!limit.is_zero()).then_some(limit),
            started: Instant::now(),
            first_frame_ms: None,
        }
    }

    /// Restart timing, called when the start sequence has finished
    pub fn start(&mut self) {
        self.started = Instant::now();
        self.first_frame_ms = None;
    }

    pub fn wall_elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Session time of a frame
    pub fn frame_time(&mut self, t_ms: Option<u64>) -> Duration {
        match t_ms {
            Some(t) => {
                let first = *self.first_frame_ms.get_or_insert(t);
                Duration::from_millis(t.saturating_sub(first))
            }
            None => self.wall_elapsed(),
        }
    }

    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }

    /// Wall-clock instant at which the limit expires
    pub fn deadline(&self) -> Option<Instant> {
        self.limit.map(|limit| self.started + limit)
    }

    pub fn is_over(&self, now: Duration) -> bool {
        self.limit.is_some_and(|limit| now >= limit)
    }

    pub fn remaining(&self, now: Duration) -> Option<Duration> {
        self.limit.map(|limit| limit.saturating_sub(now))
    }

    /// Fraction of the limit used, 0.0 when unlimited
    pub fn progress(&self, now: Duration) -> f64 {
        match self.limit {
            Some(limit) => (now.as_secs_f64() / limit.as_secs_f64()).min(1.0),
            None => 0.0,
        }
    }
}

/// Why the session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    TimeLimit,
    Shutdown,
    InputEnded,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndReason::TimeLimit => "time_limit",
            EndReason::Shutdown => "shutdown",
            EndReason::InputEnded => "input_ended",
        }
    }
}

/// What a finished session hands back
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub exercise: ExerciseKind,
    pub counts: RepCounts,
    pub samples: Vec<TimeSeriesSample>,
    pub last_feedback: String,
    pub duration: Duration,
    pub end: EndReason,
    /// `None` if the report could not be written
    pub report_path: Option<PathBuf>,
}

pub struct SessionRunner {
    id: SessionId,
    session: ExerciseSession,
    gate: FeedbackGate,
    recorder: SessionRecorder,
    narrator: Narrator,
    metrics: Arc<Metrics>,
    clock: SessionClock,
    countdown: Countdown,
    reports: ReportWriter,
    /// Session time of the latest evaluated frame
    session_time: Duration,
    last_drop_warn: Option<Instant>,
}

impl SessionRunner {
    pub fn new(config: &Config, narrator: Narrator, metrics: Arc<Metrics>) -> Self {
        let kind = config.exercise();
        Self {
            id: SessionId::new(),
            session: ExerciseSession::with_thresholds(kind, config.thresholds()),
            gate: FeedbackGate::new(Duration::from_millis(config.feedback_cooldown_ms())),
            recorder: SessionRecorder::new(),
            narrator,
            metrics,
            clock: SessionClock::new(Duration::from_secs(config.duration_secs())),
            countdown: Countdown::new(kind, config.intro_enabled(), config.countdown_enabled()),
            reports: ReportWriter::new(config.report_dir()),
            session_time: Duration::ZERO,
            last_drop_warn: None,
        }
    }

    /// Run the session to completion
    pub async fn run(
        mut self,
        mut frame_rx: mpsc::Receiver<LandmarkFrame>,
        mut shutdown: watch::Receiver<bool>,
    ) -> SessionSummary {
        info!(
            session_id = %self.id.0,
            exercise = %self.session.kind().as_str(),
            limit_secs = %self.clock.limit().map(|d| d.as_secs()).unwrap_or(0),
            "session_started"
        );

        let end = match self.play_start_sequence(&mut frame_rx, &mut shutdown).await {
            Some(end) => end,
            None => {
                self.clock.start();
                self.frame_loop(&mut frame_rx, &mut shutdown).await
            }
        };

        self.finish(end).await
    }

    /// Speak the start sequence, discarding frames until it is over
    ///
    /// Returns early with the end reason if the session is cut short.
    async fn play_start_sequence(
        &mut self,
        frame_rx: &mut mpsc::Receiver<LandmarkFrame>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Option<EndReason> {
        let steps = self.countdown.steps().to_vec();
        for step in steps {
            self.narrate(step.event);
            if step.pause.is_zero() {
                continue;
            }
            let until = Instant::now() + step.pause;
            loop {
                tokio::select! {
                    biased;
                    _ = sleep_until(until) => break,
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            return Some(EndReason::Shutdown);
                        }
                    }
                    frame = frame_rx.recv() => match frame {
                        Some(_) => self.metrics.record_frame_discarded(),
                        None => return Some(EndReason::InputEnded),
                    },
                }
            }
        }
        if !self.countdown.is_empty() {
            debug!(session_id = %self.id.0, "start_sequence_finished");
        }
        None
    }

    async fn frame_loop(
        &mut self,
        frame_rx: &mut mpsc::Receiver<LandmarkFrame>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> EndReason {
        let deadline = self.clock.deadline();
        loop {
            tokio::select! {
                // Shutdown wins over the stream closing because of it
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return EndReason::Shutdown;
                    }
                }
                _ = async {
                    match deadline {
                        Some(d) => sleep_until(d).await,
                        None => std::future::pending().await,
                    }
                } => return EndReason::TimeLimit,
                frame = frame_rx.recv() => match frame {
                    Some(frame) => {
                        if !self.process_frame(frame) {
                            return EndReason::TimeLimit;
                        }
                    }
                    None => return EndReason::InputEnded,
                },
            }
        }
    }

    /// Evaluate one frame; `false` once the session time is used up
    ///
    /// A frame stamped earlier than one already seen is evaluated at the
    /// latest session time, so samples never go backwards.
    fn process_frame(&mut self, frame: LandmarkFrame) -> bool {
        let stamped = self.clock.frame_time(frame.t_ms);
        if self.clock.is_over(stamped) {
            return false;
        }
        self.session_time = self.session_time.max(stamped);
        let now = self.session_time;

        let eval_start = std::time::Instant::now();
        let result = self.session.update(&frame.snapshot, now);
        self.metrics.record_frame(eval_start.elapsed().as_micros() as u64);

        match result {
            Ok(outcome) => self.handle_outcome(outcome, now),
            Err(e) => {
                self.metrics.record_frame_invalid();
                warn!(
                    session_id = %self.id.0,
                    error = %e,
                    elapsed_ms = %now.as_millis(),
                    "frame_invalid_geometry"
                );
            }
        }
        true
    }

    fn handle_outcome(&mut self, outcome: FrameOutcome, now: Duration) {
        if outcome.is_skipped() {
            self.metrics.record_frame_skipped();
            return;
        }

        if let Some(rep) = outcome.rep {
            self.metrics.record_rep(rep.verdict == RepVerdict::Correct);
            debug!(
                session_id = %self.id.0,
                rep = %rep.number,
                remaining_secs = %self.clock.remaining(now).map(|d| d.as_secs()).unwrap_or(0),
                progress = format!("{:.2}", self.clock.progress(now)),
                "session_progress"
            );
        }
        if let Some(sample) = outcome.sample {
            match self.recorder.append(sample) {
                Append::Appended => {}
                Append::Duplicate => {
                    debug!(session_id = %self.id.0, secs = %sample.elapsed_secs, "sample_duplicate");
                }
                Append::OutOfOrder => {
                    warn!(
                        session_id = %self.id.0,
                        secs = %sample.elapsed_secs,
                        correct = %sample.correct_count,
                        "sample_out_of_order"
                    );
                }
            }
        }
        if let Some(event) = outcome.feedback {
            if self.gate.admit(&event, now) {
                self.narrate(event);
            } else {
                self.metrics.record_narration_suppressed();
            }
        }
    }

    /// Hand a phrase to the narrator; a full or closed queue drops it
    fn narrate(&mut self, event: FeedbackEvent) {
        match self.narrator.say(event) {
            Ok(()) => self.metrics.record_narration_enqueued(),
            Err(e) => {
                self.metrics.record_narration_dropped();
                // Rate-limit warning to 1 per second
                if self.last_drop_warn.map_or(true, |t| t.elapsed() > Duration::from_secs(1)) {
                    warn!(session_id = %self.id.0, reason = %e, "narration_dropped");
                    self.last_drop_warn = Some(Instant::now());
                }
            }
        }
    }

    async fn finish(mut self, end: EndReason) -> SessionSummary {
        let kind = self.session.kind();
        let counts = RepCounts {
            rep_count: self.session.rep_count(),
            correct_count: self.session.correct_count(),
            incorrect_count: self.session.incorrect_count(),
        };
        let mut duration = self.session_time.max(self.clock.wall_elapsed());
        if let Some(limit) = self.clock.limit() {
            duration = duration.min(limit);
        }
        let samples = self.recorder.samples().to_vec();

        let ended_at = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let report =
            SessionReport::new(&self.id, kind, counts, samples.clone(), duration.as_secs(), ended_at);
        let report_path = match self.reports.write(&report, ended_at) {
            Ok(path) => {
                info!(session_id = %self.id.0, file = %path.display(), "report_saved");
                self.narrate(FeedbackEvent::cue(REPORT_SAVED));
                Some(path)
            }
            Err(e) => {
                error!(session_id = %self.id.0, error = %format!("{e:#}"), "report_save_failed");
                None
            }
        };

        self.narrator.stop().await;

        info!(
            session_id = %self.id.0,
            exercise = %kind.as_str(),
            end = %end.as_str(),
            reps = %counts.rep_count,
            correct = %counts.correct_count,
            incorrect = %counts.incorrect_count,
            duration_secs = %duration.as_secs(),
            "session_finished"
        );

        SessionSummary {
            session_id: self.id,
            exercise: kind,
            counts,
            samples,
            last_feedback: self.session.last_feedback().to_string(),
            duration,
            end,
            report_path,
        }
    }
}
