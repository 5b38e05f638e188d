//! Per-session exercise state machine
//!
//! One `ExerciseSession` exists per active session and is owned by the frame
//! loop. Each call to [`ExerciseSession::update`] consumes a single pose
//! snapshot, advances the kind-specific stage machine and, when a repetition
//! is finalized, updates the counters and yields a progress sample.
//!
//! Correctness is judged only on the stage transition that completes a rep,
//! never on every frame, so a single repetition cannot be counted twice.

mod downward_dog;
mod jumping_jack;
mod push_up;
mod squat;

pub use downward_dog::DownwardDogAngles;
pub use jumping_jack::JumpingJackState;
pub use push_up::PushUpAngles;
pub use squat::SquatAngles;

use crate::domain::pose::{Joint, PoseSnapshot};
use crate::domain::types::{
    EngineError, ExerciseKind, FeedbackEvent, RepVerdict, Stage, TimeSeriesSample, Urgency,
};
use crate::infra::config::{
    DownwardDogThresholds, PushUpThresholds, SquatThresholds, ThresholdsConfig,
};
use std::time::Duration;
use tracing::{debug, info};

/// Feedback chosen by a kind's transition logic
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Feedback {
    /// On-screen text; `None` leaves the previous message displayed
    pub display: Option<&'static str>,
    /// Phrase for the narration queue
    pub spoken: Option<&'static str>,
    pub urgency: Urgency,
}

impl Feedback {
    /// Same text shown and spoken
    pub(crate) const fn say(text: &'static str, urgency: Urgency) -> Self {
        Self { display: Some(text), spoken: Some(text), urgency }
    }

    /// Shown only
    pub(crate) const fn show(text: &'static str) -> Self {
        Self { display: Some(text), spoken: None, urgency: Urgency::Praise }
    }
}

/// Result of one kind-specific step
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Decision {
    pub stage: Stage,
    /// Set when this frame finalized a repetition
    pub verdict: Option<RepVerdict>,
    pub feedback: Option<Feedback>,
}

impl Decision {
    pub(crate) fn hold(stage: Stage) -> Self {
        Self { stage, verdict: None, feedback: None }
    }

    pub(crate) fn rep(stage: Stage, verdict: RepVerdict, feedback: Feedback) -> Self {
        Self { stage, verdict: Some(verdict), feedback: Some(feedback) }
    }

    pub(crate) fn with_feedback(mut self, feedback: Feedback) -> Self {
        self.feedback = Some(feedback);
        self
    }
}

/// A repetition finalized on this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepEvent {
    /// 1-based repetition number within the session
    pub number: u32,
    pub verdict: RepVerdict,
}

/// What a single `update` call produced
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    /// Stage after this frame
    pub stage: Stage,
    pub rep: Option<RepEvent>,
    /// Narration request; the caller applies the cooldown before enqueueing
    pub feedback: Option<FeedbackEvent>,
    /// New progress point, present exactly when `rep` is
    pub sample: Option<TimeSeriesSample>,
    /// Joint whose absence turned this frame into a no-op
    pub skipped: Option<Joint>,
}

impl FrameOutcome {
    fn skipped(stage: Stage, joint: Joint) -> Self {
        Self { stage, rep: None, feedback: None, sample: None, skipped: Some(joint) }
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }
}

/// Kind-specific thresholds and scratch state
#[derive(Debug, Clone, PartialEq)]
enum Machine {
    Squat(SquatThresholds),
    PushUp(PushUpThresholds),
    DownwardDog(DownwardDogThresholds),
    JumpingJack(JumpingJackState),
}

/// State of one exercise session
#[derive(Debug, Clone)]
pub struct ExerciseSession {
    machine: Machine,
    stage: Stage,
    rep_count: u32,
    correct_count: u32,
    incorrect_count: u32,
    last_feedback: String,
    /// Session time at which `last_feedback` was set
    feedback_issued_at: Option<Duration>,
}

impl ExerciseSession {
    /// Create a session with default thresholds
    pub fn new(kind: ExerciseKind) -> Self {
        Self::with_thresholds(kind, &ThresholdsConfig::default())
    }

    /// Create a session using configured thresholds
    pub fn with_thresholds(kind: ExerciseKind, thresholds: &ThresholdsConfig) -> Self {
        let (machine, stage) = match kind {
            ExerciseKind::Squat => (Machine::Squat(thresholds.squat.clone()), Stage::Unset),
            ExerciseKind::PushUp => (Machine::PushUp(thresholds.push_up.clone()), Stage::Unset),
            ExerciseKind::DownwardDog => {
                (Machine::DownwardDog(thresholds.downward_dog.clone()), Stage::Unset)
            }
            ExerciseKind::JumpingJack => {
                (Machine::JumpingJack(JumpingJackState::default()), Stage::Down)
            }
        };

        Self {
            machine,
            stage,
            rep_count: 0,
            correct_count: 0,
            incorrect_count: 0,
            last_feedback: String::new(),
            feedback_issued_at: None,
        }
    }

    /// Consume one snapshot taken `elapsed` after session start
    ///
    /// A missing landmark leaves the session untouched and is reported through
    /// `FrameOutcome::skipped`. Non-finite coordinates also leave the session
    /// untouched but are returned as `EngineError::InvalidGeometry`.
    pub fn update(
        &mut self,
        snapshot: &PoseSnapshot,
        elapsed: Duration,
    ) -> Result<FrameOutcome, EngineError> {
        match self.evaluate(snapshot) {
            Ok(decision) => Ok(self.apply(decision, elapsed)),
            Err(EngineError::MissingLandmark(joint)) => {
                debug!(
                    exercise = %self.kind().as_str(),
                    joint = %joint,
                    "frame_skipped_missing_landmark"
                );
                Ok(FrameOutcome::skipped(self.stage, joint))
            }
            Err(e) => Err(e),
        }
    }

    /// Run the kind's measurement and transition step without mutating counters
    fn evaluate(&mut self, snapshot: &PoseSnapshot) -> Result<Decision, EngineError> {
        let stage = self.stage;
        match &mut self.machine {
            Machine::Squat(t) => Ok(squat::advance(stage, &SquatAngles::measure(snapshot)?, t)),
            Machine::PushUp(t) => {
                Ok(push_up::advance(stage, &PushUpAngles::measure(snapshot)?, t))
            }
            Machine::DownwardDog(t) => {
                Ok(downward_dog::advance(stage, &DownwardDogAngles::measure(snapshot)?, t))
            }
            Machine::JumpingJack(state) => {
                let pose = jumping_jack::ArmPose::measure(snapshot)?;
                Ok(state.advance(stage, &pose))
            }
        }
    }

    fn apply(&mut self, decision: Decision, elapsed: Duration) -> FrameOutcome {
        if decision.stage != self.stage {
            debug!(
                exercise = %self.kind().as_str(),
                from = %self.stage.as_str(),
                to = %decision.stage.as_str(),
                "stage_changed"
            );
            self.stage = decision.stage;
        }

        let mut rep = None;
        let mut sample = None;
        if let Some(verdict) = decision.verdict {
            self.rep_count += 1;
            match verdict {
                RepVerdict::Correct => self.correct_count += 1,
                RepVerdict::Incorrect => self.incorrect_count += 1,
            }
            rep = Some(RepEvent { number: self.rep_count, verdict });
            sample = Some(TimeSeriesSample::new(elapsed.as_secs(), self.correct_count));
        }

        let mut feedback = None;
        if let Some(fb) = decision.feedback {
            if let Some(text) = fb.display {
                self.last_feedback.clear();
                self.last_feedback.push_str(text);
                self.feedback_issued_at = Some(elapsed);
            }
            feedback = fb.spoken.map(|text| FeedbackEvent::new(text, fb.urgency));
        }

        if let Some(rep) = rep {
            info!(
                exercise = %self.kind().as_str(),
                rep = %rep.number,
                verdict = ?rep.verdict,
                correct = %self.correct_count,
                incorrect = %self.incorrect_count,
                feedback = %self.last_feedback,
                elapsed_secs = %elapsed.as_secs(),
                "rep_finalized"
            );
        }

        FrameOutcome { stage: self.stage, rep, feedback, sample, skipped: None }
    }

    pub fn kind(&self) -> ExerciseKind {
        match self.machine {
            Machine::Squat(_) => ExerciseKind::Squat,
            Machine::PushUp(_) => ExerciseKind::PushUp,
            Machine::DownwardDog(_) => ExerciseKind::DownwardDog,
            Machine::JumpingJack(_) => ExerciseKind::JumpingJack,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    pub fn incorrect_count(&self) -> u32 {
        self.incorrect_count
    }

    /// Most recent on-screen feedback, empty until the first message
    pub fn last_feedback(&self) -> &str {
        &self.last_feedback
    }

    pub fn feedback_issued_at(&self) -> Option<Duration> {
        self.feedback_issued_at
    }

    /// Jumping-jack scratch state, `None` for other kinds
    pub fn jumping_jack_state(&self) -> Option<&JumpingJackState> {
        match &self.machine {
            Machine::JumpingJack(state) => Some(state),
            _ => None,
        }
    }
}
