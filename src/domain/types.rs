//! Shared types for the exercise form monitor

use crate::domain::pose::Joint;
use serde::{Deserialize, Serialize};

/// Newtype wrapper for session IDs (UUIDv7, time-sortable)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Supported exercise kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Squat,
    PushUp,
    DownwardDog,
    JumpingJack,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 4] = [
        ExerciseKind::Squat,
        ExerciseKind::PushUp,
        ExerciseKind::DownwardDog,
        ExerciseKind::JumpingJack,
    ];

    /// Machine-friendly name, used in config files and report filenames
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Squat => "squat",
            ExerciseKind::PushUp => "push_up",
            ExerciseKind::DownwardDog => "downward_dog",
            ExerciseKind::JumpingJack => "jumping_jack",
        }
    }

    /// Human-readable name for narration and reports
    pub fn display_name(&self) -> &'static str {
        match self {
            ExerciseKind::Squat => "Squat",
            ExerciseKind::PushUp => "Push-Up",
            ExerciseKind::DownwardDog => "Downward Dog",
            ExerciseKind::JumpingJack => "Jumping Jack",
        }
    }
}

impl std::fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for ExerciseKind {
    type Err = String;

    /// Accepts "squat", "Push-Up", "push_up", "downward dog", "JUMPING-JACK", ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "squat" => Ok(ExerciseKind::Squat),
            "pushup" => Ok(ExerciseKind::PushUp),
            "downwarddog" => Ok(ExerciseKind::DownwardDog),
            "jumpingjack" => Ok(ExerciseKind::JumpingJack),
            _ => Err(format!("unknown exercise '{s}'")),
        }
    }
}

/// Phase of the repetition cycle used for edge-triggered counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Unset,
    Up,
    Down,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Unset => "unset",
            Stage::Up => "up",
            Stage::Down => "down",
        }
    }
}

/// Judgment attached to a finalized repetition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepVerdict {
    Correct,
    Incorrect,
}

/// How a narration message should be treated by the speech backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// Countdown, instructions, motion cues
    #[default]
    Cue,
    /// Positive reinforcement
    Praise,
    /// Form correction
    Correction,
}

/// Text to be spoken, produced by the state machine or the countdown sequencer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackEvent {
    pub text: String,
    pub urgency: Urgency,
}

impl FeedbackEvent {
    pub fn new(text: impl Into<String>, urgency: Urgency) -> Self {
        Self { text: text.into(), urgency }
    }

    pub fn cue(text: impl Into<String>) -> Self {
        Self::new(text, Urgency::Cue)
    }
}

/// One point of the progress series: correct reps at a given session second
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeSeriesSample {
    pub elapsed_secs: u64,
    pub correct_count: u32,
}

impl TimeSeriesSample {
    pub const fn new(elapsed_secs: u64, correct_count: u32) -> Self {
        Self { elapsed_secs, correct_count }
    }
}

/// Errors raised while evaluating a frame
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// A joint the exercise needs was not reported for this frame
    #[error("missing landmark {0}")]
    MissingLandmark(Joint),
    /// Non-finite coordinates reached an angle computation
    #[error("invalid geometry: non-finite input to {angle} angle")]
    InvalidGeometry { angle: &'static str },
}
