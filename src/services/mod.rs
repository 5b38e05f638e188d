//! Services - exercise evaluation and session orchestration
//!
//! This module contains the core logic:
//! - `geometry` - Joint angles and arm-position predicates
//! - `exercise` - Per-session exercise state machine
//! - `feedback_gate` - Caller-side narration cooldown
//! - `recorder` - Progress series for the session report
//! - `narrator` - Async narration worker
//! - `countdown` - Spoken start sequence
//! - `session_runner` - The frame loop tying the above together

pub mod countdown;
pub mod exercise;
pub mod feedback_gate;
pub mod geometry;
pub mod narrator;
pub mod recorder;
pub mod session_runner;

// Re-export commonly used types
pub use exercise::{ExerciseSession, FrameOutcome, RepEvent};
pub use narrator::{create_narrator, Narration, NarrationError, NarrationWorker, Narrator};
pub use session_runner::{EndReason, SessionClock, SessionRunner, SessionSummary};
