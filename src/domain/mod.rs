//! Domain models - core exercise types and pose landmarks
//!
//! This module contains the canonical data types used throughout the system:
//! - `PoseSnapshot` - one frame of named joints from the pose estimator
//! - `ExerciseKind` / `Stage` - what is being monitored and where in the rep cycle
//! - `FeedbackEvent` - text headed for the narration queue
//! - `TimeSeriesSample` - progress series handed to the report generator

pub mod pose;
pub mod types;

// Re-export commonly used types at module level
pub use pose::{Joint, Point, PoseSnapshot};
pub use types::{
    EngineError, ExerciseKind, FeedbackEvent, RepVerdict, SessionId, Stage, TimeSeriesSample,
    Urgency,
};
