//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `landmarks` - JSON-lines frames from the pose estimator
//! - `speech` - Text-to-speech backends
//! - `report` - Session report output (JSON)

pub mod landmarks;
pub mod report;
pub mod speech;

// Re-export commonly used types
pub use landmarks::{forward_frames, open_input, LandmarkFrame};
pub use report::{ReportWriter, SessionReport};
pub use speech::{speech_from_config, SpeechSink};
