//! Session report egress
//!
//! At session end the progress series and final counters are written as one
//! pretty-printed JSON document per session into the report directory.
//! Rendering the document for people (charts, PDF) happens elsewhere.

use crate::domain::types::{ExerciseKind, SessionId, TimeSeriesSample};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{debug, info};

const DEFAULT_TIP: &str = "Great effort! Maintain consistency in your form.";

/// Final counters of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RepCounts {
    pub rep_count: u32,
    pub correct_count: u32,
    pub incorrect_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub session_id: String,
    pub exercise: ExerciseKind,
    pub exercise_name: &'static str,
    /// RFC 3339
    pub ended_at: String,
    pub duration_secs: u64,
    #[serde(flatten)]
    pub counts: RepCounts,
    /// Ordered (seconds, correct count) pairs, one per finalized rep
    pub samples: Vec<TimeSeriesSample>,
    /// Correct reps per second at the last sample
    pub avg_correct_rate: f64,
    pub tip: &'static str,
}

impl SessionReport {
    pub fn new(
        session_id: &SessionId,
        exercise: ExerciseKind,
        counts: RepCounts,
        samples: Vec<TimeSeriesSample>,
        duration_secs: u64,
        ended_at: OffsetDateTime,
    ) -> Self {
        let avg_correct_rate = average_rate(&samples);
        let tip = if samples.is_empty() { DEFAULT_TIP } else { tip_for(exercise, avg_correct_rate) };

        Self {
            session_id: session_id.0.clone(),
            exercise,
            exercise_name: exercise.display_name(),
            ended_at: ended_at.format(&Rfc3339).unwrap_or_default(),
            duration_secs,
            counts,
            samples,
            avg_correct_rate,
            tip,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize session report")
    }
}

/// Correct count over elapsed seconds at the last sample, 0 when no time passed
pub fn average_rate(samples: &[TimeSeriesSample]) -> f64 {
    match samples.last() {
        Some(last) if last.elapsed_secs > 0 => {
            f64::from(last.correct_count) / last.elapsed_secs as f64
        }
        _ => 0.0,
    }
}

/// Pace advice by exercise-specific rate bands
pub fn tip_for(exercise: ExerciseKind, rate: f64) -> &'static str {
    match exercise {
        ExerciseKind::JumpingJack if rate < 0.5 => {
            "Try to increase your pace for better cardio benefit."
        }
        ExerciseKind::JumpingJack if rate > 1.0 => "Excellent pace! Keep it up.",
        ExerciseKind::Squat if rate < 0.3 => {
            "Focus on form rather than speed. Keep your back straight."
        }
        ExerciseKind::Squat if rate > 0.7 => "Good pace! Make sure you're going deep enough.",
        ExerciseKind::PushUp if rate < 0.4 => {
            "Focus on full range of motion. Lower all the way down."
        }
        ExerciseKind::PushUp if rate > 0.8 => "Great pace! Maintain control throughout.",
        _ => DEFAULT_TIP,
    }
}

/// Report file name, e.g. `squat_report_20260101_093000.json`
pub fn report_file_name(exercise: ExerciseKind, at: OffsetDateTime) -> String {
    let stamp = at
        .format(format_description!("[year][month][day]_[hour][minute][second]"))
        .unwrap_or_else(|_| at.unix_timestamp().to_string());
    format!("{}_report_{}.json", exercise.as_str(), stamp)
}

/// Writes session reports into a directory
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        info!(dir = %dir.display(), "report_writer_initialized");
        Self { dir }
    }

    /// Write the report, creating the directory if needed
    ///
    /// `at` names the file; the path written is returned.
    pub fn write(&self, report: &SessionReport, at: OffsetDateTime) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create report dir {}", self.dir.display()))?;

        let path = self.dir.join(report_file_name(report.exercise, at));
        let json = report.to_json()?;
        std::fs::write(&path, &json)
            .with_context(|| format!("failed to write report {}", path.display()))?;

        debug!(file = %path.display(), bytes = %json.len(), "report_written");
        Ok(path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;
    use time::macros::datetime;

    fn counts(correct: u32, incorrect: u32) -> RepCounts {
        RepCounts { rep_count: correct + incorrect, correct_count: correct, incorrect_count: incorrect }
    }

    #[test]
    fn test_average_rate() {
        assert_eq!(average_rate(&[]), 0.0);
        assert_eq!(average_rate(&[TimeSeriesSample::new(0, 1)]), 0.0);
        let samples = [TimeSeriesSample::new(3, 1), TimeSeriesSample::new(10, 5)];
        assert!((average_rate(&samples) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_tip_bands() {
        assert_eq!(tip_for(ExerciseKind::JumpingJack, 0.2), "Try to increase your pace for better cardio benefit.");
        assert_eq!(tip_for(ExerciseKind::JumpingJack, 0.7), DEFAULT_TIP);
        assert_eq!(tip_for(ExerciseKind::JumpingJack, 1.5), "Excellent pace! Keep it up.");
        assert_eq!(
            tip_for(ExerciseKind::Squat, 0.1),
            "Focus on form rather than speed. Keep your back straight."
        );
        assert_eq!(tip_for(ExerciseKind::Squat, 0.9), "Good pace! Make sure you're going deep enough.");
        assert_eq!(tip_for(ExerciseKind::PushUp, 0.3), "Focus on full range of motion. Lower all the way down.");
        assert_eq!(tip_for(ExerciseKind::PushUp, 0.9), "Great pace! Maintain control throughout.");
        assert_eq!(tip_for(ExerciseKind::DownwardDog, 0.0), DEFAULT_TIP);
    }

    #[test]
    fn test_empty_session_gets_default_tip() {
        let report = SessionReport::new(
            &SessionId::new(),
            ExerciseKind::Squat,
            RepCounts::default(),
            Vec::new(),
            5,
            datetime!(2026-03-01 09:30:00 UTC),
        );
        assert_eq!(report.tip, DEFAULT_TIP);
        assert_eq!(report.avg_correct_rate, 0.0);
    }

    #[test]
    fn test_report_file_name() {
        let name = report_file_name(ExerciseKind::PushUp, datetime!(2026-03-01 09:05:07 UTC));
        assert_eq!(name, "push_up_report_20260301_090507.json");
    }

    #[test]
    fn test_write_report() {
        let dir = tempdir().unwrap();
        let writer = ReportWriter::new(dir.path().join("nested").join("reports"));
        let at = datetime!(2026-03-01 09:30:00 UTC);

        let samples = vec![TimeSeriesSample::new(3, 1), TimeSeriesSample::new(7, 2)];
        let report =
            SessionReport::new(&SessionId::new(), ExerciseKind::JumpingJack, counts(2, 1), samples, 60, at);

        let path = writer.write(&report, at).unwrap();
        assert!(path.starts_with(writer.dir()));
        assert!(path.ends_with("jumping_jack_report_20260301_093000.json"));

        let content = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["exercise"], "jumping_jack");
        assert_eq!(parsed["exercise_name"], "Jumping Jack");
        assert_eq!(parsed["ended_at"], "2026-03-01T09:30:00Z");
        assert_eq!(parsed["rep_count"], 3);
        assert_eq!(parsed["correct_count"], 2);
        assert_eq!(parsed["incorrect_count"], 1);
        assert_eq!(parsed["samples"][1]["elapsed_secs"], 7);
        assert_eq!(parsed["samples"][1]["correct_count"], 2);
        assert_eq!(parsed["tip"], "Try to increase your pace for better cardio benefit.");
    }

    #[test]
    fn test_write_into_unwritable_path_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let writer = ReportWriter::new(blocker.join("reports"));
        let report = SessionReport::new(
            &SessionId::new(),
            ExerciseKind::Squat,
            RepCounts::default(),
            Vec::new(),
            0,
            datetime!(2026-03-01 09:30:00 UTC),
        );
        assert!(writer.write(&report, datetime!(2026-03-01 09:30:00 UTC)).is_err());
    }
}
