//! Push-up: elbow angle drives the stage, body line judges the rep
//!
//! Stage naming follows arm extension: `Down` once the arms are locked out,
//! `Up` when the bottom of the rep is reached.

use super::{Decision, Feedback};
use crate::domain::pose::{Joint, PoseSnapshot};
use crate::domain::types::{EngineError, RepVerdict, Stage, Urgency};
use crate::infra::config::PushUpThresholds;
use crate::services::geometry::measured_angle;

/// Body angle assumed when the knee is not visible
const STRAIGHT_BODY_FALLBACK_DEG: f64 = 180.0;

const LOWER_MORE: &str = "Lower yourself more!";
const KEEP_STRAIGHT: &str = "Keep your body straight!";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PushUpAngles {
    /// Shoulder-elbow-wrist
    pub elbow: f64,
    /// Shoulder-hip-knee, stands in for back straightness
    pub hip: f64,
}

impl PushUpAngles {
    pub fn measure(snapshot: &PoseSnapshot) -> Result<Self, EngineError> {
        let shoulder = snapshot.require(Joint::LeftShoulder)?;
        let elbow = snapshot.require(Joint::LeftElbow)?;
        let wrist = snapshot.require(Joint::LeftWrist)?;
        let hip = snapshot.require(Joint::LeftHip)?;

        let hip_angle = match snapshot.get(Joint::LeftKnee) {
            Some(knee) => measured_angle("hip", shoulder, hip, knee)?,
            None => STRAIGHT_BODY_FALLBACK_DEG,
        };

        Ok(Self { elbow: measured_angle("elbow", shoulder, elbow, wrist)?, hip: hip_angle })
    }
}

pub(super) fn advance(stage: Stage, angles: &PushUpAngles, t: &PushUpThresholds) -> Decision {
    let mut stage = stage;
    if angles.elbow > t.extended_elbow_deg {
        stage = Stage::Down;
    }

    if angles.elbow < t.bottom_elbow_deg && stage == Stage::Down {
        if angles.hip >= t.straight_body_deg {
            return Decision::rep(
                Stage::Up,
                RepVerdict::Correct,
                Feedback::show("Good push-up!"),
            );
        }
        // Depth is already below the bottom threshold here, so only the body line can fail
        return Decision::rep(
            Stage::Up,
            RepVerdict::Incorrect,
            Feedback::say(KEEP_STRAIGHT, Urgency::Correction),
        );
    }

    // Form hints between reps, depth before body line; counters are untouched
    let decision = Decision::hold(stage);
    if stage == Stage::Down && angles.elbow > t.bottom_elbow_deg && angles.elbow <= t.extended_elbow_deg
    {
        decision.with_feedback(Feedback::say(LOWER_MORE, Urgency::Correction))
    } else if angles.hip < t.straight_body_deg {
        decision.with_feedback(Feedback::say(KEEP_STRAIGHT, Urgency::Correction))
    } else {
        decision
    }
}
