//! Squat: knee bend drives the stage, torso lean and hip depth judge the rep

use super::{Decision, Feedback};
use crate::domain::pose::{Joint, Point, PoseSnapshot};
use crate::domain::types::{EngineError, RepVerdict, Stage, Urgency};
use crate::infra::config::SquatThresholds;
use crate::services::geometry::measured_angle;

/// Angles measured on the left side of the body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquatAngles {
    /// Hip-knee-ankle
    pub knee_ankle: f64,
    /// Angle at the shoulder between the hip and a point straight above the
    /// hip; 180° when the torso is upright, small when folded forward
    pub hip_vertical: f64,
    /// Thigh angle at the knee against a vertical through the hip
    pub hip_knee: f64,
}

impl SquatAngles {
    pub fn measure(snapshot: &PoseSnapshot) -> Result<Self, EngineError> {
        let shoulder = snapshot.require(Joint::LeftShoulder)?;
        let hip = snapshot.require(Joint::LeftHip)?;
        let knee = snapshot.require(Joint::LeftKnee)?;
        let ankle = snapshot.require(Joint::LeftAnkle)?;
        let vertical = Point::new(hip.x, 0.0);

        Ok(Self {
            knee_ankle: measured_angle("knee_ankle", hip, knee, ankle)?,
            hip_vertical: measured_angle("hip_vertical", hip, shoulder, vertical)?,
            hip_knee: measured_angle("hip_knee", hip, knee, vertical)?,
        })
    }
}

pub(super) fn advance(stage: Stage, angles: &SquatAngles, t: &SquatThresholds) -> Decision {
    let mut stage = stage;
    if angles.knee_ankle < t.down_knee_deg {
        stage = Stage::Down;
    }

    if angles.knee_ankle > t.up_knee_deg && stage == Stage::Down {
        let (verdict, feedback) = judge(angles, t);
        return Decision::rep(Stage::Up, verdict, feedback);
    }

    Decision::hold(stage)
}

/// Ordered fault chain; the first matching branch decides the rep
fn judge(angles: &SquatAngles, t: &SquatThresholds) -> (RepVerdict, Feedback) {
    if angles.hip_vertical < t.lean_forward_deg {
        (RepVerdict::Incorrect, Feedback::say("Bend forward.", Urgency::Correction))
    } else if angles.hip_vertical > t.lean_backward_deg {
        (RepVerdict::Incorrect, Feedback::say("Bend backward.", Urgency::Correction))
    } else if (t.lower_hips_min_deg..=t.lower_hips_max_deg).contains(&angles.hip_knee) {
        let feedback = Feedback {
            display: Some("Lower hips."),
            spoken: Some("Good form!"),
            urgency: Urgency::Praise,
        };
        (RepVerdict::Correct, feedback)
    } else if angles.knee_ankle > t.knee_over_toes_deg {
        (RepVerdict::Incorrect, Feedback::say("Knee falling over toes.", Urgency::Correction))
    } else if angles.hip_knee > t.too_deep_deg {
        (RepVerdict::Incorrect, Feedback::say("Too deep squat.", Urgency::Correction))
    } else {
        (RepVerdict::Correct, Feedback::show("Good form!"))
    }
}
