//! Downward dog: arm/leg alignment and hip elevation

use super::{Decision, Feedback};
use crate::domain::pose::{Joint, PoseSnapshot};
use crate::domain::types::{EngineError, RepVerdict, Stage, Urgency};
use crate::infra::config::DownwardDogThresholds;
use crate::services::geometry::measured_angle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownwardDogAngles {
    /// Shoulder-wrist-ankle
    pub alignment: f64,
    /// Shoulder-hip-ankle
    pub elevation: f64,
}

impl DownwardDogAngles {
    pub fn measure(snapshot: &PoseSnapshot) -> Result<Self, EngineError> {
        let shoulder = snapshot.require(Joint::LeftShoulder)?;
        let wrist = snapshot.require(Joint::LeftWrist)?;
        let hip = snapshot.require(Joint::LeftHip)?;
        let ankle = snapshot.require(Joint::LeftAnkle)?;

        Ok(Self {
            alignment: measured_angle("alignment", shoulder, wrist, ankle)?,
            elevation: measured_angle("elevation", shoulder, hip, ankle)?,
        })
    }
}

pub(super) fn advance(
    stage: Stage,
    angles: &DownwardDogAngles,
    t: &DownwardDogThresholds,
) -> Decision {
    let mut stage = stage;
    if angles.alignment > t.aligned_deg && angles.elevation > t.elevated_deg {
        stage = Stage::Up;
    }

    if angles.alignment < t.release_deg && stage == Stage::Up {
        return Decision::rep(Stage::Down, RepVerdict::Correct, Feedback::show("Good form!"));
    }

    let decision = Decision::hold(stage);
    if angles.alignment < t.aligned_deg {
        decision.with_feedback(Feedback::say("Extend your arms fully!", Urgency::Correction))
    } else if angles.elevation < t.hips_low_deg {
        decision.with_feedback(Feedback::say("Lift your hips higher!", Urgency::Correction))
    } else {
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn angles(alignment: f64, elevation: f64) -> DownwardDogAngles {
        DownwardDogAngles { alignment, elevation }
    }

    #[test]
    fn test_hold_then_release_counts_one_rep() {
        let t = DownwardDogThresholds::default();
        let hold = advance(Stage::Unset, &angles(170.0, 130.0), &t);
        assert_eq!(hold, Decision::hold(Stage::Up));

        let release = advance(hold.stage, &angles(30.0, 130.0), &t);
        assert_eq!(release.stage, Stage::Down);
        assert_eq!(release.verdict, Some(RepVerdict::Correct));

        // Releasing again without re-entering the pose does nothing
        let again = advance(release.stage, &angles(30.0, 130.0), &t);
        assert_eq!(again.verdict, None);
    }

    #[test]
    fn test_elevation_alone_does_not_enter_pose() {
        let decision = advance(Stage::Unset, &angles(170.0, 110.0), &DownwardDogThresholds::default());
        assert_eq!(decision.stage, Stage::Unset);
    }

    #[test]
    fn test_extend_arms_hint_has_priority() {
        let decision = advance(Stage::Unset, &angles(120.0, 80.0), &DownwardDogThresholds::default());
        assert_eq!(decision.verdict, None);
        assert_eq!(decision.feedback.unwrap().display, Some("Extend your arms fully!"));
    }

    #[test]
    fn test_lift_hips_hint() {
        let decision = advance(Stage::Unset, &angles(170.0, 90.0), &DownwardDogThresholds::default());
        assert_eq!(decision.verdict, None);
        assert_eq!(decision.feedback.unwrap().display, Some("Lift your hips higher!"));
    }
}
