//! Jumping jack: wrist height drives the stage
//!
//! The session starts in `Down` (hands at the sides). Hands leaving the
//! lowered position start a step; hands returning finalize it. The step is
//! correct when the highest wrist position reached during it was above the
//! nose.

use super::{Decision, Feedback};
use crate::domain::pose::{Joint, PoseSnapshot};
use crate::domain::types::{EngineError, RepVerdict, Stage, Urgency};
use crate::services::geometry::{average_wrist_y, hands_lowered, waving_sideways};

/// Joints every jumping-jack frame must carry
const REQUIRED: [Joint; 5] = [
    Joint::LeftWrist,
    Joint::RightWrist,
    Joint::LeftShoulder,
    Joint::RightShoulder,
    Joint::Nose,
];

/// Arm measurements for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct ArmPose {
    pub hand_avg_y: f64,
    pub nose_y: f64,
    pub lowered: bool,
    pub waving: bool,
}

impl ArmPose {
    pub(super) fn measure(snapshot: &PoseSnapshot) -> Result<Self, EngineError> {
        for joint in REQUIRED {
            let point = snapshot.require(joint)?;
            if !point.is_finite() {
                return Err(EngineError::InvalidGeometry { angle: "wrist_height" });
            }
        }

        Ok(Self {
            hand_avg_y: average_wrist_y(snapshot),
            nose_y: snapshot.y_or_lowered(Joint::Nose),
            lowered: hands_lowered(snapshot),
            waving: waving_sideways(snapshot),
        })
    }
}

/// Per-session scratch state
#[derive(Debug, Clone, PartialEq)]
pub struct JumpingJackState {
    /// Smallest average wrist y seen during the current step (smaller is higher)
    pub max_hand_height: f64,
    /// Set once the current step has been judged; reset when a new step starts
    pub step_evaluated: bool,
    /// Arms were seen held out sideways during the current step
    pub saw_waving: bool,
}

impl Default for JumpingJackState {
    fn default() -> Self {
        Self { max_hand_height: 1.0, step_evaluated: false, saw_waving: false }
    }
}

impl JumpingJackState {
    pub(super) fn advance(&mut self, stage: Stage, pose: &ArmPose) -> Decision {
        if stage == Stage::Up {
            if pose.hand_avg_y < self.max_hand_height {
                self.max_hand_height = pose.hand_avg_y;
            }
            self.saw_waving |= pose.waving;
        }

        match stage {
            Stage::Down | Stage::Unset if !pose.lowered => {
                self.max_hand_height = pose.hand_avg_y;
                self.step_evaluated = false;
                self.saw_waving = pose.waving;
                let cue = Feedback { display: None, spoken: Some("Jump!"), urgency: Urgency::Cue };
                Decision::hold(Stage::Up).with_feedback(cue)
            }
            Stage::Up if pose.lowered => {
                if self.step_evaluated {
                    return Decision::hold(Stage::Down);
                }
                self.step_evaluated = true;
                let (verdict, feedback) = self.judge(pose);
                Decision::rep(Stage::Down, verdict, feedback)
            }
            _ => Decision::hold(stage),
        }
    }

    fn judge(&self, pose: &ArmPose) -> (RepVerdict, Feedback) {
        if self.max_hand_height < pose.nose_y {
            let feedback =
                Feedback { display: Some("Good form!"), spoken: Some("Good!"), urgency: Urgency::Praise };
            (RepVerdict::Correct, feedback)
        } else if self.saw_waving || pose.waving {
            let feedback = Feedback {
                display: Some("Don't wave sideways!"),
                spoken: Some("Keep arms straight up and down!"),
                urgency: Urgency::Correction,
            };
            (RepVerdict::Incorrect, feedback)
        } else {
            let feedback = Feedback {
                display: Some("Raise hands higher!"),
                spoken: Some("Reach higher with your hands!"),
                urgency: Urgency::Correction,
            };
            (RepVerdict::Incorrect, feedback)
        }
    }
}
