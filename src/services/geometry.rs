//! Joint angles and simple pose predicates
//!
//! Pure functions over normalized image coordinates. Smaller y is visually
//! higher in the frame.

use crate::domain::pose::{Joint, Point, PoseSnapshot};
use crate::domain::types::EngineError;

/// Wrists within this vertical distance of the shoulders count as level
pub const WAVE_LEVEL_TOLERANCE: f64 = 0.1;
/// Horizontal wrist-to-shoulder distance beyond which arms are out to the side
pub const WAVE_SIDEWAYS_REACH: f64 = 0.15;

/// Angle at vertex `b` between rays `b→a` and `b→c`, in degrees within [0, 180]
///
/// Returns `None` if any coordinate is not finite.
pub fn joint_angle(a: Point, b: Point, c: Point) -> Option<f64> {
    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
        return None;
    }

    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let mut angle = radians.to_degrees().abs();
    if angle > 180.0 {
        angle = 360.0 - angle;
    }
    Some(angle)
}

/// `joint_angle` for the state machine: non-finite input becomes `InvalidGeometry`
pub(crate) fn measured_angle(
    name: &'static str,
    a: Point,
    b: Point,
    c: Point,
) -> Result<f64, EngineError> {
    joint_angle(a, b, c).ok_or(EngineError::InvalidGeometry { angle: name })
}

/// Mean wrist height, missing wrists treated as fully lowered
pub fn average_wrist_y(snapshot: &PoseSnapshot) -> f64 {
    (snapshot.y_or_lowered(Joint::LeftWrist) + snapshot.y_or_lowered(Joint::RightWrist)) / 2.0
}

/// Both wrists visually below the average shoulder line
pub fn hands_lowered(snapshot: &PoseSnapshot) -> bool {
    let shoulder_y = (snapshot.y_or_lowered(Joint::LeftShoulder)
        + snapshot.y_or_lowered(Joint::RightShoulder))
        / 2.0;
    snapshot.y_or_lowered(Joint::LeftWrist) > shoulder_y
        && snapshot.y_or_lowered(Joint::RightWrist) > shoulder_y
}

/// Both wrists strictly above the nose
pub fn hands_raised_above_head(snapshot: &PoseSnapshot) -> bool {
    let head_y = snapshot.y_or_lowered(Joint::Nose);
    snapshot.y_or_lowered(Joint::LeftWrist) < head_y
        && snapshot.y_or_lowered(Joint::RightWrist) < head_y
}

/// Arms held out level with the shoulders instead of raised overhead
///
/// False when any of the four joints is missing.
pub fn waving_sideways(snapshot: &PoseSnapshot) -> bool {
    let (Some(lw), Some(rw), Some(ls), Some(rs)) = (
        snapshot.get(Joint::LeftWrist),
        snapshot.get(Joint::RightWrist),
        snapshot.get(Joint::LeftShoulder),
        snapshot.get(Joint::RightShoulder),
    ) else {
        return false;
    };

    let level = (lw.y - ls.y).abs() < WAVE_LEVEL_TOLERANCE
        && (rw.y - rs.y).abs() < WAVE_LEVEL_TOLERANCE;
    let out_wide = (lw.x - ls.x).abs() > WAVE_SIDEWAYS_REACH
        && (rw.x - rs.x).abs() > WAVE_SIDEWAYS_REACH;
    level && out_wide
}
