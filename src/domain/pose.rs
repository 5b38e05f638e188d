//! Pose landmarks as produced by the external pose estimator
//!
//! A `PoseSnapshot` is one frame worth of named joints in normalized image
//! coordinates (origin top-left, y grows downward). Joints the estimator did
//! not report are simply absent.

use crate::domain::types::EngineError;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Named body landmark (MediaPipe pose naming)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Joint {
    Nose,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    pub const ALL: [Joint; 13] = [
        Joint::Nose,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    /// Look up a joint by its landmark name; `None` for landmarks we do not use
    pub fn from_name(name: &str) -> Option<Joint> {
        Self::ALL.into_iter().find(|j| j.as_str().eq_ignore_ascii_case(name))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Joint::Nose => "NOSE",
            Joint::LeftShoulder => "LEFT_SHOULDER",
            Joint::RightShoulder => "RIGHT_SHOULDER",
            Joint::LeftElbow => "LEFT_ELBOW",
            Joint::RightElbow => "RIGHT_ELBOW",
            Joint::LeftWrist => "LEFT_WRIST",
            Joint::RightWrist => "RIGHT_WRIST",
            Joint::LeftHip => "LEFT_HIP",
            Joint::RightHip => "RIGHT_HIP",
            Joint::LeftKnee => "LEFT_KNEE",
            Joint::RightKnee => "RIGHT_KNEE",
            Joint::LeftAnkle => "LEFT_ANKLE",
            Joint::RightAnkle => "RIGHT_ANKLE",
        }
    }
}

impl std::fmt::Display for Joint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized 2D image coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// One frame of landmarks, consumed once by the exercise state machine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseSnapshot {
    joints: FxHashMap<Joint, Point>,
}

impl PoseSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by the landmark source and tests
    pub fn with(mut self, joint: Joint, x: f64, y: f64) -> Self {
        self.joints.insert(joint, Point::new(x, y));
        self
    }

    pub fn insert(&mut self, joint: Joint, point: Point) {
        self.joints.insert(joint, point);
    }

    pub fn get(&self, joint: Joint) -> Option<Point> {
        self.joints.get(&joint).copied()
    }

    /// Look up a joint the caller cannot do without
    pub fn require(&self, joint: Joint) -> Result<Point, EngineError> {
        self.get(joint).ok_or(EngineError::MissingLandmark(joint))
    }

    /// Vertical coordinate, treating a missing joint as fully lowered (y = 1.0)
    pub fn y_or_lowered(&self, joint: Joint) -> f64 {
        self.get(joint).map(|p| p.y).unwrap_or(1.0)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}
