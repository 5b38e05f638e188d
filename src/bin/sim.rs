//! Landmark simulator - synthetic pose frames for driving the form monitor
//!
//! Writes JSON lines in the same shape the monitor reads, one frame per
//! line, so a session can be run without a camera or pose estimator.
//!
//! Usage:
//!   form-sim --exercise jumping_jack --reps 5 --realtime | form-monitor
//!   form-sim --exercise push_up --fault sag > push_up.jsonl

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use form_monitor::domain::{ExerciseKind, Joint, Point, PoseSnapshot};
use serde_json::json;
use std::f64::consts::PI;
use std::io::{BufWriter, Write};
use std::time::{Duration, Instant};

// ============================================================================
// CLI Args
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "form-sim")]
#[command(about = "Synthetic pose landmark frames for the form monitor")]
struct Args {
    /// Exercise to perform
    #[arg(short, long, default_value = "jumping_jack")]
    exercise: ExerciseKind,

    /// Number of repetitions
    #[arg(short, long, default_value = "10")]
    reps: u32,

    /// Frames per second
    #[arg(long, default_value = "15")]
    fps: u32,

    /// Seconds per repetition
    #[arg(long, default_value = "2.0")]
    rep_secs: f64,

    /// Seconds of resting pose before the first repetition
    #[arg(long, default_value = "0")]
    lead_in_secs: f64,

    /// Form fault to perform on every repetition
    #[arg(long, value_enum, default_value = "none")]
    fault: Fault,

    /// Drop a required landmark from every Nth frame (0 = never)
    #[arg(long, default_value = "0")]
    dropout_every: u64,

    /// Pace output in real time instead of writing as fast as possible
    #[arg(long)]
    realtime: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Fault {
    None,
    /// Squat: torso kept upright
    Upright,
    /// Push-up: hips sag out of the plank line
    Sag,
    /// Downward dog: hips never raised
    HipsLow,
    /// Jumping jack: arms only raised to shoulder height
    Waving,
}

impl Fault {
    fn applies_to(self, kind: ExerciseKind) -> bool {
        matches!(
            (self, kind),
            (Fault::None, _)
                | (Fault::Upright, ExerciseKind::Squat)
                | (Fault::Sag, ExerciseKind::PushUp)
                | (Fault::HipsLow, ExerciseKind::DownwardDog)
                | (Fault::Waving, ExerciseKind::JumpingJack)
        )
    }
}

// ============================================================================
// Pose generation
// ============================================================================

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Offset `p` by `len` along `deg` (0° = +x, 90° = +y, image coordinates)
fn polar(p: Point, len: f64, deg: f64) -> Point {
    let rad = deg.to_radians();
    Point::new(p.x + len * rad.cos(), p.y + len * rad.sin())
}

/// Point on segment `a`-`b`
fn along(a: Point, b: Point, t: f64) -> Point {
    Point::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t))
}

fn snapshot(points: &[(Joint, Point)]) -> PoseSnapshot {
    let mut snapshot = PoseSnapshot::new();
    for &(joint, point) in points {
        snapshot.insert(joint, point);
    }
    snapshot
}

/// Side view, facing +x. `depth` 0 = standing, 1 = bottom of the squat.
fn squat_pose(depth: f64, fault: Fault) -> PoseSnapshot {
    let knee_deg = lerp(178.0, 70.0, depth);
    // Torso direction from straight up; 130° folds the chest forward past level
    let lean_deg = if fault == Fault::Upright { 5.0 } else { 130.0 };

    let knee = Point::new(0.5, 0.65);
    let ankle = Point::new(0.5, 0.9);
    // Shin points straight down (90°); thigh opens `knee_deg` from it, backwards
    let hip = polar(knee, 0.22, 90.0 + knee_deg);
    let shoulder = polar(hip, 0.25, -90.0 + lean_deg);
    let nose = polar(shoulder, 0.1, -90.0 + lean_deg);

    snapshot(&[
        (Joint::Nose, nose),
        (Joint::LeftShoulder, shoulder),
        (Joint::LeftHip, hip),
        (Joint::LeftKnee, knee),
        (Joint::LeftAnkle, ankle),
        (Joint::LeftElbow, polar(shoulder, 0.12, 60.0)),
        (Joint::LeftWrist, polar(shoulder, 0.24, 20.0)),
    ])
}

/// Side view, head toward -x. `depth` 0 = arms extended, 1 = chest low.
fn push_up_pose(depth: f64, fault: Fault) -> PoseSnapshot {
    const SEGMENT: f64 = 0.15;
    let elbow_deg = lerp(172.0, 65.0, depth);

    let wrist = Point::new(0.3, 0.8);
    let ankle = Point::new(0.85, 0.78);
    // Upper arm and forearm of equal length: wrist-shoulder distance follows the elbow angle
    let half = SEGMENT * (elbow_deg.to_radians() / 2.0).sin();
    let shoulder = Point::new(wrist.x, wrist.y - 2.0 * half);
    let bend = (SEGMENT * SEGMENT - half * half).max(0.0).sqrt();
    let elbow = Point::new(wrist.x + bend, wrist.y - half);

    let mut hip = along(shoulder, ankle, 0.45);
    if fault == Fault::Sag {
        hip.y += 0.12;
    }
    let knee = along(hip, ankle, 0.5);

    snapshot(&[
        (Joint::Nose, Point::new(shoulder.x - 0.08, shoulder.y + 0.02)),
        (Joint::LeftShoulder, shoulder),
        (Joint::LeftElbow, elbow),
        (Joint::LeftWrist, wrist),
        (Joint::LeftHip, hip),
        (Joint::LeftKnee, knee),
        (Joint::LeftAnkle, ankle),
    ])
}

/// Side view. `depth` 0 = long arm-to-heel line, 1 = shoulders over hands.
fn downward_dog_pose(depth: f64, fault: Fault) -> PoseSnapshot {
    let alignment_deg = lerp(170.0, 30.0, depth);
    let elevation_deg: f64 = if fault == Fault::HipsLow { 95.0 } else { 140.0 };

    let wrist = Point::new(0.3, 0.8);
    let ankle = Point::new(0.8, 0.8);
    // Ankle lies along 0° from the wrist; shoulder rises `alignment_deg` away from it
    let shoulder = polar(wrist, 0.2, -alignment_deg);

    // Hip above the shoulder-ankle segment, opening `elevation_deg` between them
    let mid = along(shoulder, ankle, 0.5);
    let (dx, dy) = (ankle.x - shoulder.x, ankle.y - shoulder.y);
    let span = (dx * dx + dy * dy).sqrt();
    let rise = (span / 2.0) / (elevation_deg.to_radians() / 2.0).tan();
    let hip = Point::new(mid.x + dy / span * rise, mid.y - dx / span * rise);

    snapshot(&[
        (Joint::Nose, polar(shoulder, 0.08, 60.0)),
        (Joint::LeftShoulder, shoulder),
        (Joint::LeftElbow, along(shoulder, wrist, 0.5)),
        (Joint::LeftWrist, wrist),
        (Joint::LeftHip, hip),
        (Joint::LeftKnee, along(hip, ankle, 0.5)),
        (Joint::LeftAnkle, ankle),
    ])
}

/// Front view. `depth` 0 = arms at the sides, 1 = arms at their highest.
fn jumping_jack_pose(depth: f64, fault: Fault) -> PoseSnapshot {
    const ARM: f64 = 0.25;
    let top_deg = if fault == Fault::Waving { 95.0 } else { 170.0 };
    let raise = lerp(5.0, top_deg, depth);

    let left_shoulder = Point::new(0.42, 0.3);
    let right_shoulder = Point::new(0.58, 0.3);
    // Arm angle measured from hanging straight down, raised out sideways
    let left_wrist = polar(left_shoulder, ARM, 90.0 + raise);
    let right_wrist = polar(right_shoulder, ARM, 90.0 - raise);
    let spread = 0.04 * depth;

    snapshot(&[
        (Joint::Nose, Point::new(0.5, 0.2)),
        (Joint::LeftShoulder, left_shoulder),
        (Joint::RightShoulder, right_shoulder),
        (Joint::LeftElbow, polar(left_shoulder, ARM / 2.0, 90.0 + raise)),
        (Joint::RightElbow, polar(right_shoulder, ARM / 2.0, 90.0 - raise)),
        (Joint::LeftWrist, left_wrist),
        (Joint::RightWrist, right_wrist),
        (Joint::LeftHip, Point::new(0.45, 0.55)),
        (Joint::RightHip, Point::new(0.55, 0.55)),
        (Joint::LeftAnkle, Point::new(0.45 - spread, 0.9)),
        (Joint::RightAnkle, Point::new(0.55 + spread, 0.9)),
    ])
}

fn pose(kind: ExerciseKind, depth: f64, fault: Fault) -> PoseSnapshot {
    match kind {
        ExerciseKind::Squat => squat_pose(depth, fault),
        ExerciseKind::PushUp => push_up_pose(depth, fault),
        ExerciseKind::DownwardDog => downward_dog_pose(depth, fault),
        ExerciseKind::JumpingJack => jumping_jack_pose(depth, fault),
    }
}

/// Landmark whose loss skips a frame for this exercise
fn dropout_joint(kind: ExerciseKind) -> Joint {
    match kind {
        ExerciseKind::Squat => Joint::LeftHip,
        ExerciseKind::PushUp | ExerciseKind::DownwardDog => Joint::LeftWrist,
        ExerciseKind::JumpingJack => Joint::Nose,
    }
}

/// Smooth 0 → 1 → 0 over one repetition
fn rep_depth(phase: f64) -> f64 {
    (1.0 - (2.0 * PI * phase).cos()) / 2.0
}

fn frame_line(t_ms: u64, snapshot: &PoseSnapshot, skip: Option<Joint>) -> String {
    let mut landmarks = serde_json::Map::new();
    for joint in Joint::ALL {
        if Some(joint) == skip {
            continue;
        }
        if let Some(p) = snapshot.get(joint) {
            landmarks.insert(joint.as_str().to_string(), json!({ "x": p.x, "y": p.y }));
        }
    }
    json!({ "t_ms": t_ms, "landmarks": landmarks }).to_string()
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();

    if args.fps == 0 || args.rep_secs <= 0.0 || args.lead_in_secs < 0.0 {
        bail!("fps and rep-secs must be positive, lead-in-secs non-negative");
    }
    if !args.fault.applies_to(args.exercise) {
        bail!("fault {:?} does not apply to {}", args.fault, args.exercise.as_str());
    }

    let frame_ms = 1000.0 / f64::from(args.fps);
    let lead_in_frames = (args.lead_in_secs * f64::from(args.fps)).round() as u64;
    let rep_frames = ((args.rep_secs * f64::from(args.fps)).round() as u64).max(2);
    // One resting frame at the end so the last repetition finalizes
    let total = lead_in_frames + rep_frames * u64::from(args.reps) + 1;

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let start = Instant::now();

    for i in 0..total {
        let depth = match i.checked_sub(lead_in_frames) {
            Some(n) if n < rep_frames * u64::from(args.reps) => {
                rep_depth((n % rep_frames) as f64 / rep_frames as f64)
            }
            _ => 0.0,
        };
        let skip = (args.dropout_every > 0 && i > 0 && i % args.dropout_every == 0)
            .then(|| dropout_joint(args.exercise));

        let t_ms = (i as f64 * frame_ms).round() as u64;
        let line = frame_line(t_ms, &pose(args.exercise, depth, args.fault), skip);
        writeln!(out, "{}", line).context("failed to write frame")?;

        if args.realtime {
            out.flush().context("failed to flush frames")?;
            let due = start + Duration::from_millis(t_ms + frame_ms as u64);
            if let Some(wait) = due.checked_duration_since(Instant::now()) {
                std::thread::sleep(wait);
            }
        }
    }

    out.flush().context("failed to flush frames")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_monitor::services::geometry::{
        hands_lowered, hands_raised_above_head, joint_angle, waving_sideways,
    };
    use form_monitor::services::ExerciseSession;

    fn run(kind: ExerciseKind, fault: Fault, reps: u32) -> ExerciseSession {
        let mut session = ExerciseSession::new(kind);
        let rep_frames = 30u64;
        for i in 0..rep_frames * u64::from(reps) + 1 {
            let depth = if i < rep_frames * u64::from(reps) {
                rep_depth((i % rep_frames) as f64 / rep_frames as f64)
            } else {
                0.0
            };
            let elapsed = Duration::from_millis(i * 66);
            session.update(&pose(kind, depth, fault), elapsed).unwrap();
        }
        session
    }

    #[test]
    fn test_push_up_geometry_matches_target() {
        let snap = push_up_pose(1.0, Fault::None);
        let elbow = joint_angle(
            snap.get(Joint::LeftShoulder).unwrap(),
            snap.get(Joint::LeftElbow).unwrap(),
            snap.get(Joint::LeftWrist).unwrap(),
        )
        .unwrap();
        assert!((elbow - 65.0).abs() < 0.5, "elbow {elbow}");
    }

    #[test]
    fn test_downward_dog_geometry_matches_target() {
        let snap = downward_dog_pose(0.0, Fault::None);
        let shoulder = snap.get(Joint::LeftShoulder).unwrap();
        let wrist = snap.get(Joint::LeftWrist).unwrap();
        let hip = snap.get(Joint::LeftHip).unwrap();
        let ankle = snap.get(Joint::LeftAnkle).unwrap();
        assert!((joint_angle(shoulder, wrist, ankle).unwrap() - 170.0).abs() < 0.5);
        assert!((joint_angle(shoulder, hip, ankle).unwrap() - 140.0).abs() < 0.5);
    }

    #[test]
    fn test_jumping_jack_arm_positions() {
        let rest = jumping_jack_pose(0.0, Fault::None);
        assert!(hands_lowered(&rest));
        assert!(!hands_raised_above_head(&rest));

        let top = jumping_jack_pose(1.0, Fault::None);
        assert!(hands_raised_above_head(&top));
        assert!(!waving_sideways(&top));

        let wave = jumping_jack_pose(1.0, Fault::Waving);
        assert!(waving_sideways(&wave));
        assert!(!hands_raised_above_head(&wave));
        assert!(!hands_lowered(&wave));
    }

    #[test]
    fn test_clean_reps_are_correct() {
        for kind in [ExerciseKind::PushUp, ExerciseKind::DownwardDog, ExerciseKind::JumpingJack] {
            let session = run(kind, Fault::None, 3);
            assert_eq!(session.rep_count(), 3, "{}", kind.as_str());
            assert_eq!(session.correct_count(), 3, "{}", kind.as_str());
        }
    }

    #[test]
    fn test_faults_are_flagged() {
        let session = run(ExerciseKind::JumpingJack, Fault::Waving, 2);
        assert_eq!(session.incorrect_count(), 2);
        assert_eq!(session.last_feedback(), "Don't wave sideways!");

        let session = run(ExerciseKind::PushUp, Fault::Sag, 2);
        assert_eq!(session.incorrect_count(), 2);

        let session = run(ExerciseKind::Squat, Fault::Upright, 2);
        assert_eq!(session.rep_count(), 2);
        assert_eq!(session.last_feedback(), "Bend backward.");

        // Folded torso passes the lean checks and reaches the knee check
        let session = run(ExerciseKind::Squat, Fault::None, 2);
        assert_eq!(session.incorrect_count(), 2);
        assert_eq!(session.last_feedback(), "Knee falling over toes.");

        let session = run(ExerciseKind::DownwardDog, Fault::HipsLow, 2);
        assert_eq!(session.rep_count(), 0);
    }

    #[test]
    fn test_frame_line_round_trips_through_reader() {
        let snap = jumping_jack_pose(0.5, Fault::None);
        let line = frame_line(1200, &snap, Some(Joint::Nose));
        let frame = form_monitor::io::landmarks::parse_frame(&line).unwrap();
        assert_eq!(frame.t_ms, Some(1200));
        assert!(frame.snapshot.get(Joint::Nose).is_none());
        assert_eq!(frame.snapshot.get(Joint::LeftWrist), snap.get(Joint::LeftWrist));
    }

    #[test]
    fn test_fault_applicability() {
        assert!(Fault::None.applies_to(ExerciseKind::Squat));
        assert!(Fault::Sag.applies_to(ExerciseKind::PushUp));
        assert!(!Fault::Sag.applies_to(ExerciseKind::Squat));
    }
}
