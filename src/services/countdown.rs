//! Session start: spoken instructions then a "Three, Two, One, Start" count
//!
//! The sequencer only describes what to say and how long to wait after each
//! phrase. The session runner plays it and discards frames until it ends.

use crate::domain::types::{ExerciseKind, FeedbackEvent};
use std::time::Duration;

const COUNT_PHRASES: [&str; 4] = ["Three", "Two", "One", "Start"];
const COUNT_STEP: Duration = Duration::from_secs(1);
const AFTER_START: Duration = Duration::from_millis(500);

/// Spoken instruction played before the countdown
pub fn intro_sentence(kind: ExerciseKind) -> &'static str {
    match kind {
        ExerciseKind::JumpingJack => {
            "Starting Jumping Jack exercise. Stand straight, jump while spreading your legs \
             and raising your arms above your head, then return to starting position."
        }
        ExerciseKind::Squat => {
            "Starting Squat exercise. Stand with feet shoulder-width apart, lower your hips \
             until thighs are parallel to the floor, then stand back up."
        }
        ExerciseKind::PushUp => {
            "Starting Push-Up exercise. Keep your body straight, lower yourself until chest \
             nearly touches the floor, then push back up."
        }
        ExerciseKind::DownwardDog => {
            "Starting Downward Dog exercise. Form an inverted V-shape with your body, hands \
             and feet on the floor, hips raised high."
        }
    }
}

/// One phrase and the pause that follows it
#[derive(Debug, Clone, PartialEq)]
pub struct CountdownStep {
    pub event: FeedbackEvent,
    pub pause: Duration,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Countdown {
    steps: Vec<CountdownStep>,
}

impl Countdown {
    /// Build the start sequence; either part may be disabled
    pub fn new(kind: ExerciseKind, intro: bool, count: bool) -> Self {
        let mut steps = Vec::with_capacity(5);
        if intro {
            // Instructions are queued ahead of the count; no pause of their own
            steps.push(CountdownStep {
                event: FeedbackEvent::cue(intro_sentence(kind)),
                pause: Duration::ZERO,
            });
        }
        if count {
            for phrase in COUNT_PHRASES {
                let pause = if phrase == "Start" { AFTER_START } else { COUNT_STEP };
                steps.push(CountdownStep { event: FeedbackEvent::cue(phrase), pause });
            }
        }
        Self { steps }
    }

    pub fn steps(&self) -> &[CountdownStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Time from the first phrase until frames are evaluated
    pub fn total(&self) -> Duration {
        self.steps.iter().map(|s| s.pause).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_sequence() {
        let countdown = Countdown::new(ExerciseKind::Squat, true, true);
        let phrases: Vec<&str> = countdown.steps().iter().map(|s| s.event.text.as_str()).collect();

        assert_eq!(phrases.len(), 5);
        assert!(phrases[0].starts_with("Starting Squat exercise."));
        assert_eq!(&phrases[1..], &["Three", "Two", "One", "Start"]);
        assert_eq!(countdown.total(), Duration::from_millis(3500));
    }

    #[test]
    fn test_countdown_only() {
        let countdown = Countdown::new(ExerciseKind::JumpingJack, false, true);
        assert_eq!(countdown.steps()[0].event.text, "Three");
        assert_eq!(countdown.steps()[3].pause, Duration::from_millis(500));
    }

    #[test]
    fn test_disabled() {
        let countdown = Countdown::new(ExerciseKind::PushUp, false, false);
        assert!(countdown.is_empty());
        assert_eq!(countdown.total(), Duration::ZERO);
    }

    #[test]
    fn test_every_kind_has_instructions() {
        for kind in ExerciseKind::ALL {
            assert!(intro_sentence(kind).contains(kind.display_name()));
        }
    }
}
