//! Caller-side narration cooldown
//!
//! The narrator speaks whatever it is given. This gate sits in the frame loop
//! and holds back a phrase that was already enqueued within the cooldown
//! window, so a hint repeated on every frame is spoken once per window.
//! Phrases are tracked independently; the set is small and fixed.

use crate::domain::types::FeedbackEvent;
use rustc_hash::FxHashMap;
use std::time::Duration;

#[derive(Debug)]
pub struct FeedbackGate {
    cooldown: Duration,
    /// Session time each phrase was last let through
    last_admitted: FxHashMap<String, Duration>,
}

impl FeedbackGate {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown, last_admitted: FxHashMap::default() }
    }

    /// Decide whether `event` may be enqueued at session time `now`
    ///
    /// A phrase passes again only once the cooldown has elapsed since it
    /// last passed. Other phrases do not reset its window.
    pub fn admit(&mut self, event: &FeedbackEvent, now: Duration) -> bool {
        if let Some(at) = self.last_admitted.get(&event.text) {
            if now.saturating_sub(*at) < self.cooldown {
                return false;
            }
        }
        self.last_admitted.insert(event.text.clone(), now);
        true
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}
