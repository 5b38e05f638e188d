//! Narration worker - speaks feedback off the frame loop
//!
//! The frame loop enqueues phrases through a [`Narrator`] without ever
//! waiting; a single [`NarrationWorker`] task takes them in order and hands
//! each to the speech backend, finishing one before starting the next.
//! A `Stop` sentinel queued behind pending phrases lets them be spoken and
//! then ends the worker.

use crate::domain::types::FeedbackEvent;
use crate::infra::metrics::Metrics;
use crate::io::speech::SpeechSink;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Queue entry
#[derive(Debug)]
pub enum Narration {
    Say(FeedbackEvent),
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NarrationError {
    /// Queue full; the phrase was dropped
    #[error("narration queue full")]
    Unavailable,
    /// Worker gone; nothing will be spoken any more
    #[error("narrator stopped")]
    Closed,
}

/// Producer side, cheap to clone
#[derive(Debug, Clone)]
pub struct Narrator {
    tx: mpsc::Sender<Narration>,
}

impl Narrator {
    /// Enqueue a phrase without waiting
    pub fn say(&self, event: FeedbackEvent) -> Result<(), NarrationError> {
        self.tx.try_send(Narration::Say(event)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => NarrationError::Unavailable,
            mpsc::error::TrySendError::Closed(_) => NarrationError::Closed,
        })
    }

    /// Queue the stop sentinel behind any pending phrases
    ///
    /// Waits for queue space so the sentinel itself is never dropped.
    pub async fn stop(&self) {
        if self.tx.send(Narration::Stop).await.is_err() {
            debug!("narrator_already_stopped");
        }
    }

    /// Phrases currently waiting
    pub fn pending(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }
}

pub struct NarrationWorker {
    sink: Box<dyn SpeechSink>,
    rx: mpsc::Receiver<Narration>,
    metrics: Arc<Metrics>,
}

impl NarrationWorker {
    pub fn new(
        sink: Box<dyn SpeechSink>,
        rx: mpsc::Receiver<Narration>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { sink, rx, metrics }
    }

    /// Speak queued phrases until the sentinel arrives or every sender is gone
    ///
    /// Returns the number of phrases spoken successfully.
    pub async fn run(mut self) -> u64 {
        info!("narrator_started");
        let mut spoken = 0u64;

        while let Some(msg) = self.rx.recv().await {
            let event = match msg {
                Narration::Say(event) => event,
                Narration::Stop => break,
            };

            let start = Instant::now();
            match self.sink.speak(&event.text).await {
                Ok(()) => {
                    spoken += 1;
                    debug!(
                        text = %event.text,
                        urgency = ?event.urgency,
                        speak_ms = %start.elapsed().as_millis(),
                        "narration_spoken"
                    );
                }
                Err(e) => {
                    self.metrics.record_narration_failed();
                    warn!(text = %event.text, error = %e, "narration_failed");
                }
            }
        }

        self.rx.close();
        info!(spoken = %spoken, "narrator_stopped");
        spoken
    }
}

/// Create the narration channel and worker
///
/// Returns the sender (for the frame loop) and the worker (to be spawned)
pub fn create_narrator(
    sink: Box<dyn SpeechSink>,
    metrics: Arc<Metrics>,
    capacity: usize,
) -> (Narrator, NarrationWorker) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Narrator { tx }, NarrationWorker::new(sink, rx, metrics))
}
