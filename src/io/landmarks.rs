//! JSON-lines landmark source
//!
//! The pose estimator (or `form-sim`) writes one frame per line, either
//! `{"t_ms": 1234, "landmarks": {"NOSE": {"x": 0.5, "y": 0.2}, ...}}` or just
//! the landmark map. Landmark names we do not evaluate are ignored, extra
//! per-point fields such as `visibility` too.

use crate::domain::pose::{Joint, Point, PoseSnapshot};
use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// One frame from the estimator
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkFrame {
    /// Capture time in milliseconds, if the producer stamps frames
    pub t_ms: Option<u64>,
    pub snapshot: PoseSnapshot,
}

#[derive(Deserialize)]
struct RawPoint {
    x: f64,
    y: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFrame {
    Stamped { t_ms: Option<u64>, landmarks: FxHashMap<String, RawPoint> },
    Bare(FxHashMap<String, RawPoint>),
}

/// Parse one line of input
pub fn parse_frame(line: &str) -> Result<LandmarkFrame, serde_json::Error> {
    let (t_ms, landmarks) = match serde_json::from_str(line)? {
        RawFrame::Stamped { t_ms, landmarks } => (t_ms, landmarks),
        RawFrame::Bare(landmarks) => (None, landmarks),
    };

    let mut snapshot = PoseSnapshot::new();
    for (name, p) in landmarks {
        if let Some(joint) = Joint::from_name(&name) {
            snapshot.insert(joint, Point::new(p.x, p.y));
        }
    }
    Ok(LandmarkFrame { t_ms, snapshot })
}

/// Counts reported when the source ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceStats {
    pub frames: u64,
    pub malformed: u64,
}

/// Open `path` for reading, `-` meaning stdin
pub async fn open_input(path: &str) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    if path == "-" {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("failed to open landmark input {}", path))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Read frames and forward them to the frame loop
///
/// Ends at end of input, on shutdown, or when the frame loop goes away.
/// Dropping `frame_tx` on return tells the frame loop the stream is over.
/// Sending waits for room so a recorded file is replayed without loss.
pub async fn forward_frames<R>(
    reader: R,
    frame_tx: mpsc::Sender<LandmarkFrame>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<SourceStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = SourceStats::default();

    // Rate-limit parse warnings to 1 per second
    let mut last_parse_warn = Instant::now() - Duration::from_secs(2);

    info!("landmark_source_started");
    loop {
        let line = tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("landmark_source_shutdown");
                    break;
                }
                continue;
            }
            line = lines.next_line() => line.context("failed to read landmark input")?,
        };

        let Some(line) = line else {
            debug!("landmark_source_eof");
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let frame = match parse_frame(line) {
            Ok(frame) => frame,
            Err(e) => {
                stats.malformed += 1;
                if last_parse_warn.elapsed() > Duration::from_secs(1) {
                    warn!(error = %e, malformed = %stats.malformed, "landmark_frame_malformed");
                    last_parse_warn = Instant::now();
                }
                continue;
            }
        };

        if frame_tx.send(frame).await.is_err() {
            debug!("landmark_source_receiver_closed");
            break;
        }
        stats.frames += 1;
    }

    info!(frames = %stats.frames, malformed = %stats.malformed, "landmark_source_stopped");
    Ok(stats)
}
