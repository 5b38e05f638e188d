//! End-to-end session tests: JSON lines in, narration and report out

use async_trait::async_trait;
use form_monitor::domain::ExerciseKind;
use form_monitor::infra::{Config, Metrics};
use form_monitor::io::{forward_frames, SpeechSink};
use form_monitor::services::{create_narrator, EndReason, SessionRunner};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, watch};

#[derive(Clone, Default)]
struct Recording {
    spoken: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl SpeechSink for Recording {
    async fn speak(&mut self, text: &str) -> anyhow::Result<()> {
        self.spoken.lock().push(text.to_string());
        Ok(())
    }
}

fn arms_line(t_ms: u64, left_wrist: (f64, f64), right_wrist: (f64, f64)) -> String {
    format!(
        concat!(
            "{{\"t_ms\":{},\"landmarks\":{{",
            "\"NOSE\":{{\"x\":0.5,\"y\":0.2,\"visibility\":0.98}},",
            "\"LEFT_SHOULDER\":{{\"x\":0.4,\"y\":0.3}},",
            "\"RIGHT_SHOULDER\":{{\"x\":0.6,\"y\":0.3}},",
            "\"LEFT_WRIST\":{{\"x\":{},\"y\":{}}},",
            "\"RIGHT_WRIST\":{{\"x\":{},\"y\":{}}}}}}}\n"
        ),
        t_ms, left_wrist.0, left_wrist.1, right_wrist.0, right_wrist.1
    )
}

fn down(t_ms: u64) -> String {
    arms_line(t_ms, (0.4, 0.6), (0.6, 0.6))
}

fn overhead(t_ms: u64) -> String {
    arms_line(t_ms, (0.4, 0.1), (0.6, 0.1))
}

fn waving(t_ms: u64) -> String {
    arms_line(t_ms, (0.1, 0.3), (0.9, 0.3))
}

#[tokio::test]
async fn test_jumping_jack_session_from_json_lines() {
    let reports = tempdir().unwrap();
    let config = Config::default()
        .with_exercise(ExerciseKind::JumpingJack)
        .with_report_dir(reports.path().to_str().unwrap())
        .without_countdown();

    let input: String = [
        down(0),
        overhead(1000),
        down(2000),
        "{not a frame}\n".to_string(),
        waving(3000),
        down(4000),
        down(5000),
    ]
    .concat();

    let sink = Recording::default();
    let spoken = sink.spoken.clone();
    let metrics = Arc::new(Metrics::new());
    let (narrator, worker) = create_narrator(Box::new(sink), metrics.clone(), 16);
    let worker = tokio::spawn(worker.run());

    let (frame_tx, frame_rx) = mpsc::channel(4);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let source = tokio::spawn(forward_frames(
        BufReader::new(std::io::Cursor::new(input.into_bytes())),
        frame_tx,
        shutdown_rx.clone(),
    ));

    let runner = SessionRunner::new(&config, narrator, metrics.clone());
    let summary = runner.run(frame_rx, shutdown_rx).await;
    let stats = source.await.unwrap().unwrap();
    worker.await.unwrap();

    assert_eq!(stats.frames, 6);
    assert_eq!(stats.malformed, 1);

    assert_eq!(summary.end, EndReason::InputEnded);
    assert_eq!(summary.counts.rep_count, 2);
    assert_eq!(summary.counts.correct_count, 1);
    assert_eq!(summary.counts.incorrect_count, 1);
    assert_eq!(summary.last_feedback, "Don't wave sideways!");

    let spoken = spoken.lock().clone();
    assert_eq!(spoken.first().map(String::as_str), Some("Jump!"));
    assert!(spoken.iter().any(|s| s == "Keep arms straight up and down!"));
    assert_eq!(spoken.last().map(String::as_str), Some("Your exercise report has been saved"));

    let path = summary.report_path.expect("report written");
    assert!(path.starts_with(reports.path()));
    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("jumping_jack_report_"));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(report["exercise"], "jumping_jack");
    assert_eq!(report["exercise_name"], "Jumping Jack");
    assert_eq!(report["rep_count"], 2);
    assert_eq!(report["incorrect_count"], 1);
    assert_eq!(report["samples"][0]["elapsed_secs"], 2);
    assert_eq!(report["samples"][1]["elapsed_secs"], 4);
    assert_eq!(report["samples"][1]["correct_count"], 1);
    assert_eq!(report["avg_correct_rate"], 0.25);
    assert_eq!(report["tip"], "Try to increase your pace for better cardio benefit.");
}

#[tokio::test]
async fn test_shutdown_stops_source_and_session() {
    let reports = tempdir().unwrap();
    let config = Config::default()
        .with_exercise(ExerciseKind::JumpingJack)
        .with_report_dir(reports.path().to_str().unwrap())
        .without_countdown();

    // Live input that never ends on its own
    let (mut writer, reader) = tokio::io::duplex(1024);
    writer.write_all(down(0).as_bytes()).await.unwrap();
    writer.write_all(overhead(1000).as_bytes()).await.unwrap();

    let sink = Recording::default();
    let metrics = Arc::new(Metrics::new());
    let (narrator, worker) = create_narrator(Box::new(sink), metrics.clone(), 16);
    let worker = tokio::spawn(worker.run());

    let (frame_tx, frame_rx) = mpsc::channel(4);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let source = tokio::spawn(forward_frames(BufReader::new(reader), frame_tx, shutdown_rx.clone()));

    let runner = SessionRunner::new(&config, narrator, metrics.clone());
    let session = tokio::spawn(runner.run(frame_rx, shutdown_rx));

    tokio::time::sleep(Duration::from_millis(100)).await;
    shutdown_tx.send(true).unwrap();

    let summary = session.await.unwrap();
    let stats = source.await.unwrap().unwrap();
    worker.await.unwrap();
    drop(writer);

    assert_eq!(summary.end, EndReason::Shutdown);
    assert_eq!(summary.counts.rep_count, 0);
    assert_eq!(stats.frames, 2);
    assert_eq!(metrics.frames_total(), 2);
    assert!(summary.report_path.is_some());
}
