//! Form monitor - counts exercise repetitions and judges their form
//!
//! Reads pose landmarks as JSON lines (from a file or stdin), runs one
//! exercise session over them, narrates feedback and writes a session report.
//!
//! Module structure:
//! - `domain/` - Core types (PoseSnapshot, ExerciseKind, Stage)
//! - `io/` - External interfaces (landmark input, speech, report output)
//! - `services/` - Exercise state machine, narrator, session runner
//! - `infra/` - Infrastructure (Config, Metrics)

use anyhow::Context;
use clap::Parser;
use form_monitor::domain::ExerciseKind;
use form_monitor::infra::{Config, Metrics};
use form_monitor::io::{forward_frames, open_input, speech_from_config};
use form_monitor::services::{create_narrator, SessionRunner};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Frames buffered between the landmark reader and the frame loop
const FRAME_CHANNEL_CAPACITY: usize = 256;

/// Form monitor - exercise repetition counter with form feedback
#[derive(Parser, Debug)]
#[command(name = "form-monitor", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "CONFIG_FILE", default_value = "config/dev.toml")]
    config: String,

    /// Exercise to monitor (squat, push_up, downward_dog, jumping_jack)
    #[arg(short, long)]
    exercise: Option<ExerciseKind>,

    /// Landmark input, JSON lines; `-` reads stdin
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Session length limit in seconds (0 = until input ends)
    #[arg(short, long)]
    duration: Option<u64>,

    /// Directory for session reports
    #[arg(long)]
    report_dir: Option<String>,

    /// Skip the spoken instructions and countdown
    #[arg(long)]
    no_countdown: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!(version = %env!("CARGO_PKG_VERSION"), git = %env!("GIT_HASH"), "form-monitor starting");

    let args = Args::parse();

    // Command line overrides take precedence over the file
    let mut config = Config::load_from_path(&args.config);
    if let Some(exercise) = args.exercise {
        config = config.with_exercise(exercise);
    }
    if let Some(secs) = args.duration {
        config = config.with_duration_secs(secs);
    }
    if let Some(dir) = &args.report_dir {
        config = config.with_report_dir(dir);
    }
    // A recorded file is read faster than real time; a countdown would discard it
    if args.no_countdown || args.input != "-" {
        config = config.without_countdown();
    }

    info!(
        config_file = %config.config_file(),
        exercise = %config.exercise().as_str(),
        duration_secs = %config.duration_secs(),
        countdown = %config.countdown_enabled(),
        intro = %config.intro_enabled(),
        cooldown_ms = %config.feedback_cooldown_ms(),
        speech = ?config.speech_backend(),
        report_dir = %config.report_dir(),
        input = %args.input,
        "config_loaded"
    );

    let input = open_input(&args.input).await.context("landmark input unavailable")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let metrics = Arc::new(Metrics::new());

    // Narrator: single worker speaking off the frame loop
    let (narrator, narration_worker) = create_narrator(
        speech_from_config(&config),
        metrics.clone(),
        config.narration_queue_capacity(),
    );
    let narrator_handle = tokio::spawn(narration_worker.run());

    // Landmark reader feeding the frame loop
    let (frame_tx, frame_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
    let source_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        if let Err(e) = forward_frames(input, frame_tx, source_shutdown).await {
            error!(error = %format!("{e:#}"), "landmark_source_failed");
        }
    });

    // Start metrics reporter
    let metrics_interval = config.metrics_interval_secs();
    if metrics_interval > 0 {
        let metrics_clone = metrics.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(metrics_interval));
            // First tick fires immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                metrics_clone.report().log();
            }
        });
    }

    // Handle shutdown on Ctrl+C
    let shutdown_signal = shutdown_tx;
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("shutdown_signal_received");
        let _ = shutdown_signal.send(true);
    });

    // Run the session - consumes frames until time limit, shutdown or end of input
    let runner = SessionRunner::new(&config, narrator, metrics.clone());
    let summary = runner.run(frame_rx, shutdown_rx).await;

    // Let the last phrases finish
    if let Err(e) = narrator_handle.await {
        error!(error = %e, "narrator_task_failed");
    }
    metrics.report().log();

    match &summary.report_path {
        Some(path) => println!("Report saved as {}", path.display()),
        None => println!("Report could not be saved"),
    }
    println!(
        "{}: {} reps ({} correct, {} incorrect) in {}s",
        summary.exercise.display_name(),
        summary.counts.rep_count,
        summary.counts.correct_count,
        summary.counts.incorrect_count,
        summary.duration.as_secs()
    );

    info!("form-monitor shutdown complete");
    Ok(())
}
