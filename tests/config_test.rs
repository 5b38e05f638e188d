//! Integration tests for configuration loading

use form_monitor::domain::ExerciseKind;
use form_monitor::infra::{Config, SpeechBackend};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_config_from_file() {
    let config_content = r#"
[session]
exercise = "push_up"
duration_secs = 120
countdown = false
intro = false

[feedback]
cooldown_ms = 1500
queue_capacity = 16

[speech]
backend = "command"
command = "say"
args = ["-r", "180"]

[report]
dir = "/tmp/form-reports"

[metrics]
interval_secs = 30

[thresholds.push_up]
straight_body_deg = 155.0
"#;
    let temp_file = write_config(config_content);

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.exercise(), ExerciseKind::PushUp);
    assert_eq!(config.duration_secs(), 120);
    assert!(!config.countdown_enabled());
    assert!(!config.intro_enabled());
    assert_eq!(config.feedback_cooldown_ms(), 1500);
    assert_eq!(config.narration_queue_capacity(), 16);
    assert_eq!(config.speech_backend(), &SpeechBackend::Command);
    assert_eq!(config.speech_command(), "say");
    assert_eq!(config.speech_args(), ["-r".to_string(), "180".to_string()]);
    assert_eq!(config.report_dir(), "/tmp/form-reports");
    assert_eq!(config.metrics_interval_secs(), 30);
    assert_eq!(config.thresholds().push_up.straight_body_deg, 155.0);
    assert_eq!(config.thresholds().push_up.bottom_elbow_deg, 90.0);
    assert_eq!(config.config_file(), temp_file.path().display().to_string());
}

#[test]
fn test_partial_file_keeps_defaults() {
    let temp_file = write_config(
        r#"
[session]
exercise = "downward_dog"
"#,
    );

    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config.exercise(), ExerciseKind::DownwardDog);
    assert_eq!(config.duration_secs(), 600);
    assert!(config.countdown_enabled());
    assert_eq!(config.feedback_cooldown_ms(), 3000);
    assert_eq!(config.speech_backend(), &SpeechBackend::Log);
    assert_eq!(config.thresholds(), Config::default().thresholds());
}

#[test]
fn test_unknown_exercise_is_rejected() {
    let temp_file = write_config(
        r#"
[session]
exercise = "burpee"
"#,
    );
    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to parse config file"));
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/config.toml");
    assert_eq!(config.exercise(), ExerciseKind::Squat);
    assert_eq!(config.duration_secs(), 600);
    assert_eq!(config.config_file(), "default");
}

#[test]
fn test_invalid_file_falls_back_to_defaults() {
    let temp_file = write_config("[session\nexercise = ");
    let config = Config::load_from_path(temp_file.path().to_str().unwrap());
    assert_eq!(config.exercise(), ExerciseKind::Squat);
    assert_eq!(config.report_dir(), "reports");
}

#[test]
fn test_repo_dev_config_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/dev.toml");
    let config = Config::from_file(path).unwrap();
    assert_eq!(config.speech_backend(), &SpeechBackend::Log);
    assert!(config.feedback_cooldown_ms() > 0);
}
