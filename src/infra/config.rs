//! Configuration loading from TOML files
//!
//! The binary picks the file: `--config <path>`, else the `CONFIG_FILE`
//! environment variable, else `config/dev.toml`. A file that is missing or
//! does not parse leaves every setting at its default.

use crate::domain::types::ExerciseKind;
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeechBackend {
    /// Narration is only written to the log
    Log,
    /// Narration is passed to an external text-to-speech command
    Command,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_exercise")]
    pub exercise: ExerciseKind,
    /// Session length limit in seconds
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,
    /// Speak "Three, Two, One, Start" before evaluating frames
    #[serde(default = "default_true")]
    pub countdown: bool,
    /// Speak exercise instructions before the countdown
    #[serde(default = "default_true")]
    pub intro: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            exercise: default_exercise(),
            duration_secs: default_duration_secs(),
            countdown: true,
            intro: true,
        }
    }
}

fn default_exercise() -> ExerciseKind {
    ExerciseKind::Squat
}

fn default_duration_secs() -> u64 {
    600 // 10 minute session
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackConfig {
    /// Minimum gap between two identical spoken messages
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// Narration queue capacity; messages beyond it are dropped
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self { cooldown_ms: default_cooldown_ms(), queue_capacity: default_queue_capacity() }
    }
}

fn default_cooldown_ms() -> u64 {
    3000
}

fn default_queue_capacity() -> usize {
    64
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_speech_backend")]
    pub backend: SpeechBackend,
    /// Executable for the command backend (text is passed as the last argument)
    #[serde(default = "default_speech_command")]
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            backend: default_speech_backend(),
            command: default_speech_command(),
            args: Vec::new(),
        }
    }
}

fn default_speech_backend() -> SpeechBackend {
    SpeechBackend::Log
}

fn default_speech_command() -> String {
    "espeak".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Directory that receives session report JSON files
    #[serde(default = "default_report_dir")]
    pub dir: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { dir: default_report_dir() }
    }
}

fn default_report_dir() -> String {
    "reports".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval() }
    }
}

fn default_metrics_interval() -> u64 {
    10
}

/// Squat angle thresholds (degrees)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SquatThresholds {
    /// Knee-ankle angle below which the squat is considered down
    pub down_knee_deg: f64,
    /// Knee-ankle angle above which a down squat completes
    pub up_knee_deg: f64,
    /// Torso lean below this is too far forward
    pub lean_forward_deg: f64,
    /// Torso lean above this is too far backward
    pub lean_backward_deg: f64,
    pub lower_hips_min_deg: f64,
    pub lower_hips_max_deg: f64,
    /// Knee-ankle angle above this flags knees over toes
    pub knee_over_toes_deg: f64,
    /// Hip-knee angle above this is too deep
    pub too_deep_deg: f64,
}

impl Default for SquatThresholds {
    fn default() -> Self {
        Self {
            down_knee_deg: 90.0,
            up_knee_deg: 160.0,
            lean_forward_deg: 20.0,
            lean_backward_deg: 45.0,
            lower_hips_min_deg: 50.0,
            lower_hips_max_deg: 80.0,
            knee_over_toes_deg: 30.0,
            too_deep_deg: 95.0,
        }
    }
}

/// Push-up angle thresholds (degrees)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PushUpThresholds {
    /// Elbow angle above which arms are extended (stage down)
    pub extended_elbow_deg: f64,
    /// Elbow angle below which a rep completes
    pub bottom_elbow_deg: f64,
    /// Shoulder-hip-knee angle at or above which the body counts as straight
    pub straight_body_deg: f64,
}

impl Default for PushUpThresholds {
    fn default() -> Self {
        Self { extended_elbow_deg: 160.0, bottom_elbow_deg: 90.0, straight_body_deg: 150.0 }
    }
}

/// Downward dog angle thresholds (degrees)
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DownwardDogThresholds {
    /// Shoulder-wrist-ankle angle above which the arms are extended
    pub aligned_deg: f64,
    /// Shoulder-hip-ankle angle above which the hips are raised
    pub elevated_deg: f64,
    /// Alignment angle below which the pose is released
    pub release_deg: f64,
    /// Elevation angle below which the hips are too low
    pub hips_low_deg: f64,
}

impl Default for DownwardDogThresholds {
    fn default() -> Self {
        Self { aligned_deg: 160.0, elevated_deg: 120.0, release_deg: 45.0, hips_low_deg: 100.0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ThresholdsConfig {
    #[serde(default)]
    pub squat: SquatThresholds,
    #[serde(default)]
    pub push_up: PushUpThresholds,
    #[serde(default)]
    pub downward_dog: DownwardDogThresholds,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    exercise: ExerciseKind,
    duration_secs: u64,
    countdown_enabled: bool,
    intro_enabled: bool,
    feedback_cooldown_ms: u64,
    narration_queue_capacity: usize,
    speech_backend: SpeechBackend,
    speech_command: String,
    speech_args: Vec<String>,
    report_dir: String,
    metrics_interval_secs: u64,
    thresholds: ThresholdsConfig,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default")
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, config_file: &str) -> Self {
        Self {
            exercise: toml_config.session.exercise,
            duration_secs: toml_config.session.duration_secs,
            countdown_enabled: toml_config.session.countdown,
            intro_enabled: toml_config.session.intro,
            feedback_cooldown_ms: toml_config.feedback.cooldown_ms,
            narration_queue_capacity: toml_config.feedback.queue_capacity,
            speech_backend: toml_config.speech.backend,
            speech_command: toml_config.speech.command,
            speech_args: toml_config.speech.args,
            report_dir: toml_config.report.dir,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            thresholds: toml_config.thresholds,
            config_file: config_file.to_string(),
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self::from_toml(toml_config, &path.display().to_string()))
    }

    /// Load configuration from a path, falling back to defaults on any error
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "config_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    pub fn exercise(&self) -> ExerciseKind {
        self.exercise
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn countdown_enabled(&self) -> bool {
        self.countdown_enabled
    }

    pub fn intro_enabled(&self) -> bool {
        self.intro_enabled
    }

    pub fn feedback_cooldown_ms(&self) -> u64 {
        self.feedback_cooldown_ms
    }

    pub fn narration_queue_capacity(&self) -> usize {
        self.narration_queue_capacity
    }

    pub fn speech_backend(&self) -> &SpeechBackend {
        &self.speech_backend
    }

    pub fn speech_command(&self) -> &str {
        &self.speech_command
    }

    pub fn speech_args(&self) -> &[String] {
        &self.speech_args
    }

    pub fn report_dir(&self) -> &str {
        &self.report_dir
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn thresholds(&self) -> &ThresholdsConfig {
        &self.thresholds
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for overriding the exercise from the command line
    pub fn with_exercise(mut self, exercise: ExerciseKind) -> Self {
        self.exercise = exercise;
        self
    }

    /// Builder method for overriding the session length from the command line
    pub fn with_duration_secs(mut self, secs: u64) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Builder method for overriding the report directory
    pub fn with_report_dir(mut self, dir: &str) -> Self {
        self.report_dir = dir.to_string();
        self
    }

    /// Builder method to skip the spoken intro and countdown
    pub fn without_countdown(mut self) -> Self {
        self.countdown_enabled = false;
        self.intro_enabled = false;
        self
    }

    /// Builder method for the start sequence parts
    pub fn with_start_sequence(mut self, intro: bool, countdown: bool) -> Self {
        self.intro_enabled = intro;
        self.countdown_enabled = countdown;
        self
    }
}
