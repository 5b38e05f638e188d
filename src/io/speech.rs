//! Speech output backends
//!
//! The narrator hands each phrase to a [`SpeechSink`] and waits for it to
//! finish before taking the next one. Synthesis itself is external: either
//! the phrase is only logged, or a text-to-speech program (e.g. `espeak`) is
//! run with the phrase as its last argument.

use crate::infra::config::{Config, SpeechBackend};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

#[async_trait]
pub trait SpeechSink: Send {
    /// Speak one phrase, returning once playback has finished
    async fn speak(&mut self, text: &str) -> Result<()>;
}

/// Writes phrases to the log instead of speaking them
#[derive(Debug, Default)]
pub struct LogSpeech;

#[async_trait]
impl SpeechSink for LogSpeech {
    async fn speak(&mut self, text: &str) -> Result<()> {
        info!(text = %text, "speak");
        Ok(())
    }
}

/// Runs an external text-to-speech program once per phrase
#[derive(Debug, Clone)]
pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
}

impl CommandSpeech {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }
}

#[async_trait]
impl SpeechSink for CommandSpeech {
    async fn speak(&mut self, text: &str) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .kill_on_drop(true)
            .status()
            .await
            .with_context(|| format!("failed to run speech command {}", self.program))?;

        if !status.success() {
            bail!("speech command {} exited with {}", self.program, status);
        }
        Ok(())
    }
}

/// Build the configured speech backend
pub fn speech_from_config(config: &Config) -> Box<dyn SpeechSink> {
    match config.speech_backend() {
        SpeechBackend::Log => Box::new(LogSpeech),
        SpeechBackend::Command => {
            info!(command = %config.speech_command(), "speech_command_backend");
            Box::new(CommandSpeech::new(config.speech_command(), config.speech_args().to_vec()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_speech_always_succeeds() {
        let mut sink = LogSpeech;
        assert!(sink.speak("Three").await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_program_is_an_error() {
        let mut sink = CommandSpeech::new("definitely-not-a-tts-binary-7f3a", vec![]);
        let err = sink.speak("Start").await.unwrap_err();
        assert!(err.to_string().contains("definitely-not-a-tts-binary-7f3a"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_exit_status_checked() {
        let mut ok = CommandSpeech::new("true", vec![]);
        assert!(ok.speak("Good!").await.is_ok());

        let mut failing = CommandSpeech::new("false", vec![]);
        assert!(failing.speak("Good!").await.is_err());
    }
}
