use crate::error::VoiceError;
use crate::process::run_engine;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const PLAYBACK_TIMEOUT: Duration = Duration::from_secs(120);

/// Plays WAV audio through an external player reading stdin (`aplay -q -`).
#[derive(Debug, Clone)]
pub struct AudioPlayer {
    binary: PathBuf,
    args: Vec<String>,
}

impl AudioPlayer {
    pub fn new(binary: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            args,
        }
    }

    /// Blocks (asynchronously) until playback finishes.
    pub async fn play(&self, audio: &[u8]) -> Result<(), VoiceError> {
        let mut command = Command::new(&self.binary);
        command
            .args(&self.args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        run_engine("player", &mut command, Some(audio.to_vec()), PLAYBACK_TIMEOUT)
            .await
            .map_err(|e| VoiceError::Playback(e.to_string()))?;
        Ok(())
    }
}
