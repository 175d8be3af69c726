use crate::error::VoiceError;
use crate::process::run_engine;
use crate::wav::is_wav;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Upper bound on one capture, on top of the recorder's own duration.
const CAPTURE_TIMEOUT: Duration = Duration::from_secs(30);

/// Captures one utterance from the microphone through an external recorder
/// writing WAV to stdout (`arecord ... -d 8 -t wav -`).
#[derive(Debug, Clone)]
pub struct AudioRecorder {
    binary: PathBuf,
    args: Vec<String>,
}

impl AudioRecorder {
    pub fn new(binary: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            args,
        }
    }

    /// Records until the recorder exits and returns the WAV bytes.
    pub async fn record(&self) -> Result<Vec<u8>, VoiceError> {
        let mut command = Command::new(&self.binary);
        command
            .args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = run_engine("recorder", &mut command, None, CAPTURE_TIMEOUT)
            .await
            .map_err(|e| VoiceError::Capture(e.to_string()))?;
        if !is_wav(&output.stdout) {
            return Err(VoiceError::Capture(
                "recorder did not produce WAV output".to_string(),
            ));
        }

        tracing::debug!(bytes = output.stdout.len(), "captured audio");
        Ok(output.stdout)
    }
}
