use crate::error::VoiceError;
use crate::process::run_engine;
use crate::wav::is_wav;
use nalam_types::Language;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Maximum audio input size for STT (10 MiB).
pub const MAX_STT_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// Timeout for STT process execution.
const STT_TIMEOUT: Duration = Duration::from_secs(120);

/// Markers whisper.cpp prints instead of text when it hears nothing.
const SILENCE_MARKERS: [&str; 3] = ["[BLANK_AUDIO]", "[SILENCE]", "(silence)"];

/// What the recogniser heard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    Text(String),
    /// Audio was valid but contained no intelligible speech.
    NoSpeech,
}

#[derive(Debug, Clone)]
pub struct SttService {
    model_path: PathBuf,
    binary_path: PathBuf,
}

impl SttService {
    pub fn new(model_path: impl Into<PathBuf>, binary_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            binary_path: binary_path.into(),
        }
    }

    /// Transcribes a WAV recording spoken in `language`.
    ///
    /// The recogniser is run as `<binary> -m <model> -l <lang> -f -` with
    /// the audio on stdin and the transcript on stdout. Other containers are
    /// rejected before the binary is started.
    pub async fn transcribe(
        &self,
        audio_data: &[u8],
        language: Language,
    ) -> Result<Transcript, VoiceError> {
        if audio_data.len() > MAX_STT_INPUT_BYTES {
            return Err(VoiceError::Stt(format!(
                "audio data exceeds maximum size: {} bytes (limit: {} bytes)",
                audio_data.len(),
                MAX_STT_INPUT_BYTES
            )));
        }
        if !is_wav(audio_data) {
            return Err(VoiceError::UnsupportedFormat(
                "expected a RIFF/WAVE recording".to_string(),
            ));
        }

        tracing::debug!(locale = language.locale(), bytes = audio_data.len(), "transcribing");

        let mut command = Command::new(&self.binary_path);
        command
            .arg("-m")
            .arg(&self.model_path)
            .arg("-l")
            .arg(language.code())
            .arg("-f")
            .arg("-")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let input = Some(audio_data.to_vec());
        let output = run_engine("STT binary", &mut command, input, STT_TIMEOUT)
            .await
            .map_err(|e| VoiceError::Stt(e.to_string()))?;

        Ok(to_transcript(&String::from_utf8_lossy(&output.stdout)))
    }
}

fn to_transcript(raw: &str) -> Transcript {
    let text = SILENCE_MARKERS
        .iter()
        .fold(raw.to_string(), |acc, marker| acc.replace(marker, ""));
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        Transcript::NoSpeech
    } else {
        Transcript::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_output_means_no_speech() {
        assert_eq!(to_transcript("  \n"), Transcript::NoSpeech);
        assert_eq!(to_transcript(" [BLANK_AUDIO]\n"), Transcript::NoSpeech);
    }

    #[test]
    fn whitespace_is_normalised() {
        assert_eq!(
            to_transcript("  What services\n are available? "),
            Transcript::Text("What services are available?".into())
        );
    }
}
