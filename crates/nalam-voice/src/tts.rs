use crate::error::VoiceError;
use crate::process::run_engine;
use crate::wav::{is_wav, pcm_to_wav};
use nalam_types::voice::{VoiceModel, VoiceProfile};
use nalam_types::Language;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::RwLock;

/// Maximum text input size for TTS (64 KiB).
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Timeout for TTS process execution.
const TTS_TIMEOUT: Duration = Duration::from_secs(60);

/// Rendered speech, ready to play or embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

/// Text-to-speech with one voice per reply language.
///
/// Languages without a configured profile are spoken by `espeak-ng`.
#[derive(Debug, Clone)]
pub struct TtsService {
    profiles: Arc<RwLock<HashMap<Language, VoiceProfile>>>,
    voices_dir: PathBuf,
    piper_binary: PathBuf,
    espeak_binary: PathBuf,
}

impl TtsService {
    pub fn new(
        voices_dir: impl AsRef<Path>,
        piper_binary: impl AsRef<Path>,
        espeak_binary: impl AsRef<Path>,
    ) -> Self {
        Self {
            profiles: Arc::new(RwLock::new(HashMap::new())),
            voices_dir: voices_dir.as_ref().to_path_buf(),
            piper_binary: piper_binary.as_ref().to_path_buf(),
            espeak_binary: espeak_binary.as_ref().to_path_buf(),
        }
    }

    /// Sets the voice for the profile's language, replacing any previous one.
    pub async fn add_profile(&self, profile: VoiceProfile) {
        self.profiles
            .write()
            .await
            .insert(profile.language, profile);
    }

    /// The voice used for `language`.
    pub async fn profile_for(&self, language: Language) -> VoiceProfile {
        self.profiles
            .read()
            .await
            .get(&language)
            .cloned()
            .unwrap_or_else(|| VoiceProfile::system(language))
    }

    /// Speaks `text` in `language` and returns WAV audio.
    pub async fn synthesize(
        &self,
        text: &str,
        language: Language,
    ) -> Result<SynthesizedAudio, VoiceError> {
        if text.trim().is_empty() {
            return Err(VoiceError::Tts("text is empty".to_string()));
        }
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(VoiceError::Tts(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }

        let profile = self.profile_for(language).await;
        let bytes = match profile.model {
            VoiceModel::Piper => self.synthesize_piper(text, &profile).await?,
            VoiceModel::System => self.synthesize_system(text, language).await?,
        };
        tracing::debug!(language = %language, bytes = bytes.len(), "synthesized speech");

        Ok(SynthesizedAudio {
            bytes,
            mime: "audio/wav",
        })
    }

    fn resolve(&self, path: &str) -> PathBuf {
        if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            self.voices_dir.join(path)
        }
    }

    async fn synthesize_piper(
        &self,
        text: &str,
        profile: &VoiceProfile,
    ) -> Result<Vec<u8>, VoiceError> {
        let model_path = self.resolve(&profile.model_path);
        if !model_path.is_file() {
            return Err(VoiceError::Tts(format!(
                "Model file not found: {:?}",
                model_path
            )));
        }

        if profile.speed < 0.1 || profile.speed > 10.0 {
            return Err(VoiceError::Config(
                "Speed must be between 0.1 and 10.0".to_string(),
            ));
        }

        let mut command = Command::new(&self.piper_binary);
        command
            .arg("--model")
            .arg(model_path)
            .arg("--output_raw")
            // Piper's length scale is the inverse of speed.
            .arg("--length_scale")
            .arg((1.0 / profile.speed).to_string())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(config) = &profile.config_path {
            command.arg("--config").arg(self.resolve(config));
        }
        if let Some(speaker) = profile.speaker_id {
            command.arg("--speaker").arg(speaker.to_string());
        }

        let input = Some(text.as_bytes().to_vec());
        let output = run_engine("piper", &mut command, input, TTS_TIMEOUT)
            .await
            .map_err(|e| VoiceError::Tts(e.to_string()))?;
        if output.stdout.is_empty() {
            return Err(VoiceError::Tts("Piper produced no audio".to_string()));
        }

        Ok(pcm_to_wav(&output.stdout, profile.sample_rate))
    }

    /// `espeak-ng --stdout -v <code> <text>`; its output is already WAV.
    async fn synthesize_system(
        &self,
        text: &str,
        language: Language,
    ) -> Result<Vec<u8>, VoiceError> {
        let mut command = Command::new(&self.espeak_binary);
        command
            .arg("--stdout")
            .arg("-v")
            .arg(language.code())
            .arg(text)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = run_engine("espeak-ng", &mut command, None, TTS_TIMEOUT)
            .await
            .map_err(|e| VoiceError::Tts(e.to_string()))?;
        if !is_wav(&output.stdout) {
            return Err(VoiceError::Tts("espeak-ng did not produce WAV output".to_string()));
        }

        Ok(output.stdout)
    }
}
