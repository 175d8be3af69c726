//! Speech collaborators for the Nalam kiosk.
//!
//! Speech-to-text and text-to-speech are delegated to local command-line
//! engines (whisper.cpp, Piper, espeak-ng) run as subprocesses with piped
//! stdin/stdout and a hard timeout. Microphone capture and playback use
//! `arecord`/`aplay` style tools the same way.

pub mod config;
pub mod error;
pub mod player;
mod process;
pub mod recorder;
pub mod stt;
pub mod tts;
pub mod wav;

pub use config::VoiceConfig;
pub use error::VoiceError;
pub use player::AudioPlayer;
pub use recorder::AudioRecorder;
pub use stt::{SttService, Transcript};
pub use tts::{SynthesizedAudio, TtsService};

impl VoiceConfig {
    pub fn stt_service(&self) -> SttService {
        SttService::new(&self.stt_model, &self.stt_binary)
    }

    /// Builds the TTS service with every configured profile loaded.
    ///
    /// Piper profiles must name a model file; a later profile for the same
    /// language replaces an earlier one.
    pub async fn tts_service(&self) -> Result<TtsService, VoiceError> {
        let tts = TtsService::new(&self.voices_dir, &self.piper_binary, &self.espeak_binary);
        for profile in &self.profiles {
            if profile.model == nalam_types::voice::VoiceModel::Piper
                && profile.model_path.trim().is_empty()
            {
                return Err(VoiceError::Config(format!(
                    "voice profile for '{}' has no model_path",
                    profile.language
                )));
            }
            tts.add_profile(profile.clone()).await;
        }
        Ok(tts)
    }

    pub fn player(&self) -> AudioPlayer {
        AudioPlayer::new(&self.player_binary, self.player_args.clone())
    }

    pub fn recorder(&self) -> AudioRecorder {
        AudioRecorder::new(&self.recorder_binary, self.recorder_args.clone())
    }
}
