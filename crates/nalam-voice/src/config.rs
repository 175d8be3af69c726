use nalam_types::voice::VoiceProfile;
use serde::{Deserialize, Serialize};

fn default_stt_binary() -> String {
    "whisper-cli".to_string()
}

fn default_stt_model() -> String {
    "models/ggml-base.bin".to_string()
}

fn default_piper_binary() -> String {
    "piper".to_string()
}

fn default_espeak_binary() -> String {
    "espeak-ng".to_string()
}

fn default_voices_dir() -> String {
    "assets/voices".to_string()
}

fn default_player_binary() -> String {
    "aplay".to_string()
}

fn default_player_args() -> Vec<String> {
    vec!["-q".to_string(), "-".to_string()]
}

fn default_recorder_binary() -> String {
    "arecord".to_string()
}

/// Eight seconds of 16 kHz mono WAV on stdout.
fn default_recorder_args() -> Vec<String> {
    ["-q", "-f", "S16_LE", "-r", "16000", "-c", "1", "-d", "8", "-t", "wav", "-"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// External speech tools and per-language voices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    /// whisper.cpp-compatible binary reading WAV on stdin.
    #[serde(default = "default_stt_binary")]
    pub stt_binary: String,
    #[serde(default = "default_stt_model")]
    pub stt_model: String,
    #[serde(default = "default_piper_binary")]
    pub piper_binary: String,
    /// Used for languages without a Piper profile.
    #[serde(default = "default_espeak_binary")]
    pub espeak_binary: String,
    #[serde(default = "default_voices_dir")]
    pub voices_dir: String,
    /// Plays WAV bytes from stdin (kiosk run loop only).
    #[serde(default = "default_player_binary")]
    pub player_binary: String,
    #[serde(default = "default_player_args")]
    pub player_args: Vec<String>,
    /// Writes one WAV utterance to stdout (kiosk run loop with `listen`).
    #[serde(default = "default_recorder_binary")]
    pub recorder_binary: String,
    #[serde(default = "default_recorder_args")]
    pub recorder_args: Vec<String>,
    #[serde(default)]
    pub profiles: Vec<VoiceProfile>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            stt_binary: default_stt_binary(),
            stt_model: default_stt_model(),
            piper_binary: default_piper_binary(),
            espeak_binary: default_espeak_binary(),
            voices_dir: default_voices_dir(),
            player_binary: default_player_binary(),
            player_args: default_player_args(),
            recorder_binary: default_recorder_binary(),
            recorder_args: default_recorder_args(),
            profiles: Vec::new(),
        }
    }
}
