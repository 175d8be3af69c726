//! Voice profile and model definitions.
//!
//! A `VoiceProfile` maps one reply language to a specific TTS model and its
//! parameters. Languages without a profile are spoken by the system engine.

use crate::Language;
use serde::{Deserialize, Serialize};

/// Supported TTS model architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceModel {
    /// Piper TTS (ONNX-based, fast, local).
    #[default]
    Piper,
    /// System TTS (`espeak-ng`).
    System,
}

fn default_speed() -> f32 {
    1.0
}

fn default_sample_rate() -> u32 {
    22_050
}

/// A voice profile configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// The reply language this voice speaks.
    pub language: Language,
    /// The underlying TTS model architecture.
    #[serde(default)]
    pub model: VoiceModel,
    /// Path to the model file (relative to the voices directory or absolute).
    #[serde(default)]
    pub model_path: String,
    /// Path to the model configuration file (if applicable).
    #[serde(default)]
    pub config_path: Option<String>,
    /// Speech speed multiplier (1.0 is normal).
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Speaker ID within a multi-speaker model (0-indexed).
    #[serde(default)]
    pub speaker_id: Option<u32>,
    /// Output sample rate of the model, in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl VoiceProfile {
    /// A profile that speaks `language` through the system engine.
    pub fn system(language: Language) -> Self {
        Self {
            language,
            model: VoiceModel::System,
            model_path: String::new(),
            config_path: None,
            speed: default_speed(),
            speaker_id: None,
            sample_rate: default_sample_rate(),
        }
    }
}
