//! Speech handlers: transcription and synthesis.

use crate::api::{parse_language, ApiError};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Json, Multipart},
    http::StatusCode,
};
use base64::Engine;
use nalam_types::Language;
use nalam_voice::{Transcript, VoiceError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Confidence reported with every transcript.
const TRANSCRIPT_CONFIDENCE: f32 = 0.9;

const NO_SPEECH: &str = "Could not understand audio. Please try again.";
const UNSUPPORTED_AUDIO: &str = "Audio format not supported. Please record in WAV.";

fn speech_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    ApiError::Speech {
        status,
        message: message.into(),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub success: bool,
    pub text: String,
    pub language: Language,
    pub confidence: f32,
}

/// Handler for `POST /api/transcribe`.
///
/// Multipart form with an `audio` file (WAV) and an optional `language`
/// field (`en`, `hi`, `ta`; default `en`).
pub async fn transcribe_handler(
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let mut audio: Option<Vec<u8>> = None;
    let mut language_field: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| speech_error(StatusCode::BAD_REQUEST, format!("multipart error: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("audio") => {
                let data = field.bytes().await.map_err(|e| {
                    speech_error(StatusCode::BAD_REQUEST, format!("failed to read audio: {}", e))
                })?;
                audio = Some(data.to_vec());
            }
            Some("language") => {
                let text = field.text().await.map_err(|e| {
                    speech_error(StatusCode::BAD_REQUEST, format!("failed to read language: {}", e))
                })?;
                language_field = Some(text);
            }
            _ => {}
        }
    }

    let audio =
        audio.ok_or_else(|| speech_error(StatusCode::BAD_REQUEST, "No audio file provided"))?;
    if audio.is_empty() {
        return Err(speech_error(StatusCode::BAD_REQUEST, "No audio file selected"));
    }
    let language_code = language_field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let language = parse_language(language_code)?.unwrap_or_default();

    match state.stt.transcribe(&audio, language).await {
        Ok(Transcript::Text(text)) => {
            tracing::info!(locale = language.locale(), chars = text.len(), "transcribed audio");
            Ok(Json(TranscribeResponse {
                success: true,
                text,
                language,
                confidence: TRANSCRIPT_CONFIDENCE,
            }))
        }
        Ok(Transcript::NoSpeech) => Err(speech_error(StatusCode::BAD_REQUEST, NO_SPEECH)),
        Err(VoiceError::UnsupportedFormat(detail)) => {
            tracing::info!(%detail, "rejected audio upload");
            Err(speech_error(StatusCode::BAD_REQUEST, UNSUPPORTED_AUDIO))
        }
        Err(e) => {
            tracing::error!(error = %e, "speech recognition failed");
            Err(speech_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Speech recognition error: {}", e),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SynthesizeResponse {
    pub success: bool,
    /// `data:<mime>;base64,<audio>`
    pub uri: String,
    pub language: Language,
    pub message: String,
}

/// Handler for `POST /api/synthesize-audio`.
pub async fn synthesize_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<SynthesizeRequest>, JsonRejection>,
) -> Result<Json<SynthesizeResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    })?;
    let text = payload.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("Text cannot be empty".to_string()));
    }
    let language = parse_language(payload.language.as_deref())?.unwrap_or_default();

    let audio = state.tts.synthesize(text, language).await.map_err(|e| {
        tracing::error!(error = %e, "speech synthesis failed");
        ApiError::InternalServerError(e.to_string())
    })?;

    let encoded = base64::engine::general_purpose::STANDARD.encode(&audio.bytes);
    Ok(Json(SynthesizeResponse {
        success: true,
        uri: format!("data:{};base64,{}", audio.mime, encoded),
        language,
        message: "Audio generated successfully".to_string(),
    }))
}
