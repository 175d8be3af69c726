//! Chat and language-preference handlers.

use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use nalam_types::{Language, SessionState};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Message for a language outside `en|hi|ta`.
pub const UNSUPPORTED_LANGUAGE: &str = "Unsupported language. Use: en, hi, ta";

/// Reply text sent to the user when a turn cannot be completed.
pub const APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
    /// The dialogue could not produce a reply.
    #[error("turn failed: {0}")]
    TurnFailed(String),
    /// A speech request failed; the body follows the speech response shape.
    #[error("speech error: {message}")]
    Speech { status: StatusCode, message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
            ApiError::InternalServerError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": msg }),
            ),
            ApiError::TurnFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": msg, "response_text": APOLOGY }),
            ),
            ApiError::Speech { status, message } => (
                status,
                serde_json::json!({ "success": false, "error": message, "text": "" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Parses an optional client-supplied language code.
pub(crate) fn parse_language(code: Option<&str>) -> Result<Option<Language>, ApiError> {
    match code {
        None => Ok(None),
        Some(code) => Language::from_code(code)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest(UNSUPPORTED_LANGUAGE.to_string())),
    }
}

fn read_session(state: &AppState) -> SessionState {
    *state.session.lock().unwrap_or_else(|e| e.into_inner())
}

fn write_session(state: &AppState, session: SessionState) {
    *state.session.lock().unwrap_or_else(|e| e.into_inner()) = session;
}

/// Request body for `POST /api/chat`.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    /// Overrides the session language for this turn when present.
    #[serde(default)]
    pub language: Option<String>,
}

/// Response body for `POST /api/chat`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response_text: String,
    pub language_code: Language,
    pub use_db: bool,
    pub requested_tool: Option<String>,
}

/// Handler for `POST /api/chat`.
///
/// Runs one decide → invoke → respond turn against the shared session. The
/// session (language and model credential) is written back even when the
/// turn fails. A missing or unreadable body counts as an empty message.
pub async fn chat_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unreadable chat body");
            ChatRequest::default()
        }
    };
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Message cannot be empty".to_string()));
    }
    let requested_language = parse_language(payload.language.as_deref())?;

    let mut session = read_session(&state);
    if let Some(language) = requested_language {
        session.language = language;
    }

    let result = state.dialogue.run_turn(&mut session, message).await;
    write_session(&state, session);

    match result {
        Ok(outcome) => Ok(Json(ChatResponse {
            use_db: outcome.decision.use_db,
            requested_tool: outcome.decision.requested_tool().map(str::to_string),
            response_text: outcome.reply.response_text,
            language_code: outcome.reply.language_code,
        })),
        Err(e) => {
            tracing::error!(error = %e, "chat turn failed");
            Err(ApiError::TurnFailed(e.to_string()))
        }
    }
}

/// Request body for `POST /api/language-preference`.
#[derive(Debug, Deserialize)]
pub struct LanguagePreferenceRequest {
    #[serde(default)]
    pub language: Option<String>,
}

/// Handler for `POST /api/language-preference`.
///
/// A missing language selects English.
pub async fn language_preference_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<LanguagePreferenceRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    })?;
    let language = parse_language(payload.language.as_deref())?.unwrap_or_default();

    let mut session = read_session(&state);
    session.language = language;
    write_session(&state, session);

    tracing::info!(language = %language, "language preference updated");
    Ok(Json(serde_json::json!({
        "language": language,
        "message": format!("Language preference set to {}", language),
    })))
}
