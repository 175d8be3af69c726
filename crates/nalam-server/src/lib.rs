//! Nalam kiosk server library logic.

pub mod api;
pub mod api_voice;
pub mod config;
pub mod kiosk;
pub mod startup;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Extension, Json, Router,
};
use nalam_dialogue::Dialogue;
use nalam_types::SessionState;
use nalam_voice::{SttService, TtsService};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The decide → invoke → respond pipeline.
    pub dialogue: Arc<Dialogue>,
    /// The kiosk's single conversation.
    pub session: Arc<Mutex<SessionState>>,
    pub stt: Arc<SttService>,
    pub tts: Arc<TtsService>,
    /// Allowed CORS origins; empty allows any.
    pub cors_origins: Vec<String>,
}

/// Maximum request body size for JSON endpoints (1 MiB).
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Maximum upload size for `/api/transcribe`: the STT input cap plus room
/// for multipart framing.
const MAX_AUDIO_BODY_BYTES: usize = nalam_voice::stt::MAX_STT_INPUT_BYTES + 64 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Nalam API is running",
        "version": env!("CARGO_PKG_VERSION"),
        "features": [
            "chat",
            "multilingual",
            "language-persistence",
            "database-integration",
            "speech",
        ],
    }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(parsed)
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let audio_routes = Router::new()
        .route("/api/transcribe", post(api_voice::transcribe_handler))
        .layer(DefaultBodyLimit::max(MAX_AUDIO_BODY_BYTES));

    let json_routes = Router::new()
        .route("/api/chat", post(api::chat_handler))
        .route("/api/synthesize-audio", post(api_voice::synthesize_handler))
        .route(
            "/api/language-preference",
            post(api::language_preference_handler),
        )
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES));

    let cors = cors_layer(&state.cors_origins);

    Router::new()
        .route("/health", get(health))
        .route("/api/health", get(health))
        .merge(audio_routes)
        .merge(json_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
