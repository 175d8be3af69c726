mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::Engine;
use common::{default_state, kiosk, mock_script, post_json, send, state, ScriptedModel};
use nalam_server::app;
use nalam_voice::wav::pcm_to_wav;
use nalam_voice::{SttService, TtsService};
use serde_json::json;

const BOUNDARY: &str = "nalam-test-boundary";

/// Builds a multipart upload with an optional `audio` file and `language`.
fn transcribe_request(audio: Option<&[u8]>, language: Option<&str>) -> Request<Body> {
    let mut body: Vec<u8> = Vec::new();
    if let Some(audio) = audio {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"speech.wav\"\r\nContent-Type: audio/wav\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(audio);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(language) = language {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"language\"\r\n\r\n{language}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/transcribe")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn stt_with_script(dir: &std::path::Path, body: &str) -> SttService {
    let script = mock_script(dir, "whisper.sh", body).await;
    SttService::new("ggml-base.bin", script)
}

#[tokio::test]
async fn transcribe_returns_text_language_and_confidence() {
    let k = kiosk(ScriptedModel::default());
    let stt = stt_with_script(
        k.dir.path(),
        "cat > /dev/null\necho 'What services are available?'",
    )
    .await;
    let tts = TtsService::new(k.dir.path(), "piper", "espeak-ng");

    let (status, body) = send(
        app(state(&k, stt, tts)),
        transcribe_request(Some(&pcm_to_wav(&[0u8; 64], 16_000)), Some("hi")),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["text"], "What services are available?");
    assert_eq!(body["language"], "hi");
    assert!((body["confidence"].as_f64().unwrap() - 0.9).abs() < 1e-6);
}

#[tokio::test]
async fn transcribe_distinguishes_no_speech_from_service_failure() {
    let k = kiosk(ScriptedModel::default());
    let wav = pcm_to_wav(&[0u8; 64], 16_000);

    let silent = stt_with_script(k.dir.path(), "cat > /dev/null\necho '[BLANK_AUDIO]'").await;
    let tts = TtsService::new(k.dir.path(), "piper", "espeak-ng");
    let (status, body) = send(
        app(state(&k, silent, tts.clone())),
        transcribe_request(Some(&wav), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Could not understand audio. Please try again.");

    let broken_dir = tempfile::tempdir().unwrap();
    let broken = stt_with_script(broken_dir.path(), "cat > /dev/null\nexit 1").await;
    let (status, body) = send(
        app(state(&k, broken, tts)),
        transcribe_request(Some(&wav), Some("en")),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Speech recognition error:"));
}

#[tokio::test]
async fn transcribe_rejects_bad_input() {
    let k = kiosk(ScriptedModel::default());

    let (status, body) = send(app(default_state(&k)), transcribe_request(None, Some("en"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No audio file provided");

    let (status, body) = send(
        app(default_state(&k)),
        transcribe_request(Some(b"OggS\0\0\0\0webm-ish"), Some("en")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Audio format not supported. Please record in WAV.");

    let (status, body) = send(
        app(default_state(&k)),
        transcribe_request(Some(&pcm_to_wav(&[], 16_000)), Some("fr")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Unsupported language. Use: en, hi, ta");
}

#[tokio::test]
async fn synthesize_returns_wav_data_uri() {
    let k = kiosk(ScriptedModel::default());
    let espeak = mock_script(k.dir.path(), "espeak.sh", "printf 'RIFF0000WAVEfmt '").await;
    let tts = TtsService::new(k.dir.path(), "/nonexistent/piper", espeak);
    let stt = SttService::new("ggml-base.bin", "/nonexistent/whisper");

    let (status, body) = send(
        app(state(&k, stt, tts)),
        post_json("/api/synthesize-audio", json!({"text": "Vanakkam", "language": "ta"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["language"], "ta");
    let uri = body["uri"].as_str().unwrap();
    let encoded = uri.strip_prefix("data:audio/wav;base64,").unwrap();
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .unwrap();
    assert_eq!(decoded, b"RIFF0000WAVEfmt ");
}

#[tokio::test]
async fn synthesize_rejects_empty_text() {
    let k = kiosk(ScriptedModel::default());
    let (status, body) = send(
        app(default_state(&k)),
        post_json("/api/synthesize-audio", json!({"text": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Text cannot be empty");
}

#[tokio::test]
async fn synthesize_engine_failure_is_internal_error() {
    let k = kiosk(ScriptedModel::default());
    let (status, body) = send(
        app(default_state(&k)),
        post_json("/api/synthesize-audio", json!({"text": "Hello", "language": "en"})),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("espeak-ng"));
}
