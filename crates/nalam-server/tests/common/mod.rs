#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use nalam_db::{create_pool, run_migrations, DbPool, DbRuntimeSettings};
use nalam_dialogue::prompts::DECISION_SYSTEM;
use nalam_dialogue::Dialogue;
use nalam_llm::{Credential, FailoverClient, ModelBackend, ModelError, ModelTiers};
use nalam_server::AppState;
use nalam_tools::{CertificateTable, Toolbox};
use nalam_types::SessionState;
use nalam_voice::{SttService, TtsService};
use serde_json::Value;
use std::collections::VecDeque;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// Model backend replaying canned decision and response texts.
#[derive(Default)]
pub struct ScriptedModel {
    decisions: Mutex<VecDeque<String>>,
    responses: Mutex<VecDeque<String>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn decision(self, text: &str) -> Self {
        self.decisions.lock().unwrap().push_back(text.to_string());
        self
    }

    pub fn response(self, text: &str) -> Self {
        self.responses.lock().unwrap().push_back(text.to_string());
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for ScriptedModel {
    async fn generate(
        &self,
        _credential: &Credential,
        _model: &str,
        system: &str,
        prompt: &str,
    ) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let queue = if system == DECISION_SYSTEM {
            &self.decisions
        } else {
            &self.responses
        };
        queue
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ModelError::Status {
                status: 503,
                body: "script exhausted".into(),
            })
    }
}

pub struct TestKiosk {
    pub dir: tempfile::TempDir,
    pub pool: DbPool,
    pub model: Arc<ScriptedModel>,
    pub dialogue: Dialogue,
}

/// Builds a dialogue over a migrated scratch database with user 42 signed in.
pub fn kiosk(model: ScriptedModel) -> TestKiosk {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nalam.db");
    let pool = create_pool(path.to_str().unwrap(), DbRuntimeSettings::default()).unwrap();
    {
        let mut conn = pool.get().unwrap();
        run_migrations(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO app_main (uniqueid, name, aadhaar_card) VALUES (42, 'Lakshmi', 'XXXX-0042')",
            [],
        )
        .unwrap();
    }

    let model = Arc::new(model);
    let client = FailoverClient::new(
        model.clone(),
        vec![Credential::new("primary", "test-key")],
        ModelTiers {
            primary: "gemini-2.5-flash".into(),
            fallback: "gemini-2.5-flash-lite".into(),
        },
    );
    let dialogue = Dialogue::new(client, Toolbox::new(pool.clone(), CertificateTable::default()));
    TestKiosk {
        dir,
        pool,
        model,
        dialogue,
    }
}

/// Writes an executable shell script into `dir`.
pub async fn mock_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    tokio::fs::write(&path, format!("#!/bin/sh\n{}\n", body))
        .await
        .unwrap();
    let mut perms = tokio::fs::metadata(&path).await.unwrap().permissions();
    perms.set_mode(0o755);
    tokio::fs::set_permissions(&path, perms).await.unwrap();
    path
}

pub fn state(kiosk: &TestKiosk, stt: SttService, tts: TtsService) -> AppState {
    AppState {
        dialogue: Arc::new(kiosk.dialogue.clone()),
        session: Arc::new(Mutex::new(SessionState::default())),
        stt: Arc::new(stt),
        tts: Arc::new(tts),
        cors_origins: vec![],
    }
}

pub fn default_state(kiosk: &TestKiosk) -> AppState {
    state(
        kiosk,
        SttService::new("ggml-base.bin", "/nonexistent/whisper"),
        TtsService::new(kiosk.dir.path(), "/nonexistent/piper", "/nonexistent/espeak-ng"),
    )
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
