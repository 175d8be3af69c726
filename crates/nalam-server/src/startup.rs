//! Process bootstrap shared by the HTTP server and the kiosk loop.

use crate::config::{Config, DatabaseConfig, LoggingConfig};
use crate::AppState;
use nalam_db::{DbPool, DbRuntimeSettings};
use nalam_dialogue::Dialogue;
use nalam_llm::{FailoverClient, GeminiBackend, ModelError};
use nalam_tools::{CertificateTable, ToolError, Toolbox};
use nalam_types::SessionState;
use nalam_voice::VoiceError;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Pool(#[from] nalam_db::PoolError),
    #[error("failed to get database connection: {0}")]
    Connection(#[from] r2d2::Error),
    #[error(transparent)]
    Migration(#[from] nalam_db::MigrationError),
    #[error("invalid database configuration: {0}")]
    Tools(#[from] ToolError),
    #[error("failed to build model client: {0}")]
    Model(#[from] ModelError),
    #[error("invalid voice configuration: {0}")]
    Voice(#[from] VoiceError),
}

/// Installs the global `tracing` subscriber.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Opens the pool and applies pending migrations.
pub fn open_database(database: &DatabaseConfig) -> Result<DbPool, StartupError> {
    let pool = nalam_db::create_pool(
        &database.path,
        DbRuntimeSettings {
            busy_timeout_ms: database.busy_timeout_ms,
            pool_max_size: database.pool_max_size,
        },
    )?;

    let mut conn = pool.get()?;
    let applied = nalam_db::run_migrations(&mut conn)?;
    if applied > 0 {
        tracing::info!(count = applied, "applied database migrations");
    }
    Ok(pool)
}

/// Wires the model client and tools into a [`Dialogue`].
pub fn build_dialogue(config: &Config, pool: DbPool) -> Result<Dialogue, StartupError> {
    let credentials = config.model.credentials();
    if credentials.is_empty() {
        tracing::warn!(
            "no model API keys configured; set GEMINI_API_KEY_PRIMARY or model.api_keys"
        );
    }

    let backend = GeminiBackend::new(
        config.model.base_url.clone(),
        Duration::from_secs(config.model.request_timeout_secs),
    )?;
    let model = FailoverClient::new(Arc::new(backend), credentials, config.model.tiers());

    let certificates = CertificateTable::new(config.database.certificates_table.clone())?;
    Ok(Dialogue::new(model, Toolbox::new(pool, certificates)))
}

/// Builds the full HTTP application state from configuration.
pub async fn build_state(config: &Config) -> Result<AppState, StartupError> {
    let pool = open_database(&config.database)?;
    let dialogue = build_dialogue(config, pool)?;
    let tts = config.voice.tts_service().await?;

    Ok(AppState {
        dialogue: Arc::new(dialogue),
        session: Arc::new(Mutex::new(SessionState::default())),
        stt: Arc::new(config.voice.stt_service()),
        tts: Arc::new(tts),
        cors_origins: config.server.cors_origins.clone(),
    })
}
