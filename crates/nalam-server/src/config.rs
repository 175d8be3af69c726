//! Kiosk configuration loading from file and environment variables.

use nalam_llm::ModelConfig;
use nalam_voice::VoiceConfig;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level configuration shared by the HTTP server and the kiosk loop.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Hosted model and credentials.
    #[serde(default)]
    pub model: ModelConfig,

    /// Speech engines and voices.
    #[serde(default)]
    pub voice: VoiceConfig,

    #[serde(default)]
    pub kiosk: KioskConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins. Empty means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,

    /// Table read by `fetch_certificates`.
    #[serde(default = "default_certificates_table")]
    pub certificates_table: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "nalam_dialogue=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Local run loop behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct KioskConfig {
    /// Seconds of silence before the "are you still there?" prompt.
    #[serde(default = "default_idle_warning_secs")]
    pub idle_warning_secs: u64,

    /// Further seconds of silence before the session is reset.
    #[serde(default = "default_idle_reset_secs")]
    pub idle_reset_secs: u64,

    /// Speak replies through the configured audio player.
    #[serde(default)]
    pub speak_replies: bool,

    /// Take spoken input from the configured recorder instead of stdin.
    #[serde(default)]
    pub listen: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    5000
}

fn default_db_path() -> String {
    "nalam.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    4
}

fn default_certificates_table() -> String {
    "certificates".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_idle_warning_secs() -> u64 {
    30
}

fn default_idle_reset_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
            certificates_table: default_certificates_table(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            idle_warning_secs: default_idle_warning_secs(),
            idle_reset_secs: default_idle_reset_secs(),
            speak_replies: false,
            listen: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Resolves the config path: first CLI argument, then `NALAM_CONFIG_PATH`.
///
/// Returns the path (if any) and where it came from, for logging.
pub fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("NALAM_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

/// Loads configuration from a TOML file, falling back to defaults when the
/// file does not exist, then applies environment overrides.
///
/// Environment variable overrides:
/// - `NALAM_HOST` overrides `server.host`
/// - `NALAM_PORT` overrides `server.port`
/// - `NALAM_DB_PATH` overrides `database.path`
/// - `NALAM_LOG_LEVEL` overrides `logging.level`
/// - `NALAM_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `GEMINI_API_KEY_PRIMARY` / `GEMINI_API_KEY_SECONDARY` replace the
///   first / second entry of `model.api_keys`
/// - `NALAM_MODEL_BASE_URL` overrides `model.base_url`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn apply_env_overrides(config: &mut Config, env: impl Fn(&str) -> Option<String>) {
    if let Some(host) = env("NALAM_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = env("NALAM_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(db_path) = env("NALAM_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(level) = env("NALAM_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = env("NALAM_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(base_url) = env("NALAM_MODEL_BASE_URL") {
        config.model.base_url = base_url;
    }

    for (slot, key) in ["GEMINI_API_KEY_PRIMARY", "GEMINI_API_KEY_SECONDARY"]
        .into_iter()
        .enumerate()
    {
        let Some(value) = env(key).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let keys = &mut config.model.api_keys;
        if keys.len() <= slot {
            keys.resize(slot + 1, String::new());
        }
        keys[slot] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config(Some("/definitely/not/here/nalam.toml")).unwrap();
        assert_eq!(config.database.certificates_table, "certificates");
        assert_eq!(config.kiosk.idle_warning_secs, 30);
        assert!(!config.kiosk.listen);
        assert_eq!(config.model.primary_model, "gemini-2.5-flash");
    }

    #[test]
    fn file_sections_are_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nalam.toml");
        std::fs::write(
            &path,
            r#"
            [server]
            port = 8080

            [database]
            path = "/var/lib/nalam/kiosk.db"
            certificates_table = "user_certificates"

            [model]
            api_keys = ["file-key"]
            fallback_model = "gemini-2.0-flash-lite"

            [kiosk]
            idle_warning_secs = 10
            speak_replies = true
            listen = true
            "#,
        )
        .unwrap();

        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.certificates_table, "user_certificates");
        assert_eq!(config.model.fallback_model, "gemini-2.0-flash-lite");
        assert_eq!(config.kiosk.idle_warning_secs, 10);
        assert_eq!(config.kiosk.idle_reset_secs, 30);
        assert!(config.kiosk.speak_replies);
        assert!(config.kiosk.listen);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nalam.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();
        assert!(matches!(load_config(path.to_str()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn environment_overrides_apply() {
        let mut config = Config::default();
        config.model.api_keys = vec!["file-primary".into()];

        apply_env_overrides(
            &mut config,
            env_from(&[
                ("NALAM_PORT", "9000"),
                ("NALAM_HOST", "not-an-ip"),
                ("NALAM_LOG_JSON", "1"),
                ("GEMINI_API_KEY_SECONDARY", "env-secondary"),
            ]),
        );

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, default_host());
        assert!(config.logging.json);
        assert_eq!(config.model.api_keys, vec!["file-primary", "env-secondary"]);
    }

    #[test]
    fn primary_key_from_env_replaces_file_key() {
        let mut config = Config::default();
        config.model.api_keys = vec!["file-primary".into(), "file-secondary".into()];
        apply_env_overrides(&mut config, env_from(&[("GEMINI_API_KEY_PRIMARY", "env-primary")]));
        assert_eq!(config.model.api_keys, vec!["env-primary", "file-secondary"]);
    }
}
