use serde::{Deserialize, Serialize};
use std::fmt;

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_primary_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_fallback_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Settings for the hosted model and its credential pool.
///
/// `api_keys` are tried in order; the first entry is the primary
/// credential.
#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_primary_model")]
    pub primary_model: String,
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,
    #[serde(default, skip_serializing)]
    pub api_keys: Vec<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            primary_model: default_primary_model(),
            fallback_model: default_fallback_model(),
            api_keys: Vec::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelConfig")
            .field("base_url", &self.base_url)
            .field("primary_model", &self.primary_model)
            .field("fallback_model", &self.fallback_model)
            .field("api_keys", &format!("[{} REDACTED]", self.api_keys.len()))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl ModelConfig {
    /// Credentials labelled `primary`, `secondary`, then `key-N`.
    pub fn credentials(&self) -> Vec<crate::Credential> {
        self.api_keys
            .iter()
            .filter(|k| !k.trim().is_empty())
            .enumerate()
            .map(|(i, key)| {
                let label = match i {
                    0 => "primary".to_string(),
                    1 => "secondary".to_string(),
                    n => format!("key-{}", n + 1),
                };
                crate::Credential::new(label, key.trim())
            })
            .collect()
    }

    pub fn tiers(&self) -> crate::ModelTiers {
        crate::ModelTiers {
            primary: self.primary_model.clone(),
            fallback: self.fallback_model.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_api_keys() {
        let config = ModelConfig {
            api_keys: vec!["super-secret-key".into()],
            ..ModelConfig::default()
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret-key"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn blank_keys_are_skipped_when_building_credentials() {
        let config = ModelConfig {
            api_keys: vec!["a".into(), "  ".into(), "b".into(), "c".into()],
            ..ModelConfig::default()
        };
        let labels: Vec<String> = config.credentials().into_iter().map(|c| c.label).collect();
        assert_eq!(labels, vec!["primary", "secondary", "key-3"]);
    }

    #[test]
    fn defaults_name_both_tiers() {
        let config: ModelConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.primary_model, "gemini-2.5-flash");
        assert_eq!(config.fallback_model, "gemini-2.5-flash-lite");
        assert!(config.api_keys.is_empty());
    }
}
