//! Hosted language-model access for Nalam.
//!
//! [`ModelBackend`] is the seam to the model provider; [`GeminiBackend`] is
//! the production implementation. [`FailoverClient`] wraps a backend with
//! credential and model-tier failover.

mod config;
mod error;
mod failover;
mod gemini;

pub use config::ModelConfig;
pub use error::ModelError;
pub use failover::{attempt_plan, FailoverClient, ModelReply, ModelTiers, Tier};
pub use gemini::GeminiBackend;

use async_trait::async_trait;
use std::fmt;

/// An API credential for the model provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub label: String,
    pub api_key: String,
}

impl Credential {
    pub fn new(label: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            api_key: api_key.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("label", &self.label)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// A single completion request against one credential and model.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Returns the model's raw text for `prompt` under `system`.
    async fn generate(
        &self,
        credential: &Credential,
        model: &str,
        system: &str,
        prompt: &str,
    ) -> Result<String, ModelError>;
}
