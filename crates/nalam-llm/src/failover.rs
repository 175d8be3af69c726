//! Credential × model-tier failover.
//!
//! One call walks a bounded plan of (credential, tier) pairs and stops at
//! the first success. The caller owns the "current" credential index and
//! gets back the index that actually answered, so later calls start there.

use crate::{Credential, ModelBackend, ModelError};
use std::sync::Arc;

/// Model capability tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Primary,
    Fallback,
}

/// Model names for each tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTiers {
    pub primary: String,
    pub fallback: String,
}

impl ModelTiers {
    pub fn model(&self, tier: Tier) -> &str {
        match tier {
            Tier::Primary => &self.primary,
            Tier::Fallback => &self.fallback,
        }
    }
}

/// Successful model answer and the pairing that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelReply {
    pub text: String,
    pub credential: usize,
    pub model: String,
}

/// Order in which (credential index, tier) pairs are attempted.
///
/// Current credential on the primary tier, the other credentials on the
/// primary tier, then the fallback tier starting again from the current
/// credential. An out-of-range `current` is treated as 0.
pub fn attempt_plan(current: usize, credentials: usize) -> Vec<(usize, Tier)> {
    if credentials == 0 {
        return Vec::new();
    }
    let current = if current < credentials { current } else { 0 };
    let order: Vec<usize> = std::iter::once(current)
        .chain((0..credentials).filter(|&i| i != current))
        .collect();

    let mut plan = Vec::with_capacity(credentials * 2);
    for tier in [Tier::Primary, Tier::Fallback] {
        plan.extend(order.iter().map(|&i| (i, tier)));
    }
    plan
}

/// Routes model calls through the failover plan.
#[derive(Clone)]
pub struct FailoverClient {
    backend: Arc<dyn ModelBackend>,
    credentials: Vec<Credential>,
    tiers: ModelTiers,
}

impl std::fmt::Debug for FailoverClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailoverClient")
            .field("credentials", &self.credentials)
            .field("tiers", &self.tiers)
            .finish_non_exhaustive()
    }
}

impl FailoverClient {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        credentials: Vec<Credential>,
        tiers: ModelTiers,
    ) -> Self {
        Self {
            backend,
            credentials,
            tiers,
        }
    }

    pub fn credential_count(&self) -> usize {
        self.credentials.len()
    }

    /// Sends one request, trying every (credential, tier) pair at most once.
    ///
    /// Returns the last observed error when every pairing fails.
    pub async fn send(
        &self,
        current: usize,
        system: &str,
        prompt: &str,
    ) -> Result<ModelReply, ModelError> {
        let mut last_error = ModelError::NoCredentials;

        for (idx, tier) in attempt_plan(current, self.credentials.len()) {
            let credential = &self.credentials[idx];
            let model = self.tiers.model(tier);

            match self.backend.generate(credential, model, system, prompt).await {
                Ok(text) => {
                    if idx != current {
                        tracing::info!(
                            credential = %credential.label,
                            model,
                            "switched model credential"
                        );
                    }
                    return Ok(ModelReply {
                        text,
                        credential: idx,
                        model: model.to_string(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        credential = %credential.label,
                        model,
                        rate_limited = e.is_rate_limit(),
                        error = %e,
                        "model attempt failed"
                    );
                    last_error = e;
                }
            }
        }

        tracing::error!(error = %last_error, "all model credentials and tiers exhausted");
        Err(last_error)
    }
}
