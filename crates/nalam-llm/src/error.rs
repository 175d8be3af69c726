use thiserror::Error;

/// Failure of a single model request, or of a whole failover round.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("rate limited by the model endpoint: {0}")]
    RateLimited(String),
    #[error("model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("model returned no text")]
    EmptyResponse,
    #[error("could not decode model response: {0}")]
    Decode(String),
    #[error("no model credentials configured")]
    NoCredentials,
}

impl ModelError {
    /// Whether the endpoint refused the request for quota reasons.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ModelError::RateLimited(_))
    }
}

impl From<reqwest::Error> for ModelError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ModelError::Decode(e.to_string())
        } else {
            ModelError::Transport(e.to_string())
        }
    }
}
