//! Error types for tool execution.

use thiserror::Error;

/// Errors raised while running a tool against the kiosk database.
///
/// These never escape the invocation stage: [`crate::Toolbox::invoke`]
/// converts them into a descriptive [`nalam_types::ToolResult::Error`].
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("database unavailable: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed user profile: missing column '{0}'")]
    MalformedProfile(&'static str),

    #[error("invalid certificates table name: {0:?}")]
    InvalidTableName(String),
}
