//! Shared types for the Nalam kiosk assistant.
//!
//! This crate holds the vocabulary every other crate speaks: the supported
//! reply languages, the structured decision produced by the decision model,
//! the closed tool set with its typed arguments, tool results, replies, and
//! the per-session state carried from one turn to the next.
//!
//! No crate in the workspace depends on anything *except* `nalam-types` for
//! cross-cutting type definitions.

pub mod tool;
pub mod voice;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use tool::{
    BookingConfirmation, EligibilityVerdict, ToolCall, ToolName, ToolParseError, ToolResult,
    UserContext,
};

/// Reply languages supported by the kiosk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English.
    #[default]
    En,
    /// Hindi.
    Hi,
    /// Tamil.
    Ta,
}

/// Error returned when a language code is outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported language: {0:?}")]
pub struct UnsupportedLanguage(pub String);

impl Language {
    /// Every supported language, in display order.
    pub const ALL: [Language; 3] = [Language::En, Language::Hi, Language::Ta];

    /// Two-letter code used on the wire and by the TTS collaborator.
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Ta => "ta",
        }
    }

    /// Regional locale tag handed to the speech-to-text collaborator.
    pub fn locale(self) -> &'static str {
        match self {
            Self::En => "en-IN",
            Self::Hi => "hi-IN",
            Self::Ta => "ta-IN",
        }
    }

    /// Parses a two-letter code, ignoring surrounding whitespace and case.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Self::En),
            "hi" => Some(Self::Hi),
            "ta" => Some(Self::Ta),
            _ => None,
        }
    }
}

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| UnsupportedLanguage(s.to_string()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// State carried from one turn to the next for a single kiosk session.
///
/// Both fields are overwritten, never merged: `language` by the most recent
/// stage that reported one, `credential` by the failover router whenever a
/// different credential succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// The session's current reply language.
    pub language: Language,
    /// Index of the model credential that last succeeded.
    pub credential: usize,
}

impl SessionState {
    /// Fresh state speaking `language`, starting from the first credential.
    pub fn new(language: Language) -> Self {
        Self {
            language,
            credential: 0,
        }
    }
}

/// What the decision stage asked the invocation stage to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    /// No backend tool is needed this turn.
    None,
    /// A recognised tool with validated arguments.
    Call(ToolCall),
    /// The model asked for a tool but the request could not be turned into
    /// a [`ToolCall`]. The invocation stage reports `error` as the result.
    Rejected {
        /// The tool name exactly as the model sent it, if any.
        requested: Option<String>,
        /// Why the request was rejected.
        error: ToolParseError,
    },
}

/// Validated output of the decision stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// Whether the model asked for backend data.
    pub use_db: bool,
    /// The tool to run, if any.
    pub tool: ToolRequest,
    /// Language the model inferred for this turn.
    pub language: Language,
}

impl Decision {
    /// The safe default: no tool, keep the prior language.
    pub fn fallback(prior: Language) -> Self {
        Self {
            use_db: false,
            tool: ToolRequest::None,
            language: prior,
        }
    }

    /// The tool name the model requested, for echoing back to clients.
    pub fn requested_tool(&self) -> Option<&str> {
        match &self.tool {
            ToolRequest::None => None,
            ToolRequest::Call(call) => Some(call.name().as_str()),
            ToolRequest::Rejected { requested, .. } => requested.as_deref(),
        }
    }
}

/// Output of the response stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Text to show or speak to the user.
    pub response_text: String,
    /// Language the reply is written in.
    pub language_code: Language,
}
