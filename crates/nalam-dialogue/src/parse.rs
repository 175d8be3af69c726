//! Strict parsing of model output into decisions and replies.

use nalam_types::{Decision, Language, Reply, ToolCall, ToolParseError, ToolRequest};
use serde::Deserialize;
use serde_json::{Map, Value};

const FENCE: &str = "```";

fn strip_language_tag(text: &str) -> &str {
    text.strip_prefix("json")
        .or_else(|| text.strip_prefix("JSON"))
        .unwrap_or(text)
}

/// Removes Markdown code-fence markers (```` ``` ```` or ```` ```json ````)
/// and surrounding whitespace.
///
/// When the text holds a complete fenced block, only that block's content is
/// kept, so prose around it is dropped. Otherwise every stray marker is
/// removed.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();

    if let Some(open) = trimmed.find(FENCE) {
        let body = strip_language_tag(&trimmed[open + FENCE.len()..]);
        if let Some(close) = body.find(FENCE) {
            let inner = body[..close].trim();
            if !inner.is_empty() {
                return inner.to_string();
            }
        }
    }

    trimmed
        .split(FENCE)
        .enumerate()
        .map(|(i, piece)| if i == 0 { piece } else { strip_language_tag(piece) })
        .collect::<String>()
        .trim()
        .to_string()
}

#[derive(Debug, Deserialize)]
struct RawDecision {
    use_db: bool,
    #[serde(default)]
    requested_tool: Option<String>,
    #[serde(default)]
    tool_args: Option<Map<String, Value>>,
    language_code: String,
}

#[derive(Debug, Deserialize)]
struct RawReply {
    response_text: String,
    #[serde(default)]
    language_code: Option<String>,
}

/// Why a decision could not be accepted.
#[derive(Debug, thiserror::Error)]
pub enum DecisionParseError {
    #[error("decision is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported language code '{0}'")]
    Language(String),
}

/// Parses decision-stage output.
///
/// `use_db` and `language_code` are required; a tool that cannot be
/// resolved still yields a decision, carrying the rejection so it can be
/// reported as the turn's tool result.
pub fn parse_decision(text: &str) -> Result<Decision, DecisionParseError> {
    let raw: RawDecision = serde_json::from_str(&strip_code_fences(text))?;
    let language = Language::from_code(&raw.language_code)
        .ok_or_else(|| DecisionParseError::Language(raw.language_code.clone()))?;

    let tool = if !raw.use_db {
        ToolRequest::None
    } else {
        match raw.requested_tool.filter(|t| !t.trim().is_empty()) {
            None => ToolRequest::Rejected {
                requested: None,
                error: ToolParseError::MissingTool,
            },
            Some(name) => {
                let args = raw.tool_args.unwrap_or_default();
                match ToolCall::parse(&name, &args) {
                    Ok(call) => ToolRequest::Call(call),
                    Err(error) => ToolRequest::Rejected {
                        requested: Some(name),
                        error,
                    },
                }
            }
        }
    };

    Ok(Decision {
        use_db: raw.use_db,
        tool,
        language,
    })
}

/// Parses response-stage output.
///
/// Never fails: unparseable text becomes the reply itself in `hint`, and an
/// absent or unsupported language code falls back to `hint`.
pub fn parse_reply(text: &str, hint: Language) -> Reply {
    let cleaned = strip_code_fences(text);
    match serde_json::from_str::<RawReply>(&cleaned) {
        Ok(raw) => Reply {
            response_text: raw.response_text,
            language_code: raw
                .language_code
                .as_deref()
                .and_then(Language::from_code)
                .unwrap_or(hint),
        },
        Err(e) => {
            tracing::warn!(error = %e, "response was not JSON, using raw text");
            Reply {
                response_text: cleaned,
                language_code: hint,
            }
        }
    }
}
