//! The closed tool set, typed tool arguments and tool results.
//!
//! The decision model names tools by string and passes loosely-typed JSON
//! arguments. [`ToolCall::parse`] is the single point where that input is
//! validated; everything downstream matches exhaustively on [`ToolCall`].

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Names of the backend tools the kiosk can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    GetUserContext,
    CheckSchemeEligibility,
    BookAppointmentSlot,
    FetchCertificates,
}

impl ToolName {
    pub const ALL: [ToolName; 4] = [
        ToolName::GetUserContext,
        ToolName::CheckSchemeEligibility,
        ToolName::BookAppointmentSlot,
        ToolName::FetchCertificates,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetUserContext => "get_user_context",
            Self::CheckSchemeEligibility => "check_scheme_eligibility",
            Self::BookAppointmentSlot => "book_appointment_slot",
            Self::FetchCertificates => "fetch_certificates",
        }
    }
}

impl FromStr for ToolName {
    type Err = ToolParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s.trim())
            .ok_or_else(|| ToolParseError::UnknownTool(s.to_string()))
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a requested tool could not be turned into a [`ToolCall`].
///
/// The `Display` text is what the response model sees as the tool result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolParseError {
    #[error("Tool '{0}' not found")]
    UnknownTool(String),

    #[error("No tool was named")]
    MissingTool,

    #[error("Tool {tool} needs the '{argument}' argument")]
    MissingArgument {
        tool: ToolName,
        argument: &'static str,
    },

    #[error("Tool {tool} got an invalid '{argument}' argument: expected text")]
    InvalidArgument {
        tool: ToolName,
        argument: &'static str,
    },
}

/// A validated tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolCall {
    /// Fetch the logged-in user's profile.
    GetUserContext,
    /// Check the user's documents against a scheme's requirements.
    CheckSchemeEligibility { scheme_name: String },
    /// Book an appointment slot for the user.
    BookAppointmentSlot { reason: String },
    /// List the user's certificates, optionally filtered by type.
    FetchCertificates { certificate_type: Option<String> },
}

impl ToolCall {
    pub fn name(&self) -> ToolName {
        match self {
            Self::GetUserContext => ToolName::GetUserContext,
            Self::CheckSchemeEligibility { .. } => ToolName::CheckSchemeEligibility,
            Self::BookAppointmentSlot { .. } => ToolName::BookAppointmentSlot,
            Self::FetchCertificates { .. } => ToolName::FetchCertificates,
        }
    }

    /// Builds a call from a model-supplied tool name and argument object.
    ///
    /// Scalar arguments are coerced to text. Unknown extra arguments are
    /// ignored; missing required ones are rejected.
    pub fn parse(name: &str, args: &Map<String, Value>) -> Result<Self, ToolParseError> {
        let tool: ToolName = name.parse()?;
        match tool {
            ToolName::GetUserContext => Ok(Self::GetUserContext),
            ToolName::CheckSchemeEligibility => Ok(Self::CheckSchemeEligibility {
                scheme_name: required_text(tool, args, "scheme_name")?,
            }),
            ToolName::BookAppointmentSlot => Ok(Self::BookAppointmentSlot {
                reason: required_text(tool, args, "reason")?,
            }),
            ToolName::FetchCertificates => Ok(Self::FetchCertificates {
                certificate_type: optional_text(tool, args, "certificate_type")?,
            }),
        }
    }
}

fn optional_text(
    tool: ToolName,
    args: &Map<String, Value>,
    argument: &'static str,
) -> Result<Option<String>, ToolParseError> {
    let text = match args.get(argument) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(_) => return Err(ToolParseError::InvalidArgument { tool, argument }),
    };
    Ok(Some(text).filter(|t| !t.is_empty()))
}

fn required_text(
    tool: ToolName,
    args: &Map<String, Value>,
    argument: &'static str,
) -> Result<String, ToolParseError> {
    optional_text(tool, args, argument)?
        .ok_or(ToolParseError::MissingArgument { tool, argument })
}

/// Profile of the user currently at the kiosk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserContext {
    pub name: String,
    pub uniqueid: i64,
    /// Names of the documents on file (non-null profile columns).
    pub documents: Vec<String>,
}

/// Result of comparing a scheme's requirements with the user's documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EligibilityVerdict {
    pub scheme: String,
    /// Required documents the user does not have, in scheme order.
    pub missing_documents: Vec<String>,
    pub summary: String,
}

impl EligibilityVerdict {
    pub fn new(scheme: impl Into<String>, missing_documents: Vec<String>) -> Self {
        let scheme = scheme.into();
        let summary = if missing_documents.is_empty() {
            format!("Eligible for {}.", scheme)
        } else {
            format!("Not eligible. Missing: {}", missing_documents.join(", "))
        };
        Self {
            scheme,
            missing_documents,
            summary,
        }
    }

    pub fn is_eligible(&self) -> bool {
        self.missing_documents.is_empty()
    }
}

/// A booked appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingConfirmation {
    pub token: i64,
    /// Local slot time, e.g. `03:45 PM`.
    pub slot_time: String,
    pub reason: String,
    /// Human-readable confirmation, e.g. `Token 101 Booked. Slot at 03:45 PM.`
    pub confirmation: String,
}

impl BookingConfirmation {
    pub fn new(token: i64, slot_time: impl Into<String>, reason: impl Into<String>) -> Self {
        let slot_time = slot_time.into();
        let confirmation = format!("Token {} Booked. Slot at {}.", token, slot_time);
        Self {
            token,
            slot_time,
            reason: reason.into(),
            confirmation,
        }
    }
}

/// Outcome of one tool invocation.
///
/// The response stage treats this as opaque context; it is serialized
/// as-is into the response prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolResult {
    UserContext(UserContext),
    Eligibility(EligibilityVerdict),
    Booking(BookingConfirmation),
    Certificates(Vec<Map<String, Value>>),
    /// A descriptive non-error outcome such as "No user logged in."
    Message(String),
    /// A failure description such as "Database error: ...".
    Error(String),
}

impl ToolResult {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// JSON rendering used as response-model context.
    pub fn to_context(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!("\"unserializable tool result: {}\"", e))
    }
}

impl From<ToolParseError> for ToolResult {
    fn from(err: ToolParseError) -> Self {
        Self::Error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn parses_every_known_tool() {
        assert_eq!(
            ToolCall::parse("get_user_context", &Map::new()),
            Ok(ToolCall::GetUserContext)
        );
        assert_eq!(
            ToolCall::parse(
                "check_scheme_eligibility",
                &args(json!({"scheme_name": " PM Kisan "}))
            ),
            Ok(ToolCall::CheckSchemeEligibility {
                scheme_name: "PM Kisan".to_string()
            })
        );
        assert_eq!(
            ToolCall::parse(
                "book_appointment_slot",
                &args(json!({"reason": "ration card issue"}))
            ),
            Ok(ToolCall::BookAppointmentSlot {
                reason: "ration card issue".to_string()
            })
        );
        assert_eq!(
            ToolCall::parse("fetch_certificates", &Map::new()),
            Ok(ToolCall::FetchCertificates {
                certificate_type: None
            })
        );
    }

    #[test]
    fn unknown_tool_is_rejected_with_descriptive_error() {
        let err = ToolCall::parse("drop_tables", &Map::new()).unwrap_err();
        assert_eq!(err, ToolParseError::UnknownTool("drop_tables".to_string()));
        assert_eq!(err.to_string(), "Tool 'drop_tables' not found");
    }

    #[test]
    fn missing_required_argument_is_rejected() {
        let err = ToolCall::parse("book_appointment_slot", &args(json!({"reason": "  "})))
            .unwrap_err();
        assert_eq!(
            err,
            ToolParseError::MissingArgument {
                tool: ToolName::BookAppointmentSlot,
                argument: "reason"
            }
        );
    }

    #[test]
    fn scalar_arguments_are_coerced_to_text() {
        let call = ToolCall::parse(
            "fetch_certificates",
            &args(json!({"certificate_type": 10, "extra": true})),
        )
        .unwrap();
        assert_eq!(
            call,
            ToolCall::FetchCertificates {
                certificate_type: Some("10".to_string())
            }
        );

        let err = ToolCall::parse(
            "check_scheme_eligibility",
            &args(json!({"scheme_name": ["a", "b"]})),
        )
        .unwrap_err();
        assert!(matches!(err, ToolParseError::InvalidArgument { .. }));
    }

    #[test]
    fn eligibility_summary_wording() {
        let eligible = EligibilityVerdict::new("PM Kisan", vec![]);
        assert!(eligible.is_eligible());
        assert_eq!(eligible.summary, "Eligible for PM Kisan.");

        let missing =
            EligibilityVerdict::new("PM Kisan", vec!["pan_card".into(), "voter_id".into()]);
        assert!(!missing.is_eligible());
        assert_eq!(missing.summary, "Not eligible. Missing: pan_card, voter_id");
    }

    #[test]
    fn tool_result_context_is_json() {
        let booking = ToolResult::Booking(BookingConfirmation::new(101, "03:45 PM", "ration card"));
        let ctx: Value = serde_json::from_str(&booking.to_context()).unwrap();
        assert_eq!(ctx["token"], 101);
        assert_eq!(ctx["confirmation"], "Token 101 Booked. Slot at 03:45 PM.");

        let message = ToolResult::Message("No user logged in.".to_string());
        assert_eq!(message.to_context(), "\"No user logged in.\"");
    }
}
