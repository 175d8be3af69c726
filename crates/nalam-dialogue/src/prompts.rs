//! System instructions and per-turn prompts for the two model stages.

use nalam_types::{Language, ToolResult};

/// Instruction for the decision stage.
pub const DECISION_SYSTEM: &str = "\
You are a concise assistant that reads a user's message and decides
whether calling a backend database or tool is required.

Return EXACTLY one JSON object (no extra text) with these fields:
    - use_db: true or false
    - requested_tool: name of the tool to call (one of get_user_context, check_scheme_eligibility, book_appointment_slot, fetch_certificates) or null
    - tool_args: object with arguments for the tool (or {} if none)
    - language_code: 'en', 'hi' or 'ta'

Tool arguments:
    - check_scheme_eligibility: {\"scheme_name\": \"...\"}
    - book_appointment_slot: {\"reason\": \"...\"}
    - fetch_certificates: {\"certificate_type\": \"...\"} (optional)

Make a conservative decision: only set use_db=true when the user clearly requests data, bookings, eligibility checks or fetching certificates.
If the user is chit-chatting, asking for help, greeting, or asking for general information, set use_db=false.
Protect user privacy: never request or invent user identifiers.
";

/// Instruction for the response stage.
pub const RESPONSE_SYSTEM: &str = "\
You are Nalam, a friendly multilingual kiosk assistant. Be warm, approachable and concise.
When given the user's message and optionally a tool result (database output), produce a JSON object:
    {\"response_text\": \"...\", \"language_code\": \"en|hi|ta\"}
Reply in the same language as language_code. Keep phrasing simple and helpful for all users.
";

/// Marker used in the response prompt when no tool ran.
pub const NO_TOOL_RESULT: &str = "No tool result";

pub fn decision_prompt(utterance: &str, language: Language) -> String {
    format!(
        "User message: {}\n\
         Language preference (persist unless user switches): {}\n\
         Decide whether a database/tool call is needed. Respond with the JSON object described in the system instruction.",
        utterance,
        language.code()
    )
}

pub fn response_prompt(
    utterance: &str,
    tool_result: Option<&ToolResult>,
    language: Language,
) -> String {
    let context = tool_result
        .map(ToolResult::to_context)
        .unwrap_or_else(|| NO_TOOL_RESULT.to_string());
    format!(
        "User message: {}\n\
         Tool result: {}\n\
         Language preference (persist unless user switches): {}\n\
         Produce exactly one JSON object: {{\"response_text\": ..., \"language_code\": ...}}",
        utterance,
        context,
        language.code()
    )
}
