//! The decide → invoke → respond pipeline.
//!
//! A [`Dialogue`] turns one utterance into a [`Reply`]. Per-session state
//! (reply language and the sticky model credential) is passed in by the
//! caller and updated in place; the dialogue itself holds no session data.
//!
//! Failures are absorbed at the smallest scope: a bad or missing decision
//! means no tool runs, a tool failure becomes the tool result, and an
//! unparseable reply is used verbatim. Only exhausting every model
//! credential and tier in the response stage surfaces as an error.

mod parse;
pub mod prompts;

pub use parse::{parse_decision, parse_reply, strip_code_fences, DecisionParseError};

use nalam_llm::{FailoverClient, ModelError};
use nalam_tools::Toolbox;
use nalam_types::{Decision, Reply, SessionState, ToolRequest, ToolResult};
use thiserror::Error;
use tracing::Instrument;

#[derive(Debug, Error)]
pub enum DialogueError {
    #[error("model unavailable: {0}")]
    Model(#[from] ModelError),
}

/// Everything produced by one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub decision: Decision,
    pub tool_result: Option<ToolResult>,
    pub reply: Reply,
}

#[derive(Debug, Clone)]
pub struct Dialogue {
    model: FailoverClient,
    tools: Toolbox,
}

impl Dialogue {
    pub fn new(model: FailoverClient, tools: Toolbox) -> Self {
        Self { model, tools }
    }

    /// Decision stage.
    ///
    /// Never fails. Model exhaustion and unparseable output both yield
    /// [`Decision::fallback`] with the session's current language.
    pub async fn decide(&self, state: &mut SessionState, utterance: &str) -> Decision {
        let prompt = prompts::decision_prompt(utterance, state.language);

        let text = match self
            .model
            .send(state.credential, prompts::DECISION_SYSTEM, &prompt)
            .await
        {
            Ok(reply) => {
                state.credential = reply.credential;
                reply.text
            }
            Err(e) => {
                tracing::warn!(error = %e, "decision model unavailable, continuing without tools");
                return Decision::fallback(state.language);
            }
        };

        match parse_decision(&text) {
            Ok(decision) => {
                state.language = decision.language;
                tracing::info!(
                    use_db = decision.use_db,
                    tool = decision.requested_tool().unwrap_or("none"),
                    language = %decision.language,
                    "decision made"
                );
                decision
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not parse decision, continuing without tools");
                Decision::fallback(state.language)
            }
        }
    }

    /// Invocation stage: at most one tool call per decision.
    pub async fn invoke(&self, decision: &Decision) -> Option<ToolResult> {
        match &decision.tool {
            ToolRequest::None => None,
            ToolRequest::Call(call) => Some(self.tools.invoke(call).await),
            ToolRequest::Rejected { requested, error } => {
                tracing::warn!(
                    requested = requested.as_deref().unwrap_or(""),
                    error = %error,
                    "rejected tool request"
                );
                Some(ToolResult::from(error.clone()))
            }
        }
    }

    /// Response stage. Fails only when no model pairing answers.
    pub async fn respond(
        &self,
        state: &mut SessionState,
        utterance: &str,
        tool_result: Option<&ToolResult>,
    ) -> Result<Reply, DialogueError> {
        let prompt = prompts::response_prompt(utterance, tool_result, state.language);
        let answer = self
            .model
            .send(state.credential, prompts::RESPONSE_SYSTEM, &prompt)
            .await?;
        state.credential = answer.credential;

        let reply = parse_reply(&answer.text, state.language);
        state.language = reply.language_code;
        Ok(reply)
    }

    /// Runs one full turn inside a `turn` span.
    pub async fn run_turn(
        &self,
        state: &mut SessionState,
        utterance: &str,
    ) -> Result<TurnOutcome, DialogueError> {
        let span = tracing::info_span!("turn", turn_id = %uuid::Uuid::new_v4());
        async move {
            let decision = self.decide(state, utterance).await;
            let tool_result = self.invoke(&decision).await;
            let reply = self.respond(state, utterance, tool_result.as_ref()).await?;
            Ok(TurnOutcome {
                decision,
                tool_result,
                reply,
            })
        }
        .instrument(span)
        .await
    }
}
