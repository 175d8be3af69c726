//! Database-backed tools for the Nalam kiosk.
//!
//! The kiosk exposes a fixed set of four tools (see [`ToolCall`]). Each one
//! runs on a single pooled connection and produces a [`ToolResult`]; tool
//! failures are turned into descriptive error results instead of aborting
//! the turn. Tools that act on behalf of the user resolve the profile first
//! and report [`NO_USER_LOGGED_IN`] without touching anything else when
//! nobody is signed in.

mod appointments;
mod certificates;
mod error;
mod profile;
mod schemes;

pub use appointments::{book_appointment_slot, FIRST_TOKEN};
pub use certificates::{fetch_certificates, CertificateTable, NO_CERTIFICATES};
pub use error::ToolError;
pub use profile::{get_user_context, NO_USER_LOGGED_IN};
pub use schemes::{check_scheme_eligibility, SCHEME_NOT_FOUND};

use chrono::NaiveDateTime;
use nalam_db::DbPool;
use nalam_types::{ToolCall, ToolResult};
use rusqlite::Connection;

/// Runs one tool call on an open connection.
///
/// `now` is the local wall-clock time used for booking slots.
pub fn run_tool(
    conn: &Connection,
    call: &ToolCall,
    certificates: &CertificateTable,
    now: NaiveDateTime,
) -> Result<ToolResult, ToolError> {
    let Some(user) = get_user_context(conn)? else {
        return Ok(ToolResult::Message(NO_USER_LOGGED_IN.to_string()));
    };

    let result = match call {
        ToolCall::GetUserContext => ToolResult::UserContext(user),
        ToolCall::CheckSchemeEligibility { scheme_name } => {
            match check_scheme_eligibility(conn, &user, scheme_name)? {
                Some(verdict) => ToolResult::Eligibility(verdict),
                None => ToolResult::Message(SCHEME_NOT_FOUND.to_string()),
            }
        }
        ToolCall::BookAppointmentSlot { reason } => {
            ToolResult::Booking(book_appointment_slot(conn, &user, reason, now)?)
        }
        ToolCall::FetchCertificates { certificate_type } => {
            let rows =
                fetch_certificates(conn, certificates, &user, certificate_type.as_deref())?;
            if rows.is_empty() {
                ToolResult::Message(NO_CERTIFICATES.to_string())
            } else {
                ToolResult::Certificates(rows)
            }
        }
    };
    Ok(result)
}

/// The invocation stage: runs tool calls against the kiosk database.
#[derive(Debug, Clone)]
pub struct Toolbox {
    pool: DbPool,
    certificates: CertificateTable,
}

impl Toolbox {
    pub fn new(pool: DbPool, certificates: CertificateTable) -> Self {
        Self { pool, certificates }
    }

    /// Runs `call` exactly once on a blocking worker.
    ///
    /// Never fails: database and worker errors come back as
    /// [`ToolResult::Error`].
    pub async fn invoke(&self, call: &ToolCall) -> ToolResult {
        let tool = call.name();
        let pool = self.pool.clone();
        let certificates = self.certificates.clone();
        let owned_call = call.clone();

        tracing::info!(tool = tool.as_str(), "invoking tool");

        let outcome = tokio::task::spawn_blocking(move || {
            let conn = pool.get()?;
            let now = chrono::Local::now().naive_local();
            run_tool(&conn, &owned_call, &certificates, now)
        })
        .await;

        match outcome {
            Ok(Ok(result)) => {
                tracing::info!(tool = tool.as_str(), "tool finished");
                result
            }
            Ok(Err(e)) => {
                tracing::warn!(tool = tool.as_str(), error = %e, "tool failed");
                ToolResult::Error(format!("Error running {}: {}", tool, e))
            }
            Err(e) => {
                tracing::error!(tool = tool.as_str(), error = %e, "tool worker panicked");
                ToolResult::Error(format!("Tool error: {}", e))
            }
        }
    }
}
