//! Appointment booking (`book_appointment_slot`).

use crate::error::ToolError;
use chrono::NaiveDateTime;
use nalam_types::{BookingConfirmation, UserContext};
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

/// Token handed to the first booking of each day.
pub const FIRST_TOKEN: i64 = 101;

/// Books a slot one hour after `now` for the given user.
///
/// Tokens count up per slot day starting at [`FIRST_TOKEN`]. The token read
/// and the insert share one immediate transaction: a concurrent booking waits
/// on the busy timeout for the write lock and then sees this token.
pub fn book_appointment_slot(
    conn: &Connection,
    user: &UserContext,
    reason: &str,
    now: NaiveDateTime,
) -> Result<BookingConfirmation, ToolError> {
    let slot = now + chrono::Duration::hours(1);
    let slot_day = slot.format("%Y-%m-%d").to_string();

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let token: i64 = tx.query_row(
        "SELECT COALESCE(MAX(token_number) + 1, ?2) FROM appointments
         WHERE substr(slot_time, 1, 10) = ?1",
        params![slot_day, FIRST_TOKEN],
        |row| row.get(0),
    )?;
    tx.execute(
        "INSERT INTO appointments (user_uniqueid, service_requested, token_number, slot_time)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            user.uniqueid,
            reason,
            token,
            slot.format("%Y-%m-%d %H:%M:%S").to_string()
        ],
    )?;
    tx.commit()?;

    tracing::info!(token, user = user.uniqueid, "appointment booked");
    Ok(BookingConfirmation::new(
        token,
        slot.format("%I:%M %p").to_string(),
        reason,
    ))
}
