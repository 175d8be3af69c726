//! User profile lookup (`get_user_context`).

use crate::error::ToolError;
use nalam_types::UserContext;
use rusqlite::types::ValueRef;
use rusqlite::Connection;

/// Outcome reported when the profile table is empty.
pub const NO_USER_LOGGED_IN: &str = "No user logged in.";

/// Reads the single profile row of the user at the kiosk.
///
/// Every column other than `name` and `uniqueid` is a document; it counts as
/// held when its value is non-null. Returns `Ok(None)` when nobody is
/// signed in.
pub fn get_user_context(conn: &Connection) -> Result<Option<UserContext>, ToolError> {
    let mut stmt = conn.prepare("SELECT * FROM app_main ORDER BY rowid LIMIT 1")?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut rows = stmt.query([])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };

    let mut name = None;
    let mut uniqueid = None;
    let mut documents = Vec::new();

    for (idx, column) in columns.iter().enumerate() {
        match column.as_str() {
            "name" => name = Some(row.get::<_, String>(idx)?),
            "uniqueid" => uniqueid = Some(row.get::<_, i64>(idx)?),
            _ => {
                if !matches!(row.get_ref(idx)?, ValueRef::Null) {
                    documents.push(column.clone());
                }
            }
        }
    }

    Ok(Some(UserContext {
        name: name.ok_or(ToolError::MalformedProfile("name"))?,
        uniqueid: uniqueid.ok_or(ToolError::MalformedProfile("uniqueid"))?,
        documents,
    }))
}
