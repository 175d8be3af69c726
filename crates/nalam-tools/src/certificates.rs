//! Certificate lookup (`fetch_certificates`).

use crate::error::ToolError;
use crate::schemes::like_substring;
use nalam_types::UserContext;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, Rows};
use serde_json::{Map, Value};

/// Outcome reported when the user has no matching certificates.
pub const NO_CERTIFICATES: &str = "No certificates found for this user.";

/// Maximum rows returned by one lookup.
const MAX_CERTIFICATES: usize = 10;

/// Name of the table holding certificate rows.
///
/// The name is interpolated into SQL, so it is validated once at
/// construction: ASCII letters, digits and underscores, not starting with a
/// digit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateTable(String);

impl CertificateTable {
    pub fn new(name: impl Into<String>) -> Result<Self, ToolError> {
        let name = name.into();
        let valid = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            Ok(Self(name))
        } else {
            Err(ToolError::InvalidTableName(name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CertificateTable {
    fn default() -> Self {
        Self("certificates".to_string())
    }
}

/// Returns up to ten certificate rows for the user, oldest first,
/// optionally filtered by a case-insensitive substring of `type`.
pub fn fetch_certificates(
    conn: &Connection,
    table: &CertificateTable,
    user: &UserContext,
    certificate_type: Option<&str>,
) -> Result<Vec<Map<String, Value>>, ToolError> {
    let filter = if certificate_type.is_some() {
        " AND type LIKE ?2 ESCAPE '\\'"
    } else {
        ""
    };
    let sql = format!(
        "SELECT * FROM {} WHERE user_uniqueid = ?1{} ORDER BY rowid LIMIT {}",
        table.as_str(),
        filter,
        MAX_CERTIFICATES
    );

    let mut stmt = conn.prepare(&sql)?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let rows = match certificate_type {
        Some(kind) => stmt.query(params![user.uniqueid, like_substring(kind)])?,
        None => stmt.query(params![user.uniqueid])?,
    };
    rows_to_json(rows, &columns)
}

fn rows_to_json(
    mut rows: Rows<'_>,
    columns: &[String],
) -> Result<Vec<Map<String, Value>>, ToolError> {
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = Map::new();
        for (idx, column) in columns.iter().enumerate() {
            record.insert(column.clone(), value_to_json(row.get_ref(idx)?));
        }
        out.push(record);
    }
    Ok(out)
}

fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(format!("<{} bytes>", b.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_are_validated() {
        assert!(CertificateTable::new("user_certificates").is_ok());
        assert!(CertificateTable::new("_certs2").is_ok());
        assert!(CertificateTable::new("").is_err());
        assert!(CertificateTable::new("2certs").is_err());
        assert!(CertificateTable::new("certs; DROP TABLE app_main").is_err());
    }

    #[test]
    fn sqlite_values_map_to_json() {
        assert_eq!(value_to_json(ValueRef::Null), Value::Null);
        assert_eq!(value_to_json(ValueRef::Integer(7)), Value::from(7));
        assert_eq!(
            value_to_json(ValueRef::Text(b"income")),
            Value::String("income".into())
        );
        assert_eq!(
            value_to_json(ValueRef::Blob(&[1, 2, 3])),
            Value::String("<3 bytes>".into())
        );
    }
}
