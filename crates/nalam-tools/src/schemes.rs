//! Scheme eligibility (`check_scheme_eligibility`).

use crate::error::ToolError;
use nalam_types::{EligibilityVerdict, UserContext};
use rusqlite::{params, Connection, OptionalExtension};

/// Outcome reported when no scheme name matches.
pub const SCHEME_NOT_FOUND: &str = "Scheme not found.";

/// Escapes `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'`
/// pattern, then wraps the text for a substring match.
pub(crate) fn like_substring(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Finds the scheme named `scheme_name` and compares its required documents
/// with the user's.
///
/// An exact name (ASCII case-insensitive) wins; otherwise the lowest-id
/// scheme whose name contains `scheme_name` is used.
///
/// Returns `Ok(None)` when no scheme matches.
pub fn check_scheme_eligibility(
    conn: &Connection,
    user: &UserContext,
    scheme_name: &str,
) -> Result<Option<EligibilityVerdict>, ToolError> {
    let scheme: Option<(String, String)> = conn
        .query_row(
            "SELECT name, required_docs FROM schemes
             WHERE name LIKE ?1 ESCAPE '\\'
             ORDER BY lower(name) = lower(?2) DESC, id
             LIMIT 1",
            params![like_substring(scheme_name), scheme_name],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let Some((name, required_json)) = scheme else {
        return Ok(None);
    };

    let required: Vec<String> = serde_json::from_str(&required_json)?;
    let mut missing: Vec<String> = Vec::new();
    for doc in required {
        if !user.documents.contains(&doc) && !missing.contains(&doc) {
            missing.push(doc);
        }
    }

    tracing::debug!(scheme = %name, missing = missing.len(), "computed scheme eligibility");
    Ok(Some(EligibilityVerdict::new(name, missing)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_substring("kisan"), "%kisan%");
        assert_eq!(like_substring("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}
