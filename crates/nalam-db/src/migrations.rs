//! Schema bootstrap for the kiosk store.
//!
//! Each step is a SQL file compiled into the binary. The number of steps
//! already applied is kept in `PRAGMA user_version`, so a store created by
//! an older build is brought forward on startup and a current one is left
//! untouched.

use rusqlite::{Connection, TransactionBehavior};
use thiserror::Error;

/// One schema step. Its version is its position in [`STEPS`] plus one.
struct Step {
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[Step] = &[
    Step {
        name: "001_app_main",
        sql: include_str!("migrations/001_app_main.sql"),
    },
    Step {
        name: "002_schemes",
        sql: include_str!("migrations/002_schemes.sql"),
    },
    Step {
        name: "003_appointments",
        sql: include_str!("migrations/003_appointments.sql"),
    },
    Step {
        name: "004_certificates",
        sql: include_str!("migrations/004_certificates.sql"),
    },
];

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migration '{name}' failed: {source}")]
    ExecutionFailed {
        name: String,
        source: rusqlite::Error,
    },

    #[error("failed to read schema version: {0}")]
    StateQuery(rusqlite::Error),

    /// The store was written by a newer build than this one.
    #[error("database schema version {found} is newer than supported version {supported}")]
    TooNew { found: usize, supported: usize },
}

fn schema_version(conn: &Connection) -> Result<usize, MigrationError> {
    let version: i64 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .map_err(MigrationError::StateQuery)?;
    Ok(usize::try_from(version).unwrap_or(0))
}

/// Brings the schema up to date and returns how many steps this call applied.
pub fn run_migrations(conn: &mut Connection) -> Result<usize, MigrationError> {
    apply_steps(conn, STEPS)
}

fn apply_steps(conn: &mut Connection, steps: &[Step]) -> Result<usize, MigrationError> {
    let current = schema_version(conn)?;
    if current > steps.len() {
        return Err(MigrationError::TooNew {
            found: current,
            supported: steps.len(),
        });
    }

    for (index, step) in steps.iter().enumerate().skip(current) {
        let version = index + 1;
        tracing::info!(migration = step.name, version, "applying migration");

        let failed = |source| MigrationError::ExecutionFailed {
            name: step.name.to_string(),
            source,
        };

        // The version bump commits together with the step's DDL.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(failed)?;
        tx.execute_batch(step.sql).map_err(failed)?;
        tx.pragma_update(None, "user_version", version as i64)
            .map_err(failed)?;
        tx.commit().map_err(failed)?;
    }

    Ok(steps.len() - current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Connection {
        Connection::open_in_memory().unwrap()
    }

    #[test]
    fn fresh_store_reaches_latest_version() {
        let mut conn = fresh();
        assert_eq!(run_migrations(&mut conn).unwrap(), STEPS.len());
        assert_eq!(schema_version(&conn).unwrap(), STEPS.len());
    }

    #[test]
    fn second_run_applies_nothing() {
        let mut conn = fresh();
        run_migrations(&mut conn).unwrap();
        assert_eq!(run_migrations(&mut conn).unwrap(), 0);
    }

    #[test]
    fn partially_migrated_store_resumes() {
        let mut conn = fresh();
        apply_steps(&mut conn, &STEPS[..2]).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 2);

        assert_eq!(run_migrations(&mut conn).unwrap(), 2);
        let appointments: i64 = conn
            .query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(appointments, 0);
    }

    #[test]
    fn scheme_seeds_carry_json_document_lists() {
        let mut conn = fresh();
        run_migrations(&mut conn).unwrap();

        let docs: String = conn
            .query_row(
                "SELECT required_docs FROM schemes WHERE name = 'PM Kisan Samman Nidhi'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        let docs: Vec<String> = serde_json::from_str(&docs).unwrap();
        assert!(docs.contains(&"land_record".to_string()));
    }

    #[test]
    fn failing_step_leaves_version_and_schema_unchanged() {
        let mut conn = fresh();
        let steps = [
            Step {
                name: "001_ok",
                sql: "CREATE TABLE first_table (id INTEGER PRIMARY KEY);",
            },
            Step {
                name: "002_broken",
                sql: "CREATE TABLE second_table (id INTEGER PRIMARY KEY);
                      INSERT INTO no_such_table VALUES (1);",
            },
        ];

        let err = apply_steps(&mut conn, &steps).unwrap_err();
        match err {
            MigrationError::ExecutionFailed { name, .. } => assert_eq!(name, "002_broken"),
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(schema_version(&conn).unwrap(), 1);
        let second_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE name = 'second_table')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(!second_exists);
    }

    #[test]
    fn store_from_newer_build_is_refused() {
        let mut conn = fresh();
        conn.pragma_update(None, "user_version", 99_i64).unwrap();
        assert!(matches!(
            run_migrations(&mut conn),
            Err(MigrationError::TooNew {
                found: 99,
                supported: 4
            })
        ));
    }
}
