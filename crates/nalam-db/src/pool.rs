//! SQLite pool for the kiosk's citizen-services store.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

/// Connection tunables taken from `[database]` in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// How long a writer waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 4,
        }
    }
}

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to create database connection pool: {0}")]
    PoolInit(#[from] r2d2::Error),
}

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location<'a> {
    /// Private to each pooled connection.
    Memory,
    File(&'a str),
}

impl<'a> Location<'a> {
    fn parse(path: &'a str) -> Self {
        if path == ":memory:" {
            Location::Memory
        } else {
            Location::File(path)
        }
    }
}

/// Applied to every new connection. A file store must accept WAL so the
/// HTTP handlers can read while a booking is being written.
fn prepare(conn: &mut Connection, busy_timeout_ms: u64, wal: bool) -> rusqlite::Result<()> {
    if wal {
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
        if !mode.eq_ignore_ascii_case("wal") {
            return Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                Some(format!("journal_mode stayed {mode}, expected wal")),
            ));
        }
    }
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.pragma_update(None, "busy_timeout", busy_timeout_ms)?;
    Ok(())
}

/// Opens (creating if needed) the store at `db_path` and returns a pool.
///
/// `db_path` may be `:memory:`, but every pooled connection then sees its own
/// private database; tests that share state across connections should use a
/// file in a temporary directory instead.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    let location = Location::parse(db_path);
    let busy_timeout_ms = settings.busy_timeout_ms;

    let manager = match location {
        Location::Memory => SqliteConnectionManager::memory()
            .with_init(move |conn| prepare(conn, busy_timeout_ms, false)),
        Location::File(path) => SqliteConnectionManager::file(path)
            .with_flags(
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
            )
            .with_init(move |conn| prepare(conn, busy_timeout_ms, true)),
    };

    let pool = Pool::builder()
        .max_size(settings.pool_max_size)
        .build(manager)?;

    tracing::debug!(
        path = db_path,
        max_size = settings.pool_max_size,
        "database pool ready"
    );

    Ok(pool)
}
