//! Database layer for the Nalam kiosk.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization
//! and the embedded bootstrap schema for the kiosk's records: the user
//! profile (`app_main`), government schemes, appointments and certificates.
//!
//! Tool calls each take one pooled connection for their own duration; no
//! transaction spans more than one tool call.

mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
