//! Connection bootstrap for the study store.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`, so deleting a subject
//!   cascades to its contents and their study events.
//! - Returned connections have migrations fully applied.

use super::migrations::{apply_migrations, MigrationReport};
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) a study database file and migrates it.
///
/// # Side effects
/// - Creates the file when missing.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_with("file", || Connection::open(path))
}

/// Opens a migrated in-memory study database.
///
/// Each call yields an independent, empty store.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

fn open_with(
    mode: &'static str,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    match open().map_err(DbError::Connection).and_then(bootstrap_connection) {
        Ok((conn, report)) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={} schema_version={} migrated={}",
                started_at.elapsed().as_millis(),
                report.to_version,
                !report.is_noop()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code={} error={err}",
                started_at.elapsed().as_millis(),
                err.error_code()
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(mut conn: Connection) -> DbResult<(Connection, MigrationReport)> {
    conn.pragma_update(None, "foreign_keys", true)
        .map_err(DbError::Connection)?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(DbError::Connection)?;
    let report = apply_migrations(&mut conn)?;
    Ok((conn, report))
}
