//! Schema steps for the study store.
//!
//! # Invariants
//! - Step versions start at 1 and increase by exactly 1.
//! - Pending steps run in one transaction; `user_version` is bumped after
//!   each step inside it, so a failure leaves the previous version intact.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STUDY_SCHEMA: &[Migration] = &[
    Migration {
        version: 1,
        name: "subjects_contents_history",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "review_queue_indexes",
        sql: include_str!("0002_review_indexes.sql"),
    },
];

/// Outcome of bringing one connection up to date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    /// Versions applied by this call, in order.
    pub applied: Vec<u32>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Latest schema version this build knows how to create.
pub fn latest_version() -> u32 {
    STUDY_SCHEMA.len() as u32
}

/// Reads the schema version stored in the connection.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))
        .map_err(DbError::Connection)
}

/// Applies every pending schema step on the connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<MigrationReport> {
    migrate(conn, STUDY_SCHEMA)
}

fn migrate(conn: &mut Connection, steps: &[Migration]) -> DbResult<MigrationReport> {
    let from_version = schema_version(conn)?;
    let supported = steps.last().map_or(0, |step| step.version);
    if from_version > supported {
        return Err(DbError::SchemaTooNew {
            found: from_version,
            supported,
        });
    }

    let pending: Vec<&Migration> = steps
        .iter()
        .filter(|step| step.version > from_version)
        .collect();
    if pending.is_empty() {
        return Ok(MigrationReport {
            from_version,
            to_version: from_version,
            applied: Vec::new(),
        });
    }

    let tx = conn.transaction().map_err(DbError::Connection)?;
    for step in &pending {
        let failed = |source| DbError::Migration {
            version: step.version,
            name: step.name,
            source,
        };
        tx.execute_batch(step.sql).map_err(failed)?;
        tx.pragma_update(None, "user_version", step.version)
            .map_err(failed)?;
        debug!(
            "event=db_migration_step module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit().map_err(DbError::Connection)?;

    let report = MigrationReport {
        from_version,
        to_version: supported,
        applied: pending.iter().map(|step| step.version).collect(),
    };
    info!(
        "event=db_migrate module=db status=ok from={} to={} steps={}",
        report.from_version,
        report.to_version,
        report.applied.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::{latest_version, migrate, schema_version, Migration, STUDY_SCHEMA};
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn schema_versions_are_contiguous() {
        for (index, step) in STUDY_SCHEMA.iter().enumerate() {
            assert_eq!(step.version as usize, index + 1, "step {}", step.name);
        }
        assert_eq!(latest_version(), 2);
    }

    #[test]
    fn fresh_connection_applies_every_step() {
        let mut conn = Connection::open_in_memory().unwrap();
        let report = migrate(&mut conn, STUDY_SCHEMA).unwrap();
        assert_eq!(report.from_version, 0);
        assert_eq!(report.to_version, latest_version());
        assert_eq!(report.applied, vec![1, 2]);

        let again = migrate(&mut conn, STUDY_SCHEMA).unwrap();
        assert!(again.is_noop());
        assert_eq!(again.to_version, latest_version());
    }

    #[test]
    fn failing_step_reports_its_version_and_rolls_back() {
        let steps = [
            Migration {
                version: 1,
                name: "ok",
                sql: "CREATE TABLE kept (id INTEGER);",
            },
            Migration {
                version: 2,
                name: "broken",
                sql: "CREATE TABLE nope (;",
            },
        ];
        let mut conn = Connection::open_in_memory().unwrap();

        match migrate(&mut conn, &steps).unwrap_err() {
            DbError::Migration { version, name, .. } => {
                assert_eq!(version, 2);
                assert_eq!(name, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(schema_version(&conn).unwrap(), 0);
        let kept: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'kept';",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(kept, 0);
    }
}
