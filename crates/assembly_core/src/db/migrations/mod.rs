//! Versioned schema steps for the voting store.
//!
//! Each step runs inside the same transaction as the `PRAGMA user_version`
//! bump that records it, so a database is always at exactly one known
//! version.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "init",
        sql: include_str!("0001_init.sql"),
    },
    SchemaStep {
        version: 2,
        name: "vote_lookup_index",
        sql: include_str!("0002_vote_lookup_index.sql"),
    },
];

/// Versions before and after a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    pub applied: usize,
}

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    newest(SCHEMA_STEPS)
}

/// Brings `conn` up to [`latest_version`].
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer build.
/// - `Migration` naming the step whose SQL failed; nothing is committed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<MigrationReport> {
    upgrade(conn, SCHEMA_STEPS)
}

fn newest(steps: &[SchemaStep]) -> u32 {
    steps.iter().map(|step| step.version).max().unwrap_or(0)
}

fn upgrade(conn: &mut Connection, steps: &[SchemaStep]) -> DbResult<MigrationReport> {
    let from_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let target = newest(steps);
    if from_version > target {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: target,
        });
    }

    let pending: Vec<&SchemaStep> = steps
        .iter()
        .filter(|step| step.version > from_version)
        .collect();
    if pending.is_empty() {
        return Ok(MigrationReport {
            from_version,
            to_version: from_version,
            applied: 0,
        });
    }

    let tx = conn.transaction()?;
    for step in &pending {
        tx.execute_batch(step.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", step.version))
            .map_err(|source| DbError::Migration {
                version: step.version,
                name: step.name,
                source,
            })?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={from_version} to_version={target} applied={}",
        pending.len()
    );
    Ok(MigrationReport {
        from_version,
        to_version: target,
        applied: pending.len(),
    })
}
