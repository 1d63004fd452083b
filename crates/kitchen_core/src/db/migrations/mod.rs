//! Ordered schema scripts and their executor.
//!
//! # Invariants
//! - Script versions are strictly increasing.
//! - All pending scripts commit together or not at all.

use crate::db::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;

/// (version, script) pairs in apply order.
const MIGRATIONS: &[(u32, &str)] = &[(1, include_str!("0001_orders.sql"))];

/// Highest schema version this build can produce.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |(version, _)| *version)
}

/// Brings the schema up to `latest_version()`.
///
/// An up-to-date database is left untouched; a newer one is rejected.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version = current_user_version(conn)?;
    let latest = latest_version();

    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }
    if from_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, script) in MIGRATIONS
        .iter()
        .copied()
        .filter(|(version, _)| *version > from_version)
    {
        tx.execute_batch(script)
            .and_then(|()| tx.pragma_update(None, "user_version", version))
            .map_err(|source| {
                error!(
                    "event=db_migrate module=db status=error version={} error={}",
                    version, source
                );
                DbError::Migration { version, source }
            })?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        from_version, latest
    );
    Ok(())
}

/// Reads `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}
