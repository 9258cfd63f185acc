//! Schema steps and layout checks for the session database.
//!
//! # Invariants
//! - Step versions increase strictly; `PRAGMA user_version` records the last
//!   applied step.
//! - Pending steps run in one transaction.
//! - Every open re-checks the columns the store binds by name, whatever
//!   version the file claims.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::{Connection, Transaction};

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    name: "sessions",
    sql: include_str!("0001_sessions.sql"),
}];

/// Columns `SqliteSessionStore` binds, per table.
const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[(
    "sessions",
    &["id", "document", "created_at", "updated_at"],
)];

/// Highest schema version this build can produce.
pub fn latest_version() -> u32 {
    STEPS.iter().map(|step| step.version).max().unwrap_or(0)
}

/// Version recorded in `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Brings `conn` to the latest schema, then verifies the table layout.
///
/// # Errors
/// - `SchemaTooNew` when the file is ahead of this build.
/// - `MissingColumns` when a table does not match what the store expects.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = schema_version(conn)?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    let pending: Vec<&SchemaStep> = STEPS.iter().filter(|step| step.version > found).collect();
    if !pending.is_empty() {
        let tx = conn.transaction()?;
        for step in &pending {
            run_step(&tx, step)?;
        }
        tx.commit()?;
        info!(
            "event=db_migrate module=db status=ok from={found} to={supported} steps={}",
            pending.len()
        );
    }

    verify_layout(conn)
}

/// Checks that every table the store uses carries its required columns.
pub fn verify_layout(conn: &Connection) -> DbResult<()> {
    for &(table, required) in REQUIRED_COLUMNS {
        let present = table_columns(conn, table)?;
        let missing: Vec<&'static str> = required
            .iter()
            .copied()
            .filter(|column| !present.iter().any(|name| name == column))
            .collect();
        if !missing.is_empty() {
            return Err(DbError::MissingColumns {
                table,
                columns: missing,
            });
        }
    }
    Ok(())
}

fn run_step(tx: &Transaction<'_>, step: &SchemaStep) -> DbResult<()> {
    debug!(
        "event=db_migrate module=db status=apply version={} step={}",
        step.version, step.name
    );
    tx.execute_batch(step.sql)?;
    tx.pragma_update(None, "user_version", step.version)?;
    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let names = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}
