//! SQLite storage for task links.
//!
//! Connections are configured with:
//! - `foreign_keys = ON` so links to missing tasks or relations are rejected
//!   and deleting a task cascades to its link rows
//! - `journal_mode = WAL` for concurrent readers alongside one writer
//! - a busy timeout so competing `BEGIN IMMEDIATE` writers wait instead of
//!   failing straight away

pub mod migrations;
pub(crate) mod pair;
pub mod query;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::{path::Path, time::Duration};

use crate::config::EffectiveConfig;

/// Busy timeout used when no configuration is supplied.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the link database, apply runtime pragmas, and migrate the
/// schema to the latest version.
///
/// # Errors
///
/// Returns an error if opening/configuring/migrating the database fails.
pub fn open_store(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create link store directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("open link store database {}", path.display()))?;

    configure_connection(&conn, busy_timeout).context("configure sqlite pragmas")?;
    let _journal_mode: String = conn
        .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
        .context("enable WAL journal")?;
    let version = migrations::migrate(&mut conn).context("apply link store migrations")?;

    tracing::info!(path = %path.display(), schema_version = version, "opened link store");
    Ok(conn)
}

/// Open the database described by a resolved configuration.
///
/// # Errors
///
/// See [`open_store`].
pub fn open_from_config(config: &EffectiveConfig) -> Result<Connection> {
    open_store(&config.db_path, config.project.storage.busy_timeout())
}

/// Open a migrated in-memory database.
///
/// # Errors
///
/// Returns an error if configuring or migrating fails.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("open in-memory link store")?;
    configure_connection(&conn, DEFAULT_BUSY_TIMEOUT).context("configure sqlite pragmas")?;
    migrations::migrate(&mut conn).context("apply link store migrations")?;
    Ok(conn)
}

/// Apply the connection pragmas shared by file and in-memory stores.
///
/// # Errors
///
/// Returns an error if a pragma cannot be applied.
pub fn configure_connection(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.busy_timeout(busy_timeout)?;
    Ok(())
}
