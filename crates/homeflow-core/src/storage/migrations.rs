//! Database schema migrations.
//!
//! Migrations are versioned and applied when the database is opened. The
//! `schema_version` table tracks the current version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Bring the database to [`SCHEMA_VERSION`].
///
/// # Errors
/// Returns an error if a migration statement fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Current schema version; 0 for a fresh database.
pub fn get_schema_version(conn: &Connection) -> SqliteResult<i32> {
    match conn.query_row("SELECT version FROM schema_version", [], |row| row.get::<_, i32>(0)) {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// v1: every record is stored as JSON next to the columns it is queried by.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tasks (
            id   TEXT PRIMARY KEY,
            room TEXT,
            data TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS custom_tasks (
            id    TEXT PRIMARY KEY,
            owner TEXT NOT NULL,
            data  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS rooms (
            id      TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            kind    TEXT NOT NULL,
            data    TEXT NOT NULL,
            UNIQUE(user_id, kind)
        );

        CREATE TABLE IF NOT EXISTS activity_logs (
            seq        INTEGER PRIMARY KEY AUTOINCREMENT,
            id         TEXT NOT NULL UNIQUE,
            user_id    TEXT NOT NULL,
            task_id    TEXT NOT NULL,
            start_time TEXT NOT NULL,
            completed  INTEGER NOT NULL DEFAULT 0,
            data       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS user_progress (
            user_id TEXT PRIMARY KEY,
            data    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS user_patterns (
            user_id TEXT PRIMARY KEY,
            data    TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_room ON tasks(room);
        CREATE INDEX IF NOT EXISTS idx_custom_tasks_owner ON custom_tasks(owner);
        CREATE INDEX IF NOT EXISTS idx_logs_user_start ON activity_logs(user_id, start_time);
        CREATE INDEX IF NOT EXISTS idx_logs_user_completed ON activity_logs(user_id, completed, start_time);",
    )?;

    set_schema_version(conn, 1)
}
