//! Database schema migrations.

use rusqlite::Connection;
use tracing::info;

use crate::error::StorageError;

/// Apply every migration newer than the recorded schema version.
pub fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| StorageError::Database(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| StorageError::Database(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!(version = 1, "Applied migration: messages_and_results");
    }

    Ok(())
}

/// Version 1: message and action result tables.
fn apply_v1(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS messages (
            id              TEXT PRIMARY KEY NOT NULL,
            version         TEXT NOT NULL,
            created_date    INTEGER NOT NULL,
            created_by      TEXT NOT NULL,
            parent_id       TEXT,
            stage           TEXT NOT NULL
                            CHECK (stage IN ('dev', 'stage', 'prod')),
            message_type    TEXT NOT NULL,
            status          TEXT NOT NULL
                            CHECK (status IN ('created', 'queued', 'processing', 'completed', 'failed')),
            payload         TEXT NOT NULL DEFAULT 'null',
            arguments       TEXT NOT NULL DEFAULT '{}',
            updated_date    INTEGER NOT NULL,
            error_message   TEXT,
            retry_count     INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_messages_stage_created
            ON messages (stage, created_date DESC);

        CREATE INDEX IF NOT EXISTS idx_messages_status
            ON messages (status, created_date DESC);

        CREATE TABLE IF NOT EXISTS action_results (
            id                  TEXT PRIMARY KEY NOT NULL,
            message_id          TEXT NOT NULL,
            action              TEXT NOT NULL,
            url                 TEXT NOT NULL DEFAULT '',
            stage               TEXT NOT NULL,
            status              TEXT NOT NULL
                                CHECK (status IN ('pending', 'success', 'failure')),
            response_code       INTEGER,
            response_body       TEXT,
            error_message       TEXT,
            execution_time_ms   INTEGER NOT NULL DEFAULT 0,
            created_date        INTEGER NOT NULL,
            updated_date        INTEGER NOT NULL,
            ttl                 INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_action_results_message_id
            ON action_results (message_id, created_date DESC);

        CREATE INDEX IF NOT EXISTS idx_action_results_ttl
            ON action_results (ttl);

        INSERT INTO schema_migrations (version, name) VALUES (1, 'messages_and_results');
        ",
    )
    .map_err(|e| StorageError::Database(format!("Migration v1 failed: {}", e)))?;
    Ok(())
}
