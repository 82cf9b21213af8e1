// SPDX-FileCopyrightText: 2026 Leadflow Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Do NOT create additional Connection instances for writes.

use leadflow_core::LeadflowError;
use tracing::debug;

use crate::migrations;

/// Handle to the single-writer SQLite connection.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the database at `path`.
    ///
    /// Migrations and persistent pragmas run first on a short-lived blocking
    /// connection; the async single-writer connection is opened afterwards
    /// with its per-connection pragmas applied.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, LeadflowError> {
        let prep_path = path.to_string();
        tokio::task::spawn_blocking(move || prepare_database(&prep_path, wal_mode))
            .await
            .map_err(|e| LeadflowError::Storage {
                source: Box::new(e),
            })??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| LeadflowError::Storage {
                source: Box::new(e),
            })?;

        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA synchronous = NORMAL;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, "database opened");
        Ok(Self { conn })
    }

    /// Returns the underlying async connection for query modules.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }
}

/// Runs migrations and sets persistent pragmas on a blocking connection.
fn prepare_database(path: &str, wal_mode: bool) -> Result<(), LeadflowError> {
    let mut conn = rusqlite::Connection::open(path).map_err(|e| LeadflowError::Storage {
        source: Box::new(e),
    })?;

    if wal_mode {
        // journal_mode is a property of the database file and persists.
        conn.pragma_update(None, "journal_mode", "wal")
            .map_err(|e| LeadflowError::Storage {
                source: Box::new(e),
            })?;
    }

    migrations::run_migrations(&mut conn)
}

/// Maps a tokio-rusqlite error into the workspace error type.
pub fn map_tr_err(e: tokio_rusqlite::Error) -> LeadflowError {
    LeadflowError::Storage {
        source: Box::new(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_database_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("open.db");
        let _db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn open_applies_wal_mode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();

        let mode: String = db
            .connection()
            .call(|conn| {
                let mode = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
                Ok::<_, rusqlite::Error>(mode)
            })
            .await
            .unwrap();
        assert_eq!(mode, "wal");
    }

    #[tokio::test]
    async fn open_twice_on_same_file_succeeds() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reopen.db");
        {
            let _db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        }
        let _db = Database::open(path.to_str().unwrap(), true).await.unwrap();
    }
}
