// SPDX-FileCopyrightText: 2026 Civic Connect Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements run on tokio-rusqlite's single background thread, so each
//! `call()` closure executes without interleaving with any other request.
//! Do NOT open additional connections for writes.

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use civic_config::model::StorageConfig;
use civic_core::{AdapterType, CivicError, HealthStatus, PluginAdapter};
use tracing::{debug, info};

use crate::migrations;

/// Handle to the application database.
///
/// Cheap to clone; every clone talks to the same background connection.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
    path: String,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").field("path", &self.path).finish()
    }
}

impl Database {
    /// Open (or create) the database at `path` with WAL enabled and run migrations.
    pub async fn open(path: &str) -> Result<Self, CivicError> {
        Self::open_with(&StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        })
        .await
    }

    /// Open the database described by `config` and run migrations.
    pub async fn open_with(config: &StorageConfig) -> Result<Self, CivicError> {
        let path = config.database_path.clone();
        if let Some(parent) = Path::new(&path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(CivicError::storage)?;
        }

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(CivicError::storage)?;

        let wal_mode = config.wal_mode;
        conn.call(move |conn| -> Result<(), CivicError> {
            if wal_mode {
                let mode: String = conn
                    .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                    .map_err(CivicError::storage)?;
                debug!(journal_mode = %mode, "journal mode set");
            }
            conn.execute_batch(
                "PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA foreign_keys = ON;",
            )
            .map_err(CivicError::storage)?;
            migrations::run_migrations(conn)
        })
        .await
        .map_err(|e| match e {
            tokio_rusqlite::Error::Error(inner) => inner,
            other => CivicError::Internal(format!("database open failed: {other}")),
        })?;

        info!(path = %path, wal_mode, "database opened");
        Ok(Self { conn, path })
    }

    /// The underlying tokio-rusqlite connection used by query modules.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Filesystem path of the database.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), CivicError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        self.conn.close().await.map_err(CivicError::storage)
    }
}

#[async_trait]
impl PluginAdapter for Database {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, CivicError> {
        let result = self
            .conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await;
        Ok(match result {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }
}

/// Convert a tokio-rusqlite error into [`CivicError::Storage`].
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> CivicError {
    CivicError::storage(e)
}

/// Parse a TEXT column into one of the closed domain enums.
pub(crate) fn parse_column<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    T::from_str(&value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
