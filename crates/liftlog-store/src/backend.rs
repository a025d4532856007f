//! Shared SQLite handle
//!
//! One `SqliteBackend` is built at startup and passed by value (it is a cheap
//! clone) to the access check, the batch fetchers and the resolvers. Tests
//! build their own in-memory instance, so nothing is process-global.

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};

use liftlog_core::errors::{ExError, ExErrorKind};
use liftlog_core::{OwnershipPath, OwnershipReader, RowId, UserId};
use rusqlite::Connection;

use crate::db;
use crate::errors::{io_error, poisoned, Result};
use crate::migrations::apply_migrations;
use crate::ownership;

#[derive(Clone)]
pub struct SqliteBackend {
    conn: Arc<Mutex<Connection>>,
}

impl fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteBackend").finish_non_exhaustive()
    }
}

impl SqliteBackend {
    /// Open (creating if needed) a database file and bring its schema up to date
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| io_error("create_db_dir", e))?;
            }
        }

        let mut conn = db::open(path)?;
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Fresh migrated in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let mut conn = db::open_in_memory()?;
        db::configure(&conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already configured connection. Migrations are not applied.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `f` with exclusive access to the connection on the current thread
    pub fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().map_err(|_| poisoned())?;
        f(&mut conn)
    }

    /// Run `f` on the blocking pool so async callers never stall the runtime
    pub async fn run_blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let backend = self.clone();
        tokio::task::spawn_blocking(move || backend.with_conn(f))
            .await
            .map_err(|e| {
                ExError::new(ExErrorKind::Internal)
                    .with_op("spawn_blocking")
                    .with_message(e.to_string())
            })?
    }
}

impl OwnershipReader for SqliteBackend {
    fn owns(
        &self,
        path: &OwnershipPath,
        principal: UserId,
        resource: RowId,
    ) -> std::result::Result<bool, ExError> {
        self.with_conn(|conn| ownership::owns(conn, path, principal, resource))
    }
}
