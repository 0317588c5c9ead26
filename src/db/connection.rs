use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{info, warn};

use crate::error::{AppError, ResultExt, Result};
use crate::models::Record;

use super::records;

/// Create the `names` table if it is missing. Safe to run on every open.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS names (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create names table")?;
    Ok(())
}

/// The single owned handle to the on-disk database. Replacing the file goes
/// through `&mut self`, so nobody can observe the handle while it is closed
/// and the file is being swapped.
pub struct Store {
    path: PathBuf,
    conn: Option<Connection>,
}

impl Store {
    /// Make sure the containing folder exists, open the file, and ensure the
    /// schema. Any failure here is returned as-is so startup can abort.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }

        let conn = open_connection(&path)?;
        info!(path = %path.display(), "opened store");
        Ok(Self {
            path,
            conn: Some(conn),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Borrow the live connection, failing if the handle is closed.
    pub fn connection(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(AppError::StoreClosed)
    }

    /// Release the handle. Closing an already closed store is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            if let Err((conn, err)) = conn.close() {
                self.conn = Some(conn);
                return Err(err).context("failed to close database");
            }
            info!(path = %self.path.display(), "closed store");
        }
        Ok(())
    }

    /// Close the current handle (if any) and open a fresh one at the same path.
    /// On failure the store remains closed.
    pub fn reopen(&mut self) -> Result<()> {
        self.close()?;
        let conn = open_connection(&self.path)?;
        self.conn = Some(conn);
        Ok(())
    }

    /// Swap the database file for `staged` and reopen. The staged file is moved,
    /// not copied, so it must live on the same filesystem as the store.
    ///
    /// If the rename fails the old file is reopened before the error is
    /// returned. If the new file is not a usable database the store keeps a
    /// handle on it anyway; every later query then fails with a storage error
    /// until another import replaces it.
    pub fn replace_file(&mut self, staged: &Path) -> Result<()> {
        self.close()?;
        let moved = fs::rename(staged, &self.path)
            .context("failed to move imported database into place");
        if moved.is_err() {
            match open_connection(&self.path) {
                Ok(conn) => self.conn = Some(conn),
                Err(err) => warn!(error = %err, "failed to reopen store after aborted replace"),
            }
        }
        moved?;
        info!(path = %self.path.display(), "replaced store file");

        let conn = Connection::open(&self.path).context("failed to reopen database")?;
        let schema = ensure_schema(&conn);
        self.conn = Some(conn);
        if let Err(err) = &schema {
            warn!(error = %err, "imported file is not a usable database");
        }
        schema
    }

    pub fn list_all(&self) -> Result<Vec<Record>> {
        records::list_all(self.connection()?)
    }

    pub fn insert(&self, name: &str) -> Result<Record> {
        records::insert(self.connection()?, name)
    }

    pub fn update(&self, id: i64, name: &str) -> Result<usize> {
        records::update(self.connection()?, id, name)
    }

    pub fn delete(&self, id: i64) -> Result<usize> {
        records::delete(self.connection()?, id)
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).context("failed to open SQLite database")?;
    ensure_schema(&conn)?;
    Ok(conn)
}
