use rusqlite::{params, Connection};
use tracing::debug;

use crate::error::{ResultExt, Result};
use crate::models::Record;

/// Retrieve every record in table scan order. No `ORDER BY` is applied: the
/// scan of a rowid table already yields ids in ascending order, which is the
/// order the list has always shown.
pub fn list_all(conn: &Connection) -> Result<Vec<Record>> {
    let mut stmt = conn
        .prepare("SELECT id, name FROM names")
        .context("failed to prepare name query")?;

    let records = stmt
        .query_map([], |row| {
            Ok(Record {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })
        .context("failed to load names")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to collect names")?;

    debug!(count = records.len(), "listed names");
    Ok(records)
}

/// Insert a new row and return the hydrated record so the caller can push it
/// straight into the in-memory list.
pub fn insert(conn: &Connection, name: &str) -> Result<Record> {
    conn.execute("INSERT INTO names (name) VALUES (?1)", params![name])
        .context("failed to insert name")?;

    let id = conn.last_insert_rowid();
    Ok(Record::new(id, name))
}

/// Rewrite the name of an existing row. Returns the number of rows touched.
pub fn update(conn: &Connection, id: i64, name: &str) -> Result<usize> {
    conn.execute(
        "UPDATE names SET name = ?1 WHERE id = ?2",
        params![name, id],
    )
    .context("failed to update name")
}

/// Remove a row. Returns the number of rows touched.
pub fn delete(conn: &Connection, id: i64) -> Result<usize> {
    conn.execute("DELETE FROM names WHERE id = ?1", params![id])
        .context("failed to delete name")
}
