//! Domain model mirroring the single `names` table. The type stays a plain
//! data holder so the store, the in-memory list, and the view can pass it
//! around freely.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
/// One row of the store.
pub struct Record {
    /// Primary key assigned by SQLite. Never changes after insert, and edit and
    /// delete flows hand it back to the persistence layer.
    pub id: i64,
    /// The user-entered name.
    pub name: String,
}

impl Record {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for Record {
    /// Write the name so the type can be handed to Ratatui widgets directly.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
