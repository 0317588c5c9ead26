//! Error types shared by the store, the controller, and the transfer helpers.

use std::fmt;

use thiserror::Error;

/// Operations that occupy the single pending-operation slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Insert,
    Update,
    Delete,
    Refresh,
    Export,
    Import,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Operation::Insert => "adding a name",
            Operation::Update => "updating a name",
            Operation::Delete => "deleting a name",
            Operation::Refresh => "loading names",
            Operation::Export => "exporting the database",
            Operation::Import => "importing a database",
        };
        f.write_str(label)
    }
}

/// All failures the application can surface.
#[derive(Debug, Error)]
pub enum AppError {
    /// The draft failed validation before reaching the store.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The user declined to grant an export destination.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A SQLite statement failed.
    #[error("{context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A filesystem operation failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The store handle was closed and not yet reopened.
    #[error("Database is closed")]
    StoreClosed,

    /// A record id no longer exists in the store.
    #[error("Record not found: {0}")]
    NotFound(i64),

    /// Another operation still holds the pending-operation slot.
    #[error("Busy: still {0}")]
    Busy(Operation),

    /// A transfer was cancelled before it completed.
    #[error("Transfer cancelled")]
    Cancelled,
}

/// Coarse classification used by the view to decide how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    PermissionDenied,
    Storage,
    Busy,
    Cancelled,
}

/// Convenience alias that pins the error type to [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::Storage { .. } | Self::Io { .. } | Self::StoreClosed | Self::NotFound(_) => {
                ErrorKind::Storage
            }
            Self::Busy(_) => ErrorKind::Busy,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Returns a short, human-readable message for the status footer.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::PermissionDenied(msg) => msg.clone(),
            Self::Storage { context, source } => format!("Database error ({context}): {source}"),
            Self::Io { context, source } => format!("File error ({context}): {source}"),
            Self::StoreClosed => "Database is closed. Import a database to continue.".to_string(),
            Self::NotFound(id) => format!("Name #{id} no longer exists."),
            Self::Busy(op) => format!("Please wait, still {op}."),
            Self::Cancelled => "Transfer cancelled.".to_string(),
        }
    }
}

/// Attach context to lower-level failures, in the spirit of `anyhow::Context`.
pub trait ResultExt<T> {
    fn context<C: Into<String>>(self, context: C) -> Result<T>;
}

impl<T> ResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|source| AppError::Storage {
            context: context.into(),
            source,
        })
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context<C: Into<String>>(self, context: C) -> Result<T> {
        self.map_err(|source| AppError::Io {
            context: context.into(),
            source,
        })
    }
}
