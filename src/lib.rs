//! Core library surface for the Name Book TUI: a single screen for adding,
//! editing, and deleting names in a local SQLite file, plus verbatim export
//! and import of that file.
pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod transfer;
pub mod ui;

/// Persistence entry points used by `main.rs` and the integration tests.
pub use db::{ensure_schema, Store};

pub use config::{Config, Platform};
pub use controller::{Controller, RecordList, Submitted, TransferReport};
pub use error::{AppError, ErrorKind, Result};
pub use models::Record;
pub use transfer::{CancelToken, ShareTarget, SystemShare};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
