use std::path::{Path, PathBuf};

use directories::BaseDirs;

use crate::error::{AppError, Result};

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".name-book";
/// Subfolder holding the database, kept apart from logs.
const STORE_DIR_NAME: &str = "SQLite";
/// SQLite file name. Exports reuse it verbatim.
pub const STORE_FILE_NAME: &str = "names.db";
/// Log file written next to the store folder.
const LOG_FILE_NAME: &str = "name-book.log";

/// How the host lets us hand files to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Writes outside the app sandbox need a folder the user explicitly grants.
    Restricted,
    /// The store file can be handed straight to the OS.
    Unrestricted,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(any(target_os = "android", target_os = "ios")) {
            Platform::Restricted
        } else {
            Platform::Unrestricted
        }
    }
}

/// Resolved locations and platform policy for a run.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub platform: Platform,
}

impl Config {
    /// Locate the data directory inside the user's home.
    pub fn discover() -> Result<Self> {
        let base_dirs = BaseDirs::new().ok_or_else(|| AppError::Io {
            context: "could not locate home directory".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })?;
        Ok(Self::with_data_dir(base_dirs.home_dir().join(DATA_DIR_NAME)))
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            platform: Platform::current(),
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_DIR_NAME).join(STORE_FILE_NAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }
}

/// Expand a leading `~` in user-typed paths.
pub fn expand_home(input: &str) -> PathBuf {
    let trimmed = input.trim();
    let rest = match trimmed.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(is_separator) => rest,
        _ => return PathBuf::from(trimmed),
    };
    match BaseDirs::new() {
        Some(dirs) => dirs
            .home_dir()
            .join(rest.trim_start_matches(is_separator)),
        None => PathBuf::from(trimmed),
    }
}

fn is_separator(ch: char) -> bool {
    ch == '/' || ch == '\\'
}

/// File name used for exports, taken from the store path.
pub fn export_file_name(store_path: &Path) -> &std::ffi::OsStr {
    store_path
        .file_name()
        .unwrap_or_else(|| std::ffi::OsStr::new(STORE_FILE_NAME))
}
