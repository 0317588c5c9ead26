//! Moving the database file in and out of the app. Both directions are plain
//! byte copies. Export writes into the chosen folder, import stages the
//! picked file next to the store so the final swap is a single rename.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use crate::config::export_file_name;
use crate::error::{AppError, ResultExt, Result};

/// Bytes moved per read/write round. Cancellation is checked between chunks.
const CHUNK_SIZE: usize = 64 * 1024;
/// Suffix of the temporary file a copy writes before renaming into place.
const PARTIAL_SUFFIX: &str = ".part";
/// Suffix of the staged copy an import writes next to the store.
const STAGED_SUFFIX: &str = ".import";

/// Shared flag that asks an in-flight copy to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Somewhere the OS can take the store file off our hands.
pub trait ShareTarget {
    fn share(&self, path: &Path) -> Result<()>;
}

/// Hands the store's folder to the system file handler, which is the closest a
/// desktop gets to a share sheet.
pub struct SystemShare;

impl ShareTarget for SystemShare {
    fn share(&self, path: &Path) -> Result<()> {
        let target = path.parent().unwrap_or(path);
        open::that(target).context(format!("failed to open {}", target.display()))?;
        info!(path = %path.display(), "handed store to the system");
        Ok(())
    }
}

/// Copy `src` to `dst` byte for byte. Data goes to `dst.part` first and is
/// renamed onto `dst` only once complete, so a cancelled or failed copy never
/// leaves a truncated file behind.
pub fn copy_verbatim(src: &Path, dst: &Path, cancel: &CancelToken) -> Result<u64> {
    let partial = with_suffix(dst, PARTIAL_SUFFIX);
    match copy_chunks(src, &partial, cancel) {
        Ok(bytes) => {
            fs::rename(&partial, dst)
                .context(format!("failed to move copy into {}", dst.display()))?;
            Ok(bytes)
        }
        Err(err) => {
            match fs::remove_file(&partial) {
                Err(cleanup) if cleanup.kind() != io::ErrorKind::NotFound => {
                    warn!(path = %partial.display(), error = %cleanup, "failed to remove partial copy");
                }
                _ => {}
            }
            Err(err)
        }
    }
}

fn copy_chunks(src: &Path, dst: &Path, cancel: &CancelToken) -> Result<u64> {
    let mut reader =
        File::open(src).context(format!("failed to open {}", src.display()))?;
    let mut writer =
        File::create(dst).context(format!("failed to create {}", dst.display()))?;

    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        let read = reader
            .read(&mut buffer)
            .context(format!("failed to read {}", src.display()))?;
        if read == 0 {
            break;
        }
        writer
            .write_all(&buffer[..read])
            .context(format!("failed to write {}", dst.display()))?;
        total += read as u64;
    }
    writer
        .sync_all()
        .context(format!("failed to flush {}", dst.display()))?;
    Ok(total)
}

/// Copy the store into `dest_dir` under the store's own file name.
pub fn export_to_folder(store_path: &Path, dest_dir: &Path, cancel: &CancelToken) -> Result<PathBuf> {
    if !dest_dir.is_dir() {
        return Err(AppError::Io {
            context: format!("{} is not a folder", dest_dir.display()),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });
    }
    let destination = dest_dir.join(export_file_name(store_path));
    let bytes = copy_verbatim(store_path, &destination, cancel)?;
    info!(path = %destination.display(), bytes, "exported store");
    Ok(destination)
}

/// Copy a picked file next to the store, creating the store's folder if it is
/// missing. Returns the staged path for [`crate::db::Store::replace_file`].
pub fn stage_import(source: &Path, store_path: &Path, cancel: &CancelToken) -> Result<PathBuf> {
    if let Some(parent) = store_path.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }
    let staged = staged_path(store_path);
    let bytes = copy_verbatim(source, &staged, cancel)?;
    info!(source = %source.display(), bytes, "staged import");
    Ok(staged)
}

pub fn staged_path(store_path: &Path) -> PathBuf {
    with_suffix(store_path, STAGED_SUFFIX)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Which direction a background copy runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Export,
    Import,
}

/// A copy running on a worker thread. The UI polls [`TransferJob::is_finished`]
/// on every tick and joins once it reports done.
pub struct TransferJob {
    kind: TransferKind,
    cancel: CancelToken,
    handle: JoinHandle<Result<PathBuf>>,
}

impl TransferJob {
    pub fn spawn_export(store_path: PathBuf, dest_dir: PathBuf) -> Self {
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let handle = thread::spawn(move || export_to_folder(&store_path, &dest_dir, &token));
        Self {
            kind: TransferKind::Export,
            cancel,
            handle,
        }
    }

    pub fn spawn_import(source: PathBuf, store_path: PathBuf) -> Self {
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let handle = thread::spawn(move || stage_import(&source, &store_path, &token));
        Self {
            kind: TransferKind::Import,
            cancel,
            handle,
        }
    }

    pub fn kind(&self) -> TransferKind {
        self.kind
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the worker is done. Returns the exported file for exports
    /// and the staged file for imports.
    pub fn join(self) -> Result<PathBuf> {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => {
                warn!(kind = ?self.kind, "transfer worker panicked");
                Err(AppError::Io {
                    context: "transfer worker stopped unexpectedly".to_string(),
                    source: std::io::Error::other("worker panicked"),
                })
            }
        }
    }
}
