//! Glue between the view and the store. Every user action lands here, runs
//! under the pending-operation guard, and leaves the in-memory list matching
//! what the store reports.

mod form;
mod guard;
mod list;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::db::Store;
use crate::error::{AppError, Operation, Result};
use crate::models::Record;
use crate::transfer::{
    export_to_folder, stage_import, CancelToken, ShareTarget, TransferJob, TransferKind,
};

pub use form::{Form, FormTarget, EMPTY_NAME_MESSAGE};
pub use guard::OperationGuard;
pub use list::RecordList;

/// Message used when the user dismisses the export folder prompt.
pub const PERMISSION_DENIED_MESSAGE: &str = "Permission not granted";

/// Result of a successful `submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitted {
    Added(Record),
    Updated(Record),
}

/// Result of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferReport {
    Exported(PathBuf),
    Imported { count: usize },
}

pub struct Controller {
    store: Store,
    records: RecordList,
    form: Form,
    guard: OperationGuard,
    transfer: Option<TransferJob>,
}

impl Controller {
    /// Wrap an opened store. The list starts empty until [`Controller::refresh`].
    pub fn new(store: Store) -> Self {
        Self {
            store,
            records: RecordList::default(),
            form: Form::default(),
            guard: OperationGuard::default(),
            transfer: None,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn records(&self) -> &RecordList {
        &self.records
    }

    pub fn form(&self) -> &Form {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut Form {
        &mut self.form
    }

    pub fn pending(&self) -> Option<Operation> {
        self.guard.pending()
    }

    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }

    /// Reload the list from the store.
    pub fn refresh(&mut self) -> Result<usize> {
        self.guarded(Operation::Refresh, |this| {
            let rows = this.store.list_all()?;
            let count = rows.len();
            this.records.replace_all(rows);
            Ok(count)
        })
    }

    /// Commit the draft: insert when adding, update when editing.
    pub fn submit(&mut self) -> Result<Submitted> {
        let name = self.form.validated()?;
        match self.form.target() {
            FormTarget::Add => self.guarded(Operation::Insert, |this| {
                let record = this.store.insert(&name)?;
                info!(id = record.id, "added name");
                this.records.append(record.clone());
                this.form.clear();
                Ok(Submitted::Added(record))
            }),
            FormTarget::Edit { id } => self.guarded(Operation::Update, |this| {
                let affected = this.store.update(id, &name)?;
                this.form.clear();
                if affected == 0 {
                    this.records.remove(id);
                    return Err(AppError::NotFound(id));
                }
                info!(id, "updated name");
                this.records.rename(id, &name);
                Ok(Submitted::Updated(Record::new(id, name)))
            }),
        }
    }

    /// Load the record's current name into the draft for editing.
    pub fn request_edit(&mut self, id: i64) -> Result<()> {
        if let Some(op) = self.guard.pending() {
            return Err(AppError::Busy(op));
        }
        let record = self.records.get(id).ok_or(AppError::NotFound(id))?;
        let name = record.name.clone();
        self.form.begin_edit(id, &name);
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.form.clear();
    }

    /// Delete a row. Returns the affected count; zero leaves the list alone.
    pub fn delete(&mut self, id: i64) -> Result<usize> {
        self.guarded(Operation::Delete, |this| {
            let affected = this.store.delete(id)?;
            if affected > 0 {
                info!(id, "deleted name");
                this.records.remove(id);
                if this.form.editing_id() == Some(id) {
                    this.form.clear();
                }
            }
            Ok(affected)
        })
    }

    /// The error to surface when the user refuses an export destination.
    pub fn decline_export(&self) -> AppError {
        warn!("export destination not granted");
        AppError::PermissionDenied(PERMISSION_DENIED_MESSAGE.to_string())
    }

    /// Hand the store file to the OS.
    pub fn share_store(&mut self, target: &dyn ShareTarget) -> Result<()> {
        self.guarded(Operation::Export, |this| target.share(this.store.path()))
    }

    /// Start copying the store into `dest_dir` on a worker thread.
    pub fn start_export(&mut self, dest_dir: PathBuf) -> Result<()> {
        self.guard.begin(Operation::Export)?;
        info!(dest = %dest_dir.display(), "starting export");
        self.transfer = Some(TransferJob::spawn_export(
            self.store.path().to_path_buf(),
            dest_dir,
        ));
        Ok(())
    }

    /// Start staging `source` next to the store on a worker thread. The live
    /// store is only touched once the copy is complete.
    pub fn start_import(&mut self, source: PathBuf) -> Result<()> {
        self.guard.begin(Operation::Import)?;
        info!(source = %source.display(), "starting import");
        self.transfer = Some(TransferJob::spawn_import(
            source,
            self.store.path().to_path_buf(),
        ));
        Ok(())
    }

    pub fn transfer_kind(&self) -> Option<TransferKind> {
        self.transfer.as_ref().map(TransferJob::kind)
    }

    /// Ask the running transfer to stop. Returns `false` when nothing runs.
    pub fn cancel_transfer(&self) -> bool {
        match &self.transfer {
            Some(job) => {
                job.cancel();
                true
            }
            None => false,
        }
    }

    /// Non-blocking: finish the transfer if its worker is done.
    pub fn poll_transfer(&mut self) -> Option<Result<TransferReport>> {
        if !self.transfer.as_ref().is_some_and(TransferJob::is_finished) {
            return None;
        }
        self.transfer.take().map(|job| self.finish_transfer(job))
    }

    /// Blocking: wait for the running transfer, if any, and finish it.
    pub fn wait_transfer(&mut self) -> Option<Result<TransferReport>> {
        self.transfer.take().map(|job| self.finish_transfer(job))
    }

    /// Copy the store into `dest_dir` on the calling thread.
    pub fn export_to(&mut self, dest_dir: &Path, cancel: &CancelToken) -> Result<PathBuf> {
        self.guarded(Operation::Export, |this| {
            export_to_folder(this.store.path(), dest_dir, cancel)
        })
    }

    /// Replace the store with `source` on the calling thread. Returns the number
    /// of names found in the imported database.
    pub fn import_from(&mut self, source: &Path, cancel: &CancelToken) -> Result<usize> {
        self.guarded(Operation::Import, |this| {
            let staged = stage_import(source, this.store.path(), cancel)?;
            this.apply_import(&staged)
        })
    }

    fn finish_transfer(&mut self, job: TransferJob) -> Result<TransferReport> {
        let kind = job.kind();
        let report = match job.join() {
            Ok(path) => match kind {
                TransferKind::Export => Ok(TransferReport::Exported(path)),
                TransferKind::Import => self
                    .apply_import(&path)
                    .map(|count| TransferReport::Imported { count }),
            },
            Err(err) => Err(err),
        };
        self.guard.finish();
        if let Err(err) = &report {
            warn!(?kind, error = %err, "transfer failed");
        }
        report
    }

    /// Swap in the staged file and reload. When the swap fails the list is
    /// rebuilt from whatever the store now holds, so it never shows rows the
    /// store cannot serve.
    fn apply_import(&mut self, staged: &Path) -> Result<usize> {
        if let Err(err) = self.store.replace_file(staged) {
            if staged.exists() {
                if let Err(cleanup) = fs::remove_file(staged) {
                    warn!(path = %staged.display(), error = %cleanup, "failed to remove staged import");
                }
            }
            self.resync_records();
            return Err(err);
        }
        self.form.clear();
        let rows = match self.store.list_all() {
            Ok(rows) => rows,
            Err(err) => {
                self.records.clear();
                return Err(err);
            }
        };
        let count = rows.len();
        self.records.replace_all(rows);
        info!(count, "imported database");
        Ok(count)
    }

    fn resync_records(&mut self) {
        match self.store.list_all() {
            Ok(rows) => self.records.replace_all(rows),
            Err(err) => {
                warn!(error = %err, "store unreadable after failed import");
                self.records.clear();
                self.form.clear();
            }
        }
    }

    fn guarded<T>(&mut self, op: Operation, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.guard.begin(op)?;
        let result = f(self);
        self.guard.finish();
        if let Err(err) = &result {
            warn!(%op, error = %err, "operation failed");
        }
        result
    }
}
