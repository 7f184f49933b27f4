use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::ServiceError;
use crate::notification::{Notifier, Severity};
use crate::service::{CollectionId, MediaService, UploadFile};

pub const BUSY_MESSAGE: &str = "Please wait for the current upload to finish";

/// Live state of the uploader, published on every change.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadProgress {
    pub is_uploading: bool,
    pub total_files: usize,
    pub finished_files: usize,
    pub failed_files: usize,
    pub current_file_name: Option<String>,
}

impl UploadProgress {
    pub fn percent(&self) -> f64 {
        if self.total_files == 0 {
            return 0.0;
        }
        self.finished_files as f64 / self.total_files as f64 * 100.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FailedFile {
    pub name: String,
    pub error: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub finished: usize,
    pub failed: Vec<FailedFile>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum BatchOutcome {
    /// The batch ran to the end. Individual files may still have failed.
    Completed(BatchSummary),
    /// Another batch was in flight.
    Rejected,
    /// Nothing to upload.
    Empty,
}

impl BatchOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, BatchOutcome::Completed(_))
    }
}

// Clears the published file name and releases the busy flag, also when the
// batch future is dropped before it finishes.
struct BusyGuard<'a> {
    busy: &'a AtomicBool,
    progress: &'a watch::Sender<UploadProgress>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.progress.send_if_modified(|p| {
            let changed = p.is_uploading || p.current_file_name.is_some();
            p.is_uploading = false;
            p.current_file_name = None;
            changed
        });
        self.busy.store(false, Ordering::Release);
    }
}

/// Runs upload batches one file at a time, at most one batch at a time.
pub struct UploadOrchestrator {
    service: Arc<dyn MediaService>,
    notifier: Arc<dyn Notifier>,
    busy: AtomicBool,
    progress: watch::Sender<UploadProgress>,
}

impl UploadOrchestrator {
    pub fn new(service: Arc<dyn MediaService>, notifier: Arc<dyn Notifier>) -> Self {
        let (progress, _) = watch::channel(UploadProgress::default());
        Self::with_progress(service, notifier, progress)
    }

    /// Like [`UploadOrchestrator::new`], publishing into a channel the caller already holds.
    pub fn with_progress(
        service: Arc<dyn MediaService>,
        notifier: Arc<dyn Notifier>,
        progress: watch::Sender<UploadProgress>,
    ) -> Self {
        Self {
            service,
            notifier,
            busy: AtomicBool::new(false),
            progress,
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn progress(&self) -> UploadProgress {
        self.progress.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadProgress> {
        self.progress.subscribe()
    }

    /// Upload `files` in order, assigning each result to `collection` when given.
    pub async fn start_upload(
        &self,
        files: Vec<UploadFile>,
        collection: Option<CollectionId>,
    ) -> BatchOutcome {
        if self.is_uploading() {
            return self.reject();
        }
        if files.is_empty() {
            debug!("Upload requested with no files, ignoring");
            return BatchOutcome::Empty;
        }
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return self.reject();
        }
        let guard = BusyGuard {
            busy: &self.busy,
            progress: &self.progress,
        };

        let total = files.len();
        match collection {
            Some(collection) => info!(
                "Starting upload batch of {} files into collection {}",
                total, collection
            ),
            None => info!("Starting upload batch of {} files", total),
        }

        self.progress.send_modify(|p| {
            *p = UploadProgress {
                is_uploading: true,
                total_files: total,
                ..UploadProgress::default()
            };
        });

        let mut finished = 0;
        let mut failed = Vec::new();

        for file in &files {
            self.progress
                .send_modify(|p| p.current_file_name = Some(file.name().to_string()));

            match self.transfer(file, collection).await {
                Ok(()) => {
                    finished += 1;
                    self.progress.send_modify(|p| p.finished_files = finished);
                    debug!("Finished {}/{}: {}", finished, total, file.name());
                }
                Err(e) => {
                    error!("Upload failed for '{}': {}", file.name(), e);
                    self.progress.send_modify(|p| p.failed_files += 1);
                    self.notifier
                        .notify(&format!("Upload failed: {}", file.name()), Severity::Error);
                    failed.push(FailedFile {
                        name: file.name().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        self.notifier
            .notify(&format!("Uploaded: {}", finished), Severity::Success);
        info!(
            "Upload batch finished: {}/{} files uploaded, {} failed",
            finished,
            total,
            failed.len()
        );
        drop(guard);

        BatchOutcome::Completed(BatchSummary {
            total,
            finished,
            failed,
        })
    }

    fn reject(&self) -> BatchOutcome {
        warn!("Upload requested while another batch is in flight, rejecting");
        self.notifier.notify(BUSY_MESSAGE, Severity::Warning);
        BatchOutcome::Rejected
    }

    async fn transfer(
        &self,
        file: &UploadFile,
        collection: Option<CollectionId>,
    ) -> Result<(), ServiceError> {
        let ids = self.service.upload(file).await?;

        if let Some(collection) = collection {
            if !ids.is_empty() {
                self.service
                    .assign_collection(&ids, collection)
                    .await
                    .map_err(|e| ServiceError::Assignment(Box::new(e)))?;
            }
        }

        Ok(())
    }
}
