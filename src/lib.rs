//! Client-side bulk upload into a HomeHub media library.
//!
//! [`UploadOrchestrator`] runs one batch at a time, transferring files in
//! order through a [`MediaService`] and reporting outcomes to a [`Notifier`].
//! [`DragTracker`] adapts drop-zone events into batches.

pub mod config;
pub mod drag;
pub mod error;
pub mod notification;
pub mod service;
pub mod upload;

pub use config::UploadConfig;
pub use drag::{DragEvent, DragState, DragTracker, DropZoneEvent};
pub use error::{ServiceError, UploadError};
pub use notification::{Notification, NotificationCenter, Notifier, Severity};
pub use service::{CollectionId, HttpMediaService, MediaId, MediaService, UploadFile};
pub use upload::{BatchOutcome, BatchSummary, FailedFile, UploadOrchestrator, UploadProgress};
