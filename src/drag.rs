//! Turns nested drag-enter / drag-leave / drop signals into a single
//! "files are being dragged over the drop zone" flag, and hands dropped
//! files to the orchestrator.

use log::debug;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::service::{CollectionId, UploadFile};
use crate::upload::{BatchOutcome, UploadOrchestrator};

/// A drag/drop event coming from the UI layer.
pub trait DragEvent {
    /// Stop the platform from handling the event itself (opening or navigating to the file).
    fn prevent_default(&mut self);

    /// Files carried by the event. Only drops carry any.
    fn take_files(&mut self) -> Vec<UploadFile>;
}

/// Plain in-process drag event, for front ends that already hold the file list.
#[derive(Debug, Default)]
pub struct DropZoneEvent {
    files: Vec<UploadFile>,
    default_prevented: bool,
}

impl DropZoneEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files(files: Vec<UploadFile>) -> Self {
        Self {
            files,
            default_prevented: false,
        }
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

impl DragEvent for DropZoneEvent {
    fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    fn take_files(&mut self) -> Vec<UploadFile> {
        std::mem::take(&mut self.files)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragState {
    pub is_dragging: bool,
    pub depth: u32,
}

impl DragState {
    fn enter(&mut self) {
        self.depth = self.depth.saturating_add(1);
        self.is_dragging = true;
    }

    fn leave(&mut self) {
        // leave without a matching enter happens when the pointer exits the window
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 {
            self.is_dragging = false;
        }
    }

    fn reset(&mut self) {
        self.depth = 0;
        self.is_dragging = false;
    }
}

pub struct DragTracker {
    state: Mutex<DragState>,
    orchestrator: Arc<UploadOrchestrator>,
}

impl DragTracker {
    pub fn new(orchestrator: Arc<UploadOrchestrator>) -> Self {
        Self {
            state: Mutex::new(DragState::default()),
            orchestrator,
        }
    }

    pub fn state(&self) -> DragState {
        *self.state.lock()
    }

    pub fn is_dragging(&self) -> bool {
        self.state.lock().is_dragging
    }

    pub fn on_drag_enter(&self, event: &mut impl DragEvent) {
        event.prevent_default();
        let mut state = self.state.lock();
        state.enter();
        debug!("Drag enter (depth {})", state.depth);
    }

    pub fn on_drag_leave(&self, event: &mut impl DragEvent) {
        event.prevent_default();
        let mut state = self.state.lock();
        state.leave();
        debug!("Drag leave (depth {})", state.depth);
    }

    /// Reset the drag state and upload whatever was dropped. Returns `None`
    /// when the drop carried no files.
    pub async fn on_drop(
        &self,
        event: &mut impl DragEvent,
        collection: Option<CollectionId>,
    ) -> Option<BatchOutcome> {
        event.prevent_default();
        self.state.lock().reset();

        let files = event.take_files();
        if files.is_empty() {
            debug!("Drop without files");
            return None;
        }

        debug!("Dropped {} files", files.len());
        Some(self.orchestrator.start_upload(files, collection).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::notification::{Notifier, Severity};
    use crate::service::{MediaId, MediaService};
    use async_trait::async_trait;

    struct AcceptAll {
        uploaded: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MediaService for AcceptAll {
        async fn upload(&self, file: &UploadFile) -> Result<Vec<MediaId>, ServiceError> {
            self.uploaded.lock().push(file.name().to_string());
            Ok(vec![MediaId(1)])
        }

        async fn assign_collection(
            &self,
            _ids: &[MediaId],
            _collection: CollectionId,
        ) -> Result<(), ServiceError> {
            Ok(())
        }
    }

    struct Silent;

    impl Notifier for Silent {
        fn notify(&self, _message: &str, _severity: Severity) {}
    }

    fn tracker() -> (DragTracker, Arc<AcceptAll>) {
        let service = Arc::new(AcceptAll {
            uploaded: Mutex::new(Vec::new()),
        });
        let orchestrator = Arc::new(UploadOrchestrator::new(service.clone(), Arc::new(Silent)));
        (DragTracker::new(orchestrator), service)
    }

    #[test]
    fn balanced_enter_leave_ends_idle() {
        let (tracker, _) = tracker();
        let mut event = DropZoneEvent::new();

        tracker.on_drag_enter(&mut event);
        assert!(tracker.is_dragging());
        tracker.on_drag_leave(&mut event);

        assert_eq!(tracker.state(), DragState::default());
        assert!(event.default_prevented());
    }

    #[test]
    fn nested_enter_keeps_dragging_until_balanced() {
        let (tracker, _) = tracker();
        let mut event = DropZoneEvent::new();

        tracker.on_drag_enter(&mut event);
        tracker.on_drag_enter(&mut event);
        tracker.on_drag_leave(&mut event);
        assert_eq!(
            tracker.state(),
            DragState {
                is_dragging: true,
                depth: 1
            }
        );

        tracker.on_drag_leave(&mut event);
        assert!(!tracker.is_dragging());
    }

    #[test]
    fn unmatched_leave_does_not_go_negative() {
        let (tracker, _) = tracker();
        let mut event = DropZoneEvent::new();

        tracker.on_drag_leave(&mut event);
        tracker.on_drag_leave(&mut event);
        assert_eq!(tracker.state(), DragState::default());

        tracker.on_drag_enter(&mut event);
        assert!(tracker.is_dragging());
        tracker.on_drag_leave(&mut event);
        assert!(!tracker.is_dragging());
    }

    #[test]
    fn enter_saturates_at_max_depth() {
        let mut state = DragState {
            is_dragging: true,
            depth: u32::MAX,
        };
        state.enter();
        assert_eq!(state.depth, u32::MAX);
        assert!(state.is_dragging);

        state.leave();
        assert_eq!(state.depth, u32::MAX - 1);
        assert!(state.is_dragging);
    }

    #[tokio::test]
    async fn drop_resets_depth_and_uploads_files() {
        let (tracker, service) = tracker();
        let mut enter = DropZoneEvent::new();
        for _ in 0..3 {
            tracker.on_drag_enter(&mut enter);
        }

        let mut dropped = DropZoneEvent::with_files(vec![
            UploadFile::from_bytes("a.jpg", &b"a"[..]),
            UploadFile::from_bytes("b.jpg", &b"b"[..]),
        ]);
        let outcome = tracker.on_drop(&mut dropped, Some(CollectionId(9))).await;

        assert!(dropped.default_prevented());
        assert_eq!(tracker.state(), DragState::default());
        assert!(outcome.is_some_and(|o| o.is_accepted()));
        assert_eq!(*service.uploaded.lock(), vec!["a.jpg", "b.jpg"]);
    }

    #[tokio::test]
    async fn drop_without_files_only_resets() {
        let (tracker, service) = tracker();
        let mut event = DropZoneEvent::new();
        tracker.on_drag_enter(&mut event);

        let outcome = tracker.on_drop(&mut event, None).await;

        assert!(outcome.is_none());
        assert!(event.default_prevented());
        assert!(!tracker.is_dragging());
        assert!(service.uploaded.lock().is_empty());
    }
}
