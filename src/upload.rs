use std::sync::Arc;
use tokio::sync::watch;

use crate::error::{Result, TryOnError};
use crate::service::TryOnService;
use crate::types::{ImagePayload, ImageSlot, SlotRole, UploadResult};

pub const MSG_SELECT_BOTH: &str = "Please select both images.";
pub const MSG_UPLOADING: &str = "Uploading...";
pub const MSG_UPLOAD_OK: &str = "Upload successful!";
pub const MSG_UPLOAD_ERR: &str = "Error uploading images";

/// What the presentation layer needs to render the upload half.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadView {
    pub primary_name: Option<String>,
    pub secondary_name: Option<String>,
    pub uploading: bool,
    pub message: String,
    pub ready: bool,
}

/// Owns the two image slots and the upload that turns them into server
/// references.
///
/// Uploads take `&mut self`, so at most one can be in flight.
pub struct UploadCoordinator<S> {
    service: Arc<S>,
    primary: ImageSlot,
    secondary: ImageSlot,
    result: Option<UploadResult>,
    view: watch::Sender<UploadView>,
}

impl<S: TryOnService> UploadCoordinator<S> {
    pub fn new(service: Arc<S>) -> Self {
        let (view, _) = watch::channel(UploadView::default());
        Self {
            service,
            primary: ImageSlot::empty(SlotRole::Primary),
            secondary: ImageSlot::empty(SlotRole::Secondary),
            result: None,
            view,
        }
    }

    /// Subscribe to view updates.
    pub fn subscribe(&self) -> watch::Receiver<UploadView> {
        self.view.subscribe()
    }

    /// Current view snapshot.
    pub fn view(&self) -> UploadView {
        self.view.borrow().clone()
    }

    pub fn slot(&self, role: SlotRole) -> &ImageSlot {
        match role {
            SlotRole::Primary => &self.primary,
            SlotRole::Secondary => &self.secondary,
        }
    }

    /// Replace the local selection for `role`.
    ///
    /// Any previous upload result is dropped: the pair is not ready again
    /// until [`submit_upload`](Self::submit_upload) succeeds.
    pub fn select_image(&mut self, role: SlotRole, payload: ImagePayload) {
        let slot = match role {
            SlotRole::Primary => &mut self.primary,
            SlotRole::Secondary => &mut self.secondary,
        };
        slot.payload = Some(payload);
        slot.reference = None;

        if self.result.take().is_some() {
            tracing::debug!(?role, "selection changed, previous upload is stale");
        }
        self.publish(|_| {});
    }

    /// Upload both selections in a single request.
    pub async fn submit_upload(&mut self) -> Result<UploadResult> {
        let (primary, secondary) = match (&self.primary.payload, &self.secondary.payload) {
            (Some(p), Some(s)) => (p.clone(), s.clone()),
            _ => {
                self.publish(|v| v.message = MSG_SELECT_BOTH.into());
                return Err(TryOnError::Validation("both images required".into()));
            }
        };

        self.publish(|v| {
            v.uploading = true;
            v.message = MSG_UPLOADING.into();
        });

        match self.service.upload_images(&primary, &secondary).await {
            Ok(result) => {
                tracing::info!(
                    primary = %result.primary_url,
                    secondary = %result.secondary_url,
                    "images uploaded"
                );
                self.primary.reference = Some(result.primary_url.clone());
                self.secondary.reference = Some(result.secondary_url.clone());
                self.result = Some(result.clone());
                self.publish(|v| {
                    v.uploading = false;
                    v.message = MSG_UPLOAD_OK.into();
                });
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(error = %e, "image upload failed");
                self.publish(|v| {
                    v.uploading = false;
                    v.message = MSG_UPLOAD_ERR.into();
                });
                Err(TryOnError::Upload(Box::new(e)))
            }
        }
    }

    /// The upload result, if the current selections have been uploaded.
    pub fn upload_result(&self) -> Option<&UploadResult> {
        self.result.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.result.is_some()
    }

    fn publish(&self, update: impl FnOnce(&mut UploadView)) {
        let primary_name = self.primary.payload.as_ref().map(|p| p.file_name.clone());
        let secondary_name = self.secondary.payload.as_ref().map(|p| p.file_name.clone());
        let ready = self.is_ready();
        self.view.send_modify(|v| {
            v.primary_name = primary_name;
            v.secondary_name = secondary_name;
            v.ready = ready;
            update(v);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{JobId, JobStatus};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingService {
        uploads: AtomicUsize,
    }

    impl TryOnService for CountingService {
        async fn upload_images(
            &self,
            primary: &ImagePayload,
            secondary: &ImagePayload,
        ) -> Result<UploadResult> {
            let n = self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(UploadResult {
                primary_url: format!("/u/{}/{}", n, primary.file_name),
                secondary_url: format!("/u/{}/{}", n, secondary.file_name),
            })
        }

        async fn submit_generation(&self, _upload: &UploadResult) -> Result<JobId> {
            unreachable!("not used by the coordinator")
        }

        async fn job_status(&self, _job_id: &JobId) -> Result<JobStatus> {
            unreachable!("not used by the coordinator")
        }

        async fn cleanup(&self, _job_id: &JobId) -> Result<()> {
            unreachable!("not used by the coordinator")
        }
    }

    fn image(name: &str) -> ImagePayload {
        ImagePayload::new(name, vec![0xFF, 0xD8])
    }

    #[tokio::test]
    async fn test_view_tracks_selection_and_upload() {
        let mut coordinator = UploadCoordinator::new(Arc::new(CountingService::default()));
        let rx = coordinator.subscribe();

        coordinator.select_image(SlotRole::Primary, image("dress.jpg"));
        assert_eq!(rx.borrow().primary_name.as_deref(), Some("dress.jpg"));
        assert_eq!(rx.borrow().secondary_name, None);

        coordinator.select_image(SlotRole::Secondary, image("person.jpg"));
        coordinator.submit_upload().await.unwrap();

        let view = coordinator.view();
        assert!(view.ready);
        assert!(!view.uploading);
        assert_eq!(view.message, MSG_UPLOAD_OK);
        assert_eq!(
            coordinator.slot(SlotRole::Primary).reference.as_deref(),
            Some("/u/0/dress.jpg")
        );
    }

    #[tokio::test]
    async fn test_reselect_clears_slot_reference() {
        let mut coordinator = UploadCoordinator::new(Arc::new(CountingService::default()));
        coordinator.select_image(SlotRole::Primary, image("dress.jpg"));
        coordinator.select_image(SlotRole::Secondary, image("person.jpg"));
        coordinator.submit_upload().await.unwrap();

        coordinator.select_image(SlotRole::Secondary, image("other.jpg"));
        assert!(coordinator.slot(SlotRole::Secondary).reference.is_none());
        assert!(coordinator.slot(SlotRole::Primary).reference.is_some());
        assert!(!coordinator.is_ready());
        assert!(!coordinator.view().ready);

        let second = coordinator.submit_upload().await.unwrap();
        assert_eq!(second.secondary_url, "/u/1/other.jpg");
        assert_eq!(coordinator.upload_result(), Some(&second));
    }

    #[tokio::test]
    async fn test_missing_selection_sets_message() {
        let service = Arc::new(CountingService::default());
        let mut coordinator = UploadCoordinator::new(service.clone());
        coordinator.select_image(SlotRole::Secondary, image("person.jpg"));

        let err = coordinator.submit_upload().await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(coordinator.view().message, MSG_SELECT_BOTH);
        assert_eq!(service.uploads.load(Ordering::SeqCst), 0);
    }
}
