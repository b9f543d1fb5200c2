use std::sync::Arc;
use tokio::sync::watch;

use crate::client::TryOnClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::poller::{JobPoller, JobView};
use crate::service::TryOnService;
use crate::types::{ImagePayload, JobId, SlotRole, UploadResult};
use crate::upload::{UploadCoordinator, UploadView};

/// Presentation-facing facade over an [`UploadCoordinator`] and a
/// [`JobPoller`] sharing one service.
///
/// Exposes the three user actions (select, upload, generate) and the two
/// watch channels a renderer subscribes to.
pub struct TryOnSession<S: TryOnService> {
    uploads: UploadCoordinator<S>,
    jobs: JobPoller<S>,
}

impl TryOnSession<TryOnClient> {
    /// Build a session talking HTTP to the configured endpoint.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(Arc::new(TryOnClient::from_config(config)), config)
    }
}

impl<S: TryOnService> TryOnSession<S> {
    pub fn new(service: Arc<S>, config: &ClientConfig) -> Self {
        Self {
            uploads: UploadCoordinator::new(service.clone()),
            jobs: JobPoller::new(service, config.poll_interval),
        }
    }

    pub fn select_image(&mut self, role: SlotRole, payload: ImagePayload) {
        self.uploads.select_image(role, payload);
    }

    pub async fn upload(&mut self) -> Result<UploadResult> {
        self.uploads.submit_upload().await
    }

    /// Start a generation job from the current upload.
    ///
    /// Only an upload of the *current* selections counts; after a
    /// reselection this fails validation until the pair is uploaded again.
    pub async fn generate(&self) -> Result<JobId> {
        self.jobs.start_generation(self.uploads.upload_result()).await
    }

    pub fn is_ready(&self) -> bool {
        self.uploads.is_ready()
    }

    pub fn uploads(&self) -> &UploadCoordinator<S> {
        &self.uploads
    }

    pub fn jobs(&self) -> &JobPoller<S> {
        &self.jobs
    }

    pub fn upload_view(&self) -> watch::Receiver<UploadView> {
        self.uploads.subscribe()
    }

    pub fn job_view(&self) -> watch::Receiver<JobView> {
        self.jobs.subscribe()
    }
}
