use std::future::Future;

use crate::error::Result;
use crate::types::{ImagePayload, JobId, JobStatus, UploadResult};

/// The remote operations the upload and polling core depends on.
///
/// [`TryOnClient`](crate::TryOnClient) implements this over HTTP. Anything
/// else implementing it (an in-process fake, a recording proxy) can drive
/// [`UploadCoordinator`](crate::UploadCoordinator) and
/// [`JobPoller`](crate::JobPoller) unchanged.
pub trait TryOnService: Send + Sync + 'static {
    /// Upload both images in one request and return their server references.
    fn upload_images(
        &self,
        primary: &ImagePayload,
        secondary: &ImagePayload,
    ) -> impl Future<Output = Result<UploadResult>> + Send;

    /// Submit a generation job for an uploaded pair. Returns the job id.
    fn submit_generation(
        &self,
        upload: &UploadResult,
    ) -> impl Future<Output = Result<JobId>> + Send;

    /// Fetch the current status snapshot of a job.
    fn job_status(&self, job_id: &JobId) -> impl Future<Output = Result<JobStatus>> + Send;

    /// Ask the service to release intermediate artifacts for a finished job.
    fn cleanup(&self, job_id: &JobId) -> impl Future<Output = Result<()>> + Send;
}
