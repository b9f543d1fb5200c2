use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::{Result, TryOnError};
use crate::service::TryOnService;
use crate::types::{JobId, JobState, JobStatus, UploadResult};

pub const MSG_UPLOAD_FIRST: &str = "Please upload images first.";
pub const MSG_SUBMITTING: &str = "Sending request to generate...";
pub const MSG_SUBMIT_ERR: &str = "Error submitting generation request";

/// Client-side lifecycle of the tracked generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobPhase {
    /// Nothing submitted yet.
    #[default]
    Idle,
    /// Generation request in flight.
    Submitting,
    /// Job accepted, status checks running.
    Polling,
    /// The service reported `completed`.
    Completed,
    /// The service reported `failed`.
    Failed,
    /// The generation request itself failed; no job exists.
    SubmissionFailed,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobPhase::Completed | JobPhase::Failed | JobPhase::SubmissionFailed
        )
    }
}

/// What the presentation layer needs to render the generation half.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobView {
    pub phase: JobPhase,
    pub job_id: Option<JobId>,
    /// Latest snapshot from the service, replaced wholesale on every check.
    pub status: Option<JobStatus>,
    pub result_url: Option<String>,
    pub message: String,
}

/// Identifies which submission a status check belongs to.
#[derive(Debug, Clone)]
struct Ticket {
    epoch: u64,
    job_id: JobId,
}

/// Recurring status-check timer bound to one job. Dropping it cancels the
/// timer; checks already in flight run to completion and are filtered by
/// their [`Ticket`].
struct PollingSession {
    handle: JoinHandle<()>,
}

impl PollingSession {
    fn spawn<S: TryOnService>(shared: Weak<Shared<S>>, ticket: Ticket, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // First tick completes immediately.
                ticker.tick().await;
                let Some(strong) = shared.upgrade() else {
                    break;
                };
                tokio::spawn(check_status(strong, ticket.clone()));
            }
        });
        Self { handle }
    }
}

impl Drop for PollingSession {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct PollState {
    epoch: u64,
    cleanup_requested: bool,
    session: Option<PollingSession>,
    view: JobView,
}

impl PollState {
    fn tracks(&self, ticket: &Ticket) -> bool {
        self.epoch == ticket.epoch && self.view.job_id.as_ref() == Some(&ticket.job_id)
    }
}

struct Shared<S> {
    service: Arc<S>,
    state: Mutex<PollState>,
    view: watch::Sender<JobView>,
}

impl<S: TryOnService> Shared<S> {
    fn lock(&self) -> MutexGuard<'_, PollState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &PollState) {
        self.view.send_replace(state.view.clone());
    }

    fn wants_check(&self, ticket: &Ticket) -> bool {
        let state = self.lock();
        state.tracks(ticket) && state.view.phase == JobPhase::Polling
    }

    fn apply_status(&self, ticket: &Ticket, outcome: Result<JobStatus>) {
        let mut state = self.lock();
        if !state.tracks(ticket) {
            tracing::debug!(job_id = %ticket.job_id, "discarding status for superseded job");
            return;
        }
        if state.view.phase != JobPhase::Polling {
            tracing::debug!(job_id = %ticket.job_id, "ignoring status received after terminal state");
            return;
        }

        let status = match outcome {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(job_id = %ticket.job_id, error = %e, "status check failed, will retry on next tick");
                return;
            }
        };

        if let Some(url) = status.result() {
            state.view.result_url = Some(url.to_string());
            if !state.cleanup_requested {
                state.cleanup_requested = true;
                self.spawn_cleanup(ticket.job_id.clone());
            }
        }

        match status.overall_status {
            JobState::Completed => {
                tracing::info!(job_id = %ticket.job_id, "job completed");
                state.view.phase = JobPhase::Completed;
                state.session = None;
            }
            JobState::Failed => {
                tracing::warn!(job_id = %ticket.job_id, "job failed");
                state.view.phase = JobPhase::Failed;
                state.session = None;
            }
            JobState::Pending | JobState::Processing => {
                tracing::debug!(job_id = %ticket.job_id, status = ?status.overall_status, "job in progress");
            }
        }

        state.view.status = Some(status);
        self.publish(&state);
    }

    fn spawn_cleanup(&self, job_id: JobId) {
        let service = self.service.clone();
        tokio::spawn(async move {
            match service.cleanup(&job_id).await {
                Ok(()) => tracing::debug!(%job_id, "cleanup requested"),
                Err(e) => tracing::warn!(%job_id, error = %e, "cleanup request failed"),
            }
        });
    }
}

async fn check_status<S: TryOnService>(shared: Arc<Shared<S>>, ticket: Ticket) {
    if !shared.wants_check(&ticket) {
        return;
    }
    let outcome = shared.service.job_status(&ticket.job_id).await;
    shared.apply_status(&ticket, outcome);
}

/// Tracks at most one generation job at a time.
///
/// [`start_generation`](Self::start_generation) submits a job and starts a
/// polling session: one immediate status check, then one per
/// `poll_interval`, until the service reports `completed` or `failed`. A new
/// submission cancels the previous session first. Dropping the poller
/// cancels any active session.
///
/// Must be used from within a tokio runtime.
pub struct JobPoller<S: TryOnService> {
    shared: Arc<Shared<S>>,
    poll_interval: Duration,
}

impl<S: TryOnService> JobPoller<S> {
    /// `poll_interval` is clamped to at least one millisecond.
    pub fn new(service: Arc<S>, poll_interval: Duration) -> Self {
        let poll_interval = poll_interval.max(Duration::from_millis(1));
        let (view, _) = watch::channel(JobView::default());
        Self {
            shared: Arc::new(Shared {
                service,
                state: Mutex::new(PollState {
                    epoch: 0,
                    cleanup_requested: false,
                    session: None,
                    view: JobView::default(),
                }),
                view,
            }),
            poll_interval,
        }
    }

    /// Submit a generation job for `upload` and start polling it.
    ///
    /// Fails with [`TryOnError::Validation`] without any request when
    /// `upload` is missing or incomplete.
    pub async fn start_generation(&self, upload: Option<&UploadResult>) -> Result<JobId> {
        let upload = match upload.filter(|u| u.is_complete()) {
            Some(upload) => upload.clone(),
            None => {
                let mut state = self.shared.lock();
                state.view.message = MSG_UPLOAD_FIRST.into();
                self.shared.publish(&state);
                return Err(TryOnError::Validation("upload required first".into()));
            }
        };

        let epoch = {
            let mut state = self.shared.lock();
            if state.session.take().is_some() {
                tracing::debug!("cancelled previous polling session");
            }
            state.epoch += 1;
            state.cleanup_requested = false;
            state.view = JobView {
                phase: JobPhase::Submitting,
                message: MSG_SUBMITTING.into(),
                ..JobView::default()
            };
            self.shared.publish(&state);
            state.epoch
        };

        let submitted = self.shared.service.submit_generation(&upload).await;

        let mut state = self.shared.lock();
        if state.epoch != epoch {
            tracing::debug!("generation response arrived after a newer submission");
            return Err(TryOnError::Superseded);
        }

        match submitted {
            Ok(job_id) => {
                tracing::info!(%job_id, "generation submitted");
                state.view.phase = JobPhase::Polling;
                state.view.job_id = Some(job_id.clone());
                state.view.message =
                    format!("Generation request submitted successfully! Job ID: {}", job_id);
                let ticket = Ticket {
                    epoch,
                    job_id: job_id.clone(),
                };
                state.session = Some(PollingSession::spawn(
                    Arc::downgrade(&self.shared),
                    ticket,
                    self.poll_interval,
                ));
                self.shared.publish(&state);
                Ok(job_id)
            }
            Err(e) => {
                tracing::warn!(error = %e, "generation request failed");
                state.view.phase = JobPhase::SubmissionFailed;
                state.view.message = MSG_SUBMIT_ERR.into();
                self.shared.publish(&state);
                Err(TryOnError::Submission(Box::new(e)))
            }
        }
    }

    /// Subscribe to view updates.
    pub fn subscribe(&self) -> watch::Receiver<JobView> {
        self.shared.view.subscribe()
    }

    /// Current view snapshot.
    pub fn view(&self) -> JobView {
        self.shared.lock().view.clone()
    }

    pub fn phase(&self) -> JobPhase {
        self.shared.lock().view.phase
    }

    pub fn job_id(&self) -> Option<JobId> {
        self.shared.lock().view.job_id.clone()
    }

    pub fn status(&self) -> Option<JobStatus> {
        self.shared.lock().view.status.clone()
    }

    pub fn result_url(&self) -> Option<String> {
        self.shared.lock().view.result_url.clone()
    }

    /// True while a polling session is scheduled.
    pub fn is_polling(&self) -> bool {
        self.shared.lock().session.is_some()
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

impl<S: TryOnService> Drop for JobPoller<S> {
    fn drop(&mut self) {
        let session = self.shared.lock().session.take();
        if session.is_some() {
            tracing::debug!("poller dropped, cancelling polling session");
        }
    }
}
