use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tryon_client::*;

/// A request the fake service received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upload { primary: String, secondary: String },
    Generate(UploadResult),
    Status(JobId),
    Cleanup(JobId),
}

/// Scripted answer to one status query.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(JobStatus),
    /// Answer after a delay.
    Delayed(Duration, JobStatus),
    /// Transport failure.
    Fail,
    /// Never answer.
    Hang,
}

/// In-memory stand-in for the try-on service.
///
/// Status replies are scripted per job; the last scripted reply repeats.
/// Jobs without a script report `pending`.
#[derive(Default)]
pub struct FakeService {
    calls: Mutex<Vec<Call>>,
    job_ids: Mutex<VecDeque<String>>,
    generate_delays: Mutex<VecDeque<Duration>>,
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    pub fail_upload: AtomicBool,
    pub fail_generate: AtomicBool,
    pub fail_cleanup: AtomicBool,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Job ids handed out by successive generation requests.
    pub fn with_job_ids(self, ids: &[&str]) -> Self {
        self.job_ids
            .lock()
            .unwrap()
            .extend(ids.iter().map(|s| s.to_string()));
        self
    }

    pub fn script(self, job_id: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(job_id.to_string(), replies.into());
        self
    }

    /// Delay the next generation response.
    pub fn delay_next_generate(&self, delay: Duration) {
        self.generate_delays.lock().unwrap().push_back(delay);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn status_calls(&self, job_id: &str) -> usize {
        self.count(|c| matches!(c, Call::Status(id) if id.as_str() == job_id))
    }

    pub fn cleanup_calls(&self, job_id: &str) -> usize {
        self.count(|c| matches!(c, Call::Cleanup(id) if id.as_str() == job_id))
    }

    pub fn generate_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Generate(_)))
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_reply(&self, job_id: &JobId) -> Reply {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(job_id.as_str()) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Reply::Status(JobStatus::new(JobState::Pending)),
        }
    }
}

fn transport_error(what: &str) -> TryOnError {
    TryOnError::Http {
        status: 500,
        body: format!("{} failed", what),
    }
}

impl TryOnService for FakeService {
    async fn upload_images(
        &self,
        primary: &ImagePayload,
        secondary: &ImagePayload,
    ) -> Result<UploadResult> {
        self.record(Call::Upload {
            primary: primary.file_name.clone(),
            secondary: secondary.file_name.clone(),
        });
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(transport_error("upload"));
        }
        Ok(UploadResult {
            primary_url: "/u/1".into(),
            secondary_url: "/u/2".into(),
        })
    }

    async fn submit_generation(&self, upload: &UploadResult) -> Result<JobId> {
        self.record(Call::Generate(upload.clone()));
        // Ids are assigned in request order, even when responses are delayed.
        let id = self
            .job_ids
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "job".to_string());
        let delay = self.generate_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_generate.load(Ordering::SeqCst) {
            return Err(transport_error("generate"));
        }
        Ok(JobId::new(id))
    }

    async fn job_status(&self, job_id: &JobId) -> Result<JobStatus> {
        self.record(Call::Status(job_id.clone()));
        match self.next_reply(job_id) {
            Reply::Status(status) => Ok(status),
            Reply::Delayed(delay, status) => {
                tokio::time::sleep(delay).await;
                Ok(status)
            }
            Reply::Fail => Err(transport_error("status")),
            Reply::Hang => std::future::pending().await,
        }
    }

    async fn cleanup(&self, job_id: &JobId) -> Result<()> {
        self.record(Call::Cleanup(job_id.clone()));
        if self.fail_cleanup.load(Ordering::SeqCst) {
            return Err(transport_error("cleanup"));
        }
        Ok(())
    }
}

pub fn processing() -> JobStatus {
    JobStatus::new(JobState::Processing)
}

pub fn completed(result: &str) -> JobStatus {
    JobStatus::new(JobState::Completed).with_result(result)
}

pub fn image(name: &str) -> ImagePayload {
    ImagePayload::new(name, vec![0xFF, 0xD8, 0xFF])
}

pub fn uploaded() -> UploadResult {
    UploadResult {
        primary_url: "/u/1".into(),
        secondary_url: "/u/2".into(),
    }
}

/// Let spawned tasks run without crossing a poll tick.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
