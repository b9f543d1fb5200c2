use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{Result, TryOnError};
use crate::service::TryOnService;
use crate::types::*;

fn normalize(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

/// Async HTTP client for a virtual try-on service.
///
/// Covers image upload, generation submission, status queries, artifact
/// cleanup, and result image download.
///
/// # Example
/// ```no_run
/// use tryon_client::{ImagePayload, TryOnClient, TryOnService};
///
/// # async fn example() -> tryon_client::Result<()> {
/// let client = TryOnClient::new("http://127.0.0.1:5001");
/// let dress = ImagePayload::new("dress.jpg", std::fs::read("dress.jpg").unwrap());
/// let person = ImagePayload::new("person.jpg", std::fs::read("person.jpg").unwrap());
/// let uploaded = client.upload_images(&dress, &person).await?;
/// let job_id = client.submit_generation(&uploaded).await?;
/// let status = client.job_status(&job_id).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TryOnClient {
    http: Client,
    endpoint: String,
    timeout: Option<Duration>,
}

impl TryOnClient {
    /// Create a new client pointing at the given service endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: normalize(endpoint.into()),
            timeout: None,
        }
    }

    /// Create a client from a [`ClientConfig`].
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut client = Self::new(config.endpoint.clone());
        client.timeout = config.request_timeout;
        client
    }

    /// Use a custom `reqwest::Client` (for connection pooling, TLS, proxies).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Apply a timeout to every request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn prepare(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.timeout {
            Some(t) => builder.timeout(t),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, context: &str) -> Result<Response> {
        let resp = self
            .prepare(builder)
            .send()
            .await
            .map_err(|e| TryOnError::Network {
                context: format!("{} ({})", context, self.endpoint),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TryOnError::Http { status, body });
        }
        Ok(resp)
    }

    async fn json(resp: Response, context: &str) -> Result<Value> {
        resp.json().await.map_err(|e| TryOnError::Network {
            context: format!("Failed to parse {} response", context),
            source: e,
        })
    }

    // ── Result image ────────────────────────────────────────────────

    /// Download the generated image for a job. Returns raw bytes.
    pub async fn result_image(&self, job_id: &JobId) -> Result<Vec<u8>> {
        let url = format!("{}/result-image/{}", self.endpoint, job_id);
        let resp = self
            .send(self.http.get(&url), "Failed to fetch result image")
            .await?;
        let bytes = resp.bytes().await.map_err(|e| TryOnError::Network {
            context: "Failed to read result image bytes".into(),
            source: e,
        })?;
        Ok(bytes.to_vec())
    }
}

fn image_part(payload: &ImagePayload) -> Result<Part> {
    Part::bytes(payload.bytes.clone())
        .file_name(payload.file_name.clone())
        .mime_str(&payload.mime)
        .map_err(|e| TryOnError::Network {
            context: format!("Invalid MIME type {} for {}", payload.mime, payload.file_name),
            source: e,
        })
}

fn parse_upload(json: Value) -> Result<UploadResult> {
    let result: UploadResult = serde_json::from_value(json).map_err(|_| {
        TryOnError::InvalidResponse("Upload response missing image URLs".into())
    })?;
    if !result.is_complete() {
        return Err(TryOnError::InvalidResponse(
            "Upload response has empty image URLs".into(),
        ));
    }
    Ok(result)
}

fn parse_job_id(json: &Value) -> Result<JobId> {
    json.get("job_id")
        .filter(|v| !v.is_null())
        .cloned()
        .map(serde_json::from_value::<JobId>)
        .transpose()
        .map_err(|_| TryOnError::InvalidResponse("Response job_id is not a string or integer".into()))?
        .ok_or_else(|| TryOnError::InvalidResponse("Response missing job_id".into()))
}

impl TryOnService for TryOnClient {
    async fn upload_images(
        &self,
        primary: &ImagePayload,
        secondary: &ImagePayload,
    ) -> Result<UploadResult> {
        let url = format!("{}/upload-images", self.endpoint);
        let form = Form::new()
            .part(SlotRole::Primary.field_name(), image_part(primary)?)
            .part(SlotRole::Secondary.field_name(), image_part(secondary)?);

        let resp = self
            .send(self.http.post(&url).multipart(form), "Failed to upload images")
            .await?;
        parse_upload(Self::json(resp, "upload").await?)
    }

    async fn submit_generation(&self, upload: &UploadResult) -> Result<JobId> {
        let url = format!("{}/generate", self.endpoint);
        let body = serde_json::json!({
            "dress_image_path": upload.primary_url,
            "person_image_path": upload.secondary_url,
        });

        let resp = self
            .send(self.http.post(&url).json(&body), "Failed to submit generation")
            .await?;
        parse_job_id(&Self::json(resp, "generate").await?)
    }

    async fn job_status(&self, job_id: &JobId) -> Result<JobStatus> {
        let url = format!("{}/status/{}", self.endpoint, job_id);
        let resp = self
            .send(self.http.get(&url), "Failed to fetch job status")
            .await?;
        let json = Self::json(resp, "status").await?;
        Ok(serde_json::from_value(json)?)
    }

    async fn cleanup(&self, job_id: &JobId) -> Result<()> {
        let url = format!("{}/cleanup", self.endpoint);
        let body = serde_json::json!({ "job_id": job_id });
        self.send(self.http.post(&url).json(&body), "Failed to send cleanup request")
            .await?;
        Ok(())
    }
}
