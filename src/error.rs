use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by try-on client operations.
#[derive(Error, Debug)]
pub enum TryOnError {
    /// A precondition was not met. Never reaches the network.
    #[error("{0}")]
    Validation(String),

    /// The image upload request failed.
    #[error("Upload failed: {0}")]
    Upload(#[source] Box<TryOnError>),

    /// The generation request failed before a job was created.
    #[error("Generation request failed: {0}")]
    Submission(#[source] Box<TryOnError>),

    /// A newer generation request replaced this one while it was in flight.
    #[error("Generation request superseded by a newer one")]
    Superseded,

    /// The service returned a non-success HTTP status.
    #[error("Service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response was missing expected fields.
    #[error("{0}")]
    InvalidResponse(String),

    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A local image file could not be read.
    #[error("Failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl TryOnError {
    /// True for precondition failures that the user fixes by acting.
    pub fn is_validation(&self) -> bool {
        matches!(self, TryOnError::Validation(_))
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, TryOnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_error_display() {
        let err = TryOnError::Upload(Box::new(TryOnError::Http {
            status: 500,
            body: "boom".into(),
        }));
        assert_eq!(err.to_string(), "Upload failed: Service returned HTTP 500: boom");
        assert!(!err.is_validation());
        assert!(TryOnError::Validation("both images required".into()).is_validation());
    }
}
