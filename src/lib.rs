//! # tryon-client
//!
//! Async Rust client for a virtual try-on service: upload a garment image and
//! a person image, submit a generation job, and poll it to completion.
//!
//! The service runs a multi-stage pipeline (background removal, cloth mask,
//! segmentation, pose generation, cloth resize) and reports per-stage status.
//! This crate owns the client side of that exchange:
//!
//! - [`TryOnClient`] — HTTP transport for upload, generate, status, cleanup
//!   and result download.
//! - [`UploadCoordinator`] — the two image slots and the upload that turns
//!   them into server references.
//! - [`JobPoller`] — one tracked job at a time: submission, a fixed-period
//!   polling session, terminal detection, and one-shot artifact cleanup.
//! - [`TryOnSession`] — the facade a UI drives with three actions, exposing
//!   state through `tokio::sync::watch` channels.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tryon_client::{ClientConfig, ImagePayload, SlotRole, TryOnSession};
//! use std::path::Path;
//!
//! # async fn example() -> tryon_client::Result<()> {
//! let config = ClientConfig::default();
//! let mut session = TryOnSession::from_config(&config);
//!
//! session.select_image(SlotRole::Primary, ImagePayload::from_path(Path::new("dress.jpg"))?);
//! session.select_image(SlotRole::Secondary, ImagePayload::from_path(Path::new("person.jpg"))?);
//! session.upload().await?;
//! session.generate().await?;
//!
//! let mut view = session.job_view();
//! while !view.borrow_and_update().phase.is_terminal() {
//!     if view.changed().await.is_err() {
//!         break;
//!     }
//! }
//! if let Some(url) = session.jobs().result_url() {
//!     println!("Result: {}", url);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod poller;
pub mod service;
pub mod session;
pub mod types;
pub mod upload;

pub use client::TryOnClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Result, TryOnError};
pub use poller::{JobPhase, JobPoller, JobView};
pub use service::TryOnService;
pub use session::TryOnSession;
pub use types::{
    ImagePayload, ImageSlot, JobId, JobState, JobStatus, Preprocessing, SlotRole, Stage,
    StageStatus, UploadResult,
};
pub use upload::{UploadCoordinator, UploadView};
