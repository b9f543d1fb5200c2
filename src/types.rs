use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{Result, TryOnError};

/// Which of the two input images a slot holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotRole {
    /// The garment image.
    Primary,
    /// The person image.
    Secondary,
}

impl SlotRole {
    /// Multipart field name used by the upload endpoint.
    pub fn field_name(self) -> &'static str {
        match self {
            SlotRole::Primary => "dress_image",
            SlotRole::Secondary => "person_image",
        }
    }
}

/// A locally selected image, not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    /// Build a payload, guessing the MIME type from the file extension.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = guess_mime(&file_name).to_string();
        Self {
            file_name,
            mime,
            bytes,
        }
    }

    /// Override the guessed MIME type.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    /// Read an image file from disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| TryOnError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::new(file_name, bytes))
    }
}

fn guess_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// One of the two selection slots.
#[derive(Debug, Clone)]
pub struct ImageSlot {
    pub role: SlotRole,
    /// Local selection, if any.
    pub payload: Option<ImagePayload>,
    /// Server reference assigned by the last successful upload of this selection.
    pub reference: Option<String>,
}

impl ImageSlot {
    pub(crate) fn empty(role: SlotRole) -> Self {
        Self {
            role,
            payload: None,
            reference: None,
        }
    }
}

/// Server references for both images, produced by one successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    #[serde(rename = "dress_image_url")]
    pub primary_url: String,
    #[serde(rename = "person_image_url")]
    pub secondary_url: String,
}

impl UploadResult {
    /// Both references are present and non-empty.
    pub fn is_complete(&self) -> bool {
        !self.primary_url.trim().is_empty() && !self.secondary_url.trim().is_empty()
    }
}

/// Opaque job identifier assigned by the service.
///
/// The service may send it as a JSON string or integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => JobId(s),
            Raw::Int(n) => JobId(n.to_string()),
        })
    }
}

/// Overall status of a generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobState {
    /// `Completed` and `Failed` are final.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// Status of a single preprocessing stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    NotStarted,
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Named preprocessing stages run by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    RemoveBackground,
    ClothMask,
    Segmentation,
    PoseGeneration,
    ClothResize,
}

impl Stage {
    /// All stages, in the order the service runs them.
    pub const ALL: [Stage; 5] = [
        Stage::RemoveBackground,
        Stage::ClothMask,
        Stage::Segmentation,
        Stage::PoseGeneration,
        Stage::ClothResize,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Stage::RemoveBackground => "Background removal",
            Stage::ClothMask => "Cloth mask",
            Stage::Segmentation => "Segmentation",
            Stage::PoseGeneration => "Pose generation",
            Stage::ClothResize => "Cloth resize",
        }
    }
}

// The service reports `null` for stages it has not touched yet.
fn null_as_not_started<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<StageStatus, D::Error> {
    Ok(Option::<StageStatus>::deserialize(deserializer)?.unwrap_or_default())
}

/// Per-stage breakdown of a job's preprocessing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preprocessing {
    #[serde(default, deserialize_with = "null_as_not_started")]
    pub remove_bg: StageStatus,
    #[serde(default, deserialize_with = "null_as_not_started")]
    pub cloth_mask: StageStatus,
    #[serde(default, deserialize_with = "null_as_not_started")]
    pub segmentation: StageStatus,
    #[serde(default, deserialize_with = "null_as_not_started")]
    pub pose_generation: StageStatus,
    #[serde(default, deserialize_with = "null_as_not_started")]
    pub cloth_resize: StageStatus,
}

impl Preprocessing {
    pub fn get(&self, stage: Stage) -> StageStatus {
        match stage {
            Stage::RemoveBackground => self.remove_bg,
            Stage::ClothMask => self.cloth_mask,
            Stage::Segmentation => self.segmentation,
            Stage::PoseGeneration => self.pose_generation,
            Stage::ClothResize => self.cloth_resize,
        }
    }

    /// Iterate `(stage, status)` pairs in pipeline order.
    pub fn iter(&self) -> impl Iterator<Item = (Stage, StageStatus)> + '_ {
        Stage::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

/// Point-in-time snapshot of a job, as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub overall_status: JobState,
    #[serde(default)]
    pub preprocessing: Preprocessing,
    #[serde(default)]
    pub result_url: Option<String>,
}

impl JobStatus {
    pub fn new(overall_status: JobState) -> Self {
        Self {
            overall_status,
            preprocessing: Preprocessing::default(),
            result_url: None,
        }
    }

    pub fn with_result(mut self, url: impl Into<String>) -> Self {
        self.result_url = Some(url.into());
        self
    }

    pub fn with_preprocessing(mut self, preprocessing: Preprocessing) -> Self {
        self.preprocessing = preprocessing;
        self
    }

    /// The result reference, ignoring empty strings.
    pub fn result(&self) -> Option<&str> {
        self.result_url.as_deref().filter(|u| !u.is_empty())
    }
}
