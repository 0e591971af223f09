use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::config::{ContainerFormat, EncoderConfig, VideoCodec};

/// Why an active recording ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Requested,
    EncoderFailed,
    GrantRevoked,
    /// The session was dropped while recording.
    Dropped,
}

/// Result delivered when an active recording stops.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub duration_secs: f64,
    pub end_reason: EndReason,
    /// False when the encoder failed to stop cleanly; the file may be truncated.
    pub finalized: bool,
    pub checksum: Option<String>,
    pub metadata: RecordingMetadata,
}

/// Metadata stored alongside a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub file_path: String,
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub bitrate: u32,
    pub codec: VideoCodec,
    pub container: ContainerFormat,
    pub end_reason: EndReason,
    pub finalized: bool,
    pub checksum: Option<String>,
}

impl RecordingMetadata {
    pub fn new(
        config: &EncoderConfig,
        duration_secs: f64,
        end_reason: EndReason,
        finalized: bool,
        checksum: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            file_path: config.output_path().to_string_lossy().to_string(),
            duration_secs,
            width: config.width(),
            height: config.height(),
            frame_rate: config.frame_rate(),
            bitrate: config.bitrate(),
            codec: config.codec(),
            container: config.container(),
            end_reason,
            finalized,
            checksum,
        }
    }
}
