use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::CaptureError;
use super::handles::VirtualOutputParams;

/// Video codec requested from the platform encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    H264,
    Hevc,
    Vp8,
}

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Mpeg4,
    Webm,
}

impl ContainerFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mpeg4 => "mp4",
            Self::Webm => "webm",
        }
    }

    pub fn supports(&self, codec: VideoCodec) -> bool {
        match self {
            Self::Mpeg4 => matches!(codec, VideoCodec::H264 | VideoCodec::Hevc),
            Self::Webm => matches!(codec, VideoCodec::Vp8),
        }
    }
}

/// Fixed parameters for every recording made by a session.
///
/// Defaults are portrait 1080×1920 at 30 fps, 5 Mbps H.264 in MPEG-4.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Frame width in pixels.
    pub width: u32,

    /// Frame height in pixels.
    pub height: u32,

    /// Frames per second.
    pub frame_rate: u32,

    /// Target bitrate in bits per second.
    pub bitrate: u32,

    pub codec: VideoCodec,

    pub container: ContainerFormat,

    /// Screen density (dpi) passed to the virtual output.
    pub density_dpi: u32,

    /// Whether the virtual output auto-mirrors the primary display.
    pub auto_mirror: bool,

    /// Name given to the virtual output.
    pub display_name: String,

    /// Directory where recording files are written.
    pub output_directory: PathBuf,

    /// Write `<file>.metadata.json` next to each finished recording.
    pub write_metadata_sidecar: bool,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("invalid frame size: {}x{}", self.width, self.height));
        }
        // YUV 4:2:0 encoders reject odd dimensions.
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(format!(
                "frame size must be even: {}x{}",
                self.width, self.height
            ));
        }
        if self.frame_rate == 0 {
            return Err("frame rate must be positive".into());
        }
        if self.bitrate == 0 {
            return Err("bitrate must be positive".into());
        }
        if self.density_dpi == 0 {
            return Err("density must be positive".into());
        }
        if !self.container.supports(self.codec) {
            return Err(format!(
                "{:?} cannot be muxed into {:?}",
                self.codec, self.container
            ));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self, CaptureError> {
        let json = fs::read_to_string(path)
            .map_err(|e| CaptureError::StorageError(format!("failed to read config: {}", e)))?;
        let config: SessionConfig = serde_json::from_str(&json)
            .map_err(|e| CaptureError::StorageError(format!("failed to parse config: {}", e)))?;
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), CaptureError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CaptureError::StorageError(format!("failed to serialize config: {}", e)))?;
        fs::write(path, json)
            .map_err(|e| CaptureError::StorageError(format!("failed to write config: {}", e)))?;
        Ok(())
    }

    /// Parameters for the virtual output bound to the encoder surface.
    pub fn virtual_output_params(&self) -> VirtualOutputParams {
        VirtualOutputParams {
            name: self.display_name.clone(),
            width: self.width,
            height: self.height,
            density_dpi: self.density_dpi,
            auto_mirror: self.auto_mirror,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            frame_rate: 30,
            bitrate: 5_000_000,
            codec: VideoCodec::H264,
            container: ContainerFormat::Mpeg4,
            density_dpi: 320,
            auto_mirror: true,
            display_name: "ScreenRecording".into(),
            output_directory: PathBuf::from("."),
            write_metadata_sidecar: false,
        }
    }
}

/// Encoder parameters for one session attempt.
///
/// Built once from [`SessionConfig`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    container: ContainerFormat,
    codec: VideoCodec,
    width: u32,
    height: u32,
    frame_rate: u32,
    bitrate: u32,
    output_path: PathBuf,
}

impl EncoderConfig {
    /// Derive the encoder parameters for a new attempt, with a fresh
    /// `recording_<uuid>` output file under the configured directory.
    pub fn for_session(config: &SessionConfig) -> Self {
        let file_name = format!(
            "recording_{}.{}",
            uuid::Uuid::new_v4(),
            config.container.extension()
        );
        Self {
            container: config.container,
            codec: config.codec,
            width: config.width,
            height: config.height,
            frame_rate: config.frame_rate,
            bitrate: config.bitrate,
            output_path: config.output_directory.join(file_name),
        }
    }

    pub fn container(&self) -> ContainerFormat {
        self.container
    }

    pub fn codec(&self) -> VideoCodec {
        self.codec
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    pub fn bitrate(&self) -> u32 {
        self.bitrate
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}
