use crate::models::config::EncoderConfig;
use crate::models::error::CaptureError;
use crate::models::handles::InputSurface;

/// Creates a fresh encoder for each session attempt.
pub trait EncoderFactory: Send {
    type Pipeline: EncoderPipeline;

    fn create(&mut self) -> Result<Self::Pipeline, CaptureError>;
}

/// Video encoder consuming frames from its input surface and muxing them
/// into a container file.
///
/// Frame ingestion runs on the encoder's own thread or service; the session
/// only starts and stops it.
pub trait EncoderPipeline: Send {
    /// Apply `config` and hand back the surface frames should be drawn into.
    fn configure(&mut self, config: &EncoderConfig) -> Result<InputSurface, CaptureError>;

    /// The input surface, once `configure` has succeeded.
    fn input_surface(&self) -> Option<InputSurface>;

    fn start(&mut self) -> Result<(), CaptureError>;

    /// Stop and finalize the output file.
    ///
    /// Must be safe to call when `start` failed or never ran.
    fn stop(&mut self) -> Result<(), CaptureError>;

    fn release(self);
}
