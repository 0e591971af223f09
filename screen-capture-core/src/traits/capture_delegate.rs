use crate::models::error::CaptureError;
use crate::models::handles::ConsentRequest;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;

/// Event delegate for capture session notifications.
///
/// Methods are called on the session-owner context (the driver thread when
/// a `SessionDriver` is used). Implementations should marshal to the UI
/// thread if needed.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: &CaptureState);

    /// Called after a consent request has been handed to the provider.
    fn on_consent_requested(&self, _request: &ConsentRequest) {}

    /// Recording did not start.
    fn on_start_failed(&self, error: &CaptureError);

    /// Non-fatal error, e.g. the encoder failed to stop cleanly.
    fn on_error(&self, error: &CaptureError);

    /// Recording stopped and the file was finalized as far as possible.
    fn on_capture_finished(&self, result: &RecordingResult);
}
