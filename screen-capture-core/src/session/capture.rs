use std::sync::Arc;
use std::time::Instant;

use crate::models::config::{EncoderConfig, SessionConfig};
use crate::models::error::CaptureError;
use crate::models::handles::{CaptureScope, ConsentRequest, GrantOutcome};
use crate::models::recording_result::{EndReason, RecordingMetadata, RecordingResult};
use crate::models::state::CaptureState;
use crate::session::registry::{SessionRegistry, SessionSlot};
use crate::storage::{checksum, metadata};
use crate::traits::capability_provider::{CapabilityProvider, CaptureGrant, VirtualOutput};
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::encoder_pipeline::{EncoderFactory, EncoderPipeline};

type OutputOf<P> = <<P as CapabilityProvider>::Grant as CaptureGrant>::Output;

/// Screen capture session.
///
/// Owns the capture grant, the encoder and the virtual output. Resources are
/// acquired in the order grant → encoder → virtual output and released in
/// exactly the reverse order, each at most once.
///
/// ```text
/// [CapabilityProvider] ──grant──→ [VirtualOutput] ──frames──→ [EncoderPipeline] → file
/// ```
///
/// All methods take `&mut self`, so transitions never interleave. Hosts that
/// receive callbacks on several threads should drive the session through a
/// [`SessionDriver`](crate::session::driver::SessionDriver).
pub struct CaptureSession<P: CapabilityProvider, F: EncoderFactory> {
    provider: P,
    encoders: F,
    config: SessionConfig,
    registry: SessionRegistry,
    delegate: Option<Arc<dyn CaptureDelegate>>,

    state: CaptureState,
    slot: Option<SessionSlot>,
    next_request_id: u64,

    grant: Option<P::Grant>,
    encoder: Option<F::Pipeline>,
    output: Option<OutputOf<P>>,

    encoder_config: Option<EncoderConfig>,
    started_at: Option<Instant>,
}

impl<P: CapabilityProvider, F: EncoderFactory> CaptureSession<P, F> {
    /// Create a session bound to the process-wide registry.
    pub fn new(provider: P, encoders: F, config: SessionConfig) -> Self {
        Self::with_registry(provider, encoders, config, SessionRegistry::global())
    }

    pub fn with_registry(
        provider: P,
        encoders: F,
        config: SessionConfig,
        registry: SessionRegistry,
    ) -> Self {
        Self {
            provider,
            encoders,
            config,
            registry,
            delegate: None,
            state: CaptureState::Idle,
            slot: None,
            next_request_id: 1,
            grant: None,
            encoder: None,
            output: None,
            encoder_config: None,
            started_at: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn has_grant(&self) -> bool {
        self.grant.is_some()
    }

    pub fn has_encoder(&self) -> bool {
        self.encoder.is_some()
    }

    pub fn has_output(&self) -> bool {
        self.output.is_some()
    }

    /// Encoder parameters of the running recording.
    pub fn encoder_config(&self) -> Option<&EncoderConfig> {
        self.encoder_config.as_ref()
    }

    /// Seconds since the encoder started, while active.
    pub fn elapsed_secs(&self) -> Option<f64> {
        self.started_at.map(|t| t.elapsed().as_secs_f64())
    }

    /// Begin a recording.
    ///
    /// From `Idle`, either sets up immediately (a valid grant is held) or
    /// issues one consent request and moves to `AwaitingGrant`. Calling again
    /// while awaiting, active or stopping changes nothing.
    pub fn request_start(&mut self) -> Result<(), CaptureError> {
        if !self.state.is_idle() {
            log::debug!("Start ignored in state {}", self.state.name());
            return Ok(());
        }

        if let Err(msg) = self.config.validate() {
            let err = CaptureError::ConfigurationFailed(msg);
            self.notify_start_failed(&err);
            return Err(err);
        }

        if self.slot.is_none() {
            match self.registry.try_claim() {
                Ok(slot) => self.slot = Some(slot),
                Err(err) => {
                    log::warn!("Cannot start capture: {}", err);
                    self.notify_start_failed(&err);
                    return Err(err);
                }
            }
        }

        match self.grant.as_ref().map(|g| g.is_valid()) {
            Some(true) => return self.setup_and_start(),
            Some(false) => {
                log::info!("Releasing revoked capture grant before asking again");
                if let Some(grant) = self.grant.take() {
                    grant.release();
                }
            }
            None => {}
        }

        let request = ConsentRequest {
            request_id: self.next_request_id,
            scope: CaptureScope::ScreenContent,
        };
        self.next_request_id += 1;

        self.set_state(CaptureState::AwaitingGrant {
            request_id: request.request_id,
        });

        if let Err(e) = self.provider.request_consent(&request) {
            let err = reclassify(e, CaptureError::ConsentRequestFailed);
            log::error!("Consent request {} failed: {}", request.request_id, err);
            self.return_to_idle();
            self.notify_start_failed(&err);
            return Err(err);
        }

        log::info!("Requested screen capture consent (request {})", request.request_id);
        if let Some(ref delegate) = self.delegate {
            delegate.on_consent_requested(&request);
        }
        Ok(())
    }

    /// Deliver the outcome of the consent flow.
    ///
    /// Outcomes that do not match the outstanding request, or that arrive
    /// while not awaiting a grant, are ignored.
    pub fn on_grant_result(&mut self, outcome: GrantOutcome) -> Result<(), CaptureError> {
        let Some(pending) = self.state.pending_request() else {
            log::debug!(
                "Ignoring consent result for request {} in state {}",
                outcome.request_id(),
                self.state.name()
            );
            return Ok(());
        };
        if outcome.request_id() != pending {
            log::debug!(
                "Ignoring stale consent result for request {} (awaiting {})",
                outcome.request_id(),
                pending
            );
            return Ok(());
        }

        match outcome {
            GrantOutcome::Denied { .. } => {
                log::info!("Screen capture consent denied");
                let err = CaptureError::PermissionDenied;
                self.return_to_idle();
                self.notify_start_failed(&err);
                Err(err)
            }
            GrantOutcome::Granted { token, .. } => match self.provider.obtain_grant(token) {
                Ok(grant) => {
                    self.grant = Some(grant);
                    self.setup_and_start()
                }
                Err(e) => {
                    let err = match e {
                        CaptureError::PermissionDenied | CaptureError::GrantUnavailable(_) => e,
                        other => CaptureError::GrantUnavailable(other.to_string()),
                    };
                    log::error!("Failed to obtain capture grant: {}", err);
                    self.return_to_idle();
                    self.notify_start_failed(&err);
                    Err(err)
                }
            },
        }
    }

    /// Stop an active recording. A no-op in any other state.
    pub fn request_stop(&mut self) -> Option<RecordingResult> {
        if !self.state.is_active() {
            log::debug!("Stop ignored in state {}", self.state.name());
            return None;
        }
        log::info!("Stopping screen recording");
        self.teardown(Some(EndReason::Requested))
    }

    /// The encoder reported a failure while recording.
    pub fn on_encoder_failure(&mut self, error: CaptureError) -> Option<RecordingResult> {
        if !self.state.is_active() {
            log::debug!("Encoder failure ignored in state {}: {}", self.state.name(), error);
            return None;
        }
        let err = match error {
            CaptureError::EncoderFailed(_) => error,
            other => CaptureError::EncoderFailed(other.to_string()),
        };
        log::error!("Recording interrupted: {}", err);
        self.notify_error(&err);
        self.teardown(Some(EndReason::EncoderFailed))
    }

    /// The user or the OS revoked the grant while recording.
    pub fn on_grant_revoked(&mut self) -> Option<RecordingResult> {
        if !self.state.is_active() {
            log::debug!("Grant revocation ignored in state {}", self.state.name());
            return None;
        }
        let err = CaptureError::GrantRevoked;
        log::warn!("Recording interrupted: {}", err);
        self.notify_error(&err);
        self.teardown(Some(EndReason::GrantRevoked))
    }

    /// Bring the session back to `Idle` from any state.
    ///
    /// Stops an active recording; abandons an outstanding consent request
    /// (its eventual result will be ignored).
    pub fn shutdown(&mut self) -> Option<RecordingResult> {
        match self.state {
            CaptureState::Idle => None,
            CaptureState::Active => self.teardown(Some(EndReason::Dropped)),
            CaptureState::AwaitingGrant { request_id } => {
                log::info!("Abandoning consent request {}", request_id);
                self.teardown(None)
            }
            CaptureState::Stopping => self.teardown(None),
        }
    }

    // --- Internal helpers ---

    fn setup_and_start(&mut self) -> Result<(), CaptureError> {
        match self.acquire_pipeline() {
            Ok(()) => {
                self.started_at = Some(Instant::now());
                self.set_state(CaptureState::Active);
                if let Some(config) = &self.encoder_config {
                    log::info!(
                        "Recording {}x{} @ {} fps to {}",
                        config.width(),
                        config.height(),
                        config.frame_rate(),
                        config.output_path().display()
                    );
                }
                Ok(())
            }
            Err(err) => {
                log::error!("Recording did not start: {}", err);
                self.teardown(None);
                self.notify_start_failed(&err);
                Err(err)
            }
        }
    }

    /// Configure the encoder, bind the virtual output, start the encoder.
    ///
    /// Each acquired resource is stored before the next step runs, so a
    /// failure leaves exactly the acquired prefix for `teardown` to release.
    fn acquire_pipeline(&mut self) -> Result<(), CaptureError> {
        let encoder_config = EncoderConfig::for_session(&self.config);

        let encoder = self
            .encoders
            .create()
            .map_err(|e| reclassify(e, CaptureError::ConfigurationFailed))?;
        let encoder = self.encoder.insert(encoder);
        let surface = encoder
            .configure(&encoder_config)
            .map_err(|e| reclassify(e, CaptureError::ConfigurationFailed))?;
        self.encoder_config = Some(encoder_config);

        let grant = self
            .grant
            .as_mut()
            .ok_or_else(|| CaptureError::GrantUnavailable("no grant held".into()))?;
        let output = grant
            .bind_output(&self.config.virtual_output_params(), &surface)
            .map_err(|e| reclassify(e, CaptureError::OutputBindingFailed))?;
        log::debug!(
            "Bound virtual output '{}' to surface {}",
            output.params().name,
            surface.id
        );
        self.output = Some(output);

        if let Some(encoder) = self.encoder.as_mut() {
            encoder
                .start()
                .map_err(|e| reclassify(e, CaptureError::EncoderStartFailed))?;
        }
        Ok(())
    }

    /// Release everything held, encoder first and grant last.
    ///
    /// `end_reason` is set when a recording was running; a result is then
    /// produced for it.
    fn teardown(&mut self, end_reason: Option<EndReason>) -> Option<RecordingResult> {
        self.set_state(CaptureState::Stopping);

        let mut finalized = true;
        if let Some(mut encoder) = self.encoder.take() {
            if let Err(e) = encoder.stop() {
                let err = reclassify(e, CaptureError::EncoderStopFailed);
                log::warn!("Encoder did not stop cleanly: {}", err);
                finalized = false;
                self.notify_error(&err);
            }
            encoder.release();
        }
        if let Some(output) = self.output.take() {
            output.release();
        }
        if let Some(grant) = self.grant.take() {
            grant.release();
        }

        let duration_secs = self
            .started_at
            .take()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        let encoder_config = self.encoder_config.take();

        let result = match (end_reason, encoder_config) {
            (Some(reason), Some(config)) => {
                Some(self.build_result(config, duration_secs, reason, finalized))
            }
            _ => None,
        };

        self.return_to_idle();

        if let Some(ref result) = result {
            log::info!(
                "Recording finished after {:.1}s: {}",
                result.duration_secs,
                result.file_path.display()
            );
            if let Some(ref delegate) = self.delegate {
                delegate.on_capture_finished(result);
            }
        }
        result
    }

    fn build_result(
        &self,
        config: EncoderConfig,
        duration_secs: f64,
        end_reason: EndReason,
        finalized: bool,
    ) -> RecordingResult {
        let file_path = config.output_path().to_path_buf();
        let checksum = if file_path.exists() {
            match checksum::sha256_file(&file_path) {
                Ok(sum) => Some(sum),
                Err(e) => {
                    log::warn!("Failed to checksum recording: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let recording_metadata =
            RecordingMetadata::new(&config, duration_secs, end_reason, finalized, checksum.clone());

        if self.config.write_metadata_sidecar {
            if let Err(e) = metadata::write_metadata(&recording_metadata, &file_path) {
                log::warn!("Failed to write recording metadata: {}", e);
                self.notify_error(&e);
            }
        }

        RecordingResult {
            file_path,
            duration_secs,
            end_reason,
            finalized,
            checksum,
            metadata: recording_metadata,
        }
    }

    fn return_to_idle(&mut self) {
        self.set_state(CaptureState::Idle);
        self.slot = None;
    }

    fn set_state(&mut self, new_state: CaptureState) {
        log::debug!("Capture state {} -> {}", self.state.name(), new_state.name());
        self.state = new_state;
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&new_state);
        }
    }

    fn notify_start_failed(&self, error: &CaptureError) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_start_failed(error);
        }
    }

    fn notify_error(&self, error: &CaptureError) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(error);
        }
    }
}

impl<P: CapabilityProvider, F: EncoderFactory> Drop for CaptureSession<P, F> {
    fn drop(&mut self) {
        if !self.state.is_idle() {
            log::warn!("Capture session dropped in state {}", self.state.name());
            self.shutdown();
        }
    }
}

/// Keep errors already in the expected category; wrap anything else.
fn reclassify(error: CaptureError, wrap: fn(String) -> CaptureError) -> CaptureError {
    let wrapped = wrap(String::new());
    if std::mem::discriminant(&error) == std::mem::discriminant(&wrapped) {
        error
    } else {
        wrap(error.to_string())
    }
}
