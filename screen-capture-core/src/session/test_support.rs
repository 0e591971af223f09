//! Scripted collaborators that record every call into a shared event log.

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::config::{EncoderConfig, SessionConfig};
use crate::models::error::CaptureError;
use crate::models::handles::{ConsentRequest, ConsentToken, InputSurface, VirtualOutputParams};
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;
use crate::session::capture::CaptureSession;
use crate::session::registry::SessionRegistry;
use crate::traits::capability_provider::{CapabilityProvider, CaptureGrant, VirtualOutput};
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::encoder_pipeline::{EncoderFactory, EncoderPipeline};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ConsentRequested(u64),
    GrantObtained,
    EncoderCreated,
    EncoderConfigured,
    OutputBound,
    EncoderStarted,
    EncoderStopped,
    EncoderReleased,
    OutputReleased,
    GrantReleased,
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

/// Which collaborator calls should fail.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub fail_consent_request: bool,
    pub fail_obtain: bool,
    pub fail_bind: bool,
    pub fail_configure: bool,
    pub fail_start: bool,
    pub fail_stop: bool,
    /// Have the encoder write bytes to its output path when started.
    pub write_output: bool,
}

pub struct MockProvider {
    log: EventLog,
    script: Script,
    grant_valid: Arc<AtomicBool>,
}

pub struct MockGrant {
    log: EventLog,
    fail_bind: bool,
    valid: Arc<AtomicBool>,
}

pub struct MockOutput {
    log: EventLog,
    params: VirtualOutputParams,
}

impl CapabilityProvider for MockProvider {
    type Grant = MockGrant;

    fn request_consent(&mut self, request: &ConsentRequest) -> Result<(), CaptureError> {
        if self.script.fail_consent_request {
            return Err(CaptureError::ConsentRequestFailed("no activity".into()));
        }
        self.log.lock().push(Event::ConsentRequested(request.request_id));
        Ok(())
    }

    fn obtain_grant(&mut self, _token: ConsentToken) -> Result<MockGrant, CaptureError> {
        if self.script.fail_obtain {
            return Err(CaptureError::GrantUnavailable("projection token expired".into()));
        }
        self.log.lock().push(Event::GrantObtained);
        self.grant_valid.store(true, Ordering::SeqCst);
        Ok(MockGrant {
            log: Arc::clone(&self.log),
            fail_bind: self.script.fail_bind,
            valid: Arc::clone(&self.grant_valid),
        })
    }
}

impl CaptureGrant for MockGrant {
    type Output = MockOutput;

    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    fn bind_output(
        &mut self,
        params: &VirtualOutputParams,
        _surface: &InputSurface,
    ) -> Result<MockOutput, CaptureError> {
        if self.fail_bind {
            return Err(CaptureError::OutputBindingFailed("display refused surface".into()));
        }
        self.log.lock().push(Event::OutputBound);
        Ok(MockOutput {
            log: Arc::clone(&self.log),
            params: params.clone(),
        })
    }

    fn release(self) {
        self.valid.store(false, Ordering::SeqCst);
        self.log.lock().push(Event::GrantReleased);
    }
}

impl VirtualOutput for MockOutput {
    fn params(&self) -> &VirtualOutputParams {
        &self.params
    }

    fn release(self) {
        self.log.lock().push(Event::OutputReleased);
    }
}

pub struct MockEncoders {
    log: EventLog,
    script: Script,
}

pub struct MockEncoder {
    log: EventLog,
    script: Script,
    surface: Option<InputSurface>,
    output_path: Option<std::path::PathBuf>,
}

impl EncoderFactory for MockEncoders {
    type Pipeline = MockEncoder;

    fn create(&mut self) -> Result<MockEncoder, CaptureError> {
        self.log.lock().push(Event::EncoderCreated);
        Ok(MockEncoder {
            log: Arc::clone(&self.log),
            script: self.script.clone(),
            surface: None,
            output_path: None,
        })
    }
}

impl EncoderPipeline for MockEncoder {
    fn configure(&mut self, config: &EncoderConfig) -> Result<InputSurface, CaptureError> {
        if self.script.fail_configure {
            return Err(CaptureError::ConfigurationFailed("profile not supported".into()));
        }
        self.log.lock().push(Event::EncoderConfigured);
        let surface = InputSurface {
            id: 7,
            width: config.width(),
            height: config.height(),
        };
        self.surface = Some(surface);
        self.output_path = Some(config.output_path().to_path_buf());
        Ok(surface)
    }

    fn input_surface(&self) -> Option<InputSurface> {
        self.surface
    }

    fn start(&mut self) -> Result<(), CaptureError> {
        if self.script.fail_start {
            return Err(CaptureError::EncoderStartFailed("codec busy".into()));
        }
        if self.script.write_output {
            if let Some(path) = &self.output_path {
                fs::write(path, b"ftypmp42").expect("write mock output");
            }
        }
        self.log.lock().push(Event::EncoderStarted);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.log.lock().push(Event::EncoderStopped);
        if self.script.fail_stop {
            return Err(CaptureError::EncoderStopFailed("no frames received".into()));
        }
        Ok(())
    }

    fn release(self) {
        self.log.lock().push(Event::EncoderReleased);
    }
}

/// Delegate capturing every notification.
#[derive(Default)]
pub struct RecordingDelegate {
    pub states: Mutex<Vec<CaptureState>>,
    pub consent_requests: Mutex<Vec<u64>>,
    pub start_failures: Mutex<Vec<CaptureError>>,
    pub errors: Mutex<Vec<CaptureError>>,
    pub finished: Mutex<Vec<RecordingResult>>,
}

impl CaptureDelegate for RecordingDelegate {
    fn on_state_changed(&self, state: &CaptureState) {
        self.states.lock().push(*state);
    }

    fn on_consent_requested(&self, request: &ConsentRequest) {
        self.consent_requests.lock().push(request.request_id);
    }

    fn on_start_failed(&self, error: &CaptureError) {
        self.start_failures.lock().push(error.clone());
    }

    fn on_error(&self, error: &CaptureError) {
        self.errors.lock().push(error.clone());
    }

    fn on_capture_finished(&self, result: &RecordingResult) {
        self.finished.lock().push(result.clone());
    }
}

pub type MockSession = CaptureSession<MockProvider, MockEncoders>;

pub struct Harness {
    pub session: MockSession,
    pub log: EventLog,
    pub delegate: Arc<RecordingDelegate>,
    pub registry: SessionRegistry,
}

impl Harness {
    pub fn new(script: Script) -> Self {
        Self::with_config(script, SessionConfig::default())
    }

    pub fn with_config(script: Script, config: SessionConfig) -> Self {
        Self::with_registry(script, config, SessionRegistry::new())
    }

    pub fn with_registry(script: Script, config: SessionConfig, registry: SessionRegistry) -> Self {
        let log: EventLog = Arc::new(Mutex::new(Vec::new()));
        let grant_valid = Arc::new(AtomicBool::new(false));
        let provider = MockProvider {
            log: Arc::clone(&log),
            script: script.clone(),
            grant_valid,
        };
        let encoders = MockEncoders {
            log: Arc::clone(&log),
            script,
        };
        let delegate = Arc::new(RecordingDelegate::default());
        let mut session =
            CaptureSession::with_registry(provider, encoders, config, registry.clone());
        session.set_delegate(delegate.clone());
        Self {
            session,
            log,
            delegate,
            registry,
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.lock().clone()
    }
}

pub fn token() -> ConsentToken {
    ConsentToken(vec![0x01, 0x02])
}
