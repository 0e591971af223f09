//! Serialized command queue for a capture session.
//!
//! The session lives on a dedicated thread. Hosts enqueue commands from any
//! thread (UI, OS consent callback, encoder error listener) and the driver
//! applies them one at a time in arrival order.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::handles::GrantOutcome;
use crate::models::state::CaptureState;
use crate::session::capture::CaptureSession;
use crate::traits::capability_provider::CapabilityProvider;
use crate::traits::encoder_pipeline::EncoderFactory;

enum Command {
    Start,
    GrantResult(GrantOutcome),
    Stop,
    EncoderFailure(CaptureError),
    GrantRevoked,
    QueryState(mpsc::Sender<CaptureState>),
    Shutdown,
}

/// Cloneable, thread-safe front end to a driven session.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    state: Arc<Mutex<CaptureState>>,
}

impl SessionHandle {
    pub fn start(&self) -> Result<(), CaptureError> {
        self.send(Command::Start)
    }

    pub fn stop(&self) -> Result<(), CaptureError> {
        self.send(Command::Stop)
    }

    /// Relay the OS consent result.
    pub fn deliver_grant_result(&self, outcome: GrantOutcome) -> Result<(), CaptureError> {
        self.send(Command::GrantResult(outcome))
    }

    pub fn report_encoder_failure(&self, error: CaptureError) -> Result<(), CaptureError> {
        self.send(Command::EncoderFailure(error))
    }

    pub fn report_grant_revoked(&self) -> Result<(), CaptureError> {
        self.send(Command::GrantRevoked)
    }

    /// Last state published by the driver thread.
    pub fn state(&self) -> CaptureState {
        *self.state.lock()
    }

    /// State after every command queued before this call has been applied.
    pub fn query_state(&self) -> Result<CaptureState, CaptureError> {
        let (tx, rx) = mpsc::channel();
        self.send(Command::QueryState(tx))?;
        rx.recv().map_err(|_| CaptureError::DriverUnavailable)
    }

    fn send(&self, command: Command) -> Result<(), CaptureError> {
        self.commands
            .send(command)
            .map_err(|_| CaptureError::DriverUnavailable)
    }
}

/// Owns the session thread.
pub struct SessionDriver<P, F>
where
    P: CapabilityProvider + 'static,
    F: EncoderFactory + 'static,
{
    handle: SessionHandle,
    thread: Option<thread::JoinHandle<CaptureSession<P, F>>>,
}

impl<P, F> SessionDriver<P, F>
where
    P: CapabilityProvider + 'static,
    F: EncoderFactory + 'static,
{
    /// Move `session` onto a dedicated thread.
    pub fn spawn(mut session: CaptureSession<P, F>) -> Result<Self, CaptureError> {
        let (tx, rx) = mpsc::channel::<Command>();
        let state = Arc::new(Mutex::new(session.state()));
        let published = Arc::clone(&state);

        let thread = thread::Builder::new()
            .name("capture-session".into())
            .spawn(move || {
                while let Ok(command) = rx.recv() {
                    if !Self::apply(&mut session, command) {
                        break;
                    }
                    *published.lock() = session.state();
                }
                session.shutdown();
                *published.lock() = session.state();
                log::debug!("Capture session driver exiting");
                session
            })
            .map_err(|e| {
                log::error!("Failed to spawn capture session thread: {}", e);
                CaptureError::DriverUnavailable
            })?;

        Ok(Self {
            handle: SessionHandle {
                commands: tx,
                state,
            },
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Drain queued commands, tear down anything live, and return the session.
    pub fn shutdown(mut self) -> Result<CaptureSession<P, F>, CaptureError> {
        let _ = self.handle.send(Command::Shutdown);
        let thread = self.thread.take().ok_or(CaptureError::DriverUnavailable)?;
        thread.join().map_err(|_| {
            log::error!("Capture session thread panicked");
            CaptureError::DriverUnavailable
        })
    }

    /// Returns false when the driver should exit.
    fn apply(session: &mut CaptureSession<P, F>, command: Command) -> bool {
        match command {
            Command::Start => {
                if let Err(e) = session.request_start() {
                    log::warn!("Start failed: {}", e);
                }
            }
            Command::GrantResult(outcome) => {
                if let Err(e) = session.on_grant_result(outcome) {
                    log::warn!("Recording did not start: {}", e);
                }
            }
            Command::Stop => {
                session.request_stop();
            }
            Command::EncoderFailure(error) => {
                session.on_encoder_failure(error);
            }
            Command::GrantRevoked => {
                session.on_grant_revoked();
            }
            Command::QueryState(reply) => {
                let _ = reply.send(session.state());
            }
            Command::Shutdown => return false,
        }
        true
    }
}

impl<P, F> Drop for SessionDriver<P, F>
where
    P: CapabilityProvider + 'static,
    F: EncoderFactory + 'static,
{
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.handle.send(Command::Shutdown);
            let _ = thread.join();
        }
    }
}
