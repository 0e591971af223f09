//! # screen-capture-core
//!
//! Platform-agnostic screen recording core.
//!
//! Sequences the consent handshake, encoder configuration, virtual output
//! binding and teardown for a single screen recording session. Platform
//! backends (Android media projection, desktop portals) implement the
//! `CapabilityProvider` and `EncoderFactory` traits and plug into the
//! generic `CaptureSession`.
//!
//! ## Architecture
//!
//! ```text
//! screen-capture-core (this crate)
//! ├── traits/       ← CapabilityProvider, CaptureGrant, VirtualOutput, EncoderPipeline, CaptureDelegate
//! ├── models/       ← CaptureError, CaptureState, SessionConfig, EncoderConfig, handles, results
//! ├── session/      ← CaptureSession (state machine), SessionDriver (command queue), SessionRegistry
//! └── storage/      ← metadata sidecar, checksums
//! ```
//!
//! ## Usage
//! ```ignore
//! use screen_capture_core::{CaptureSession, SessionConfig, SessionDriver};
//!
//! let session = CaptureSession::new(projection, recorders, SessionConfig::default());
//! let driver = SessionDriver::spawn(session)?;
//! let handle = driver.handle();
//! handle.start()?;
//! // ... later, from the OS consent callback:
//! handle.deliver_grant_result(outcome)?;
//! ```

pub mod models;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::{ContainerFormat, EncoderConfig, SessionConfig, VideoCodec};
pub use models::error::{CaptureError, ErrorKind};
pub use models::handles::{
    CaptureScope, ConsentRequest, ConsentToken, GrantOutcome, InputSurface, VirtualOutputParams,
};
pub use models::recording_result::{EndReason, RecordingMetadata, RecordingResult};
pub use models::state::CaptureState;
pub use session::capture::CaptureSession;
pub use session::driver::{SessionDriver, SessionHandle};
pub use session::registry::{SessionRegistry, SessionSlot};
pub use traits::capability_provider::{CapabilityProvider, CaptureGrant, VirtualOutput};
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::encoder_pipeline::{EncoderFactory, EncoderPipeline};
