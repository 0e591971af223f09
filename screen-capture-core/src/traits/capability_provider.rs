use crate::models::error::CaptureError;
use crate::models::handles::{ConsentRequest, ConsentToken, InputSurface, VirtualOutputParams};

/// System service that issues revocable capture grants.
///
/// Implemented by platform backends (e.g. an Android media projection
/// bridge or a desktop portal client).
pub trait CapabilityProvider: Send {
    type Grant: CaptureGrant;

    /// Ask the user for consent. Fire-and-forget: the outcome arrives later
    /// through `CaptureSession::on_grant_result`.
    fn request_consent(&mut self, request: &ConsentRequest) -> Result<(), CaptureError>;

    /// Exchange a positive consent for a usable grant.
    fn obtain_grant(&mut self, token: ConsentToken) -> Result<Self::Grant, CaptureError>;
}

/// A revocable capture grant. Releasing consumes it.
pub trait CaptureGrant: Send {
    type Output: VirtualOutput;

    /// False once the grant has been revoked by the user or the OS.
    fn is_valid(&self) -> bool;

    /// Route screen content into `surface`. Only one output may be bound
    /// per grant at a time.
    fn bind_output(
        &mut self,
        params: &VirtualOutputParams,
        surface: &InputSurface,
    ) -> Result<Self::Output, CaptureError>;

    fn release(self);
}

/// A virtual display routing captured content into an encoder surface.
pub trait VirtualOutput: Send {
    fn params(&self) -> &VirtualOutputParams;

    fn release(self);
}
