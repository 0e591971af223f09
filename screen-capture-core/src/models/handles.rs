/// Capability scope carried by a consent request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureScope {
    ScreenContent,
}

/// Outbound consent request. One per `AwaitingGrant` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentRequest {
    pub request_id: u64,
    pub scope: CaptureScope,
}

/// Opaque proof of user consent, exchanged for a grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentToken(pub Vec<u8>);

/// Result of the OS consent flow, relayed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantOutcome {
    Granted { request_id: u64, token: ConsentToken },
    Denied { request_id: u64 },
}

impl GrantOutcome {
    pub fn request_id(&self) -> u64 {
        match self {
            Self::Granted { request_id, .. } | Self::Denied { request_id } => *request_id,
        }
    }
}

/// The encoder's input surface. Valid from a successful `configure`
/// until the encoder is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputSurface {
    pub id: u64,
    pub width: u32,
    pub height: u32,
}

/// Geometry and flags for a virtual output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualOutputParams {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub density_dpi: u32,
    pub auto_mirror: bool,
}
