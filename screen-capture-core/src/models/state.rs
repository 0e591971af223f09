/// Capture session state machine.
///
/// State transitions:
/// ```text
/// idle → awaiting_grant → active → stopping → idle
///            │               ↑
///            └── denied ─────┼──→ idle
///   (setup failure) ─────→ stopping → idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    /// A consent request is outstanding. May remain here indefinitely.
    AwaitingGrant { request_id: u64 },
    Active,
    Stopping,
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_awaiting_grant(&self) -> bool {
        matches!(self, Self::AwaitingGrant { .. })
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Identifier of the outstanding consent request, if any.
    pub fn pending_request(&self) -> Option<u64> {
        match self {
            Self::AwaitingGrant { request_id } => Some(*request_id),
            _ => None,
        }
    }

    /// Stable lowercase name for host-facing payloads.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingGrant { .. } => "awaiting_grant",
            Self::Active => "active",
            Self::Stopping => "stopping",
        }
    }
}

impl Default for CaptureState {
    fn default() -> Self {
        Self::Idle
    }
}
