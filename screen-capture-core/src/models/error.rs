use thiserror::Error;

/// Errors that can occur during screen capture operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("capture grant unavailable: {0}")]
    GrantUnavailable(String),

    #[error("consent request failed: {0}")]
    ConsentRequestFailed(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("output binding failed: {0}")]
    OutputBindingFailed(String),

    #[error("encoder start failed: {0}")]
    EncoderStartFailed(String),

    #[error("encoder stop failed: {0}")]
    EncoderStopFailed(String),

    #[error("encoder failed: {0}")]
    EncoderFailed(String),

    #[error("capture grant revoked")]
    GrantRevoked,

    #[error("another capture session is already running")]
    SessionBusy,

    #[error("platform initialization failed: {0}")]
    PlatformInitFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("session driver is not running")]
    DriverUnavailable,
}

/// Coarse error category used by hosts to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Consent denied, revoked, or unobtainable. The user may retry.
    Permission,
    /// Encoder parameters rejected. Not expected with the stock constants.
    Configuration,
    /// Encoder surface or virtual output could not be wired up.
    ResourceBinding,
    /// A resource failed to stop or release. Logged, never fatal.
    Shutdown,
    /// Session bookkeeping: busy slot, dead driver, platform init.
    Session,
    Storage,
}

impl CaptureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PermissionDenied
            | Self::GrantUnavailable(_)
            | Self::ConsentRequestFailed(_)
            | Self::GrantRevoked => ErrorKind::Permission,
            Self::ConfigurationFailed(_) => ErrorKind::Configuration,
            Self::OutputBindingFailed(_)
            | Self::EncoderStartFailed(_)
            | Self::EncoderFailed(_) => ErrorKind::ResourceBinding,
            Self::EncoderStopFailed(_) => ErrorKind::Shutdown,
            Self::SessionBusy | Self::PlatformInitFailed(_) | Self::DriverUnavailable => {
                ErrorKind::Session
            }
            Self::StorageError(_) => ErrorKind::Storage,
        }
    }

    /// Whether retrying the same operation later can reasonably succeed.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self.kind(),
            ErrorKind::Configuration | ErrorKind::Shutdown
        ) && !matches!(self, Self::DriverUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_mapping() {
        assert_eq!(CaptureError::PermissionDenied.kind(), ErrorKind::Permission);
        assert_eq!(CaptureError::GrantRevoked.kind(), ErrorKind::Permission);
        assert_eq!(
            CaptureError::ConfigurationFailed("bad".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            CaptureError::OutputBindingFailed("no surface".into()).kind(),
            ErrorKind::ResourceBinding
        );
        assert_eq!(
            CaptureError::EncoderStopFailed("stuck".into()).kind(),
            ErrorKind::Shutdown
        );
        assert_eq!(CaptureError::SessionBusy.kind(), ErrorKind::Session);
    }

    #[test]
    fn recoverability() {
        assert!(CaptureError::PermissionDenied.is_recoverable());
        assert!(CaptureError::OutputBindingFailed("x".into()).is_recoverable());
        assert!(CaptureError::SessionBusy.is_recoverable());
        assert!(!CaptureError::ConfigurationFailed("x".into()).is_recoverable());
        assert!(!CaptureError::EncoderStopFailed("x".into()).is_recoverable());
        assert!(!CaptureError::DriverUnavailable.is_recoverable());
    }

    #[test]
    fn display_messages() {
        assert_eq!(CaptureError::PermissionDenied.to_string(), "permission denied");
        assert_eq!(
            CaptureError::OutputBindingFailed("surface gone".into()).to_string(),
            "output binding failed: surface gone"
        );
    }
}
