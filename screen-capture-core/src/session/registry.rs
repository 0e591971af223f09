//! Process-wide capture bookkeeping.
//!
//! At most one session may be away from `Idle` per registry, and the
//! platform binding is initialized once per registry. Production code uses
//! [`SessionRegistry::global`]; isolated registries exist for tests and for
//! hosts that embed several independent capture stacks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use crate::models::error::CaptureError;

static GLOBAL: OnceLock<SessionRegistry> = OnceLock::new();

#[derive(Clone, Default)]
pub struct SessionRegistry {
    slot: Arc<AtomicBool>,
    platform_ready: Arc<Mutex<bool>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> Self {
        GLOBAL.get_or_init(SessionRegistry::new).clone()
    }

    /// Claim the single session slot. Released when the returned guard drops.
    pub fn try_claim(&self) -> Result<SessionSlot, CaptureError> {
        self.slot
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| CaptureError::SessionBusy)?;
        Ok(SessionSlot {
            slot: Arc::clone(&self.slot),
        })
    }

    /// Whether some session currently holds the slot.
    pub fn is_busy(&self) -> bool {
        self.slot.load(Ordering::Acquire)
    }

    /// Run the one-time platform binding if it has not succeeded yet.
    ///
    /// A failed `init` leaves the platform unbound so the next call retries.
    pub fn ensure_platform_initialized<F>(&self, init: F) -> Result<(), CaptureError>
    where
        F: FnOnce() -> Result<(), CaptureError>,
    {
        let mut ready = self.platform_ready.lock();
        if *ready {
            return Ok(());
        }
        init().map_err(|e| match e {
            CaptureError::PlatformInitFailed(_) => e,
            other => CaptureError::PlatformInitFailed(other.to_string()),
        })?;
        log::info!("Platform capture binding initialized");
        *ready = true;
        Ok(())
    }

    pub fn is_platform_initialized(&self) -> bool {
        *self.platform_ready.lock()
    }

    /// Tear down the platform binding at process exit.
    ///
    /// Refused with `SessionBusy` while a session holds the slot. A no-op if
    /// the platform was never initialized.
    pub fn shutdown_platform<F>(&self, teardown: F) -> Result<(), CaptureError>
    where
        F: FnOnce(),
    {
        let mut ready = self.platform_ready.lock();
        if !*ready {
            return Ok(());
        }
        if self.is_busy() {
            return Err(CaptureError::SessionBusy);
        }
        teardown();
        *ready = false;
        log::info!("Platform capture binding shut down");
        Ok(())
    }
}

/// Exclusive claim on a registry's session slot.
pub struct SessionSlot {
    slot: Arc<AtomicBool>,
}

impl Drop for SessionSlot {
    fn drop(&mut self) {
        self.slot.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn single_slot() {
        let registry = SessionRegistry::new();
        let claim = registry.try_claim().unwrap();
        assert!(registry.is_busy());
        assert_eq!(registry.try_claim().err(), Some(CaptureError::SessionBusy));

        drop(claim);
        assert!(!registry.is_busy());
        assert!(registry.try_claim().is_ok());
    }

    #[test]
    fn clones_share_the_slot() {
        let registry = SessionRegistry::new();
        let other = registry.clone();
        let _claim = registry.try_claim().unwrap();
        assert!(other.is_busy());
    }

    #[test]
    fn platform_init_runs_once() {
        let registry = SessionRegistry::new();
        let calls = Cell::new(0);

        registry
            .ensure_platform_initialized(|| {
                calls.set(calls.get() + 1);
                Ok(())
            })
            .unwrap();
        registry
            .ensure_platform_initialized(|| {
                calls.set(calls.get() + 1);
                Ok(())
            })
            .unwrap();

        assert_eq!(calls.get(), 1);
        assert!(registry.is_platform_initialized());
    }

    #[test]
    fn failed_init_is_retried() {
        let registry = SessionRegistry::new();
        let err = registry
            .ensure_platform_initialized(|| Err(CaptureError::StorageError("no library".into())))
            .unwrap_err();
        assert!(matches!(err, CaptureError::PlatformInitFailed(_)));
        assert!(!registry.is_platform_initialized());

        registry.ensure_platform_initialized(|| Ok(())).unwrap();
        assert!(registry.is_platform_initialized());
    }

    #[test]
    fn shutdown_refused_while_busy() {
        let registry = SessionRegistry::new();
        registry.ensure_platform_initialized(|| Ok(())).unwrap();

        let claim = registry.try_claim().unwrap();
        let torn_down = Cell::new(false);
        assert_eq!(
            registry.shutdown_platform(|| torn_down.set(true)),
            Err(CaptureError::SessionBusy)
        );
        assert!(!torn_down.get());

        drop(claim);
        registry.shutdown_platform(|| torn_down.set(true)).unwrap();
        assert!(torn_down.get());
        assert!(!registry.is_platform_initialized());
    }
}
