//! Per-service operation locks
//!
//! Every lifecycle operation on a service runs while holding that service's guard, so
//! operations on one name are serialized while different names proceed in parallel.
//! The guard also carries the transitional state reported by `status`, and a launch
//! counter that lets a waiting start tell whether a launch completed while it waited.

use crate::domain::ServiceState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::sync::OwnedMutexGuard;
use tracing::debug;

#[derive(Default)]
struct ServiceSlot {
    operation: Arc<tokio::sync::Mutex<()>>,
    phase: RwLock<Option<ServiceState>>,
    launches: AtomicU64,
}

/// Keyed map of operation locks
#[derive(Default)]
pub struct ServiceLocks {
    slots: Mutex<HashMap<String, Arc<ServiceSlot>>>,
}

impl ServiceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `service`
    pub async fn acquire(&self, service: &str) -> ServiceGuard {
        let slot = self.slot(service);
        let guard = slot.operation.clone().lock_owned().await;
        debug!(service = %service, "Acquired service lock");
        ServiceGuard {
            service: service.to_string(),
            slot,
            _guard: guard,
        }
    }

    /// Transitional state of an operation in flight on `service`
    pub fn phase(&self, service: &str) -> Option<ServiceState> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(service).and_then(|slot| {
            *slot
                .phase
                .read()
                .unwrap_or_else(PoisonError::into_inner)
        })
    }

    /// Number of launches of `service` so far
    pub fn launches(&self, service: &str) -> u64 {
        self.slot(service).launches.load(Ordering::SeqCst)
    }

    fn slot(&self, service: &str) -> Arc<ServiceSlot> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(service.to_string()).or_default().clone()
    }
}

/// Exclusive access to one service, released on drop
pub struct ServiceGuard {
    service: String,
    slot: Arc<ServiceSlot>,
    _guard: OwnedMutexGuard<()>,
}

impl ServiceGuard {
    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn launches(&self) -> u64 {
        self.slot.launches.load(Ordering::SeqCst)
    }

    /// Count a launch made under this guard
    pub fn record_launch(&self) {
        self.slot.launches.fetch_add(1, Ordering::SeqCst);
    }

    /// Publish the transitional state of the running operation
    pub fn set_phase(&self, state: ServiceState) {
        *self
            .slot
            .phase
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(state);
    }
}

impl Drop for ServiceGuard {
    fn drop(&mut self) {
        *self
            .slot
            .phase
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
        debug!(service = %self.service, "Released service lock");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_service_is_serialized() {
        let locks = Arc::new(ServiceLocks::new());
        let guard = locks.acquire("api").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("api").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should acquire after release")
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_services_do_not_block() {
        let locks = ServiceLocks::new();
        let _api = locks.acquire("api").await;

        let db = tokio::time::timeout(Duration::from_millis(100), locks.acquire("db")).await;
        assert!(db.is_ok());
    }

    #[tokio::test]
    async fn test_phase_is_cleared_on_release() {
        let locks = ServiceLocks::new();
        assert_eq!(locks.phase("api"), None);

        let guard = locks.acquire("api").await;
        guard.set_phase(ServiceState::Starting);
        assert_eq!(locks.phase("api"), Some(ServiceState::Starting));

        drop(guard);
        assert_eq!(locks.phase("api"), None);
    }

    #[tokio::test]
    async fn test_launch_counter() {
        let locks = ServiceLocks::new();
        let seen = locks.launches("api");

        let guard = locks.acquire("api").await;
        assert_eq!(guard.launches(), seen);
        guard.record_launch();
        drop(guard);

        assert_eq!(locks.launches("api"), seen + 1);
        assert_eq!(locks.launches("db"), 0);
    }
}
