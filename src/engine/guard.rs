//! Admission state and its scope-bound release.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::Notify;

use crate::telemetry::metrics;

/// Live concurrency-control state shared by every clone of a dispatcher.
pub(crate) struct AdmissionState {
    pub(crate) capacity: usize,
    in_flight: AtomicUsize,
    resources: Mutex<HashSet<String>>,
    /// Woken on every release; `drain` waits on it.
    released: Notify,
}

impl AdmissionState {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            in_flight: AtomicUsize::new(0),
            resources: Mutex::new(HashSet::new()),
            released: Notify::new(),
        }
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub(crate) fn is_in_flight(&self, resource: &str) -> bool {
        self.resources().contains(resource)
    }

    pub(crate) fn at_capacity(&self) -> bool {
        self.in_flight() >= self.capacity
    }

    /// Speculative increment ahead of the dedup check.
    pub(crate) fn reserve_slot(&self) {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
    }

    /// Undo [`reserve_slot`](Self::reserve_slot) when the dedup check fails.
    pub(crate) fn unreserve_slot(&self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
        self.released.notify_waiters();
    }

    /// Check-and-insert under the lock. False if the key is already taken.
    pub(crate) fn claim_resource(&self, resource: &str) -> bool {
        self.resources().insert(resource.to_string())
    }

    pub(crate) async fn wait_idle(&self) {
        loop {
            // Created before the check so a release in between is not missed.
            let released = self.released.notified();
            if self.in_flight() == 0 {
                return;
            }
            released.await;
        }
    }

    fn resources(&self) -> MutexGuard<'_, HashSet<String>> {
        // Nothing panics while holding this lock; ignore poisoning.
        self.resources.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn release(&self, resource: &str) {
        {
            let mut resources = self.resources();
            resources.remove(resource);
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
        }
        metrics::in_flight().add(-1, &[]);
        self.released.notify_waiters();
    }
}

/// One admitted unit of work's hold on a capacity slot and a dedup key.
///
/// Dropping the guard releases both, exactly once. The guard travels into the
/// background task, so release happens whether that task returns normally,
/// returns early, or unwinds from a panic.
pub(crate) struct AdmissionGuard {
    state: Arc<AdmissionState>,
    resource: String,
}

impl AdmissionGuard {
    /// Take ownership of a slot and key already reserved on `state`.
    pub(crate) fn new(state: Arc<AdmissionState>, resource: String) -> Self {
        metrics::in_flight().add(1, &[]);
        Self { state, resource }
    }
}

impl Drop for AdmissionGuard {
    fn drop(&mut self) {
        self.state.release(&self.resource);
        tracing::debug!(resource = %self.resource, "admission released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_releases_slot_and_key_on_drop() {
        let state = Arc::new(AdmissionState::new(2));
        state.reserve_slot();
        assert!(state.claim_resource("scan/1"));
        let guard = AdmissionGuard::new(Arc::clone(&state), "scan/1".to_string());

        assert_eq!(state.in_flight(), 1);
        assert!(!state.claim_resource("scan/1"));

        drop(guard);
        assert_eq!(state.in_flight(), 0);
        assert!(!state.is_in_flight("scan/1"));
    }

    #[test]
    fn guard_releases_during_unwind() {
        let state = Arc::new(AdmissionState::new(1));
        state.reserve_slot();
        assert!(state.claim_resource("scan/2"));

        fn hold_and_panic(state: Arc<AdmissionState>) {
            let _guard = AdmissionGuard::new(state, "scan/2".to_string());
            panic!("classification blew up");
        }

        let for_thread = Arc::clone(&state);
        let joined = std::thread::spawn(move || hold_and_panic(for_thread)).join();

        assert!(joined.is_err());
        assert_eq!(state.in_flight(), 0);
        assert!(state.claim_resource("scan/2"));
    }

    #[tokio::test]
    async fn wait_idle_returns_immediately_when_idle() {
        let state = AdmissionState::new(1);
        tokio::time::timeout(std::time::Duration::from_secs(1), state.wait_idle())
            .await
            .expect("idle state should not block");
    }
}
