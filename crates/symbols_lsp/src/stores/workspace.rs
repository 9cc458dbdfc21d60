//! Workspace readiness store (C2)
//!
//! Holds the current state of the workspace-loader state machine (C4 is the
//! policy that drives transitions; this module is just the guarded cell
//! those transitions are written into). Validation (C8) reads
//! [`WorkspaceReadinessStore::is_ready`] directly.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// Readiness states a workspace passes through between session start and
/// becoming usable for workspace-wide operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceState {
    Uninitialized,
    Initializing,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone)]
struct Readiness {
    state: WorkspaceState,
    loading_started_at: Option<DateTime<Utc>>,
    ready_at: Option<DateTime<Utc>>,
}

/// The guarded readiness cell. `transition` is the single entry point a
/// [`crate::loader::WorkspaceLoader`] uses to move the state forward.
pub struct WorkspaceReadinessStore {
    inner: RwLock<Readiness>,
}

impl WorkspaceReadinessStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Readiness {
                state: WorkspaceState::Uninitialized,
                loading_started_at: None,
                ready_at: None,
            }),
        }
    }

    pub fn state(&self) -> WorkspaceState {
        self.inner.read().state
    }

    pub fn is_ready(&self) -> bool {
        self.state() == WorkspaceState::Ready
    }

    /// Move to a new state, stamping the relevant timestamp.
    pub fn transition(&self, state: WorkspaceState, now: DateTime<Utc>) {
        let mut inner = self.inner.write();
        if state == WorkspaceState::Loading && inner.loading_started_at.is_none() {
            inner.loading_started_at = Some(now);
        }
        if state == WorkspaceState::Ready {
            inner.ready_at = Some(now);
        }
        inner.state = state;
    }

    pub fn loading_started_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().loading_started_at
    }

    pub fn ready_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().ready_at
    }
}

impl Default for WorkspaceReadinessStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uninitialized_and_not_ready() {
        let store = WorkspaceReadinessStore::new();
        assert_eq!(store.state(), WorkspaceState::Uninitialized);
        assert!(!store.is_ready());
    }

    #[test]
    fn ready_at_is_stamped_on_transition() {
        let store = WorkspaceReadinessStore::new();
        let now = Utc::now();
        store.transition(WorkspaceState::Loading, now);
        store.transition(WorkspaceState::Ready, now);
        assert!(store.is_ready());
        assert_eq!(store.ready_at(), Some(now));
    }
}
