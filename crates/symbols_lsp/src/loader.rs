//! Workspace-loader state machine (C4)
//!
//! The loader is the single source of truth for workspace readiness;
//! validation (C8) reads [`stores::WorkspaceReadinessStore`] directly, but
//! only a loader ever writes to it. Pluggable over
//! `{initialize, update_state, is_ready}` so servers with unusual
//! project-load signaling (Roslyn's solution load, in particular) can
//! override the default "ready once preload is dispatched" policy without
//! touching C3 or C7.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::stores::{WorkspaceReadinessStore, WorkspaceState};

/// An event the loader may use to decide whether the workspace is ready.
/// Limited to what the server actually tells us, plus one synthetic event
/// for "we finished dispatching the preload set".
#[derive(Debug, Clone)]
pub enum LoaderEvent {
    ProjectInitializationComplete,
    VendorLoadSignal { source: String, payload: serde_json::Value },
    PreloadFinished,
}

/// A pluggable workspace readiness policy.
#[async_trait]
pub trait WorkspaceLoader: Send + Sync {
    /// Called once right after the `initialized` notification is sent.
    /// Establishes the starting state and may immediately transition to
    /// `Ready` (e.g. when there is no preload set).
    async fn initialize(&self, store: &WorkspaceReadinessStore, preload_is_empty: bool);

    /// Called for every event the session's notification handlers observe
    /// that might affect readiness.
    fn update_state(&self, store: &WorkspaceReadinessStore, event: LoaderEvent);
}

fn now() -> chrono::DateTime<chrono::Utc> {
    chrono::Utc::now()
}

/// Goes `Loading -> Ready` as soon as the preload set (if any) has been
/// dispatched; most language servers need no further readiness signal.
pub struct DefaultLoader;

#[async_trait]
impl WorkspaceLoader for DefaultLoader {
    async fn initialize(&self, store: &WorkspaceReadinessStore, preload_is_empty: bool) {
        store.transition(WorkspaceState::Loading, now());
        if preload_is_empty {
            store.transition(WorkspaceState::Ready, now());
        }
    }

    fn update_state(&self, store: &WorkspaceReadinessStore, event: LoaderEvent) {
        if matches!(event, LoaderEvent::PreloadFinished) {
            store.transition(WorkspaceState::Ready, now());
        }
    }
}

/// Remains `Loading` until Roslyn announces `workspace/projectInitializationComplete`
/// or a vendor "solution loaded" toast is observed. Workspace-wide search and
/// any first touch of a non-preloaded file are gated until then (enforced by
/// C8 reading the readiness store, not by this loader).
pub struct RoslynLoader;

#[async_trait]
impl WorkspaceLoader for RoslynLoader {
    async fn initialize(&self, store: &WorkspaceReadinessStore, _preload_is_empty: bool) {
        store.transition(WorkspaceState::Loading, now());
    }

    fn update_state(&self, store: &WorkspaceReadinessStore, event: LoaderEvent) {
        match event {
            LoaderEvent::ProjectInitializationComplete => {
                store.transition(WorkspaceState::Ready, now());
            }
            LoaderEvent::VendorLoadSignal { source, .. } if source == "csharp.solutionLoaded" => {
                store.transition(WorkspaceState::Ready, now());
            }
            _ => {}
        }
    }
}

/// Name-based registry of loader variants, with a guaranteed fallback to
/// [`DefaultLoader`] for unregistered names so an unrecognized
/// `workspace_loader` value in a [`crate::config::ServerDescriptor`] never
/// prevents the session from starting.
pub struct LoaderRegistry {
    loaders: HashMap<String, Arc<dyn WorkspaceLoader>>,
}

impl LoaderRegistry {
    /// A registry seeded with the built-in variants.
    pub fn with_builtins() -> Self {
        let mut loaders: HashMap<String, Arc<dyn WorkspaceLoader>> = HashMap::new();
        loaders.insert("default".to_string(), Arc::new(DefaultLoader));
        loaders.insert("roslyn".to_string(), Arc::new(RoslynLoader));
        Self { loaders }
    }

    /// Register or replace a loader under `name`.
    pub fn register(&mut self, name: impl Into<String>, loader: Arc<dyn WorkspaceLoader>) {
        self.loaders.insert(name.into(), loader);
    }

    /// Resolve a loader by name, falling back to [`DefaultLoader`] with a
    /// warning when `name` is not registered (§4.4: unknown names fall back
    /// to Default without failing startup).
    pub fn resolve(&self, name: &str) -> Arc<dyn WorkspaceLoader> {
        match self.loaders.get(name) {
            Some(loader) => loader.clone(),
            None => {
                warn!(name, "unknown workspace_loader, falling back to default");
                self.loaders
                    .get("default")
                    .cloned()
                    .unwrap_or_else(|| Arc::new(DefaultLoader))
            }
        }
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
