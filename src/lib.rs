pub mod api;
pub mod config;
pub mod error;
pub mod launcher;
pub mod logging;
pub mod registry;
pub mod shutdown;
pub mod signature;
pub mod webhook;

use std::sync::Arc;

use launcher::{Launcher, ShellLauncher};
use registry::Registry;
use signature::SignatureVerifier;

/// Everything a request handler needs. Built once before the listener opens
/// and never mutated afterwards.
pub struct AppState {
    pub registry: Registry,
    pub verifier: SignatureVerifier,
    pub launcher: Arc<dyn Launcher>,
}

impl AppState {
    pub fn new(registry: Registry, verifier: SignatureVerifier) -> Self {
        Self {
            registry,
            verifier,
            launcher: Arc::new(ShellLauncher),
        }
    }

    pub fn with_launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = launcher;
        self
    }
}

pub type SharedState = Arc<AppState>;
