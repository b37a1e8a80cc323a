//! Process-wide service slot for the registry
//!
//! The registry is an explicitly constructed object; this module only decides
//! which instance the generated code and the C entry points talk to. Install
//! it after the foreign runtime is live and shut it down before the foreign
//! runtime goes away.

use crate::logging::{info, warn};
use crate::refnum::Registry;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;

static SERVICE: Lazy<RwLock<Option<Arc<Registry>>>> = Lazy::new(|| RwLock::new(None));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error("seqbind runtime is not installed")]
    NotInitialized,
    #[error("seqbind runtime is already installed")]
    AlreadyInstalled,
}

/// Make `registry` the process-wide instance
pub fn install(registry: Arc<Registry>) -> Result<(), RuntimeError> {
    let mut slot = SERVICE.write();
    if slot.is_some() {
        warn!(event = "service_install", "registry already installed");
        return Err(RuntimeError::AlreadyInstalled);
    }
    *slot = Some(registry);
    info!(event = "service_install", "seqbind registry installed");
    Ok(())
}

/// Tear down the process-wide instance, returning it to the caller
pub fn shutdown() -> Option<Arc<Registry>> {
    let registry = SERVICE.write().take();
    if let Some(registry) = &registry {
        info!(
            event = "service_shutdown",
            live = registry.len(),
            "seqbind registry shut down"
        );
    }
    registry
}

/// The installed registry
pub fn registry() -> Result<Arc<Registry>, RuntimeError> {
    SERVICE.read().clone().ok_or(RuntimeError::NotInitialized)
}

pub fn is_installed() -> bool {
    SERVICE.read().is_some()
}

/// The installed registry, for generated code that runs only after install.
///
/// # Panics
/// If no registry is installed.
pub fn installed() -> Arc<Registry> {
    match registry() {
        Ok(registry) => registry,
        Err(err) => panic!("{err}: install a registry before crossing the boundary"),
    }
}

/// Serializes tests that install into the process-wide slot
#[cfg(test)]
pub(crate) static TEST_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());
