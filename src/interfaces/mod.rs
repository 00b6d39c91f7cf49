//! Built-in interfaces
//!
//! Interfaces registered by the server itself rather than by an external
//! subsystem. Each module exposes `descriptor()`, `table()`, `init()` and
//! `shutdown()`, the same surface a generated per-interface module provides.

pub mod perfcount;

use crate::error::RegistryResult;
use crate::registry::Registry;

/// Register every built-in interface.
pub fn init_all(registry: &Registry) -> RegistryResult<()> {
    perfcount::init(registry, crate::hooks::InterfaceCallbacks::none())?;
    Ok(())
}

/// Unregister every built-in interface that is currently registered.
pub fn shutdown_all(registry: &Registry) {
    if let Err(e) = perfcount::shutdown(registry) {
        tracing::debug!(error = %e, "perfcount_shutdown_skipped");
    }
}
