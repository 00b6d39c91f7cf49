//! Administrative error types
//!
//! These are returned synchronously to whoever registers or unregisters an
//! interface (server startup/shutdown code). They never reach a remote caller;
//! dispatch-time failures are [`Fault`](crate::fault::Fault)s instead.

use crate::interface::InterfaceId;
use thiserror::Error;

/// Registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// An interface with the same (uuid, version) is already registered
    #[error("Interface already registered: {name} ({id})")]
    DuplicateInterface { name: String, id: InterfaceId },

    /// No interface registered under this key
    #[error("Interface not registered: {0}")]
    NotFound(InterfaceId),

    /// Another interface already answers on this pipe name
    #[error("Pipe name '{pipe}' already claimed by interface '{owner}'")]
    DuplicatePipeName { pipe: String, owner: String },

    /// Caller was generated against a different registration API
    #[error("Registration API version mismatch: expected {expected}, got {got}")]
    ApiVersionMismatch { expected: u32, got: u32 },

    /// Configured interface limit reached
    #[error("Registry full: {limit} interfaces registered")]
    RegistryFull { limit: usize },

    /// Lifecycle hook refused the registration
    #[error("Lifecycle hook for '{name}' failed: {message}")]
    HookFailed { name: String, message: String },
}

/// Opnum table construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Two entries claim the same opnum
    #[error("Duplicate opnum {opnum} ('{first}' and '{second}')")]
    DuplicateOpnum {
        opnum: u16,
        first: String,
        second: String,
    },
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
