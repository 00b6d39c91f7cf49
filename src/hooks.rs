//! Interface callbacks
//!
//! Generated per-interface modules pass a set of server callbacks along with
//! their descriptor and table. They split into two groups:
//!
//! - [`LifecycleHooks`]: run when the interface is registered and unregistered
//!   (subsystem startup/shutdown).
//! - [`DispatchHooks`]: run around every call dispatched to the interface.
//!
//! Hooks run while the registry or dispatcher is mid-operation and must not
//! call back into the [`Registry`](crate::registry::Registry).

use crate::fault::{ExecFailure, Fault};
use crate::interface::InterfaceDescriptor;
use std::fmt;
use std::sync::Arc;

/// Startup/shutdown hooks for one interface.
pub trait LifecycleHooks: Send + Sync {
    /// Called before the interface becomes visible. An error aborts the
    /// registration and nothing is published.
    fn on_register(&self, descriptor: &InterfaceDescriptor) -> Result<(), String> {
        let _ = descriptor;
        Ok(())
    }

    /// Called after the interface has been removed from the registry.
    fn on_unregister(&self, descriptor: &InterfaceDescriptor) {
        let _ = descriptor;
    }
}

/// What the dispatcher knows about a call when running hooks.
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    pub interface: &'a InterfaceDescriptor,
    pub opnum: u16,
    pub request_len: usize,
}

/// Per-call hooks.
pub trait DispatchHooks: Send + Sync {
    /// Runs after the opnum resolved, before decode. Returning an error
    /// refuses the call with an execution fault.
    fn pre_dispatch(&self, call: &CallContext<'_>) -> Result<(), ExecFailure> {
        let _ = call;
        Ok(())
    }

    /// Runs once the call has produced a reply or a fault.
    fn post_dispatch(&self, call: &CallContext<'_>, outcome: Result<&[u8], &Fault>) {
        let _ = (call, outcome);
    }
}

/// Optional hooks attached to a registered interface.
#[derive(Clone, Default)]
pub struct InterfaceCallbacks {
    lifecycle: Option<Arc<dyn LifecycleHooks>>,
    dispatch: Option<Arc<dyn DispatchHooks>>,
}

impl InterfaceCallbacks {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_lifecycle(mut self, hooks: Arc<dyn LifecycleHooks>) -> Self {
        self.lifecycle = Some(hooks);
        self
    }

    pub fn with_dispatch(mut self, hooks: Arc<dyn DispatchHooks>) -> Self {
        self.dispatch = Some(hooks);
        self
    }

    pub fn lifecycle(&self) -> Option<&dyn LifecycleHooks> {
        self.lifecycle.as_deref()
    }

    pub fn dispatch(&self) -> Option<&dyn DispatchHooks> {
        self.dispatch.as_deref()
    }
}

impl fmt::Debug for InterfaceCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceCallbacks")
            .field("lifecycle", &self.lifecycle.is_some())
            .field("dispatch", &self.dispatch.is_some())
            .finish()
    }
}
