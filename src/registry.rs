//! Interface Registry
//!
//! Maps interface identity `(uuid, version)` to its descriptor, opnum table
//! and callbacks. Generated per-interface modules call [`Registry::register`]
//! at subsystem startup and [`Registry::unregister`] at shutdown; the
//! dispatcher only ever reads.
//!
//! ## Design
//!
//! - The map is an immutable snapshot published through `ArcSwap`, so
//!   [`Registry::lookup`] is lock-free and always sees fully formed entries
//! - Writers serialise on a mutex, copy the map, and publish the new snapshot
//!   in one store; there is no partially visible registration
//! - Entries are handed out as `Arc<RegisteredInterface>`, so an unregister
//!   never invalidates a dispatch already in flight

use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::hooks::InterfaceCallbacks;
use crate::interface::{InterfaceDescriptor, InterfaceId};
use crate::opnum::OpnumTable;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Version of the registration API. Generated stubs pass the version they
/// were generated against to [`Registry::register_versioned`].
pub const REGISTRATION_API_VERSION: u32 = 1;

type InterfaceMap = HashMap<InterfaceId, Arc<RegisteredInterface>>;

/// A registered interface: descriptor, opnum table and callbacks.
#[derive(Debug)]
pub struct RegisteredInterface {
    descriptor: InterfaceDescriptor,
    table: OpnumTable,
    callbacks: InterfaceCallbacks,
    registered_at: DateTime<Utc>,
}

impl RegisteredInterface {
    pub fn descriptor(&self) -> &InterfaceDescriptor {
        &self.descriptor
    }

    pub fn table(&self) -> &OpnumTable {
        &self.table
    }

    pub fn callbacks(&self) -> &InterfaceCallbacks {
        &self.callbacks
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }
}

/// Returned by a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationHandle {
    id: InterfaceId,
    name: String,
}

impl RegistrationHandle {
    pub fn id(&self) -> InterfaceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unregister the interface this handle was issued for.
    pub fn unregister(self, registry: &Registry) -> RegistryResult<()> {
        registry.unregister(&self.id)
    }
}

/// Interface registry. Construct one at server startup and share it
/// (usually behind an `Arc`) with whatever owns the dispatcher.
pub struct Registry {
    interfaces: ArcSwap<InterfaceMap>,
    write_lock: Mutex<()>,
    max_interfaces: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("interfaces", &self.len())
            .field("max_interfaces", &self.max_interfaces)
            .finish()
    }
}

impl Registry {
    /// Empty registry without a size limit.
    pub fn new() -> Self {
        Self::from_config(&RegistryConfig::default())
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        Self {
            interfaces: ArcSwap::from_pointee(HashMap::new()),
            write_lock: Mutex::new(()),
            max_interfaces: config.max_interfaces,
        }
    }

    /// Register an interface under the current registration API version.
    pub fn register(
        &self,
        descriptor: InterfaceDescriptor,
        table: OpnumTable,
        callbacks: InterfaceCallbacks,
    ) -> RegistryResult<RegistrationHandle> {
        self.register_versioned(REGISTRATION_API_VERSION, descriptor, table, callbacks)
    }

    /// Register an interface, checking the caller's registration API version.
    ///
    /// Fails with `DuplicateInterface` if the `(uuid, version)` is taken and
    /// with `DuplicatePipeName` if an interface with a different uuid answers
    /// on one of its pipe names. Existing registrations are left untouched on failure.
    pub fn register_versioned(
        &self,
        api_version: u32,
        descriptor: InterfaceDescriptor,
        table: OpnumTable,
        callbacks: InterfaceCallbacks,
    ) -> RegistryResult<RegistrationHandle> {
        if api_version != REGISTRATION_API_VERSION {
            return Err(RegistryError::ApiVersionMismatch {
                expected: REGISTRATION_API_VERSION,
                got: api_version,
            });
        }

        let _guard = self.write_lock.lock();
        let current = self.interfaces.load_full();
        let id = descriptor.id();

        if let Some(existing) = current.get(&id) {
            tracing::warn!(
                interface = descriptor.name(),
                %id,
                existing = existing.descriptor.name(),
                "duplicate_interface_registration"
            );
            return Err(RegistryError::DuplicateInterface {
                name: existing.descriptor.name().to_string(),
                id,
            });
        }

        for entry in current.values().filter(|e| e.descriptor.uuid() != descriptor.uuid()) {
            for pipe in [descriptor.client_pipe(), descriptor.server_pipe()] {
                if entry.descriptor.answers_on_pipe(pipe) {
                    return Err(RegistryError::DuplicatePipeName {
                        pipe: pipe.to_string(),
                        owner: entry.descriptor.name().to_string(),
                    });
                }
            }
        }

        if self.max_interfaces > 0 && current.len() >= self.max_interfaces {
            return Err(RegistryError::RegistryFull {
                limit: self.max_interfaces,
            });
        }

        if let Some(hooks) = callbacks.lifecycle() {
            hooks
                .on_register(&descriptor)
                .map_err(|message| RegistryError::HookFailed {
                    name: descriptor.name().to_string(),
                    message,
                })?;
        }

        let name = descriptor.name().to_string();
        let opnums = table.len();
        let entry = Arc::new(RegisteredInterface {
            descriptor,
            table,
            callbacks,
            registered_at: Utc::now(),
        });

        let mut next = InterfaceMap::clone(&current);
        next.insert(id, entry);
        self.interfaces.store(Arc::new(next));

        tracing::info!(interface = %name, %id, opnums, "interface_registered");
        Ok(RegistrationHandle { id, name })
    }

    /// Remove an interface. Dispatches that already resolved it run to
    /// completion against the removed entry.
    pub fn unregister(&self, id: &InterfaceId) -> RegistryResult<()> {
        let removed = {
            let _guard = self.write_lock.lock();
            let current = self.interfaces.load_full();
            if !current.contains_key(id) {
                return Err(RegistryError::NotFound(*id));
            }
            let mut next = InterfaceMap::clone(&current);
            let removed = next.remove(id);
            self.interfaces.store(Arc::new(next));
            removed
        };

        if let Some(entry) = removed {
            tracing::info!(interface = entry.descriptor.name(), %id, "interface_unregistered");
            if let Some(hooks) = entry.callbacks.lifecycle() {
                hooks.on_unregister(&entry.descriptor);
            }
        }
        Ok(())
    }

    /// Resolve an interface by `(uuid, version)`.
    pub fn lookup(&self, id: &InterfaceId) -> Option<Arc<RegisteredInterface>> {
        self.interfaces.load().get(id).cloned()
    }

    /// Resolve an interface by client or server pipe name
    /// (case-insensitive, `\PIPE\` prefix optional).
    pub fn lookup_pipe(&self, pipe: &str) -> Option<Arc<RegisteredInterface>> {
        self.interfaces
            .load()
            .values()
            .find(|entry| entry.descriptor.answers_on_pipe(pipe))
            .cloned()
    }

    pub fn contains(&self, id: &InterfaceId) -> bool {
        self.interfaces.load().contains_key(id)
    }

    /// Descriptors of all registered interfaces, for diagnostics.
    ///
    /// The order is unspecified and may change between calls.
    pub fn enumerate(&self) -> Vec<InterfaceDescriptor> {
        self.interfaces
            .load()
            .values()
            .map(|entry| entry.descriptor.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.interfaces.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.load().is_empty()
    }
}
