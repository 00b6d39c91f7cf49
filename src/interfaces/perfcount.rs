//! Performance counters pipe (`perfcount`).
//!
//! Registered for identity and bind negotiation only: the table is empty, so
//! every call against it is answered with `nca_s_op_rng_error`.

use crate::error::RegistryResult;
use crate::hooks::InterfaceCallbacks;
use crate::interface::{InterfaceDescriptor, InterfaceId, InterfaceVersion};
use crate::opnum::OpnumTable;
use crate::registry::{RegistrationHandle, Registry, REGISTRATION_API_VERSION};
use uuid::Uuid;

pub const NAME: &str = "perfcount";
pub const PIPE: &str = "perfcount";
pub const UUID: Uuid = Uuid::from_u128(0xda5a86c5_12c2_4943_ab30_7f74a813d853);
pub const VERSION: InterfaceVersion = InterfaceVersion::new(1, 0);

pub fn id() -> InterfaceId {
    InterfaceId::new(UUID, VERSION)
}

pub fn descriptor() -> InterfaceDescriptor {
    InterfaceDescriptor::builder(NAME, UUID, VERSION)
        .pipe(PIPE)
        .help("Performance Counters")
        .build()
}

/// No operations are implemented on this pipe.
pub fn table() -> OpnumTable {
    OpnumTable::empty()
}

pub fn init(registry: &Registry, callbacks: InterfaceCallbacks) -> RegistryResult<RegistrationHandle> {
    registry.register_versioned(REGISTRATION_API_VERSION, descriptor(), table(), callbacks)
}

pub fn shutdown(registry: &Registry) -> RegistryResult<()> {
    registry.unregister(&id())
}
