//! # rpcpipe: RPC Interface Registry and Dispatch Core
//!
//! The generic layer that generated per-interface RPC modules plug into. A
//! module supplies an interface descriptor and an opnum table; the transport
//! hands bound calls to the [`Dispatcher`], which always answers with either
//! response stub data or one of five well-defined faults.
//!
//! ## Call Path
//!
//! ```text
//! InboundCall { interface, opnum, stub_data }
//!     ↓
//! [Registry::lookup]       → UnknownInterface
//!     ↓
//! [OpnumTable::find]       → OpnumNotImplemented
//!     ↓
//! [decode]                 → DecodeError       (bad stub data)
//!     ↓
//! [invoke]                 → ExecutionFailed   (application status, panics)
//!     ↓
//! [encode]                 → EncodeError       (reply too large)
//!     ↓
//! Reply::Response { stub_data }
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use rpcpipe::{Dispatcher, Fault, InterfaceCallbacks, InterfaceDescriptor, InterfaceVersion,
//!               OpnumTable, Registry};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! let registry = Arc::new(Registry::new());
//! let desc = InterfaceDescriptor::builder("echo", Uuid::from_u128(1), InterfaceVersion::new(1, 0))
//!     .build();
//! let table = OpnumTable::builder()
//!     .raw(0, "echo_Echo", |req: &[u8]| Ok(req.to_vec()))
//!     .build()
//!     .unwrap();
//! registry.register(desc.clone(), table, InterfaceCallbacks::none()).unwrap();
//!
//! let dispatcher = Dispatcher::new(Arc::clone(&registry));
//! assert_eq!(dispatcher.dispatch(&desc.id(), 0, b"ping").unwrap(), b"ping");
//! assert!(matches!(
//!     dispatcher.dispatch(&desc.id(), 9, b""),
//!     Err(Fault::OpnumNotImplemented { opnum: 9, .. })
//! ));
//! ```
//!
//! ## Modules
//!
//! - [`interface`]: interface identity and descriptors
//! - [`opnum`]: handler capability and the immutable opnum table
//! - [`registry`]: snapshot-swapped interface registry
//! - [`dispatch`]: the total dispatcher
//! - [`fault`]: fault kinds and their wire status codes
//! - [`wire`]: inbound call and reply shapes
//! - [`hooks`]: lifecycle and per-call callbacks
//! - [`codec`]: bounded bincode stub codec
//! - [`config`], [`logging`]: process configuration and tracing setup
//! - [`interfaces`]: built-in interfaces (perfcount)

pub mod codec;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod fault;
pub mod hooks;
pub mod interface;
pub mod interfaces;
pub mod logging;
pub mod opnum;
pub mod registry;
pub mod wire;

pub use codec::{BincodeCodec, CodecError};
pub use config::Config;
pub use dispatch::{DispatchStatsSnapshot, Dispatcher};
pub use error::{RegistryError, RegistryResult, TableError};
pub use fault::{ExecFailure, Fault, FaultCode};
pub use hooks::{CallContext, DispatchHooks, InterfaceCallbacks, LifecycleHooks};
pub use interface::{InterfaceDescriptor, InterfaceId, InterfaceVersion, SyntaxId};
pub use opnum::{OpHandler, OpnumEntry, OpnumTable};
pub use registry::{RegisteredInterface, RegistrationHandle, Registry, REGISTRATION_API_VERSION};
pub use wire::{InboundCall, Reply};
