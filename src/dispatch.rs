//! Dispatcher
//!
//! Turns an inbound call into a reply:
//!
//! ```text
//! (interface, opnum, stub_data)
//!     ↓ registry lookup          → UnknownInterface
//!     ↓ opnum table lookup       → OpnumNotImplemented
//!     ↓ pre_dispatch hook        → ExecutionFailed
//!     ↓ decode                   → DecodeError
//!     ↓ invoke                   → ExecutionFailed
//!     ↓ encode                   → EncodeError
//!     ↓ post_dispatch hook
//! reply stub_data
//! ```
//!
//! `dispatch` is total: every call ends in reply bytes or one of the five
//! [`Fault`] kinds. Panics in handlers and in dispatch hooks are caught and
//! reported as execution failures with `STATUS_INTERNAL_ERROR`.
//! Takes `&self` and is safe to call from any number of threads; counters are
//! `AtomicU64` and the registry read is lock-free.

use crate::config::DispatchConfig;
use crate::fault::{status, Fault};
use crate::hooks::CallContext;
use crate::interface::InterfaceId;
use crate::opnum::{OpError, OpnumEntry};
use crate::registry::Registry;
use crate::wire::{InboundCall, Reply};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Lock-free dispatch counters.
#[derive(Debug, Default)]
struct DispatchStats {
    calls: AtomicU64,
    replies: AtomicU64,
    unknown_interface: AtomicU64,
    opnum_not_implemented: AtomicU64,
    decode_errors: AtomicU64,
    execution_failures: AtomicU64,
    encode_errors: AtomicU64,
    panics: AtomicU64,
}

/// Point-in-time copy of the dispatch counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStatsSnapshot {
    pub calls: u64,
    pub replies: u64,
    pub unknown_interface: u64,
    pub opnum_not_implemented: u64,
    pub decode_errors: u64,
    pub execution_failures: u64,
    pub encode_errors: u64,
    /// Execution failures caused by a caught panic (also counted in
    /// `execution_failures`)
    pub panics: u64,
}

impl DispatchStatsSnapshot {
    pub fn faults(&self) -> u64 {
        self.unknown_interface
            + self.opnum_not_implemented
            + self.decode_errors
            + self.execution_failures
            + self.encode_errors
    }
}

/// Routes calls to the handlers of registered interfaces.
pub struct Dispatcher {
    registry: Arc<Registry>,
    config: DispatchConfig,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::with_config(registry, DispatchConfig::default())
    }

    pub fn with_config(registry: Arc<Registry>, config: DispatchConfig) -> Self {
        Self {
            registry,
            config,
            stats: DispatchStats::default(),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Dispatch one call and produce the encoded reply or a fault.
    pub fn dispatch(
        &self,
        interface: &InterfaceId,
        opnum: u16,
        stub_data: &[u8],
    ) -> Result<Vec<u8>, Fault> {
        self.stats.calls.fetch_add(1, Ordering::Relaxed);
        self.resolve_and_run(interface, opnum, stub_data)
    }

    /// Dispatch an inbound call and convert the outcome into a reply.
    pub fn handle(&self, call: &InboundCall) -> Reply {
        Reply::from(self.dispatch(&call.interface, call.opnum, &call.stub_data))
    }

    pub fn stats(&self) -> DispatchStatsSnapshot {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);
        DispatchStatsSnapshot {
            calls: load(&self.stats.calls),
            replies: load(&self.stats.replies),
            unknown_interface: load(&self.stats.unknown_interface),
            opnum_not_implemented: load(&self.stats.opnum_not_implemented),
            decode_errors: load(&self.stats.decode_errors),
            execution_failures: load(&self.stats.execution_failures),
            encode_errors: load(&self.stats.encode_errors),
            panics: load(&self.stats.panics),
        }
    }

    fn resolve_and_run(
        &self,
        id: &InterfaceId,
        opnum: u16,
        stub_data: &[u8],
    ) -> Result<Vec<u8>, Fault> {
        let Some(iface) = self.registry.lookup(id) else {
            let result = Err(Fault::UnknownInterface { id: *id });
            self.record(id, opnum, &result);
            return result;
        };
        let descriptor = iface.descriptor();

        let span = tracing::debug_span!(
            "rpc_dispatch",
            interface = descriptor.name(),
            opnum,
            request_len = stub_data.len()
        );
        let _enter = span.enter();

        let Some(entry) = iface.table().find(opnum) else {
            let result = Err(Fault::OpnumNotImplemented {
                interface: descriptor.name().to_string(),
                opnum,
            });
            self.record(id, opnum, &result);
            return result;
        };

        let ctx = CallContext {
            interface: descriptor,
            opnum,
            request_len: stub_data.len(),
        };
        let hooks = iface.callbacks().dispatch();

        // Hooks are application code too; a panic in either one is a fault.
        let guarded = panic::catch_unwind(AssertUnwindSafe(|| {
            let result = match hooks.map_or(Ok(()), |h| h.pre_dispatch(&ctx)) {
                Ok(()) => self.run_entry(entry, stub_data),
                Err(refused) => Err(Fault::ExecutionFailed {
                    opnum,
                    status: refused.status,
                    message: refused.message,
                }),
            };
            if let Some(hooks) = hooks {
                hooks.post_dispatch(&ctx, result.as_deref());
            }
            result
        }));

        let result = guarded.unwrap_or_else(|payload| {
            self.stats.panics.fetch_add(1, Ordering::Relaxed);
            Err(Fault::ExecutionFailed {
                opnum,
                status: status::STATUS_INTERNAL_ERROR,
                message: format!(
                    "dispatch hook for '{}' panicked: {}",
                    descriptor.name(),
                    panic_message(&*payload)
                ),
            })
        });
        self.record(id, opnum, &result);
        result
    }

    fn run_entry(&self, entry: &OpnumEntry, stub_data: &[u8]) -> Result<Vec<u8>, Fault> {
        let opnum = entry.opnum();
        let max_request = self.config.max_request_size;
        if max_request > 0 && stub_data.len() > max_request {
            return Err(Fault::DecodeError {
                opnum,
                message: format!(
                    "request of {} bytes exceeds limit of {max_request} bytes",
                    stub_data.len()
                ),
            });
        }

        // Caught here as well so post_dispatch still sees the fault.
        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| entry.call(stub_data))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                self.stats.panics.fetch_add(1, Ordering::Relaxed);
                return Err(Fault::ExecutionFailed {
                    opnum,
                    status: status::STATUS_INTERNAL_ERROR,
                    message: format!(
                        "handler '{}' panicked: {}",
                        entry.name(),
                        panic_message(&*payload)
                    ),
                });
            }
        };

        let reply = outcome.map_err(|err| match err {
            OpError::Decode(e) => Fault::DecodeError {
                opnum,
                message: e.to_string(),
            },
            OpError::Invoke(failure) => Fault::ExecutionFailed {
                opnum,
                status: failure.status,
                message: failure.message,
            },
            OpError::Encode(e) => Fault::EncodeError {
                opnum,
                message: e.to_string(),
            },
        })?;

        let max_reply = self.config.max_reply_size;
        if max_reply > 0 && reply.len() > max_reply {
            return Err(Fault::EncodeError {
                opnum,
                message: format!(
                    "reply of {} bytes exceeds limit of {max_reply} bytes",
                    reply.len()
                ),
            });
        }
        Ok(reply)
    }

    fn record(&self, id: &InterfaceId, opnum: u16, result: &Result<Vec<u8>, Fault>) {
        let fault = match result {
            Ok(reply) => {
                self.stats.replies.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(%id, opnum, reply_len = reply.len(), "rpc_reply");
                return;
            }
            Err(fault) => fault,
        };

        let counter = match fault {
            Fault::UnknownInterface { .. } => &self.stats.unknown_interface,
            Fault::OpnumNotImplemented { .. } => &self.stats.opnum_not_implemented,
            Fault::DecodeError { .. } => &self.stats.decode_errors,
            Fault::ExecutionFailed { .. } => &self.stats.execution_failures,
            Fault::EncodeError { .. } => &self.stats.encode_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        let code = fault.code();
        match fault {
            Fault::ExecutionFailed { .. } | Fault::EncodeError { .. } => {
                tracing::warn!(%id, opnum, kind = fault.kind(), %code, error = %fault, "rpc_fault");
            }
            _ => {
                tracing::debug!(%id, opnum, kind = fault.kind(), %code, error = %fault, "rpc_fault");
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
