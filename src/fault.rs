//! Dispatch faults and their wire status codes.
//!
//! Every way a call can fail collapses into one of five [`Fault`] kinds, each
//! mapped 1:1 onto a DCE/RPC fault status. Faults are always turned into a
//! fault reply for the remote caller, never surfaced as a crash.

use crate::interface::InterfaceId;
use serde::{Deserialize, Serialize};

/// Wire-level fault status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum FaultCode {
    /// `nca_s_unk_if`
    UnknownInterface = 0x1C01_0003,
    /// `nca_s_op_rng_error`
    OpnumNotImplemented = 0x1C01_0002,
    /// `RPC_X_BAD_STUB_DATA`
    BadStubData = 0x0000_06F7,
    /// `EPT_S_CANT_PERFORM_OP`
    CantPerform = 0x0000_06D8,
    /// `nca_s_fault_other`
    Other = 0x0000_0001,
}

impl FaultCode {
    pub const fn status(self) -> u32 {
        self as u32
    }

    pub fn from_status(status: u32) -> Option<Self> {
        match status {
            0x1C01_0003 => Some(FaultCode::UnknownInterface),
            0x1C01_0002 => Some(FaultCode::OpnumNotImplemented),
            0x0000_06F7 => Some(FaultCode::BadStubData),
            0x0000_06D8 => Some(FaultCode::CantPerform),
            0x0000_0001 => Some(FaultCode::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for FaultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FaultCode::UnknownInterface => "nca_s_unk_if",
            FaultCode::OpnumNotImplemented => "nca_s_op_rng_error",
            FaultCode::BadStubData => "RPC_X_BAD_STUB_DATA",
            FaultCode::CantPerform => "EPT_S_CANT_PERFORM_OP",
            FaultCode::Other => "nca_s_fault_other",
        };
        write!(f, "{name} (0x{:08X})", self.status())
    }
}

/// NTSTATUS values used when the dispatcher itself has to pick a status.
pub mod status {
    pub const STATUS_UNSUCCESSFUL: u32 = 0xC000_0001;
    pub const STATUS_ACCESS_DENIED: u32 = 0xC000_0022;
    pub const STATUS_INTERNAL_ERROR: u32 = 0xC000_00E5;
}

/// Failure reported by application logic from a handler's invoke step
/// or a pre-dispatch hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("status 0x{status:08X}: {message}")]
pub struct ExecFailure {
    pub status: u32,
    pub message: String,
}

impl ExecFailure {
    pub fn new(status: u32, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unsuccessful(message: impl Into<String>) -> Self {
        Self::new(status::STATUS_UNSUCCESSFUL, message)
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(status::STATUS_ACCESS_DENIED, message)
    }
}

impl From<String> for ExecFailure {
    fn from(message: String) -> Self {
        ExecFailure::unsuccessful(message)
    }
}

/// Dispatch fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum Fault {
    /// No interface registered under the bound (uuid, version)
    #[error("Unknown interface: {id}")]
    UnknownInterface { id: InterfaceId },

    /// Interface has no entry for this opnum
    #[error("Opnum {opnum} not implemented by '{interface}'")]
    OpnumNotImplemented { interface: String, opnum: u16 },

    /// Request stub data could not be decoded
    #[error("Bad stub data for opnum {opnum}: {message}")]
    DecodeError { opnum: u16, message: String },

    /// Application logic failed
    #[error("Opnum {opnum} failed with status 0x{status:08X}: {message}")]
    ExecutionFailed {
        opnum: u16,
        status: u32,
        message: String,
    },

    /// Response could not be encoded
    #[error("Failed to encode response for opnum {opnum}: {message}")]
    EncodeError { opnum: u16, message: String },
}

impl Fault {
    /// Wire status sent in the fault reply.
    pub fn code(&self) -> FaultCode {
        match self {
            Fault::UnknownInterface { .. } => FaultCode::UnknownInterface,
            Fault::OpnumNotImplemented { .. } => FaultCode::OpnumNotImplemented,
            Fault::DecodeError { .. } => FaultCode::BadStubData,
            Fault::ExecutionFailed { .. } => FaultCode::CantPerform,
            Fault::EncodeError { .. } => FaultCode::Other,
        }
    }

    /// Short kind label, used as a log field and stats key.
    pub fn kind(&self) -> &'static str {
        match self {
            Fault::UnknownInterface { .. } => "unknown_interface",
            Fault::OpnumNotImplemented { .. } => "opnum_not_implemented",
            Fault::DecodeError { .. } => "decode_error",
            Fault::ExecutionFailed { .. } => "execution_failed",
            Fault::EncodeError { .. } => "encode_error",
        }
    }

    /// Application status, only present for execution failures.
    pub fn app_status(&self) -> Option<u32> {
        match self {
            Fault::ExecutionFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}
