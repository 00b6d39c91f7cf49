//! Wire Shapes
//!
//! What the transport layer hands to the dispatcher and what it gets back.
//! Framing, fragmentation and PDU headers stay in the transport; these types
//! carry only the fields the dispatch core needs.

use crate::fault::{Fault, FaultCode};
use crate::interface::InterfaceId;
use serde::{Deserialize, Serialize};

/// A bound call arriving on a pipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundCall {
    pub interface: InterfaceId,
    pub opnum: u16,
    pub stub_data: Vec<u8>,
}

impl InboundCall {
    pub fn new(interface: InterfaceId, opnum: u16, stub_data: impl Into<Vec<u8>>) -> Self {
        Self {
            interface,
            opnum,
            stub_data: stub_data.into(),
        }
    }
}

/// Reply sent back to the caller: response stub data or a fault status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    Response { stub_data: Vec<u8> },
    Fault { status: FaultCode },
}

impl Reply {
    pub fn is_fault(&self) -> bool {
        matches!(self, Reply::Fault { .. })
    }

    /// Fault status as carried in the fault PDU, if this is a fault.
    pub fn fault_status(&self) -> Option<u32> {
        match self {
            Reply::Fault { status } => Some(status.status()),
            Reply::Response { .. } => None,
        }
    }

    pub fn stub_data(&self) -> Option<&[u8]> {
        match self {
            Reply::Response { stub_data } => Some(stub_data),
            Reply::Fault { .. } => None,
        }
    }
}

impl From<Result<Vec<u8>, Fault>> for Reply {
    fn from(result: Result<Vec<u8>, Fault>) -> Self {
        match result {
            Ok(stub_data) => Reply::Response { stub_data },
            Err(fault) => Reply::Fault {
                status: fault.code(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_from_ok() {
        let reply = Reply::from(Ok(vec![1, 2, 3]));
        assert!(!reply.is_fault());
        assert_eq!(reply.stub_data(), Some(&[1u8, 2, 3][..]));
        assert_eq!(reply.fault_status(), None);
    }

    #[test]
    fn test_reply_from_fault() {
        let reply = Reply::from(Err(Fault::OpnumNotImplemented {
            interface: "perfcount".to_string(),
            opnum: 5,
        }));
        assert!(reply.is_fault());
        assert_eq!(reply.fault_status(), Some(0x1C01_0002));
        assert!(reply.stub_data().is_none());
    }

    #[test]
    fn test_reply_json_shape() {
        let reply = Reply::Fault {
            status: FaultCode::BadStubData,
        };
        let json = serde_json::to_string(&reply).unwrap();
        assert_eq!(json, r#"{"Fault":{"status":"BadStubData"}}"#);
        let back: Reply = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reply);
    }
}
