//! Opnum Tables
//!
//! Maps operation numbers to handlers. A table is built once from a fixed set
//! of `(opnum, handler)` pairs when its interface is registered and is
//! immutable afterwards, so dispatch reads it without locking.
//!
//! ## Handlers
//!
//! A handler is split into three steps, mirroring what generated stubs do:
//!
//! ```text
//! stub_data --decode--> Request --invoke--> Response --encode--> stub_data
//! ```
//!
//! Implement [`OpHandler`] for full control over the codec, or use
//! [`OpnumTableBuilder::bincode`] / [`OpnumTableBuilder::raw`] with a closure.
//!
//! ## Example
//!
//! ```
//! use rpcpipe::codec::BincodeCodec;
//! use rpcpipe::opnum::OpnumTable;
//!
//! let table = OpnumTable::builder()
//!     .bincode(0, "Add", BincodeCodec::default(), |(a, b): (u32, u32)| Ok(a + b))
//!     .bincode(4, "Negate", BincodeCodec::default(), |v: i64| Ok(-v))
//!     .build()
//!     .unwrap();
//!
//! assert!(table.find(0).is_some());
//! assert!(table.find(1).is_none());
//! ```

use crate::codec::{BincodeCodec, CodecError};
use crate::error::TableError;
use crate::fault::ExecFailure;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

/// Typed decode -> invoke -> encode handler for one opnum.
pub trait OpHandler: Send + Sync + 'static {
    type Request;
    type Response;

    fn decode(&self, stub_data: &[u8]) -> Result<Self::Request, CodecError>;

    fn invoke(&self, request: Self::Request) -> Result<Self::Response, ExecFailure>;

    fn encode(&self, response: &Self::Response) -> Result<Vec<u8>, CodecError>;
}

/// Which step of a handler failed.
#[derive(Debug, thiserror::Error)]
pub enum OpError {
    #[error("decode: {0}")]
    Decode(CodecError),
    #[error("invoke: {0}")]
    Invoke(ExecFailure),
    #[error("encode: {0}")]
    Encode(CodecError),
}

/// Object-safe form of [`OpHandler`], so one table can hold handlers
/// with different request and response types.
pub trait ErasedOp: Send + Sync {
    fn call(&self, stub_data: &[u8]) -> Result<Vec<u8>, OpError>;
}

impl<H: OpHandler> ErasedOp for H {
    fn call(&self, stub_data: &[u8]) -> Result<Vec<u8>, OpError> {
        let request = self.decode(stub_data).map_err(OpError::Decode)?;
        let response = self.invoke(request).map_err(OpError::Invoke)?;
        self.encode(&response).map_err(OpError::Encode)
    }
}

/// Handler over raw stub data; decode and encode are the identity.
pub struct RawOp<F> {
    f: F,
}

impl<F> OpHandler for RawOp<F>
where
    F: Fn(&[u8]) -> Result<Vec<u8>, ExecFailure> + Send + Sync + 'static,
{
    type Request = Vec<u8>;
    type Response = Vec<u8>;

    fn decode(&self, stub_data: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(stub_data.to_vec())
    }

    fn invoke(&self, request: Vec<u8>) -> Result<Vec<u8>, ExecFailure> {
        (self.f)(&request)
    }

    fn encode(&self, response: &Vec<u8>) -> Result<Vec<u8>, CodecError> {
        Ok(response.clone())
    }
}

/// Handler whose request and response travel as bincode.
pub struct BincodeOp<Req, Resp, F> {
    codec: BincodeCodec,
    f: F,
    _types: PhantomData<fn(Req) -> Resp>,
}

impl<Req, Resp, F> BincodeOp<Req, Resp, F> {
    pub fn new(codec: BincodeCodec, f: F) -> Self {
        Self {
            codec,
            f,
            _types: PhantomData,
        }
    }
}

impl<Req, Resp, F> OpHandler for BincodeOp<Req, Resp, F>
where
    Req: DeserializeOwned + 'static,
    Resp: Serialize + 'static,
    F: Fn(Req) -> Result<Resp, ExecFailure> + Send + Sync + 'static,
{
    type Request = Req;
    type Response = Resp;

    fn decode(&self, stub_data: &[u8]) -> Result<Req, CodecError> {
        self.codec.decode(stub_data)
    }

    fn invoke(&self, request: Req) -> Result<Resp, ExecFailure> {
        (self.f)(request)
    }

    fn encode(&self, response: &Resp) -> Result<Vec<u8>, CodecError> {
        self.codec.encode(response)
    }
}

/// One row of an opnum table.
pub struct OpnumEntry {
    opnum: u16,
    name: String,
    handler: Box<dyn ErasedOp>,
}

impl OpnumEntry {
    pub fn new(opnum: u16, name: impl Into<String>, handler: impl OpHandler) -> Self {
        Self {
            opnum,
            name: name.into(),
            handler: Box::new(handler),
        }
    }

    pub fn opnum(&self) -> u16 {
        self.opnum
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &dyn ErasedOp {
        self.handler.as_ref()
    }

    /// Run decode, invoke and encode.
    pub fn call(&self, stub_data: &[u8]) -> Result<Vec<u8>, OpError> {
        self.handler.call(stub_data)
    }
}

impl fmt::Debug for OpnumEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpnumEntry")
            .field("opnum", &self.opnum)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Immutable opnum -> handler mapping. Entries are sorted by opnum;
/// opnums need not be contiguous.
#[derive(Debug, Default)]
pub struct OpnumTable {
    entries: Vec<OpnumEntry>,
}

impl OpnumTable {
    pub fn builder() -> OpnumTableBuilder {
        OpnumTableBuilder::default()
    }

    /// A table with no operations. Every call against it is
    /// `OpnumNotImplemented`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from pre-made entries.
    pub fn from_entries(entries: impl IntoIterator<Item = OpnumEntry>) -> Result<Self, TableError> {
        let mut entries: Vec<OpnumEntry> = entries.into_iter().collect();
        // stable, so the duplicate report names entries in insertion order
        entries.sort_by_key(OpnumEntry::opnum);
        for pair in entries.windows(2) {
            if pair[0].opnum == pair[1].opnum {
                return Err(TableError::DuplicateOpnum {
                    opnum: pair[0].opnum,
                    first: pair[0].name.clone(),
                    second: pair[1].name.clone(),
                });
            }
        }
        Ok(Self { entries })
    }

    /// Exact-match lookup.
    pub fn find(&self, opnum: u16) -> Option<&OpnumEntry> {
        self.entries
            .binary_search_by_key(&opnum, OpnumEntry::opnum)
            .ok()
            .map(|idx| &self.entries[idx])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Implemented opnums in ascending order.
    pub fn opnums(&self) -> impl Iterator<Item = u16> + '_ {
        self.entries.iter().map(OpnumEntry::opnum)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OpnumEntry> {
        self.entries.iter()
    }
}

/// Collects entries for an [`OpnumTable`].
#[derive(Default)]
pub struct OpnumTableBuilder {
    entries: Vec<OpnumEntry>,
}

impl OpnumTableBuilder {
    pub fn op(mut self, opnum: u16, name: impl Into<String>, handler: impl OpHandler) -> Self {
        self.entries.push(OpnumEntry::new(opnum, name, handler));
        self
    }

    pub fn raw<F>(self, opnum: u16, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[u8]) -> Result<Vec<u8>, ExecFailure> + Send + Sync + 'static,
    {
        self.op(opnum, name, RawOp { f })
    }

    pub fn bincode<Req, Resp, F>(
        self,
        opnum: u16,
        name: impl Into<String>,
        codec: BincodeCodec,
        f: F,
    ) -> Self
    where
        Req: DeserializeOwned + 'static,
        Resp: Serialize + 'static,
        F: Fn(Req) -> Result<Resp, ExecFailure> + Send + Sync + 'static,
    {
        self.op(opnum, name, BincodeOp::new(codec, f))
    }

    pub fn build(self) -> Result<OpnumTable, TableError> {
        OpnumTable::from_entries(self.entries)
    }
}
