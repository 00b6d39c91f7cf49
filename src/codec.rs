//! Stub data codec.
//!
//! NDR marshalling belongs to the generated stubs. Stubs that have no NDR
//! codec of their own (tests, internal pipes, prototypes) can use
//! [`BincodeCodec`], a fixed-width little-endian bincode encoding with a
//! hard size limit on both directions.

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Default stub data size limit (16 MB)
pub const DEFAULT_STUB_LIMIT: u64 = 16 * 1024 * 1024;

/// Codec errors
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Payload exceeds the codec limit
    #[error("Stub data too large: {size} bytes, limit {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    /// Bincode failure (malformed input, trailing bytes, unsupported type)
    #[error("Serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Stub-specific decoding failure, for hand-written
    /// [`OpHandler`](crate::opnum::OpHandler) codecs
    #[error("Malformed stub data: {0}")]
    Malformed(String),
}

/// Bincode-backed stub codec.
#[derive(Debug, Clone, Copy)]
pub struct BincodeCodec {
    limit: u64,
}

impl Default for BincodeCodec {
    fn default() -> Self {
        Self::new(DEFAULT_STUB_LIMIT)
    }
}

impl BincodeCodec {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    fn options(&self) -> impl Options {
        bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .with_little_endian()
            .with_limit(self.limit)
    }

    /// Decode a complete value. Trailing bytes are rejected.
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        let size = bytes.len() as u64;
        if size > self.limit {
            return Err(CodecError::TooLarge {
                size,
                limit: self.limit,
            });
        }
        Ok(self.options().deserialize(bytes)?)
    }

    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        let size = bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .with_little_endian()
            .serialized_size(value)?;
        if size > self.limit {
            return Err(CodecError::TooLarge {
                size,
                limit: self.limit,
            });
        }
        Ok(self.options().serialize(value)?)
    }
}
