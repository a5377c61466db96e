//! Wire format serialization/deserialization
//!
//! Consensus-critical: producers and verifiers must agree on every byte.
//! All fixed-width integers are little-endian; every variable-length
//! sequence carries a VarInt length prefix.
//!
//! Headers, blocks and locators share a single field list per type and take
//! an explicit [`Purpose`]. The hash purpose drops the fields that must not
//! influence a digest (header flag bytes, locator version); nothing else
//! differs between the two encodings.

pub mod block;
pub mod locator;
pub mod transaction;
pub mod varint;

pub use block::{
    deserialize_block, deserialize_block_header, serialize_block, serialize_block_header,
};
pub use locator::{deserialize_locator, serialize_locator};
pub use transaction::{deserialize_transaction, serialize_transaction};
pub use varint::{decode_varint, encode_varint, write_varint, VarIntError};

use crate::error::{ConsensusError, Result};
use crate::types::{Hash, OutPoint};
use std::borrow::Cow;

/// Why bytes are being produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    /// Storage and network relay: every field present
    Network,
    /// Digest input: validation-time flags and envelope fields absent
    Hash,
}

impl Purpose {
    /// Whether header flag bytes and locator version are written
    #[inline]
    pub fn includes_envelope(self) -> bool {
        matches!(self, Purpose::Network)
    }
}

pub(crate) fn write_outpoint(out: &mut Vec<u8>, outpoint: &OutPoint) {
    out.extend_from_slice(&outpoint.hash);
    out.extend_from_slice(&outpoint.index.to_le_bytes());
}

pub(crate) fn write_var_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    write_varint(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

/// Bounds-checked cursor over an input buffer
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Reader { data, offset: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.offset
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub(crate) fn take(&mut self, len: usize, what: &'static str) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(ConsensusError::truncated(what));
        }
        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.take(N, what)?);
        Ok(buf)
    }

    pub(crate) fn read_u8(&mut self, what: &'static str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    pub(crate) fn read_u32(&mut self, what: &'static str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take_array(what)?))
    }

    pub(crate) fn read_i32(&mut self, what: &'static str) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take_array(what)?))
    }

    pub(crate) fn read_i64(&mut self, what: &'static str) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take_array(what)?))
    }

    pub(crate) fn read_hash(&mut self, what: &'static str) -> Result<Hash> {
        self.take_array(what)
    }

    pub(crate) fn read_outpoint(&mut self, what: &'static str) -> Result<OutPoint> {
        let hash = self.read_hash(what)?;
        let index = self.read_u32(what)?;
        Ok(OutPoint { hash, index })
    }

    pub(crate) fn read_varint(&mut self) -> Result<u64> {
        let (value, len) = decode_varint(&self.data[self.offset..])?;
        self.offset += len;
        Ok(value)
    }

    /// VarInt count bounded by `max`, so a hostile prefix cannot drive a
    /// huge allocation.
    pub(crate) fn read_count(&mut self, max: usize, what: &'static str) -> Result<usize> {
        let count = self.read_varint()?;
        if count > max as u64 {
            return Err(ConsensusError::MalformedEncoding(Cow::Owned(format!(
                "{what} count {count} exceeds limit {max}"
            ))));
        }
        Ok(count as usize)
    }

    pub(crate) fn read_var_bytes(&mut self, max: usize, what: &'static str) -> Result<Vec<u8>> {
        let len = self.read_count(max, what)?;
        Ok(self.take(len, what)?.to_vec())
    }

    /// Fails when bytes remain after a complete object
    pub(crate) fn finish(&self, what: &'static str) -> Result<()> {
        if self.remaining() != 0 {
            return Err(ConsensusError::MalformedEncoding(Cow::Owned(format!(
                "{} trailing bytes after {what}",
                self.remaining()
            ))));
        }
        Ok(())
    }
}
