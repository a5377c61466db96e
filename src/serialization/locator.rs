//! Block locator wire format serialization/deserialization
//!
//! Format:
//! - Protocol version (4 bytes, little-endian, network purpose only)
//! - Hash count (VarInt)
//! - Hashes (32 bytes each)

use super::{write_varint, Purpose, Reader};
use crate::error::Result;
use crate::locator::BlockLocator;

/// Serialize a locator. `version` is written only for the network purpose.
pub fn serialize_locator(locator: &BlockLocator, purpose: Purpose, version: i32) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 9 + 32 * locator.have.len());
    if purpose.includes_envelope() {
        out.extend_from_slice(&version.to_le_bytes());
    }
    write_varint(&mut out, locator.have.len() as u64);
    for hash in &locator.have {
        out.extend_from_slice(hash);
    }
    out
}

/// Deserialize a locator holding at most `max_entries` hashes.
///
/// Returns the locator and, for the network purpose, the version it was
/// written with.
pub fn deserialize_locator(
    data: &[u8],
    purpose: Purpose,
    max_entries: usize,
) -> Result<(BlockLocator, Option<i32>)> {
    let mut reader = Reader::new(data);
    let version = if purpose.includes_envelope() {
        Some(reader.read_i32("locator version")?)
    } else {
        None
    };

    let count = reader.read_count(max_entries, "locator hash")?;
    let mut have = Vec::with_capacity(count);
    for _ in 0..count {
        have.push(reader.read_hash("locator hash")?);
    }
    reader.finish("block locator")?;

    Ok((BlockLocator::from_hashes(have), version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MAX_LOCATOR_ENTRIES, PROTOCOL_VERSION};
    use crate::error::ConsensusError;

    #[test]
    fn test_network_purpose_carries_version() {
        let loc = BlockLocator::from_hashes(vec![[1; 32], [2; 32]]);
        let bytes = serialize_locator(&loc, Purpose::Network, PROTOCOL_VERSION);
        assert_eq!(bytes.len(), 4 + 1 + 64);
        assert_eq!(&bytes[..4], &PROTOCOL_VERSION.to_le_bytes());

        let (decoded, version) =
            deserialize_locator(&bytes, Purpose::Network, MAX_LOCATOR_ENTRIES).unwrap();
        assert_eq!(decoded, loc);
        assert_eq!(version, Some(PROTOCOL_VERSION));
    }

    #[test]
    fn test_hash_purpose_omits_version() {
        let loc = BlockLocator::from_hashes(vec![[3; 32]]);
        let bytes = serialize_locator(&loc, Purpose::Hash, PROTOCOL_VERSION);
        assert_eq!(bytes.len(), 1 + 32);
        let (decoded, version) =
            deserialize_locator(&bytes, Purpose::Hash, MAX_LOCATOR_ENTRIES).unwrap();
        assert_eq!(decoded, loc);
        assert_eq!(version, None);
    }

    #[test]
    fn test_null_locator_encoding() {
        let bytes = serialize_locator(&BlockLocator::new(), Purpose::Hash, 0);
        assert_eq!(bytes, vec![0]);
        let (decoded, _) = deserialize_locator(&bytes, Purpose::Hash, 1).unwrap();
        assert!(decoded.is_null());
    }

    #[test]
    fn test_entry_limit() {
        let loc = BlockLocator::from_hashes(vec![[0; 32]; 3]);
        let bytes = serialize_locator(&loc, Purpose::Hash, 0);
        assert!(matches!(
            deserialize_locator(&bytes, Purpose::Hash, 2),
            Err(ConsensusError::MalformedEncoding(_))
        ));
    }
}
