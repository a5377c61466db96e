//! Proof-of-work mixing primitive
//!
//! The production chain mixes the header prefix with a multi-algorithm hash
//! chain whose round selection is keyed by the time digest. This core treats
//! that function as opaque: anything deterministic implementing `PowMixHash`
//! can be plugged into `BlockHeader::compute_proof_of_work_hash`.

use super::Hasher256;
use crate::types::Hash;

/// Deterministic `PoWHash(bytes) -> 256-bit digest`, keyed by the
/// time-quantized digest of the header.
pub trait PowMixHash: Send + Sync {
    /// `prefix` is the 80-byte version..=nonce encoding of the header,
    /// `time_hash` the double SHA-256 of the masked time.
    fn mix(&self, prefix: &[u8], time_hash: &Hash) -> Hash;
}

/// Reference mixer: double SHA-256 over `prefix || time_hash`.
///
/// Used by tests and by tooling that has no access to the production
/// mixing chain. It preserves the properties the consensus layer relies on:
/// determinism, and dependence on every prefix byte and on the time bucket.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256dMixer;

impl PowMixHash for Sha256dMixer {
    fn mix(&self, prefix: &[u8], time_hash: &Hash) -> Hash {
        let mut hasher = Hasher256::new();
        hasher.write(prefix).write(time_hash);
        hasher.finalize()
    }
}

impl<T: PowMixHash + ?Sized> PowMixHash for &T {
    fn mix(&self, prefix: &[u8], time_hash: &Hash) -> Hash {
        (**self).mix(prefix, time_hash)
    }
}
