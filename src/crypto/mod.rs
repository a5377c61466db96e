//! Hash primitives used as black boxes by the header, block and stake modules
//!
//! - `sha256` / `hash256`: single and double SHA-256 (sha2 crate)
//! - `Hasher256`: streaming double SHA-256, for digests built field by field
//! - `PowMixHash`: the pluggable proof-of-work mixing primitive
//! - `SignatureVerifier`: the external signature-check collaborator

use sha2::{Digest, Sha256};

pub mod pow_mix;
pub mod signature;

pub use pow_mix::{PowMixHash, Sha256dMixer};
pub use signature::{Secp256k1Verifier, SignatureVerifier};

/// Single SHA-256
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut result = [0u8; 32];
    result.copy_from_slice(&Sha256::digest(data));
    result
}

/// Double SHA-256 (the chain's standard digest)
pub fn hash256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Streaming double SHA-256.
///
/// Fields are written in order and the digest is taken once at the end,
/// so the kernel hash never materialises its preimage.
#[derive(Clone, Default)]
pub struct Hasher256 {
    inner: Sha256,
}

impl Hasher256 {
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    pub fn write(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.write(&value.to_le_bytes())
    }

    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.write(&value.to_le_bytes())
    }

    pub fn finalize(self) -> [u8; 32] {
        let first = self.inner.finalize();
        sha256(&first)
    }
}
