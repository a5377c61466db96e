//! Proof of work: compact target expansion and the header digest check
//!
//! Check if a proof-of-work header satisfies its own difficulty claim:
//! `U256(mixed digest) <= ExpandTarget(header.bits)`, with the claimed
//! target no easier than the network limit.

use crate::crypto::PowMixHash;
use crate::error::{ConsensusError, Result};
use crate::header::BlockHeader;
use crate::types::Hash;

/// 256-bit unsigned integer for target arithmetic
///
/// Little-endian limbs. Digests are read as little-endian numbers, so the
/// last byte of a hash is its most significant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct U256([u64; 4]);

impl U256 {
    pub const ZERO: U256 = U256([0; 4]);
    pub const MAX: U256 = U256([u64::MAX; 4]);

    pub fn from_u64(value: u64) -> Self {
        U256([value, 0, 0, 0])
    }

    pub fn from_le_bytes(bytes: &[u8; 32]) -> Self {
        let mut words = [0u64; 4];
        for (i, word) in words.iter_mut().enumerate() {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&bytes[i * 8..(i + 1) * 8]);
            *word = u64::from_le_bytes(buf);
        }
        U256(words)
    }

    pub fn to_le_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for (i, &word) in self.0.iter().enumerate() {
            bytes[i * 8..(i + 1) * 8].copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&x| x == 0)
    }

    pub fn shl(&self, shift: u32) -> Self {
        if shift >= 256 {
            return U256::ZERO;
        }

        let mut result = U256::ZERO;
        let word_shift = (shift / 64) as usize;
        let bit_shift = shift % 64;

        for i in 0..4 {
            if i + word_shift < 4 {
                result.0[i + word_shift] |= self.0[i] << bit_shift;
                if bit_shift > 0 && i + word_shift + 1 < 4 {
                    result.0[i + word_shift + 1] |= self.0[i] >> (64 - bit_shift);
                }
            }
        }

        result
    }

    pub fn shr(&self, shift: u32) -> Self {
        if shift >= 256 {
            return U256::ZERO;
        }

        let mut result = U256::ZERO;
        let word_shift = (shift / 64) as usize;
        let bit_shift = shift % 64;

        for i in word_shift..4 {
            let dest = i - word_shift;
            result.0[dest] |= self.0[i] >> bit_shift;
            if bit_shift > 0 && dest > 0 {
                result.0[dest - 1] |= self.0[i] << (64 - bit_shift);
            }
        }

        result
    }

    /// Multiply by u64, returning None on overflow
    pub fn checked_mul_u64(&self, rhs: u64) -> Option<Self> {
        let mut carry = 0u128;
        let mut result = U256::ZERO;

        for i in 0..4 {
            let product = (self.0[i] as u128) * (rhs as u128) + carry;
            result.0[i] = product as u64;
            carry = product >> 64;
        }

        if carry > 0 {
            return None;
        }
        Some(result)
    }

    /// Multiply by u64, clamping to `U256::MAX` on overflow
    pub fn saturating_mul_u64(&self, rhs: u64) -> Self {
        self.checked_mul_u64(rhs).unwrap_or(U256::MAX)
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        for (a, b) in self.0.iter().rev().zip(other.0.iter().rev()) {
            match a.cmp(b) {
                std::cmp::Ordering::Equal => continue,
                other => return other,
            }
        }
        std::cmp::Ordering::Equal
    }
}

impl From<&Hash> for U256 {
    fn from(hash: &Hash) -> Self {
        U256::from_le_bytes(hash)
    }
}

/// Expand a compact target.
///
/// Format: `bits = (size << 24) | mantissa`, target = `mantissa * 256^(size - 3)`.
/// Bit 0x00800000 is a sign bit; negative, zero and overflowing targets are
/// rejected.
pub fn expand_target(bits: u32) -> Result<U256> {
    let size = bits >> 24;
    let word = bits & 0x007f_ffff;

    if word != 0 && bits & 0x0080_0000 != 0 {
        return Err(ConsensusError::InvalidProofOfWork(
            format!("negative target {bits:#010x}").into(),
        ));
    }
    if word != 0 && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32)) {
        return Err(ConsensusError::InvalidProofOfWork(
            format!("target {bits:#010x} overflows 256 bits").into(),
        ));
    }

    let target = if size <= 3 {
        U256::from_u64((word >> (8 * (3 - size))) as u64)
    } else {
        U256::from_u64(word as u64).shl(8 * (size - 3))
    };

    if target.is_zero() {
        return Err(ConsensusError::InvalidProofOfWork(
            format!("zero target {bits:#010x}").into(),
        ));
    }

    Ok(target)
}

/// CheckProofOfWork
///
/// Errors when `bits` does not encode a usable target or claims a target
/// easier than `pow_limit_bits`; otherwise reports whether the mixed digest
/// meets it.
pub fn check_proof_of_work<M: PowMixHash + ?Sized>(
    header: &BlockHeader,
    mixer: &M,
    pow_limit_bits: u32,
) -> Result<bool> {
    let target = expand_target(header.bits)?;
    let limit = expand_target(pow_limit_bits)?;
    if target > limit {
        return Err(ConsensusError::InvalidProofOfWork(
            format!(
                "target {:#010x} easier than limit {pow_limit_bits:#010x}",
                header.bits
            )
            .into(),
        ));
    }

    let digest = header.compute_proof_of_work_hash(mixer);
    Ok(U256::from(&digest) <= target)
}

/// Batch check proof of work for multiple headers
///
/// Useful during header synchronization. Digests are computed in parallel
/// when the `rayon` feature is enabled.
///
/// Returns `(is_valid, digest)` per header in input order; the digest is
/// `None` for headers that fail. A header whose `bits` cannot be expanded is
/// reported invalid rather than failing the batch.
pub fn batch_check_proof_of_work<M: PowMixHash + ?Sized>(
    headers: &[BlockHeader],
    mixer: &M,
    pow_limit_bits: u32,
) -> Vec<(bool, Option<Hash>)> {
    let check = |header: &BlockHeader| -> (bool, Option<Hash>) {
        match check_proof_of_work(header, mixer, pow_limit_bits) {
            Ok(true) => (true, Some(header.compute_proof_of_work_hash(mixer))),
            Ok(false) | Err(_) => (false, None),
        }
    };

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        headers.par_iter().map(check).collect()
    }

    #[cfg(not(feature = "rayon"))]
    {
        headers.iter().map(check).collect()
    }
}
