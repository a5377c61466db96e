//! Block header and its hash derivations
//!
//! A header commits to its parent, its transactions and, for proof-of-stake
//! blocks, the output that won the staking lottery. Three digests derive
//! from it:
//!
//! - [`BlockHeader::compute_hash`]: identity hash over the network encoding
//! - [`BlockHeader::compute_proof_of_work_hash`]: mixed digest over a
//!   time-quantized header, compared against `bits` in proof-of-work mode
//! - [`BlockHeader::compute_hash_without_sign`]: digest over the hash-purpose
//!   encoding, the message a stake signature signs

use crate::constants::{POW_PREFIX_SIZE, TIME_MASK};
use crate::crypto::{hash256, PowMixHash};
use crate::error::{ConsensusError, Result};
use crate::serialization::{serialize_block_header, Purpose};
use crate::types::{BlockHash, Hash, OutPoint};
use serde::{Deserialize, Serialize};

/// Consensus mode of a header-like value.
///
/// Implemented by real headers (mode derived from the stake kernel
/// reference) and by wrappers that need to force a mode without carrying a
/// kernel reference.
pub trait ProofMode {
    fn is_proof_of_stake(&self) -> bool;

    fn is_proof_of_work(&self) -> bool {
        !self.is_proof_of_stake()
    }

    /// Raw header time
    fn header_time(&self) -> u32;

    /// Header time if proof-of-stake, else 0. Stake-modifier derivation must
    /// never see proof-of-work times.
    fn stake_time(&self) -> u32 {
        if self.is_proof_of_stake() {
            self.header_time()
        } else {
            0
        }
    }
}

/// The two block-producing modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsensusKind {
    ProofOfWork,
    ProofOfStake,
}

impl ConsensusKind {
    pub fn of<T: ProofMode + ?Sized>(value: &T) -> Self {
        if value.is_proof_of_stake() {
            ConsensusKind::ProofOfStake
        } else {
            ConsensusKind::ProofOfWork
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ConsensusKind::ProofOfWork => "PoW",
            ConsensusKind::ProofOfStake => "PoS",
        }
    }
}

/// Block header
///
/// Wire layout (network purpose, 118 bytes):
/// version(4) | prev_block_hash(32) | merkle_root(32) | time(4) | bits(4) |
/// nonce(4) | prevout_stake(36) | proof_of_stake_flag(1) | full_node_proof(1)
///
/// The hash purpose stops after `prevout_stake`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_block_hash: Hash,
    pub merkle_root: Hash,
    pub time: u32,
    pub bits: u32,
    pub nonce: u32,
    /// Stake kernel reference; null for proof-of-work headers
    pub prevout_stake: OutPoint,
    /// Wire echo of the derived mode. Never consulted to classify a header.
    pub proof_of_stake_flag: u8,
    pub full_node_proof: u8,
}

impl BlockHeader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_null(&mut self) {
        *self = Self::default();
    }

    pub fn is_null(&self) -> bool {
        self.bits == 0
    }

    pub fn block_time(&self) -> i64 {
        self.time as i64
    }

    /// Identity hash: double SHA-256 of the full network encoding
    pub fn compute_hash(&self) -> BlockHash {
        BlockHash(hash256(&serialize_block_header(self, Purpose::Network)))
    }

    /// Message signed by a proof-of-stake block: double SHA-256 of the
    /// hash-purpose encoding, which carries no flag bytes and no signature.
    pub fn compute_hash_without_sign(&self) -> Hash {
        hash256(&serialize_block_header(self, Purpose::Hash))
    }

    /// version..=nonce of the time-quantized copy of the header,
    /// little-endian. The time field is rounded down to its 128-second bucket.
    pub fn pow_prefix(&self) -> [u8; POW_PREFIX_SIZE] {
        let mut bytes = [0u8; POW_PREFIX_SIZE];
        bytes[0..4].copy_from_slice(&self.version.to_le_bytes());
        bytes[4..36].copy_from_slice(&self.prev_block_hash);
        bytes[36..68].copy_from_slice(&self.merkle_root);
        bytes[68..72].copy_from_slice(&(self.time & TIME_MASK).to_le_bytes());
        bytes[72..76].copy_from_slice(&self.bits.to_le_bytes());
        bytes[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        bytes
    }

    /// Digest of the header time rounded down to its 128-second bucket
    pub fn quantized_time_hash(&self) -> Hash {
        let masked = self.time & TIME_MASK;
        hash256(&masked.to_le_bytes())
    }

    /// Proof-of-work digest: `mixer(version..=nonce, hash256(time & TIME_MASK))`
    pub fn compute_proof_of_work_hash<M: PowMixHash + ?Sized>(&self, mixer: &M) -> Hash {
        let digest = mixer.mix(&self.pow_prefix(), &self.quantized_time_hash());
        tracing::trace!(nonce = self.nonce, time = self.time, "computed proof-of-work digest");
        digest
    }

    /// Rejects a wire flag that claims proof-of-stake on a header without a
    /// stake kernel. A zero flag on a staked header is an unset echo, not a
    /// contradiction.
    pub fn check_mode_flags(&self) -> Result<()> {
        if self.proof_of_stake_flag > 1 || self.full_node_proof > 1 {
            return Err(ConsensusError::InvalidConsensusMode(
                "flag byte outside {0, 1}".into(),
            ));
        }
        if self.proof_of_stake_flag == 1 && self.prevout_stake.is_null() {
            return Err(ConsensusError::InvalidConsensusMode(
                "proof-of-stake flag set without a stake kernel".into(),
            ));
        }
        Ok(())
    }
}

impl ProofMode for BlockHeader {
    #[inline]
    fn is_proof_of_stake(&self) -> bool {
        !self.prevout_stake.is_null()
    }

    #[inline]
    fn header_time(&self) -> u32 {
        self.time
    }
}

/// Header view with a forced consensus mode, for hashing contexts where the
/// mode is known but no kernel reference is carried.
#[derive(Debug, Clone, Copy)]
pub struct FixedModeHeader<'a> {
    pub header: &'a BlockHeader,
    pub mode: ConsensusKind,
}

impl<'a> FixedModeHeader<'a> {
    pub fn new(header: &'a BlockHeader, mode: ConsensusKind) -> Self {
        FixedModeHeader { header, mode }
    }
}

impl ProofMode for FixedModeHeader<'_> {
    fn is_proof_of_stake(&self) -> bool {
        self.mode == ConsensusKind::ProofOfStake
    }

    fn header_time(&self) -> u32 {
        self.header.time
    }
}
