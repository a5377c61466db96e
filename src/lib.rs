//! # hybrid-consensus
//!
//! Consensus core of a hybrid proof-of-work / proof-of-stake chain: block
//! header and body representation, the hash commitments that bind them, and
//! the stake-input abstraction that lets different kinds of value compete to
//! mint proof-of-stake blocks.
//!
//! Producers and verifiers must agree on every byte and every digest, so
//! everything here is deterministic and side-effect free apart from the
//! validity caches a [`block::Block`] keeps for itself.
//!
//! ## Layout
//!
//! - [`header`] / [`block`] / [`locator`]: chain data and its hash derivations
//! - [`serialization`]: one field list per type, with a network and a hash
//!   [`serialization::Purpose`]
//! - [`pow`]: compact targets and the proof-of-work check
//! - [`stake`]: stake inputs, the chain-index collaborator and the kernel
//! - [`validation`]: the consensus-mode state machine
//!
//! ## Usage
//!
//! ```rust
//! use hybrid_consensus::block::Block;
//! use hybrid_consensus::header::{BlockHeader, ProofMode};
//! use hybrid_consensus::serialization::Purpose;
//! use hybrid_consensus::HybridConsensus;
//!
//! let header = BlockHeader {
//!     version: 1,
//!     time: 1_600_000_000,
//!     bits: 0x1e0f_ffff,
//!     ..BlockHeader::default()
//! };
//! let block = Block::from_header(header);
//! assert!(block.is_proof_of_work());
//!
//! let consensus = HybridConsensus::new();
//! let bytes = consensus.encode_block(&block, Purpose::Network);
//! let decoded = consensus.decode_block(&bytes, Purpose::Network).unwrap();
//! assert_eq!(decoded.hash(), block.hash());
//! ```

pub mod block;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod header;
pub mod locator;
pub mod merkle;
pub mod pow;
pub mod serialization;
pub mod stake;
pub mod types;
pub mod validation;

pub use block::Block;
pub use config::ConsensusConfig;
pub use error::{ConsensusError, Result};
pub use header::{BlockHeader, ConsensusKind, ProofMode};
pub use locator::BlockLocator;
pub use stake::{ChainIndex, KernelHit, StakeInput};
pub use validation::{BlockValidator, ConsensusState};

use crate::crypto::{Secp256k1Verifier, Sha256dMixer};
use crate::serialization::Purpose;
use std::borrow::Cow;

/// Entry points bound to one configuration and the default primitives
/// (double SHA-256 mixer, secp256k1 verifier).
///
/// All methods delegate to the corresponding module functions, applying the
/// configured limits first.
#[derive(Debug, Default)]
pub struct HybridConsensus {
    config: ConsensusConfig,
    mixer: Sha256dMixer,
    verifier: Secp256k1Verifier,
}

impl HybridConsensus {
    /// Uses the global configuration
    pub fn new() -> Self {
        Self::with_config(config::get_consensus_config())
    }

    pub fn with_config(config: ConsensusConfig) -> Self {
        HybridConsensus {
            config,
            mixer: Sha256dMixer,
            verifier: Secp256k1Verifier::new(),
        }
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn encode_block(&self, block: &Block, purpose: Purpose) -> Vec<u8> {
        serialization::serialize_block(block, purpose)
    }

    /// Decode a block, enforcing the configured size limit
    pub fn decode_block(&self, data: &[u8], purpose: Purpose) -> Result<Block> {
        let max = self.config.network_limits.max_block_size;
        if data.len() > max {
            return Err(ConsensusError::MalformedEncoding(Cow::Owned(format!(
                "block of {} bytes exceeds {max}",
                data.len()
            ))));
        }
        serialization::deserialize_block(data, purpose)
    }

    pub fn encode_locator(&self, locator: &BlockLocator, purpose: Purpose) -> Vec<u8> {
        serialization::serialize_locator(locator, purpose, constants::PROTOCOL_VERSION)
    }

    /// Decode a locator, enforcing the configured entry limit
    pub fn decode_locator(&self, data: &[u8], purpose: Purpose) -> Result<BlockLocator> {
        let max = self.config.network_limits.max_locator_entries;
        serialization::deserialize_locator(data, purpose, max).map(|(locator, _)| locator)
    }

    pub fn check_proof_of_work(&self, header: &BlockHeader) -> Result<bool> {
        pow::check_proof_of_work(header, &self.mixer, self.config.pow.pow_limit_bits)
    }

    /// Classify `block` against `chain`, staked with plain previous outputs
    pub fn classify(&self, block: &mut Block, chain: &dyn ChainIndex) -> ConsensusState {
        self.validator(chain).classify(block)
    }

    /// Stake kernel search from `start_time` over the configured
    /// `max_search_window` attempt times
    pub fn search_kernel(
        &self,
        input: &dyn StakeInput,
        chain: &dyn ChainIndex,
        bits: u32,
        start_time: u32,
    ) -> Result<KernelHit> {
        stake::search_kernel(input, chain, bits, start_time, self.config.stake.max_search_window)
    }

    pub fn validator<'a>(&'a self, chain: &'a dyn ChainIndex) -> BlockValidator<'a> {
        BlockValidator::new(chain, &self.mixer, &self.verifier, self.config.clone())
    }
}
