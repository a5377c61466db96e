//! Consensus-mode state machine
//!
//! A candidate block starts `Unvalidated` and ends in exactly one of
//! `ProofOfWork`, `ProofOfStake` or `Invalid`. The mode is derived from the
//! stake kernel reference alone; the wire flag only has to agree with it.
//!
//! Proof-of-work path: merkle root, then the mixed digest against `bits`.
//! Proof-of-stake path: merkle root, stake origin depth, unspent stake,
//! kernel target, then the block signature over the sign-stripped header
//! hash.

use crate::block::Block;
use crate::config::{ConsensusConfig, StakeParams};
use crate::crypto::{PowMixHash, SignatureVerifier};
use crate::error::{ConsensusError, Result};
use crate::header::{ConsensusKind, ProofMode};
use crate::pow::check_proof_of_work;
use crate::stake::{check_origin_depth, check_stake_kernel, ChainIndex, StakeInput, TransparentStake};
use crate::types::OutPoint;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsensusState {
    Unvalidated,
    ProofOfWork,
    ProofOfStake,
    Invalid(ConsensusError),
}

impl ConsensusState {
    /// Every state except `Unvalidated` is final for the attempt
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ConsensusState::Unvalidated)
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ConsensusState::ProofOfWork | ConsensusState::ProofOfStake)
    }

    /// Move to `next`. Refused (returns false, state unchanged) from a
    /// terminal state or towards `Unvalidated`.
    pub fn transition(&mut self, next: ConsensusState) -> bool {
        if self.is_terminal() || next == ConsensusState::Unvalidated {
            return false;
        }
        *self = next;
        true
    }

    pub fn error(&self) -> Option<&ConsensusError> {
        match self {
            ConsensusState::Invalid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConsensusKind> for ConsensusState {
    fn from(kind: ConsensusKind) -> Self {
        match kind {
            ConsensusKind::ProofOfWork => ConsensusState::ProofOfWork,
            ConsensusKind::ProofOfStake => ConsensusState::ProofOfStake,
        }
    }
}

/// Turns a block's stake kernel reference into the input that staked it
pub trait StakeResolver: Send + Sync {
    fn resolve(&self, kernel: &OutPoint, chain: &dyn ChainIndex) -> Result<Box<dyn StakeInput>>;
}

/// Treats every kernel reference as a plain previous output
#[derive(Debug, Clone, Default)]
pub struct TransparentResolver {
    params: StakeParams,
}

impl TransparentResolver {
    pub fn new(params: StakeParams) -> Self {
        TransparentResolver { params }
    }
}

impl StakeResolver for TransparentResolver {
    fn resolve(&self, kernel: &OutPoint, _chain: &dyn ChainIndex) -> Result<Box<dyn StakeInput>> {
        Ok(Box::new(TransparentStake::new(*kernel, &self.params)))
    }
}

/// Classifies candidate blocks against a chain view
pub struct BlockValidator<'a> {
    chain: &'a dyn ChainIndex,
    mixer: &'a dyn PowMixHash,
    verifier: &'a dyn SignatureVerifier,
    resolver: Box<dyn StakeResolver + 'a>,
    config: ConsensusConfig,
}

impl<'a> BlockValidator<'a> {
    pub fn new(
        chain: &'a dyn ChainIndex,
        mixer: &'a dyn PowMixHash,
        verifier: &'a dyn SignatureVerifier,
        config: ConsensusConfig,
    ) -> Self {
        let resolver = Box::new(TransparentResolver::new(config.stake.clone()));
        BlockValidator {
            chain,
            mixer,
            verifier,
            resolver,
            config,
        }
    }

    pub fn with_resolver(mut self, resolver: impl StakeResolver + 'a) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    /// Run the block through the state machine.
    ///
    /// Positive merkle and signature results are cached on the block, so a
    /// second call on an unmutated block skips that work.
    pub fn classify(&self, block: &mut Block) -> ConsensusState {
        let mut state = ConsensusState::Unvalidated;
        let next = match self.validate(block) {
            Ok(kind) => kind.into(),
            Err(e) => {
                if self.config.debug.log_rejections {
                    tracing::warn!(
                        block = %block.hash(),
                        mode = ConsensusKind::of(&*block).label(),
                        error = %e,
                        "block rejected"
                    );
                }
                ConsensusState::Invalid(e)
            }
        };
        state.transition(next);
        state
    }

    fn validate(&self, block: &mut Block) -> Result<ConsensusKind> {
        block.header().check_mode_flags()?;

        let max_sig = self.config.network_limits.max_block_signature_len;
        if block.signature().len() > max_sig {
            return Err(ConsensusError::MalformedEncoding(
                format!("block signature of {} bytes exceeds {max_sig}", block.signature().len())
                    .into(),
            ));
        }

        block.check_merkle_root()?;

        if block.is_proof_of_stake() {
            self.validate_proof_of_stake(block)?;
            Ok(ConsensusKind::ProofOfStake)
        } else {
            self.validate_proof_of_work(block)?;
            Ok(ConsensusKind::ProofOfWork)
        }
    }

    fn validate_proof_of_work(&self, block: &Block) -> Result<()> {
        if !block.signature().is_empty() {
            return Err(ConsensusError::InvalidConsensusMode(
                "proof-of-work block carries a signature".into(),
            ));
        }
        match block.transactions().first() {
            Some(tx) if tx.is_coinbase() => {}
            _ => {
                return Err(ConsensusError::InvalidConsensusMode(
                    "proof-of-work block must lead with a coinbase".into(),
                ))
            }
        }

        if !check_proof_of_work(block.header(), self.mixer, self.config.pow.pow_limit_bits)? {
            return Err(ConsensusError::InvalidProofOfWork(
                "hash does not meet target".into(),
            ));
        }
        Ok(())
    }

    fn validate_proof_of_stake(&self, block: &mut Block) -> Result<()> {
        let header = block.header();
        let kernel = header.prevout_stake;

        if block.signature().is_empty() {
            return Err(ConsensusError::InvalidConsensusMode(
                "proof-of-stake block without a signature".into(),
            ));
        }
        match block.transactions().first() {
            Some(tx) if tx.is_coinstake() && tx.inputs[0].prevout == kernel => {}
            _ => {
                return Err(ConsensusError::InvalidConsensusMode(
                    "proof-of-stake block must lead with a coinstake spending its kernel".into(),
                ))
            }
        }

        let input = self.resolver.resolve(&kernel, self.chain)?;
        let origin = input.origin_index(self.chain)?;
        check_origin_depth(&origin, self.chain, self.config.stake.min_stake_depth)?;
        input.check_unspent(self.chain)?;
        check_stake_kernel(input.as_ref(), self.chain, header.bits, header.time)?;

        if !block.signatures_verified() {
            let signer = input.signer(self.chain)?;
            let message = block.header().compute_hash_without_sign();
            if !self.verifier.verify(&message, block.signature(), &signer) {
                return Err(ConsensusError::SignatureInvalid(
                    "block signature does not match staker".into(),
                ));
            }
            block.mark_signatures_verified();
        }
        Ok(())
    }
}
