//! Stake inputs: value sources that compete to mint proof-of-stake blocks
//!
//! A [`StakeInput`] is built for one staking attempt, asked for the four
//! kernel inputs (origin time, modifier, uniqueness, value) and, on a hit,
//! for the coinstake input and outputs. Everything it knows about the chain
//! comes through the [`ChainIndex`] collaborator on every call; nothing is
//! cached between calls.

pub mod denominated;
pub mod kernel;
pub mod memory;
pub mod transparent;

pub use denominated::DenominatedStake;
pub use kernel::{check_stake_kernel, compute_kernel_hash, search_kernel, stake_target, KernelHit};
pub use memory::MemoryChainIndex;
pub use transparent::TransparentStake;

use crate::error::{ConsensusError, Result};
use crate::header::ProofMode;
use crate::types::{
    Amount, BlockHash, ByteString, Hash, OutPoint, StakeModifier, Transaction, TransactionInput,
    TransactionOutput,
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Opaque handle to an entry in the chain index. Non-owning: the index
/// owns the entry and may outlive or be replaced under any input holding
/// the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexKey(pub BlockHash);

/// What the stake code needs to know about an indexed block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub key: IndexKey,
    pub height: u64,
    pub time: u32,
    pub proof_of_stake: bool,
}

impl ProofMode for IndexEntry {
    fn is_proof_of_stake(&self) -> bool {
        self.proof_of_stake
    }

    fn header_time(&self) -> u32 {
        self.time
    }
}

/// Read-only view of the chain index, UTXO set and serial registry
pub trait ChainIndex: Send + Sync {
    fn entry(&self, key: &IndexKey) -> Option<IndexEntry>;

    fn tip_height(&self) -> u64;

    /// Stake modifier computed at `height`, if that height has been indexed
    fn stake_modifier_at(&self, height: u64) -> Option<StakeModifier>;

    /// Confirmed transaction and the block containing it
    fn transaction(&self, txid: &Hash) -> Option<(Transaction, IndexKey)>;

    fn is_spent(&self, outpoint: &OutPoint) -> bool;

    /// Whether a denominated commitment's serial has been revealed
    fn is_serial_spent(&self, serial_hash: &Hash) -> bool;
}

/// A value source that can stake.
///
/// Object-safe; callers typically hold `Box<dyn StakeInput>`.
pub trait StakeInput: Send + Sync {
    /// Block that confirmed the staked value
    fn origin_index(&self, chain: &dyn ChainIndex) -> Result<IndexEntry>;

    /// Coinstake input spending this value. `output_hash` is the digest of
    /// the coinstake outputs, for inputs that commit to them.
    fn create_tx_in(
        &self,
        chain: &dyn ChainIndex,
        output_hash: Option<Hash>,
    ) -> Result<TransactionInput>;

    /// Transaction that created the staked value
    fn source_transaction(&self, chain: &dyn ChainIndex) -> Result<Transaction>;

    /// Staked amount, read from the origin output
    fn value(&self, chain: &dyn ChainIndex) -> Result<Amount>;

    /// Coinstake outputs paying `total` back to the staker
    fn create_tx_outs(&self, chain: &dyn ChainIndex, total: Amount)
        -> Result<Vec<TransactionOutput>>;

    fn modifier(&self, chain: &dyn ChainIndex) -> Result<StakeModifier>;

    /// Bytes that distinguish this input from every other input staking at
    /// the same time
    fn uniqueness(&self, chain: &dyn ChainIndex) -> Result<ByteString>;

    /// Public key that must sign a block staked with this input
    fn signer(&self, chain: &dyn ChainIndex) -> Result<ByteString>;

    /// Fails with `StakeInputUnavailable` once the staked value has been
    /// spent, so one value cannot stake twice.
    fn check_unspent(&self, chain: &dyn ChainIndex) -> Result<()>;
}

pub(crate) fn unavailable(msg: impl Into<Cow<'static, str>>) -> ConsensusError {
    ConsensusError::StakeInputUnavailable(msg.into())
}

/// Confirmations of `entry` as seen from the current tip
pub fn origin_depth(entry: &IndexEntry, chain: &dyn ChainIndex) -> u64 {
    let tip = chain.tip_height();
    if entry.height > tip {
        return 0;
    }
    tip - entry.height + 1
}

/// Fails with `StakeInputUnavailable` unless the origin is at least
/// `min_depth` blocks deep.
pub fn check_origin_depth(entry: &IndexEntry, chain: &dyn ChainIndex, min_depth: u64) -> Result<()> {
    let depth = origin_depth(entry, chain);
    if depth < min_depth {
        return Err(unavailable(format!(
            "origin at height {} has depth {depth}, need {min_depth}",
            entry.height
        )));
    }
    Ok(())
}

/// Origin of an output: its transaction and the index entry of the block
/// that confirmed it.
pub(crate) fn resolve_output(
    chain: &dyn ChainIndex,
    outpoint: &OutPoint,
) -> Result<(Transaction, IndexEntry)> {
    let (tx, key) = chain
        .transaction(&outpoint.hash)
        .ok_or_else(|| unavailable(format!("transaction for {outpoint} not found")))?;
    if outpoint.index as usize >= tx.outputs.len() {
        return Err(unavailable(format!("{outpoint} out of range")));
    }
    let entry = chain
        .entry(&key)
        .ok_or_else(|| unavailable(format!("block containing {outpoint} not indexed")))?;
    Ok((tx, entry))
}

/// Modifier at `origin_height + offset`. Not ready until the chain has
/// indexed that height.
pub(crate) fn modifier_after(
    chain: &dyn ChainIndex,
    origin_height: u64,
    offset: u64,
) -> Result<StakeModifier> {
    let height = origin_height.saturating_add(offset);
    if height > chain.tip_height() {
        return Err(ConsensusError::ModifierNotReady { height });
    }
    chain
        .stake_modifier_at(height)
        .ok_or(ConsensusError::ModifierNotReady { height })
}

/// Key of a pay-to-pubkey script: `<33 or 65 byte push> OP_CHECKSIG`
pub(crate) fn p2pk_key(script: &[u8]) -> Option<&[u8]> {
    const OP_CHECKSIG: u8 = 0xac;
    let (&len, rest) = script.split_first()?;
    let len = len as usize;
    if (len == 33 || len == 65) && rest.len() == len + 1 && rest[len] == OP_CHECKSIG {
        Some(&rest[..len])
    } else {
        None
    }
}

pub(crate) fn signer_of(script: &[u8]) -> Result<ByteString> {
    p2pk_key(script)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| unavailable("staked output is not pay-to-pubkey"))
}
