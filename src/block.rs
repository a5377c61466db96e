//! Full block: header, transactions and, for proof-of-stake, the staker's
//! signature
//!
//! Alongside the wire fields a block carries memory-only state that is never
//! serialized: payouts computed during validation and two cached positive
//! validation results. Every mutator that can change what those caches
//! vouch for clears them.

use crate::error::{ConsensusError, Result};
use crate::header::{BlockHeader, ConsensusKind, ProofMode};
use crate::merkle::compute_merkle_root;
use crate::types::{hash_to_hex, BlockHash, ByteString, Hash, OutPoint, Transaction, TransactionOutput};
use std::fmt;

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub(crate) header: BlockHeader,
    /// First entry is the coinbase (proof-of-work) or coinstake (proof-of-stake)
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) block_sig: ByteString,

    // memory only
    pub(crate) masternode_payout: Option<TransactionOutput>,
    pub(crate) superblock_payouts: Vec<TransactionOutput>,
    pub(crate) checked: bool,
    pub(crate) signatures_verified: bool,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty block carrying `header`
    pub fn from_header(header: BlockHeader) -> Self {
        Block {
            header,
            ..Self::default()
        }
    }

    pub(crate) fn from_parts(
        header: BlockHeader,
        transactions: Vec<Transaction>,
        block_sig: ByteString,
    ) -> Self {
        Block {
            header,
            transactions,
            block_sig,
            ..Self::default()
        }
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    /// Mutable header access. Clears the validity caches.
    pub fn header_mut(&mut self) -> &mut BlockHeader {
        self.reset_caches();
        &mut self.header
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Mutable transaction access. Clears the validity caches.
    pub fn transactions_mut(&mut self) -> &mut Vec<Transaction> {
        self.reset_caches();
        &mut self.transactions
    }

    pub fn push_transaction(&mut self, tx: Transaction) {
        self.reset_caches();
        self.transactions.push(tx);
    }

    pub fn signature(&self) -> &[u8] {
        &self.block_sig
    }

    pub fn set_signature(&mut self, signature: ByteString) {
        self.signatures_verified = false;
        self.block_sig = signature;
    }

    pub fn masternode_payout(&self) -> Option<&TransactionOutput> {
        self.masternode_payout.as_ref()
    }

    pub fn set_masternode_payout(&mut self, payout: Option<TransactionOutput>) {
        self.masternode_payout = payout;
    }

    pub fn superblock_payouts(&self) -> &[TransactionOutput] {
        &self.superblock_payouts
    }

    pub fn set_superblock_payouts(&mut self, payouts: Vec<TransactionOutput>) {
        self.superblock_payouts = payouts;
    }

    /// Whether the merkle check has passed since the last mutation
    pub fn is_checked(&self) -> bool {
        self.checked
    }

    /// Whether the block signature has been verified since the last mutation
    pub fn signatures_verified(&self) -> bool {
        self.signatures_verified
    }

    pub(crate) fn mark_signatures_verified(&mut self) {
        self.signatures_verified = true;
    }

    fn reset_caches(&mut self) {
        self.checked = false;
        self.signatures_verified = false;
    }

    /// Reset to the null block. Idempotent.
    pub fn set_null(&mut self) {
        *self = Self::default();
    }

    pub fn is_null(&self) -> bool {
        self.header.is_null()
    }

    pub fn hash(&self) -> BlockHash {
        self.header.compute_hash()
    }

    /// `(kernel outpoint, header time)` for proof-of-stake, `(null, 0)` otherwise
    pub fn get_proof_of_stake(&self) -> (OutPoint, u32) {
        if self.is_proof_of_stake() {
            (self.header.prevout_stake, self.header.time)
        } else {
            (OutPoint::null(), 0)
        }
    }

    /// Standalone header copy with the proof-of-stake flag echoing the
    /// derived mode
    pub fn get_block_header(&self) -> BlockHeader {
        BlockHeader {
            proof_of_stake_flag: u8::from(self.is_proof_of_stake()),
            ..self.header.clone()
        }
    }

    /// Merkle root of the current transaction list and whether the tree was
    /// mutated
    pub fn compute_merkle_root(&self) -> (Hash, bool) {
        compute_merkle_root(&self.transactions)
    }

    /// Verify the header's merkle root against the transactions.
    ///
    /// A pass is cached until the next mutation; a failure is not.
    pub fn check_merkle_root(&mut self) -> Result<()> {
        if self.checked {
            return Ok(());
        }

        let (root, mutated) = self.compute_merkle_root();
        if root != self.header.merkle_root {
            return Err(ConsensusError::HashMismatch {
                field: "merkle root",
                expected: hash_to_hex(&self.header.merkle_root),
                actual: hash_to_hex(&root),
            });
        }
        if mutated {
            return Err(ConsensusError::MalformedEncoding(
                "duplicate transactions in merkle tree".into(),
            ));
        }

        self.checked = true;
        Ok(())
    }
}

/// Equality over the wire fields only; payouts and caches are ignored.
impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header
            && self.transactions == other.transactions
            && self.block_sig == other.block_sig
    }
}

impl Eq for Block {}

impl ProofMode for Block {
    fn is_proof_of_stake(&self) -> bool {
        self.header.is_proof_of_stake()
    }

    fn header_time(&self) -> u32 {
        self.header.time
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Block(hash={}, ver=0x{:08x}, prev_block_hash={}, merkle_root={}, time={}, bits={:08x}, nonce={}, type={}, prevout_stake={}, vtx={})",
            self.hash(),
            self.header.version,
            hash_to_hex(&self.header.prev_block_hash),
            hash_to_hex(&self.header.merkle_root),
            self.header.time,
            self.header.bits,
            self.header.nonce,
            ConsensusKind::of(self).label(),
            self.header.prevout_stake,
            self.transactions.len()
        )?;
        for tx in &self.transactions {
            let rendered = tx.to_string();
            for line in rendered.lines() {
                write!(f, "\n  {line}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionInput;

    fn coinbase() -> Transaction {
        Transaction {
            version: 1,
            inputs: vec![TransactionInput::new(OutPoint::null(), vec![0x03, 0x01])],
            outputs: vec![TransactionOutput::new(50, vec![0x51])],
            lock_time: 0,
        }
    }

    fn valid_block() -> Block {
        let mut block = Block::from_header(BlockHeader {
            version: 1,
            time: 1_700_000_000,
            bits: 0x1e0f_ffff,
            ..BlockHeader::default()
        });
        block.push_transaction(coinbase());
        block.header.merkle_root = block.compute_merkle_root().0;
        block
    }

    #[test]
    fn test_set_null_idempotent() {
        let mut block = valid_block();
        block.set_signature(vec![1, 2, 3]);
        block.set_masternode_payout(Some(TransactionOutput::new(5, vec![])));
        block.check_merkle_root().unwrap();

        block.set_null();
        let once = block.clone();
        block.set_null();
        assert_eq!(block, once);
        assert!(block.is_null());
        assert!(block.transactions().is_empty());
        assert!(block.signature().is_empty());
        assert!(block.masternode_payout().is_none());
        assert!(!block.is_checked());
    }

    #[test]
    fn test_equality_ignores_memory_only_state() {
        let fresh = valid_block();
        let mut validated = fresh.clone();
        validated.check_merkle_root().unwrap();
        validated.mark_signatures_verified();
        validated.set_masternode_payout(Some(TransactionOutput::new(5, vec![0x51])));
        validated.set_superblock_payouts(vec![TransactionOutput::new(7, vec![])]);
        assert_eq!(validated, fresh);

        validated.set_signature(vec![0x30]);
        assert_ne!(validated, fresh);
    }

    #[test]
    fn test_merkle_check_caches_positive_only() {
        let mut block = valid_block();
        assert!(!block.is_checked());
        block.check_merkle_root().unwrap();
        assert!(block.is_checked());

        // any mutation through the block clears the cache
        block.push_transaction(coinbase());
        assert!(!block.is_checked());
        assert!(matches!(
            block.check_merkle_root(),
            Err(ConsensusError::HashMismatch { .. })
        ));
        assert!(!block.is_checked());
    }

    #[test]
    fn test_mutated_merkle_tree_rejected() {
        let mut block = valid_block();
        block.push_transaction(coinbase());
        let root = block.compute_merkle_root().0;
        block.header_mut().merkle_root = root;
        assert!(matches!(
            block.check_merkle_root(),
            Err(ConsensusError::MalformedEncoding(_))
        ));
    }

    #[test]
    fn test_signature_change_clears_verification() {
        let mut block = valid_block();
        block.mark_signatures_verified();
        assert!(block.signatures_verified());
        block.set_signature(vec![9]);
        assert!(!block.signatures_verified());
    }

    #[test]
    fn test_get_proof_of_stake() {
        let mut block = valid_block();
        assert_eq!(block.get_proof_of_stake(), (OutPoint::null(), 0));

        let kernel = OutPoint::new([4; 32], 1);
        block.header_mut().prevout_stake = kernel;
        assert_eq!(block.get_proof_of_stake(), (kernel, 1_700_000_000));
    }

    #[test]
    fn test_get_block_header_sets_flag() {
        let mut block = valid_block();
        block.header_mut().full_node_proof = 1;
        let h = block.get_block_header();
        assert_eq!(h.proof_of_stake_flag, 0);
        assert_eq!(h.full_node_proof, 1);

        block.header_mut().prevout_stake = OutPoint::new([4; 32], 1);
        assert_eq!(block.get_block_header().proof_of_stake_flag, 1);
        // the block's own header is untouched
        assert_eq!(block.header().proof_of_stake_flag, 0);
    }

    #[test]
    fn test_display_lists_transactions() {
        let block = valid_block();
        let rendered = block.to_string();
        assert!(rendered.starts_with("Block(hash="));
        assert!(rendered.contains("type=PoW"));
        assert!(rendered.contains("vtx=1"));
        assert!(rendered.contains("\n  Transaction(txid="));
        assert!(rendered.contains("\n      OutPoint("));
    }
}
