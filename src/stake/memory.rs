//! In-memory [`ChainIndex`]
//!
//! Map-backed index for tools, tests and benches that need a chain without
//! storage. Nothing here is consensus logic: it answers lookups exactly as
//! it was populated.

use super::{ChainIndex, IndexEntry, IndexKey};
use crate::types::{BlockHash, Hash, OutPoint, StakeModifier, Transaction};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct MemoryChainIndex {
    entries: HashMap<IndexKey, IndexEntry>,
    transactions: HashMap<Hash, (Transaction, IndexKey)>,
    modifiers: HashMap<u64, StakeModifier>,
    spent: HashSet<OutPoint>,
    spent_serials: HashSet<Hash>,
    tip_height: u64,
}

impl MemoryChainIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a block. Raises the tip to `height` if it is higher.
    pub fn add_block(&mut self, hash: BlockHash, height: u64, time: u32, proof_of_stake: bool) -> IndexKey {
        let key = IndexKey(hash);
        self.entries.insert(
            key,
            IndexEntry {
                key,
                height,
                time,
                proof_of_stake,
            },
        );
        self.tip_height = self.tip_height.max(height);
        key
    }

    /// Record `tx` as confirmed in the block behind `key`
    pub fn add_transaction(&mut self, tx: Transaction, key: IndexKey) -> Hash {
        let txid = tx.txid();
        self.transactions.insert(txid, (tx, key));
        txid
    }

    pub fn set_stake_modifier(&mut self, height: u64, modifier: StakeModifier) {
        self.modifiers.insert(height, modifier);
    }

    pub fn set_tip_height(&mut self, height: u64) {
        self.tip_height = height;
    }

    pub fn spend(&mut self, outpoint: OutPoint) {
        self.spent.insert(outpoint);
    }

    pub fn spend_serial(&mut self, serial_hash: Hash) {
        self.spent_serials.insert(serial_hash);
    }
}

impl ChainIndex for MemoryChainIndex {
    fn entry(&self, key: &IndexKey) -> Option<IndexEntry> {
        self.entries.get(key).cloned()
    }

    fn tip_height(&self) -> u64 {
        self.tip_height
    }

    fn stake_modifier_at(&self, height: u64) -> Option<StakeModifier> {
        self.modifiers.get(&height).copied()
    }

    fn transaction(&self, txid: &Hash) -> Option<(Transaction, IndexKey)> {
        self.transactions.get(txid).cloned()
    }

    fn is_spent(&self, outpoint: &OutPoint) -> bool {
        self.spent.contains(outpoint)
    }

    fn is_serial_spent(&self, serial_hash: &Hash) -> bool {
        self.spent_serials.contains(serial_hash)
    }
}
