//! Core chain types shared by the header, block and stake modules

use crate::constants::NULL_INDEX;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hash type: 256-bit hash, stored in internal (little-endian) byte order
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Amount in base units
pub type Amount = i64;

/// Per-height entropy value mixed into the staking kernel
pub type StakeModifier = u64;

/// Render a hash the way block explorers do: reversed, lowercase hex.
pub fn hash_to_hex(hash: &Hash) -> String {
    let mut reversed = *hash;
    reversed.reverse();
    hex::encode(reversed)
}

/// Block hash: newtype wrapper for type safety
///
/// Prevents mixing up block hashes with other Hash values (transaction ids,
/// merkle roots). Same memory layout as Hash.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlockHash(pub Hash);

impl BlockHash {
    #[inline]
    pub fn new(hash: Hash) -> Self {
        BlockHash(hash)
    }

    #[inline]
    pub fn as_hash(self) -> Hash {
        self.0
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl From<Hash> for BlockHash {
    #[inline]
    fn from(hash: Hash) -> Self {
        BlockHash(hash)
    }
}

impl From<BlockHash> for Hash {
    #[inline]
    fn from(hash: BlockHash) -> Self {
        hash.0
    }
}

impl std::ops::Deref for BlockHash {
    type Target = Hash;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hash_to_hex(&self.0))
    }
}

/// Reference to a transaction output: (txid, index)
///
/// The null outpoint (all-zero txid, index `NULL_INDEX`) marks a
/// proof-of-work header's absent stake kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: u32,
}

impl OutPoint {
    pub fn new(hash: Hash, index: u32) -> Self {
        OutPoint { hash, index }
    }

    pub const fn null() -> Self {
        OutPoint {
            hash: [0u8; 32],
            index: NULL_INDEX,
        }
    }

    pub fn set_null(&mut self) {
        *self = OutPoint::null();
    }

    pub fn is_null(&self) -> bool {
        self.hash == [0u8; 32] && self.index == NULL_INDEX
    }
}

impl Default for OutPoint {
    fn default() -> Self {
        OutPoint::null()
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let txid = hash_to_hex(&self.hash);
        write!(f, "OutPoint({}, {})", &txid[..10], self.index)
    }
}

/// Transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    pub script_sig: ByteString,
    pub sequence: u32,
}

impl TransactionInput {
    pub fn new(prevout: OutPoint, script_sig: ByteString) -> Self {
        TransactionInput {
            prevout,
            script_sig,
            sequence: u32::MAX,
        }
    }
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: Amount,
    pub script_pubkey: ByteString,
}

impl TransactionOutput {
    pub fn new(value: Amount, script_pubkey: ByteString) -> Self {
        TransactionOutput {
            value,
            script_pubkey,
        }
    }

    /// An empty output: zero value, empty script. Coinstake transactions
    /// lead with one.
    pub fn empty() -> Self {
        TransactionOutput {
            value: 0,
            script_pubkey: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value == 0 && self.script_pubkey.is_empty()
    }
}

impl fmt::Display for TransactionOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let script = hex::encode(&self.script_pubkey);
        let shown = &script[..script.len().min(30)];
        write!(
            f,
            "TxOut(value={}.{:08}, script_pubkey={})",
            self.value / crate::constants::COIN,
            (self.value % crate::constants::COIN).abs(),
            shown
        )
    }
}

/// Transaction
///
/// Transaction validity is decided elsewhere; this core only needs the
/// canonical encoding (for the txid and merkle root) and a rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
}

impl Transaction {
    /// Transaction id: double SHA-256 of the canonical encoding
    pub fn txid(&self) -> Hash {
        crate::crypto::hash256(&crate::serialization::serialize_transaction(self))
    }

    /// Single null-prevout input
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prevout.is_null()
    }

    /// At least one real input and an empty first output
    pub fn is_coinstake(&self) -> bool {
        !self.inputs.is_empty()
            && !self.inputs[0].prevout.is_null()
            && self.outputs.len() >= 2
            && self.outputs[0].is_empty()
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transaction(txid={}, ver={}, inputs={}, outputs={}, lock_time={})",
            &hash_to_hex(&self.txid())[..10],
            self.version,
            self.inputs.len(),
            self.outputs.len(),
            self.lock_time
        )?;
        for input in &self.inputs {
            write!(f, "\n    {}", input.prevout)?;
        }
        for output in &self.outputs {
            write!(f, "\n    {output}")?;
        }
        Ok(())
    }
}
