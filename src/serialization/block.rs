//! Block header and block wire format serialization/deserialization
//!
//! Header (network purpose, 118 bytes; hash purpose stops at byte 116):
//! - Version (4 bytes, little-endian, signed)
//! - Previous block hash (32 bytes)
//! - Merkle root (32 bytes)
//! - Time (4 bytes, little-endian)
//! - Bits (4 bytes, little-endian)
//! - Nonce (4 bytes, little-endian)
//! - Stake kernel outpoint (32-byte txid + 4-byte index)
//! - Proof-of-stake flag (1 byte, network purpose only)
//! - Full-node proof flag (1 byte, network purpose only)
//!
//! Block:
//! - Header
//! - VarInt: transaction count, then each transaction
//! - Merkle root restated (32 bytes)
//! - If the header is proof-of-stake: VarInt length + signature bytes
//!
//! The decoder reads the header first, derives the consensus mode from the
//! decoded kernel reference, and only then decides whether a signature
//! follows the body.

use super::transaction::{read_transaction, write_transaction};
use super::{write_outpoint, write_var_bytes, write_varint, Purpose, Reader};
use crate::block::Block;
use crate::constants::{
    HEADER_HASH_SIZE, HEADER_NETWORK_SIZE, MAX_BLOCK_SERIALIZED_SIZE, MAX_BLOCK_SIGNATURE_SIZE,
};
use crate::error::{ConsensusError, Result};
use crate::header::{BlockHeader, ProofMode};
use crate::types::hash_to_hex;
use std::borrow::Cow;

/// Smallest possible encoded transaction: version + two empty counts + lock time
const MIN_TX_SIZE: usize = 10;

/// Error type for block parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockParseError {
    InsufficientBytes,
    InvalidFlag,
    OversizedBlock,
}

impl std::fmt::Display for BlockParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockParseError::InsufficientBytes => {
                write!(f, "Insufficient bytes to parse block header")
            }
            BlockParseError::InvalidFlag => write!(f, "Header flag byte outside {{0, 1}}"),
            BlockParseError::OversizedBlock => write!(f, "Block exceeds maximum serialized size"),
        }
    }
}

impl std::error::Error for BlockParseError {}

impl From<BlockParseError> for ConsensusError {
    fn from(e: BlockParseError) -> Self {
        ConsensusError::MalformedEncoding(Cow::Owned(e.to_string()))
    }
}

/// Encoded header length for a purpose
pub fn header_size(purpose: Purpose) -> usize {
    if purpose.includes_envelope() {
        HEADER_NETWORK_SIZE
    } else {
        HEADER_HASH_SIZE
    }
}

/// Serialize a block header.
///
/// One field list; `purpose` only decides whether the two trailing flag
/// bytes are present.
pub fn serialize_block_header(header: &BlockHeader, purpose: Purpose) -> Vec<u8> {
    let mut out = Vec::with_capacity(header_size(purpose));
    write_block_header(&mut out, header, purpose);
    debug_assert_eq!(out.len(), header_size(purpose));
    out
}

pub(crate) fn write_block_header(out: &mut Vec<u8>, header: &BlockHeader, purpose: Purpose) {
    out.extend_from_slice(&header.version.to_le_bytes());
    out.extend_from_slice(&header.prev_block_hash);
    out.extend_from_slice(&header.merkle_root);
    out.extend_from_slice(&header.time.to_le_bytes());
    out.extend_from_slice(&header.bits.to_le_bytes());
    out.extend_from_slice(&header.nonce.to_le_bytes());
    write_outpoint(out, &header.prevout_stake);
    if purpose.includes_envelope() {
        out.push(header.proof_of_stake_flag);
        out.push(header.full_node_proof);
    }
}

/// Deserialize a block header. The input must hold exactly one header.
///
/// Hash-purpose bytes carry no flags; the decoded flags are then zero.
pub fn deserialize_block_header(data: &[u8], purpose: Purpose) -> Result<BlockHeader> {
    if data.len() < header_size(purpose) {
        return Err(BlockParseError::InsufficientBytes.into());
    }
    let mut reader = Reader::new(data);
    let header = read_block_header(&mut reader, purpose)?;
    reader.finish("block header")?;
    Ok(header)
}

pub(crate) fn read_block_header(reader: &mut Reader<'_>, purpose: Purpose) -> Result<BlockHeader> {
    let version = reader.read_i32("header version")?;
    let prev_block_hash = reader.read_hash("previous block hash")?;
    let merkle_root = reader.read_hash("merkle root")?;
    let time = reader.read_u32("header time")?;
    let bits = reader.read_u32("header bits")?;
    let nonce = reader.read_u32("header nonce")?;
    let prevout_stake = reader.read_outpoint("stake kernel")?;

    let (proof_of_stake_flag, full_node_proof) = if purpose.includes_envelope() {
        let pos = reader.read_u8("proof-of-stake flag")?;
        let fnp = reader.read_u8("full-node proof flag")?;
        if pos > 1 || fnp > 1 {
            return Err(BlockParseError::InvalidFlag.into());
        }
        (pos, fnp)
    } else {
        (0, 0)
    };

    Ok(BlockHeader {
        version,
        prev_block_hash,
        merkle_root,
        time,
        bits,
        nonce,
        prevout_stake,
        proof_of_stake_flag,
        full_node_proof,
    })
}

/// Serialize a complete block
pub fn serialize_block(block: &Block, purpose: Purpose) -> Vec<u8> {
    let header = block.header();
    let mut out = Vec::with_capacity(header_size(purpose) + 64 * block.transactions().len() + 128);

    write_block_header(&mut out, header, purpose);

    write_varint(&mut out, block.transactions().len() as u64);
    for tx in block.transactions() {
        write_transaction(&mut out, tx);
    }

    out.extend_from_slice(&header.merkle_root);

    if block.is_proof_of_stake() {
        write_var_bytes(&mut out, block.signature());
    }

    out
}

/// Deserialize a complete block.
///
/// The restated merkle root must equal the header's; the signature is read
/// only when the decoded header is proof-of-stake; trailing bytes are
/// rejected.
pub fn deserialize_block(data: &[u8], purpose: Purpose) -> Result<Block> {
    if data.len() > MAX_BLOCK_SERIALIZED_SIZE {
        return Err(BlockParseError::OversizedBlock.into());
    }

    let mut reader = Reader::new(data);
    let header = read_block_header(&mut reader, purpose)?;

    let tx_count = reader.read_count(MAX_BLOCK_SERIALIZED_SIZE / MIN_TX_SIZE, "transaction")?;
    let mut transactions = Vec::with_capacity(tx_count.min(reader.remaining() / MIN_TX_SIZE));
    for _ in 0..tx_count {
        transactions.push(read_transaction(&mut reader)?);
    }

    let restated_root = reader.read_hash("restated merkle root")?;
    if restated_root != header.merkle_root {
        return Err(ConsensusError::HashMismatch {
            field: "restated merkle root",
            expected: hash_to_hex(&header.merkle_root),
            actual: hash_to_hex(&restated_root),
        });
    }

    let signature = if header.is_proof_of_stake() {
        reader.read_var_bytes(MAX_BLOCK_SIGNATURE_SIZE, "block signature")?
    } else {
        Vec::new()
    };

    reader.finish("block")?;

    Ok(Block::from_parts(header, transactions, signature))
}
