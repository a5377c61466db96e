//! Transaction wire format serialization/deserialization
//!
//! Format:
//! - Version (4 bytes, little-endian)
//! - Input count (VarInt)
//! - For each input:
//!   - Previous output hash (32 bytes)
//!   - Previous output index (4 bytes, little-endian)
//!   - Script length (VarInt) + script bytes
//!   - Sequence (4 bytes, little-endian)
//! - Output count (VarInt)
//! - For each output:
//!   - Value (8 bytes, little-endian)
//!   - Script length (VarInt) + script bytes
//! - Lock time (4 bytes, little-endian)

use super::{write_outpoint, write_var_bytes, write_varint, Reader};
use crate::constants::{MAX_SCRIPT_SIZE, MAX_TX_IO};
use crate::error::Result;
use crate::types::*;

/// Serialize a transaction to wire format
pub fn serialize_transaction(tx: &Transaction) -> Vec<u8> {
    let estimated_size = 4
        + 1
        + tx.inputs.iter().map(|i| 41 + i.script_sig.len()).sum::<usize>()
        + 1
        + tx.outputs.iter().map(|o| 9 + o.script_pubkey.len()).sum::<usize>()
        + 4;
    let mut out = Vec::with_capacity(estimated_size);
    write_transaction(&mut out, tx);
    out
}

pub(crate) fn write_transaction(out: &mut Vec<u8>, tx: &Transaction) {
    out.extend_from_slice(&tx.version.to_le_bytes());

    write_varint(out, tx.inputs.len() as u64);
    for input in &tx.inputs {
        write_outpoint(out, &input.prevout);
        write_var_bytes(out, &input.script_sig);
        out.extend_from_slice(&input.sequence.to_le_bytes());
    }

    write_varint(out, tx.outputs.len() as u64);
    for output in &tx.outputs {
        out.extend_from_slice(&output.value.to_le_bytes());
        write_var_bytes(out, &output.script_pubkey);
    }

    out.extend_from_slice(&tx.lock_time.to_le_bytes());
}

/// Deserialize a transaction from wire format.
///
/// Returns the transaction and the number of bytes consumed, so callers can
/// walk a block body.
pub fn deserialize_transaction(data: &[u8]) -> Result<(Transaction, usize)> {
    let mut reader = Reader::new(data);
    let tx = read_transaction(&mut reader)?;
    Ok((tx, reader.position()))
}

pub(crate) fn read_transaction(reader: &mut Reader<'_>) -> Result<Transaction> {
    let version = reader.read_i32("transaction version")?;

    let input_count = reader.read_count(MAX_TX_IO, "input")?;
    let mut inputs = Vec::with_capacity(input_count.min(1024));
    for _ in 0..input_count {
        let prevout = reader.read_outpoint("input prevout")?;
        let script_sig = reader.read_var_bytes(MAX_SCRIPT_SIZE, "script_sig")?;
        let sequence = reader.read_u32("input sequence")?;
        inputs.push(TransactionInput {
            prevout,
            script_sig,
            sequence,
        });
    }

    let output_count = reader.read_count(MAX_TX_IO, "output")?;
    let mut outputs = Vec::with_capacity(output_count.min(1024));
    for _ in 0..output_count {
        let value = reader.read_i64("output value")?;
        let script_pubkey = reader.read_var_bytes(MAX_SCRIPT_SIZE, "script_pubkey")?;
        outputs.push(TransactionOutput {
            value,
            script_pubkey,
        });
    }

    let lock_time = reader.read_u32("lock time")?;

    Ok(Transaction {
        version,
        inputs,
        outputs,
        lock_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx() -> Transaction {
        Transaction {
            version: 2,
            inputs: vec![TransactionInput {
                prevout: OutPoint::new([1; 32], 7),
                script_sig: vec![0x51, 0x52],
                sequence: 0xffff_fffe,
            }],
            outputs: vec![
                TransactionOutput::new(5000, vec![0x76, 0xa9]),
                TransactionOutput::new(0, vec![]),
            ],
            lock_time: 99,
        }
    }

    #[test]
    fn test_serialize_deserialize_transaction() {
        let tx = sample_tx();
        let bytes = serialize_transaction(&tx);
        let (decoded, consumed) = deserialize_transaction(&bytes).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn test_layout_prefix() {
        let bytes = serialize_transaction(&sample_tx());
        assert_eq!(&bytes[0..4], &2i32.to_le_bytes());
        assert_eq!(bytes[4], 1); // one input
        assert_eq!(&bytes[5..37], &[1u8; 32]);
        assert_eq!(&bytes[37..41], &7u32.to_le_bytes());
    }

    #[test]
    fn test_truncated_transaction_rejected() {
        let bytes = serialize_transaction(&sample_tx());
        for cut in [0, 3, 10, bytes.len() - 1] {
            assert!(deserialize_transaction(&bytes[..cut]).is_err(), "cut at {cut}");
        }
    }
}
