//! Transaction merkle root
//!
//! Double SHA-256 binary tree over txids, duplicating the last node of any
//! odd-length level. Duplicated pairs make two different transaction lists
//! hash to the same root (CVE-2012-2459), so the builder reports whether it
//! saw one and callers treat such a block as mutated.

use crate::crypto::hash256;
use crate::types::{Hash, Transaction};

/// Merkle root of a transaction list and whether the tree was mutated.
///
/// An empty list has the all-zero root.
pub fn compute_merkle_root(transactions: &[Transaction]) -> (Hash, bool) {
    #[cfg(feature = "rayon")]
    let mut hashes: Vec<Hash> = {
        use rayon::prelude::*;
        transactions.par_iter().map(Transaction::txid).collect()
    };

    #[cfg(not(feature = "rayon"))]
    let mut hashes: Vec<Hash> = transactions.iter().map(Transaction::txid).collect();

    merkle_root_from_hashes(&mut hashes)
}

/// Build the tree from precomputed leaf hashes, consuming `hashes` as
/// scratch space.
pub fn merkle_root_from_hashes(hashes: &mut Vec<Hash>) -> (Hash, bool) {
    if hashes.is_empty() {
        return ([0u8; 32], false);
    }

    let mut mutated = false;

    while hashes.len() > 1 {
        for pos in (0..hashes.len() - 1).step_by(2) {
            if hashes[pos] == hashes[pos + 1] {
                mutated = true;
            }
        }

        if hashes.len() & 1 != 0 {
            hashes.push(hashes[hashes.len() - 1]);
        }

        let mut next_level = Vec::with_capacity(hashes.len() / 2);
        for chunk in hashes.chunks(2) {
            let mut combined = [0u8; 64];
            combined[..32].copy_from_slice(&chunk[0]);
            combined[32..].copy_from_slice(&chunk[1]);
            next_level.push(hash256(&combined));
        }

        *hashes = next_level;
    }

    (hashes[0], mutated)
}
