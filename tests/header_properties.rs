//! Property-based tests for header hashing and encoding
//!
//! Uses PropTest to check the header invariants every producer and verifier
//! relies on: stable identity, time-bucketed proof-of-work digests,
//! flag-blind signing hashes and exclusive consensus modes.

use hybrid_consensus::constants::TIME_MASK;
use hybrid_consensus::crypto::Sha256dMixer;
use hybrid_consensus::header::{BlockHeader, ConsensusKind, ProofMode};
use hybrid_consensus::serialization::{deserialize_block_header, serialize_block_header, Purpose};
use hybrid_consensus::types::OutPoint;
use proptest::prelude::*;

fn arb_outpoint() -> impl Strategy<Value = OutPoint> {
    prop_oneof![
        Just(OutPoint::null()),
        (any::<[u8; 32]>(), any::<u32>()).prop_map(|(hash, index)| OutPoint::new(hash, index)),
    ]
}

fn arb_header() -> impl Strategy<Value = BlockHeader> {
    (
        any::<i32>(),
        any::<[u8; 32]>(),
        any::<[u8; 32]>(),
        any::<u32>(),
        any::<u32>(),
        any::<u32>(),
        arb_outpoint(),
        0u8..=1,
        0u8..=1,
    )
        .prop_map(
            |(version, prev, merkle, time, bits, nonce, prevout_stake, pos, fnp)| BlockHeader {
                version,
                prev_block_hash: prev,
                merkle_root: merkle,
                time,
                bits,
                nonce,
                prevout_stake,
                proof_of_stake_flag: pos,
                full_node_proof: fnp,
            },
        )
}

proptest! {
    #[test]
    fn header_hash_stable_under_reserialization(header in arb_header()) {
        let bytes = serialize_block_header(&header, Purpose::Network);
        let decoded = deserialize_block_header(&bytes, Purpose::Network).unwrap();
        prop_assert_eq!(&decoded, &header);
        prop_assert_eq!(serialize_block_header(&decoded, Purpose::Network), bytes);
        prop_assert_eq!(decoded.compute_hash(), header.compute_hash());
    }

    #[test]
    fn hash_purpose_is_network_prefix(header in arb_header()) {
        let network = serialize_block_header(&header, Purpose::Network);
        let hash = serialize_block_header(&header, Purpose::Hash);
        prop_assert_eq!(hash.len(), 116);
        prop_assert_eq!(&network[..116], &hash[..]);
    }

    #[test]
    fn pow_hash_invariant_within_time_bucket(
        header in arb_header(),
        low_a in 0u32..128,
        low_b in 0u32..128,
    ) {
        let base = header.time & TIME_MASK;
        let a = BlockHeader { time: base | low_a, ..header.clone() };
        let b = BlockHeader { time: base | low_b, ..header };
        prop_assert_eq!(
            a.compute_proof_of_work_hash(&Sha256dMixer),
            b.compute_proof_of_work_hash(&Sha256dMixer)
        );
    }

    #[test]
    fn pow_hash_differs_across_time_buckets(header in arb_header(), low in 0u32..128) {
        prop_assume!(header.time < TIME_MASK);
        let a = BlockHeader { time: (header.time & TIME_MASK) | low, ..header.clone() };
        let b = BlockHeader { time: (header.time & TIME_MASK) + 128, ..header };
        prop_assert_ne!(
            a.compute_proof_of_work_hash(&Sha256dMixer),
            b.compute_proof_of_work_hash(&Sha256dMixer)
        );
    }

    #[test]
    fn hash_without_sign_ignores_flags(header in arb_header(), pos in 0u8..=1, fnp in 0u8..=1) {
        let flipped = BlockHeader {
            proof_of_stake_flag: pos,
            full_node_proof: fnp,
            ..header.clone()
        };
        prop_assert_eq!(header.compute_hash_without_sign(), flipped.compute_hash_without_sign());
    }

    #[test]
    fn consensus_modes_exclusive(header in arb_header()) {
        prop_assert!(header.is_proof_of_stake() != header.is_proof_of_work());
        let expected = if header.prevout_stake.is_null() {
            ConsensusKind::ProofOfWork
        } else {
            ConsensusKind::ProofOfStake
        };
        prop_assert_eq!(ConsensusKind::of(&header), expected);
        // the wire flag never drives the mode
        let flagged = BlockHeader { proof_of_stake_flag: 1 - header.proof_of_stake_flag, ..header.clone() };
        prop_assert_eq!(ConsensusKind::of(&flagged), expected);
    }
}

#[test]
fn nonce_increment_changes_pow_digest() {
    let header = BlockHeader {
        version: 1,
        time: 1_650_000_000,
        bits: 0x1e0f_ffff,
        nonce: 41,
        ..BlockHeader::default()
    };
    let next = BlockHeader {
        nonce: 42,
        ..header.clone()
    };
    assert_ne!(
        header.compute_proof_of_work_hash(&Sha256dMixer),
        next.compute_proof_of_work_hash(&Sha256dMixer)
    );
}
