#![no_main]
use hybrid_consensus::serialization::{deserialize_block, serialize_block, Purpose};
use hybrid_consensus::ProofMode;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Anything that decodes must re-encode to the same bytes
    if let Ok(block) = deserialize_block(data, Purpose::Network) {
        assert_eq!(serialize_block(&block, Purpose::Network), data);
        assert_eq!(block.is_proof_of_stake(), !block.header().prevout_stake.is_null());
        if block.is_proof_of_work() {
            assert!(block.signature().is_empty());
        }
    }

    if let Ok(block) = deserialize_block(data, Purpose::Hash) {
        assert_eq!(block.header().proof_of_stake_flag, 0);
        assert_eq!(block.header().full_node_proof, 0);
    }
});
