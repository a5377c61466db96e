#![no_main]
use hybrid_consensus::crypto::Sha256dMixer;
use hybrid_consensus::pow::check_proof_of_work;
use hybrid_consensus::serialization::{deserialize_block_header, serialize_block_header, Purpose};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(header) = deserialize_block_header(data, Purpose::Network) {
        assert_eq!(serialize_block_header(&header, Purpose::Network), data);
        assert!(header.proof_of_stake_flag <= 1 && header.full_node_proof <= 1);

        // Hash encoding is the network encoding minus the flag bytes
        let hash = serialize_block_header(&header, Purpose::Hash);
        assert_eq!(&data[..hash.len()], &hash[..]);

        // Arbitrary compact targets must never panic
        let _ = check_proof_of_work(&header, &Sha256dMixer, header.bits);
    }
});
