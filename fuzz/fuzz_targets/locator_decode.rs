#![no_main]
use hybrid_consensus::constants::MAX_LOCATOR_ENTRIES;
use hybrid_consensus::serialization::{deserialize_locator, serialize_locator, Purpose};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok((locator, version)) = deserialize_locator(data, Purpose::Network, MAX_LOCATOR_ENTRIES) {
        assert!(locator.have.len() <= MAX_LOCATOR_ENTRIES);
        let version = version.expect("network purpose carries a version");
        assert_eq!(serialize_locator(&locator, Purpose::Network, version), data);
    }
});
