//! Consensus-mode classification of full blocks
//!
//! Each test starts from a block that classifies cleanly and breaks one
//! thing about it.


use hybrid_consensus::block::Block;
use hybrid_consensus::crypto::{Secp256k1Verifier, Sha256dMixer, SignatureVerifier};
use hybrid_consensus::error::ConsensusError;
use hybrid_consensus::stake::{ChainIndex, DenominatedStake, StakeInput};
use hybrid_consensus::types::OutPoint;
use hybrid_consensus::validation::{BlockValidator, ConsensusState, StakeResolver};
use hybrid_consensus::{ConsensusConfig, HybridConsensus};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use test_helpers::*;

fn consensus() -> HybridConsensus {
    HybridConsensus::with_config(easy_config())
}

#[test]
fn mined_block_classifies_as_proof_of_work() {
    let mut block = mined_block(&Sha256dMixer);
    let fixture = stake_fixture();
    let state = consensus().classify(&mut block, &fixture.chain);
    assert_eq!(state, ConsensusState::ProofOfWork);
    assert!(block.is_checked());
}

#[test]
fn next_nonce_is_checked_independently() {
    let mut block = mined_block(&Sha256dMixer);
    let fixture = stake_fixture();
    let consensus = consensus();
    let digest = block.header().compute_proof_of_work_hash(&Sha256dMixer);

    block.header_mut().nonce += 1;
    assert_ne!(block.header().compute_proof_of_work_hash(&Sha256dMixer), digest);

    let expected = consensus.check_proof_of_work(block.header()).unwrap();
    let state = consensus.classify(&mut block, &fixture.chain);
    if expected {
        assert_eq!(state, ConsensusState::ProofOfWork);
    } else {
        assert!(matches!(
            state,
            ConsensusState::Invalid(ConsensusError::InvalidProofOfWork(_))
        ));
    }
}

#[test]
fn hard_target_rejects_proof_of_work() {
    let mut block = mined_block(&Sha256dMixer);
    // target of 1: no digest gets under it
    block.header_mut().bits = 0x0300_0001;
    let fixture = stake_fixture();
    let state = consensus().classify(&mut block, &fixture.chain);
    assert!(matches!(
        state,
        ConsensusState::Invalid(ConsensusError::InvalidProofOfWork(_))
    ));
}

#[test]
fn staked_block_classifies_as_proof_of_stake() {
    let fixture = stake_fixture();
    let mut block = staked_block(&fixture);
    let state = consensus().classify(&mut block, &fixture.chain);
    assert_eq!(state, ConsensusState::ProofOfStake);
    assert!(block.signatures_verified());
}

#[test]
fn modes_follow_kernel_reference_only() {
    let fixture = stake_fixture();
    let consensus = consensus();

    let mut pow = mined_block(&Sha256dMixer);
    pow.header_mut().proof_of_stake_flag = 0;
    assert!(!matches!(
        consensus.classify(&mut pow, &fixture.chain),
        ConsensusState::ProofOfStake
    ));

    let mut pos = staked_block(&fixture);
    assert!(!matches!(
        consensus.classify(&mut pos, &fixture.chain),
        ConsensusState::ProofOfWork
    ));
}

#[test]
fn bad_signature_is_fatal() {
    let fixture = stake_fixture();
    let mut block = staked_block(&fixture);
    let mut sig = block.signature().to_vec();
    let last = sig.len() - 1;
    sig[last] ^= 0x01;
    block.set_signature(sig);

    let state = consensus().classify(&mut block, &fixture.chain);
    let err = state.error().cloned().unwrap();
    assert!(err.is_fatal());
    assert!(!block.signatures_verified());
}

#[test]
fn signature_from_wrong_key_rejected() {
    let fixture = stake_fixture();
    let mut block = staked_block(&fixture);
    let other = secp256k1::SecretKey::from_slice(&[0x07; 32]).unwrap();
    sign_block(&mut block, &other);
    assert!(matches!(
        consensus().classify(&mut block, &fixture.chain),
        ConsensusState::Invalid(ConsensusError::SignatureInvalid(_))
    ));
}

#[test]
fn missing_signature_is_mode_error() {
    let fixture = stake_fixture();
    let mut block = staked_block(&fixture);
    block.set_signature(Vec::new());
    assert!(matches!(
        consensus().classify(&mut block, &fixture.chain),
        ConsensusState::Invalid(ConsensusError::InvalidConsensusMode(_))
    ));
}

#[test]
fn flag_without_kernel_is_mode_error() {
    let fixture = stake_fixture();
    let mut block = mined_block(&Sha256dMixer);
    block.header_mut().proof_of_stake_flag = 1;
    assert!(matches!(
        consensus().classify(&mut block, &fixture.chain),
        ConsensusState::Invalid(ConsensusError::InvalidConsensusMode(_))
    ));
}

#[test]
fn shallow_origin_unavailable() {
    let mut fixture = stake_fixture();
    fixture.chain.set_tip_height(ORIGIN_HEIGHT + 10);
    let mut block = staked_block(&fixture);
    assert!(matches!(
        consensus().classify(&mut block, &fixture.chain),
        ConsensusState::Invalid(ConsensusError::StakeInputUnavailable(_))
    ));
}

#[test]
fn spent_kernel_unavailable() {
    let mut fixture = stake_fixture();
    let mut block = staked_block(&fixture);
    let consensus = consensus();
    assert_eq!(consensus.classify(&mut block, &fixture.chain), ConsensusState::ProofOfStake);

    fixture.chain.spend(fixture.kernel);
    let mut block = staked_block(&fixture);
    let err = consensus
        .classify(&mut block, &fixture.chain)
        .error()
        .cloned()
        .unwrap();
    assert!(matches!(err, ConsensusError::StakeInputUnavailable(_)));
    assert!(!err.is_fatal());
}

#[test]
fn tampered_transactions_are_hash_mismatch() {
    let fixture = stake_fixture();
    let mut block = staked_block(&fixture);
    block.transactions_mut()[1].lock_time = 99;
    assert!(matches!(
        consensus().classify(&mut block, &fixture.chain),
        ConsensusState::Invalid(ConsensusError::HashMismatch { .. })
    ));
}

#[test]
fn oversized_signature_rejected() {
    let fixture = stake_fixture();
    let mut block = staked_block(&fixture);
    block.set_signature(vec![0x30; 81]);
    let err = consensus()
        .classify(&mut block, &fixture.chain)
        .error()
        .cloned()
        .unwrap();
    assert!(matches!(err, ConsensusError::MalformedEncoding(_)));
}

/// Verifier that counts calls and accepts everything
#[derive(Default)]
struct CountingVerifier(AtomicUsize);

impl SignatureVerifier for CountingVerifier {
    fn verify(&self, _message: &[u8; 32], _signature: &[u8], _signer: &[u8]) -> bool {
        self.0.fetch_add(1, Ordering::SeqCst);
        true
    }
}

/// Verifier that counts calls and rejects everything
#[derive(Default)]
struct RejectingVerifier(AtomicUsize);

impl SignatureVerifier for RejectingVerifier {
    fn verify(&self, _message: &[u8; 32], _signature: &[u8], _signer: &[u8]) -> bool {
        self.0.fetch_add(1, Ordering::SeqCst);
        false
    }
}

#[test]
fn positive_signature_result_is_cached() {
    let fixture = stake_fixture();
    let mut block = staked_block(&fixture);
    let verifier = CountingVerifier::default();
    let validator = BlockValidator::new(&fixture.chain, &Sha256dMixer, &verifier, easy_config());

    assert_eq!(validator.classify(&mut block), ConsensusState::ProofOfStake);
    assert_eq!(validator.classify(&mut block), ConsensusState::ProofOfStake);
    assert_eq!(verifier.0.load(Ordering::SeqCst), 1);

    // a new signature must be checked again
    block.set_signature(vec![0x30, 0x01]);
    validator.classify(&mut block);
    assert_eq!(verifier.0.load(Ordering::SeqCst), 2);
}

#[test]
fn negative_signature_result_is_not_cached() {
    let fixture = stake_fixture();
    let mut block = staked_block(&fixture);
    let verifier = RejectingVerifier::default();
    let validator = BlockValidator::new(&fixture.chain, &Sha256dMixer, &verifier, easy_config());

    assert!(!validator.classify(&mut block).is_valid());
    assert!(!validator.classify(&mut block).is_valid());
    assert_eq!(verifier.0.load(Ordering::SeqCst), 2);

    // the same block passes once a working verifier sees it
    let real = Secp256k1Verifier::new();
    let validator = BlockValidator::new(&fixture.chain, &Sha256dMixer, &real, easy_config());
    assert_eq!(validator.classify(&mut block), ConsensusState::ProofOfStake);
}

/// Resolves every kernel as a denominated commitment of `denomination`
struct DenominatedResolver {
    serial: [u8; 32],
    denomination: i64,
    config: ConsensusConfig,
}

impl StakeResolver for DenominatedResolver {
    fn resolve(
        &self,
        kernel: &OutPoint,
        _chain: &dyn ChainIndex,
    ) -> hybrid_consensus::Result<Box<dyn StakeInput>> {
        Ok(Box::new(DenominatedStake::new(
            *kernel,
            self.serial,
            self.denomination,
            &self.config.stake,
        )))
    }
}

#[test]
fn custom_resolver_drives_stake_lookup() {
    let fixture = stake_fixture();
    let mut block = staked_block(&fixture);
    let verifier = Secp256k1Verifier::new();

    let matching = DenominatedResolver {
        serial: [0x5e; 32],
        denomination: STAKE_VALUE,
        config: easy_config(),
    };
    let validator = BlockValidator::new(&fixture.chain, &Sha256dMixer, &verifier, easy_config())
        .with_resolver(matching);
    assert_eq!(validator.classify(&mut block), ConsensusState::ProofOfStake);

    let mut block = staked_block(&fixture);
    let mismatched = DenominatedResolver {
        serial: [0x5e; 32],
        denomination: STAKE_VALUE * 2,
        config: easy_config(),
    };
    let validator = BlockValidator::new(&fixture.chain, &Sha256dMixer, &verifier, easy_config())
        .with_resolver(mismatched);
    assert!(matches!(
        validator.classify(&mut block),
        ConsensusState::Invalid(ConsensusError::StakeInputUnavailable(_))
    ));
}

#[test]
fn revealed_serial_unavailable() {
    let mut fixture = stake_fixture();
    let serial = [0x5e; 32];
    fixture.chain.spend_serial(serial);
    let verifier = Secp256k1Verifier::new();

    let resolver = DenominatedResolver {
        serial,
        denomination: STAKE_VALUE,
        config: easy_config(),
    };
    let validator = BlockValidator::new(&fixture.chain, &Sha256dMixer, &verifier, easy_config())
        .with_resolver(resolver);
    let mut block = staked_block(&fixture);
    assert!(matches!(
        validator.classify(&mut block),
        ConsensusState::Invalid(ConsensusError::StakeInputUnavailable(_))
    ));

    // the mint outpoint itself is unspent, so a plain stake on it still passes
    let mut block = staked_block(&fixture);
    assert_eq!(
        consensus().classify(&mut block, &fixture.chain),
        ConsensusState::ProofOfStake
    );
}

/// Shared buffer the fmt layer writes into
#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Classify a rejected block under a capturing subscriber and return the log
fn rejection_log(log_rejections: bool) -> String {
    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_env_filter(tracing_subscriber::EnvFilter::new("warn"))
        .with_ansi(false)
        .finish();

    let fixture = stake_fixture();
    let mut config = easy_config();
    config.debug.log_rejections = log_rejections;
    let consensus = HybridConsensus::with_config(config);

    let mut block = Block::from_header(sample_header());
    block.header_mut().prevout_stake = fixture.kernel;
    tracing::subscriber::with_default(subscriber, || {
        assert!(!consensus.classify(&mut block, &fixture.chain).is_valid());
    });
    log.contents()
}

#[test]
fn rejections_logged_when_enabled() {
    let output = rejection_log(true);
    assert!(output.contains("block rejected"), "{output}");
    assert!(output.contains("WARN"), "{output}");
    assert!(output.contains("mode=\"PoS\"") || output.contains("mode=PoS"), "{output}");
}

#[test]
fn rejections_silent_by_default() {
    assert!(!rejection_log(false).contains("block rejected"));
}
