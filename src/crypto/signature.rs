//! Block signature verification collaborator
//!
//! A proof-of-stake block carries a signature over its sign-stripped header
//! hash. The verification primitive belongs to the script layer; this module
//! only fixes its shape and ships a secp256k1 implementation.

use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, VerifyOnly};

/// `(message, signature, claimed signer) -> bool`
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, message: &[u8; 32], signature: &[u8], signer: &[u8]) -> bool;
}

/// DER-encoded ECDSA over secp256k1, signer given as a serialized public key.
#[derive(Debug, Clone)]
pub struct Secp256k1Verifier {
    secp: Secp256k1<VerifyOnly>,
}

impl Secp256k1Verifier {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::verification_only(),
        }
    }
}

impl Default for Secp256k1Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureVerifier for Secp256k1Verifier {
    fn verify(&self, message: &[u8; 32], signature: &[u8], signer: &[u8]) -> bool {
        if signature.is_empty() {
            return false;
        }
        let pubkey = match PublicKey::from_slice(signer) {
            Ok(pk) => pk,
            Err(_) => return false,
        };
        let mut signature = match Signature::from_der(signature) {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        // libsecp256k1 only accepts low-S; normalisation is a no-op otherwise
        signature.normalize_s();
        let message = match Message::from_digest_slice(message) {
            Ok(msg) => msg,
            Err(_) => return false,
        };
        self.secp.verify_ecdsa(&message, &signature, &pubkey).is_ok()
    }
}
