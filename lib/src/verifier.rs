//! Proof verification capability.

use alloy_primitives::B256;

use crate::hash::keccak256_concat;

/// Identifies the program a proof must have been produced for (the 32-byte
/// verification key hash an SP1-style verifier is configured with).
pub type VerificationKeyId = B256;

/// Trusted, deterministic, side-effect free.
pub trait ProofVerifier {
    fn verify(&self, vkey: &VerificationKeyId, public_inputs: &[u8], proof: &[u8]) -> bool;
}

/// Development verifier with no zero-knowledge at all: a "proof" is
/// keccak256(vkey ++ public_inputs). Anyone can forge one, so it only
/// belongs in tests and local simulations.
#[derive(Clone, Copy, Debug, Default)]
pub struct DigestVerifier;

impl DigestVerifier {
    pub fn prove(vkey: &VerificationKeyId, public_inputs: &[u8]) -> B256 {
        keccak256_concat(&[vkey.as_slice(), public_inputs])
    }
}

impl ProofVerifier for DigestVerifier {
    fn verify(&self, vkey: &VerificationKeyId, public_inputs: &[u8], proof: &[u8]) -> bool {
        proof == Self::prove(vkey, public_inputs).as_slice()
    }
}
