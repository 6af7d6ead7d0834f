use alloy_primitives::B256;
use tiny_keccak::{Hasher, Keccak};

/// Compute keccak256 hash. This matches Solidity's keccak256() opcode.
/// Note: tiny_keccak::Keccak is the original Keccak-256 (NOT SHA3-256).
pub fn keccak256(data: &[u8]) -> B256 {
    keccak256_concat(&[data])
}

/// keccak256 over the concatenation of `parts`, without building the
/// concatenated buffer.
pub fn keccak256_concat(parts: &[&[u8]]) -> B256 {
    let mut hasher = Keccak::v256();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    B256::from(output)
}

/// Hash a pair of 32-byte nodes. Matches Solidity:
///   keccak256(abi.encodePacked(left, right))
pub fn hash_pair(left: &B256, right: &B256) -> B256 {
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(left.as_slice());
    data[32..].copy_from_slice(right.as_slice());
    keccak256(&data)
}
