//! The public inputs a withdrawal proof attests to.
//!
//! Encoding is the Solidity ABI encoding of the static tuple
//!   (bytes32 nullifier, bytes32 blockHash, bytes32 exclusionSetRoot,
//!    uint256 relayerFee, address recipient, address relayer,
//!    address contractAddress, uint64 blockNumber)
//! i.e. eight 32-byte words, 256 bytes in total. Addresses are left-padded
//! with 12 zero bytes, blockNumber with 24.

use alloc::vec::Vec;
use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Nullifier;

const WORD: usize = 32;

/// Size of an encoded claim in bytes.
pub const CLAIM_ENCODED_LEN: usize = 8 * WORD;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClaimDecodeError {
    #[error("expected 256 bytes, got {0}")]
    Length(usize),
    #[error("non-zero padding in `{0}`")]
    DirtyPadding(&'static str),
}

/// Everything the chain learns about a withdrawal.
///
/// The proof only says these values are consistent with *some* deposit;
/// every field still has to be checked against pool state.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalClaim {
    pub nullifier: Nullifier,
    pub block_hash: B256,
    pub exclusion_set_root: B256,
    pub relayer_fee: U256,
    pub recipient: Address,
    pub relayer: Address,
    /// Pool instance the proof is bound to.
    pub contract_address: Address,
    pub block_number: u64,
}

impl WithdrawalClaim {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(CLAIM_ENCODED_LEN);
        out.extend_from_slice(self.nullifier.as_slice());
        out.extend_from_slice(self.block_hash.as_slice());
        out.extend_from_slice(self.exclusion_set_root.as_slice());
        out.extend_from_slice(&self.relayer_fee.to_be_bytes::<32>());
        for address in [self.recipient, self.relayer, self.contract_address] {
            out.extend_from_slice(&[0u8; 12]);
            out.extend_from_slice(address.as_slice());
        }
        out.extend_from_slice(&[0u8; 24]);
        out.extend_from_slice(&self.block_number.to_be_bytes());
        out
    }

    /// Strict decode: exact length and clean padding, so one claim has
    /// exactly one encoding.
    pub fn decode(data: &[u8]) -> Result<Self, ClaimDecodeError> {
        if data.len() != CLAIM_ENCODED_LEN {
            return Err(ClaimDecodeError::Length(data.len()));
        }
        let word = |i: usize| &data[i * WORD..(i + 1) * WORD];

        Ok(Self {
            nullifier: B256::from_slice(word(0)),
            block_hash: B256::from_slice(word(1)),
            exclusion_set_root: B256::from_slice(word(2)),
            relayer_fee: U256::from_be_slice(word(3)),
            recipient: decode_address(word(4), "recipient")?,
            relayer: decode_address(word(5), "relayer")?,
            contract_address: decode_address(word(6), "contractAddress")?,
            block_number: decode_u64(word(7), "blockNumber")?,
        })
    }
}

fn decode_address(word: &[u8], field: &'static str) -> Result<Address, ClaimDecodeError> {
    let (padding, value) = word.split_at(12);
    if padding.iter().any(|b| *b != 0) {
        return Err(ClaimDecodeError::DirtyPadding(field));
    }
    Ok(Address::from_slice(value))
}

fn decode_u64(word: &[u8], field: &'static str) -> Result<u64, ClaimDecodeError> {
    let (padding, value) = word.split_at(24);
    if padding.iter().any(|b| *b != 0) {
        return Err(ClaimDecodeError::DirtyPadding(field));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(value);
    Ok(u64::from_be_bytes(bytes))
}
