//! Deposit notes.
//!
//! A note is the depositor's secret. Everything public about it is derived:
//!   commitment = keccak256(secret_be_32bytes)
//!   nullifier  = keccak256((secret + 1 mod 2^256)_be_32bytes)

use alloy_primitives::{B256, U256};
use serde::{Deserialize, Serialize};

use crate::hash::keccak256;
use crate::{Commitment, Nullifier};

/// The private half of a deposit. Whoever holds the secret can withdraw.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DepositNote {
    pub secret: B256,
}

impl DepositNote {
    pub fn new(secret: B256) -> Self {
        Self { secret }
    }

    /// The value published by `deposit`.
    pub fn commitment(&self) -> Commitment {
        keccak256(&self.secret_word().to_be_bytes::<32>())
    }

    /// The value revealed by `withdraw`. Unlinkable to the commitment
    /// without the secret.
    pub fn nullifier(&self) -> Nullifier {
        let shifted = self.secret_word().wrapping_add(U256::from(1));
        keccak256(&shifted.to_be_bytes::<32>())
    }

    fn secret_word(&self) -> U256 {
        U256::from_be_bytes(self.secret.0)
    }
}
