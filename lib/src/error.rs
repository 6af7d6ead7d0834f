use alloy_primitives::{Address, U256};
use thiserror::Error;

use crate::claim::ClaimDecodeError;
use crate::env::TransferError;
use crate::Nullifier;

/// Every way a deposit or withdrawal can be rejected. A rejected operation
/// leaves no trace in pool state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("deposit of {actual} does not match denomination {expected}")]
    InvalidDepositAmount { expected: U256, actual: U256 },

    #[error("deposit of {value} would overflow custody {custody}")]
    CustodyOverflow { custody: U256, value: U256 },

    #[error("proof rejected by verifier")]
    ProofInvalid,

    #[error("malformed public inputs")]
    MalformedPublicInputs(#[from] ClaimDecodeError),

    #[error("nullifier {0} already spent")]
    AlreadySpent(Nullifier),

    #[error("block {number} is unknown, evicted, or does not match the claimed hash")]
    StaleOrInvalidBlockReference { number: u64 },

    #[error("claim is bound to pool {claimed}, this pool is {expected}")]
    PoolIdentityMismatch { expected: Address, claimed: Address },

    #[error("relayer fee {fee} exceeds denomination {denomination}")]
    RelayerFeeExceedsDenomination { fee: U256, denomination: U256 },

    #[error("transfer to {to} failed")]
    TransferFailed {
        to: Address,
        #[source]
        reason: TransferError,
    },
}

