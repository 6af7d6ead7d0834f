//! Fixed-denomination privacy pool.
//!
//! Depositors lock one denomination against a public commitment. Withdrawers
//! later redeem by proving knowledge of a secret whose commitment is in the
//! ledger, revealing only its nullifier. This crate holds the ledger state
//! machine and the withdrawal-validation protocol; proving is external and
//! reaches the pool only through a [`ProofVerifier`] and the
//! [`WithdrawalClaim`] it attests to.
//!
//! `no_std` so the same types can be used from a zkVM guest or an on-chain
//! runtime.

#![no_std]
extern crate alloc;

pub mod claim;
pub mod env;
pub mod error;
pub mod hash;
pub mod inclusion;
pub mod ledger;
pub mod note;
pub mod pool;
pub mod verifier;

use alloy_primitives::B256;

/// Public binding of a depositor's secret.
pub type Commitment = B256;
/// Secret-derived tag revealed on withdrawal.
pub type Nullifier = B256;

pub use claim::{ClaimDecodeError, WithdrawalClaim, CLAIM_ENCODED_LEN};
pub use env::{
    Balances, BlockHistory, HistoryError, RecentBlocks, TransferError, ValueTransfer,
    DEFAULT_HISTORY_WINDOW,
};
pub use error::PoolError;
pub use hash::{hash_pair, keccak256, keccak256_concat};
pub use inclusion::{compute_inclusion_root, AssociationSetTree, InclusionBranches, SetFull};
pub use ledger::{CommitmentLedger, NullifierSet};
pub use note::DepositNote;
pub use pool::{Pool, PoolConfig, PoolEvent, PoolState};
pub use verifier::{DigestVerifier, ProofVerifier, VerificationKeyId};
